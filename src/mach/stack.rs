use crate::error;
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

/// ## Depth limited nesting stack
///
/// Pushing past the limit is an out of memory error carrying the
/// message given at construction. Popping an empty stack is an
/// internal error since callers check `last` before closing anything.

pub struct Stack<T> {
    overflow_message: &'static str,
    max_len: usize,
    vec: Vec<T>,
}

impl<T: std::fmt::Debug> std::fmt::Debug for Stack<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.vec)
    }
}

impl<T> Stack<T> {
    pub fn new(overflow_message: &'static str, max_len: usize) -> Stack<T> {
        Stack {
            overflow_message,
            max_len,
            vec: vec![],
        }
    }
    pub fn len(&self) -> usize {
        self.vec.len()
    }
    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }
    pub fn last(&self) -> Option<&T> {
        self.vec.last()
    }
    pub fn last_mut(&mut self) -> Option<&mut T> {
        self.vec.last_mut()
    }
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.vec.get_mut(index)
    }
    /// Innermost first.
    pub fn iter_rev(&self) -> impl Iterator<Item = &T> {
        self.vec.iter().rev()
    }
    /// Index of the innermost entry matching `f`.
    pub fn rposition<F: FnMut(&T) -> bool>(&self, f: F) -> Option<usize> {
        self.vec.iter().rposition(f)
    }
    pub fn push(&mut self, val: T) -> Result<()> {
        if self.vec.len() >= self.max_len {
            return Err(error!(OutOfMemory; self.overflow_message));
        }
        self.vec.push(val);
        Ok(())
    }
    pub fn pop(&mut self) -> Result<T> {
        match self.vec.pop() {
            Some(v) => Ok(v),
            None => Err(error!(InternalError; "UNDERFLOW")),
        }
    }
    /// Empties the stack, innermost first.
    pub fn drain_all(&mut self) -> Vec<T> {
        let mut v = std::mem::take(&mut self.vec);
        v.reverse();
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_limit() {
        let mut s: Stack<u8> = Stack::new("NESTING TOO DEEP", 2);
        s.push(1).unwrap();
        s.push(2).unwrap();
        let e = s.push(3).unwrap_err();
        assert!(e.is(crate::lang::ErrorCode::OutOfMemory));
        assert_eq!(s.rposition(|v| *v == 1), Some(0));
        assert_eq!(s.iter_rev().copied().collect::<Vec<_>>(), [2, 1]);
        assert_eq!(s.drain_all(), [2, 1]);
        assert!(s.pop().is_err());
    }
}
