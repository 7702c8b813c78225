use super::DataType;
use crate::error;
use crate::lang::{Error, Ident};
use std::collections::BTreeMap;

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Sub,
    Function(DataType),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: DataType,
}

/// A local of the running callable together with its place in the frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub name: String,
    pub ty: DataType,
    pub offset: i32,
}

/// ## SUB and FUNCTION entries
///
/// Arguments are pushed right to left by the caller so the first one
/// sits just above the saved frame pointer and return address at
/// `IY+4`. Locals grow downwards from `IY-1`; a function's result is
/// always the first of them.

#[derive(Debug, Clone)]
pub struct Callable {
    pub name: String,
    pub kind: Kind,
    pub args: Vec<Param>,
    pub locals: Vec<Param>,
    pub declared: bool,
    pub implemented: bool,
    /// Signature came from a call site, not from a declaration.
    pub inferred: bool,
    pub calls: usize,
}

pub const FIRST_ARG_OFFSET: i32 = 4;

impl Callable {
    pub fn new(name: &str, kind: Kind, args: Vec<Param>) -> Callable {
        Callable {
            name: name.to_string(),
            kind,
            args,
            locals: vec![],
            declared: false,
            implemented: false,
            inferred: false,
            calls: 0,
        }
    }

    pub fn label(&self) -> String {
        let base = self.name.trim_end_matches(Ident::suffix);
        match self.kind {
            Kind::Sub => format!("SUB_{}", base),
            Kind::Function(ty) => {
                let prefix = match (ty, self.name.chars().last()) {
                    (DataType::Str, _) => "FUNCS_",
                    (_, Some('%')) => "FUNCI_",
                    (_, Some('&')) => "FUNCL_",
                    (_, Some('!')) => "FUNCD_",
                    _ => "FUNC_",
                };
                format!("{}{}", prefix, base)
            }
        }
    }

    pub fn result_type(&self) -> Option<DataType> {
        match self.kind {
            Kind::Sub => None,
            Kind::Function(ty) => Some(ty),
        }
    }

    pub fn same_signature(&self, kind: Kind, args: &[Param]) -> bool {
        self.kind == kind
            && self.args.len() == args.len()
            && self.args.iter().zip(args).all(|(a, b)| a.ty == b.ty)
    }

    fn arg_offsets(&self) -> Vec<i32> {
        let mut offset = FIRST_ARG_OFFSET;
        let mut v = vec![];
        for arg in &self.args {
            v.push(offset);
            offset += arg.ty.size() as i32;
        }
        v
    }

    /// Frame bytes below the frame pointer, result slot included.
    pub fn local_size(&self) -> i32 {
        let result = self.result_type().map(|t| t.size() as i32).unwrap_or(0);
        result + self.locals.iter().map(|l| l.ty.size() as i32).sum::<i32>()
    }

    pub fn arg_size(&self) -> i32 {
        self.args.iter().map(|a| a.ty.size() as i32).sum()
    }

    /// Offset of the function result, addressed like a local.
    pub fn result_offset(&self) -> Option<i32> {
        self.result_type().map(|t| -(t.size() as i32))
    }

    /// Every argument and local with its frame offset, result excluded.
    pub fn slots(&self) -> Vec<Slot> {
        let mut slots: Vec<Slot> = self
            .args
            .iter()
            .zip(self.arg_offsets())
            .map(|(a, offset)| Slot {
                name: a.name.clone(),
                ty: a.ty,
                offset,
            })
            .collect();
        let mut below = self.result_type().map(|t| t.size() as i32).unwrap_or(0);
        for local in &self.locals {
            below += local.ty.size() as i32;
            slots.push(Slot {
                name: local.name.clone(),
                ty: local.ty,
                offset: -below,
            });
        }
        slots
    }

    pub fn slot(&self, name: &str) -> Option<Slot> {
        self.slots().into_iter().find(|s| s.name == name)
    }

    pub fn has_frame(&self) -> bool {
        !self.args.is_empty() || self.local_size() > 0
    }

    /// Adds a local, refusing duplicates and frames beyond IY reach.
    pub fn add_local(&mut self, name: &str, ty: DataType) -> Result<()> {
        if name == self.name || self.slots().iter().any(|s| s.name == name) {
            return Err(error!(DuplicateDefinition; name));
        }
        self.locals.push(Param {
            name: name.to_string(),
            ty,
        });
        if let Err(e) = self.check_frame() {
            self.locals.pop();
            return Err(e);
        }
        Ok(())
    }

    /// Offsets must fit the signed displacement of `(IY+d)`, the last
    /// byte of each slot included.
    pub fn check_frame(&self) -> Result<()> {
        let top = FIRST_ARG_OFFSET + self.arg_size() - 1;
        if top > 127 || self.local_size() > 128 {
            return Err(error!(OutOfMemory; "FRAME TOO LARGE"));
        }
        Ok(())
    }
}

/// ## Callable table

#[derive(Debug, Default)]
pub struct Callables {
    map: BTreeMap<String, Callable>,
}

impl Callables {
    pub fn new() -> Callables {
        Callables::default()
    }

    pub fn get(&self, name: &str) -> Option<&Callable> {
        self.map.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Callable> {
        self.map.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn insert(&mut self, callable: Callable) -> Result<()> {
        callable.check_frame()?;
        self.map.insert(callable.name.clone(), callable);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Callable> {
        self.map.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(name: &str, ty: DataType) -> Param {
        Param {
            name: name.to_string(),
            ty,
        }
    }

    #[test]
    fn test_frame_layout() {
        let mut c = Callable::new(
            "F$",
            Kind::Function(DataType::Str),
            vec![param("A", DataType::Int2), param("B&", DataType::Int4)],
        );
        c.add_local("S$", DataType::Str).unwrap();
        c.add_local("D!", DataType::Dec6).unwrap();
        assert_eq!(c.label(), "FUNCS_F");
        assert_eq!(c.result_offset(), Some(-2));
        let offsets: Vec<(String, i32)> =
            c.slots().into_iter().map(|s| (s.name, s.offset)).collect();
        assert_eq!(
            offsets,
            [
                ("A".to_string(), 4),
                ("B&".to_string(), 6),
                ("S$".to_string(), -4),
                ("D!".to_string(), -10)
            ]
        );
        assert_eq!(c.local_size(), 10);
        assert!(c.add_local("A", DataType::Int2).is_err());
        assert!(c.add_local("F$", DataType::Str).is_err());
    }

    #[test]
    fn test_frame_limit() {
        let mut c = Callable::new("BIG", Kind::Sub, vec![]);
        assert!(!c.has_frame());
        for i in 0..21 {
            c.add_local(&format!("D{}!", i), DataType::Dec6).unwrap();
        }
        let e = c.add_local("X!", DataType::Dec6).unwrap_err();
        assert!(e.is(crate::lang::ErrorCode::OutOfMemory));
        assert_eq!(c.label(), "SUB_BIG");
    }
}
