use super::{Const, DataType, Location};
use crate::error;
use crate::lang::{Error, Word};

/// State of the arm currently being compiled in an IF block.
#[derive(Debug, Clone, PartialEq)]
pub enum Branch {
    /// Runtime test emitted; the label is where a false test lands.
    Open(String),
    /// Condition was constant true; code is live.
    Taken,
    /// Condition was constant false; code of this arm is suppressed.
    Skipping,
    /// An earlier arm was constant true; all remaining arms are dead.
    Done,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfBlock {
    pub branch: Branch,
    pub end: String,
    pub end_used: bool,
    /// Emission state when the block opened.
    pub outer_enabled: bool,
    pub had_else: bool,
    pub single_line: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Const(Const),
    Cell(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForLoop {
    /// Control variable name including its suffix.
    pub var: String,
    pub ty: DataType,
    pub limit: Operand,
    pub step: Operand,
    pub top: String,
    pub exit: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectBlock {
    pub cell: String,
    pub ty: DataType,
    pub end: String,
    /// Where the next CASE test begins; None before the first CASE.
    pub next_test: Option<String>,
    pub had_else: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallableBody {
    pub name: String,
    pub exit: String,
    /// Buffer position of the first body line, where the prologue goes.
    pub start: usize,
}

/// ## Open control structures

#[derive(Debug, Clone, PartialEq)]
pub enum Structure {
    If(IfBlock),
    Do { top: String, exit: String },
    While { top: String, exit: String },
    For(ForLoop),
    Select(SelectBlock),
    Callable(CallableBody),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub structure: Structure,
    pub at: Location,
}

impl Structure {
    /// Error reported when the source ends with this still open.
    pub fn not_closed(&self, is_function: bool) -> Error {
        match self {
            Structure::If(_) => error!(IfWithoutEndIf),
            Structure::Do { .. } => error!(DoWithoutLoop),
            Structure::While { .. } => error!(WhileWithoutWend),
            Structure::For(_) => error!(ForWithoutNext),
            Structure::Select(_) => error!(SelectWithoutEndSelect),
            Structure::Callable(_) if is_function => error!(FunctionWithoutEndFunction),
            Structure::Callable(_) => error!(SubWithoutEndSub),
        }
    }

    /// Exit label if this structure is what `EXIT <word>` leaves.
    pub fn exit_for(&self, word: Word) -> Option<&str> {
        match (self, word) {
            (Structure::Do { exit, .. }, Word::Do) => Some(exit),
            (Structure::While { exit, .. }, Word::While) => Some(exit),
            (Structure::For(f), Word::For) => Some(&f.exit),
            (Structure::Callable(c), Word::Sub) | (Structure::Callable(c), Word::Function) => {
                Some(&c.exit)
            }
            _ => None,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Structure::Callable(_))
    }

    pub fn is_single_line_if(&self) -> bool {
        matches!(self, Structure::If(IfBlock { single_line: true, .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_search_labels() {
        let d = Structure::Do {
            top: "M1".into(),
            exit: "M2".into(),
        };
        assert_eq!(d.exit_for(Word::Do), Some("M2"));
        assert_eq!(d.exit_for(Word::For), None);
        let c = Structure::Callable(CallableBody {
            name: "P".into(),
            exit: "M9".into(),
            start: 0,
        });
        assert_eq!(c.exit_for(Word::Sub), Some("M9"));
        assert!(c.not_closed(true).is(crate::lang::ErrorCode::FunctionWithoutEndFunction));
        assert!(c.not_closed(false).is(crate::lang::ErrorCode::SubWithoutEndSub));
    }
}
