/*!
## Rust Machine Module

This Rust module compiles BASIC to Z80 assembler source. Statements are
translated one at a time into an instruction list; the runtime routines
a program needs are appended from templates at the end.

*/

mod buffer;
mod callable;
mod compile;
mod dec6;
mod diag;
mod expr;
mod function;
mod library;
mod link;
mod optimize;
mod options;
mod program;
mod runtime;
mod stack;
mod statement;
mod structure;
mod target;
mod var;

use diag::Location;
use expr::Const;
use var::DataType;

pub use buffer::{hex2, hex4, CodeBuf, Instr};
pub use compile::{compile, compile_stamped, MAX_ERRORS};
pub use dec6::Dec6;
pub use diag::{mark_column, CollectDiagnostics, Diagnostics, LogDiagnostics};
pub use library::{LibItem, Library};
pub use options::{BreakCheck, Options};
pub use target::{lookup as lookup_target, Target};

#[cfg(test)]
mod tests;
