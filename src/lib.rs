//! # BASIC for Z80
//!
//! A compiler from line-numbered, structured BASIC to Z80 assembler source
//! for the 8-bit home computers of the robotron family: Z1013, Z9001 (KC 87)
//! and KC 85. The output is plain text for an external assembler. Only the
//! runtime routines a program actually uses end up in it.
//!
//! ```text
//! $ basic-z80 hello.bas
//! $ cat hello.asm
//! ```
//!
//! The compiler can also be used as a library.
//!
//! ```
//! use basic::lang::Source;
//! use basic::mach::{compile, CollectDiagnostics, Options};
//!
//! let mut source = Source::from_str("10 PRINT \"HELLO\"");
//! let mut diag = CollectDiagnostics::new();
//! let asm = compile(&mut source, &Options::default(), &mut diag).unwrap();
//! assert!(asm.contains("MSTART:"));
//! ```

#[path = "doc/introduction.rs"]
#[allow(non_snake_case)]
pub mod _Introduction;

#[path = "doc/chapter_1.rs"]
#[allow(non_snake_case)]
pub mod __Chapter_1;

#[path = "doc/chapter_2.rs"]
#[allow(non_snake_case)]
pub mod __Chapter_2;

#[path = "doc/chapter_3.rs"]
#[allow(non_snake_case)]
pub mod __Chapter_3;

#[path = "doc/appendix_a.rs"]
#[allow(non_snake_case)]
pub mod ___Appendix_A;

pub mod lang;
pub mod mach;
