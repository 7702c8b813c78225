/*!
# Rust Language Module

This Rust module provides lexical analysis and parsing of the BASIC language.
Statements are not parsed ahead of time. The compiler walks each line with
a token cursor and only expressions are turned into a tree.

*/

#[macro_use]
mod error;
mod ident;
mod lex;
mod line;
mod parse;
mod token;

pub use error::Error;
pub use error::ErrorCode;
pub use ident::Ident;
pub use lex::lex;
pub use line::{FileLoader, LineSource, Loader, MemLoader, Source, SourceLine};
pub use parse::Parser;
pub use token::{Literal, Operator, Token, Word};

pub mod ast;

#[cfg(test)]
mod tests;

pub type LineNumber = Option<u16>;
pub type Column = std::ops::Range<usize>;

pub trait MaxValue<T> {
    fn max_value() -> T;
}

impl MaxValue<u16> for LineNumber {
    fn max_value() -> u16 {
        65529
    }
}
