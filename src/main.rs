//! # basic-z80
//!
//! Command line front end. Compiles BASIC source files to Z80 assembler.

mod term;

fn main() {
    std::process::exit(term::main());
}
