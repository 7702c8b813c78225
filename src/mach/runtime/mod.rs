/*!
## Runtime library fragments

Assembler source for every routine and storage cell a compiled program
may need. Each module appends the fragment for the items it knows and
reports whether it did; the linker decides which items are emitted.

Routines follow one register protocol: 2 byte values in HL, 4 byte
values in DE:HL with the left operand of a binary operation in the
alternate register set, decimals in `M_ACCU` and `M_OP1`, strings as
pointers to zero terminated text.

*/

use super::buffer::CodeBuf;
use super::library::LibItem;
use super::options::{BreakCheck, Options};
use super::target::Target;

mod decimal;
mod integer;
mod io;
mod long;
mod string;

/// Type tags of the DATA pool.
pub const DATA_END: u8 = 0x00;
pub const DATA_INT1: u8 = 0x01;
pub const DATA_INT2: u8 = 0x02;
pub const DATA_STRING: u8 = 0x03;

/// Longest string the runtime produces.
pub const MAX_STR_LEN: i64 = 255;

/// What a fragment may depend on besides its own item.
pub struct Env<'a> {
    pub target: &'a dyn Target,
    pub opts: &'a Options,
}

impl<'a> Env<'a> {
    pub fn new(target: &'a dyn Target, opts: &'a Options) -> Env<'a> {
        Env { target, opts }
    }

    pub fn break_on_input(&self) -> bool {
        self.opts.break_check != BreakCheck::Never
    }
}

/// Appends the fragment of `item`. False when no module knows it.
pub fn append(item: LibItem, buf: &mut CodeBuf, env: &Env) -> bool {
    io::append(item, buf, env)
        || integer::append(item, buf)
        || long::append(item, buf)
        || decimal::append(item, buf)
        || string::append(item, buf, env)
}
