use super::buffer::CodeBuf;
use super::callable::{Callable, Callables, Kind};
use super::diag::{mark_column, Diagnostics, Location};
use super::library::{LibItem, Library};
use super::link::{LineRef, Link};
use super::optimize;
use super::options::Options;
use super::program;
use super::runtime::Env;
use super::stack::Stack;
use super::structure::{Entry, Structure};
use super::target::{self, Target};
use super::var::{DataType, Var};
use crate::error;
use crate::lang::{Column, Error, Ident, LineSource, Parser, SourceLine, Token, Word};
use std::collections::BTreeSet;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// Errors after which the rest of the source is not even looked at.
pub const MAX_ERRORS: usize = 50;

const MAX_NESTING: usize = 64;

/// Compiles a whole source. Returns the assembly text, or None when
/// any error was reported.
pub fn compile(
    source: &mut dyn LineSource,
    opts: &Options,
    diag: &mut dyn Diagnostics,
) -> Option<String> {
    compile_stamped(source, opts, diag, None)
}

/// Like `compile` with a generation time for the header comment.
pub fn compile_stamped(
    source: &mut dyn LineSource,
    opts: &Options,
    diag: &mut dyn Diagnostics,
    stamp: Option<String>,
) -> Option<String> {
    let target = match target::lookup(&opts.target) {
        Some(t) => t,
        None => {
            diag.error(&error!(Unsupported; &format!("TARGET {}", opts.target)).to_string());
            return None;
        }
    };
    let mut compiler = Compiler::new(opts, target, diag);
    compiler.stamp = stamp;
    compiler.run(source)
}

/// ## Compilation session
///
/// Owns every table of one compilation. Statements are compiled in source
/// order straight into `code`; SUB and FUNCTION bodies go to `subs`.

pub struct Compiler<'a> {
    pub(super) opts: &'a Options,
    pub(super) target: Box<dyn Target>,
    diag: &'a mut dyn Diagnostics,
    pub(super) code: CodeBuf,
    pub(super) subs: CodeBuf,
    /// The DATA pool.
    pub(super) data: CodeBuf,
    pub(super) lib: Library,
    pub(super) vars: Var,
    pub(super) callables: Callables,
    pub(super) structs: Stack<Entry>,
    pub(super) link: Link,
    pub(super) literals: Vec<(String, String)>,
    /// Name of the SUB or FUNCTION being compiled.
    pub(super) current: Option<String>,
    pub(super) at: Location,
    /// Heap blocks were marked for release at the end of the statement.
    pub(super) marked: bool,
    /// Line whose `DL<n>` label was already placed in the DATA pool.
    pub(super) data_line: Option<u16>,
    pub(super) stamp: Option<String>,
    line_text: String,
    labels: usize,
    hidden: usize,
    errors: usize,
    warned: BTreeSet<String>,
    aborted: bool,
}

impl<'a> Compiler<'a> {
    pub fn new(
        opts: &'a Options,
        target: Box<dyn Target>,
        diag: &'a mut dyn Diagnostics,
    ) -> Compiler<'a> {
        Compiler {
            opts,
            target,
            diag,
            code: CodeBuf::new(),
            subs: CodeBuf::new(),
            data: CodeBuf::new(),
            lib: Library::new(),
            vars: Var::new(),
            callables: Callables::new(),
            structs: Stack::new("STRUCTURES NESTED TOO DEEPLY", MAX_NESTING),
            link: Link::new(),
            literals: vec![],
            current: None,
            at: Location::new(Rc::from(""), 0),
            marked: false,
            data_line: None,
            stamp: None,
            line_text: String::new(),
            labels: 0,
            hidden: 0,
            errors: 0,
            warned: BTreeSet::new(),
            aborted: false,
        }
    }

    pub fn run(mut self, source: &mut dyn LineSource) -> Option<String> {
        let mut lines = 0;
        while let Some(line) = source.next_line() {
            lines += 1;
            self.compile_line(&line, source);
            if self.aborted {
                break;
            }
        }
        log::debug!("{} lines read, {} errors", lines, self.errors);
        self.finish()
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    fn compile_line(&mut self, line: &SourceLine, source: &mut dyn LineSource) {
        let (number, tokens) = line.tokens();
        self.at = Location::new(Rc::from(line.file()), line.physical()).with_line(number);
        self.line_text = tokens.iter().map(|t| t.to_string()).collect();
        self.data_line = None;
        if self.opts.include_source && !line.text().trim().is_empty() {
            self.code.append_comment(line.text().trim_end());
        }
        if let Some(n) = number {
            match self.link.define(n) {
                Ok(true) => self.warn(&format!("LINE {} OUT OF ORDER", n)),
                Ok(false) => {}
                Err(e) => self.report(e),
            }
            self.force_label(&LineRef::Number(n).label());
            if self.opts.trace_line_numbers {
                self.emit_hex4("LD", "HL,", n as i64);
                self.emit("LD", "(M_SRLN),HL");
                self.use_item(LibItem::M_SRLN);
            }
        }
        let mut p = Parser::new(&tokens);
        if let Some(Token::Word(Word::Include)) = p.peek() {
            p.next();
            if let Err(e) = self.include(&mut p, source) {
                self.report(e);
            }
            return;
        }
        if let Err(e) = self.named_label(&mut p) {
            self.report(e);
        }
        while !p.is_end() {
            if p.token(&Token::Colon) {
                continue;
            }
            log::trace!("{}: {:?}", self.at, p.peek());
            let start = p.position();
            let is_if = p.peek() == Some(&Token::Word(Word::If));
            match self.statement(&mut p) {
                Ok(()) if p.position() == start => {
                    p.next();
                }
                Ok(()) => {}
                Err(e) => {
                    self.report(e);
                    if is_if {
                        p.rest();
                    } else {
                        p.skip_statement();
                    }
                }
            }
            self.flush_marks(None);
            if self.aborted {
                return;
            }
        }
        while let Some(entry) = self.structs.last() {
            if !entry.structure.is_single_line_if() {
                break;
            }
            if let Err(e) = self.close_if() {
                self.report(e);
                break;
            }
        }
    }

    /// `NAME:` at the start of a line.
    fn named_label(&mut self, p: &mut Parser) -> Result<()> {
        let start = p.position();
        if let Some(Token::Ident(ident)) = p.next() {
            if p.peek() == Some(&Token::Colon) && !self.callables.contains(ident.name()) {
                p.next();
                let name = ident.name().to_string();
                if !ident.is_plain() {
                    return Err(error!(SyntaxError, ..&p.column(); "LABEL WITH TYPE SUFFIX"));
                }
                self.link.define_name(&name)?;
                self.force_label(&LineRef::Name(name).label());
                return Ok(());
            }
        }
        p.set_position(start);
        Ok(())
    }

    fn include(&mut self, p: &mut Parser, source: &mut dyn LineSource) -> Result<()> {
        let name = match p.next() {
            Some(Token::Literal(crate::lang::Literal::String(s))) => s.clone(),
            _ => return Err(error!(BadFileName, ..&p.column())),
        };
        if !p.is_end() {
            let col = p.peek_column();
            return Err(error!(SyntaxError, ..&col; "INCLUDE MUST STAND ALONE"));
        }
        if !self.structs.is_empty() {
            return Err(error!(SyntaxError; "INCLUDE INSIDE A BLOCK"));
        }
        source.include(&name)
    }

    /// Labels are placed even inside suppressed code so jumps still link.
    fn force_label(&mut self, label: &str) {
        let enabled = self.code.is_enabled();
        self.code.set_enabled(true);
        self.code.append_label(label);
        self.code.set_enabled(enabled);
    }

    pub(super) fn report(&mut self, e: Error) {
        let e = match e.line_number() {
            Some(_) => e,
            None => e.in_line_number(self.at.line()),
        };
        let text = format!(
            "{}: {}\n{}",
            self.at,
            e,
            mark_column(&self.line_text, &e.column())
        );
        self.diag.error(&text);
        self.count_error();
    }

    fn report_at(&mut self, at: &Location, e: Error) {
        self.diag.error(&format!("{}: {}", at, e));
        self.count_error();
    }

    fn count_error(&mut self) {
        self.errors += 1;
        if self.errors >= MAX_ERRORS && !self.aborted {
            self.aborted = true;
            self.diag.error(&format!("{}: {}", self.at, error!(TooManyErrors)));
        }
    }

    pub(super) fn warn(&mut self, msg: &str) {
        let text = format!("{}: {}", self.at, msg);
        if self.warned.insert(text.clone()) {
            self.diag.warning(&text);
        }
    }

    /// Literal warnings are skipped for compiler generated expressions.
    pub(super) fn warn_literal(&mut self, col: &Column, msg: &str) {
        if *col != (0..0) {
            self.warn(msg);
        }
    }

    pub(super) fn emit(&mut self, op: &str, args: &str) {
        self.code.append_instr(op, args);
    }

    pub(super) fn emit_hex2(&mut self, op: &str, prefix: &str, value: i64) {
        self.code.append_hex2(op, prefix, value);
    }

    pub(super) fn emit_hex4(&mut self, op: &str, prefix: &str, value: i64) {
        self.code.append_hex4(op, prefix, value);
    }

    pub(super) fn emit_label(&mut self, label: &str) {
        self.code.append_label(label);
    }

    /// Marks a library item referenced by live code.
    pub(super) fn use_item(&mut self, item: LibItem) {
        if self.code.is_enabled() {
            self.lib.mark(item);
        }
    }

    pub(super) fn call(&mut self, item: LibItem) {
        self.call_at(item.name(), item);
    }

    /// Calls an entry point defined inside the fragment of `item`.
    pub(super) fn call_at(&mut self, label: &str, item: LibItem) {
        self.emit("CALL", label);
        self.use_item(item);
    }

    pub(super) fn jump_item(&mut self, cond: &str, item: LibItem) {
        if cond.is_empty() {
            self.emit("JP", item.name());
        } else {
            self.emit("JP", &format!("{},{}", cond, item.name()));
        }
        self.use_item(item);
    }

    pub(super) fn new_label(&mut self) -> String {
        self.labels += 1;
        format!("M{}", self.labels)
    }

    /// Label of a string literal, shared by identical texts.
    pub(super) fn literal_label(&mut self, text: &str) -> String {
        if let Some((label, _)) = self.literals.iter().find(|(_, t)| t == text) {
            return label.clone();
        }
        let label = format!("SL{}", self.literals.len() + 1);
        self.literals.push((label.clone(), text.to_string()));
        label
    }

    /// A global cell the compiler uses for FOR limits and SELECT values.
    pub(super) fn hidden_cell(&mut self, ty: DataType) -> Result<Ident> {
        self.hidden += 1;
        let suffix = match ty {
            DataType::Int2 => '%',
            DataType::Int4 => '&',
            DataType::Dec6 => '!',
            DataType::Str => '$',
        };
        let ident = Ident::from_name(format!("#{}{}", self.hidden, suffix));
        let label = format!("T_{}", self.hidden);
        self.vars.declare_hidden(&ident, ty, &label)?;
        Ok(ident)
    }

    pub(super) fn current_callable(&self) -> Option<&Callable> {
        self.current.as_ref().and_then(|n| self.callables.get(n))
    }

    pub(super) fn break_check(&mut self) {
        if self.opts.break_check == super::options::BreakCheck::Always {
            self.call(LibItem::XCKBRK);
        }
    }

    fn finish(mut self) -> Option<String> {
        for entry in self.structs.drain_all() {
            let is_function = match &entry.structure {
                Structure::Callable(body) => matches!(
                    self.callables.get(&body.name).map(|c| c.kind),
                    Some(Kind::Function(_))
                ),
                _ => false,
            };
            let e = entry.structure.not_closed(is_function).in_line_number(entry.at.line());
            self.report_at(&entry.at, e);
        }
        for (at, e) in self.link.link() {
            self.report_at(&at, e);
        }
        let missing: Vec<String> = self
            .callables
            .iter()
            .filter(|c| c.calls > 0 && !c.implemented)
            .map(|c| c.name.clone())
            .collect();
        for name in missing {
            let at = self.at.clone();
            self.report_at(&at, error!(UndefinedFunction; &name));
        }
        if self.opts.warn_unused {
            let unused: Vec<String> = self
                .vars
                .by_label()
                .iter()
                .filter(|d| !d.read)
                .map(|d| d.name.clone())
                .collect();
            for name in unused {
                self.warn(&format!("VARIABLE {} NEVER READ", name));
            }
        }
        if self.errors > 0 {
            return None;
        }
        if self.opts.optimize {
            optimize::optimize(&mut self.code, &mut self.subs, &mut self.lib);
        }
        let mut body = CodeBuf::new();
        body.append_buf(&self.code);
        body.append_buf(&self.subs);
        body.append_buf(&self.data);
        for item in program::startup_items(&self.vars, self.opts.trace_line_numbers) {
            self.lib.mark(item);
        }
        let added = {
            let env = Env::new(self.target.as_ref(), self.opts);
            let mut added = self.lib.close(&env, &body);
            if self.lib.is_used(LibItem::HEAPB) && !self.lib.is_used(LibItem::MINIT) {
                self.lib.mark(LibItem::MINIT);
                added += self.lib.close(&env, &body) + 1;
            }
            added
        };
        log::debug!("library closure: {} items, {} added", self.lib.len(), added);
        let (text, warning) = program::frame(&self);
        if let Some(w) = warning {
            self.warn(&w);
        }
        Some(text)
    }
}
