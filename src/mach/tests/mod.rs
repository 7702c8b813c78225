use super::{compile, CollectDiagnostics, Options};
use crate::lang::Source;

mod control_test;
mod data_test;
mod expr_test;
mod program_test;

/// No header, no optimizer and no unused warnings, so bodies stay literal.
fn plain() -> Options {
    Options {
        header: false,
        optimize: false,
        warn_unused: false,
        ..Options::default()
    }
}

fn compile_with(text: &str, opts: &Options) -> (Option<String>, CollectDiagnostics) {
    let mut source = Source::from_str(text);
    let mut diag = CollectDiagnostics::new();
    let out = compile(&mut source, opts, &mut diag);
    (out, diag)
}

fn asm(text: &str) -> String {
    let (out, diag) = compile_with(text, &plain());
    match out {
        Some(s) => s,
        None => panic!("unexpected errors: {:?}", diag.errors),
    }
}

fn errors(text: &str) -> Vec<String> {
    let (out, diag) = compile_with(text, &plain());
    assert!(out.is_none(), "expected errors for {:?}", text);
    assert!(diag.has_errors());
    diag.errors
}

fn has_error(text: &str, needle: &str) -> bool {
    let errs = errors(text);
    let found = errs.iter().any(|e| e.contains(needle));
    if !found {
        eprintln!("{:?}", errs);
    }
    found
}

/// Output lines without surrounding whitespace.
fn lines(out: &str) -> Vec<&str> {
    out.lines().map(str::trim).filter(|l| !l.is_empty()).collect()
}

fn position(out: &str, seq: &[&str]) -> Option<usize> {
    lines(out).windows(seq.len()).position(|w| w == seq)
}

fn has(out: &str, seq: &[&str]) -> bool {
    let found = position(out, seq).is_some();
    if !found {
        eprintln!("{}", out);
    }
    found
}

fn count(out: &str, line: &str) -> usize {
    lines(out).iter().filter(|l| **l == line).count()
}

/// Lines from `start` up to and including the first `end` after it.
fn section<'a>(out: &'a str, start: &str, end: &str) -> Vec<&'a str> {
    let all = lines(out);
    let from = all.iter().position(|l| *l == start).unwrap_or(all.len());
    let rest = &all[from..];
    let to = rest.iter().position(|l| *l == end).map(|i| i + 1).unwrap_or(rest.len());
    rest[..to].to_vec()
}
