#![allow(dead_code)]

use basic::lang::Source;
use basic::mach::{compile, CollectDiagnostics, Options};

pub fn compile_with(text: &str, opts: &Options) -> (Option<String>, CollectDiagnostics) {
    let mut source = Source::from_str(text);
    let mut diag = CollectDiagnostics::new();
    let out = compile(&mut source, opts, &mut diag);
    (out, diag)
}

/// Defaults without optimizer and header so generated labels stay put.
pub fn literal_options() -> Options {
    Options {
        header: false,
        optimize: false,
        ..Options::default()
    }
}

pub fn asm(text: &str) -> String {
    let (out, diag) = compile_with(text, &literal_options());
    match out {
        Some(s) => s,
        None => panic!("unexpected errors: {:?}", diag.errors),
    }
}

pub fn lines(out: &str) -> Vec<&str> {
    out.lines().map(str::trim).filter(|l| !l.is_empty()).collect()
}

pub fn has(out: &str, seq: &[&str]) -> bool {
    let found = lines(out).windows(seq.len()).any(|w| w == seq);
    if !found {
        eprintln!("{}", out);
    }
    found
}

/// Labels defined in the output, one entry per definition.
pub fn labels(out: &str) -> Vec<&str> {
    out.lines()
        .filter_map(|l| l.split('\t').next())
        .filter_map(|l| l.strip_suffix(':'))
        .filter(|l| !l.is_empty() && !l.starts_with(';'))
        .collect()
}

/// Operands of every `CALL` and `JP`, condition codes removed.
pub fn call_targets(out: &str) -> Vec<&str> {
    out.lines()
        .filter_map(|l| {
            let mut parts = l.split('\t');
            parts.next();
            match (parts.next(), parts.next()) {
                (Some("CALL"), Some(args)) | (Some("JP"), Some(args)) => {
                    args.rsplit(',').next()
                }
                _ => None,
            }
        })
        .collect()
}
