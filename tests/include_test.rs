mod common;
use basic::lang::{FileLoader, MemLoader, Source};
use basic::mach::{compile, CollectDiagnostics};
use common::*;
use std::path::PathBuf;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("basic-z80-{}-{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_include_from_disk() {
    let dir = scratch_dir("include");
    std::fs::write(dir.join("lib.bas"), "100 SUB GREET\n110 PRINT \"HI\"\n120 END SUB\n").unwrap();
    let mut source = Source::new(
        "main.bas",
        "10 INCLUDE \"lib.bas\"\n20 GREET",
        Box::new(FileLoader::new(dir.clone())),
    );
    let mut diag = CollectDiagnostics::new();
    let out = compile(&mut source, &literal_options(), &mut diag);
    std::fs::remove_dir_all(&dir).ok();
    let out = out.unwrap();
    assert!(has(&out, &["L20:", "CALL\tSUB_GREET"]));
    assert!(has(&out, &["L110:", "CALL\tXOUTST", "DB\t'HI'"]));
}

#[test]
fn test_errors_name_the_included_file() {
    let loader = MemLoader::new().with("BAD.BAS", "100 PRINT 1+");
    let mut source = Source::new("MAIN.BAS", "10 INCLUDE \"BAD.BAS\"", Box::new(loader));
    let mut diag = CollectDiagnostics::new();
    assert!(compile(&mut source, &literal_options(), &mut diag).is_none());
    assert!(diag.errors[0].starts_with("BAD.BAS:1: SYNTAX ERROR IN 100"), "{:?}", diag.errors);
}

#[test]
fn test_nested_include_rejected() {
    let loader = MemLoader::new()
        .with("A.BAS", "100 INCLUDE \"B.BAS\"")
        .with("B.BAS", "200 END");
    let mut source = Source::new("MAIN.BAS", "10 INCLUDE \"A.BAS\"", Box::new(loader));
    let mut diag = CollectDiagnostics::new();
    assert!(compile(&mut source, &literal_options(), &mut diag).is_none());
    assert!(diag.error_contains("NESTED INCLUDE"));
}

#[test]
fn test_include_must_stand_alone() {
    let (out, diag) = compile_with("10 PRINT 1: INCLUDE \"X.BAS\"", &literal_options());
    assert!(out.is_none());
    assert!(diag.error_contains("SYNTAX ERROR"));
}
