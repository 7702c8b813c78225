mod common;
use basic::mach::{lookup_target, Options};
use common::*;

fn for_target(name: &str) -> Options {
    let mut opts = literal_options();
    opts.apply(&format!("target={}", name)).unwrap();
    opts
}

#[test]
fn test_z1013_has_no_prolog() {
    let (out, _) = compile_with("10 CLS", &for_target("z1013"));
    let out = out.unwrap();
    assert!(has(&out, &["ORG\t0100H", "MSTART:"]));
    assert!(out.contains("\nXCLS:"));
}

#[test]
fn test_z9001_prolog_names_program() {
    let mut opts = for_target("kc87");
    opts.apply("app_name=demo").unwrap();
    let (out, _) = compile_with("10 BORDER 1", &opts);
    let out = out.unwrap();
    assert!(has(&out, &["ORG\t0300H", "JP\tMSTART"]));
    assert!(out.contains("DEMO"));
    assert!(out.contains("\nXBORDER:"));
}

#[test]
fn test_kc85_accepts_color() {
    let (out, diag) = compile_with("10 COLOR 7, 1", &for_target("kc85"));
    assert!(out.is_some(), "{:?}", diag.errors);
}

#[test]
fn test_capabilities() {
    let z1013 = lookup_target("z1013").unwrap();
    assert!(z1013.cls());
    assert!(!z1013.border());
    let kc85 = lookup_target("KC85/3").unwrap();
    assert!(kc85.color());
    assert!(lookup_target("spectrum").is_none());
}

#[test]
fn test_unknown_target_option() {
    let mut opts = Options::default();
    assert!(opts.apply("target=spectrum").is_err());
    assert_eq!(opts.get("target").as_deref(), Some("z1013"));
}
