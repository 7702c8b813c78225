mod common;
use basic::mach::{CollectDiagnostics, Options};
use common::*;

#[test]
fn test_hello_world() {
    let (out, diag) = compile_with("10 PRINT \"HI\"", &Options::default());
    let out = out.unwrap();
    assert!(!diag.has_errors());
    assert!(out.starts_with(";"));
    assert!(has(&out, &["CALL\tXOUTST", "DB\t'HI'", "DB\t00H"]));
    assert_eq!(labels(&out).iter().filter(|l| **l == "XOUTST").count(), 1);
    assert!(!out.contains("DBEG"));
    assert!(!out.contains("VARBEG"));
    assert!(!out.contains("HEAPB"));
    assert!(out.trim_end().ends_with("M_TOP:"));
}

#[test]
fn test_do_loop_with_exit() {
    let out = asm("10 DO\n20 EXIT DO\n30 LOOP UNTIL 0");
    assert!(has(&out, &["L10:", "M1:", "L20:", "JP\tM2", "L30:", "JP\tM1", "M2:"]));
}

#[test]
fn test_bounds_checked_element() {
    let out = asm("10 DIM A(5,3)\n20 A(I,J) = 1");
    assert!(has(&out, &["LD\tBC,0006H", "CALL\tCKIDX"]));
    assert!(has(&out, &["LD\tBC,0004H", "CALL\tCKIDX"]));
}

#[test]
fn test_string_local_freed_once() {
    let out = asm("10 SUB S\n20 LOCAL T$\n30 T$ = \"A\"\n40 END SUB\n50 S");
    let all = lines(&out);
    let start = all.iter().position(|l| *l == "SUB_S:").unwrap();
    let end = start + all[start..].iter().position(|l| *l == "RET").unwrap();
    let frees = all[start..end].iter().filter(|l| **l == "CALL\tMFREE").count();
    assert_eq!(frees, 1);
    assert!(has(&out, &["CALL\tMFREE", "LD\tSP,IY", "POP\tIY", "RET"]));
}

#[test]
fn test_literal_shared_between_statements() {
    let out = asm("10 A$ = \"SAME\"\n20 B$ = \"SAME\"");
    let defs: Vec<&str> = labels(&out).into_iter().filter(|l| l.starts_with("SL")).collect();
    assert_eq!(defs, ["SL1"]);
    assert_eq!(out.matches("'SAME'").count(), 1);
}

#[test]
fn test_constant_condition_drops_branch() {
    let out = asm("10 IF 0 THEN PRINT \"DEAD\" ELSE PRINT \"LIVE\"");
    assert!(!out.contains("DEAD"));
    assert!(out.contains("'LIVE'"));
}

#[test]
fn test_errors_suppress_output() {
    let (out, diag) = compile_with("10 PRINT \"OK\"\n20 GOTO 30", &Options::default());
    assert!(out.is_none());
    assert_eq!(diag.errors.len(), 1);
    assert!(diag.errors[0].contains("UNDEFINED LINE IN 20"));
}

#[test]
fn test_warnings_keep_output() {
    let mut diag = CollectDiagnostics::new();
    let mut source = basic::lang::Source::from_str("10 X = 1");
    let out = basic::mach::compile(&mut source, &Options::default(), &mut diag);
    assert!(out.is_some());
    assert!(diag.warning_contains("IMPLICIT DECLARATION OF X"));
    assert!(diag.warning_contains("VARIABLE X NEVER READ"));
}

#[test]
fn test_wide_literal_warns() {
    let mut diag = CollectDiagnostics::new();
    let mut source = basic::lang::Source::from_str("10 A& = 40000\n20 PRINT A&");
    let out = basic::mach::compile(&mut source, &Options::default(), &mut diag);
    assert!(out.is_some());
    assert!(diag.warning_contains("40000 WIDENED TO LONG"));

    let mut diag = CollectDiagnostics::new();
    let mut source = basic::lang::Source::from_str("10 A& = 30000\n20 PRINT A&");
    assert!(basic::mach::compile(&mut source, &Options::default(), &mut diag).is_some());
    assert!(!diag.warning_contains("WIDENED"));
}
