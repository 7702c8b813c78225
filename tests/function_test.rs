mod common;
use basic::mach::Options;
use common::*;

fn program(text: &str) -> String {
    let (out, diag) = compile_with(text, &Options::default());
    match out {
        Some(s) => s,
        None => panic!("unexpected errors: {:?}", diag.errors),
    }
}

fn defines(out: &str, label: &str) -> bool {
    labels(out).contains(&label)
}

#[test]
fn test_case_and_trim_functions() {
    let out = program("10 INPUT A$\n20 PRINT UPPER$(A$); LOWER$(A$)\n30 PRINT TRIM$(A$); LTRIM$(A$); RTRIM$(A$)\n40 PRINT MIRROR$(A$)");
    for label in &["S_UPR", "S_LWR", "S_TRIM", "S_LTRIM", "S_RTRIM", "S_MIRR", "STNCP", "M_STMP"] {
        assert!(defines(&out, label), "{} missing", label);
    }
    assert!(has(&out, &["S_TRIM:\tCALL\tS_LTRIM", "JP\tS_RTRIM"]));
}

#[test]
fn test_radix_functions() {
    let out = program("10 INPUT A\n20 PRINT HEX$(A); BIN$(A, 12)");
    for label in &["S_HEX", "S_HEXN", "S_HXA", "S_BIN", "S_BINN", "M_CVTBUF"] {
        assert!(defines(&out, label), "{} missing", label);
    }
    assert!(call_targets(&out).contains(&"S_BINN"));

    let out = program("10 PRINT HEX$(&HBEEF); BIN$(6, 4)");
    assert!(has(&out, &["DB\t'BEEF'", "DB\t00H"]));
    assert!(has(&out, &["DB\t'0110'", "DB\t00H"]));
    assert!(!defines(&out, "S_HEX"));
}

#[test]
fn test_instr_and_string_of() {
    let out = program("10 INPUT A$, B$, N\n20 PRINT INSTR(A$, B$); INSTR(2, A$, \"X\")\n30 PRINT STRING$(3, A$); STRING$(N, 61); STRING$(2, 61)");
    for label in &["F_INSTR", "F_INSTN", "S_STS", "S_STC"] {
        assert!(defines(&out, label), "{} missing", label);
    }
    let calls = call_targets(&out);
    assert!(calls.contains(&"F_INSTR") && calls.contains(&"F_INSTN"));
    assert!(has(&out, &["DB\t'=='", "DB\t00H"]));
}

#[test]
fn test_shift_operators() {
    let out = program("10 INPUT A, B\n20 PRINT A SHL B; A SHR B\n30 PRINT A SHL 1");
    assert!(defines(&out, "O_SHL") && defines(&out, "O_SHR"));
    assert!(lines(&out).contains(&"ADD\tHL,HL"));
    let (out, diag) = compile_with("10 PRINT 1.5 SHL 1", &Options::default());
    assert!(out.is_none());
    assert!(diag.errors[0].contains("TYPE MISMATCH IN 10"));
}

#[test]
fn test_rnd_and_sqr() {
    let out = program("10 INPUT N\n20 PRINT RND(N); SQR(N)");
    for label in &["F_RND", "F_SQR", "M_RND", "E_PARM"] {
        assert!(defines(&out, label), "{} missing", label);
    }
    let out = program("10 PRINT SQR(144)");
    assert!(!defines(&out, "F_SQR"));
    assert!(has(&out, &["LD\tHL,000CH", "CALL\tP_I"]));
}

#[test]
fn test_deek_doke_and_tab() {
    let out = program("10 DOKE &H8000, 1234\n20 PRINT DEEK(&H8000)\n30 INPUT P\n40 DOKE P, DEEK(P)\n50 PRINT TAB(8); \"X\"");
    assert!(has(&out, &["LD\tHL,04D2H", "LD\t(8000H),HL"]));
    assert!(has(&out, &["LD\tHL,(8000H)", "CALL\tP_I"]));
    assert!(has(&out, &["LD\tA,(HL)", "INC\tHL", "LD\tH,(HL)", "LD\tL,A"]));
    assert!(has(&out, &["LD\t(HL),E", "INC\tHL", "LD\t(HL),D"]));
    assert!(defines(&out, "P_TAB"));
    assert!(call_targets(&out).contains(&"P_TAB"));
}

#[test]
fn test_graphics_and_files_are_rejected() {
    for text in &[
        "10 SCREEN 1",
        "10 PSET 10, 20",
        "10 CIRCLE (10, 10), 5",
        "10 OPEN \"DATA\" FOR INPUT AS 1",
        "10 PRINT #1, A",
    ] {
        let (out, diag) = compile_with(text, &Options::default());
        assert!(out.is_none(), "{}", text);
        assert!(diag.errors[0].contains("SYNTAX ERROR IN 10"), "{:?}", diag.errors);
    }
}
