use super::*;

#[test]
fn test_constant_folding() {
    let out = asm("10 A = 2+3*4");
    assert!(has(&out, &["L10:", "LD\tHL,000EH", "LD\t(V_A),HL"]));
    assert!(!out.contains("O_MUL"));
    let out = asm("10 A = LEN(\"ABC\") + ASC(\"A\")");
    assert!(has(&out, &["LD\tHL,0044H", "LD\t(V_A),HL"]));
    let out = asm("10 A = -(7 MOD 4)");
    assert!(has(&out, &["LD\tHL,0FFFDH", "LD\t(V_A),HL"]));
}

#[test]
fn test_cint_rounds_half_even() {
    assert!(has(&asm("10 A = CINT(2.5)"), &["LD\tHL,0002H", "LD\t(V_A),HL"]));
    assert!(has(&asm("10 A = CINT(3.5)"), &["LD\tHL,0004H", "LD\t(V_A),HL"]));
    assert!(has(&asm("10 A = CINT(-2.5)"), &["LD\tHL,0FFFEH", "LD\t(V_A),HL"]));
}

#[test]
fn test_constant_errors() {
    assert!(has_error("10 A = 1/0", "DIVISION BY ZERO IN 10"));
    assert!(has_error("10 A = 5 MOD 0", "DIVISION BY ZERO IN 10"));
    assert!(has_error("10 A = 32767+1", "OVERFLOW IN 10"));
    assert!(has_error("10 A$ = \"X\"+1", "TYPE MISMATCH IN 10"));
    assert!(has_error("10 A = \"X\"", "TYPE MISMATCH IN 10"));
    assert!(has_error("10 A$ = \"X\"-\"Y\"", "TYPE MISMATCH IN 10"));
}

#[test]
fn test_long_constant() {
    let out = asm("10 A& = 100000");
    assert!(has(
        &out,
        &["LD\tHL,86A0H", "LD\tDE,0001H", "LD\t(VL_A),HL", "LD\t(VL_A+2),DE"]
    ));
    assert!(out.contains("VL_A:\tDS\t0004H"));
}

#[test]
fn test_increment_shortcut() {
    let out = asm("10 A = A + 1\n20 B = B - 1\n30 C = C + 2");
    assert!(has(&out, &["L10:", "LD\tHL,(V_A)", "CALL\tO_INC", "LD\t(V_A),HL"]));
    assert!(has(&out, &["L20:", "LD\tHL,(V_B)", "CALL\tO_DEC", "LD\t(V_B),HL"]));
    assert!(has(&out, &["L30:", "LD\tHL,(V_C)", "LD\tDE,0002H", "CALL\tO_ADD"]));
}

#[test]
fn test_comparison_yields_flag() {
    let out = asm("10 A = B < C");
    assert!(has(&out, &["LD\tHL,(V_B)", "LD\tDE,(V_C)", "CALL\tO_LT", "LD\t(V_A),HL"]));
    assert!(out.contains("\nO_LT:"));
}

#[test]
fn test_string_literals_are_shared() {
    let out = asm("10 A$ = \"HI\"\n20 B$ = \"HI\"\n30 C$ = \"\"");
    assert_eq!(count(&out, "LD\tHL,SL1"), 2);
    assert!(!out.contains("SL2"));
    assert!(has(&out, &["SL1:", "DB\t'HI'", "DB\t00H"]));
    assert!(has(&out, &["L30:", "LD\tHL,D_EMPT"]));
}

#[test]
fn test_string_concat() {
    let out = asm("10 A$ = B$ + C$");
    assert!(out.contains("\tCALL\tS_CAT\n"));
    assert!(out.contains("\nS_CAT:"));
    let out = asm("10 PRINT \"AB\" + \"C\"");
    assert!(has(&out, &["CALL\tXOUTST", "DB\t'ABC'", "DB\t00H", "CALL\tXOUTNL"]));
    assert!(!out.contains("S_CAT"));
}

#[test]
fn test_implicit_declaration() {
    let (out, diag) = compile_with("10 A = 1\n20 PRINT A", &plain());
    assert!(out.is_some());
    assert!(diag.warning_contains("IMPLICIT DECLARATION OF A"));

    let opts = Options {
        implicit_declaration: false,
        ..plain()
    };
    let (out, diag) = compile_with("10 A = 1", &opts);
    assert!(out.is_none());
    assert!(diag.error_contains("UNDECLARED VARIABLE IN 10"));
    let (out, diag) = compile_with("10 DIM A\n20 A = 1", &opts);
    assert!(out.is_some());
    assert!(!diag.warning_contains("IMPLICIT"));
}

#[test]
fn test_arrays_are_never_implicit() {
    assert!(has_error("10 A(1) = 1", "UNDECLARED VARIABLE IN 10"));
    assert!(has_error("10 DIM A(3)\n20 A = 1", "TYPE MISMATCH IN 20"));
    assert!(has_error("10 DIM A\n20 A(1) = 1", "TYPE MISMATCH IN 20"));
}

#[test]
fn test_print_separators() {
    let out = asm("10 PRINT 1, 2;");
    assert!(has(&out, &["LD\tHL,0001H", "CALL\tP_I", "CALL\tOUTSP", "LD\tHL,0002H", "CALL\tP_I"]));
    let body = section(&out, "L10:", "CALL\tXEXIT");
    assert!(!body.contains(&"CALL\tXOUTNL"));
}

#[test]
fn test_shift_operators() {
    assert!(has(&asm("10 A = 1 SHL 4"), &["LD\tHL,0010H", "LD\t(V_A),HL"]));
    assert!(has(&asm("10 A = -1 SHR 12"), &["LD\tHL,000FH", "LD\t(V_A),HL"]));
    assert!(has(&asm("10 A = 1 SHL 16"), &["LD\tHL,0000H", "LD\t(V_A),HL"]));
    let out = asm("10 A = B SHL 1");
    assert!(has(&out, &["LD\tHL,(V_B)", "ADD\tHL,HL", "LD\t(V_A),HL"]));
    assert!(!out.contains("O_SHL"));
    let out = asm("10 A = B SHR C");
    assert!(has(&out, &["LD\tHL,(V_B)", "LD\tDE,(V_C)", "CALL\tO_SHR", "LD\t(V_A),HL"]));
    assert!(out.contains("\nO_SHR:"));
    assert!(has_error("10 A = 1 SHL -1", "OVERFLOW IN 10"));
    assert!(has_error("10 A = 1.5 SHR 1", "TYPE MISMATCH IN 10"));
}

#[test]
fn test_string_functions_fold() {
    let out = asm("10 PRINT UPPER$(\"abc\"); LCASE$(\"XY\"); TRIM$(\"  q  \"); MIRROR$(\"ABC\")");
    assert!(has(&out, &["CALL\tXOUTST", "DB\t'ABC'"]));
    assert!(has(&out, &["CALL\tXOUTST", "DB\t'xy'"]));
    assert!(has(&out, &["CALL\tXOUTST", "DB\t'q'"]));
    assert!(has(&out, &["CALL\tXOUTST", "DB\t'CBA'"]));
    let out = asm("10 PRINT HEX$(255); HEX$(255, 4); BIN$(5); BIN$(5, 8); STRING$(3, \"AB\"); STRING$(2, 42)");
    for text in &["'FF'", "'00FF'", "'101'", "'00000101'", "'ABABAB'", "'**'"] {
        assert!(out.contains(&format!("DB\t{}\n", text)), "{}", text);
    }
    assert!(!out.contains("S_HEX"));
    assert!(has(&asm("10 A = INSTR(\"HELLO\", \"LO\")"), &["LD\tHL,0004H", "LD\t(V_A),HL"]));
    assert!(has(&asm("10 A = INSTR(4, \"HELLO\", \"L\")"), &["LD\tHL,0004H", "LD\t(V_A),HL"]));
    assert!(has(&asm("10 A = INSTR(\"HELLO\", \"Z\")"), &["LD\tHL,0000H", "LD\t(V_A),HL"]));
    assert!(has(&asm("10 A = SQR(17)"), &["LD\tHL,0004H", "LD\t(V_A),HL"]));
}

#[test]
fn test_string_functions_at_runtime() {
    let out = asm("10 A$ = UPPER$(B$)");
    assert!(has(&out, &["LD\tHL,(VS_B)", "CALL\tS_UPR"]));
    assert!(out.contains("\nS_UPR:"));
    let out = asm("10 A$ = TRIM$(B$)");
    assert!(out.contains("\nS_LTRIM:") && out.contains("\nS_RTRIM:"));
    let out = asm("10 A = INSTR(3, B$, \"X\")");
    assert!(has(
        &out,
        &[
            "LD\tHL,0003H",
            "PUSH\tHL",
            "LD\tHL,(VS_B)",
            "PUSH\tHL",
            "LD\tHL,SL1",
            "EX\tDE,HL",
            "POP\tHL",
            "POP\tBC",
            "CALL\tF_INSTN"
        ]
    ));
    assert!(out.contains("\nF_INSTR:"));
    let out = asm("10 A$ = HEX$(B, 4)");
    assert!(has(
        &out,
        &["LD\tHL,(V_B)", "PUSH\tHL", "LD\tHL,0004H", "LD\tB,H", "LD\tC,L", "POP\tHL", "CALL\tS_HEXN"]
    ));
    assert!(out.contains("\nS_HEX:") && out.contains("\nS_HXA:"));
    let out = asm("10 A$ = STRING$(N, B$)");
    assert!(has(
        &out,
        &["LD\tHL,(VS_B)", "PUSH\tHL", "LD\tHL,(V_N)", "LD\tB,H", "LD\tC,L", "POP\tHL", "CALL\tS_STS"]
    ));
    let out = asm("10 A$ = STRING$(N, 42)");
    assert!(has(&out, &["LD\tHL,(V_N)", "PUSH\tHL", "LD\tHL,002AH", "POP\tBC", "CALL\tS_STC"]));
    assert!(has_error("10 A$ = UPPER$(1)", "TYPE MISMATCH IN 10"));
    assert!(has_error("10 A = INSTR(0, \"A\", \"B\")", "OVERFLOW IN 10"));
}

#[test]
fn test_rnd_sqr_and_deek() {
    let out = asm("10 A = RND(6)\n20 B = SQR(C)");
    assert!(has(&out, &["LD\tHL,0006H", "CALL\tF_RND", "LD\t(V_A),HL"]));
    assert!(has(&out, &["LD\tHL,(V_C)", "CALL\tF_SQR", "LD\t(V_B),HL"]));
    assert!(out.contains("M_RND:\tDS\t2"));
    assert!(has_error("10 A = SQR(-4)", "OVERFLOW IN 10"));
    assert!(has(&asm("10 A = DEEK(&H1000)"), &["LD\tHL,(1000H)", "LD\t(V_A),HL"]));
    assert!(has(
        &asm("10 A = DEEK(B)"),
        &["LD\tHL,(V_B)", "LD\tA,(HL)", "INC\tHL", "LD\tH,(HL)", "LD\tL,A", "LD\t(V_A),HL"]
    ));
}

#[test]
fn test_doke_and_tab() {
    assert!(has(&asm("10 DOKE &H2000, A"), &["LD\tHL,(V_A)", "LD\t(2000H),HL"]));
    assert!(has(
        &asm("10 DOKE B, A"),
        &["LD\tHL,(V_B)", "PUSH\tHL", "LD\tHL,(V_A)", "POP\tDE", "EX\tDE,HL", "LD\t(HL),E", "INC\tHL", "LD\t(HL),D"]
    ));
    let out = asm("10 PRINT TAB(4); \"X\"\n20 TAB(2)");
    assert!(has(&out, &["LD\tHL,0004H", "CALL\tP_TAB", "CALL\tXOUTST", "DB\t'X'"]));
    assert!(has(&out, &["L20:", "LD\tHL,0002H", "CALL\tP_TAB"]));
    assert!(out.contains("\nP_TAB:"));
}
