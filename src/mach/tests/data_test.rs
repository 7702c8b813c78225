use super::*;

#[test]
fn test_data_pool_encoding() {
    let out = asm("10 DATA 1,300,\"AB\",-1\n20 READ A%");
    assert!(has(
        &out,
        &[
            "DBEG:",
            "DL10:",
            "DB\t01H,01H",
            "DB\t02H,2CH,01H",
            "DB\t03H",
            "DB\t'AB'",
            "DB\t00H",
            "DB\t02H,0FFH,0FFH",
            "DB\t00H"
        ]
    ));
}

#[test]
fn test_read_targets() {
    let out = asm("10 DATA 1,\"X\"\n20 READ A%,B$");
    assert!(has(&out, &["L20:", "LD\tHL,VI_A", "CALL\tDREADI", "LD\tHL,VS_B", "CALL\tDREADS"]));
    assert!(out.contains("\tCALL\tDINIT\n"));
    assert!(out.contains("\nDINIT:"));
    assert!(out.contains("\nM_READ:"));
}

#[test]
fn test_read_without_data_keeps_pool() {
    let out = asm("10 READ A%");
    assert!(has(&out, &["DBEG:", "DB\t00H"]));
}

#[test]
fn test_restore() {
    let out = asm("10 DATA 1\n20 DATA 2\n30 RESTORE 20\n40 READ A%");
    assert!(has(&out, &["L30:", "LD\tHL,DL20", "LD\t(M_READ),HL"]));
    let out = asm("10 DATA 1\n20 RESTORE\n30 READ A%");
    assert!(has(&out, &["L20:", "CALL\tDINIT"]));
    assert!(has_error("10 DATA 1\n20 PRINT 1\n30 RESTORE 20", "UNDEFINED LINE"));
    assert!(has_error("10 RESTORE 99", "UNDEFINED LINE"));
}

#[test]
fn test_data_errors() {
    assert!(has_error("10 DATA 1.5", "TYPE MISMATCH IN 10"));
    assert!(has_error("10 DATA 70000", "OVERFLOW IN 10"));
    assert!(has_error("10 DATA X", "SYNTAX ERROR IN 10"));
    let long = format!("10 DATA \"{}\"", "A".repeat(256));
    assert!(has_error(&long, "STRING TOO LONG"));
}

#[test]
fn test_constant_subscripts_fold() {
    let out = asm("10 DIM A(5,3)\n20 A(2,1) = 7\n30 PRINT A(2,1)");
    assert!(has(&out, &["L20:", "LD\tHL,0007H", "LD\t(V_A+18),HL"]));
    assert!(has(&out, &["L30:", "LD\tHL,(V_A+18)", "CALL\tP_I"]));
    assert!(out.contains("V_A:\tDS\t0030H"));
    assert!(!out.contains("CKIDX"));
}

#[test]
fn test_runtime_subscripts_checked() {
    let out = asm("10 DIM A(5,3)\n20 A(I,J) = 7");
    assert!(has(&out, &["LD\tHL,(V_I)", "LD\tBC,0006H", "CALL\tCKIDX", "PUSH\tHL"]));
    assert!(has(&out, &["LD\tHL,(V_J)", "LD\tBC,0004H", "CALL\tCKIDX", "POP\tDE"]));
    assert!(has(&out, &["CALL\tO_MUL", "POP\tDE", "ADD\tHL,DE", "ADD\tHL,HL", "LD\tDE,V_A", "ADD\tHL,DE"]));
    assert!(out.contains("\nCKIDX:"));

    let opts = Options {
        check_bounds: false,
        ..plain()
    };
    let (out, _) = compile_with("10 DIM A(5)\n20 A(I) = 7", &opts);
    let out = out.unwrap();
    assert!(!out.contains("CKIDX"));
}

#[test]
fn test_subscript_errors() {
    assert!(has_error("10 DIM A(5,3)\n20 A(6,0) = 1", "SUBSCRIPT OUT OF RANGE IN 20"));
    assert!(has_error("10 DIM A(5,3)\n20 A(-1,0) = 1", "SUBSCRIPT OUT OF RANGE IN 20"));
    assert!(has_error("10 DIM A(5,3)\n20 A(1) = 1", "SYNTAX ERROR IN 20"));
    assert!(has_error("10 DIM A(5)\n20 DIM A(5)", "DUPLICATE DEFINITION IN 20"));
    assert!(has_error("10 DIM A(N)", "SUBSCRIPT OUT OF RANGE IN 10"));
    assert!(has_error("10 DIM A(1,2,3)", "SYNTAX ERROR IN 10"));
}

#[test]
fn test_string_array_starts_empty() {
    let out = asm("10 DIM N$(3)\n20 N$(1) = \"X\"");
    assert!(has(
        &out,
        &["LD\tDE,D_EMPT", "LD\tHL,VS_N", "LD\tBC,0004H", "MSI1:\tLD\t(HL),E", "INC\tHL", "LD\t(HL),D"]
    ));
    assert!(out.contains("VS_N:\tDS\t0008H"));
}

#[test]
fn test_typed_dim() {
    let out = asm("10 DIM T AS LONG, S AS STRING\n20 T = 1\n30 S = \"Q\"");
    assert!(out.contains("V_T:\tDS\t0004H"));
    assert!(out.contains("V_S:\tDS\t0002H"));
}
