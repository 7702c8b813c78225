use super::*;
use crate::lang::MemLoader;

#[test]
fn test_hello_layout() {
    let out = asm("10 PRINT \"HI\"");
    assert!(has(
        &out,
        &["L10:", "CALL\tXOUTST", "DB\t'HI'", "DB\t00H", "CALL\tXOUTNL", "CALL\tXEXIT"]
    ));
    assert!(has(&out, &["ORG\t0100H", "MSTART:", "LD\t(M_STCK),SP", "LD\tSP,M_TOP"]));
    assert!(out.contains("\nXOUTST:"));
    assert!(!out.contains("DBEG"));
    assert!(!out.contains("VARBEG"));
    assert_eq!(lines(&out).last(), Some(&"M_TOP:"));
}

#[test]
fn test_header_and_origin() {
    let opts = Options {
        header: true,
        begin_addr: Some(0x300),
        ..plain()
    };
    let mut source = Source::from_str("10 END");
    let mut diag = CollectDiagnostics::new();
    let out = super::super::compile_stamped(&mut source, &opts, &mut diag, Some("2024-01-01".into()))
        .unwrap();
    let all = lines(&out);
    assert_eq!(all[0], "; MYAPP");
    assert_eq!(all[1], "; target Z1013");
    assert!(all[2].ends_with("at 2024-01-01"));
    assert!(out.contains("\tORG\t0300H\n"));
}

#[test]
fn test_variables_block() {
    let out = asm("10 A = 1\n20 B$ = \"X\"\n30 PRINT A; B$");
    assert!(has(&out, &["VARBEG:", "VS_B:\tDS\t0002H", "V_A:\tDS\t0002H", "VAREND:"]));
    assert!(has(
        &out,
        &[
            "LD\tHL,VARBEG",
            "LD\tDE,VARBEG+1",
            "LD\tBC,VAREND-VARBEG-1",
            "LD\t(HL),00H",
            "LDIR",
            "LD\tDE,D_EMPT",
            "LD\t(VS_B),DE"
        ]
    ));
    let vars = position(&out, &["VARBEG:"]).unwrap();
    let top = position(&out, &["M_TOP:"]).unwrap();
    assert!(vars < top);
}

#[test]
fn test_heap_is_set_up_for_strings() {
    let out = asm("10 A$ = B$ + C$");
    assert!(out.contains("\nHEAPB:"));
    assert!(out.contains("\tCALL\tMINIT\n"));
    let out = asm("10 PRINT 1");
    assert!(!out.contains("HEAPB"));
}

#[test]
fn test_other_targets() {
    let opts = Options {
        target: "z9001".to_string(),
        ..plain()
    };
    let (out, _) = compile_with("10 CLS\n20 BORDER 2", &opts);
    let out = out.unwrap();
    assert!(has(&out, &["ORG\t0300H", "JP\tMSTART"]));
    assert!(out.contains("\tCALL\tXBORDER\n"));
    assert!(has_error("10 BORDER 2", "NOT SUPPORTED BY TARGET IN 10"));

    let opts = Options {
        target: "c64".to_string(),
        ..plain()
    };
    let (out, diag) = compile_with("10 END", &opts);
    assert!(out.is_none());
    assert!(diag.error_contains("NOT SUPPORTED BY TARGET"));
}

#[test]
fn test_line_errors() {
    assert!(has_error("10 GOTO 99", "UNDEFINED LINE IN 10"));
    assert!(has_error("10 ON A GOSUB 20, 30\n20 RETURN", "UNDEFINED LINE IN 10"));
    assert!(has_error("10 PRINT\n10 PRINT", "DUPLICATE LINE"));
    let errs = errors("10 PRINT 1+");
    assert!(errs[0].starts_with("<input>:1: SYNTAX ERROR IN 10"), "{:?}", errs);
}

#[test]
fn test_error_recovery_continues() {
    let errs = errors("10 PRINT 1+\n20 GOTO 99\n30 A = \"X\"");
    assert_eq!(errs.len(), 3);
    assert!(errs[1].contains("TYPE MISMATCH IN 30"));
    assert!(errs[2].contains("UNDEFINED LINE IN 20"));
}

#[test]
fn test_too_many_errors() {
    let text: Vec<String> = (1..=60).map(|n| format!("{} PRINT 1+", n * 10)).collect();
    let errs = errors(&text.join("\n"));
    assert_eq!(errs.len(), super::super::MAX_ERRORS + 1);
    assert!(errs.last().unwrap().contains("TOO MANY ERRORS"));
}

#[test]
fn test_warnings() {
    let (out, diag) = compile_with("20 A = 1\n10 END", &Options::default());
    assert!(out.is_some());
    assert!(diag.warning_contains("VARIABLE A NEVER READ"));
    assert!(diag.warning_contains("IMPLICIT DECLARATION OF A"));
    assert!(diag.warning_contains("LINE 10 OUT OF ORDER"));
}

#[test]
fn test_goto_gosub_and_labels() {
    let out = asm("10 GOSUB 40\n20 GOTO START\n30 START: END\n40 RETURN");
    assert!(has(&out, &["L10:", "CALL\tL40"]));
    assert!(has(&out, &["L20:", "JP\tL_START", "L30:", "L_START:", "JP\tXEXIT"]));
    assert!(has(&out, &["L40:", "RET"]));
    assert!(has_error("10 GOTO NOWHERE", "UNDEFINED LINE"));
}

#[test]
fn test_on_goto_table() {
    let out = asm("10 ON K GOTO 20, 30\n20 END\n30 END");
    assert!(has(
        &out,
        &[
            "LD\tHL,(V_K)",
            "LD\tA,H",
            "OR\tA",
            "JR\tNZ,M1",
            "LD\tA,L",
            "DEC\tA",
            "JP\tZ,L20",
            "DEC\tA",
            "JP\tZ,L30",
            "M1:"
        ]
    ));
}

#[test]
fn test_trace_and_source_comments() {
    let opts = Options {
        trace_line_numbers: true,
        include_source: true,
        ..plain()
    };
    let (out, _) = compile_with("10 PRINT 1", &opts);
    let out = out.unwrap();
    assert!(has(&out, &[";10 PRINT 1", "L10:", "LD\tHL,000AH", "LD\t(M_SRLN),HL"]));
    assert!(has(&out, &["LD\tHL,0000H", "LD\t(M_SRLN),HL"]));
    assert!(out.contains("\nM_SRLN:"));
}

#[test]
fn test_break_check_in_loops() {
    let opts = Options {
        break_check: super::super::BreakCheck::Always,
        ..plain()
    };
    let (out, _) = compile_with("10 DO\n20 LOOP", &opts);
    let out = out.unwrap();
    assert!(has(&out, &["L20:", "CALL\tXCKBRK", "JP\tM1", "M2:"]));
}

#[test]
fn test_include() {
    let loader = MemLoader::new().with("LIB.BAS", "100 SUB HELLO\n110 PRINT \"HELLO\"\n120 END SUB");
    let mut source = Source::new("MAIN.BAS", "10 INCLUDE \"LIB.BAS\"\n20 HELLO", Box::new(loader));
    let mut diag = CollectDiagnostics::new();
    let out = compile(&mut source, &plain(), &mut diag).unwrap();
    assert!(has(&out, &["L20:", "CALL\tSUB_HELLO"]));
    assert!(out.contains("\nSUB_HELLO:"));

    let mut source = Source::from_str("10 INCLUDE \"NOPE.BAS\"");
    let mut diag = CollectDiagnostics::new();
    assert!(compile(&mut source, &plain(), &mut diag).is_none());
    assert!(diag.error_contains("FILE NOT FOUND"));
}

#[test]
fn test_optimizer_drops_jump_to_next() {
    let opts = Options {
        optimize: true,
        ..plain()
    };
    let (out, _) = compile_with("10 GOTO 20\n20 PRINT 1", &opts);
    let out = out.unwrap();
    assert!(!out.contains("JP\tL20"));
    assert!(!out.contains("L20:"));
}

#[test]
fn test_optimizer_compare_jump() {
    let opts = Options {
        optimize: true,
        ..plain()
    };
    let (out, _) = compile_with("10 IF A<5 THEN PRINT 1", &opts);
    let out = out.unwrap();
    assert!(has(&out, &["LD\tHL,(V_A)", "LD\tDE,0005H", "CALL\tCPHLDE", "JP\tNC,M1"]));
    assert!(!out.contains("O_LT:"));
    assert!(out.contains("\nCPHLDE:"));
}
