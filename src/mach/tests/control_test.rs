use super::*;
use proptest::prelude::*;

#[test]
fn test_do_loop_until_constant() {
    let out = asm("10 DO\n20 EXIT DO\n30 LOOP UNTIL 0");
    assert!(has(
        &out,
        &["L10:", "M1:", "L20:", "JP\tM2", "L30:", "JP\tM1", "M2:"]
    ));
}

#[test]
fn test_do_while_tests_at_top() {
    let out = asm("10 DO WHILE A\n20 A = A - 1\n30 LOOP");
    assert!(has(
        &out,
        &["L10:", "M1:", "LD\tHL,(V_A)", "LD\tA,H", "OR\tL", "JP\tZ,M2"]
    ));
    assert!(has(&out, &["L30:", "JP\tM1", "M2:"]));
}

#[test]
fn test_while_wend() {
    let out = asm("10 I=0\n20 WHILE I<3\n30 I=I+1\n40 WEND");
    assert!(has(
        &out,
        &[
            "L20:",
            "M1:",
            "LD\tHL,(V_I)",
            "LD\tDE,0003H",
            "CALL\tO_LT",
            "LD\tA,H",
            "OR\tL",
            "JP\tZ,M2"
        ]
    ));
    assert!(has(&out, &["L30:", "LD\tHL,(V_I)", "CALL\tO_INC", "LD\t(V_I),HL"]));
    assert!(has(&out, &["L40:", "JP\tM1", "M2:"]));
}

#[test]
fn test_constant_if_keeps_one_branch() {
    let out = asm("10 IF 1 THEN PRINT \"A\" ELSE PRINT \"B\"");
    assert!(out.contains("'A'"));
    assert!(!out.contains("'B'"));
    let out = asm("10 IF 0 THEN\n20 PRINT \"A\"\n30 ELSE\n40 PRINT \"B\"\n50 END IF");
    assert!(!out.contains("'A'"));
    assert!(has(&out, &["L40:", "CALL\tXOUTST", "DB\t'B'", "DB\t00H", "CALL\tXOUTNL", "L50:"]));
    assert!(has(&out, &["L20:", "L30:", "L40:"]));
}

#[test]
fn test_constant_string_condition() {
    assert!(has_error("10 IF \"X\" THEN PRINT 1", "TYPE MISMATCH IN 10"));
}

#[test]
fn test_block_if_labels() {
    let out = asm(
        "10 A=2\n20 IF A=1 THEN\n30 PRINT \"ONE\"\n40 ELSEIF A=2 THEN\n\
         50 PRINT \"TWO\"\n60 ELSE\n70 PRINT \"MANY\"\n80 END IF",
    );
    assert!(has(
        &out,
        &["L20:", "LD\tHL,(V_A)", "LD\tDE,0001H", "CALL\tO_EQ", "LD\tA,H", "OR\tL", "JP\tZ,M1"]
    ));
    assert!(has(&out, &["L40:", "JP\tM2", "M1:"]));
    assert!(has(&out, &["L60:", "JP\tM2", "M3:"]));
    assert!(has(&out, &["L80:", "M2:"]));
    assert_eq!(count(&out, "JP\tZ,M3"), 1);
}

#[test]
fn test_single_line_if_goto() {
    let out = asm("10 IF A THEN 30 ELSE 40\n30 END\n40 END");
    assert!(has(&out, &["JP\tZ,M1", "JP\tL30", "JP\tM2", "M1:", "JP\tL40", "M2:"]));
    let out = asm("10 IF A GOTO 20\n20 END");
    assert!(has(&out, &["JP\tZ,M1", "JP\tL20", "M1:", "L20:"]));
}

#[test]
fn test_for_next_post_test() {
    let out = asm("10 FOR I=1 TO 10\n20 NEXT I");
    assert!(has(&out, &["LD\tHL,0001H", "LD\t(V_I),HL", "M1:", "L20:"]));
    assert!(has(
        &out,
        &[
            "L20:",
            "LD\tHL,(V_I)",
            "CALL\tO_INC",
            "LD\t(V_I),HL",
            "LD\tHL,(V_I)",
            "LD\tDE,000AH",
            "CALL\tO_LE",
            "LD\tA,H",
            "OR\tL",
            "JP\tZ,M2",
            "JP\tM1",
            "M2:"
        ]
    ));
}

#[test]
fn test_for_negative_step_and_cells() {
    let out = asm("10 FOR I=10 TO 1 STEP -1\n20 NEXT");
    assert!(out.contains("\tCALL\tO_GE\n"));
    assert!(!out.contains("\tCALL\tO_LE\n"));
    let out = asm("10 N=5\n20 FOR I=1 TO N\n30 NEXT");
    assert!(has(&out, &["LD\tHL,(V_N)", "LD\t(T_1),HL", "M1:"]));
    assert!(out.contains("T_1:\tDS\t0002H"));
}

#[test]
fn test_for_needs_numeric() {
    assert!(has_error("10 FOR A$=\"A\" TO \"B\"\n20 NEXT", "TYPE MISMATCH"));
    assert!(has_error("10 FOR I=1 TO 2\n20 NEXT J", "NEXT WITHOUT FOR IN 20"));
}

#[test]
fn test_select_case() {
    let out = asm(
        "10 X=2\n20 SELECT CASE X\n30 CASE 1\n40 PRINT \"ONE\"\n50 CASE 2,3\n\
         60 PRINT \"MORE\"\n70 CASE ELSE\n80 PRINT \"OTHER\"\n90 END SELECT",
    );
    assert!(has(&out, &["LD\tHL,(V_X)", "LD\t(T_1),HL"]));
    assert!(has(
        &out,
        &["L30:", "LD\tHL,(T_1)", "LD\tDE,0001H", "CALL\tO_EQ", "LD\tA,H", "OR\tL", "JP\tZ,M2"]
    ));
    assert!(has(&out, &["L50:", "JP\tM1", "M2:"]));
    assert_eq!(count(&out, "JP\tNZ,M4"), 2);
    assert!(has(&out, &["JP\tM3", "M4:", "L60:"]));
    assert!(has(&out, &["L70:", "JP\tM1", "M3:"]));
    assert!(has(&out, &["L90:", "M1:"]));
}

#[test]
fn test_select_range() {
    let out = asm("10 SELECT CASE K\n20 CASE 1 TO 5\n30 PRINT 1\n40 END SELECT");
    assert!(out.contains("\tCALL\tO_GE\n"));
    assert!(out.contains("\tCALL\tO_LE\n"));
    assert!(out.contains("\tCALL\tO_AND\n"));
}

#[test]
fn test_exit_targets() {
    let out = asm("10 FOR I=1 TO 3\n20 IF I=2 THEN EXIT FOR\n30 NEXT");
    assert!(has(&out, &["JP\tZ,M3", "JP\tM2", "M3:"]));
    assert!(has_error("10 EXIT FOR", "EXIT WITHOUT LOOP IN 10"));
    assert!(has_error("10 DO\n20 EXIT FOR\n30 LOOP", "EXIT WITHOUT LOOP IN 20"));
    assert!(has_error("10 EXIT SUB", "EXIT WITHOUT LOOP"));
}

#[test]
fn test_exit_do_from_inner_for() {
    let out = asm("10 DO\n20 FOR I=1 TO 3\n30 EXIT DO\n40 NEXT\n50 LOOP");
    assert!(has(&out, &["L30:", "JP\tM2", "L40:"]));
    assert!(has(&out, &["L50:", "JP\tM1", "M2:"]));
    let out = asm("10 FOR I=1 TO 3\n20 WHILE A\n30 EXIT FOR\n40 WEND\n50 NEXT");
    assert!(has(&out, &["L30:", "JP\tM2", "L40:"]));
    assert!(has_error("10 SUB S\n20 EXIT DO\n30 END SUB", "EXIT WITHOUT LOOP IN 20"));
}

#[test]
fn test_unmatched_closers() {
    assert!(has_error("10 LOOP", "LOOP WITHOUT DO IN 10"));
    assert!(has_error("10 NEXT", "NEXT WITHOUT FOR IN 10"));
    assert!(has_error("10 WEND", "WEND WITHOUT WHILE IN 10"));
    assert!(has_error("10 END IF", "END IF WITHOUT IF IN 10"));
    assert!(has_error("10 ELSE", "ELSE WITHOUT IF IN 10"));
    assert!(has_error("10 CASE 1", "CASE WITHOUT SELECT IN 10"));
    assert!(has_error("10 END SELECT", "END SELECT WITHOUT SELECT IN 10"));
    assert!(has_error("10 IF 1 THEN PRINT 1\n20 END IF", "END IF WITHOUT IF IN 20"));
}

#[test]
fn test_unclosed_openers() {
    assert!(has_error("10 DO", "DO WITHOUT LOOP IN 10"));
    assert!(has_error("10 FOR I=1 TO 2", "FOR WITHOUT NEXT IN 10"));
    assert!(has_error("10 WHILE 1", "WHILE WITHOUT WEND IN 10"));
    assert!(has_error("10 IF 1 THEN", "IF WITHOUT END IF IN 10"));
    assert!(has_error("10 SELECT CASE 1", "SELECT WITHOUT END SELECT IN 10"));
}

#[test]
fn test_crossed_structures() {
    let errs = errors("10 DO\n20 FOR I=1 TO 2\n30 LOOP\n40 NEXT");
    assert!(errs.iter().any(|e| e.contains("LOOP WITHOUT DO IN 30")));
    assert!(errs.iter().any(|e| e.contains("DO WITHOUT LOOP IN 10")));
}

#[derive(Debug, Clone)]
enum Block {
    Print,
    Do(Vec<Block>),
    While(Vec<Block>),
    For(Vec<Block>),
    If(Vec<Block>, Vec<Block>),
    Select(Vec<Block>),
}

fn block() -> impl Strategy<Value = Block> {
    Just(Block::Print).prop_recursive(4, 32, 3, |inner| {
        let body = prop::collection::vec(inner, 0..3);
        prop_oneof![
            body.clone().prop_map(Block::Do),
            body.clone().prop_map(Block::While),
            body.clone().prop_map(Block::For),
            (body.clone(), body.clone()).prop_map(|(a, b)| Block::If(a, b)),
            body.prop_map(Block::Select),
        ]
    })
}

fn render(b: &Block, depth: usize, out: &mut Vec<String>) {
    let body = |v: &[Block], out: &mut Vec<String>| {
        for x in v {
            render(x, depth + 1, out);
        }
    };
    match b {
        Block::Print => out.push("PRINT 1".into()),
        Block::Do(v) => {
            out.push("DO".into());
            body(v, out);
            out.push("LOOP UNTIL 1".into());
        }
        Block::While(v) => {
            out.push("WHILE 0".into());
            body(v, out);
            out.push("WEND".into());
        }
        Block::For(v) => {
            out.push(format!("FOR I{}=1 TO 2", depth));
            body(v, out);
            out.push(format!("NEXT I{}", depth));
        }
        Block::If(a, b) => {
            out.push("IF K THEN".into());
            body(a, out);
            out.push("ELSE".into());
            body(b, out);
            out.push("END IF".into());
        }
        Block::Select(v) => {
            out.push("SELECT CASE K".into());
            out.push("CASE 1".into());
            body(v, out);
            out.push("END SELECT".into());
        }
    }
}

proptest! {
    #[test]
    fn test_balanced_programs_compile(blocks in prop::collection::vec(block(), 1..4)) {
        let mut text = vec![];
        for b in &blocks {
            render(b, 0, &mut text);
        }
        let (out, diag) = compile_with(&text.join("\n"), &plain());
        prop_assert!(out.is_some(), "{:?}", diag.errors);
    }
}
