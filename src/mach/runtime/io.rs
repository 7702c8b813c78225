use super::super::buffer::{hex2, hex4, CodeBuf};
use super::super::library::LibItem;
use super::super::target::InputKind;
use super::{Env, DATA_INT1, DATA_INT2, DATA_STRING, MAX_STR_LEN};

/// Console, keyboard, error exits, DATA reading and storage cells.
pub fn append(item: LibItem, buf: &mut CodeBuf, env: &Env) -> bool {
    let target = env.target;
    match item {
        LibItem::XEXIT => {
            buf.append_text("XEXIT:  LD   SP,(M_STCK)");
            target.append_exit(buf);
        }
        LibItem::XBREAK => buf.append_text(
            "XBREAK: CALL XOUTNL
                     JP   XEXIT",
        ),
        LibItem::XPAUSE => buf.append_text(&format!(
            "XPAUSE: LD   DE,{}
             XPAUS1: LD   B,0
             XPAUS2: DJNZ XPAUS2
                     DEC  DE
                     LD   A,D
                     OR   E
                     JR   NZ,XPAUS1
                     RET",
            hex4(target.loop_count_100ms() as i64)
        )),
        // Prints the text following the call and returns behind it.
        LibItem::XOUTST => buf.append_text(
            "XOUTST: EX   (SP),HL
                     CALL XOUTS
                     EX   (SP),HL
                     RET",
        ),
        LibItem::XOUTS => buf.append_text(
            "XOUTS:  LD   A,(HL)
                     INC  HL
                     OR   A
                     RET  Z
                     PUSH HL
                     CALL XOUTCH
                     POP  HL
                     JR   XOUTS",
        ),
        LibItem::OUTSP => buf.append_text(
            "OUTSP:  LD   A,20H
                     JP   XOUTCH",
        ),
        LibItem::XOUTNL => target.append_xoutnl(buf),
        LibItem::XOUTCH => target.append_xoutch(buf),
        LibItem::XINKEY => target.append_input(buf, InputKind::Inkey, env.break_on_input()),
        LibItem::XINCH => target.append_input(buf, InputKind::Inch, env.break_on_input()),
        LibItem::XCKBRK => {
            target.append_input(buf, InputKind::CheckBreak, env.break_on_input())
        }
        LibItem::XCLS => target.append_xcls(buf),
        LibItem::XLOCATE => target.append_xlocate(buf),
        LibItem::XCOLOR => target.append_xcolor(buf),
        LibItem::XBORDER => target.append_xborder(buf),
        LibItem::XCURS => target.append_xcursor(buf),
        LibItem::E_EXIT => {
            buf.append_label("E_EXIT");
            if env.opts.trace_line_numbers {
                buf.append_text(
                    "        LD   HL,(M_SRLN)
                             BIT  7,H
                             JR   NZ,E_EXI1
                             PUSH HL
                             CALL XOUTST
                             DB   ' in line'
                             DB   00H
                             POP  HL
                             CALL S_STR
                             CALL XOUTS
                     E_EXI1:",
                );
            }
            buf.append_text(
                "        CALL XOUTNL
                         JP   XEXIT",
            );
        }
        LibItem::E_STOP => error_exit(buf, "E_STOP", "Stopped"),
        LibItem::E_NOV => error_exit(buf, "E_NOV", "Numeric overflow"),
        LibItem::E_DIV0 => error_exit(buf, "E_DIV0", "Division by zero"),
        LibItem::E_IDX => error_exit(buf, "E_IDX", "Index out of range"),
        LibItem::E_PARM => error_exit(buf, "E_PARM", "Parameter out of range"),
        LibItem::E_TYPE => error_exit(buf, "E_TYPE", "Type mismatch"),
        LibItem::E_DATA => error_exit(buf, "E_DATA", "Out of data"),
        // HL tenths of a second, negative returns at once. Any key ends it.
        LibItem::PAUSE => buf.append_text(
            "PAUSE:  BIT  7,H
                     RET  NZ
             PAUSE1: LD   A,H
                     OR   L
                     RET  Z
                     DEC  HL
                     PUSH HL
                     CALL XPAUSE
                     CALL XINKEY
                     POP  HL
                     OR   A
                     JR   Z,PAUSE1
                     RET",
        ),
        LibItem::CKSTK => {
            if env.opts.stack_size == 0 {
                buf.append_text("CKSTK:  RET");
            } else {
                buf.append_text(&format!(
                    "CKSTK:  LD   HL,M_TOP-{}+10H
                             OR   A
                             SBC  HL,SP
                             RET  C
                             CALL XOUTST
                             DB   'Stack overflow'
                             DB   00H
                             JP   E_EXIT",
                    hex4(env.opts.stack_size as i64)
                ));
            }
        }
        // HL points to the variable. CY when the input was no number.
        LibItem::INIV => buf.append_text(
            "INIV:   PUSH HL
                     CALL INLNB
                     CALL F_VLI
                     EX   DE,HL
                     POP  HL
                     JR   C,INIV1
                     LD   (HL),E
                     INC  HL
                     LD   (HL),D
                     RET
             INIV1:  CALL XOUTST
                     DB   'What?'
                     DB   00H
                     CALL XOUTNL
                     SCF
                     RET",
        ),
        // Decimal input into M_ACCU, CY on bad input.
        LibItem::INDV => buf.append_text(
            "INDV:   CALL INLNB
                     CALL F_D6_VAL_S
                     RET  NC
                     CALL XOUTST
                     DB   'What?'
                     DB   00H
                     CALL XOUTNL
                     SCF
                     RET",
        ),
        LibItem::INSV => buf.append_text(
            "INSV:   LD   E,(HL)
                     INC  HL
                     LD   D,(HL)
                     DEC  HL
                     PUSH DE
                     PUSH HL
                     CALL INLNB
                     LD   A,(HL)
                     OR   A
                     JR   NZ,INSV1
                     LD   DE,D_EMPT
                     JR   INSV3
             INSV1:  PUSH HL
                     CALL MFIND
                     POP  HL
                     PUSH DE
             INSV2:  LD   A,(HL)
                     INC  HL
                     LD   (DE),A
                     INC  DE
                     OR   A
                     JR   NZ,INSV2
                     DEC  DE
                     POP  HL
                     CALL MALLOC
                     EX   DE,HL
             INSV3:  POP  HL
                     LD   (HL),E
                     INC  HL
                     LD   (HL),D
                     POP  DE
                     JP   MFREE",
        ),
        // Reads a line into M_STMP and skips leading blanks.
        LibItem::INLNB => buf.append_text(&format!(
            "INLNB:  LD   HL,M_STMP
                     LD   C,{}
                     CALL INLNR
                     LD   HL,M_STMP-1
             INLNB1: INC  HL
                     LD   A,(HL)
                     OR   A
                     RET  Z
                     CP   21H
                     JR   C,INLNB1
                     RET",
            hex2(MAX_STR_LEN)
        )),
        // HL buffer, C capacity without the terminator.
        LibItem::INLNR => buf.append_text(
            "INLNR:  PUSH HL
                     LD   B,C
             INLNR1: LD   (HL),20H
                     INC  HL
                     DJNZ INLNR1
                     POP  HL
                     LD   B,00H
                     JR   INLNR3
             INLNR2: PUSH BC
                     PUSH HL
                     LD   A,D
                     CALL XOUTCH
                     POP  HL
                     POP  BC
             INLNR3: PUSH HL
                     PUSH BC
                     CALL XINCH
                     POP  BC
                     POP  HL
                     LD   D,A
                     CP   08H
                     JR   Z,INLNR5
                     CP   7FH
                     JR   Z,INLNR5
                     CP   09H
                     JR   Z,INLNR6
                     CP   0DH
                     JR   Z,INLNR7
                     CP   20H
                     JR   C,INLNR3
             INLNR4: LD   A,B
                     CP   C
                     JR   NC,INLNR3
                     LD   (HL),D
                     INC  HL
                     INC  B
                     JR   INLNR2
             INLNR5: LD   A,B
                     OR   A
                     JR   Z,INLNR3
                     DEC  HL
                     DEC  B
                     PUSH BC
                     PUSH HL
                     LD   A,D
                     CALL XOUTCH
                     LD   A,20H
                     CALL XOUTCH
                     POP  HL
                     POP  BC
                     JR   INLNR2
             INLNR6: LD   A,B
                     CP   C
                     JR   NC,INLNR3
                     INC  HL
                     INC  B
                     JR   INLNR2
             INLNR7: LD   (HL),00H
                     JP   XOUTNL",
        ),
        LibItem::P_I => buf.append_text(
            "P_I:    CALL S_STR
                     JP   XOUTS",
        ),
        LibItem::P_D6 => buf.append_text(
            "P_D6:   CALL S_STR_D6
                     JP   XOUTS",
        ),
        // HL blanks.
        LibItem::P_TAB => buf.append_text(
            "P_TAB:  BIT  7,H
                     JP   NZ,E_PARM
             P_TAB1: LD   A,H
                     OR   L
                     RET  Z
                     PUSH HL
                     CALL OUTSP
                     POP  HL
                     DEC  HL
                     JR   P_TAB1",
        ),
        LibItem::DINIT => buf.append_text(
            "DINIT:  LD   HL,DBEG
                     LD   (M_READ),HL
                     RET",
        ),
        // HL points to the variable, M_READ to the next DATA entry.
        LibItem::DREADI => buf.append_text(&format!(
            "DREADI: LD   DE,(M_READ)
                     LD   A,(DE)
                     OR   A
                     JP   Z,E_DATA
                     CP   {}
                     JR   Z,DRDI1
                     CP   {}
                     JP   NZ,E_TYPE
                     INC  DE
                     LD   A,(DE)
                     INC  DE
                     LD   C,A
                     LD   A,(DE)
                     INC  DE
                     LD   (HL),C
                     INC  HL
                     LD   (HL),A
                     LD   (M_READ),DE
                     RET
             DRDI1:  INC  DE
                     LD   A,(DE)
                     INC  DE
                     LD   (HL),A
                     INC  HL
                     LD   (HL),00H
                     LD   (M_READ),DE
                     RET",
            hex2(DATA_INT1 as i64),
            hex2(DATA_INT2 as i64)
        )),
        // The variable ends up pointing into the pool; its old value is freed.
        LibItem::DREADS => buf.append_text(&format!(
            "DREADS: LD   DE,(M_READ)
                     LD   A,(DE)
                     OR   A
                     JP   Z,E_DATA
                     CP   {}
                     JP   NZ,E_TYPE
                     INC  DE
                     LD   C,(HL)
                     INC  HL
                     LD   B,(HL)
                     LD   (HL),D
                     DEC  HL
                     LD   (HL),E
             DRDS1:  LD   A,(DE)
                     INC  DE
                     OR   A
                     JR   NZ,DRDS1
                     LD   (M_READ),DE
                     LD   D,B
                     LD   E,C
                     JP   MFREE",
            hex2(DATA_STRING as i64)
        )),
        LibItem::M_SRLN => buf.append_text("M_SRLN: DS   2"),
        LibItem::M_READ => buf.append_text("M_READ: DS   2"),
        LibItem::M_FRET => buf.append_text("M_FRET: DS   4"),
        LibItem::M_INKB => buf.append_text("M_INKB: DS   2"),
        LibItem::M_STMP => buf.append_text(&format!(
            "M_STMP: DS   {}",
            hex4(MAX_STR_LEN + 1)
        )),
        LibItem::M_CVTBUF => buf.append_text("M_CVTBUF: DS 10H"),
        LibItem::M_STCK => buf.append_text("M_STCK: DS   2"),
        _ => return false,
    }
    true
}

fn error_exit(buf: &mut CodeBuf, label: &str, message: &str) {
    buf.append_label(label);
    buf.append_instr("CALL", "XOUTST");
    buf.append_string_literal(message);
    buf.append_instr("JP", "E_EXIT");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mach::options::Options;
    use crate::mach::target;

    #[test]
    fn test_stack_check_follows_stack_size() {
        let t = target::lookup("z1013").unwrap();
        let mut opts = Options::new();
        let mut buf = CodeBuf::new();
        append(LibItem::CKSTK, &mut buf, &Env::new(t.as_ref(), &opts));
        assert!(buf.iter().any(|i| i.is("LD", "HL,M_TOP-0080H+10H")));
        opts.stack_size = 0;
        let mut buf = CodeBuf::new();
        append(LibItem::CKSTK, &mut buf, &Env::new(t.as_ref(), &opts));
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.to_string(), "CKSTK:\tRET\n");
    }

    #[test]
    fn test_error_exit_message() {
        let t = target::lookup("kc85").unwrap();
        let opts = Options::new();
        let mut buf = CodeBuf::new();
        assert!(append(LibItem::E_DIV0, &mut buf, &Env::new(t.as_ref(), &opts)));
        assert_eq!(
            buf.to_string(),
            "E_DIV0:\n\tCALL\tXOUTST\n\tDB\t'Division by zero'\n\tDB\t00H\n\tJP\tE_EXIT\n"
        );
    }

    #[test]
    fn test_line_trace_on_abort() {
        let t = target::lookup("z9001").unwrap();
        let mut opts = Options::new();
        let mut buf = CodeBuf::new();
        append(LibItem::E_EXIT, &mut buf, &Env::new(t.as_ref(), &opts));
        assert!(!buf.iter().any(|i| i.args.contains("M_SRLN")));
        opts.trace_line_numbers = true;
        let mut buf = CodeBuf::new();
        append(LibItem::E_EXIT, &mut buf, &Env::new(t.as_ref(), &opts));
        assert!(buf.iter().any(|i| i.is("LD", "HL,(M_SRLN)")));
        assert!(buf.contains_call("S_STR"));
    }
}
