use super::super::buffer::CodeBuf;
use super::super::library::LibItem;

/// Two byte integer routines. Binary operators take the left operand
/// in HL and the right one in DE and return in HL; comparisons return
/// -1 or 0.
pub fn append(item: LibItem, buf: &mut CodeBuf) -> bool {
    let text = match item {
        LibItem::CKIDX => {
            "CKIDX:  LD   A,H
                     OR   A
                     JP   M,E_IDX
                     SBC  HL,BC
                     JP   NC,E_IDX
                     ADD  HL,BC
                     RET"
        }
        LibItem::O_AND => {
            "O_AND:  LD   A,H
                     AND  D
                     LD   H,A
                     LD   A,L
                     AND  E
                     LD   L,A
                     RET"
        }
        LibItem::O_OR => {
            "O_OR:   LD   A,H
                     OR   D
                     LD   H,A
                     LD   A,L
                     OR   E
                     LD   L,A
                     RET"
        }
        LibItem::O_XOR => {
            "O_XOR:  LD   A,H
                     XOR  D
                     LD   H,A
                     LD   A,L
                     XOR  E
                     LD   L,A
                     RET"
        }
        LibItem::O_NOT => {
            "O_NOT:  LD   A,H
                     CPL
                     LD   H,A
                     LD   A,L
                     CPL
                     LD   L,A
                     RET"
        }
        LibItem::O_LT => {
            "O_LT:   CALL CPHLDE
                     LD   HL,0000H
                     RET  NC
                     DEC  HL
                     RET"
        }
        LibItem::O_LE => {
            "O_LE:   CALL CPHLDE
                     LD   HL,0FFFFH
                     RET  C
                     RET  Z
                     INC  HL
                     RET"
        }
        LibItem::O_GT => {
            "O_GT:   CALL CPHLDE
                     LD   HL,0000H
                     RET  C
                     RET  Z
                     DEC  HL
                     RET"
        }
        LibItem::O_GE => {
            "O_GE:   CALL CPHLDE
                     LD   HL,0FFFFH
                     RET  NC
                     INC  HL
                     RET"
        }
        LibItem::O_EQ => {
            "O_EQ:   OR   A
                     SBC  HL,DE
                     LD   HL,0FFFFH
                     RET  Z
                     INC  HL
                     RET"
        }
        LibItem::O_NE => {
            "O_NE:   OR   A
                     SBC  HL,DE
                     LD   HL,0FFFFH
                     RET  NZ
                     INC  HL
                     RET"
        }
        // Signed compare, CY when HL < DE and Z when equal.
        // BC, DE and HL are preserved.
        LibItem::CPHLDE => {
            "CPHLDE: LD   A,H
                     XOR  D
                     JP   P,CPHD1
                     EX   DE,HL
                     CALL CPHD1
                     EX   DE,HL
                     RET
             CPHD1:  LD   A,H
                     CP   D
                     RET  NZ
                     LD   A,L
                     CP   E
                     RET"
        }
        LibItem::O_INC => {
            "O_INC:  INC  HL
                     LD   A,80H
                     XOR  H
                     OR   L
                     RET  NZ
                     JP   E_NOV"
        }
        LibItem::O_DEC => {
            "O_DEC:  LD   A,80H
                     XOR  H
                     OR   L
                     JP   Z,E_NOV
                     DEC  HL
                     RET"
        }
        // O_SUB falls through into O_ADD.
        LibItem::O_ADD => {
            "O_SUB:  PUSH HL
                     EX   DE,HL
                     CALL NEGHL
                     EX   DE,HL
                     POP  HL
             O_ADD:  LD   A,H
                     XOR  D
                     LD   A,D
                     ADD  HL,DE
                     RET  M
                     XOR  H
                     RET  P
                     JP   E_NOV"
        }
        LibItem::O_MUL => {
            "O_MUL:  LD   B,00H
                     CALL ABSHL
                     EX   DE,HL
                     CALL ABSHL
                     EX   DE,HL
                     LD   A,H
                     OR   A
                     JR   Z,O_MUL1
                     LD   A,D
                     OR   A
                     EX   DE,HL
                     JP   NZ,E_NOV
             O_MUL1: LD   A,L
                     LD   HL,0000H
                     OR   A
                     JR   Z,O_MUL3
             O_MUL2: ADD  HL,DE
                     JP   C,E_NOV
                     DEC  A
                     JR   NZ,O_MUL2
             O_MUL3: LD   A,H
                     OR   A
                     JP   M,E_NOV
                     LD   A,B
                     OR   A
                     CALL M,NEGHL
                     RET"
        }
        // O_DIV2 is the unsigned core: DE = HL / DE, remainder in HL.
        // The remainder of O_MOD takes the sign of the dividend.
        LibItem::O_DIV => {
            "O_DIV:  LD   B,00H
                     CALL ABSHL
                     EX   DE,HL
                     CALL ABSHL
                     EX   DE,HL
                     LD   A,D
                     OR   E
                     JP   Z,E_DIV0
                     PUSH BC
                     CALL O_DIV2
                     EX   DE,HL
                     POP  BC
             O_DIV1: LD   A,H
                     OR   A
                     JP   M,E_NOV
                     LD   A,B
                     OR   A
                     CALL M,NEGHL
                     RET
             O_DIV2: LD   A,H
                     LD   C,L
                     LD   HL,0000H
                     LD   B,10H
             O_DIV3: RL   C
                     RLA
                     ADC  HL,HL
                     SBC  HL,DE
                     JR   NC,O_DIV4
                     ADD  HL,DE
             O_DIV4: DJNZ O_DIV3
                     RL   C
                     RLA
                     CPL
                     LD   D,A
                     LD   A,C
                     CPL
                     LD   E,A
                     RET
             O_MOD:  LD   A,D
                     OR   A
                     JP   M,O_MOD2
                     OR   E
                     JP   Z,E_DIV0
             O_MOD1: LD   B,00H
                     CALL ABSHL
                     PUSH BC
                     CALL O_DIV2
                     POP  BC
                     JR   O_DIV1
             O_MOD2: EX   DE,HL
                     CALL NEGHL
                     EX   DE,HL
                     JR   O_MOD1"
        }
        // Bit 7 of B flips with every negation.
        LibItem::ABSHL => {
            "ABSHL:  LD   A,H
                     OR   A
                     RET  P
             NEGHL:  LD   A,H
                     OR   L
                     RET  Z
                     LD   A,H
                     PUSH AF
                     CPL
                     LD   H,A
                     LD   A,L
                     CPL
                     LD   L,A
                     INC  HL
                     POP  AF
                     XOR  H
                     JP   P,E_NOV
                     LD   A,B
                     XOR  80H
                     LD   B,A
                     RET"
        }
        LibItem::F_SGN => {
            "F_SGN:  LD   A,H
                     OR   L
                     RET  Z
                     LD   A,H
                     OR   A
                     LD   HL,0001H
                     RET  P
                     DEC  HL
                     DEC  HL
                     RET"
        }
        LibItem::I2_MAX => {
            "I2_MAX: CALL CPHLDE
                     RET  NC
                     EX   DE,HL
                     RET"
        }
        LibItem::I2_MIN => {
            "I2_MIN: CALL CPHLDE
                     RET  C
                     EX   DE,HL
                     RET"
        }
        // Logical shifts of HL by DE bits. 16 and more clear HL.
        LibItem::O_SHL => {
            "O_SHL:  LD   A,D
                     OR   A
                     JP   M,E_PARM
                     JR   NZ,O_SHL2
                     OR   E
                     RET  Z
                     LD   B,E
             O_SHL1: ADD  HL,HL
                     DJNZ O_SHL1
                     RET
             O_SHL2: LD   HL,0000H
                     RET"
        }
        LibItem::O_SHR => {
            "O_SHR:  LD   A,D
                     OR   A
                     JP   M,E_PARM
                     JR   NZ,O_SHR2
                     OR   E
                     RET  Z
                     LD   B,E
             O_SHR1: SRL  H
                     RR   L
                     DJNZ O_SHR1
                     RET
             O_SHR2: LD   HL,0000H
                     RET"
        }
        // HL upper bound. Returns 1 to HL, stirred by the refresh register.
        LibItem::F_RND => {
            "F_RND:  LD   A,H
                     OR   A
                     JP   M,E_PARM
                     OR   L
                     JP   Z,E_PARM
                     EX   DE,HL
                     LD   HL,M_RND
                     LD   A,R
                     RLD
                     INC  HL
                     RLD
                     LD   HL,(M_RND)
                     OR   A
             F_RND1: SBC  HL,DE
                     JR   NC,F_RND1
                     ADD  HL,DE
                     INC  HL
                     RET"
        }
        // Integer part of the square root, by subtracting odd numbers.
        LibItem::F_SQR => {
            "F_SQR:  BIT  7,H
                     JP   NZ,E_PARM
                     LD   DE,0001H
                     LD   BC,0000H
             F_SQR1: OR   A
                     SBC  HL,DE
                     JR   C,F_SQR2
                     INC  BC
                     INC  DE
                     INC  DE
                     JR   F_SQR1
             F_SQR2: LD   H,B
                     LD   L,C
                     RET"
        }
        LibItem::M_RND => "M_RND:  DS   2",
        _ => return false,
    };
    buf.append_text(text);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mach::buffer::Instr;

    #[test]
    fn test_sub_falls_into_add() {
        let mut buf = CodeBuf::new();
        assert!(append(LibItem::O_ADD, &mut buf));
        let labels: Vec<&str> = buf.iter().filter_map(|i| i.label.as_deref()).collect();
        assert_eq!(labels, vec!["O_SUB", "O_ADD"]);
        assert_eq!(buf.last(), Some(&Instr::new("JP", "E_NOV")));
    }

    #[test]
    fn test_not_integer() {
        let mut buf = CodeBuf::new();
        assert!(!append(LibItem::S_CAT, &mut buf));
        assert!(buf.is_empty());
    }
}
