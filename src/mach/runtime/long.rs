use super::super::buffer::CodeBuf;
use super::super::library::LibItem;

/// Four byte integer routines. Values travel in DEHL with the high
/// word in DE. Binary operators expect the left operand in the
/// alternate register set and return in the active one.
pub fn append(item: LibItem, buf: &mut CodeBuf) -> bool {
    let text = match item {
        LibItem::I4_ADD => {
            "I4_ADD: PUSH DE
                     PUSH HL
                     EXX
                     POP  BC
                     ADD  HL,BC
                     POP  BC
                     EX   DE,HL
                     ADC  HL,BC
                     EX   DE,HL
                     JP   PE,E_NOV
                     RET"
        }
        LibItem::I4_SUB => {
            "I4_SUB: PUSH DE
                     PUSH HL
                     EXX
                     POP  BC
                     OR   A
                     SBC  HL,BC
                     POP  BC
                     EX   DE,HL
                     SBC  HL,BC
                     EX   DE,HL
                     JP   PE,E_NOV
                     RET"
        }
        LibItem::I4_LT => {
            "I4_LT:  CALL I4_CMP
                     LD   HL,0000H
                     RET  NC
                     DEC  HL
                     RET"
        }
        LibItem::I4_LE => {
            "I4_LE:  CALL I4_CMP
                     LD   HL,0FFFFH
                     RET  C
                     RET  Z
                     INC  HL
                     RET"
        }
        LibItem::I4_GT => {
            "I4_GT:  CALL I4_CMP
                     LD   HL,0000H
                     RET  C
                     RET  Z
                     DEC  HL
                     RET"
        }
        LibItem::I4_GE => {
            "I4_GE:  CALL I4_CMP
                     LD   HL,0FFFFH
                     RET  NC
                     INC  HL
                     RET"
        }
        LibItem::I4_EQ => {
            "I4_EQ:  CALL I4_CMP
                     LD   HL,0FFFFH
                     RET  Z
                     INC  HL
                     RET"
        }
        LibItem::I4_NE => {
            "I4_NE:  CALL I4_CMP
                     LD   HL,0FFFFH
                     RET  NZ
                     INC  HL
                     RET"
        }
        // Signed compare of left and right. CY when left < right,
        // Z when equal. Both register sets are preserved.
        LibItem::I4_CMP => {
            "I4_CMP: PUSH DE
                     PUSH HL
                     EXX
                     PUSH DE
                     PUSH HL
                     EXX
                     CALL I4_CMP1
                     EXX
                     POP  HL
                     POP  DE
                     EXX
                     POP  HL
                     POP  DE
                     RET
             I4_CMP1: PUSH DE
                     PUSH HL
                     EXX
                     POP  BC
                     OR   A
                     SBC  HL,BC
                     EX   DE,HL
                     POP  BC
                     SBC  HL,BC
                     EXX
                     JP   PE,I4_CMP3
                     JP   M,I4_CMP4
                     EXX
                     LD   A,H
                     OR   L
                     OR   D
                     OR   E
                     EXX
                     RET
             I4_CMP3: JP  M,I4_CMP5
             I4_CMP4: XOR A
                     INC  A
                     SCF
                     RET
             I4_CMP5: XOR A
                     INC  A
                     RET"
        }
        LibItem::I4_MAX => {
            "I4_MAX: CALL I4_CMP
                     RET  C
                     EXX
                     RET"
        }
        LibItem::I4_MIN => {
            "I4_MIN: CALL I4_CMP
                     RET  NC
                     EXX
                     RET"
        }
        LibItem::I4_MUL => {
            "I4_MUL: CALL I4_SIGNS
                     LD   (M_I4A),HL
                     LD   (M_I4A+2),DE
                     EXX
                     LD   B,20H
                     EXX
                     LD   HL,0000H
                     LD   D,H
                     LD   E,L
             I4_MUL1: ADD HL,HL
                     EX   DE,HL
                     ADC  HL,HL
                     EX   DE,HL
                     JP   M,E_NOV
                     EXX
                     ADD  HL,HL
                     EX   DE,HL
                     ADC  HL,HL
                     EX   DE,HL
                     EXX
                     JR   NC,I4_MUL2
                     LD   BC,(M_I4A)
                     ADD  HL,BC
                     EX   DE,HL
                     LD   BC,(M_I4A+2)
                     ADC  HL,BC
                     EX   DE,HL
                     JP   M,E_NOV
             I4_MUL2: EXX
                     DEC  B
                     EXX
                     JR   NZ,I4_MUL1
                     LD   A,(M_I4S)
                     OR   A
                     RET  P
                     JP   I4_NEG_DEHL_RAW"
        }
        // Restoring division of the magnitudes. The quotient ends up in
        // the active set and the remainder in the alternate one.
        LibItem::I4_DIV => {
            "I4_DIV: CALL I4_DIV2
                     LD   A,(M_I4S)
             I4_DIV1: OR  A
                     RET  P
                     JP   I4_NEG_DEHL_RAW
             I4_MOD: CALL I4_DIV2
                     EXX
                     LD   A,(M_I4S+1)
                     JR   I4_DIV1
             I4_DIV2: LD  A,D
                     OR   E
                     OR   H
                     OR   L
                     JP   Z,E_DIV0
                     CALL I4_SIGNS
                     LD   (M_I4A),HL
                     LD   (M_I4A+2),DE
                     LD   HL,0000H
                     LD   D,H
                     LD   E,L
                     EXX
                     LD   B,20H
             I4_DIV3: ADD HL,HL
                     EX   DE,HL
                     ADC  HL,HL
                     EX   DE,HL
                     EXX
                     ADC  HL,HL
                     EX   DE,HL
                     ADC  HL,HL
                     EX   DE,HL
                     LD   BC,(M_I4A)
                     OR   A
                     SBC  HL,BC
                     EX   DE,HL
                     LD   BC,(M_I4A+2)
                     SBC  HL,BC
                     EX   DE,HL
                     JR   NC,I4_DIV4
                     LD   BC,(M_I4A)
                     ADD  HL,BC
                     EX   DE,HL
                     LD   BC,(M_I4A+2)
                     ADC  HL,BC
                     EX   DE,HL
                     EXX
                     JR   I4_DIV5
             I4_DIV4: EXX
                     INC  L
             I4_DIV5: DJNZ I4_DIV3
                     RET"
        }
        // Both operands made positive. M_I4S holds the sign of the
        // result, M_I4S+1 the sign of the left operand.
        LibItem::I4_SIGNS => {
            "I4_SIGNS: LD A,D
                     EXX
                     XOR  D
                     LD   (M_I4S),A
                     LD   A,D
                     LD   (M_I4S+1),A
                     CALL I4_ABS_DEHL
                     EXX
                     JP   I4_ABS_DEHL"
        }
        // The raw entry sets CY when the result is negative.
        LibItem::I4_NEG_DEHL => {
            "I4_NEG_DEHL: LD A,D
                     XOR  80H
                     OR   E
                     OR   H
                     OR   L
                     JP   Z,E_NOV
             I4_NEG_DEHL_RAW: XOR A
                     SUB  L
                     LD   L,A
                     LD   A,00H
                     SBC  A,H
                     LD   H,A
                     LD   A,00H
                     SBC  A,E
                     LD   E,A
                     LD   A,00H
                     SBC  A,D
                     LD   D,A
                     RLA
                     RET"
        }
        LibItem::I4_ABS_DEHL => {
            "I4_ABS_DEHL: LD A,D
                     OR   A
                     RET  P
                     JP   I4_NEG_DEHL"
        }
        LibItem::I4_AND => {
            "I4_AND: PUSH DE
                     PUSH HL
                     EXX
                     POP  BC
                     LD   A,L
                     AND  C
                     LD   L,A
                     LD   A,H
                     AND  B
                     LD   H,A
                     POP  BC
                     LD   A,E
                     AND  C
                     LD   E,A
                     LD   A,D
                     AND  B
                     LD   D,A
                     RET"
        }
        LibItem::I4_OR => {
            "I4_OR:  PUSH DE
                     PUSH HL
                     EXX
                     POP  BC
                     LD   A,L
                     OR   C
                     LD   L,A
                     LD   A,H
                     OR   B
                     LD   H,A
                     POP  BC
                     LD   A,E
                     OR   C
                     LD   E,A
                     LD   A,D
                     OR   B
                     LD   D,A
                     RET"
        }
        LibItem::I4_XOR => {
            "I4_XOR: PUSH DE
                     PUSH HL
                     EXX
                     POP  BC
                     LD   A,L
                     XOR  C
                     LD   L,A
                     LD   A,H
                     XOR  B
                     LD   H,A
                     POP  BC
                     LD   A,E
                     XOR  C
                     LD   E,A
                     LD   A,D
                     XOR  B
                     LD   D,A
                     RET"
        }
        LibItem::I4_NOT => {
            "I4_NOT: LD   A,D
                     CPL
                     LD   D,A
                     LD   A,E
                     CPL
                     LD   E,A
                     LD   A,H
                     CPL
                     LD   H,A
                     LD   A,L
                     CPL
                     LD   L,A
                     RET"
        }
        // HL address, result in DEHL.
        LibItem::I4_LD_MEM => {
            "I4_LD_MEM: LD E,(HL)
                     INC  HL
                     LD   D,(HL)
                     INC  HL
                     LD   A,(HL)
                     INC  HL
                     LD   H,(HL)
                     LD   L,A
                     EX   DE,HL
                     RET"
        }
        // Stores DEHL at BC.
        LibItem::I4_ST_BC => {
            "I4_ST_BC: LD A,L
                     LD   (BC),A
                     INC  BC
                     LD   A,H
                     LD   (BC),A
                     INC  BC
                     LD   A,E
                     LD   (BC),A
                     INC  BC
                     LD   A,D
                     LD   (BC),A
                     RET"
        }
        LibItem::F_I2_SGN_I4 => {
            "F_I2_SGN_I4: LD A,D
                     OR   E
                     OR   H
                     OR   L
                     LD   HL,0000H
                     RET  Z
                     BIT  7,D
                     INC  HL
                     RET  Z
                     DEC  HL
                     DEC  HL
                     RET"
        }
        // CY when DEHL does not fit two bytes.
        LibItem::CHECK_DEHL_FOR_I2 => {
            "CHECK_DEHL_FOR_I2: LD A,H
                     RLA
                     SBC  A,A
                     CP   D
                     JR   NZ,CHECK_DEHL_FOR_I2_1
                     CP   E
                     RET  Z
             CHECK_DEHL_FOR_I2_1: SCF
                     RET"
        }
        LibItem::M_I4A => "M_I4A:  DS   4",
        LibItem::M_I4S => "M_I4S:  DS   2",
        _ => return false,
    };
    buf.append_text(text);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mach::buffer::Instr;

    fn fragment(item: LibItem) -> CodeBuf {
        let mut buf = CodeBuf::new();
        assert!(append(item, &mut buf));
        buf
    }

    #[test]
    fn test_compare_restores_both_sets() {
        let buf = fragment(LibItem::I4_CMP);
        let pushes = buf.iter().take_while(|i| !i.is_op("CALL")).filter(|i| i.is_op("PUSH")).count();
        let call = buf.iter().position(|i| i.is("CALL", "I4_CMP1")).unwrap();
        let ret = buf.iter().position(|i| i.is_op("RET")).unwrap();
        let pops = buf.lines_from(call).iter().take(ret - call).filter(|i| i.is_op("POP")).count();
        assert_eq!(pushes, 4);
        assert_eq!(pops, 4);
    }

    #[test]
    fn test_negation_guards_smallest_value() {
        let buf = fragment(LibItem::I4_NEG_DEHL);
        assert_eq!(buf.get(0), Some(&Instr::new("LD", "A,D").with_label("I4_NEG_DEHL")));
        assert!(buf.iter().any(|i| i.is("JP", "Z,E_NOV")));
        assert!(buf.iter().any(|i| i.label.as_deref() == Some("I4_NEG_DEHL_RAW")));
    }

    #[test]
    fn test_modulus_shares_division() {
        let buf = fragment(LibItem::I4_DIV);
        let labels: Vec<&str> = buf.iter().filter_map(|i| i.label.as_deref()).collect();
        assert!(labels.contains(&"I4_MOD"));
        assert!(buf.iter().any(|i| i.is("JP", "Z,E_DIV0")));
    }
}
