use super::super::buffer::CodeBuf;
use super::super::library::LibItem;

/// Decimal routines over the six byte BCD format.
///
/// Byte 0 holds the sign in bit 7, the scale in bits 4 to 6 and the
/// top digit in its low nibble. Bytes 1 to 5 hold ten more digits.
/// Binary operators take the left operand in `M_OP1` and the right
/// one in `M_ACCU` and leave the result in `M_ACCU`. `M_ACCU` has a
/// seventh byte used as guard digit while rounding.
pub fn append(item: LibItem, buf: &mut CodeBuf) -> bool {
    let text = match item {
        // D6_SUB negates the right operand and falls into the addition.
        LibItem::D6_ADD => {
            "D6_SUB: CALL D6_NEG
             D6_ADD: CALL D6_EQSC
                     LD   A,(M_OP1)
                     AND  0F0H
                     LD   C,A
                     LD   A,(M_ACCU)
                     XOR  C
                     PUSH AF
                     CALL D6_CLRUN
                     LD   DE,M_OP1+6
                     LD   HL,M_ACCU+6
                     LD   B,06H
                     POP  AF
                     JP   M,D6_ADD3
             D6_ADD1: DEC DE
                     DEC  HL
                     LD   A,(DE)
                     ADC  A,(HL)
                     DAA
                     LD   (HL),A
                     DJNZ D6_ADD1
                     JR   D6_ADD6
             D6_ADD3: OR  A
             D6_ADD4: DEC DE
                     DEC  HL
                     LD   A,(DE)
                     SBC  A,(HL)
                     DAA
                     LD   (HL),A
                     DJNZ D6_ADD4
                     JR   NC,D6_ADD6
                     LD   A,C
                     XOR  80H
                     LD   C,A
                     LD   HL,M_ACCU+6
                     LD   B,06H
                     OR   A
             D6_ADD5: DEC HL
                     LD   A,00H
                     SBC  A,(HL)
                     DAA
                     LD   (HL),A
                     DJNZ D6_ADD5
             D6_ADD6: LD  HL,M_ACCU
                     LD   A,(HL)
                     AND  0F0H
                     JR   Z,D6_ADD7
                     LD   A,C
                     AND  70H
                     JP   Z,E_NOV
                     XOR  A
                     RRD
                     CALL D6_DECS1
                     LD   A,C
                     SUB  10H
                     LD   C,A
             D6_ADD7: LD  A,(HL)
                     AND  0FH
                     OR   C
                     LD   (HL),A
                     RET"
        }
        // Brings both operands to the same scale. The smaller scale grows
        // while its top digit is free, then the larger one shrinks.
        LibItem::D6_EQSC => {
            "D6_EQSC: CALL D6_GSCA
                     LD   C,A
                     EX   DE,HL
                     LD   HL,M_OP1
                     CALL D6_GSCL
                     SUB  C
                     RET  Z
                     JR   NC,D6_EQS1
                     EX   DE,HL
                     CPL
                     INC  A
             D6_EQS1: EX  DE,HL
                     LD   B,A
             D6_EQS2: LD  A,(HL)
                     AND  0FH
                     JR   NZ,D6_EQS3
                     CALL D6_INCSC
                     DJNZ D6_EQS2
                     RET
             D6_EQS3: EX  DE,HL
             D6_EQS4: CALL D6_DECSC
                     DJNZ D6_EQS4
                     RET
             D6_INCSC: LD A,(HL)
                     AND  0F0H
                     LD   (HL),A
                     PUSH BC
                     LD   BC,0005H
                     ADD  HL,BC
                     XOR  A
                     LD   B,05H
             D6_INS1: RLD
                     DEC  HL
                     DJNZ D6_INS1
                     POP  BC
                     OR   (HL)
                     ADD  A,10H
                     LD   (HL),A
                     RET"
        }
        // Drops the last digit of the value at HL, flagging a lost
        // non-zero digit. D6_DECS1 shifts the digit in A into byte 1.
        LibItem::D6_DECSC => {
            "D6_DECSC: LD A,(HL)
                     AND  0FH
                     CALL D6_DECS1
                     LD   A,(HL)
                     AND  0F0H
                     SUB  10H
                     LD   (HL),A
                     RET
             D6_DECS1: PUSH BC
                     PUSH HL
                     LD   B,05H
             D6_DECS2: INC HL
                     RRD
                     DJNZ D6_DECS2
                     AND  0FH
                     CALL NZ,D6_STRUNC
                     POP  HL
                     POP  BC
                     RET"
        }
        LibItem::D6_CLRUN => {
            "D6_CLRUN: LD HL,M_OP1
                     CALL D6_CLRU1
                     LD   HL,M_ACCU
             D6_CLRU1: LD A,(HL)
                     AND  0FH
                     LD   (HL),A
                     RET"
        }
        // CY when M_OP1 < M_ACCU, Z when equal.
        LibItem::D6_CMP => {
            "D6_CMP: CALL D6_ISZA
                     JR   NZ,D6_CMP1
                     LD   HL,M_OP1
                     CALL D6_ISZ
                     RET  Z
             D6_CMP1: LD  DE,M_OP1
                     LD   HL,M_ACCU
                     LD   A,(DE)
                     LD   B,(HL)
                     LD   C,B
                     XOR  B
                     JP   M,D6_CMP4
                     EXX
                     CALL D6_EQSC
                     EXX
                     LD   B,06H
             D6_CMP2: LD  A,(DE)
                     CP   (HL)
                     JR   NZ,D6_CMP3
                     INC  DE
                     INC  HL
                     DJNZ D6_CMP2
                     XOR  A
                     RET
             D6_CMP3: RRA
                     XOR  C
                     OR   7FH
                     RLCA
                     RET
             D6_CMP4: LD  A,B
                     RLCA
                     CCF
                     RET"
        }
        LibItem::D6_LT => {
            "D6_LT:  CALL D6_CMP
                     LD   HL,0000H
                     RET  NC
                     DEC  HL
                     RET"
        }
        LibItem::D6_LE => {
            "D6_LE:  CALL D6_CMP
                     LD   HL,0FFFFH
                     RET  Z
                     RET  C
                     INC  HL
                     RET"
        }
        LibItem::D6_GT => {
            "D6_GT:  CALL D6_CMP
                     LD   HL,0000H
                     RET  Z
                     RET  C
                     DEC  HL
                     RET"
        }
        LibItem::D6_GE => {
            "D6_GE:  CALL D6_CMP
                     LD   HL,0FFFFH
                     RET  NC
                     INC  HL
                     RET"
        }
        LibItem::D6_EQ => {
            "D6_EQ:  CALL D6_CMP
                     LD   HL,0FFFFH
                     RET  Z
                     INC  HL
                     RET"
        }
        LibItem::D6_NE => {
            "D6_NE:  CALL D6_CMP
                     LD   HL,0FFFFH
                     RET  NZ
                     INC  HL
                     RET"
        }
        LibItem::D6_MAX => {
            "D6_MAX: CALL D6_CMP
                     RET  Z
                     RET  C
                     JP   D6_ACCOP"
        }
        LibItem::D6_MIN => {
            "D6_MIN: CALL D6_CMP
                     RET  Z
                     RET  NC
                     JP   D6_ACCOP"
        }
        // Horner scheme over the eleven digits of M_ACCU into the double
        // width M_REG2, then normalized back to at most scale 7.
        LibItem::D6_MUL => {
            "D6_MUL: LD   HL,M_REG2
                     LD   B,0CH
                     CALL D6_CLR2
                     CALL D6_GSCA
                     LD   C,A
                     EX   DE,HL
                     LD   HL,M_OP1
                     CALL D6_GSCL
                     LD   B,A
                     PUSH BC
                     LD   A,(DE)
                     XOR  (HL)
                     LD   (M_SIGN),A
                     CALL D6_CLRUN
                     POP  BC
                     LD   A,B
                     ADD  A,C
                     LD   (M_MODE),A
                     EXX
                     LD   BC,010BH
                     EXX
                     LD   A,(M_ACCU)
             D6_MUL1: LD  HL,M_REG1
                     LD   B,0CH
                     CALL D6_CLR2
                     AND  0FH
                     JR   Z,D6_MUL4
                     LD   C,A
             D6_MUL2: LD  DE,M_REG1+12
                     LD   HL,M_OP1+6
                     LD   B,06H
             D6_MUL3: DEC DE
                     DEC  HL
                     LD   A,(DE)
                     ADC  A,(HL)
                     DAA
                     LD   (DE),A
                     DJNZ D6_MUL3
                     DEC  C
                     JR   NZ,D6_MUL2
             D6_MUL4: EXX
                     INC  B
                     LD   A,B
                     EXX
                     SRL  A
                     ADD  A,06H
                     LD   C,A
                     LD   HL,M_REG2+12
                     XOR  A
                     LD   B,C
             D6_MUL5: DEC HL
                     RLD
                     DJNZ D6_MUL5
                     LD   DE,M_REG2+12
                     LD   HL,M_REG1+12
                     LD   B,C
                     OR   A
             D6_MUL6: DEC DE
                     DEC  HL
                     LD   A,(DE)
                     ADC  A,(HL)
                     DAA
                     LD   (DE),A
                     DJNZ D6_MUL6
                     EXX
                     DEC  C
                     EXX
                     JR   Z,D6_MUL8
                     LD   HL,M_ACCU+5
                     LD   B,05H
                     XOR  A
             D6_MUL7: RLD
                     DEC  HL
                     DJNZ D6_MUL7
                     JR   D6_MUL1
             D6_MUL8: LD  A,(M_MODE)
                     LD   C,A
             D6_MUL9: LD  A,(M_REG2)
                     OR   A
                     JR   NZ,D6_MUL11
                     LD   HL,M_REG2+12
                     LD   B,0CH
             D6_MUL10: DEC HL
                     RLD
                     DJNZ D6_MUL10
                     INC  C
                     LD   A,C
                     CP   13H
                     JR   C,D6_MUL9
             D6_MUL11: LD A,C
                     SUB  0CH
                     JP   C,E_NOV
                     LD   C,A
                     LD   HL,M_REG2+5
                     CALL D6_CKTR
                     JP   D6_MDRES"
        }
        // Long division of left aligned mantissas, twelve quotient digits
        // into M_REG2. M_MODE keeps the scale difference.
        LibItem::D6_DIV => {
            "D6_DIV: LD   A,(M_OP1)
                     LD   B,A
                     LD   A,(M_ACCU)
                     XOR  B
                     LD   (M_SIGN),A
                     LD   HL,M_ACCU+6
                     CALL D6_DIVP
                     JP   Z,E_DIV0
                     EX   AF,AF'
                     PUSH AF
                     LD   HL,M_OP1+6
                     CALL D6_DIVP
                     EX   AF,AF'
                     POP  BC
                     SUB  B
                     LD   (M_MODE),A
                     LD   HL,M_REG2
                     LD   B,0CH
                     CALL D6_CLR2
                     EXX
                     LD   C,0CH
                     EXX
             D6_DIV2: LD  C,0FFH
             D6_DIV3: INC C
                     LD   DE,M_OP1+6
                     LD   HL,M_ACCU+6
                     OR   A
                     LD   B,06H
             D6_DIV4: DEC DE
                     DEC  HL
                     LD   A,(DE)
                     SBC  A,(HL)
                     DAA
                     LD   (DE),A
                     DJNZ D6_DIV4
                     JR   NC,D6_DIV3
                     LD   DE,M_OP1+6
                     LD   HL,M_ACCU+6
                     OR   A
                     LD   B,06H
             D6_DIV5: DEC DE
                     DEC  HL
                     LD   A,(DE)
                     ADC  A,(HL)
                     DAA
                     LD   (DE),A
                     DJNZ D6_DIV5
                     LD   HL,M_REG2+6
                     LD   A,C
                     LD   B,06H
             D6_DIV6: DEC HL
                     RLD
                     DJNZ D6_DIV6
                     LD   HL,M_ACCU
                     XOR  A
                     LD   B,06H
             D6_DIV7: RRD
                     INC  HL
                     DJNZ D6_DIV7
                     EXX
                     DEC  C
                     EXX
                     JR   NZ,D6_DIV2
                     LD   HL,M_OP1-1
                     CALL D6_CKTR
                     LD   A,(M_MODE)
                     ADD  A,0BH
                     LD   C,A
                     LD   A,(M_REG2)
                     AND  0F0H
                     JR   Z,D6_DIV8
                     LD   A,C
                     OR   A
                     JP   Z,E_NOV
                     CALL D6_DIV9
             D6_DIV8: BIT 7,C
                     JP   NZ,E_NOV
                     LD   A,07H
                     CP   C
                     JP   NC,D6_MDRES
                     CALL D6_DIV9
                     JR   D6_DIV8
             D6_DIV9: DEC C
                     LD   HL,M_REG2
                     XOR  A
                     LD   B,06H
             D6_DIV10: RRD
                     INC  HL
                     DJNZ D6_DIV10
                     AND  0FH
                     RET  Z
                     JP   D6_STRUNC
             D6_DIVP: LD  D,H
                     LD   E,L
                     CALL D6_DIVP3
                     AND  07H
                     INC  A
                     EX   AF,AF'
                     LD   C,0BH
             D6_DIVP1: LD A,(HL)
                     AND  0F0H
                     RET  NZ
                     CALL D6_DIVP2
                     EX   AF,AF'
                     INC  A
                     EX   AF,AF'
                     DEC  C
                     JR   NZ,D6_DIVP1
                     RET
             D6_DIVP2: LD H,D
                     LD   L,E
             D6_DIVP3: XOR A
                     LD   B,06H
             D6_DIVP4: DEC HL
                     RLD
                     DJNZ D6_DIVP4
                     RET"
        }
        // Shared tail of multiplication and division. D6_CKTR flags
        // truncation when one of the six bytes after HL is not zero.
        // D6_MDRES stores M_REG2 with sign M_SIGN and scale C.
        LibItem::D6_MDUTIL => {
            "D6_CKTR: LD  B,06H
                     XOR  A
             D6_CKT1: INC HL
                     OR   (HL)
                     JP   NZ,D6_STRUNC
                     DJNZ D6_CKT1
                     RET
             D6_MDRES: LD A,(M_SIGN)
                     AND  80H
                     LD   B,A
                     LD   A,C
                     RLCA
                     RLCA
                     RLCA
                     RLCA
                     OR   B
                     LD   HL,M_REG2
                     OR   (HL)
                     LD   DE,M_ACCU
                     LD   (DE),A
                     INC  HL
                     INC  DE
                     LD   BC,0005H
                     LDIR
                     RET"
        }
        // A is the mode: 0 half down, 1 half even, 2 half up, 0FFH cuts.
        // The dropped digit lands in the guard byte M_ACCU+6 with every
        // further dropped digit or'ed into its low nibble.
        LibItem::D6_ROUND => {
            "D6_ROUND: LD (M_MODE),A
                     CALL D6_GSCA
                     RET  Z
                     LD   E,A
                     LD   A,(HL)
                     LD   D,A
                     AND  0FH
                     LD   (HL),A
                     XOR  A
                     LD   (M_ACCU+6),A
             D6_RND1: LD  HL,M_ACCU
                     LD   B,06H
                     XOR  A
             D6_RND2: RRD
                     INC  HL
                     DJNZ D6_RND2
                     LD   B,(HL)
                     RRD
                     LD   A,B
                     AND  0FH
                     OR   (HL)
                     LD   (HL),A
                     DEC  E
                     JR   NZ,D6_RND1
                     LD   A,(M_MODE)
                     OR   A
                     JP   M,D6_RND5
                     LD   C,A
                     LD   A,(HL)
                     CP   50H
                     JR   C,D6_RND5
                     JR   NZ,D6_RND3
                     DEC  C
                     JP   M,D6_RND5
                     JR   NZ,D6_RND3
                     LD   A,(M_ACCU+5)
                     RRA
                     JR   NC,D6_RND5
             D6_RND3: LD  HL,M_ACCU+6
                     LD   B,06H
                     SCF
             D6_RND4: DEC HL
                     LD   A,(HL)
                     ADC  A,00H
                     DAA
                     LD   (HL),A
                     DJNZ D6_RND4
             D6_RND5: LD  A,D
                     AND  80H
                     LD   HL,M_ACCU
                     OR   (HL)
                     LD   (HL),A
                     RET"
        }
        LibItem::D6_STRUNC => {
            "D6_STRUNC: PUSH AF
                     LD   A,01H
                     LD   (M_DTRUNC),A
                     POP  AF
                     RET"
        }
        LibItem::D6_CLR => {
            "D6_CLR: LD   HL,M_ACCU
             D6_CLR1: LD  B,06H
             D6_CLR2: LD  (HL),00H
                     INC  HL
                     DJNZ D6_CLR2
                     RET"
        }
        LibItem::D6_NEG => {
            "D6_NEG: LD   HL,M_ACCU
                     LD   A,(HL)
                     XOR  80H
                     LD   (HL),A
                     RET"
        }
        LibItem::D6_APPDG => {
            "D6_APPDG: LD B,06H
                     LD   HL,M_ACCU+5
             D6_APD1: RLD
                     DEC  HL
                     DJNZ D6_APD1
                     RET"
        }
        // Scale of M_ACCU (D6_GSCA) or of the value at HL in A, Z when 0.
        LibItem::D6_SCALE => {
            "D6_GSCA: LD  HL,M_ACCU
             D6_GSCL: LD  A,(HL)
                     RRCA
                     RRCA
                     RRCA
                     RRCA
                     AND  07H
                     RET"
        }
        // Z when the value at HL (D6_ISZ) or M_ACCU (D6_ISZA) is zero.
        LibItem::D6_ISZ => {
            "D6_ISZA: LD  HL,M_ACCU
             D6_ISZ: LD   A,(HL)
                     AND  0FH
                     LD   B,05H
             D6_ISZ1: INC HL
                     OR   (HL)
                     DJNZ D6_ISZ1
                     RET"
        }
        LibItem::D6_LDACC => {
            "D6_LDACC: LD DE,M_ACCU
                     LD   BC,0006H
                     LDIR
                     RET"
        }
        LibItem::D6_LDOP1 => {
            "D6_LDOP1: LD DE,M_OP1
                     LD   BC,0006H
                     LDIR
                     RET"
        }
        LibItem::D6_STACC => {
            "D6_STACC: EX DE,HL
                     LD   HL,M_ACCU
                     LD   BC,0006H
                     LDIR
                     RET"
        }
        // The six constant bytes follow the call.
        LibItem::D6_LDACN => {
            "D6_LDACN: EX (SP),HL
                     LD   DE,M_ACCU
                     LD   BC,0006H
                     LDIR
                     EX   (SP),HL
                     RET"
        }
        LibItem::D6_LDOPN => {
            "D6_LDOPN: EX (SP),HL
                     LD   DE,M_OP1
                     LD   BC,0006H
                     LDIR
                     EX   (SP),HL
                     RET"
        }
        LibItem::D6_ACCOP => {
            "D6_ACCOP: LD HL,M_OP1
                     LD   DE,M_ACCU
                     LD   BC,0006H
                     LDIR
                     RET"
        }
        LibItem::D6_OPACC => {
            "D6_OPACC: LD HL,M_ACCU
                     LD   DE,M_OP1
                     LD   BC,0006H
                     LDIR
                     RET"
        }
        LibItem::D6_PUSHA => {
            "D6_PUSHA: POP DE
                     LD   HL,(M_ACCU+4)
                     PUSH HL
                     LD   HL,(M_ACCU+2)
                     PUSH HL
                     LD   HL,(M_ACCU)
                     PUSH HL
                     EX   DE,HL
                     JP   (HL)"
        }
        LibItem::D6_POPA => {
            "D6_POPA: POP DE
                     POP  HL
                     LD   (M_ACCU),HL
                     POP  HL
                     LD   (M_ACCU+2),HL
                     POP  HL
                     LD   (M_ACCU+4),HL
                     EX   DE,HL
                     JP   (HL)"
        }
        LibItem::D6_POPO => {
            "D6_POPO: POP DE
                     POP  HL
                     LD   (M_OP1),HL
                     POP  HL
                     LD   (M_OP1+2),HL
                     POP  HL
                     LD   (M_OP1+4),HL
                     EX   DE,HL
                     JP   (HL)"
        }
        LibItem::F_D6_ABS => {
            "F_D6_ABS: LD HL,M_ACCU
                     RES  7,(HL)
                     RET"
        }
        LibItem::F_D6_CDEC_I2 => {
            "F_D6_CDEC_I2: LD A,H
                     AND  80H
                     LD   (M_ACCU),A
                     JP   P,F_CDI1
                     LD   A,H
                     XOR  80H
                     OR   L
                     JR   Z,F_CDI3
                     XOR  A
                     SUB  L
                     LD   L,A
                     SBC  A,A
                     SUB  H
                     LD   H,A
             F_CDI1: LD   BC,1000H
                     LD   D,C
                     LD   E,C
                     LD   (M_ACCU+1),DE
             F_CDI2: ADD  HL,HL
                     LD   A,D
                     ADC  A,A
                     DAA
                     LD   D,A
                     LD   A,E
                     ADC  A,A
                     DAA
                     LD   E,A
                     RL   C
                     DJNZ F_CDI2
                     LD   A,C
                     LD   (M_ACCU+3),A
                     LD   (M_ACCU+4),DE
                     RET
             F_CDI3: CALL D6_LDACN
                     DB   80H,00H,00H,03H,27H,68H
                     RET"
        }
        // Double dabble over 32 bits. IY carries the low word.
        LibItem::F_D6_CDEC_I4 => {
            "F_D6_CDEC_I4: PUSH HL
                     CALL D6_CLR
                     POP  HL
                     LD   A,D
                     OR   A
                     JP   P,F_CDL1
                     CALL I4_NEG_DEHL_RAW
                     JR   C,F_CDL4
                     CALL F_CDL1
                     LD   HL,M_ACCU
                     SET  7,(HL)
                     RET
             F_CDL1: PUSH IY
                     PUSH DE
                     EXX
                     POP  HL
                     EXX
                     PUSH HL
                     POP  IY
                     LD   C,20H
             F_CDL2: ADD  IY,IY
                     EXX
                     ADC  HL,HL
                     EXX
                     LD   HL,M_ACCU+5
                     LD   B,06H
             F_CDL3: LD   A,(HL)
                     ADC  A,A
                     DAA
                     LD   (HL),A
                     DEC  HL
                     DJNZ F_CDL3
                     DEC  C
                     JR   NZ,F_CDL2
                     POP  IY
                     RET
             F_CDL4: CALL D6_LDACN
                     DB   80H,21H,47H,48H,36H,48H
                     RET"
        }
        LibItem::F_I2_CINT_D6 => {
            "F_I2_CINT_D6: CALL F_I4_CLNG_D6
                     CALL CHECK_DEHL_FOR_I2
                     RET  NC
                     JP   E_NOV"
        }
        // Reads the integer digits of M_ACCU into DEHL, dropping the
        // fraction. M_ACCU is destroyed.
        LibItem::F_I4_CLNG_D6 => {
            "F_I4_CLNG_D6: EXX
                     LD   DE,0000H
                     LD   H,D
                     LD   L,D
                     EXX
                     LD   HL,M_ACCU
                     LD   A,(HL)
                     OR   A
                     JP   P,F_CLN1
                     CALL F_CLN1
                     JP   I4_NEG_DEHL_RAW
             F_CLN1: AND  70H
                     RRCA
                     RRCA
                     RRCA
                     RRCA
                     NEG
                     ADD  A,0CH
                     LD   C,A
                     LD   A,(HL)
                     AND  0FH
                     LD   (HL),A
             F_CLN2: LD   HL,M_ACCU+6
                     LD   B,06H
                     XOR  A
             F_CLN3: DEC  HL
                     RLD
                     DJNZ F_CLN3
                     EXX
                     PUSH AF
                     CALL F_CLN5
                     PUSH DE
                     PUSH HL
                     CALL F_CLN5
                     CALL F_CLN5
                     POP  BC
                     ADD  HL,BC
                     EX   DE,HL
                     POP  BC
                     ADC  HL,BC
                     EX   DE,HL
                     JP   M,E_NOV
                     POP  AF
                     ADD  A,L
                     LD   L,A
                     JR   NC,F_CLN4
                     INC  H
                     JR   NZ,F_CLN4
                     INC  DE
             F_CLN4: BIT  7,D
                     JP   NZ,E_NOV
                     EXX
                     DEC  C
                     JR   NZ,F_CLN2
                     EXX
                     RET
             F_CLN5: ADD  HL,HL
                     EX   DE,HL
                     ADC  HL,HL
                     EX   DE,HL
                     JP   M,E_NOV
                     RET"
        }
        // Keeps the sign and the last seven digits, scale becomes 7.
        LibItem::F_D6_FRAC => {
            "F_D6_FRAC: CALL D6_GSCA
                     LD   C,A
                     LD   A,(HL)
                     AND  80H
                     OR   70H
                     LD   (HL),A
                     INC  HL
                     LD   (HL),00H
                     LD   A,07H
                     SUB  C
                     JR   Z,F_FRC3
                     LD   C,A
             F_FRC1: LD   HL,M_ACCU+5
                     XOR  A
                     LD   B,04H
             F_FRC2: RLD
                     DEC  HL
                     DJNZ F_FRC2
                     DEC  C
                     JR   NZ,F_FRC1
             F_FRC3: INC  HL
                     LD   A,(HL)
                     AND  0FH
                     LD   (HL),A
                     RET"
        }
        LibItem::F_I2_SGN_D6 => {
            "F_I2_SGN_D6: CALL D6_ISZA
                     LD   HL,0000H
                     RET  Z
                     LD   A,(M_ACCU)
                     OR   A
                     LD   HL,0001H
                     RET  P
                     DEC  HL
                     DEC  HL
                     RET"
        }
        LibItem::F_D6_TRUNC => {
            "F_D6_TRUNC: LD A,0FFH
                     JP   D6_ROUND"
        }
        LibItem::F_D6_ROUND => {
            "F_D6_ROUND: LD A,01H
                     JP   D6_ROUND"
        }
        // Mode in HL, see D6_ROUND.
        LibItem::F_D6_ROUNDM => {
            "F_D6_ROUNDM: LD A,H
                     OR   A
                     JP   NZ,E_PARM
                     LD   A,L
                     CP   03H
                     JP   NC,E_PARM
                     JP   D6_ROUND"
        }
        // HL points to the text. CY and zero in M_ACCU when it is not a
        // number. B holds the scale in bits 0 to 2 and a digit seen flag
        // in bit 7, C counts the digits taken.
        LibItem::F_D6_VAL_S => {
            "F_D6_VAL_S: DEC HL
             F_VAL1: INC  HL
                     LD   A,(HL)
                     CP   20H
                     JR   Z,F_VAL1
                     CP   2BH
                     JR   NZ,F_VAL2
                     INC  HL
                     JR   F_VAL3
             F_VAL2: CP   2DH
                     JR   NZ,F_VAL3
                     INC  HL
                     CALL F_VAL3
                     RET  C
                     JP   D6_NEG
             F_VAL3: EX   DE,HL
                     CALL D6_CLR
                     LD   BC,0000H
             F_VAL4: LD   A,(DE)
                     INC  DE
                     CP   30H
                     JR   NZ,F_VAL6
                     SET  7,B
                     JR   F_VAL4
             F_VAL5: LD   A,(DE)
                     INC  DE
             F_VAL6: CP   2EH
                     JR   Z,F_VAL7
                     CALL F_VAL13
                     JR   C,F_VAL9
                     CALL F_VAL14
                     JR   NC,F_VAL5
                     JR   F_VAL10
             F_VAL7: LD   A,(DE)
                     INC  DE
                     CALL F_VAL13
                     JR   C,F_VAL9
                     LD   L,A
                     LD   A,B
                     AND  07H
                     CP   07H
                     LD   A,L
                     JR   NZ,F_VAL8
                     OR   A
                     CALL NZ,D6_STRUNC
                     JR   F_VAL7
             F_VAL8: CALL F_VAL14
                     JR   NC,F_VAL81
                     OR   A
                     CALL NZ,D6_STRUNC
                     JR   F_VAL7
             F_VAL81: INC B
                     JR   F_VAL7
             F_VAL9: BIT  7,B
                     JR   NZ,F_VAL11
             F_VAL10: CALL D6_CLR
                     SCF
                     RET
             F_VAL11: OR  A
                     JR   Z,F_VAL12
                     CP   20H
                     JR   NZ,F_VAL10
                     LD   A,(DE)
                     INC  DE
                     JR   F_VAL11
             F_VAL12: LD  HL,M_ACCU
                     LD   A,B
                     RLCA
                     RLCA
                     RLCA
                     RLCA
                     AND  70H
                     OR   (HL)
                     LD   (HL),A
                     RET
             F_VAL13: CP  30H
                     RET  C
                     CP   3AH
                     CCF
                     RET  C
                     SUB  30H
                     RET
             F_VAL14: LD  L,A
                     LD   A,0AH
                     CP   C
                     LD   A,L
                     RET  C
                     INC  C
                     SET  7,B
                     PUSH BC
                     CALL D6_APPDG
                     POP  BC
                     OR   A
                     RET"
        }
        // Text of M_ACCU in M_CVTBUF, pointer in HL. A leading blank or
        // minus, trailing fraction zeros and a bare point are dropped.
        // D bit 0 is set once a digit is out, bit 1 once the point is.
        LibItem::S_STR_D6 => {
            "S_STR_D6: CALL D6_ISZA
                     JR   Z,S_STD13
                     LD   HL,M_ACCU
                     LD   A,20H
                     BIT  7,(HL)
                     JR   Z,S_STD2
                     LD   A,2DH
             S_STD2: EXX
                     LD   HL,M_CVTBUF
                     LD   (HL),A
                     INC  HL
                     EXX
                     LD   A,(HL)
                     RRCA
                     RRCA
                     RRCA
                     RRCA
                     AND  07H
                     SUB  0BH
                     NEG
                     LD   C,A
                     LD   D,00H
                     LD   A,(HL)
                     CALL S_STD8
                     LD   B,05H
             S_STD3: INC  HL
                     CALL S_STD7
                     DJNZ S_STD3
                     BIT  1,D
                     EXX
                     LD   (HL),00H
                     JR   Z,S_STD6
             S_STD4: DEC  HL
                     LD   A,(HL)
                     CP   2EH
                     JR   Z,S_STD5
                     CP   30H
                     JR   NZ,S_STD6
                     LD   (HL),00H
                     JR   S_STD4
             S_STD5: LD   (HL),00H
             S_STD6: LD   HL,M_CVTBUF
                     RET
             S_STD7: LD   A,(HL)
                     RRCA
                     RRCA
                     RRCA
                     RRCA
                     CALL S_STD8
                     LD   A,(HL)
             S_STD8: INC  C
                     DEC  C
                     JR   NZ,S_STD10
                     BIT  0,D
                     EXX
                     JR   NZ,S_STD9
                     LD   (HL),30H
                     INC  HL
             S_STD9: LD   (HL),2EH
                     INC  HL
                     EXX
                     LD   D,03H
             S_STD10: AND 0FH
                     JR   NZ,S_STD11
                     BIT  0,D
                     JR   Z,S_STD12
             S_STD11: ADD A,30H
                     EXX
                     LD   (HL),A
                     INC  HL
                     EXX
                     SET  0,D
             S_STD12: DEC C
                     RET
             S_STD13: LD  HL,S_STD14
                     RET
             S_STD14: DB  20H,30H,00H"
        }
        LibItem::M_ACCU => "M_ACCU: DS   7",
        LibItem::M_OP1 => "M_OP1:  DS   6",
        LibItem::M_REG1 => "M_REG1: DS   12",
        LibItem::M_REG2 => "M_REG2: DS   12",
        LibItem::M_MODE => "M_MODE: DS   1",
        LibItem::M_SIGN => "M_SIGN: DS   1",
        LibItem::M_DTRUNC => "M_DTRUNC: DS 1",
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

    fn labels(buf: &CodeBuf) -> Vec<String> {
        buf.iter().filter_map(|i| i.label.clone()).collect()
    }

    #[test]
    fn test_subtraction_falls_into_addition() {
        let buf = fragment(LibItem::D6_ADD);
        assert_eq!(buf.get(0), Some(&Instr::new("CALL", "D6_NEG").with_label("D6_SUB")));
        assert_eq!(buf.get(1), Some(&Instr::new("CALL", "D6_EQSC").with_label("D6_ADD")));
        assert!(buf.iter().any(|i| i.is("JP", "Z,E_NOV")));
    }

    #[test]
    fn test_addition_uses_decimal_adjust() {
        let buf = fragment(LibItem::D6_ADD);
        let adjusts = buf.iter().filter(|i| i.is_op("DAA")).count();
        assert_eq!(adjusts, 3);
    }

    #[test]
    fn test_equalize_holds_scale_increment() {
        let buf = fragment(LibItem::D6_EQSC);
        let labels = labels(&buf);
        assert!(labels.iter().any(|l| l == "D6_INCSC"));
        assert!(buf.iter().any(|i| i.is("CALL", "D6_DECSC")));
    }

    #[test]
    fn test_dropped_digit_flags_truncation() {
        let buf = fragment(LibItem::D6_DECSC);
        assert!(buf.iter().any(|i| i.is("CALL", "NZ,D6_STRUNC")));
        let buf = fragment(LibItem::D6_STRUNC);
        assert!(buf.iter().any(|i| i.is("LD", "(M_DTRUNC),A")));
    }

    #[test]
    fn test_division_by_zero_checked() {
        let buf = fragment(LibItem::D6_DIV);
        assert!(buf.iter().any(|i| i.is("JP", "Z,E_DIV0")));
        assert!(buf.iter().any(|i| i.is("JP", "NC,D6_MDRES")));
    }

    #[test]
    fn test_rounding_inspects_guard_digit() {
        let buf = fragment(LibItem::D6_ROUND);
        assert!(buf.iter().any(|i| i.is("LD", "(M_ACCU+6),A")));
        assert!(buf.iter().any(|i| i.is("CP", "50H")));
        assert!(buf.iter().any(|i| i.is("LD", "A,(M_ACCU+5)")));
    }

    #[test]
    fn test_round_entries_pass_mode() {
        assert_eq!(fragment(LibItem::F_D6_TRUNC).get(0), Some(&Instr::new("LD", "A,0FFH").with_label("F_D6_TRUNC")));
        assert_eq!(fragment(LibItem::F_D6_ROUND).get(0), Some(&Instr::new("LD", "A,01H").with_label("F_D6_ROUND")));
        assert!(fragment(LibItem::F_D6_ROUNDM).iter().any(|i| i.is("JP", "NC,E_PARM")));
    }

    #[test]
    fn test_smallest_integers_loaded_as_constants() {
        let buf = fragment(LibItem::F_D6_CDEC_I2);
        assert!(buf.iter().any(|i| i.is("DB", "80H,00H,00H,03H,27H,68H")));
        let buf = fragment(LibItem::F_D6_CDEC_I4);
        assert!(buf.iter().any(|i| i.is("DB", "80H,21H,47H,48H,36H,48H")));
    }

    #[test]
    fn test_value_text_labels() {
        let buf = fragment(LibItem::F_D6_VAL_S);
        assert_eq!(buf.get(0), Some(&Instr::new("DEC", "HL").with_label("F_D6_VAL_S")));
        let buf = fragment(LibItem::S_STR_D6);
        assert_eq!(buf.last(), Some(&Instr::new("DB", "20H,30H,00H").with_label("S_STD14")));
    }

    #[test]
    fn test_accumulator_has_guard_byte() {
        assert_eq!(fragment(LibItem::M_ACCU).get(0), Some(&Instr::new("DS", "7").with_label("M_ACCU")));
        assert_eq!(fragment(LibItem::M_REG2).get(0), Some(&Instr::new("DS", "12").with_label("M_REG2")));
    }

    #[test]
    fn test_unknown_item_declined() {
        let mut buf = CodeBuf::new();
        assert!(!append(LibItem::O_ADD, &mut buf));
        assert!(buf.is_empty());
    }
}
