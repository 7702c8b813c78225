use super::super::buffer::{hex4, CodeBuf};
use super::super::library::LibItem;
use super::{Env, MAX_STR_LEN};

/// ## String functions and the string heap
///
/// Heap blocks carry a five byte header: pointer to the next block,
/// usable size and a reference count whose top bit marks the block
/// for the collector. Blocks lie back to back in address order.
pub fn append(item: LibItem, buf: &mut CodeBuf, env: &Env) -> bool {
    let max = hex4(MAX_STR_LEN);
    let text = match item {
        // DE left, HL right. Result is a fresh heap block.
        LibItem::S_CAT => format!(
            "S_CAT:  PUSH HL
                     PUSH DE
                     CALL MFIND
                     POP  HL
                     PUSH DE
                     LD   BC,{max}
                     CALL STNCP
                     POP  HL
                     PUSH HL
                     PUSH DE
                     EX   DE,HL
                     OR   A
                     SBC  HL,DE
                     EX   DE,HL
                     LD   HL,{max}
                     OR   A
                     SBC  HL,DE
                     LD   B,H
                     LD   C,L
                     POP  DE
                     POP  HL
                     EX   (SP),HL
                     CALL STNCP
                     POP  HL
                     JP   MALLOC",
            max = max
        ),
        LibItem::S_INKY => "S_INKY: CALL XINKEY
                                    LD   HL,M_INKB
                                    JP   S_CHRX"
            .to_string(),
        LibItem::S_CHRL => "S_CHRL: LD   A,L
                            S_CHRA: LD   HL,M_STMP
                            S_CHRX: LD   (HL),A
                                    INC  HL
                                    LD   (HL),00H
                                    DEC  HL
                                    RET"
            .to_string(),
        // HL string, BC count.
        LibItem::S_LEFT => "S_LEFT: LD   A,B
                                    OR   A
                                    JP   M,E_PARM
                                    LD   DE,M_STMP
                                    PUSH DE
                                    CALL STNCP
                                    POP  HL
                                    RET"
            .to_string(),
        LibItem::S_RIGHT => format!(
            "S_RIGHT: LD  A,B
                      OR  A
                      JP  NZ,E_PARM
                      PUSH HL
                      CALL F_LEN
                      OR  A
                      SBC HL,BC
                      EX  DE,HL
                      POP HL
                      JR  C,S_RIGHT2
                      JR  Z,S_RIGHT2
             S_RIGHT1: INC HL
                      DEC DE
                      LD  A,D
                      OR  E
                      JR  NZ,S_RIGHT1
             S_RIGHT2: LD DE,M_STMP
                      PUSH DE
                      LD  BC,{}
                      CALL STNCP
                      POP HL
                      RET",
            max
        ),
        // HL string, DE one based position, BC count.
        LibItem::S_MIDN => "S_MIDN: CALL S_MID
                                    LD   A,B
                                    OR   A
                                    JP   M,E_PARM
                                    LD   DE,M_STMP
                                    PUSH DE
                                    CALL STNCP
                                    POP  HL
                                    RET
                            S_MID:  LD   A,D
                                    OR   A
                                    JP   M,E_PARM
                                    OR   E
                                    JP   Z,E_PARM
                            S_MID1: DEC  DE
                                    LD   A,D
                                    OR   E
                                    RET  Z
                                    LD   A,(HL)
                                    OR   A
                                    RET  Z
                                    INC  HL
                                    JR   S_MID1"
            .to_string(),
        // L character, BC count.
        LibItem::S_STC => format!(
            "S_STC:  LD   A,B
                     OR   A
                     JP   M,E_PARM
                     OR   C
                     JR   NZ,S_STC1
                     LD   HL,D_EMPT
                     RET
             S_STC1: LD   E,L
                     LD   HL,{max}
                     OR   A
                     SBC  HL,BC
                     JR   NC,S_STC2
                     LD   BC,{max}
             S_STC2: LD   HL,M_STMP
                     PUSH HL
             S_STC3: LD   (HL),E
                     INC  HL
                     DEC  BC
                     LD   A,B
                     OR   C
                     JR   NZ,S_STC3
                     LD   (HL),A
                     POP  HL
                     RET",
            max = max
        ),
        // Decimal text of HL with a leading blank or minus sign.
        LibItem::S_STR => "S_STR:  LD   A,H
                                    XOR  80H
                                    OR   L
                                    JR   NZ,S_STR1
                                    LD   HL,S_STR9
                                    RET
                            S_STR1: LD   A,H
                                    OR   A
                                    LD   A,20H
                                    JP   P,S_STR2
                                    EX   DE,HL
                                    XOR  A
                                    LD   H,A
                                    LD   L,A
                                    SBC  HL,DE
                                    LD   A,2DH
                            S_STR2: EXX
                                    LD   HL,M_CVTBUF
                                    LD   (HL),A
                                    INC  HL
                                    EXX
                                    LD   B,00H
                                    LD   DE,2710H
                                    CALL S_STR3
                                    LD   DE,03E8H
                                    CALL S_STR3
                                    LD   DE,0064H
                                    CALL S_STR3
                                    LD   DE,000AH
                                    CALL S_STR3
                                    LD   DE,0001H
                                    LD   B,01H
                                    CALL S_STR3
                                    XOR  A
                                    EXX
                                    LD   (HL),A
                                    LD   HL,M_CVTBUF
                                    RET
                            S_STR3: LD   A,0FFH
                                    OR   A
                            S_STR4: INC  A
                                    SBC  HL,DE
                                    JR   NC,S_STR4
                                    ADD  HL,DE
                                    LD   C,A
                                    OR   B
                                    RET  Z
                                    LD   A,30H
                                    LD   B,A
                                    ADD  A,C
                                    EXX
                                    LD   (HL),A
                                    INC  HL
                                    EXX
                                    RET
                            S_STR9: DB   '-32768'
                                    DB   00H"
            .to_string(),
        LibItem::F_LEN => "F_LEN:  LD   DE,0FFFFH
                                   DEC  HL
                           F_LEN1: INC  DE
                                   INC  HL
                                   LD   A,(HL)
                                   OR   A
                                   JR   NZ,F_LEN1
                                   EX   DE,HL
                                   RET"
            .to_string(),
        // Integer value of the text at HL. CY and HL zero when it is none.
        LibItem::F_VLI => "F_VLI:  LD   B,H
                                   LD   C,L
                                   DEC  BC
                           F_VLI1: INC  BC
                                   LD   A,(BC)
                                   CP   20H
                                   JR   Z,F_VLI1
                                   CP   2DH
                                   JR   NZ,F_VLI2
                                   INC  BC
                                   CALL F_VLI2
                                   RET  C
                                   LD   DE,0000H
                                   EX   DE,HL
                                   OR   A
                                   SBC  HL,DE
                                   OR   A
                                   RET
                           F_VLI2: LD   A,(BC)
                                   INC  BC
                                   SUB  30H
                                   JR   C,F_VLI5
                                   CP   0AH
                                   JR   NC,F_VLI5
                                   LD   L,A
                                   LD   H,00H
                           F_VLI3: LD   A,(BC)
                                   INC  BC
                                   OR   A
                                   RET  Z
                                   CP   20H
                                   JR   Z,F_VLI4
                                   SUB  30H
                                   JR   C,F_VLI5
                                   CP   0AH
                                   JR   NC,F_VLI5
                                   LD   D,H
                                   LD   E,L
                                   ADD  HL,HL
                                   JR   C,F_VLI5
                                   ADD  HL,HL
                                   JR   C,F_VLI5
                                   ADD  HL,DE
                                   JR   C,F_VLI5
                                   ADD  HL,HL
                                   JR   C,F_VLI5
                                   ADD  A,L
                                   LD   L,A
                                   LD   A,00H
                                   ADC  A,H
                                   LD   H,A
                                   JR   C,F_VLI5
                                   JP   P,F_VLI3
                                   JR   F_VLI5
                           F_VLI4: LD   A,(BC)
                                   INC  BC
                                   OR   A
                                   RET  Z
                                   CP   20H
                                   JR   Z,F_VLI4
                           F_VLI5: LD   HL,0000H
                                   SCF
                                   RET"
            .to_string(),
        LibItem::S_UPR => case_copy("S_UPR", "61H", "7BH", "SUB  20H"),
        LibItem::S_LWR => case_copy("S_LWR", "41H", "5BH", "ADD  A,20H"),
        // Anything up to and including the blank counts as white space.
        LibItem::S_LTRIM => format!(
            "S_LTRIM: DEC HL
             S_LTRIM1: INC HL
                      LD   A,(HL)
                      OR   A
                      JR   Z,S_LTRIM2
                      CP   21H
                      JR   C,S_LTRIM1
             S_LTRIM2: LD  DE,M_STMP
                      PUSH DE
                      LD   BC,{}
                      CALL STNCP
                      POP  HL
                      RET",
            max
        ),
        LibItem::S_RTRIM => format!(
            "S_RTRIM: LD   DE,M_STMP
                      LD   BC,{}
                      CALL STNCP
                      LD   HL,M_STMP
             S_RTRIM1: LD  A,E
                      CP   L
                      JR   NZ,S_RTRIM2
                      LD   A,D
                      CP   H
                      JR   Z,S_RTRIM3
             S_RTRIM2: DEC DE
                      LD   A,(DE)
                      CP   21H
                      JR   C,S_RTRIM1
                      INC  DE
             S_RTRIM3: XOR A
                      LD   (DE),A
                      RET",
            max
        ),
        LibItem::S_TRIM => "S_TRIM: CALL S_LTRIM
                                    JP   S_RTRIM"
            .to_string(),
        // Copies first and swaps in place, so the argument may be M_STMP.
        LibItem::S_MIRR => format!(
            "S_MIRR: LD   DE,M_STMP
                     LD   BC,{}
                     CALL STNCP
                     LD   HL,M_STMP
             S_MIRR1: DEC DE
                     LD   A,L
                     SUB  E
                     LD   A,H
                     SBC  A,D
                     JR   NC,S_MIRR2
                     LD   A,(DE)
                     LD   C,(HL)
                     LD   (HL),A
                     LD   A,C
                     LD   (DE),A
                     INC  HL
                     JR   S_MIRR1
             S_MIRR2: LD  HL,M_STMP
                     RET",
            max
        ),
        // HL value, BC digits. Zero digits drops the leading zeros.
        LibItem::S_HEX => format!(
            "S_HEX:  LD   BC,0000H
             S_HEXN: LD   A,B
                     OR   A
                     JP   M,E_PARM
                     PUSH BC
                     LD   DE,M_CVTBUF
                     LD   A,H
                     CALL S_HXA
                     LD   A,L
                     CALL S_HXA
                     XOR  A
                     LD   (DE),A
                     POP  BC
                     LD   DE,M_STMP
                     LD   HL,M_CVTBUF
                     LD   A,B
                     OR   C
                     JR   NZ,S_HEX2
                     LD   B,03H
             S_HEX1: LD   A,(HL)
                     CP   30H
                     JR   NZ,S_HEX5
                     INC  HL
                     DJNZ S_HEX1
                     JR   S_HEX5
             S_HEX2: LD   HL,{max}
                     OR   A
                     SBC  HL,BC
                     JR   NC,S_HEX3
                     LD   BC,{max}
             S_HEX3: LD   A,C
                     CP   05H
                     JR   C,S_HEX4
                     LD   A,30H
                     LD   (DE),A
                     INC  DE
                     DEC  C
                     JR   S_HEX3
             S_HEX4: LD   A,04H
                     SUB  C
                     LD   HL,M_CVTBUF
                     ADD  A,L
                     LD   L,A
                     LD   A,00H
                     ADC  A,H
                     LD   H,A
             S_HEX5: LD   BC,0005H
                     CALL STNCP
                     LD   HL,M_STMP
                     RET",
            max = max
        ),
        // Two hex digits of A to DE, no terminator.
        LibItem::S_HXA => "S_HXA:  PUSH AF
                                   RRCA
                                   RRCA
                                   RRCA
                                   RRCA
                                   CALL S_HXA1
                                   POP  AF
                           S_HXA1: AND  0FH
                                   ADD  A,90H
                                   DAA
                                   ADC  A,40H
                                   DAA
                                   LD   (DE),A
                                   INC  DE
                                   RET"
            .to_string(),
        // HL value, BC digits as for S_HEXN.
        LibItem::S_BIN => format!(
            "S_BIN:  LD   BC,0000H
             S_BINN: LD   A,B
                     OR   A
                     JP   M,E_PARM
                     LD   DE,M_STMP
                     OR   C
                     JR   NZ,S_BIN2
                     LD   B,10H
             S_BIN1: BIT  7,H
                     JR   NZ,S_BIN6
                     LD   A,B
                     DEC  A
                     JR   Z,S_BIN6
                     ADD  HL,HL
                     DJNZ S_BIN1
             S_BIN2: PUSH HL
                     LD   HL,{max}
                     OR   A
                     SBC  HL,BC
                     POP  HL
                     JR   NC,S_BIN3
                     LD   BC,{max}
             S_BIN3: LD   A,C
                     CP   11H
                     JR   C,S_BIN4
                     LD   A,30H
                     LD   (DE),A
                     INC  DE
                     DEC  C
                     JR   S_BIN3
             S_BIN4: LD   A,10H
                     SUB  C
                     LD   B,C
                     JR   Z,S_BIN6
                     LD   C,A
             S_BIN5: ADD  HL,HL
                     DEC  C
                     JR   NZ,S_BIN5
             S_BIN6: LD   A,30H
                     ADD  HL,HL
                     ADC  A,00H
                     LD   (DE),A
                     INC  DE
                     DJNZ S_BIN6
                     XOR  A
                     LD   (DE),A
                     LD   HL,M_STMP
                     RET",
            max = max
        ),
        // HL string outside M_STMP, BC count.
        LibItem::S_STS => format!(
            "S_STS:  LD   A,B
                     OR   A
                     JP   M,E_PARM
                     LD   DE,M_STMP
                     XOR  A
                     LD   (DE),A
             S_STS1: LD   A,B
                     OR   C
                     JR   Z,S_STS2
                     PUSH BC
                     PUSH HL
                     PUSH DE
                     LD   HL,M_STMP+{}
                     OR   A
                     SBC  HL,DE
                     LD   B,H
                     LD   C,L
                     POP  DE
                     POP  HL
                     PUSH HL
                     CALL STNCP
                     POP  HL
                     POP  BC
                     DEC  BC
                     JR   S_STS1
             S_STS2: LD   HL,M_STMP
                     RET",
            max
        ),
        // HL text, DE pattern, BC one based start. HL is the position
        // of the first match or zero.
        LibItem::F_INSTR => "F_INSTR: LD  BC,0001H
                             F_INSTN: LD  A,B
                                      OR  A
                                      JP  M,E_PARM
                                      OR  C
                                      JP  Z,E_PARM
                                      PUSH BC
                             F_INST1: DEC BC
                                      LD  A,B
                                      OR  C
                                      JR  Z,F_INST2
                                      LD  A,(HL)
                                      OR  A
                                      JR  Z,F_INST5
                                      INC HL
                                      JR  F_INST1
                             F_INST2: POP BC
                             F_INST3: PUSH HL
                                      PUSH DE
                             F_INST4: LD  A,(DE)
                                      OR  A
                                      JR  Z,F_INST7
                                      CP  (HL)
                                      INC HL
                                      INC DE
                                      JR  Z,F_INST4
                                      POP DE
                                      POP HL
                                      LD  A,(HL)
                                      OR  A
                                      JR  Z,F_INST6
                                      INC HL
                                      INC BC
                                      JR  F_INST3
                             F_INST5: POP BC
                             F_INST6: LD  HL,0000H
                                      RET
                             F_INST7: POP DE
                                      POP HL
                                      LD  H,B
                                      LD  L,C
                                      RET"
            .to_string(),
        // DE left, HL right.
        LibItem::O_STEQ => compare("O_STEQ", "LD   HL,0FFFFH\nRET  Z\nINC  HL"),
        LibItem::O_STNE => compare("O_STNE", "LD   HL,0FFFFH\nRET  NZ\nINC  HL"),
        LibItem::O_STLT => compare("O_STLT", "LD   HL,0FFFFH\nRET  C\nINC  HL"),
        LibItem::O_STLE => compare("O_STLE", "LD   HL,0FFFFH\nRET  C\nRET  Z\nINC  HL"),
        LibItem::O_STGT => compare("O_STGT", "LD   HL,0000H\nRET  C\nRET  Z\nDEC  HL"),
        LibItem::O_STGE => compare("O_STGE", "LD   HL,0000H\nRET  C\nDEC  HL"),
        // CY when (DE) sorts before (HL), Z when equal.
        LibItem::STCMP => "STCMP:  LD   A,(DE)
                                   CP   (HL)
                                   RET  NZ
                                   OR   A
                                   RET  Z
                                   INC  DE
                                   INC  HL
                                   JR   STCMP"
            .to_string(),
        // Copies at most BC characters from HL to DE and terminates.
        // DE ends on the terminator.
        LibItem::STNCP => "STNCP:  LD   A,B
                                   OR   C
                                   JR   Z,STNCP2
                                   DEC  DE
                           STNCP1: INC  DE
                                   LD   A,(HL)
                                   INC  HL
                                   LD   (DE),A
                                   OR   A
                                   RET  Z
                                   DEC  BC
                                   LD   A,B
                                   OR   C
                                   JR   NZ,STNCP1
                                   INC  DE
                           STNCP2: LD   (DE),A
                                   RET"
            .to_string(),
        // DE variable, HL new value. ASGSM copies a temporary first.
        LibItem::ASGSM => "ASGSM:  PUSH DE
                                   CALL SMACP
                                   POP  DE
                           ASGSL:  PUSH DE
                                   PUSH HL
                                   EX   DE,HL
                                   LD   E,(HL)
                                   INC  HL
                                   LD   D,(HL)
                                   CALL MFREE
                                   POP  DE
                                   POP  HL
                                   LD   (HL),E
                                   INC  HL
                                   LD   (HL),D
                                   RET"
            .to_string(),
        // Value owned by someone else: share the block before storing.
        LibItem::ASGSV => "ASGSV:  PUSH DE
                                   EX   DE,HL
                                   CALL SVDUP
                                   EX   DE,HL
                                   POP  DE
                                   JP   ASGSL"
            .to_string(),
        // Heap copy of the text at HL, returned in HL.
        LibItem::SMACP => format!(
            "SMACP:  LD   A,(HL)
                     OR   A
                     JR   NZ,SMACP1
                     LD   HL,D_EMPT
                     RET
             SMACP1: PUSH HL
                     CALL MFIND
                     POP  HL
                     LD   BC,{}
                     PUSH DE
                     CALL STNCP
                     POP  HL
                     JP   MALLOC",
            max
        ),
        // DE string. Heap blocks gain a reference, or a copy when the
        // count is full or the block is marked.
        LibItem::SVDUP => format!(
            "SVDUP:  LD   HL,HEAPB
                     OR   A
                     SBC  HL,DE
                     RET  NC
                     ADD  HL,DE
                     JR   SVDUP2
             SVDUP1: LD   A,B
                     OR   C
                     RET  Z
                     LD   H,B
                     LD   L,C
             SVDUP2: LD   C,(HL)
                     INC  HL
                     LD   B,(HL)
                     INC  HL
                     INC  HL
                     INC  HL
                     INC  HL
                     OR   A
                     SBC  HL,DE
                     JR   NZ,SVDUP1
                     ADD  HL,DE
                     DEC  HL
                     BIT  7,(HL)
                     JR   NZ,SVDUP3
                     INC  (HL)
                     RET  P
                     DEC  (HL)
             SVDUP3: PUSH DE
                     CALL MFIND
                     POP  HL
                     PUSH DE
                     LD   BC,{}
                     CALL STNCP
                     POP  HL
                     CALL MALLOC
                     EX   DE,HL
                     RET",
            max
        ),
        // Marks the block at HL for the next MRGC, HL is kept.
        LibItem::SMARK => "SMARK:  PUSH HL
                                   EX   DE,HL
                                   CALL MMGC
                                   POP  HL
                                   RET
                           MMGC:   LD   HL,HEAPB
                                   OR   A
                                   SBC  HL,DE
                                   RET  NC
                                   PUSH IY
                                   ADD  HL,DE
                                   DEC  DE
                                   DEC  DE
                                   DEC  DE
                                   DEC  DE
                                   DEC  DE
                           MMGC1:  LD   A,H
                                   OR   L
                                   JR   Z,MMGC3
                                   SBC  HL,DE
                                   JR   Z,MMGC2
                                   ADD  HL,DE
                                   LD   A,(HL)
                                   INC  HL
                                   LD   H,(HL)
                                   LD   L,A
                                   JR   MMGC1
                           MMGC2:  EX   DE,HL
                                   INC  HL
                                   INC  HL
                                   INC  HL
                                   INC  HL
                                   SET  7,(HL)
                           MMGC3:  POP  IY
                                   RET"
            .to_string(),
        // Releases one reference of every marked block. Skipped while
        // a user function runs with marked values outstanding.
        LibItem::MRGC => "MRGC:   LD   A,(M_GCLK)
                                  OR   A
                                  RET  NZ
                                  PUSH IY
                                  LD   HL,0000H
                                  LD   IY,HEAPB
                          MRGC1:  LD   A,(IY+4)
                                  OR   A
                                  JP   P,MRGC3
                                  AND  7FH
                                  JR   Z,MRGC2
                                  DEC  A
                          MRGC2:  LD   (IY+4),A
                                  JR   NZ,MRGC3
                                  PUSH HL
                                  CALL MFREE4
                                  POP  HL
                                  LD   A,H
                                  OR   L
                                  JR   Z,MRGC3
                                  PUSH HL
                                  POP  IY
                                  CALL MFREE4
                          MRGC3:  PUSH IY
                                  POP  HL
                                  LD   E,(IY+0)
                                  LD   D,(IY+1)
                                  LD   A,D
                                  OR   E
                                  JR   Z,MRGC4
                                  PUSH DE
                                  POP  IY
                                  JR   MRGC1
                          MRGC4:  POP  IY
                                  RET"
            .to_string(),
        // DE string. Pointers outside the heap are ignored.
        LibItem::MFREE => "MFREE:  LD   HL,HEAPB
                                   OR   A
                                   SBC  HL,DE
                                   RET  NC
                                   PUSH IY
                                   ADD  HL,DE
                                   DEC  DE
                                   DEC  DE
                                   DEC  DE
                                   DEC  DE
                                   DEC  DE
                                   LD   BC,0000H
                                   JR   MFREE2
                           MFREE1: ADD  HL,DE
                                   LD   B,H
                                   LD   C,L
                                   LD   A,(HL)
                                   INC  HL
                                   LD   H,(HL)
                                   LD   L,A
                           MFREE2: LD   A,H
                                   OR   L
                                   JR   Z,MFREE3
                                   SBC  HL,DE
                                   JR   NZ,MFREE1
                                   ADD  HL,DE
                                   PUSH HL
                                   POP  IY
                                   LD   A,(IY+4)
                                   AND  7FH
                                   LD   (IY+4),A
                                   JR   Z,MFREE3
                                   DEC  (IY+4)
                                   JR   NZ,MFREE3
                                   PUSH BC
                                   CALL MFREE4
                                   POP  BC
                                   LD   A,B
                                   OR   C
                                   JR   Z,MFREE3
                                   PUSH BC
                                   POP  IY
                                   CALL MFREE4
                           MFREE3: POP  IY
                                   RET
                           MFREE4: LD   A,(IY+4)
                                   OR   A
                                   RET  NZ
                                   LD   L,(IY+0)
                                   LD   H,(IY+1)
                                   LD   A,H
                                   OR   L
                                   RET  Z
                                   LD   E,(HL)
                                   INC  HL
                                   LD   D,(HL)
                                   INC  HL
                                   LD   C,(HL)
                                   INC  HL
                                   LD   B,(HL)
                                   INC  HL
                                   LD   A,(HL)
                                   OR   A
                                   RET  NZ
                                   LD   (IY+0),E
                                   LD   (IY+1),D
                                   LD   L,(IY+2)
                                   LD   H,(IY+3)
                                   ADD  HL,BC
                                   LD   BC,0005H
                                   ADD  HL,BC
                                   LD   (IY+2),L
                                   LD   (IY+3),H
                                   RET"
            .to_string(),
        // Data start of a free block that holds a string of any length.
        LibItem::MFIND => "MFIND:  LD   HL,HEAPB
                           MFIND1: LD   E,(HL)
                                   INC  HL
                                   LD   D,(HL)
                                   INC  HL
                                   INC  HL
                                   LD   A,(HL)
                                   OR   A
                                   JR   Z,MFIND2
                                   INC  HL
                                   LD   A,(HL)
                                   OR   A
                                   JR   NZ,MFIND2
                                   INC  HL
                                   EX   DE,HL
                                   RET
                           MFIND2: EX   DE,HL
                                   LD   A,H
                                   OR   L
                                   JR   NZ,MFIND1
                                   CALL XOUTST
                                   DB   'Out of string memory'
                                   DB   00H
                                   JP   E_EXIT"
            .to_string(),
        // Claims the block found by MFIND. HL start, DE terminator.
        // The unused tail becomes a new free block when it is large
        // enough to be worth it.
        LibItem::MALLOC => "MALLOC: PUSH IY
                                    PUSH HL
                                    LD   IY,0FFFBH
                                    EX   DE,HL
                                    ADD  IY,DE
                                    LD   (IY+4),01H
                                    INC  HL
                                    OR   A
                                    SBC  HL,DE
                                    JR   C,MALLO1
                                    JR   Z,MALLO1
                                    LD   B,H
                                    LD   C,L
                                    LD   L,(IY+2)
                                    LD   H,(IY+3)
                                    OR   A
                                    SBC  HL,BC
                                    JR   C,MALLO1
                                    JR   Z,MALLO1
                                    LD   DE,0010H
                                    SBC  HL,DE
                                    JR   C,MALLO1
                                    JR   Z,MALLO1
                                    ADD  HL,DE
                                    LD   (IY+2),C
                                    LD   (IY+3),B
                                    LD   E,(IY+0)
                                    LD   D,(IY+1)
                                    PUSH IY
                                    ADD  IY,BC
                                    LD   BC,0005H
                                    ADD  IY,BC
                                    LD   (IY+0),E
                                    LD   (IY+1),D
                                    LD   DE,0005H
                                    OR   A
                                    SBC  HL,DE
                                    LD   (IY+2),L
                                    LD   (IY+3),H
                                    LD   (IY+4),00H
                                    PUSH IY
                                    POP  DE
                                    POP  IY
                                    LD   (IY+0),E
                                    LD   (IY+1),D
                            MALLO1: POP  HL
                                    POP  IY
                                    RET"
            .to_string(),
        // One free block spanning the whole heap.
        LibItem::MINIT => "MINIT:  LD   HL,HEAPB
                                   LD   DE,HEAPE-HEAPB-5
                                   XOR  A
                                   LD   (M_GCLK),A
                                   LD   (HL),A
                                   INC  HL
                                   LD   (HL),A
                                   INC  HL
                                   LD   (HL),E
                                   INC  HL
                                   LD   (HL),D
                                   INC  HL
                                   LD   (HL),A
                                   RET"
            .to_string(),
        LibItem::D_EMPT => "D_EMPT: DB   00H".to_string(),
        LibItem::M_GCLK => "M_GCLK: DS   1".to_string(),
        LibItem::HEAPB => format!(
            "HEAPB:  DS   {}
             HEAPE:",
            hex4(env.opts.heap_size as i64)
        ),
        _ => return false,
    };
    buf.append_text(&text);
    true
}

fn compare(label: &str, tail: &str) -> String {
    let mut text = format!("{}: CALL STCMP\n", label);
    for line in tail.lines() {
        text.push_str("        ");
        text.push_str(line);
        text.push('\n');
    }
    text.push_str("        RET");
    text
}

/// Copies HL to M_STMP, applying `op` to characters in `lo..hi`.
fn case_copy(label: &str, lo: &str, hi: &str, op: &str) -> String {
    format!(
        "{l}:  LD   DE,M_STMP
               PUSH DE
               LD   BC,{max}
         {l}1: LD   A,(HL)
               INC  HL
               CP   {lo}
               JR   C,{l}2
               CP   {hi}
               JR   NC,{l}2
               {op}
         {l}2: LD   (DE),A
               INC  DE
               OR   A
               JR   Z,{l}3
               DEC  BC
               LD   A,B
               OR   C
               JR   NZ,{l}1
               LD   (DE),A
         {l}3: POP  HL
               RET",
        l = label,
        max = hex4(MAX_STR_LEN),
        lo = lo,
        hi = hi,
        op = op
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mach::buffer::Instr;
    use crate::mach::options::Options;
    use crate::mach::target;

    fn fragment(item: LibItem) -> CodeBuf {
        let t = target::lookup("z1013").unwrap();
        let opts = Options::new();
        let mut buf = CodeBuf::new();
        assert!(append(item, &mut buf, &Env::new(t.as_ref(), &opts)));
        buf
    }

    #[test]
    fn test_compare_wrapper() {
        let buf = fragment(LibItem::O_STLE);
        assert_eq!(
            buf.to_string(),
            "O_STLE:\tCALL\tSTCMP\n\tLD\tHL,0FFFFH\n\tRET\tC\n\tRET\tZ\n\tINC\tHL\n\tRET\n"
        );
    }

    #[test]
    fn test_malloc_always_counts_one_reference() {
        let buf = fragment(LibItem::MALLOC);
        let set = buf.iter().position(|i| i.is("LD", "(IY+4),01H")).unwrap();
        let first_exit = buf.iter().position(|i| i.is("JR", "C,MALLO1")).unwrap();
        assert!(set < first_exit);
        assert_eq!(
            buf.iter().filter(|i| i.is("LD", "(IY+4),01H")).count(),
            1
        );
    }

    #[test]
    fn test_heap_size() {
        let buf = fragment(LibItem::HEAPB);
        assert_eq!(buf.get(0), Some(&Instr::new("DS", "0400H").with_label("HEAPB")));
        assert_eq!(buf.get(1), Some(&Instr::label("HEAPE")));
    }
}
