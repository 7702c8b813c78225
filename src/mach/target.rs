use super::buffer::{hex4, string_literal, CodeBuf, Instr};

/// Keyboard routines a program may need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// `XINKEY`: key code or zero, never waits.
    Inkey,
    /// `XINCH`: waits for a key.
    Inch,
    /// `XCKBRK`: jumps to `XBREAK` when the break key is down.
    CheckBreak,
}

/// ## Target machines
///
/// A target knows its operating system entry points and supplies the
/// fragments behind the `X...` labels the runtime library calls.
/// Fragment callbacks append complete routines including their label.

pub trait Target {
    fn name(&self) -> &'static str;
    fn default_begin_addr(&self) -> u16;
    /// Iterations of the `XPAUSE` inner loop that take 100 ms.
    fn loop_count_100ms(&self) -> u16;

    fn uses_app_name(&self) -> bool {
        false
    }
    fn cls(&self) -> bool {
        false
    }
    fn locate(&self) -> bool {
        false
    }
    fn color(&self) -> bool {
        false
    }
    fn border(&self) -> bool {
        false
    }
    fn cursor(&self) -> bool {
        false
    }
    fn graphics(&self) -> bool {
        false
    }
    fn printer(&self) -> bool {
        false
    }

    /// Code between `ORG` and `MSTART`. Returns a warning if any.
    fn append_prolog(&self, _buf: &mut CodeBuf, _app_name: &str) -> Option<String> {
        None
    }
    fn append_init(&self, _buf: &mut CodeBuf) {}
    /// Tail of `XEXIT`, after the stack pointer was restored.
    fn append_exit(&self, buf: &mut CodeBuf);
    fn append_xoutch(&self, buf: &mut CodeBuf);
    fn append_xoutnl(&self, buf: &mut CodeBuf) {
        buf.append_text(
            "XOUTNL: LD   A,0DH
                     CALL XOUTCH
                     LD   A,0AH
                     JP   XOUTCH",
        );
    }
    fn append_input(&self, buf: &mut CodeBuf, kind: InputKind, break_on_input: bool);
    fn append_xcls(&self, _buf: &mut CodeBuf) {}
    /// Row in DE, column in HL, both zero based.
    fn append_xlocate(&self, _buf: &mut CodeBuf) {}
    /// Foreground in HL, background in DE.
    fn append_xcolor(&self, _buf: &mut CodeBuf) {}
    fn append_xborder(&self, _buf: &mut CodeBuf) {}
    /// Cursor on when HL is non-zero.
    fn append_xcursor(&self, _buf: &mut CodeBuf) {}
    fn append_bss(&self, _buf: &mut CodeBuf) {}

    /// Capability names for the listing header.
    fn capabilities(&self) -> Vec<&'static str> {
        let mut v = vec![];
        for (has, name) in [
            (self.cls(), "cls"),
            (self.locate(), "locate"),
            (self.color(), "color"),
            (self.border(), "border"),
            (self.cursor(), "cursor"),
            (self.graphics(), "graphics"),
            (self.printer(), "printer"),
        ] {
            if has {
                v.push(name);
            }
        }
        v
    }
}

pub fn lookup(name: &str) -> Option<Box<dyn Target>> {
    match name.to_ascii_lowercase().as_str() {
        "z1013" => Some(Box::new(Z1013 {})),
        "z9001" | "kc87" => Some(Box::new(Z9001 {})),
        "kc85" | "kc85/2" | "kc85/3" => Some(Box::new(KC85 {})),
        _ => None,
    }
}

fn append_break_test(buf: &mut CodeBuf, break_on_input: bool) {
    if break_on_input {
        buf.append_text(
            "        CP   03H
                     JP   Z,XBREAK",
        );
    }
}

/// Robotron Z1013, monitor calls through `RST 20H`.
#[derive(Debug)]
pub struct Z1013 {}

impl Target for Z1013 {
    fn name(&self) -> &'static str {
        "Z1013"
    }
    fn default_begin_addr(&self) -> u16 {
        0x0100
    }
    fn loop_count_100ms(&self) -> u16 {
        55
    }
    fn cls(&self) -> bool {
        true
    }
    fn locate(&self) -> bool {
        true
    }
    fn cursor(&self) -> bool {
        true
    }
    fn graphics(&self) -> bool {
        true
    }
    fn printer(&self) -> bool {
        true
    }

    fn append_exit(&self, buf: &mut CodeBuf) {
        buf.append_instr("JP", "0038H");
    }

    fn append_xoutch(&self, buf: &mut CodeBuf) {
        buf.append_text(
            "XOUTCH: CP   0AH
                     RET  Z
                     RST  20H
                     DB   00H
                     RET",
        );
    }

    fn append_xoutnl(&self, buf: &mut CodeBuf) {
        buf.append_text(
            "XOUTNL: LD   A,0DH
                     RST  20H
                     DB   00H
                     RET",
        );
    }

    fn append_input(&self, buf: &mut CodeBuf, kind: InputKind, break_on_input: bool) {
        match kind {
            InputKind::Inkey => {
                buf.append_label("XCKBRK");
                buf.append_text(
                    "XINKEY: XOR  A
                             LD   (0004H),A
                             RST  20H
                             DB   04H",
                );
                append_break_test(buf, break_on_input);
                buf.append_instr("RET", "");
            }
            InputKind::Inch => {
                buf.append_text(
                    "XINCH:  RST  20H
                             DB   01H",
                );
                append_break_test(buf, break_on_input);
                buf.append_instr("RET", "");
            }
            // Shares the XINKEY routine.
            InputKind::CheckBreak => {}
        }
    }

    fn append_xcls(&self, buf: &mut CodeBuf) {
        buf.append_text(
            "XCLS:   LD   A,0CH
                     JP   XOUTCH",
        );
    }

    fn append_xlocate(&self, buf: &mut CodeBuf) {
        buf.append_text(
            "XLOCATE: LD  A,1FH
                      CP  E
                      RET C
                      CP  L
                      RET C
                      PUSH HL
                      LD  HL,(002BH)
                      LD  A,(001FH)
                      LD  (HL),A
                      POP HL
                      EX  DE,HL
                      ADD HL,HL
                      ADD HL,HL
                      ADD HL,HL
                      ADD HL,HL
                      ADD HL,HL
                      ADD HL,DE
                      LD  BC,0EC00H
                      ADD HL,BC
                      LD  A,(HL)
                      LD  (001FH),A
                      LD  (HL),0FFH
                      LD  (002BH),HL
                      RET",
        );
    }

    fn append_xcursor(&self, buf: &mut CodeBuf) {
        buf.append_text(
            "XCURS:  LD   A,H
                     OR   L
                     JR   Z,XCURS1
                     LD   HL,(002BH)
                     LD   A,(HL)
                     CP   0FFH
                     RET  Z
                     LD   (001FH),A
                     LD   (HL),0FFH
                     RET
             XCURS1: LD   A,(001FH)
                     LD   HL,(002BH)
                     LD   (HL),A
                     RET",
        );
    }
}

/// Robotron Z9001 and KC87, calls through the BOS entry at 0005H.
#[derive(Debug)]
pub struct Z9001 {}

impl Target for Z9001 {
    fn name(&self) -> &'static str {
        "Z9001"
    }
    fn default_begin_addr(&self) -> u16 {
        0x0300
    }
    fn loop_count_100ms(&self) -> u16 {
        69
    }
    fn uses_app_name(&self) -> bool {
        true
    }
    fn cls(&self) -> bool {
        true
    }
    fn locate(&self) -> bool {
        true
    }
    fn color(&self) -> bool {
        true
    }
    fn border(&self) -> bool {
        true
    }
    fn cursor(&self) -> bool {
        true
    }
    fn graphics(&self) -> bool {
        true
    }
    fn printer(&self) -> bool {
        true
    }

    /// The OS menu finds programs by a jump followed by an eight
    /// character name.
    fn append_prolog(&self, buf: &mut CodeBuf, app_name: &str) -> Option<String> {
        buf.append_instr("JP", "MSTART");
        let name: String = format!("{:<8}", app_name).chars().take(8).collect();
        for instr in string_literal(&name) {
            buf.append(instr);
        }
        if name.trim().is_empty() {
            return Some("EMPTY PROGRAM NAME, NOT CALLABLE FROM THE OS MENU".to_string());
        }
        None
    }

    fn append_exit(&self, buf: &mut CodeBuf) {
        buf.append_instr("JP", "0000H");
    }

    fn append_xoutch(&self, buf: &mut CodeBuf) {
        buf.append_text(
            "XOUTCH: LD   C,2
                     LD   E,A
                     JP   0005H",
        );
    }

    fn append_xoutnl(&self, buf: &mut CodeBuf) {
        buf.append_text(
            "XOUTNL: LD   C,02H
                     LD   E,0DH
                     CALL 0005H
                     LD   C,02H
                     LD   E,0AH
                     JP   0005H",
        );
    }

    fn append_input(&self, buf: &mut CodeBuf, kind: InputKind, break_on_input: bool) {
        match kind {
            InputKind::Inkey => {
                buf.append_label("XCKBRK");
                buf.append_text(
                    "XINKEY: LD   C,0BH
                             CALL 0005H
                             JR   NC,XINKE2
                     XINKE1: XOR  A
                             RET
                     XINKE2: OR   A
                             RET  Z
                             LD   C,01H
                             CALL 0005H
                             JR   C,XINKE1",
                );
                append_break_test(buf, break_on_input);
                buf.append_instr("RET", "");
            }
            InputKind::Inch => {
                buf.append_text(
                    "XINCH:  LD   C,1
                             CALL 0005H
                             JR   C,XINCH",
                );
                append_break_test(buf, break_on_input);
                buf.append_instr("RET", "");
            }
            InputKind::CheckBreak => {}
        }
    }

    fn append_xcls(&self, buf: &mut CodeBuf) {
        buf.append_text(
            "XCLS:   LD   A,0CH
                     JP   XOUTCH",
        );
    }

    fn append_xlocate(&self, buf: &mut CodeBuf) {
        buf.append_text(
            "XLOCATE: LD  C,18
                      LD  D,E
                      INC D
                      LD  E,L
                      INC E
                      JP  0005H",
        );
    }

    fn append_xcolor(&self, buf: &mut CodeBuf) {
        buf.append_text(
            "XCOLOR: LD   A,L
                     SLA  A
                     SLA  A
                     SLA  A
                     SLA  A
                     AND  0F0H
                     LD   B,A
                     LD   A,E
                     AND  07H
                     OR   B
                     LD   (0027H),A
                     RET",
        );
    }

    fn append_xborder(&self, buf: &mut CodeBuf) {
        buf.append_text(
            "XBORDER: LD  A,05H
                      PUSH HL
                      CALL XOUTCH
                      POP HL
                      LD  A,L
                      JP  XOUTCH",
        );
    }

    fn append_xcursor(&self, buf: &mut CodeBuf) {
        buf.append_text(
            "XCURS:  LD   C,1DH
                     LD   A,H
                     OR   L
                     JR   Z,XCURS1
                     INC  C
             XCURS1: JP   0005H",
        );
    }
}

/// Muehlhausen KC85/2 and KC85/3, CAOS calls through 0F003H.
#[derive(Debug)]
pub struct KC85 {}

impl Target for KC85 {
    fn name(&self) -> &'static str {
        "KC85"
    }
    fn default_begin_addr(&self) -> u16 {
        0x0300
    }
    fn loop_count_100ms(&self) -> u16 {
        50
    }
    fn uses_app_name(&self) -> bool {
        true
    }
    fn cls(&self) -> bool {
        true
    }
    fn locate(&self) -> bool {
        true
    }
    fn color(&self) -> bool {
        true
    }
    fn graphics(&self) -> bool {
        true
    }
    fn printer(&self) -> bool {
        true
    }

    /// CAOS menu entry: two prolog bytes, the name and an epilog byte.
    fn append_prolog(&self, buf: &mut CodeBuf, app_name: &str) -> Option<String> {
        if app_name.trim().is_empty() {
            return Some("EMPTY PROGRAM NAME, NO CAOS MENU ENTRY".to_string());
        }
        buf.append_instr("DB", "7FH,7FH");
        let mut lines = string_literal(app_name);
        if let Some(last) = lines.last_mut() {
            *last = Instr::new("DB", "01H");
        }
        for instr in lines {
            buf.append(instr);
        }
        None
    }

    fn append_exit(&self, buf: &mut CodeBuf) {
        buf.append_instr("RET", "");
    }

    fn append_xoutch(&self, buf: &mut CodeBuf) {
        buf.append_text(
            "XOUTCH: CALL 0F003H
                     DB   24H
                     RET",
        );
    }

    fn append_input(&self, buf: &mut CodeBuf, kind: InputKind, break_on_input: bool) {
        match kind {
            InputKind::CheckBreak => buf.append_text(
                "XCKBRK: CALL 0F003H
                         DB   2AH
                         RET  NC
                         JP   XBREAK",
            ),
            InputKind::Inkey if break_on_input => buf.append_text(
                "XINKEY: CALL 0F003H
                         DB   0EH
                         JR   C,XINKE1
                         XOR  A
                         RET
                 XINKE1: CP   03H
                         JP   Z,XBREAK
                         RET",
            ),
            InputKind::Inkey => buf.append_text(
                "XINKEY: CALL 0F003H
                         DB   0EH
                         RET  C
                         XOR  A
                         RET",
            ),
            InputKind::Inch => {
                buf.append_text(
                    "XINCH:  CALL 0F003H
                             DB   16H",
                );
                append_break_test(buf, break_on_input);
                buf.append_instr("RET", "");
            }
        }
    }

    fn append_xcls(&self, buf: &mut CodeBuf) {
        buf.append_text(
            "XCLS:   LD   A,0CH
                     CALL 0F003H
                     DB   00H
                     RET",
        );
    }

    fn append_xlocate(&self, buf: &mut CodeBuf) {
        buf.append_text(
            "XLOCATE: LD  H,E
                      LD  (0B7A0H),HL
                      RET",
        );
    }

    fn append_xcolor(&self, buf: &mut CodeBuf) {
        buf.append_text(
            "XCOLOR: LD   A,L
                     AND  1FH
                     LD   L,A
                     LD   A,E
                     AND  07H
                     LD   E,A
                     LD   A,02H
                     LD   (0B781H),A
                     CALL 0F003H
                     DB   0FH
                     RET",
        );
    }
}

/// Origin used when none was configured.
pub fn begin_addr(target: &dyn Target, configured: Option<u16>) -> String {
    hex4(configured.unwrap_or_else(|| target.default_begin_addr()) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("Z1013").unwrap().name(), "Z1013");
        assert_eq!(lookup("kc87").unwrap().name(), "Z9001");
        assert!(lookup("c64").is_none());
        assert!(!lookup("z1013").unwrap().color());
        assert!(lookup("z9001").unwrap().border());
    }

    #[test]
    fn test_z9001_menu_name() {
        let mut buf = CodeBuf::new();
        assert_eq!(Z9001 {}.append_prolog(&mut buf, "HELLOWORLD"), None);
        let text = buf.to_string();
        assert!(text.starts_with("\tJP\tMSTART\n\tDB\t'HELLOWOR'\n\tDB\t00H\n"));
        let mut buf = CodeBuf::new();
        assert!(Z9001 {}.append_prolog(&mut buf, "").is_some());
    }

    #[test]
    fn test_kc85_menu_entry() {
        let mut buf = CodeBuf::new();
        KC85 {}.append_prolog(&mut buf, "GAME");
        assert_eq!(buf.to_string(), "\tDB\t7FH,7FH\n\tDB\t'GAME'\n\tDB\t01H\n");
    }

    #[test]
    fn test_break_check_shares_inkey() {
        let mut buf = CodeBuf::new();
        Z1013 {}.append_input(&mut buf, InputKind::CheckBreak, true);
        assert!(buf.is_empty());
        Z1013 {}.append_input(&mut buf, InputKind::Inkey, true);
        assert_eq!(buf.get(0), Some(&Instr::label("XCKBRK")));
        assert!(buf.iter().any(|i| i.is("JP", "Z,XBREAK")));
    }
}
