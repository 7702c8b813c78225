/// ## Assembly output buffer
///
/// A list of instruction records instead of raw text. Callers emit code,
/// look at what was produced with `lines_from` or `last`, and then `cut`,
/// `replace` or `insert` records to rewrite it.

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Instr {
    pub label: Option<String>,
    pub op: String,
    pub args: String,
    pub comment: Option<String>,
}

impl Instr {
    pub fn new(op: &str, args: &str) -> Instr {
        Instr {
            label: None,
            op: op.to_string(),
            args: args.to_string(),
            comment: None,
        }
    }

    pub fn label(label: &str) -> Instr {
        Instr {
            label: Some(label.to_string()),
            ..Instr::default()
        }
    }

    pub fn comment(text: &str) -> Instr {
        Instr {
            comment: Some(text.to_string()),
            ..Instr::default()
        }
    }

    pub fn with_label(mut self, label: &str) -> Instr {
        self.label = Some(label.to_string());
        self
    }

    pub fn is(&self, op: &str, args: &str) -> bool {
        self.op == op && self.args == args
    }

    pub fn is_op(&self, op: &str) -> bool {
        self.op == op
    }

    pub fn is_label_only(&self) -> bool {
        self.label.is_some() && self.op.is_empty()
    }

    pub fn is_comment_only(&self) -> bool {
        self.label.is_none() && self.op.is_empty()
    }

    /// Unconditional transfer of control.
    pub fn is_unconditional_jump(&self) -> bool {
        match self.op.as_str() {
            "JP" | "JR" => !self.args.contains(','),
            "RET" => self.args.is_empty(),
            _ => false,
        }
    }

    /// Jump target for `JP`, `JR`, `CALL` and `DJNZ`, conditional or not.
    pub fn target(&self) -> Option<&str> {
        match self.op.as_str() {
            "JP" | "JR" | "CALL" | "DJNZ" => {
                let t = match self.args.rfind(',') {
                    Some(i) => &self.args[i + 1..],
                    None => &self.args,
                };
                if t.starts_with('(') {
                    None
                } else {
                    Some(t)
                }
            }
            _ => None,
        }
    }

    /// Parses one template line like `LABEL:\tOP\tARGS\t;COMMENT`.
    /// Fields may be separated by tabs or spaces. A label starts in the
    /// first column or ends with a colon.
    pub fn parse(line: &str) -> Instr {
        let mut instr = Instr::default();
        let mut rest = line;
        if let Some(c) = rest.find(';') {
            if !rest[..c].contains('\'') {
                instr.comment = Some(rest[c + 1..].to_string());
                rest = &rest[..c];
            }
        }
        let rest = rest.trim_end();
        let at_margin = matches!(rest.chars().next(), Some(c) if !c.is_whitespace());
        let rest = rest.trim_start();
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let rest = if at_margin || rest[..end].ends_with(':') {
            instr.label = Some(rest[..end].trim_end_matches(':').to_string());
            rest[end..].trim_start()
        } else {
            rest
        };
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        instr.op = rest[..end].to_string();
        instr.args = rest[end..].trim().to_string();
        instr
    }
}

impl std::fmt::Display for Instr {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if let Some(label) = &self.label {
            write!(f, "{}:", label)?;
        }
        if !self.op.is_empty() {
            write!(f, "\t{}", self.op)?;
            if !self.args.is_empty() {
                write!(f, "\t{}", self.args)?;
            }
        }
        if let Some(comment) = &self.comment {
            if self.label.is_none() && self.op.is_empty() {
                write!(f, ";{}", comment)?;
            } else {
                write!(f, "\t;{}", comment)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CodeBuf {
    lines: Vec<Instr>,
    enabled: bool,
}

impl Default for CodeBuf {
    fn default() -> CodeBuf {
        CodeBuf::new()
    }
}

impl CodeBuf {
    pub fn new() -> CodeBuf {
        CodeBuf {
            lines: vec![],
            enabled: true,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Disabled buffers drop everything appended to them.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, pos: usize) -> Option<&Instr> {
        self.lines.get(pos)
    }

    pub fn get_mut(&mut self, pos: usize) -> Option<&mut Instr> {
        self.lines.get_mut(pos)
    }

    pub fn last(&self) -> Option<&Instr> {
        self.lines.last()
    }

    pub fn last_line_pos(&self) -> usize {
        self.lines.len().saturating_sub(1)
    }

    pub fn lines_from(&self, pos: usize) -> &[Instr] {
        &self.lines[pos.min(self.lines.len())..]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instr> {
        self.lines.iter()
    }

    pub fn append(&mut self, instr: Instr) {
        if self.enabled {
            self.lines.push(instr);
        }
    }

    pub fn append_instr(&mut self, op: &str, args: &str) {
        self.append(Instr::new(op, args));
    }

    pub fn append_label(&mut self, label: &str) {
        self.append(Instr::label(label));
    }

    pub fn append_comment(&mut self, text: &str) {
        self.append(Instr::comment(text));
    }

    /// Appends template text, one record per line.
    pub fn append_text(&mut self, text: &str) {
        for line in text.lines() {
            if line.is_empty() {
                continue;
            }
            self.append(Instr::parse(line));
        }
    }

    pub fn append_buf(&mut self, other: &CodeBuf) {
        for instr in other.iter() {
            self.append(instr.clone());
        }
    }

    pub fn append_hex2(&mut self, op: &str, prefix: &str, value: i64) {
        self.append_instr(op, &format!("{}{}", prefix, hex2(value)));
    }

    pub fn append_hex4(&mut self, op: &str, prefix: &str, value: i64) {
        self.append_instr(op, &format!("{}{}", prefix, hex4(value)));
    }

    /// Zero terminated string literal as DB lines.
    pub fn append_string_literal(&mut self, text: &str) {
        for instr in string_literal(text) {
            self.append(instr);
        }
    }

    /// Removes and returns everything from `pos` onward.
    pub fn cut(&mut self, pos: usize) -> Vec<Instr> {
        if pos >= self.lines.len() {
            return vec![];
        }
        self.lines.split_off(pos)
    }

    /// Cuts the tail if it equals `tail`.
    pub fn cut_if_ends_with(&mut self, tail: &[Instr]) -> bool {
        if self.lines.ends_with(tail) {
            let pos = self.lines.len() - tail.len();
            self.lines.truncate(pos);
            return true;
        }
        false
    }

    pub fn insert(&mut self, pos: usize, instrs: Vec<Instr>) {
        if !self.enabled {
            return;
        }
        let pos = pos.min(self.lines.len());
        self.lines.splice(pos..pos, instrs);
    }

    pub fn replace(&mut self, pos: usize, instr: Instr) {
        if let Some(slot) = self.lines.get_mut(pos) {
            *slot = instr;
        }
    }

    pub fn remove(&mut self, pos: usize) -> Option<Instr> {
        if pos < self.lines.len() {
            Some(self.lines.remove(pos))
        } else {
            None
        }
    }

    pub fn retain<F: FnMut(&Instr) -> bool>(&mut self, f: F) {
        self.lines.retain(f)
    }

    /// Number of references to `label` as a jump or load operand.
    pub fn count_references(&self, label: &str) -> usize {
        self.lines
            .iter()
            .filter(|i| i.target() == Some(label) || operand_mentions(&i.args, label))
            .count()
    }

    pub fn contains_call(&self, label: &str) -> bool {
        self.lines
            .iter()
            .any(|i| i.is_op("CALL") && i.target() == Some(label))
    }
}

fn operand_mentions(args: &str, label: &str) -> bool {
    args.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .any(|w| w == label)
}

impl std::fmt::Display for CodeBuf {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

fn hex_literal(digits: String) -> String {
    match digits.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => format!("0{}H", digits),
        _ => format!("{}H", digits),
    }
}

/// 8 bit immediate like `0FFH`.
pub fn hex2(value: i64) -> String {
    hex_literal(format!("{:02X}", value & 0xFF))
}

/// 16 bit immediate like `0C000H`.
pub fn hex4(value: i64) -> String {
    hex_literal(format!("{:04X}", value & 0xFFFF))
}

const MAX_TEXT_PER_LINE: usize = 40;
const MAX_BYTES_PER_LINE: usize = 8;

fn is_db_printable(ch: char) -> bool {
    (' '..='~').contains(&ch) && ch != '\'' && ch != '"'
}

pub fn string_literal(text: &str) -> Vec<Instr> {
    let mut out = vec![];
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if is_db_printable(chars[i]) {
            let run: String = chars[i..]
                .iter()
                .take_while(|c| is_db_printable(**c))
                .take(MAX_TEXT_PER_LINE)
                .collect();
            i += run.chars().count();
            out.push(Instr::new("DB", &format!("'{}'", run)));
        } else {
            let bytes: Vec<String> = chars[i..]
                .iter()
                .take_while(|c| !is_db_printable(**c))
                .take(MAX_BYTES_PER_LINE)
                .map(|c| hex2(*c as i64))
                .collect();
            i += bytes.len();
            out.push(Instr::new("DB", &bytes.join(",")));
        }
    }
    out.push(Instr::new("DB", "00H"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn parse_hex(s: &str) -> i64 {
        i64::from_str_radix(s.trim_end_matches('H'), 16).unwrap()
    }

    #[test]
    fn test_hex_leading_zero() {
        assert_eq!(hex2(0x0A), "0AH");
        assert_eq!(hex2(0xFF), "0FFH");
        assert_eq!(hex2(-1), "0FFH");
        assert_eq!(hex4(0xC000), "0C000H");
        assert_eq!(hex4(0x1234), "1234H");
        assert_eq!(hex4(-2), "0FFFEH");
    }

    proptest! {
        #[test]
        fn test_hex2_round_trip(x in any::<i64>()) {
            prop_assert_eq!(parse_hex(&hex2(x)), x.rem_euclid(256));
        }

        #[test]
        fn test_hex4_round_trip(x in any::<i64>()) {
            prop_assert_eq!(parse_hex(&hex4(x)), x.rem_euclid(65536));
        }
    }

    #[test]
    fn test_string_literal_runs() {
        let lines: Vec<String> = string_literal("HI\r\n'OK'")
            .iter()
            .map(|i| i.to_string())
            .collect();
        assert_eq!(
            lines,
            [
                "\tDB\t'HI'",
                "\tDB\t0DH,0AH,27H",
                "\tDB\t'OK'",
                "\tDB\t27H",
                "\tDB\t00H"
            ]
        );
    }

    #[test]
    fn test_string_literal_caps() {
        let long = "X".repeat(45);
        let lines = string_literal(&long);
        assert_eq!(lines[0].args.len(), 42);
        assert_eq!(lines[1].args, "'XXXXX'");
        let ctl: String = (1u8..=10).map(|b| b as char).collect();
        let lines = string_literal(&ctl);
        assert_eq!(lines[0].args.split(',').count(), 8);
        assert_eq!(lines[1].args, "09H,0AH");
    }

    #[test]
    fn test_template_parse() {
        let mut buf = CodeBuf::new();
        buf.append_text("O_ADD:\tLD\tA,H\t;sign\n\tRET\nDONE:\n;note\n");
        assert_eq!(buf.len(), 4);
        assert_eq!(buf.get(0).unwrap().label.as_deref(), Some("O_ADD"));
        assert!(buf.get(0).unwrap().is("LD", "A,H"));
        assert!(buf.get(1).unwrap().is("RET", ""));
        assert!(buf.get(2).unwrap().is_label_only());
        assert!(buf.get(3).unwrap().is_comment_only());
        assert_eq!(
            buf.to_string(),
            "O_ADD:\tLD\tA,H\t;sign\n\tRET\nDONE:\n;note\n"
        );
    }

    #[test]
    fn test_spaced_template() {
        let i = Instr::parse("E_IDX:  CALL    XOUTST");
        assert_eq!(i.label.as_deref(), Some("E_IDX"));
        assert!(i.is("CALL", "XOUTST"));
        let i = Instr::parse("        DB      ' in line'");
        assert_eq!(i.label, None);
        assert_eq!(i.args, "' in line'");
        let i = Instr::parse("        DB      ';'");
        assert_eq!(i.comment, None);
        let i = Instr::parse("     XCURS1: JP   0005H");
        assert_eq!(i.label.as_deref(), Some("XCURS1"));
        assert!(i.is("JP", "0005H"));
    }

    #[test]
    fn test_disabled_drops_output() {
        let mut buf = CodeBuf::new();
        buf.append_instr("NOP", "");
        buf.set_enabled(false);
        buf.append_instr("HALT", "");
        buf.append_text("\tRET\n");
        buf.set_enabled(true);
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn test_cut_and_reinsert() {
        let mut buf = CodeBuf::new();
        buf.append_instr("PUSH", "HL");
        let pos = buf.len();
        buf.append_instr("LD", "HL,0005H");
        let tail = buf.cut(pos);
        assert_eq!(tail, [Instr::new("LD", "HL,0005H")]);
        buf.append_instr("EX", "DE,HL");
        buf.insert(buf.len(), tail);
        assert_eq!(buf.to_string(), "\tPUSH\tHL\n\tEX\tDE,HL\n\tLD\tHL,0005H\n");
        assert!(buf.cut_if_ends_with(&[Instr::new("LD", "HL,0005H")]));
        assert!(!buf.cut_if_ends_with(&[Instr::new("LD", "HL,0005H")]));
        assert_eq!(buf.last_line_pos(), 1);
    }

    #[test]
    fn test_targets() {
        assert_eq!(Instr::new("JP", "NZ,M12").target(), Some("M12"));
        assert_eq!(Instr::new("CALL", "O_ADD").target(), Some("O_ADD"));
        assert_eq!(Instr::new("JP", "(HL)").target(), None);
        assert!(Instr::new("JP", "L10").is_unconditional_jump());
        assert!(!Instr::new("JR", "Z,L10").is_unconditional_jump());
        assert!(Instr::new("RET", "").is_unconditional_jump());
        assert!(!Instr::new("RET", "NC").is_unconditional_jump());
    }
}
