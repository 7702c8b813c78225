use crate::error;
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakCheck {
    Never,
    /// Only while waiting for keyboard input.
    Input,
    /// Also at every loop back edge and GOTO.
    Always,
}

impl std::str::FromStr for BreakCheck {
    type Err = Error;
    fn from_str(s: &str) -> Result<BreakCheck> {
        match s.to_ascii_lowercase().as_str() {
            "never" => Ok(BreakCheck::Never),
            "input" => Ok(BreakCheck::Input),
            "always" => Ok(BreakCheck::Always),
            _ => Err(error!(SyntaxError; &format!("BREAK CHECK {}", s))),
        }
    }
}

/// ## Compiler options
///
/// Everything the compiler consults while generating code. Defaults
/// produce a checked program for the Z1013.

#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub app_name: String,
    pub begin_addr: Option<u16>,
    pub stack_size: u16,
    pub heap_size: u16,
    pub check_bounds: bool,
    pub check_stack: bool,
    pub warn_implicit: bool,
    pub warn_unused: bool,
    pub implicit_declaration: bool,
    pub prefer_relative_jumps: bool,
    pub trace_line_numbers: bool,
    pub break_check: BreakCheck,
    pub include_source: bool,
    pub optimize: bool,
    pub header: bool,
    pub target: String,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            app_name: "MYAPP".to_string(),
            begin_addr: None,
            stack_size: 128,
            heap_size: 1024,
            check_bounds: true,
            check_stack: true,
            warn_implicit: true,
            warn_unused: true,
            implicit_declaration: true,
            prefer_relative_jumps: true,
            trace_line_numbers: false,
            break_check: BreakCheck::Input,
            include_source: false,
            optimize: true,
            header: true,
            target: "z1013".to_string(),
        }
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(error!(SyntaxError; &format!("{} EXPECTS TRUE OR FALSE", name.to_uppercase()))),
    }
}

/// Accepts decimal or hex with an `H` suffix or `0x` prefix.
fn parse_u16(name: &str, value: &str) -> Result<u16> {
    let v = value.trim();
    let parsed = if let Some(hex) = v.strip_prefix("0x").or_else(|| v.strip_prefix("0X")) {
        u16::from_str_radix(hex, 16)
    } else if let Some(hex) = v.strip_suffix('H').or_else(|| v.strip_suffix('h')) {
        u16::from_str_radix(hex, 16)
    } else {
        v.parse::<u16>()
    };
    parsed.map_err(|_| error!(Overflow; &format!("{} = {}", name.to_uppercase(), value)))
}

impl Options {
    pub fn new() -> Options {
        Options::default()
    }

    /// Sets one option from `name=value`.
    pub fn apply(&mut self, setting: &str) -> Result<()> {
        let (name, value) = match setting.split_once('=') {
            Some((n, v)) => (n.trim(), v.trim()),
            None => (setting.trim(), "true"),
        };
        match name {
            "app_name" => self.app_name = value.to_uppercase(),
            "begin_addr" => self.begin_addr = Some(parse_u16(name, value)?),
            "stack_size" => self.stack_size = parse_u16(name, value)?,
            "heap_size" => self.heap_size = parse_u16(name, value)?,
            "check_bounds" => self.check_bounds = parse_bool(name, value)?,
            "check_stack" => self.check_stack = parse_bool(name, value)?,
            "warn_implicit" => self.warn_implicit = parse_bool(name, value)?,
            "warn_unused" => self.warn_unused = parse_bool(name, value)?,
            "implicit_declaration" => self.implicit_declaration = parse_bool(name, value)?,
            "prefer_relative_jumps" => self.prefer_relative_jumps = parse_bool(name, value)?,
            "trace_line_numbers" => self.trace_line_numbers = parse_bool(name, value)?,
            "break_check" => self.break_check = value.parse()?,
            "include_source" => self.include_source = parse_bool(name, value)?,
            "optimize" => self.optimize = parse_bool(name, value)?,
            "header" => self.header = parse_bool(name, value)?,
            "target" => {
                if super::target::lookup(value).is_none() {
                    return Err(error!(Unsupported; &format!("TARGET {}", value)));
                }
                self.target = value.to_lowercase()
            }
            _ => return Err(error!(SyntaxError; &format!("UNKNOWN OPTION {}", name))),
        }
        log::debug!("option {} = {}", name, value);
        Ok(())
    }

    /// Current value of a named option rendered as text.
    pub fn get(&self, name: &str) -> Option<String> {
        let s = match name {
            "app_name" => self.app_name.clone(),
            "begin_addr" => match self.begin_addr {
                Some(a) => format!("{:04X}H", a),
                None => String::new(),
            },
            "stack_size" => self.stack_size.to_string(),
            "heap_size" => self.heap_size.to_string(),
            "check_bounds" => self.check_bounds.to_string(),
            "check_stack" => self.check_stack.to_string(),
            "warn_implicit" => self.warn_implicit.to_string(),
            "warn_unused" => self.warn_unused.to_string(),
            "implicit_declaration" => self.implicit_declaration.to_string(),
            "prefer_relative_jumps" => self.prefer_relative_jumps.to_string(),
            "trace_line_numbers" => self.trace_line_numbers.to_string(),
            "break_check" => format!("{:?}", self.break_check).to_lowercase(),
            "include_source" => self.include_source.to_string(),
            "optimize" => self.optimize.to_string(),
            "header" => self.header.to_string(),
            "target" => self.target.clone(),
            _ => return None,
        };
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply() {
        let mut opts = Options::new();
        opts.apply("begin_addr=0400H").unwrap();
        opts.apply("check_bounds=false").unwrap();
        opts.apply("break_check=always").unwrap();
        opts.apply("target=kc85").unwrap();
        opts.apply("trace_line_numbers").unwrap();
        assert_eq!(opts.begin_addr, Some(0x400));
        assert!(!opts.check_bounds);
        assert!(opts.trace_line_numbers);
        assert_eq!(opts.get("break_check").as_deref(), Some("always"));
        assert_eq!(opts.get("begin_addr").as_deref(), Some("0400H"));
        assert!(opts.apply("target=c64").is_err());
        assert!(opts.apply("heap_size=70000").is_err());
        assert!(opts.apply("bogus=1").is_err());
        assert_eq!(opts.get("bogus"), None);
    }
}
