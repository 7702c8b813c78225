use crate::lang::LineNumber;
use std::rc::Rc;

/// Where a statement came from: file, physical line and BASIC line number.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    file: Rc<str>,
    physical: usize,
    line: LineNumber,
}

impl Location {
    pub fn new(file: Rc<str>, physical: usize) -> Location {
        Location {
            file,
            physical,
            line: None,
        }
    }

    pub fn with_line(mut self, line: LineNumber) -> Location {
        self.line = line;
        self
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn physical(&self) -> usize {
        self.physical
    }

    pub fn line(&self) -> LineNumber {
        self.line
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}:{}", self.file, self.physical)
    }
}

/// ## Diagnostics sink
///
/// Receives finished report lines. Errors and warnings travel on
/// separate channels and only errors suppress the output.
pub trait Diagnostics {
    fn error(&mut self, text: &str);
    fn warning(&mut self, text: &str);
}

/// Forwards everything to the `log` facade.
#[derive(Debug, Default)]
pub struct LogDiagnostics {}

impl Diagnostics for LogDiagnostics {
    fn error(&mut self, text: &str) {
        log::error!("{}", text);
    }
    fn warning(&mut self, text: &str) {
        log::warn!("{}", text);
    }
}

#[derive(Debug, Default)]
pub struct CollectDiagnostics {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl CollectDiagnostics {
    pub fn new() -> CollectDiagnostics {
        CollectDiagnostics::default()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// True when any error line contains `needle`.
    pub fn error_contains(&self, needle: &str) -> bool {
        self.errors.iter().any(|e| e.contains(needle))
    }

    pub fn warning_contains(&self, needle: &str) -> bool {
        self.warnings.iter().any(|w| w.contains(needle))
    }
}

impl Diagnostics for CollectDiagnostics {
    fn error(&mut self, text: &str) {
        log::debug!("collected error: {}", text);
        self.errors.push(text.to_string());
    }
    fn warning(&mut self, text: &str) {
        self.warnings.push(text.to_string());
    }
}

/// Statement text with ` ??? ` marking the start of the failing column.
pub fn mark_column(text: &str, column: &std::ops::Range<usize>) -> String {
    if *column == (0..0) {
        return text.to_string();
    }
    let at = text
        .char_indices()
        .nth(column.start)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    format!("{} ??? {}", text[..at].trim_end(), text[at..].trim_start())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_column() {
        assert_eq!(mark_column("PRINT 1+", &(0..0)), "PRINT 1+");
        assert_eq!(mark_column("LET A = B C", &(10..11)), "LET A = B ??? C");
        assert_eq!(mark_column("GOTO", &(4..4)), "GOTO ??? ");
        let loc = Location::new(Rc::from("MAIN.BAS"), 12).with_line(Some(100));
        assert_eq!(loc.to_string(), "MAIN.BAS:12");
        assert_eq!(loc.line(), Some(100));
    }
}
