use super::Location;
use crate::error;
use crate::lang::{Column, Error};
use std::collections::{BTreeMap, BTreeSet};

type Result<T> = std::result::Result<T, Error>;

/// A jump target: a BASIC line number or a named label.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum LineRef {
    Number(u16),
    Name(String),
}

impl LineRef {
    pub fn label(&self) -> String {
        match self {
            LineRef::Number(n) => line_label(*n),
            LineRef::Name(s) => format!("L_{}", s),
        }
    }
}

impl std::fmt::Display for LineRef {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            LineRef::Number(n) => write!(f, "{}", n),
            LineRef::Name(s) => write!(f, "{}", s),
        }
    }
}

/// ## BASIC line labels
///
/// Jump targets are emitted symbolically as `L<n>` or `L_<name>` and
/// validated once the whole source has been read.

#[derive(Debug, Default)]
pub struct Link {
    defined: BTreeSet<LineRef>,
    unlinked: Vec<(LineRef, Location, Column)>,
    data_lines: BTreeSet<u16>,
    restores: Vec<(u16, Location, Column)>,
    last_line: Option<u16>,
}

pub fn line_label(number: u16) -> String {
    format!("L{}", number)
}

pub fn data_label(number: u16) -> String {
    format!("DL{}", number)
}

impl Link {
    pub fn new() -> Link {
        Link::default()
    }

    /// Records a line number. Returns true when it does not ascend.
    pub fn define(&mut self, number: u16) -> Result<bool> {
        if !self.defined.insert(LineRef::Number(number)) {
            return Err(error!(DuplicateLine; &number.to_string()));
        }
        let out_of_order = matches!(self.last_line, Some(last) if number < last);
        self.last_line = Some(number);
        Ok(out_of_order)
    }

    pub fn define_name(&mut self, name: &str) -> Result<()> {
        if !self.defined.insert(LineRef::Name(name.to_string())) {
            return Err(error!(DuplicateDefinition; name));
        }
        Ok(())
    }

    pub fn is_defined(&self, target: &LineRef) -> bool {
        self.defined.contains(target)
    }

    pub fn reference(&mut self, target: LineRef, at: Location, col: &Column) {
        self.unlinked.push((target, at, col.clone()));
    }

    pub fn data_line(&mut self, number: u16) {
        self.data_lines.insert(number);
    }

    pub fn restore(&mut self, number: u16, at: Location, col: &Column) {
        self.restores.push((number, at, col.clone()));
    }

    /// True when some jump names the target.
    pub fn is_referenced(&self, target: &LineRef) -> bool {
        self.unlinked.iter().any(|(t, _, _)| t == target)
    }

    /// Unresolved targets, each with where it was referenced.
    pub fn link(&mut self) -> Vec<(Location, Error)> {
        let mut errors = vec![];
        for (target, at, col) in std::mem::take(&mut self.unlinked) {
            if !self.defined.contains(&target) {
                let error = error!(UndefinedLine, at.line(), ..&col; &target.to_string());
                errors.push((at, error));
            }
        }
        for (number, at, col) in std::mem::take(&mut self.restores) {
            if !self.data_lines.contains(&number) {
                let msg = format!("NO DATA IN {}", number);
                let error = error!(UndefinedLine, at.line(), ..&col; &msg);
                errors.push((at, error));
            }
        }
        errors
    }

    /// How often each target is jumped to.
    pub fn referenced_lines(&self) -> BTreeMap<LineRef, usize> {
        let mut map = BTreeMap::new();
        for (t, _, _) in &self.unlinked {
            *map.entry(t.clone()).or_insert(0) += 1;
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn here() -> Location {
        Location::new(Rc::from("T"), 1).with_line(Some(30))
    }

    #[test]
    fn test_forward_references() {
        let mut link = Link::new();
        link.reference(LineRef::Number(100), here(), &(5..8));
        link.reference(LineRef::Number(200), here(), &(5..8));
        assert_eq!(link.define(10), Ok(false));
        assert_eq!(link.define(100), Ok(false));
        assert_eq!(link.define(50), Ok(true));
        assert!(link.define(10).is_err());
        let errors = link.link();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].1.is(crate::lang::ErrorCode::UndefinedLine));
        assert_eq!(errors[0].1.line_number(), Some(30));
        assert_eq!(
            errors[0].1.to_string(),
            "UNDEFINED LINE IN 30 (5..8); 200"
        );
    }

    #[test]
    fn test_named_labels() {
        let mut link = Link::new();
        let target = LineRef::Name("LOOP1".into());
        link.reference(target.clone(), here(), &(0..0));
        assert!(link.is_referenced(&target));
        link.define_name("LOOP1").unwrap();
        assert!(link.define_name("LOOP1").is_err());
        assert_eq!(target.label(), "L_LOOP1");
        assert!(link.link().is_empty());
    }

    #[test]
    fn test_restore_needs_data() {
        let mut link = Link::new();
        link.define(10).unwrap();
        link.data_line(10);
        link.define(20).unwrap();
        link.restore(10, here(), &(0..0));
        link.restore(20, here(), &(0..0));
        assert_eq!(link.link().len(), 1);
        assert_eq!(data_label(10), "DL10");
        assert_eq!(line_label(20), "L20");
    }
}
