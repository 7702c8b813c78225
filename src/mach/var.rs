use crate::error;
use crate::lang::{Error, Ident, Word};
use std::collections::BTreeMap;

type Result<T> = std::result::Result<T, Error>;

/// ## Data types
///
/// Registers holding a value of each type while an expression is being
/// evaluated: `Int2` in HL, `Int4` in DE:HL, `Dec6` in `M_ACCU` and
/// `Str` as a pointer in HL.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Int2,
    Int4,
    Dec6,
    Str,
}

impl DataType {
    pub fn size(self) -> usize {
        match self {
            DataType::Int2 | DataType::Str => 2,
            DataType::Int4 => 4,
            DataType::Dec6 => 6,
        }
    }

    pub fn is_numeric(self) -> bool {
        self != DataType::Str
    }

    fn rank(self) -> u8 {
        match self {
            DataType::Int2 => 0,
            DataType::Int4 => 1,
            DataType::Dec6 => 2,
            DataType::Str => 3,
        }
    }

    /// Common type of two numeric operands.
    pub fn widest(self, other: DataType) -> DataType {
        if self.rank() >= other.rank() {
            self
        } else {
            other
        }
    }

    /// Type implied by an identifier suffix. Plain names have none.
    pub fn for_ident(ident: &Ident) -> Option<DataType> {
        match ident {
            Ident::Plain(_) => None,
            Ident::String(_) => Some(DataType::Str),
            Ident::Integer(_) => Some(DataType::Int2),
            Ident::Long(_) => Some(DataType::Int4),
            Ident::Decimal(_) => Some(DataType::Dec6),
        }
    }

    /// Type named after `AS`.
    pub fn for_word(word: Word) -> Option<DataType> {
        match word {
            Word::Integer => Some(DataType::Int2),
            Word::Long => Some(DataType::Int4),
            Word::Decimal => Some(DataType::Dec6),
            Word::Str => Some(DataType::Str),
            _ => None,
        }
    }

    /// Reconciles a suffix with an explicit `AS` type.
    pub fn resolve(ident: &Ident, declared: Option<DataType>) -> Result<DataType> {
        match (DataType::for_ident(ident), declared) {
            (Some(a), Some(b)) if a != b => Err(error!(TypeMismatch; ident.name())),
            (Some(a), _) => Ok(a),
            (None, Some(b)) => Ok(b),
            (None, None) => Ok(DataType::Int2),
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            DataType::Int2 => "INTEGER",
            DataType::Int4 => "LONG",
            DataType::Dec6 => "DECIMAL",
            DataType::Str => "STRING",
        };
        write!(f, "{}", s)
    }
}

/// Assembler label for a global: the suffix becomes part of the prefix
/// so `A`, `A$` and `A%` never collide.
pub fn label_for(ident: &Ident) -> String {
    let name = ident.name();
    let base = name.trim_end_matches(|c| Ident::suffix(c));
    let prefix = match ident {
        Ident::Plain(_) => "V_",
        Ident::String(_) => "VS_",
        Ident::Integer(_) => "VI_",
        Ident::Long(_) => "VL_",
        Ident::Decimal(_) => "VD_",
    };
    format!("{}{}", prefix, base)
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub ty: DataType,
    pub dims: Vec<u16>,
    pub label: String,
    pub read: bool,
    pub written: bool,
    pub implicit: bool,
}

impl VarDecl {
    /// Elements including index zero of every dimension.
    pub fn element_count(&self) -> usize {
        self.dims.iter().map(|d| *d as usize + 1).product()
    }

    pub fn storage_size(&self) -> usize {
        self.element_count() * self.ty.size()
    }

    pub fn is_array(&self) -> bool {
        !self.dims.is_empty()
    }
}

/// ## Global variables
///
/// Keyed by the full name including the suffix.

#[derive(Debug, Default)]
pub struct Var {
    vars: BTreeMap<String, VarDecl>,
}

impl Var {
    pub fn new() -> Var {
        Var::default()
    }

    pub fn get(&self, name: &str) -> Option<&VarDecl> {
        self.vars.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut VarDecl> {
        self.vars.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn declare(
        &mut self,
        ident: &Ident,
        ty: DataType,
        dims: Vec<u16>,
        implicit: bool,
    ) -> Result<&VarDecl> {
        let name = ident.name().to_string();
        if self.vars.contains_key(&name) {
            return Err(error!(DuplicateDefinition; &name));
        }
        let decl = VarDecl {
            name: name.clone(),
            ty,
            dims,
            label: label_for(ident),
            read: false,
            written: false,
            implicit,
        };
        log::trace!("global {} {} -> {}", decl.name, decl.ty, decl.label);
        Ok(self.vars.entry(name).or_insert(decl))
    }

    /// Compiler generated cell such as a FOR limit. Never reported unused.
    pub fn declare_hidden(&mut self, ident: &Ident, ty: DataType, label: &str) -> Result<&VarDecl> {
        let name = ident.name().to_string();
        if self.vars.contains_key(&name) {
            return Err(error!(InternalError; &name));
        }
        let decl = VarDecl {
            name: name.clone(),
            ty,
            dims: vec![],
            label: label.to_string(),
            read: true,
            written: true,
            implicit: false,
        };
        Ok(self.vars.entry(name).or_insert(decl))
    }

    /// Declarations sorted by label, the order of the storage section.
    pub fn by_label(&self) -> Vec<&VarDecl> {
        let mut v: Vec<&VarDecl> = self.vars.values().collect();
        v.sort_by(|a, b| a.label.cmp(&b.label));
        v
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_keep_suffix_apart() {
        let mut var = Var::new();
        var.declare(&Ident::Plain("A".into()), DataType::Int2, vec![], false)
            .unwrap();
        var.declare(&Ident::String("A$".into()), DataType::Str, vec![], true)
            .unwrap();
        var.declare(&Ident::Long("A&".into()), DataType::Int4, vec![5, 3], false)
            .unwrap();
        let labels: Vec<&str> = var.by_label().iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, ["VL_A", "VS_A", "V_A"]);
        assert_eq!(var.get("A&").unwrap().storage_size(), 6 * 4 * 4);
        let e = var
            .declare(&Ident::Plain("A".into()), DataType::Int2, vec![], false)
            .unwrap_err();
        assert!(e.is(crate::lang::ErrorCode::DuplicateDefinition));
    }

    #[test]
    fn test_resolve() {
        let s = Ident::String("S$".into());
        assert_eq!(DataType::resolve(&s, None), Ok(DataType::Str));
        assert!(DataType::resolve(&s, Some(DataType::Int2)).is_err());
        let p = Ident::Plain("P".into());
        assert_eq!(DataType::resolve(&p, None), Ok(DataType::Int2));
        assert_eq!(DataType::resolve(&p, Some(DataType::Dec6)), Ok(DataType::Dec6));
        assert_eq!(DataType::Int2.widest(DataType::Dec6), DataType::Dec6);
        assert_eq!(DataType::Int4.widest(DataType::Int2), DataType::Int4);
    }
}
