// Used in both Token and Ast

#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum Ident {
    Plain(String),
    String(String),
    Integer(String),
    Long(String),
    Decimal(String),
}

impl Ident {
    /// Full name including the type suffix.
    pub fn name(&self) -> &str {
        use Ident::*;
        match self {
            Plain(s) | String(s) | Integer(s) | Long(s) | Decimal(s) => s,
        }
    }

    pub fn is_plain(&self) -> bool {
        matches!(self, Ident::Plain(_))
    }

    pub fn suffix(ch: char) -> bool {
        ch == '$' || ch == '%' || ch == '&' || ch == '!'
    }

    pub fn from_name(s: String) -> Ident {
        match s.chars().last() {
            Some('$') => Ident::String(s),
            Some('%') => Ident::Integer(s),
            Some('&') => Ident::Long(s),
            Some('!') => Ident::Decimal(s),
            _ => Ident::Plain(s),
        }
    }
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
