pub use super::ident::Ident;
use std::collections::HashMap;

thread_local!(
    static STRING_TO_TOKEN: HashMap<&'static str, Token> = Word::ALL
        .iter()
        .map(|w| Token::Word(w.clone()))
        .chain(Operator::ALL.iter().map(|o| Token::Operator(o.clone())))
        .chain(vec![
            Token::LParen,
            Token::RParen,
            Token::Comma,
            Token::Colon,
            Token::Semicolon,
        ])
        .map(|t| (t.as_static_str(), t))
        .filter(|(s, _)| !s.is_empty())
        .collect();
);

#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Unknown(String),
    Whitespace(usize),
    Literal(Literal),
    Word(Word),
    Operator(Operator),
    Ident(Ident),
    LParen,
    RParen,
    Comma,
    Colon,
    Semicolon,
}

impl Token {
    pub fn from_string(s: &str) -> Option<Token> {
        STRING_TO_TOKEN.with(|stt| stt.get(s).cloned())
    }

    pub fn is_reserved_word(&self) -> bool {
        match self {
            Token::Word(_) => true,
            Token::Operator(op) => op.is_reserved_word(),
            _ => false,
        }
    }

    fn as_static_str(&self) -> &'static str {
        match self {
            Token::Word(w) => w.as_str(),
            Token::Operator(o) => o.as_str(),
            Token::LParen => "(",
            Token::RParen => ")",
            Token::Comma => ",",
            Token::Colon => ":",
            Token::Semicolon => ";",
            _ => "",
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Token::*;
        match self {
            Unknown(s) => write!(f, "{}", s),
            Whitespace(u) => write!(f, "{s:>w$}", s = "", w = u),
            Literal(s) => write!(f, "{}", s),
            Word(s) => write!(f, "{}", s),
            Operator(s) => write!(f, "{}", s),
            Ident(s) => write!(f, "{}", s),
            LParen => write!(f, "("),
            RParen => write!(f, ")"),
            Comma => write!(f, ","),
            Colon => write!(f, ":"),
            Semicolon => write!(f, ";"),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Literal {
    Integer(String),
    Hex(String),
    Decimal(String),
    String(String),
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Literal::*;
        match self {
            Integer(s) | Decimal(s) => write!(f, "{}", s),
            Hex(s) => write!(f, "&H{}", s),
            String(s) => write!(f, "\"{}\"", s),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Word {
    As,
    Border,
    Call,
    Case,
    Cls,
    Color,
    Cursor,
    Data,
    Decimal,
    Declare,
    Dim,
    Do,
    Doke,
    Else,
    ElseIf,
    End,
    EndFunction,
    EndIf,
    EndSelect,
    EndSub,
    Exit,
    For,
    Function,
    Gosub,
    Goto,
    If,
    Include,
    Input,
    Integer,
    Let,
    Local,
    Locate,
    Long,
    Loop,
    Next,
    On,
    Out,
    Pause,
    Poke,
    Print1,
    Print2,
    Read,
    Rem1,
    Rem2,
    Restore,
    Return,
    Select,
    Step,
    Stop,
    Str,
    Sub,
    Tab,
    Then,
    To,
    Until,
    Wend,
    While,
}

impl Word {
    const ALL: [Word; 57] = [
        Word::As,
        Word::Border,
        Word::Call,
        Word::Case,
        Word::Cls,
        Word::Color,
        Word::Cursor,
        Word::Data,
        Word::Decimal,
        Word::Declare,
        Word::Dim,
        Word::Do,
        Word::Doke,
        Word::Else,
        Word::ElseIf,
        Word::End,
        Word::EndFunction,
        Word::EndIf,
        Word::EndSelect,
        Word::EndSub,
        Word::Exit,
        Word::For,
        Word::Function,
        Word::Gosub,
        Word::Goto,
        Word::If,
        Word::Include,
        Word::Input,
        Word::Integer,
        Word::Let,
        Word::Local,
        Word::Locate,
        Word::Long,
        Word::Loop,
        Word::Next,
        Word::On,
        Word::Out,
        Word::Pause,
        Word::Poke,
        Word::Print1,
        Word::Print2,
        Word::Read,
        Word::Rem1,
        Word::Rem2,
        Word::Restore,
        Word::Return,
        Word::Select,
        Word::Step,
        Word::Stop,
        Word::Str,
        Word::Sub,
        Word::Tab,
        Word::Then,
        Word::To,
        Word::Until,
        Word::Wend,
        Word::While,
    ];

    pub fn as_str(&self) -> &'static str {
        use Word::*;
        match self {
            As => "AS",
            Border => "BORDER",
            Call => "CALL",
            Case => "CASE",
            Cls => "CLS",
            Color => "COLOR",
            Cursor => "CURSOR",
            Data => "DATA",
            Decimal => "DECIMAL",
            Declare => "DECLARE",
            Dim => "DIM",
            Do => "DO",
            Doke => "DOKE",
            Else => "ELSE",
            ElseIf => "ELSEIF",
            End => "END",
            EndFunction => "END FUNCTION",
            EndIf => "ENDIF",
            EndSelect => "END SELECT",
            EndSub => "END SUB",
            Exit => "EXIT",
            For => "FOR",
            Function => "FUNCTION",
            Gosub => "GOSUB",
            Goto => "GOTO",
            If => "IF",
            Include => "INCLUDE",
            Input => "INPUT",
            Integer => "INTEGER",
            Let => "LET",
            Local => "LOCAL",
            Locate => "LOCATE",
            Long => "LONG",
            Loop => "LOOP",
            Next => "NEXT",
            On => "ON",
            Out => "OUT",
            Pause => "PAUSE",
            Poke => "POKE",
            Print1 => "PRINT",
            Print2 => "?",
            Read => "READ",
            Rem1 => "REM",
            Rem2 => "'",
            Restore => "RESTORE",
            Return => "RETURN",
            Select => "SELECT",
            Step => "STEP",
            Stop => "STOP",
            Str => "STRING",
            Sub => "SUB",
            Tab => "TAB",
            Then => "THEN",
            To => "TO",
            Until => "UNTIL",
            Wend => "WEND",
            While => "WHILE",
        }
    }
}

impl std::fmt::Display for Word {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Operator {
    Multiply,
    Divide,
    Modulus,
    Plus,
    Minus,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Not,
    And,
    Or,
    Xor,
    Shl,
    Shr,
}

impl Operator {
    const ALL: [Operator; 17] = [
        Operator::Multiply,
        Operator::Divide,
        Operator::Modulus,
        Operator::Plus,
        Operator::Minus,
        Operator::Equal,
        Operator::NotEqual,
        Operator::Less,
        Operator::LessEqual,
        Operator::Greater,
        Operator::GreaterEqual,
        Operator::Not,
        Operator::And,
        Operator::Or,
        Operator::Xor,
        Operator::Shl,
        Operator::Shr,
    ];

    pub fn is_reserved_word(&self) -> bool {
        use Operator::*;
        matches!(self, Modulus | Not | And | Or | Xor | Shl | Shr)
    }

    pub fn as_str(&self) -> &'static str {
        use Operator::*;
        match self {
            Multiply => "*",
            Divide => "/",
            Modulus => "MOD",
            Plus => "+",
            Minus => "-",
            Equal => "=",
            NotEqual => "<>",
            Less => "<",
            LessEqual => "<=",
            Greater => ">",
            GreaterEqual => ">=",
            Not => "NOT",
            And => "AND",
            Or => "OR",
            Xor => "XOR",
            Shl => "SHL",
            Shr => "SHR",
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(Token::from_string("PRINT"), Some(Token::Word(Word::Print1)));
        assert_eq!(Token::from_string("?"), Some(Token::Word(Word::Print2)));
        assert_eq!(
            Token::from_string("MOD"),
            Some(Token::Operator(Operator::Modulus))
        );
        assert_eq!(Token::from_string(":"), Some(Token::Colon));
        assert_eq!(Token::from_string("PRINTER"), None);
    }
}
