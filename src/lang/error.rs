use super::{Column, LineNumber};

#[derive(Clone, PartialEq)]
pub struct Error {
    code: u16,
    line_number: LineNumber,
    column: Column,
    message: String,
}

#[doc(hidden)]
#[macro_export]
macro_rules! error {
    ($err:ident) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
    };
    ($err:ident, ..$col:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).in_column($col)
    };
    ($err:ident, $line:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).in_line_number($line)
    };
    ($err:ident; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).message($msg)
    };
    ($err:ident, ..$col:expr;  $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_column($col)
            .message($msg)
    };
    ($err:ident, $line:expr, ..$col:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_line_number($line)
            .in_column($col)
    };
    ($err:ident, $line:expr; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_line_number($line)
            .message($msg)
    };
    ($err:ident, $line:expr, ..$col:expr;  $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_line_number($line)
            .in_column($col)
            .message($msg)
    };
}

impl Error {
    pub fn new(code: ErrorCode) -> Error {
        Error {
            code: code as u16,
            line_number: None,
            column: 0..0,
            message: String::new(),
        }
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn is(&self, code: ErrorCode) -> bool {
        self.code == code as u16
    }

    pub fn line_number(&self) -> LineNumber {
        self.line_number
    }

    pub fn column(&self) -> Column {
        self.column.clone()
    }

    pub fn in_line_number(&self, line: LineNumber) -> Error {
        Error {
            code: self.code,
            line_number: line,
            column: self.column.clone(),
            message: self.message.clone(),
        }
    }

    pub fn in_column(&self, column: &Column) -> Error {
        Error {
            code: self.code,
            line_number: self.line_number,
            column: column.clone(),
            message: self.message.clone(),
        }
    }

    pub fn message(&self, message: &str) -> Error {
        Error {
            code: self.code,
            line_number: self.line_number,
            column: self.column.clone(),
            message: message.to_string(),
        }
    }

    /// Structural errors leave the statement void; everything else resyncs.
    pub fn is_structural(&self) -> bool {
        (30..50).contains(&self.code) || self.code == ErrorCode::NextWithoutFor as u16
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ErrorCode {
    NextWithoutFor = 1,
    SyntaxError = 2,
    Overflow = 6,
    OutOfMemory = 7,
    UndefinedLine = 8,
    SubscriptOutOfRange = 9,
    DuplicateDefinition = 10,
    DivisionByZero = 11,
    TypeMismatch = 13,
    StringTooLong = 15,
    UndefinedFunction = 18,
    ForWithoutNext = 26,
    WhileWithoutWend = 29,
    WendWithoutWhile = 30,
    LoopWithoutDo = 31,
    DoWithoutLoop = 32,
    IfWithoutEndIf = 33,
    EndIfWithoutIf = 34,
    ElseWithoutIf = 35,
    SelectWithoutEndSelect = 36,
    CaseWithoutSelect = 37,
    EndSelectWithoutSelect = 38,
    SubWithoutEndSub = 39,
    EndSubWithoutSub = 40,
    FunctionWithoutEndFunction = 41,
    EndFunctionWithoutFunction = 42,
    ExitWithoutLoop = 43,
    NestedCallable = 44,
    UndeclaredVariable = 52,
    ReservedWord = 55,
    SignatureMismatch = 56,
    DuplicateLine = 57,
    NestedInclude = 58,
    FileNotFound = 53,
    BadFileName = 64,
    Unsupported = 65,
    TooManyErrors = 70,
    InternalError = 51,
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error {{ {} }}", self.to_string())
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let code_str = match self.code {
            1 => "NEXT WITHOUT FOR",
            2 => "SYNTAX ERROR",
            6 => "OVERFLOW",
            7 => "OUT OF MEMORY",
            8 => "UNDEFINED LINE",
            9 => "SUBSCRIPT OUT OF RANGE",
            10 => "DUPLICATE DEFINITION",
            11 => "DIVISION BY ZERO",
            13 => "TYPE MISMATCH",
            15 => "STRING TOO LONG",
            18 => "UNDEFINED FUNCTION",
            26 => "FOR WITHOUT NEXT",
            29 => "WHILE WITHOUT WEND",
            30 => "WEND WITHOUT WHILE",
            31 => "LOOP WITHOUT DO",
            32 => "DO WITHOUT LOOP",
            33 => "IF WITHOUT END IF",
            34 => "END IF WITHOUT IF",
            35 => "ELSE WITHOUT IF",
            36 => "SELECT WITHOUT END SELECT",
            37 => "CASE WITHOUT SELECT",
            38 => "END SELECT WITHOUT SELECT",
            39 => "SUB WITHOUT END SUB",
            40 => "END SUB WITHOUT SUB",
            41 => "FUNCTION WITHOUT END FUNCTION",
            42 => "END FUNCTION WITHOUT FUNCTION",
            43 => "EXIT WITHOUT LOOP",
            44 => "NESTED SUB OR FUNCTION",
            51 => "INTERNAL ERROR",
            52 => "UNDECLARED VARIABLE",
            53 => "FILE NOT FOUND",
            55 => "RESERVED WORD",
            56 => "SIGNATURE MISMATCH",
            57 => "DUPLICATE LINE",
            58 => "NESTED INCLUDE",
            64 => "BAD FILE NAME",
            65 => "NOT SUPPORTED BY TARGET",
            70 => "TOO MANY ERRORS",
            _ => "",
        };
        let mut suffix = String::new();
        if let Some(line_number) = self.line_number {
            suffix.push_str(&format!(" {}", line_number));
        }
        if (0..0) != self.column {
            suffix.push_str(&format!(" ({}..{})", self.column.start, self.column.end));
        }
        if !self.message.is_empty() {
            suffix.push_str(&format!("; {}", self.message));
        }
        if code_str.is_empty() {
            if suffix.is_empty() {
                write!(f, "COMPILER ERROR {}", self.code)
            } else {
                write!(f, "COMPILER ERROR {} IN{}", self.code, suffix)
            }
        } else if suffix.is_empty() {
            write!(f, "{}", code_str)
        } else {
            write!(f, "{} IN{}", code_str, suffix)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let e = error!(SyntaxError);
        assert_eq!(e.to_string(), "SYNTAX ERROR");
        let e = error!(LoopWithoutDo, Some(20), ..&(3..7));
        assert_eq!(e.to_string(), "LOOP WITHOUT DO IN 20 (3..7)");
        let e = error!(TypeMismatch; "EXPECTED STRING");
        assert_eq!(e.to_string(), "TYPE MISMATCH IN; EXPECTED STRING");
    }

    #[test]
    fn test_structural() {
        assert!(error!(WendWithoutWhile).is_structural());
        assert!(error!(ExitWithoutLoop).is_structural());
        assert!(error!(NextWithoutFor).is_structural());
        assert!(!error!(SyntaxError).is_structural());
        assert!(!error!(UndeclaredVariable).is_structural());
    }
}
