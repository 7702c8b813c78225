/// ## Built-in functions
///
/// Names are matched including the `$` suffix. The range is the number
/// of arguments accepted inside the parentheses.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Abs,
    Asc,
    Bin,
    Cdec,
    Chr,
    Cint,
    Clng,
    Deek,
    Frac,
    Hex,
    Inkey,
    Inp,
    Instr,
    Left,
    Len,
    Lower,
    Ltrim,
    Max,
    Mid,
    Min,
    Mirror,
    Peek,
    Right,
    Rnd,
    Round,
    Rtrim,
    Sgn,
    Space,
    Sqr,
    Str,
    StringOf,
    Trim,
    Trunc,
    Upper,
    Val,
}

pub struct Function {}

impl Function {
    pub fn builtin_and_arity(
        func_name: &str,
    ) -> Option<(Builtin, std::ops::RangeInclusive<usize>)> {
        match func_name {
            "ABS" => Some((Builtin::Abs, 1..=1)),
            "ASC" => Some((Builtin::Asc, 1..=1)),
            "BIN$" => Some((Builtin::Bin, 1..=2)),
            "CDEC" => Some((Builtin::Cdec, 1..=1)),
            "CHR$" => Some((Builtin::Chr, 1..=1)),
            "CINT" => Some((Builtin::Cint, 1..=1)),
            "CLNG" => Some((Builtin::Clng, 1..=1)),
            "DEEK" => Some((Builtin::Deek, 1..=1)),
            "FRAC" => Some((Builtin::Frac, 1..=1)),
            "HEX$" => Some((Builtin::Hex, 1..=2)),
            "INKEY$" => Some((Builtin::Inkey, 0..=0)),
            "INP" => Some((Builtin::Inp, 1..=1)),
            "INSTR" => Some((Builtin::Instr, 2..=3)),
            "LEFT$" => Some((Builtin::Left, 2..=2)),
            "LEN" => Some((Builtin::Len, 1..=1)),
            "LOWER$" | "LCASE$" => Some((Builtin::Lower, 1..=1)),
            "LTRIM$" => Some((Builtin::Ltrim, 1..=1)),
            "MAX" => Some((Builtin::Max, 2..=2)),
            "MID$" => Some((Builtin::Mid, 2..=3)),
            "MIN" => Some((Builtin::Min, 2..=2)),
            "MIRROR$" => Some((Builtin::Mirror, 1..=1)),
            "PEEK" => Some((Builtin::Peek, 1..=1)),
            "RIGHT$" => Some((Builtin::Right, 2..=2)),
            "RND" => Some((Builtin::Rnd, 1..=1)),
            "ROUND" => Some((Builtin::Round, 1..=2)),
            "RTRIM$" => Some((Builtin::Rtrim, 1..=1)),
            "SGN" => Some((Builtin::Sgn, 1..=1)),
            "SPACE$" => Some((Builtin::Space, 1..=1)),
            "SQR" => Some((Builtin::Sqr, 1..=1)),
            "STR$" => Some((Builtin::Str, 1..=1)),
            "STRING$" => Some((Builtin::StringOf, 2..=2)),
            "TRIM$" => Some((Builtin::Trim, 1..=1)),
            "TRUNC" => Some((Builtin::Trunc, 1..=1)),
            "UPPER$" | "UCASE$" => Some((Builtin::Upper, 1..=1)),
            "VAL" => Some((Builtin::Val, 1..=1)),
            _ => None,
        }
    }

    /// Names a SUB or FUNCTION may not take.
    pub fn is_reserved(name: &str) -> bool {
        Function::builtin_and_arity(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let (b, arity) = Function::builtin_and_arity("MID$").unwrap();
        assert_eq!(b, Builtin::Mid);
        assert!(arity.contains(&2) && arity.contains(&3));
        assert!(Function::builtin_and_arity("MID").is_none());
        assert!(Function::is_reserved("INKEY$"));
    }

    #[test]
    fn test_aliases() {
        assert_eq!(Function::builtin_and_arity("UCASE$").map(|(b, _)| b), Some(Builtin::Upper));
        assert_eq!(Function::builtin_and_arity("LCASE$").map(|(b, _)| b), Some(Builtin::Lower));
        let (_, arity) = Function::builtin_and_arity("INSTR").unwrap();
        assert_eq!(arity, 2..=3);
    }
}
