use super::callable::{Kind, Param, Slot};
use super::compile::Compiler;
use super::dec6::Dec6;
use super::function::{Builtin, Function};
use super::library::LibItem;
use super::runtime::MAX_STR_LEN;
use super::var::{DataType, VarDecl};
use crate::error;
use crate::lang::{ast::Expression, Column, Error, Ident};
use std::cmp::Ordering;
use std::convert::TryFrom;

type Result<T> = std::result::Result<T, Error>;

/// A value known while compiling.
#[derive(Debug, Clone, PartialEq)]
pub enum Const {
    Int2(i16),
    Int4(i32),
    Dec(Dec6),
    Str(String),
}

impl Const {
    pub fn data_type(&self) -> DataType {
        match self {
            Const::Int2(_) => DataType::Int2,
            Const::Int4(_) => DataType::Int4,
            Const::Dec(_) => DataType::Dec6,
            Const::Str(_) => DataType::Str,
        }
    }

    /// Integer of the given type, failing when it does not fit.
    fn int(ty: DataType, v: i64) -> Result<Const> {
        match ty {
            DataType::Int2 => match i16::try_from(v) {
                Ok(n) => Ok(Const::Int2(n)),
                Err(_) => Err(error!(Overflow)),
            },
            DataType::Int4 => match i32::try_from(v) {
                Ok(n) => Ok(Const::Int4(n)),
                Err(_) => Err(error!(Overflow)),
            },
            DataType::Dec6 => Ok(Const::Dec(Dec6::from_i64(v)?)),
            DataType::Str => Err(error!(TypeMismatch)),
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Const::Int2(n) => Some(*n as i64),
            Const::Int4(n) => Some(*n as i64),
            Const::Dec(d) => Some(d.trunc_to_i64()),
            Const::Str(_) => None,
        }
    }

    /// Non-zero numbers are true.
    pub fn is_true(&self) -> bool {
        match self {
            Const::Int2(n) => *n != 0,
            Const::Int4(n) => *n != 0,
            Const::Dec(d) => !d.is_zero(),
            Const::Str(s) => !s.is_empty(),
        }
    }

    /// The value an assignment to `ty` stores. Decimals truncate.
    pub fn convert(&self, ty: DataType) -> Result<Const> {
        match (self, ty) {
            (Const::Str(_), DataType::Str) => Ok(self.clone()),
            (Const::Str(_), _) | (_, DataType::Str) => Err(error!(TypeMismatch)),
            (Const::Dec(d), DataType::Dec6) => Ok(Const::Dec(*d)),
            (c, DataType::Dec6) => match c.as_i64() {
                Some(v) => Ok(Const::Dec(Dec6::from_i64(v)?)),
                None => Err(error!(TypeMismatch)),
            },
            (c, _) => match c.as_i64() {
                Some(v) => Const::int(ty, v),
                None => Err(error!(TypeMismatch)),
            },
        }
    }

    /// Source form of the value, used for compiler generated tests.
    pub fn to_expression(&self, col: Column) -> Expression {
        match self {
            Const::Int2(n) => Expression::Integer(col, *n as i32),
            Const::Int4(n) => Expression::Integer(col, *n),
            Const::Dec(d) if d.is_negative() => Expression::Negation(
                col.clone(),
                Box::new(Expression::Decimal(col, d.abs().to_string())),
            ),
            Const::Dec(d) => Expression::Decimal(col, d.to_string()),
            Const::Str(s) => Expression::String(col, s.clone()),
        }
    }
}

/// Who is responsible for the text a string result points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    /// Literals, variables and `D_EMPT`: somebody else keeps it alive.
    Borrowed,
    /// One of the runtime scratch buffers, overwritten by the next call.
    Temp,
    /// A fresh heap block nobody else references.
    Owned,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprInfo {
    pub ty: DataType,
    pub constant: Option<Const>,
    pub value: Value,
}

impl ExprInfo {
    fn of(ty: DataType, value: Value) -> ExprInfo {
        ExprInfo {
            ty,
            constant: None,
            value,
        }
    }
}

/// Where a variable lives once resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Place {
    /// Label expression of a global or of a constant array element.
    Global(String),
    /// Frame offset relative to IY.
    Local(i32),
    /// Address computed at run time, left in HL.
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

/// What a name denotes at the current point of compilation.
#[derive(Debug, Clone)]
pub(super) enum Symbol {
    Local(Slot),
    Global(VarDecl),
    Callable(Kind),
    Undeclared,
}

pub fn iy(offset: i32) -> String {
    if offset < 0 {
        format!("(IY-{})", -offset)
    } else {
        format!("(IY+{})", offset)
    }
}

fn suffixed(base: &str, offset: i64) -> String {
    if offset == 0 {
        base.to_string()
    } else {
        format!("{}+{}", base, offset)
    }
}

fn expect_numeric(ty: DataType, col: &Column) -> Result<DataType> {
    if ty.is_numeric() {
        Ok(ty)
    } else {
        Err(error!(TypeMismatch, ..col; "EXPECTED NUMBER"))
    }
}

fn expect_str(ty: DataType, col: &Column) -> Result<DataType> {
    if ty == DataType::Str {
        Ok(ty)
    } else {
        Err(error!(TypeMismatch, ..col; "EXPECTED STRING"))
    }
}

/// Operand type of a binary operator.
fn operand_type(expr: &Expression, lt: DataType, rt: DataType) -> Result<DataType> {
    use Expression::*;
    let col = expr.column();
    match (lt, rt) {
        (DataType::Str, DataType::Str) => {
            if matches!(expr, Add(..)) || expr.is_comparison() {
                Ok(DataType::Str)
            } else {
                Err(error!(TypeMismatch, ..&col))
            }
        }
        (DataType::Str, _) | (_, DataType::Str) => Err(error!(TypeMismatch, ..&col)),
        _ => {
            let ty = lt.widest(rt);
            let integral = matches!(
                expr,
                Modulus(..) | And(..) | Or(..) | Xor(..) | ShiftLeft(..) | ShiftRight(..)
            );
            if ty == DataType::Dec6 && integral {
                return Err(error!(TypeMismatch, ..&col; "NOT FOR DECIMAL"));
            }
            if matches!(expr, ShiftLeft(..) | ShiftRight(..)) {
                return Ok(DataType::Int2);
            }
            Ok(ty)
        }
    }
}

/// Runtime entry and the item defining it.
fn routine(expr: &Expression, ty: DataType) -> Result<(&'static str, LibItem)> {
    use Expression::*;
    use LibItem::*;
    let r = match (ty, expr) {
        (DataType::Int2, Add(..)) => ("O_ADD", O_ADD),
        (DataType::Int2, Subtract(..)) => ("O_SUB", O_ADD),
        (DataType::Int2, Multiply(..)) => ("O_MUL", O_MUL),
        (DataType::Int2, Divide(..)) => ("O_DIV", O_DIV),
        (DataType::Int2, Modulus(..)) => ("O_MOD", O_DIV),
        (DataType::Int2, Equal(..)) => ("O_EQ", O_EQ),
        (DataType::Int2, NotEqual(..)) => ("O_NE", O_NE),
        (DataType::Int2, Less(..)) => ("O_LT", O_LT),
        (DataType::Int2, LessEqual(..)) => ("O_LE", O_LE),
        (DataType::Int2, Greater(..)) => ("O_GT", O_GT),
        (DataType::Int2, GreaterEqual(..)) => ("O_GE", O_GE),
        (DataType::Int2, And(..)) => ("O_AND", O_AND),
        (DataType::Int2, Or(..)) => ("O_OR", O_OR),
        (DataType::Int2, Xor(..)) => ("O_XOR", O_XOR),
        (DataType::Int2, ShiftLeft(..)) => ("O_SHL", O_SHL),
        (DataType::Int2, ShiftRight(..)) => ("O_SHR", O_SHR),
        (DataType::Int4, Add(..)) => ("I4_ADD", I4_ADD),
        (DataType::Int4, Subtract(..)) => ("I4_SUB", I4_SUB),
        (DataType::Int4, Multiply(..)) => ("I4_MUL", I4_MUL),
        (DataType::Int4, Divide(..)) => ("I4_DIV", I4_DIV),
        (DataType::Int4, Modulus(..)) => ("I4_MOD", I4_DIV),
        (DataType::Int4, Equal(..)) => ("I4_EQ", I4_EQ),
        (DataType::Int4, NotEqual(..)) => ("I4_NE", I4_NE),
        (DataType::Int4, Less(..)) => ("I4_LT", I4_LT),
        (DataType::Int4, LessEqual(..)) => ("I4_LE", I4_LE),
        (DataType::Int4, Greater(..)) => ("I4_GT", I4_GT),
        (DataType::Int4, GreaterEqual(..)) => ("I4_GE", I4_GE),
        (DataType::Int4, And(..)) => ("I4_AND", I4_AND),
        (DataType::Int4, Or(..)) => ("I4_OR", I4_OR),
        (DataType::Int4, Xor(..)) => ("I4_XOR", I4_XOR),
        (DataType::Dec6, Add(..)) => ("D6_ADD", D6_ADD),
        (DataType::Dec6, Subtract(..)) => ("D6_SUB", D6_ADD),
        (DataType::Dec6, Multiply(..)) => ("D6_MUL", D6_MUL),
        (DataType::Dec6, Divide(..)) => ("D6_DIV", D6_DIV),
        (DataType::Dec6, Equal(..)) => ("D6_EQ", D6_EQ),
        (DataType::Dec6, NotEqual(..)) => ("D6_NE", D6_NE),
        (DataType::Dec6, Less(..)) => ("D6_LT", D6_LT),
        (DataType::Dec6, LessEqual(..)) => ("D6_LE", D6_LE),
        (DataType::Dec6, Greater(..)) => ("D6_GT", D6_GT),
        (DataType::Dec6, GreaterEqual(..)) => ("D6_GE", D6_GE),
        (DataType::Str, Add(..)) => ("S_CAT", S_CAT),
        (DataType::Str, Equal(..)) => ("O_STEQ", O_STEQ),
        (DataType::Str, NotEqual(..)) => ("O_STNE", O_STNE),
        (DataType::Str, Less(..)) => ("O_STLT", O_STLT),
        (DataType::Str, LessEqual(..)) => ("O_STLE", O_STLE),
        (DataType::Str, Greater(..)) => ("O_STGT", O_STGT),
        (DataType::Str, GreaterEqual(..)) => ("O_STGE", O_STGE),
        _ => return Err(error!(TypeMismatch, ..&expr.column())),
    };
    Ok(r)
}

/// White space for the TRIM functions: control characters and the blank.
fn blank(c: char) -> bool {
    c <= ' '
}

/// The last `width` digits of `full`, zero padded. Width zero drops
/// leading zeros but keeps the last digit.
fn digits(full: &str, width: usize) -> String {
    if width == 0 {
        let trimmed = full.trim_start_matches('0');
        return if trimmed.is_empty() { "0".to_string() } else { trimmed.to_string() };
    }
    if width <= full.len() {
        full[full.len() - width..].to_string()
    } else {
        "0".repeat(width - full.len()) + full
    }
}

/// One based position of `pattern` in `text` at or after `start`, 0 when absent.
fn find_from(text: &[u8], pattern: &[u8], start: usize) -> usize {
    if start - 1 > text.len() {
        return 0;
    }
    let hay = &text[start - 1..];
    let found = if pattern.is_empty() {
        Some(0)
    } else {
        hay.windows(pattern.len()).position(|w| w == pattern)
    };
    found.map(|i| i + start).unwrap_or(0)
}

/// Logical shift of a 16 bit pattern. None for a negative count.
fn shift(left: bool, value: i64, count: i64) -> Option<i64> {
    if count < 0 {
        return None;
    }
    let bits = value as u16;
    let shifted = match count {
        0..=15 if left => bits << count,
        0..=15 => bits >> count,
        _ => 0,
    };
    Some(shifted as i16 as i64)
}

/// Rounds half to even, the way `CINT` and `CLNG` do.
fn round_half_even(d: &Dec6) -> Result<i64> {
    let t = d.trunc_to_i64();
    let frac = d.sub(&Dec6::from_i64(t)?)?.abs();
    let (half, _) = Dec6::from_literal("0.5")?;
    let away = if d.is_negative() { t - 1 } else { t + 1 };
    Ok(match frac.cmp(&half) {
        Ordering::Less => t,
        Ordering::Greater => away,
        Ordering::Equal if t % 2 == 0 => t,
        Ordering::Equal => away,
    })
}

impl<'a> Compiler<'a> {
    pub(super) fn symbol(&self, name: &str) -> Symbol {
        if let Some(c) = self.current_callable() {
            if c.name != name {
                if let Some(slot) = c.slot(name) {
                    return Symbol::Local(slot);
                }
            }
        }
        if let Some(c) = self.callables.get(name) {
            return Symbol::Callable(c.kind);
        }
        match self.vars.get(name) {
            Some(decl) => Symbol::Global(decl.clone()),
            None => Symbol::Undeclared,
        }
    }

    /// Static type of an expression. Nothing is emitted or declared.
    pub(super) fn type_of(&self, expr: &Expression) -> Result<DataType> {
        use Expression::*;
        match expr {
            Integer(_, n) => Ok(if i16::try_from(*n).is_ok() {
                DataType::Int2
            } else {
                DataType::Int4
            }),
            Decimal(..) => Ok(DataType::Dec6),
            String(..) => Ok(DataType::Str),
            Var(col, ident) => match self.symbol(ident.name()) {
                Symbol::Local(slot) => Ok(slot.ty),
                Symbol::Global(decl) if decl.is_array() => {
                    Err(error!(TypeMismatch, ..col; "ARRAY NEEDS SUBSCRIPT"))
                }
                Symbol::Global(decl) => Ok(decl.ty),
                Symbol::Callable(Kind::Function(ty)) => Ok(ty),
                Symbol::Callable(Kind::Sub) => {
                    Err(error!(TypeMismatch, ..col; "SUB HAS NO VALUE"))
                }
                Symbol::Undeclared => DataType::resolve(ident, None),
            },
            Index(col, ident, args) => {
                if let Some((builtin, arity)) = Function::builtin_and_arity(ident.name()) {
                    if !arity.contains(&args.len()) {
                        return Err(error!(SyntaxError, ..col; "WRONG NUMBER OF ARGUMENTS"));
                    }
                    return self.builtin_type(builtin, args, col);
                }
                match self.symbol(ident.name()) {
                    Symbol::Global(decl) if decl.is_array() => Ok(decl.ty),
                    Symbol::Callable(Kind::Function(ty)) => Ok(ty),
                    Symbol::Callable(Kind::Sub) => {
                        Err(error!(TypeMismatch, ..col; "SUB HAS NO VALUE"))
                    }
                    Symbol::Local(_) | Symbol::Global(_) => {
                        Err(error!(TypeMismatch, ..col; "NOT AN ARRAY"))
                    }
                    Symbol::Undeclared => Err(error!(UndefinedFunction, ..col; ident.name())),
                }
            }
            Negation(col, e) => expect_numeric(self.type_of(e)?, col),
            Not(col, e) => match self.type_of(e)? {
                DataType::Int2 => Ok(DataType::Int2),
                DataType::Int4 => Ok(DataType::Int4),
                _ => Err(error!(TypeMismatch, ..col)),
            },
            _ => match expr.operands() {
                Some((l, r)) => {
                    let ty = operand_type(expr, self.type_of(l)?, self.type_of(r)?)?;
                    if expr.is_comparison() {
                        Ok(DataType::Int2)
                    } else {
                        Ok(ty)
                    }
                }
                None => Err(error!(InternalError, ..&expr.column())),
            },
        }
    }

    fn builtin_type(&self, b: Builtin, args: &[Expression], col: &Column) -> Result<DataType> {
        let arg = |i: usize| -> Result<DataType> { self.type_of(&args[i]) };
        let num = |i: usize| -> Result<DataType> { expect_numeric(arg(i)?, &args[i].column()) };
        let text = |i: usize| -> Result<DataType> { expect_str(arg(i)?, &args[i].column()) };
        match b {
            Builtin::Abs => num(0),
            Builtin::Sgn | Builtin::Peek | Builtin::Inp | Builtin::Cint => {
                num(0)?;
                Ok(DataType::Int2)
            }
            Builtin::Len | Builtin::Asc => {
                text(0)?;
                Ok(DataType::Int2)
            }
            Builtin::Val => {
                text(0)?;
                Ok(DataType::Dec6)
            }
            Builtin::Clng => {
                num(0)?;
                Ok(DataType::Int4)
            }
            Builtin::Cdec | Builtin::Trunc | Builtin::Frac => {
                num(0)?;
                Ok(DataType::Dec6)
            }
            Builtin::Round => {
                num(0)?;
                if args.len() > 1 {
                    num(1)?;
                }
                Ok(DataType::Dec6)
            }
            Builtin::Max | Builtin::Min => Ok(num(0)?.widest(num(1)?)),
            Builtin::Chr | Builtin::Space => {
                num(0)?;
                Ok(DataType::Str)
            }
            Builtin::Str => {
                num(0)?;
                Ok(DataType::Str)
            }
            Builtin::Left | Builtin::Right => {
                text(0)?;
                num(1)?;
                Ok(DataType::Str)
            }
            Builtin::Mid => {
                text(0)?;
                for i in 1..args.len() {
                    num(i)?;
                }
                Ok(DataType::Str)
            }
            Builtin::Inkey => {
                if !args.is_empty() {
                    return Err(error!(SyntaxError, ..col; "WRONG NUMBER OF ARGUMENTS"));
                }
                Ok(DataType::Str)
            }
            Builtin::Deek | Builtin::Rnd | Builtin::Sqr => {
                num(0)?;
                Ok(DataType::Int2)
            }
            Builtin::Hex | Builtin::Bin => {
                for i in 0..args.len() {
                    num(i)?;
                }
                Ok(DataType::Str)
            }
            Builtin::Instr => {
                let first = args.len() - 2;
                if first == 1 {
                    num(0)?;
                }
                text(first)?;
                text(first + 1)?;
                Ok(DataType::Int2)
            }
            Builtin::Upper
            | Builtin::Lower
            | Builtin::Ltrim
            | Builtin::Rtrim
            | Builtin::Trim
            | Builtin::Mirror => {
                text(0)?;
                Ok(DataType::Str)
            }
            Builtin::StringOf => {
                num(0)?;
                arg(1)?;
                Ok(DataType::Str)
            }
        }
    }

    /// Folds an expression whose value is known. Overflow and division
    /// by zero in constant operands are compile errors.
    pub(super) fn const_value(&mut self, expr: &Expression) -> Result<Option<Const>> {
        use Expression::*;
        match expr {
            Integer(col, n) => match i16::try_from(*n) {
                Ok(v) => Ok(Some(Const::Int2(v))),
                Err(_) => {
                    self.warn_literal(col, &format!("{} WIDENED TO LONG", n));
                    Ok(Some(Const::Int4(*n)))
                }
            },
            Decimal(col, text) => {
                let (d, dropped) = Dec6::from_literal(text).map_err(|e| e.in_column(col))?;
                if dropped {
                    self.warn_literal(col, &format!("{} TRUNCATED TO {}", text, d));
                }
                Ok(Some(Const::Dec(d)))
            }
            String(col, s) => {
                if s.len() as i64 > MAX_STR_LEN {
                    return Err(error!(StringTooLong, ..col));
                }
                Ok(Some(Const::Str(s.clone())))
            }
            Var(..) => Ok(None),
            Index(col, ident, args) => match Function::builtin_and_arity(ident.name()) {
                Some((b, arity)) if arity.contains(&args.len()) => {
                    self.fold_builtin(b, args, col)
                }
                _ => Ok(None),
            },
            Negation(col, e) => match self.const_value(e)? {
                Some(Const::Int2(n)) => match n.checked_neg() {
                    Some(v) => Ok(Some(Const::Int2(v))),
                    None => Err(error!(Overflow, ..col)),
                },
                Some(Const::Int4(n)) => match n.checked_neg() {
                    Some(v) => Ok(Some(Const::Int4(v))),
                    None => Err(error!(Overflow, ..col)),
                },
                Some(Const::Dec(d)) => Ok(Some(Const::Dec(d.neg()))),
                Some(Const::Str(_)) => Err(error!(TypeMismatch, ..col)),
                None => Ok(None),
            },
            Not(col, e) => match self.const_value(e)? {
                Some(Const::Int2(n)) => Ok(Some(Const::Int2(!n))),
                Some(Const::Int4(n)) => Ok(Some(Const::Int4(!n))),
                Some(_) => Err(error!(TypeMismatch, ..col)),
                None => Ok(None),
            },
            _ => {
                let (l, r) = match expr.operands() {
                    Some(lr) => lr,
                    None => return Ok(None),
                };
                let lc = self.const_value(l)?;
                let rc = self.const_value(r)?;
                match (lc, rc) {
                    (Some(a), Some(b)) => {
                        let ty = operand_type(expr, a.data_type(), b.data_type())?;
                        self.fold_binary(expr, ty, a, b)
                    }
                    _ => Ok(None),
                }
            }
        }
    }

    fn fold_binary(
        &self,
        expr: &Expression,
        ty: DataType,
        l: Const,
        r: Const,
    ) -> Result<Option<Const>> {
        use Expression::*;
        let col = expr.column();
        let l = l.convert(ty).map_err(|e| e.in_column(&col))?;
        let r = r.convert(ty).map_err(|e| e.in_column(&col))?;
        if expr.is_comparison() {
            let ord = match (&l, &r) {
                (Const::Int2(a), Const::Int2(b)) => a.cmp(b),
                (Const::Int4(a), Const::Int4(b)) => a.cmp(b),
                (Const::Dec(a), Const::Dec(b)) => a.cmp(b),
                (Const::Str(a), Const::Str(b)) => a.as_bytes().cmp(b.as_bytes()),
                _ => return Err(error!(InternalError, ..&col)),
            };
            let t = match expr {
                Equal(..) => ord == Ordering::Equal,
                NotEqual(..) => ord != Ordering::Equal,
                Less(..) => ord == Ordering::Less,
                LessEqual(..) => ord != Ordering::Greater,
                Greater(..) => ord == Ordering::Greater,
                _ => ord != Ordering::Less,
            };
            return Ok(Some(Const::Int2(if t { -1 } else { 0 })));
        }
        match (l, r) {
            (Const::Str(a), Const::Str(b)) => {
                let s = a + &b;
                if s.len() as i64 > MAX_STR_LEN {
                    return Err(error!(StringTooLong, ..&col));
                }
                Ok(Some(Const::Str(s)))
            }
            (Const::Dec(a), Const::Dec(b)) => {
                let v = match expr {
                    Add(..) => a.add(&b),
                    Subtract(..) => a.sub(&b),
                    Multiply(..) => a.mul(&b),
                    Divide(..) if b.is_zero() => return Err(error!(DivisionByZero, ..&col)),
                    Divide(..) => return Ok(None),
                    _ => return Err(error!(TypeMismatch, ..&col)),
                };
                Ok(Some(Const::Dec(v.map_err(|e| e.in_column(&col))?)))
            }
            (a, b) => {
                let (a, b) = match (a.as_i64(), b.as_i64()) {
                    (Some(a), Some(b)) => (a, b),
                    _ => return Err(error!(TypeMismatch, ..&col)),
                };
                let v = match expr {
                    Add(..) => a + b,
                    Subtract(..) => a - b,
                    Multiply(..) => a * b,
                    Divide(..) | Modulus(..) if b == 0 => {
                        return Err(error!(DivisionByZero, ..&col))
                    }
                    Divide(..) => a / b,
                    Modulus(..) => a % b,
                    And(..) => a & b,
                    Or(..) => a | b,
                    Xor(..) => a ^ b,
                    ShiftLeft(..) | ShiftRight(..) => {
                        match shift(matches!(expr, ShiftLeft(..)), a, b) {
                            Some(v) => v,
                            None => return Err(error!(Overflow, ..&col; "SHIFT COUNT")),
                        }
                    }
                    _ => return Err(error!(InternalError, ..&col)),
                };
                Ok(Some(Const::int(ty, v).map_err(|e| e.in_column(&col))?))
            }
        }
    }

    fn fold_builtin(
        &mut self,
        b: Builtin,
        args: &[Expression],
        col: &Column,
    ) -> Result<Option<Const>> {
        let mut values = vec![];
        for arg in args {
            match self.const_value(arg)? {
                Some(c) => values.push(c),
                None => return Ok(None),
            }
        }
        let bad = || error!(TypeMismatch, ..col);
        let folded = match (b, values.as_slice()) {
            (Builtin::Abs, [Const::Int2(n)]) => match n.checked_abs() {
                Some(v) => Const::Int2(v),
                None => return Err(error!(Overflow, ..col)),
            },
            (Builtin::Abs, [Const::Int4(n)]) => match n.checked_abs() {
                Some(v) => Const::Int4(v),
                None => return Err(error!(Overflow, ..col)),
            },
            (Builtin::Abs, [Const::Dec(d)]) => Const::Dec(d.abs()),
            (Builtin::Sgn, [c]) => match c {
                Const::Int2(n) => Const::Int2(n.signum()),
                Const::Int4(n) => Const::Int2(n.signum() as i16),
                Const::Dec(d) if d.is_zero() => Const::Int2(0),
                Const::Dec(d) if d.is_negative() => Const::Int2(-1),
                Const::Dec(_) => Const::Int2(1),
                Const::Str(_) => return Err(bad()),
            },
            (Builtin::Len, [Const::Str(s)]) => Const::Int2(s.len() as i16),
            (Builtin::Asc, [Const::Str(s)]) => {
                Const::Int2(s.bytes().next().map(|c| c as i16).unwrap_or(0))
            }
            (Builtin::Chr, [c]) => match c.as_i64() {
                Some(n) if (1..=255).contains(&n) => Const::Str((n as u8 as char).to_string()),
                _ => return Ok(None),
            },
            (Builtin::Cint, [c]) | (Builtin::Clng, [c]) => {
                let ty = if b == Builtin::Cint {
                    DataType::Int2
                } else {
                    DataType::Int4
                };
                let v = match c {
                    Const::Dec(d) => round_half_even(d)?,
                    Const::Str(_) => return Err(bad()),
                    c => c.as_i64().unwrap_or(0),
                };
                Const::int(ty, v).map_err(|e| e.in_column(col))?
            }
            (Builtin::Cdec, [c]) => c.convert(DataType::Dec6).map_err(|e| e.in_column(col))?,
            (Builtin::Max, [x, y]) | (Builtin::Min, [x, y]) => {
                let ty = expect_numeric(x.data_type(), col)?
                    .widest(expect_numeric(y.data_type(), col)?);
                let (x, y) = (x.convert(ty)?, y.convert(ty)?);
                let ord = match (&x, &y) {
                    (Const::Int2(a), Const::Int2(b)) => a.cmp(b),
                    (Const::Int4(a), Const::Int4(b)) => a.cmp(b),
                    (Const::Dec(a), Const::Dec(b)) => a.cmp(b),
                    _ => return Err(bad()),
                };
                let take_x = (ord != Ordering::Less) == (b == Builtin::Max);
                if take_x {
                    x
                } else {
                    y
                }
            }
            (Builtin::Upper, [Const::Str(s)]) => Const::Str(s.to_ascii_uppercase()),
            (Builtin::Lower, [Const::Str(s)]) => Const::Str(s.to_ascii_lowercase()),
            (Builtin::Ltrim, [Const::Str(s)]) => Const::Str(s.trim_start_matches(blank).to_string()),
            (Builtin::Rtrim, [Const::Str(s)]) => Const::Str(s.trim_end_matches(blank).to_string()),
            (Builtin::Trim, [Const::Str(s)]) => Const::Str(s.trim_matches(blank).to_string()),
            (Builtin::Mirror, [Const::Str(s)]) => Const::Str(s.chars().rev().collect()),
            (Builtin::Sqr, [Const::Int2(n)]) => {
                if *n < 0 {
                    return Err(error!(Overflow, ..col; "SQUARE ROOT OF NEGATIVE"));
                }
                Const::Int2((*n as f64).sqrt() as i16)
            }
            (Builtin::Hex, [n, rest @ ..]) | (Builtin::Bin, [n, rest @ ..]) => {
                let value = match n.convert(DataType::Int2) {
                    Ok(Const::Int2(v)) => v as u16,
                    _ => return Ok(None),
                };
                let width = match rest.first().map(|w| w.as_i64()) {
                    None => 0,
                    Some(Some(w)) if w < 0 => return Err(error!(Overflow, ..col; "DIGITS")),
                    Some(Some(w)) => w.min(MAX_STR_LEN) as usize,
                    Some(None) => return Ok(None),
                };
                let full = if b == Builtin::Hex {
                    format!("{:04X}", value)
                } else {
                    format!("{:016b}", value)
                };
                Const::Str(digits(&full, width))
            }
            (Builtin::StringOf, [n, fill]) => {
                let count = match n.as_i64() {
                    Some(c) if c < 0 => return Err(error!(Overflow, ..col; "COUNT")),
                    Some(c) => c.min(MAX_STR_LEN) as usize,
                    None => return Ok(None),
                };
                let unit = match fill {
                    Const::Str(s) => s.clone(),
                    c => match c.as_i64() {
                        Some(code) if (1..=127).contains(&code) => (code as u8 as char).to_string(),
                        _ => return Ok(None),
                    },
                };
                let len = (unit.chars().count() * count).min(MAX_STR_LEN as usize);
                Const::Str(unit.chars().cycle().take(len).collect())
            }
            (Builtin::Instr, [rest @ .., Const::Str(text), Const::Str(pattern)]) => {
                let start = match rest.first() {
                    None => 1,
                    Some(c) => match c.as_i64() {
                        Some(s) if s > 0 => s as usize,
                        Some(_) => return Err(error!(Overflow, ..col; "START POSITION")),
                        None => return Ok(None),
                    },
                };
                Const::Int2(find_from(text.as_bytes(), pattern.as_bytes(), start) as i16)
            }
            _ => return Ok(None),
        };
        Ok(Some(folded))
    }

    /// Loads a known value into the result registers.
    pub(super) fn load_const(&mut self, c: &Const) {
        match c {
            Const::Int2(n) => self.emit_hex4("LD", "HL,", *n as i64),
            Const::Int4(n) => {
                self.emit_hex4("LD", "HL,", (*n & 0xFFFF) as i64);
                self.emit_hex4("LD", "DE,", ((*n >> 16) & 0xFFFF) as i64);
            }
            Const::Dec(d) => {
                self.call(LibItem::D6_LDACN);
                let bytes: Vec<String> = d
                    .to_bytes()
                    .iter()
                    .map(|b| super::buffer::hex2(*b as i64))
                    .collect();
                self.emit("DB", &bytes.join(","));
            }
            Const::Str(s) if s.is_empty() => {
                self.emit("LD", "HL,D_EMPT");
                self.use_item(LibItem::D_EMPT);
            }
            Const::Str(s) => {
                let label = self.literal_label(s);
                self.emit("LD", &format!("HL,{}", label));
            }
        }
    }

    /// Emits code leaving the value of `expr` in the registers of its type.
    pub(super) fn compile_expr(&mut self, expr: &Expression) -> Result<ExprInfo> {
        use Expression::*;
        if let Some(c) = self.const_value(expr)? {
            self.load_const(&c);
            return Ok(ExprInfo {
                ty: c.data_type(),
                constant: Some(c),
                value: Value::Borrowed,
            });
        }
        match expr {
            Var(col, ident) => {
                if let Symbol::Callable(_) = self.symbol(ident.name()) {
                    return self.compile_call(ident, &[], col, true);
                }
                let (place, ty) = self.resolve_var(ident, col, None, Access::Read)?;
                self.load_place(&place, ty);
                Ok(ExprInfo::of(ty, Value::Borrowed))
            }
            Index(col, ident, args) => {
                if let Some((b, arity)) = Function::builtin_and_arity(ident.name()) {
                    if !arity.contains(&args.len()) {
                        return Err(error!(SyntaxError, ..col; "WRONG NUMBER OF ARGUMENTS"));
                    }
                    return self.compile_builtin(b, args, col);
                }
                if let Symbol::Callable(_) = self.symbol(ident.name()) {
                    return self.compile_call(ident, args, col, true);
                }
                let ty = self.type_of(expr)?;
                let (place, _) = self.resolve_var(ident, col, Some(args), Access::Read)?;
                self.load_place(&place, ty);
                Ok(ExprInfo::of(ty, Value::Borrowed))
            }
            Negation(col, e) => {
                let info = self.compile_expr(e)?;
                match info.ty {
                    DataType::Int2 => self.call_at("NEGHL", LibItem::ABSHL),
                    DataType::Int4 => self.call(LibItem::I4_NEG_DEHL),
                    DataType::Dec6 => self.call(LibItem::D6_NEG),
                    DataType::Str => return Err(error!(TypeMismatch, ..col)),
                }
                Ok(ExprInfo::of(info.ty, Value::Borrowed))
            }
            Not(col, e) => {
                let info = self.compile_expr(e)?;
                match info.ty {
                    DataType::Int2 => self.call(LibItem::O_NOT),
                    DataType::Int4 => self.call(LibItem::I4_NOT),
                    _ => return Err(error!(TypeMismatch, ..col)),
                }
                Ok(ExprInfo::of(info.ty, Value::Borrowed))
            }
            _ => match expr.operands() {
                Some((l, r)) => self.compile_binary(expr, l, r),
                None => Err(error!(InternalError, ..&expr.column())),
            },
        }
    }

    /// Compiles and converts to `ty`.
    pub(super) fn compile_as(&mut self, expr: &Expression, ty: DataType) -> Result<ExprInfo> {
        let col = expr.column();
        if let Some(c) = self.const_value(expr)? {
            let c = c.convert(ty).map_err(|e| e.in_column(&col))?;
            self.load_const(&c);
            return Ok(ExprInfo {
                ty,
                constant: Some(c),
                value: Value::Borrowed,
            });
        }
        let info = self.compile_expr(expr)?;
        self.convert(info.ty, ty, &col)?;
        Ok(ExprInfo { ty, ..info })
    }

    pub(super) fn convert(&mut self, from: DataType, to: DataType, col: &Column) -> Result<()> {
        use DataType::*;
        match (from, to) {
            (a, b) if a == b => {}
            (Int2, Int4) => {
                self.emit("LD", "A,H");
                self.emit("RLA", "");
                self.emit("SBC", "A,A");
                self.emit("LD", "D,A");
                self.emit("LD", "E,A");
            }
            (Int2, Dec6) => self.call(LibItem::F_D6_CDEC_I2),
            (Int4, Int2) => {
                self.call(LibItem::CHECK_DEHL_FOR_I2);
                self.jump_item("C", LibItem::E_NOV);
            }
            (Int4, Dec6) => self.call(LibItem::F_D6_CDEC_I4),
            (Dec6, Int4) => self.call(LibItem::F_I4_CLNG_D6),
            (Dec6, Int2) => self.call(LibItem::F_I2_CINT_D6),
            _ => return Err(error!(TypeMismatch, ..col)),
        }
        Ok(())
    }

    /// Constants and plain variables load without touching other registers.
    fn is_simple(&self, expr: &Expression) -> bool {
        match expr {
            Expression::Integer(..) | Expression::Decimal(..) | Expression::String(..) => true,
            Expression::Var(_, ident) => !matches!(self.symbol(ident.name()), Symbol::Callable(_)),
            _ => false,
        }
    }

    /// Loads an Int2 operand straight into DE when it is a constant or
    /// a plain variable. False when nothing was emitted.
    fn load_de(&mut self, expr: &Expression) -> Result<bool> {
        if let Some(c) = self.const_value(expr)? {
            if let Ok(Const::Int2(n)) = c.convert(DataType::Int2) {
                self.emit_hex4("LD", "DE,", n as i64);
                return Ok(true);
            }
            return Ok(false);
        }
        if let Expression::Var(col, ident) = expr {
            if !self.is_simple(expr) || self.type_of(expr)? != DataType::Int2 {
                return Ok(false);
            }
            let (place, _) = self.resolve_var(ident, col, None, Access::Read)?;
            match place {
                Place::Global(label) => self.emit("LD", &format!("DE,({})", label)),
                Place::Local(d) => {
                    self.emit("LD", &format!("E,{}", iy(d)));
                    self.emit("LD", &format!("D,{}", iy(d + 1)));
                }
                Place::Dynamic => return Err(error!(InternalError, ..col)),
            }
            return Ok(true);
        }
        Ok(false)
    }

    /// Secures a string result another evaluation is about to follow.
    /// Temporaries are copied to the heap when `copy_temp` is set and
    /// heap blocks are marked for the end of the statement.
    pub(super) fn consume(&mut self, info: &ExprInfo, copy_temp: bool) {
        if info.ty != DataType::Str {
            return;
        }
        match info.value {
            Value::Temp if copy_temp => {
                self.call(LibItem::SMACP);
                self.mark_string();
            }
            Value::Owned => self.mark_string(),
            _ => {}
        }
    }

    fn mark_string(&mut self) {
        self.call(LibItem::SMARK);
        if self.code.is_enabled() {
            self.marked = true;
        }
    }

    /// Releases marked heap blocks, keeping the result registers of `keep`.
    pub(super) fn flush_marks(&mut self, keep: Option<DataType>) {
        if !self.marked {
            return;
        }
        match keep {
            Some(DataType::Int2) | Some(DataType::Str) => {
                self.emit("PUSH", "HL");
                self.call(LibItem::MRGC);
                self.emit("POP", "HL");
            }
            Some(DataType::Int4) => {
                self.emit("PUSH", "DE");
                self.emit("PUSH", "HL");
                self.call(LibItem::MRGC);
                self.emit("POP", "HL");
                self.emit("POP", "DE");
            }
            _ => self.call(LibItem::MRGC),
        }
        self.marked = false;
    }

    /// Leaves both operands of a binary operator where its routine wants them.
    pub(super) fn emit_operands(
        &mut self,
        l: &Expression,
        r: &Expression,
        ty: DataType,
    ) -> Result<()> {
        match ty {
            DataType::Int2 => {
                self.compile_as(l, DataType::Int2)?;
                if self.load_de(r)? {
                    return Ok(());
                }
                self.emit("PUSH", "HL");
                self.compile_as(r, DataType::Int2)?;
                self.emit("EX", "DE,HL");
                self.emit("POP", "HL");
            }
            DataType::Int4 => {
                self.compile_as(l, DataType::Int4)?;
                self.emit("PUSH", "DE");
                self.emit("PUSH", "HL");
                self.compile_as(r, DataType::Int4)?;
                self.emit("EXX", "");
                self.emit("POP", "HL");
                self.emit("POP", "DE");
                self.emit("EXX", "");
            }
            DataType::Dec6 => {
                self.compile_as(l, DataType::Dec6)?;
                let direct = self.is_simple(r) && self.type_of(r)? == DataType::Dec6;
                if direct {
                    self.call(LibItem::D6_OPACC);
                    self.compile_as(r, DataType::Dec6)?;
                } else {
                    self.call(LibItem::D6_PUSHA);
                    self.compile_as(r, DataType::Dec6)?;
                    self.call(LibItem::D6_POPO);
                }
            }
            DataType::Str => {
                let li = self.compile_as(l, DataType::Str)?;
                let copy = !self.is_simple(r);
                self.consume(&li, copy);
                self.emit("PUSH", "HL");
                let ri = self.compile_as(r, DataType::Str)?;
                self.consume(&ri, false);
                self.emit("POP", "DE");
            }
        }
        Ok(())
    }

    fn compile_binary(
        &mut self,
        expr: &Expression,
        l: &Expression,
        r: &Expression,
    ) -> Result<ExprInfo> {
        use Expression::*;
        let lt = self.type_of(l)?;
        let rt = self.type_of(r)?;
        let ty = operand_type(expr, lt, rt)?;
        if ty == DataType::Int2 {
            if let Some(Const::Int2(1)) = self.const_value(r)? {
                let step = match expr {
                    Add(..) => Some(LibItem::O_INC),
                    Subtract(..) => Some(LibItem::O_DEC),
                    _ => None,
                };
                if let Some(item) = step {
                    self.compile_as(l, DataType::Int2)?;
                    self.call(item);
                    return Ok(ExprInfo::of(DataType::Int2, Value::Borrowed));
                }
                if matches!(expr, ShiftLeft(..) | ShiftRight(..)) {
                    self.compile_as(l, DataType::Int2)?;
                    if let ShiftLeft(..) = expr {
                        self.emit("ADD", "HL,HL");
                    } else {
                        self.emit("SRL", "H");
                        self.emit("RR", "L");
                    }
                    return Ok(ExprInfo::of(DataType::Int2, Value::Borrowed));
                }
            }
        }
        self.emit_operands(l, r, ty)?;
        let (label, item) = routine(expr, ty)?;
        self.call_at(label, item);
        if expr.is_comparison() {
            Ok(ExprInfo::of(DataType::Int2, Value::Borrowed))
        } else if ty == DataType::Str {
            Ok(ExprInfo::of(DataType::Str, Value::Owned))
        } else {
            Ok(ExprInfo::of(ty, Value::Borrowed))
        }
    }

    fn compile_builtin(
        &mut self,
        b: Builtin,
        args: &[Expression],
        col: &Column,
    ) -> Result<ExprInfo> {
        let ty = self.builtin_type(b, args, col)?;
        let int2 = |v| ExprInfo::of(DataType::Int2, v);
        match b {
            Builtin::Abs => {
                let info = self.compile_expr(&args[0])?;
                match info.ty {
                    DataType::Int2 => self.call(LibItem::ABSHL),
                    DataType::Int4 => self.call(LibItem::I4_ABS_DEHL),
                    _ => self.call(LibItem::F_D6_ABS),
                }
                Ok(ExprInfo::of(info.ty, Value::Borrowed))
            }
            Builtin::Sgn => {
                let info = self.compile_expr(&args[0])?;
                match info.ty {
                    DataType::Int2 => self.call(LibItem::F_SGN),
                    DataType::Int4 => self.call(LibItem::F_I2_SGN_I4),
                    _ => self.call(LibItem::F_I2_SGN_D6),
                }
                Ok(int2(Value::Borrowed))
            }
            Builtin::Len | Builtin::Asc | Builtin::Val => {
                let s = self.compile_as(&args[0], DataType::Str)?;
                self.consume(&s, false);
                match b {
                    Builtin::Len => self.call(LibItem::F_LEN),
                    Builtin::Asc => {
                        self.emit("LD", "L,(HL)");
                        self.emit("LD", "H,00H");
                    }
                    _ => self.call(LibItem::F_D6_VAL_S),
                }
                Ok(ExprInfo::of(ty, Value::Borrowed))
            }
            Builtin::Peek => {
                self.compile_as(&args[0], DataType::Int2)?;
                self.emit("LD", "L,(HL)");
                self.emit("LD", "H,00H");
                Ok(int2(Value::Borrowed))
            }
            Builtin::Inp => {
                self.compile_as(&args[0], DataType::Int2)?;
                self.emit("LD", "B,H");
                self.emit("LD", "C,L");
                self.emit("IN", "L,(C)");
                self.emit("LD", "H,00H");
                Ok(int2(Value::Borrowed))
            }
            Builtin::Cint | Builtin::Clng => {
                let info = self.compile_expr(&args[0])?;
                if info.ty == DataType::Dec6 {
                    self.call(LibItem::F_D6_ROUND);
                }
                self.convert(info.ty, ty, col)?;
                Ok(ExprInfo::of(ty, Value::Borrowed))
            }
            Builtin::Cdec => {
                self.compile_as(&args[0], DataType::Dec6)?;
                Ok(ExprInfo::of(ty, Value::Borrowed))
            }
            Builtin::Round => {
                if let Some(mode) = args.get(1) {
                    match self.const_value(mode)? {
                        Some(c) => match c.as_i64() {
                            Some(m) if (0..=2).contains(&m) => {
                                self.compile_as(&args[0], DataType::Dec6)?;
                                self.emit_hex2("LD", "A,", m);
                                self.call(LibItem::D6_ROUND);
                            }
                            _ => return Err(error!(Overflow, ..&mode.column(); "ROUNDING MODE")),
                        },
                        None => {
                            self.compile_as(mode, DataType::Int2)?;
                            self.emit("PUSH", "HL");
                            self.compile_as(&args[0], DataType::Dec6)?;
                            self.emit("POP", "HL");
                            self.call(LibItem::F_D6_ROUNDM);
                        }
                    }
                } else {
                    self.compile_as(&args[0], DataType::Dec6)?;
                    self.call(LibItem::F_D6_ROUND);
                }
                Ok(ExprInfo::of(ty, Value::Borrowed))
            }
            Builtin::Trunc | Builtin::Frac => {
                self.compile_as(&args[0], DataType::Dec6)?;
                if b == Builtin::Trunc {
                    self.call(LibItem::F_D6_TRUNC);
                } else {
                    self.call(LibItem::F_D6_FRAC);
                }
                Ok(ExprInfo::of(ty, Value::Borrowed))
            }
            Builtin::Max | Builtin::Min => {
                self.emit_operands(&args[0], &args[1], ty)?;
                let item = match (ty, b) {
                    (DataType::Int2, Builtin::Max) => LibItem::I2_MAX,
                    (DataType::Int2, _) => LibItem::I2_MIN,
                    (DataType::Int4, Builtin::Max) => LibItem::I4_MAX,
                    (DataType::Int4, _) => LibItem::I4_MIN,
                    (_, Builtin::Max) => LibItem::D6_MAX,
                    _ => LibItem::D6_MIN,
                };
                self.call(item);
                Ok(ExprInfo::of(ty, Value::Borrowed))
            }
            Builtin::Chr => {
                self.compile_as(&args[0], DataType::Int2)?;
                self.call(LibItem::S_CHRL);
                Ok(ExprInfo::of(ty, Value::Temp))
            }
            Builtin::Str => {
                let info = self.compile_expr(&args[0])?;
                match info.ty {
                    DataType::Int2 => self.call(LibItem::S_STR),
                    DataType::Int4 => {
                        self.call(LibItem::F_D6_CDEC_I4);
                        self.call(LibItem::S_STR_D6);
                    }
                    _ => self.call(LibItem::S_STR_D6),
                }
                Ok(ExprInfo::of(ty, Value::Temp))
            }
            Builtin::Left | Builtin::Right => {
                let s = self.compile_as(&args[0], DataType::Str)?;
                let copy = !self.is_simple(&args[1]);
                self.consume(&s, copy);
                self.emit("PUSH", "HL");
                self.compile_as(&args[1], DataType::Int2)?;
                self.emit("LD", "B,H");
                self.emit("LD", "C,L");
                self.emit("POP", "HL");
                if b == Builtin::Left {
                    self.call(LibItem::S_LEFT);
                } else {
                    self.call(LibItem::S_RIGHT);
                }
                Ok(ExprInfo::of(ty, Value::Temp))
            }
            Builtin::Mid => {
                let s = self.compile_as(&args[0], DataType::Str)?;
                let copy = !args[1..].iter().all(|a| self.is_simple(a));
                self.consume(&s, copy);
                self.emit("PUSH", "HL");
                self.compile_as(&args[1], DataType::Int2)?;
                match args.get(2) {
                    Some(n) => {
                        self.emit("PUSH", "HL");
                        self.compile_as(n, DataType::Int2)?;
                        self.emit("LD", "B,H");
                        self.emit("LD", "C,L");
                        self.emit("POP", "DE");
                    }
                    None => {
                        self.emit("EX", "DE,HL");
                        self.emit_hex4("LD", "BC,", MAX_STR_LEN);
                    }
                }
                self.emit("POP", "HL");
                self.call(LibItem::S_MIDN);
                Ok(ExprInfo::of(ty, Value::Temp))
            }
            Builtin::Inkey => {
                self.call(LibItem::S_INKY);
                Ok(ExprInfo::of(ty, Value::Temp))
            }
            Builtin::Space => {
                self.compile_as(&args[0], DataType::Int2)?;
                self.emit("LD", "B,H");
                self.emit("LD", "C,L");
                self.emit("LD", "L,20H");
                self.call(LibItem::S_STC);
                Ok(ExprInfo::of(ty, Value::Temp))
            }
            Builtin::Deek => {
                let addr = match self.const_value(&args[0])? {
                    Some(c) => c.convert(DataType::Int2).ok(),
                    None => None,
                };
                match addr {
                    Some(Const::Int2(a)) => {
                        self.emit("LD", &format!("HL,({})", super::buffer::hex4(a as i64)));
                    }
                    _ => {
                        self.compile_as(&args[0], DataType::Int2)?;
                        self.emit("LD", "A,(HL)");
                        self.emit("INC", "HL");
                        self.emit("LD", "H,(HL)");
                        self.emit("LD", "L,A");
                    }
                }
                Ok(int2(Value::Borrowed))
            }
            Builtin::Rnd | Builtin::Sqr => {
                self.compile_as(&args[0], DataType::Int2)?;
                self.call(if b == Builtin::Rnd {
                    LibItem::F_RND
                } else {
                    LibItem::F_SQR
                });
                Ok(int2(Value::Borrowed))
            }
            Builtin::Hex | Builtin::Bin => {
                self.compile_as(&args[0], DataType::Int2)?;
                let item = if b == Builtin::Hex {
                    LibItem::S_HEX
                } else {
                    LibItem::S_BIN
                };
                match args.get(1) {
                    Some(width) => {
                        self.emit("PUSH", "HL");
                        self.compile_as(width, DataType::Int2)?;
                        self.emit("LD", "B,H");
                        self.emit("LD", "C,L");
                        self.emit("POP", "HL");
                        self.call_at(&format!("{}N", item.name()), item);
                    }
                    None => self.call(item),
                }
                Ok(ExprInfo::of(ty, Value::Temp))
            }
            Builtin::Upper
            | Builtin::Lower
            | Builtin::Ltrim
            | Builtin::Rtrim
            | Builtin::Trim
            | Builtin::Mirror => {
                let s = self.compile_as(&args[0], DataType::Str)?;
                self.consume(&s, false);
                self.call(match b {
                    Builtin::Upper => LibItem::S_UPR,
                    Builtin::Lower => LibItem::S_LWR,
                    Builtin::Ltrim => LibItem::S_LTRIM,
                    Builtin::Rtrim => LibItem::S_RTRIM,
                    Builtin::Trim => LibItem::S_TRIM,
                    _ => LibItem::S_MIRR,
                });
                Ok(ExprInfo::of(ty, Value::Temp))
            }
            Builtin::StringOf => {
                if self.type_of(&args[1])? == DataType::Str {
                    // The copies land in M_STMP, so the source must not live there.
                    let s = self.compile_as(&args[1], DataType::Str)?;
                    self.consume(&s, true);
                    self.emit("PUSH", "HL");
                    self.compile_as(&args[0], DataType::Int2)?;
                    self.emit("LD", "B,H");
                    self.emit("LD", "C,L");
                    self.emit("POP", "HL");
                    self.call(LibItem::S_STS);
                } else {
                    self.compile_as(&args[0], DataType::Int2)?;
                    self.emit("PUSH", "HL");
                    self.compile_as(&args[1], DataType::Int2)?;
                    self.emit("POP", "BC");
                    self.call(LibItem::S_STC);
                }
                Ok(ExprInfo::of(ty, Value::Temp))
            }
            Builtin::Instr => {
                let first = args.len() - 2;
                if first == 1 {
                    self.compile_as(&args[0], DataType::Int2)?;
                    self.emit("PUSH", "HL");
                }
                let text = self.compile_as(&args[first], DataType::Str)?;
                let copy = !self.is_simple(&args[first + 1]);
                self.consume(&text, copy);
                self.emit("PUSH", "HL");
                let pattern = self.compile_as(&args[first + 1], DataType::Str)?;
                self.consume(&pattern, false);
                self.emit("EX", "DE,HL");
                self.emit("POP", "HL");
                if first == 1 {
                    self.emit("POP", "BC");
                    self.call_at("F_INSTN", LibItem::F_INSTR);
                } else {
                    self.call(LibItem::F_INSTR);
                }
                Ok(int2(Value::Borrowed))
            }
        }
    }

    /// Evaluates a condition and jumps to `label` when it is false.
    pub(super) fn compile_condition(&mut self, expr: &Expression, label: &str) -> Result<()> {
        self.condition_jump(expr, "Z", label)
    }

    /// Evaluates a condition and jumps to `label` when it is true.
    pub(super) fn compile_condition_true(&mut self, expr: &Expression, label: &str) -> Result<()> {
        self.condition_jump(expr, "NZ", label)
    }

    fn condition_jump(&mut self, expr: &Expression, flag: &str, label: &str) -> Result<()> {
        if let Some(c) = self.const_value(expr)? {
            if c.data_type() == DataType::Str {
                return Err(error!(TypeMismatch, ..&expr.column()));
            }
            if c.is_true() == (flag == "NZ") {
                self.emit("JP", label);
            }
            return Ok(());
        }
        let info = self.compile_expr(expr)?;
        self.flush_marks(Some(info.ty));
        match info.ty {
            DataType::Int2 => {
                self.emit("LD", "A,H");
                self.emit("OR", "L");
            }
            DataType::Int4 => {
                self.emit("LD", "A,D");
                self.emit("OR", "E");
                self.emit("OR", "H");
                self.emit("OR", "L");
            }
            DataType::Dec6 => self.call_at("D6_ISZA", LibItem::D6_ISZ),
            DataType::Str => return Err(error!(TypeMismatch, ..&expr.column())),
        }
        self.emit("JP", &format!("{},{}", flag, label));
        Ok(())
    }

    /// Resolves a variable, declaring it implicitly where allowed, and
    /// emits the element address of an array access.
    pub(super) fn resolve_var(
        &mut self,
        ident: &Ident,
        col: &Column,
        indices: Option<&[Expression]>,
        access: Access,
    ) -> Result<(Place, DataType)> {
        let name = ident.name();
        let decl = match self.symbol(name) {
            Symbol::Local(slot) => {
                if indices.is_some() {
                    return Err(error!(TypeMismatch, ..col; "NOT AN ARRAY"));
                }
                return Ok((Place::Local(slot.offset), slot.ty));
            }
            Symbol::Callable(_) => {
                return Err(error!(DuplicateDefinition, ..col; name));
            }
            Symbol::Global(decl) => decl,
            Symbol::Undeclared => self.declare_implicit(ident, col, indices.is_some())?,
        };
        if let Some(d) = self.vars.get_mut(name) {
            match access {
                Access::Read => d.read = true,
                Access::Write => d.written = true,
            }
        }
        match (indices, decl.is_array()) {
            (None, false) => Ok((Place::Global(decl.label), decl.ty)),
            (Some(ix), true) => Ok((self.element_place(&decl, ix, col)?, decl.ty)),
            (None, true) => Err(error!(TypeMismatch, ..col; "ARRAY NEEDS SUBSCRIPT")),
            (Some(_), false) => Err(error!(TypeMismatch, ..col; "NOT AN ARRAY")),
        }
    }

    fn declare_implicit(&mut self, ident: &Ident, col: &Column, array: bool) -> Result<VarDecl> {
        let name = ident.name();
        if self.current.is_some() || !self.opts.implicit_declaration || array {
            return Err(error!(UndeclaredVariable, ..col; name));
        }
        let ty = DataType::resolve(ident, None)?;
        let decl = self.vars.declare(ident, ty, vec![], true)?.clone();
        if self.opts.warn_implicit {
            self.warn(&format!("IMPLICIT DECLARATION OF {}", name));
        }
        Ok(decl)
    }

    /// Element address: folded into the label when every index is known,
    /// otherwise computed into HL with optional bounds checks.
    fn element_place(&mut self, decl: &VarDecl, ix: &[Expression], col: &Column) -> Result<Place> {
        if ix.len() != decl.dims.len() {
            return Err(error!(SyntaxError, ..col; "WRONG NUMBER OF SUBSCRIPTS"));
        }
        let size = decl.ty.size() as i64;
        let mut known = vec![];
        for e in ix {
            match self.const_value(e)? {
                Some(c) => {
                    let c = c.convert(DataType::Int2).map_err(|e| e.in_column(col))?;
                    known.push(c.as_i64().unwrap_or(0));
                }
                None => break,
            }
        }
        // All constant subscripts resolve to a fixed offset from the array label.
        // Anything computed at run time goes through CKIDX instead.
        if known.len() == ix.len() {
            let mut linear = 0;
            for (i, (v, dim)) in known.iter().zip(&decl.dims).enumerate() {
                if *v < 0 || *v > *dim as i64 {
                    return Err(error!(SubscriptOutOfRange, ..&ix[i].column(); &decl.name));
                }
                linear = linear * (*dim as i64 + 1) + v;
            }
            return Ok(Place::Global(suffixed(&decl.label, linear * size)));
        }
        self.compile_index(&ix[0], decl.dims[0])?;
        if let Some(second) = ix.get(1) {
            self.emit("PUSH", "HL");
            self.compile_index(second, decl.dims[1])?;
            self.emit("POP", "DE");
            self.emit("PUSH", "HL");
            self.emit("EX", "DE,HL");
            self.emit_hex4("LD", "DE,", decl.dims[1] as i64 + 1);
            self.call(LibItem::O_MUL);
            self.emit("POP", "DE");
            self.emit("ADD", "HL,DE");
        }
        match size {
            2 => self.emit("ADD", "HL,HL"),
            4 => {
                self.emit("ADD", "HL,HL");
                self.emit("ADD", "HL,HL");
            }
            _ => {
                self.emit("LD", "D,H");
                self.emit("LD", "E,L");
                self.emit("ADD", "HL,HL");
                self.emit("ADD", "HL,DE");
                self.emit("ADD", "HL,HL");
            }
        }
        self.emit("LD", &format!("DE,{}", decl.label));
        self.emit("ADD", "HL,DE");
        Ok(Place::Dynamic)
    }

    fn compile_index(&mut self, e: &Expression, dim: u16) -> Result<()> {
        self.compile_as(e, DataType::Int2)?;
        if self.opts.check_bounds {
            self.emit_hex4("LD", "BC,", dim as i64 + 1);
            self.call(LibItem::CKIDX);
        }
        Ok(())
    }

    /// Address of a frame slot into HL.
    fn local_address(&mut self, offset: i32) {
        self.emit("PUSH", "IY");
        self.emit("POP", "HL");
        self.emit_hex4("LD", "DE,", offset as i64);
        self.emit("ADD", "HL,DE");
    }

    pub(super) fn load_place(&mut self, place: &Place, ty: DataType) {
        match (place, ty) {
            (Place::Global(l), DataType::Int2) | (Place::Global(l), DataType::Str) => {
                self.emit("LD", &format!("HL,({})", l))
            }
            (Place::Global(l), DataType::Int4) => {
                self.emit("LD", &format!("HL,({})", l));
                self.emit("LD", &format!("DE,({}+2)", l));
            }
            (Place::Global(l), DataType::Dec6) => {
                self.emit("LD", &format!("HL,{}", l));
                self.call(LibItem::D6_LDACC);
            }
            (Place::Local(d), DataType::Int2) | (Place::Local(d), DataType::Str) => {
                self.emit("LD", &format!("L,{}", iy(*d)));
                self.emit("LD", &format!("H,{}", iy(d + 1)));
            }
            (Place::Local(d), DataType::Int4) => {
                self.emit("LD", &format!("L,{}", iy(*d)));
                self.emit("LD", &format!("H,{}", iy(d + 1)));
                self.emit("LD", &format!("E,{}", iy(d + 2)));
                self.emit("LD", &format!("D,{}", iy(d + 3)));
            }
            (Place::Local(d), DataType::Dec6) => {
                self.local_address(*d);
                self.call(LibItem::D6_LDACC);
            }
            (Place::Dynamic, DataType::Int2) | (Place::Dynamic, DataType::Str) => {
                self.emit("LD", "A,(HL)");
                self.emit("INC", "HL");
                self.emit("LD", "H,(HL)");
                self.emit("LD", "L,A");
            }
            (Place::Dynamic, DataType::Int4) => self.call(LibItem::I4_LD_MEM),
            (Place::Dynamic, DataType::Dec6) => self.call(LibItem::D6_LDACC),
        }
    }

    /// Stores the result registers. A dynamic address was pushed before
    /// the value was computed.
    pub(super) fn store_place(&mut self, place: &Place, ty: DataType, value: Value) {
        match ty {
            DataType::Int2 => match place {
                Place::Global(l) => self.emit("LD", &format!("({}),HL", l)),
                Place::Local(d) => {
                    self.emit("LD", &format!("{},L", iy(*d)));
                    self.emit("LD", &format!("{},H", iy(d + 1)));
                }
                Place::Dynamic => {
                    self.emit("EX", "DE,HL");
                    self.emit("POP", "HL");
                    self.emit("LD", "(HL),E");
                    self.emit("INC", "HL");
                    self.emit("LD", "(HL),D");
                }
            },
            DataType::Int4 => match place {
                Place::Global(l) => {
                    self.emit("LD", &format!("({}),HL", l));
                    self.emit("LD", &format!("({}+2),DE", l));
                }
                Place::Local(d) => {
                    self.emit("LD", &format!("{},L", iy(*d)));
                    self.emit("LD", &format!("{},H", iy(d + 1)));
                    self.emit("LD", &format!("{},E", iy(d + 2)));
                    self.emit("LD", &format!("{},D", iy(d + 3)));
                }
                Place::Dynamic => {
                    self.emit("POP", "BC");
                    self.call(LibItem::I4_ST_BC);
                }
            },
            DataType::Dec6 => {
                match place {
                    Place::Global(l) => self.emit("LD", &format!("HL,{}", l)),
                    Place::Local(d) => self.local_address(*d),
                    Place::Dynamic => self.emit("POP", "HL"),
                }
                self.call(LibItem::D6_STACC);
            }
            DataType::Str => {
                match place {
                    Place::Global(l) => self.emit("LD", &format!("DE,{}", l)),
                    Place::Local(d) => {
                        self.emit("PUSH", "HL");
                        self.local_address(*d);
                        self.emit("EX", "DE,HL");
                        self.emit("POP", "HL");
                    }
                    Place::Dynamic => self.emit("POP", "DE"),
                }
                match value {
                    Value::Borrowed => self.call(LibItem::ASGSV),
                    Value::Temp => self.call(LibItem::ASGSM),
                    Value::Owned => self.call_at("ASGSL", LibItem::ASGSM),
                }
            }
        }
    }

    /// `target = expr` for a variable, array element or function result.
    pub(super) fn compile_assign(
        &mut self,
        ident: &Ident,
        col: &Column,
        indices: Option<&[Expression]>,
        expr: &Expression,
    ) -> Result<()> {
        let own_result = self
            .current_callable()
            .filter(|c| c.name == ident.name())
            .map(|c| (c.result_offset(), c.result_type()));
        let (place, ty) = match own_result {
            Some((Some(offset), Some(ty))) if indices.is_none() => (Place::Local(offset), ty),
            Some(_) => return Err(error!(TypeMismatch, ..col; "SUB HAS NO VALUE")),
            None => self.resolve_var(ident, col, indices, Access::Write)?,
        };
        if place == Place::Dynamic {
            self.emit("PUSH", "HL");
        }
        let info = self.compile_as(expr, ty)?;
        self.store_place(&place, ty, info.value);
        Ok(())
    }

    /// Address of a variable into HL, for routines that store into it.
    pub(super) fn var_address(
        &mut self,
        ident: &Ident,
        col: &Column,
        indices: Option<&[Expression]>,
    ) -> Result<DataType> {
        let (place, ty) = self.resolve_var(ident, col, indices, Access::Write)?;
        match place {
            Place::Global(l) => self.emit("LD", &format!("HL,{}", l)),
            Place::Local(d) => self.local_address(d),
            Place::Dynamic => {}
        }
        Ok(ty)
    }

    /// Calls a SUB or FUNCTION. Arguments go on the stack right to left,
    /// strings as references of their own which are freed on return.
    pub(super) fn compile_call(
        &mut self,
        ident: &Ident,
        args: &[Expression],
        col: &Column,
        want_result: bool,
    ) -> Result<ExprInfo> {
        let name = ident.name();
        let callee = match self.callables.get(name) {
            Some(c) => c.clone(),
            None => return Err(error!(UndefinedFunction, ..col; name)),
        };
        let result = callee.result_type();
        if want_result && result.is_none() {
            return Err(error!(TypeMismatch, ..col; "SUB HAS NO VALUE"));
        }
        if args.len() != callee.args.len() {
            return Err(error!(SignatureMismatch, ..col; name));
        }
        for (arg, param) in args.iter().zip(&callee.args) {
            if (self.type_of(arg)? == DataType::Str) != (param.ty == DataType::Str) {
                return Err(error!(TypeMismatch, ..&arg.column(); &param.name));
            }
        }
        for (arg, param) in args.iter().zip(&callee.args).rev() {
            let info = self.compile_as(arg, param.ty)?;
            match param.ty {
                DataType::Int2 => self.emit("PUSH", "HL"),
                DataType::Int4 => {
                    self.emit("PUSH", "DE");
                    self.emit("PUSH", "HL");
                }
                DataType::Dec6 => self.call(LibItem::D6_PUSHA),
                DataType::Str => {
                    match info.value {
                        Value::Borrowed => {
                            self.emit("EX", "DE,HL");
                            self.call(LibItem::SVDUP);
                            self.emit("EX", "DE,HL");
                        }
                        Value::Temp => self.call(LibItem::SMACP),
                        Value::Owned => {}
                    }
                    self.emit("PUSH", "HL");
                }
            }
        }
        let locked = self.marked;
        if locked {
            self.emit("LD", "HL,M_GCLK");
            self.emit("INC", "(HL)");
            self.use_item(LibItem::M_GCLK);
        }
        self.emit("CALL", &callee.label());
        if locked {
            self.emit("LD", "HL,M_GCLK");
            self.emit("DEC", "(HL)");
        }
        self.release_args(&callee.args);
        if let Some(c) = self.callables.get_mut(name) {
            c.calls += 1;
        }
        match result {
            Some(DataType::Int2) => {
                self.emit("LD", "HL,(M_FRET)");
                Ok(ExprInfo::of(DataType::Int2, Value::Borrowed))
            }
            Some(DataType::Int4) => {
                self.emit("LD", "HL,(M_FRET)");
                self.emit("LD", "DE,(M_FRET+2)");
                Ok(ExprInfo::of(DataType::Int4, Value::Borrowed))
            }
            Some(DataType::Str) => {
                self.emit("LD", "HL,(M_FRET)");
                Ok(ExprInfo::of(DataType::Str, Value::Owned))
            }
            Some(DataType::Dec6) => Ok(ExprInfo::of(DataType::Dec6, Value::Borrowed)),
            None => Ok(ExprInfo::of(DataType::Int2, Value::Borrowed)),
        }
    }

    fn release_args(&mut self, params: &[Param]) {
        let size: i64 = params.iter().map(|p| p.ty.size() as i64).sum();
        if size == 0 {
            return;
        }
        if !params.iter().any(|p| p.ty == DataType::Str) {
            self.emit_hex4("LD", "HL,", size);
            self.emit("ADD", "HL,SP");
            self.emit("LD", "SP,HL");
            return;
        }
        for p in params {
            if p.ty == DataType::Str {
                self.emit("POP", "DE");
                self.call(LibItem::MFREE);
            } else {
                for _ in 0..p.ty.size() / 2 {
                    self.emit("POP", "AF");
                }
            }
        }
    }
}
