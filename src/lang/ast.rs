use super::{Column, Ident};

#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    Integer(Column, i32),
    Decimal(Column, String),
    String(Column, String),
    Var(Column, Ident),
    Index(Column, Ident, Vec<Expression>),
    Negation(Column, Box<Expression>),
    Not(Column, Box<Expression>),
    Multiply(Column, Box<Expression>, Box<Expression>),
    Divide(Column, Box<Expression>, Box<Expression>),
    Modulus(Column, Box<Expression>, Box<Expression>),
    Add(Column, Box<Expression>, Box<Expression>),
    Subtract(Column, Box<Expression>, Box<Expression>),
    Equal(Column, Box<Expression>, Box<Expression>),
    NotEqual(Column, Box<Expression>, Box<Expression>),
    Less(Column, Box<Expression>, Box<Expression>),
    LessEqual(Column, Box<Expression>, Box<Expression>),
    Greater(Column, Box<Expression>, Box<Expression>),
    GreaterEqual(Column, Box<Expression>, Box<Expression>),
    And(Column, Box<Expression>, Box<Expression>),
    Or(Column, Box<Expression>, Box<Expression>),
    Xor(Column, Box<Expression>, Box<Expression>),
    ShiftLeft(Column, Box<Expression>, Box<Expression>),
    ShiftRight(Column, Box<Expression>, Box<Expression>),
}

impl Expression {
    pub fn column(&self) -> Column {
        use Expression::*;
        match self {
            Integer(col, ..)
            | Decimal(col, ..)
            | String(col, ..)
            | Var(col, ..)
            | Index(col, ..)
            | Negation(col, ..)
            | Not(col, ..)
            | Multiply(col, ..)
            | Divide(col, ..)
            | Modulus(col, ..)
            | Add(col, ..)
            | Subtract(col, ..)
            | Equal(col, ..)
            | NotEqual(col, ..)
            | Less(col, ..)
            | LessEqual(col, ..)
            | Greater(col, ..)
            | GreaterEqual(col, ..)
            | And(col, ..)
            | Or(col, ..)
            | Xor(col, ..)
            | ShiftLeft(col, ..)
            | ShiftRight(col, ..) => col.clone(),
        }
    }

    /// Operands of a binary operator.
    pub fn operands(&self) -> Option<(&Expression, &Expression)> {
        use Expression::*;
        match self {
            Multiply(_, l, r)
            | Divide(_, l, r)
            | Modulus(_, l, r)
            | Add(_, l, r)
            | Subtract(_, l, r)
            | Equal(_, l, r)
            | NotEqual(_, l, r)
            | Less(_, l, r)
            | LessEqual(_, l, r)
            | Greater(_, l, r)
            | GreaterEqual(_, l, r)
            | And(_, l, r)
            | Or(_, l, r)
            | Xor(_, l, r)
            | ShiftLeft(_, l, r)
            | ShiftRight(_, l, r) => Some((l, r)),
            _ => None,
        }
    }

    pub fn is_comparison(&self) -> bool {
        use Expression::*;
        matches!(
            self,
            Equal(..) | NotEqual(..) | Less(..) | LessEqual(..) | Greater(..) | GreaterEqual(..)
        )
    }
}
