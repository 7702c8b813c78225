use super::{ast::*, token::*, Column, Error};

type Result<T> = std::result::Result<T, Error>;

/// ## Token cursor
///
/// Statement handlers consume exactly their own tokens through this cursor.
/// Whitespace is skipped and every token knows its column in the source line.

#[derive(Debug, Clone)]
pub struct Parser<'a> {
    tokens: &'a [Token],
    starts: Vec<usize>,
    pos: usize,
    col: Column,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Parser<'a> {
        let mut starts = Vec::with_capacity(tokens.len() + 1);
        let mut at = 0;
        for t in tokens {
            starts.push(at);
            at += t.to_string().chars().count();
        }
        starts.push(at);
        Parser {
            tokens,
            starts,
            pos: 0,
            col: 0..0,
        }
    }

    /// Column of the token most recently returned by `next`.
    pub fn column(&self) -> Column {
        self.col.clone()
    }

    /// Column of the token `peek` would return.
    pub fn peek_column(&self) -> Column {
        let mut pos = self.pos;
        while let Some(Token::Whitespace(_)) = self.tokens.get(pos) {
            pos += 1;
        }
        if pos < self.tokens.len() {
            self.starts[pos]..self.starts[pos + 1]
        } else {
            let end = self.starts[self.tokens.len()];
            end..end
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn next(&mut self) -> Option<&'a Token> {
        loop {
            let t = self.tokens.get(self.pos)?;
            self.col = self.starts[self.pos]..self.starts[self.pos + 1];
            self.pos += 1;
            match t {
                Token::Whitespace(_) => continue,
                _ => return Some(t),
            }
        }
    }

    pub fn peek(&self) -> Option<&'a Token> {
        self.tokens[self.pos..]
            .iter()
            .find(|t| !matches!(t, Token::Whitespace(_)))
    }

    pub fn is_end(&self) -> bool {
        self.peek().is_none()
    }

    pub fn is_end_of_statement(&self) -> bool {
        matches!(
            self.peek(),
            None | Some(Token::Colon) | Some(Token::Word(Word::Else)) | Some(Token::Word(Word::Rem2))
        )
    }

    pub fn word(&mut self, word: Word) -> bool {
        if let Some(Token::Word(w)) = self.peek() {
            if *w == word {
                self.next();
                return true;
            }
        }
        false
    }

    pub fn token(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.next();
            return true;
        }
        false
    }

    pub fn expect_word(&mut self, word: Word) -> Result<()> {
        if self.word(word) {
            Ok(())
        } else {
            let col = self.peek_column();
            Err(error!(SyntaxError, ..&col; &format!("EXPECTED {}", word)))
        }
    }

    pub fn expect(&mut self, token: Token) -> Result<()> {
        if let Some(t) = self.peek() {
            if *t == token {
                self.next();
                return Ok(());
            }
        }
        use Token::*;
        let col = self.peek_column();
        Err(error!(SyntaxError, ..&col;
            match token {
                Unknown(_) | Whitespace(_) => {"UNEXPECTED TOKEN"}
                Literal(_) => {"EXPECTED LITERAL"}
                Word(_) => {"EXPECTED RESERVED WORD"}
                Operator(_) => {"EXPECTED OPERATOR"}
                Ident(_) => {"EXPECTED IDENTIFIER"}
                LParen => {"EXPECTED LEFT PARENTHESIS"}
                RParen => {"EXPECTED RIGHT PARENTHESIS"}
                Comma => {"EXPECTED COMMA"}
                Colon => {"EXPECTED COLON"}
                Semicolon => {"EXPECTED SEMICOLON"}
            }
        ))
    }

    pub fn expect_end_of_statement(&self) -> Result<()> {
        if self.is_end_of_statement() {
            Ok(())
        } else {
            let col = self.peek_column();
            Err(error!(SyntaxError, ..&col; "EXPECTED END OF STATEMENT"))
        }
    }

    pub fn ident(&mut self) -> Result<(Column, Ident)> {
        match self.peek() {
            Some(Token::Ident(i)) => {
                self.next();
                Ok((self.column(), i.clone()))
            }
            Some(t) if t.is_reserved_word() => {
                let col = self.peek_column();
                Err(error!(ReservedWord, ..&col; &t.to_string()))
            }
            _ => {
                let col = self.peek_column();
                Err(error!(SyntaxError, ..&col; "EXPECTED IDENTIFIER"))
            }
        }
    }

    /// Skips to the next statement separator.
    pub fn skip_statement(&mut self) {
        while !self.is_end_of_statement() {
            self.next();
        }
    }

    /// Source text of the remaining tokens.
    pub fn rest(&mut self) -> String {
        let s: String = self.tokens[self.pos..].iter().map(|t| t.to_string()).collect();
        self.pos = self.tokens.len();
        s
    }

    pub fn expression(&mut self) -> Result<Expression> {
        self.binary(1)
    }

    fn binary(&mut self, precedence: usize) -> Result<Expression> {
        let mut lhs = self.primary()?;
        while let Some(Token::Operator(op)) = self.peek() {
            let op_precedence = Expression::op_precedence(op);
            if op_precedence < precedence || op_precedence == 0 {
                break;
            }
            self.next();
            let rhs = self.binary(op_precedence + 1)?;
            let column = lhs.column().start..rhs.column().end;
            lhs = Expression::for_binary_op(column, op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn primary(&mut self) -> Result<Expression> {
        let token = match self.next() {
            Some(t) => t,
            None => {
                let col = self.peek_column();
                return Err(error!(SyntaxError, ..&col; "EXPECTED EXPRESSION"));
            }
        };
        let column = self.column();
        match token {
            Token::LParen => {
                let expr = self.expression()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            Token::Ident(i) => match self.peek() {
                Some(Token::LParen) => {
                    let args = self.expression_list()?;
                    let column = column.start..self.column().end;
                    Ok(Expression::Index(column, i.clone(), args))
                }
                _ => Ok(Expression::Var(column, i.clone())),
            },
            Token::Literal(l) => Expression::for_literal(column, l),
            Token::Operator(Operator::Minus) => {
                let expr = self.binary(8)?;
                let column = column.start..expr.column().end;
                Ok(Expression::Negation(column, Box::new(expr)))
            }
            Token::Operator(Operator::Plus) => self.binary(8),
            Token::Operator(Operator::Not) => {
                let expr = self.binary(4)?;
                let column = column.start..expr.column().end;
                Ok(Expression::Not(column, Box::new(expr)))
            }
            t if t.is_reserved_word() => Err(error!(ReservedWord, ..&column; &t.to_string())),
            _ => Err(error!(SyntaxError, ..&column; "EXPECTED EXPRESSION")),
        }
    }

    pub fn expression_list(&mut self) -> Result<Vec<Expression>> {
        self.expect(Token::LParen)?;
        let mut v: Vec<Expression> = vec![];
        if self.token(&Token::RParen) {
            return Ok(v);
        }
        loop {
            v.push(self.expression()?);
            match self.next() {
                Some(Token::RParen) => return Ok(v),
                Some(Token::Comma) => continue,
                _ => {
                    let col = self.column();
                    return Err(error!(SyntaxError, ..&col; "EXPECTED END OR SEPARATOR"));
                }
            }
        }
    }
}

impl Expression {
    fn for_binary_op(col: Column, op: &Operator, lhs: Expression, rhs: Expression) -> Expression {
        use Operator::*;
        let (l, r) = (Box::new(lhs), Box::new(rhs));
        match op {
            Multiply => Expression::Multiply(col, l, r),
            Divide => Expression::Divide(col, l, r),
            Modulus => Expression::Modulus(col, l, r),
            Plus => Expression::Add(col, l, r),
            Minus => Expression::Subtract(col, l, r),
            Equal => Expression::Equal(col, l, r),
            NotEqual => Expression::NotEqual(col, l, r),
            Less => Expression::Less(col, l, r),
            LessEqual => Expression::LessEqual(col, l, r),
            Greater => Expression::Greater(col, l, r),
            GreaterEqual => Expression::GreaterEqual(col, l, r),
            And => Expression::And(col, l, r),
            Or => Expression::Or(col, l, r),
            Xor => Expression::Xor(col, l, r),
            Shl => Expression::ShiftLeft(col, l, r),
            Shr => Expression::ShiftRight(col, l, r),
            Not => Expression::Not(col, r),
        }
    }

    fn op_precedence(op: &Operator) -> usize {
        use Operator::*;
        match op {
            Or | Xor => 1,
            And => 2,
            Not => 0,
            Equal | NotEqual | Less | LessEqual | Greater | GreaterEqual => 4,
            Shl | Shr => 5,
            Plus | Minus => 6,
            Multiply | Divide | Modulus => 7,
        }
    }

    fn for_literal(col: Column, lit: &Literal) -> Result<Expression> {
        match lit {
            Literal::Integer(s) => match s.parse::<i32>() {
                Ok(n) => Ok(Expression::Integer(col, n)),
                Err(_) => Ok(Expression::Decimal(col, s.clone())),
            },
            Literal::Hex(s) => match u32::from_str_radix(s, 16) {
                Ok(n) if n <= 0xFFFF => Ok(Expression::Integer(col, n as u16 as i16 as i32)),
                Ok(n) => Ok(Expression::Integer(col, n as i32)),
                Err(_) => Err(error!(SyntaxError, ..&col; "HEX LITERAL")),
            },
            Literal::Decimal(s) => Ok(Expression::Decimal(col, s.clone())),
            Literal::String(s) => Ok(Expression::String(col, s.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::lex::*;
    use super::*;

    fn parse_expr(s: &str) -> Expression {
        let (_, tokens) = lex(s);
        let mut parser = Parser::new(&tokens);
        parser.expression().unwrap()
    }

    #[test]
    fn test_left_associative() {
        match parse_expr("10-4-3") {
            Expression::Subtract(_, lhs, rhs) => {
                assert!(matches!(*lhs, Expression::Subtract(..)));
                assert_eq!(*rhs, Expression::Integer(5..6, 3));
            }
            e => panic!("{:?}", e),
        }
    }

    #[test]
    fn test_precedence() {
        match parse_expr("1+2*3") {
            Expression::Add(_, _, rhs) => assert!(matches!(*rhs, Expression::Multiply(..))),
            e => panic!("{:?}", e),
        }
        match parse_expr("A=1 AND B<2") {
            Expression::And(_, lhs, rhs) => {
                assert!(matches!(*lhs, Expression::Equal(..)));
                assert!(matches!(*rhs, Expression::Less(..)));
            }
            e => panic!("{:?}", e),
        }
    }

    #[test]
    fn test_shift_binds_below_sum() {
        match parse_expr("1 SHL N+1 = 8") {
            Expression::Equal(_, lhs, _) => match *lhs {
                Expression::ShiftLeft(_, _, rhs) => assert!(matches!(*rhs, Expression::Add(..))),
                e => panic!("{:?}", e),
            },
            e => panic!("{:?}", e),
        }
        assert!(matches!(parse_expr("-4 SHR 1"), Expression::ShiftRight(..)));
    }

    #[test]
    fn test_hex_literal() {
        assert_eq!(parse_expr("&HFFFF"), Expression::Integer(0..6, -1));
        assert_eq!(parse_expr("&H10"), Expression::Integer(0..4, 16));
    }

    #[test]
    fn test_columns() {
        let (_, tokens) = lex("PRINT  A$, 1");
        let mut parser = Parser::new(&tokens);
        assert!(parser.word(Word::Print1));
        assert_eq!(parser.peek_column(), 7..9);
        let (col, ident) = parser.ident().unwrap();
        assert_eq!(col, 7..9);
        assert_eq!(ident, Ident::String("A$".to_string()));
    }
}
