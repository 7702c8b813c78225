use super::{token::*, LineNumber, MaxValue};

pub fn lex(s: &str) -> (LineNumber, Vec<Token>) {
    BasicLexer::lex(s)
}

fn is_basic_whitespace(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn is_basic_digit(c: char) -> bool {
    c.is_ascii_digit()
}

fn is_basic_alphabetic(c: char) -> bool {
    c.is_ascii_alphabetic()
}

fn is_basic_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

trait Tokenizers<'a> {
    fn chars(&mut self) -> &mut std::iter::Peekable<std::str::Chars<'a>>;

    fn whitespace(&mut self) -> Option<Token> {
        let mut len = 0;
        loop {
            self.chars().next();
            len += 1;
            if let Some(pk) = self.chars().peek() {
                if is_basic_whitespace(*pk) {
                    continue;
                }
            }
            return Some(Token::Whitespace(len));
        }
    }

    fn number(&mut self) -> Option<Token> {
        let mut s = String::new();
        let mut decimal = false;
        loop {
            let ch = match self.chars().next() {
                Some(c) => c,
                None => {
                    debug_assert!(false, "Failed to tokenize number.");
                    return None;
                }
            };
            s.push(ch);
            if ch == '.' {
                decimal = true
            }
            if let Some(pk) = self.chars().peek() {
                if is_basic_digit(*pk) {
                    continue;
                }
                if !decimal && *pk == '.' {
                    continue;
                }
            }
            break;
        }
        if decimal {
            Some(Token::Literal(Literal::Decimal(s)))
        } else {
            Some(Token::Literal(Literal::Integer(s)))
        }
    }

    fn hex(&mut self) -> Option<Token> {
        self.chars().next();
        self.chars().next();
        let mut s = String::new();
        while let Some(pk) = self.chars().peek() {
            if !pk.is_ascii_hexdigit() {
                break;
            }
            s.push(pk.to_ascii_uppercase());
            self.chars().next();
        }
        Some(Token::Literal(Literal::Hex(s)))
    }

    fn string(&mut self) -> Option<Token> {
        let mut s = String::new();
        self.chars().next();
        loop {
            if let Some(ch) = self.chars().next() {
                if ch != '"' {
                    s.push(ch);
                    continue;
                }
            }
            return Some(Token::Literal(Literal::String(s)));
        }
    }

    fn alphabetic(&mut self) -> Option<Token> {
        let mut s = String::new();
        loop {
            let ch = match self.chars().next() {
                Some(ch) => ch.to_ascii_uppercase(),
                None => {
                    debug_assert!(false, "Failed to tokenize alphabetic.");
                    return None;
                }
            };
            s.push(ch);
            match self.chars().peek() {
                Some(pk) if is_basic_ident_char(*pk) => continue,
                _ => break,
            }
        }
        // STRING$ names a function, not the STRING type.
        let string_suffix = matches!(self.chars().peek(), Some('$'));
        if !string_suffix {
            if let Some(token) = Token::from_string(&s) {
                return Some(token);
            }
        }
        if let Some(pk) = self.chars().peek() {
            if Ident::suffix(*pk) {
                s.push(*pk);
                self.chars().next();
            }
        }
        Some(Token::Ident(Ident::from_name(s)))
    }

    fn minutia(&mut self) -> Option<Token> {
        let mut s = String::new();
        loop {
            if let Some(ch) = self.chars().next() {
                s.push(ch);
                if let Some(t) = Token::from_string(&s) {
                    return Some(t);
                }
                if let Some(pk) = self.chars().peek() {
                    if is_basic_alphabetic(*pk) {
                        break;
                    }
                    if is_basic_digit(*pk) {
                        break;
                    }
                    if is_basic_whitespace(*pk) {
                        break;
                    }
                    continue;
                }
                break;
            }
        }
        Some(Token::Unknown(s))
    }
}

struct BasicLexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    remark: bool,
}

impl<'a> Tokenizers<'a> for BasicLexer<'a> {
    fn chars(&mut self) -> &mut std::iter::Peekable<std::str::Chars<'a>> {
        &mut self.chars
    }
}

impl<'a> Iterator for BasicLexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let pk = *self.chars.peek()?;
        if self.remark {
            return Some(Token::Unknown(self.chars.by_ref().collect::<String>()));
        }
        if is_basic_whitespace(pk) {
            return self.whitespace();
        }
        if is_basic_digit(pk) || pk == '.' {
            return self.number();
        }
        if is_basic_alphabetic(pk) {
            let r = self.alphabetic();
            if let Some(Token::Word(Word::Rem1)) = r {
                self.remark = true;
            }
            return r;
        }
        if pk == '"' {
            return self.string();
        }
        if pk == '&' {
            let mut look = self.chars.clone();
            look.next();
            if let Some('H') | Some('h') = look.next() {
                return self.hex();
            }
        }
        let minutia = self.minutia();
        if let Some(Token::Word(Word::Rem2)) = minutia {
            self.remark = true;
        }
        minutia
    }
}

impl<'a> BasicLexer<'a> {
    fn lex(s: &str) -> (LineNumber, Vec<Token>) {
        let mut line_number = None;
        let mut s = s.trim_end_matches(|c| c == '\n' || c == '\r');
        let trimmed = s.trim_start();
        let digits = trimmed.chars().take_while(|c| is_basic_digit(*c)).count();
        if digits > 0 {
            if let Ok(n) = trimmed[..digits].parse::<u32>() {
                if n <= LineNumber::max_value() as u32 {
                    line_number = Some(n as u16);
                    s = &trimmed[digits..];
                    if let Some(' ') = s.chars().next() {
                        s = &s[1..];
                    }
                }
            }
        }
        let mut tokens: Vec<Token> = BasicLexer {
            chars: s.chars().peekable(),
            remark: false,
        }
        .collect();
        BasicLexer::trim_end(&mut tokens);
        BasicLexer::collapse_lt_gt_equal(&mut tokens);
        BasicLexer::collapse_end(&mut tokens);
        (line_number, tokens)
    }

    fn collapse_lt_gt_equal(tokens: &mut Vec<Token>) {
        let mut locs: Vec<(usize, Token)> = vec![];
        let mut tokens_iter = tokens.windows(2).enumerate();
        while let Some((index, tt)) = tokens_iter.next() {
            let joined = match (&tt[0], &tt[1]) {
                (Token::Operator(Operator::Less), Token::Operator(Operator::Equal)) => {
                    Some(Operator::LessEqual)
                }
                (Token::Operator(Operator::Greater), Token::Operator(Operator::Equal)) => {
                    Some(Operator::GreaterEqual)
                }
                (Token::Operator(Operator::Less), Token::Operator(Operator::Greater)) => {
                    Some(Operator::NotEqual)
                }
                _ => None,
            };
            if let Some(op) = joined {
                locs.push((index, Token::Operator(op)));
                tokens_iter.next();
            }
        }
        while let Some((index, token)) = locs.pop() {
            tokens.splice(index..index + 2, Some(token));
        }
    }

    fn collapse_end(tokens: &mut Vec<Token>) {
        let mut locs: Vec<(usize, Token)> = vec![];
        for (index, ttt) in tokens.windows(3).enumerate() {
            if let Token::Word(Word::End) = ttt[0] {
                if let Token::Whitespace(_) = ttt[1] {
                    let word = match ttt[2] {
                        Token::Word(Word::If) => Word::EndIf,
                        Token::Word(Word::Sub) => Word::EndSub,
                        Token::Word(Word::Function) => Word::EndFunction,
                        Token::Word(Word::Select) => Word::EndSelect,
                        _ => continue,
                    };
                    locs.push((index, Token::Word(word)));
                }
            }
        }
        while let Some((index, token)) = locs.pop() {
            tokens.splice(index..index + 3, Some(token));
        }
    }

    fn trim_end(tokens: &mut Vec<Token>) {
        if let Some(Token::Whitespace(_)) = tokens.last() {
            tokens.pop();
        }
        if let Some(Token::Unknown(_)) = tokens.last() {
            if let Some(Token::Unknown(s)) = tokens.pop() {
                tokens.push(Token::Unknown(s.trim_end().to_string()));
            }
        }
    }
}
