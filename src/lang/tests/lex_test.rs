use super::super::token::*;
use super::super::*;

fn tokens(s: &str) -> Vec<Token> {
    let (_, tokens) = lex(s);
    tokens
        .into_iter()
        .filter(|t| !matches!(t, Token::Whitespace(_)))
        .collect()
}

#[test]
fn test_line_number() {
    let (ln, t) = lex("10 PRINT");
    assert_eq!(ln, Some(10));
    assert_eq!(t, [Token::Word(Word::Print1)]);
    let (ln, _) = lex("  PRINT");
    assert_eq!(ln, None);
}

#[test]
fn test_crlf() {
    let (_, t) = lex("cls\r\n");
    assert_eq!(t, [Token::Word(Word::Cls)]);
}

#[test]
fn test_long_identifiers() {
    assert_eq!(
        tokens("FORMAT=TOTAL"),
        [
            Token::Ident(Ident::Plain("FORMAT".to_string())),
            Token::Operator(Operator::Equal),
            Token::Ident(Ident::Plain("TOTAL".to_string())),
        ]
    );
}

#[test]
fn test_suffixes() {
    assert_eq!(
        tokens("A$ B% C& D! E_1"),
        [
            Token::Ident(Ident::String("A$".to_string())),
            Token::Ident(Ident::Integer("B%".to_string())),
            Token::Ident(Ident::Long("C&".to_string())),
            Token::Ident(Ident::Decimal("D!".to_string())),
            Token::Ident(Ident::Plain("E_1".to_string())),
        ]
    );
}

#[test]
fn test_numbers() {
    assert_eq!(
        tokens("12 3.25 .5 &H1f"),
        [
            Token::Literal(Literal::Integer("12".to_string())),
            Token::Literal(Literal::Decimal("3.25".to_string())),
            Token::Literal(Literal::Decimal(".5".to_string())),
            Token::Literal(Literal::Hex("1F".to_string())),
        ]
    );
}

#[test]
fn test_comparison_operators() {
    assert_eq!(
        tokens("<> <= >= < > ="),
        [
            Token::Operator(Operator::NotEqual),
            Token::Operator(Operator::LessEqual),
            Token::Operator(Operator::GreaterEqual),
            Token::Operator(Operator::Less),
            Token::Operator(Operator::Greater),
            Token::Operator(Operator::Equal),
        ]
    );
    assert_eq!(
        tokens("A<=B"),
        [
            Token::Ident(Ident::Plain("A".to_string())),
            Token::Operator(Operator::LessEqual),
            Token::Ident(Ident::Plain("B".to_string())),
        ]
    );
}

#[test]
fn test_end_words() {
    assert_eq!(tokens("END IF"), [Token::Word(Word::EndIf)]);
    assert_eq!(tokens("ENDIF"), [Token::Word(Word::EndIf)]);
    assert_eq!(tokens("end sub"), [Token::Word(Word::EndSub)]);
    assert_eq!(tokens("END"), [Token::Word(Word::End)]);
}

#[test]
fn test_remarks() {
    assert_eq!(
        tokens("REM hello: world"),
        [
            Token::Word(Word::Rem1),
            Token::Unknown(" hello: world".to_string())
        ]
    );
    assert_eq!(
        tokens("A=1 ' note"),
        [
            Token::Ident(Ident::Plain("A".to_string())),
            Token::Operator(Operator::Equal),
            Token::Literal(Literal::Integer("1".to_string())),
            Token::Word(Word::Rem2),
            Token::Unknown(" note".to_string())
        ]
    );
}

#[test]
fn test_string_literal() {
    assert_eq!(
        tokens("PRINT \"HI: THERE\""),
        [
            Token::Word(Word::Print1),
            Token::Literal(Literal::String("HI: THERE".to_string())),
        ]
    );
}

#[test]
fn test_keyword_with_string_suffix() {
    assert_eq!(
        tokens("AS STRING: STRING$(3,\"*\")"),
        [
            Token::Word(Word::As),
            Token::Word(Word::Str),
            Token::Colon,
            Token::Ident(Ident::String("STRING$".to_string())),
            Token::LParen,
            Token::Literal(Literal::Integer("3".to_string())),
            Token::Comma,
            Token::Literal(Literal::String("*".to_string())),
            Token::RParen,
        ]
    );
}

#[test]
fn test_shift_operators() {
    assert_eq!(
        tokens("A SHL 2 SHR B"),
        [
            Token::Ident(Ident::Plain("A".to_string())),
            Token::Operator(Operator::Shl),
            Token::Literal(Literal::Integer("2".to_string())),
            Token::Operator(Operator::Shr),
            Token::Ident(Ident::Plain("B".to_string())),
        ]
    );
}
