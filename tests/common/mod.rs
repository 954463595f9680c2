#![allow(dead_code)]

use toy_sqlite::{Lexer, Token, TokenKind};

/// All tokens of `input`, the terminal EOF or error token included.
pub fn scan(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).tokens().collect()
}

pub fn kinds(input: &str) -> Vec<TokenKind> {
    scan(input).iter().map(|t| t.kind).collect()
}

/// Rebuild the source from token lexemes plus the skipped text between
/// them, and assert it equals `input`.
pub fn assert_reconstructs(input: &str) {
    let mut rebuilt = String::new();
    let mut cursor = 0;
    for token in scan(input) {
        assert!(
            token.offset >= cursor,
            "token {token} starts before the previous one ended"
        );
        assert_eq!(
            &input[token.offset..token.offset + token.len()],
            token.text,
            "lexeme does not match the source at its offset"
        );
        rebuilt.push_str(&input[cursor..token.offset]);
        rebuilt.push_str(token.text);
        cursor = token.offset + token.len();
    }
    rebuilt.push_str(&input[cursor..]);
    assert_eq!(rebuilt, input);
}
