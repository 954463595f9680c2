use std::fmt;
use std::iter::FusedIterator;

use crate::token::{Span, Token, TokenKind, keyword};

/// Classifies a lexer error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexErrorKind {
    /// End of input reached before the closing quote.
    UnterminatedString,
    /// End of input reached inside a `/* ... */` comment.
    UnterminatedComment,
    /// `e`/`E` (optionally signed) not followed by a digit.
    MalformedExponent,
    /// `!` not followed by `=`.
    ExpectedEqualAfterBang,
    /// Character that cannot start any token.
    UnexpectedCharacter(char),
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedString => {
                write!(f, "unterminated string literal")
            }
            Self::UnterminatedComment => {
                write!(f, "unterminated block comment")
            }
            Self::MalformedExponent => {
                write!(f, "malformed numeric literal: missing exponent digits")
            }
            Self::ExpectedEqualAfterBang => {
                write!(f, "expected '=' after '!'")
            }
            Self::UnexpectedCharacter(ch) => {
                write!(f, "unexpected character: {ch:?}")
            }
        }
    }
}

/// Error produced when a token stream contains an error token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", span.line, span.column)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

impl LexError {
    /// The error carried by `token`, if it is an error token.
    #[must_use]
    pub const fn from_token(token: &Token<'_>) -> Option<Self> {
        match token.kind {
            TokenKind::Error(kind) => Some(Self {
                kind,
                span: token.span,
            }),
            _ => None,
        }
    }
}

/// Tokenize a whole statement.
///
/// The returned tokens borrow from `input` and do not include the final
/// EOF token.
///
/// # Errors
///
/// Returns `LexError` for the first error token in the stream.
pub fn tokenize(input: &str) -> Result<Vec<Token<'_>>, LexError> {
    let mut tokens = Vec::new();
    for token in Lexer::new(input).tokens() {
        if let Some(err) = LexError::from_token(&token) {
            return Err(err);
        }
        if token.is_eof() {
            break;
        }
        tokens.push(token);
    }
    Ok(tokens)
}

/// Pull-based SQL tokenizer.
///
/// The lexer is the scan cursor itself: a borrowed source plus three
/// offsets. It is [`Copy`], which is what [`Lexer::peek_token`] relies on
/// to scan ahead without disturbing the real cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexer<'src> {
    src: &'src str,
    pos: usize,
    line_start: usize,
    line: usize,
}

impl<'src> Lexer<'src> {
    /// Create a lexer positioned at the first character of `src`, line 1,
    /// column 1. A leading byte order mark is skipped.
    #[must_use]
    pub fn new(src: &'src str) -> Self {
        let start = if src.starts_with('\u{FEFF}') { 3 } else { 0 };
        Self {
            src,
            pos: start,
            line_start: start,
            line: 1,
        }
    }

    /// Byte offset of the cursor.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    #[must_use]
    pub const fn line(&self) -> usize {
        self.line
    }

    #[must_use]
    pub const fn column(&self) -> usize {
        self.pos - self.line_start + 1
    }

    #[must_use]
    pub const fn is_at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    /// Scan the next token and advance past it.
    ///
    /// Once the input is exhausted every call returns an EOF token at the
    /// same position. Malformed input produces an error token; the cursor
    /// is left after the offending text so scanning may continue.
    pub fn next_token(&mut self) -> Token<'src> {
        if let Some(err) = self.skip_trivia() {
            return err;
        }

        let start = self.pos;
        let span = self.span();

        let Some(c) = self.advance() else {
            return self.make_token(TokenKind::Eof, start, span);
        };

        let kind = match c {
            b'A'..=b'Z' | b'a'..=b'z' | b'_' | b'$' => self.identifier(start),
            b'0'..=b'9' => self.number(),
            b'\'' | b'"' => self.string(c),
            b'*' => TokenKind::Star,
            b',' => TokenKind::Comma,
            b';' => TokenKind::Semicolon,
            b'.' => TokenKind::Dot,
            b'(' => TokenKind::LeftParen,
            b')' => TokenKind::RightParen,
            b'{' => TokenKind::LeftBrace,
            b'}' => TokenKind::RightBrace,
            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'/' => TokenKind::Slash,
            b'%' => TokenKind::Percent,
            b'=' => TokenKind::Equal,
            b'!' => {
                if self.eat(b'=') {
                    TokenKind::NotEqual
                } else {
                    TokenKind::Error(LexErrorKind::ExpectedEqualAfterBang)
                }
            }
            b'<' => {
                if self.eat(b'=') {
                    TokenKind::LessEqual
                } else if self.eat(b'>') {
                    TokenKind::NotEqual
                } else {
                    TokenKind::Less
                }
            }
            b'>' => {
                if self.eat(b'=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                }
            }
            _ => self.unexpected(start, c),
        };

        self.make_token(kind, start, span)
    }

    /// Scan the next token on a copy of the cursor, leaving `self` as is.
    #[must_use]
    pub fn peek_token(&self) -> Token<'src> {
        let mut ahead = *self;
        ahead.next_token()
    }

    /// Iterate over the remaining tokens, up to and including the first
    /// EOF or error token.
    #[must_use]
    pub const fn tokens(self) -> Tokens<'src> {
        Tokens {
            lexer: self,
            done: false,
        }
    }

    const fn span(&self) -> Span {
        Span {
            line: self.line,
            column: self.column(),
        }
    }

    fn make_token(&self, kind: TokenKind, start: usize, span: Span) -> Token<'src> {
        Token {
            kind,
            text: &self.src[start..self.pos],
            offset: start,
            span,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.line_start = self.pos;
        }
        Some(b)
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_while(&mut self, pred: impl Fn(u8) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.advance();
        }
    }

    /// Skip whitespace and comments in any order. Returns an error token
    /// if a block comment runs to end of input.
    fn skip_trivia(&mut self) -> Option<Token<'src>> {
        loop {
            match (self.peek(), self.peek_next()) {
                (Some(b' ' | b'\t' | b'\r' | b'\n'), _) => {
                    self.advance();
                }
                (Some(b'-'), Some(b'-')) => {
                    // The newline is left for the whitespace arm.
                    self.eat_while(|b| b != b'\n');
                }
                (Some(b'/'), Some(b'*')) => {
                    if let Some(err) = self.skip_block_comment() {
                        return Some(err);
                    }
                }
                _ => return None,
            }
        }
    }

    /// Block comments nest: each `/*` opens a level, each `*/` closes one.
    fn skip_block_comment(&mut self) -> Option<Token<'src>> {
        let start = self.pos;
        let span = self.span();
        self.advance();
        self.advance();

        let mut depth = 1usize;
        while depth > 0 {
            match (self.peek(), self.peek_next()) {
                (None, _) => {
                    let kind = TokenKind::Error(LexErrorKind::UnterminatedComment);
                    return Some(self.make_token(kind, start, span));
                }
                (Some(b'/'), Some(b'*')) => {
                    self.advance();
                    self.advance();
                    depth += 1;
                }
                (Some(b'*'), Some(b'/')) => {
                    self.advance();
                    self.advance();
                    depth -= 1;
                }
                _ => {
                    self.advance();
                }
            }
        }
        None
    }

    fn identifier(&mut self, start: usize) -> TokenKind {
        self.eat_while(is_ident_continue);
        let src = self.src;
        let text = &src[start..self.pos];
        if text == "ORDER" && self.eat_by_after_order() {
            return TokenKind::OrderBy;
        }
        keyword(text).unwrap_or(TokenKind::Identifier)
    }

    /// Having just scanned `ORDER`, consume `<spaces>BY` if it follows.
    /// Nothing is consumed when the lookahead fails.
    fn eat_by_after_order(&mut self) -> bool {
        let mut ahead = *self;
        let gap = ahead.pos;
        ahead.eat_while(|b| b == b' ' || b == b'\t');
        if ahead.pos == gap {
            return false;
        }
        let word = ahead.pos;
        ahead.eat_while(is_ident_continue);
        if &ahead.src[word..ahead.pos] == "BY" {
            *self = ahead;
            true
        } else {
            false
        }
    }

    fn number(&mut self) -> TokenKind {
        self.eat_while(|b| b.is_ascii_digit());

        if self.peek() == Some(b'.') && self.peek_next().is_some_and(|b| b.is_ascii_digit()) {
            self.advance();
            self.eat_while(|b| b.is_ascii_digit());
        }

        if matches!(self.peek(), Some(b'e' | b'E')) {
            self.advance();
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.advance();
            }
            if !self.peek().is_some_and(|b| b.is_ascii_digit()) {
                return TokenKind::Error(LexErrorKind::MalformedExponent);
            }
            self.eat_while(|b| b.is_ascii_digit());
        }

        TokenKind::Number
    }

    /// The opening quote has been consumed. A backslash takes the next
    /// character verbatim, quote or newline included.
    fn string(&mut self, quote: u8) -> TokenKind {
        loop {
            match self.advance() {
                None => return TokenKind::Error(LexErrorKind::UnterminatedString),
                Some(b'\\') => {
                    if self.advance().is_none() {
                        return TokenKind::Error(LexErrorKind::UnterminatedString);
                    }
                }
                Some(b) if b == quote => return TokenKind::String,
                Some(_) => {}
            }
        }
    }

    /// Consume the rest of a multi-byte character so the lexeme stays a
    /// valid slice.
    fn unexpected(&mut self, start: usize, first: u8) -> TokenKind {
        let ch = self.src[start..]
            .chars()
            .next()
            .unwrap_or_else(|| char::from(first));
        self.pos = start + ch.len_utf8();
        TokenKind::Error(LexErrorKind::UnexpectedCharacter(ch))
    }
}

const fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// Iterator over a lexer's tokens. Yields the terminal EOF or error
/// token once, then stops.
///
/// Error tokens are logged here, where they are consumed, so peeking
/// never reports the same error twice.
#[derive(Debug, Clone)]
pub struct Tokens<'src> {
    lexer: Lexer<'src>,
    done: bool,
}

impl<'src> Iterator for Tokens<'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let token = self.lexer.next_token();
        if let TokenKind::Error(err) = token.kind {
            tracing::debug!(
                line = token.span.line,
                column = token.span.column,
                lexeme = token.text,
                "lexical error: {err}"
            );
        }
        self.done = token.is_terminal();
        Some(token)
    }
}

impl FusedIterator for Tokens<'_> {}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input).tokens().map(|t| t.kind).collect()
    }

    #[test]
    fn simple_select() {
        let tokens = tokenize("SELECT name FROM users").expect("should tokenize");
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[0].kind, TokenKind::Select);
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].text, "name");
        assert_eq!(tokens[3].text, "users");
    }

    #[test]
    fn keywords_are_case_sensitive() {
        assert_eq!(
            kinds("select SELECT Select"),
            [
                TokenKind::Identifier,
                TokenKind::Select,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn identifier_charset() {
        let tokens = tokenize("_tmp $var a1_$").expect("should tokenize");
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Identifier));
        assert_eq!(tokens[2].text, "a1_$");
    }

    #[test]
    fn operators_longest_match() {
        assert_eq!(
            kinds("< <= <> > >= = !="),
            [
                TokenKind::Less,
                TokenKind::LessEqual,
                TokenKind::NotEqual,
                TokenKind::Greater,
                TokenKind::GreaterEqual,
                TokenKind::Equal,
                TokenKind::NotEqual,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn punctuation() {
        assert_eq!(
            kinds("*,;.(){}+-/%"),
            [
                TokenKind::Star,
                TokenKind::Comma,
                TokenKind::Semicolon,
                TokenKind::Dot,
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Slash,
                TokenKind::Percent,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn lone_bang() {
        let mut lexer = Lexer::new("!x");
        let token = lexer.next_token();
        assert_eq!(
            token.kind,
            TokenKind::Error(LexErrorKind::ExpectedEqualAfterBang)
        );
        assert_eq!(token.text, "!");
        assert_eq!(lexer.next_token().text, "x");
    }

    #[test]
    fn numbers() {
        let tokens = tokenize("42 3.14 1e10 2.5E-3 7e+1").expect("should tokenize");
        let texts: Vec<_> = tokens.iter().map(|t| t.text).collect();
        assert_eq!(texts, ["42", "3.14", "1e10", "2.5E-3", "7e+1"]);
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Number));
    }

    #[test]
    fn number_followed_by_dot_without_digit() {
        assert_eq!(
            kinds("1.a"),
            [
                TokenKind::Number,
                TokenKind::Dot,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn malformed_exponent() {
        let mut lexer = Lexer::new("1e+ 2");
        let token = lexer.next_token();
        assert_eq!(token.kind, TokenKind::Error(LexErrorKind::MalformedExponent));
        assert_eq!(token.text, "1e+");
        assert_eq!(lexer.next_token().text, "2");
    }

    #[test]
    fn strings_with_either_quote() {
        let tokens = tokenize(r#"'single' "double" 'say "hi"'"#).expect("should tokenize");
        assert_eq!(tokens.len(), 3);
        assert!(tokens.iter().all(|t| t.kind == TokenKind::String));
        assert_eq!(tokens[2].text, r#"'say "hi"'"#);
    }

    #[test]
    fn string_escape_keeps_quote() {
        let tokens = tokenize(r"'it\'s'").expect("should tokenize");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, r"'it\'s'");
    }

    #[test]
    fn string_with_newline_tracks_lines() {
        let mut lexer = Lexer::new("'a\nb' x");
        let string = lexer.next_token();
        assert_eq!(string.kind, TokenKind::String);
        let x = lexer.next_token();
        assert_eq!(x.span, Span { line: 2, column: 4 });
    }

    #[test]
    fn unterminated_string() {
        let err = tokenize("'unclosed").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
        assert_eq!(err.span, Span { line: 1, column: 1 });
    }

    #[test]
    fn trailing_backslash_is_unterminated() {
        let token = Lexer::new("'abc\\").next_token();
        assert_eq!(token.kind, TokenKind::Error(LexErrorKind::UnterminatedString));
        assert_eq!(token.text, "'abc\\");
    }

    #[test]
    fn line_comment() {
        let tokens = tokenize("SELECT -- pick\n1").expect("should tokenize");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].span.line, 2);
    }

    #[test]
    fn single_minus_is_operator() {
        assert_eq!(
            kinds("a - b"),
            [
                TokenKind::Identifier,
                TokenKind::Minus,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn block_comment_across_lines() {
        let tokens = tokenize("/* one\ntwo */ SELECT").expect("should tokenize");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].span, Span { line: 2, column: 8 });
    }

    #[test]
    fn block_comments_nest() {
        let tokens = tokenize("/* a /* b */ still comment */ 1").expect("should tokenize");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "1");
    }

    #[test]
    fn unterminated_block_comment() {
        let mut lexer = Lexer::new("1 /* open /* */");
        assert_eq!(lexer.next_token().kind, TokenKind::Number);
        let token = lexer.next_token();
        assert_eq!(
            token.kind,
            TokenKind::Error(LexErrorKind::UnterminatedComment)
        );
        assert_eq!(token.text, "/* open /* */");
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    }

    #[test]
    fn unexpected_multibyte_character() {
        let mut lexer = Lexer::new("é1");
        let token = lexer.next_token();
        assert_eq!(
            token.kind,
            TokenKind::Error(LexErrorKind::UnexpectedCharacter('é'))
        );
        assert_eq!(token.text, "é");
        assert_eq!(lexer.next_token().text, "1");
    }

    #[test]
    fn order_by() {
        let tokens = tokenize("ORDER  BY id").expect("should tokenize");
        assert_eq!(tokens[0].kind, TokenKind::OrderBy);
        assert_eq!(tokens[0].text, "ORDER  BY");
        assert_eq!(tokens[1].text, "id");
    }

    #[test]
    fn order_without_by() {
        assert_eq!(
            kinds("ORDER BYE ORDER"),
            [
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
        assert_eq!(kinds("ORDERBY"), [TokenKind::Identifier, TokenKind::Eof]);
    }

    #[test]
    fn bom_stripping() {
        let tokens = tokenize("\u{FEFF}SELECT").expect("should tokenize");
        assert_eq!(tokens[0].kind, TokenKind::Select);
        assert_eq!(tokens[0].span.column, 1);
    }

    #[test]
    fn eof_is_idempotent() {
        let mut lexer = Lexer::new("x  ");
        lexer.next_token();
        let first = lexer.next_token();
        let second = lexer.next_token();
        assert!(first.is_eof());
        assert_eq!(first, second);
        assert_eq!(first.span, Span { line: 1, column: 4 });
    }

    #[test]
    fn peek_does_not_advance() {
        let mut lexer = Lexer::new("a b");
        let peeked = lexer.peek_token();
        assert_eq!(lexer.peek_token(), peeked);
        assert_eq!(lexer.position(), 0);
        assert_eq!(lexer.next_token(), peeked);
        assert_eq!(lexer.peek_token().text, "b");
    }

    #[test]
    fn tokens_iterator_stops_after_error() {
        assert_eq!(
            kinds("a # b"),
            [
                TokenKind::Identifier,
                TokenKind::Error(LexErrorKind::UnexpectedCharacter('#'))
            ]
        );
    }

    #[test]
    fn span_tracking() {
        let tokens = tokenize("a\n  bc d").expect("should tokenize");
        assert_eq!(tokens[0].span, Span { line: 1, column: 1 });
        assert_eq!(tokens[1].span, Span { line: 2, column: 3 });
        assert_eq!(tokens[2].span, Span { line: 2, column: 6 });
        assert_eq!(tokens[2].offset, 7);
    }

    #[test]
    fn lex_error_display() {
        let err = tokenize("SELECT\n  @").unwrap_err();
        assert_eq!(
            err.to_string(),
            "unexpected character: '@' at line 2, column 3"
        );
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn captured_logs(f: impl FnOnce()) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = captured.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn peeked_error_is_logged_once() {
        let logs = captured_logs(|| {
            let lexer = Lexer::new("a ! b");
            let mut tokens = lexer.tokens();
            tokens.next();
            let mut copy = lexer;
            copy.next_token();
            copy.peek_token();
            copy.peek_token();
            assert_eq!(tokens.count(), 1);
        });
        assert_eq!(logs.matches("lexical error").count(), 1, "{logs}");
        assert!(logs.contains("expected '=' after '!'"));
    }

    #[test]
    fn unterminated_comment_is_logged() {
        let logs = captured_logs(|| {
            assert_eq!(Lexer::new("/* open").tokens().count(), 1);
        });
        assert!(logs.contains("unterminated block comment"), "{logs}");
    }
}
