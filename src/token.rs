use std::borrow::Cow;
use std::fmt;

use crate::lexer::LexErrorKind;

/// Source location for display and error reporting.
///
/// Both fields are 1-based. `column` counts bytes from the start of the
/// line, so the first character of a line is column 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

/// Token kinds produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Keywords.
    Select,
    From,
    Where,
    Insert,
    Into,
    Values,
    Create,
    Table,
    Drop,
    Delete,
    Update,
    Set,
    Int,
    Text,
    Null,
    Between,
    Like,
    In,
    Limit,
    /// The two-word keyword `ORDER BY`.
    OrderBy,
    And,
    Or,
    Not,

    // Punctuation and operators.
    /// `*`
    Star,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `.`
    Dot,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `=`
    Equal,
    /// `<>` or `!=`
    NotEqual,
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `<=`
    LessEqual,
    /// `>=`
    GreaterEqual,

    // Literals.
    /// `[A-Za-z_$][A-Za-z0-9_$]*` that is not a keyword.
    Identifier,
    /// Single- or double-quoted string, quotes included in the lexeme.
    String,
    /// Integer or decimal, with an optional signed exponent.
    Number,

    /// End of input. Returned again on every call once reached.
    Eof,
    /// Malformed input; the lexeme spans the offending text.
    Error(LexErrorKind),
}

/// Keyword table, matched by exact length and content.
///
/// Matching is case-sensitive: `select` is an identifier. `ORDER BY` is
/// the only multi-word entry. Identifier runs never contain a space, so the
/// lexer never hands it to [`keyword`]; it looks past an `ORDER` run for
/// `BY` instead.
pub const KEYWORDS: &[(&str, TokenKind)] = &[
    ("SELECT", TokenKind::Select),
    ("FROM", TokenKind::From),
    ("WHERE", TokenKind::Where),
    ("INSERT", TokenKind::Insert),
    ("INTO", TokenKind::Into),
    ("VALUES", TokenKind::Values),
    ("CREATE", TokenKind::Create),
    ("TABLE", TokenKind::Table),
    ("DROP", TokenKind::Drop),
    ("DELETE", TokenKind::Delete),
    ("UPDATE", TokenKind::Update),
    ("SET", TokenKind::Set),
    ("INT", TokenKind::Int),
    ("TEXT", TokenKind::Text),
    ("NULL", TokenKind::Null),
    ("BETWEEN", TokenKind::Between),
    ("LIKE", TokenKind::Like),
    ("IN", TokenKind::In),
    ("LIMIT", TokenKind::Limit),
    ("ORDER BY", TokenKind::OrderBy),
    ("AND", TokenKind::And),
    ("OR", TokenKind::Or),
    ("NOT", TokenKind::Not),
];

/// Look up an identifier-shaped run in the keyword table.
#[must_use]
pub fn keyword(text: &str) -> Option<TokenKind> {
    KEYWORDS
        .iter()
        .find(|(kw, _)| kw.len() == text.len() && *kw == text)
        .map(|&(_, kind)| kind)
}

impl TokenKind {
    /// Fixed display label for this kind.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::From => "FROM",
            Self::Where => "WHERE",
            Self::Insert => "INSERT",
            Self::Into => "INTO",
            Self::Values => "VALUES",
            Self::Create => "CREATE",
            Self::Table => "TABLE",
            Self::Drop => "DROP",
            Self::Delete => "DELETE",
            Self::Update => "UPDATE",
            Self::Set => "SET",
            Self::Int => "INT",
            Self::Text => "TEXT",
            Self::Null => "NULL",
            Self::Between => "BETWEEN",
            Self::Like => "LIKE",
            Self::In => "IN",
            Self::Limit => "LIMIT",
            Self::OrderBy => "ORDER BY",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
            Self::Star => "*",
            Self::Comma => ",",
            Self::Semicolon => ";",
            Self::Dot => ".",
            Self::LeftParen => "(",
            Self::RightParen => ")",
            Self::LeftBrace => "{",
            Self::RightBrace => "}",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::Equal => "=",
            Self::NotEqual => "<>",
            Self::Less => "<",
            Self::Greater => ">",
            Self::LessEqual => "<=",
            Self::GreaterEqual => ">=",
            Self::Identifier => "IDENTIFIER",
            Self::String => "STRING",
            Self::Number => "NUMBER",
            Self::Eof => "EOF",
            Self::Error(_) => "ERROR",
        }
    }

    #[must_use]
    pub const fn is_keyword(self) -> bool {
        matches!(
            self,
            Self::Select
                | Self::From
                | Self::Where
                | Self::Insert
                | Self::Into
                | Self::Values
                | Self::Create
                | Self::Table
                | Self::Drop
                | Self::Delete
                | Self::Update
                | Self::Set
                | Self::Int
                | Self::Text
                | Self::Null
                | Self::Between
                | Self::Like
                | Self::In
                | Self::Limit
                | Self::OrderBy
                | Self::And
                | Self::Or
                | Self::Not
        )
    }

    /// Identifiers, strings, numbers and `NULL`.
    #[must_use]
    pub const fn is_literal(self) -> bool {
        matches!(
            self,
            Self::Identifier | Self::String | Self::Number | Self::Null
        )
    }

    /// Punctuation, comparison operators, and the keyword operators
    /// `AND`, `OR`, `NOT`, `BETWEEN`, `LIKE` and `IN`.
    #[must_use]
    pub const fn is_operator(self) -> bool {
        matches!(
            self,
            Self::Star
                | Self::Comma
                | Self::Semicolon
                | Self::Dot
                | Self::LeftParen
                | Self::RightParen
                | Self::LeftBrace
                | Self::RightBrace
                | Self::Plus
                | Self::Minus
                | Self::Slash
                | Self::Percent
                | Self::Equal
                | Self::NotEqual
                | Self::Less
                | Self::Greater
                | Self::LessEqual
                | Self::GreaterEqual
                | Self::Between
                | Self::Like
                | Self::In
        ) || self.is_logical()
    }

    /// `AND`, `OR` and `NOT`.
    #[must_use]
    pub const fn is_logical(self) -> bool {
        matches!(self, Self::And | Self::Or | Self::Not)
    }

    #[must_use]
    pub const fn is_error(self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// EOF or error: the kinds that end a token stream.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Eof | Self::Error(_))
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single token: its kind, the lexeme borrowed from the source, and
/// where that lexeme starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    /// The lexeme, a slice of the buffer the lexer was built over.
    pub text: &'src str,
    /// Byte offset of `text` in the source buffer.
    pub offset: usize,
    pub span: Span,
}

impl<'src> Token<'src> {
    /// Length of the lexeme in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.text.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    #[must_use]
    pub const fn is_keyword(&self) -> bool {
        self.kind.is_keyword()
    }

    #[must_use]
    pub const fn is_literal(&self) -> bool {
        self.kind.is_literal()
    }

    #[must_use]
    pub const fn is_operator(&self) -> bool {
        self.kind.is_operator()
    }

    #[must_use]
    pub const fn is_logical(&self) -> bool {
        self.kind.is_logical()
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.kind.is_error()
    }

    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.kind.is_terminal()
    }

    /// Whether this token is of the given kind.
    #[must_use]
    pub fn matches(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// Whether the lexeme is exactly `text`.
    #[must_use]
    pub fn text_eq(&self, text: &str) -> bool {
        self.text == text
    }

    /// Contents of a string literal with the quotes stripped and every
    /// `\x` escape replaced by `x`.
    ///
    /// Returns `None` for any other kind of token.
    #[must_use]
    pub fn string_value(&self) -> Option<Cow<'src, str>> {
        if self.kind != TokenKind::String || self.text.len() < 2 {
            return None;
        }
        let inner = &self.text[1..self.text.len() - 1];
        if !inner.contains('\\') {
            return Some(Cow::Borrowed(inner));
        }

        let mut value = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                if let Some(escaped) = chars.next() {
                    value.push(escaped);
                }
            } else {
                value.push(c);
            }
        }
        Some(Cow::Owned(value))
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}: '{}'] at {}:{}",
            self.kind, self.text, self.span.line, self.span.column
        )?;
        if let TokenKind::Error(kind) = self.kind {
            write!(f, " ({kind})")?;
        }
        Ok(())
    }
}
