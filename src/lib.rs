//! SQL tokenizer and token-echo shell for a toy SQLite-like database.
//!
//! The [`Lexer`] turns a source string into typed [`Token`]s one at a
//! time. Tokens borrow their lexeme from the source, so scanning never
//! copies or allocates. Malformed input comes back as an error token
//! instead of aborting the scan.
//!
//! # Quick start
//!
//! ## Pull tokens one at a time
//!
//! ```
//! use toy_sqlite::{Lexer, TokenKind};
//!
//! let mut lexer = Lexer::new("SELECT * FROM users;");
//! assert_eq!(lexer.peek_token().kind, TokenKind::Select);
//! assert_eq!(lexer.next_token().kind, TokenKind::Select);
//! assert_eq!(lexer.next_token().kind, TokenKind::Star);
//!
//! let users = lexer.tokens().nth(1).unwrap();
//! assert_eq!(users.kind, TokenKind::Identifier);
//! assert_eq!(users.text, "users");
//! ```
//!
//! ## Tokenize a whole statement
//!
//! ```
//! use toy_sqlite::{LexErrorKind, tokenize};
//!
//! let tokens = tokenize("a <> b").unwrap();
//! assert_eq!(tokens.len(), 3);
//!
//! let err = tokenize("SELECT 'unterminated").unwrap_err();
//! assert_eq!(err.kind, LexErrorKind::UnterminatedString);
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod lexer;
pub mod shell;
pub mod token;

pub use lexer::{LexError, LexErrorKind, Lexer, Tokens, tokenize};
pub use shell::{Command, DEFAULT_PROMPT, Shell, ShellConfig};
pub use token::{KEYWORDS, Span, Token, TokenKind, keyword};

/// Unified error type covering lexing and shell I/O.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A lexer error.
    #[error("{0}")]
    Lex(#[from] LexError),
    /// Reading input or writing output failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
