//! Interactive shell that echoes the token stream of each input line.
//!
//! The shell is generic over its input and output so it can be driven by
//! stdin/stdout or by in-memory buffers.

use std::io::{self, BufRead, Write};

use crate::Error;
use crate::lexer::{LexError, Lexer};

/// Prompt used when none is configured.
pub const DEFAULT_PROMPT: &str = "toy-sqlite > ";

const TOKENS_PROMPT: &str = "test> ";

const HELP: &str = "\
Special commands:
.exit   - quit the shell
.help   - show this help
.tokens - read one more line and show its tokens
.tables - list tables (not implemented yet)

SQL commands (partially supported):
CREATE TABLE ...
INSERT INTO ...
SELECT ...
";

/// Shell settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    pub prompt: String,
    /// Print the welcome banner when the loop starts.
    pub banner: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            banner: true,
        }
    }
}

/// One line of input, classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// Blank line.
    Empty,
    /// `.exit`
    Exit,
    /// `.help`
    Help,
    /// `.tokens`
    Tokens,
    /// Anything else, handed to the tokenizer with leading blanks removed.
    Sql(&'a str),
}

impl<'a> Command<'a> {
    #[must_use]
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim_start_matches([' ', '\t']);
        match line.trim_end() {
            "" => Self::Empty,
            ".exit" => Self::Exit,
            ".help" => Self::Help,
            ".tokens" => Self::Tokens,
            _ => Self::Sql(line),
        }
    }
}

/// Read-eval-print loop state.
#[derive(Debug)]
pub struct Shell {
    config: ShellConfig,
    running: bool,
    exit_code: u8,
}

impl Shell {
    #[must_use]
    pub const fn new(config: ShellConfig) -> Self {
        Self {
            config,
            running: true,
            exit_code: 0,
        }
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.exit_code
    }

    /// Run the loop until `.exit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: &mut R, out: &mut W) -> Result<(), Error> {
        if self.config.banner {
            writeln!(out, "Welcome to toy-sqlite!")?;
            writeln!(out, "Enter '.help' for usage hints, '.exit' to quit.")?;
            writeln!(out)?;
        }

        while self.running {
            let Some(line) = prompt_line(input, out, &self.config.prompt)? else {
                writeln!(out)?;
                break;
            };
            self.process_command(&line, input, out)?;
        }

        tracing::debug!(exit_code = self.exit_code, "shell loop finished");
        Ok(())
    }

    /// Dispatch one line. `.tokens` reads its statement from `input`.
    pub fn process_command<R: BufRead, W: Write>(
        &mut self,
        line: &str,
        input: &mut R,
        out: &mut W,
    ) -> Result<(), Error> {
        let command = Command::parse(line);
        tracing::debug!(?command, "dispatching");

        match command {
            Command::Empty => {}
            Command::Exit => {
                writeln!(out, "Bye.")?;
                self.running = false;
                self.exit_code = 0;
            }
            Command::Help => {
                out.write_all(HELP.as_bytes())?;
            }
            Command::Tokens => {
                writeln!(out, "Enter a SQL statement to tokenize:")?;
                let sql = prompt_line(input, out, TOKENS_PROMPT)?.unwrap_or_default();
                if !sql.is_empty() {
                    writeln!(out, "Tokens:")?;
                    write_tokens(&sql, out)?;
                }
            }
            Command::Sql(sql) => {
                writeln!(out, "Tokenizing: '{sql}'")?;
                write_tokens(sql, out)?;
                writeln!(out, "(parser not implemented yet)")?;
            }
        }
        Ok(())
    }

    /// Print the tokens of one statement.
    ///
    /// Every token is printed, the terminal one included.
    ///
    /// # Errors
    ///
    /// Returns `Error::Lex` when the stream ended with an error token, and
    /// `Error::Io` when writing fails.
    pub fn execute<W: Write>(sql: &str, out: &mut W) -> Result<(), Error> {
        match write_tokens(sql, out)? {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }
}

/// Write every token of `sql` on one line, separated by spaces. Returns
/// the lexical error that ended the stream, if any.
fn write_tokens<W: Write>(sql: &str, out: &mut W) -> io::Result<Option<LexError>> {
    let mut error = None;
    for token in Lexer::new(sql).tokens() {
        tracing::trace!(%token, "token");
        write!(out, "{token} ")?;
        error = LexError::from_token(&token);
    }
    writeln!(out)?;
    Ok(error)
}

/// Print `prompt` and read one line without its line ending. `None` at end
/// of input. Bytes that are not valid UTF-8 become U+FFFD.
fn prompt_line<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    prompt: &str,
) -> io::Result<Option<String>> {
    write!(out, "{prompt}")?;
    out.flush()?;

    let mut buf = Vec::new();
    if input.read_until(b'\n', &mut buf)? == 0 {
        return Ok(None);
    }
    let mut line = String::from_utf8_lossy(&buf).into_owned();
    let len = line.trim_end_matches(['\n', '\r']).len();
    line.truncate(len);
    Ok(Some(line))
}
