//! Interactive shell that tokenizes SQL and echoes the tokens.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use toy_sqlite::{DEFAULT_PROMPT, Error, Shell, ShellConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Prompt shown before each input line
    #[arg(long, default_value = DEFAULT_PROMPT)]
    prompt: String,

    /// Do not print the welcome banner
    #[arg(long)]
    no_banner: bool,

    /// Tokenize a single statement and exit
    #[arg(short, long, value_name = "SQL")]
    command: Option<String>,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut stdout = io::stdout().lock();

    if let Some(sql) = &cli.command {
        return match Shell::execute(sql, &mut stdout) {
            Ok(()) => ExitCode::SUCCESS,
            Err(Error::Lex(e)) => {
                eprintln!("error: {e}");
                ExitCode::FAILURE
            }
            Err(e) => {
                eprintln!("error: {e}");
                ExitCode::from(2)
            }
        };
    }

    let config = ShellConfig {
        prompt: cli.prompt,
        banner: !cli.no_banner,
    };
    let mut shell = Shell::new(config);
    let mut stdin = io::stdin().lock();

    if let Err(e) = shell.run(&mut stdin, &mut stdout) {
        eprintln!("error: {e}");
        return ExitCode::from(2);
    }

    ExitCode::from(shell.exit_code())
}
