//! `microscript` command-line front end
//!
//! Runs scripts, hosts a line-editing REPL and drives the debugger from an
//! interactive prompt. Diagnostics go to stderr; program output goes to
//! stdout.

mod debug;
mod repl;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use microscript::context::{DEFAULT_MAX_CALL_DEPTH, DEFAULT_MAX_LOOP_ITERATIONS};
use microscript::{format_error, parse, tokenize, EvalContext, Interpreter, StdoutSink};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a script to completion
    Run {
        /// Script to run
        file: PathBuf,

        #[command(flatten)]
        limits: Limits,
    },

    /// Start an interactive session
    Repl {
        #[command(flatten)]
        limits: Limits,
    },

    /// Debug a script from an interactive prompt
    Debug {
        /// Script to debug
        file: PathBuf,

        /// Set a breakpoint on LINE before starting (repeatable)
        #[arg(short = 'b', long = "break", value_name = "LINE")]
        breakpoints: Vec<usize>,

        /// Print every debugger state as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        limits: Limits,
    },

    /// Dump the token stream
    Tokens {
        /// Script to tokenize
        file: PathBuf,
    },

    /// Dump the parsed syntax tree
    Ast {
        /// Script to parse
        file: PathBuf,
    },
}

#[derive(Args, Debug, Clone, Copy)]
struct Limits {
    /// Iterations one `while` loop may run before it is stopped
    #[arg(long, default_value_t = DEFAULT_MAX_LOOP_ITERATIONS)]
    max_loop_iterations: usize,

    /// Maximum depth of nested function calls
    #[arg(long, default_value_t = DEFAULT_MAX_CALL_DEPTH)]
    max_call_depth: usize,
}

impl Limits {
    fn context(self, filename: impl Into<String>) -> EvalContext {
        EvalContext::new()
            .with_max_loop_iterations(self.max_loop_iterations)
            .with_max_call_depth(self.max_call_depth)
            .with_filename(filename)
    }
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("microscript=debug"),
        _ => EnvFilter::new("microscript=trace"),
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true),
        )
        .with(filter)
        .init();
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn display_name(path: &Path) -> String {
    path.display().to_string()
}

fn run_file(file: &Path, limits: Limits) -> Result<ExitCode> {
    let source = read_source(file)?;
    let filename = display_name(file);
    let mut interp = Interpreter::new(limits.context(filename.clone()));

    match interp.run(&source, &mut StdoutSink) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            eprintln!("{}", format_error(&err, &filename));
            Ok(ExitCode::FAILURE)
        }
    }
}

fn dump_tokens(file: &Path) -> Result<ExitCode> {
    let source = read_source(file)?;
    match tokenize(&source) {
        Ok(tokens) => {
            for token in &tokens {
                println!(
                    "{:>4}:{:<4} {:<12} {}",
                    token.pos.line,
                    token.pos.column,
                    token.kind.to_string(),
                    token.text
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("{}", format_error(&err, &display_name(file)));
            Ok(ExitCode::FAILURE)
        }
    }
}

fn dump_ast(file: &Path) -> Result<ExitCode> {
    let source = read_source(file)?;
    let parsed = tokenize(&source)
        .map_err(microscript::MicroScriptError::from)
        .and_then(|tokens| parse(&tokens).map_err(Into::into));

    match parsed {
        Ok(program) => {
            for stmt in &program.statements {
                println!("{stmt:#?}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("{}", format_error(&err, &display_name(file)));
            Ok(ExitCode::FAILURE)
        }
    }
}

fn dispatch(command: Command) -> Result<ExitCode> {
    match command {
        Command::Run { file, limits } => run_file(&file, limits),
        Command::Repl { limits } => {
            repl::run(limits.context("<repl>"))?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Debug {
            file,
            breakpoints,
            json,
            limits,
        } => {
            let source = read_source(&file)?;
            let ctx = limits.context(display_name(&file));
            debug::run(ctx, &source, &breakpoints, json)
        }
        Command::Tokens { file } => dump_tokens(&file),
        Command::Ast { file } => dump_ast(&file),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    tracing::debug!(command = ?cli.command, "starting");

    match dispatch(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_debug_command() {
        let cli = Cli::parse_from([
            "microscript", "-vv", "debug", "prog.ms", "-b", "3", "--break", "7", "--json",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Debug {
                file,
                breakpoints,
                json,
                limits,
            } => {
                assert_eq!(file, PathBuf::from("prog.ms"));
                assert_eq!(breakpoints, vec![3, 7]);
                assert!(json);
                assert_eq!(limits.max_call_depth, DEFAULT_MAX_CALL_DEPTH);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_limits_map_onto_context() {
        let cli = Cli::parse_from([
            "microscript",
            "run",
            "a.ms",
            "--max-loop-iterations",
            "10",
            "--max-call-depth",
            "5",
        ]);
        let Command::Run { limits, .. } = cli.command else {
            panic!("expected run");
        };
        let ctx = limits.context("a.ms");
        assert_eq!(ctx.max_loop_iterations, 10);
        assert_eq!(ctx.max_call_depth, 5);
        assert_eq!(ctx.filename, "a.ms");
    }
}
