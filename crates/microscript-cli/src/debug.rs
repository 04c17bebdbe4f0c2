//! Interactive debugger prompt
//!
//! Reads commands with `rustyline` and forwards them to a [`Debugger`].
//! After every control command the resulting [`DebugState`] is shown, as
//! text or as one JSON document per line with `--json`.

use std::process::ExitCode;

use anyhow::{Context, Result};
use microscript::{format_error, DebugState, Debugger, EvalContext, RunStatus};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;

const PROMPT: &str = "(msdb) ";

const HELP_TEXT: &str = "\
Commands:
  c, continue    run until the next breakpoint or the end
  s, step        run one statement
  r, run         run to the end, ignoring breakpoints
  b N            set a breakpoint on line N
  d N            delete the breakpoint on line N
  bl             list breakpoints
  v, vars        show visible variables
  bt, stack      show the call stack
  l, list        show the source around the current line
  q, quit        leave the debugger
  h, help        show this text";

/// A parsed prompt command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DebugCommand {
    Continue,
    Step,
    Run,
    Break(usize),
    Delete(usize),
    ListBreakpoints,
    Vars,
    Stack,
    List,
    Quit,
    Help,
}

fn parse_line_number(arg: Option<&str>) -> Result<usize, String> {
    let arg = arg.ok_or_else(|| "missing line number".to_string())?;
    match arg.parse::<usize>() {
        Ok(0) | Err(_) => Err(format!("invalid line number: {arg}")),
        Ok(line) => Ok(line),
    }
}

/// Parse one prompt line. `Ok(None)` means an empty line.
fn parse_command(input: &str) -> Result<Option<DebugCommand>, String> {
    let mut words = input.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(None);
    };
    let arg = words.next();

    let command = match name {
        "c" | "continue" => DebugCommand::Continue,
        "s" | "step" => DebugCommand::Step,
        "r" | "run" => DebugCommand::Run,
        "b" | "break" => DebugCommand::Break(parse_line_number(arg)?),
        "d" | "delete" => DebugCommand::Delete(parse_line_number(arg)?),
        "bl" => DebugCommand::ListBreakpoints,
        "v" | "vars" => DebugCommand::Vars,
        "bt" | "stack" => DebugCommand::Stack,
        "l" | "list" => DebugCommand::List,
        "q" | "quit" => DebugCommand::Quit,
        "h" | "help" => DebugCommand::Help,
        other => return Err(format!("unknown command '{other}' (try 'help')")),
    };
    Ok(Some(command))
}

/// Text rendering of a debugger state.
fn render_state(state: &DebugState, filename: &str) -> String {
    let mut text = state.output.clone();
    let status = match state.status {
        RunStatus::Idle => "no program loaded".to_string(),
        RunStatus::Loaded => "program loaded, not started".to_string(),
        RunStatus::Paused { line, column } => {
            format!("paused at {filename}:{line}:{column}")
        }
        RunStatus::Finished => "program finished".to_string(),
        RunStatus::Failed => match &state.error {
            Some(error) => format!("program failed: {filename}: {error}"),
            None => "program failed".to_string(),
        },
    };
    text.push_str(&status);
    text
}

fn render_vars(state: &DebugState) -> String {
    if state.variables.is_empty() {
        return "(no variables)".to_string();
    }
    state
        .variables
        .iter()
        .map(|(name, value)| format!("  {name} = {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_stack(state: &DebugState) -> String {
    if state.callstack.is_empty() {
        return "(top level)".to_string();
    }
    state
        .callstack
        .iter()
        .enumerate()
        .map(|(depth, frame)| {
            let site = match (frame.line, frame.column) {
                (Some(line), Some(column)) => format!("{}:{line}:{column}", frame.filename),
                _ => frame.filename.clone(),
            };
            format!("  #{depth} {}() called from {site}", frame.function)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_breakpoints(state: &DebugState) -> String {
    let lines: Vec<String> = state
        .breakpoints
        .iter()
        .flat_map(|(file, lines)| lines.iter().map(move |line| format!("  {file}:{line}")))
        .collect();
    if lines.is_empty() {
        "(no breakpoints)".to_string()
    } else {
        lines.join("\n")
    }
}

/// Source lines around `line`, with the current one marked.
fn render_listing(source: &str, line: usize) -> String {
    let first = line.saturating_sub(3).max(1);
    source
        .lines()
        .enumerate()
        .map(|(idx, text)| (idx + 1, text))
        .skip(first - 1)
        .take(7)
        .map(|(number, text)| {
            let marker = if number == line { "->" } else { "  " };
            format!("{marker} {number:>4}  {text}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

struct Session<'a> {
    debugger: Debugger,
    source: &'a str,
    filename: String,
    json: bool,
}

impl Session<'_> {
    fn show(&self, state: &DebugState) -> Result<()> {
        if self.json {
            println!(
                "{}",
                serde_json::to_string(state).context("Failed to serialize debugger state")?
            );
        } else {
            println!("{}", render_state(state, &self.filename));
        }
        Ok(())
    }

    fn current_line(&self) -> Option<usize> {
        match self.debugger.status() {
            RunStatus::Paused { line, .. } => Some(line),
            _ => None,
        }
    }

    /// Execute one command; `Ok(false)` ends the session.
    fn execute(&mut self, command: DebugCommand) -> Result<bool> {
        let control = match command {
            DebugCommand::Continue => Some(self.debugger.continue_()),
            DebugCommand::Step => Some(self.debugger.step()),
            DebugCommand::Run => Some(self.debugger.run_to_end()),
            _ => None,
        };
        if let Some(result) = control {
            match result {
                Ok(state) => self.show(&state)?,
                Err(err) => eprintln!("{}", format_error(&err, &self.filename)),
            }
            return Ok(true);
        }

        match command {
            DebugCommand::Break(line) => {
                if self.debugger.add_breakpoint(line) {
                    println!("breakpoint set at {}:{line}", self.filename);
                } else {
                    println!("breakpoint already set at {}:{line}", self.filename);
                }
            }
            DebugCommand::Delete(line) => {
                if self.debugger.remove_breakpoint(line) {
                    println!("breakpoint removed from {}:{line}", self.filename);
                } else {
                    println!("no breakpoint at {}:{line}", self.filename);
                }
            }
            DebugCommand::ListBreakpoints => {
                println!("{}", render_breakpoints(&self.debugger.state()))
            }
            DebugCommand::Vars => {
                let state = self.debugger.state();
                if self.json {
                    self.show(&state)?;
                } else {
                    println!("{}", render_vars(&state));
                }
            }
            DebugCommand::Stack => {
                let state = self.debugger.state();
                if self.json {
                    self.show(&state)?;
                } else {
                    println!("{}", render_stack(&state));
                }
            }
            DebugCommand::List => match self.current_line() {
                Some(line) => println!("{}", render_listing(self.source, line)),
                None => println!("{}", render_listing(self.source, 1)),
            },
            DebugCommand::Help => println!("{HELP_TEXT}"),
            DebugCommand::Quit => return Ok(false),
            DebugCommand::Continue | DebugCommand::Step | DebugCommand::Run => {}
        }
        Ok(true)
    }
}

/// Load `source` and run the debugger prompt until `quit` or end of input.
///
/// A program that fails to lex or parse is reported and yields a failing
/// exit code without starting the prompt.
pub fn run(ctx: EvalContext, source: &str, breakpoints: &[usize], json: bool) -> Result<ExitCode> {
    let filename = ctx.filename.clone();
    let mut debugger = Debugger::new(ctx);
    if let Err(err) = debugger.load_source(source) {
        eprintln!("{}", format_error(&err, &filename));
        return Ok(ExitCode::FAILURE);
    }
    debugger.set_breakpoints(breakpoints.iter().copied());

    let mut session = Session {
        debugger,
        source,
        filename,
        json,
    };
    session.show(&session.debugger.state())?;

    let mut rl: Editor<(), DefaultHistory> =
        Editor::new().context("Failed to create editor")?;

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    if let Err(e) = rl.add_history_entry(line.as_str()) {
                        tracing::warn!("Failed to add history entry: {}", e);
                    }
                }

                match parse_command(&line) {
                    Ok(Some(command)) => {
                        tracing::debug!(?command, "debugger command");
                        if !session.execute(command)? {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(message) => eprintln!("{message}"),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Error: {}", err);
                break;
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
