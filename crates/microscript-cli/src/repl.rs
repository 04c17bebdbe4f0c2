//! Line-editing REPL over a persistent [`Interpreter`]

use anyhow::{Context, Result};
use microscript::{EvalContext, Interpreter, StdoutSink};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;

const PROMPT: &str = ">>> ";
const CONTINUATION_PROMPT: &str = "... ";

const HELP_TEXT: &str = "\
MicroScript REPL

Enter statements to run them; bindings persist between entries.
A line ending in ':' opens a block, finished by an empty line.

  :vars    show global variables
  :help    show this text
  :quit    leave (also Ctrl-D)";

/// What a completed line asks the REPL to do.
#[derive(Debug, PartialEq, Eq)]
enum Action {
    Run(String),
    Vars,
    Help,
    Quit,
    Nothing,
}

/// Accumulates input lines until a complete snippet is available.
#[derive(Debug, Default)]
struct LineBuffer {
    lines: Vec<String>,
}

impl LineBuffer {
    fn is_continuing(&self) -> bool {
        !self.lines.is_empty()
    }

    fn push(&mut self, line: &str) -> Action {
        if self.is_continuing() {
            if line.trim().is_empty() {
                return Action::Run(self.take());
            }
            self.lines.push(line.to_string());
            return Action::Nothing;
        }

        let trimmed = line.trim();
        match trimmed {
            "" => Action::Nothing,
            ":quit" | ":q" => Action::Quit,
            ":help" | ":h" => Action::Help,
            ":vars" | ":v" => Action::Vars,
            _ if opens_block(line) => {
                self.lines.push(line.to_string());
                Action::Nothing
            }
            _ => Action::Run(line.to_string()),
        }
    }

    fn take(&mut self) -> String {
        std::mem::take(&mut self.lines).join("\n")
    }
}

/// Whether `line` ends in a block-opening `:` (ignoring a trailing comment).
fn opens_block(line: &str) -> bool {
    let code = match line.find('#') {
        Some(idx) if !line[..idx].contains('"') => &line[..idx],
        _ => line,
    };
    code.trim_end().ends_with(':')
}

fn show_vars(interp: &Interpreter) {
    let vars = interp.runtime().variables_snapshot();
    if vars.is_empty() {
        println!("(no variables)");
    }
    for (name, value) in &vars {
        println!("{name} = {value}");
    }
}

/// Run the REPL until `:quit` or end of input.
pub fn run(ctx: EvalContext) -> Result<()> {
    println!("MicroScript v{}", microscript::VERSION);
    println!("Type :help for commands, :quit to exit.");

    let mut rl: Editor<(), DefaultHistory> =
        Editor::new().context("Failed to create editor")?;
    let filename = ctx.filename.clone();
    let mut interp = Interpreter::new(ctx);
    let mut buffer = LineBuffer::default();

    loop {
        let prompt = if buffer.is_continuing() {
            CONTINUATION_PROMPT
        } else {
            PROMPT
        };

        match rl.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    if let Err(e) = rl.add_history_entry(line.as_str()) {
                        tracing::warn!("Failed to add history entry: {}", e);
                    }
                }

                match buffer.push(&line) {
                    Action::Run(source) => {
                        if let Err(err) = interp.run(&source, &mut StdoutSink) {
                            eprintln!("{}", microscript::format_error(&err, &filename));
                        }
                    }
                    Action::Vars => show_vars(&interp),
                    Action::Help => println!("{HELP_TEXT}"),
                    Action::Quit => break,
                    Action::Nothing => {}
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                buffer.take();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                eprintln!("Error: {}", err);
                break;
            }
        }
    }

    Ok(())
}
