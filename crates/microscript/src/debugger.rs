//! Interactive debugger over one runtime, evaluator and loaded program
//!
//! The debugger drives [`Evaluator::evaluate`] with breakpoints and step
//! mode. A paused program keeps its frames and its place: the next
//! `continue_`/`step` picks up at the paused statement without repeating
//! anything. Once a run has finished or failed, the next control operation
//! starts the program over with fresh globals.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::Serialize;

use crate::ast::Program;
use crate::context::EvalContext;
use crate::error::{EvalError, MicroScriptError};
use crate::eval::{Evaluator, Outcome};
use crate::lexer::tokenize;
use crate::parser::parse;
use crate::runtime::{FrameInfo, Runtime};
use crate::value::Value;

/// Where the loaded program stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum RunStatus {
    /// Nothing loaded yet
    Idle,

    /// Loaded, not started
    Loaded,

    /// Stopped before the statement at this position
    Paused {
        /// Line of the next statement
        line: usize,
        /// Column of the next statement
        column: usize,
    },

    /// Ran to completion
    Finished,

    /// Stopped by a runtime error
    Failed,
}

/// Everything a front end shows after a control operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugState {
    /// Current status
    pub status: RunStatus,

    /// Output printed by the last control operation only
    pub output: String,

    /// Error of a failed run
    pub error: Option<String>,

    /// Breakpoint lines by source name
    pub breakpoints: BTreeMap<String, Vec<usize>>,

    /// Visible variables, innermost scope winning
    pub variables: IndexMap<String, Value>,

    /// Active frames, innermost first
    pub callstack: Vec<FrameInfo>,
}

/// A debugging session for one program.
///
/// # Example
///
/// ```
/// use microscript::{Debugger, EvalContext, RunStatus};
///
/// let mut dbg = Debugger::new(EvalContext::new());
/// dbg.load_source("x = 1\ny = x + 1\nprint(y)").unwrap();
/// dbg.set_breakpoints([2]);
///
/// let state = dbg.continue_().unwrap();
/// assert_eq!(state.status, RunStatus::Paused { line: 2, column: 1 });
/// assert!(!state.variables.contains_key("y"));
///
/// let state = dbg.continue_().unwrap();
/// assert_eq!(state.status, RunStatus::Finished);
/// assert_eq!(state.output, "2\n");
/// ```
#[derive(Debug)]
pub struct Debugger {
    runtime: Runtime,
    evaluator: Evaluator,
    program: Option<Program>,
    status: RunStatus,
    last_output: String,
    last_error: Option<EvalError>,
}

impl Default for Debugger {
    fn default() -> Self {
        Self::new(EvalContext::default())
    }
}

impl Debugger {
    /// Create a debugger with nothing loaded.
    pub fn new(ctx: EvalContext) -> Self {
        Self {
            runtime: Runtime::new(&ctx),
            evaluator: Evaluator::new(ctx),
            program: None,
            status: RunStatus::Idle,
            last_output: String::new(),
            last_error: None,
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Loading
    // ═══════════════════════════════════════════════════════════════════

    /// Load a parsed program, discarding any previous run. Breakpoints are
    /// kept.
    pub fn load(&mut self, program: Program) {
        tracing::debug!(statements = program.len(), "debugger: load");
        self.program = Some(program);
        self.restart();
        self.status = RunStatus::Loaded;
    }

    /// Tokenize, parse and load `source`.
    ///
    /// # Errors
    ///
    /// Lex and parse errors; the previously loaded program stays loaded.
    pub fn load_source(&mut self, source: &str) -> Result<(), MicroScriptError> {
        let tokens = tokenize(source)?;
        let program = parse(&tokens)?;
        self.load(program);
        Ok(())
    }

    /// The loaded program.
    pub fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }

    /// Back to the freshly loaded state: fresh globals, no frames, no
    /// pending pause. Breakpoints are kept.
    pub fn reset(&mut self) {
        self.restart();
        self.status = if self.program.is_some() {
            RunStatus::Loaded
        } else {
            RunStatus::Idle
        };
        tracing::debug!("debugger: reset");
    }

    fn restart(&mut self) {
        self.evaluator.discard_suspended();
        self.runtime.reset();
        self.last_output.clear();
        self.last_error = None;
    }

    // ═══════════════════════════════════════════════════════════════════
    // Breakpoints
    // ═══════════════════════════════════════════════════════════════════

    /// Replace the breakpoints of the loaded source.
    pub fn set_breakpoints(&mut self, lines: impl IntoIterator<Item = usize>) {
        self.runtime.set_breakpoints(lines);
        tracing::debug!(breakpoints = ?self.breakpoints_snapshot(), "debugger: set breakpoints");
    }

    /// Add one breakpoint. Returns false if it was already set.
    pub fn add_breakpoint(&mut self, line: usize) -> bool {
        tracing::debug!(line, "debugger: add breakpoint");
        self.runtime.add_breakpoint(line)
    }

    /// Remove one breakpoint. Returns false if it was not set.
    pub fn remove_breakpoint(&mut self, line: usize) -> bool {
        tracing::debug!(line, "debugger: remove breakpoint");
        self.runtime.remove_breakpoint(line)
    }

    /// Remove every breakpoint.
    pub fn clear_breakpoints(&mut self) {
        self.runtime.clear_breakpoints();
    }

    /// Breakpoint lines by source name.
    pub fn breakpoints_snapshot(&self) -> BTreeMap<String, Vec<usize>> {
        self.runtime.breakpoints().snapshot()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Execution Control
    // ═══════════════════════════════════════════════════════════════════

    /// Run until the next breakpoint or the end of the program.
    ///
    /// # Errors
    ///
    /// `NoProgramLoaded` only; runtime errors are reported through the
    /// returned state.
    pub fn continue_(&mut self) -> Result<DebugState, EvalError> {
        self.drive("continue", Runtime::request_continue)
    }

    /// Run until the next statement, entering function calls.
    ///
    /// # Errors
    ///
    /// `NoProgramLoaded` only.
    pub fn step(&mut self) -> Result<DebugState, EvalError> {
        self.drive("step", Runtime::request_step)
    }

    /// Run to the end, ignoring breakpoints.
    ///
    /// # Errors
    ///
    /// `NoProgramLoaded` only.
    pub fn run_to_end(&mut self) -> Result<DebugState, EvalError> {
        self.drive("run to end", Runtime::request_run_to_end)
    }

    fn drive(
        &mut self,
        action: &str,
        mode: fn(&mut Runtime),
    ) -> Result<DebugState, EvalError> {
        if self.program.is_none() {
            return Err(EvalError::NoProgramLoaded);
        }
        if matches!(self.status, RunStatus::Finished | RunStatus::Failed) {
            tracing::debug!("debugger: restarting program");
            self.restart();
        }
        mode(&mut self.runtime);

        let mut output = String::new();
        let result = match &self.program {
            Some(program) => self.evaluator.evaluate(program, &mut self.runtime, &mut output),
            None => Err(EvalError::NoProgramLoaded),
        };

        self.last_error = None;
        self.status = match result {
            Ok(Outcome::Finished) => RunStatus::Finished,
            Ok(Outcome::Paused(pos)) => RunStatus::Paused {
                line: pos.line,
                column: pos.column,
            },
            Err(err) => {
                self.last_error = Some(err);
                RunStatus::Failed
            }
        };
        self.last_output = output;
        tracing::debug!(action, status = ?self.status, "debugger: run stopped");
        Ok(self.state())
    }

    // ═══════════════════════════════════════════════════════════════════
    // Inspection
    // ═══════════════════════════════════════════════════════════════════

    /// Current status.
    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// True while stopped at a breakpoint or step.
    pub fn is_paused(&self) -> bool {
        matches!(self.status, RunStatus::Paused { .. })
    }

    /// Error of the last run, if it failed.
    pub fn last_error(&self) -> Option<&EvalError> {
        self.last_error.as_ref()
    }

    /// Output of the last control operation.
    pub fn last_output(&self) -> &str {
        &self.last_output
    }

    /// Visible variables of the current scope.
    pub fn variables(&self) -> IndexMap<String, Value> {
        self.runtime.variables_snapshot()
    }

    /// Active frames, innermost first.
    pub fn callstack(&self) -> Vec<FrameInfo> {
        self.runtime.callstack_snapshot()
    }

    /// The underlying runtime.
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Snapshot of everything a front end shows.
    pub fn state(&self) -> DebugState {
        DebugState {
            status: self.status,
            output: self.last_output.clone(),
            error: self.last_error.as_ref().map(ToString::to_string),
            breakpoints: self.breakpoints_snapshot(),
            variables: self.variables(),
            callstack: self.callstack(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debugger(source: &str) -> Debugger {
        let mut dbg = Debugger::new(EvalContext::new().with_filename("t.ms"));
        dbg.load_source(source).unwrap();
        dbg
    }

    #[test]
    fn test_control_without_program() {
        let mut dbg = Debugger::default();
        assert_eq!(dbg.status(), RunStatus::Idle);
        assert_eq!(dbg.continue_().unwrap_err(), EvalError::NoProgramLoaded);
        assert_eq!(dbg.step().unwrap_err(), EvalError::NoProgramLoaded);
    }

    #[test]
    fn test_load_source_rejects_bad_syntax() {
        let mut dbg = Debugger::default();
        assert!(matches!(
            dbg.load_source("x = (1"),
            Err(MicroScriptError::Parse(_))
        ));
        assert!(dbg.program().is_none());
    }

    #[test]
    fn test_step_walks_statements() {
        let mut dbg = debugger("a = 1\nb = 2\nc = 3");
        let state = dbg.step().unwrap();
        assert_eq!(state.status, RunStatus::Paused { line: 1, column: 1 });
        assert!(state.variables.is_empty());

        let state = dbg.step().unwrap();
        assert_eq!(state.status, RunStatus::Paused { line: 2, column: 1 });
        assert_eq!(state.variables.get("a"), Some(&Value::Int(1)));

        dbg.step().unwrap();
        let state = dbg.step().unwrap();
        assert_eq!(state.status, RunStatus::Finished);
        assert_eq!(state.variables.get("c"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_failure_is_recorded_not_returned() {
        let mut dbg = debugger("x = 1\nprint(z)");
        let state = dbg.continue_().unwrap();
        assert_eq!(state.status, RunStatus::Failed);
        assert_eq!(
            state.error.as_deref(),
            Some("name 'z' is not defined (line 2, col 7)")
        );
        assert_eq!(state.variables.get("x"), Some(&Value::Int(1)));
        assert!(matches!(
            dbg.last_error(),
            Some(EvalError::UndefinedVariable { .. })
        ));
    }

    #[test]
    fn test_finished_program_restarts() {
        let mut dbg = debugger("print(1)");
        assert_eq!(dbg.continue_().unwrap().output, "1\n");
        let state = dbg.continue_().unwrap();
        assert_eq!(state.status, RunStatus::Finished);
        assert_eq!(state.output, "1\n");
    }

    #[test]
    fn test_reset_returns_to_loaded() {
        let mut dbg = debugger("x = 1\ny = 2");
        dbg.set_breakpoints([2]);
        dbg.continue_().unwrap();
        assert!(dbg.is_paused());

        dbg.reset();
        assert_eq!(dbg.status(), RunStatus::Loaded);
        assert!(dbg.variables().is_empty());
        assert_eq!(dbg.breakpoints_snapshot()["t.ms"], vec![2]);
    }

    #[test]
    fn test_status_serializes_with_tag() {
        let json = serde_json::to_string(&RunStatus::Paused { line: 3, column: 5 }).unwrap();
        assert_eq!(json, r#"{"state":"paused","line":3,"column":5}"#);
        let json = serde_json::to_string(&RunStatus::Finished).unwrap();
        assert_eq!(json, r#"{"state":"finished"}"#);
    }
}
