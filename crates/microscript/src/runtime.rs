//! Runtime state shared by the evaluator and the debugger
//!
//! A `Runtime` owns the global scope, the call stack, the breakpoint table
//! and the pause/step flags. It persists across evaluator invocations, which
//! is what lets a paused program be resumed and lets a REPL keep its
//! globals.

mod breakpoints;
mod frame;

pub use breakpoints::BreakpointTable;
pub use frame::{CallStack, Frame, FrameInfo};

use indexmap::IndexMap;

use crate::context::EvalContext;
use crate::environment::{default_builtins, Env};
use crate::error::EnvironmentError;
use crate::position::Position;
use crate::value::{BuiltinFn, Value};

/// Scopes, call stack, breakpoints and pause state of one program run.
#[derive(Debug)]
pub struct Runtime {
    globals: Env,
    stack: CallStack,
    breakpoints: BreakpointTable,
    builtins: Vec<BuiltinFn>,
    filename: String,
    max_call_depth: usize,

    paused: bool,
    step_mode: bool,
    breakpoints_enabled: bool,
    pause_position: Option<Position>,
}

impl Runtime {
    /// Create a runtime whose globals hold the default builtins.
    pub fn new(ctx: &EvalContext) -> Self {
        Self::with_builtins(ctx, default_builtins())
    }

    /// Create a runtime whose globals hold `builtins`.
    pub fn with_builtins(ctx: &EvalContext, builtins: Vec<BuiltinFn>) -> Self {
        let globals = Env::new();
        globals.load_builtins(&builtins);
        Self {
            globals,
            stack: CallStack::new(),
            breakpoints: BreakpointTable::new(),
            builtins,
            filename: ctx.filename.clone(),
            max_call_depth: ctx.max_call_depth,
            paused: false,
            step_mode: false,
            breakpoints_enabled: true,
            pause_position: None,
        }
    }

    /// Source name used for breakpoint lookup.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    // ═══════════════════════════════════════════════════════════════════
    // Scopes and Frames
    // ═══════════════════════════════════════════════════════════════════

    /// The global scope.
    pub fn global_env(&self) -> &Env {
        &self.globals
    }

    /// Scope used for name resolution: the top frame's, or the global one.
    pub fn current_env(&self) -> Env {
        self.stack
            .top()
            .map(|frame| frame.env.clone())
            .unwrap_or_else(|| self.globals.clone())
    }

    /// The active call stack.
    pub fn call_stack(&self) -> &CallStack {
        &self.stack
    }

    /// Number of active function calls.
    pub fn call_depth(&self) -> usize {
        self.stack.depth()
    }

    /// Start a call: bind `params` to `args` in a fresh child of
    /// `closure_env` and push a frame for it.
    ///
    /// # Errors
    ///
    /// Fails on an argument count mismatch or when the call would exceed
    /// the configured depth. No frame is pushed in either case.
    pub fn enter_function(
        &mut self,
        name: &str,
        params: &[String],
        args: Vec<Value>,
        closure_env: &Env,
        call_site: Option<Position>,
    ) -> Result<Env, EnvironmentError> {
        if params.len() != args.len() {
            return Err(EnvironmentError::ArityMismatch {
                name: name.to_string(),
                expected: params.len(),
                got: args.len(),
            });
        }
        if self.stack.depth() >= self.max_call_depth {
            return Err(EnvironmentError::RecursionLimit {
                depth: self.stack.depth(),
                max: self.max_call_depth,
            });
        }

        let env = closure_env.new_child();
        for (param, arg) in params.iter().zip(args) {
            env.define(param.as_str(), arg);
        }
        tracing::trace!(function = name, depth = self.stack.depth() + 1, "enter function");
        self.stack.push(Frame {
            function_name: name.to_string(),
            env: env.clone(),
            call_site,
            filename: self.filename.clone(),
        });
        Ok(env)
    }

    /// Finish a call by popping the top frame.
    ///
    /// # Errors
    ///
    /// An empty stack means the evaluator lost track of its calls.
    pub fn leave_function(&mut self) -> Result<Frame, EnvironmentError> {
        let frame = self.stack.pop().ok_or(EnvironmentError::EmptyCallStack)?;
        tracing::trace!(function = %frame.function_name, "leave function");
        Ok(frame)
    }

    /// Drop frames left behind by an interrupted run.
    pub fn reset_call_stack(&mut self) {
        self.stack.clear();
    }

    // ═══════════════════════════════════════════════════════════════════
    // Breakpoints and Stepping
    // ═══════════════════════════════════════════════════════════════════

    /// The breakpoint table.
    pub fn breakpoints(&self) -> &BreakpointTable {
        &self.breakpoints
    }

    /// Replace the breakpoints of this runtime's source.
    pub fn set_breakpoints(&mut self, lines: impl IntoIterator<Item = usize>) {
        self.breakpoints.replace(&self.filename, lines);
    }

    /// Add one breakpoint. Returns false if it was already set.
    pub fn add_breakpoint(&mut self, line: usize) -> bool {
        self.breakpoints.add(&self.filename, line)
    }

    /// Remove one breakpoint. Returns false if it was not set.
    pub fn remove_breakpoint(&mut self, line: usize) -> bool {
        self.breakpoints.remove(&self.filename, line)
    }

    /// Remove every breakpoint.
    pub fn clear_breakpoints(&mut self) {
        self.breakpoints.clear();
    }

    /// Hook called before every statement. Returns true, and records the
    /// pause, when step mode is on or a breakpoint is set on `pos.line`.
    pub fn before_statement(&mut self, pos: Position) -> bool {
        tracing::trace!(line = pos.line, column = pos.column, "before statement");
        let hit = self.step_mode
            || (self.breakpoints_enabled && self.breakpoints.contains(&self.filename, pos.line));
        if hit {
            self.paused = true;
            self.pause_position = Some(pos);
        }
        hit
    }

    /// Resume until the next breakpoint.
    pub fn request_continue(&mut self) {
        self.paused = false;
        self.step_mode = false;
        self.breakpoints_enabled = true;
    }

    /// Resume until the next statement at any depth.
    pub fn request_step(&mut self) {
        self.paused = false;
        self.step_mode = true;
        self.breakpoints_enabled = true;
    }

    /// Resume and ignore breakpoints until the program ends.
    pub fn request_run_to_end(&mut self) {
        self.paused = false;
        self.step_mode = false;
        self.breakpoints_enabled = false;
    }

    /// True while a before-statement hook has requested a pause.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Where the last pause happened.
    pub fn pause_position(&self) -> Option<Position> {
        self.pause_position
    }

    /// Clear the pause flag after a run ends without pausing.
    pub(crate) fn clear_pause(&mut self) {
        self.paused = false;
        self.pause_position = None;
    }

    // ═══════════════════════════════════════════════════════════════════
    // Inspection
    // ═══════════════════════════════════════════════════════════════════

    /// Every visible variable of the current scope chain, innermost
    /// shadowing outer. Builtins still bound under their own name are
    /// left out.
    pub fn variables_snapshot(&self) -> IndexMap<String, Value> {
        let mut visible = self.current_env().flatten();
        visible.retain(|name, value| !matches!(value, Value::Builtin(b) if b.name == *name));
        visible
    }

    /// Frames innermost first, each with its call site and locals.
    pub fn callstack_snapshot(&self) -> Vec<FrameInfo> {
        self.stack.snapshot()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Lifecycle
    // ═══════════════════════════════════════════════════════════════════

    /// Fresh globals and an empty stack. Breakpoints are kept.
    pub fn reset(&mut self) {
        self.globals.clear();
        self.globals = Env::new();
        self.globals.load_builtins(&self.builtins);
        self.stack.clear();
        self.paused = false;
        self.step_mode = false;
        self.breakpoints_enabled = true;
        self.pause_position = None;
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.stack.clear();
        self.globals.clear();
    }
}
