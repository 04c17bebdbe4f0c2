//! Call frames and their inspection snapshots

use indexmap::IndexMap;
use serde::Serialize;

use crate::environment::Env;
use crate::position::Position;
use crate::value::Value;

/// One active function invocation.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Name of the called function
    pub function_name: String,

    /// The invocation's local scope (child of the function's closure scope)
    pub env: Env,

    /// Where the call was made
    pub call_site: Option<Position>,

    /// Source name of the program
    pub filename: String,
}

impl Frame {
    /// Snapshot of this frame for inspection.
    pub fn info(&self) -> FrameInfo {
        FrameInfo {
            function: self.function_name.clone(),
            filename: self.filename.clone(),
            line: self.call_site.map(|pos| pos.line),
            column: self.call_site.map(|pos| pos.column),
            locals: self.env.locals(),
        }
    }
}

/// Inspection view of a frame: function name, call site and local
/// bindings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameInfo {
    /// Called function
    pub function: String,

    /// Source name
    pub filename: String,

    /// Call-site line
    pub line: Option<usize>,

    /// Call-site column
    pub column: Option<usize>,

    /// The frame's own bindings (parameters and locals)
    pub locals: IndexMap<String, Value>,
}

/// The stack of active frames; the top is the innermost call.
#[derive(Debug, Clone, Default)]
pub struct CallStack {
    frames: Vec<Frame>,
}

impl CallStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a frame.
    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    /// Pop the top frame.
    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    /// The innermost frame.
    pub fn top(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Number of active frames.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// True when no function is active.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Drop every frame.
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Frame snapshots, innermost first.
    pub fn snapshot(&self) -> Vec<FrameInfo> {
        self.frames.iter().rev().map(Frame::info).collect()
    }
}
