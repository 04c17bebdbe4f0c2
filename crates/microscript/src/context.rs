//! Evaluation context configuration

/// Default ceiling on nested function calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 200;

/// Default ceiling on iterations of a single `while` loop.
pub const DEFAULT_MAX_LOOP_ITERATIONS: usize = 1_000_000;

/// Configuration for evaluation.
///
/// Shared by the runtime, evaluator, interpreter and debugger; controls the
/// resource limits and the source name used for breakpoints and
/// diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalContext {
    /// Maximum call depth (native stack protection)
    pub max_call_depth: usize,

    /// Maximum iterations of one `while` loop before it is treated as
    /// runaway
    pub max_loop_iterations: usize,

    /// Source name: breakpoint table key and diagnostic prefix
    pub filename: String,
}

impl Default for EvalContext {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            max_loop_iterations: DEFAULT_MAX_LOOP_ITERATIONS,
            filename: "<stdin>".to_string(),
        }
    }
}

impl EvalContext {
    /// Create a new context with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the call depth limit.
    pub fn with_max_call_depth(mut self, max_depth: usize) -> Self {
        self.max_call_depth = max_depth;
        self
    }

    /// Set the `while` iteration ceiling.
    pub fn with_max_loop_iterations(mut self, limit: usize) -> Self {
        self.max_loop_iterations = limit;
        self
    }

    /// Set the source name.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let ctx = EvalContext::new();
        assert_eq!(ctx.max_call_depth, 200);
        assert_eq!(ctx.max_loop_iterations, 1_000_000);
        assert_eq!(ctx.filename, "<stdin>");
    }

    #[test]
    fn test_builders_chain() {
        let ctx = EvalContext::new()
            .with_max_call_depth(10)
            .with_max_loop_iterations(50)
            .with_filename("demo.ms");
        assert_eq!(ctx.max_call_depth, 10);
        assert_eq!(ctx.max_loop_iterations, 50);
        assert_eq!(ctx.filename, "demo.ms");
    }
}
