//! Output sinks for `print`
//!
//! Program output goes through a caller-supplied sink rather than straight
//! to the process stdout, so a caller can capture it per run.

/// Destination for program output.
pub trait OutputSink {
    /// Append text to the output.
    fn write_str(&mut self, text: &str);
}

/// Captures output in memory.
impl OutputSink for String {
    fn write_str(&mut self, text: &str) {
        self.push_str(text);
    }
}

/// Writes output to the process stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn write_str(&mut self, text: &str) {
        print!("{text}");
    }
}

/// Discards all output.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSink;

impl OutputSink for SilentSink {
    fn write_str(&mut self, _text: &str) {}
}

impl<T: OutputSink + ?Sized> OutputSink for &mut T {
    fn write_str(&mut self, text: &str) {
        (**self).write_str(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emit(sink: &mut dyn OutputSink) {
        sink.write_str("a");
        sink.write_str("b\n");
    }

    #[test]
    fn test_string_sink_captures() {
        let mut out = String::new();
        emit(&mut out);
        assert_eq!(out, "ab\n");
    }

    #[test]
    fn test_silent_sink_discards() {
        let mut sink = SilentSink;
        emit(&mut sink);
    }
}
