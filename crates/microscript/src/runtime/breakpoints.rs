//! Breakpoint table keyed by source name

use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Line breakpoints, grouped by source name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BreakpointTable {
    lines: HashMap<String, BTreeSet<usize>>,
}

impl BreakpointTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a breakpoint. Returns false if it was already set.
    pub fn add(&mut self, filename: &str, line: usize) -> bool {
        self.lines
            .entry(filename.to_string())
            .or_default()
            .insert(line)
    }

    /// Remove a breakpoint. Returns false if it was not set.
    pub fn remove(&mut self, filename: &str, line: usize) -> bool {
        let Some(lines) = self.lines.get_mut(filename) else {
            return false;
        };
        let removed = lines.remove(&line);
        if lines.is_empty() {
            self.lines.remove(filename);
        }
        removed
    }

    /// Replace every breakpoint of `filename` with `lines`.
    pub fn replace(&mut self, filename: &str, lines: impl IntoIterator<Item = usize>) {
        self.lines.remove(filename);
        for line in lines {
            self.add(filename, line);
        }
    }

    /// Remove every breakpoint of every source.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Query used by the before-statement hook.
    pub fn contains(&self, filename: &str, line: usize) -> bool {
        self.lines
            .get(filename)
            .is_some_and(|lines| lines.contains(&line))
    }

    /// Sorted breakpoint lines of one source.
    pub fn lines(&self, filename: &str) -> Vec<usize> {
        self.lines
            .get(filename)
            .map(|lines| lines.iter().copied().collect())
            .unwrap_or_default()
    }

    /// True if no breakpoint is set anywhere.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Source name to sorted lines, for display and serialization.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<usize>> {
        self.lines
            .iter()
            .map(|(file, lines)| (file.clone(), lines.iter().copied().collect()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_remove_contains() {
        let mut table = BreakpointTable::new();
        assert!(table.add("a.ms", 3));
        assert!(!table.add("a.ms", 3));
        assert!(table.contains("a.ms", 3));
        assert!(!table.contains("b.ms", 3));
        assert!(table.remove("a.ms", 3));
        assert!(!table.remove("a.ms", 3));
        assert!(table.is_empty());
    }

    #[test]
    fn test_replace_and_snapshot_sorted() {
        let mut table = BreakpointTable::new();
        table.add("a.ms", 1);
        table.replace("a.ms", [9, 2, 5, 2]);
        table.add("b.ms", 4);
        let snapshot = table.snapshot();
        assert_eq!(snapshot["a.ms"], vec![2, 5, 9]);
        assert_eq!(snapshot["b.ms"], vec![4]);
        assert_eq!(table.lines("a.ms"), vec![2, 5, 9]);
        assert!(table.lines("c.ms").is_empty());
    }

    #[test]
    fn test_replace_with_nothing_clears_source() {
        let mut table = BreakpointTable::new();
        table.add("a.ms", 1);
        table.replace("a.ms", []);
        assert!(table.is_empty());
    }
}
