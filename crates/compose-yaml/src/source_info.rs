//! Source location information for YAML nodes.

use serde::{Deserialize, Serialize};

/// Source location information for a YAML node.
///
/// Tracks the position of a YAML element in the original source text.
/// Offsets and lengths count characters, matching the markers produced by
/// `yaml-rust2`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Optional filename or source identifier
    pub file: Option<String>,

    /// Character offset from start of source (0-based)
    pub offset: usize,

    /// Line number (1-based)
    pub line: usize,

    /// Column number (1-based, in characters)
    pub col: usize,

    /// Length in characters
    pub len: usize,
}

impl SourceInfo {
    /// Create a new SourceInfo with all fields specified.
    pub fn new(file: Option<String>, offset: usize, line: usize, col: usize, len: usize) -> Self {
        Self {
            file,
            offset,
            line,
            col,
            len,
        }
    }

    /// Set the filename for this source location.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Get the end offset (exclusive) of this location.
    pub fn end_offset(&self) -> usize {
        self.offset + self.len
    }
}

impl Default for SourceInfo {
    fn default() -> Self {
        Self {
            file: None,
            offset: 0,
            line: 1,
            col: 1,
            len: 0,
        }
    }
}

/// Maps character offsets to 1-based line and column numbers.
#[derive(Debug, Clone, Default)]
pub struct LineIndex {
    /// Character offset at which each line starts.
    line_starts: Vec<usize>,
    /// Total number of characters in the source.
    len: usize,
}

impl LineIndex {
    /// Build an index over `source`.
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        let mut len = 0;
        for (index, ch) in source.chars().enumerate() {
            if ch == '\n' {
                line_starts.push(index + 1);
            }
            len = index + 1;
        }
        Self { line_starts, len }
    }

    /// Number of lines in the source (a trailing newline starts a new, empty line).
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Convert a character offset to a 1-based `(line, column)` pair.
    ///
    /// Offsets past the end are clamped to the end of the source.
    pub fn location(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        (line + 1, offset - self.line_starts[line] + 1)
    }

    /// Character offset of the start of a 1-based line, if it exists.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        line.checked_sub(1)
            .and_then(|index| self.line_starts.get(index))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_info_creation() {
        let info = SourceInfo::new(Some("compose.yaml".into()), 10, 2, 5, 8);
        assert_eq!(info.file, Some("compose.yaml".into()));
        assert_eq!(info.offset, 10);
        assert_eq!(info.line, 2);
        assert_eq!(info.col, 5);
        assert_eq!(info.len, 8);
        assert_eq!(info.end_offset(), 18);
    }

    #[test]
    fn test_with_file() {
        let info = SourceInfo::default().with_file("compose.yaml");
        assert_eq!(info.file, Some("compose.yaml".into()));
    }

    #[test]
    fn test_line_index_locations() {
        let index = LineIndex::new("services:\n  web:\n");
        assert_eq!(index.line_count(), 3);
        assert_eq!(index.location(0), (1, 1));
        assert_eq!(index.location(8), (1, 9));
        assert_eq!(index.location(10), (2, 1));
        assert_eq!(index.location(12), (2, 3));
        assert_eq!(index.location(17), (3, 1));
        // Clamped past the end
        assert_eq!(index.location(100), (3, 1));
    }

    #[test]
    fn test_line_index_counts_characters() {
        let index = LineIndex::new("é: x\nb: y");
        assert_eq!(index.location(3), (1, 4));
        assert_eq!(index.location(5), (2, 1));
        assert_eq!(index.line_start(2), Some(5));
        assert_eq!(index.line_start(0), None);
        assert_eq!(index.line_start(3), None);
    }
}
