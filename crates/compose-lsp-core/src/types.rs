//! Core types for LSP-like functionality.
//!
//! These types are designed to be:
//! - Transport-agnostic (no LSP protocol dependencies)
//! - Easily serializable to JSON (for query output)
//! - Easily convertible to `lsp-types` (for native LSP)
//!
//! All positions use 0-based line and character indices, matching the LSP specification.

use serde::{Deserialize, Serialize};

/// A position in a text document, expressed as zero-based line and character offset.
///
/// Character offsets count Unicode scalar values, matching `compose-yaml`
/// columns. The LSP server translates them to and from UTF-16 code units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Position {
    /// Zero-based line number.
    pub line: u32,
    /// Zero-based character offset.
    pub character: u32,
}

impl Position {
    /// Create a new position.
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match self.line.cmp(&other.line) {
            std::cmp::Ordering::Equal => self.character.cmp(&other.character),
            ord => ord,
        }
    }
}

/// A range in a text document, expressed as start and end positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Range {
    /// The range's start position (inclusive).
    pub start: Position,
    /// The range's end position (exclusive).
    pub end: Position,
}

impl Range {
    /// Create a new range.
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Check if this range contains a position.
    pub fn contains(&self, pos: Position) -> bool {
        self.start <= pos && pos < self.end
    }

    /// Check if this range contains a position, counting the end position.
    ///
    /// A cursor placed just after the last character of a name is still on it.
    pub fn touches(&self, pos: Position) -> bool {
        self.start <= pos && pos <= self.end
    }

    /// Check if this range is empty (zero-width).
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Whether a highlighted occurrence reads or defines the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightKind {
    /// A reference to the entity.
    Read,
    /// The declaration of the entity.
    Write,
}

/// One occurrence of a referenced entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HighlightSpan {
    pub range: Range,
    pub kind: HighlightKind,
}

impl HighlightSpan {
    /// Create a new span.
    pub fn new(range: Range, kind: HighlightKind) -> Self {
        Self { range, kind }
    }
}

/// The result of a definition request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionLink {
    /// URI of the document holding the declaration.
    pub target_uri: String,
    /// Range of the declaration's name.
    pub target_range: Range,
    /// Range of the occurrence the request was made on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_range: Option<Range>,
}

/// A textual replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEdit {
    pub range: Range,
    pub new_text: String,
}

/// The edits of a rename, all within one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameEdit {
    pub uri: String,
    pub edits: Vec<TextEdit>,
}

/// Hover contents for a reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoverResult {
    /// Markdown contents.
    pub contents: String,
    /// Range of the hovered token.
    pub range: Range,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_ordering() {
        let p1 = Position::new(0, 5);
        let p2 = Position::new(0, 10);
        let p3 = Position::new(1, 0);

        assert!(p1 < p2);
        assert!(p2 < p3);
        assert!(p1 < p3);
    }

    #[test]
    fn range_contains() {
        let range = Range::new(Position::new(1, 0), Position::new(1, 10));

        assert!(range.contains(Position::new(1, 0)));
        assert!(range.contains(Position::new(1, 5)));
        assert!(!range.contains(Position::new(1, 10))); // End is exclusive
        assert!(!range.contains(Position::new(0, 5)));
        assert!(!range.contains(Position::new(2, 0)));
    }

    #[test]
    fn range_touches_includes_end() {
        let range = Range::new(Position::new(1, 4), Position::new(1, 9));

        assert!(range.touches(Position::new(1, 4)));
        assert!(range.touches(Position::new(1, 9)));
        assert!(!range.touches(Position::new(1, 3)));
        assert!(!range.touches(Position::new(1, 10)));
    }

    #[test]
    fn highlight_serialization() {
        let span = HighlightSpan::new(
            Range::new(Position::new(0, 0), Position::new(0, 3)),
            HighlightKind::Write,
        );

        let json = serde_json::to_string(&span).unwrap();
        assert!(json.contains("\"kind\":\"write\""));
    }

    #[test]
    fn definition_without_origin_skips_field() {
        let link = DefinitionLink {
            target_uri: "file:///compose.yaml".into(),
            target_range: Range::default(),
            origin_range: None,
        };

        let json = serde_json::to_string(&link).unwrap();
        assert!(!json.contains("origin_range"));
    }
}
