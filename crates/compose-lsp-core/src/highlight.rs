//! Document highlights.

use crate::document::ParsedDocument;
use crate::matcher::highlight;
use crate::types::{HighlightSpan, Position};

/// Every occurrence of the name under the cursor, or None when the cursor
/// is not on a cross-reference.
pub fn get_document_highlights(document: &ParsedDocument, position: Position) -> Option<Vec<HighlightSpan>> {
    highlight(document, position).map(|found| found.spans)
}
