//! Rename and prepare-rename.
//!
//! Only occurrences in the triggering document are renamed. Declarations in
//! included documents are left alone.

use crate::document::ParsedDocument;
use crate::matcher::highlight;
use crate::types::{Position, Range, RenameEdit, TextEdit};

/// Replace every occurrence of the name under the cursor with `new_name`.
pub fn rename(document: &ParsedDocument, position: Position, new_name: &str) -> Option<RenameEdit> {
    let found = highlight(document, position)?;
    let edits = found
        .spans
        .iter()
        .map(|span| TextEdit {
            range: span.range,
            new_text: new_name.to_string(),
        })
        .collect();

    Some(RenameEdit {
        uri: document.uri().to_string(),
        edits,
    })
}

/// The range of the renameable name under the cursor.
pub fn prepare_rename(document: &ParsedDocument, position: Position) -> Option<Range> {
    highlight(document, position)?
        .span_at(position)
        .map(|span| span.range)
}
