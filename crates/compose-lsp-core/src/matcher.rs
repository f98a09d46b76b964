//! Cross-reference matching.
//!
//! Given a cursor, tries each category in priority order and then anchors
//! and aliases. The first match wins and yields every occurrence of the name
//! as a read (reference) or write (declaration) span.

use serde::{Deserialize, Serialize};

use crate::document::ParsedDocument;
use crate::fragments::{find_fragments, resolve_fragment};
use crate::scanner::{Category, CategoryIndex, ReferenceToken, scan_categories};
use crate::types::{HighlightKind, HighlightSpan, Position};

/// What a matched name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceTarget {
    /// A named entity of a category.
    Category(Category),
    /// A YAML anchor.
    Fragment,
}

/// Every occurrence of one name.
///
/// Reads come first, then writes, each in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyReference {
    pub target: ReferenceTarget,
    pub name: String,
    pub spans: Vec<HighlightSpan>,
}

impl DependencyReference {
    /// The first declaration span.
    pub fn declaration(&self) -> Option<&HighlightSpan> {
        self.spans.iter().find(|span| span.kind == HighlightKind::Write)
    }

    /// The span under a zero-based cursor.
    pub fn span_at(&self, position: Position) -> Option<&HighlightSpan> {
        let on = |position: Position| self.spans.iter().find(|span| span.range.touches(position));
        match self.target {
            // Spans cover the name; the cursor may sit on the `&` or `*`.
            ReferenceTarget::Fragment => {
                on(position).or_else(|| on(Position::new(position.line, position.character + 1)))
            }
            ReferenceTarget::Category(_) => on(position),
        }
    }
}

/// Convert a zero-based cursor to the 1-based line and column tokens use.
pub(crate) fn one_based(position: Position) -> (usize, usize) {
    (position.line as usize + 1, position.character as usize + 1)
}

/// Find every occurrence of the name under the cursor.
///
/// Matching happens inside the YAML document containing the cursor.
pub fn highlight(document: &ParsedDocument, position: Position) -> Option<DependencyReference> {
    let yaml = document.document_at(position.line)?;
    let (line, column) = one_based(position);

    if let Some(top_level) = yaml.root.as_mapping() {
        let index = scan_categories(top_level);
        if let Some(found) = index
            .iter()
            .find_map(|category| match_category(category, line, column))
        {
            return Some(found);
        }
    }

    let fragments = find_fragments(&yaml.root);
    let matched = resolve_fragment(&fragments, line, column)?;
    let spans = matched
        .anchor
        .iter()
        .map(|anchor| HighlightSpan::new(anchor.token.range(), HighlightKind::Write))
        .chain(
            matched
                .aliases
                .iter()
                .map(|alias| HighlightSpan::new(alias.token.range(), HighlightKind::Read)),
        )
        .collect();

    Some(DependencyReference {
        target: ReferenceTarget::Fragment,
        name: matched.name,
        spans,
    })
}

/// Match a 1-based cursor against one category.
///
/// References are tried before declarations.
pub fn match_category(index: &CategoryIndex, line: usize, column: usize) -> Option<DependencyReference> {
    let name = reference_at(index, line, column)
        .map(|reference| &reference.token.text)
        .or_else(|| {
            index
                .declarations
                .iter()
                .find(|declaration| declaration.token.contains(line, column))
                .map(|declaration| &declaration.token.text)
        })?;

    let reads = index
        .references
        .iter()
        .filter(|reference| &reference.token.text == name)
        .map(|reference| HighlightSpan::new(reference.token.range(), HighlightKind::Read));
    let writes = index
        .declarations
        .iter()
        .filter(|declaration| &declaration.token.text == name)
        .map(|declaration| HighlightSpan::new(declaration.token.range(), HighlightKind::Write));

    Some(DependencyReference {
        target: ReferenceTarget::Category(index.category),
        name: name.clone(),
        spans: reads.chain(writes).collect(),
    })
}

/// The reference token under a 1-based cursor.
pub fn reference_at(index: &CategoryIndex, line: usize, column: usize) -> Option<&ReferenceToken> {
    index
        .references
        .iter()
        .find(|reference| reference.token.contains(line, column))
}
