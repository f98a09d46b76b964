//! Go to definition.

use crate::document::{IncludedDocuments, ParsedDocument};
use crate::include::lookup_declaration;
use crate::matcher::{ReferenceTarget, highlight};
use crate::types::{DefinitionLink, Position};

/// Find the declaration of the name under the cursor.
///
/// A declaration in the document itself wins; otherwise the included
/// documents are searched. Anchors are only ever local.
pub fn get_definition(
    document: &ParsedDocument,
    position: Position,
    includes: &IncludedDocuments,
) -> Option<DefinitionLink> {
    let found = highlight(document, position)?;
    let origin_range = found.span_at(position).map(|span| span.range);

    if let Some(declaration) = found.declaration() {
        return Some(DefinitionLink {
            target_uri: document.uri().to_string(),
            target_range: declaration.range,
            origin_range,
        });
    }

    let ReferenceTarget::Category(category) = found.target else {
        return None;
    };
    let included = lookup_declaration(includes, category, &found.name)?;
    tracing::debug!(name = %found.name, uri = included.uri, "Resolved declaration in included document");
    Some(DefinitionLink {
        target_uri: included.uri.to_string(),
        target_range: included.token.token.range(),
        origin_range,
    })
}
