//! Conversion between compose-lsp-core types and tower_lsp::lsp_types.
//!
//! Core positions count characters; LSP positions count UTF-16 code units.
//! Every conversion goes through the text of the document the position
//! belongs to.

use std::collections::HashMap;

use tower_lsp::lsp_types::{
    DocumentHighlight, DocumentHighlightKind, GotoDefinitionResponse, Hover, HoverContents,
    Location, LocationLink, MarkupContent, MarkupKind, Position as LspPosition, Range as LspRange,
    TextEdit as LspTextEdit, Url, WorkspaceEdit,
};

use compose_lsp_core::types::{
    DefinitionLink, HighlightKind, HighlightSpan, HoverResult, Position, Range, RenameEdit,
};

/// The lines of a document, for translating character columns.
#[derive(Debug, Clone)]
pub struct Utf16Lines<'a> {
    lines: Vec<&'a str>,
}

impl<'a> Utf16Lines<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.split('\n').collect(),
        }
    }

    fn line(&self, line: u32) -> &'a str {
        self.lines.get(line as usize).copied().unwrap_or_default()
    }

    /// Convert a compose-lsp-core Position to an lsp-types Position.
    ///
    /// Columns past the end of the line are kept as they are.
    pub fn position_to_lsp(&self, pos: &Position) -> LspPosition {
        let wanted = pos.character as usize;
        let (count, units) = self
            .line(pos.line)
            .chars()
            .take(wanted)
            .fold((0, 0), |(count, units), ch| (count + 1, units + ch.len_utf16()));
        LspPosition {
            line: pos.line,
            character: (units + wanted - count) as u32,
        }
    }

    /// Convert an lsp-types Position to a compose-lsp-core Position.
    ///
    /// An offset inside a surrogate pair lands on the character holding it.
    pub fn position_from_lsp(&self, pos: &LspPosition) -> Position {
        let wanted = pos.character as usize;
        let mut units = 0;
        let mut count: u32 = 0;
        for ch in self.line(pos.line).chars() {
            let next = units + ch.len_utf16();
            if next > wanted {
                return Position::new(pos.line, count);
            }
            units = next;
            count += 1;
        }
        Position::new(pos.line, count + (wanted - units) as u32)
    }

    /// Convert a compose-lsp-core Range to an lsp-types Range.
    pub fn range_to_lsp(&self, range: &Range) -> LspRange {
        LspRange {
            start: self.position_to_lsp(&range.start),
            end: self.position_to_lsp(&range.end),
        }
    }
}

/// Convert a compose-lsp-core HighlightSpan to an lsp-types DocumentHighlight.
pub fn highlight_to_lsp(lines: &Utf16Lines<'_>, span: &HighlightSpan) -> DocumentHighlight {
    DocumentHighlight {
        range: lines.range_to_lsp(&span.range),
        kind: Some(match span.kind {
            HighlightKind::Read => DocumentHighlightKind::READ,
            HighlightKind::Write => DocumentHighlightKind::WRITE,
        }),
    }
}

/// Convert a definition to a location link, or a plain location for
/// clients without link support.
///
/// `origin` holds the requesting document's lines, `target` those of the
/// document holding the declaration. Returns None if the target URI is not
/// a valid URL.
pub fn definition_to_lsp(
    link: &DefinitionLink,
    link_support: bool,
    origin: &Utf16Lines<'_>,
    target: &Utf16Lines<'_>,
) -> Option<GotoDefinitionResponse> {
    let target_uri = Url::parse(&link.target_uri).ok()?;
    let target_range = target.range_to_lsp(&link.target_range);

    if link_support {
        Some(GotoDefinitionResponse::Link(vec![LocationLink {
            origin_selection_range: link.origin_range.as_ref().map(|range| origin.range_to_lsp(range)),
            target_uri,
            target_range,
            target_selection_range: target_range,
        }]))
    } else {
        Some(GotoDefinitionResponse::Scalar(Location::new(target_uri, target_range)))
    }
}

/// Convert a rename to a workspace edit.
///
/// Returns None if the URI is not a valid URL.
pub fn rename_to_lsp(lines: &Utf16Lines<'_>, edit: &RenameEdit) -> Option<WorkspaceEdit> {
    let uri = Url::parse(&edit.uri).ok()?;
    let edits = edit
        .edits
        .iter()
        .map(|edit| LspTextEdit::new(lines.range_to_lsp(&edit.range), edit.new_text.clone()))
        .collect();

    Some(WorkspaceEdit {
        changes: Some(HashMap::from([(uri, edits)])),
        ..Default::default()
    })
}

/// Convert a hover result to Markdown hover contents.
pub fn hover_to_lsp(lines: &Utf16Lines<'_>, hover: &HoverResult) -> Hover {
    Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: hover.contents.clone(),
        }),
        range: Some(lines.range_to_lsp(&hover.range)),
    }
}
