//! Hover previews of referenced declarations.
//!
//! Hovering a reference shows the body of the declaration it points at, as
//! a fenced YAML block.

use crate::document::{IncludedDocuments, ParsedDocument};
use crate::include::lookup_declaration;
use crate::matcher::{one_based, reference_at};
use crate::scanner::scan_categories;
use crate::types::{HoverResult, Position};

/// Hover for the reference under the cursor.
///
/// Declarations are looked up locally first, then in the included
/// documents. Returns None off references and for dangling ones.
pub fn get_hover(
    document: &ParsedDocument,
    position: Position,
    includes: &IncludedDocuments,
) -> Option<HoverResult> {
    let top_level = document.top_level(position)?;
    let (line, column) = one_based(position);
    let index = scan_categories(top_level);
    let reference = index
        .iter()
        .find_map(|category| reference_at(category, line, column))?;
    let name = &reference.token.text;

    let local = index
        .get(reference.category)?
        .declarations
        .iter()
        .find(|declaration| &declaration.token.text == name);

    let contents = match local {
        Some(declaration) => declaration_body(document.content(), declaration.token.line)?,
        None => {
            let included = lookup_declaration(includes, reference.category, name)?;
            let body = declaration_body(included.document.content(), included.token.token.line)?;
            format!("`{}`\n\n{body}", included.document.filename())
        }
    };

    Some(HoverResult {
        contents,
        range: reference.token.range(),
    })
}

/// Render the declaration starting on a 1-based line as a fenced block.
///
/// The body runs until the next line indented no deeper than the key.
/// Trailing blank and comment lines are dropped and the common indentation
/// is removed.
fn declaration_body(content: &str, line: usize) -> Option<String> {
    let lines: Vec<&str> = content.lines().collect();
    let first = *lines.get(line.checked_sub(1)?)?;
    let key_indent = indentation(first);

    let mut body = vec![first];
    for &text in &lines[line..] {
        if !is_blank_or_comment(text) && indentation(text) <= key_indent {
            break;
        }
        body.push(text);
    }
    while body.len() > 1 && body.last().is_some_and(|text| is_blank_or_comment(text)) {
        body.pop();
    }

    let common = body
        .iter()
        .filter(|&&text| !is_blank_or_comment(text))
        .map(|&text| indentation(text))
        .min()
        .unwrap_or(0);
    let dedented: Vec<&str> = body
        .iter()
        .map(|&text| &text[common.min(indentation(text))..])
        .collect();

    Some(format!("```yaml\n{}\n```", dedented.join("\n")))
}

/// Leading spaces and tabs, in bytes.
fn indentation(text: &str) -> usize {
    text.len() - text.trim_start_matches([' ', '\t']).len()
}

fn is_blank_or_comment(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}
