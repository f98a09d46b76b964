//! The `include` directive and declaration lookup in included documents.
//!
//! Nothing here reads files. Callers load the documents named by
//! [`include_uris`] and hand them back as [`IncludedDocuments`].

use std::path::Path;

use compose_yaml::{NodeKind, YamlHashEntry, YamlNode};
use url::Url;

use crate::document::{IncludedDocuments, ParsedDocument};
use crate::scanner::{Category, DeclarationToken, collect_declarations};

/// A declaration found in an included document.
#[derive(Debug, Clone)]
pub struct IncludedDeclaration<'a> {
    pub uri: &'a str,
    pub token: DeclarationToken,
    pub document: &'a ParsedDocument,
}

/// Paths listed by the top-level `include` directive, in order.
///
/// Items are either paths or mappings whose `path` is a path or a list of
/// paths. Anything else is skipped.
pub fn include_paths(top_level: &[YamlHashEntry]) -> Vec<String> {
    let Some(include) = top_level
        .iter()
        .find(|entry| entry.key.as_str() == Some("include"))
        .and_then(|entry| entry.value.as_sequence())
    else {
        return Vec::new();
    };

    let mut paths = Vec::new();
    for item in include {
        match &item.unanchored().kind {
            NodeKind::Scalar(_) => paths.extend(non_empty(item)),
            NodeKind::Mapping(_) => match item.get("path") {
                Some(path) if path.is_sequence() => {
                    paths.extend(path.as_sequence().unwrap_or_default().iter().filter_map(non_empty));
                }
                Some(path) => paths.extend(non_empty(path)),
                None => {}
            },
            NodeKind::Sequence(_) | NodeKind::Anchor(..) | NodeKind::Alias(_) => {}
        }
    }
    paths
}

fn non_empty(node: &YamlNode) -> Option<String> {
    node.as_str()
        .filter(|path| !path.is_empty())
        .map(str::to_string)
}

/// Resolve an include path against the URI of the including document.
///
/// Absolute URLs are kept; other paths are joined onto the base URI, or
/// onto the base's directory when the base is a plain path.
pub fn resolve_include_uri(base_uri: &str, path: &str) -> String {
    // Single-letter schemes are Windows drive letters.
    if let Ok(url) = Url::parse(path)
        && url.scheme().len() > 1
    {
        return url.into();
    }
    if Path::new(path).is_absolute()
        && let Ok(url) = Url::from_file_path(path)
    {
        return url.into();
    }

    match Url::parse(base_uri).and_then(|base| base.join(path)) {
        Ok(url) => url.into(),
        Err(_) => Path::new(base_uri)
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(path)
            .to_string_lossy()
            .into_owned(),
    }
}

/// URIs of every document included by `document`, in order and without
/// duplicates.
///
/// Includes of every YAML document of the stream are collected.
pub fn include_uris(document: &ParsedDocument) -> Vec<String> {
    let mut uris: Vec<String> = Vec::new();
    for yaml in document.documents() {
        let Some(top_level) = yaml.root.as_mapping() else {
            continue;
        };
        for path in include_paths(top_level) {
            let uri = resolve_include_uri(document.uri(), &path);
            if !uris.contains(&uri) {
                uris.push(uri);
            }
        }
    }
    uris
}

/// Find a declaration of `name` in any included document.
///
/// When several included documents declare the name, which one is returned
/// is unspecified.
pub fn lookup_declaration<'a>(
    includes: &'a IncludedDocuments,
    category: Category,
    name: &str,
) -> Option<IncludedDeclaration<'a>> {
    includes.iter().find_map(|document| {
        document
            .documents()
            .iter()
            .filter_map(|yaml| yaml.root.as_mapping())
            .flat_map(|top_level| collect_declarations(top_level, category))
            .find(|declaration| declaration.token.text == name)
            .map(|token| IncludedDeclaration {
                uri: document.uri(),
                token,
                document,
            })
    })
}
