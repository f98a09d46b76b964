//! Anchor and alias resolution.
//!
//! Anchors are positional: an alias refers to the closest anchor of the same
//! name written before it, and defining the name again starts a new scope.
//! Resolution therefore runs in two passes. [`find_fragments`] collects every
//! anchor and alias in document order, then [`resolve_fragment`] computes the
//! scope around the cursor.

use compose_yaml::{Fragment, NodeKind, YamlNode};

use crate::scanner::{Token, TokenKind};

/// Whether a fragment defines or reuses a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentRole {
    /// `&name`
    Anchor,
    /// `*name`
    Alias,
}

/// An anchor definition or alias usage.
///
/// The token covers the name only; the sigil sits one column before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentToken {
    pub role: FragmentRole,
    pub token: Token,
}

impl FragmentToken {
    fn new(role: FragmentRole, fragment: &Fragment) -> Self {
        Self {
            role,
            token: Token {
                line: fragment.source_info.line,
                column: fragment.source_info.col,
                text: fragment.name.clone(),
                kind: TokenKind::Plain,
            },
        }
    }

    /// The anchor name.
    pub fn name(&self) -> &str {
        &self.token.text
    }

    /// Check if a 1-based cursor is on the sigil or the name.
    pub fn contains(&self, line: usize, column: usize) -> bool {
        self.token.line == line
            && self.token.column.saturating_sub(1) <= column
            && column <= self.token.column + self.token.len()
    }

    fn position(&self) -> (usize, usize) {
        (self.token.line, self.token.column)
    }
}

/// Every anchor and alias of a document, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragments {
    pub anchors: Vec<FragmentToken>,
    pub aliases: Vec<FragmentToken>,
}

/// The anchor scope around a cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentMatch {
    pub name: String,
    /// The anchor defining the scope, if one precedes the cursor.
    pub anchor: Option<FragmentToken>,
    /// Aliases bound to that anchor.
    pub aliases: Vec<FragmentToken>,
}

/// Collect every anchor and alias below `root`, in pre-order.
pub fn find_fragments(root: &YamlNode) -> Fragments {
    let mut fragments = Fragments::default();
    collect(root, &mut fragments);
    fragments
}

fn collect(node: &YamlNode, fragments: &mut Fragments) {
    match &node.kind {
        NodeKind::Scalar(_) => {}
        NodeKind::Sequence(items) => {
            for item in items {
                collect(item, fragments);
            }
        }
        NodeKind::Mapping(entries) => {
            for entry in entries {
                collect(&entry.key, fragments);
                collect(&entry.value, fragments);
            }
        }
        NodeKind::Anchor(fragment, inner) => {
            fragments
                .anchors
                .push(FragmentToken::new(FragmentRole::Anchor, fragment));
            collect(inner, fragments);
        }
        NodeKind::Alias(fragment) => {
            fragments
                .aliases
                .push(FragmentToken::new(FragmentRole::Alias, fragment));
        }
    }
}

/// Resolve the anchor scope of the fragment under a 1-based cursor.
///
/// Returns None when the cursor is not on an anchor or alias.
pub fn resolve_fragment(fragments: &Fragments, line: usize, column: usize) -> Option<FragmentMatch> {
    let hit = fragments
        .anchors
        .iter()
        .chain(&fragments.aliases)
        .find(|fragment| fragment.contains(line, column))?;
    let name = hit.name();
    let cursor = hit.position();

    let same_name = |fragment: &&FragmentToken| fragment.name() == name;
    let anchor = fragments
        .anchors
        .iter()
        .filter(same_name)
        .filter(|anchor| anchor.position() <= cursor)
        .max_by_key(|anchor| anchor.position());
    let end = fragments
        .anchors
        .iter()
        .filter(same_name)
        .map(FragmentToken::position)
        .filter(|&position| position > cursor)
        .min();

    let start = anchor.map(FragmentToken::position);
    let aliases = fragments
        .aliases
        .iter()
        .filter(same_name)
        .filter(|alias| start.is_none_or(|start| alias.position() >= start))
        .filter(|alias| end.is_none_or(|end| alias.position() < end))
        .cloned()
        .collect();

    Some(FragmentMatch {
        name: name.to_string(),
        anchor: anchor.cloned(),
        aliases,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragments(source: &str) -> Fragments {
        find_fragments(&compose_yaml::parse(source).unwrap())
    }

    fn positions(tokens: &[FragmentToken]) -> Vec<(usize, usize)> {
        tokens.iter().map(FragmentToken::position).collect()
    }

    const REDEFINED: &str = "a: &x one\nb: *x\nc: &x two\nd: *x\ne: *x\n";

    #[test]
    fn collects_in_document_order() {
        let found = fragments(REDEFINED);
        assert_eq!(positions(&found.anchors), vec![(1, 5), (3, 5)]);
        assert_eq!(positions(&found.aliases), vec![(2, 5), (4, 5), (5, 5)]);
    }

    #[test]
    fn collects_nested_and_key_fragments() {
        let found = fragments("services:\n  web:\n    environment: &env\n      A: 1\n  api:\n    environment: *env\n");
        assert_eq!(found.anchors.len(), 1);
        assert_eq!(found.anchors[0].name(), "env");
        assert_eq!(found.aliases.len(), 1);
    }

    #[test]
    fn alias_before_redefinition_binds_first_anchor() {
        let found = fragments(REDEFINED);
        let matched = resolve_fragment(&found, 2, 5).unwrap();
        assert_eq!(matched.name, "x");
        assert_eq!(matched.anchor.as_ref().map(FragmentToken::position), Some((1, 5)));
        assert_eq!(positions(&matched.aliases), vec![(2, 5)]);
    }

    #[test]
    fn alias_after_redefinition_binds_second_anchor() {
        let found = fragments(REDEFINED);
        let matched = resolve_fragment(&found, 5, 6).unwrap();
        assert_eq!(matched.anchor.as_ref().map(FragmentToken::position), Some((3, 5)));
        assert_eq!(positions(&matched.aliases), vec![(4, 5), (5, 5)]);
    }

    #[test]
    fn sigil_and_end_count_as_on_fragment() {
        let found = fragments(REDEFINED);
        // `&` of the second anchor
        let on_sigil = resolve_fragment(&found, 3, 4).unwrap();
        assert_eq!(on_sigil.anchor.as_ref().map(FragmentToken::position), Some((3, 5)));
        // Just past `x`
        assert!(resolve_fragment(&found, 3, 6).is_some());
        // The scalar after the anchor
        assert!(resolve_fragment(&found, 3, 8).is_none());
        assert!(resolve_fragment(&found, 1, 1).is_none());
    }

    #[test]
    fn anchors_on_commented_mappings_and_block_scalars() {
        let found = fragments(
            "x-common: &common\n  # shared\n  restart: always\nnote: &text |\n  hello\nweb: *common\nmsg: *text\n",
        );
        assert_eq!(positions(&found.anchors), vec![(1, 12), (4, 8)]);

        let common = resolve_fragment(&found, 6, 7).unwrap();
        assert_eq!(common.anchor.as_ref().map(FragmentToken::position), Some((1, 12)));
        assert_eq!(positions(&common.aliases), vec![(6, 7)]);

        let text = resolve_fragment(&found, 7, 7).unwrap();
        assert_eq!(text.anchor.as_ref().map(FragmentToken::position), Some((4, 8)));
    }

    #[test]
    fn anchor_without_aliases() {
        let found = fragments("a: &lonely 1\n");
        let matched = resolve_fragment(&found, 1, 6).unwrap();
        assert!(matched.anchor.is_some());
        assert!(matched.aliases.is_empty());
    }
}
