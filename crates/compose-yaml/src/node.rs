//! YAML nodes with source location tracking.

use crate::SourceInfo;

/// A YAML node with source location information.
///
/// Every node owns its children. Anchors and aliases are kept as explicit
/// variants rather than being resolved, so consumers see exactly what was
/// written in the document.
///
/// ## Example
///
/// ```rust
/// use compose_yaml::{parse, NodeKind};
///
/// let yaml = parse("base: &base {image: nginx}\nweb: *base").unwrap();
/// let web = yaml.get("web").unwrap();
/// assert!(matches!(web.kind, NodeKind::Alias(_)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct YamlNode {
    /// What kind of node this is, including its children.
    pub kind: NodeKind,

    /// Source location of the whole node.
    pub source_info: SourceInfo,
}

/// The shape of a YAML node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A scalar value (plain, quoted or block).
    Scalar(Scalar),

    /// A sequence of items.
    Sequence(Vec<YamlNode>),

    /// A mapping of key/value entries, in document order.
    Mapping(Vec<YamlHashEntry>),

    /// A node carrying an anchor definition (`&name`).
    Anchor(Fragment, Box<YamlNode>),

    /// An alias usage (`*name`).
    Alias(Fragment),
}

/// How a scalar was written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarStyle {
    Plain,
    SingleQuoted,
    DoubleQuoted,
    /// Literal (`|`) or folded (`>`) block scalar.
    Block,
}

/// A scalar value.
#[derive(Debug, Clone, PartialEq)]
pub struct Scalar {
    /// The scalar's value after unquoting.
    pub value: String,

    /// The style the scalar was written in.
    pub style: ScalarStyle,
}

/// The name of an anchor or alias together with its location.
///
/// `source_info` covers the name only, without the `&` or `*` sigil.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub name: String,
    pub source_info: SourceInfo,
}

/// A key-value pair in a YAML mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct YamlHashEntry {
    /// The key with source tracking
    pub key: YamlNode,

    /// The value with source tracking
    pub value: YamlNode,
}

/// One document of a YAML stream.
#[derive(Debug, Clone, PartialEq)]
pub struct YamlDocument {
    /// The document's root node.
    pub root: YamlNode,

    /// Line (1-based) where the document starts: its `---` marker, or its
    /// first token for an implicit document.
    pub start_line: usize,
}

impl YamlNode {
    /// Create a new node.
    pub fn new(kind: NodeKind, source_info: SourceInfo) -> Self {
        Self { kind, source_info }
    }

    /// Create a new scalar node.
    pub fn new_scalar(value: impl Into<String>, style: ScalarStyle, source_info: SourceInfo) -> Self {
        Self::new(
            NodeKind::Scalar(Scalar {
                value: value.into(),
                style,
            }),
            source_info,
        )
    }

    /// The node with any anchor wrappers removed.
    ///
    /// Aliases are not followed.
    pub fn unanchored(&self) -> &YamlNode {
        match &self.kind {
            NodeKind::Anchor(_, inner) => inner.unanchored(),
            NodeKind::Scalar(_) | NodeKind::Sequence(_) | NodeKind::Mapping(_) | NodeKind::Alias(_) => {
                self
            }
        }
    }

    /// Check if this is a scalar value (looking through anchors).
    pub fn is_scalar(&self) -> bool {
        self.as_scalar().is_some()
    }

    /// Check if this is a sequence (looking through anchors).
    pub fn is_sequence(&self) -> bool {
        self.as_sequence().is_some()
    }

    /// Check if this is a mapping (looking through anchors).
    pub fn is_mapping(&self) -> bool {
        self.as_mapping().is_some()
    }

    /// Get the scalar if this is a scalar.
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match &self.unanchored().kind {
            NodeKind::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    /// Get the scalar's value if this is a scalar.
    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().map(|scalar| scalar.value.as_str())
    }

    /// Get sequence items if this is a sequence.
    pub fn as_sequence(&self) -> Option<&[YamlNode]> {
        match &self.unanchored().kind {
            NodeKind::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Get mapping entries if this is a mapping.
    pub fn as_mapping(&self) -> Option<&[YamlHashEntry]> {
        match &self.unanchored().kind {
            NodeKind::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// Get a value from a mapping by key (string comparison).
    ///
    /// Returns the first matching entry. Returns None if this is not a
    /// mapping or the key is not found.
    pub fn get(&self, key: &str) -> Option<&YamlNode> {
        self.get_entry(key).map(|entry| &entry.value)
    }

    /// Get a mapping entry by key (string comparison).
    pub fn get_entry(&self, key: &str) -> Option<&YamlHashEntry> {
        self.as_mapping()?
            .iter()
            .find(|entry| entry.key.as_str() == Some(key))
    }

    /// Get the number of children (sequence length or mapping entry count).
    pub fn len(&self) -> usize {
        match &self.unanchored().kind {
            NodeKind::Sequence(items) => items.len(),
            NodeKind::Mapping(entries) => entries.len(),
            NodeKind::Scalar(_) | NodeKind::Anchor(..) | NodeKind::Alias(_) => 0,
        }
    }

    /// Check if this node has no children.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl YamlHashEntry {
    /// Create a new YamlHashEntry.
    pub fn new(key: YamlNode, value: YamlNode) -> Self {
        Self { key, value }
    }
}
