//! Dependency scanning over the top level of a Compose document.
//!
//! Every category (services, networks, volumes, configs, secrets, models)
//! has named entries declared under its own top-level key and references to
//! them from service attributes. The categories differ only in which service
//! attributes refer to them and in the shapes those attributes accept, so
//! they are described by the [`CATEGORIES`] table and scanned by one loop.

use compose_yaml::{NodeKind, ScalarStyle, YamlHashEntry, YamlNode};
use serde::{Deserialize, Serialize};

use crate::types::{Position, Range};

/// A kind of named Compose entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Services,
    Networks,
    Volumes,
    Configs,
    Secrets,
    Models,
}

impl Category {
    /// The top-level key declaring entities of this category.
    pub fn key(self) -> &'static str {
        self.descriptor().key
    }

    /// The descriptor for this category.
    pub fn descriptor(self) -> &'static CategoryDescriptor {
        match self {
            Category::Services => &CATEGORIES[0],
            Category::Networks => &CATEGORIES[1],
            Category::Volumes => &CATEGORIES[2],
            Category::Configs => &CATEGORIES[3],
            Category::Secrets => &CATEGORIES[4],
            Category::Models => &CATEGORIES[5],
        }
    }
}

/// The syntaxes a referencing attribute accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceShape {
    /// A sequence of names, or a mapping keyed by names.
    Names,
    /// A bare name, or `{service, file}` where only a missing `file` makes
    /// `service` a local reference.
    Extends,
    /// A sequence of names or of mappings carrying `source`.
    Sources,
    /// A sequence of `source[:target[:mode]]` strings or mappings carrying
    /// `source`, or a legacy mapping keyed by names.
    Volumes,
}

/// A service attribute referring to a category.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceAttribute {
    /// Keys leading from the service mapping to the attribute.
    pub path: &'static [&'static str],
    pub shape: ReferenceShape,
}

/// How one category is declared and referenced.
#[derive(Debug, Clone, Copy)]
pub struct CategoryDescriptor {
    pub category: Category,
    /// Top-level key whose mapping keys declare the entities.
    pub key: &'static str,
    /// Service attributes referencing the entities.
    pub attributes: &'static [ReferenceAttribute],
    /// References must be written as a sequence.
    pub array_only: bool,
}

/// Categories in matching priority order.
pub static CATEGORIES: [CategoryDescriptor; 6] = [
    CategoryDescriptor {
        category: Category::Services,
        key: "services",
        attributes: &[
            ReferenceAttribute {
                path: &["depends_on"],
                shape: ReferenceShape::Names,
            },
            ReferenceAttribute {
                path: &["extends"],
                shape: ReferenceShape::Extends,
            },
        ],
        array_only: false,
    },
    CategoryDescriptor {
        category: Category::Networks,
        key: "networks",
        attributes: &[ReferenceAttribute {
            path: &["networks"],
            shape: ReferenceShape::Names,
        }],
        array_only: false,
    },
    CategoryDescriptor {
        category: Category::Volumes,
        key: "volumes",
        attributes: &[ReferenceAttribute {
            path: &["volumes"],
            shape: ReferenceShape::Volumes,
        }],
        array_only: false,
    },
    CategoryDescriptor {
        category: Category::Configs,
        key: "configs",
        attributes: &[ReferenceAttribute {
            path: &["configs"],
            shape: ReferenceShape::Sources,
        }],
        array_only: true,
    },
    CategoryDescriptor {
        category: Category::Secrets,
        key: "secrets",
        attributes: &[
            ReferenceAttribute {
                path: &["secrets"],
                shape: ReferenceShape::Sources,
            },
            ReferenceAttribute {
                path: &["build", "secrets"],
                shape: ReferenceShape::Sources,
            },
        ],
        array_only: true,
    },
    CategoryDescriptor {
        category: Category::Models,
        key: "models",
        attributes: &[ReferenceAttribute {
            path: &["models"],
            shape: ReferenceShape::Names,
        }],
        array_only: false,
    },
];

/// How a token was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    Plain,
    SingleQuoted,
    DoubleQuoted,
}

/// A name as written in the document.
///
/// `line` and `column` are 1-based. For quoted scalars they point at the
/// first character inside the quotes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub line: usize,
    pub column: usize,
    pub text: String,
    pub kind: TokenKind,
}

impl Token {
    /// Build a token from a scalar node, looking through anchors.
    ///
    /// Block scalars, empty scalars and non-scalars have no token.
    pub fn from_node(node: &YamlNode) -> Option<Self> {
        let node = node.unanchored();
        let scalar = node.as_scalar()?;
        let (kind, offset) = match scalar.style {
            ScalarStyle::Plain => (TokenKind::Plain, 0),
            ScalarStyle::SingleQuoted => (TokenKind::SingleQuoted, 1),
            ScalarStyle::DoubleQuoted => (TokenKind::DoubleQuoted, 1),
            ScalarStyle::Block => return None,
        };
        if scalar.value.is_empty() {
            return None;
        }
        Some(Self {
            line: node.source_info.line,
            column: node.source_info.col + offset,
            text: scalar.value.clone(),
            kind,
        })
    }

    /// Length of the text in characters.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    /// Check if the token has no text.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Check if a 1-based cursor is on the token, counting the position
    /// just past its last character.
    pub fn contains(&self, line: usize, column: usize) -> bool {
        self.line == line && self.column <= column && column <= self.column + self.len()
    }

    /// The token's zero-based range.
    pub fn range(&self) -> Range {
        let line = self.line.saturating_sub(1) as u32;
        let start = self.column.saturating_sub(1) as u32;
        Range::new(
            Position::new(line, start),
            Position::new(line, start + self.len() as u32),
        )
    }

    /// The token cut at the first occurrence of `separator`, keeping its
    /// start position.
    fn truncated_at(mut self, separator: char) -> Option<Self> {
        if let Some(index) = self.text.find(separator) {
            self.text.truncate(index);
        }
        (!self.text.is_empty()).then_some(self)
    }
}

/// A key introducing a named entity under a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationToken {
    pub token: Token,
    pub category: Category,
}

/// A service attribute value naming an entity of a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceToken {
    pub token: Token,
    pub category: Category,
    pub array_only: bool,
}

/// Declarations and references of one category, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryIndex {
    pub category: Category,
    pub declarations: Vec<DeclarationToken>,
    pub references: Vec<ReferenceToken>,
}

/// Per-category declarations and references of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorizedIndex {
    categories: Vec<CategoryIndex>,
}

impl CategorizedIndex {
    /// Categories in matching priority order.
    pub fn iter(&self) -> impl Iterator<Item = &CategoryIndex> {
        self.categories.iter()
    }

    /// The index of one category.
    pub fn get(&self, category: Category) -> Option<&CategoryIndex> {
        self.categories.iter().find(|index| index.category == category)
    }
}

/// Scan the top-level entries of a document.
pub fn scan_categories(top_level: &[YamlHashEntry]) -> CategorizedIndex {
    let services = top_level_value(top_level, Category::Services.key()).and_then(YamlNode::as_mapping);

    let categories = CATEGORIES
        .iter()
        .map(|descriptor| {
            let declarations = collect_declarations(top_level, descriptor.category);
            let mut references = Vec::new();
            for service in services.unwrap_or_default() {
                collect_references(&service.value, descriptor, &mut references);
            }
            references.sort_by_key(|reference| (reference.token.line, reference.token.column));
            CategoryIndex {
                category: descriptor.category,
                declarations,
                references,
            }
        })
        .collect();

    CategorizedIndex { categories }
}

/// Declarations of one category: the keys of its top-level mapping.
///
/// A category whose value is not a mapping declares nothing.
pub fn collect_declarations(top_level: &[YamlHashEntry], category: Category) -> Vec<DeclarationToken> {
    top_level_value(top_level, category.key())
        .and_then(YamlNode::as_mapping)
        .unwrap_or_default()
        .iter()
        .filter_map(|entry| Token::from_node(&entry.key))
        .map(|token| DeclarationToken { token, category })
        .collect()
}

fn top_level_value<'a>(top_level: &'a [YamlHashEntry], key: &str) -> Option<&'a YamlNode> {
    top_level
        .iter()
        .find(|entry| entry.key.as_str() == Some(key))
        .map(|entry| &entry.value)
}

fn collect_references(service: &YamlNode, descriptor: &CategoryDescriptor, out: &mut Vec<ReferenceToken>) {
    for attribute in descriptor.attributes {
        let Some(value) = attribute
            .path
            .iter()
            .try_fold(service, |node, key| node.get(key))
        else {
            continue;
        };
        if descriptor.array_only && !value.is_sequence() {
            continue;
        }
        out.extend(attribute_tokens(value, attribute.shape).map(|token| ReferenceToken {
            token,
            category: descriptor.category,
            array_only: descriptor.array_only,
        }));
    }
}

fn attribute_tokens(value: &YamlNode, shape: ReferenceShape) -> impl Iterator<Item = Token> {
    let tokens: Vec<Token> = match shape {
        ReferenceShape::Names => name_tokens(value),
        ReferenceShape::Extends => extends_token(value).into_iter().collect(),
        ReferenceShape::Sources => value
            .as_sequence()
            .unwrap_or_default()
            .iter()
            .filter_map(source_token)
            .collect(),
        ReferenceShape::Volumes => volume_tokens(value),
    };
    tokens.into_iter()
}

fn name_tokens(value: &YamlNode) -> Vec<Token> {
    match &value.unanchored().kind {
        NodeKind::Sequence(items) => items.iter().filter_map(Token::from_node).collect(),
        NodeKind::Mapping(entries) => entries
            .iter()
            .filter_map(|entry| Token::from_node(&entry.key))
            .collect(),
        NodeKind::Scalar(_) | NodeKind::Anchor(..) | NodeKind::Alias(_) => Vec::new(),
    }
}

fn extends_token(value: &YamlNode) -> Option<Token> {
    match &value.unanchored().kind {
        NodeKind::Scalar(_) => Token::from_node(value),
        // A `file` points into another project.
        NodeKind::Mapping(_) if value.get("file").is_none() => {
            value.get("service").and_then(Token::from_node)
        }
        NodeKind::Mapping(_) | NodeKind::Sequence(_) | NodeKind::Anchor(..) | NodeKind::Alias(_) => None,
    }
}

fn source_token(item: &YamlNode) -> Option<Token> {
    match &item.unanchored().kind {
        NodeKind::Scalar(_) => Token::from_node(item),
        NodeKind::Mapping(_) => item.get("source").and_then(Token::from_node),
        NodeKind::Sequence(_) | NodeKind::Anchor(..) | NodeKind::Alias(_) => None,
    }
}

fn volume_tokens(value: &YamlNode) -> Vec<Token> {
    match &value.unanchored().kind {
        NodeKind::Sequence(items) => items
            .iter()
            .filter_map(|item| match &item.unanchored().kind {
                NodeKind::Scalar(_) => Token::from_node(item)?.truncated_at(':'),
                NodeKind::Mapping(_) => item.get("source").and_then(Token::from_node),
                NodeKind::Sequence(_) | NodeKind::Anchor(..) | NodeKind::Alias(_) => None,
            })
            .collect(),
        NodeKind::Mapping(entries) => entries
            .iter()
            .filter_map(|entry| Token::from_node(&entry.key))
            .collect(),
        NodeKind::Scalar(_) | NodeKind::Anchor(..) | NodeKind::Alias(_) => Vec::new(),
    }
}
