//! YAML parser that builds YamlNode trees.

use crate::{
    Error, Fragment, LineIndex, NodeKind, Result, ScalarStyle, SourceInfo, YamlDocument,
    YamlHashEntry, YamlNode,
};
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, Scanner, TScalarStyle, Token, TokenType};

/// Parse YAML from a string, returning the root of its first document.
///
/// # Example
///
/// ```rust
/// use compose_yaml::parse;
///
/// let yaml = parse("services: {}").unwrap();
/// assert!(yaml.is_mapping());
/// ```
///
/// # Errors
///
/// Returns an error if the YAML is invalid or contains no document.
pub fn parse(content: &str) -> Result<YamlNode> {
    parse_first(content, None)
}

/// Parse YAML from a string with an associated filename.
///
/// The filename is included in source location information.
///
/// # Example
///
/// ```rust
/// use compose_yaml::parse_file;
///
/// let yaml = parse_file("services: {}", "compose.yaml").unwrap();
/// assert_eq!(yaml.source_info.file, Some("compose.yaml".into()));
/// ```
///
/// # Errors
///
/// Returns an error if the YAML is invalid or contains no document.
pub fn parse_file(content: &str, filename: &str) -> Result<YamlNode> {
    parse_first(content, Some(filename))
}

/// Parse every document of a YAML stream.
///
/// Empty and comment-only streams produce an empty list.
///
/// # Example
///
/// ```rust
/// use compose_yaml::parse_stream;
///
/// let docs = parse_stream("a: 1\n---\nb: 2\n").unwrap();
/// assert_eq!(docs.len(), 2);
/// assert_eq!(docs[1].start_line, 2);
/// ```
///
/// # Errors
///
/// Returns an error if the YAML is invalid.
pub fn parse_stream(content: &str) -> Result<Vec<YamlDocument>> {
    parse_impl(content, None)
}

/// Parse every document of a YAML stream with an associated filename.
///
/// # Errors
///
/// Returns an error if the YAML is invalid.
pub fn parse_stream_file(content: &str, filename: &str) -> Result<Vec<YamlDocument>> {
    parse_impl(content, Some(filename))
}

fn parse_first(content: &str, filename: Option<&str>) -> Result<YamlNode> {
    parse_impl(content, filename)?
        .into_iter()
        .next()
        .map(|document| document.root)
        .ok_or(Error::NoDocument)
}

fn parse_impl(content: &str, filename: Option<&str>) -> Result<Vec<YamlDocument>> {
    let mut parser = Parser::new_from_str(content);
    let mut builder = YamlBuilder::new(content, filename);

    parser
        .load(&mut builder, true) // true = every document of the stream
        .map_err(Error::from)?;

    let documents = builder.documents;
    tracing::trace!(
        file = filename.unwrap_or("<memory>"),
        documents = documents.len(),
        "Parsed YAML stream"
    );
    Ok(documents)
}

/// Builder that implements MarkedEventReceiver to construct YamlNode trees.
struct YamlBuilder {
    /// The source text, by character, for recovering alias names
    chars: Vec<char>,

    /// Character offset to line/column mapping
    line_index: LineIndex,

    /// Optional filename for source info
    filename: Option<String>,

    /// Stack of collections being constructed
    stack: Vec<BuildNode>,

    /// The completed root node of the current document
    root: Option<YamlNode>,

    /// Offset of the current document's start marker
    document_start: usize,

    /// Completed documents
    documents: Vec<YamlDocument>,

    /// Every anchor of the stream, in token order
    anchors: Vec<Fragment>,
}

/// A collection being constructed during parsing.
enum BuildNode {
    Sequence {
        start: usize,
        anchor: Option<Fragment>,
        items: Vec<YamlNode>,
    },

    Mapping {
        start: usize,
        anchor: Option<Fragment>,
        entries: Vec<(YamlNode, Option<YamlNode>)>,
    },
}

impl YamlBuilder {
    fn new(source: &str, filename: Option<&str>) -> Self {
        let mut builder = Self {
            chars: source.chars().collect(),
            line_index: LineIndex::new(source),
            filename: filename.map(|s| s.to_string()),
            stack: Vec::new(),
            root: None,
            document_start: 0,
            documents: Vec::new(),
            anchors: Vec::new(),
        };
        builder.anchors = builder.scan_anchors(source);
        builder
    }

    /// Collect the `&name` tokens of the stream.
    ///
    /// Events carry only an anchor id, so anchor positions come from the
    /// scanner. Scanning stops at the first error, which the parser reports.
    fn scan_anchors(&self, source: &str) -> Vec<Fragment> {
        Scanner::new(source.chars())
            .filter_map(|Token(marker, token)| match token {
                TokenType::Anchor(name) => {
                    let len = name.chars().count();
                    Some(Fragment {
                        name,
                        source_info: self.make_source_info(marker.index() + 1, len),
                    })
                }
                _ => None,
            })
            .collect()
    }

    fn push_complete(&mut self, node: YamlNode) {
        let Some(parent) = self.stack.last_mut() else {
            // This is the root
            self.root = Some(node);
            return;
        };

        match parent {
            BuildNode::Sequence { items, .. } => items.push(node),
            BuildNode::Mapping { entries, .. } => match entries.last_mut() {
                Some((_, value @ None)) => *value = Some(node),
                // A new key
                _ => entries.push((node, None)),
            },
        }
    }

    fn finish_document(&mut self) {
        self.stack.clear();
        if let Some(root) = self.root.take() {
            let (start_line, _) = self.line_index.location(self.document_start);
            self.documents.push(YamlDocument { root, start_line });
        }
    }

    fn make_source_info(&self, offset: usize, len: usize) -> SourceInfo {
        let (line, col) = self.line_index.location(offset);
        let info = SourceInfo::new(None, offset, line, col, len);
        match &self.filename {
            Some(filename) => info.with_file(filename.clone()),
            None => info,
        }
    }

    fn text(&self, start: usize, end: usize) -> String {
        let end = end.min(self.chars.len());
        let start = start.min(end);
        self.chars[start..end].iter().collect()
    }

    /// Read an anchor or alias name starting at `start`.
    fn read_name(&self, start: usize) -> String {
        let end = (start..self.chars.len())
            .find(|&i| is_name_terminator(self.chars[i]))
            .unwrap_or(self.chars.len());
        self.text(start, end)
    }

    fn fragment(&self, name_start: usize) -> Fragment {
        let name = self.read_name(name_start);
        let len = name.chars().count();
        Fragment {
            name,
            source_info: self.make_source_info(name_start, len),
        }
    }

    fn wrap_anchor(&self, node: YamlNode, anchor: Option<Fragment>) -> YamlNode {
        match anchor {
            Some(fragment) => {
                let start = fragment.source_info.offset.saturating_sub(1);
                let len = node.source_info.end_offset().saturating_sub(start);
                let source_info = self.make_source_info(start, len);
                YamlNode::new(NodeKind::Anchor(fragment, Box::new(node)), source_info)
            }
            None => node,
        }
    }

    /// The anchor `yaml-rust2` reported by id. Ids count anchor tokens from 1
    /// across the whole stream.
    fn anchor_for(&self, anchor_id: usize) -> Option<Fragment> {
        let index = anchor_id.checked_sub(1)?;
        self.anchors.get(index).cloned()
    }

    /// End offset of a collection: its last child, or its closing bracket
    /// for flow collections.
    fn collection_end(&self, start: usize, last_child_end: Option<usize>, end_marker: usize) -> usize {
        match self.chars.get(end_marker).copied() {
            Some(']' | '}') => end_marker + 1,
            _ => last_child_end.unwrap_or(start).max(start),
        }
    }
}

impl MarkedEventReceiver for YamlBuilder {
    fn on_event(&mut self, ev: Event, marker: Marker) {
        match ev {
            Event::Nothing => {}

            Event::StreamStart => {}
            Event::StreamEnd => {}

            Event::DocumentStart => {
                self.stack.clear();
                self.root = None;
                self.document_start = marker.index();
            }

            Event::DocumentEnd => self.finish_document(),

            Event::Scalar(value, style, anchor_id, _tag) => {
                let offset = marker.index();
                let style = scalar_style(style);
                // Empty nodes are reported as a plain `~` positioned at the
                // following token.
                let value = if style == ScalarStyle::Plain
                    && value == "~"
                    && self.chars.get(offset).copied() != Some('~')
                {
                    String::new()
                } else {
                    value
                };
                let len = match style {
                    ScalarStyle::SingleQuoted | ScalarStyle::DoubleQuoted => {
                        value.chars().count() + 2
                    }
                    ScalarStyle::Plain | ScalarStyle::Block => value.chars().count(),
                };
                let source_info = self.make_source_info(offset, len);
                let node = YamlNode::new_scalar(value, style, source_info);
                let anchor = self.anchor_for(anchor_id);
                let node = self.wrap_anchor(node, anchor);
                self.push_complete(node);
            }

            Event::SequenceStart(anchor_id, _tag) => {
                let start = marker.index();
                let anchor = self.anchor_for(anchor_id);
                self.stack.push(BuildNode::Sequence {
                    start,
                    anchor,
                    items: Vec::new(),
                });
            }

            Event::SequenceEnd => {
                if let Some(BuildNode::Sequence {
                    start,
                    anchor,
                    items,
                }) = self.stack.pop()
                {
                    let last_end = items.last().map(|item| item.source_info.end_offset());
                    let end = self.collection_end(start, last_end, marker.index());
                    let source_info = self.make_source_info(start, end - start);
                    let node = YamlNode::new(NodeKind::Sequence(items), source_info);
                    let node = self.wrap_anchor(node, anchor);
                    self.push_complete(node);
                }
            }

            Event::MappingStart(anchor_id, _tag) => {
                let start = marker.index();
                let anchor = self.anchor_for(anchor_id);
                self.stack.push(BuildNode::Mapping {
                    start,
                    anchor,
                    entries: Vec::new(),
                });
            }

            Event::MappingEnd => {
                if let Some(BuildNode::Mapping {
                    start,
                    anchor,
                    entries,
                }) = self.stack.pop()
                {
                    let entries: Vec<YamlHashEntry> = entries
                        .into_iter()
                        .filter_map(|(key, value)| value.map(|value| YamlHashEntry::new(key, value)))
                        .collect();
                    let last_end = entries
                        .last()
                        .map(|entry| entry.value.source_info.end_offset());
                    let end = self.collection_end(start, last_end, marker.index());
                    let source_info = self.make_source_info(start, end - start);
                    let node = YamlNode::new(NodeKind::Mapping(entries), source_info);
                    let node = self.wrap_anchor(node, anchor);
                    self.push_complete(node);
                }
            }

            Event::Alias(_anchor_id) => {
                let offset = marker.index();
                let fragment = self.fragment(offset + 1);
                let source_info = self.make_source_info(offset, fragment.source_info.len + 1);
                self.push_complete(YamlNode::new(NodeKind::Alias(fragment), source_info));
            }
        }
    }
}

fn scalar_style(style: TScalarStyle) -> ScalarStyle {
    match style {
        TScalarStyle::Plain => ScalarStyle::Plain,
        TScalarStyle::SingleQuoted => ScalarStyle::SingleQuoted,
        TScalarStyle::DoubleQuoted => ScalarStyle::DoubleQuoted,
        _ => ScalarStyle::Block,
    }
}

fn is_name_terminator(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, ',' | '[' | ']' | '{' | '}')
}
