//! # compose-yaml
//!
//! YAML parsing with source location tracking for Compose documents.
//!
//! This crate turns the event stream of `yaml-rust2` into a tree of
//! [`YamlNode`]s where every node, key, anchor and alias carries its position
//! in the original text. Anchors and aliases are kept as first-class node
//! variants instead of being expanded, so editor features can find and rename
//! them.
//!
//! ## Design
//!
//! Uses the **owned data approach**: every node owns its children and its
//! [`SourceInfo`]. Trees have no lifetime parameters, so a parsed document can
//! be cached behind an `Arc` and shared between concurrent requests.
//!
//! ## Example
//!
//! ```rust
//! use compose_yaml::parse;
//!
//! let content = "services:\n  web:\n    image: nginx\n";
//!
//! let yaml = parse(content).unwrap();
//! let web = yaml.get("services").and_then(|s| s.get("web")).unwrap();
//! assert_eq!(web.source_info.line, 3);
//! ```

mod error;
mod node;
mod parser;
mod source_info;

pub use error::{Error, Result};
pub use node::{Fragment, NodeKind, Scalar, ScalarStyle, YamlDocument, YamlHashEntry, YamlNode};
pub use parser::{parse, parse_file, parse_stream, parse_stream_file};
pub use source_info::{LineIndex, SourceInfo};
