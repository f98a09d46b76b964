//! Transport-agnostic reference resolution for Compose documents.
//!
//! This crate answers "what does the name under the cursor refer to" for
//! Compose YAML files without any LSP protocol dependencies. It performs no
//! I/O: callers supply parsed documents and the documents reachable through
//! `include`.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        compose-lsp-core                         │
//! │     scanner + fragments → matcher (+ include lookup) → features │
//! └─────────────────────────────────────────────────────────────────┘
//!             │                                    │
//!             ▼                                    ▼
//! ┌───────────────────────┐          ┌─────────────────────────────┐
//! │     compose-lsp       │          │   compose-ls query commands │
//! │  (Native LSP server)  │          │        (JSON output)        │
//! └───────────────────────┘          └─────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust
//! use compose_lsp_core::{get_document_highlights, IncludedDocuments, ParsedDocument, Position};
//!
//! let content = "services:\n  web:\n    depends_on: [db]\n  db:\n    image: postgres\n";
//! let doc = ParsedDocument::from_source("file:///project/compose.yaml", content).unwrap();
//!
//! // Every occurrence of `db`
//! let spans = get_document_highlights(&doc, Position::new(2, 18)).unwrap();
//! assert_eq!(spans.len(), 2);
//!
//! // Declarations may live in included files
//! let link = compose_lsp_core::get_definition(&doc, Position::new(2, 18), &IncludedDocuments::new());
//! assert_eq!(link.unwrap().target_range.start.line, 3);
//! ```

pub mod definition;
pub mod document;
pub mod fragments;
pub mod highlight;
pub mod hover;
pub mod include;
pub mod matcher;
pub mod rename;
pub mod scanner;
pub mod types;

// Re-export main types and functions for convenience
pub use definition::get_definition;
pub use document::{Document, DocumentSource, DocumentStore, IncludedDocuments, ParsedDocument};
pub use fragments::{FragmentMatch, FragmentRole, FragmentToken, Fragments, find_fragments, resolve_fragment};
pub use highlight::get_document_highlights;
pub use hover::get_hover;
pub use include::{IncludedDeclaration, include_paths, include_uris, lookup_declaration, resolve_include_uri};
pub use matcher::{DependencyReference, ReferenceTarget, highlight};
pub use rename::{prepare_rename, rename};
pub use scanner::{
    CATEGORIES, CategorizedIndex, Category, CategoryDescriptor, CategoryIndex, DeclarationToken,
    ReferenceToken, Token, TokenKind, scan_categories,
};
pub use types::{DefinitionLink, HighlightKind, HighlightSpan, HoverResult, Position, Range, RenameEdit, TextEdit};
