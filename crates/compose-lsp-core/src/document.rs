//! Document abstraction for reference resolution.
//!
//! A [`Document`] is raw text from the editor or the filesystem. A
//! [`ParsedDocument`] is the immutable tree snapshot every feature works on,
//! and [`IncludedDocuments`] is the URI → tree mapping of files pulled in by
//! an `include` directive. The [`DocumentStore`] keeps all three current.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use compose_yaml::{YamlDocument, YamlHashEntry};

use crate::include::include_uris;
use crate::types::Position;

/// A document for language analysis.
///
/// Documents hold the content and metadata needed for parsing and analysis.
#[derive(Debug, Clone)]
pub struct Document {
    /// The document's URI or path.
    uri: String,
    /// The document content.
    content: String,
    /// Version number for tracking changes (optional, used by LSP).
    version: Option<i32>,
}

impl Document {
    /// Create a new document with the given URI and content.
    pub fn new(uri: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            content: content.into(),
            version: None,
        }
    }

    /// Create a new document with a version number.
    pub fn with_version(uri: impl Into<String>, content: impl Into<String>, version: i32) -> Self {
        Self {
            uri: uri.into(),
            content: content.into(),
            version: Some(version),
        }
    }

    /// Get the document's URI.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Get the document's content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Get the document's version, if set.
    pub fn version(&self) -> Option<i32> {
        self.version
    }

    /// Get the filename from the URI (for display purposes).
    pub fn filename(&self) -> &str {
        filename(&self.uri)
    }

    /// Update the document content with a new version.
    pub fn set_content_with_version(&mut self, content: impl Into<String>, version: i32) {
        self.content = content.into();
        self.version = Some(version);
    }
}

fn filename(uri: &str) -> &str {
    uri.rsplit(['/', '\\']).next().unwrap_or(uri)
}

/// An immutable parsed snapshot of a document.
///
/// Holds every YAML document of the stream; features pick the one under the
/// cursor so that multi-document files are matched one document at a time.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    uri: String,
    content: String,
    documents: Vec<YamlDocument>,
}

impl ParsedDocument {
    /// Parse a document.
    ///
    /// # Errors
    ///
    /// Returns the YAML error if the content cannot be parsed.
    pub fn parse(document: &Document) -> compose_yaml::Result<Self> {
        Self::from_source(document.uri(), document.content())
    }

    /// Parse content for the given URI.
    ///
    /// # Errors
    ///
    /// Returns the YAML error if the content cannot be parsed.
    pub fn from_source(uri: impl Into<String>, content: impl Into<String>) -> compose_yaml::Result<Self> {
        let uri = uri.into();
        let content = content.into();
        let documents = compose_yaml::parse_stream_file(&content, filename(&uri))?;
        Ok(Self {
            uri,
            content,
            documents,
        })
    }

    /// The document's URI.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The document's text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Get the filename from the URI (for display purposes).
    pub fn filename(&self) -> &str {
        filename(&self.uri)
    }

    /// Every YAML document of the stream, in order.
    pub fn documents(&self) -> &[YamlDocument] {
        &self.documents
    }

    /// The YAML document containing a zero-based line.
    ///
    /// That is the last document starting at or before the line; lines in
    /// front of the first document belong to it.
    pub fn document_at(&self, line: u32) -> Option<&YamlDocument> {
        let line = line as usize + 1;
        self.documents
            .iter()
            .rev()
            .find(|document| document.start_line <= line)
            .or_else(|| self.documents.first())
    }

    /// Top-level entries of the YAML document under the cursor.
    ///
    /// Returns None when that document's root is not a mapping.
    pub fn top_level(&self, position: Position) -> Option<&[YamlHashEntry]> {
        self.document_at(position.line)?.root.as_mapping()
    }
}

/// Parsed documents reachable through `include`, keyed by URI.
#[derive(Debug, Clone, Default)]
pub struct IncludedDocuments {
    documents: HashMap<String, Arc<ParsedDocument>>,
}

impl IncludedDocuments {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parsed document under its own URI.
    pub fn insert(&mut self, document: Arc<ParsedDocument>) {
        self.documents.insert(document.uri().to_string(), document);
    }

    /// Get a document by URI.
    pub fn get(&self, uri: &str) -> Option<&ParsedDocument> {
        self.documents.get(uri).map(Arc::as_ref)
    }

    /// Iterate over the documents. The order is unspecified.
    pub fn iter(&self) -> impl Iterator<Item = &ParsedDocument> {
        self.documents.values().map(Arc::as_ref)
    }

    /// Number of documents in the set.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Where a stored document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentSource {
    /// Opened in the editor; its text is authoritative.
    Editor,
    /// Read from disk because another document includes it.
    Disk,
}

#[derive(Debug)]
struct StoredDocument {
    document: Document,
    parsed: Option<Arc<ParsedDocument>>,
    source: DocumentSource,
}

impl StoredDocument {
    fn new(document: Document, source: DocumentSource) -> Self {
        let parsed = parse_logged(&document);
        Self {
            document,
            parsed,
            source,
        }
    }
}

fn parse_logged(document: &Document) -> Option<Arc<ParsedDocument>> {
    match ParsedDocument::parse(document) {
        Ok(parsed) => Some(Arc::new(parsed)),
        Err(err) => {
            tracing::debug!(uri = document.uri(), error = %err, "Document did not parse");
            None
        }
    }
}

/// A document store for managing open and included documents.
///
/// Every stored document is parsed once when its text changes; requests
/// share the resulting snapshot.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: HashMap<String, StoredDocument>,
}

impl DocumentStore {
    /// Create a new empty document store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open or update a document from the editor.
    pub fn open(&mut self, uri: impl Into<String>, content: impl Into<String>, version: i32) {
        let uri = uri.into();
        let document = Document::with_version(uri.clone(), content, version);
        self.documents
            .insert(uri, StoredDocument::new(document, DocumentSource::Editor));
    }

    /// Update a document's content.
    pub fn change(&mut self, uri: &str, content: impl Into<String>, version: i32) {
        if let Some(stored) = self.documents.get_mut(uri) {
            stored.document.set_content_with_version(content, version);
            stored.parsed = parse_logged(&stored.document);
            stored.source = DocumentSource::Editor;
        }
    }

    /// Close a document opened in the editor.
    ///
    /// A document still included by another open document stays as a disk
    /// document; otherwise it is removed. Disk documents no open document
    /// reaches any more are pruned. Returns whether `uri` is still stored.
    pub fn close(&mut self, uri: &str) -> bool {
        let Some(stored) = self.documents.get_mut(uri) else {
            return false;
        };
        stored.source = DocumentSource::Disk;
        self.prune();
        self.contains(uri)
    }

    /// Remove disk documents that no editor document includes, directly or
    /// transitively. Returns the number removed.
    pub fn prune(&mut self) -> usize {
        let roots: Vec<String> = self
            .documents
            .iter()
            .filter(|(_, stored)| stored.source == DocumentSource::Editor)
            .map(|(uri, _)| uri.clone())
            .collect();
        let reachable = self.reachable_from(roots);

        let before = self.documents.len();
        self.documents.retain(|uri, stored| {
            stored.source == DocumentSource::Editor || reachable.contains(uri)
        });
        let removed = before - self.documents.len();
        if removed > 0 {
            tracing::debug!(removed, "Pruned unreferenced documents");
        }
        removed
    }

    /// Stored URIs reachable from `roots` through `include`, roots included.
    fn reachable_from(&self, roots: Vec<String>) -> HashSet<String> {
        let mut seen: HashSet<String> = roots.iter().cloned().collect();
        let mut queue: VecDeque<String> = roots.into();

        while let Some(uri) = queue.pop_front() {
            let Some(parsed) = self.parsed(&uri) else {
                continue;
            };
            for include in include_uris(&parsed) {
                if self.contains(&include) && seen.insert(include.clone()) {
                    queue.push_back(include);
                }
            }
        }

        seen
    }

    /// Store a document read from disk.
    ///
    /// Documents open in the editor are left untouched. Returns whether the
    /// document was stored.
    pub fn load(&mut self, uri: impl Into<String>, content: impl Into<String>) -> bool {
        let uri = uri.into();
        if self.source(&uri) == Some(DocumentSource::Editor) {
            return false;
        }
        let document = Document::new(uri.clone(), content);
        self.documents
            .insert(uri, StoredDocument::new(document, DocumentSource::Disk));
        true
    }

    /// Get a document by URI.
    pub fn get(&self, uri: &str) -> Option<&Document> {
        self.documents.get(uri).map(|stored| &stored.document)
    }

    /// Get the parsed snapshot of a document, if it parsed.
    pub fn parsed(&self, uri: &str) -> Option<Arc<ParsedDocument>> {
        self.documents
            .get(uri)
            .and_then(|stored| stored.parsed.clone())
    }

    /// Where a stored document came from.
    pub fn source(&self, uri: &str) -> Option<DocumentSource> {
        self.documents.get(uri).map(|stored| stored.source)
    }

    /// Get all document URIs.
    pub fn uris(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(|s| s.as_str())
    }

    /// Check if a document is in the store.
    pub fn contains(&self, uri: &str) -> bool {
        self.documents.contains_key(uri)
    }

    /// Get the number of documents in the store.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Collect the stored documents reachable from `uri` through `include`.
    ///
    /// Includes of includes are followed; the document itself is never part
    /// of the result. Includes that are not stored are skipped.
    pub fn included_documents(&self, uri: &str) -> IncludedDocuments {
        let mut included = IncludedDocuments::new();
        let mut seen: HashSet<String> = HashSet::from([uri.to_string()]);
        let mut queue: VecDeque<Arc<ParsedDocument>> = self.parsed(uri).into_iter().collect();

        while let Some(parsed) = queue.pop_front() {
            for include in include_uris(&parsed) {
                if !seen.insert(include.clone()) {
                    continue;
                }
                if let Some(child) = self.parsed(&include) {
                    queue.push_back(child.clone());
                    included.insert(child);
                }
            }
        }

        included
    }
}
