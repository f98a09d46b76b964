//! Loading included documents from disk.
//!
//! Files are read with `tokio::fs` outside the store lock and then stored as
//! disk documents. Documents open in the editor are never re-read.

use std::collections::HashSet;

use tokio::sync::RwLock;
use tower_lsp::lsp_types::Url;

use compose_lsp_core::{DocumentSource, DocumentStore, include_uris};

use crate::config::ServerConfig;
use crate::error::{Error, Result};

/// Read the document behind a `file:` URI.
///
/// # Errors
///
/// Fails for URIs that are not local files and for unreadable files.
pub async fn read_document(uri: &str) -> Result<String> {
    let path = Url::parse(uri)
        .ok()
        .and_then(|url| url.to_file_path().ok())
        .ok_or_else(|| Error::NotAFile(uri.to_string()))?;

    tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| Error::Read {
            uri: uri.to_string(),
            source,
        })
}

/// Load every document reachable from `uri` through `include`.
///
/// Includes nested deeper than the configured depth are not loaded. Files
/// that cannot be read are logged and skipped. Returns the number of
/// documents loaded.
pub async fn load_includes(documents: &RwLock<DocumentStore>, uri: &str, config: &ServerConfig) -> usize {
    if !config.follow_includes {
        return 0;
    }

    let mut visited: HashSet<String> = HashSet::from([uri.to_string()]);
    let mut level = vec![uri.to_string()];
    let mut loaded = 0;

    for depth in 1..=config.max_include_depth {
        let pending: Vec<String> = {
            let store = documents.read().await;
            level
                .iter()
                .filter_map(|uri| store.parsed(uri))
                .flat_map(|parsed| include_uris(&parsed))
                .filter(|include| visited.insert(include.clone()))
                .collect()
        };
        if pending.is_empty() {
            break;
        }

        let mut next = Vec::new();
        for include in pending {
            let open_in_editor = documents.read().await.source(&include) == Some(DocumentSource::Editor);
            if open_in_editor {
                next.push(include);
                continue;
            }

            match read_document(&include).await {
                Ok(content) => {
                    documents.write().await.load(include.clone(), content);
                    tracing::debug!(uri = %include, depth, "Loaded included document");
                    loaded += 1;
                    next.push(include);
                }
                Err(err) => {
                    tracing::warn!(error = %err, "Skipping included document");
                }
            }
        }
        level = next;
    }

    loaded
}

/// Replace a disk document with the current file contents.
///
/// Documents open in the editor are left alone. A file that cannot be read
/// keeps its previous text. Returns whether the document was reloaded.
pub async fn reload_document(documents: &RwLock<DocumentStore>, uri: &str) -> bool {
    match read_document(uri).await {
        Ok(content) => documents.write().await.load(uri, content),
        Err(err) => {
            tracing::warn!(error = %err, "Keeping previous text of closed document");
            false
        }
    }
}
