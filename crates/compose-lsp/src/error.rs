//! Error types for the language server.

use thiserror::Error;

/// Result type alias for compose-lsp operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading included documents.
#[derive(Debug, Error)]
pub enum Error {
    /// The URI does not name a local file.
    #[error("Not a local file: {0}")]
    NotAFile(String),

    /// Reading the file failed.
    #[error("Failed to read {uri}: {source}")]
    Read {
        uri: String,
        #[source]
        source: std::io::Error,
    },
}
