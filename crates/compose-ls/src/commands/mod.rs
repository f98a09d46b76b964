//! Command implementations for the compose-ls CLI
//!
//! Each command module handles the CLI interface and delegates to
//! compose-lsp or compose-lsp-core for the actual work.

pub mod lsp;
pub mod query;
