//! Compose Language Server Protocol implementation.
//!
//! This crate provides the LSP server for Compose documents, wrapping
//! `compose-lsp-core` with the tower-lsp framework and loading the files
//! named by `include` from disk.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                          compose-lsp                           │
//! │  tower-lsp wrapper, JSON-RPC/stdio, `compose-ls lsp` command   │
//! │                                                                │
//! │  ┌─────────────┐  ┌─────────────┐  ┌───────────────────────┐   │
//! │  │  server.rs  │  │ convert.rs  │  │    workspace.rs       │   │
//! │  │LanguageServer│ │ Core ↔ LSP  │  │  include loading      │   │
//! │  └──────┬──────┘  └──────┬──────┘  └──────────┬────────────┘   │
//! │         │                │                    │                │
//! │         └────────────────┴─────────┬──────────┘                │
//! │                                    │                           │
//! │  ┌─────────────────────────────────▼────────────────────────┐  │
//! │  │                    compose-lsp-core                      │  │
//! │  │          (Transport-agnostic reference resolution)       │  │
//! │  └──────────────────────────────────────────────────────────┘  │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! The LSP server is invoked via the `compose-ls lsp` subcommand:
//!
//! ```bash
//! compose-ls lsp
//! ```
//!
//! Or programmatically:
//!
//! ```rust,ignore
//! compose_lsp::run_server(compose_lsp::ServerConfig::default()).await;
//! ```

pub mod capabilities;
pub mod config;
pub mod convert;
pub mod error;
pub mod server;
pub mod workspace;

pub use config::ServerConfig;
pub use error::{Error, Result};
pub use server::{ComposeLanguageServer, run_server};
pub use workspace::{load_includes, read_document, reload_document};
