//! LSP server command implementation.

use anyhow::Result;
use compose_lsp::ServerConfig;

/// Execute the LSP server.
///
/// This starts the Compose Language Server Protocol server,
/// communicating over stdio with JSON-RPC messages.
pub fn execute(config: ServerConfig) -> Result<()> {
    // Create a new tokio runtime for the LSP server
    let runtime = tokio::runtime::Runtime::new()?;

    tracing::info!(?config, "Starting language server");
    runtime.block_on(async {
        compose_lsp::run_server(config).await;
    });

    Ok(())
}
