//! LSP server implementation using tower-lsp.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};

use compose_lsp_core::{DocumentStore, IncludedDocuments, ParsedDocument};

use crate::capabilities::{definition_link_support, server_capabilities};
use crate::config::ServerConfig;
use crate::convert::{self, Utf16Lines};
use crate::workspace::{load_includes, reload_document};

/// The Compose language server.
pub struct ComposeLanguageServer {
    /// The LSP client for sending notifications.
    client: Client,
    /// Document store for open and included documents.
    documents: Arc<RwLock<DocumentStore>>,
    /// Configuration from the command line, refined at initialization.
    config: RwLock<ServerConfig>,
    /// Whether the client accepts `LocationLink` definitions.
    link_support: AtomicBool,
}

impl ComposeLanguageServer {
    /// Create a new language server instance.
    pub fn new(client: Client, config: ServerConfig) -> Self {
        Self {
            client,
            documents: Arc::new(RwLock::new(DocumentStore::new())),
            config: RwLock::new(config),
            link_support: AtomicBool::new(false),
        }
    }

    /// Load the documents a changed document includes.
    async fn refresh_includes(&self, uri: &Url) {
        let config = self.config.read().await.clone();
        let loaded = load_includes(&self.documents, uri.as_str(), &config).await;
        let pruned = self.documents.write().await.prune();
        if loaded > 0 || pruned > 0 {
            tracing::debug!(uri = %uri, loaded, pruned, "Refreshed included documents");
        }
    }

    /// The parsed document and its includes, cloned out of the store.
    async fn snapshot(&self, uri: &Url) -> Option<(Arc<ParsedDocument>, IncludedDocuments)> {
        let documents = self.documents.read().await;
        let parsed = documents.parsed(uri.as_str())?;
        let includes = documents.included_documents(uri.as_str());
        Some((parsed, includes))
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for ComposeLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        self.link_support.store(
            definition_link_support(&params.capabilities),
            Ordering::Relaxed,
        );
        {
            let mut config = self.config.write().await;
            *config = config.with_options(params.initialization_options.as_ref());
            tracing::info!(config = ?*config, "Initializing");
        }

        Ok(InitializeResult {
            capabilities: server_capabilities(),
            server_info: Some(ServerInfo {
                name: "compose-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "Compose LSP server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        let text = params.text_document.text;
        let version = params.text_document.version;

        {
            let mut documents = self.documents.write().await;
            documents.open(uri.as_str(), text, version);
        }

        self.refresh_includes(&uri).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        // We're using full document sync, so take the last change
        if let Some(change) = params.content_changes.into_iter().last() {
            {
                let mut documents = self.documents.write().await;
                documents.change(uri.as_str(), change.text, version);
            }

            self.refresh_includes(&uri).await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        let still_included = self.documents.write().await.close(uri.as_str());

        // Unsaved editor text is dropped in favour of the file on disk
        if still_included {
            reload_document(&self.documents, uri.as_str()).await;
        }
    }

    async fn document_highlight(
        &self,
        params: DocumentHighlightParams,
    ) -> Result<Option<Vec<DocumentHighlight>>> {
        let position = params.text_document_position_params;
        let Some((document, _)) = self.snapshot(&position.text_document.uri).await else {
            return Ok(None);
        };

        let lines = Utf16Lines::new(document.content());
        let spans =
            compose_lsp_core::get_document_highlights(&document, lines.position_from_lsp(&position.position));
        Ok(spans.map(|spans| {
            spans
                .iter()
                .map(|span| convert::highlight_to_lsp(&lines, span))
                .collect()
        }))
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let position = params.text_document_position_params;
        let Some((document, includes)) = self.snapshot(&position.text_document.uri).await else {
            return Ok(None);
        };

        let lines = Utf16Lines::new(document.content());
        let Some(link) = compose_lsp_core::get_definition(
            &document,
            lines.position_from_lsp(&position.position),
            &includes,
        ) else {
            return Ok(None);
        };
        let target_text = if link.target_uri == document.uri() {
            document.content()
        } else {
            includes
                .get(&link.target_uri)
                .map(ParsedDocument::content)
                .unwrap_or_default()
        };
        let link_support = self.link_support.load(Ordering::Relaxed);
        Ok(convert::definition_to_lsp(
            &link,
            link_support,
            &lines,
            &Utf16Lines::new(target_text),
        ))
    }

    async fn rename(&self, params: RenameParams) -> Result<Option<WorkspaceEdit>> {
        let position = params.text_document_position;
        let Some((document, _)) = self.snapshot(&position.text_document.uri).await else {
            return Ok(None);
        };

        let lines = Utf16Lines::new(document.content());
        let edit = compose_lsp_core::rename(
            &document,
            lines.position_from_lsp(&position.position),
            &params.new_name,
        );
        Ok(edit.and_then(|edit| convert::rename_to_lsp(&lines, &edit)))
    }

    async fn prepare_rename(
        &self,
        params: TextDocumentPositionParams,
    ) -> Result<Option<PrepareRenameResponse>> {
        let Some((document, _)) = self.snapshot(&params.text_document.uri).await else {
            return Ok(None);
        };

        let lines = Utf16Lines::new(document.content());
        let range = compose_lsp_core::prepare_rename(&document, lines.position_from_lsp(&params.position));
        Ok(range.map(|range| PrepareRenameResponse::Range(lines.range_to_lsp(&range))))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let position = params.text_document_position_params;
        let Some((document, includes)) = self.snapshot(&position.text_document.uri).await else {
            return Ok(None);
        };

        let lines = Utf16Lines::new(document.content());
        let hover = compose_lsp_core::get_hover(
            &document,
            lines.position_from_lsp(&position.position),
            &includes,
        );
        Ok(hover.map(|hover| convert::hover_to_lsp(&lines, &hover)))
    }
}

/// Run the LSP server over stdio.
pub async fn run_server(config: ServerConfig) {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(|client| ComposeLanguageServer::new(client, config));
    Server::new(stdin, stdout, socket).serve(service).await;
}
