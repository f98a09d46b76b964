//! One-shot reference queries.
//!
//! Each query opens a file the way the language server would, loads its
//! includes, runs one feature and prints the result as JSON (`null` when
//! the position is not on a reference).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::Args;
use tokio::sync::RwLock;
use url::Url;

use compose_lsp::{ServerConfig, load_includes};
use compose_lsp_core::{
    DocumentStore, IncludedDocuments, ParsedDocument, Position, get_definition,
    get_document_highlights, get_hover, prepare_rename, rename,
};

/// A file and a zero-based position in it.
#[derive(Debug, Args)]
pub struct PositionArgs {
    /// Compose file to query
    pub file: PathBuf,

    /// Zero-based line
    #[arg(long)]
    pub line: u32,

    /// Zero-based character offset within the line
    #[arg(long)]
    pub character: u32,

    /// Do not load documents named by `include`
    #[arg(long)]
    pub no_includes: bool,
}

/// The feature to run.
#[derive(Debug, Clone)]
pub enum Query {
    Highlight,
    Definition,
    Hover,
    PrepareRename,
    Rename { new_name: String },
}

/// Run a query and print its result.
pub fn execute(query: Query, args: &PositionArgs) -> Result<()> {
    let output = run(&query, args)?;
    println!("{output}");
    Ok(())
}

/// Run a query and render its result as pretty JSON.
pub fn run(query: &Query, args: &PositionArgs) -> Result<String> {
    let path = std::fs::canonicalize(&args.file)
        .with_context(|| format!("Failed to resolve {}", args.file.display()))?;
    let uri = file_uri(&path)?;
    let content =
        std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;

    let document = ParsedDocument::from_source(uri.as_str(), content.as_str())
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    let config = ServerConfig {
        follow_includes: !args.no_includes,
        ..ServerConfig::default()
    };
    let includes = collect_includes(uri.as_str(), &content, &config)?;
    let position = Position::new(args.line, args.character);
    tracing::debug!(uri = %uri, ?position, ?query, includes = includes.len(), "Running query");

    let value = match query {
        Query::Highlight => serde_json::to_value(get_document_highlights(&document, position))?,
        Query::Definition => serde_json::to_value(get_definition(&document, position, &includes))?,
        Query::Hover => serde_json::to_value(get_hover(&document, position, &includes))?,
        Query::PrepareRename => serde_json::to_value(prepare_rename(&document, position))?,
        Query::Rename { new_name } => serde_json::to_value(rename(&document, position, new_name))?,
    };
    Ok(serde_json::to_string_pretty(&value)?)
}

fn file_uri(path: &Path) -> Result<Url> {
    Url::from_file_path(path).map_err(|()| anyhow!("Not an absolute path: {}", path.display()))
}

/// Load the includes of a document with the language server's loader.
fn collect_includes(uri: &str, content: &str, config: &ServerConfig) -> Result<IncludedDocuments> {
    let runtime = tokio::runtime::Runtime::new()?;
    let includes = runtime.block_on(async {
        let documents = RwLock::new(DocumentStore::new());
        documents.write().await.open(uri, content, 0);
        load_includes(&documents, uri, config).await;
        documents.read().await.included_documents(uri)
    });
    Ok(includes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn args(file: PathBuf, line: u32, character: u32) -> PositionArgs {
        PositionArgs {
            file,
            line,
            character,
            no_includes: false,
        }
    }

    #[test]
    fn highlight_prints_spans() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("compose.yaml");
        fs::write(&file, "services:\n  web:\n    depends_on: [db]\n  db: {}\n").unwrap();

        let output = run(&Query::Highlight, &args(file, 2, 18)).unwrap();
        let spans: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(spans.as_array().map(Vec::len), Some(2));
        assert_eq!(spans[0]["kind"], "read");
        assert_eq!(spans[1]["kind"], "write");
    }

    #[test]
    fn no_match_prints_null() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("compose.yaml");
        fs::write(&file, "services:\n  web:\n    image: nginx\n").unwrap();

        assert_eq!(run(&Query::Hover, &args(file, 2, 12)).unwrap(), "null");
    }

    #[test]
    fn definition_follows_includes_unless_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("compose.yaml");
        fs::write(
            &file,
            "include:\n  - other.yaml\nservices:\n  web:\n    depends_on:\n      - redis\n",
        )
        .unwrap();
        fs::write(dir.path().join("other.yaml"), "services:\n  redis:\n    image: redis:alpine\n").unwrap();

        let output = run(&Query::Definition, &args(file.clone(), 5, 9)).unwrap();
        let link: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert!(link["target_uri"].as_str().unwrap().ends_with("/other.yaml"));
        assert_eq!(link["target_range"]["start"]["line"], 1);

        let mut without = args(file, 5, 9);
        without.no_includes = true;
        assert_eq!(run(&Query::Definition, &without).unwrap(), "null");
    }

    #[test]
    fn unparseable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("compose.yaml");
        fs::write(&file, "services: [\n").unwrap();

        let err = run(&Query::Highlight, &args(file, 0, 0)).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse"));
    }
}
