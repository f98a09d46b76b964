//! compose-ls CLI - Main entry point

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use compose_lsp::ServerConfig;

mod commands;

use commands::query::{PositionArgs, Query};

#[derive(Parser)]
#[command(name = "compose-ls")]
#[command(version)]
#[command(about = "Compose language server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the language server over stdio
    Lsp {
        /// Do not load documents named by `include`
        #[arg(long)]
        no_includes: bool,

        /// Maximum depth of nested includes to load
        #[arg(long, default_value_t = ServerConfig::default().max_include_depth)]
        max_include_depth: usize,
    },

    /// Print every occurrence of the name at a position
    Highlight(PositionArgs),

    /// Print the declaration of the name at a position
    Definition(PositionArgs),

    /// Print the hover preview for the reference at a position
    Hover(PositionArgs),

    /// Print the range a rename at a position would replace
    PrepareRename(PositionArgs),

    /// Print the edits renaming the name at a position
    Rename {
        #[command(flatten)]
        position: PositionArgs,

        /// Replacement name
        #[arg(long)]
        new_name: String,
    },
}

fn main() -> Result<()> {
    // Initialize logging; stdout carries the protocol and query output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "compose_ls=info,compose_lsp=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Lsp {
            no_includes,
            max_include_depth,
        } => commands::lsp::execute(ServerConfig {
            follow_includes: !no_includes,
            max_include_depth,
        }),
        Commands::Highlight(args) => commands::query::execute(Query::Highlight, &args),
        Commands::Definition(args) => commands::query::execute(Query::Definition, &args),
        Commands::Hover(args) => commands::query::execute(Query::Hover, &args),
        Commands::PrepareRename(args) => commands::query::execute(Query::PrepareRename, &args),
        Commands::Rename { position, new_name } => {
            commands::query::execute(Query::Rename { new_name }, &position)
        }
    }
}
