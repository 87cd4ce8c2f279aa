mod ai;
mod cli;
mod config;
mod db;
mod memory;
mod server;
mod tools;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use memory::types::MemoryKind;

#[derive(Parser)]
#[command(name = "reverie", version, about = "Personal memory engine with hybrid search and resurfacing")]
struct Cli {
    /// Path to a config file (default: ~/.reverie/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server
    Serve {
        /// "stdio" or "sse" (overrides [server].transport)
        #[arg(long)]
        transport: Option<String>,
    },
    /// Capture a new memory
    Capture {
        /// link, note, image or pdf
        kind: MemoryKind,
        /// Text, URL or filename
        content: String,
        /// Image or PDF file to attach
        #[arg(long)]
        media: Option<PathBuf>,
    },
    /// Search memories
    Search {
        query: String,
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },
    /// Search as you type: one query per stdin line, debounced
    LiveSearch {
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },
    /// Resurface memories worth revisiting
    Resurface {
        #[arg(short = 'k', long)]
        count: Option<usize>,
    },
    /// Show recurring themes and reminders
    Insights,
    /// List collections, or the memories in one
    Collections { name: Option<String> },
    /// Show the memories linked to one memory
    Related { id: String },
    /// Permanently delete a memory
    Forget { id: String },
    /// Export all memories and collections as JSON
    Export,
    /// Check database health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => config::ReverieConfig::load_from(path)?,
        None => config::ReverieConfig::load()?,
    };

    // Log to stderr so stdout stays clean for MCP JSON-RPC.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve { transport } => {
            let transport = transport.unwrap_or_else(|| config.server.transport.clone());
            match transport.as_str() {
                "stdio" => server::serve_stdio(config).await?,
                "sse" | "http" => server::serve_sse(config).await?,
                other => bail!("unknown transport: {other} (expected stdio or sse)"),
            }
        }
        Command::Capture { kind, content, media } => {
            cli::capture::capture(&config, kind, &content, media.as_deref()).await?;
        }
        Command::Search { query, limit } => {
            cli::search::search(&config, &query, limit).await?;
        }
        Command::LiveSearch { limit } => {
            cli::live_search::live_search(&config, limit).await?;
        }
        Command::Resurface { count } => cli::resurface::resurface(&config, count)?,
        Command::Insights => cli::insights::insights(&config)?,
        Command::Collections { name } => cli::collections::collections(&config, name.as_deref())?,
        Command::Related { id } => cli::related::related(&config, &id)?,
        Command::Forget { id } => cli::forget::forget(&config, &id)?,
        Command::Export => cli::export::export(&config)?,
        Command::Doctor => cli::doctor::doctor(&config)?,
    }

    Ok(())
}
