//! MCP server initialization for stdio and SSE transports.
//!
//! Provides [`serve_stdio`] and [`serve_sse`] entry points that wire up the
//! content store, AI provider, and MCP tool handler into a running server.

use crate::ai;
use crate::config::ReverieConfig;
use crate::db;
use crate::memory::store::SqliteStore;
use crate::tools::ReverieTools;
use anyhow::Result;
use rmcp::ServiceExt;
use std::sync::{Arc, Mutex};

/// Shared setup: open the store, create the AI provider, check the embedding model.
fn setup_shared_state(
    config: ReverieConfig,
) -> Result<(
    Arc<Mutex<SqliteStore>>,
    Arc<dyn ai::AiProvider>,
    Arc<ReverieConfig>,
)> {
    let db_path = config.resolved_db_path();
    let store = SqliteStore::open(&db_path)?;
    tracing::info!(db = %db_path.display(), "store ready");

    let provider = ai::create_provider(&config.ai)?;
    tracing::info!(model = %provider.embedding_model(), "AI provider ready");

    // Vectors from different models are not comparable.
    match db::migrations::get_embedding_model(store.connection())? {
        Some(stored) if stored != provider.embedding_model() => {
            tracing::warn!(
                stored = %stored,
                configured = %provider.embedding_model(),
                "embedding model changed; similarity against older memories will be meaningless"
            );
        }
        Some(_) => {}
        None => db::migrations::set_embedding_model(store.connection(), provider.embedding_model())?,
    }

    Ok((Arc::new(Mutex::new(store)), provider, Arc::new(config)))
}

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: ReverieConfig) -> Result<()> {
    tracing::info!("starting Reverie MCP server on stdio");

    let (db, ai, config) = setup_shared_state(config)?;

    let tools = ReverieTools::new(db, ai, config);
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}

/// Start the MCP server over Streamable HTTP (SSE) transport.
pub async fn serve_sse(config: ReverieConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    tracing::info!(addr = %bind_addr, "starting Reverie MCP server on SSE/HTTP");

    let (db, ai, config) = setup_shared_state(config)?;

    let service = rmcp::transport::streamable_http_server::StreamableHttpService::new(
        move || Ok(ReverieTools::new(db.clone(), ai.clone(), config.clone())),
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default()
            .into(),
        Default::default(),
    );

    let router = axum::Router::new().nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "MCP server listening at http://{bind_addr}/mcp");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutting down SSE server");
        })
        .await?;

    Ok(())
}
