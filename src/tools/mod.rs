pub mod capture_memory;
pub mod forget_memory;
pub mod list_collections;
pub mod memory_insights;
pub mod resurface_memories;
pub mod search_memories;

use capture_memory::CaptureMemoryParams;
use forget_memory::ForgetMemoryParams;
use list_collections::ListCollectionsParams;
use memory_insights::MemoryInsightsParams;
use resurface_memories::ResurfaceMemoriesParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use search_memories::SearchMemoriesParams;
use serde_json::json;
use std::sync::{Arc, Mutex};

use crate::ai::AiProvider;
use crate::config::ReverieConfig;
use crate::memory::capture::{commit_capture, prepare_capture, NewMemory};
use crate::memory::store::{MemoryStore, SqliteStore};
use crate::memory::types::{now_ms, MemoryKind, MemoryRecord};

const DEFAULT_MAX_RESULTS: usize = 20;

/// The Reverie MCP tool handler. Holds shared state (store, AI provider,
/// config) and exposes all MCP tools via the `#[tool_router]` macro.
#[derive(Clone)]
pub struct ReverieTools {
    tool_router: ToolRouter<Self>,
    db: Arc<Mutex<SqliteStore>>,
    ai: Arc<dyn AiProvider>,
    config: Arc<ReverieConfig>,
}

#[tool_router]
impl ReverieTools {
    pub fn new(
        db: Arc<Mutex<SqliteStore>>,
        ai: Arc<dyn AiProvider>,
        config: Arc<ReverieConfig>,
    ) -> Self {
        Self {
            tool_router: Self::tool_router(),
            db,
            ai,
            config,
        }
    }

    /// Capture a new memory: analyze, embed, link to related memories, store.
    #[tool(description = "Capture a new memory (note, link, image, or pdf). It is analyzed for summary, topics, mood, colors, collection and importance, then linked to related memories.")]
    async fn capture_memory(
        &self,
        Parameters(params): Parameters<CaptureMemoryParams>,
    ) -> Result<String, String> {
        let kind: MemoryKind = params.r#type.parse().map_err(|e: String| e)?;

        tracing::info!(
            content_len = params.content.len(),
            kind = %kind,
            has_media = params.media_payload.is_some(),
            "capture_memory called"
        );

        // Provider I/O first, without holding the store.
        let new = NewMemory {
            kind,
            content: params.content,
            media_payload: params.media_payload,
        };
        let record = prepare_capture(self.ai.as_ref(), new, now_ms())
            .await
            .map_err(|e| e.to_string())?;

        let relations = self.config.relations.clone();
        let result = self
            .with_store(move |store| commit_capture(store, record, &relations))
            .await?;

        Ok(json!({
            "memory": memory_view(&result.memory),
            "links": result.links,
        })
        .to_string())
    }

    /// Search memories with hybrid semantic + keyword ranking.
    #[tool(description = "Search memories by free text. Returns results ranked by semantic similarity, recency, and keyword/tag matches, falling back to plain substring matches.")]
    async fn search_memories(
        &self,
        Parameters(params): Parameters<SearchMemoriesParams>,
    ) -> Result<String, String> {
        tracing::info!(query = %params.query, collection = ?params.collection, "search_memories called");

        let corpus = self.load_corpus(params.collection.clone()).await?;
        let results = crate::memory::search::run_search(
            self.ai.as_ref(),
            &params.query,
            &corpus,
            now_ms(),
            &self.config.search,
        )
        .await;

        let Some(results) = results else {
            return Ok(json!({ "active": false, "results": [], "total_matched": 0 }).to_string());
        };

        let total_matched = results.len();
        let max_results = params.max_results.unwrap_or(DEFAULT_MAX_RESULTS);
        let views: Vec<serde_json::Value> = results
            .iter()
            .take(max_results)
            .map(|r| {
                let mut view = memory_view(&r.memory);
                view["score"] = json!(r.score);
                view["match"] = json!(r.match_kind);
                view
            })
            .collect();

        Ok(json!({ "active": true, "results": views, "total_matched": total_matched }).to_string())
    }

    /// Resurface older, important memories.
    #[tool(description = "Resurface memories worth revisiting, chosen by importance, time since last seen, and how often they were already resurfaced. Updates their resurfacing bookkeeping.")]
    async fn resurface_memories(
        &self,
        Parameters(params): Parameters<ResurfaceMemoriesParams>,
    ) -> Result<String, String> {
        let count = params.count.unwrap_or(self.config.resurface.default_count);
        tracing::info!(count, "resurface_memories called");

        let config = self.config.resurface.clone();
        let outcome = self
            .with_store(move |store| {
                let corpus = store.get_all()?;
                Ok(crate::memory::resurface::resurface(
                    store,
                    &corpus,
                    count,
                    now_ms(),
                    &config,
                ))
            })
            .await?;

        let views: Vec<serde_json::Value> = outcome.memories.iter().map(memory_view).collect();
        Ok(json!({ "memories": views, "failed": outcome.failed }).to_string())
    }

    /// Mine recurring patterns and reminders from the corpus.
    #[tool(description = "Get insights about the memory corpus: recurring topics and important memories that have not been seen for a while.")]
    async fn memory_insights(
        &self,
        Parameters(params): Parameters<MemoryInsightsParams>,
    ) -> Result<String, String> {
        tracing::info!(collection = ?params.collection, "memory_insights called");

        let corpus = self.load_corpus(params.collection).await?;
        let insights =
            crate::memory::insights::mine_insights(&corpus, now_ms(), &self.config.insights);

        serde_json::to_string(&json!({ "insights": insights }))
            .map_err(|e| format!("serialization failed: {e}"))
    }

    /// List collections.
    #[tool(description = "List memory collections with their member ids. Pass a name to also get that collection's memories.")]
    async fn list_collections(
        &self,
        Parameters(params): Parameters<ListCollectionsParams>,
    ) -> Result<String, String> {
        tracing::info!(name = ?params.name, "list_collections called");

        let (collections, members) = self
            .with_store(move |store| {
                let collections = store.collections()?;
                let members = match params.name {
                    Some(ref name) => Some(store.get_by_collection_name(name)?),
                    None => None,
                };
                Ok((collections, members))
            })
            .await?;

        let mut response = json!({ "collections": collections });
        if let Some(members) = members {
            response["memories"] =
                serde_json::Value::Array(members.iter().map(memory_view).collect());
        }
        Ok(response.to_string())
    }

    /// Delete a memory.
    #[tool(description = "Permanently delete a memory by ID.")]
    async fn forget_memory(
        &self,
        Parameters(params): Parameters<ForgetMemoryParams>,
    ) -> Result<String, String> {
        tracing::info!(id = %params.memory_id, "forget_memory called");

        let id = params.memory_id.clone();
        let removed = self
            .with_store(move |store| Ok(store.delete(&id)?))
            .await?;
        if !removed {
            return Err(format!("memory not found: {}", params.memory_id));
        }

        Ok(json!({ "id": params.memory_id, "deleted": true }).to_string())
    }
}

impl ReverieTools {
    /// Run blocking store work on the blocking pool, holding the lock only there.
    async fn with_store<T, F>(&self, f: F) -> Result<T, String>
    where
        F: FnOnce(&SqliteStore) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let store = db
                .lock()
                .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
            f(&*store)
        })
        .await
        .map_err(|e| format!("db task failed: {e}"))?
        .map_err(|e| format!("store failed: {e}"))
    }

    /// Fresh corpus snapshot, optionally limited to one collection.
    async fn load_corpus(&self, collection: Option<String>) -> Result<Vec<MemoryRecord>, String> {
        self.with_store(move |store| match collection {
            Some(name) => Ok(store.get_by_collection_name(&name)?),
            None => Ok(store.get_all()?),
        })
        .await
    }
}

/// Compact JSON view of a record: no embedding, no media payload.
pub fn memory_view(record: &MemoryRecord) -> serde_json::Value {
    let meta = &record.metadata;
    json!({
        "id": record.id,
        "type": record.kind,
        "content": record.content,
        "summary": meta.summary,
        "topics": meta.topics,
        "mood": meta.mood,
        "colors": meta.colors,
        "collection": meta.collection_name(),
        "importance": meta.importance(),
        "relatedMemoryIds": meta.related_memory_ids,
        "createdAt": record.created_at,
        "lastResurfaced": record.last_resurfaced,
        "resurfaceCount": record.resurface_count,
        "hasMedia": record.media_payload.is_some(),
    })
}

#[tool_handler]
impl ServerHandler for ReverieTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "Reverie is a personal memory engine. Use capture_memory to save things, \
                 search_memories to find them, resurface_memories to revisit older ones, \
                 and memory_insights to see recurring themes."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
