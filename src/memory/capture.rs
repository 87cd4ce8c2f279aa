//! Write path for new memories: analyze → embed → link → store.
//!
//! Split in two so callers can keep provider I/O off the database lock:
//! [`prepare_capture`] talks to the AI provider only, [`commit_capture`]
//! talks to the store only. [`capture`] runs both back to back.

use anyhow::{bail, Result};
use serde::Serialize;

use crate::ai::{analyze_or_default, embed_or_empty, AiProvider};
use crate::config::RelationsConfig;
use crate::memory::relations::{find_related, link_bidirectional, LinkReport};
use crate::memory::store::MemoryStore;
use crate::memory::types::{MemoryKind, MemoryRecord};

/// Raw input for a capture.
#[derive(Debug, Clone)]
pub struct NewMemory {
    pub kind: MemoryKind,
    pub content: String,
    /// Base64 payload; only accepted for image and pdf.
    pub media_payload: Option<String>,
}

/// Result of [`commit_capture`].
#[derive(Debug, Serialize)]
pub struct CaptureResult {
    pub memory: MemoryRecord,
    pub links: LinkReport,
}

/// Text the embedding is computed from: content, summary and topics.
pub fn embedding_text(record: &MemoryRecord) -> String {
    let mut parts = vec![record.content.as_str(), record.metadata.summary.as_str()];
    parts.extend(record.metadata.topics.iter().map(String::as_str));
    parts.retain(|p| !p.trim().is_empty());
    parts.join("\n")
}

/// Validate input, run analysis and embedding, and mint the record.
///
/// Provider failures do not fail the capture: the record gets the fallback
/// metadata and/or an empty embedding.
pub async fn prepare_capture(
    provider: &dyn AiProvider,
    new: NewMemory,
    now: i64,
) -> Result<MemoryRecord> {
    if new.content.trim().is_empty() {
        bail!("content must not be empty");
    }
    if new.media_payload.is_some() && !new.kind.has_media() {
        bail!("media payload is only accepted for image and pdf memories, got {}", new.kind);
    }

    let metadata =
        analyze_or_default(provider, &new.content, new.media_payload.as_deref(), new.kind).await;

    let mut record = MemoryRecord {
        id: uuid::Uuid::now_v7().to_string(),
        kind: new.kind,
        content: new.content,
        media_payload: new.media_payload,
        metadata,
        embedding: Vec::new(),
        created_at: now,
        last_resurfaced: None,
        resurface_count: 0,
    };
    record.embedding = embed_or_empty(provider, &embedding_text(&record)).await;

    tracing::debug!(
        id = %record.id,
        kind = %record.kind,
        dims = record.embedding.len(),
        collection = %record.metadata.collection_name(),
        "capture prepared"
    );
    Ok(record)
}

/// Link `record` against the stored corpus, persist it, then write back-links.
///
/// Failing to store the record itself is an error; failing to update a
/// related record is only reported in [`CaptureResult::links`].
pub fn commit_capture(
    store: &dyn MemoryStore,
    mut record: MemoryRecord,
    config: &RelationsConfig,
) -> Result<CaptureResult> {
    let corpus = store.get_all()?;
    let related = find_related(&record, &corpus, config);
    record.metadata.related_memory_ids = related.clone();

    store.put(&record)?;
    let links = link_bidirectional(store, &record.id, &related, config);

    tracing::info!(
        id = %record.id,
        kind = %record.kind,
        related = related.len(),
        "memory captured"
    );
    Ok(CaptureResult {
        memory: record,
        links,
    })
}

/// [`prepare_capture`] followed by [`commit_capture`].
pub async fn capture(
    store: &dyn MemoryStore,
    provider: &dyn AiProvider,
    new: NewMemory,
    now: i64,
    config: &RelationsConfig,
) -> Result<CaptureResult> {
    let record = prepare_capture(provider, new, now).await?;
    commit_capture(store, record, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::fake::FakeProvider;
    use crate::memory::store::SqliteStore;
    use crate::memory::types::AiMetadata;

    fn note(content: &str) -> NewMemory {
        NewMemory {
            kind: MemoryKind::Note,
            content: content.into(),
            media_payload: None,
        }
    }

    #[tokio::test]
    async fn rejects_empty_content_and_stray_media() {
        let provider = FakeProvider::default();
        assert!(prepare_capture(&provider, note("  "), 0).await.is_err());

        let mut with_media = note("a link");
        with_media.kind = MemoryKind::Link;
        with_media.media_payload = Some("AAAA".into());
        assert!(prepare_capture(&provider, with_media, 0).await.is_err());
    }

    #[tokio::test]
    async fn provider_failure_still_captures_with_defaults() {
        let store = SqliteStore::open_in_memory().unwrap();
        let provider = FakeProvider::default();

        let result = capture(&store, &provider, note("remember the milk"), 1_000, &RelationsConfig::default())
            .await
            .unwrap();

        assert_eq!(result.memory.metadata, AiMetadata::fallback());
        assert!(result.memory.embedding.is_empty());
        assert_eq!(store.get_all().unwrap().len(), 1);
        assert_eq!(store.get_by_collection_name("General").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn related_memories_are_linked_both_ways() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut provider = FakeProvider {
            metadata: Some(AiMetadata {
                summary: "about bread".into(),
                topics: vec!["Baking".into()],
                ..Default::default()
            }),
            ..Default::default()
        };
        let text = |content: &str| format!("{content}\nabout bread\nBaking");
        provider.embeddings.insert(text("sourdough"), vec![1.0, 0.0]);
        provider.embeddings.insert(text("rye loaf"), vec![0.9, 0.1]);
        let config = RelationsConfig::default();

        let first = capture(&store, &provider, note("sourdough"), 1_000, &config).await.unwrap();
        assert!(first.memory.metadata.related_memory_ids.is_empty());

        let second = capture(&store, &provider, note("rye loaf"), 2_000, &config).await.unwrap();
        assert_eq!(second.memory.metadata.related_memory_ids, vec![first.memory.id.clone()]);
        assert_eq!(second.links.linked, vec![first.memory.id.clone()]);

        let first_now = store.get(&first.memory.id).unwrap().unwrap();
        assert_eq!(first_now.metadata.related_memory_ids, vec![second.memory.id]);
    }

    #[test]
    fn embedding_text_skips_blank_parts() {
        let record = MemoryRecord {
            id: "x".into(),
            kind: MemoryKind::Image,
            content: "cat.png".into(),
            media_payload: None,
            metadata: AiMetadata {
                topics: vec!["Cats".into(), "Pets".into()],
                ..Default::default()
            },
            embedding: vec![],
            created_at: 0,
            last_resurfaced: None,
            resurface_count: 0,
        };
        assert_eq!(embedding_text(&record), "cat.png\nCats\nPets");
    }
}
