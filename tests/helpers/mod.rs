#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use reverie::ai::{AiError, AiProvider};
use reverie::memory::store::{MemoryStore, SqliteStore, StoreError, WriteOp};
use reverie::memory::types::{AiMetadata, Collection, MemoryKind, MemoryRecord, DAY_MS};

/// Fixed "now" for deterministic scoring.
pub const NOW: i64 = 1_800_000_000_000;

/// Open a fresh in-memory store with schema and migrations applied.
pub fn test_store() -> SqliteStore {
    SqliteStore::open_in_memory().unwrap()
}

/// A note created `age_days` before [`NOW`] with the given topics and embedding.
pub fn memory(id: &str, content: &str, topics: &[&str], embedding: Vec<f32>, age_days: i64) -> MemoryRecord {
    MemoryRecord {
        id: id.into(),
        kind: MemoryKind::Note,
        content: content.into(),
        media_payload: None,
        metadata: AiMetadata {
            topics: topics.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        },
        embedding,
        created_at: NOW - age_days * DAY_MS,
        last_resurfaced: None,
        resurface_count: 0,
    }
}

/// Deterministic unit vector with a spike at `seed`.
pub fn spike(seed: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; 16];
    v[seed % 16] = 1.0;
    v
}

/// Scripted provider: fixed metadata per content, fixed vectors per text.
/// Anything unscripted fails the way an unreachable backend would.
#[derive(Default)]
pub struct StubProvider {
    pub metadata: HashMap<String, AiMetadata>,
    pub embeddings: HashMap<String, Vec<f32>>,
    pub embed_calls: AtomicUsize,
}

impl StubProvider {
    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    /// Script analysis (topics only, no summary) and the capture-time vector for `content`.
    pub fn script(&mut self, content: &str, topics: &[&str], vector: Vec<f32>) {
        self.metadata.insert(
            content.to_string(),
            AiMetadata {
                topics: topics.iter().map(|t| t.to_string()).collect(),
                ..Default::default()
            },
        );
        let mut text = vec![content];
        text.extend_from_slice(topics);
        self.embeddings.insert(text.join("\n"), vector);
    }
}

#[async_trait]
impl AiProvider for StubProvider {
    async fn analyze(
        &self,
        content: &str,
        _media: Option<&str>,
        _kind: MemoryKind,
    ) -> Result<AiMetadata, AiError> {
        self.metadata
            .get(content)
            .cloned()
            .ok_or_else(|| AiError::NotConfigured("stub".into()))
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, AiError> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        self.embeddings
            .get(text)
            .cloned()
            .ok_or_else(|| AiError::NotConfigured("stub".into()))
    }

    fn embedding_model(&self) -> &str {
        "stub-embedder"
    }
}

/// Store that rejects writes for selected ids and delegates everything else.
pub struct FlakyStore {
    pub inner: SqliteStore,
    pub fail_puts: HashSet<String>,
}

impl FlakyStore {
    pub fn new(inner: SqliteStore, fail_puts: &[&str]) -> Self {
        Self {
            inner,
            fail_puts: fail_puts.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl MemoryStore for FlakyStore {
    fn get_all(&self) -> Result<Vec<MemoryRecord>, StoreError> {
        self.inner.get_all()
    }

    fn get(&self, id: &str) -> Result<Option<MemoryRecord>, StoreError> {
        self.inner.get(id)
    }

    fn write(&self, record: &MemoryRecord, op: WriteOp) -> Result<(), StoreError> {
        if self.fail_puts.contains(&record.id) {
            return Err(StoreError::Other(format!("injected write failure for {}", record.id)));
        }
        self.inner.write(record, op)
    }

    fn delete(&self, id: &str) -> Result<bool, StoreError> {
        self.inner.delete(id)
    }

    fn get_by_collection_name(&self, name: &str) -> Result<Vec<MemoryRecord>, StoreError> {
        self.inner.get_by_collection_name(name)
    }

    fn collections(&self) -> Result<Vec<Collection>, StoreError> {
        self.inner.collections()
    }
}

/// Audit log operations recorded for `memory_id`, oldest first.
pub fn logged_operations(store: &SqliteStore, memory_id: &str) -> Vec<String> {
    let mut stmt = store
        .connection()
        .prepare("SELECT operation FROM memory_log WHERE memory_id = ?1 ORDER BY id")
        .unwrap();
    let ops = stmt
        .query_map([memory_id], |row| row.get::<_, String>(0))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    ops
}
