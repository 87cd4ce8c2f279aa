//! Related-memory discovery and bidirectional linking.
//!
//! [`find_related`] is pure: it scores every other memory in a corpus snapshot
//! by embedding similarity plus a flat topic-overlap boost. [`link_bidirectional`]
//! then patches each related record so the link is visible from both sides.

use serde::Serialize;

use crate::config::RelationsConfig;
use crate::memory::similarity::similarity;
use crate::memory::store::{MemoryStore, WriteOp};
use crate::memory::types::MemoryRecord;

/// Outcome of a bidirectional link pass.
#[derive(Debug, Default, Serialize)]
pub struct LinkReport {
    /// Records that now list the new memory.
    pub linked: Vec<String>,
    /// Records that already listed it and were left alone.
    pub already_linked: Vec<String>,
    /// Records already holding `max_related` links; the back-link is not added.
    pub at_capacity: Vec<String>,
    /// Records that could not be updated.
    pub failed: Vec<LinkFailure>,
}

enum LinkOutcome {
    Linked,
    AlreadyLinked,
    AtCapacity,
}

#[derive(Debug, Serialize)]
pub struct LinkFailure {
    pub id: String,
    pub error: String,
}

/// Number of `memory` topics that appear in `other` (case-insensitive).
pub fn topic_overlap(memory: &MemoryRecord, other: &MemoryRecord) -> usize {
    memory
        .metadata
        .topics
        .iter()
        .filter(|t| other.has_topic_ignore_case(t))
        .count()
}

/// Combined relation score: cosine similarity plus the topic boost when any topic is shared.
pub fn relation_score(memory: &MemoryRecord, other: &MemoryRecord, config: &RelationsConfig) -> f64 {
    let boost = if topic_overlap(memory, other) > 0 {
        config.topic_boost
    } else {
        0.0
    };
    similarity(&memory.embedding, &other.embedding) + boost
}

/// Ids of memories related to `memory`, in corpus order.
///
/// Keeps every other memory whose [`relation_score`] reaches the threshold and
/// stops after `max_related` matches. No re-sort by score. A memory without an
/// embedding can only score the topic boost, which is below any sane threshold.
pub fn find_related(
    memory: &MemoryRecord,
    corpus: &[MemoryRecord],
    config: &RelationsConfig,
) -> Vec<String> {
    corpus
        .iter()
        .filter(|other| other.id != memory.id)
        .filter(|other| relation_score(memory, other, config) >= config.threshold)
        .take(config.max_related)
        .map(|other| other.id.clone())
        .collect()
}

/// Append `new_id` to the `related_memory_ids` of every record in `related_ids`.
///
/// Each record is re-read from the store and written back on its own; a failure
/// is logged and reported without touching the rest of the batch. Ids that are
/// already present are not appended again, and a record that already lists
/// `max_related` ids keeps its existing links.
pub fn link_bidirectional(
    store: &dyn MemoryStore,
    new_id: &str,
    related_ids: &[String],
    config: &RelationsConfig,
) -> LinkReport {
    let mut report = LinkReport::default();

    for target_id in related_ids {
        if target_id == new_id {
            continue;
        }

        let result = store.get(target_id).and_then(|found| {
            let Some(mut target) = found else {
                return Err(crate::memory::store::StoreError::NotFound(target_id.clone()));
            };
            let links = &mut target.metadata.related_memory_ids;
            if links.iter().any(|id| id == new_id) {
                return Ok(LinkOutcome::AlreadyLinked);
            }
            if links.len() >= config.max_related {
                return Ok(LinkOutcome::AtCapacity);
            }
            links.push(new_id.to_string());
            store.write(&target, WriteOp::Link)?;
            Ok(LinkOutcome::Linked)
        });

        match result {
            Ok(LinkOutcome::Linked) => report.linked.push(target_id.clone()),
            Ok(LinkOutcome::AlreadyLinked) => report.already_linked.push(target_id.clone()),
            Ok(LinkOutcome::AtCapacity) => {
                tracing::debug!(target = %target_id, new = %new_id, "target has no room for another link");
                report.at_capacity.push(target_id.clone());
            }
            Err(e) => {
                tracing::warn!(target = %target_id, new = %new_id, error = %e, "failed to write back-link");
                report.failed.push(LinkFailure {
                    id: target_id.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    tracing::debug!(
        new = %new_id,
        linked = report.linked.len(),
        already_linked = report.already_linked.len(),
        at_capacity = report.at_capacity.len(),
        failed = report.failed.len(),
        "back-links written"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::store::SqliteStore;
    use crate::memory::types::{AiMetadata, MemoryKind};

    fn memory(id: &str, embedding: Vec<f32>, topics: &[&str]) -> MemoryRecord {
        MemoryRecord {
            id: id.into(),
            kind: MemoryKind::Note,
            content: id.into(),
            media_payload: None,
            metadata: AiMetadata {
                topics: topics.iter().map(|t| t.to_string()).collect(),
                ..Default::default()
            },
            embedding,
            created_at: 0,
            last_resurfaced: None,
            resurface_count: 0,
        }
    }

    #[test]
    fn excludes_self_and_low_scores() {
        let config = RelationsConfig::default();
        let me = memory("me", vec![1.0, 0.0], &[]);
        let corpus = vec![
            me.clone(),
            memory("close", vec![0.9, 0.1], &[]),
            memory("far", vec![0.0, 1.0], &[]),
        ];
        assert_eq!(find_related(&me, &corpus, &config), vec!["close"]);
    }

    #[test]
    fn topic_overlap_lifts_borderline_match() {
        let config = RelationsConfig::default();
        // cos ≈ 0.6, below 0.65 alone
        let me = memory("me", vec![0.6, 0.8], &["Design"]);
        let plain = memory("plain", vec![1.0, 0.0], &["Travel"]);
        let tagged = memory("tagged", vec![1.0, 0.0], &["design"]);

        let corpus = vec![plain, tagged];
        assert_eq!(find_related(&me, &corpus, &config), vec!["tagged"]);
    }

    #[test]
    fn topic_boost_alone_never_qualifies() {
        let config = RelationsConfig::default();
        let me = memory("me", vec![], &["Rust"]);
        let other = memory("other", vec![1.0], &["rust"]);
        assert!(find_related(&me, &[other], &config).is_empty());
    }

    #[test]
    fn caps_at_five_in_corpus_order() {
        let config = RelationsConfig::default();
        let me = memory("me", vec![1.0, 0.0], &[]);
        let corpus: Vec<MemoryRecord> = (0..8)
            .map(|i| memory(&format!("m{i}"), vec![1.0, 0.0], &[]))
            .collect();
        assert_eq!(
            find_related(&me, &corpus, &config),
            vec!["m0", "m1", "m2", "m3", "m4"]
        );
    }

    #[test]
    fn counts_overlapping_topics_case_insensitively() {
        let a = memory("a", vec![], &["Rust", "SQLite", "Cooking"]);
        let b = memory("b", vec![], &["rust", "sqlite"]);
        assert_eq!(topic_overlap(&a, &b), 2);
        assert_eq!(topic_overlap(&b, &a), 2);
    }

    #[test]
    fn link_appends_once_and_reports_missing() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.put(&memory("old", vec![1.0], &[])).unwrap();

        let related = vec!["old".to_string(), "ghost".to_string()];
        let config = RelationsConfig::default();
        let report = link_bidirectional(&store, "new", &related, &config);
        assert_eq!(report.linked, vec!["old"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].id, "ghost");

        let again = link_bidirectional(&store, "new", &related[..1], &config);
        assert_eq!(again.already_linked, vec!["old"]);

        let old = store.get("old").unwrap().unwrap();
        assert_eq!(old.metadata.related_memory_ids, vec!["new"]);
    }

    #[test]
    fn full_target_keeps_its_links() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut full = memory("full", vec![1.0], &[]);
        full.metadata.related_memory_ids = (0..5).map(|i| format!("r{i}")).collect();
        store.put(&full).unwrap();
        store.put(&memory("open", vec![1.0], &[])).unwrap();

        let related = vec!["full".to_string(), "open".to_string()];
        let report = link_bidirectional(&store, "new", &related, &RelationsConfig::default());

        assert_eq!(report.at_capacity, vec!["full"]);
        assert_eq!(report.linked, vec!["open"]);
        let full = store.get("full").unwrap().unwrap();
        assert_eq!(full.metadata.related_memory_ids.len(), 5);
        assert!(!full.metadata.related_memory_ids.contains(&"new".to_string()));
    }
}
