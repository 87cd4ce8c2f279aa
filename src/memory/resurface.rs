//! Resurfacing: pick older, important memories to show the user again.
//!
//! Score = importance, plus a bonus by time since the memory was last seen
//! (nothing under a week, the sweet-spot bonus up to 30 days, a smaller stale
//! bonus after that), minus a fatigue penalty per previous resurfacing.
//! Selection is pure ([`select_for_resurfacing`]); [`resurface`] additionally
//! persists the bookkeeping for each pick, one record at a time.

use serde::Serialize;

use crate::config::ResurfaceConfig;
use crate::memory::store::{MemoryStore, WriteOp};
use crate::memory::types::{MemoryRecord, DAY_MS};

/// A record picked for resurfacing with the score that put it there.
#[derive(Debug, Clone)]
pub struct ScoredMemory {
    pub memory: MemoryRecord,
    pub score: f64,
}

/// Result of a resurfacing pass.
#[derive(Debug, Serialize)]
pub struct ResurfaceOutcome {
    /// Updated records, best first.
    pub memories: Vec<MemoryRecord>,
    /// Ids whose bookkeeping could not be persisted. They are still in `memories`.
    pub failed: Vec<String>,
}

/// Resurfacing score for one memory at time `now`.
pub fn resurface_score(memory: &MemoryRecord, now: i64, config: &ResurfaceConfig) -> f64 {
    let age = now - memory.last_seen();
    let sweet_min = config.sweet_spot_min_days * DAY_MS;
    let sweet_max = config.sweet_spot_max_days * DAY_MS;

    let mut score = memory.metadata.importance();
    if age >= sweet_min && age < sweet_max {
        score += config.sweet_spot_bonus;
    } else if age >= sweet_max {
        score += config.stale_bonus;
    }
    score - config.fatigue_penalty * f64::from(memory.resurface_count)
}

/// Top `k` memories by [`resurface_score`]. Ties keep corpus order.
pub fn select_for_resurfacing(
    corpus: &[MemoryRecord],
    k: usize,
    now: i64,
    config: &ResurfaceConfig,
) -> Vec<ScoredMemory> {
    let mut scored: Vec<ScoredMemory> = corpus
        .iter()
        .map(|m| ScoredMemory {
            score: resurface_score(m, now, config),
            memory: m.clone(),
        })
        .collect();
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(k);
    scored
}

/// Select up to `k` memories and stamp each with `last_resurfaced = now` and
/// one more `resurface_count`.
///
/// Each write is independent: a failure is logged, reported in
/// [`ResurfaceOutcome::failed`], and the remaining records are still written.
pub fn resurface(
    store: &dyn MemoryStore,
    corpus: &[MemoryRecord],
    k: usize,
    now: i64,
    config: &ResurfaceConfig,
) -> ResurfaceOutcome {
    let mut outcome = ResurfaceOutcome {
        memories: Vec::new(),
        failed: Vec::new(),
    };

    for ScoredMemory { mut memory, score } in select_for_resurfacing(corpus, k, now, config) {
        memory.last_resurfaced = Some(now);
        memory.resurface_count = memory.resurface_count.saturating_add(1);

        if let Err(e) = store.write(&memory, WriteOp::Resurface) {
            tracing::warn!(id = %memory.id, error = %e, "failed to record resurfacing");
            outcome.failed.push(memory.id.clone());
        } else {
            tracing::debug!(id = %memory.id, score, count = memory.resurface_count, "resurfaced");
        }
        outcome.memories.push(memory);
    }

    tracing::info!(
        selected = outcome.memories.len(),
        failed = outcome.failed.len(),
        "resurfacing complete"
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::types::{AiMetadata, MemoryKind};

    const NOW: i64 = 1_800_000_000_000;

    fn memory(id: &str, importance: Option<f64>, age_days: i64, count: u32) -> MemoryRecord {
        MemoryRecord {
            id: id.into(),
            kind: MemoryKind::Note,
            content: id.into(),
            media_payload: None,
            metadata: AiMetadata {
                importance,
                ..Default::default()
            },
            embedding: vec![],
            created_at: NOW - age_days * DAY_MS,
            last_resurfaced: None,
            resurface_count: count,
        }
    }

    #[test]
    fn age_bands() {
        let config = ResurfaceConfig::default();
        let s = |age| resurface_score(&memory("m", Some(0.5), age, 0), NOW, &config);
        assert!((s(2) - 0.5).abs() < 1e-9);
        assert!((s(7) - 0.8).abs() < 1e-9);
        assert!((s(29) - 0.8).abs() < 1e-9);
        assert!((s(30) - 0.7).abs() < 1e-9);
        assert!((s(365) - 0.7).abs() < 1e-9);
    }

    #[test]
    fn fatigue_has_no_floor() {
        let config = ResurfaceConfig::default();
        let m = memory("m", Some(0.1), 2, 5);
        assert!((resurface_score(&m, NOW, &config) - (0.1 - 0.5)).abs() < 1e-9);
    }

    #[test]
    fn last_resurfaced_overrides_created_at() {
        let config = ResurfaceConfig::default();
        let mut m = memory("m", None, 100, 0);
        m.last_resurfaced = Some(NOW - DAY_MS);
        assert!((resurface_score(&m, NOW, &config) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn older_important_memory_wins() {
        let config = ResurfaceConfig::default();
        let corpus = vec![memory("fresh", Some(0.9), 2, 0), memory("old", Some(0.9), 40, 0)];
        let picked = select_for_resurfacing(&corpus, 5, NOW, &config);
        assert_eq!(picked[0].memory.id, "old");
        assert!((picked[0].score - 1.1).abs() < 1e-9);
        assert!((picked[1].score - 0.9).abs() < 1e-9);
    }

    #[test]
    fn k_limits_selection() {
        let config = ResurfaceConfig::default();
        let corpus: Vec<MemoryRecord> = (0..8).map(|i| memory(&format!("m{i}"), None, 10, 0)).collect();
        assert_eq!(select_for_resurfacing(&corpus, 3, NOW, &config).len(), 3);
        assert!(select_for_resurfacing(&corpus, 0, NOW, &config).is_empty());
    }
}
