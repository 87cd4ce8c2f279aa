//! Hybrid search: embedding similarity + recency decay + lexical/tag boosts.
//!
//! [`search`] is the pure ranking step over a corpus snapshot. [`run_search`]
//! wraps it with the embedding call, which is skipped for short queries and
//! degrades to a boost-only ranking when the provider fails.
//!
//! Ranking (queries of at least `min_query_len` characters):
//!
//! | Term | Contribution |
//! |------|--------------|
//! | cosine(query, memory) | `[-1, 1]`, 0 without a query embedding |
//! | recency | `max(0, 1 - age / window) * recency_weight` |
//! | substring in content/summary/topics/mood | `+substring_boost` |
//! | topic or mood equals query | `+exact_tag_boost` |
//!
//! Results scoring above `score_threshold` are returned best first. When none
//! do, every substring match is returned with a flat `fallback_score`.

use crate::ai::{embed_or_empty, AiProvider};
use crate::config::SearchConfig;
use crate::memory::similarity::similarity;
use crate::memory::types::{MatchKind, MemoryRecord, SearchResult, DAY_MS};

/// Whether `query` will take the hybrid path (and therefore needs an embedding).
pub fn needs_embedding(query: &str, config: &SearchConfig) -> bool {
    let query = query.trim();
    !query.is_empty() && query.chars().count() >= config.min_query_len
}

/// Rank `corpus` against `query`.
///
/// Returns `None` for an empty or whitespace query (no active filter). Any
/// other query returns `Some`, possibly empty.
pub fn search(
    query: &str,
    corpus: &[MemoryRecord],
    query_embedding: Option<&[f32]>,
    now: i64,
    config: &SearchConfig,
) -> Option<Vec<SearchResult>> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return None;
    }
    let needle = trimmed.to_lowercase();

    if !needs_embedding(trimmed, config) {
        return Some(lexical_results(corpus, &needle, 1.0, MatchKind::Lexical));
    }

    let mut ranked: Vec<SearchResult> = corpus
        .iter()
        .map(|memory| SearchResult {
            score: hybrid_score(memory, &needle, query_embedding, now, config),
            memory: memory.clone(),
            match_kind: MatchKind::Ranked,
        })
        .collect();

    // Stable: ties keep corpus order.
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.retain(|r| r.score > config.score_threshold);

    if ranked.is_empty() {
        tracing::debug!(query = %trimmed, "no ranked results, using substring fallback");
        return Some(lexical_results(
            corpus,
            &needle,
            config.fallback_score,
            MatchKind::Fallback,
        ));
    }

    Some(ranked)
}

/// Full hybrid score for one memory. `needle` must already be lowercased.
pub fn hybrid_score(
    memory: &MemoryRecord,
    needle: &str,
    query_embedding: Option<&[f32]>,
    now: i64,
    config: &SearchConfig,
) -> f64 {
    let mut score = query_embedding
        .map(|q| similarity(q, &memory.embedding))
        .unwrap_or(0.0);

    score += recency_score(memory.created_at, now, config) * config.recency_weight;

    let meta = &memory.metadata;
    let blob = std::iter::once(memory.content.as_str())
        .chain(std::iter::once(meta.summary.as_str()))
        .chain(meta.topics.iter().map(String::as_str))
        .chain(meta.mood.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    if blob.contains(needle) {
        score += config.substring_boost;
    }

    let exact_tag = meta
        .topics
        .iter()
        .chain(meta.mood.iter())
        .any(|tag| tag.to_lowercase() == needle);
    if exact_tag {
        score += config.exact_tag_boost;
    }

    score
}

/// Linear decay from 1 (just created) to 0 at the end of the recency window.
pub fn recency_score(created_at: i64, now: i64, config: &SearchConfig) -> f64 {
    let window = (config.recency_window_days * DAY_MS) as f64;
    if window <= 0.0 {
        return 0.0;
    }
    let age = (now - created_at) as f64;
    (1.0 - age / window).clamp(0.0, 1.0)
}

/// Substring match over content, summary and topics. `needle` must be lowercased.
pub fn lexical_match(memory: &MemoryRecord, needle: &str) -> bool {
    memory.content.to_lowercase().contains(needle)
        || memory.metadata.summary.to_lowercase().contains(needle)
        || memory
            .metadata
            .topics
            .iter()
            .any(|t| t.to_lowercase().contains(needle))
}

fn lexical_results(
    corpus: &[MemoryRecord],
    needle: &str,
    score: f64,
    match_kind: MatchKind,
) -> Vec<SearchResult> {
    corpus
        .iter()
        .filter(|m| lexical_match(m, needle))
        .map(|m| SearchResult {
            memory: m.clone(),
            score,
            match_kind,
        })
        .collect()
}

/// Embed the query when needed, then rank.
///
/// Never fails: a provider error or empty vector drops the similarity term and
/// the ranking proceeds on boosts alone.
pub async fn run_search(
    provider: &dyn AiProvider,
    query: &str,
    corpus: &[MemoryRecord],
    now: i64,
    config: &SearchConfig,
) -> Option<Vec<SearchResult>> {
    let query_embedding = if needs_embedding(query, config) {
        let v = embed_or_empty(provider, query.trim()).await;
        (!v.is_empty()).then_some(v)
    } else {
        None
    };

    let results = search(query, corpus, query_embedding.as_deref(), now, config);
    if let Some(ref r) = results {
        tracing::info!(
            query = %query.trim(),
            results = r.len(),
            semantic = query_embedding.is_some(),
            "search complete"
        );
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::fake::FakeProvider;
    use crate::memory::types::{AiMetadata, MemoryKind};
    use std::sync::atomic::Ordering;

    const NOW: i64 = 1_800_000_000_000;

    fn memory(id: &str, content: &str, topics: &[&str], mood: &[&str], age_days: i64) -> MemoryRecord {
        MemoryRecord {
            id: id.into(),
            kind: MemoryKind::Note,
            content: content.into(),
            media_payload: None,
            metadata: AiMetadata {
                summary: String::new(),
                topics: topics.iter().map(|t| t.to_string()).collect(),
                mood: mood.iter().map(|t| t.to_string()).collect(),
                ..Default::default()
            },
            embedding: vec![],
            created_at: NOW - age_days * DAY_MS,
            last_resurfaced: None,
            resurface_count: 0,
        }
    }

    #[test]
    fn empty_query_is_none() {
        let corpus = vec![memory("a", "anything", &[], &[], 0)];
        let config = SearchConfig::default();
        assert!(search("", &corpus, None, NOW, &config).is_none());
        assert!(search("   \t", &corpus, None, NOW, &config).is_none());
    }

    #[test]
    fn short_query_is_lexical_in_corpus_order() {
        let config = SearchConfig::default();
        let corpus = vec![
            memory("a", "Go to the market", &[], &[], 90),
            memory("b", "nothing here", &["Gardening"], &[], 1),
            memory("c", "unrelated", &[], &[], 1),
        ];
        let results = search("GO", &corpus, None, NOW, &config).unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.memory.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(results.iter().all(|r| r.match_kind == MatchKind::Lexical));
    }

    #[test]
    fn exact_tag_boost_applies_without_similarity() {
        let config = SearchConfig::default();
        let m = memory("m", "a photo of a barn", &["Red"], &[], 120);
        let score = hybrid_score(&m, "red", None, NOW, &config);
        // substring (topic contains "red") + exact tag
        assert!((score - 0.60).abs() < 1e-9, "got {score}");

        let results = search("Red", &[m], None, NOW, &config).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].match_kind, MatchKind::Ranked);
    }

    #[test]
    fn mood_counts_for_exact_tag() {
        let config = SearchConfig::default();
        let m = memory("m", "evening walk", &[], &["Calm"], 120);
        let score = hybrid_score(&m, "calm", None, NOW, &config);
        assert!((score - 0.60).abs() < 1e-9);
    }

    #[test]
    fn recency_decays_linearly_and_floors_at_zero() {
        let config = SearchConfig::default();
        assert_eq!(recency_score(NOW, NOW, &config), 1.0);
        assert!((recency_score(NOW - 30 * DAY_MS, NOW, &config) - 0.5).abs() < 1e-9);
        assert_eq!(recency_score(NOW - 60 * DAY_MS, NOW, &config), 0.0);
        assert_eq!(recency_score(NOW - 400 * DAY_MS, NOW, &config), 0.0);
    }

    #[test]
    fn ranks_by_similarity_and_boosts() {
        let config = SearchConfig::default();
        let mut close = memory("close", "sourdough starter", &[], &[], 100);
        close.embedding = vec![1.0, 0.0];
        let mut closer_and_named = memory("named", "bread baking notes", &["Bread"], &[], 100);
        closer_and_named.embedding = vec![1.0, 0.0];
        let mut far = memory("far", "tax forms", &[], &[], 100);
        far.embedding = vec![0.0, 1.0];

        let q = [1.0_f32, 0.0];
        let results = search("bread", &[close, closer_and_named, far], Some(&q), NOW, &config).unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.memory.id.as_str()).collect();
        assert_eq!(ids, vec!["named", "close"]);
        assert!(results[0].score > 1.0);
    }

    #[test]
    fn ties_keep_corpus_order() {
        let config = SearchConfig::default();
        let corpus = vec![
            memory("first", "kayak trip", &[], &[], 100),
            memory("second", "kayak repair", &[], &[], 100),
        ];
        // each scores 0.25 < 0.40 without help, so give both the exact tag too
        let corpus: Vec<MemoryRecord> = corpus
            .into_iter()
            .map(|mut m| {
                m.metadata.topics = vec!["kayak".into()];
                m
            })
            .collect();
        let results = search("kayak", &corpus, None, NOW, &config).unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.memory.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
    }

    #[test]
    fn falls_back_to_substring_with_flat_score() {
        let config = SearchConfig::default();
        // substring alone gives 0.25, under the 0.40 threshold
        let corpus = vec![
            memory("a", "notes on photography", &[], &[], 100),
            memory("b", "grocery list", &[], &[], 100),
        ];
        let results = search("photo", &corpus, None, NOW, &config).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].memory.id, "a");
        assert_eq!(results[0].score, 0.5);
        assert_eq!(results[0].match_kind, MatchKind::Fallback);
    }

    #[test]
    fn no_match_anywhere_is_empty_not_none() {
        let config = SearchConfig::default();
        let corpus = vec![memory("a", "grocery list", &[], &[], 100)];
        let results = search("zebra", &corpus, None, NOW, &config);
        assert_eq!(results.map(|r| r.len()), Some(0));
    }

    #[test]
    fn mood_does_not_count_in_fallback() {
        let config = SearchConfig::default();
        // mood substring only: ranked score 0.25 (blob includes mood), fallback excludes mood
        let corpus = vec![memory("a", "walk", &[], &["melancholy"], 100)];
        let results = search("melan", &corpus, None, NOW, &config).unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn short_queries_never_embed() {
        let provider = FakeProvider::default();
        let config = SearchConfig::default();
        let corpus = vec![memory("a", "ab testing", &[], &[], 1)];

        let results = run_search(&provider, "ab", &corpus, NOW, &config).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(provider.embed_calls.load(Ordering::SeqCst), 0);

        run_search(&provider, "testing", &corpus, NOW, &config).await;
        assert_eq!(provider.embed_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn embedding_failure_degrades_to_boosts() {
        let provider = FakeProvider::default(); // no canned embeddings → error
        let config = SearchConfig::default();
        let mut m = memory("a", "a red barn", &["Red"], &[], 100);
        m.embedding = vec![1.0, 0.0];
        let results = run_search(&provider, "red", &[m], NOW, &config).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!((results[0].score - 0.60).abs() < 1e-9);
    }

    #[tokio::test]
    async fn query_embedding_feeds_similarity() {
        let mut provider = FakeProvider::default();
        provider.embeddings.insert("ocean".into(), vec![0.0, 1.0]);
        let config = SearchConfig::default();
        let mut m = memory("a", "beach day", &[], &[], 100);
        m.embedding = vec![0.0, 2.0];
        let results = run_search(&provider, "ocean", &[m], NOW, &config).await.unwrap();
        assert_eq!(results[0].match_kind, MatchKind::Ranked);
        assert!((results[0].score - 1.0).abs() < 1e-9);
    }
}
