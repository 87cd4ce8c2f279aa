//! Insight mining over the whole corpus.
//!
//! Two detectors run in order: recurring topics (`pattern`) and important
//! memories that have not been seen for a while (`reminder`). Topic counting
//! is case-sensitive, unlike the matching in search and relations.

use crate::config::InsightsConfig;
use crate::memory::types::{Insight, InsightKind, MemoryRecord, DAY_MS};

/// Derive insights from `corpus` at time `now`. Deterministic for fixed inputs.
pub fn mine_insights(corpus: &[MemoryRecord], now: i64, config: &InsightsConfig) -> Vec<Insight> {
    if corpus.len() < config.min_memories {
        return Vec::new();
    }

    let mut insights = pattern_insights(corpus, config);
    insights.extend(reminder_insight(corpus, now, config));
    insights
}

/// Topic frequencies, one count per distinct topic per memory, most frequent
/// first. Ties keep first-seen order.
pub fn topic_frequencies(corpus: &[MemoryRecord]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for memory in corpus {
        let mut seen: Vec<&str> = Vec::new();
        for topic in &memory.metadata.topics {
            if seen.contains(&topic.as_str()) {
                continue;
            }
            seen.push(topic.as_str());
            match counts.iter_mut().find(|(t, _)| t == topic) {
                Some((_, n)) => *n += 1,
                None => counts.push((topic.clone(), 1)),
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

fn pattern_insights(corpus: &[MemoryRecord], config: &InsightsConfig) -> Vec<Insight> {
    let total = corpus.len() as f64;

    topic_frequencies(corpus)
        .into_iter()
        .filter(|(_, count)| *count >= 2)
        .take(config.max_patterns)
        .filter_map(|(topic, count)| {
            let memory_ids: Vec<String> = corpus
                .iter()
                .filter(|m| m.metadata.topics.contains(&topic))
                .map(|m| m.id.clone())
                .collect();
            if memory_ids.len() < 2 {
                return None;
            }
            Some(Insight {
                kind: InsightKind::Pattern,
                title: format!("Recurring theme: {topic}"),
                description: format!("You have saved {count} memories about {topic}."),
                memory_ids,
                relevance: (count as f64 / total).min(1.0),
            })
        })
        .collect()
}

fn reminder_insight(corpus: &[MemoryRecord], now: i64, config: &InsightsConfig) -> Option<Insight> {
    let overdue_after = config.reminder_age_days * DAY_MS;
    let memory_ids: Vec<String> = corpus
        .iter()
        .filter(|m| m.metadata.importance() > config.reminder_importance)
        .filter(|m| now - m.last_seen() > overdue_after)
        .take(config.max_reminders)
        .map(|m| m.id.clone())
        .collect();

    if memory_ids.is_empty() {
        return None;
    }

    let description = match memory_ids.len() {
        1 => format!(
            "An important memory has gone unseen for over {} days.",
            config.reminder_age_days
        ),
        n => format!(
            "{n} important memories have gone unseen for over {} days.",
            config.reminder_age_days
        ),
    };

    Some(Insight {
        kind: InsightKind::Reminder,
        title: "Worth revisiting".into(),
        description,
        memory_ids,
        relevance: config.reminder_relevance,
    })
}
