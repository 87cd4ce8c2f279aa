//! Core memory type definitions.
//!
//! Defines [`MemoryKind`] (what was captured), [`AiMetadata`] (the enrichment
//! attached to every capture), [`MemoryRecord`] (a full stored record),
//! [`Collection`], [`SearchResult`] and [`Insight`].

use serde::{Deserialize, Serialize};

/// One day in milliseconds. All timestamps in this crate are ms since the Unix epoch.
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Collection assigned when the analysis did not name one.
pub const DEFAULT_COLLECTION: &str = "General";

/// Importance assumed when a record carries none (or an invalid one).
pub const DEFAULT_IMPORTANCE: f64 = 0.5;

/// Current wall-clock time in ms since the epoch.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// The kinds of content a memory can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    /// A URL.
    Link,
    /// Free text.
    Note,
    /// An image; `media_payload` carries the base64 bytes.
    Image,
    /// A PDF document; `media_payload` carries the base64 bytes.
    Pdf,
}

impl MemoryKind {
    /// SQL-compatible string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Link => "link",
            Self::Note => "note",
            Self::Image => "image",
            Self::Pdf => "pdf",
        }
    }

    /// Whether this kind carries a binary payload alongside its content.
    pub fn has_media(&self) -> bool {
        matches!(self, Self::Image | Self::Pdf)
    }
}

impl std::fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MemoryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "link" => Ok(Self::Link),
            "note" => Ok(Self::Note),
            "image" => Ok(Self::Image),
            "pdf" => Ok(Self::Pdf),
            _ => Err(format!("unknown memory type: {s}")),
        }
    }
}

/// AI-derived enrichment attached to every memory.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AiMetadata {
    pub summary: String,
    /// Compared case-insensitively everywhere except insight counting.
    pub topics: Vec<String>,
    pub mood: Vec<String>,
    /// Hex color strings, e.g. `"#1E90FF"`.
    pub colors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    /// Ids of related memories, maintained by the relation linker.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related_memory_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub importance: Option<f64>,
}

impl AiMetadata {
    /// Metadata substituted when analysis fails entirely.
    pub fn fallback() -> Self {
        Self {
            summary: "Could not analyze content.".into(),
            topics: vec!["Uncategorized".into()],
            mood: Vec::new(),
            colors: vec!["#CCCCCC".into()],
            collection: Some(DEFAULT_COLLECTION.into()),
            related_memory_ids: Vec::new(),
            importance: Some(DEFAULT_IMPORTANCE),
        }
    }

    /// Importance clamped to `[0, 1]`, or 0.5 when missing or not finite.
    pub fn importance(&self) -> f64 {
        match self.importance {
            Some(v) if v.is_finite() => v.clamp(0.0, 1.0),
            _ => DEFAULT_IMPORTANCE,
        }
    }

    /// Collection name, defaulting to `"General"` when absent or blank.
    pub fn collection_name(&self) -> &str {
        match self.collection.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => DEFAULT_COLLECTION,
        }
    }
}

/// A memory record as held by the content store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryRecord {
    /// Opaque unique id (UUID v7 when minted by this crate).
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MemoryKind,
    /// Raw text, URL, or filename.
    pub content: String,
    /// Base64 bytes for image/pdf memories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_payload: Option<String>,
    pub metadata: AiMetadata,
    /// Empty when embedding failed.
    #[serde(default)]
    pub embedding: Vec<f32>,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_resurfaced: Option<i64>,
    #[serde(default)]
    pub resurface_count: u32,
}

impl MemoryRecord {
    /// Timestamp the user last saw this memory: last resurfacing, else creation.
    pub fn last_seen(&self) -> i64 {
        self.last_resurfaced.unwrap_or(self.created_at)
    }

    /// Whether any topic equals `topic` ignoring case.
    pub fn has_topic_ignore_case(&self, topic: &str) -> bool {
        let topic = topic.to_lowercase();
        self.metadata
            .topics
            .iter()
            .any(|t| t.to_lowercase() == topic)
    }
}

/// A named grouping of memories derived from `AiMetadata::collection`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    pub name: String,
    /// Union of every id saved under this name; never shrinks on its own.
    pub memory_ids: Vec<String>,
    pub created_at: i64,
}

/// How a search result was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Scored by the hybrid ranker.
    Ranked,
    /// Substring fallback after the ranker found nothing above threshold.
    Fallback,
    /// Short-query substring filter; no ranking.
    Lexical,
}

/// A memory with its search score.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    #[serde(flatten)]
    pub memory: MemoryRecord,
    /// Additive boosts mean this can exceed 1.0.
    pub score: f64,
    pub match_kind: MatchKind,
}

/// Category of a mined insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Pattern,
    Trend,
    Connection,
    Reminder,
}

/// A derived observation about the corpus.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
    pub memory_ids: Vec<String>,
    /// Advisory, in `[0, 1]`.
    pub relevance: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_str() {
        for kind in [MemoryKind::Link, MemoryKind::Note, MemoryKind::Image, MemoryKind::Pdf] {
            assert_eq!(kind.as_str().parse::<MemoryKind>().unwrap(), kind);
        }
        assert!("video".parse::<MemoryKind>().is_err());
    }

    #[test]
    fn importance_defaults_and_clamps() {
        let mut meta = AiMetadata::default();
        assert_eq!(meta.importance(), 0.5);
        meta.importance = Some(1.7);
        assert_eq!(meta.importance(), 1.0);
        meta.importance = Some(-0.2);
        assert_eq!(meta.importance(), 0.0);
        meta.importance = Some(f64::NAN);
        assert_eq!(meta.importance(), 0.5);
    }

    #[test]
    fn blank_collection_falls_back_to_general() {
        let mut meta = AiMetadata::default();
        assert_eq!(meta.collection_name(), "General");
        meta.collection = Some("   ".into());
        assert_eq!(meta.collection_name(), "General");
        meta.collection = Some("Recipes".into());
        assert_eq!(meta.collection_name(), "Recipes");
    }

    #[test]
    fn record_serializes_kind_as_type() {
        let record = MemoryRecord {
            id: "m1".into(),
            kind: MemoryKind::Note,
            content: "hello".into(),
            media_payload: None,
            metadata: AiMetadata::fallback(),
            embedding: vec![],
            created_at: 0,
            last_resurfaced: None,
            resurface_count: 0,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "note");
        assert_eq!(json["metadata"]["collection"], "General");
        assert!(json.get("lastResurfaced").is_none());
    }
}
