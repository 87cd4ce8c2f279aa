//! AI analysis provider.
//!
//! Provides the [`AiProvider`] trait (content analysis + text embedding) and an
//! OpenAI-compatible HTTP implementation created via [`create_provider`].
//! Provider failures never abort a caller: [`analyze_or_default`] substitutes
//! [`AiMetadata::fallback`] and [`embed_or_empty`] yields an empty vector.

pub mod openai;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::memory::types::{AiMetadata, MemoryKind, DEFAULT_COLLECTION};

/// Errors returned by an [`AiProvider`].
#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI provider not configured: {0}")]
    NotConfigured(String),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },
    #[error("unparseable response: {0}")]
    Parse(String),
    #[error("provider returned an empty embedding")]
    EmptyEmbedding,
}

/// Black-box analysis and embedding backend.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Derive structured metadata from raw content (plus an optional base64 payload).
    async fn analyze(
        &self,
        content: &str,
        media: Option<&str>,
        kind: MemoryKind,
    ) -> Result<AiMetadata, AiError>;

    /// Embed arbitrary text into the shared vector space.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AiError>;

    /// Identifier of the embedding model, recorded alongside stored vectors.
    fn embedding_model(&self) -> &str;
}

/// Create the configured provider.
///
/// A missing API key is not fatal: the provider is still built, every call
/// fails with [`AiError::NotConfigured`], and captures fall back to defaults.
pub fn create_provider(config: &crate::config::AiConfig) -> anyhow::Result<Arc<dyn AiProvider>> {
    if config.api_key.as_deref().unwrap_or("").is_empty() {
        tracing::warn!("no AI API key configured; analysis and embeddings will use defaults");
    }
    Ok(Arc::new(openai::OpenAiCompatProvider::new(config)?))
}

/// Analyze content, substituting the fixed fallback metadata on any failure.
pub async fn analyze_or_default(
    provider: &dyn AiProvider,
    content: &str,
    media: Option<&str>,
    kind: MemoryKind,
) -> AiMetadata {
    match provider.analyze(content, media, kind).await {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::warn!(error = %e, kind = %kind, "analysis failed, using default metadata");
            AiMetadata::fallback()
        }
    }
}

/// Embed text, returning an empty vector on any failure.
pub async fn embed_or_empty(provider: &dyn AiProvider, text: &str) -> Vec<f32> {
    match provider.embed(text).await {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "embedding failed, continuing without vector");
            Vec::new()
        }
    }
}

/// Analysis payload exactly as a model returns it. Every field is optional and
/// loosely typed; [`AnalysisWire::normalize`] is the only way past the boundary.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AnalysisWire {
    pub summary: Option<String>,
    pub topics: Option<Vec<String>>,
    pub mood: Option<Vec<String>>,
    pub colors: Option<Vec<String>>,
    pub collection: Option<String>,
    pub importance: Option<serde_json::Value>,
}

impl AnalysisWire {
    /// Validate and fill defaults: importance clamped (0.5 when missing or not a
    /// number), collection "General" when blank, blank tags dropped, colors
    /// restricted to hex codes.
    pub fn normalize(self) -> AiMetadata {
        let fallback = AiMetadata::fallback();

        let topics = clean_tags(self.topics.unwrap_or_default());
        let colors: Vec<String> = self
            .colors
            .unwrap_or_default()
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| is_hex_color(c))
            .collect();

        let importance = self
            .importance
            .as_ref()
            .and_then(|v| match v {
                serde_json::Value::Number(n) => n.as_f64(),
                serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            })
            .filter(|v| v.is_finite())
            .map(|v| v.clamp(0.0, 1.0))
            .or(fallback.importance);

        let collection = self
            .collection
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_COLLECTION.to_string());

        AiMetadata {
            summary: self
                .summary
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or(fallback.summary),
            topics: if topics.is_empty() { fallback.topics } else { topics },
            mood: clean_tags(self.mood.unwrap_or_default()),
            colors: if colors.is_empty() { fallback.colors } else { colors },
            collection: Some(collection),
            related_memory_ids: Vec::new(),
            importance,
        }
    }
}

/// Trim, drop blanks, and drop case-insensitive repeats (first spelling wins).
fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty() && seen.insert(t.to_lowercase()))
        .collect()
}

fn is_hex_color(s: &str) -> bool {
    s.strip_prefix('#')
        .map(|hex| matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()))
        .unwrap_or(false)
}
