//! OpenAI-compatible analysis and embedding provider.
//!
//! - Analysis: `POST {base_url}/chat/completions` with a JSON-object response
//!   format. Images are attached as `image_url` data URLs, PDFs as `file` parts.
//! - Embeddings: `POST {base_url}/embeddings` with `{ model, input }`.
//!
//! Works with any server that speaks the same wire format via `base_url`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{AiError, AiProvider, AnalysisWire};
use crate::config::AiConfig;
use crate::memory::types::{AiMetadata, MemoryKind};

const ANALYSIS_PROMPT: &str = "You enrich personal memories. Reply with a single JSON object with keys: \
summary (one or two sentences), topics (1-5 short tags), mood (1-3 words), \
colors (2-5 hex codes evoking the content), collection (a short category name), \
importance (number between 0 and 1).";

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

/// Provider for OpenAI-style chat + embeddings endpoints.
///
/// The reqwest `Client` is internally reference counted; all fields are
/// immutable after construction.
pub struct OpenAiCompatProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    analysis_model: String,
    embedding_model: String,
}

impl OpenAiCompatProvider {
    pub fn new(config: &AiConfig) -> Result<Self, AiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            analysis_model: config.analysis_model.clone(),
            embedding_model: config.embedding_model.clone(),
        })
    }

    /// POST a JSON body and return the raw success body.
    async fn post(&self, path: &str, body: &serde_json::Value) -> Result<Vec<u8>, AiError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AiError::NotConfigured("set REVERIE_API_KEY or [ai].api_key".into()))?;

        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorResponse>(&bytes)
                .ok()
                .and_then(|e| e.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| String::from_utf8_lossy(&bytes).into_owned());
            return Err(AiError::Server {
                status: status.as_u16(),
                message,
            });
        }

        Ok(bytes.to_vec())
    }
}

/// Build the user message parts for a capture.
fn user_content(content: &str, media: Option<&str>, kind: MemoryKind) -> serde_json::Value {
    let text = match kind {
        MemoryKind::Link => format!("Analyze this link: {content}"),
        MemoryKind::Note => format!("Analyze this note:\n{content}"),
        MemoryKind::Image => format!("Analyze this image (file: {content})."),
        MemoryKind::Pdf => format!("Analyze this PDF document (file: {content})."),
    };

    let mut parts = vec![json!({ "type": "text", "text": text })];
    match (kind, media) {
        (MemoryKind::Image, Some(payload)) => parts.push(json!({
            "type": "image_url",
            "image_url": { "url": data_url(payload, "image/png") },
        })),
        (MemoryKind::Pdf, Some(payload)) => parts.push(json!({
            "type": "file",
            "file": { "filename": content, "file_data": data_url(payload, "application/pdf") },
        })),
        _ => {}
    }
    serde_json::Value::Array(parts)
}

/// Payloads may already be data URLs; bare base64 gets the given MIME type.
fn data_url(payload: &str, mime: &str) -> String {
    if payload.starts_with("data:") {
        payload.to_string()
    } else {
        format!("data:{mime};base64,{payload}")
    }
}

/// Models sometimes wrap JSON in a markdown fence.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

/// Parse the model's message text into normalized metadata.
pub(crate) fn parse_analysis(raw: &str) -> Result<AiMetadata, AiError> {
    let wire: AnalysisWire = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| AiError::Parse(format!("analysis JSON: {e}")))?;
    Ok(wire.normalize())
}

#[async_trait]
impl AiProvider for OpenAiCompatProvider {
    async fn analyze(
        &self,
        content: &str,
        media: Option<&str>,
        kind: MemoryKind,
    ) -> Result<AiMetadata, AiError> {
        let body = json!({
            "model": self.analysis_model,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": ANALYSIS_PROMPT },
                { "role": "user", "content": user_content(content, media, kind) },
            ],
        });

        let bytes = self.post("/chat/completions", &body).await?;
        let response: ChatResponse = serde_json::from_slice(&bytes)
            .map_err(|e| AiError::Parse(format!("chat response: {e}")))?;
        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AiError::Parse("chat response had no content".into()))?;

        let metadata = parse_analysis(&text)?;
        tracing::debug!(kind = %kind, topics = ?metadata.topics, "content analyzed");
        Ok(metadata)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, AiError> {
        let body = json!({ "model": self.embedding_model, "input": text });
        let bytes = self.post("/embeddings", &body).await?;
        let response: EmbeddingResponse = serde_json::from_slice(&bytes)
            .map_err(|e| AiError::Parse(format!("embedding response: {e}")))?;

        let embedding = response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .unwrap_or_default();
        if embedding.is_empty() {
            return Err(AiError::EmptyEmbedding);
        }
        Ok(embedding)
    }

    fn embedding_model(&self) -> &str {
        &self.embedding_model
    }
}
