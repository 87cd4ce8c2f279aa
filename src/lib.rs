//! Personal memory engine: capture, hybrid search, linking, resurfacing and
//! insights over AI-enriched memories.
//!
//! Reverie stores notes, links, images and PDFs. Each capture is sent to an
//! AI provider for analysis (summary, topics, mood, colors, collection,
//! importance) and embedding, linked to semantically related memories, and
//! persisted in SQLite. Everything downstream is computed in-process:
//!
//! | Operation | Signal |
//! |-----------|--------|
//! | **Search** | cosine similarity, recency, substring and exact-tag boosts, with a keyword fallback |
//! | **Relations** | cosine similarity plus a topic-overlap boost, linked both ways |
//! | **Resurfacing** | importance, time since last seen, fatigue from earlier resurfacing |
//! | **Insights** | recurring topics and important memories gone unseen |
//!
//! A missing or failing provider never blocks a capture or a search: analysis
//! falls back to default metadata and ranking proceeds without similarity.
//!
//! # Modules
//!
//! - [`ai`]: the analysis/embedding provider seam and an OpenAI-compatible client
//! - [`config`]: configuration from TOML files and environment variables
//! - [`db`]: SQLite initialization, schema, migrations, and health checks
//! - [`memory`]: the engine itself: store, capture, search, debounce, relations, resurfacing, insights

pub mod ai;
pub mod config;
pub mod db;
pub mod memory;
