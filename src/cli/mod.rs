pub mod capture;
pub mod collections;
pub mod doctor;
pub mod export;
pub mod forget;
pub mod insights;
pub mod live_search;
pub mod related;
pub mod resurface;
pub mod search;

use anyhow::{Context, Result};

use crate::config::ReverieConfig;
use crate::memory::store::SqliteStore;
use crate::memory::types::MemoryRecord;

const PREVIEW_CHARS: usize = 120;

/// Open the configured store, creating it on first use.
pub(crate) fn open_store(config: &ReverieConfig) -> Result<SqliteStore> {
    let db_path = config.resolved_db_path();
    SqliteStore::open(&db_path)
        .with_context(|| format!("failed to open store at {}", db_path.display()))
}

/// First [`PREVIEW_CHARS`] characters of `text`, on one line.
pub(crate) fn preview(text: &str) -> String {
    let flat = text.replace('\n', " ");
    match flat.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &flat[..cut]),
        None => flat,
    }
}

/// Two-line listing entry shared by the read commands.
pub(crate) fn print_memory(index: usize, memory: &MemoryRecord, score: Option<f64>) {
    let meta = &memory.metadata;
    let score = score.map(|s| format!(", score: {s:.3}")).unwrap_or_default();
    println!(
        "  {}. [{}] {} ({}, importance: {:.2}{score})",
        index + 1,
        memory.kind,
        memory.id,
        meta.collection_name(),
        meta.importance(),
    );
    if !meta.summary.is_empty() {
        println!("     {}", preview(&meta.summary));
    }
    println!("     {}", preview(&memory.content));
    if !meta.topics.is_empty() {
        println!("     topics: {}", meta.topics.join(", "));
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_cuts_on_char_boundary() {
        let long = "é".repeat(200);
        let p = preview(&long);
        assert!(p.ends_with("..."));
        assert_eq!(p.chars().count(), PREVIEW_CHARS + 3);
        assert_eq!(preview("line one\nline two"), "line one line two");
    }
}
