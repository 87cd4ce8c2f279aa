use anyhow::Result;
use serde::Serialize;

use crate::config::ReverieConfig;
use crate::memory::store::MemoryStore;
use crate::memory::types::{Collection, MemoryRecord};

/// Export format: every record (embeddings included) and every collection.
#[derive(Debug, Serialize)]
struct ExportData {
    memories: Vec<MemoryRecord>,
    collections: Vec<Collection>,
}

/// Export the whole store as JSON to stdout.
pub fn export(config: &ReverieConfig) -> Result<()> {
    let store = super::open_store(config)?;

    let data = ExportData {
        memories: store.get_all()?,
        collections: store.collections()?,
    };

    let json = serde_json::to_string_pretty(&data)?;
    println!("{json}");

    eprintln!(
        "Exported {} memories and {} collections.",
        data.memories.len(),
        data.collections.len()
    );

    Ok(())
}
