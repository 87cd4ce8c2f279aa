//! CLI `capture` command: analyze, embed, link and store one memory.

use anyhow::{Context, Result};
use base64::Engine;
use std::path::Path;

use crate::config::ReverieConfig;
use crate::memory::capture::{commit_capture, prepare_capture, NewMemory};
use crate::memory::types::{now_ms, MemoryKind};

pub async fn capture(
    config: &ReverieConfig,
    kind: MemoryKind,
    content: &str,
    media: Option<&Path>,
) -> Result<()> {
    let media_payload = match media {
        Some(path) => {
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("failed to read media file {}", path.display()))?;
            Some(base64::engine::general_purpose::STANDARD.encode(bytes))
        }
        None => None,
    };

    let store = super::open_store(config)?;
    let provider = crate::ai::create_provider(&config.ai)?;

    let new = NewMemory {
        kind,
        content: content.to_string(),
        media_payload,
    };
    let record = prepare_capture(provider.as_ref(), new, now_ms()).await?;
    let result = commit_capture(&store, record, &config.relations)?;

    println!("Captured {}", result.memory.id);
    super::print_memory(0, &result.memory, None);

    if !result.links.linked.is_empty() || !result.links.already_linked.is_empty() {
        println!(
            "Linked to {} related memor{}.",
            result.memory.metadata.related_memory_ids.len(),
            if result.memory.metadata.related_memory_ids.len() == 1 { "y" } else { "ies" }
        );
    }
    for failure in &result.links.failed {
        eprintln!("warning: could not back-link {}: {}", failure.id, failure.error);
    }

    Ok(())
}
