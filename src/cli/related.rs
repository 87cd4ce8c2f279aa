use anyhow::{bail, Result};

use crate::config::ReverieConfig;
use crate::memory::relations::relation_score;
use crate::memory::store::MemoryStore;

/// Show the stored links of a memory, scored against it.
pub fn related(config: &ReverieConfig, id: &str) -> Result<()> {
    let store = super::open_store(config)?;
    let Some(memory) = store.get(id)? else {
        bail!("memory not found: {id}");
    };

    let ids = &memory.metadata.related_memory_ids;
    if ids.is_empty() {
        println!("{id} has no related memories.");
        return Ok(());
    }

    println!("Related to {id}:\n");
    let mut shown = 0;
    for other_id in ids {
        match store.get(other_id)? {
            Some(other) => {
                let score = relation_score(&memory, &other, &config.relations);
                super::print_memory(shown, &other, Some(score));
                shown += 1;
            }
            // Links survive deletion of the target.
            None => println!("  - {other_id} (deleted)"),
        }
    }
    Ok(())
}
