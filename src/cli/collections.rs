use anyhow::Result;

use crate::config::ReverieConfig;
use crate::memory::store::MemoryStore;

/// List collections, or the memories of one collection when `name` is given.
pub fn collections(config: &ReverieConfig, name: Option<&str>) -> Result<()> {
    let store = super::open_store(config)?;

    if let Some(name) = name {
        let members = store.get_by_collection_name(name)?;
        if members.is_empty() {
            println!("No memories in collection \"{name}\".");
            return Ok(());
        }
        println!("{name} ({} memories)\n", members.len());
        for (i, memory) in members.iter().enumerate() {
            super::print_memory(i, memory, None);
        }
        return Ok(());
    }

    let collections = store.collections()?;
    if collections.is_empty() {
        println!("No collections yet.");
        return Ok(());
    }
    for collection in &collections {
        println!("  {:<24} {:>5} memories", collection.name, collection.memory_ids.len());
    }
    Ok(())
}
