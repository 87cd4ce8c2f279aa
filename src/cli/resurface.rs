use anyhow::Result;

use crate::config::ReverieConfig;
use crate::memory::resurface::resurface as resurface_memories;
use crate::memory::store::MemoryStore;
use crate::memory::types::now_ms;

/// Pick memories worth revisiting and record that they were shown.
pub fn resurface(config: &ReverieConfig, count: Option<usize>) -> Result<()> {
    let store = super::open_store(config)?;
    let corpus = store.get_all()?;
    let k = count.unwrap_or(config.resurface.default_count);

    let outcome = resurface_memories(&store, &corpus, k, now_ms(), &config.resurface);

    if outcome.memories.is_empty() {
        println!("Nothing to resurface yet.");
        return Ok(());
    }

    println!("Worth another look:\n");
    for (i, memory) in outcome.memories.iter().enumerate() {
        super::print_memory(i, memory, None);
    }
    for id in &outcome.failed {
        eprintln!("warning: could not record resurfacing for {id}");
    }
    Ok(())
}
