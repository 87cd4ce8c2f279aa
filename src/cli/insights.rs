use anyhow::Result;

use crate::config::ReverieConfig;
use crate::memory::insights::mine_insights;
use crate::memory::store::MemoryStore;
use crate::memory::types::now_ms;

pub fn insights(config: &ReverieConfig) -> Result<()> {
    let store = super::open_store(config)?;
    let corpus = store.get_all()?;
    let insights = mine_insights(&corpus, now_ms(), &config.insights);

    if insights.is_empty() {
        println!(
            "No insights yet ({} memories; at least {} needed).",
            corpus.len(),
            config.insights.min_memories
        );
        return Ok(());
    }

    for insight in &insights {
        println!("{} [relevance {:.2}]", insight.title, insight.relevance);
        println!("  {}", insight.description);
        println!("  memories: {}", insight.memory_ids.join(", "));
        println!();
    }
    Ok(())
}
