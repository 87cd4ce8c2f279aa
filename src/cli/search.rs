use anyhow::Result;

use crate::config::ReverieConfig;
use crate::memory::store::MemoryStore;
use crate::memory::types::{now_ms, MatchKind, SearchResult};

/// Run a one-shot search from the terminal.
pub async fn search(config: &ReverieConfig, query: &str, limit: usize) -> Result<()> {
    let store = super::open_store(config)?;
    let provider = crate::ai::create_provider(&config.ai)?;
    let corpus = store.get_all()?;

    let results =
        crate::memory::search::run_search(provider.as_ref(), query, &corpus, now_ms(), &config.search)
            .await;

    match results {
        None => println!("Empty query; nothing to search."),
        Some(results) => print_results(&results, limit),
    }
    Ok(())
}

/// Shared with `live-search`.
pub(crate) fn print_results(results: &[SearchResult], limit: usize) {
    if results.is_empty() {
        println!("No results found.");
        return;
    }

    let note = match results[0].match_kind {
        MatchKind::Ranked => "",
        MatchKind::Fallback => " (keyword fallback)",
        MatchKind::Lexical => " (short query, keyword match)",
    };
    println!("Found {} result(s){note}\n", results.len());

    for (i, result) in results.iter().take(limit).enumerate() {
        super::print_memory(i, &result.memory, Some(result.score));
    }
}
