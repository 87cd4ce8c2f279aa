//! CLI `live-search` command: search-as-you-type over stdin.
//!
//! Each input line is treated as the current contents of a search box and
//! handed to a [`SearchDebouncer`]; only the result for the latest line that
//! stayed unchanged for the quiet period is printed. A blank line clears the
//! results without searching.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::ReverieConfig;
use crate::memory::debounce::{Delivery, SearchDebouncer};
use crate::memory::search::run_search;
use crate::memory::store::MemoryStore;
use crate::memory::types::{now_ms, SearchResult};

type Outcome = Option<Vec<SearchResult>>;

pub async fn live_search(config: &ReverieConfig, limit: usize) -> Result<()> {
    let store = super::open_store(config)?;
    let provider = crate::ai::create_provider(&config.ai)?;
    // Snapshot once; live-search is read-only.
    let corpus = Arc::new(store.get_all()?);
    let search_config = Arc::new(config.search.clone());

    let quiet = Duration::from_millis(config.search.debounce_ms);
    let (debouncer, mut deliveries) = SearchDebouncer::<Outcome>::new(quiet);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut awaiting = false;

    eprintln!(
        "live search over {} memories; type a query per line, Ctrl-D to quit",
        corpus.len()
    );

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(query) = line? else { break };
                if query.trim().is_empty() {
                    debouncer.cancel();
                    awaiting = false;
                    println!("(cleared)");
                    continue;
                }
                let provider = Arc::clone(&provider);
                let corpus = Arc::clone(&corpus);
                let search_config = Arc::clone(&search_config);
                debouncer.submit(query, move |query| async move {
                    run_search(provider.as_ref(), &query, &corpus, now_ms(), &search_config).await
                });
                awaiting = true;
            }
            Some(delivery) = deliveries.recv() => {
                awaiting = false;
                show(delivery, limit);
            }
        }
    }

    // Input closed: let the last query finish instead of dropping it.
    if awaiting {
        let grace = quiet + Duration::from_secs(config.ai.request_timeout_secs);
        match tokio::time::timeout(grace, deliveries.recv()).await {
            Ok(Some(delivery)) => show(delivery, limit),
            Ok(None) => {}
            Err(_) => tracing::warn!("last live search did not finish in time"),
        }
    }

    Ok(())
}

fn show(delivery: Delivery<Outcome>, limit: usize) {
    println!("> {}", delivery.query.trim());
    match delivery.result {
        Some(results) => super::search::print_results(&results, limit),
        None => println!("(cleared)"),
    }
}
