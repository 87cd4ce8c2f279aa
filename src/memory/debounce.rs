//! Debounced, last-write-wins evaluation of search queries.
//!
//! Every [`SearchDebouncer::submit`] bumps a generation counter, aborts the
//! pending task, and schedules a new one that waits out the quiet period
//! before evaluating. A task only delivers if its generation is still the
//! latest both before and after evaluation, so a superseded query's result
//! (including one whose provider call was already in flight) is never sent.
//! Evaluation runs as a child task, so a panic is logged instead of lost.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A result delivered for the most recent query.
#[derive(Debug)]
pub struct Delivery<T> {
    pub generation: u64,
    pub query: String,
    pub result: T,
}

pub struct SearchDebouncer<T> {
    quiet: Duration,
    generation: Arc<AtomicU64>,
    pending: Mutex<Option<JoinHandle<()>>>,
    tx: mpsc::UnboundedSender<Delivery<T>>,
}

impl<T: Send + 'static> SearchDebouncer<T> {
    /// Create a debouncer and the receiver its deliveries arrive on.
    pub fn new(quiet: Duration) -> (Self, mpsc::UnboundedReceiver<Delivery<T>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let debouncer = Self {
            quiet,
            generation: Arc::new(AtomicU64::new(0)),
            pending: Mutex::new(None),
            tx,
        };
        (debouncer, rx)
    }

    /// Schedule `evaluate(query)` after the quiet period, superseding anything pending.
    ///
    /// Must be called from within a Tokio runtime. Returns the generation
    /// assigned to this query.
    pub fn submit<F, Fut>(&self, query: impl Into<String>, evaluate: F) -> u64
    where
        F: FnOnce(String) -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let latest = Arc::clone(&self.generation);
        let quiet = self.quiet;
        let tx = self.tx.clone();
        let query = query.into();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            if latest.load(Ordering::SeqCst) != generation {
                return;
            }

            // Child task so a panicking evaluation surfaces as a JoinError.
            let mut eval = AbortOnDrop(tokio::spawn(evaluate(query.clone())));
            let result = match (&mut eval.0).await {
                Ok(result) => result,
                Err(e) if e.is_panic() => {
                    tracing::error!(generation, query = %query, "search evaluation panicked");
                    return;
                }
                Err(e) => {
                    tracing::debug!(generation, query = %query, error = %e, "search evaluation cancelled");
                    return;
                }
            };

            if latest.load(Ordering::SeqCst) != generation {
                tracing::debug!(generation, query = %query, "discarding stale search result");
                return;
            }
            // Receiver gone means nobody is listening any more.
            let _ = tx.send(Delivery {
                generation,
                query,
                result,
            });
        });

        let previous = self
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }

        generation
    }

    /// Drop whatever is pending without scheduling a replacement.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(previous) = self.pending.lock().unwrap_or_else(|e| e.into_inner()).take() {
            previous.abort();
        }
    }

    /// Generation of the most recent submission (0 before any).
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

/// Aborts the evaluation when the debounce task owning it is aborted.
struct AbortOnDrop<R>(JoinHandle<R>);

impl<R> Drop for AbortOnDrop<R> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl<T> Drop for SearchDebouncer<T> {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.get_mut().ok().and_then(Option::take) {
            pending.abort();
        }
    }
}
