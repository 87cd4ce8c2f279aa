//! The retrieval and ranking engine.
//!
//! Every scoring function takes a corpus snapshot (`&[MemoryRecord]`) and an
//! explicit `now`; only [`capture::commit_capture`], [`relations::link_bidirectional`]
//! and [`resurface::resurface`] write to a [`store::MemoryStore`].

pub mod capture;
pub mod debounce;
pub mod insights;
pub mod relations;
pub mod resurface;
pub mod search;
pub mod similarity;
pub mod store;
pub mod types;
