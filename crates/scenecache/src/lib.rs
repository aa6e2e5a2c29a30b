//! # scenecache
//!
//! Request-counted scene cache and the Monte-Carlo simulator that exercises it.
//!
//! ## Architecture
//! - **LruSet**: AHash map + index-linked list, O(1) touch and removal
//! - **TtlCache**: bulk random eviction every `ttl_window` batch lookups,
//!   admission on miss, occasional suppressed hits
//! - **Simulator**: anchors drawn at random, batches built from their
//!   nearest neighbours, batches not fully served counted as misses
//!
//! All randomness comes from a caller-supplied [`rand::Rng`] so seeded runs
//! replay exactly.

#![warn(missing_docs)]

mod cache;
mod lru;
mod simulator;
mod stats;

pub use cache::{
    evict_count, CacheConfig, TtlCache, DEFAULT_EVICTION_FRACTION,
    DEFAULT_SUPPRESSION_PROBABILITY,
};
pub use lru::LruSet;
pub use simulator::{run_simulation, RunOutcome, SelfMatch, Simulator};
pub use stats::CacheStats;
