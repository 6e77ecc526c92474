//! # ktest minimize
//!
//! Chunk-based delta debugging: shrink an ordered sequence of opaque items
//! while an expensive predicate keeps reporting it as sufficient.
//!
//! Used to minimize failing kernel configurations (one item per option) and
//! any other ordered collection the toolkit needs to reduce.
//!
//! ## Algorithm
//!
//! ```text
//! seeds (one or more chunks)
//!     │
//!     ├──> Phase 1: drop whole chunks
//!     │      └─ one predicate call per seed chunk
//!     │
//!     └──> Phase 2: rounds until every chunk is final
//!            ├─ len 1        → mark final
//!            ├─ drop A?      → test kept ++ B ++ rest
//!            ├─ drop B?      → test kept ++ A ++ rest
//!            └─ budgets      → call limit / chunk limit stop the run
//! ```
//!
//! For a monotone predicate that needs `K` of `N` items the engine makes at
//! most `1 + 2*K*(1 + floor(log2 N))` predicate calls (see [`call_bound`]).
//!
//! ## Example
//!
//! ```rust
//! use ktest_minimize::{minimize_slice, Config};
//!
//! let items: Vec<u32> = (0..100).collect();
//! let config = Config::new(|c: &[u32]| Ok(c.contains(&3) && c.contains(&47)));
//!
//! let outcome = minimize_slice(config, &items).unwrap();
//! assert_eq!(outcome.items, vec![3, 47]);
//! assert!(outcome.is_converged());
//! ```

mod chunk;
mod config;
mod engine;
mod error;
mod predicate;
mod slice;
mod types;

pub use chunk::{Chunk, ChunkId, ChunkSet, ChunkSetSummary};
pub use config::{Config, Limits, Logf, Predicate};
pub use engine::{call_bound, minimize, BisectionEngine};
pub use error::{MinimizeError, PredicateFailure, Result};
pub use slice::{
    minimize_partitioned, minimize_ranges, minimize_slice, minimize_with_fixed, Partition,
};
pub use types::{Completion, Outcome, RunStats};
