use serde::{Deserialize, Serialize};
use std::fmt;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Completion {
    /// Every remaining chunk is final
    Converged,

    /// The predicate call budget ran out; the result is the best set so far
    PredicateBudgetExhausted { limit: usize },

    /// More live chunks than allowed between rounds.
    /// The result is a superset of the minimal answer but was not re-checked
    /// against the predicate as a whole.
    TooManyChunks { chunks: usize, limit: usize },
}

impl Completion {
    #[must_use]
    pub const fn is_converged(&self) -> bool {
        matches!(self, Self::Converged)
    }

    /// The chunk-count budget stopped the run before convergence
    #[must_use]
    pub const fn is_too_many_chunks(&self) -> bool {
        matches!(self, Self::TooManyChunks { .. })
    }
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Converged => f.write_str("converged"),
            Self::PredicateBudgetExhausted { limit } => {
                write!(f, "stopped after {limit} predicate calls")
            }
            Self::TooManyChunks { chunks, limit } => {
                write!(f, "too many chunks ({chunks} > {limit})")
            }
        }
    }
}

/// Counters collected during a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Predicate invocations actually made
    pub predicate_calls: usize,

    /// Split rounds started
    pub rounds: usize,

    /// Number of seed chunks after empty seeds were discarded
    pub seed_chunks: usize,

    /// Items the run started with
    pub initial_len: usize,

    /// Items in the result
    pub result_len: usize,

    /// Final chunks in the result
    pub final_chunks: usize,
}

impl RunStats {
    /// Fraction of items removed, 0.0 when the input was empty
    #[must_use]
    pub fn reduction(&self) -> f64 {
        if self.initial_len == 0 {
            return 0.0;
        }
        1.0 - self.result_len as f64 / self.initial_len as f64
    }
}

/// Result of a minimization run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<T> {
    /// Surviving items in original order
    pub items: Vec<T>,

    pub status: Completion,

    pub stats: RunStats,
}

impl<T> Outcome<T> {
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    #[must_use]
    pub const fn is_converged(&self) -> bool {
        self.status.is_converged()
    }

    /// Convert the items, keeping status and stats
    pub fn map_items<U>(self, f: impl FnOnce(Vec<T>) -> Vec<U>) -> Outcome<U> {
        let items = f(self.items);
        Outcome {
            stats: RunStats {
                result_len: items.len(),
                ..self.stats
            },
            items,
            status: self.status,
        }
    }
}
