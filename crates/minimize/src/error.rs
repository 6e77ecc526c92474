use thiserror::Error;

/// Result type for minimization runs
pub type Result<T> = std::result::Result<T, MinimizeError>;

/// Boxed error produced by a caller-supplied predicate
pub type PredicateFailure = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that abort a minimization run.
///
/// Resource exhaustion is not an error: it is reported through
/// [`Completion`](crate::Completion) together with the partial result.
#[derive(Error, Debug)]
pub enum MinimizeError {
    /// The predicate itself failed; the run is abandoned without a result
    #[error("Predicate failed: {0}")]
    Predicate(#[source] PredicateFailure),

    /// A seed range does not fit the backing slice
    #[error("Invalid seed range: start={start}, end={end}, len={len}")]
    InvalidRange { start: usize, end: usize, len: usize },

    /// Seed ranges overlap, are out of order, or leave gaps
    #[error("Seed ranges must tile 0..{len} in order: {detail}")]
    RangesNotTiling { len: usize, detail: String },
}

impl MinimizeError {
    /// Wrap a predicate error, keeping its source chain
    pub fn predicate(err: anyhow::Error) -> Self {
        Self::Predicate(err.into())
    }

    /// Whether the error came from the caller's predicate
    #[must_use]
    pub const fn is_predicate_failure(&self) -> bool {
        matches!(self, Self::Predicate(_))
    }
}
