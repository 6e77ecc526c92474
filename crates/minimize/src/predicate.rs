use crate::config::Predicate;
use crate::error::{MinimizeError, Result};

/// Answer of one guarded predicate evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verdict {
    /// The candidate still satisfies the predicate
    Sufficient,
    /// Something removed from the candidate was required
    Insufficient,
    /// The call budget is spent; the predicate was not called
    BudgetExhausted,
}

/// Counts and budgets every call into the caller's predicate
pub(crate) struct PredicateRunner<'a, T> {
    pred: Predicate<'a, T>,
    limit: usize,
    calls: usize,
}

impl<'a, T> PredicateRunner<'a, T> {
    pub(crate) fn new(pred: Predicate<'a, T>, limit: usize) -> Self {
        Self {
            pred,
            limit,
            calls: 0,
        }
    }

    /// Number of predicate calls made so far
    pub(crate) const fn calls(&self) -> usize {
        self.calls
    }

    pub(crate) const fn limit(&self) -> usize {
        self.limit
    }

    pub(crate) const fn is_exhausted(&self) -> bool {
        self.limit > 0 && self.calls >= self.limit
    }

    pub(crate) fn test(&mut self, candidate: &[T]) -> Result<Verdict> {
        if self.is_exhausted() {
            log::debug!("predicate budget of {} calls exhausted", self.limit);
            return Ok(Verdict::BudgetExhausted);
        }

        self.calls += 1;
        let ok = (self.pred)(candidate).map_err(MinimizeError::predicate)?;
        log::trace!(
            "predicate call #{} on {} elements -> {}",
            self.calls,
            candidate.len(),
            ok
        );

        Ok(if ok {
            Verdict::Sufficient
        } else {
            Verdict::Insufficient
        })
    }
}
