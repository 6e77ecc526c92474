use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller predicate: `Ok(true)` means the candidate is still sufficient
pub type Predicate<'a, T> = Box<dyn FnMut(&[T]) -> anyhow::Result<bool> + 'a>;

/// Progress hook receiving human-readable traces
pub type Logf<'a> = Box<dyn Fn(fmt::Arguments<'_>) + 'a>;

/// Resource budgets for a single run.
///
/// Zero means unlimited for both fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum number of predicate calls
    pub pred_limit: usize,

    /// Maximum number of live chunks tolerated between rounds
    pub max_chunks: usize,
}

impl Limits {
    /// No call budget and no chunk budget
    pub const UNLIMITED: Self = Self {
        pred_limit: 0,
        max_chunks: 0,
    };

    /// Builder: set the predicate call budget
    #[must_use]
    pub const fn with_pred_limit(mut self, pred_limit: usize) -> Self {
        self.pred_limit = pred_limit;
        self
    }

    /// Builder: set the chunk-count budget
    #[must_use]
    pub const fn with_max_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = max_chunks;
        self
    }

    /// Overlay `other` on top of `self`: non-zero fields of `other` win
    #[must_use]
    pub const fn overlay(self, other: Self) -> Self {
        Self {
            pred_limit: if other.pred_limit > 0 {
                other.pred_limit
            } else {
                self.pred_limit
            },
            max_chunks: if other.max_chunks > 0 {
                other.max_chunks
            } else {
                self.max_chunks
            },
        }
    }
}

/// Configuration for one minimization run
pub struct Config<'a, T> {
    pub(crate) pred: Predicate<'a, T>,
    pub(crate) limits: Limits,
    pub(crate) logf: Option<Logf<'a>>,
}

impl<'a, T> Config<'a, T> {
    /// Create a config with unlimited budgets and no progress hook
    pub fn new(pred: impl FnMut(&[T]) -> anyhow::Result<bool> + 'a) -> Self {
        Self {
            pred: Box::new(pred),
            limits: Limits::UNLIMITED,
            logf: None,
        }
    }

    /// Builder: set the predicate call budget (0 = unlimited)
    #[must_use]
    pub fn pred_limit(mut self, pred_limit: usize) -> Self {
        self.limits.pred_limit = pred_limit;
        self
    }

    /// Builder: set the chunk-count budget (0 = unlimited)
    #[must_use]
    pub fn max_chunks(mut self, max_chunks: usize) -> Self {
        self.limits.max_chunks = max_chunks;
        self
    }

    /// Builder: replace both budgets
    #[must_use]
    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Builder: install a progress hook
    #[must_use]
    pub fn logf(mut self, logf: impl Fn(fmt::Arguments<'_>) + 'a) -> Self {
        self.logf = Some(Box::new(logf));
        self
    }

    /// Current budgets
    #[must_use]
    pub const fn current_limits(&self) -> Limits {
        self.limits
    }
}

impl<T> fmt::Debug for Config<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("limits", &self.limits)
            .field("logf", &self.logf.is_some())
            .finish_non_exhaustive()
    }
}
