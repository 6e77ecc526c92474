use crate::chunk::{ChunkId, ChunkSet};
use crate::config::{Config, Limits, Logf};
use crate::error::Result;
use crate::predicate::{PredicateRunner, Verdict};
use crate::types::{Completion, Outcome, RunStats};
use std::fmt;
use std::ops::Range;

/// Upper bound on predicate calls for a monotone, deterministic predicate
/// that needs exactly `needed` of `total` items seeded as a single chunk:
/// `1 + 2 * needed * (1 + floor(log2 total))`.
#[must_use]
pub fn call_bound(needed: usize, total: usize) -> usize {
    let depth = total.max(1).ilog2() as usize + 1;
    1 + 2 * needed * depth
}

/// Minimize `seeds` against `config`'s predicate.
///
/// Shorthand for [`BisectionEngine::new`] followed by [`BisectionEngine::run`].
pub fn minimize<T, I>(config: Config<'_, T>, seeds: I) -> Result<Outcome<T>>
where
    T: Clone,
    I: IntoIterator<Item = Vec<T>>,
{
    BisectionEngine::new(config, seeds).run()
}

/// Whether the search may keep going after a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Continue,
    Exhausted,
}

/// Drives the two-phase chunk bisection.
///
/// Phase 1 tries to drop every seed chunk as a whole. Phase 2 repeatedly
/// splits each non-final chunk in halves and drops the halves the predicate
/// does not need, until every chunk is final or a budget stops the run.
///
/// Every candidate handed to the predicate is the concatenation of the chunks
/// already decided this pass, the piece under test and the chunks not yet
/// visited, so the items outside the piece are always the current best known
/// sufficient set.
pub struct BisectionEngine<'a, T> {
    runner: PredicateRunner<'a, T>,
    chunks: ChunkSet<T>,
    max_chunks: usize,
    logf: Option<Logf<'a>>,
    rounds: usize,
}

impl<'a, T: Clone> BisectionEngine<'a, T> {
    /// Create an engine with one chunk per non-empty seed
    pub fn new<I>(config: Config<'a, T>, seeds: I) -> Self
    where
        I: IntoIterator<Item = Vec<T>>,
    {
        let Config { pred, limits, logf } = config;
        let Limits {
            pred_limit,
            max_chunks,
        } = limits;
        Self {
            runner: PredicateRunner::new(pred, pred_limit),
            chunks: ChunkSet::from_seeds(seeds),
            max_chunks,
            logf,
            rounds: 0,
        }
    }

    /// Run to a fixed point or until a budget stops the search
    pub fn run(mut self) -> Result<Outcome<T>> {
        let seed_chunks = self.chunks.len();
        let initial_len = self.chunks.element_count();
        self.logf(format_args!(
            "minimizing {initial_len} elements in {seed_chunks} chunks"
        ));

        let status = self.search()?;

        let items = self.chunks.flatten();
        let stats = RunStats {
            predicate_calls: self.runner.calls(),
            rounds: self.rounds,
            seed_chunks,
            initial_len,
            result_len: items.len(),
            final_chunks: self.chunks.summary().final_chunks,
        };
        self.logf(format_args!(
            "done: {status}, {} -> {} elements, {} predicate calls",
            stats.initial_len, stats.result_len, stats.predicate_calls
        ));

        Ok(Outcome {
            items,
            status,
            stats,
        })
    }

    fn search(&mut self) -> Result<Completion> {
        if self.drop_chunks()? == Pass::Exhausted {
            return Ok(self.budget_exhausted());
        }

        while !self.chunks.is_done() {
            let live = self.chunks.len();
            if self.max_chunks > 0 && live > self.max_chunks {
                self.logf(format_args!(
                    "stopping: {live} chunks exceed the limit of {}",
                    self.max_chunks
                ));
                return Ok(Completion::TooManyChunks {
                    chunks: live,
                    limit: self.max_chunks,
                });
            }

            self.rounds += 1;
            self.logf(format_args!(
                "round {}: {}",
                self.rounds,
                self.chunks.summary()
            ));
            if self.split_chunks()? == Pass::Exhausted {
                return Ok(self.budget_exhausted());
            }
        }

        Ok(Completion::Converged)
    }

    fn budget_exhausted(&self) -> Completion {
        self.logf(format_args!(
            "stopping: predicate budget of {} calls exhausted",
            self.runner.limit()
        ));
        Completion::PredicateBudgetExhausted {
            limit: self.runner.limit(),
        }
    }

    /// Phase 1: try removing each chunk entirely, one call per chunk.
    fn drop_chunks(&mut self) -> Result<Pass> {
        let order = self.chunks.ids().to_vec();
        let mut kept: Vec<ChunkId> = Vec::with_capacity(order.len());

        for (i, &id) in order.iter().enumerate() {
            let rest = &order[i + 1..];
            match self.test_without(&kept, None, rest)? {
                Verdict::Sufficient => {
                    self.logf(format_args!(
                        "dropped chunk of {} elements",
                        self.chunks.chunk(id).len()
                    ));
                }
                Verdict::Insufficient => kept.push(id),
                Verdict::BudgetExhausted => {
                    kept.extend_from_slice(&order[i..]);
                    self.chunks.set_order(kept);
                    return Ok(Pass::Exhausted);
                }
            }
        }

        self.chunks.set_order(kept);
        Ok(Pass::Continue)
    }

    /// Phase 2: one round of halving every non-final chunk.
    fn split_chunks(&mut self) -> Result<Pass> {
        let order = self.chunks.ids().to_vec();
        let mut next: Vec<ChunkId> = Vec::with_capacity(order.len() * 2);

        for (i, &id) in order.iter().enumerate() {
            let chunk = self.chunks.chunk(id).clone();
            if chunk.is_final() {
                next.push(id);
                continue;
            }
            if chunk.len() <= 1 {
                self.chunks.mark_final(id);
                next.push(id);
                continue;
            }

            let rest = &order[i + 1..];
            let (a, b) = chunk.halves();

            match self.test_without(&next, Some(b.clone()), rest)? {
                Verdict::Sufficient => {
                    log::debug!("dropping {} elements at {:?}", a.len(), a);
                    let b = self.chunks.alloc(b);
                    next.push(b);
                    continue;
                }
                Verdict::Insufficient => {}
                Verdict::BudgetExhausted => {
                    next.extend_from_slice(&order[i..]);
                    self.chunks.set_order(next);
                    return Ok(Pass::Exhausted);
                }
            }

            let keep_b = match self.test_without(&next, Some(a.clone()), rest)? {
                Verdict::Sufficient => {
                    log::debug!("dropping {} elements at {:?}", b.len(), b);
                    false
                }
                Verdict::Insufficient => true,
                Verdict::BudgetExhausted => {
                    let a = self.chunks.alloc(a);
                    let b = self.chunks.alloc(b);
                    next.push(a);
                    next.push(b);
                    next.extend_from_slice(rest);
                    self.chunks.set_order(next);
                    return Ok(Pass::Exhausted);
                }
            };

            next.push(self.chunks.alloc(a));
            if keep_b {
                next.push(self.chunks.alloc(b));
            }
        }

        self.chunks.set_order(next);
        Ok(Pass::Continue)
    }

    /// Evaluate `head ++ piece ++ tail`.
    fn test_without(
        &mut self,
        head: &[ChunkId],
        piece: Option<Range<usize>>,
        tail: &[ChunkId],
    ) -> Result<Verdict> {
        let candidate = self.chunks.assemble(
            self.chunks
                .spans(head)
                .chain(piece)
                .chain(self.chunks.spans(tail)),
        );
        self.runner.test(&candidate)
    }

    fn logf(&self, args: fmt::Arguments<'_>) {
        log::debug!("{args}");
        if let Some(logf) = &self.logf {
            logf(args);
        }
    }
}

impl<T> fmt::Debug for BisectionEngine<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BisectionEngine")
            .field("calls", &self.runner.calls())
            .field("max_chunks", &self.max_chunks)
            .field("rounds", &self.rounds)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::{Cell, RefCell};

    fn contains_all(needed: &[u32]) -> impl FnMut(&[u32]) -> anyhow::Result<bool> + '_ {
        move |candidate: &[u32]| Ok(needed.iter().all(|n| candidate.contains(n)))
    }

    #[test]
    fn test_call_bound() {
        assert_eq!(call_bound(3, 100), 43);
        assert_eq!(call_bound(1, 1), 3);
        assert_eq!(call_bound(0, 0), 1);
        assert_eq!(call_bound(2, 8), 17);
    }

    #[test]
    fn test_single_needed_item() {
        let items: Vec<u32> = (0..16).collect();
        let outcome = minimize(Config::new(contains_all(&[11])), vec![items]).unwrap();
        assert_eq!(outcome.items, vec![11]);
        assert!(outcome.is_converged());
        assert!(outcome.stats.predicate_calls <= call_bound(1, 16));
        assert_eq!(outcome.stats.final_chunks, 1);
    }

    #[test]
    fn test_empty_input_makes_no_calls() {
        let calls = Cell::new(0);
        let config = Config::<u32>::new(|_| {
            calls.set(calls.get() + 1);
            Ok(true)
        });
        let outcome = minimize(config, Vec::new()).unwrap();
        assert!(outcome.items.is_empty());
        assert!(outcome.is_converged());
        assert_eq!(calls.get(), 0);
        assert_eq!(outcome.stats.rounds, 0);
    }

    #[test]
    fn test_phase_one_drops_whole_seed() {
        let outcome = minimize(
            Config::new(contains_all(&[7])),
            vec![vec![1, 2, 3], vec![4, 7], vec![8, 9]],
        )
        .unwrap();
        assert_eq!(outcome.items, vec![7]);
        assert_eq!(outcome.stats.seed_chunks, 3);
    }

    #[test]
    fn test_candidates_keep_original_order() {
        let seen = RefCell::new(Vec::new());
        let config = Config::new(|c: &[u32]| {
            seen.borrow_mut().push(c.to_vec());
            Ok(c.contains(&2) && c.contains(&5))
        });
        let outcome = minimize(config, vec![(0..8).collect()]).unwrap();
        assert_eq!(outcome.items, vec![2, 5]);
        for candidate in seen.borrow().iter() {
            assert!(candidate.windows(2).all(|w| w[0] < w[1]), "{candidate:?}");
        }
    }

    #[test]
    fn test_predicate_error_aborts() {
        let calls = Cell::new(0);
        let config = Config::new(|c: &[u32]| {
            calls.set(calls.get() + 1);
            if c.len() == 4 {
                anyhow::bail!("boot timed out");
            }
            Ok(false)
        });
        let err = minimize(config, vec![(0..8).collect()]).unwrap_err();
        assert!(err.is_predicate_failure());
        assert!(err.to_string().contains("boot timed out"));
        // Empty candidate in phase 1, then the first half-split
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_more_seeds_than_chunk_limit_still_runs_phase_one() {
        let seeds = || vec![vec![1], vec![2], vec![3]];

        let calls = Cell::new(0);
        let config = Config::new(|_: &[u32]| {
            calls.set(calls.get() + 1);
            Ok(true)
        })
        .max_chunks(2);
        let outcome = minimize(config, seeds()).unwrap();
        assert!(outcome.items.is_empty());
        assert!(outcome.is_converged());
        assert_eq!(calls.get(), 3);

        let outcome = minimize(Config::new(|_: &[u32]| Ok(false)).max_chunks(2), seeds()).unwrap();
        assert_eq!(outcome.items, vec![1, 2, 3]);
        assert_eq!(
            outcome.status,
            Completion::TooManyChunks {
                chunks: 3,
                limit: 2,
            }
        );
        assert_eq!(outcome.stats.rounds, 0);
    }

    #[test]
    fn test_phase_one_can_bring_chunks_under_limit() {
        let outcome = minimize(
            Config::new(contains_all(&[5])).max_chunks(1),
            vec![vec![1, 2], vec![4, 5, 6], vec![8]],
        )
        .unwrap();
        assert_eq!(outcome.items, vec![5]);
        assert!(outcome.is_converged());
    }

    #[test]
    fn test_budget_exhausted_mid_round_keeps_superset() {
        let needed = [1, 6, 13];
        let outcome = minimize(
            Config::new(contains_all(&needed)).pred_limit(4),
            vec![(0..16).collect()],
        )
        .unwrap();
        assert_eq!(
            outcome.status,
            Completion::PredicateBudgetExhausted { limit: 4 }
        );
        assert_eq!(outcome.stats.predicate_calls, 4);
        for n in needed {
            assert!(outcome.items.contains(&n));
        }
    }

    #[test]
    fn test_logf_receives_progress() {
        let lines = RefCell::new(Vec::new());
        let config = Config::new(contains_all(&[3]))
            .logf(|args| lines.borrow_mut().push(args.to_string()));
        minimize(config, vec![(0..4).collect()]).unwrap();

        let lines = lines.into_inner();
        assert_eq!(lines.first().unwrap(), "minimizing 4 elements in 1 chunks");
        assert!(lines.iter().any(|l| l.starts_with("round 1:")));
        assert!(lines.last().unwrap().starts_with("done: converged"));
    }
}
