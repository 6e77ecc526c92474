//! Entry points that seed the engine from a single backing slice.

use crate::config::Config;
use crate::engine::minimize;
use crate::error::{MinimizeError, Result};
use crate::types::Outcome;
use itertools::Itertools;
use std::ops::Range;

/// Seed ranges over a slice of known length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    ranges: Vec<Range<usize>>,
}

impl Partition {
    /// One range covering everything (no range for an empty slice)
    #[must_use]
    pub fn whole(len: usize) -> Self {
        Self::even(len, 1)
    }

    /// First half and second half
    #[must_use]
    pub fn halves(len: usize) -> Self {
        Self::at(len, &[len / 2])
    }

    /// `parts` ranges of near-equal size, larger ones first
    #[must_use]
    pub fn even(len: usize, parts: usize) -> Self {
        let parts = parts.clamp(1, len.max(1));
        let base = len / parts;
        let extra = len % parts;
        let mut start = 0;
        let mut ranges = Vec::with_capacity(parts);
        for part in 0..parts {
            let end = start + base + usize::from(part < extra);
            if end > start {
                ranges.push(start..end);
            }
            start = end;
        }
        Self { ranges }
    }

    /// Split at the given points; duplicate and out-of-range points are ignored
    #[must_use]
    pub fn at(len: usize, points: &[usize]) -> Self {
        let cuts = std::iter::once(0)
            .chain(points.iter().copied().filter(|&p| p > 0 && p < len))
            .chain(std::iter::once(len))
            .sorted_unstable()
            .dedup();
        let ranges = cuts
            .tuple_windows()
            .map(|(start, end): (usize, usize)| start..end)
            .collect();
        Self { ranges }
    }

    #[must_use]
    pub fn ranges(&self) -> &[Range<usize>] {
        &self.ranges
    }

    /// Number of seed ranges
    #[must_use]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

/// Minimize a slice seeded as a single chunk
pub fn minimize_slice<T: Clone>(config: Config<'_, T>, items: &[T]) -> Result<Outcome<T>> {
    minimize(config, std::iter::once(items.to_vec()))
}

/// Minimize a slice seeded with caller-chosen contiguous ranges.
///
/// The ranges must be non-empty, ascending and cover `0..items.len()` without
/// gaps or overlap; anything else is rejected before the predicate is called.
pub fn minimize_ranges<T: Clone>(
    config: Config<'_, T>,
    items: &[T],
    ranges: &[Range<usize>],
) -> Result<Outcome<T>> {
    validate_ranges(items.len(), ranges)?;
    minimize(config, ranges.iter().map(|r| items[r.clone()].to_vec()))
}

/// Minimize a slice seeded from a [`Partition`]
pub fn minimize_partitioned<T: Clone>(
    config: Config<'_, T>,
    items: &[T],
    partition: &Partition,
) -> Result<Outcome<T>> {
    minimize_ranges(config, items, partition.ranges())
}

/// Minimize a slice while never removing items matched by `is_fixed`.
///
/// Fixed items are present in every candidate at their original positions and
/// in the result. Only the other items are bisected, seeded as one chunk, so
/// limits and call counts refer to the free items.
pub fn minimize_with_fixed<'a, T, F>(
    config: Config<'a, T>,
    items: &'a [T],
    is_fixed: F,
) -> Result<Outcome<T>>
where
    T: Clone,
    F: Fn(&T) -> bool,
{
    let (fixed, free): (Vec<usize>, Vec<usize>) =
        (0..items.len()).partition(|&idx| is_fixed(&items[idx]));
    log::debug!("{} fixed and {} free elements", fixed.len(), free.len());

    let Config {
        mut pred,
        limits,
        logf,
    } = config;
    let fixed_positions = fixed.clone();
    let mut by_index = Config::new(move |kept: &[usize]| {
        let candidate = merge_positions(items, &fixed_positions, kept);
        pred(&candidate)
    })
    .limits(limits);
    by_index.logf = logf;

    let mut outcome = minimize(by_index, std::iter::once(free))?
        .map_items(|kept| merge_positions(items, &fixed, &kept));
    outcome.stats.initial_len = items.len();
    Ok(outcome)
}

/// Items at the union of two ascending position lists, in slice order
fn merge_positions<T: Clone>(items: &[T], left: &[usize], right: &[usize]) -> Vec<T> {
    left.iter()
        .merge(right)
        .map(|&idx| items[idx].clone())
        .collect()
}

fn validate_ranges(len: usize, ranges: &[Range<usize>]) -> Result<()> {
    let mut expected_start = 0;
    for range in ranges {
        if range.start >= range.end || range.end > len {
            return Err(MinimizeError::InvalidRange {
                start: range.start,
                end: range.end,
                len,
            });
        }
        if range.start != expected_start {
            return Err(MinimizeError::RangesNotTiling {
                len,
                detail: format!(
                    "range {}..{} should start at {}",
                    range.start, range.end, expected_start
                ),
            });
        }
        expected_start = range.end;
    }
    if expected_start != len {
        return Err(MinimizeError::RangesNotTiling {
            len,
            detail: format!("items {expected_start}..{len} are not covered"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    fn counting(calls: &Cell<usize>) -> Config<'_, u32> {
        Config::new(move |_: &[u32]| {
            calls.set(calls.get() + 1);
            Ok(true)
        })
    }

    #[test]
    fn test_partition_shapes() {
        assert_eq!(Partition::whole(5).ranges(), &[0..5]);
        assert!(Partition::whole(0).is_empty());
        assert_eq!(Partition::halves(7).ranges(), &[0..3, 3..7]);
        assert_eq!(Partition::halves(1).ranges(), &[0..1]);
        assert_eq!(Partition::even(10, 3).ranges(), &[0..4, 4..7, 7..10]);
        assert_eq!(Partition::even(2, 5).ranges(), &[0..1, 1..2]);
        assert_eq!(
            Partition::at(10, &[7, 3, 3, 0, 12]).ranges(),
            &[0..3, 3..7, 7..10]
        );
    }

    #[test]
    fn test_partitions_always_tile() {
        for len in 0..20 {
            for parts in 1..6 {
                let partition = Partition::even(len, parts);
                assert!(validate_ranges(len, partition.ranges()).is_ok());
            }
            assert!(validate_ranges(len, Partition::halves(len).ranges()).is_ok());
        }
    }

    #[test]
    fn test_invalid_ranges_rejected_before_calls() {
        let calls = Cell::new(0);
        let items: Vec<u32> = (0..10).collect();

        let err = minimize_ranges(counting(&calls), &items, &[0..4, 4..11]).unwrap_err();
        assert!(matches!(err, MinimizeError::InvalidRange { end: 11, .. }));

        let err = minimize_ranges(counting(&calls), &items, &[0..4, 3..10]).unwrap_err();
        assert!(matches!(err, MinimizeError::RangesNotTiling { .. }));

        let err = minimize_ranges(counting(&calls), &items, &[0..4, 4..8]).unwrap_err();
        assert!(err.to_string().contains("8..10 are not covered"), "{err}");

        let err = minimize_ranges(counting(&calls), &items, &[0..0, 0..10]).unwrap_err();
        assert!(matches!(err, MinimizeError::InvalidRange { .. }));

        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_ranges_reconstruct_contiguous_result() {
        let items: Vec<u32> = (0..12).collect();
        let config = Config::new(|c: &[u32]| Ok(c.contains(&2) && c.contains(&9)));
        let outcome =
            minimize_partitioned(config, &items, &Partition::even(items.len(), 3)).unwrap();
        assert_eq!(outcome.items, vec![2, 9]);
        assert_eq!(outcome.stats.seed_chunks, 3);
    }

    #[test]
    fn test_fixed_items_present_in_every_candidate() {
        let items = vec!["A", "x", "B", "y", "z", "C"];
        let config = Config::<&str>::new(|c| {
            assert!(c.contains(&"A") && c.contains(&"B") && c.contains(&"C"));
            Ok(c.contains(&"z"))
        });
        let outcome =
            minimize_with_fixed(config, &items, |s| s.chars().all(char::is_uppercase)).unwrap();
        assert_eq!(outcome.items, vec!["A", "B", "z", "C"]);
        assert_eq!(outcome.stats.initial_len, 6);
        assert_eq!(outcome.stats.result_len, 4);
    }

    #[test]
    fn test_all_fixed_makes_no_calls() {
        let items = vec![1, 2, 3];
        let config = Config::new(|_: &[i32]| -> anyhow::Result<bool> {
            anyhow::bail!("must not be called")
        });
        let outcome = minimize_with_fixed(config, &items, |_| true).unwrap();
        assert_eq!(outcome.items, items);
        assert_eq!(outcome.stats.predicate_calls, 0);
    }
}
