use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Index of a chunk record inside a [`ChunkSet`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId(usize);

/// A contiguous group of items tracked as one unit by the search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    span: Range<usize>,
    is_final: bool,
}

impl Chunk {
    const fn new(span: Range<usize>) -> Self {
        Self {
            span,
            is_final: false,
        }
    }

    /// Item positions covered by this chunk
    #[must_use]
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    /// Number of items in the chunk
    #[must_use]
    pub const fn len(&self) -> usize {
        self.span.end - self.span.start
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the chunk is proven irreducible and must not be split again
    #[must_use]
    pub const fn is_final(&self) -> bool {
        self.is_final
    }

    /// Split into the first `len / 2` items and the rest
    #[must_use]
    pub const fn halves(&self) -> (Range<usize>, Range<usize>) {
        let mid = self.span.start + self.len() / 2;
        (self.span.start..mid, mid..self.span.end)
    }
}

/// Ordered list of live chunks over an arena of chunk records.
///
/// Items are stored once; chunks refer to them by position. Concatenating
/// the live chunks in order yields the current candidate sequence. Records
/// are never removed from the arena, only unlinked from the live order, so a
/// [`ChunkId`] stays valid for the whole run.
#[derive(Debug, Clone)]
pub struct ChunkSet<T> {
    items: Vec<T>,
    arena: Vec<Chunk>,
    order: Vec<ChunkId>,
}

impl<T> ChunkSet<T> {
    /// Build a chunk set with one chunk per non-empty seed
    pub fn from_seeds<I>(seeds: I) -> Self
    where
        I: IntoIterator<Item = Vec<T>>,
    {
        let mut set = Self {
            items: Vec::new(),
            arena: Vec::new(),
            order: Vec::new(),
        };
        for seed in seeds {
            if seed.is_empty() {
                continue;
            }
            let start = set.items.len();
            set.items.extend(seed);
            let id = set.alloc(start..set.items.len());
            set.order.push(id);
        }
        set
    }

    /// Number of live chunks
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Live chunks in candidate order
    #[must_use]
    pub fn ids(&self) -> &[ChunkId] {
        &self.order
    }

    /// Chunk record by id
    #[must_use]
    pub fn chunk(&self, id: ChunkId) -> &Chunk {
        &self.arena[id.0]
    }

    /// Number of items across all live chunks
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.order.iter().map(|id| self.arena[id.0].len()).sum()
    }

    /// True once every live chunk is final
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.order.iter().all(|id| self.arena[id.0].is_final)
    }

    /// Counters for progress traces
    #[must_use]
    pub fn summary(&self) -> ChunkSetSummary {
        ChunkSetSummary {
            chunks: self.order.len(),
            final_chunks: self
                .order
                .iter()
                .filter(|id| self.arena[id.0].is_final)
                .count(),
            elements: self.element_count(),
        }
    }

    pub(crate) fn alloc(&mut self, span: Range<usize>) -> ChunkId {
        debug_assert!(span.start < span.end && span.end <= self.items.len());
        self.arena.push(Chunk::new(span));
        ChunkId(self.arena.len() - 1)
    }

    pub(crate) fn mark_final(&mut self, id: ChunkId) {
        self.arena[id.0].is_final = true;
    }

    /// Replace the live order; ids must be in ascending item order
    pub(crate) fn set_order(&mut self, order: Vec<ChunkId>) {
        debug_assert!(order
            .windows(2)
            .all(|w| self.arena[w[0].0].span.end <= self.arena[w[1].0].span.start));
        self.order = order;
    }
}

impl<T: Clone> ChunkSet<T> {
    /// Concatenate the items of the given spans into one candidate
    pub(crate) fn assemble<I>(&self, spans: I) -> Vec<T>
    where
        I: IntoIterator<Item = Range<usize>>,
    {
        let mut candidate = Vec::new();
        for span in spans {
            candidate.extend_from_slice(&self.items[span]);
        }
        candidate
    }

    /// Spans of the given chunk ids, in order
    pub(crate) fn spans<'s>(
        &'s self,
        ids: &'s [ChunkId],
    ) -> impl Iterator<Item = Range<usize>> + 's {
        ids.iter().map(|id| self.arena[id.0].span())
    }

    /// The current candidate: all live chunks concatenated
    #[must_use]
    pub fn flatten(&self) -> Vec<T> {
        self.assemble(self.spans(&self.order))
    }
}

/// Snapshot of a chunk set for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSetSummary {
    pub chunks: usize,
    pub final_chunks: usize,
    pub elements: usize,
}

impl fmt::Display for ChunkSetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} chunks ({} final), {} elements",
            self.chunks, self.final_chunks, self.elements
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_seeds_skips_empty() {
        let set = ChunkSet::from_seeds(vec![vec![1, 2], vec![], vec![3]]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.element_count(), 3);
        assert_eq!(set.chunk(set.ids()[1]).span(), 2..3);
        assert_eq!(set.flatten(), vec![1, 2, 3]);
    }

    #[test]
    fn test_halves_floor_first() {
        let set = ChunkSet::from_seeds(vec![vec!['a', 'b', 'c', 'd', 'e']]);
        let (a, b) = set.chunk(set.ids()[0]).halves();
        assert_eq!(a, 0..2);
        assert_eq!(b, 2..5);
    }

    #[test]
    fn test_refine_keeps_order_and_final_flag() {
        let mut set = ChunkSet::from_seeds(vec![(0..6).collect::<Vec<u32>>()]);
        let (a, b) = set.chunk(set.ids()[0]).halves();
        let a = set.alloc(a);
        let b = set.alloc(b);
        set.set_order(vec![a, b]);
        set.mark_final(a);

        assert!(set.chunk(a).is_final());
        assert!(!set.is_done());
        assert_eq!(
            set.summary(),
            ChunkSetSummary {
                chunks: 2,
                final_chunks: 1,
                elements: 6,
            }
        );

        set.set_order(vec![b]);
        assert_eq!(set.flatten(), vec![3, 4, 5]);
        assert_eq!(set.summary().to_string(), "1 chunks (0 final), 3 elements");

        // Unlinked records keep their flag
        assert!(set.chunk(a).is_final());
    }

    #[test]
    fn test_empty_set_is_done() {
        let set = ChunkSet::<u8>::from_seeds(Vec::new());
        assert!(set.is_empty());
        assert!(set.is_done());
        assert!(set.flatten().is_empty());
    }
}
