use smallvec::SmallVec;

use crate::Elem;
use super::BRANCH_FACTOR;

/// A contiguous buffer of up to [`BRANCH_FACTOR`] elements. Chunks serve two roles: the payload
/// of a trie leaf, and the append tail hanging off the end of a vector.
///
/// The capacity is a hard invariant. Every splice operation below panics rather than spill,
/// because a spilled chunk would silently break radix addressing.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Chunk<T: Elem>(SmallVec<T, BRANCH_FACTOR>);

impl<T: Elem> Chunk<T> {
    pub fn new() -> Self {
        Chunk(SmallVec::new())
    }

    /// A chunk holding a single element. This is the shape of a freshly rolled-over tail.
    pub fn unit(value: T) -> Self {
        let mut buf = SmallVec::new();
        buf.push(value);
        Chunk(buf)
    }

    pub fn from_slice(values: &[T]) -> Self {
        debug_assert!(values.len() <= BRANCH_FACTOR);
        Chunk(values.iter().cloned().collect())
    }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn is_full(&self) -> bool { self.0.len() == BRANCH_FACTOR }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.0.get(index)
    }

    pub fn last(&self) -> Option<&T> { self.0.last() }

    /// Overwrite the slot at `index`. The index must name a live slot.
    pub fn set(&mut self, index: usize, value: T) {
        self.0[index] = value;
    }

    pub fn push(&mut self, value: T) {
        debug_assert!(!self.is_full(), "chunk overflow");
        self.0.push(value);
    }

    pub fn pop(&mut self) -> Option<T> {
        self.0.pop()
    }

    /// Splice-insert, shifting later elements right. The chunk must have spare capacity.
    pub fn insert(&mut self, index: usize, value: T) {
        debug_assert!(!self.is_full(), "chunk overflow");
        self.0.insert(index, value);
    }

    /// Splice-remove, shifting later elements left.
    pub fn remove(&mut self, index: usize) -> T {
        self.0.remove(index)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    /// The number of runs of consecutive equal values. An empty chunk has zero runs.
    pub fn count_runs(&self) -> usize {
        let mut runs = 0;
        let mut prev: Option<&T> = None;
        for v in self.0.iter() {
            if prev != Some(v) {
                runs += 1;
                prev = Some(v);
            }
        }
        runs
    }
}

impl<T: Elem> Default for Chunk<T> {
    fn default() -> Self { Self::new() }
}

impl<T: Elem> FromIterator<T> for Chunk<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let buf: SmallVec<T, BRANCH_FACTOR> = iter.into_iter().collect();
        debug_assert!(buf.len() <= BRANCH_FACTOR, "chunk overflow");
        Chunk(buf)
    }
}
