use std::sync::Arc;

use smallvec::SmallVec;

use crate::{Elem, VectorError};
use crate::pool::NodeCache;
use super::iter::Iter;
use super::mutations::{
    clamp_range, get_in_node, pop_leaf, push_leaf, set_in_node, share_leaf_range, take_arc,
};
use super::{capacity_at_height, Chunk, Node, TransientVector, BRANCH_FACTOR, MASK};

/// A persistent vector: a left-packed radix trie of 32-wide chunks plus an append tail.
///
/// Values of this type are immutable. Every operation returns a new vector sharing all
/// untouched structure with its input; holding an old version costs only the path the newer
/// version rewrote. `get` is O(log32 n), `append` is amortised O(1), `set` is O(log32 n).
///
/// The trie only ever stores full chunks. Partial data lives in the tail, so indexing is pure
/// radix arithmetic: level `d` of the descent reads bits `d*5..d*5+5` of the element index.
#[derive(Debug, Clone)]
pub struct TrieVector<T: Elem> {
    size: usize,
    /// Branch levels between the root and the leaves. Only meaningful when `root` is present.
    height: usize,
    root: Option<Arc<Node<T>>>,
    tail: Arc<Chunk<T>>,
}

impl<T: Elem> TrieVector<T> {
    pub fn new() -> Self {
        TrieVector {
            size: 0,
            height: 0,
            root: None,
            tail: Arc::new(Chunk::new()),
        }
    }

    pub fn from_slice(values: &[T]) -> Self {
        let mut out = Self::new();
        for part in values.chunks(BRANCH_FACTOR) {
            if part.len() == BRANCH_FACTOR {
                out.push_leaf_arc(Arc::new(Node::leaf_from_chunk(Chunk::from_slice(part))));
            } else {
                out.extend_mut(part.iter().cloned());
            }
        }
        out.normalize();
        out
    }

    /// Build a vector of `n` generated elements. Structurally equal leaves produced by the
    /// generator are interned through a bounded node cache, so constant or cyclic generators
    /// share their repeated chunks instead of allocating them over and over.
    pub fn of(n: usize, mut generator: impl FnMut(usize) -> T) -> Self {
        let mut cache = NodeCache::new();
        let mut out = Self::new();
        let mut buf = Chunk::new();
        for i in 0..n {
            buf.push(generator(i));
            if buf.is_full() {
                let leaf = cache.intern(Node::leaf_from_chunk(std::mem::take(&mut buf)));
                out.push_leaf_arc(leaf);
            }
        }
        if !buf.is_empty() {
            out.size += buf.len();
            out.tail = Arc::new(buf);
        }
        out.normalize();
        out
    }

    /// `n` copies of one value.
    pub fn repeat(n: usize, value: T) -> Self {
        Self::of(n, |_| value.clone())
    }

    pub fn len(&self) -> usize { self.size }

    pub fn is_empty(&self) -> bool { self.size == 0 }

    /// Number of elements held in the trie; the tail covers indexes from here up.
    pub(crate) fn tail_offset(&self) -> usize {
        self.size - self.tail.len()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.size {
            return None;
        }
        let tail_offset = self.tail_offset();
        if index >= tail_offset {
            return self.tail.get(index - tail_offset);
        }
        get_in_node(self.root.as_deref()?, self.height, index)
    }

    pub fn first(&self) -> Option<&T> {
        self.get(0)
    }

    pub fn last(&self) -> Option<&T> {
        if self.tail.is_empty() {
            self.get(self.size.wrapping_sub(1))
        } else {
            self.tail.last()
        }
    }

    /// Replace the element at `index`, path-copying down to the touched chunk.
    pub fn set(&self, index: usize, value: T) -> Result<Self, VectorError> {
        if index >= self.size {
            return Err(VectorError::IndexOutOfRange { index, len: self.size });
        }
        let mut out = self.clone();
        out.set_mut(index, value);
        Ok(out)
    }

    /// In-place counterpart of `set`; the index must be in range.
    pub(crate) fn set_mut(&mut self, index: usize, value: T) {
        debug_assert!(index < self.size);
        let tail_offset = self.tail_offset();
        if index >= tail_offset {
            Arc::make_mut(&mut self.tail).set(index - tail_offset, value);
        } else {
            let root = self.root.as_mut().expect("trie invariant: indexed element with no root");
            set_in_node(root, self.height, index, value);
        }
    }

    pub fn append(&self, value: T) -> Self {
        let mut out = self.clone();
        out.push_mut(value);
        out
    }

    /// In-place append. On a shared handle this path-copies; on an exclusively owned graph
    /// (a transient) it writes straight into the tail.
    pub(crate) fn push_mut(&mut self, value: T) {
        if self.tail.is_full() {
            let frozen = std::mem::replace(&mut self.tail, Arc::new(Chunk::unit(value)));
            let leaf = Arc::new(Node::leaf_from_chunk(take_arc(frozen)));
            push_leaf(&mut self.root, &mut self.height, self.size - BRANCH_FACTOR, leaf);
        } else {
            Arc::make_mut(&mut self.tail).push(value);
        }
        self.size += 1;
    }

    /// Freeze the full tail into the trie, installing `replacement` (a unit chunk holding the
    /// value being appended) as the new tail. The pooled-append path in the transient hands in
    /// recycled chunks here.
    pub(crate) fn freeze_tail_with(&mut self, replacement: Chunk<T>) {
        debug_assert!(self.tail.is_full());
        debug_assert_eq!(replacement.len(), 1);
        let frozen = std::mem::replace(&mut self.tail, Arc::new(replacement));
        let leaf = Arc::new(Node::leaf_from_chunk(take_arc(frozen)));
        push_leaf(&mut self.root, &mut self.height, self.size - BRANCH_FACTOR, leaf);
        self.size += 1;
    }

    /// Hand the tail buffer back to the caller if nothing else references it.
    pub(crate) fn reclaim_tail(self) -> Option<Chunk<T>> {
        Arc::try_unwrap(self.tail).ok()
    }

    pub(crate) fn extend_mut(&mut self, iter: impl IntoIterator<Item = T>) {
        for v in iter {
            self.push_mut(v);
        }
    }

    /// Append a full shared leaf without copying it. Only legal while the tail is empty.
    pub(crate) fn push_leaf_arc(&mut self, leaf: Arc<Node<T>>) {
        debug_assert!(self.tail.is_empty());
        debug_assert_eq!(self.size % BRANCH_FACTOR, 0);
        debug_assert_eq!(leaf.size(), BRANCH_FACTOR);
        push_leaf(&mut self.root, &mut self.height, self.size, leaf);
        self.size += BRANCH_FACTOR;
    }

    /// Re-establish the small-size representation rules after a bulk build: a vector of at
    /// most one chunk keeps everything in its tail.
    pub(crate) fn normalize(&mut self) {
        if self.size > 0 && self.size <= BRANCH_FACTOR && self.root.is_some() {
            debug_assert!(self.tail.is_empty());
            let root = self.root.take().expect("checked above");
            self.tail = Arc::new(root.to_chunk());
            self.height = 0;
        }
    }

    /// Prepend is O(n) here: giving the leftmost leaf spare capacity would leave a short chunk
    /// in the middle of the trie and break radix addressing, so we rebuild instead.
    pub fn prepend(&self, value: T) -> Self {
        let mut out = Self::new();
        out.push_mut(value);
        out.extend_mut(self.iter().cloned());
        out
    }

    /// Remove the last element. Pulls the rightmost trie leaf back out as the tail when the
    /// tail empties, keeping repeated pops cheap.
    pub(crate) fn pop_mut(&mut self) -> Option<T> {
        if self.size == 0 {
            return None;
        }
        if self.tail.is_empty() {
            let leaf = pop_leaf(&mut self.root, &mut self.height);
            self.tail = Arc::new(leaf.to_chunk());
        }
        let value = Arc::make_mut(&mut self.tail).pop().expect("tail refilled above");
        self.size -= 1;
        if self.tail.is_empty() && self.root.is_some() {
            let leaf = pop_leaf(&mut self.root, &mut self.height);
            self.tail = Arc::new(leaf.to_chunk());
        }
        self.normalize();
        Some(value)
    }

    pub fn insert(&self, index: usize, value: T) -> Result<Self, VectorError> {
        if index > self.size {
            return Err(VectorError::IndexOutOfRange { index, len: self.size });
        }
        if index == self.size {
            return Ok(self.append(value));
        }
        let tail_offset = self.tail_offset();
        if index >= tail_offset && !self.tail.is_full() {
            let mut out = self.clone();
            Arc::make_mut(&mut out.tail).insert(index - tail_offset, value);
            out.size += 1;
            return Ok(out);
        }
        // Splice inside the trie (or into a full tail): repack everything from the affected
        // leaf rightward, sharing every leaf to its left untouched.
        let boundary = (index & !MASK).min(tail_offset);
        let mut out = self.share_prefix(boundary);
        out.extend_mut(self.iter_range(boundary, index).cloned());
        out.push_mut(value);
        out.extend_mut(self.iter_range(index, self.size).cloned());
        out.normalize();
        Ok(out)
    }

    pub fn remove(&self, index: usize) -> Result<Self, VectorError> {
        if index >= self.size {
            return Err(VectorError::IndexOutOfRange { index, len: self.size });
        }
        if index == self.size - 1 {
            let mut out = self.clone();
            out.pop_mut();
            return Ok(out);
        }
        let tail_offset = self.tail_offset();
        if index >= tail_offset {
            let mut out = self.clone();
            Arc::make_mut(&mut out.tail).remove(index - tail_offset);
            out.size -= 1;
            return Ok(out);
        }
        let boundary = index & !MASK;
        let mut out = self.share_prefix(boundary);
        out.extend_mut(self.iter_range(boundary, index).cloned());
        out.extend_mut(self.iter_range(index + 1, self.size).cloned());
        out.normalize();
        Ok(out)
    }

    /// A new vector holding the first `boundary` elements, sharing their leaves. `boundary`
    /// must be leaf aligned and within the trie.
    fn share_prefix(&self, boundary: usize) -> Self {
        debug_assert_eq!(boundary % BRANCH_FACTOR, 0);
        debug_assert!(boundary <= self.tail_offset());
        let mut out = Self::new();
        if boundary > 0 {
            let root = self.root.as_ref().expect("nonzero boundary with no trie");
            let mut skip = 0;
            let mut take = boundary / BRANCH_FACTOR;
            share_leaf_range(root, &mut out, &mut skip, &mut take);
            debug_assert_eq!(take, 0);
        }
        out
    }

    pub fn concat(&self, other: &Self) -> Self {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let mut out = self.clone();
        if out.size % BRANCH_FACTOR == 0 {
            // The boundary is leaf aligned, so the other vector's leaves can be shared
            // wholesale. Freeze a full tail first to make room.
            if out.tail.is_full() {
                let frozen = std::mem::replace(&mut out.tail, Arc::new(Chunk::new()));
                let leaf = Arc::new(Node::leaf_from_chunk(take_arc(frozen)));
                push_leaf(&mut out.root, &mut out.height, out.size - BRANCH_FACTOR, leaf);
            }
            if let Some(other_root) = &other.root {
                let mut skip = 0;
                let mut take = other.tail_offset() / BRANCH_FACTOR;
                share_leaf_range(other_root, &mut out, &mut skip, &mut take);
            }
            out.extend_mut(other.tail.iter().cloned());
            return out;
        }
        out.extend_mut(other.iter().cloned());
        out
    }

    /// Contiguous sub-sequence. Negative endpoints count from the end; the range clamps to
    /// the vector. Leaf-aligned prefixes of the range are shared rather than copied.
    pub fn slice(&self, start: isize, end: isize) -> Self {
        let (a, b) = clamp_range(self.size, start, end);
        if a >= b {
            return Self::new();
        }
        if a == 0 && b == self.size {
            return self.clone();
        }
        let mut out = Self::new();
        if a % BRANCH_FACTOR == 0 {
            let full_end = b.min(self.tail_offset());
            let whole_leaves = full_end.saturating_sub(a) / BRANCH_FACTOR;
            if whole_leaves > 0 {
                let root = self.root.as_ref().expect("aligned slice with no trie");
                let mut skip = a / BRANCH_FACTOR;
                let mut take = whole_leaves;
                share_leaf_range(root, &mut out, &mut skip, &mut take);
            }
        }
        out.extend_mut(self.iter_range(a + out.len(), b).cloned());
        out.normalize();
        out
    }

    /// Structure-preserving map: the result has the same size, the same trie shape, and its
    /// leaves re-run the compression policy over the mapped values. The function is invoked
    /// once per element, in index order.
    pub fn map<U: Elem>(&self, mut f: impl FnMut(&T) -> U) -> TrieVector<U> {
        let root = self.root.as_ref().map(|r| map_node(r, &mut f));
        let tail: Chunk<U> = self.tail.iter().map(&mut f).collect();
        TrieVector {
            size: self.size,
            height: self.height,
            root,
            tail: Arc::new(tail),
        }
    }

    /// Keep the elements matching the predicate, compacted into a fresh vector.
    pub fn filter(&self, mut predicate: impl FnMut(&T) -> bool) -> Self {
        let mut out = Self::new();
        for v in self.iter() {
            if predicate(v) {
                out.push_mut(v.clone());
            }
        }
        out
    }

    pub fn reduce<A>(&self, mut f: impl FnMut(A, &T) -> A, init: A) -> A {
        let mut acc = init;
        for v in self.iter() {
            acc = f(acc, v);
        }
        acc
    }

    pub fn find(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<&T> {
        self.iter().find(|v| predicate(*v))
    }

    pub fn find_index(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<usize> {
        self.iter().position(|v| predicate(v))
    }

    /// Fused map → filter → reduce: one pass, no intermediate vector.
    pub fn map_filter_reduce<U, A>(
        &self,
        mut f: impl FnMut(&T) -> U,
        mut predicate: impl FnMut(&U) -> bool,
        mut g: impl FnMut(A, &U) -> A,
        init: A,
    ) -> A {
        let mut acc = init;
        for v in self.iter() {
            let mapped = f(v);
            if predicate(&mapped) {
                acc = g(acc, &mapped);
            }
        }
        acc
    }

    /// Fused map → reduce.
    pub fn map_reduce<U, A>(
        &self,
        mut f: impl FnMut(&T) -> U,
        mut g: impl FnMut(A, &U) -> A,
        init: A,
    ) -> A {
        let mut acc = init;
        for v in self.iter() {
            let mapped = f(v);
            acc = g(acc, &mapped);
        }
        acc
    }

    /// Fused filter → map: keeps matching elements, mapped, in one pass.
    pub fn filter_map<U: Elem>(
        &self,
        mut predicate: impl FnMut(&T) -> bool,
        mut f: impl FnMut(&T) -> U,
    ) -> TrieVector<U> {
        let mut out = TrieVector::new();
        for v in self.iter() {
            if predicate(v) {
                out.push_mut(f(v));
            }
        }
        out
    }

    /// Apply a batch of point writes, sorted by index, in one shared-structure pass. Every
    /// index is validated before anything is built.
    pub fn update_many(&self, pairs: &[(usize, T)]) -> Result<Self, VectorError> {
        for (index, _) in pairs {
            if *index >= self.size {
                return Err(VectorError::IndexOutOfRange { index: *index, len: self.size });
            }
        }
        let mut sorted: Vec<(usize, &T)> = pairs.iter().map(|(i, v)| (*i, v)).collect();
        sorted.sort_by_key(|(i, _)| *i);
        let mut out = self.clone();
        for (index, value) in sorted {
            // After the first touch the copied path is uniquely owned, so runs of nearby
            // indexes mutate in place instead of copying again.
            out.set_mut(index, value.clone());
        }
        Ok(out)
    }

    /// Remove a batch of indices (duplicates collapse), as if removed one by one from the
    /// highest index down. Single rebuild pass, prefix shared.
    pub fn remove_many(&self, indices: &[usize]) -> Result<Self, VectorError> {
        for index in indices {
            if *index >= self.size {
                return Err(VectorError::IndexOutOfRange { index: *index, len: self.size });
            }
        }
        let mut sorted = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.is_empty() {
            return Ok(self.clone());
        }
        let boundary = (sorted[0] & !MASK).min(self.tail_offset());
        let mut out = self.share_prefix(boundary);
        let mut drop = sorted.iter().peekable();
        for (offset, v) in self.iter_range(boundary, self.size).enumerate() {
            let index = boundary + offset;
            if drop.peek() == Some(&&index) {
                drop.next();
                continue;
            }
            out.push_mut(v.clone());
        }
        out.normalize();
        Ok(out)
    }

    /// Insert a batch of (index, value) pairs, indices naming positions in the receiver.
    /// Pairs are applied in ascending index order; equal indices insert in pair order.
    pub fn insert_many(&self, pairs: &[(usize, T)]) -> Result<Self, VectorError> {
        for (index, _) in pairs {
            if *index > self.size {
                return Err(VectorError::IndexOutOfRange { index: *index, len: self.size });
            }
        }
        if pairs.is_empty() {
            return Ok(self.clone());
        }
        let mut sorted: Vec<(usize, &T)> = pairs.iter().map(|(i, v)| (*i, v)).collect();
        sorted.sort_by_key(|(i, _)| *i);
        let boundary = (sorted[0].0 & !MASK).min(self.tail_offset());
        let mut out = self.share_prefix(boundary);
        let mut pending = sorted.into_iter().peekable();
        for (offset, v) in self.iter_range(boundary, self.size).enumerate() {
            let index = boundary + offset;
            while pending.peek().is_some_and(|(i, _)| *i == index) {
                let (_, value) = pending.next().expect("peeked above");
                out.push_mut(value.clone());
            }
            out.push_mut(v.clone());
        }
        for (_, value) in pending {
            out.push_mut(value.clone());
        }
        out.normalize();
        Ok(out)
    }

    /// An exclusive mutable snapshot of this vector. The transient starts out sharing the
    /// graph; nodes are copied on first touch and owned from then on.
    pub fn transient(&self) -> TransientVector<T> {
        TransientVector::new(self.clone())
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    /// Iterate the elements in `[start, end)`. Both bounds must already be clamped.
    pub(crate) fn iter_range(&self, start: usize, end: usize) -> Iter<'_, T> {
        Iter::new_range(self, start, end)
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    pub(crate) fn root(&self) -> Option<&Arc<Node<T>>> {
        self.root.as_ref()
    }

    pub(crate) fn tail(&self) -> &Chunk<T> {
        &self.tail
    }

    /// Deep invariant validation. Asserts the representation rules: tail bounds, leaf-aligned
    /// trie size, minimal height, left packing, and per-node size accounting.
    #[allow(unused)]
    pub fn dbg_check(&self) {
        assert!(self.tail.len() <= BRANCH_FACTOR);
        let tail_offset = self.tail_offset();
        assert_eq!(tail_offset % BRANCH_FACTOR, 0);
        match &self.root {
            None => {
                assert_eq!(tail_offset, 0, "trie elements with no root");
            }
            Some(root) => {
                assert!(self.size > BRANCH_FACTOR, "root must be absent for tail-only sizes");
                assert_eq!(root.size(), tail_offset);
                assert!(capacity_at_height(self.height) >= tail_offset);
                if self.height > 0 {
                    assert!(
                        tail_offset > capacity_at_height(self.height - 1),
                        "height is not minimal"
                    );
                    assert!(root.live_slots() >= 2, "single-child root was not collapsed");
                }
                root.dbg_check(self.height, tail_offset == capacity_at_height(self.height));
            }
        }
    }
}

fn map_node<T: Elem, U: Elem>(node: &Node<T>, f: &mut impl FnMut(&T) -> U) -> Arc<Node<U>> {
    if node.is_leaf() {
        let chunk: Chunk<U> = match node {
            Node::Leaf(c) => c.iter().map(|v| f(v)).collect(),
            Node::SparseLeaf(l) => l.slots.iter().map(|(_, v)| f(v)).collect(),
            Node::RunLeaf(l) => {
                let mut chunk = Chunk::new();
                for run in l.runs.iter() {
                    // One call per element, even inside a run: the function may be impure.
                    for _ in 0..run.len {
                        chunk.push(f(&run.val));
                    }
                }
                chunk
            }
            _ => unreachable!(),
        };
        Arc::new(Node::leaf_from_chunk(chunk))
    } else {
        let mut children: SmallVec<Arc<Node<U>>, BRANCH_FACTOR> = SmallVec::new();
        for child in node.children() {
            children.push(map_node(child, f));
        }
        Arc::new(Node::branch_from_children(children))
    }
}

impl<T: Elem> Default for TrieVector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Elem> FromIterator<T> for TrieVector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut out = Self::new();
        out.extend_mut(iter);
        out
    }
}

impl<T: Elem> PartialEq for TrieVector<T> {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size && self.iter().eq(other.iter())
    }
}

impl<T: Elem> PartialEq<[T]> for TrieVector<T> {
    fn eq(&self, other: &[T]) -> bool {
        self.size == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Elem> std::ops::Index<usize> for TrieVector<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(v) => v,
            None => panic!("index {} out of range for vector of length {}", index, self.size),
        }
    }
}

impl<'a, T: Elem> IntoIterator for &'a TrieVector<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
