//! Allocator-side caches. Both are optimisations with no semantic effect: the chunk pool
//! dampens buffer churn in append-heavy transient builds, and the node cache interns
//! structurally equal leaves produced by generator constructors. Each is an explicit,
//! bounded resource owned by whoever needs one; there is no process-wide state.

use std::sync::Arc;

use crate::trie::{Chunk, Node};
use crate::Elem;

/// Released chunks kept beyond this count are dropped instead of pooled.
pub(crate) const POOL_CEILING: usize = 100;

/// Cached nodes beyond this count are not retained.
pub(crate) const CACHE_CEILING: usize = 100;

/// A bounded free list of chunk buffers. Chunks are cleared on the way in, so a recycled
/// buffer never leaks prior contents.
#[derive(Debug)]
pub(crate) struct ChunkPool<T: Elem> {
    free: Vec<Chunk<T>>,
    ceiling: usize,
}

impl<T: Elem> ChunkPool<T> {
    pub fn new() -> Self {
        Self::with_ceiling(POOL_CEILING)
    }

    pub fn with_ceiling(ceiling: usize) -> Self {
        ChunkPool { free: Vec::new(), ceiling }
    }

    /// A fresh, empty chunk — recycled when one is available.
    pub fn get(&mut self) -> Chunk<T> {
        let chunk = self.free.pop().unwrap_or_default();
        debug_assert!(chunk.is_empty());
        chunk
    }

    /// Return a chunk to the pool. Contents are cleared; chunks past the ceiling are dropped.
    pub fn put(&mut self, mut chunk: Chunk<T>) {
        if self.free.len() < self.ceiling {
            chunk.clear();
            self.free.push(chunk);
        }
    }

    pub fn available(&self) -> usize {
        self.free.len()
    }
}

/// A bounded structural interner for trie nodes. `intern` returns a shared handle to an
/// existing structurally equal node when one is cached, so builds that produce repeated
/// leaves (constant or cyclic generators) share them instead of reallocating.
///
/// Lookup is a linear scan; the ceiling keeps that cheap. Interned nodes may end up
/// referenced from many vectors, which is safe because shared nodes are never mutated in
/// place — `Arc::make_mut` sees the cache's reference and copies.
#[derive(Debug)]
pub(crate) struct NodeCache<T: Elem> {
    entries: Vec<Arc<Node<T>>>,
    ceiling: usize,
}

impl<T: Elem> NodeCache<T> {
    pub fn new() -> Self {
        Self::with_ceiling(CACHE_CEILING)
    }

    pub fn with_ceiling(ceiling: usize) -> Self {
        NodeCache { entries: Vec::new(), ceiling }
    }

    pub fn intern(&mut self, node: Node<T>) -> Arc<Node<T>> {
        if let Some(hit) = self.entries.iter().find(|e| ***e == node) {
            return hit.clone();
        }
        let arc = Arc::new(node);
        if self.entries.len() < self.ceiling {
            self.entries.push(arc.clone());
        }
        arc
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
