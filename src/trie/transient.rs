use std::sync::Arc;

use crate::pool::ChunkPool;
use crate::{Elem, VectorError};
use super::{Chunk, Node, TrieVector, BRANCH_FACTOR};

/// A mutable builder over a persistent vector's graph.
///
/// The transient starts by sharing the source vector's nodes. The first write to any node
/// copies it (`Arc::make_mut` sees the extra reference); from then on the copy is uniquely
/// owned and later writes land in place. Nothing reachable from the source vector is ever
/// mutated.
///
/// State machine: `Fresh → Mutated* → Finalised`. `persistent()` hands the graph back as an
/// immutable vector and consumes the transient; every call after that fails with
/// [`VectorError::TransientConsumed`].
pub struct TransientVector<T: Elem> {
    vec: TrieVector<T>,
    /// Recycles tail chunks shed by rebuilds, so append-heavy builds reuse buffers.
    pool: ChunkPool<T>,
    consumed: bool,
}

impl<T: Elem> TransientVector<T> {
    pub(crate) fn new(vec: TrieVector<T>) -> Self {
        TransientVector {
            vec,
            pool: ChunkPool::new(),
            consumed: false,
        }
    }

    fn guard(&self) -> Result<(), VectorError> {
        if self.consumed {
            Err(VectorError::TransientConsumed)
        } else {
            Ok(())
        }
    }

    /// Element count so far. Reports zero once the transient is consumed.
    pub fn len(&self) -> usize {
        self.vec.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }

    pub fn append(&mut self, value: T) -> Result<(), VectorError> {
        self.guard()?;
        self.push_pooled(value);
        Ok(())
    }

    pub fn extend(&mut self, iter: impl IntoIterator<Item = T>) -> Result<(), VectorError> {
        self.guard()?;
        for value in iter {
            self.push_pooled(value);
        }
        Ok(())
    }

    /// Prepend degrades to materialise-and-rebuild, like the persistent form.
    pub fn prepend(&mut self, value: T) -> Result<(), VectorError> {
        self.guard()?;
        let old = std::mem::take(&mut self.vec);
        let mut out = TrieVector::new();
        out.push_mut(value);
        out.extend_mut(old.iter().cloned());
        self.vec = out;
        if let Some(chunk) = old.reclaim_tail() {
            self.pool.put(chunk);
        }
        Ok(())
    }

    pub fn set(&mut self, index: usize, value: T) -> Result<(), VectorError> {
        self.guard()?;
        if index >= self.vec.len() {
            return Err(VectorError::IndexOutOfRange { index, len: self.vec.len() });
        }
        self.vec.set_mut(index, value);
        Ok(())
    }

    /// Append a whole chunk. When the build is leaf aligned and the chunk is full it lands in
    /// the trie as one leaf; otherwise it falls back to element appends.
    pub(crate) fn push_chunk(&mut self, chunk: &Chunk<T>) {
        debug_assert!(!self.consumed);
        if chunk.is_full() && self.vec.tail().is_empty() && self.vec.len() % BRANCH_FACTOR == 0 {
            self.vec.push_leaf_arc(Arc::new(Node::leaf_from_chunk(chunk.clone())));
        } else {
            for value in chunk.iter() {
                self.push_pooled(value.clone());
            }
        }
    }

    /// Finalise: transfer ownership of the graph into an immutable vector. The transient is
    /// consumed and must not be used again.
    pub fn persistent(&mut self) -> Result<TrieVector<T>, VectorError> {
        self.guard()?;
        self.consumed = true;
        let mut vec = std::mem::take(&mut self.vec);
        vec.normalize();
        Ok(vec)
    }

    fn push_pooled(&mut self, value: T) {
        if self.vec.tail().is_full() {
            let mut fresh = self.pool.get();
            fresh.push(value);
            self.vec.freeze_tail_with(fresh);
        } else {
            self.vec.push_mut(value);
        }
    }
}
