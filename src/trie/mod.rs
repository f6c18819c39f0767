//! The chunked trie representation: a persistent vector stored as a radix trie of 32-wide
//! nodes plus an append tail, with structural sharing between versions.
//!
//! Elements live in fixed-capacity chunks ([`chunk::Chunk`]). A vector of 32 or fewer elements
//! is all tail; beyond that, full chunks are frozen into a left-packed radix trie addressed by
//! 5-bit digits of the element index. Every leaf inside the trie holds exactly 32 elements, so
//! indexing never needs per-node size tables.
//!
//! Updates path-copy: a cloned handle makes every node shared, so `Arc::make_mut` along the
//! root-to-leaf path clones exactly the nodes on that path and nothing else. The transient form
//! owns its graph exclusively, so the same code mutates in place after the first touch.

mod chunk;
mod node;
mod vector;
mod mutations;
mod transient;
mod iter;

#[cfg(test)]
mod fuzzer;

pub(crate) use chunk::Chunk;
pub(crate) use mutations::clamp_range;
pub(crate) use node::Node;
pub use iter::Iter;
pub use transient::TransientVector;
pub use vector::TrieVector;

/// The branch factor: maximum children per internal node, and the capacity of a leaf chunk and
/// of the tail.
pub const BRANCH_FACTOR: usize = 32;

/// log2 of the branch factor. Each trie level consumes this many bits of the element index.
pub(crate) const SHIFT: usize = 5;

/// Mask extracting one radix digit from an element index.
pub(crate) const MASK: usize = BRANCH_FACTOR - 1;

/// A node is stored sparse while its live-slot ratio stays under 0.30 (9.6 of 32 slots).
pub(crate) const SPARSE_MAX: usize = 9;

/// A leaf is stored run-compressed when it collapses to at most this many runs.
pub(crate) const RUN_MAX: usize = BRANCH_FACTOR / 8;

/// Capacity in elements of a trie rooted at the given height (leaves count as height 0).
#[inline]
pub(crate) fn capacity_at_height(height: usize) -> usize {
    BRANCH_FACTOR << (SHIFT * height)
}
