//! Adaptive persistent vectors.
//!
//! A [`Vector`] is an immutable, indexed sequence. Operations return a new vector and leave
//! the receiver untouched; the two versions share all structure the operation did not
//! rewrite, so keeping old versions around is cheap.
//!
//! Three representations back the same contract, selected by size:
//!
//! - a flat buffer for short sequences ([`SmallVector`]),
//! - a run of shared 32-wide chunks for medium ones ([`ChunkedVector`]),
//! - a chunked radix trie with an append tail for everything else ([`TrieVector`]):
//!   O(log32 n) access and update, amortised O(1) append.
//!
//! [`Vector`] transitions between them automatically as its size crosses the thresholds.
//! Bulk construction and batch edits go through [`Transient`], a uniquely owned builder that
//! mutates in place and converts back into a vector in O(1).
//!
//! ```rust
//! use pvec::Vector;
//!
//! let v: Vector<i64> = (0..100).collect();
//! let w = v.set(40, -1).unwrap().append(100);
//!
//! // The original version is untouched.
//! assert_eq!(v.get(40), Some(&40));
//! assert_eq!(v.len(), 100);
//! assert_eq!(w.get(40), Some(&-1));
//! assert_eq!(w.len(), 101);
//! ```
//!
//! Single-pass combinators over vectors (map+filter+reduce without intermediates) live in
//! [`fuse`].

pub use adaptive::{
    IntoIter, Iter, ReprTag, Transient, Vector, MEDIUM_THRESHOLD, SMALL_THRESHOLD,
};
pub use chunked::{ChunkedVector, Iter as ChunkedIter};
pub use error::VectorError;
pub use small::{SmallTransient, SmallVector};
pub use trie::{Iter as TrieIter, TransientVector, TrieVector, BRANCH_FACTOR};

mod adaptive;
mod chunked;
mod error;
pub mod fuse;
mod pool;
#[cfg(feature = "serde")]
mod serde_helpers;
mod small;
mod trie;

/// Everything a vector needs from its element type. `Clone` backs structural sharing (a path
/// copy clones the touched chunk's elements), `PartialEq` powers run detection and node
/// interning, `Debug` powers the deep invariant checks. Ordering and hashing are never
/// required.
pub trait Elem: Clone + PartialEq + std::fmt::Debug {}

impl<T: Clone + PartialEq + std::fmt::Debug> Elem for T {}
