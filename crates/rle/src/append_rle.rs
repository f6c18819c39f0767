#[cfg(feature = "smallvec")]
use smallvec::SmallVec;

use crate::MergableSpan;

pub trait AppendRle<T: MergableSpan> {
    /// Push a new item to this list-like object. If the passed item can be merged into the
    /// last item in the list, do so instead of inserting a new item.
    ///
    /// Returns true if the item was merged into the previous last item, false if it was inserted.
    fn push_rle(&mut self, item: T) -> bool;

    /// Extend the list by RLE-compacting the incoming iterator.
    fn extend_rle<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push_rle(item);
        }
    }
}

impl<T: MergableSpan> AppendRle<T> for Vec<T> {
    fn push_rle(&mut self, item: T) -> bool {
        if let Some(last) = self.last_mut() {
            if last.can_append(&item) {
                last.append(item);
                return true;
            }
        }
        self.push(item);
        false
    }
}

#[cfg(feature = "smallvec")]
impl<T: MergableSpan, const N: usize> AppendRle<T> for SmallVec<T, N> {
    fn push_rle(&mut self, item: T) -> bool {
        if let Some(last) = self.last_mut() {
            if last.can_append(&item) {
                last.append(item);
                return true;
            }
        }
        self.push(item);
        false
    }
}
