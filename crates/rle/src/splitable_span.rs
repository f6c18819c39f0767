/// Items with a length, measured in some arbitrary unit (bytes, elements, children, ...).
pub trait HasLength {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool { self.len() == 0 }
}

/// A SplitableSpan is a run entry: an item which compactly represents a sequence of smaller
/// items, and which can be cut at any interior position.
pub trait SplitableSpan: HasLength + Clone {
    /// Split the entry, returning the part of the entry which was jettisoned. After truncating at
    /// `at`, self.len() == `at` and the returned value contains the rest of the items.
    ///
    /// ```ignore
    /// let initial_len = entry.len();
    /// let rest = entry.truncate(at);
    /// assert!(initial_len == at + rest.len());
    /// ```
    ///
    /// The `at` parameter must strictly obey *0 < at < entry.len()*.
    fn truncate(&mut self, at: usize) -> Self;

    /// The inverse of truncate. Keeps content from at..len(), returning the range 0..at.
    #[inline(always)]
    fn truncate_keeping_right(&mut self, at: usize) -> Self {
        let mut other = self.clone();
        *self = other.truncate(at);
        other
    }
}

/// Entries which can sometimes be merged with an adjacent entry into a single run.
pub trait MergableSpan: Clone {
    /// See if the other item can be appended to self. `can_append` will always be called
    /// immediately before `append`.
    fn can_append(&self, other: &Self) -> bool;

    /// Merge the passed item into self. Essentially, self = self + other.
    ///
    /// The other item *must* be a valid target for merging (as per can_append, above).
    fn append(&mut self, other: Self);
}

/// Test helper verifying an implementation of SplitableSpan + MergableSpan round-trips through
/// every interior split point.
pub fn test_splitable_methods_valid<E>(entry: E)
where E: SplitableSpan + MergableSpan + std::fmt::Debug + Eq
{
    assert!(entry.len() >= 2, "Call this with a larger entry");
    for i in 1..entry.len() {
        let mut start = entry.clone();
        let end = start.truncate(i);

        assert_eq!(start.len(), i);
        assert_eq!(end.len(), entry.len() - i);
        assert!(start.can_append(&end));

        let mut merged = start.clone();
        merged.append(end.clone());
        assert_eq!(merged, entry);

        let mut end2 = entry.clone();
        let start2 = end2.truncate_keeping_right(i);
        assert_eq!(end2, end);
        assert_eq!(start2, start);
    }
}
