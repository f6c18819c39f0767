use crate::{HasLength, MergableSpan, SplitableSpan};

/// A run of a single value repeated `len` times. This is the building block for run-compressed
/// leaf storage: a buffer of values collapses to a short list of RleRun entries.
#[derive(Copy, Clone, Hash, Debug, PartialEq, Eq, Default)]
pub struct RleRun<T: Clone + PartialEq> {
    pub val: T,
    pub len: usize,
}

impl<T: Clone + PartialEq> RleRun<T> {
    pub fn new(val: T, len: usize) -> Self {
        Self { val, len }
    }

    pub fn single(val: T) -> Self {
        Self { val, len: 1 }
    }
}

impl<T: Clone + PartialEq> HasLength for RleRun<T> {
    fn len(&self) -> usize { self.len }
}

impl<T: Clone + PartialEq> SplitableSpan for RleRun<T> {
    fn truncate(&mut self, at: usize) -> Self {
        let remainder = self.len - at;
        self.len = at;
        Self { val: self.val.clone(), len: remainder }
    }
}

impl<T: Clone + PartialEq> MergableSpan for RleRun<T> {
    fn can_append(&self, other: &Self) -> bool {
        self.val == other.val || self.len == 0
    }

    fn append(&mut self, other: Self) {
        self.len += other.len;
        self.val = other.val; // Needed when self came from default(), which has a length of 0.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_splitable_methods_valid;

    #[test]
    fn run_is_splitable() {
        test_splitable_methods_valid(RleRun::new('x', 5));
    }

    #[test]
    fn runs_merge() {
        let mut a = RleRun::new(10, 3);
        let b = RleRun::new(10, 2);
        assert!(a.can_append(&b));
        a.append(b);
        assert_eq!(a, RleRun::new(10, 5));

        assert!(!a.can_append(&RleRun::new(11, 1)));
    }
}
