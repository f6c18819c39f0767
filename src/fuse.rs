//! Operation fusion: free-standing single-pass combinators over [`Vector`]s.
//!
//! Each kernel produces exactly the result of the equivalent operation composition — the
//! equivalences are spelled out per function — but visits every element once and never
//! allocates the intermediate vectors the composition would. Results come out in whatever
//! representation their size calls for.

use crate::trie::clamp_range;
use crate::{Elem, Vector, VectorError};

/// `v.map(f).filter(p)` in one pass.
pub fn map_filter<T: Elem, U: Elem>(
    v: &Vector<T>,
    mut f: impl FnMut(&T) -> U,
    mut predicate: impl FnMut(&U) -> bool,
) -> Vector<U> {
    v.iter()
        .map(|x| f(x))
        .filter(|y| predicate(y))
        .collect()
}

/// `v.filter(p).map(f)` in one pass.
pub fn filter_map<T: Elem, U: Elem>(
    v: &Vector<T>,
    predicate: impl FnMut(&T) -> bool,
    f: impl FnMut(&T) -> U,
) -> Vector<U> {
    v.filter_map(predicate, f)
}

/// `v.map(f).filter(p).reduce(g, init)` in one pass.
pub fn map_filter_reduce<T: Elem, U, A>(
    v: &Vector<T>,
    f: impl FnMut(&T) -> U,
    predicate: impl FnMut(&U) -> bool,
    g: impl FnMut(A, &U) -> A,
    init: A,
) -> A {
    v.map_filter_reduce(f, predicate, g, init)
}

/// `v.map(f).reduce(g, init)` in one pass.
pub fn map_reduce<T: Elem, U, A>(
    v: &Vector<T>,
    f: impl FnMut(&T) -> U,
    g: impl FnMut(A, &U) -> A,
    init: A,
) -> A {
    v.map_reduce(f, g, init)
}

/// `v.filter(p).reduce(g, init)` in one pass.
pub fn filter_reduce<T: Elem, A>(
    v: &Vector<T>,
    mut predicate: impl FnMut(&T) -> bool,
    mut g: impl FnMut(A, &T) -> A,
    init: A,
) -> A {
    let mut acc = init;
    for x in v.iter() {
        if predicate(x) {
            acc = g(acc, x);
        }
    }
    acc
}

/// `v.map(f).slice(start, end)`. Map preserves size, so only the sliced range is visited —
/// the function never runs on elements the slice would discard.
pub fn map_slice<T: Elem, U: Elem>(
    v: &Vector<T>,
    mut f: impl FnMut(&T) -> U,
    start: isize,
    end: isize,
) -> Vector<U> {
    let (a, b) = clamp_range(v.len(), start, end);
    if a >= b {
        return Vector::new();
    }
    v.iter_range(a, b).map(|x| f(x)).collect()
}

/// `v.slice(start, end).map(f)`. Identical element visits to [`map_slice`]; both exist so
/// either composition order can be fused without rewriting call sites.
pub fn slice_map<T: Elem, U: Elem>(
    v: &Vector<T>,
    start: isize,
    end: isize,
    f: impl FnMut(&T) -> U,
) -> Vector<U> {
    map_slice(v, f, start, end)
}

/// `v.filter(p).slice(start, end)`. The slice indexes the filtered sequence, so matches are
/// buffered once; still a single visit per source element.
pub fn filter_slice<T: Elem>(
    v: &Vector<T>,
    mut predicate: impl FnMut(&T) -> bool,
    start: isize,
    end: isize,
) -> Vector<T> {
    let matches: Vec<&T> = v.iter().filter(|x| predicate(x)).collect();
    let (a, b) = clamp_range(matches.len(), start, end);
    if a >= b {
        return Vector::new();
    }
    matches[a..b].iter().map(|x| (*x).clone()).collect()
}

/// `v.slice(start, end).filter(p)`. Only the sliced range is visited.
pub fn slice_filter<T: Elem>(
    v: &Vector<T>,
    start: isize,
    end: isize,
    mut predicate: impl FnMut(&T) -> bool,
) -> Vector<T> {
    let (a, b) = clamp_range(v.len(), start, end);
    if a >= b {
        return Vector::new();
    }
    v.iter_range(a, b).filter(|x| predicate(x)).cloned().collect()
}

/// `a.concat(b).map(f)` without building the concatenation.
pub fn concat_map<T: Elem, U: Elem>(
    a: &Vector<T>,
    b: &Vector<T>,
    mut f: impl FnMut(&T) -> U,
) -> Vector<U> {
    a.iter().chain(b.iter()).map(|x| f(x)).collect()
}

/// `a.map(f).concat(b)` without building the mapped intermediate.
pub fn map_concat<T: Elem, U: Elem>(
    a: &Vector<T>,
    mut f: impl FnMut(&T) -> U,
    b: &Vector<U>,
) -> Vector<U> {
    a.iter().map(|x| f(x)).chain(b.iter().cloned()).collect()
}

/// Batch point writes; equivalent to applying `set` per pair in ascending index order.
pub fn batch_update<T: Elem>(
    v: &Vector<T>,
    pairs: &[(usize, T)],
) -> Result<Vector<T>, VectorError> {
    v.update_many(pairs)
}

/// Batch inserts; indexes name positions in the input vector.
pub fn batch_insert<T: Elem>(
    v: &Vector<T>,
    pairs: &[(usize, T)],
) -> Result<Vector<T>, VectorError> {
    v.insert_many(pairs)
}

/// Batch removals; duplicate indexes collapse.
pub fn batch_remove<T: Elem>(
    v: &Vector<T>,
    indices: &[usize],
) -> Result<Vector<T>, VectorError> {
    v.remove_many(indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vector<i64> {
        Vector::from_slice(&[1, 2, 3, 4, 5])
    }

    #[test]
    fn fused_map_filter_reduce_matches_composition() {
        let v = sample();
        let fused = map_filter_reduce(&v, |x| x * 2, |y| *y > 5, |a, y| a + *y, 0);
        let composed = v.map(|x| x * 2).filter(|y| *y > 5).reduce(|a, y| a + *y, 0);
        assert_eq!(fused, 24);
        assert_eq!(fused, composed);
    }

    #[test]
    fn kernels_match_compositions_at_scale() {
        let v: Vector<i64> = (0..1500).collect();

        assert_eq!(
            map_filter(&v, |x| x + 1, |y| y % 3 == 0),
            v.map(|x| x + 1).filter(|y| y % 3 == 0)
        );
        assert_eq!(
            filter_map(&v, |x| x % 2 == 0, |x| x * 10),
            v.filter(|x| x % 2 == 0).map(|x| x * 10)
        );
        assert_eq!(
            map_reduce(&v, |x| x * 3, |a, y| a + *y, 0),
            v.map(|x| x * 3).reduce(|a, y| a + *y, 0)
        );
        assert_eq!(
            filter_reduce(&v, |x| x % 7 == 0, |a, x| a + *x, 0),
            v.filter(|x| x % 7 == 0).reduce(|a, x| a + *x, 0)
        );
    }

    #[test]
    fn slice_kernels_match_compositions() {
        let v: Vector<i64> = (0..200).collect();
        for (a, b) in [(0, 200), (10, 50), (-40, -1), (150, 9999), (5, 5)] {
            assert_eq!(map_slice(&v, |x| x * 2, a, b), v.map(|x| x * 2).slice(a, b));
            assert_eq!(slice_map(&v, a, b, |x| x * 2), v.slice(a, b).map(|x| x * 2));
            assert_eq!(
                filter_slice(&v, |x| x % 2 == 0, a, b),
                v.filter(|x| x % 2 == 0).slice(a, b)
            );
            assert_eq!(
                slice_filter(&v, a, b, |x| x % 2 == 0),
                v.slice(a, b).filter(|x| x % 2 == 0)
            );
        }
    }

    #[test]
    fn concat_kernels_match_compositions() {
        let a: Vector<i64> = (0..40).collect();
        let b: Vector<i64> = (40..90).collect();
        assert_eq!(concat_map(&a, &b, |x| x - 1), a.concat(&b).map(|x| x - 1));
        let mapped_b: Vector<i64> = b.map(|x| x + 100);
        assert_eq!(
            map_concat(&a, |x| x + 100, &mapped_b),
            a.map(|x| x + 100).concat(&mapped_b)
        );
    }

    #[test]
    fn batch_kernels_delegate_with_validation() {
        let v = sample();
        assert_eq!(batch_update(&v, &[(0, 9)]).unwrap().to_vec(), vec![9, 2, 3, 4, 5]);
        assert_eq!(batch_insert(&v, &[(5, 6)]).unwrap().to_vec(), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(batch_remove(&v, &[0, 4]).unwrap().to_vec(), vec![2, 3, 4]);
        assert!(batch_update(&v, &[(9, 0)]).is_err());
        assert_eq!(v.to_vec(), vec![1, 2, 3, 4, 5], "inputs stay unchanged on error");
    }
}
