//! End-to-end scenarios over the public face, plus the universal laws every vector has to
//! obey regardless of its current representation.

use pvec::fuse::map_filter_reduce;
use pvec::{ReprTag, Vector, VectorError};

#[test]
fn tail_fast_path() {
    let v = Vector::from_slice(&[1, 2, 3]);
    assert_eq!(v.append(4).to_vec(), vec![1, 2, 3, 4]);
    assert_eq!(v.prepend(0).to_vec(), vec![0, 1, 2, 3]);
}

#[test]
fn crossing_the_tail() {
    let v: Vector<usize> = (0..=32).collect();
    assert_eq!(v.len(), 33);
    assert_eq!(v.get(0), Some(&0));
    assert_eq!(v.get(31), Some(&31));
    assert_eq!(v.get(32), Some(&32));

    let w = v.append(33);
    assert_eq!(w.get(33), Some(&33));
    assert_eq!(w.len(), 34);
}

#[test]
fn height_growth() {
    let v: Vector<i64> = (0..1024).collect();
    assert_eq!(v.len(), 1024);
    assert_eq!(v.repr_tag(), ReprTag::Vector);
    assert_eq!(v.get(0), Some(&0));
    assert_eq!(v.get(1023), Some(&1023));

    let w = v.set(500, -1).unwrap();
    assert_eq!(w.get(500), Some(&-1));
    assert_eq!(w.get(499), Some(&499));
}

#[test]
fn insert_remove_inverse() {
    let v = Vector::from_slice(&[1, 2, 3, 4, 5]);
    assert_eq!(
        v.insert(2, 99).unwrap().remove(2).unwrap().to_vec(),
        vec![1, 2, 3, 4, 5]
    );
}

#[test]
fn fused_map_filter_reduce() {
    let v = Vector::from_slice(&[1, 2, 3, 4, 5]);
    let got = map_filter_reduce(&v, |x| x * 2, |y| *y > 5, |a, y| a + *y, 0);
    assert_eq!(got, 24);
}

#[test]
fn transient_batch_append() {
    let mut t = Vector::new().transient();
    for i in 0..100 {
        t.append(i).unwrap();
    }
    let v = t.persistent().unwrap();
    assert_eq!(v.to_vec(), (0..100).collect::<Vec<_>>());

    assert_eq!(t.append(100), Err(VectorError::TransientConsumed));
    assert_eq!(t.set(0, 0), Err(VectorError::TransientConsumed));
    assert!(matches!(t.persistent(), Err(VectorError::TransientConsumed)));
}

// Universal laws, exercised at sizes that land in each representation.

const LAW_SIZES: &[usize] = &[0, 1, 7, 30, 31, 32, 33, 100, 1023, 1024, 1500];

fn build(n: usize) -> Vector<usize> {
    (0..n).collect()
}

#[test]
fn size_consistency() {
    for &n in LAW_SIZES {
        let v = build(n);
        assert_eq!(v.len(), v.to_vec().len());
        v.dbg_check();
    }
}

#[test]
fn indexed_read_write_law() {
    for &n in LAW_SIZES {
        if n == 0 {
            continue;
        }
        let v = build(n);
        for i in [0, n / 2, n - 1] {
            let w = v.set(i, 424242).unwrap();
            assert_eq!(w.get(i), Some(&424242));
            for j in [0, n / 3, n - 1] {
                if j != i {
                    assert_eq!(w.get(j), v.get(j));
                }
            }
        }
    }
}

#[test]
fn append_prepend_laws() {
    for &n in LAW_SIZES {
        let v = build(n);
        let a = v.append(777);
        assert_eq!(a.last(), Some(&777));
        assert_eq!(a.len(), n + 1);
        let p = v.prepend(888);
        assert_eq!(p.first(), Some(&888));
        assert_eq!(p.len(), n + 1);
    }
}

#[test]
fn insert_remove_inverse_law() {
    for &n in LAW_SIZES {
        let v = build(n);
        for i in [0, n / 2, n] {
            let round = v.insert(i, 31337).unwrap().remove(i).unwrap();
            assert_eq!(round.to_vec(), v.to_vec(), "n={} i={}", n, i);
        }
    }
}

#[test]
fn round_trip_law() {
    for &n in LAW_SIZES {
        let v = build(n);
        let rebuilt = Vector::from_slice(&v.to_vec());
        assert_eq!(rebuilt.to_vec(), v.to_vec());
        assert_eq!(rebuilt.repr_tag(), v.repr_tag());
    }
}

#[test]
fn transient_equivalence_law() {
    for &n in LAW_SIZES {
        let mut persistent = Vector::new();
        let mut t = Vector::new().transient();
        for i in 0..n {
            persistent = persistent.append(i);
            t.append(i).unwrap();
        }
        if n > 0 {
            persistent = persistent.set(n / 2, 0).unwrap();
            t.set(n / 2, 0).unwrap();
        }
        let built = t.persistent().unwrap();
        assert_eq!(built.to_vec(), persistent.to_vec());
        assert_eq!(built.repr_tag(), persistent.repr_tag());
        built.dbg_check();
    }
}

#[test]
fn sharing_is_unobservable() {
    for &n in LAW_SIZES {
        if n == 0 {
            continue;
        }
        let v = build(n);
        let before = v.to_vec();

        let _a = v.append(1);
        let _b = v.set(n - 1, 0).unwrap();
        let _c = v.remove(0).unwrap();
        let _d = v.slice(1, -1);
        let _e = v.filter(|x| x % 2 == 0);

        assert_eq!(v.to_vec(), before, "old version changed at n={}", n);
        assert_eq!(v.len(), n);
    }
}

#[test]
fn representation_transparency() {
    // The same logical operations on the same logical content must give the same results
    // whichever representation the size puts the vector in.
    for &n in LAW_SIZES {
        if n < 3 {
            continue;
        }
        let v = build(n);
        let model: Vec<usize> = (0..n).collect();

        assert_eq!(v.get(n / 2), Some(&model[n / 2]));
        assert_eq!(v.first(), model.first());
        assert_eq!(v.last(), model.last());
        assert_eq!(v.find_index(|x| *x == n - 1), Some(n - 1));
        assert_eq!(v.reduce(|a, x| a + x, 0), model.iter().sum::<usize>());
        assert_eq!(v.slice(1, -1).to_vec(), model[1..n - 1].to_vec());
        assert_eq!(
            v.map(|x| x * 2).to_vec(),
            model.iter().map(|x| x * 2).collect::<Vec<_>>()
        );
    }
}

#[test]
fn range_error_totality() {
    for &n in LAW_SIZES {
        let v = build(n);
        assert_eq!(v.get(n), None, "get never raises");
        assert_eq!(
            v.set(n, 0),
            Err(VectorError::IndexOutOfRange { index: n, len: n })
        );
        assert_eq!(
            v.insert(n + 1, 0),
            Err(VectorError::IndexOutOfRange { index: n + 1, len: n })
        );
        assert_eq!(
            v.remove(n),
            Err(VectorError::IndexOutOfRange { index: n, len: n })
        );
        assert_eq!(v.to_vec(), (0..n).collect::<Vec<_>>());
    }
}
