//! Randomized checks for the trie representation: every operation is mirrored against a
//! plain Vec oracle, and the deep invariant checker runs after each step.

use rand::prelude::*;

use super::TrieVector;

// Values are drawn from a small domain so runs (and therefore run-compressed leaves) occur
// naturally.
fn random_value(rng: &mut SmallRng) -> u32 {
    rng.gen_range(0..10)
}

fn make_random_change(
    vec: TrieVector<u32>,
    oracle: &mut Vec<u32>,
    rng: &mut SmallRng,
) -> TrieVector<u32> {
    let len = vec.len();
    let roll = rng.gen_range(0..100);
    let out = if len == 0 || roll < 40 {
        let v = random_value(rng);
        oracle.push(v);
        vec.append(v)
    } else if roll < 48 {
        let v = random_value(rng);
        oracle.insert(0, v);
        vec.prepend(v)
    } else if roll < 64 {
        let i = rng.gen_range(0..len);
        let v = random_value(rng);
        oracle[i] = v;
        vec.set(i, v).unwrap()
    } else if roll < 80 {
        let i = rng.gen_range(0..=len);
        let v = random_value(rng);
        oracle.insert(i, v);
        vec.insert(i, v).unwrap()
    } else {
        let i = rng.gen_range(0..len);
        oracle.remove(i);
        vec.remove(i).unwrap()
    };
    out.dbg_check();
    out
}

#[test]
fn fuzz_ops_against_vec_oracle() {
    for seed in 0..10 {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut vec = TrieVector::new();
        let mut oracle: Vec<u32> = Vec::new();
        for i in 0..600 {
            vec = make_random_change(vec, &mut oracle, &mut rng);
            assert_eq!(vec.len(), oracle.len());
            if i % 25 == 0 {
                assert_eq!(vec.to_vec(), oracle, "seed {} step {}", seed, i);
            }
        }
        assert_eq!(vec.to_vec(), oracle);
    }
}

#[test]
fn fuzz_old_versions_stay_frozen() {
    let mut rng = SmallRng::seed_from_u64(321);
    let mut vec: TrieVector<u32> = (0..200).map(|_| random_value(&mut rng)).collect();
    let mut oracle = vec.to_vec();

    let mut snapshots: Vec<(TrieVector<u32>, Vec<u32>)> = Vec::new();
    for i in 0..300 {
        if i % 20 == 0 {
            snapshots.push((vec.clone(), oracle.clone()));
        }
        vec = make_random_change(vec, &mut oracle, &mut rng);
    }
    // Nothing any later operation did may be visible through an older version.
    for (old, expected) in snapshots {
        assert_eq!(old.to_vec(), expected);
        old.dbg_check();
    }
}

#[test]
fn fuzz_deep_tries() {
    // Push through several height increases (32, 1024, 32768 boundaries) and spot-check.
    let mut rng = SmallRng::seed_from_u64(99);
    let mut vec = TrieVector::new();
    let mut oracle: Vec<u32> = Vec::new();
    for i in 0..40_000u32 {
        let v = i % 7;
        vec.dbg_check_sometimes(i as usize);
        vec = vec.append(v);
        oracle.push(v);
        if i % 4999 == 0 {
            let probe = rng.gen_range(0..oracle.len());
            assert_eq!(vec.get(probe), Some(&oracle[probe]));
        }
    }
    vec.dbg_check();
    assert_eq!(vec.len(), 40_000);
    assert_eq!(vec.to_vec(), oracle);

    // And shrink back down across the same boundaries.
    for _ in 0..40_000 {
        let expect = oracle.pop();
        assert_eq!(vec.last().cloned(), expect);
        let mut next = vec.clone();
        next.pop_mut();
        vec = next;
    }
    assert!(vec.is_empty());
    vec.dbg_check();
}

#[test]
fn fuzz_slice_concat_roundtrips() {
    let mut rng = SmallRng::seed_from_u64(7);
    let vec: TrieVector<u32> = (0..3000).map(|_| random_value(&mut rng)).collect();
    let oracle = vec.to_vec();

    for _ in 0..200 {
        let a = rng.gen_range(0..=oracle.len());
        let b = rng.gen_range(0..=oracle.len());
        let (lo, hi) = (a.min(b), a.max(b));

        let head = vec.slice(0, lo as isize);
        let mid = vec.slice(lo as isize, hi as isize);
        let tail = vec.slice(hi as isize, oracle.len() as isize);
        head.dbg_check();
        mid.dbg_check();
        tail.dbg_check();
        assert_eq!(mid.to_vec(), oracle[lo..hi].to_vec());

        let rejoined = head.concat(&mid).concat(&tail);
        rejoined.dbg_check();
        assert_eq!(rejoined.to_vec(), oracle);
    }
}

#[test]
fn fuzz_transient_equivalence() {
    // Property: building through a transient gives the same sequence as applying the same
    // operations persistently.
    for seed in 0..5 {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut persistent = TrieVector::new();
        let mut transient = TrieVector::new().transient();

        for _ in 0..1500 {
            if persistent.is_empty() || rng.gen_bool(0.8) {
                let v = random_value(&mut rng);
                persistent = persistent.append(v);
                transient.append(v).unwrap();
            } else {
                let i = rng.gen_range(0..persistent.len());
                let v = random_value(&mut rng);
                persistent = persistent.set(i, v).unwrap();
                transient.set(i, v).unwrap();
            }
        }
        let built = transient.persistent().unwrap();
        built.dbg_check();
        assert_eq!(built, persistent, "seed {}", seed);
    }
}

impl TrieVector<u32> {
    // Full dbg_check is O(n); in long fuzz loops run it on a sparse schedule.
    fn dbg_check_sometimes(&self, step: usize) {
        if step % 512 == 0 {
            self.dbg_check();
        }
    }
}
