use common::{init_logger, AggSum};
use dynamic_connectivity::sequence::{Aggregation, AvlSequence, Idx, EMPTY};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scopeguard::{OnUnwind, ScopeGuard};

mod common;

type Seq = AvlSequence<i32>;

fn guard<T: std::fmt::Debug>(l: T) -> ScopeGuard<T, impl FnOnce(T), OnUnwind> {
    scopeguard::guard_on_unwind(l, |l| log::error!("Crash with {l:?}"))
}

fn to_vec<Ag: Aggregation<i32>>(seq: &AvlSequence<i32, Ag>, u: Idx) -> Vec<i32> {
    seq.iter(u).map(|o| *seq.data(o)).collect()
}

fn to_vec_rev<Ag: Aggregation<i32>>(seq: &AvlSequence<i32, Ag>, u: Idx) -> Vec<i32> {
    seq.riter(u).map(|o| *seq.data(o)).collect()
}

fn range_vec(n1: i32, n2: i32) -> Vec<i32> {
    (n1..n2).collect()
}

/// Chain built with insert_after, values n1..n2.
fn range_a<Ag: Aggregation<i32>>(seq: &mut AvlSequence<i32, Ag>, n1: i32, n2: i32) -> Vec<Idx> {
    let nodes: Vec<Idx> = (n1..n2).map(|v| seq.create(v)).collect();
    for i in 1..nodes.len() {
        seq.insert_after(nodes[i - 1], nodes[i]);
    }
    nodes
}

/// Chain built with insert_before, values n1..n2.
fn range_b<Ag: Aggregation<i32>>(seq: &mut AvlSequence<i32, Ag>, n1: i32, n2: i32) -> Vec<Idx> {
    let nodes: Vec<Idx> = (n1..n2).map(|v| seq.create(v)).collect();
    for i in (1..nodes.len()).rev() {
        seq.insert_before(nodes[i], nodes[i - 1]);
    }
    nodes
}

/// Chain shuffled by random remove/reinsert pairs, then relabeled in order so
/// the sequence reads n1..n2 while the tree shape is arbitrary.
fn range_r(seq: &mut Seq, rng: &mut StdRng, n1: i32, n2: i32) -> Vec<Idx> {
    let nodes = range_a(seq, n1, n2);
    let n = nodes.len();
    if n > 1 {
        for _ in 0..n {
            let r1 = rng.gen_range(0..n);
            seq.remove(nodes[r1]);
            let mut r2 = rng.gen_range(0..n);
            while r2 == r1 {
                r2 = rng.gen_range(0..n);
            }
            seq.insert_after(nodes[r2], nodes[r1]);
        }
    }
    let in_order: Vec<Idx> = seq.iter(nodes[0]).collect();
    for (i, &o) in in_order.iter().enumerate() {
        seq.mutate_data(o, |v| *v = n1 + i as i32);
    }
    nodes
}

#[test]
fn test_single_node() {
    init_logger();
    let mut seq = Seq::new();
    let u = seq.create(10);
    assert!(seq.is_singleton(u));
    assert_eq!(seq.size(u), 1);
    assert_eq!(seq.find_root(u), u);
    assert_eq!(seq.find_head(u), u);
    assert_eq!(seq.find_tail(u), u);
    assert_eq!(seq.next(u), EMPTY);
    assert_eq!(seq.previous(u), EMPTY);
    assert_eq!(to_vec(&seq, u), vec![10]);
    assert_eq!(to_vec_rev(&seq, u), vec![10]);
    assert!(seq.check_sanity(u));
}

#[test]
fn test_two_nodes() {
    for before in [false, true] {
        let mut seq = Seq::new();
        let n1 = seq.create(1);
        let n2 = seq.create(2);
        if before {
            seq.insert_before(n2, n1);
        } else {
            seq.insert_after(n1, n2);
        }
        assert!(seq.check_sanity(n1));
        assert_eq!(seq.find_root(n1), seq.find_root(n2));
        assert_eq!(seq.size(n1), 2);
        assert_eq!(seq.find_head(seq.find_root(n1)), n1);
        assert_eq!(seq.find_tail(seq.find_root(n1)), n2);
        assert_eq!(seq.next(n1), n2);
        assert_eq!(seq.previous(n2), n1);
        assert_eq!(seq.previous(n1), EMPTY);
        assert_eq!(seq.next(n2), EMPTY);
        assert_eq!(to_vec(&seq, n1), vec![1, 2]);
    }
}

#[test]
fn test_many_nodes() {
    init_logger();
    for i in 3..=64 {
        for variant in [range_a::<()>, range_b::<()>] {
            let mut seq = Seq::new();
            let nodes = variant(&mut seq, 0, i);
            assert!(seq.check_sanity(nodes[0]));
            assert_eq!(to_vec(&seq, nodes[0]), range_vec(0, i));
            let root = seq.find_root(nodes[0]);
            for &u in &nodes {
                assert_eq!(seq.find_root(u), root);
                assert_eq!(seq.find_head(root), nodes[0]);
                assert_eq!(seq.find_tail(root), *nodes.last().unwrap());
                assert_eq!(seq.size(u), i as usize);
            }
        }
    }
}

#[test]
fn test_reverse_iteration() {
    for i in 3..=64 {
        let mut seq = Seq::new();
        let nodes = range_a(&mut seq, 0, i);
        let mut expected = range_vec(0, i);
        expected.reverse();
        assert_eq!(to_vec_rev(&seq, nodes[0]), expected);
    }
}

#[test]
fn test_iter_from_both_ends() {
    let mut seq = Seq::new();
    let nodes = range_a(&mut seq, 0, 5);
    let mut it = seq.iter(nodes[0]);
    assert_eq!(it.next(), Some(nodes[0]));
    assert_eq!(it.next_back(), Some(nodes[4]));
    assert_eq!(it.next(), Some(nodes[1]));
    assert_eq!(it.next_back(), Some(nodes[3]));
    assert_eq!(it.next(), Some(nodes[2]));
    assert_eq!(it.next(), None);
    assert_eq!(it.next_back(), None);
}

#[test]
fn test_remove() {
    init_logger();
    let mut rng = StdRng::seed_from_u64(7211);
    for n in 2..=48 {
        for z in 0..4 {
            let mut seq = Seq::new();
            let nodes = match z {
                0 => range_a(&mut seq, 0, n),
                1 => range_b(&mut seq, 0, n),
                _ => range_r(&mut seq, &mut rng, 0, n),
            };
            for i in 0..n as usize {
                let value = *seq.data(nodes[i]);
                seq.remove(nodes[i]);
                assert!(seq.is_singleton(nodes[i]));
                let mut expected = range_vec(0, n);
                expected.retain(|&v| v != value);
                let probe = nodes[if i == 0 { 1 } else { 0 }];
                assert!(seq.check_sanity(probe));
                assert_eq!(to_vec(&seq, probe), expected);
                // Undo and verify the round trip.
                if value == n - 1 {
                    let pred = nodes
                        .iter()
                        .copied()
                        .find(|&o| *seq.data(o) == value - 1)
                        .unwrap();
                    seq.insert_after(pred, nodes[i]);
                } else {
                    let succ = nodes
                        .iter()
                        .copied()
                        .find(|&o| *seq.data(o) == value + 1)
                        .unwrap();
                    seq.insert_before(succ, nodes[i]);
                }
                assert_eq!(to_vec(&seq, probe), range_vec(0, n));
            }
        }
    }
}

#[test]
fn test_random_insert_remove() {
    init_logger();
    const N: usize = 128;
    let mut rng = StdRng::seed_from_u64(48151623);
    for _ in 0..100 {
        let mut seq = guard(Seq::new());
        let seq = &mut *seq;
        let nodes = range_a(seq, 0, N as i32);
        let mut vec = range_vec(0, N as i32);
        let mut removed: Vec<Idx> = Vec::new();
        let k = rng.gen_range(1..N);
        for _ in 0..k {
            let r = rng.gen_range(0..N);
            let u = nodes[r];
            if !removed.contains(&u) && removed.len() < N - 1 {
                let value = *seq.data(u);
                seq.remove(u);
                vec.retain(|&v| v != value);
                removed.push(u);
            }
        }
        let probe = *nodes.iter().find(|u| !removed.contains(u)).unwrap();
        assert!(seq.check_sanity(probe));
        assert_eq!(to_vec(&seq, probe), vec);
        while let Some(u) = removed.pop() {
            let at = rng.gen_range(0..vec.len());
            let target = nodes
                .iter()
                .copied()
                .find(|&o| !removed.contains(&o) && o != u && *seq.data(o) == vec[at])
                .unwrap();
            let value = *seq.data(u);
            seq.insert_before(target, u);
            vec.insert(at, value);
            assert!(seq.check_sanity(probe));
            assert_eq!(to_vec(&seq, probe), vec);
        }
    }
}

#[test]
fn test_join() {
    init_logger();
    let mut rng = StdRng::seed_from_u64(9182);
    for i in 1..32 {
        for j in 1..32 {
            for z in 0..3 {
                let mut seq = Seq::new();
                let (left, right) = match z {
                    0 => (range_a(&mut seq, 0, i), range_a(&mut seq, i, i + j)),
                    1 => (range_b(&mut seq, 0, i), range_b(&mut seq, i, i + j)),
                    _ => (
                        range_r(&mut seq, &mut rng, 0, i),
                        range_r(&mut seq, &mut rng, i, i + j),
                    ),
                };
                seq.join(left[0], right[0]);
                assert!(seq.check_sanity(left[0]));
                assert_eq!(to_vec(&seq, left[0]), range_vec(0, i + j));
                assert!(seq.same_sequence(left[0], right[0]));
            }
        }
    }
}

#[test]
fn test_split() {
    init_logger();
    for i in 2..=32i32 {
        for j in 0..i {
            {
                let mut seq = Seq::new();
                let nodes = range_a(&mut seq, 0, i);
                let at = nodes[j as usize];
                let before = seq.previous(at);
                seq.split_before(at);
                if before != EMPTY {
                    assert!(seq.check_sanity(before));
                    assert_eq!(to_vec(&seq, before), range_vec(0, j));
                    assert!(!seq.same_sequence(before, at));
                }
                assert!(seq.check_sanity(at));
                assert_eq!(to_vec(&seq, at), range_vec(j, i));
                // Rejoining is the identity.
                if before != EMPTY {
                    seq.join(before, at);
                    assert_eq!(to_vec(&seq, at), range_vec(0, i));
                }
            }
            {
                let mut seq = Seq::new();
                let nodes = range_b(&mut seq, 0, i);
                let at = nodes[j as usize];
                let after = seq.next(at);
                seq.split_after(at);
                assert!(seq.check_sanity(at));
                assert_eq!(to_vec(&seq, at), range_vec(0, j + 1));
                if after != EMPTY {
                    assert!(seq.check_sanity(after));
                    assert_eq!(to_vec(&seq, after), range_vec(j + 1, i));
                    seq.join(at, after);
                    assert_eq!(to_vec(&seq, at), range_vec(0, i));
                }
            }
        }
    }
}

#[test]
fn test_aggregation() {
    init_logger();
    let mut seq: AvlSequence<i32, AggSum> = AvlSequence::new();
    let nodes = range_a(&mut seq, 1, 9);
    let root = seq.find_root(nodes[0]);
    assert_eq!(seq.aggregate(root).0, (1..9i64).sum::<i64>());
    seq.remove(nodes[3]);
    let root = seq.find_root(nodes[0]);
    assert_eq!(seq.aggregate(root).0, (1..9i64).sum::<i64>() - 4);
    seq.insert_after(nodes[7], nodes[3]);
    let root = seq.find_root(nodes[0]);
    assert_eq!(seq.aggregate(root).0, (1..9i64).sum::<i64>());
    seq.mutate_data(nodes[0], |v| *v = 100);
    let root = seq.find_root(nodes[0]);
    assert_eq!(seq.aggregate(root).0, (2..9i64).sum::<i64>() + 100);
    seq.split_after(nodes[4]);
    let left = seq.find_root(nodes[0]);
    assert_eq!(seq.aggregate(left).0, 100 + 2 + 3 + 5);
}
