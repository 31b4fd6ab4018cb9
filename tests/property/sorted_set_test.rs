// tests/property/sorted_set_test.rs

//! Property-based tests for the sorted set
//! Tests the score index against a plain map model after arbitrary updates

use bytes::Bytes;
use carade::core::storage::zset::{ScoreBoundary, SortedSet};
use proptest::prelude::*;
use std::collections::HashMap;

#[derive(Debug, Clone)]
enum Op {
    Add(f64, u8),
    Incr(f64, u8),
    Remove(u8),
    PopMin(usize),
    PopMax(usize),
}

fn score() -> impl Strategy<Value = f64> {
    prop_oneof![
        (-100i32..100).prop_map(f64::from),
        -1.0e6f64..1.0e6,
        Just(0.0),
        Just(-0.0),
        Just(f64::INFINITY),
        Just(f64::NEG_INFINITY),
    ]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (score(), 0u8..32).prop_map(|(s, m)| Op::Add(s, m)),
        2 => (score(), 0u8..32).prop_map(|(s, m)| Op::Incr(s, m)),
        2 => (0u8..32).prop_map(Op::Remove),
        1 => (0usize..4).prop_map(Op::PopMin),
        1 => (0usize..4).prop_map(Op::PopMax),
    ]
}

fn member(m: u8) -> Bytes {
    Bytes::from(format!("m{m:02}"))
}

/// The model's members in the order the sorted set must produce.
fn model_order(model: &HashMap<Bytes, f64>) -> Vec<(Bytes, f64)> {
    let mut entries: Vec<(Bytes, f64)> = model.iter().map(|(m, s)| (m.clone(), *s)).collect();
    entries.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    entries
}

fn apply(zset: &mut SortedSet, model: &mut HashMap<Bytes, f64>, op: Op) {
    match op {
        Op::Add(s, m) => {
            let added = zset.add(s, member(m));
            let was_new = model.insert(member(m), if s == 0.0 { 0.0 } else { s }).is_none();
            assert_eq!(added == 1, was_new);
        }
        Op::Incr(delta, m) => {
            let current = model.get(&member(m)).copied().unwrap_or(0.0);
            let expected = current + delta;
            let result = zset.incr_by(delta, member(m));
            if expected.is_nan() {
                assert_eq!(result, None);
            } else {
                assert_eq!(result, Some(expected));
                model.insert(member(m), if expected == 0.0 { 0.0 } else { expected });
            }
        }
        Op::Remove(m) => {
            assert_eq!(zset.remove(&member(m)), model.remove(&member(m)));
        }
        Op::PopMin(n) => {
            let expected: Vec<_> = model_order(model).into_iter().take(n).collect();
            let popped = zset.pop_min(n);
            assert_eq!(popped.len(), expected.len());
            for (entry, (m, _)) in popped.iter().zip(&expected) {
                assert_eq!(&entry.member, m);
                model.remove(m);
            }
        }
        Op::PopMax(n) => {
            let expected: Vec<_> = model_order(model).into_iter().rev().take(n).collect();
            let popped = zset.pop_max(n);
            assert_eq!(popped.len(), expected.len());
            for (entry, (m, _)) in popped.iter().zip(&expected) {
                assert_eq!(&entry.member, m);
                model.remove(m);
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 100,
        max_shrink_iters: 1000,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_sorted_set_matches_model(ops in prop::collection::vec(op(), 1..200)) {
        let mut zset = SortedSet::new();
        let mut model = HashMap::new();
        for op in ops {
            apply(&mut zset, &mut model, op);
        }

        let expected = model_order(&model);
        prop_assert_eq!(zset.len(), expected.len());
        let actual: Vec<(Bytes, f64)> =
            zset.iter().map(|e| (e.member.clone(), e.score)).collect();
        prop_assert_eq!(&actual, &expected);

        for (rank, (m, s)) in expected.iter().enumerate() {
            prop_assert_eq!(zset.rank(m), Some(rank));
            prop_assert_eq!(zset.score(m), Some(*s));
        }
    }

    #[test]
    fn test_range_by_score_matches_filter(
        entries in prop::collection::vec((score(), 0u8..32), 0..64),
        lo in -150i32..150,
        hi in -150i32..150,
        lo_open in any::<bool>(),
        hi_open in any::<bool>()
    ) {
        let mut zset = SortedSet::new();
        let mut model = HashMap::new();
        for (s, m) in entries {
            apply(&mut zset, &mut model, Op::Add(s, m));
        }
        let (lo, hi) = (f64::from(lo), f64::from(hi));
        let min = if lo_open { ScoreBoundary::Exclusive(lo) } else { ScoreBoundary::Inclusive(lo) };
        let max = if hi_open { ScoreBoundary::Exclusive(hi) } else { ScoreBoundary::Inclusive(hi) };

        let expected: Vec<Bytes> = model_order(&model)
            .into_iter()
            .filter(|(_, s)| if lo_open { *s > lo } else { *s >= lo })
            .filter(|(_, s)| if hi_open { *s < hi } else { *s <= hi })
            .map(|(m, _)| m)
            .collect();
        let actual: Vec<Bytes> = zset
            .range_by_score(min, max)
            .into_iter()
            .map(|e| e.member)
            .collect();
        prop_assert_eq!(actual, expected);
    }
}
