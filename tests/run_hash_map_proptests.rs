// Public-surface property tests: RunHashMap against std HashMap as a model.
// The in-crate suite additionally checks the internal ring and contiguity
// invariants; this one only drives the published API.

use proptest::prelude::*;
use run_hashmap::{Position, RunHashMap};
use std::collections::{BTreeMap, HashMap};

#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i64),
    Remove(usize),
    Get(usize),
    GetOrDefault(usize, i64),
    Mutate(usize, i64),
    Iterate,
    Reserve(usize),
    Clear,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=10).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            (idx.clone(), any::<i64>()).prop_map(|(i, v)| Op::Insert(i, v)),
            idx.clone().prop_map(Op::Remove),
            idx.clone().prop_map(Op::Get),
            (idx.clone(), -50..50i64).prop_map(|(i, d)| Op::GetOrDefault(i, d)),
            (idx.clone(), any::<i64>()).prop_map(|(i, d)| Op::Mutate(i, d)),
            Just(Op::Iterate),
            (0usize..50).prop_map(Op::Reserve),
            Just(Op::Clear),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 96, .. ProptestConfig::default() })]
    #[test]
    fn behaves_like_a_first_writer_wins_hashmap((pool, ops) in arb_scenario()) {
        let mut sut: RunHashMap<String, i64> = RunHashMap::new();
        let mut model: HashMap<String, i64> = HashMap::new();
        let mut live: HashMap<String, Position> = HashMap::new();

        for op in ops {
            match op {
                Op::Insert(i, v) => {
                    let k = pool[i].clone();
                    let (pos, inserted) = sut.insert(k.clone(), v);
                    prop_assert_eq!(inserted, !model.contains_key(&k));
                    if inserted {
                        model.insert(k.clone(), v);
                    }
                    live.insert(k, pos);
                }
                Op::Remove(i) => {
                    let k = &pool[i];
                    let got = sut.remove(k.as_str()).map(|(_, v)| v);
                    prop_assert_eq!(got, model.remove(k));
                    live.remove(k);
                }
                Op::Get(i) => {
                    let k = &pool[i];
                    prop_assert_eq!(sut.get(k.as_str()), model.get(k));
                    prop_assert_eq!(sut.contains_key(k.as_str()), model.contains_key(k));
                    if let Some(pos) = sut.find(k.as_str()) {
                        prop_assert_eq!(Some(&pos), live.get(k), "find returns stable positions");
                    }
                }
                Op::GetOrDefault(i, d) => {
                    let k = pool[i].clone();
                    *sut.get_or_default(k.clone()) += d;
                    *model.entry(k.clone()).or_insert(0) += d;
                    let pos = sut.find(&k).expect("present after get_or_default");
                    live.insert(k, pos);
                }
                Op::Mutate(i, d) => {
                    let k = &pool[i];
                    let a = sut.get_mut(k.as_str()).map(|v| { *v = v.wrapping_add(d); *v });
                    let b = model.get_mut(k).map(|v| { *v = v.wrapping_add(d); *v });
                    prop_assert_eq!(a, b);
                }
                Op::Iterate => {
                    let got: BTreeMap<String, i64> =
                        sut.iter().map(|(_, k, v)| (k.clone(), *v)).collect();
                    let want: BTreeMap<String, i64> =
                        model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                    prop_assert_eq!(got, want);
                }
                Op::Reserve(n) => {
                    let before = sut.bucket_count();
                    sut.reserve(n);
                    prop_assert!(sut.bucket_count() >= before);
                }
                Op::Clear => {
                    sut.clear();
                    model.clear();
                    live.clear();
                }
            }

            prop_assert_eq!(sut.len(), model.len());
            prop_assert!(sut.load_factor() <= sut.max_load_factor());
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    #[test]
    fn clone_preserves_every_mapping((pool, ops) in arb_scenario()) {
        let mut m: RunHashMap<String, i64> = RunHashMap::new();
        for op in ops {
            if let Op::Insert(i, v) = op {
                m.insert(pool[i].clone(), v);
            }
        }
        let copy = m.clone();
        prop_assert_eq!(copy.len(), m.len());
        for (_, k, v) in m.iter() {
            prop_assert_eq!(copy.get(k.as_str()), Some(v));
        }
    }
}
