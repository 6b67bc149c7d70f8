#![cfg(test)]

// Property tests for HashMap, checked against std::collections::HashMap.

use crate::map::{Added, HashMap};
use crate::policy::{KeyEq, KeyHash};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::cell::Cell;
use std::collections::{BTreeSet, HashMap as StdHashMap};
use std::fmt;
use std::hash::{BuildHasher, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations shrink towards earlier keys and shorter programs.
#[derive(Clone, Debug)]
enum Op {
    Add(usize, i32),
    AddCloned(usize, i32),
    Emplace(usize, i32),
    Remove(usize),
    Take(usize),
    RemoveAt(usize),
    Find(usize),
    Contains(String),
    Mutate(usize, i32),
    Retain(i32),
    Reserve(usize),
    Clear,
    ClearShrink,
    Iterate,
    Clone,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=24).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Add(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::AddCloned(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Emplace(i, v)),
            2 => idx.clone().prop_map(Op::Remove),
            1 => idx.clone().prop_map(Op::Take),
            1 => idx.clone().prop_map(Op::RemoveAt),
            2 => idx.clone().prop_map(Op::Find),
            1 => prop_oneof![contains_pool, "[a-z]{0,5}"].prop_map(Op::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::Mutate(i, d)),
            1 => (2i32..5).prop_map(Op::Retain),
            1 => (0usize..40).prop_map(Op::Reserve),
            1 => Just(Op::Clear),
            1 => Just(Op::ClearShrink),
            1 => Just(Op::Iterate),
            1 => Just(Op::Clone),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - The first value added for a key is retained; duplicates report
//   `Added::Existing` with the handle `find` returns.
// - `emplace` builds the value exactly once per insertion and never for a
//   duplicate.
// - `find`/`contains_key` parity; handles from `find` resolve to the key.
// - `remove`/`take`/`remove_at` agree with the model.
// - `iter` yields each live entry exactly once.
// - A clone is interchangeable with its source, tombstones included.
// - `len` parity and the load factor hold after every step; capacity only
//   drops on `clear_shrink`.
fn run_state_machine<S>(
    mut sut: HashMap<Key, i32, S>,
    pool: &[String],
    ops: Vec<Op>,
) -> Result<(), TestCaseError>
where
    S: KeyHash<Key> + KeyHash<str> + Clone,
{
    let mut model: StdHashMap<Key, i32> = StdHashMap::new();
    let make_calls = Cell::new(0usize);

    for op in ops {
        let slots_before = sut.max_count();
        let mut may_shrink = false;
        match op {
            Op::Add(i, v) => {
                let k = key_from(pool, i);
                let already = model.contains_key(&k);
                match sut.add(k.clone(), v) {
                    Added::Inserted(h) => {
                        prop_assert!(!already, "add must not insert a duplicate");
                        prop_assert_eq!(h.key(&sut), Some(&k));
                        model.insert(k, v);
                    }
                    Added::Existing(h) => {
                        prop_assert!(already, "existing only when the key is present");
                        prop_assert_eq!(h.value(&sut), model.get(&k));
                    }
                }
            }
            Op::AddCloned(i, v) => {
                let k = key_from(pool, i);
                let already = model.contains_key(&k);
                let added = sut.add_cloned(&k, &v);
                prop_assert_eq!(added.is_inserted(), !already);
                model.entry(k).or_insert(v);
            }
            Op::Emplace(i, v) => {
                let k = key_from(pool, i);
                let already = model.contains_key(&k);
                let before = make_calls.get();
                let added = sut.emplace(k.clone(), || {
                    make_calls.set(make_calls.get() + 1);
                    v
                });
                prop_assert_eq!(added.is_inserted(), !already);
                let expected_calls = if already { before } else { before + 1 };
                prop_assert_eq!(make_calls.get(), expected_calls);
                model.entry(k).or_insert(v);
            }
            Op::Remove(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.remove(&k), model.remove(&k).is_some());
                prop_assert!(sut.find(&k).is_none());
            }
            Op::Take(i) => {
                let k = key_from(pool, i);
                let taken = sut.take(k.0.as_str());
                prop_assert_eq!(taken, model.remove_entry(&k));
            }
            Op::RemoveAt(i) => {
                let k = key_from(pool, i);
                match sut.find(&k) {
                    Some(h) => {
                        let removed = sut.remove_at(h);
                        prop_assert_eq!(removed, model.remove_entry(&k));
                        prop_assert!(h.value(&sut).is_none());
                    }
                    None => prop_assert!(!model.contains_key(&k)),
                }
            }
            Op::Find(i) => {
                let k = key_from(pool, i);
                let found = sut.find(&k);
                prop_assert_eq!(found.is_some(), model.contains_key(&k));
                if let Some(h) = found {
                    prop_assert_eq!(h.key(&sut), Some(&k));
                    prop_assert_eq!(h.value(&sut), model.get(&k));
                }
            }
            Op::Contains(s) => {
                let has = sut.contains_key(s.as_str());
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(has, has_model);
            }
            Op::Mutate(i, d) => {
                let k = key_from(pool, i);
                if let Some(h) = sut.find(&k) {
                    let Some(vr) = h.value_mut(&mut sut) else {
                        return Err(TestCaseError::fail("fresh handle should resolve"));
                    };
                    *vr = vr.saturating_add(d);
                    if let Some(mv) = model.get_mut(&k) {
                        *mv = mv.saturating_add(d);
                    }
                }
            }
            Op::Retain(m) => {
                sut.retain(|_, v| v.rem_euclid(m) != 0);
                model.retain(|_, v| v.rem_euclid(m) != 0);
            }
            Op::Reserve(n) => {
                sut.reserve(n);
                prop_assert!(sut.capacity() - sut.len() >= n);
            }
            Op::Clear => {
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.max_count(), slots_before);
            }
            Op::ClearShrink => {
                sut.clear_shrink();
                model.clear();
                may_shrink = true;
                prop_assert_eq!(sut.max_count(), 0);
            }
            Op::Iterate => {
                let s_keys: BTreeSet<_> = sut.keys().cloned().collect();
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(s_keys, m_keys);
                prop_assert_eq!(sut.iter().count(), model.len());
            }
            Op::Clone => {
                let copy = sut.clone();
                prop_assert_eq!(copy.max_count(), sut.max_count());
                for k in model.keys() {
                    prop_assert!(copy.contains_key(k), "clone lost {:?}", k);
                }
                sut = copy;
            }
        }

        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert!(sut.len() <= sut.capacity());
        prop_assert!(sut.capacity() < sut.max_count() || sut.max_count() == 0);
        if !may_shrink {
            prop_assert!(sut.max_count() >= slots_before);
        }
    }

    for (k, v) in &model {
        prop_assert_eq!(sut.get(k), Some(v));
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_state_machine(HashMap::new(), &pool, ops)?;
    }
}

// Constant hasher: every key lands on the same probe sequence.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Same invariants under worst-case collisions, which stresses tombstone
// reuse and the equality policy.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_state_machine(HashMap::with_hasher(ConstBuildHasher), &pool, ops)?;
    }
}

// Keys compared case-insensitively through a custom policy pair stay
// consistent with a model keyed by the lowercased string.
#[derive(Clone, Default)]
struct Lowercase;
impl KeyHash<String> for Lowercase {
    fn hash_key(&self, key: &String) -> u64 {
        // FNV-1a over the lowercased bytes.
        key.bytes().fold(0xcbf29ce484222325u64, |h, b| {
            (h ^ u64::from(b.to_ascii_lowercase())).wrapping_mul(0x100000001b3)
        })
    }
}
impl KeyEq<String> for Lowercase {
    fn key_eq(&self, a: &String, b: &String) -> bool {
        a.eq_ignore_ascii_case(b)
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_custom_policies_match_lowercased_model(
        ops in proptest::collection::vec(("[a-cA-C]{1,3}", any::<u8>(), any::<bool>()), 1..100)
    ) {
        let mut sut: HashMap<String, u8, Lowercase, Lowercase> =
            HashMap::with_policies(Lowercase, Lowercase);
        let mut model: StdHashMap<String, u8> = StdHashMap::new();
        for (k, v, remove) in ops {
            let lower = k.to_ascii_lowercase();
            if remove {
                prop_assert_eq!(sut.remove(&k), model.remove(&lower).is_some());
            } else {
                let added = sut.add(k, v);
                prop_assert_eq!(added.is_inserted(), !model.contains_key(&lower));
                model.entry(lower).or_insert(v);
            }
            prop_assert_eq!(sut.len(), model.len());
        }
        for (k, v) in &model {
            prop_assert_eq!(sut.get(&k.to_ascii_uppercase()), Some(v));
        }
    }
}
