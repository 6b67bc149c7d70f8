use openhash::{CountingAllocator, DefaultHashBuilder, HashSet, StdEq};
use std::collections::BTreeSet;

#[test]
fn new_set_is_empty() {
    let s = HashSet::<i32>::new();
    assert_eq!(s.count(), 0);
    assert_eq!(s.max_count(), 0);
    assert!(s.iter().next().is_none());
}

#[test]
fn from_array_with_duplicates() {
    let s: HashSet<i32> = HashSet::from([1, 1, 2, 3]);
    assert_eq!(s.count(), 3);
    assert!(s.contains(&1) && s.contains(&2) && s.contains(&3));
}

#[test]
fn borrowed_lookups() {
    let mut s: HashSet<String> = ["a", "b", "c"].iter().map(|x| x.to_string()).collect();
    assert!(s.contains("a"));
    assert_eq!(s.get("b").map(String::as_str), Some("b"));
    assert_eq!(s.take("c"), Some("c".to_string()));
    assert!(!s.remove("c"));
    let h = s.find("a");
    assert!(h.is_some());
    assert_eq!(h.and_then(|h| s.remove_at(h)), Some("a".to_string()));
    assert_eq!(s.len(), 1);
}

/// Invariant: interleaved adds and removes keep the set consistent with a
/// model, including reuse of tombstones.
#[test]
fn churn_matches_model() {
    let mut s: HashSet<u32> = HashSet::with_capacity(64);
    let mut model = BTreeSet::new();
    let slots = s.max_count();
    for round in 0..50u32 {
        for i in 0..40 {
            let v = (round * 7 + i) % 60;
            assert_eq!(s.add(v).is_inserted(), model.insert(v));
        }
        for i in 0..40 {
            let v = (round * 11 + i) % 60;
            assert_eq!(s.remove(&v), model.remove(&v));
        }
        let got: BTreeSet<u32> = s.iter().copied().collect();
        assert_eq!(got, model);
    }
    assert_eq!(s.max_count(), slots, "a bounded working set never grows");
}

#[test]
fn set_with_counting_allocator() {
    let alloc = CountingAllocator::new();
    {
        let mut s: HashSet<u64, DefaultHashBuilder, StdEq, _> = HashSet::new_in(&alloc);
        s.extend(0..1000);
        assert_eq!(s.len(), 1000);
        let c = s.clone();
        assert!(c.is_subset(&s) && s.is_subset(&c));
    }
    assert_eq!(alloc.live_allocations(), 0);
    assert!(alloc.allocation_count() > 0);
}

#[test]
fn into_iter_and_drain() {
    let mut s: HashSet<i64> = (-5..5).collect();
    let drained: BTreeSet<i64> = s.drain().collect();
    assert_eq!(drained, (-5..5).collect::<BTreeSet<i64>>());
    assert!(s.is_empty());
    s.extend([1, 2]);
    let owned: BTreeSet<i64> = s.into_iter().collect();
    assert_eq!(owned, BTreeSet::from([1, 2]));
}
