use openhash::{
    Added, AsciiCaseInsensitive, CountingAllocator, HashMap, HashSet, StdEq, TryReserveError,
};
use std::collections::BTreeMap;
use std::hash::{BuildHasher, Hasher};

// Every key hashes to zero, so all keys share one probe sequence.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> ConstHasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

#[test]
fn add_find_remove_round_trip() {
    let mut m: HashMap<String, u32> = HashMap::new();
    let h = m.add("alpha".to_string(), 1).handle();
    assert_eq!(m.find("alpha"), Some(h));
    assert_eq!(m.get_key_value("alpha"), Some((&"alpha".to_string(), &1)));
    assert!(m.remove("alpha"));
    assert!(m.find("alpha").is_none());
    assert!(m.is_empty());
}

/// Invariant: N unique adds are all counted, iterated once and findable.
#[test]
fn many_unique_adds() {
    let mut m: HashMap<u64, u64> = HashMap::new();
    for i in 0..10_000u64 {
        assert!(m.add(i, i * i).is_inserted());
    }
    assert_eq!(m.count(), 10_000);
    assert_eq!(m.iter().count(), 10_000);
    for i in 0..10_000u64 {
        assert_eq!(m[&i], i * i);
    }
    assert!(m.capacity() >= 10_000);
}

/// Invariant: the first occurrence of a key wins, also through `From`,
/// `FromIterator` and `Extend`.
#[test]
fn first_occurrence_wins() {
    let m = HashMap::<&str, i32>::from([("a", 1), ("a", 2), ("b", 3)]);
    assert_eq!(m.count(), 2);
    assert_eq!(m["a"], 1);

    let collected: HashMap<u8, char> = [(1, 'x'), (1, 'y')].into_iter().collect();
    assert_eq!(collected[&1u8], 'x');

    let mut extended = collected;
    extended.extend([(1, 'z'), (2, 'w')]);
    assert_eq!(extended[&1u8], 'x');
    assert_eq!(extended[&2u8], 'w');
}

#[test]
fn added_reports_handles() {
    let mut m: HashMap<i32, i32> = HashMap::new();
    let first = m.add(5, 50);
    assert!(matches!(first, Added::Inserted(_)));
    let again = m.add(5, 51);
    assert_eq!(again, Added::Existing(first.handle()));
    assert_eq!(first.handle().value(&m), Some(&50));
}

#[test]
fn get_mut_and_values_mut() {
    let mut m: HashMap<&str, Vec<i32>> = HashMap::new();
    m.add("v", Vec::new());
    if let Some(v) = m.get_mut("v") {
        v.push(1);
    }
    for v in m.values_mut() {
        v.push(2);
    }
    for (_, v) in &mut m {
        v.push(3);
    }
    assert_eq!(m["v"], vec![1, 2, 3]);
}

#[test]
fn into_iter_yields_all_entries() {
    let m: HashMap<u32, u32> = (0..100).map(|i| (i, i + 1)).collect();
    let sorted: BTreeMap<u32, u32> = m.into_iter().collect();
    assert_eq!(sorted.len(), 100);
    assert!(sorted.iter().all(|(k, v)| *v == k + 1));
}

/// Invariant: iteration can be restarted and yields the same entries.
#[test]
fn iteration_is_restartable() {
    let m: HashMap<u16, u16> = (0..64).map(|i| (i, i)).collect();
    let a: Vec<_> = m.iter().collect();
    let b: Vec<_> = m.iter().collect();
    assert_eq!(a, b);
    let it = m.keys();
    assert_eq!(it.len(), 64);
}

#[test]
fn try_reserve_reports_overflow_and_exhaustion() {
    let mut m: HashMap<u64, u64> = HashMap::new();
    assert_eq!(m.try_reserve(usize::MAX), Err(TryReserveError::CapacityOverflow));

    let alloc = CountingAllocator::with_byte_limit(4096);
    let mut small: HashMap<u64, u64, _, _, &CountingAllocator> =
        HashMap::with_policies_in(openhash::DefaultHashBuilder::default(), StdEq, &alloc);
    assert!(small.try_reserve(10).is_ok());
    match small.try_reserve(100_000) {
        Err(TryReserveError::AllocError { layout }) => assert!(layout.size() > 4096),
        other => panic!("expected allocation failure, got {other:?}"),
    }
    // The failed reservation left the table usable.
    small.add(1, 1);
    assert_eq!(small.get(&1u64), Some(&1));
}

#[test]
fn case_insensitive_map() {
    let mut headers: HashMap<String, &str, AsciiCaseInsensitive, AsciiCaseInsensitive> =
        HashMap::with_policies(AsciiCaseInsensitive::default(), AsciiCaseInsensitive::default());
    headers.add("Accept".to_string(), "*/*");
    headers.add("ACCEPT".to_string(), "text/html");
    assert_eq!(headers.len(), 1);
    assert_eq!(headers.get("accept"), Some(&"*/*"));
    assert_eq!(headers.get_key_value("aCcEpT").map(|(k, _)| k.as_str()), Some("Accept"));
}

#[test]
fn clear_keeps_and_clear_shrink_releases() {
    let alloc = CountingAllocator::new();
    let mut m: HashMap<u32, u32, openhash::DefaultHashBuilder, openhash::StdEq, _> =
        HashMap::with_capacity_in(100, &alloc);
    let slots = m.max_count();
    assert!(slots >= 128);
    for i in 0..100 {
        m.add(i, i);
    }
    m.clear();
    assert_eq!(m.max_count(), slots);
    assert_eq!(alloc.live_allocations(), 1);
    m.clear_shrink();
    assert_eq!(m.max_count(), 0);
    assert_eq!(alloc.live_allocations(), 0);
}

#[test]
fn debug_and_equality() {
    let a = HashMap::<i32, i32>::from([(1, 10)]);
    let b = a.clone();
    assert_eq!(a, b);
    assert_eq!(format!("{a:?}"), "{1: 10}");
}

#[test]
fn clone_after_removals_finds_every_key() {
    let mut m: HashMap<u32, u32, ConstBuildHasher> = HashMap::with_hasher(ConstBuildHasher);
    for i in 0..4 {
        m.add(i, i * 10);
    }
    assert!(m.remove(&0u32));

    let mut copy = m.clone();
    assert_eq!(copy.len(), 3);
    for i in 1..4u32 {
        assert_eq!(copy.get(&i), Some(&(i * 10)));
        assert!(copy.find(&i).is_some());
    }
    assert!(!copy.add(3, 0).is_inserted());
    assert!(copy.add(0, 0).is_inserted());
    assert_eq!(copy.len(), 4);
    assert_eq!(copy.get(&3u32), Some(&30));
}

#[test]
fn cloned_set_with_holes_stays_unique() {
    let mut s: HashSet<u64> = (0..3000).collect();
    s.retain(|v| v % 3 != 0);
    for v in (0..3000u64).filter(|v| v % 3 == 1) {
        assert!(s.remove(&v));
        assert!(s.add(v).is_inserted());
    }

    let mut copy = s.clone();
    assert_eq!(copy.len(), 2000);
    for v in 0..3000u64 {
        assert_eq!(copy.contains(&v), v % 3 != 0, "key {v}");
    }
    for v in 0..3000u64 {
        copy.add(v);
    }
    assert_eq!(copy.len(), 3000);
}

#[test]
fn reserve_purges_tombstones_in_place() {
    let alloc = CountingAllocator::new();
    let mut m: HashMap<u32, u32, _, _, &CountingAllocator> =
        HashMap::with_policies_in(ConstBuildHasher, StdEq, &alloc);
    m.reserve(6);
    assert_eq!(m.max_count(), 8);
    for i in 0..6 {
        m.add(i, i);
    }
    assert!(m.remove(&0u32));
    assert!(m.remove(&1u32));

    m.reserve(2);
    m.add(6, 6);
    m.add(7, 7);
    assert_eq!(m.max_count(), 8);
    assert_eq!(alloc.allocation_count(), 1);
    assert_eq!(alloc.free_count(), 0);
    for i in 2..8u32 {
        assert_eq!(m.get(&i), Some(&i));
    }
}
