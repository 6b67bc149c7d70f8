//! Allocation and construction bookkeeping observed through
//! `CountingAllocator` and a clone/drop counting element type.

mod common;

use common::{Counters, Tracked};
use openhash::{CountingAllocator, DefaultHashBuilder, HashMap, HashSet, StdEq};

type CountedMap<'a, K, V> = HashMap<K, V, DefaultHashBuilder, StdEq, &'a CountingAllocator>;

/// Invariant: a new set performs no allocation.
#[test]
fn empty_set_does_not_allocate() {
    let alloc = CountingAllocator::new();
    let s: HashSet<i32, DefaultHashBuilder, StdEq, _> = HashSet::new_in(&alloc);
    assert_eq!(s.count(), 0);
    assert_eq!(s.max_count(), 0);
    assert_eq!(alloc.allocation_count(), 0);
    drop(s);
    assert_eq!(alloc.free_count(), 0);
}

/// Invariant: `clear_shrink` empties the table, releases its block, and
/// drops every value exactly once.
#[test]
fn reserve_fill_clear_shrink() {
    let alloc = CountingAllocator::new();
    let counters = Counters::new();
    let mut m: CountedMap<'_, i32, Tracked> = HashMap::new_in(&alloc);
    m.reserve(256);
    assert_eq!(alloc.allocation_count(), 1);
    for i in 0..256 {
        assert!(m.add(i, Tracked::new(i as u64, &counters)).is_inserted());
    }
    assert_eq!(m.count(), 256);
    assert_eq!(alloc.allocation_count(), 1, "reserve(256) covers 256 adds");

    m.clear_shrink();
    assert_eq!(m.count(), 0);
    assert_eq!(m.max_count(), 0);
    assert_eq!(counters.drops(), 256);
    assert_eq!(counters.clones(), 0);
    assert_eq!(alloc.free_count(), alloc.allocation_count());
    assert_eq!(alloc.bytes_in_use(), 0);
}

/// Invariant: the first add after `clear_shrink` allocates a fresh block.
#[test]
fn readd_after_clear_shrink_allocates_again() {
    let alloc = CountingAllocator::new();
    let mut m: CountedMap<'_, i32, i64> = HashMap::new_in(&alloc);
    m.reserve(256);
    for i in 0..256 {
        m.add(i, i64::from(i) * 2);
    }
    m.clear_shrink();
    let baseline = alloc.allocation_count();

    for i in 0..256 {
        m.add(i, i64::from(i));
    }
    assert!(alloc.allocation_count() > baseline);
    assert_eq!(m.count(), 256);
    for i in 0..256 {
        assert_eq!(m.get(&i), Some(&i64::from(i)));
    }
}

/// Invariant: every growth step is one allocation and one free of the old
/// block; the first allocation frees nothing.
#[test]
fn one_allocation_and_free_per_growth() {
    let alloc = CountingAllocator::new();
    let mut m: CountedMap<'_, u64, u64> = HashMap::new_in(&alloc);
    let mut growths = 0;
    let mut slots = m.max_count();
    for i in 0..1000u64 {
        m.add(i, i);
        if m.max_count() != slots {
            growths += 1;
            slots = m.max_count();
            assert_eq!(alloc.allocation_count(), growths);
            assert_eq!(alloc.free_count(), growths - 1);
        }
    }
    assert_eq!(alloc.live_allocations(), 1);
    for i in 0..1000u64 {
        assert_eq!(m.get(&i), Some(&i));
    }
    drop(m);
    assert_eq!(alloc.live_allocations(), 0);
}

/// Invariant: owned adds clone nothing and growth neither clones nor drops.
#[test]
fn growth_moves_without_clone_or_drop() {
    let counters = Counters::new();
    let mut m: HashMap<u64, Tracked> = HashMap::new();
    for i in 0..500 {
        m.add(i, Tracked::new(i, &counters));
    }
    assert!(m.max_count() >= 512);
    assert_eq!(counters.clones(), 0);
    assert_eq!(counters.drops(), 0);
    drop(m);
    assert_eq!(counters.drops(), 500);
}

/// Invariant: `add_cloned` clones key and value once on insertion and
/// not at all for a duplicate.
#[test]
fn add_cloned_counts() {
    let keys = Counters::new();
    let values = Counters::new();
    let mut m: HashMap<Tracked, Tracked> = HashMap::new();

    let k = Tracked::new(1, &keys);
    let v = Tracked::new(10, &values);
    assert!(m.add_cloned(&k, &v).is_inserted());
    assert_eq!((keys.clones(), values.clones()), (1, 1));

    assert!(!m.add_cloned(&k, &v).is_inserted());
    assert_eq!((keys.clones(), values.clones()), (1, 1));
    assert_eq!((keys.drops(), values.drops()), (0, 0));
}

/// Invariant: a duplicate `add` stores nothing and drops the arguments.
#[test]
fn duplicate_add_drops_arguments() {
    let counters = Counters::new();
    let mut s: HashSet<Tracked> = HashSet::new();
    s.add(Tracked::new(7, &counters));
    assert!(!s.add(Tracked::new(7, &counters)).is_inserted());
    assert_eq!(counters.drops(), 1);
    assert_eq!(s.len(), 1);
    assert!(s.contains(&7u64));
}

/// Invariant: a duplicate `emplace` constructs nothing.
#[test]
fn duplicate_emplace_constructs_nothing() {
    let counters = Counters::new();
    let mut m: HashMap<u64, Tracked> = HashMap::new();
    m.emplace(1, || Tracked::new(1, &counters));
    let mut built = false;
    let added = m.emplace(1, || {
        built = true;
        Tracked::new(2, &counters)
    });
    assert!(!added.is_inserted());
    assert!(!built);
    assert_eq!(counters.drops(), 0);
    assert_eq!(m.get(&1u64).map(|t| t.id), Some(1));
}

/// Invariant: remove, clear and clear_shrink each drop every removed
/// element exactly once; take hands ownership back without a drop.
#[test]
fn removals_drop_exactly_once() {
    let counters = Counters::new();
    let mut m: HashMap<u64, Tracked> = HashMap::new();
    for i in 0..40 {
        m.add(i, Tracked::new(i, &counters));
    }
    for i in 0..10u64 {
        assert!(m.remove(&i));
    }
    assert_eq!(counters.drops(), 10);

    let taken = m.take(&10u64).map(|(_, v)| v);
    assert_eq!(counters.drops(), 10);
    drop(taken);
    assert_eq!(counters.drops(), 11);

    m.clear();
    assert_eq!(counters.drops(), 40);
    assert!(m.max_count() > 0);

    for i in 0..5 {
        m.add(i, Tracked::new(i, &counters));
    }
    m.clear_shrink();
    assert_eq!(counters.drops(), 45);
    assert_eq!(counters.clones(), 0);
}

/// Invariant: `clone` clones each element exactly once; `clone_bitwise`
/// performs one allocation and no per-element work.
#[test]
fn clone_counts() {
    let counters = Counters::new();
    let mut s: HashSet<Tracked> = HashSet::new();
    for i in 0..30 {
        s.add(Tracked::new(i, &counters));
    }
    let copy = s.clone();
    assert_eq!(counters.clones(), 30);
    assert_eq!(copy, s);
    assert_eq!(copy.max_count(), s.max_count());

    let alloc = CountingAllocator::new();
    let mut plain: CountedMap<'_, u32, u32> = HashMap::new_in(&alloc);
    for i in 0..30 {
        plain.add(i, i);
    }
    let before = alloc.allocation_count();
    let bitwise = plain.clone_bitwise();
    assert_eq!(alloc.allocation_count(), before + 1);
    assert_eq!(bitwise, plain);
}

/// Invariant: dropping an owning iterator part way drops the remaining
/// elements and releases the block.
#[test]
fn partial_into_iter_drops_rest() {
    let alloc = CountingAllocator::new();
    let counters = Counters::new();
    let mut m: HashMap<u64, Tracked, DefaultHashBuilder, StdEq, &CountingAllocator> =
        HashMap::new_in(&alloc);
    for i in 0..20 {
        m.add(i, Tracked::new(i, &counters));
    }
    let mut it = m.into_iter();
    let first = it.next();
    assert!(first.is_some());
    drop(it);
    assert_eq!(counters.drops(), 19);
    drop(first);
    assert_eq!(counters.drops(), 20);
    assert_eq!(alloc.live_allocations(), 0);
}

/// Invariant: a drain dropped before exhaustion still empties the table
/// and keeps its block.
#[test]
fn partial_drain_empties_table() {
    let counters = Counters::new();
    let mut m: HashMap<u64, Tracked> = HashMap::new();
    for i in 0..20 {
        m.add(i, Tracked::new(i, &counters));
    }
    let slots = m.max_count();
    {
        let mut d = m.drain();
        let _ = d.next();
        let _ = d.next();
    }
    assert_eq!(counters.drops(), 20);
    assert!(m.is_empty());
    assert_eq!(m.max_count(), slots);
    m.add(1, Tracked::new(1, &counters));
    assert_eq!(m.len(), 1);
}
