//! HashMap: unique keys with values over the open-addressing engine.

use crate::alloc::{Allocator, Global};
use crate::error::TryReserveError;
use crate::policy::{DefaultHashBuilder, KeyEq, KeyHash, StdEq};
use crate::raw::{self, RawTable};
use crate::reentrancy::DebugReentrancy;
use core::borrow::Borrow;
use core::fmt;
use core::iter::FusedIterator;
use core::ops::Index;

/// Position of an entry inside a table.
///
/// Returned by `find` and `add`. A handle stays meaningful until the table
/// moves its entries (growth, `clear`, `clear_shrink`); after removing its
/// entry it resolves to `None` until the slot is reused.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle(pub(crate) usize);

impl Handle {
    /// Slot index of the entry.
    pub fn index(self) -> usize {
        self.0
    }

    pub fn key<'a, K, V, S, E, A: Allocator>(
        &self,
        map: &'a HashMap<K, V, S, E, A>,
    ) -> Option<&'a K> {
        map.table.get_at(self.0).map(|(k, _)| k)
    }

    pub fn value<'a, K, V, S, E, A: Allocator>(
        &self,
        map: &'a HashMap<K, V, S, E, A>,
    ) -> Option<&'a V> {
        map.table.get_at(self.0).map(|(_, v)| v)
    }

    pub fn value_mut<'a, K, V, S, E, A: Allocator>(
        &self,
        map: &'a mut HashMap<K, V, S, E, A>,
    ) -> Option<&'a mut V> {
        map.table.get_at_mut(self.0).map(|(_, v)| v)
    }
}

/// Outcome of adding a key: duplicates are an ordinary result, not an error.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Added {
    /// The key was absent and has been stored at this handle.
    Inserted(Handle),
    /// The key was already present; the stored entry is unchanged.
    Existing(Handle),
}

impl Added {
    pub fn handle(self) -> Handle {
        match self {
            Added::Inserted(h) | Added::Existing(h) => h,
        }
    }

    pub fn is_inserted(self) -> bool {
        matches!(self, Added::Inserted(_))
    }
}

/// Hash map with open addressing and linear probing.
///
/// `S` hashes keys (`KeyHash`), `E` compares them (`KeyEq`) and `A`
/// provides the single block backing the table. Adding a key that is
/// already present keeps the first value.
pub struct HashMap<K, V, S = DefaultHashBuilder, E = StdEq, A: Allocator = Global> {
    hasher: S,
    key_eq: E,
    table: RawTable<(K, V), A>,
    reentrancy: DebugReentrancy,
}

impl<K, V> HashMap<K, V> {
    /// Create an empty map. Does not allocate.
    pub fn new() -> Self {
        Self::with_policies(DefaultHashBuilder::default(), StdEq)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, DefaultHashBuilder::default())
    }
}

impl<K, V, S, E: Default> HashMap<K, V, S, E> {
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_policies(hasher, E::default())
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self::from_parts(hasher, E::default(), RawTable::with_capacity(capacity))
    }
}

impl<K, V, S, E> HashMap<K, V, S, E> {
    pub fn with_policies(hasher: S, key_eq: E) -> Self {
        Self::from_parts(hasher, key_eq, RawTable::new())
    }
}

impl<K, V, S: Default, E: Default, A: Allocator> HashMap<K, V, S, E, A> {
    /// Create an empty map backed by `alloc`. Does not allocate.
    pub fn new_in(alloc: A) -> Self {
        Self::from_parts(S::default(), E::default(), RawTable::new_in(alloc))
    }

    pub fn with_capacity_in(capacity: usize, alloc: A) -> Self {
        Self::from_parts(
            S::default(),
            E::default(),
            RawTable::with_capacity_in(capacity, alloc),
        )
    }
}

impl<K, V, S, E, A: Allocator> HashMap<K, V, S, E, A> {
    fn from_parts(hasher: S, key_eq: E, table: RawTable<(K, V), A>) -> Self {
        Self {
            hasher,
            key_eq,
            table,
            reentrancy: DebugReentrancy::new(),
        }
    }

    /// Create an empty map with explicit policies, backed by `alloc`.
    pub fn with_policies_in(hasher: S, key_eq: E, alloc: A) -> Self {
        Self::from_parts(hasher, key_eq, RawTable::new_in(alloc))
    }

    /// Number of entries.
    pub fn count(&self) -> usize {
        self.table.len()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Number of slots in the backing block; zero when nothing is allocated.
    pub fn max_count(&self) -> usize {
        self.table.slots()
    }

    /// Number of entries the current block holds before growing.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub fn key_eq(&self) -> &E {
        &self.key_eq
    }

    pub fn allocator(&self) -> &A {
        self.table.allocator()
    }

    /// Drop every entry; the block is kept for later inserts.
    pub fn clear(&mut self) {
        let _g = self.reentrancy.enter();
        self.table.clear();
    }

    /// Drop every entry and release the block.
    pub fn clear_shrink(&mut self) {
        let _g = self.reentrancy.enter();
        self.table.clear_shrink();
    }

    /// Make room for `additional` more entries. No-op when they already fit.
    pub fn reserve(&mut self, additional: usize) {
        self.table.reserve(additional);
    }

    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        self.table.try_reserve(additional)
    }

    /// Move the entry at `handle` out of the map.
    pub fn remove_at(&mut self, handle: Handle) -> Option<(K, V)> {
        let _g = self.reentrancy.enter();
        self.table.remove_at(handle.0)
    }

    /// Keep only the entries for which `keep` returns `true`.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let _g = self.reentrancy.enter();
        self.table.retain(|(k, v)| keep(k, v));
    }

    /// Move every entry out, keeping the block.
    pub fn drain(&mut self) -> Drain<'_, K, V, A> {
        Drain {
            inner: self.table.drain(),
        }
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.table.iter_mut(),
        }
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    /// Duplicate the map with bulk copies of its block, without per-entry
    /// calls.
    pub fn clone_bitwise(&self) -> Self
    where
        K: Copy,
        V: Copy,
        S: Clone,
        E: Clone,
        A: Clone,
    {
        Self::from_parts(
            self.hasher.clone(),
            self.key_eq.clone(),
            self.table.clone_bitwise(),
        )
    }
}

impl<K, V, S, E, A> HashMap<K, V, S, E, A>
where
    S: KeyHash<K>,
    E: KeyEq<K>,
    A: Allocator,
{
    /// Move `key` and `value` into the map unless the key is present. A
    /// duplicate leaves the stored entry untouched and drops the arguments.
    pub fn add(&mut self, key: K, value: V) -> Added {
        let _g = self.reentrancy.enter();
        let hash = self.hasher.hash_key(&key);
        let key_eq = &self.key_eq;
        match self
            .table
            .find_or_find_insert_slot(hash, |(k, _)| key_eq.key_eq(k, &key))
        {
            Ok(i) => Added::Existing(Handle(i)),
            Err(slot) => {
                Added::Inserted(Handle(self.table.insert_in_slot(hash, slot, (key, value))))
            }
        }
    }

    /// Copy `key` and `value` into the map unless the key is present: one
    /// `clone` of each on insertion, none for a duplicate.
    pub fn add_cloned(&mut self, key: &K, value: &V) -> Added
    where
        K: Clone,
        V: Clone,
    {
        let _g = self.reentrancy.enter();
        let hash = self.hasher.hash_key(key);
        let key_eq = &self.key_eq;
        match self
            .table
            .find_or_find_insert_slot(hash, |(k, _)| key_eq.key_eq(k, key))
        {
            Ok(i) => Added::Existing(Handle(i)),
            Err(slot) => {
                let entry = (key.clone(), value.clone());
                Added::Inserted(Handle(self.table.insert_in_slot(hash, slot, entry)))
            }
        }
    }

    /// Add `key` with a value built by `make`, which only runs when the key
    /// is absent.
    pub fn emplace<F>(&mut self, key: K, make: F) -> Added
    where
        F: FnOnce() -> V,
    {
        let _g = self.reentrancy.enter();
        let hash = self.hasher.hash_key(&key);
        let key_eq = &self.key_eq;
        match self
            .table
            .find_or_find_insert_slot(hash, |(k, _)| key_eq.key_eq(k, &key))
        {
            Ok(i) => Added::Existing(Handle(i)),
            Err(slot) => {
                let value = make();
                Added::Inserted(Handle(self.table.insert_in_slot(hash, slot, (key, value))))
            }
        }
    }
}

impl<K, V, S, E, A: Allocator> HashMap<K, V, S, E, A> {
    fn find_index<Q>(&self, q: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        S: KeyHash<Q>,
        E: KeyEq<Q>,
    {
        let hash = self.hasher.hash_key(q);
        let key_eq = &self.key_eq;
        self.table.find(hash, |(k, _)| key_eq.key_eq(k.borrow(), q))
    }

    pub fn find<Q>(&self, q: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        S: KeyHash<Q>,
        E: KeyEq<Q>,
    {
        let _g = self.reentrancy.enter();
        self.find_index(q).map(Handle)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        S: KeyHash<Q>,
        E: KeyEq<Q>,
    {
        let _g = self.reentrancy.enter();
        self.find_index(q).is_some()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        S: KeyHash<Q>,
        E: KeyEq<Q>,
    {
        self.get_key_value(q).map(|(_, v)| v)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        S: KeyHash<Q>,
        E: KeyEq<Q>,
    {
        let _g = self.reentrancy.enter();
        let i = self.find_index(q)?;
        self.table.get_at(i).map(|(k, v)| (k, v))
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        S: KeyHash<Q>,
        E: KeyEq<Q>,
    {
        let _g = self.reentrancy.enter();
        let i = self.find_index(q)?;
        self.table.get_at_mut(i).map(|(_, v)| v)
    }

    /// Drop the entry for `q` in place. Returns whether it was present.
    pub fn remove<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        S: KeyHash<Q>,
        E: KeyEq<Q>,
    {
        let _g = self.reentrancy.enter();
        match self.find_index(q) {
            Some(i) => self.table.erase_at(i),
            None => false,
        }
    }

    /// Move the entry for `q` out of the map.
    pub fn take<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        S: KeyHash<Q>,
        E: KeyEq<Q>,
    {
        let _g = self.reentrancy.enter();
        let i = self.find_index(q)?;
        self.table.remove_at(i)
    }
}

impl<K, V> Default for HashMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S, E, A> Clone for HashMap<K, V, S, E, A>
where
    K: Clone,
    V: Clone,
    S: Clone,
    E: Clone,
    A: Allocator + Clone,
{
    /// Clones every key and value exactly once.
    fn clone(&self) -> Self {
        let _g = self.reentrancy.enter();
        Self::from_parts(self.hasher.clone(), self.key_eq.clone(), self.table.clone())
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S, E, A: Allocator> fmt::Debug for HashMap<K, V, S, E, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S, E, A> PartialEq for HashMap<K, V, S, E, A>
where
    V: PartialEq,
    S: KeyHash<K>,
    E: KeyEq<K>,
    A: Allocator,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V, S, E, A> Eq for HashMap<K, V, S, E, A>
where
    V: Eq,
    S: KeyHash<K>,
    E: KeyEq<K>,
    A: Allocator,
{
}

impl<K, Q, V, S, E, A> Index<&Q> for HashMap<K, V, S, E, A>
where
    K: Borrow<Q>,
    Q: ?Sized,
    S: KeyHash<Q>,
    E: KeyEq<Q>,
    A: Allocator,
{
    type Output = V;

    /// Panics if the key is absent.
    fn index(&self, key: &Q) -> &V {
        match self.get(key) {
            Some(v) => v,
            None => panic!("key not found in HashMap"),
        }
    }
}

impl<K, V, S, E, A> Extend<(K, V)> for HashMap<K, V, S, E, A>
where
    S: KeyHash<K>,
    E: KeyEq<K>,
    A: Allocator,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        // Duplicates may follow, so only reserve half of the hint once the
        // map already has entries.
        let hint = iter.size_hint().0;
        self.reserve(if self.is_empty() { hint } else { hint.div_ceil(2) });
        for (k, v) in iter {
            self.add(k, v);
        }
    }
}

impl<K, V, S, E> FromIterator<(K, V)> for HashMap<K, V, S, E>
where
    S: KeyHash<K> + Default,
    E: KeyEq<K> + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::with_policies(S::default(), E::default());
        map.extend(iter);
        map
    }
}

impl<K, V, S, E, const N: usize> From<[(K, V); N]> for HashMap<K, V, S, E>
where
    S: KeyHash<K> + Default,
    E: KeyEq<K> + Default,
{
    /// Later duplicates of a key are ignored.
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl<'a, K, V, S, E, A: Allocator> IntoIterator for &'a HashMap<K, V, S, E, A> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, S, E, A: Allocator> IntoIterator for &'a mut HashMap<K, V, S, E, A> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}

impl<K, V, S, E, A: Allocator> IntoIterator for HashMap<K, V, S, E, A> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V, A>;

    fn into_iter(self) -> IntoIter<K, V, A> {
        IntoIter {
            inner: self.table.into_iter(),
        }
    }
}

/// Iterator over shared entries of a `HashMap`.
pub struct Iter<'a, K, V> {
    inner: raw::Iter<'a, (K, V)>,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over mutable entries of a `HashMap`.
pub struct IterMut<'a, K, V> {
    inner: raw::IterMut<'a, (K, V)>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (&*k, v))
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;
    #[inline]
    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(k, _)| k)
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;
    #[inline]
    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

pub struct ValuesMut<'a, K, V> {
    inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;
    #[inline]
    fn next(&mut self) -> Option<&'a mut V> {
        self.inner.next().map(|(_, v)| v)
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}

/// Owning iterator over the entries of a `HashMap`.
pub struct IntoIter<K, V, A: Allocator = Global> {
    inner: raw::IntoIter<(K, V), A>,
}

impl<K, V, A: Allocator> Iterator for IntoIter<K, V, A> {
    type Item = (K, V);
    #[inline]
    fn next(&mut self) -> Option<(K, V)> {
        self.inner.next()
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, A: Allocator> ExactSizeIterator for IntoIter<K, V, A> {}
impl<K, V, A: Allocator> FusedIterator for IntoIter<K, V, A> {}

/// Draining iterator over the entries of a `HashMap`.
pub struct Drain<'a, K, V, A: Allocator = Global> {
    inner: raw::Drain<'a, (K, V), A>,
}

impl<K, V, A: Allocator> Iterator for Drain<'_, K, V, A> {
    type Item = (K, V);
    #[inline]
    fn next(&mut self) -> Option<(K, V)> {
        self.inner.next()
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, A: Allocator> ExactSizeIterator for Drain<'_, K, V, A> {}
impl<K, V, A: Allocator> FusedIterator for Drain<'_, K, V, A> {}
