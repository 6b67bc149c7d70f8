//! HashSet: unique keys over the open-addressing engine.

use crate::alloc::{Allocator, Global};
use crate::error::TryReserveError;
use crate::map::{Added, Handle};
use crate::policy::{DefaultHashBuilder, KeyEq, KeyHash, StdEq};
use crate::raw::{self, RawTable};
use crate::reentrancy::DebugReentrancy;
use core::borrow::Borrow;
use core::fmt;
use core::iter::FusedIterator;

/// Hash set with open addressing and linear probing.
///
/// Shares its engine, policies and handles with [`HashMap`](crate::HashMap).
/// Adding a value that is already present keeps the stored one.
pub struct HashSet<T, S = DefaultHashBuilder, E = StdEq, A: Allocator = Global> {
    hasher: S,
    key_eq: E,
    table: RawTable<T, A>,
    reentrancy: DebugReentrancy,
}

impl<T> HashSet<T> {
    /// Create an empty set. Does not allocate.
    pub fn new() -> Self {
        Self::with_policies(DefaultHashBuilder::default(), StdEq)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, DefaultHashBuilder::default())
    }
}

impl<T, S, E: Default> HashSet<T, S, E> {
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_policies(hasher, E::default())
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self::from_parts(hasher, E::default(), RawTable::with_capacity(capacity))
    }
}

impl<T, S, E> HashSet<T, S, E> {
    pub fn with_policies(hasher: S, key_eq: E) -> Self {
        Self::from_parts(hasher, key_eq, RawTable::new())
    }
}

impl<T, S: Default, E: Default, A: Allocator> HashSet<T, S, E, A> {
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

impl<T, S, E, A: Allocator> HashSet<T, S, E, A> {
    fn from_parts(hasher: S, key_eq: E, table: RawTable<T, A>) -> Self {
        Self {
            hasher,
            key_eq,
            table,
            reentrancy: DebugReentrancy::new(),
        }
    }

    pub fn with_policies_in(hasher: S, key_eq: E, alloc: A) -> Self {
        Self::from_parts(hasher, key_eq, RawTable::new_in(alloc))
    }

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

    /// Value stored at `handle`, if its slot is still occupied.
    pub fn get_at(&self, handle: Handle) -> Option<&T> {
        self.table.get_at(handle.index())
    }

    pub fn clear(&mut self) {
        let _g = self.reentrancy.enter();
        self.table.clear();
    }

    /// Drop every value and release the block.
    pub fn clear_shrink(&mut self) {
        let _g = self.reentrancy.enter();
        self.table.clear_shrink();
    }

    pub fn reserve(&mut self, additional: usize) {
        self.table.reserve(additional);
    }

    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        self.table.try_reserve(additional)
    }

    pub fn remove_at(&mut self, handle: Handle) -> Option<T> {
        let _g = self.reentrancy.enter();
        self.table.remove_at(handle.index())
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&T) -> bool,
    {
        let _g = self.reentrancy.enter();
        self.table.retain(|v| keep(v));
    }

    pub fn drain(&mut self) -> Drain<'_, T, A> {
        Drain {
            inner: self.table.drain(),
        }
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Duplicate the set with bulk copies of its block.
    pub fn clone_bitwise(&self) -> Self
    where
        T: Copy,
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

impl<T, S, E, A> HashSet<T, S, E, A>
where
    S: KeyHash<T>,
    E: KeyEq<T>,
    A: Allocator,
{
    /// Move `value` into the set unless an equal value is present.
    pub fn add(&mut self, value: T) -> Added {
        let _g = self.reentrancy.enter();
        let hash = self.hasher.hash_key(&value);
        let key_eq = &self.key_eq;
        match self
            .table
            .find_or_find_insert_slot(hash, |v| key_eq.key_eq(v, &value))
        {
            Ok(i) => Added::Existing(Handle(i)),
            Err(slot) => {
                Added::Inserted(Handle(self.table.insert_in_slot(hash, slot, value)))
            }
        }
    }

    /// Clone `value` into the set unless an equal value is present.
    pub fn add_cloned(&mut self, value: &T) -> Added
    where
        T: Clone,
    {
        let _g = self.reentrancy.enter();
        let hash = self.hasher.hash_key(value);
        let key_eq = &self.key_eq;
        match self
            .table
            .find_or_find_insert_slot(hash, |v| key_eq.key_eq(v, value))
        {
            Ok(i) => Added::Existing(Handle(i)),
            Err(slot) => {
                let owned = value.clone();
                Added::Inserted(Handle(self.table.insert_in_slot(hash, slot, owned)))
            }
        }
    }
}

impl<T, S, E, A: Allocator> HashSet<T, S, E, A> {
    fn find_index<Q>(&self, q: &Q) -> Option<usize>
    where
        T: Borrow<Q>,
        Q: ?Sized,
        S: KeyHash<Q>,
        E: KeyEq<Q>,
    {
        let hash = self.hasher.hash_key(q);
        let key_eq = &self.key_eq;
        self.table.find(hash, |v| key_eq.key_eq(v.borrow(), q))
    }

    /// Stored value equal to `q`, inserting `make(q)` first when absent.
    ///
    /// `make(q)` must hash and compare equal to `q`.
    pub fn get_or_insert_with<Q, F>(&mut self, q: &Q, make: F) -> &T
    where
        T: Borrow<Q>,
        Q: ?Sized,
        S: KeyHash<Q>,
        E: KeyEq<Q>,
        F: FnOnce(&Q) -> T,
    {
        let _g = self.reentrancy.enter();
        let hash = self.hasher.hash_key(q);
        let key_eq = &self.key_eq;
        let index = match self
            .table
            .find_or_find_insert_slot(hash, |v| key_eq.key_eq(v.borrow(), q))
        {
            Ok(i) => i,
            Err(slot) => {
                let value = make(q);
                self.table.insert_in_slot(hash, slot, value)
            }
        };
        match self.table.get_at(index) {
            Some(v) => v,
            None => unreachable!("slot {index} was just filled"),
        }
    }

    pub fn find<Q>(&self, q: &Q) -> Option<Handle>
    where
        T: Borrow<Q>,
        Q: ?Sized,
        S: KeyHash<Q>,
        E: KeyEq<Q>,
    {
        let _g = self.reentrancy.enter();
        self.find_index(q).map(Handle)
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: ?Sized,
        S: KeyHash<Q>,
        E: KeyEq<Q>,
    {
        let _g = self.reentrancy.enter();
        let i = self.find_index(q)?;
        self.table.get_at(i)
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized,
        S: KeyHash<Q>,
        E: KeyEq<Q>,
    {
        let _g = self.reentrancy.enter();
        self.find_index(q).is_some()
    }

    /// Drop the value equal to `q`. Returns whether it was present.
    pub fn remove<Q>(&mut self, q: &Q) -> bool
    where
        T: Borrow<Q>,
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

    /// Move the value equal to `q` out of the set.
    pub fn take<Q>(&mut self, q: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: ?Sized,
        S: KeyHash<Q>,
        E: KeyEq<Q>,
    {
        let _g = self.reentrancy.enter();
        let i = self.find_index(q)?;
        self.table.remove_at(i)
    }

    /// Whether every value of `self` is in `other`.
    pub fn is_subset<S2, E2, A2>(&self, other: &HashSet<T, S2, E2, A2>) -> bool
    where
        S2: KeyHash<T>,
        E2: KeyEq<T>,
        A2: Allocator,
    {
        self.len() <= other.len() && self.iter().all(|v| other.contains(v))
    }

    /// Whether `self` and `other` share no value.
    pub fn is_disjoint<S2, E2, A2>(&self, other: &HashSet<T, S2, E2, A2>) -> bool
    where
        S2: KeyHash<T>,
        E2: KeyEq<T>,
        A2: Allocator,
    {
        self.iter().all(|v| !other.contains(v))
    }
}

impl<T> Default for HashSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S, E, A> Clone for HashSet<T, S, E, A>
where
    T: Clone,
    S: Clone,
    E: Clone,
    A: Allocator + Clone,
{
    fn clone(&self) -> Self {
        let _g = self.reentrancy.enter();
        Self::from_parts(self.hasher.clone(), self.key_eq.clone(), self.table.clone())
    }
}

impl<T: fmt::Debug, S, E, A: Allocator> fmt::Debug for HashSet<T, S, E, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, S, E, A> PartialEq for HashSet<T, S, E, A>
where
    S: KeyHash<T>,
    E: KeyEq<T>,
    A: Allocator,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.is_subset(other)
    }
}

impl<T, S, E, A> Eq for HashSet<T, S, E, A>
where
    S: KeyHash<T>,
    E: KeyEq<T>,
    A: Allocator,
{
}

impl<T, S, E, A> Extend<T> for HashSet<T, S, E, A>
where
    S: KeyHash<T>,
    E: KeyEq<T>,
    A: Allocator,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let hint = iter.size_hint().0;
        self.reserve(if self.is_empty() { hint } else { hint.div_ceil(2) });
        for v in iter {
            self.add(v);
        }
    }
}

impl<T, S, E> FromIterator<T> for HashSet<T, S, E>
where
    S: KeyHash<T> + Default,
    E: KeyEq<T> + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::with_policies(S::default(), E::default());
        set.extend(iter);
        set
    }
}

impl<T, S, E, const N: usize> From<[T; N]> for HashSet<T, S, E>
where
    S: KeyHash<T> + Default,
    E: KeyEq<T> + Default,
{
    fn from(values: [T; N]) -> Self {
        values.into_iter().collect()
    }
}

impl<'a, T, S, E, A: Allocator> IntoIterator for &'a HashSet<T, S, E, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<T, S, E, A: Allocator> IntoIterator for HashSet<T, S, E, A> {
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> IntoIter<T, A> {
        IntoIter {
            inner: self.table.into_iter(),
        }
    }
}

pub struct Iter<'a, T> {
    inner: raw::Iter<'a, T>,
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Iter {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;
    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        self.inner.next()
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

pub struct IntoIter<T, A: Allocator = Global> {
    inner: raw::IntoIter<T, A>,
}

impl<T, A: Allocator> Iterator for IntoIter<T, A> {
    type Item = T;
    #[inline]
    fn next(&mut self) -> Option<T> {
        self.inner.next()
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T, A: Allocator> ExactSizeIterator for IntoIter<T, A> {}
impl<T, A: Allocator> FusedIterator for IntoIter<T, A> {}

pub struct Drain<'a, T, A: Allocator = Global> {
    inner: raw::Drain<'a, T, A>,
}

impl<T, A: Allocator> Iterator for Drain<'_, T, A> {
    type Item = T;
    #[inline]
    fn next(&mut self) -> Option<T> {
        self.inner.next()
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T, A: Allocator> ExactSizeIterator for Drain<'_, T, A> {}
impl<T, A: Allocator> FusedIterator for Drain<'_, T, A> {}
