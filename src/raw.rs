//! RawTable: the open-addressing engine behind `HashMap` and `HashSet`.
//!
//! Layout
//! - One allocation per table, split into three regions of `slots` entries
//!   each: control bytes, stored hashes, element slots.
//! - A control byte is `EMPTY`, `DELETED` (tombstone) or, for a full slot,
//!   the top seven bits of the element's hash.
//! - `slots` is zero (no allocation) or a power of two of at least
//!   `MIN_SLOTS`. At most 3/4 of the slots are ever full.
//!
//! Probing
//! - Linear: start at `hash & (slots - 1)` and step by one, wrapping.
//! - A probe stops at the first `EMPTY` byte. `growth_left` counts the
//!   `EMPTY` slots that may still be filled, so at least one `EMPTY` byte
//!   always remains and every probe terminates.
//! - Removal writes `EMPTY` when the next slot is `EMPTY` (no probe chain
//!   runs through the slot), `DELETED` otherwise.
//! - Tombstones are purged in place when they exhaust `growth_left` in a
//!   block that still has room; the block only grows when `len` needs it.
//!
//! Hashes
//! - The full hash of every element is stored next to it. Rehashing reads
//!   the stored hashes and never calls back into user code.
//!
//! The table is hash-agnostic: callers pass precomputed hashes and equality
//! closures. Object lifetimes are managed through `crate::memory`.

// Keyed helpers (`get`, `insert_unique`, `remove_entry`, ...) are only
// reached from tests and benches unless the module is public.
#![cfg_attr(not(feature = "bench_internal"), allow(dead_code))]

use crate::alloc::{Allocator, Global};
use crate::error::TryReserveError;
use crate::memory::{self, Lifetime};
use core::alloc::Layout;
use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::ptr::{self, NonNull};

const EMPTY: u8 = 0xff;
const DELETED: u8 = 0x80;

/// Smallest non-zero slot count.
const MIN_SLOTS: usize = 8;

#[inline(always)]
fn is_full(ctrl: u8) -> bool {
    ctrl & 0x80 == 0
}

/// Seven-bit tag stored in the control byte of a full slot.
#[inline(always)]
fn tag(hash: u64) -> u8 {
    (hash >> 57) as u8
}

/// Number of slots needed to hold `capacity` elements below the load factor.
fn capacity_to_slots(capacity: usize) -> Option<usize> {
    if capacity == 0 {
        return Some(0);
    }
    let adjusted = capacity.checked_mul(4)?.div_ceil(3);
    adjusted.max(MIN_SLOTS).checked_next_power_of_two()
}

/// Number of elements `slots` slots can hold below the load factor.
#[inline]
fn slots_to_capacity(slots: usize) -> usize {
    slots - slots / 4
}

#[derive(Clone, Copy)]
enum Fallibility {
    Fallible,
    Infallible,
}

impl Fallibility {
    #[cold]
    fn capacity_overflow(self) -> TryReserveError {
        match self {
            Fallibility::Fallible => TryReserveError::CapacityOverflow,
            Fallibility::Infallible => panic!("capacity overflow"),
        }
    }

    #[cold]
    fn alloc_err(self, layout: Layout) -> TryReserveError {
        match self {
            Fallibility::Fallible => TryReserveError::AllocError { layout },
            Fallibility::Infallible => std::alloc::handle_alloc_error(layout),
        }
    }
}

/// The backing block of a table: pointers into one allocation.
struct Block<T> {
    ctrl: NonNull<u8>,
    hashes: NonNull<u64>,
    data: NonNull<T>,
    slots: usize,
    layout: Layout,
}

impl<T> Block<T> {
    const EMPTY: Self = Block {
        ctrl: NonNull::dangling(),
        hashes: NonNull::dangling(),
        data: NonNull::dangling(),
        slots: 0,
        layout: Layout::new::<()>(),
    };

    /// Combined layout and the offsets of the hash and data regions.
    fn layout(slots: usize) -> Option<(Layout, usize, usize)> {
        let ctrl = Layout::array::<u8>(slots).ok()?;
        let (layout, hashes) = ctrl.extend(Layout::array::<u64>(slots).ok()?).ok()?;
        let (layout, data) = layout.extend(Layout::array::<T>(slots).ok()?).ok()?;
        Some((layout, hashes, data))
    }

    /// Allocate a block of `slots` slots with every control byte `EMPTY`.
    fn allocate<A: Allocator>(
        alloc: &A,
        slots: usize,
        fallibility: Fallibility,
    ) -> Result<Self, TryReserveError> {
        debug_assert!(slots.is_power_of_two() && slots >= MIN_SLOTS);
        let (layout, hashes, data) =
            Self::layout(slots).ok_or_else(|| fallibility.capacity_overflow())?;
        let base = match alloc.allocate(layout) {
            Ok(block) => block.cast::<u8>(),
            Err(_) => return Err(fallibility.alloc_err(layout)),
        };
        // SAFETY: the offsets come from `layout`, which `base` satisfies, and
        // the control region is `slots` bytes long.
        unsafe {
            ptr::write_bytes(base.as_ptr(), EMPTY, slots);
            Ok(Block {
                ctrl: base,
                hashes: NonNull::new_unchecked(base.as_ptr().add(hashes)).cast(),
                data: NonNull::new_unchecked(base.as_ptr().add(data)).cast(),
                slots,
                layout,
            })
        }
    }

    /// Return the allocation. Elements must already be dropped or moved out.
    ///
    /// # Safety
    ///
    /// `alloc` must be the allocator that produced the block, and the block
    /// must not be used afterwards.
    unsafe fn free<A: Allocator>(&self, alloc: &A) {
        if self.slots != 0 {
            // SAFETY: guaranteed by the caller.
            unsafe { alloc.deallocate(self.ctrl, self.layout) }
        }
    }

    #[inline(always)]
    fn mask(&self) -> usize {
        self.slots.wrapping_sub(1)
    }

    #[inline(always)]
    unsafe fn ctrl(&self, i: usize) -> u8 {
        debug_assert!(i < self.slots);
        unsafe { *self.ctrl.as_ptr().add(i) }
    }

    #[inline(always)]
    unsafe fn set_ctrl(&mut self, i: usize, c: u8) {
        debug_assert!(i < self.slots);
        unsafe { *self.ctrl.as_ptr().add(i) = c }
    }

    #[inline(always)]
    unsafe fn hash(&self, i: usize) -> u64 {
        debug_assert!(i < self.slots);
        unsafe { *self.hashes.as_ptr().add(i) }
    }

    #[inline(always)]
    unsafe fn slot(&self, i: usize) -> *mut T {
        debug_assert!(i < self.slots);
        unsafe { self.data.as_ptr().add(i) }
    }

    /// First non-full slot on the probe sequence of `hash`.
    ///
    /// # Safety
    ///
    /// The block must be allocated and hold at least one non-full slot.
    #[inline]
    unsafe fn find_insert_slot(&self, hash: u64) -> usize {
        let mask = self.mask();
        let mut i = hash as usize & mask;
        // SAFETY: masked indexes are in bounds.
        while is_full(unsafe { self.ctrl(i) }) {
            i = (i + 1) & mask;
        }
        i
    }

    /// Write a full slot: hash, element and control tag.
    ///
    /// # Safety
    ///
    /// `i` must be in bounds and not full.
    #[inline]
    unsafe fn fill(&mut self, i: usize, hash: u64, value: T) {
        unsafe {
            *self.hashes.as_ptr().add(i) = hash;
            memory::construct_at(self.slot(i), value);
            self.set_ctrl(i, tag(hash));
        }
    }
}

/// Position at which an absent element can be inserted.
///
/// Returned by [`RawTable::find_or_find_insert_slot()`] and consumed by
/// [`RawTable::insert_in_slot()`]. It stays valid as long as the table is not
/// modified in between.
#[derive(Clone, Copy, Debug)]
pub struct InsertSlot {
    index: usize,
}

/// Open-addressing hash table over `T` with linear probing.
pub struct RawTable<T, A: Allocator = Global> {
    block: Block<T>,
    len: usize,
    growth_left: usize,
    alloc: A,
    marker: PhantomData<T>,
}

// SAFETY: the table owns its elements and its block exclusively, like a
// `Vec<T, A>`.
unsafe impl<T: Send, A: Allocator + Send> Send for RawTable<T, A> {}
// SAFETY: shared access only hands out `&T` and `&A`.
unsafe impl<T: Sync, A: Allocator + Sync> Sync for RawTable<T, A> {}

impl<T> RawTable<T, Global> {
    /// Create an empty table. Does not allocate.
    pub const fn new() -> Self {
        Self::new_in(Global)
    }

    /// Create a table that can hold `capacity` elements without growing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_in(capacity, Global)
    }
}

impl<T> Default for RawTable<T, Global> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A: Allocator> RawTable<T, A> {
    pub const fn new_in(alloc: A) -> Self {
        RawTable {
            block: Block::EMPTY,
            len: 0,
            growth_left: 0,
            alloc,
            marker: PhantomData,
        }
    }

    pub fn with_capacity_in(capacity: usize, alloc: A) -> Self {
        let mut table = Self::new_in(alloc);
        table.reserve(capacity);
        table
    }

    /// Number of elements stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots, full or not.
    #[inline]
    pub fn slots(&self) -> usize {
        self.block.slots
    }

    /// Number of elements the current block holds before growing.
    #[inline]
    pub fn capacity(&self) -> usize {
        slots_to_capacity(self.block.slots)
    }

    #[inline]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Index of the element with `hash` for which `eq` holds.
    pub fn find(&self, hash: u64, mut eq: impl FnMut(&T) -> bool) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        let block = &self.block;
        let mask = block.mask();
        let want = tag(hash);
        let mut i = hash as usize & mask;
        loop {
            // SAFETY: masked indexes are in bounds; a matching tag means the
            // slot is full and initialized.
            unsafe {
                let c = block.ctrl(i);
                if c == want && block.hash(i) == hash && eq(&*block.slot(i)) {
                    return Some(i);
                }
                if c == EMPTY {
                    return None;
                }
            }
            i = (i + 1) & mask;
        }
    }

    /// `Ok(index)` of the matching element, or `Err` with the slot the
    /// element would be inserted into: the first tombstone on the probe
    /// sequence, or the `EMPTY` slot that ended it.
    ///
    /// `eq` is only called on full slots. Never grows the table.
    pub fn find_or_find_insert_slot(
        &self,
        hash: u64,
        mut eq: impl FnMut(&T) -> bool,
    ) -> Result<usize, InsertSlot> {
        let block = &self.block;
        if block.slots == 0 {
            return Err(InsertSlot { index: 0 });
        }
        let mask = block.mask();
        let want = tag(hash);
        let mut i = hash as usize & mask;
        let mut first_tombstone = None;
        loop {
            // SAFETY: as in `find`.
            unsafe {
                let c = block.ctrl(i);
                if c == want && block.hash(i) == hash && eq(&*block.slot(i)) {
                    return Ok(i);
                }
                if c == EMPTY {
                    return Err(InsertSlot {
                        index: first_tombstone.unwrap_or(i),
                    });
                }
                if c == DELETED && first_tombstone.is_none() {
                    first_tombstone = Some(i);
                }
            }
            i = (i + 1) & mask;
        }
    }

    /// Insert `value` with `hash` into `slot` and return its index.
    ///
    /// When `slot` is `EMPTY` and the load-factor threshold has been
    /// reached, the table grows first and the element lands on its probe
    /// sequence in the new block. Reusing a tombstone never grows.
    pub fn insert_in_slot(&mut self, hash: u64, slot: InsertSlot, value: T) -> usize {
        let mut index = slot.index;
        // SAFETY: a non-zero block makes `index` in bounds.
        if self.growth_left == 0
            && (self.block.slots == 0 || unsafe { self.block.ctrl(index) } == EMPTY)
        {
            self.reserve(1);
            // SAFETY: `reserve(1)` left a non-full slot.
            index = unsafe { self.block.find_insert_slot(hash) };
        }
        assert!(index < self.block.slots, "insert slot out of bounds");
        // SAFETY: checked in bounds above.
        let c = unsafe { self.block.ctrl(index) };
        assert!(!is_full(c), "insert slot is occupied");
        if c == EMPTY {
            self.growth_left -= 1;
        }
        // SAFETY: `index` is in bounds and not full.
        unsafe { self.block.fill(index, hash, value) };
        self.len += 1;
        index
    }

    /// Insert an element known to be absent.
    pub fn insert_unique(&mut self, hash: u64, value: T) -> usize {
        if self.growth_left == 0 {
            self.reserve(1);
        }
        // SAFETY: the block is allocated and `growth_left > 0` guarantees a
        // non-full slot.
        let index = unsafe { self.block.find_insert_slot(hash) };
        self.insert_in_slot(hash, InsertSlot { index }, value)
    }

    pub fn get(&self, hash: u64, eq: impl FnMut(&T) -> bool) -> Option<&T> {
        let i = self.find(hash, eq)?;
        // SAFETY: `find` returns full slots.
        Some(unsafe { &*self.block.slot(i) })
    }

    /// Element at `index`, if that slot is full.
    pub fn get_at(&self, index: usize) -> Option<&T> {
        if index < self.block.slots && is_full(unsafe { self.block.ctrl(index) }) {
            // SAFETY: full slots are initialized.
            Some(unsafe { &*self.block.slot(index) })
        } else {
            None
        }
    }

    pub fn get_at_mut(&mut self, index: usize) -> Option<&mut T> {
        if index < self.block.slots && is_full(unsafe { self.block.ctrl(index) }) {
            // SAFETY: full slots are initialized.
            Some(unsafe { &mut *self.block.slot(index) })
        } else {
            None
        }
    }

    /// Mark full slot `i` vacant and update the bookkeeping.
    ///
    /// # Safety
    ///
    /// `i` must be a full slot.
    unsafe fn set_vacant(&mut self, i: usize) {
        let next = (i + 1) & self.block.mask();
        // SAFETY: both indexes are in bounds.
        unsafe {
            if self.block.ctrl(next) == EMPTY {
                self.block.set_ctrl(i, EMPTY);
                self.growth_left += 1;
            } else {
                self.block.set_ctrl(i, DELETED);
            }
        }
        self.len -= 1;
    }

    /// Move the element at `index` out of the table.
    pub fn remove_at(&mut self, index: usize) -> Option<T> {
        self.get_at(index)?;
        // SAFETY: `index` is full; it is vacated before the value is read so
        // it is never observed again.
        unsafe {
            self.set_vacant(index);
            Some(memory::take_at(self.block.slot(index)))
        }
    }

    /// Drop the element at `index` in place. Returns whether it was full.
    pub fn erase_at(&mut self, index: usize) -> bool {
        if self.get_at(index).is_none() {
            return false;
        }
        // SAFETY: as in `remove_at`.
        unsafe {
            self.set_vacant(index);
            memory::destruct_at(self.block.slot(index));
        }
        true
    }

    pub fn remove_entry(&mut self, hash: u64, eq: impl FnMut(&T) -> bool) -> Option<T> {
        let i = self.find(hash, eq)?;
        self.remove_at(i)
    }

    pub fn erase_entry(&mut self, hash: u64, eq: impl FnMut(&T) -> bool) -> bool {
        match self.find(hash, eq) {
            Some(i) => self.erase_at(i),
            None => false,
        }
    }

    /// Drop every element and keep the block.
    pub fn clear(&mut self) {
        let slots = self.block.slots;
        if slots == 0 {
            return;
        }
        let data = self.block.data.as_ptr();
        let ctrl = self.block.ctrl.as_ptr();
        let len = &mut self.len;
        // SAFETY: each full slot is vacated before its element is dropped,
        // so a panicking destructor leaves the table consistent.
        unsafe {
            memory::destruct_range(data, slots, |i| {
                if is_full(*ctrl.add(i)) {
                    *ctrl.add(i) = DELETED;
                    *len -= 1;
                    true
                } else {
                    false
                }
            });
            ptr::write_bytes(ctrl, EMPTY, slots);
        }
        self.len = 0;
        self.growth_left = slots_to_capacity(slots);
    }

    /// Drop every element and release the block.
    pub fn clear_shrink(&mut self) {
        self.clear();
        if self.block.slots != 0 {
            tracing::trace!(slots = self.block.slots, "releasing table block");
            // SAFETY: the block is empty and replaced right after.
            unsafe { self.block.free(&self.alloc) };
            self.block = Block::EMPTY;
            self.growth_left = 0;
        }
    }

    /// Make sure the next `additional` inserts do not grow the table.
    ///
    /// Does nothing when `additional` inserts already fit. When tombstones
    /// stand in the way but the block is large enough, they are purged in
    /// place without allocating.
    pub fn reserve(&mut self, additional: usize) {
        if additional > self.growth_left {
            if let Err(e) = self.reserve_rehash(additional, Fallibility::Infallible) {
                unreachable!("infallible reservation failed: {e}");
            }
        }
    }

    /// Fallible `reserve`: reports overflow and allocation failure instead of
    /// aborting.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        if additional > self.growth_left {
            self.reserve_rehash(additional, Fallibility::Fallible)
                .inspect_err(|e| tracing::debug!(additional, len = self.len, "{e}"))
        } else {
            Ok(())
        }
    }

    #[cold]
    #[inline(never)]
    fn reserve_rehash(
        &mut self,
        additional: usize,
        fallibility: Fallibility,
    ) -> Result<(), TryReserveError> {
        let items = self
            .len
            .checked_add(additional)
            .ok_or_else(|| fallibility.capacity_overflow())?;
        let wanted = capacity_to_slots(items).ok_or_else(|| fallibility.capacity_overflow())?;
        let slots = self.block.slots;
        if wanted <= slots {
            // The block is large enough; only tombstones are in the way.
            self.rehash_in_place();
            return Ok(());
        }
        self.resize(wanted.max(slots.saturating_mul(2)), fallibility)
    }

    /// Purge tombstones within the current block. Every element moves to the
    /// first non-full slot of its probe sequence; nothing is allocated.
    fn rehash_in_place(&mut self) {
        let block = &mut self.block;
        let slots = block.slots;
        tracing::trace!(slots, len = self.len, "purging tombstones in place");
        // SAFETY: indexes are in bounds. Pending elements are marked
        // `DELETED`, so `find_insert_slot` may return their slot; such an
        // element is swapped into the current slot and placed next. Slots
        // marked full are never touched again.
        unsafe {
            for i in 0..slots {
                let c = block.ctrl(i);
                block.set_ctrl(i, if is_full(c) { DELETED } else { EMPTY });
            }
            for i in 0..slots {
                if block.ctrl(i) != DELETED {
                    continue;
                }
                loop {
                    let hash = block.hash(i);
                    let j = block.find_insert_slot(hash);
                    if j == i {
                        block.set_ctrl(i, tag(hash));
                        break;
                    }
                    if block.ctrl(j) == EMPTY {
                        *block.hashes.as_ptr().add(j) = hash;
                        memory::relocate(block.slot(i), block.slot(j));
                        block.set_ctrl(j, tag(hash));
                        block.set_ctrl(i, EMPTY);
                        break;
                    }
                    let displaced = block.hash(j);
                    *block.hashes.as_ptr().add(j) = hash;
                    *block.hashes.as_ptr().add(i) = displaced;
                    ptr::swap_nonoverlapping(block.slot(i), block.slot(j), 1);
                    block.set_ctrl(j, tag(hash));
                }
            }
        }
        self.growth_left = slots_to_capacity(slots) - self.len;
    }

    /// Move every element into a fresh block of `new_slots` slots.
    fn resize(
        &mut self,
        new_slots: usize,
        fallibility: Fallibility,
    ) -> Result<(), TryReserveError> {
        debug_assert!(slots_to_capacity(new_slots) >= self.len);
        let mut new = Block::allocate(&self.alloc, new_slots, fallibility)?;
        tracing::trace!(
            old_slots = self.block.slots,
            new_slots,
            len = self.len,
            "rehashing table"
        );
        let old = &self.block;
        for i in RawIter::new(old, self.len) {
            // SAFETY: `i` is full in `old`; `new` has room for every element
            // and each one is moved exactly once.
            unsafe {
                let hash = old.hash(i);
                let j = new.find_insert_slot(hash);
                *new.hashes.as_ptr().add(j) = hash;
                memory::relocate(old.slot(i), new.slot(j));
                new.set_ctrl(j, tag(hash));
            }
        }
        let old = core::mem::replace(&mut self.block, new);
        // SAFETY: every element has been moved out of `old`.
        unsafe { old.free(&self.alloc) };
        self.growth_left = slots_to_capacity(new_slots) - self.len;
        Ok(())
    }

    /// Keep only the elements for which `keep` returns `true`.
    pub fn retain(&mut self, mut keep: impl FnMut(&mut T) -> bool) {
        for i in RawIter::new(&self.block, self.len) {
            // SAFETY: `i` is full; erasing does not move other elements.
            unsafe {
                if !keep(&mut *self.block.slot(i)) {
                    self.erase_at(i);
                }
            }
        }
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            raw: RawIter::new(&self.block, self.len),
            data: self.block.data,
            marker: PhantomData,
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut {
            raw: RawIter::new(&self.block, self.len),
            data: self.block.data,
            marker: PhantomData,
        }
    }

    /// Move every element out; the table keeps its block.
    pub fn drain(&mut self) -> Drain<'_, T, A> {
        Drain {
            raw: RawIter::new(&self.block, self.len),
            table: self,
        }
    }

    /// Duplicate the table with bulk copies of the whole block.
    pub fn clone_bitwise(&self) -> Self
    where
        T: Copy,
        A: Clone,
    {
        let mut new = Self::new_in(self.alloc.clone());
        let slots = self.block.slots;
        if slots == 0 {
            return new;
        }
        match Block::allocate(&new.alloc, slots, Fallibility::Infallible) {
            Ok(block) => new.block = block,
            Err(e) => unreachable!("infallible allocation failed: {e}"),
        }
        // SAFETY: both blocks have `slots` slots in every region.
        unsafe {
            memory::copy_range_bitwise(self.block.ctrl.as_ptr(), new.block.ctrl.as_ptr(), slots);
            memory::copy_range_bitwise(
                self.block.hashes.as_ptr(),
                new.block.hashes.as_ptr(),
                slots,
            );
            memory::copy_range_bitwise(self.block.data.as_ptr(), new.block.data.as_ptr(), slots);
        }
        new.len = self.len;
        new.growth_left = self.growth_left;
        new
    }
}

impl<T: Clone, A: Allocator + Clone> Clone for RawTable<T, A> {
    /// Same slot count and the same control bytes, tombstones included; each
    /// element cloned exactly once into the same slot.
    /// If a `clone` panics, the partial copy drops what it holds.
    fn clone(&self) -> Self {
        let mut new = Self::new_in(self.alloc.clone());
        let slots = self.block.slots;
        if slots == 0 {
            return new;
        }
        match Block::allocate(&new.alloc, slots, Fallibility::Infallible) {
            Ok(block) => new.block = block,
            Err(e) => unreachable!("infallible allocation failed: {e}"),
        }
        // Full slots start out as tombstones and get their tag once the
        // element is in place, so probe chains match the source throughout.
        for i in 0..slots {
            // SAFETY: `i` is in bounds of both blocks.
            unsafe {
                let c = self.block.ctrl(i);
                new.block.set_ctrl(i, if is_full(c) { DELETED } else { c });
            }
        }
        for i in RawIter::new(&self.block, self.len) {
            // SAFETY: `i` is full in the source and vacant in the copy. The
            // control byte is written only after the clone succeeded.
            unsafe {
                let hash = self.block.hash(i);
                memory::clone_into(self.block.slot(i), new.block.slot(i));
                *new.block.hashes.as_ptr().add(i) = hash;
                new.block.set_ctrl(i, tag(hash));
            }
            new.len += 1;
        }
        new.growth_left = self.growth_left;
        new
    }
}

impl<T, A: Allocator> Drop for RawTable<T, A> {
    fn drop(&mut self) {
        let slots = self.block.slots;
        if slots == 0 {
            return;
        }
        let ctrl = self.block.ctrl.as_ptr();
        // SAFETY: full slots are initialized and dropped once; the block is
        // freed last with the allocator that produced it.
        unsafe {
            memory::destruct_range(self.block.data.as_ptr(), slots, |i| is_full(*ctrl.add(i)));
            self.block.free(&self.alloc);
        }
    }
}

impl<T, A: Allocator> IntoIterator for RawTable<T, A> {
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> IntoIter<T, A> {
        let mut table = core::mem::ManuallyDrop::new(self);
        let block = core::mem::replace(&mut table.block, Block::EMPTY);
        // SAFETY: `table` is never dropped, so the allocator is moved out
        // exactly once.
        let alloc = unsafe { ptr::read(&table.alloc) };
        IntoIter {
            raw: RawIter::new(&block, table.len),
            block,
            alloc,
        }
    }
}

// === Iterators ===============================================================

/// Indexes of the full slots of a block, in slot order.
#[derive(Clone)]
struct RawIter {
    ctrl: *const u8,
    next: usize,
    items: usize,
}

impl RawIter {
    fn new<T>(block: &Block<T>, items: usize) -> Self {
        RawIter {
            ctrl: block.ctrl.as_ptr(),
            next: 0,
            items,
        }
    }
}

impl Iterator for RawIter {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        while self.items != 0 {
            let i = self.next;
            self.next += 1;
            // SAFETY: while `items` full slots remain, they lie at or after
            // `next`, so `i` is in bounds.
            if is_full(unsafe { *self.ctrl.add(i) }) {
                self.items -= 1;
                return Some(i);
            }
        }
        None
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.items, Some(self.items))
    }
}

/// Shared iterator over the elements of a [`RawTable`], in slot order.
pub struct Iter<'a, T> {
    raw: RawIter,
    data: NonNull<T>,
    marker: PhantomData<&'a T>,
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Iter {
            raw: self.raw.clone(),
            data: self.data,
            marker: PhantomData,
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        let i = self.raw.next()?;
        // SAFETY: `i` is a full slot of the borrowed table.
        Some(unsafe { &*self.data.as_ptr().add(i) })
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.raw.size_hint()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

/// Mutable iterator over the elements of a [`RawTable`], in slot order.
pub struct IterMut<'a, T> {
    raw: RawIter,
    data: NonNull<T>,
    marker: PhantomData<&'a mut T>,
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    #[inline]
    fn next(&mut self) -> Option<&'a mut T> {
        let i = self.raw.next()?;
        // SAFETY: `i` is a full slot of the exclusively borrowed table and
        // is yielded once.
        Some(unsafe { &mut *self.data.as_ptr().add(i) })
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.raw.size_hint()
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}
impl<T> FusedIterator for IterMut<'_, T> {}

/// Owning iterator over the elements of a [`RawTable`].
pub struct IntoIter<T, A: Allocator = Global> {
    raw: RawIter,
    block: Block<T>,
    alloc: A,
}

impl<T, A: Allocator> Iterator for IntoIter<T, A> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        let i = self.raw.next()?;
        // SAFETY: `i` is full and the iterator never revisits it.
        Some(unsafe { memory::take_at(self.block.slot(i)) })
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.raw.size_hint()
    }
}

impl<T, A: Allocator> ExactSizeIterator for IntoIter<T, A> {}
impl<T, A: Allocator> FusedIterator for IntoIter<T, A> {}

impl<T, A: Allocator> Drop for IntoIter<T, A> {
    fn drop(&mut self) {
        if !Lifetime::<T>::TRIVIAL_DROP {
            for i in self.raw.by_ref() {
                // SAFETY: remaining full slots still hold their elements.
                unsafe { memory::destruct_at(self.block.slot(i)) };
            }
        }
        // SAFETY: every element has been moved out or dropped.
        unsafe { self.block.free(&self.alloc) };
    }
}

/// Draining iterator over the elements of a [`RawTable`].
///
/// Taken slots are marked as tombstones while iterating; dropping the
/// iterator drops the rest and resets every control byte, so the table is
/// empty afterwards but keeps its block.
pub struct Drain<'a, T, A: Allocator = Global> {
    raw: RawIter,
    table: &'a mut RawTable<T, A>,
}

impl<T, A: Allocator> Iterator for Drain<'_, T, A> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        let i = self.raw.next()?;
        // SAFETY: `i` is full; it becomes a tombstone before the value is
        // read, so the table stays consistent if the drain is leaked.
        unsafe {
            self.table.block.set_ctrl(i, DELETED);
            self.table.len -= 1;
            Some(memory::take_at(self.table.block.slot(i)))
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.raw.size_hint()
    }
}

impl<T, A: Allocator> ExactSizeIterator for Drain<'_, T, A> {}
impl<T, A: Allocator> FusedIterator for Drain<'_, T, A> {}

impl<T, A: Allocator> Drop for Drain<'_, T, A> {
    fn drop(&mut self) {
        for item in self.by_ref() {
            drop(item);
        }
        self.table.clear();
    }
}
