//! Object lifetime primitives used by the table engine.
//!
//! Every construction, destruction, relocation and copy of a stored element
//! goes through this module. The choice between a bulk bitwise operation and
//! a per-element call is made here, once per type:
//! - destruction loops are skipped entirely for types without drop glue;
//! - bulk copies require `T: Copy`, the explicit plain-old-data opt-in;
//! - relocation is always a bitwise move, as for every Rust value.

use core::marker::PhantomData;
use core::ptr;

/// Per-type lifetime classification, computed at compile time.
pub(crate) struct Lifetime<T>(PhantomData<T>);

impl<T> Lifetime<T> {
    /// Dropping a `T` runs no code, so destruction can be skipped.
    pub(crate) const TRIVIAL_DROP: bool = !core::mem::needs_drop::<T>();
}

/// Move `value` into uninitialized storage at `slot`.
///
/// # Safety
///
/// `slot` must be valid for writes and properly aligned. Any previous
/// contents are overwritten without being dropped.
#[inline]
pub(crate) unsafe fn construct_at<T>(slot: *mut T, value: T) {
    // SAFETY: guaranteed by the caller.
    unsafe { ptr::write(slot, value) }
}

/// Drop the initialized value at `slot` in place.
///
/// # Safety
///
/// `slot` must point to an initialized `T` that is not used afterwards.
#[inline]
pub(crate) unsafe fn destruct_at<T>(slot: *mut T) {
    if !Lifetime::<T>::TRIVIAL_DROP {
        // SAFETY: guaranteed by the caller.
        unsafe { ptr::drop_in_place(slot) }
    }
}

/// Drop every initialized slot among `len` slots starting at `base`, as
/// selected by `occupied(index)`. For types without drop glue `occupied` is
/// never called.
///
/// # Safety
///
/// `base..base + len` must be valid, and every index for which `occupied`
/// returns `true` must hold an initialized `T` that is not used afterwards.
pub(crate) unsafe fn destruct_range<T>(
    base: *mut T,
    len: usize,
    mut occupied: impl FnMut(usize) -> bool,
) {
    if Lifetime::<T>::TRIVIAL_DROP {
        return;
    }
    for i in 0..len {
        if occupied(i) {
            // SAFETY: guaranteed by the caller.
            unsafe { ptr::drop_in_place(base.add(i)) }
        }
    }
}

/// Move the value at `src` to `dst`. `src` is left logically uninitialized
/// and must not be dropped.
///
/// # Safety
///
/// `src` must hold an initialized `T`, `dst` must be valid for writes, and
/// the two must not overlap.
#[inline]
pub(crate) unsafe fn relocate<T>(src: *const T, dst: *mut T) {
    // SAFETY: guaranteed by the caller.
    unsafe { ptr::copy_nonoverlapping(src, dst, 1) }
}

/// Move the value out of `slot`. The slot is left logically uninitialized.
///
/// # Safety
///
/// `slot` must hold an initialized `T` that is not used or dropped
/// afterwards.
#[inline]
pub(crate) unsafe fn take_at<T>(slot: *const T) -> T {
    // SAFETY: guaranteed by the caller.
    unsafe { ptr::read(slot) }
}

/// Clone the value at `src` into uninitialized storage at `dst`: exactly one
/// `Clone::clone` call.
///
/// # Safety
///
/// `src` must hold an initialized `T` and `dst` must be valid for writes.
#[inline]
pub(crate) unsafe fn clone_into<T: Clone>(src: *const T, dst: *mut T) {
    // SAFETY: guaranteed by the caller.
    unsafe { ptr::write(dst, (*src).clone()) }
}

/// Copy `count` elements bitwise from `src` to `dst`, without calling any
/// per-element code.
///
/// Restricted to `Copy` types: for them a raw copy is a complete duplicate.
/// The source range may contain uninitialized slots; their bytes are copied
/// as-is and stay uninitialized in the destination.
///
/// # Safety
///
/// Both ranges must be valid for `count` elements and must not overlap.
#[inline]
pub(crate) unsafe fn copy_range_bitwise<T: Copy>(src: *const T, dst: *mut T, count: usize) {
    // SAFETY: guaranteed by the caller.
    unsafe { ptr::copy_nonoverlapping(src, dst, count) }
}
