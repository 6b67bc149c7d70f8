//! Allocator seam and an instrumented allocator for lifecycle accounting.
//!
//! Tables are generic over `allocator_api2::alloc::Allocator` and take the
//! allocator by value. Since `&A` is itself an allocator, a caller that
//! wants to observe a table's allocations keeps a `CountingAllocator` on its
//! own stack and hands the table a reference to it.

use allocator_api2::alloc::AllocError;
use core::alloc::Layout;
use core::cell::Cell;
use core::ptr::NonNull;

pub use allocator_api2::alloc::{Allocator, Global};

/// Allocator wrapper that counts every successful allocation and free.
///
/// Counters are plain `Cell`s: the wrapper is meant for single-threaded use
/// and is deliberately `!Sync`. An optional byte limit makes the wrapper
/// refuse allocations that would push the live byte total past it, which is
/// how allocation failure is exercised in tests.
#[derive(Debug, Default)]
pub struct CountingAllocator<A = Global> {
    inner: A,
    allocations: Cell<usize>,
    frees: Cell<usize>,
    bytes: Cell<usize>,
    limit: Option<usize>,
}

impl CountingAllocator<Global> {
    pub fn new() -> Self {
        Self::wrapping(Global)
    }

    /// A counting allocator that refuses to hold more than `limit` live bytes.
    pub fn with_byte_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::new()
        }
    }
}

impl<A> CountingAllocator<A> {
    pub fn wrapping(inner: A) -> Self {
        Self {
            inner,
            allocations: Cell::new(0),
            frees: Cell::new(0),
            bytes: Cell::new(0),
            limit: None,
        }
    }

    /// Number of successful allocations so far.
    pub fn allocation_count(&self) -> usize {
        self.allocations.get()
    }

    /// Number of frees so far.
    pub fn free_count(&self) -> usize {
        self.frees.get()
    }

    /// Allocations not yet returned.
    pub fn live_allocations(&self) -> usize {
        self.allocations.get() - self.frees.get()
    }

    /// Bytes currently handed out.
    pub fn bytes_in_use(&self) -> usize {
        self.bytes.get()
    }
}

// SAFETY: every request is forwarded to `inner` unchanged; the wrapper only
// observes sizes and counts, and refuses requests without touching `inner`.
unsafe impl<A: Allocator> Allocator for CountingAllocator<A> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        if let Some(limit) = self.limit {
            if self.bytes.get().saturating_add(layout.size()) > limit {
                return Err(AllocError);
            }
        }
        let block = self.inner.allocate(layout)?;
        self.allocations.set(self.allocations.get() + 1);
        self.bytes.set(self.bytes.get() + layout.size());
        Ok(block)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        debug_assert!(self.live_allocations() > 0, "free without allocation");
        self.frees.set(self.frees.get() + 1);
        self.bytes.set(self.bytes.get() - layout.size());
        // SAFETY: the caller upholds `deallocate`'s contract for `inner`,
        // which produced `ptr`.
        unsafe { self.inner.deallocate(ptr, layout) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_allocations_and_frees() {
        let a = CountingAllocator::new();
        let layout = Layout::from_size_align(32, 8).unwrap();

        let p = a.allocate(layout).unwrap();
        let q = a.allocate(layout).unwrap();
        assert_eq!(a.allocation_count(), 2);
        assert_eq!(a.bytes_in_use(), 64);

        unsafe {
            a.deallocate(p.cast(), layout);
            a.deallocate(q.cast(), layout);
        }
        assert_eq!(a.free_count(), 2);
        assert_eq!(a.live_allocations(), 0);
        assert_eq!(a.bytes_in_use(), 0);
    }

    #[test]
    fn references_share_counters() {
        let a = CountingAllocator::new();
        let by_ref = &a;
        let layout = Layout::new::<u64>();
        let p = by_ref.allocate(layout).unwrap();
        unsafe { by_ref.deallocate(p.cast(), layout) };
        assert_eq!(a.allocation_count(), 1);
        assert_eq!(a.free_count(), 1);
    }

    #[test]
    fn byte_limit_refuses_without_counting() {
        let a = CountingAllocator::with_byte_limit(16);
        assert!(a.allocate(Layout::from_size_align(32, 8).unwrap()).is_err());
        assert_eq!(a.allocation_count(), 0);

        let layout = Layout::from_size_align(16, 8).unwrap();
        let p = a.allocate(layout).unwrap();
        assert!(a.allocate(Layout::new::<u8>()).is_err());
        unsafe { a.deallocate(p.cast(), layout) };
        assert_eq!(a.live_allocations(), 0);
    }
}
