//! Errors reported by the fallible reservation path.

use core::alloc::Layout;

/// Why `try_reserve` could not guarantee the requested capacity.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TryReserveError {
    /// The slot count needed for the request does not fit in `usize`, or the
    /// combined block layout would exceed `isize::MAX` bytes.
    #[error("capacity overflow")]
    CapacityOverflow,

    /// The allocator refused to hand out a block of this layout.
    #[error("memory allocation of {} bytes (align {}) failed", .layout.size(), .layout.align())]
    AllocError {
        /// Layout of the block that could not be allocated.
        layout: Layout,
    },
}
