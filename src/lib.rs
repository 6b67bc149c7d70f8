//! openhash: an allocator-aware open-addressing `HashMap` and `HashSet`
//! with exact, observable lifecycle bookkeeping.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a hash table whose every allocation, construction, copy and
//!   destruction of an element is accounted for, so that tests can assert
//!   exact counts.
//! - Layers:
//!   - `alloc`: the `Allocator` seam (allocator-api2) plus a
//!     `CountingAllocator` that records allocations and frees.
//!   - `memory`: construct, destruct, relocate and copy primitives. The
//!     choice between a bulk bitwise operation and a per-element call is
//!     made there, once per type.
//!   - `raw::RawTable<T, A>`: the hash-agnostic engine. Callers pass a
//!     precomputed `u64` hash and an equality closure.
//!   - `policy`: `KeyHash` and `KeyEq`, the hasher and equality policies a
//!     table owns by value.
//!   - `HashMap` / `HashSet`: public containers that hash keys, run the
//!     equality policy and guard against reentrancy.
//!
//! Constraints
//! - Single-threaded: tables are `Send` when their contents are, never
//!   `Sync`.
//! - One allocation per table, none while empty; `clear_shrink` returns to
//!   the unallocated state.
//! - Unique keys: adding a present key keeps the first entry and reports
//!   `Added::Existing`.
//! - Growth moves elements bitwise: no clones, no drops, no hashing.
//!
//! Reentrancy policy
//! - Public methods that may call user code (`Hash`, `KeyEq`, `Clone`,
//!   `Drop`, retain predicates) enter a debug-only guard first. Calling
//!   back into the same table from such code panics in debug builds.
//!
//! Hasher and rehashing invariants
//! - Each slot stores the full `u64` hash of its element; rehashing reads
//!   the stored hashes and never calls back into the hasher.
//! - Probes compare the stored hash before calling the equality policy.
//!
//! Notes and non-goals
//! - No concurrent access, no persistence.
//! - Handles are plain slot indexes: they are invalidated by growth and by
//!   `clear`/`clear_shrink`, and are not generational.
//! - Capacity only shrinks through `clear_shrink`.

pub mod alloc;
mod error;
mod map;
mod map_proptest;
mod memory;
pub mod policy;
#[cfg(feature = "bench_internal")]
pub mod raw;
#[cfg(not(feature = "bench_internal"))]
mod raw;
mod reentrancy;
mod set;

// Public surface
pub use alloc::CountingAllocator;
pub use error::TryReserveError;
pub use map::{Added, Handle, HashMap};
pub use policy::{AsciiCaseInsensitive, DefaultHashBuilder, KeyEq, KeyHash, StdEq};
pub use set::HashSet;

/// Iterator types of [`HashMap`] and [`HashSet`].
pub mod iter {
    pub use crate::map::{Drain, IntoIter, Iter, IterMut, Keys, Values, ValuesMut};
    pub use crate::set::{
        Drain as SetDrain, IntoIter as SetIntoIter, Iter as SetIter,
    };
}
