//! Catches calls back into a table from the user code it is running.
//!
//! While a `HashMap` or `HashSet` method runs a hasher, an equality policy,
//! a `Clone` impl or a retain predicate, the table may be mid-update. A
//! callback that reaches the same table again panics in debug builds.
//! Release builds track nothing.

use core::cell::Cell;
use core::marker::PhantomData;

/// Busy flag embedded in every table.
///
/// `Send` but not `Sync` in both build profiles, so tables have the same
/// auto traits whether or not debug assertions are on.
#[derive(Debug)]
pub(crate) struct DebugReentrancy {
    #[cfg(debug_assertions)]
    busy: Cell<bool>,
    _unsync: PhantomData<Cell<()>>,
}

impl DebugReentrancy {
    pub(crate) const fn new() -> Self {
        DebugReentrancy {
            #[cfg(debug_assertions)]
            busy: Cell::new(false),
            _unsync: PhantomData,
        }
    }

    /// Mark the table busy until the returned token is dropped.
    #[inline]
    #[track_caller]
    pub(crate) fn enter(&self) -> Busy<'_> {
        #[cfg(debug_assertions)]
        assert!(
            !self.busy.replace(true),
            "table accessed from a callback it invoked"
        );
        Busy { flag: self }
    }
}

impl Default for DebugReentrancy {
    fn default() -> Self {
        Self::new()
    }
}

// A copy of a table is never busy.
impl Clone for DebugReentrancy {
    fn clone(&self) -> Self {
        Self::new()
    }
}

/// Token returned by [`DebugReentrancy::enter`]; clears the flag on drop.
pub(crate) struct Busy<'a> {
    #[cfg_attr(not(debug_assertions), allow(dead_code))]
    flag: &'a DebugReentrancy,
}

impl Drop for Busy<'_> {
    #[inline]
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.flag.busy.set(false);
    }
}
