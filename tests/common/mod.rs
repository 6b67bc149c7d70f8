//! Element type that records every clone and drop in shared counters.

#![allow(dead_code)]

use std::cell::Cell;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct Counters {
    pub clones: Cell<usize>,
    pub drops: Cell<usize>,
}

impl Counters {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn clones(&self) -> usize {
        self.clones.get()
    }

    pub fn drops(&self) -> usize {
        self.drops.get()
    }
}

/// Identity is `id`; the counters are shared bookkeeping.
#[derive(Debug)]
pub struct Tracked {
    pub id: u64,
    counters: Rc<Counters>,
}

impl Tracked {
    pub fn new(id: u64, counters: &Rc<Counters>) -> Self {
        Tracked {
            id,
            counters: Rc::clone(counters),
        }
    }
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        self.counters.clones.set(self.counters.clones() + 1);
        Tracked {
            id: self.id,
            counters: Rc::clone(&self.counters),
        }
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.counters.drops.set(self.counters.drops() + 1);
    }
}

impl PartialEq for Tracked {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Tracked {}

impl Hash for Tracked {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::borrow::Borrow<u64> for Tracked {
    fn borrow(&self) -> &u64 {
        &self.id
    }
}
