// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Least-recently-used tracking for register handles.
//!
//! Kept as a linear `Vec` rather than an intrusive doubly-linked list:
//! the live set is bounded by the host register count (on the order of
//! 16 entries), so a linear scan for "move to front" and "find the
//! tail" is cheap enough that the extra bookkeeping of a node-based list
//! would not pay for itself.

use crate::regalloc::handle::Handle;

#[derive(Clone, Debug, Default)]
pub struct Lru {
    /// Front (index 0) is most recently used; the last element is the
    /// next spill victim.
    order: Vec<Handle>,
}

impl Lru {
    pub fn new() -> Self {
        Self { order: Vec::new() }
    }

    /// Moves `handle` to the front, inserting it if not already tracked.
    pub fn touch(&mut self, handle: Handle) {
        self.remove(handle);
        self.order.insert(0, handle);
    }

    /// Removes `handle` from the list if present; a no-op otherwise.
    pub fn remove(&mut self, handle: Handle) {
        self.order.retain(|&h| h != handle);
    }

    /// The least-recently-used handle, if any are tracked.
    pub fn victim(&self) -> Option<Handle> {
        self.order.last().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touch_moves_to_front() {
        let mut lru = Lru::new();
        lru.touch(Handle(1));
        lru.touch(Handle(2));
        lru.touch(Handle(1));
        assert_eq!(lru.victim(), Some(Handle(2)));
    }

    #[test]
    fn remove_drops_the_victim() {
        let mut lru = Lru::new();
        lru.touch(Handle(1));
        lru.touch(Handle(2));
        lru.remove(Handle(2));
        assert_eq!(lru.victim(), Some(Handle(1)));
    }

    #[test]
    fn empty_lru_has_no_victim() {
        let lru = Lru::new();
        assert_eq!(lru.victim(), None);
    }
}
