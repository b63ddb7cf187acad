// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Register handles: the shared-ownership value binding a host register
//! to a guest role, tracked through an arena owned by the translator
//! rather than a heap-allocated refcount, so the handle itself stays
//! `Copy` (see [`crate::translator::engine::Translator`] for the arena and
//! the clone/drop bookkeeping).

use crate::regalloc::pool::INVALID;

/// The guest-level meaning a handle's host register currently carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Not bound to anything meaningful yet, or a short-lived temporary.
    Scratch,
    /// Guest data register `Dn`, `n` in `0..8`.
    DataRegister(u8),
    /// Guest address register `An`, `n` in `0..8` (7 is the active SP).
    AddressRegister(u8),
    ProgramCounter,
    StatusRegister,
    FpControl,
    FpStatus,
    /// Guest FP register `FPn`, `n` in `0..8`.
    FpRegister(u8),
    ContextPointer,
    /// A compile-time-known constant materialised once and reused.
    TemporaryConstant(u32),
}

/// One arena slot: the host register, its role, and its bookkeeping bits.
#[derive(Clone, Copy, Debug)]
pub struct HandleSlot {
    pub host_index: u8,
    pub role: Role,
    dirty: bool,
    valid: bool,
    pub(crate) refcount: u16,
}

impl HandleSlot {
    pub fn new(host_index: u8, role: Role) -> Self {
        Self {
            host_index,
            role,
            dirty: false,
            valid: host_index != INVALID,
            refcount: 1,
        }
    }

    pub fn invalid(role: Role) -> Self {
        Self {
            host_index: INVALID,
            role,
            dirty: false,
            valid: false,
            refcount: 1,
        }
    }

    /// Marks the host register as holding a value that must be written
    /// back to guest state before it can be released.
    pub fn touch(&mut self) {
        self.dirty = true;
    }

    pub fn dirty(&self) -> bool {
        self.dirty
    }

    pub fn valid(&self) -> bool {
        self.valid
    }

    /// The bound host register index, or [`INVALID`] (logged by the
    /// caller) if the handle never materialised one.
    pub fn value(&self) -> u8 {
        if !self.valid {
            log::warn!("read of invalid register handle (role {:?})", self.role);
        }
        self.host_index
    }
}

/// A `Copy` index into the translator's handle arena. Cloning a `Handle`
/// (via [`crate::translator::engine::Translator::clone_handle`])
/// increments the pointed-at slot's refcount; dropping it (via
/// `drop_handle`) decrements it, and the last drop releases the host
/// register back to its pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Handle(pub(crate) usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_slot_is_not_dirty() {
        let slot = HandleSlot::new(3, Role::DataRegister(0));
        assert!(!slot.dirty());
    }

    #[test]
    fn touch_is_idempotent() {
        let mut slot = HandleSlot::new(3, Role::Scratch);
        slot.touch();
        let after_one = slot.dirty();
        slot.touch();
        assert_eq!(after_one, slot.dirty());
        assert!(slot.dirty());
    }

    #[test]
    fn invalid_slot_reports_invalid() {
        let slot = HandleSlot::invalid(Role::Scratch);
        assert!(!slot.valid());
        assert_eq!(slot.value(), INVALID);
    }
}
