// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pure AArch64 host-instruction encoder functions (component C1).
//!
//! Every function here takes typed operands from [`crate::host::operand`]
//! and [`crate::host::condition`] and returns the 32-bit little-endian
//! instruction word. None of them touch guest state, an allocator, or a
//! register pool — that belongs to [`crate::translator`] and
//! [`crate::regalloc`], which call into this module to do the actual bit
//! packing.

pub mod bitfield;
pub mod bitops;
pub mod branch;
pub mod condsel;
pub mod dataproc;
pub mod fp;
pub mod loadstore;
mod logical_imm;
pub mod movimm;
pub mod muldiv;
pub mod sysreg;

pub use logical_imm::encode_bitmask;
