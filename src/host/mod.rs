// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The AArch64 host side of the translator: typed operands, condition
//! codes, and the instruction encoder (component C1).

pub mod condition;
pub mod enc;
pub mod operand;

pub use condition::Cond;
pub use operand::{Extend, FReg, Flags, Index, LoadStoreAddr, Reg, Shift, Width};
