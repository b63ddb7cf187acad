// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The guest (68k-family) CPU state model: fixed-layout register file,
//! status register and condition codes, and 80-bit extended-precision
//! load/store emulation.

pub mod fp80;
pub mod state;
pub mod status;

pub use fp80::Float80;
pub use state::GuestState;
pub use status::{FpCondition, StatusRegister};
