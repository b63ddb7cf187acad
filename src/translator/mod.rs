// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The translator engine (C5): opcode dispatch, effective-address length
//! decoding, PC folding, guest exception injection, and the block-compile
//! loop that ties the host encoder and register allocator together.

pub mod dispatch;
pub mod ea;
pub mod engine;
pub mod except;
pub mod pcfold;

pub use engine::{CompileResult, Terminator, Translator};
