// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Register allocation support: the per-class bitmap pool (C2), the
//! arena-indexed handle (C3), and the LRU list that backs the engine's
//! spill policy.

pub mod handle;
pub mod lru;
pub mod pool;

pub use handle::{Handle, HandleSlot, Role};
pub use lru::Lru;
pub use pool::RegisterPool;
