// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Errors surfaced across the translation-core boundary.
//!
//! Per the error handling policy, most failure kinds are recovered locally
//! (an LRU spill, an injected guest exception) and never reach this type.
//! Only the two fatal-to-the-current-translation kinds are represented here;
//! the caller's only correct response to either is to route the guest PC
//! through the slow interpreter instead of entering the returned block.

use thiserror::Error;

/// Failure of a single call to [`Translator::compile`](crate::translator::Translator::compile).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileError {
    /// The bump allocator backing the host-instruction stream (executable
    /// memory) had no room left for this block.
    #[error("host code arena exhausted after {emitted_bytes} bytes")]
    CodeArenaExhausted {
        /// Bytes already emitted into the stream before the allocator failed.
        emitted_bytes: usize,
    },

    /// The bump allocator backing translator bookkeeping (handle slots, LRU
    /// nodes, the return-address stack) had no room left.
    #[error("bookkeeping arena exhausted")]
    BookkeepingArenaExhausted,
}
