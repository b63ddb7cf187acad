// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JIT translation core from a 68k-family guest to an AArch64 host.
//!
//! This crate is the translation core of a dynamic binary translator: it
//! turns a window of big-endian 16-bit 68k-family guest opcodes into a
//! block of little-endian 32-bit AArch64 host instructions. It does not
//! boot a machine, map guest memory, or execute anything itself — those
//! are the embedding emulator's job. The crate owns five cooperating
//! pieces:
//!
//! - [`guest`]: the fixed-layout guest CPU state ([`guest::GuestState`]),
//!   its status register and condition codes, and 80-bit extended-precision
//!   load/store emulation.
//! - [`host`]: pure functions encoding single AArch64 host instructions
//!   from typed operands ([`host::enc`]), plus the host condition codes and
//!   the guest→host condition-code mapping ([`host::condition`]).
//! - [`regalloc`]: the per-class bitmap register pool, the arena-indexed
//!   register handle, and the LRU spill list.
//! - [`translator`]: the engine that ties the above together — opcode
//!   dispatch, effective-address length decoding, PC folding, and guest
//!   exception injection — exposing [`translator::Translator::compile`] as
//!   the single entry point external collaborators call.
//! - [`collab`]: the trait contracts the core exchanges with its external
//!   collaborators (the guest instruction stream, the host-code allocator,
//!   cache maintenance).
//!
//! # How to use
//!
//! Construct a [`translator::Translator`] once per host deployment, generic
//! over a [`profile::HostProfile`] describing which host registers are
//! reserved for the runtime, and call [`translator::Translator::compile`]
//! with a slice of guest words:
//!
//! ```
//! use m68k_aarch64_jit::collab::{BumpAllocator, NullCacheMaintenance, SliceGuestReader};
//! use m68k_aarch64_jit::profile::AArch64Generic;
//! use m68k_aarch64_jit::host::operand::Reg;
//! use m68k_aarch64_jit::translator::Translator;
//!
//! let mut translator: Translator<AArch64Generic> =
//!     Translator::new(AArch64Generic, Reg(19), Reg(20), Reg(21));
//! let guest = [0x7001u16]; // MOVEQ #1, D0
//! let reader = SliceGuestReader::new(&guest, 0x1000);
//! let mut code = BumpAllocator::new(4096);
//! let mut bookkeeping = BumpAllocator::new(4096);
//! let cache = NullCacheMaintenance;
//! let result = translator
//!     .compile(&reader, &mut code, &mut bookkeeping, &cache, 0x1000, 1)
//!     .unwrap();
//! assert_eq!(result.guest_words_consumed, 1);
//! ```
//!
//! The caller is responsible for running [`collab::CacheMaintenance::finish_block`]
//! over the emitted block's address range before transferring control into it
//! (see §5 of the design document carried in this repository), and for
//! routing a [`error::CompileError`] back through the slow interpreter path
//! rather than entering a partially emitted block.

pub mod collab;
pub mod error;
pub mod guest;
pub mod host;
pub mod profile;
pub mod regalloc;
pub mod translator;
mod utils;
