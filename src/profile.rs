// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-host-architecture configuration, mirroring the way the emulated
//! CPU's own details are pulled out into a trait rather than hardcoded
//! into the engine.

/// Low-level details of the host AArch64 implementation the translator
/// targets.
///
/// [`crate::translator::engine::Translator`] is generic over an instance
/// of this trait so the register windows reserved for the runtime, and
/// whether guest register caching is allowed to move between host
/// registers across a block, can vary by deployment without forking the
/// engine.
pub trait HostProfile: Default {
    /// First integer host register index available to the allocator.
    const REG_START: u8;
    /// Last integer host register index available to the allocator
    /// (inclusive). Registers outside `[REG_START, REG_END]` are reserved
    /// for the runtime (link register, frame pointer, stack pointer, the
    /// context and status shadow registers).
    const REG_END: u8;
    /// First FP/SIMD host register index available to the allocator.
    const FPU_REG_START: u8;
    /// Last FP/SIMD host register index available to the allocator
    /// (inclusive).
    const FPU_REG_END: u8;

    /// Whether the engine may spill an LRU-evicted guest `Dn`/`An` and
    /// reuse its host register for a different guest register within the
    /// same block (`true`), or must leave pool exhaustion unresolved and
    /// never reassign a host register once a guest register has claimed
    /// it (`false`). Implementations normally derive this from the
    /// crate's `dynamic-register-mapping` feature, see
    /// [`AArch64Generic::DYNAMIC_REGISTER_MAPPING`].
    const DYNAMIC_REGISTER_MAPPING: bool;
}

/// The default AArch64 host profile: X0-X17 are left to the allocator,
/// X18 (platform register), X19-X28 (callee-saved, reserved for the
/// runtime's own use), X29 (frame pointer), X30 (link register) and SP
/// are all reserved, and all of D0-D31 are available since the
/// translator only ever touches the bottom half of the vector file.
#[derive(Clone, Copy, Debug, Default)]
pub struct AArch64Generic;

impl HostProfile for AArch64Generic {
    const REG_START: u8 = 0;
    const REG_END: u8 = 17;
    const FPU_REG_START: u8 = 0;
    const FPU_REG_END: u8 = 31;
    /// `true` only when the crate is built with the
    /// `dynamic-register-mapping` feature; off by default, matching the
    /// conservative "pin on first use" allocator behaviour.
    const DYNAMIC_REGISTER_MAPPING: bool = cfg!(feature = "dynamic-register-mapping");
}
