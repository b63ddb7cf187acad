// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Load/store encodings: scaled and unscaled immediate offset, register
//! offset, load/store pair, and the exclusive-access pair the translator
//! uses when it must touch guest memory atomically (e.g. `CAS`-style guest
//! read-modify-write instructions emulated through LL/SC).

use crate::host::operand::{Extend, Index, LoadStoreAddr, Reg};

/// Size of the memory access, independent of the general-purpose register
/// width it loads into or stores from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessWidth {
    B,
    H,
    W,
    X,
}

impl AccessWidth {
    const fn size(self) -> u32 {
        match self {
            AccessWidth::B => 0b00,
            AccessWidth::H => 0b01,
            AccessWidth::W => 0b10,
            AccessWidth::X => 0b11,
        }
    }

    const fn scale(self) -> u32 {
        match self {
            AccessWidth::B => 0,
            AccessWidth::H => 1,
            AccessWidth::W => 2,
            AccessWidth::X => 3,
        }
    }
}

/// `STR` (store, no sign extension ever applies to stores).
pub fn str(width: AccessWidth, rt: Reg, addr: LoadStoreAddr) -> u32 {
    ldr_str(width, false, None, rt, addr)
}

/// `LDR`, zero-extending into a register the same size as the access.
pub fn ldr(width: AccessWidth, rt: Reg, addr: LoadStoreAddr) -> u32 {
    ldr_str(width, true, None, rt, addr)
}

/// `LDRSB`/`LDRSH`/`LDRSW`: sign-extending load into a register of
/// `target` width, wider than the access itself. Not valid for
/// `AccessWidth::X` (there is nothing wider to sign-extend into).
pub fn ldrs(width: AccessWidth, target_is64: bool, rt: Reg, addr: LoadStoreAddr) -> u32 {
    debug_assert_ne!(width, AccessWidth::X);
    ldr_str(width, true, Some(target_is64), rt, addr)
}

fn ldr_str(width: AccessWidth, is_load: bool, signed_target_is64: Option<bool>, rt: Reg, addr: LoadStoreAddr) -> u32 {
    let opc = match (is_load, signed_target_is64) {
        (false, _) => 0b00,
        (true, None) => 0b01,
        (true, Some(true)) => 0b10,
        (true, Some(false)) => 0b11,
    };

    match addr {
        LoadStoreAddr::ScaledImmediate(rn, imm) => {
            debug_assert!(imm < 1 << 12);
            0x3900_0000 | width.size() << 30 | opc << 22 | (imm as u32) << 10 | rn.encode() << 5 | rt.encode()
        }
        LoadStoreAddr::UnscaledImmediate(rn, simm, index) => {
            debug_assert!((-256..256).contains(&simm));
            let imm9 = (simm as u32) & 0x1FF;
            let op2 = match index {
                Index::None => 0b00,
                Index::PostIndex => 0b01,
                Index::PreIndex => 0b11,
            };
            0x3800_0000 | width.size() << 30 | opc << 22 | imm9 << 12 | op2 << 10 | rn.encode() << 5 | rt.encode()
        }
        LoadStoreAddr::RegisterOffset(rn, rm, extend, shift) => {
            let option = extend.encode();
            let s = shift as u32;
            0x3820_0800 | width.size() << 30 | opc << 22 | rm.encode() << 16 | option << 13 | s << 12 | rn.encode() << 5 | rt.encode()
        }
    }
}

/// Index mode for [`ldp`]/[`stp`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PairIndex {
    Offset,
    PreIndex,
    PostIndex,
}

impl PairIndex {
    const fn encode(self) -> u32 {
        match self {
            PairIndex::PostIndex => 0b01,
            PairIndex::Offset => 0b10,
            PairIndex::PreIndex => 0b11,
        }
    }
}

/// `LDP`/`STP Xt1, Xt2, [Xn, #imm]{!}`. `is64` selects `X`/`W` register
/// pairs. `imm7` is the *element* offset (already divided by the access
/// size), matching the architectural field.
pub fn ldp_stp(is_load: bool, is64: bool, index: PairIndex, rt1: Reg, rt2: Reg, rn: Reg, imm7: i8) -> u32 {
    let opc = if is64 { 0b10 } else { 0b00 };
    let l = is_load as u32;
    let imm7 = (imm7 as u32) & 0x7F;
    opc << 30 | 0b101 << 27 | index.encode() << 23 | l << 22 | imm7 << 15 | rt2.encode() << 10 | rn.encode() << 5 | rt1.encode()
}

/// `LDXR Xt, [Xn]`: load-exclusive, no pair, no ordering semantics beyond
/// the architectural exclusive-monitor side effect.
pub fn ldxr(is64: bool, rt: Reg, rn: Reg) -> u32 {
    let size = if is64 { 0b11 } else { 0b10 };
    size << 30 | 0b001000 << 24 | 1 << 22 | 0x1F << 16 | 0x1F << 10 | rn.encode() << 5 | rt.encode()
}

/// `STXR Ws, Xt, [Xn]`: store-exclusive; `rs` receives the status (0 on
/// success, 1 on failure).
pub fn stxr(is64: bool, rs: Reg, rt: Reg, rn: Reg) -> u32 {
    let size = if is64 { 0b11 } else { 0b10 };
    size << 30 | 0b001000 << 24 | rs.encode() << 16 | 0x1F << 10 | rn.encode() << 5 | rt.encode()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn str_x_scaled_immediate_matches_known_encoding() {
        // STR X0, [X1]
        assert_eq!(str(AccessWidth::X, Reg(0), LoadStoreAddr::ScaledImmediate(Reg(1), 0)), 0xF900_0020);
    }

    #[test]
    fn ldr_x_scaled_immediate_sets_opc_bit() {
        assert_eq!(ldr(AccessWidth::X, Reg(0), LoadStoreAddr::ScaledImmediate(Reg(1), 0)), 0xF940_0020);
    }

    #[test]
    fn stp_pre_index_matches_known_encoding() {
        // STP X29, X30, [SP, #-16]!
        assert_eq!(ldp_stp(false, true, PairIndex::PreIndex, Reg(29), Reg(30), Reg::SP, -2), 0xA9BF_7BFD);
    }

    #[test]
    fn ldxr_x0_matches_known_encoding() {
        assert_eq!(ldxr(true, Reg(0), Reg(0)), 0xC85F_7C00);
    }
}
