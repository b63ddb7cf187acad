// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Branch encodings: direct and register-indirect, with/without link,
//! conditional, compare-and-branch, test-and-branch.

use crate::host::condition::Cond;
use crate::host::operand::Reg;

/// `B <label>`: unconditional direct branch. `offset_bytes` is the
/// byte displacement from this instruction to the target, must be
/// 4-aligned and fit in a signed 28-bit range (±128 MiB).
pub fn b(offset_bytes: i32) -> u32 {
    debug_assert_eq!(offset_bytes % 4, 0);
    let imm26 = encode_imm26(offset_bytes);
    0x1400_0000 | imm26
}

/// `BL <label>`: direct branch with link (return address in X30).
pub fn bl(offset_bytes: i32) -> u32 {
    debug_assert_eq!(offset_bytes % 4, 0);
    let imm26 = encode_imm26(offset_bytes);
    0x9400_0000 | imm26
}

fn encode_imm26(offset_bytes: i32) -> u32 {
    let imm26 = offset_bytes >> 2;
    debug_assert!((-(1 << 25)..(1 << 25)).contains(&imm26), "branch target out of ±128MiB range");
    (imm26 as u32) & 0x03FF_FFFF
}

/// `BR Xn`: branch to register, no link.
pub fn br(rn: Reg) -> u32 {
    0xD61F_0000 | rn.encode() << 5
}

/// `BLR Xn`: branch to register with link.
pub fn blr(rn: Reg) -> u32 {
    0xD63F_0000 | rn.encode() << 5
}

/// `RET {Xn}`: return, defaults to X30 when `rn` is `None`.
pub fn ret(rn: Option<Reg>) -> u32 {
    let rn = rn.unwrap_or(Reg(30));
    0xD65F_0000 | rn.encode() << 5
}

/// `B.cond <label>`: conditional branch, ±1MiB range (imm19).
pub fn b_cond(cond: Cond, offset_bytes: i32) -> u32 {
    debug_assert_eq!(offset_bytes % 4, 0);
    let imm19 = encode_imm19(offset_bytes);
    0x5400_0000 | imm19 << 5 | cond.encode()
}

fn encode_imm19(offset_bytes: i32) -> u32 {
    let imm19 = offset_bytes >> 2;
    debug_assert!((-(1 << 18)..(1 << 18)).contains(&imm19), "conditional branch target out of ±1MiB range");
    (imm19 as u32) & 0x7_FFFF
}

/// `CBZ`/`CBNZ Rt, <label>`: compare-and-branch on (non-)zero.
/// `is64` selects the 64-bit (`X`) register form.
pub fn cbz_cbnz(is64: bool, taken_if_nonzero: bool, rt: Reg, offset_bytes: i32) -> u32 {
    let sf = is64 as u32;
    let op = taken_if_nonzero as u32;
    let imm19 = encode_imm19(offset_bytes);
    sf << 31 | 0b011010 << 25 | op << 24 | imm19 << 5 | rt.encode()
}

/// `TBZ`/`TBNZ Rt, #bit, <label>`: test-and-branch on a single bit.
/// `bit` is 0..=63 (bit 0..=31 only valid when the register is used in `W`
/// form, but the encoding itself accepts the full range since `b5` folds
/// into the opcode regardless of operand width).
pub fn tbz_tbnz(taken_if_set: bool, bit: u8, rt: Reg, offset_bytes: i32) -> u32 {
    debug_assert!(bit < 64);
    let b5 = (bit >> 5) as u32 & 1;
    let b40 = (bit & 0x1F) as u32;
    let op = taken_if_set as u32;
    let imm14 = offset_bytes >> 2;
    debug_assert!((-(1 << 13)..(1 << 13)).contains(&imm14), "test-and-branch target out of ±32KiB range");
    let imm14 = (imm14 as u32) & 0x3FFF;
    b5 << 31 | 0b0110110 << 24 | op << 24 | b40 << 19 | imm14 << 5 | rt.encode()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn b_encodes_forward_offset() {
        assert_eq!(b(0), 0x1400_0000);
        assert_eq!(b(8), 0x1400_0002);
    }

    #[test]
    fn bl_sets_link_bit() {
        assert_eq!(bl(0), 0x9400_0000);
    }

    #[test]
    fn ret_defaults_to_x30() {
        assert_eq!(ret(None), 0xD65F_03C0);
        assert_eq!(ret(Some(Reg(30))), ret(None));
    }

    #[test]
    fn b_cond_places_cond_in_low_nibble() {
        let word = b_cond(Cond::Eq, 0);
        assert_eq!(word & 0xF, Cond::Eq.encode());
        let word = b_cond(Cond::Ne, 0);
        assert_eq!(word & 0xF, Cond::Ne.encode());
    }

    #[test]
    fn cbnz_sets_op_bit() {
        let cbz = cbz_cbnz(true, false, Reg(0), 0);
        let cbnz = cbz_cbnz(true, true, Reg(0), 0);
        assert_eq!(cbnz, cbz | 1 << 24);
    }
}
