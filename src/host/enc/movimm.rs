// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Move-wide-immediate family (`MOVZ`/`MOVN`/`MOVK`) and a sequence builder
//! that picks a short instruction sequence for an arbitrary 32- or 64-bit
//! constant, used whenever the translator needs to materialise a guest
//! literal or an absolute host address that doesn't fit a single
//! data-processing immediate.

use crate::host::operand::Reg;

fn mov_wide(opc: u32, is64: bool, hw: u32, imm16: u16, rd: Reg) -> u32 {
    debug_assert!(hw < 4 && (is64 || hw < 2));
    let sf = is64 as u32;
    sf << 31 | opc << 29 | 0x1280_0000 | hw << 21 | (imm16 as u32) << 5 | rd.encode()
}

/// `MOVZ Rd, #imm16, LSL #(16*hw)`.
pub fn movz(is64: bool, hw: u32, imm16: u16, rd: Reg) -> u32 {
    mov_wide(0b10, is64, hw, imm16, rd)
}

/// `MOVN Rd, #imm16, LSL #(16*hw)` (loads `!(imm16 << (16*hw))`).
pub fn movn(is64: bool, hw: u32, imm16: u16, rd: Reg) -> u32 {
    mov_wide(0b00, is64, hw, imm16, rd)
}

/// `MOVK Rd, #imm16, LSL #(16*hw)` (merges into `Rd`, leaving the other
/// halfwords untouched).
pub fn movk(is64: bool, hw: u32, imm16: u16, rd: Reg) -> u32 {
    mov_wide(0b11, is64, hw, imm16, rd)
}

/// Builds the shortest `MOVZ/MOVN` + `MOVK*` sequence that materialises
/// `value` in `rd`, picking whichever of `MOVZ` or `MOVN` leaves fewer
/// non-trivial halfwords to patch in with `MOVK`.
pub fn mov_immediate(is64: bool, value: u64, rd: Reg) -> Vec<u32> {
    let halfwords = if is64 { 4 } else { 2 };
    let chunk = |i: u32| -> u16 { (value >> (16 * i)) as u16 };

    let zero_count = (0..halfwords).filter(|&i| chunk(i) == 0).count();
    let one_count = (0..halfwords).filter(|&i| chunk(i) == 0xFFFF).count();

    let mut out = Vec::new();
    if one_count > zero_count {
        let first_non_ff = (0..halfwords).find(|&i| chunk(i) != 0xFFFF).unwrap_or(0);
        out.push(movn(is64, first_non_ff, !chunk(first_non_ff), rd));
        for i in 0..halfwords {
            if i != first_non_ff && chunk(i) != 0xFFFF {
                out.push(movk(is64, i, chunk(i), rd));
            }
        }
    } else {
        let first_nonzero = (0..halfwords).find(|&i| chunk(i) != 0).unwrap_or(0);
        out.push(movz(is64, first_nonzero, chunk(first_nonzero), rd));
        for i in 0..halfwords {
            if i != first_nonzero && chunk(i) != 0 {
                out.push(movk(is64, i, chunk(i), rd));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movz_zero_matches_known_encoding() {
        assert_eq!(movz(true, 0, 0, Reg(0)), 0xD280_0000);
    }

    #[test]
    fn mov_immediate_zero_is_a_single_movz() {
        let seq = mov_immediate(true, 0, Reg(0));
        assert_eq!(seq, vec![movz(true, 0, 0, Reg(0))]);
    }

    #[test]
    fn mov_immediate_all_ones_is_a_single_movn() {
        let seq = mov_immediate(true, u64::MAX, Reg(0));
        assert_eq!(seq.len(), 1);
        assert_eq!(seq[0], movn(true, 0, 0, Reg(0)));
    }

    #[test]
    fn mov_immediate_sparse_value_uses_movz_then_movk() {
        let seq = mov_immediate(true, 0x1_0000_0001, Reg(2));
        assert_eq!(seq.len(), 2);
        assert_eq!(seq[0], movz(true, 0, 1, Reg(2)));
        assert_eq!(seq[1], movk(true, 2, 1, Reg(2)));
    }
}
