// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Data-processing (1 source) bit-manipulation ops: count-leading,
//! bit-reverse, byte-reverse. The translator reaches for these when
//! emulating 68k `BFFFO`-style and swap/rotate semantics without an
//! equivalent single host instruction.

use crate::host::operand::Reg;

fn one_source(is64: bool, opcode: u32, rn: Reg, rd: Reg) -> u32 {
    let sf = is64 as u32;
    sf << 31 | 0x5AC0_0000 | opcode << 10 | rn.encode() << 5 | rd.encode()
}

/// `CLZ Rd, Rn`: count leading zero bits.
pub fn clz(is64: bool, rn: Reg, rd: Reg) -> u32 {
    one_source(is64, 0b000100, rn, rd)
}

/// `CLS Rd, Rn`: count leading sign bits (excluding the sign bit itself).
pub fn cls(is64: bool, rn: Reg, rd: Reg) -> u32 {
    one_source(is64, 0b000101, rn, rd)
}

/// `RBIT Rd, Rn`: reverse bit order.
pub fn rbit(is64: bool, rn: Reg, rd: Reg) -> u32 {
    one_source(is64, 0b000000, rn, rd)
}

/// `REV16 Rd, Rn`: reverse bytes within each halfword.
pub fn rev16(is64: bool, rn: Reg, rd: Reg) -> u32 {
    one_source(is64, 0b000001, rn, rd)
}

/// `REV Rd, Rn`: reverse bytes across the whole register (`REV32` on the
/// architectural mnemonic when `is64`, swapping within each 32-bit word of
/// an `X` register, is exposed separately since it shares the opcode with
/// the 32-bit-register `REV` but not its `sf` value).
pub fn rev(is64: bool, rn: Reg, rd: Reg) -> u32 {
    let opcode = if is64 { 0b000011 } else { 0b000010 };
    one_source(is64, opcode, rn, rd)
}

/// `REV32 Xd, Xn`: reverse bytes within each 32-bit word of a 64-bit
/// register.
pub fn rev32(rn: Reg, rd: Reg) -> u32 {
    one_source(true, 0b000010, rn, rd)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clz_matches_known_encoding() {
        assert_eq!(clz(false, Reg(1), Reg(0)), 0x5AC0_1020);
    }

    #[test]
    fn rbit_matches_known_encoding() {
        assert_eq!(rbit(false, Reg(1), Reg(0)), 0x5AC0_0020);
    }

    #[test]
    fn rev_and_rev32_differ_in_opcode_not_sf() {
        let rev32_word = rev32(Reg(1), Reg(0));
        let rev64 = rev(true, Reg(1), Reg(0));
        assert_ne!(rev32_word, rev64);
        assert_eq!(rev32_word >> 31, 1);
    }
}
