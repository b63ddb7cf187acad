// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integer data-processing: add/subtract and logical, both the
//! shifted-register and immediate forms, plus the compare/negate/move
//! aliases built from them.

use crate::host::enc::logical_imm::encode_bitmask;
use crate::host::operand::{Flags, Reg, Shift};

/// `ADD`/`SUB (immediate) {S}`. `imm12` is the unshifted 12-bit immediate;
/// `shift_left_12` selects the `LSL #12` variant for immediates that need
/// the extra range.
pub fn add_sub_imm(is_sub: bool, flags: Flags, is64: bool, shift_left_12: bool, imm12: u16, rn: Reg, rd: Reg) -> u32 {
    debug_assert!(imm12 < 1 << 12);
    let sf = is64 as u32;
    let op = is_sub as u32;
    let sh = shift_left_12 as u32;
    sf << 31 | op << 30 | flags.s() << 29 | 0x1100_0000 | sh << 22 | (imm12 as u32) << 10 | rn.encode() << 5 | rd.encode()
}

/// `ADD`/`SUB (shifted register) {S}`.
pub fn add_sub_reg(is_sub: bool, flags: Flags, is64: bool, shift: Shift, amount: u32, rn: Reg, rm: Reg, rd: Reg) -> u32 {
    debug_assert!(shift != Shift::Ror, "ADD/SUB (shifted register) has no ROR form");
    let sf = is64 as u32;
    let op = is_sub as u32;
    sf << 31 | op << 30 | flags.s() << 29 | 0x0B00_0000 | shift.encode() << 22 | rm.encode() << 16 | amount << 10 | rn.encode() << 5 | rd.encode()
}

/// `CMP Rn, #imm` (alias of `SUBS` with a discarded destination).
pub fn cmp_imm(is64: bool, imm12: u16, rn: Reg) -> u32 {
    add_sub_imm(true, Flags::Set, is64, false, imm12, rn, Reg::ZR)
}

/// `CMP Rn, Rm {, shift #amount}` (alias of `SUBS`).
pub fn cmp_reg(is64: bool, shift: Shift, amount: u32, rn: Reg, rm: Reg) -> u32 {
    add_sub_reg(true, Flags::Set, is64, shift, amount, rn, rm, Reg::ZR)
}

/// `CMN Rn, #imm` (alias of `ADDS`).
pub fn cmn_imm(is64: bool, imm12: u16, rn: Reg) -> u32 {
    add_sub_imm(false, Flags::Set, is64, false, imm12, rn, Reg::ZR)
}

/// `NEG Rd, Rm {, shift #amount}` (alias of `SUB` with `Rn = ZR`).
pub fn neg(flags: Flags, is64: bool, shift: Shift, amount: u32, rm: Reg, rd: Reg) -> u32 {
    add_sub_reg(true, flags, is64, shift, amount, Reg::ZR, rm, rd)
}

/// `ADC`/`SBC {S}` (add/subtract with carry, register form): the guest X
/// flag shadowed in the host carry bit feeds straight in, so a 68k
/// multi-word `ADDX`/`SUBX` chain is one of these per limb rather than an
/// explicit carry-propagation sequence.
fn adc_sbc_raw(is_sub: bool, flags: Flags, is64: bool, rn: Reg, rm: Reg, rd: Reg) -> u32 {
    let sf = is64 as u32;
    let op = is_sub as u32;
    sf << 31 | op << 30 | flags.s() << 29 | 0x1A00_0000 | rm.encode() << 16 | rn.encode() << 5 | rd.encode()
}

/// `ADC Rd, Rn, Rm`.
pub fn adc(is64: bool, rn: Reg, rm: Reg, rd: Reg) -> u32 {
    adc_sbc_raw(false, Flags::Keep, is64, rn, rm, rd)
}

/// `ADCS Rd, Rn, Rm`.
pub fn adcs(is64: bool, rn: Reg, rm: Reg, rd: Reg) -> u32 {
    adc_sbc_raw(false, Flags::Set, is64, rn, rm, rd)
}

/// `SBC Rd, Rn, Rm`.
pub fn sbc(is64: bool, rn: Reg, rm: Reg, rd: Reg) -> u32 {
    adc_sbc_raw(true, Flags::Keep, is64, rn, rm, rd)
}

/// `SBCS Rd, Rn, Rm`.
pub fn sbcs(is64: bool, rn: Reg, rm: Reg, rd: Reg) -> u32 {
    adc_sbc_raw(true, Flags::Set, is64, rn, rm, rd)
}

/// `NGC Rd, Rm` (alias of `SBC Rd, ZR, Rm`).
pub fn ngc(is64: bool, rm: Reg, rd: Reg) -> u32 {
    sbc(is64, Reg::ZR, rm, rd)
}

/// `NGCS Rd, Rm` (alias of `SBCS Rd, ZR, Rm`).
pub fn ngcs(is64: bool, rm: Reg, rd: Reg) -> u32 {
    sbcs(is64, Reg::ZR, rm, rd)
}

/// One of the four logical opcodes shared by the immediate and
/// shifted-register logical encodings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LogicalOp {
    And,
    Orr,
    Eor,
    Ands,
}

impl LogicalOp {
    const fn opc(self) -> u32 {
        match self {
            LogicalOp::And => 0b00,
            LogicalOp::Orr => 0b01,
            LogicalOp::Eor => 0b10,
            LogicalOp::Ands => 0b11,
        }
    }
}

fn logical_imm_raw(op: LogicalOp, is64: bool, value: u64, rn: Reg, rd: Reg) -> Option<u32> {
    let size = if is64 { 64 } else { 32 };
    let (n, immr, imms) = encode_bitmask(value, size)?;
    let sf = is64 as u32;
    Some(sf << 31 | op.opc() << 29 | 0x1200_0000 | n << 22 | immr << 16 | imms << 10 | rn.encode() << 5 | rd.encode())
}

/// `AND Rd, Rn, #bitmask`. Returns `None` if `value` is not representable
/// as a logical immediate (all-zero, all-one, or not a rotated run).
pub fn and_imm(is64: bool, value: u64, rn: Reg, rd: Reg) -> Option<u32> {
    logical_imm_raw(LogicalOp::And, is64, value, rn, rd)
}

/// `ORR Rd, Rn, #bitmask`.
pub fn orr_imm(is64: bool, value: u64, rn: Reg, rd: Reg) -> Option<u32> {
    logical_imm_raw(LogicalOp::Orr, is64, value, rn, rd)
}

/// `EOR Rd, Rn, #bitmask`.
pub fn eor_imm(is64: bool, value: u64, rn: Reg, rd: Reg) -> Option<u32> {
    logical_imm_raw(LogicalOp::Eor, is64, value, rn, rd)
}

/// `ANDS Rd, Rn, #bitmask` (alias `TST` when `Rd` is `ZR`).
pub fn ands_imm(is64: bool, value: u64, rn: Reg, rd: Reg) -> Option<u32> {
    logical_imm_raw(LogicalOp::Ands, is64, value, rn, rd)
}

/// `TST Rn, #bitmask` (alias of `ANDS` with a discarded destination).
pub fn tst_imm(is64: bool, value: u64, rn: Reg) -> Option<u32> {
    ands_imm(is64, value, rn, Reg::ZR)
}

fn logical_reg_raw(opc: u32, n: u32, is64: bool, shift: Shift, amount: u32, rn: Reg, rm: Reg, rd: Reg) -> u32 {
    let sf = is64 as u32;
    sf << 31 | opc << 29 | 0x0A00_0000 | shift.encode() << 22 | n << 21 | rm.encode() << 16 | amount << 10 | rn.encode() << 5 | rd.encode()
}

/// `AND Rd, Rn, Rm {, shift #amount}`.
pub fn and_reg(is64: bool, shift: Shift, amount: u32, rn: Reg, rm: Reg, rd: Reg) -> u32 {
    logical_reg_raw(0b00, 0, is64, shift, amount, rn, rm, rd)
}

/// `BIC Rd, Rn, Rm {, shift #amount}` (AND with an inverted second operand).
pub fn bic_reg(is64: bool, shift: Shift, amount: u32, rn: Reg, rm: Reg, rd: Reg) -> u32 {
    logical_reg_raw(0b00, 1, is64, shift, amount, rn, rm, rd)
}

/// `ORR Rd, Rn, Rm {, shift #amount}`.
pub fn orr_reg(is64: bool, shift: Shift, amount: u32, rn: Reg, rm: Reg, rd: Reg) -> u32 {
    logical_reg_raw(0b01, 0, is64, shift, amount, rn, rm, rd)
}

/// `MOV Rd, Rm` (alias of `ORR Rd, ZR, Rm`).
pub fn mov_reg(is64: bool, rm: Reg, rd: Reg) -> u32 {
    orr_reg(is64, Shift::Lsl, 0, Reg::ZR, rm, rd)
}

/// `ORN Rd, Rn, Rm {, shift #amount}`.
pub fn orn_reg(is64: bool, shift: Shift, amount: u32, rn: Reg, rm: Reg, rd: Reg) -> u32 {
    logical_reg_raw(0b01, 1, is64, shift, amount, rn, rm, rd)
}

/// `MVN Rd, Rm {, shift #amount}` (alias of `ORN Rd, ZR, Rm`).
pub fn mvn(is64: bool, shift: Shift, amount: u32, rm: Reg, rd: Reg) -> u32 {
    orn_reg(is64, shift, amount, Reg::ZR, rm, rd)
}

/// `EOR Rd, Rn, Rm {, shift #amount}`.
pub fn eor_reg(is64: bool, shift: Shift, amount: u32, rn: Reg, rm: Reg, rd: Reg) -> u32 {
    logical_reg_raw(0b10, 0, is64, shift, amount, rn, rm, rd)
}

/// `ANDS Rd, Rn, Rm {, shift #amount}`.
pub fn ands_reg(is64: bool, shift: Shift, amount: u32, rn: Reg, rm: Reg, rd: Reg) -> u32 {
    logical_reg_raw(0b11, 0, is64, shift, amount, rn, rm, rd)
}

/// `TST Rn, Rm {, shift #amount}` (alias of `ANDS` with a discarded destination).
pub fn tst_reg(is64: bool, shift: Shift, amount: u32, rn: Reg, rm: Reg) -> u32 {
    ands_reg(is64, shift, amount, rn, rm, Reg::ZR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_imm_base_opcode() {
        assert_eq!(add_sub_imm(false, Flags::Keep, true, false, 0, Reg(0), Reg(0)), 0x9100_0000);
    }

    #[test]
    fn cmp_imm_sets_s_and_discards_rd() {
        let word = cmp_imm(true, 5, Reg(1));
        assert_eq!(word & 0x1F, Reg::ZR.encode());
        assert_eq!((word >> 29) & 1, 1);
    }

    #[test]
    fn and_imm_roundtrips_through_bitmask_search() {
        let word = and_imm(true, 0x1F, Reg(0), Reg(1)).unwrap();
        assert_eq!(word >> 29, 0b100);
    }

    #[test]
    fn mov_reg_is_orr_with_zr_source() {
        let word = mov_reg(true, Reg(5), Reg(0));
        assert_eq!((word >> 5) & 0x1F, Reg::ZR.encode());
        assert_eq!((word >> 16) & 0x1F, 5);
    }

    #[test]
    fn adcs_sets_the_s_bit_adc_does_not() {
        assert_eq!((adc(true, Reg(0), Reg(1), Reg(2)) >> 29) & 1, 0);
        assert_eq!((adcs(true, Reg(0), Reg(1), Reg(2)) >> 29) & 1, 1);
    }

    #[test]
    fn ngc_is_sbc_with_zr_source() {
        let word = ngc(true, Reg(5), Reg(0));
        assert_eq!((word >> 5) & 0x1F, Reg::ZR.encode());
        assert_eq!((word >> 16) & 0x1F, 5);
        assert_eq!((word >> 30) & 1, 1); // op = SUB
    }
}
