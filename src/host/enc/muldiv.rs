// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Multiply, multiply-add, multiply-long and divide: the "data-processing
//! (3 source)" and "data-processing (2 source, divide)" families.

use crate::host::operand::Reg;

fn three_source(is64: bool, op31: u32, o0: u32, rm: Reg, ra: Reg, rn: Reg, rd: Reg) -> u32 {
    let sf = is64 as u32;
    sf << 31 | 0x1B00_0000 | op31 << 21 | rm.encode() << 16 | o0 << 15 | ra.encode() << 10 | rn.encode() << 5 | rd.encode()
}

/// `MADD Rd, Rn, Rm, Ra` (`Rd = Ra + Rn*Rm`).
pub fn madd(is64: bool, rn: Reg, rm: Reg, ra: Reg, rd: Reg) -> u32 {
    three_source(is64, 0b000, 0, rm, ra, rn, rd)
}

/// `MSUB Rd, Rn, Rm, Ra` (`Rd = Ra - Rn*Rm`).
pub fn msub(is64: bool, rn: Reg, rm: Reg, ra: Reg, rd: Reg) -> u32 {
    three_source(is64, 0b000, 1, rm, ra, rn, rd)
}

/// `MUL Rd, Rn, Rm` (alias of `MADD` with `Ra = ZR`).
pub fn mul(is64: bool, rn: Reg, rm: Reg, rd: Reg) -> u32 {
    madd(is64, rn, rm, Reg::ZR, rd)
}

/// `MNEG Rd, Rn, Rm` (alias of `MSUB` with `Ra = ZR`).
pub fn mneg(is64: bool, rn: Reg, rm: Reg, rd: Reg) -> u32 {
    msub(is64, rn, rm, Reg::ZR, rd)
}

/// `SMADDL Xd, Wn, Wm, Xa`: signed 32x32+64 widening multiply-add.
pub fn smaddl(rn: Reg, rm: Reg, ra: Reg, rd: Reg) -> u32 {
    three_source(true, 0b001, 0, rm, ra, rn, rd)
}

/// `SMSUBL Xd, Wn, Wm, Xa`.
pub fn smsubl(rn: Reg, rm: Reg, ra: Reg, rd: Reg) -> u32 {
    three_source(true, 0b001, 1, rm, ra, rn, rd)
}

/// `SMULL Xd, Wn, Wm` (alias of `SMADDL` with `Xa = XZR`).
pub fn smull(rn: Reg, rm: Reg, rd: Reg) -> u32 {
    smaddl(rn, rm, Reg::ZR, rd)
}

/// `UMADDL Xd, Wn, Wm, Xa`: unsigned 32x32+64 widening multiply-add.
pub fn umaddl(rn: Reg, rm: Reg, ra: Reg, rd: Reg) -> u32 {
    three_source(true, 0b101, 0, rm, ra, rn, rd)
}

/// `UMSUBL Xd, Wn, Wm, Xa`.
pub fn umsubl(rn: Reg, rm: Reg, ra: Reg, rd: Reg) -> u32 {
    three_source(true, 0b101, 1, rm, ra, rn, rd)
}

/// `UMULL Xd, Wn, Wm` (alias of `UMADDL` with `Xa = XZR`).
pub fn umull(rn: Reg, rm: Reg, rd: Reg) -> u32 {
    umaddl(rn, rm, Reg::ZR, rd)
}

fn two_source_divide(is64: bool, is_signed: bool, rn: Reg, rm: Reg, rd: Reg) -> u32 {
    let sf = is64 as u32;
    let opcode = if is_signed { 0b000011 } else { 0b000010 };
    sf << 31 | 0x1AC0_0000 | rm.encode() << 16 | opcode << 10 | rn.encode() << 5 | rd.encode()
}

/// `UDIV Rd, Rn, Rm`.
pub fn udiv(is64: bool, rn: Reg, rm: Reg, rd: Reg) -> u32 {
    two_source_divide(is64, false, rn, rm, rd)
}

/// `SDIV Rd, Rn, Rm`.
pub fn sdiv(is64: bool, rn: Reg, rm: Reg, rd: Reg) -> u32 {
    two_source_divide(is64, true, rn, rm, rd)
}
