// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Guest status/condition register and the 16 integer condition codes.

use crate::utils::bits;

/// Guest 68k-family status register.
///
/// Bit layout (matches the wire format pushed on exception entry, see
/// [`crate::translator::except`]): `T1 T0 S M - I2 I1 I0 - - - X N Z V C`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatusRegister {
    /// Trace bit 1 (trace on any instruction, 68020+).
    pub t1: bool,
    /// Trace bit 0 (trace on change of flow, 68020+).
    pub t0: bool,
    /// Supervisor bit.
    pub s: bool,
    /// Master-state bit: selects the master stack over the interrupt stack
    /// when `s` is also set (68020+ three-stack-pointer model).
    pub m: bool,
    /// Interrupt priority level, bits 8-10.
    pub interrupt_mask: u8,
    /// Extend.
    pub x: bool,
    /// Negate.
    pub n: bool,
    /// Zero.
    pub z: bool,
    /// Overflow.
    pub v: bool,
    /// Carry.
    pub c: bool,
}

impl StatusRegister {
    /// Mask covering the condition-code bits the emitter must preserve when
    /// an opcode writes only a subset of C/V/Z/N/X.
    pub const CCR_MASK: u16 = 0x001F;

    const fn t(&self) -> bool { true }
    const fn f(&self) -> bool { false }
    const fn hi(&self) -> bool { !self.c && !self.z }
    const fn ls(&self) -> bool { self.c || self.z }
    const fn cc(&self) -> bool { !self.c }
    const fn cs(&self) -> bool { self.c }
    const fn ne(&self) -> bool { !self.z }
    const fn eq(&self) -> bool { self.z }
    const fn vc(&self) -> bool { !self.v }
    const fn vs(&self) -> bool { self.v }
    const fn pl(&self) -> bool { !self.n }
    const fn mi(&self) -> bool { self.n }
    const fn ge(&self) -> bool { self.n == self.v }
    const fn lt(&self) -> bool { self.n != self.v }
    const fn gt(&self) -> bool { !self.z && self.n == self.v }
    const fn le(&self) -> bool { self.z || self.n != self.v }

    const CONDITIONS: [fn(&Self) -> bool; 16] = [
        Self::t, Self::f, Self::hi, Self::ls, Self::cc, Self::cs, Self::ne, Self::eq,
        Self::vc, Self::vs, Self::pl, Self::mi, Self::ge, Self::lt, Self::gt, Self::le,
    ];

    /// Evaluates the two-letter guest condition code `cc` (0..=15) against
    /// the current flags. Used by the model interpreter and by tests that
    /// check a translated `Bcc` against the reference semantics.
    pub fn condition(&self, cc: u8) -> bool {
        Self::CONDITIONS[cc as usize](self)
    }

    /// Sets the low byte (CCR: X N Z V C).
    pub fn set_ccr(&mut self, ccr: u8) {
        self.x = bits(ccr as u16, 4, 4) != 0;
        self.n = bits(ccr as u16, 3, 3) != 0;
        self.z = bits(ccr as u16, 2, 2) != 0;
        self.v = bits(ccr as u16, 1, 1) != 0;
        self.c = bits(ccr as u16, 0, 0) != 0;
    }

    /// Returns the low byte (CCR: X N Z V C).
    pub const fn ccr(&self) -> u8 {
        (self.x as u8) << 4 | (self.n as u8) << 3 | (self.z as u8) << 2 | (self.v as u8) << 1 | (self.c as u8)
    }
}

impl From<u16> for StatusRegister {
    fn from(sr: u16) -> Self {
        Self {
            t1: bits(sr, 15, 15) != 0,
            t0: bits(sr, 14, 14) != 0,
            s: bits(sr, 13, 13) != 0,
            m: bits(sr, 12, 12) != 0,
            interrupt_mask: bits(sr, 8, 10) as u8,
            x: bits(sr, 4, 4) != 0,
            n: bits(sr, 3, 3) != 0,
            z: bits(sr, 2, 2) != 0,
            v: bits(sr, 1, 1) != 0,
            c: bits(sr, 0, 0) != 0,
        }
    }
}

impl From<StatusRegister> for u16 {
    fn from(sr: StatusRegister) -> u16 {
        (sr.t1 as u16) << 15
            | (sr.t0 as u16) << 14
            | (sr.s as u16) << 13
            | (sr.m as u16) << 12
            | (sr.interrupt_mask as u16) << 8
            | (sr.x as u16) << 4
            | (sr.n as u16) << 3
            | (sr.z as u16) << 2
            | (sr.v as u16) << 1
            | (sr.c as u16)
    }
}

/// Guest floating-point condition codes (the subset reachable from a host
/// NZCV after an FP compare, see [`crate::host::condition`]). Populated to
/// 32 entries per the ISA's FPcc field even though several slots share the
/// same evaluation, matching what FCMP-derived hardware flags can express.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FpCondition {
    False,
    Eq,
    Ogt,
    Oge,
    Olt,
    Ole,
    Ogl,
    Or,
    Un,
    Ueq,
    Ugt,
    Uge,
    Ult,
    Ule,
    Ne,
    True,
    /// Signalling variants (NaN raises an exception) map to the same
    /// boolean evaluation as their non-signalling counterpart here, since
    /// this core does not model FP exception traps (Non-goal).
    Sf,
    Seq,
    Gt,
    Ge,
    Lt,
    Le,
    Gl,
    Gle,
    Ngle,
    Ngl,
    Nle,
    Nlt,
    Nge,
    Ngt,
    Sne,
    St,
}

impl From<u8> for FpCondition {
    fn from(code: u8) -> Self {
        use FpCondition::*;
        match code & 0x1F {
            0x00 => False, 0x01 => Eq, 0x02 => Ogt, 0x03 => Oge,
            0x04 => Olt, 0x05 => Ole, 0x06 => Ogl, 0x07 => Or,
            0x08 => Un, 0x09 => Ueq, 0x0A => Ugt, 0x0B => Uge,
            0x0C => Ult, 0x0D => Ule, 0x0E => Ne, 0x0F => True,
            0x10 => Sf, 0x11 => Seq, 0x12 => Gt, 0x13 => Ge,
            0x14 => Lt, 0x15 => Le, 0x16 => Gl, 0x17 => Gle,
            0x18 => Ngle, 0x19 => Ngl, 0x1A => Nle, 0x1B => Nlt,
            0x1C => Nge, 0x1D => Ngt, 0x1E => Sne, _ => St,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ccr_round_trips() {
        let mut sr = StatusRegister::default();
        sr.set_ccr(0b10101);
        assert!(sr.x && !sr.n && sr.z && !sr.v && sr.c);
        assert_eq!(sr.ccr(), 0b10101);
    }

    #[test]
    fn word_round_trips() {
        let sr = StatusRegister { t1: true, t0: false, s: true, m: false, interrupt_mask: 7, x: true, n: false, z: true, v: false, c: true };
        let word: u16 = sr.into();
        assert_eq!(word, 0xA715);
        assert_eq!(StatusRegister::from(word), sr);
    }

    #[test]
    fn conditions_match_68k_semantics() {
        let mut sr = StatusRegister::default();
        sr.z = true;
        assert!(sr.condition(7)); // EQ
        assert!(!sr.condition(6)); // NE
        assert!(sr.condition(0)); // T
        assert!(!sr.condition(1)); // F
    }

    #[test]
    fn fp_condition_decodes_full_table() {
        assert_eq!(FpCondition::from(0x00), FpCondition::False);
        assert_eq!(FpCondition::from(0x1F), FpCondition::St);
        assert_eq!(FpCondition::from(0x3F), FpCondition::St); // high bits ignored
    }
}
