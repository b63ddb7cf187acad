// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Encoding of AArch64 "logical immediate" bitmasks (the `N:immr:imms`
//! triple used by AND/ORR/EOR/ANDS-immediate and by the bitfield-insert
//! sequences the engine uses to merge NZCV into the guest status shadow,
//! §4.4).
//!
//! Only a handful of distinct masks are ever emitted by the translator (CCR
//! merges, sign/zero-extension masks), so rather than porting the tricky
//! closed-form "find the rotation" encoder, this implements the standard
//! `DecodeBitMasks` pseudocode from the Arm Architecture Reference Manual
//! and finds the encoding by exhaustive search over the 8192-entry
//! `(N, immr, imms)` space. That space is small and this only runs at
//! compile time, not in the emitted code.

fn mask(width: u32) -> u64 {
    if width == 64 { u64::MAX } else { (1u64 << width) - 1 }
}

fn ror(value: u64, amount: u32, width: u32) -> u64 {
    let amount = amount % width;
    if amount == 0 {
        return value & mask(width);
    }
    ((value >> amount) | (value << (width - amount))) & mask(width)
}

fn replicate(elem: u64, esize: u32, size: u32) -> u64 {
    let mut result = 0u64;
    let mut filled = 0;
    while filled < size {
        result |= elem << filled;
        filled += esize;
    }
    result & mask(size)
}

/// `DecodeBitMasks`, immediate-mode only: returns the bit pattern encoded
/// by `(n, imms, immr)` for a `size`-bit register, or `None` if the
/// encoding is reserved.
fn decode_bitmask(n: u32, imms: u32, immr: u32, size: u32) -> Option<u64> {
    let concat = ((n & 1) << 6) | (!imms & 0x3F);
    let len = (0..7).rev().find(|&i| concat & (1 << i) != 0)?;
    if len == 0 {
        return None;
    }
    let esize = 1u32 << len;
    if esize > size {
        return None;
    }
    let levels = (1u32 << len) - 1;
    let s = imms & levels;
    let r = immr & levels;
    if s == levels {
        return None;
    }
    let welem = if s + 1 >= 64 { u64::MAX } else { (1u64 << (s + 1)) - 1 };
    let elem = ror(welem & mask(esize), r, esize);
    Some(replicate(elem, esize, size))
}

/// Finds `(N, immr, imms)` such that `DecodeBitMasks` of that triple equals
/// `value` in a `size`-bit (32 or 64) register, or `None` if `value` is not
/// representable as a logical immediate (all-zero and all-one patterns are
/// never representable, matching the real encoding's restriction that the
/// pattern contain both a 0 and a 1 bit).
pub fn encode_bitmask(value: u64, size: u32) -> Option<(u32, u32, u32)> {
    debug_assert!(size == 32 || size == 64);
    let target = value & mask(size);
    if target == 0 || target == mask(size) {
        return None;
    }

    let n_candidates: &[u32] = if size == 64 { &[1, 0] } else { &[0] };
    for &n in n_candidates {
        for immr in 0..64u32 {
            for imms in 0..64u32 {
                if decode_bitmask(n, imms, immr, size) == Some(target) {
                    return Some((n, immr, imms));
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_low_byte_mask() {
        let (n, immr, imms) = encode_bitmask(0xFF, 32).expect("0xFF is representable");
        assert_eq!(decode_bitmask(n, imms, immr, 32), Some(0xFF));
    }

    #[test]
    fn encodes_replicated_byte_pattern() {
        // 0x01010101 replicates an 8-bit element with a single set bit.
        let (n, immr, imms) = encode_bitmask(0x0101_0101, 32).unwrap();
        assert_eq!(decode_bitmask(n, imms, immr, 32), Some(0x0101_0101));
    }

    #[test]
    fn rejects_all_zero_and_all_one() {
        assert_eq!(encode_bitmask(0, 32), None);
        assert_eq!(encode_bitmask(0xFFFF_FFFF, 32), None);
        assert_eq!(encode_bitmask(u64::MAX, 64), None);
    }

    #[test]
    fn encodes_ccr_preserve_mask() {
        // The low 5 bits (X N Z V C) the engine preserves when merging NZCV.
        let (n, immr, imms) = encode_bitmask(0x1F, 64).unwrap();
        assert_eq!(decode_bitmask(n, imms, immr, 64), Some(0x1F));
    }
}
