// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Effective-address length decoding: how many extra 16-bit words follow
//! an opcode word for a given addressing mode, before the engine can
//! advance past the instruction.
//!
//! This only answers "how many words", not "what address" — computing the
//! address itself is the job of the emitted host code, built from the
//! decoded extension word(s) by the dispatch handlers in
//! [`crate::translator::dispatch`].

/// Size of an immediate operand, for mode 7 register 4 (`#imm`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImmSize {
    Byte,
    Word,
    Long,
}

/// The brief/full extension word attached to modes 6 and 7.3 (`An`/`PC`
/// with index). Only the fields `GetEALength` needs are decoded here; full
/// address computation reads the rest of the word at emission time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtensionWord(pub u16);

impl ExtensionWord {
    /// `0` = no base displacement, `2` = word (1 extra word), `3` = long
    /// (2 extra words). Bits 5:4.
    fn base_displacement_size(self) -> u8 {
        ((self.0 >> 4) & 0b11) as u8
    }

    /// `0` = no outer displacement, `2` = word, `3` = long. Bits 1:0.
    fn outer_displacement_size(self) -> u8 {
        (self.0 & 0b11) as u8
    }

    fn extra_words_for(size: u8) -> u16 {
        match size {
            2 => 1,
            3 => 2,
            _ => 0,
        }
    }

    /// Extra words contributed by the base and outer displacement fields,
    /// on top of the one word the extension word itself always occupies.
    pub fn displacement_extra_words(self) -> u16 {
        Self::extra_words_for(self.base_displacement_size()) + Self::extra_words_for(self.outer_displacement_size())
    }
}

/// Number of extra 16-bit words following the opcode word for addressing
/// mode `mode`/register `reg`, given the extension word already fetched
/// when `mode` is 6 or 7.3 (`None` otherwise — the caller fetches it only
/// once it knows it is needed) and the immediate size for mode 7.4.
///
/// `mode` and `reg` follow the standard 68k 3-bit/3-bit opcode field
/// split; `reg` is only consulted when `mode == 7`.
pub fn get_ea_length(mode: u8, reg: u8, extension: Option<ExtensionWord>, imm_size: Option<ImmSize>) -> u16 {
    match mode {
        0..=4 => 0,
        5 => 1,
        6 => 1 + extension.map_or(0, ExtensionWord::displacement_extra_words),
        7 => match reg {
            0 => 1,
            1 => 2,
            2 => 1,
            3 => 1 + extension.map_or(0, ExtensionWord::displacement_extra_words),
            4 => match imm_size {
                Some(ImmSize::Byte) | Some(ImmSize::Word) => 1,
                Some(ImmSize::Long) => 2,
                None => 0,
            },
            _ => 0,
        },
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_direct_modes_have_no_extra_words() {
        for mode in 0..=4u8 {
            assert_eq!(get_ea_length(mode, 0, None, None), 0);
        }
    }

    #[test]
    fn displacement_mode_is_one_word() {
        assert_eq!(get_ea_length(5, 3, None, None), 1);
    }

    #[test]
    fn index_mode_with_no_extra_displacement_is_one_word() {
        assert_eq!(get_ea_length(6, 0, Some(ExtensionWord(0)), None), 1);
    }

    #[test]
    fn index_mode_with_long_base_and_word_outer_is_four_words() {
        // base displacement size 3 (long, bits 5:4 = 11), outer size 2 (word, bits 1:0 = 10).
        let ext = ExtensionWord(0b11 << 4 | 0b10);
        assert_eq!(get_ea_length(6, 0, Some(ext), None), 1 + 2 + 1);
    }

    #[test]
    fn absolute_word_is_one_absolute_long_is_two() {
        assert_eq!(get_ea_length(7, 0, None, None), 1);
        assert_eq!(get_ea_length(7, 1, None, None), 2);
    }

    #[test]
    fn immediate_is_sized_by_operand_size() {
        assert_eq!(get_ea_length(7, 4, None, Some(ImmSize::Byte)), 1);
        assert_eq!(get_ea_length(7, 4, None, Some(ImmSize::Word)), 1);
        assert_eq!(get_ea_length(7, 4, None, Some(ImmSize::Long)), 2);
    }

    #[test]
    fn pc_relative_displacement_is_one_word() {
        assert_eq!(get_ea_length(7, 2, None, None), 1);
    }

    #[test]
    fn all_six_by_eight_by_three_combinations_resolve() {
        for mode in 0..=6u8 {
            for reg in 0..=7u8 {
                for imm in [ImmSize::Byte, ImmSize::Word, ImmSize::Long] {
                    let _ = get_ea_length(mode, reg, Some(ExtensionWord(0)), Some(imm));
                }
            }
        }
    }
}
