/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Condition flags and the rules deriving them from an operation result.
//!
//! The four `*_bit` functions are the only place where zero, sign, carry and parity are
//! computed. They take the raw result of an operation, before it is masked to the width of its
//! destination, so that a result of `0x100` or `-1` can still report a carry or a borrow.

/// Width of the destination of an operation.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Width {
    Byte,
    Word,
}

impl Width {
    pub fn max_value(self) -> i32 {
        match self {
            Width::Byte => 0xff,
            Width::Word => 0xffff,
        }
    }

    fn sign_mask(self) -> i32 {
        match self {
            Width::Byte => 0x80,
            Width::Word => 0x8000,
        }
    }
}

/// True when the result truncated to `width` is zero.
pub fn zero_bit(value: i32, width: Width) -> bool {
    value & width.max_value() == 0
}

/// True when the most significant bit of the truncated result is set.
///
/// Negative raw results always have it set, so a borrow reports a negative sign.
pub fn sign_bit(value: i32, width: Width) -> bool {
    value & width.sign_mask() != 0
}

/// True when the raw result does not fit in `width`, in either direction.
pub fn carry_bit(value: i32, width: Width) -> bool {
    value < 0 || value > width.max_value()
}

/// True when the low byte of the result has an even number of set bits.
pub fn parity_bit(value: i32) -> bool {
    (value as u8).count_ones() % 2 == 0
}

/// The flags an operation of the register file reports about its result.
///
/// Auxiliary carry is not part of it: it depends on the operands, not on the result.
#[derive(Default, Debug, PartialEq, Eq, Clone, Copy)]
pub struct ResultFlags {
    pub z: bool,
    pub s: bool,
    pub p: bool,
    pub cy: bool,
}

impl ResultFlags {
    pub fn for_result(value: i32, width: Width) -> ResultFlags {
        ResultFlags {
            z: zero_bit(value, width),
            s: sign_bit(value, width),
            p: parity_bit(value),
            cy: carry_bit(value, width),
        }
    }
}

/// The five status bits of the 8080, plus the padding bit of the processor status word.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Flags {
    pub z: bool,
    pub s: bool,
    pub p: bool,
    pub cy: bool,
    pub ac: bool,
    /// Bit 1 of the processor status word, which the 8080 always pushes as 1.
    pub pad: bool,
}

impl Default for Flags {
    fn default() -> Flags {
        Flags {
            z: false,
            s: false,
            p: false,
            cy: false,
            ac: false,
            pad: true,
        }
    }
}

impl Flags {
    pub fn from_processor_status_word(psw: u8) -> Flags {
        Flags {
            z: (psw & (1 << 6)) != 0,
            s: (psw & (1 << 7)) != 0,
            p: (psw & (1 << 2)) != 0,
            cy: (psw & 1) != 0,
            ac: (psw & (1 << 4)) != 0,
            pad: true,
        }
    }

    pub fn to_processor_status_word(&self) -> u8 {
        (self.cy as u8)
            | ((self.pad as u8) << 1)
            | ((self.p as u8) << 2)
            | ((self.ac as u8) << 4)
            | ((self.z as u8) << 6)
            | ((self.s as u8) << 7)
    }

    pub fn apply(&mut self, result: ResultFlags) {
        self.apply_except_carry(result);
        self.cy = result.cy;
    }

    pub fn apply_except_carry(&mut self, result: ResultFlags) {
        self.z = result.z;
        self.s = result.s;
        self.p = result.p;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parity_counts_set_bits() {
        assert!(parity_bit(0));
        assert!(!parity_bit(1));
        assert!(parity_bit(3));
        assert!(parity_bit(0x96));
    }

    #[test]
    fn flags_non_zero_sign_parity() {
        let flags = ResultFlags::for_result(0x96, Width::Byte);
        assert_eq!(flags, ResultFlags { z: false, s: true, p: true, cy: false });
    }

    #[test]
    fn flags_zero() {
        let flags = ResultFlags::for_result(0, Width::Byte);
        assert_eq!(flags, ResultFlags { z: true, s: false, p: true, cy: false });
    }

    #[test]
    fn flags_carry() {
        let flags = ResultFlags::for_result(0x0101, Width::Byte);
        assert_eq!(flags, ResultFlags { z: false, s: false, p: false, cy: true });
    }

    #[test]
    fn flags_carry_out_of_byte_is_zero() {
        let flags = ResultFlags::for_result(0x100, Width::Byte);
        assert!(flags.z);
        assert!(flags.cy);
    }

    #[test]
    fn flags_underflow() {
        let flags = ResultFlags::for_result(-0x0012, Width::Byte);
        assert_eq!(flags, ResultFlags { z: false, s: true, p: true, cy: true });
    }

    #[test]
    fn word_width_widens_carry_range() {
        assert!(!carry_bit(0x100, Width::Word));
        assert!(carry_bit(0x10000, Width::Word));
        assert!(carry_bit(-1, Width::Word));
        assert!(zero_bit(0x10000, Width::Word));
        assert!(sign_bit(0x8000, Width::Word));
        assert!(!sign_bit(0x8000, Width::Byte));
    }

    #[test]
    fn processor_status_word_layout() {
        let flags = Flags { cy: true, s: true, ac: true, ..Default::default() };
        assert_eq!(flags.to_processor_status_word(), 0b1001_0011);
    }

    #[test]
    fn processor_status_word_keeps_padding_bit() {
        let flags = Flags::from_processor_status_word(0b0100_0100);
        assert!(flags.z);
        assert!(flags.p);
        assert!(!flags.cy);
        assert_eq!(flags.to_processor_status_word(), 0b0100_0110);
    }

    #[test]
    fn apply_except_carry_leaves_carry() {
        let mut flags = Flags { cy: true, ..Default::default() };
        flags.apply_except_carry(ResultFlags::for_result(0, Width::Byte));
        assert!(flags.z);
        assert!(flags.cy);
    }
}
