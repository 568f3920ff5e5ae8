/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use crate::error::{Error, Result};
use crate::opcode::{Register, RegisterPair};

use super::flags::{ResultFlags, Width};

/// The general purpose registers, the stack pointer and the program counter.
///
/// The seven 8-bit registers are stored contiguously so that B/C, D/E and H/L can be read as
/// 16-bit pairs, high register first. Every write is masked to the width of its destination.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct RegisterFile {
    items: [u8; 7],
    sp: u16,
    pc: u16,
}

impl RegisterFile {
    pub fn get(&self, reg: Register) -> u8 {
        self.items[reg.index()]
    }

    pub fn set(&mut self, reg: Register, value: impl Into<i32>) {
        self.items[reg.index()] = (value.into() & 0xff) as u8;
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn sp(&self) -> u16 {
        self.sp
    }

    pub fn increment(&mut self, reg: Register, delta: i32) -> Result<ResultFlags> {
        check_delta(delta)?;
        Ok(self.perform_operation(reg, |current| current + i64::from(delta)))
    }

    pub fn decrement(&mut self, reg: Register, delta: i32) -> Result<ResultFlags> {
        check_delta(delta)?;
        Ok(self.perform_operation(reg, |current| current - i64::from(delta)))
    }

    pub fn and(&mut self, reg: Register, value: u8) -> ResultFlags {
        self.perform_operation(reg, |current| current & i64::from(value))
    }

    pub fn or(&mut self, reg: Register, value: u8) -> ResultFlags {
        self.perform_operation(reg, |current| current | i64::from(value))
    }

    pub fn xor(&mut self, reg: Register, value: u8) -> ResultFlags {
        self.perform_operation(reg, |current| current ^ i64::from(value))
    }

    pub fn not(&mut self, reg: Register) -> ResultFlags {
        self.perform_operation(reg, |current| current ^ 0xff)
    }

    /// Rotates left, bit 7 going both to bit 0 and to the returned carry.
    pub fn shift_left(&mut self, reg: Register) -> bool {
        let value = self.get(reg);
        self.set(reg, value.rotate_left(1));
        value & 0x80 != 0
    }

    /// Rotates right, bit 0 going both to bit 7 and to the returned carry.
    pub fn shift_right(&mut self, reg: Register) -> bool {
        let value = self.get(reg);
        self.set(reg, value.rotate_right(1));
        value & 0x01 != 0
    }

    /// Rotates left through `carry`: the old carry enters bit 0, bit 7 is returned.
    pub fn shift_left_carry(&mut self, reg: Register, carry: bool) -> bool {
        let value = self.get(reg);
        self.set(reg, (value << 1) | carry as u8);
        value & 0x80 != 0
    }

    /// Rotates right through `carry`: the old carry enters bit 7, bit 0 is returned.
    pub fn shift_right_carry(&mut self, reg: Register, carry: bool) -> bool {
        let value = self.get(reg);
        self.set(reg, (value >> 1) | ((carry as u8) << 7));
        value & 0x01 != 0
    }

    pub fn get_pair(&self, pair: RegisterPair) -> u16 {
        match pair.registers() {
            Some((high, low)) => u16::from_be_bytes([self.get(high), self.get(low)]),
            None if pair == RegisterPair::SP => self.sp,
            None => self.pc,
        }
    }

    pub fn set_pair(&mut self, pair: RegisterPair, value: impl Into<i32>) {
        let value = (value.into() & 0xffff) as u16;
        match pair.registers() {
            Some((high, low)) => {
                let [high_byte, low_byte] = value.to_be_bytes();
                self.set(high, high_byte);
                self.set(low, low_byte);
            }
            None if pair == RegisterPair::SP => self.sp = value,
            None => self.pc = value,
        }
    }

    pub fn increment_pair(&mut self, pair: RegisterPair, delta: i32) -> Result<ResultFlags> {
        check_delta(delta)?;
        Ok(self.perform_pair_operation(pair, |current| current + i64::from(delta)))
    }

    pub fn decrement_pair(&mut self, pair: RegisterPair, delta: i32) -> Result<ResultFlags> {
        check_delta(delta)?;
        Ok(self.perform_pair_operation(pair, |current| current - i64::from(delta)))
    }

    fn perform_operation<F>(&mut self, reg: Register, operation: F) -> ResultFlags
    where
        F: FnOnce(i64) -> i64,
    {
        let result = narrow(operation(i64::from(self.get(reg))), Width::Byte);
        self.set(reg, result);
        ResultFlags::for_result(result, Width::Byte)
    }

    fn perform_pair_operation<F>(&mut self, pair: RegisterPair, operation: F) -> ResultFlags
    where
        F: FnOnce(i64) -> i64,
    {
        let result = narrow(operation(i64::from(self.get_pair(pair))), Width::Word);
        self.set_pair(pair, result);
        ResultFlags::for_result(result, Width::Word)
    }
}

/// Brings a result computed in `i64` back to the `i32` the flag rules take.
///
/// Results that do not fit keep their bits within `width` and stay above its maximum, so they
/// still report a carry.
fn narrow(result: i64, width: Width) -> i32 {
    i32::try_from(result).unwrap_or_else(|_| {
        let max = i64::from(width.max_value());
        ((result & max) + max + 1) as i32
    })
}

fn check_delta(delta: i32) -> Result<()> {
    if delta < 0 {
        Err(Error::InvalidOperand { delta })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::Register::*;
    use rstest::rstest;

    #[test]
    fn increment_past_byte_sets_carry_and_wraps() {
        let mut registers = RegisterFile::default();
        registers.set(A, 0xff);

        let flags = registers.increment(A, 1).unwrap();

        assert!(flags.cy);
        assert!(flags.z);
        assert_eq!(registers.get(A), 0x00);
    }

    #[test]
    fn decrement_below_zero_borrows() {
        let mut registers = RegisterFile::default();

        let flags = registers.decrement(B, 1).unwrap();

        assert!(flags.cy);
        assert!(flags.s);
        assert_eq!(registers.get(B), 0xff);
    }

    #[rstest]
    fn negative_delta_is_rejected(
        #[values(A, B, C, D, E, H, L)] reg: Register,
    ) {
        let mut registers = RegisterFile::default();
        assert!(matches!(registers.increment(reg, -1), Err(Error::InvalidOperand { delta: -1 })));
        assert!(matches!(registers.decrement(reg, -1), Err(Error::InvalidOperand { delta: -1 })));
        assert_eq!(registers.get(reg), 0);
    }

    #[rstest]
    #[case(RegisterPair::BC)]
    #[case(RegisterPair::DE)]
    #[case(RegisterPair::HL)]
    #[case(RegisterPair::SP)]
    fn negative_pair_delta_is_rejected(#[case] pair: RegisterPair) {
        let mut registers = RegisterFile::default();
        assert!(registers.increment_pair(pair, -2).is_err());
        assert!(registers.decrement_pair(pair, -2).is_err());
    }

    #[test]
    fn largest_delta_carries_instead_of_overflowing() {
        let mut registers = RegisterFile::default();
        registers.set(A, 0xff);

        let flags = registers.increment(A, i32::MAX).unwrap();

        assert!(flags.cy);
        assert_eq!(registers.get(A), 0xfe);
        assert!(flags.s);
        assert!(!flags.z);

        registers.set(B, 0x00);
        let flags = registers.decrement(B, i32::MAX).unwrap();
        assert!(flags.cy);
        assert_eq!(registers.get(B), 0x01);
    }

    #[test]
    fn largest_pair_delta_carries_instead_of_overflowing() {
        let mut registers = RegisterFile::default();
        registers.set_pair(RegisterPair::HL, 0xffff);

        let flags = registers.increment_pair(RegisterPair::HL, i32::MAX).unwrap();

        assert!(flags.cy);
        assert_eq!(registers.get_pair(RegisterPair::HL), 0xfffe);

        registers.set_pair(RegisterPair::SP, 0x0000);
        let flags = registers.decrement_pair(RegisterPair::SP, i32::MAX).unwrap();
        assert!(flags.cy);
        assert_eq!(registers.sp(), 0x0001);
    }

    #[test]
    fn narrowing_keeps_low_bits_and_carry() {
        assert_eq!(narrow(0x1ff, Width::Byte), 0x1ff);
        assert_eq!(narrow(-1, Width::Byte), -1);
        assert_eq!(narrow(0x8000_00fe, Width::Byte), 0x1fe);
        assert_eq!(narrow(0x8000_fffe, Width::Word), 0x1_fffe);
    }

    #[test]
    fn set_masks_to_a_byte() {
        let mut registers = RegisterFile::default();
        registers.set(C, 0x1234);
        assert_eq!(registers.get(C), 0x34);
        registers.set(C, -1);
        assert_eq!(registers.get(C), 0xff);
    }

    #[test]
    fn pairs_are_high_register_first() {
        let mut registers = RegisterFile::default();
        registers.set_pair(RegisterPair::HL, 0xf1ff);
        assert_eq!(registers.get(H), 0xf1);
        assert_eq!(registers.get(L), 0xff);

        registers.set(D, 0x0f);
        assert_eq!(registers.get_pair(RegisterPair::DE), 0x0f00);
    }

    #[test]
    fn counters_are_separate_from_general_registers() {
        let mut registers = RegisterFile::default();
        registers.set_pair(RegisterPair::SP, 0x1_2345);
        registers.set_pair(RegisterPair::PC, 0x0100);
        assert_eq!(registers.sp(), 0x2345);
        assert_eq!(registers.pc(), 0x0100);
        assert_eq!(registers.get_pair(RegisterPair::BC), 0);
        assert_eq!(registers.get_pair(RegisterPair::HL), 0);
    }

    #[test]
    fn pair_increment_uses_word_range() {
        let mut registers = RegisterFile::default();
        registers.set_pair(RegisterPair::BC, 0x00ff);
        let flags = registers.increment_pair(RegisterPair::BC, 1).unwrap();
        assert!(!flags.cy);
        assert_eq!(registers.get_pair(RegisterPair::BC), 0x0100);

        registers.set_pair(RegisterPair::BC, 0xffff);
        let flags = registers.increment_pair(RegisterPair::BC, 1).unwrap();
        assert!(flags.cy);
        assert_eq!(registers.get_pair(RegisterPair::BC), 0x0000);
    }

    #[test]
    fn pair_decrement_wraps() {
        let mut registers = RegisterFile::default();
        let flags = registers.decrement_pair(RegisterPair::SP, 2).unwrap();
        assert!(flags.cy);
        assert_eq!(registers.sp(), 0xfffe);
    }

    #[test]
    fn bitwise_operations() {
        let mut registers = RegisterFile::default();
        registers.set(A, 0b0110_1110);

        registers.and(A, 0b0110_1001);
        assert_eq!(registers.get(A), 0b0110_1000);

        registers.or(A, 0b0000_0001);
        assert_eq!(registers.get(A), 0b0110_1001);

        let flags = registers.xor(A, 0b0110_1001);
        assert_eq!(registers.get(A), 0);
        assert!(flags.z);
        assert!(!flags.cy);

        let flags = registers.not(A);
        assert_eq!(registers.get(A), 0xff);
        assert!(flags.s);
        assert!(!flags.cy);
    }

    #[test]
    fn rotations_report_the_bit_shifted_out() {
        let mut registers = RegisterFile::default();

        registers.set(A, 0b1001_0101);
        assert!(registers.shift_left(A));
        assert_eq!(registers.get(A), 0b0010_1011);

        registers.set(A, 0b0001_0101);
        assert!(registers.shift_right(A));
        assert_eq!(registers.get(A), 0b1000_1010);

        registers.set(A, 0x10);
        assert!(!registers.shift_left_carry(A, true));
        assert_eq!(registers.get(A), 0x21);

        registers.set(A, 0x01);
        assert!(registers.shift_right_carry(A, true));
        assert_eq!(registers.get(A), 0x80);
    }
}
