/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use i8080_engine::config::EngineConfig;
use i8080_engine::opcode::{self, Register};
use i8080_engine::proc_state::{Memory, Proc8080, RegisterFile, MEMORY_SIZE};
use proptest::prelude::*;

/// Runs `MVI A,a ; <op> b ; HLT` and returns the engine.
fn accumulator_op(opcode: u8, a: u8, b: u8) -> Proc8080 {
    let mut memory = Memory::new();
    memory
        .write_slice(0, &[0x3e, a, opcode, b, 0x76])
        .unwrap();
    let mut proc8080 = Proc8080::with_memory(memory, EngineConfig::default());
    proc8080.start().unwrap();
    proc8080
}

proptest! {
    #[test]
    fn double_byte_is_little_endian(address in 0i32..0xffff, value in any::<u16>()) {
        let mut memory = Memory::new();
        memory.write_double_byte(address, value).unwrap();
        prop_assert_eq!(memory.read_byte(address).unwrap(), value.to_le_bytes()[0]);
        prop_assert_eq!(memory.read_byte(address + 1).unwrap(), value.to_le_bytes()[1]);
        prop_assert_eq!(memory.read_double_byte(address).unwrap(), value);
    }

    #[test]
    fn out_of_range_addresses_fail(address in prop_oneof![i32::MIN..0, (MEMORY_SIZE as i32)..i32::MAX]) {
        let mut memory = Memory::new();
        prop_assert!(memory.read_byte(address).is_err());
        prop_assert!(memory.write_byte(address, 0).is_err());
    }

    #[test]
    fn register_writes_keep_the_low_byte(index in 0usize..7, value in any::<i32>()) {
        let reg = Register::ALL[index];
        let mut registers = RegisterFile::default();
        registers.set(reg, value);
        prop_assert_eq!(i32::from(registers.get(reg)), value & 0xff);
    }

    #[test]
    fn immediate_add_matches_wrapping_arithmetic(a in any::<u8>(), b in any::<u8>()) {
        let proc8080 = accumulator_op(0xc6, a, b);
        let expected = a.wrapping_add(b);
        let flags = proc8080.flags();
        prop_assert_eq!(proc8080.register(Register::A), expected);
        prop_assert_eq!(flags.cy, u16::from(a) + u16::from(b) > 0xff);
        prop_assert_eq!(flags.z, expected == 0);
        prop_assert_eq!(flags.s, expected & 0x80 != 0);
        prop_assert_eq!(flags.p, expected.count_ones() % 2 == 0);
        prop_assert_eq!(flags.ac, (a & 0x0f) + (b & 0x0f) > 0x0f);
    }

    #[test]
    fn immediate_sub_borrows_when_operand_is_larger(a in any::<u8>(), b in any::<u8>()) {
        let proc8080 = accumulator_op(0xd6, a, b);
        prop_assert_eq!(proc8080.register(Register::A), a.wrapping_sub(b));
        prop_assert_eq!(proc8080.flags().cy, b > a);
        prop_assert_eq!(proc8080.flags().z, a == b);
    }

    #[test]
    fn compare_leaves_accumulator_alone(a in any::<u8>(), b in any::<u8>()) {
        let proc8080 = accumulator_op(0xfe, a, b);
        prop_assert_eq!(proc8080.register(Register::A), a);
        prop_assert_eq!(proc8080.flags().z, a == b);
        prop_assert_eq!(proc8080.flags().cy, b > a);
    }

    #[test]
    fn every_opcode_decodes(bytes in proptest::collection::vec(any::<u8>(), 3)) {
        let op = opcode::read_opcode(&bytes).unwrap();
        prop_assert!((1..=3).contains(&op.size()));
    }
}
