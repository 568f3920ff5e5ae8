/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Instruction decoding.
//!
//! [`decode`] maps every byte value to an [`OpCode`]. The match has no wildcard arm, so adding
//! or removing an arm that leaves a byte unmapped is a compile error. The twelve undocumented
//! bytes decode to [`OpCode::Unimplemented`] and are rejected by the engine when executed.

mod opcodes;
pub use self::opcodes::{Condition, OpCode, Operand, Register, RegisterPair};

use crate::error::{Error, Result};

use self::opcodes::OpCode::*;

/// Decodes `opcode`, pulling its data bytes through `operand`.
///
/// `operand` is called with the offset of the byte from the opcode (1 or 2), only as many
/// times as the instruction needs. Its error type is passed through, which lets the engine
/// report an out-of-range fetch as an addressing error.
pub fn decode<E, F>(opcode: u8, mut operand: F) -> std::result::Result<OpCode, E>
where
    F: FnMut(u16) -> std::result::Result<u8, E>,
{
    let op = match opcode {
        0x00 => Nop,
        0x08 | 0x10 | 0x18 | 0x20 | 0x28 | 0x30 | 0x38 | 0xcb | 0xd9 | 0xdd | 0xed | 0xfd => {
            Unimplemented(opcode)
        }

        0x01 | 0x11 | 0x21 | 0x31 => Lxi(pair_of(opcode), data_u16(&mut operand)?),
        0x02 | 0x12 => Stax(pair_of(opcode)),
        0x0a | 0x1a => Ldax(pair_of(opcode)),
        0x22 => Shld(data_u16(&mut operand)?),
        0x2a => Lhld(data_u16(&mut operand)?),
        0x32 => Sta(data_u16(&mut operand)?),
        0x3a => Lda(data_u16(&mut operand)?),
        0x03 | 0x13 | 0x23 | 0x33 => Inx(pair_of(opcode)),
        0x0b | 0x1b | 0x2b | 0x3b => Dcx(pair_of(opcode)),
        0x09 | 0x19 | 0x29 | 0x39 => Dad(pair_of(opcode)),
        0x04 | 0x0c | 0x14 | 0x1c | 0x24 | 0x2c | 0x34 | 0x3c => Inr(operand_of(opcode >> 3)),
        0x05 | 0x0d | 0x15 | 0x1d | 0x25 | 0x2d | 0x35 | 0x3d => Dcr(operand_of(opcode >> 3)),
        0x06 | 0x0e | 0x16 | 0x1e | 0x26 | 0x2e | 0x36 | 0x3e => {
            Mvi(operand_of(opcode >> 3), data_byte(&mut operand)?)
        }
        0x07 => Rlc,
        0x0f => Rrc,
        0x17 => Ral,
        0x1f => Rar,
        0x27 => Daa,
        0x2f => Cma,
        0x37 => Stc,
        0x3f => Cmc,

        0x76 => Hlt,
        0x40..=0x7f => Mov(operand_of(opcode >> 3), operand_of(opcode)),

        0x80..=0x87 => Add(operand_of(opcode)),
        0x88..=0x8f => Adc(operand_of(opcode)),
        0x90..=0x97 => Sub(operand_of(opcode)),
        0x98..=0x9f => Sbb(operand_of(opcode)),
        0xa0..=0xa7 => Ana(operand_of(opcode)),
        0xa8..=0xaf => Xra(operand_of(opcode)),
        0xb0..=0xb7 => Ora(operand_of(opcode)),
        0xb8..=0xbf => Cmp(operand_of(opcode)),

        0xc0 | 0xc8 | 0xd0 | 0xd8 | 0xe0 | 0xe8 | 0xf0 | 0xf8 => ReturnIf(condition_of(opcode)),
        0xc2 | 0xca | 0xd2 | 0xda | 0xe2 | 0xea | 0xf2 | 0xfa => {
            JumpIf(condition_of(opcode), data_u16(&mut operand)?)
        }
        0xc4 | 0xcc | 0xd4 | 0xdc | 0xe4 | 0xec | 0xf4 | 0xfc => {
            CallIf(condition_of(opcode), data_u16(&mut operand)?)
        }
        0xc7 | 0xcf | 0xd7 | 0xdf | 0xe7 | 0xef | 0xf7 | 0xff => Rst((opcode >> 3) & 0x07),

        0xc1 | 0xd1 | 0xe1 => Pop(pair_of(opcode)),
        0xf1 => PopPsw,
        0xc5 | 0xd5 | 0xe5 => Push(pair_of(opcode)),
        0xf5 => PushPsw,
        0xc9 => Ret,
        0xe9 => Pchl,
        0xf9 => Sphl,
        0xc3 => Jmp(data_u16(&mut operand)?),
        0xcd => Call(data_u16(&mut operand)?),
        0xd3 => Out(data_byte(&mut operand)?),
        0xdb => In(data_byte(&mut operand)?),
        0xe3 => Xthl,
        0xeb => Xchg,
        0xf3 => Di,
        0xfb => Ei,

        0xc6 => Adi(data_byte(&mut operand)?),
        0xce => Aci(data_byte(&mut operand)?),
        0xd6 => Sui(data_byte(&mut operand)?),
        0xde => Sbi(data_byte(&mut operand)?),
        0xe6 => Ani(data_byte(&mut operand)?),
        0xee => Xri(data_byte(&mut operand)?),
        0xf6 => Ori(data_byte(&mut operand)?),
        0xfe => Cpi(data_byte(&mut operand)?),
    };
    Ok(op)
}

/// Read a slice of bytes and returns an opcode, possibly with its data.
///
/// The parsing fails if the slice is shorter than the instruction.
pub fn read_opcode(bytes: &[u8]) -> Result<OpCode> {
    let opcode = *bytes.first().ok_or(Error::UnexpectedEndOfInput)?;
    decode(opcode, |offset| {
        bytes
            .get(offset as usize)
            .copied()
            .ok_or(Error::UnexpectedEndOfInput)
    })
}

fn data_byte<E, F>(operand: &mut F) -> std::result::Result<u8, E>
where
    F: FnMut(u16) -> std::result::Result<u8, E>,
{
    operand(1)
}

fn data_u16<E, F>(operand: &mut F) -> std::result::Result<u16, E>
where
    F: FnMut(u16) -> std::result::Result<u8, E>,
{
    let low = operand(1)?;
    let high = operand(2)?;
    Ok(u16::from_le_bytes([low, high]))
}

/// Register or memory operand encoded in the three low bits.
fn operand_of(bits: u8) -> Operand {
    match bits & 0x07 {
        0 => Operand::Reg(Register::B),
        1 => Operand::Reg(Register::C),
        2 => Operand::Reg(Register::D),
        3 => Operand::Reg(Register::E),
        4 => Operand::Reg(Register::H),
        5 => Operand::Reg(Register::L),
        6 => Operand::Memory,
        _ => Operand::Reg(Register::A),
    }
}

/// Register pair encoded in bits 4 and 5. The SP slot doubles as PSW for PUSH and POP, which
/// are decoded separately.
fn pair_of(opcode: u8) -> RegisterPair {
    match (opcode >> 4) & 0x03 {
        0 => RegisterPair::BC,
        1 => RegisterPair::DE,
        2 => RegisterPair::HL,
        _ => RegisterPair::SP,
    }
}

fn condition_of(opcode: u8) -> Condition {
    match (opcode >> 3) & 0x07 {
        0 => Condition::NotZero,
        1 => Condition::Zero,
        2 => Condition::NoCarry,
        3 => Condition::Carry,
        4 => Condition::ParityOdd,
        5 => Condition::ParityEven,
        6 => Condition::Plus,
        _ => Condition::Minus,
    }
}
