/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use self::OpCode::*;
use std::fmt::{self, Display, Formatter};

/// The seven 8-bit registers, in the order they are stored in the register file.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum Register {
    A,
    B,
    C,
    D,
    E,
    H,
    L,
}

impl Register {
    pub const ALL: [Register; 7] = [
        Register::A,
        Register::B,
        Register::C,
        Register::D,
        Register::E,
        Register::H,
        Register::L,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            Register::A => 0,
            Register::B => 1,
            Register::C => 2,
            Register::D => 3,
            Register::E => 4,
            Register::H => 5,
            Register::L => 6,
        }
    }
}

impl Display for Register {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// 16-bit operands: the three register pairs and the two counters.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum RegisterPair {
    BC,
    DE,
    HL,
    SP,
    PC,
}

impl RegisterPair {
    /// High and low registers of a pair stored in the register file.
    pub(crate) fn registers(self) -> Option<(Register, Register)> {
        match self {
            RegisterPair::BC => Some((Register::B, Register::C)),
            RegisterPair::DE => Some((Register::D, Register::E)),
            RegisterPair::HL => Some((Register::H, Register::L)),
            RegisterPair::SP | RegisterPair::PC => None,
        }
    }
}

impl Display for RegisterPair {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let name = match self {
            RegisterPair::BC => "B",
            RegisterPair::DE => "D",
            RegisterPair::HL => "H",
            RegisterPair::SP => "SP",
            RegisterPair::PC => "PC",
        };
        f.write_str(name)
    }
}

/// An 8-bit operand: either a register, or the memory byte addressed by HL.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Operand {
    Reg(Register),
    Memory,
}

impl Display for Operand {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Operand::Reg(reg) => write!(f, "{}", reg),
            Operand::Memory => f.write_str("M"),
        }
    }
}

/// Flag conditions tested by conditional jumps, calls and returns.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Condition {
    NotZero,
    Zero,
    NoCarry,
    Carry,
    ParityOdd,
    ParityEven,
    Plus,
    Minus,
}

impl Display for Condition {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let suffix = match self {
            Condition::NotZero => "NZ",
            Condition::Zero => "Z",
            Condition::NoCarry => "NC",
            Condition::Carry => "C",
            Condition::ParityOdd => "PO",
            Condition::ParityEven => "PE",
            Condition::Plus => "P",
            Condition::Minus => "M",
        };
        f.write_str(suffix)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum OpCode {
    Nop,

    // Data transfer
    Mov(Operand, Operand),
    Mvi(Operand, u8),
    Lxi(RegisterPair, u16),
    Lda(u16),
    Sta(u16),
    Lhld(u16),
    Shld(u16),
    Ldax(RegisterPair),
    Stax(RegisterPair),
    Xchg,

    // Arithmetic
    Add(Operand),
    Adc(Operand),
    Sub(Operand),
    Sbb(Operand),
    Adi(u8),
    Aci(u8),
    Sui(u8),
    Sbi(u8),
    Inr(Operand),
    Dcr(Operand),
    Inx(RegisterPair),
    Dcx(RegisterPair),
    Dad(RegisterPair),
    Daa,

    // Logical
    Ana(Operand),
    Xra(Operand),
    Ora(Operand),
    Cmp(Operand),
    Ani(u8),
    Xri(u8),
    Ori(u8),
    Cpi(u8),
    Rlc,
    Rrc,
    Ral,
    Rar,
    Cma,
    Cmc,
    Stc,

    // Branch
    Jmp(u16),
    JumpIf(Condition, u16),
    Call(u16),
    CallIf(Condition, u16),
    Ret,
    ReturnIf(Condition),
    Rst(u8),
    Pchl,

    // Stack, I/O, and Machine Control
    Push(RegisterPair),
    PushPsw,
    Pop(RegisterPair),
    PopPsw,
    Xthl,
    Sphl,
    In(u8),
    Out(u8),
    Ei,
    Di,
    Hlt,

    /// One of the twelve undocumented opcodes.
    Unimplemented(u8),
}

impl OpCode {
    /// Length of the instruction in bytes, opcode included.
    pub fn size(&self) -> u16 {
        match *self {
            Lxi(_, _)
            | Lda(_)
            | Sta(_)
            | Lhld(_)
            | Shld(_)
            | Jmp(_)
            | JumpIf(_, _)
            | Call(_)
            | CallIf(_, _) => 3,
            Mvi(_, _)
            | Adi(_)
            | Aci(_)
            | Sui(_)
            | Sbi(_)
            | Ani(_)
            | Xri(_)
            | Ori(_)
            | Cpi(_)
            | In(_)
            | Out(_) => 2,
            _ => 1,
        }
    }
}

impl Display for OpCode {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match *self {
            Nop => write!(f, "NOP"),
            Mov(dst, src) => write!(f, "MOV {},{}", dst, src),
            Mvi(dst, v) => write!(f, "MVI {},${:02x}", dst, v),
            Lxi(pair, v) => write!(f, "LXI {},${:04x}", pair, v),
            Lda(adr) => write!(f, "LDA ${:04x}", adr),
            Sta(adr) => write!(f, "STA ${:04x}", adr),
            Lhld(adr) => write!(f, "LHLD ${:04x}", adr),
            Shld(adr) => write!(f, "SHLD ${:04x}", adr),
            Ldax(pair) => write!(f, "LDAX {}", pair),
            Stax(pair) => write!(f, "STAX {}", pair),
            Xchg => write!(f, "XCHG"),

            Add(op) => write!(f, "ADD {}", op),
            Adc(op) => write!(f, "ADC {}", op),
            Sub(op) => write!(f, "SUB {}", op),
            Sbb(op) => write!(f, "SBB {}", op),
            Adi(v) => write!(f, "ADI ${:02x}", v),
            Aci(v) => write!(f, "ACI ${:02x}", v),
            Sui(v) => write!(f, "SUI ${:02x}", v),
            Sbi(v) => write!(f, "SBI ${:02x}", v),
            Inr(op) => write!(f, "INR {}", op),
            Dcr(op) => write!(f, "DCR {}", op),
            Inx(pair) => write!(f, "INX {}", pair),
            Dcx(pair) => write!(f, "DCX {}", pair),
            Dad(pair) => write!(f, "DAD {}", pair),
            Daa => write!(f, "DAA"),

            Ana(op) => write!(f, "ANA {}", op),
            Xra(op) => write!(f, "XRA {}", op),
            Ora(op) => write!(f, "ORA {}", op),
            Cmp(op) => write!(f, "CMP {}", op),
            Ani(v) => write!(f, "ANI ${:02x}", v),
            Xri(v) => write!(f, "XRI ${:02x}", v),
            Ori(v) => write!(f, "ORI ${:02x}", v),
            Cpi(v) => write!(f, "CPI ${:02x}", v),
            Rlc => write!(f, "RLC"),
            Rrc => write!(f, "RRC"),
            Ral => write!(f, "RAL"),
            Rar => write!(f, "RAR"),
            Cma => write!(f, "CMA"),
            Cmc => write!(f, "CMC"),
            Stc => write!(f, "STC"),

            Jmp(adr) => write!(f, "JMP ${:04x}", adr),
            JumpIf(cond, adr) => write!(f, "J{} ${:04x}", cond, adr),
            Call(adr) => write!(f, "CALL ${:04x}", adr),
            CallIf(cond, adr) => write!(f, "C{} ${:04x}", cond, adr),
            Ret => write!(f, "RET"),
            ReturnIf(cond) => write!(f, "R{}", cond),
            Rst(v) => write!(f, "RST {}", v),
            Pchl => write!(f, "PCHL"),

            Push(pair) => write!(f, "PUSH {}", pair),
            PushPsw => write!(f, "PUSH PSW"),
            Pop(pair) => write!(f, "POP {}", pair),
            PopPsw => write!(f, "POP PSW"),
            Xthl => write!(f, "XTHL"),
            Sphl => write!(f, "SPHL"),
            In(port) => write!(f, "IN ${:02x}", port),
            Out(port) => write!(f, "OUT ${:02x}", port),
            Ei => write!(f, "EI"),
            Di => write!(f, "DI"),
            Hlt => write!(f, "HLT"),

            Unimplemented(byte) => write!(f, "??? ${:02x}", byte),
        }
    }
}
