/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

mod flags;
mod memory;
mod registers;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::opcode::OpCode::*;
use crate::opcode::{self, Condition, OpCode, Operand, Register, RegisterPair};

pub use self::flags::{carry_bit, parity_bit, sign_bit, zero_bit, Flags, ResultFlags, Width};
pub use self::memory::{Memory, MEMORY_SIZE};
pub use self::registers::RegisterFile;

/// Interface used by `Proc8080` for `IN` and `OUT` instructions.
///
/// The 8080 communicates with external devices via the instructions `IN` (the CPU reads from
/// the databus on a given port) and `OUT` (the CPU writes to a given port). What happens on
/// the other side of the bus depends on the hardware and is left to the implementor.
pub trait DataBus {
    /// Called by `Proc8080` when it applies a `IN` instruction
    fn read_port(&self, port: u8) -> u8;

    /// Called by `Proc8080` when it applies a `OUT` instruction
    fn write_port(&mut self, port: u8, value: u8);
}

/// A bus with nothing attached: reads return 0 and writes are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBus;

impl DataBus for NullBus {
    fn read_port(&self, _port: u8) -> u8 {
        0
    }

    fn write_port(&mut self, _port: u8, _value: u8) {}
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum State {
    Running,
    Halted,
}

/// Why [`Proc8080::start`] returned.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ExitReason {
    /// A `HLT` instruction was executed.
    Halted,
    /// A stop was requested through a [`StopHandle`].
    Stopped,
    /// `max_steps` instructions were executed.
    StepLimit,
}

/// Requests a running engine to return at the next instruction boundary.
///
/// Handles are cheap to clone and can be sent to another thread.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn take_request(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

/// The instruction engine: processor state (flags, registers and memory) and logic.
pub struct Proc8080<Bus: DataBus = NullBus> {
    flags: Flags,
    registers: RegisterFile,
    memory: Memory,
    state: State,
    interrupts_enabled: bool,
    steps: u64,
    stop: StopHandle,
    config: EngineConfig,
    data_bus: Bus,
}

impl Proc8080<NullBus> {
    /// Builds an engine with no I/O device attached.
    pub fn with_memory(memory: Memory, config: EngineConfig) -> Proc8080<NullBus> {
        Proc8080::new(memory, NullBus, config)
    }
}

impl<Bus: DataBus> Proc8080<Bus> {
    /// Builds a new `Proc8080` with the given memory and `DataBus`.
    ///
    /// The memory contains both the ROM and RAM of the processor, usually with the program
    /// image loaded at address 0. The program counter and stack pointer start at the values of
    /// `config`.
    pub fn new(memory: Memory, data_bus: Bus, config: EngineConfig) -> Proc8080<Bus> {
        let mut registers = RegisterFile::default();
        registers.set_pair(RegisterPair::PC, config.entry_point);
        registers.set_pair(RegisterPair::SP, config.initial_sp);
        Proc8080 {
            flags: Flags::default(),
            registers,
            memory,
            state: State::Running,
            interrupts_enabled: false,
            steps: 0,
            stop: StopHandle::default(),
            config,
            data_bus,
        }
    }

    pub fn flags(&self) -> &Flags {
        &self.flags
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    pub fn register(&self, reg: Register) -> u8 {
        self.registers.get(reg)
    }

    pub fn register_pair(&self, pair: RegisterPair) -> u16 {
        self.registers.get_pair(pair)
    }

    pub fn pc(&self) -> u16 {
        self.registers.pc()
    }

    pub fn sp(&self) -> u16 {
        self.registers.sp()
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Mutable access to memory, for loading images before the engine is started.
    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub fn read_byte(&self, address: i32) -> Result<u8> {
        self.memory.read_byte(address)
    }

    pub fn read_double_byte(&self, address: i32) -> Result<u16> {
        self.memory.read_double_byte(address)
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn interrupts_enabled(&self) -> bool {
        self.interrupts_enabled
    }

    /// Instructions executed since the engine was created.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn data_bus(&self) -> &Bus {
        &self.data_bus
    }

    pub fn data_bus_mut(&mut self) -> &mut Bus {
        &mut self.data_bus
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Requests [`start`](Proc8080::start) to return before the next instruction.
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Runs instructions from the current program counter until the processor halts, a stop is
    /// requested or the configured step limit is reached.
    ///
    /// Errors abort the run and are returned as is; state committed by the instructions that
    /// completed before the failing one is kept.
    pub fn start(&mut self) -> Result<ExitReason> {
        debug!(pc = self.pc(), sp = self.sp(), "engine started");
        let mut executed: u64 = 0;
        loop {
            if self.stop.take_request() {
                debug!(pc = self.pc(), "engine stopped");
                return Ok(ExitReason::Stopped);
            }
            if self.state == State::Halted {
                return Ok(ExitReason::Halted);
            }
            if self.config.max_steps.is_some_and(|max| executed >= max) {
                debug!(pc = self.pc(), executed, "step limit reached");
                return Ok(ExitReason::StepLimit);
            }
            self.step()?;
            executed += 1;
        }
    }

    /// Reads the next opcode in memory and changes state accordingly.
    ///
    /// A halted processor does nothing. A failing instruction, undocumented opcodes included,
    /// leaves the processor as it was with PC still on that instruction.
    pub fn step(&mut self) -> Result<State> {
        if self.state == State::Halted {
            return Ok(State::Halted);
        }
        let pc = self.registers.pc();
        let op = self.fetch(pc)?;
        if self.config.trace_instructions {
            trace!("{:04x} - {}", pc, op);
        }
        self.registers.set_pair(RegisterPair::PC, pc.wrapping_add(op.size()));
        if let Err(e) = self.apply_op(op) {
            self.registers.set_pair(RegisterPair::PC, pc);
            return Err(e);
        }
        self.steps += 1;
        Ok(self.state)
    }

    /// Brings a halted processor back to the running state.
    pub fn resume(&mut self) {
        if self.state == State::Halted {
            debug!(pc = self.pc(), "engine resumed");
            self.state = State::Running;
        }
    }

    /// Make the processor run a `RST` instruction.
    ///
    /// There are 8 possible `RST` instruction for the 8080 (`RST 0` to `7`). The specific
    /// instruction is chosen via `rst_value`. An interrupt resumes a halted processor; the
    /// restart itself only happens when interrupts are enabled, and disables them.
    ///
    /// If the return address cannot be pushed, the error is returned and the processor is left
    /// as it was, halted or not.
    pub fn interrupt(&mut self, rst_value: u8) -> Result<()> {
        if rst_value > 7 {
            return Err(Error::InvalidRestartVector(rst_value));
        }
        if self.interrupts_enabled {
            debug!(rst_value, pc = self.pc(), "interrupt");
            self.apply_op(Rst(rst_value))?;
            self.interrupts_enabled = false;
        }
        self.resume();
        Ok(())
    }

    fn fetch(&self, pc: u16) -> Result<OpCode> {
        let address = i32::from(pc);
        let opcode = self.memory.read_byte(address)?;
        opcode::decode(opcode, |offset| {
            self.memory.read_byte(address + i32::from(offset))
        })
    }

    /// Executes `op`, with PC already pointing past it.
    ///
    /// Every memory access that can fail happens before the first write, so an error leaves
    /// everything but PC untouched. `step` puts PC back.
    fn apply_op(&mut self, op: OpCode) -> Result<()> {
        match op {
            Nop => (),

            // Data transfer
            Mov(dst, src) => {
                let value = self.read_operand(src)?;
                self.write_operand(dst, value)?;
            }
            Mvi(dst, value) => self.write_operand(dst, value)?,
            Lxi(pair, value) => self.registers.set_pair(pair, value),
            Lda(addr) => {
                let value = self.memory.read_byte(i32::from(addr))?;
                self.registers.set(Register::A, value);
            }
            Sta(addr) => self
                .memory
                .write_byte(i32::from(addr), self.registers.get(Register::A))?,
            Lhld(addr) => {
                let value = self.memory.read_double_byte(i32::from(addr))?;
                self.registers.set_pair(RegisterPair::HL, value);
            }
            Shld(addr) => self
                .memory
                .write_double_byte(i32::from(addr), self.registers.get_pair(RegisterPair::HL))?,
            Ldax(pair) => {
                let value = self.memory.read_byte(self.pair_address(pair))?;
                self.registers.set(Register::A, value);
            }
            Stax(pair) => self
                .memory
                .write_byte(self.pair_address(pair), self.registers.get(Register::A))?,
            Xchg => self.xchg(),

            // Arithmetic
            Add(src) => {
                let value = self.read_operand(src)?;
                self.add_to_accumulator(value, false)?;
            }
            Adc(src) => {
                let value = self.read_operand(src)?;
                self.add_to_accumulator(value, self.flags.cy)?;
            }
            Sub(src) => {
                let value = self.read_operand(src)?;
                self.sub_from_accumulator(value, false)?;
            }
            Sbb(src) => {
                let value = self.read_operand(src)?;
                self.sub_from_accumulator(value, self.flags.cy)?;
            }
            Adi(value) => self.add_to_accumulator(value, false)?,
            Aci(value) => self.add_to_accumulator(value, self.flags.cy)?,
            Sui(value) => self.sub_from_accumulator(value, false)?,
            Sbi(value) => self.sub_from_accumulator(value, self.flags.cy)?,
            Inr(dst) => self.increment_operand(dst)?,
            Dcr(dst) => self.decrement_operand(dst)?,
            Inx(pair) => {
                self.registers.increment_pair(pair, 1)?;
            }
            Dcx(pair) => {
                self.registers.decrement_pair(pair, 1)?;
            }
            Dad(pair) => self.add_register_pair_to_h(pair)?,
            Daa => self.decimal_adjust_accumulator()?,

            // Logical
            Ana(src) => {
                let value = self.read_operand(src)?;
                self.apply_and(value);
            }
            Xra(src) => {
                let value = self.read_operand(src)?;
                self.apply_xor(value);
            }
            Ora(src) => {
                let value = self.read_operand(src)?;
                self.apply_or(value);
            }
            Cmp(src) => {
                let value = self.read_operand(src)?;
                self.compare(value);
            }
            Ani(value) => self.apply_and(value),
            Xri(value) => self.apply_xor(value),
            Ori(value) => self.apply_or(value),
            Cpi(value) => self.compare(value),
            Rlc => self.flags.cy = self.registers.shift_left(Register::A),
            Rrc => self.flags.cy = self.registers.shift_right(Register::A),
            Ral => self.flags.cy = self.registers.shift_left_carry(Register::A, self.flags.cy),
            Rar => self.flags.cy = self.registers.shift_right_carry(Register::A, self.flags.cy),
            Cma => {
                self.registers.not(Register::A);
            }
            Cmc => self.flags.cy = !self.flags.cy,
            Stc => self.flags.cy = true,

            // Branch
            Jmp(addr) => self.jump(addr),
            JumpIf(cond, addr) => {
                if self.condition_holds(cond) {
                    self.jump(addr)
                }
            }
            Call(addr) => self.apply_call(addr)?,
            CallIf(cond, addr) => {
                if self.condition_holds(cond) {
                    self.apply_call(addr)?
                }
            }
            Ret => self.apply_return()?,
            ReturnIf(cond) => {
                if self.condition_holds(cond) {
                    self.apply_return()?
                }
            }
            Rst(value) => self.apply_call(u16::from(value) * 8)?,
            Pchl => self.jump(self.registers.get_pair(RegisterPair::HL)),

            // Stack, I/O, and Machine Control
            Push(pair) => self.push_stack(self.registers.get_pair(pair))?,
            PushPsw => self.push_processor_status_word()?,
            Pop(pair) => {
                let value = self.pop_stack()?;
                self.registers.set_pair(pair, value);
            }
            PopPsw => self.pop_processor_status_word()?,
            Xthl => self.xthl()?,
            Sphl => {
                let hl = self.registers.get_pair(RegisterPair::HL);
                self.registers.set_pair(RegisterPair::SP, hl);
            }
            In(port) => {
                let value = self.data_bus.read_port(port);
                self.registers.set(Register::A, value);
            }
            Out(port) => self
                .data_bus
                .write_port(port, self.registers.get(Register::A)),
            Ei => self.interrupts_enabled = true,
            Di => self.interrupts_enabled = false,
            Hlt => {
                debug!(pc = self.pc(), "engine halted");
                self.state = State::Halted;
            }

            // The only place undocumented opcodes are rejected; PC still points past them here.
            Unimplemented(opcode) => {
                let address = self.registers.pc().wrapping_sub(op.size());
                return Err(Error::UnimplementedOpcode { opcode, address });
            }
        }
        Ok(())
    }

    fn pair_address(&self, pair: RegisterPair) -> i32 {
        i32::from(self.registers.get_pair(pair))
    }

    fn read_operand(&self, operand: Operand) -> Result<u8> {
        match operand {
            Operand::Reg(reg) => Ok(self.registers.get(reg)),
            Operand::Memory => self.memory.read_byte(self.pair_address(RegisterPair::HL)),
        }
    }

    fn write_operand(&mut self, operand: Operand, value: u8) -> Result<()> {
        match operand {
            Operand::Reg(reg) => {
                self.registers.set(reg, value);
                Ok(())
            }
            Operand::Memory => self
                .memory
                .write_byte(self.pair_address(RegisterPair::HL), value),
        }
    }

    fn condition_holds(&self, cond: Condition) -> bool {
        match cond {
            Condition::NotZero => !self.flags.z,
            Condition::Zero => self.flags.z,
            Condition::NoCarry => !self.flags.cy,
            Condition::Carry => self.flags.cy,
            Condition::ParityOdd => !self.flags.p,
            Condition::ParityEven => self.flags.p,
            Condition::Plus => !self.flags.s,
            Condition::Minus => self.flags.s,
        }
    }

    fn xchg(&mut self) {
        let de = self.registers.get_pair(RegisterPair::DE);
        let hl = self.registers.get_pair(RegisterPair::HL);

        self.registers.set_pair(RegisterPair::DE, hl);
        self.registers.set_pair(RegisterPair::HL, de);
    }

    fn add_to_accumulator(&mut self, value: u8, carry: bool) -> Result<()> {
        let a = self.registers.get(Register::A);
        let result = self
            .registers
            .increment(Register::A, i32::from(value) + i32::from(carry))?;
        self.flags.apply(result);
        self.flags.ac = half_carry_add(a, value, carry);
        Ok(())
    }

    fn sub_from_accumulator(&mut self, value: u8, borrow: bool) -> Result<()> {
        let a = self.registers.get(Register::A);
        let result = self
            .registers
            .decrement(Register::A, i32::from(value) + i32::from(borrow))?;
        self.flags.apply(result);
        self.flags.ac = half_carry_sub(a, value, borrow);
        Ok(())
    }

    fn increment_operand(&mut self, operand: Operand) -> Result<()> {
        let value = self.read_operand(operand)?;
        let result = match operand {
            Operand::Reg(reg) => self.registers.increment(reg, 1)?,
            Operand::Memory => {
                let raw = i32::from(value) + 1;
                self.write_operand(operand, raw as u8)?;
                ResultFlags::for_result(raw, Width::Byte)
            }
        };
        self.flags.apply_except_carry(result);
        self.flags.ac = half_carry_add(value, 1, false);
        Ok(())
    }

    fn decrement_operand(&mut self, operand: Operand) -> Result<()> {
        let value = self.read_operand(operand)?;
        let result = match operand {
            Operand::Reg(reg) => self.registers.decrement(reg, 1)?,
            Operand::Memory => {
                let raw = i32::from(value) - 1;
                self.write_operand(operand, raw as u8)?;
                ResultFlags::for_result(raw, Width::Byte)
            }
        };
        self.flags.apply_except_carry(result);
        self.flags.ac = half_carry_sub(value, 1, false);
        Ok(())
    }

    fn add_register_pair_to_h(&mut self, pair: RegisterPair) -> Result<()> {
        let value = self.registers.get_pair(pair);
        let result = self
            .registers
            .increment_pair(RegisterPair::HL, i32::from(value))?;
        self.flags.cy = result.cy;
        Ok(())
    }

    fn decimal_adjust_accumulator(&mut self) -> Result<()> {
        let a = self.registers.get(Register::A);
        let low = a & 0x0f;
        let high = a >> 4;
        let mut correction = 0;
        let mut carry = self.flags.cy;

        if self.flags.ac || low > 9 {
            correction |= 0x06;
        }
        if self.flags.cy || high > 9 || (high >= 9 && low > 9) {
            correction |= 0x60;
            carry = true;
        }
        self.add_to_accumulator(correction, false)?;
        self.flags.cy = carry;
        Ok(())
    }

    fn apply_and(&mut self, value: u8) {
        let a = self.registers.get(Register::A);
        let result = self.registers.and(Register::A, value);
        self.flags.apply(result);
        self.flags.ac = (a | value) & 0x08 != 0;
    }

    fn apply_xor(&mut self, value: u8) {
        let result = self.registers.xor(Register::A, value);
        self.flags.apply(result);
        self.flags.ac = false;
    }

    fn apply_or(&mut self, value: u8) {
        let result = self.registers.or(Register::A, value);
        self.flags.apply(result);
        self.flags.ac = false;
    }

    fn compare(&mut self, value: u8) {
        let a = self.registers.get(Register::A);
        let raw = i32::from(a) - i32::from(value);
        self.flags.apply(ResultFlags::for_result(raw, Width::Byte));
        self.flags.ac = half_carry_sub(a, value, false);
    }

    fn jump(&mut self, addr: u16) {
        self.registers.set_pair(RegisterPair::PC, addr);
    }

    fn apply_call(&mut self, addr: u16) -> Result<()> {
        self.push_stack(self.registers.pc())?;
        self.jump(addr);
        Ok(())
    }

    fn apply_return(&mut self) -> Result<()> {
        let addr = self.pop_stack()?;
        self.jump(addr);
        Ok(())
    }

    fn push_stack(&mut self, value: u16) -> Result<()> {
        let address = i32::from(self.registers.sp().wrapping_sub(2));
        self.memory.write_double_byte(address, value)?;
        self.registers.decrement_pair(RegisterPair::SP, 2)?;
        Ok(())
    }

    fn pop_stack(&mut self) -> Result<u16> {
        let value = self.memory.read_double_byte(i32::from(self.registers.sp()))?;
        self.registers.increment_pair(RegisterPair::SP, 2)?;
        Ok(value)
    }

    fn push_processor_status_word(&mut self) -> Result<()> {
        let a = self.registers.get(Register::A);
        let psw = self.flags.to_processor_status_word();
        self.push_stack(u16::from_be_bytes([a, psw]))
    }

    fn pop_processor_status_word(&mut self) -> Result<()> {
        let [a, psw] = self.pop_stack()?.to_be_bytes();
        self.registers.set(Register::A, a);
        self.flags = Flags::from_processor_status_word(psw);
        Ok(())
    }

    fn xthl(&mut self) -> Result<()> {
        let addr = i32::from(self.registers.sp());
        let hl = self.registers.get_pair(RegisterPair::HL);
        let mem_value = self.memory.read_double_byte(addr)?;
        self.memory.write_double_byte(addr, hl)?;
        self.registers.set_pair(RegisterPair::HL, mem_value);
        Ok(())
    }
}

/// Carry out of bit 3 when adding `value` and `carry` to `a`.
fn half_carry_add(a: u8, value: u8, carry: bool) -> bool {
    (a & 0x0f) + (value & 0x0f) + u8::from(carry) > 0x0f
}

/// Carry out of bit 3 of `a - value - borrow`, computed the way the 8080 does it: as an
/// addition of the one's complement of `value`.
fn half_carry_sub(a: u8, value: u8, borrow: bool) -> bool {
    (a & 0x0f) + (!value & 0x0f) + u8::from(!borrow) > 0x0f
}

impl<Bus: DataBus> fmt::Debug for Proc8080<Bus> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Proc8080")
            .field("flags", &self.flags)
            .field("registers", &self.registers)
            .field("state", &self.state)
            .field("interrupts_enabled", &self.interrupts_enabled)
            .field("steps", &self.steps)
            .finish()
    }
}
