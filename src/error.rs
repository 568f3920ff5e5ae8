/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Errors returned by the engine, the loader and the configuration layer.
//!
//! Nothing in this crate logs an error and carries on: every condition below is handed back to
//! the caller, which decides whether to report it or stop the process.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A memory access outside `0x0000..=0xffff`.
    #[error("memory operation out of bounds: {address:#06x}")]
    Addressing { address: i32 },

    /// A negative delta was given to an increment or decrement primitive.
    #[error("invalid operand {delta}: delta must be a positive value")]
    InvalidOperand { delta: i32 },

    /// The byte at `address` is not a documented 8080 instruction.
    #[error("unimplemented opcode {opcode:#04x} at {address:#06x}")]
    UnimplementedOpcode { opcode: u8, address: u16 },

    /// A byte slice ended in the middle of an instruction.
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,

    #[error("invalid restart vector {0}, RST values are only from 0 to 7")]
    InvalidRestartVector(u8),

    /// The program image does not fit in the address space.
    #[error("program image of {size} bytes does not fit in 64KiB of memory")]
    ImageTooLarge { size: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}
