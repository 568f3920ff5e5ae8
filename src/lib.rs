/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! # Intel 8080 engine
//!
//! An instruction-level emulator of the Intel 8080: 64 KiB of memory, the register file, the
//! condition flags and an engine that fetches, decodes and executes every documented opcode.
//!
//! The main struct is [`Proc8080`](proc_state/struct.Proc8080.html). It is built from a
//! [`Memory`](proc_state/struct.Memory.html), a [`DataBus`](proc_state/trait.DataBus.html) for
//! `IN`/`OUT` and an [`EngineConfig`](config/struct.EngineConfig.html).
//!
//! ```
//! use i8080_engine::config::EngineConfig;
//! use i8080_engine::opcode::Register;
//! use i8080_engine::proc_state::{ExitReason, Memory, Proc8080};
//!
//! // MVI A,$41 ; INR A ; HLT
//! let mut memory = Memory::new();
//! memory.write_slice(0, &[0x3e, 0x41, 0x3c, 0x76]).unwrap();
//!
//! let mut proc8080 = Proc8080::with_memory(memory, EngineConfig::default());
//! assert_eq!(proc8080.start().unwrap(), ExitReason::Halted);
//! assert_eq!(proc8080.register(Register::A), 0x42);
//! assert_eq!(proc8080.pc(), 4);
//! ```

pub mod config;
pub mod error;
pub mod loader;
pub mod opcode;
pub mod proc_state;

pub use crate::config::EngineConfig;
pub use crate::error::{Error, Result};
pub use crate::loader::Kernel;
pub use crate::proc_state::{DataBus, ExitReason, Memory, Proc8080, State, StopHandle};
