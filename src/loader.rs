/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Program images and the kernel that runs them.
//!
//! An image is a raw dump of memory: its first byte lands at address 0. [`Kernel`] pairs a
//! loaded image with an engine configuration.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::proc_state::{ExitReason, Memory, Proc8080, StopHandle, MEMORY_SIZE};

/// Copies `image` into `memory` starting at address 0.
///
/// Images larger than the address space are rejected and leave memory untouched.
pub fn load_image(memory: &mut Memory, image: &[u8]) -> Result<()> {
    if image.len() > MEMORY_SIZE {
        return Err(Error::ImageTooLarge { size: image.len() });
    }
    memory.write_slice(0, image)
}

/// Reads a file and loads it with [`load_image`]. Returns the number of bytes loaded.
pub fn load_file<P: AsRef<Path>>(memory: &mut Memory, path: P) -> Result<usize> {
    let path = path.as_ref();
    let image = fs::read(path)?;
    load_image(memory, &image)?;
    info!(path = %path.display(), size = image.len(), "image loaded");
    Ok(image.len())
}

pub struct Kernel {
    proc8080: Proc8080,
}

impl Kernel {
    /// A kernel with zeroed memory.
    pub fn new(config: EngineConfig) -> Kernel {
        Kernel {
            proc8080: Proc8080::with_memory(Memory::new(), config),
        }
    }

    pub fn from_image(image: &[u8], config: EngineConfig) -> Result<Kernel> {
        let mut memory = Memory::new();
        load_image(&mut memory, image)?;
        Ok(Kernel {
            proc8080: Proc8080::with_memory(memory, config),
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P, config: EngineConfig) -> Result<Kernel> {
        let mut memory = Memory::new();
        load_file(&mut memory, path)?;
        Ok(Kernel {
            proc8080: Proc8080::with_memory(memory, config),
        })
    }

    /// Runs the engine until it halts, is stopped or reaches its step limit.
    pub fn boot(&mut self) -> Result<ExitReason> {
        info!(
            entry_point = self.proc8080.pc(),
            sp = self.proc8080.sp(),
            "booting"
        );
        let reason = self.proc8080.start()?;
        info!(?reason, pc = self.proc8080.pc(), steps = self.proc8080.steps(), "engine exited");
        Ok(reason)
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.proc8080.stop_handle()
    }

    pub fn proc8080(&self) -> &Proc8080 {
        &self.proc8080
    }

    pub fn proc8080_mut(&mut self) -> &mut Proc8080 {
        &mut self.proc8080
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::Register;
    use std::io::Write;

    #[test]
    fn image_lands_at_address_zero() {
        let mut memory = Memory::new();
        load_image(&mut memory, &[0x3e, 0x07, 0x76]).unwrap();
        assert_eq!(&memory.as_slice()[..4], &[0x3e, 0x07, 0x76, 0x00]);
    }

    #[test]
    fn full_size_image_fits() {
        let mut memory = Memory::new();
        let image = vec![0xaa; MEMORY_SIZE];
        load_image(&mut memory, &image).unwrap();
        assert_eq!(memory.read_byte(0xffff).unwrap(), 0xaa);
    }

    #[test]
    fn oversized_image_is_rejected_untouched() {
        let mut memory = Memory::new();
        let image = vec![0xaa; MEMORY_SIZE + 1];
        assert!(matches!(
            load_image(&mut memory, &image),
            Err(Error::ImageTooLarge { size }) if size == MEMORY_SIZE + 1
        ));
        assert!(memory.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0x3e, 0x41, 0x3c, 0x76]).unwrap();

        let mut kernel = Kernel::from_file(file.path(), EngineConfig::default()).unwrap();

        assert_eq!(kernel.boot().unwrap(), ExitReason::Halted);
        assert_eq!(kernel.proc8080().register(Register::A), 0x42);
        assert_eq!(kernel.proc8080().pc(), 4);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            Kernel::from_file("/nonexistent/image.bin", EngineConfig::default()),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn entry_point_comes_from_config() {
        let mut image = vec![0x00; 0x103];
        image[0x100..].copy_from_slice(&[0x06, 0x09, 0x76]);
        let config = EngineConfig {
            entry_point: 0x100,
            ..Default::default()
        };

        let mut kernel = Kernel::from_image(&image, config).unwrap();

        assert_eq!(kernel.boot().unwrap(), ExitReason::Halted);
        assert_eq!(kernel.proc8080().register(Register::B), 0x09);
    }

    #[test]
    fn stop_handle_reaches_the_engine() {
        // JMP 0000
        let mut kernel = Kernel::from_image(&[0xc3, 0x00, 0x00], EngineConfig::default()).unwrap();
        kernel.stop_handle().stop();
        assert_eq!(kernel.boot().unwrap(), ExitReason::Stopped);
    }
}
