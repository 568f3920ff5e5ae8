/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use crate::error::{Error, Result};

/// Size of the 8080 address space.
pub const MEMORY_SIZE: usize = 0x10000;

/// The 64KiB of memory addressable by the processor, ROM and RAM alike.
///
/// Addresses are taken as `i32` so that a computed address which fell outside the address
/// space (`0x10000`, `-1`) is reported as an [`Error::Addressing`] instead of wrapping.
/// 16-bit values are stored little-endian, as the 8080 does.
pub struct Memory {
    bytes: Box<[u8]>,
}

impl Memory {
    pub fn new() -> Memory {
        Memory {
            bytes: vec![0; MEMORY_SIZE].into_boxed_slice(),
        }
    }

    pub fn read_byte(&self, address: i32) -> Result<u8> {
        let index = check_address(address)?;
        Ok(self.bytes[index])
    }

    pub fn write_byte(&mut self, address: i32, value: u8) -> Result<()> {
        let index = check_address(address)?;
        self.bytes[index] = value;
        Ok(())
    }

    pub fn read_double_byte(&self, address: i32) -> Result<u16> {
        let low = check_address(address)?;
        let high = check_address(address + 1)?;
        Ok(u16::from_le_bytes([self.bytes[low], self.bytes[high]]))
    }

    pub fn write_double_byte(&mut self, address: i32, value: u16) -> Result<()> {
        let low = check_address(address)?;
        let high = check_address(address + 1)?;
        let [low_byte, high_byte] = value.to_le_bytes();
        self.bytes[low] = low_byte;
        self.bytes[high] = high_byte;
        Ok(())
    }

    /// Copies `chunk` starting at `address`. Nothing is written if any byte would land out of
    /// bounds.
    pub fn write_slice(&mut self, address: i32, chunk: &[u8]) -> Result<()> {
        let start = check_address(address)?;
        if chunk.len() > MEMORY_SIZE - start {
            return Err(Error::Addressing {
                address: MEMORY_SIZE as i32,
            });
        }
        self.bytes[start..start + chunk.len()].copy_from_slice(chunk);
        Ok(())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Default for Memory {
    fn default() -> Memory {
        Memory::new()
    }
}

fn check_address(address: i32) -> Result<usize> {
    if (0..MEMORY_SIZE as i32).contains(&address) {
        Ok(address as usize)
    } else {
        Err(Error::Addressing { address })
    }
}
