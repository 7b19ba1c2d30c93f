use log::info;

use crate::error::Error;

/// Size of the whole address space
pub const MEM_SIZE: usize = 4096;
/// Address at which programs are loaded and execution starts
pub const PROGRAM_START: u16 = 0x200;
/// Address of the first font glyph
pub const FONT_START: u16 = 0x000;
/// Bytes per font glyph
pub const GLYPH_SIZE: u16 = 5;

#[rustfmt::skip]
const FONT: [u8; 16 * GLYPH_SIZE as usize] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Flat byte-addressable memory with the font resident at `FONT_START`
///
/// Every accessor is bounds-checked and reports `Error::OutOfBounds`
/// instead of panicking.
pub struct Memory([u8; MEM_SIZE]);

impl Memory {
    pub fn new() -> Self {
        let mut memory = Self([0; MEM_SIZE]);
        let start = FONT_START as usize;
        memory.0[start..start + FONT.len()].copy_from_slice(&FONT);
        memory
    }

    /// Copy `bytes` into memory starting at `address`
    ///
    /// Nothing is written if the bytes would not fit.
    pub fn load(&mut self, address: u16, bytes: &[u8]) -> Result<(), Error> {
        let start = address as usize;
        let capacity = MEM_SIZE.saturating_sub(start);
        if bytes.len() > capacity {
            return Err(Error::ProgramTooLarge {
                len: bytes.len(),
                capacity,
            });
        }
        self.0[start..start + bytes.len()].copy_from_slice(bytes);
        info!("loaded {} bytes at {:#05x}", bytes.len(), address);
        Ok(())
    }

    pub fn read(&self, address: usize) -> Result<u8, Error> {
        self.0
            .get(address)
            .copied()
            .ok_or(Error::OutOfBounds { address })
    }

    pub fn write(&mut self, address: usize, value: u8) -> Result<(), Error> {
        self.0
            .get_mut(address)
            .map(|byte| *byte = value)
            .ok_or(Error::OutOfBounds { address })
    }

    /// Big-endian word made of bytes at `address` and `address + 1`
    pub fn read_word(&self, address: usize) -> Result<u16, Error> {
        let hi = self.read(address)?;
        let lo = self.read(address + 1)?;
        Ok((hi as u16) << 8 | lo as u16)
    }

    pub fn slice(&self, address: usize, len: usize) -> Result<&[u8], Error> {
        address
            .checked_add(len)
            .and_then(move |end| self.0.get(address..end))
            .ok_or_else(|| Self::past_end(address, len))
    }

    pub fn slice_mut(&mut self, address: usize, len: usize) -> Result<&mut [u8], Error> {
        address
            .checked_add(len)
            .and_then(move |end| self.0.get_mut(address..end))
            .ok_or_else(|| Self::past_end(address, len))
    }

    /// Last address a failed `len` bytes long access at `address` would have touched
    fn past_end(address: usize, len: usize) -> Error {
        Error::OutOfBounds {
            address: address.saturating_add(len.max(1) - 1),
        }
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.0
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}
