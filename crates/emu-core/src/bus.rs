//! Memory and I/O bus interface.

/// Memory and I/O bus interface.
///
/// Components access memory and peripherals through this trait. The bus
/// handles address decoding and routing to the appropriate device.
///
/// Addresses are `u32` so that paged CPUs can present their full effective
/// address (24 bits for the H8/500 family). Implementations ignore bits the
/// hardware does not decode.
pub trait Bus {
    /// Read a byte from the given address.
    fn read(&mut self, address: u32) -> u8;

    /// Write a byte to the given address.
    fn write(&mut self, address: u32, value: u8);
}

/// Flat RAM covering a 24-bit address space.
///
/// Used by CPU tests that need nothing more than bytes at addresses.
pub struct SimpleBus {
    memory: Vec<u8>,
}

impl SimpleBus {
    /// Size of the address space in bytes.
    pub const SIZE: usize = 1 << 24;

    #[must_use]
    pub fn new() -> Self {
        Self {
            memory: vec![0; Self::SIZE],
        }
    }

    /// Copy `data` into memory starting at `address`.
    pub fn load(&mut self, address: u32, data: &[u8]) {
        for (offset, &byte) in data.iter().enumerate() {
            let index = (address as usize + offset) & (Self::SIZE - 1);
            self.memory[index] = byte;
        }
    }

    /// Peek a byte without going through the trait.
    #[must_use]
    pub fn peek(&self, address: u32) -> u8 {
        self.memory[address as usize & (Self::SIZE - 1)]
    }
}

impl Default for SimpleBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for SimpleBus {
    fn read(&mut self, address: u32) -> u8 {
        self.memory[address as usize & (Self::SIZE - 1)]
    }

    fn write(&mut self, address: u32, value: u8) {
        self.memory[address as usize & (Self::SIZE - 1)] = value;
    }
}
