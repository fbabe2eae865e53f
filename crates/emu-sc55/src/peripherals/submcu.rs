//! Sub-MCU serial bridge.
//!
//! The SC-55mkII family has a second microcontroller between the computer
//! port and the main MCU. Its firmware is not executed: the bridge queues
//! bytes from the computer port, hands them to the main UART one at a time
//! with a byte delay, and exposes the shared register area the main MCU
//! sees at 0xEC00-0xEFFF.

use super::ByteQueue;
use super::sci::UART_BUFFER_SIZE;

/// Sub-MCU program ROM size.
pub const SUBMCU_ROM_SIZE: usize = 0x1000;
/// Shared register area size.
pub const SHARED_SIZE: usize = 0x400;
/// States between two bytes forwarded from the computer port.
pub const SERIAL_BYTE_DELAY: u64 = 100;

pub struct SubMcu {
    rom: Box<[u8]>,
    shared: Box<[u8]>,
    serial_in: ByteQueue,
    ready_at: u64,
}

impl Default for SubMcu {
    fn default() -> Self {
        Self::new()
    }
}

impl SubMcu {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rom: vec![0; SUBMCU_ROM_SIZE].into_boxed_slice(),
            shared: vec![0; SHARED_SIZE].into_boxed_slice(),
            serial_in: ByteQueue::new(UART_BUFFER_SIZE),
            ready_at: 0,
        }
    }

    /// Clear the shared area and drop queued input. The ROM survives.
    pub fn reset(&mut self) {
        self.shared.fill(0);
        self.serial_in.clear();
        self.ready_at = 0;
    }

    pub fn rom_mut(&mut self) -> &mut [u8] {
        &mut self.rom
    }

    #[must_use]
    pub fn rom(&self) -> &[u8] {
        &self.rom
    }

    /// Queue a byte arriving on the computer port.
    pub fn post_serial(&mut self, byte: u8) {
        self.serial_in.push(byte);
    }

    #[must_use]
    pub fn pending_input(&self) -> usize {
        self.serial_in.len()
    }

    /// Next byte for the main UART, if the byte delay has elapsed.
    pub fn take_serial(&mut self, now: u64) -> Option<u8> {
        if now < self.ready_at {
            return None;
        }
        let byte = self.serial_in.pop()?;
        self.ready_at = now + SERIAL_BYTE_DELAY;
        Some(byte)
    }

    #[must_use]
    pub fn read(&self, offset: u16) -> u8 {
        self.shared[usize::from(offset) % SHARED_SIZE]
    }

    pub fn write(&mut self, offset: u16, value: u8) {
        self.shared[usize::from(offset) % SHARED_SIZE] = value;
    }
}
