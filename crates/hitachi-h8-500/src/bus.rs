//! Bus access as seen by the H8/500.
//!
//! The CPU addresses 24 bits: an 8-bit page in bits 23-16 and a 16-bit
//! offset. Word accesses are big-endian and always aligned (bit 0 of the
//! address is ignored). The interrupt controller is an on-chip module, but
//! it lives with the bus because the peripheral register window and the
//! peripherals behind it drive it.

use emu_core::{Bus, SimpleBus};

use crate::interrupt::InterruptController;

/// Bus interface required by [`crate::H8500`].
pub trait H8Bus: Bus {
    /// The on-chip interrupt controller.
    fn interrupts(&mut self) -> &mut InterruptController;
}

/// Combine a page and a 16-bit offset into a 24-bit address.
#[must_use]
pub const fn address(page: u8, offset: u16) -> u32 {
    ((page as u32) << 16) + offset as u32
}

/// Aligned big-endian word read.
pub fn read16<B: Bus + ?Sized>(bus: &mut B, addr: u32) -> u16 {
    let addr = addr & !1;
    let hi = bus.read(addr);
    let lo = bus.read(addr + 1);
    u16::from_be_bytes([hi, lo])
}

/// Aligned big-endian word write.
pub fn write16<B: Bus + ?Sized>(bus: &mut B, addr: u32, value: u16) {
    let addr = addr & !1;
    let [hi, lo] = value.to_be_bytes();
    bus.write(addr, hi);
    bus.write(addr + 1, lo);
}

/// Long read made of two aligned word reads, used for vector fetches.
pub fn read32<B: Bus + ?Sized>(bus: &mut B, addr: u32) -> u32 {
    let addr = addr & !3;
    let hi = read16(bus, addr);
    let lo = read16(bus, addr + 2);
    (u32::from(hi) << 16) | u32::from(lo)
}

/// Flat memory plus an interrupt controller.
///
/// Enough machine to run the CPU in isolation.
#[derive(Default)]
pub struct FlatBus {
    pub memory: SimpleBus,
    pub interrupts: InterruptController,
}

impl FlatBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy a program or data block into memory.
    pub fn load(&mut self, address: u32, data: &[u8]) {
        self.memory.load(address, data);
    }

    /// Store a 24-bit handler address in the vector table.
    pub fn set_vector(&mut self, vector: u8, handler: u32) {
        let slot = u32::from(vector) * 4;
        self.memory.load(slot, &(handler & 0x00FF_FFFF).to_be_bytes());
    }
}

impl Bus for FlatBus {
    fn read(&mut self, address: u32) -> u8 {
        self.memory.read(address)
    }

    fn write(&mut self, address: u32, value: u8) {
        self.memory.write(address, value);
    }
}

impl H8Bus for FlatBus {
    fn interrupts(&mut self) -> &mut InterruptController {
        &mut self.interrupts
    }
}
