//! Program ROMs and the RAM arenas the bus resolves into.

/// ROM1 size (page 0, 0x0000-0x7FFF).
pub const ROM1_SIZE: usize = 0x8000;
/// Largest ROM2 image.
pub const ROM2_SIZE: usize = 0x8_0000;
/// On-chip RAM.
pub const RAM_SIZE: usize = 0x400;
/// Battery-backed SRAM.
pub const SRAM_SIZE: usize = 0x8000;
/// JV-880 NVRAM.
pub const NVRAM_SIZE: usize = 0x8000;
/// JV-880 memory card.
pub const CARDRAM_SIZE: usize = 0x8000;

/// JV-880 NVRAM byte holding the LCD contrast.
pub const NVRAM_CONTRAST: usize = 0x10;

/// Backing storage for the main MCU.
pub struct Memory {
    pub rom1: Box<[u8]>,
    pub rom2: Box<[u8]>,
    /// Always one less than a power of two.
    pub rom2_mask: usize,
    pub ram: Box<[u8]>,
    pub sram: Box<[u8]>,
    pub nvram: Box<[u8]>,
    pub cardram: Box<[u8]>,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rom1: vec![0; ROM1_SIZE].into_boxed_slice(),
            rom2: vec![0; ROM2_SIZE].into_boxed_slice(),
            rom2_mask: ROM2_SIZE - 1,
            ram: vec![0; RAM_SIZE].into_boxed_slice(),
            sram: vec![0; SRAM_SIZE].into_boxed_slice(),
            nvram: vec![0; NVRAM_SIZE].into_boxed_slice(),
            cardram: vec![0; CARDRAM_SIZE].into_boxed_slice(),
        }
    }

    /// Read ROM2 through the size mask.
    #[must_use]
    pub fn rom2(&self, offset: usize) -> u8 {
        self.rom2[offset & self.rom2_mask]
    }
}
