//! H8/500 CPU registers.
//!
//! - R0-R7: 8 general registers (16-bit, R7 is the stack pointer, R6 the
//!   frame pointer)
//! - PC: Program counter (16-bit offset within the code page)
//! - SR: Status register (16-bit, see [`crate::flags`])
//! - CP, DP, EP, TP, BR: 8-bit page and base registers

use crate::flags::{INT_MASK, SR_MASK};

/// Operand size of a general-format instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Size {
    Byte,
    Word,
}

impl Size {
    /// All-ones mask for the size.
    #[must_use]
    pub const fn mask(self) -> u16 {
        match self {
            Self::Byte => 0x00FF,
            Self::Word => 0xFFFF,
        }
    }

    /// Sign bit for the size.
    #[must_use]
    pub const fn sign(self) -> u16 {
        match self {
            Self::Byte => 0x0080,
            Self::Word => 0x8000,
        }
    }

    /// Width in bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::Byte => 8,
            Self::Word => 16,
        }
    }

    /// Sign-extend a value of this size to 16 bits.
    #[must_use]
    pub const fn sign_extend(self, value: u16) -> u16 {
        match self {
            Self::Byte => value as u8 as i8 as i16 as u16,
            Self::Word => value,
        }
    }
}

/// H8/500 CPU register set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    /// General registers R0-R7.
    pub r: [u16; 8],
    /// Program counter.
    pub pc: u16,
    /// Status register. Only bits in [`SR_MASK`] are ever set.
    pub sr: u16,
    /// Code page: bits 23-16 of instruction fetch addresses.
    pub cp: u8,
    /// Data page: page for @aa:16 and register-indirect through R0-R3.
    pub dp: u8,
    /// Extra page: page for register-indirect through R4-R5.
    pub ep: u8,
    /// Stack page: page for register-indirect through R6-R7.
    pub tp: u8,
    /// Base register: bits 15-8 of @aa:8 addresses.
    pub br: u8,
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers {
    /// Create registers in reset state (interrupt mask level 7).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            r: [0; 8],
            pc: 0,
            sr: INT_MASK,
            cp: 0,
            dp: 0,
            ep: 0,
            tp: 0,
            br: 0,
        }
    }

    /// Stack pointer (R7).
    #[must_use]
    pub const fn sp(&self) -> u16 {
        self.r[7]
    }

    /// Frame pointer (R6).
    #[must_use]
    pub const fn fp(&self) -> u16 {
        self.r[6]
    }

    /// Page used when `reg` supplies an indirect address.
    #[must_use]
    pub const fn page_for_register(&self, reg: usize) -> u8 {
        if reg >= 6 {
            self.tp
        } else if reg >= 4 {
            self.ep
        } else {
            self.dp
        }
    }

    /// Current interrupt mask level (0-7).
    #[must_use]
    pub const fn interrupt_mask(&self) -> u8 {
        ((self.sr & INT_MASK) >> 8) as u8
    }

    /// Set the interrupt mask level (0-7).
    pub fn set_interrupt_mask(&mut self, level: u8) {
        self.sr = (self.sr & !INT_MASK) | ((u16::from(level) & 7) << 8);
    }

    /// Replace the status register, discarding bits that do not exist.
    pub fn set_sr(&mut self, value: u16) {
        self.sr = value & SR_MASK;
    }

    /// Write a control register as LDC/ANDC/ORC/XORC do.
    ///
    /// Returns `false` for register/size combinations the CPU rejects; the
    /// caller turns that into an invalid-instruction exception.
    pub fn write_control(&mut self, reg: u8, size: Size, value: u16) -> bool {
        match (size, reg) {
            (Size::Word, 0) => self.set_sr(value),
            (Size::Word, 3) => self.br = value as u8,
            (Size::Word, 4) => self.ep = value as u8,
            (Size::Word, 5) => self.dp = value as u8,
            (Size::Byte, 1) => self.set_sr((self.sr & !0x00FF) | (value & 0x00FF)),
            (Size::Byte, 3) => self.br = value as u8,
            (Size::Byte, 4) => self.ep = value as u8,
            (Size::Byte, 5) => self.dp = value as u8,
            (Size::Byte, 7) => self.tp = value as u8,
            _ => return false,
        }
        true
    }

    /// Read a control register as STC does.
    ///
    /// Word reads of the page registers return the page in both bytes.
    #[must_use]
    pub const fn read_control(&self, reg: u8, size: Size) -> Option<u16> {
        let value = match (size, reg) {
            (Size::Word, 0) => self.sr & SR_MASK,
            (Size::Word, 3) => duplicate(self.br),
            (Size::Word, 4) => duplicate(self.ep),
            (Size::Word, 5) => duplicate(self.dp),
            (Size::Byte, 1) => self.sr & SR_MASK & 0x00FF,
            (Size::Byte, 3) => self.br as u16,
            (Size::Byte, 4) => self.ep as u16,
            (Size::Byte, 5) => self.dp as u16,
            (Size::Byte, 7) => self.tp as u16,
            _ => return None,
        };
        Some(value)
    }
}

const fn duplicate(page: u8) -> u16 {
    ((page as u16) << 8) | page as u16
}
