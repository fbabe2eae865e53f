//! Hitachi HD44780 character LCD controller.
//!
//! Only the command/data register pair is modelled: the host writes
//! instructions and character data, and a frontend reads display RAM back
//! to draw the panel. Busy flag and read-back are not used by the firmware
//! that drives it and are not emulated.
//!
//! # Instructions (RS = 0)
//!
//! | Pattern     | Instruction        |
//! |-------------|--------------------|
//! | `0000_0001` | Clear display      |
//! | `0000_001x` | Return home        |
//! | `0000_01IS` | Entry mode set     |
//! | `0000_1DCB` | Display on/off     |
//! | `001L_NFxx` | Function set       |
//! | `01AA_AAAA` | Set CGRAM address  |
//! | `1AAA_AAAA` | Set DDRAM address  |

use tracing::trace;

/// Display RAM size in characters (two lines of 40).
pub const DDRAM_SIZE: usize = 80;
/// Characters per line in two-line mode.
pub const LINE_LENGTH: usize = 40;
/// Character generator RAM size (eight 5x8 glyphs).
pub const CGRAM_SIZE: usize = 64;

/// Which RAM data writes go to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RamTarget {
    Cgram,
    Ddram,
}

/// Register select line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    Instruction,
    Data,
}

/// Everything a renderer needs to draw the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayState {
    pub ddram: [u8; DDRAM_SIZE],
    pub cgram: [u8; CGRAM_SIZE],
    pub display_on: bool,
    pub cursor_on: bool,
    pub blink_on: bool,
    pub two_lines: bool,
    pub cursor: u8,
}

impl DisplayState {
    /// Text of one line in two-line mode.
    #[must_use]
    pub fn line(&self, row: usize) -> &[u8] {
        let start = (row % 2) * LINE_LENGTH;
        &self.ddram[start..start + LINE_LENGTH]
    }

    /// Glyph rows (5 bits each) for a CGRAM character code 0-7.
    #[must_use]
    pub fn glyph(&self, code: u8) -> &[u8] {
        let start = usize::from(code & 7) * 8;
        &self.cgram[start..start + 8]
    }
}

/// HD44780 controller state.
pub struct Hd44780 {
    eight_bit: bool,
    two_lines: bool,
    large_font: bool,
    display_on: bool,
    cursor_on: bool,
    blink_on: bool,
    increment: bool,
    shift: bool,
    ddram_address: u8,
    cgram_address: u8,
    target: RamTarget,
    ddram: [u8; DDRAM_SIZE],
    cgram: [u8; CGRAM_SIZE],
}

impl Default for Hd44780 {
    fn default() -> Self {
        Self::new()
    }
}

impl Hd44780 {
    #[must_use]
    pub fn new() -> Self {
        Self {
            eight_bit: true,
            two_lines: false,
            large_font: false,
            display_on: false,
            cursor_on: false,
            blink_on: false,
            increment: true,
            shift: false,
            ddram_address: 0,
            cgram_address: 0,
            target: RamTarget::Ddram,
            ddram: [b' '; DDRAM_SIZE],
            cgram: [0; CGRAM_SIZE],
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Write through the register select line.
    pub fn write(&mut self, register: Register, value: u8) {
        match register {
            Register::Instruction => self.write_instruction(value),
            Register::Data => self.write_data(value),
        }
    }

    pub fn write_instruction(&mut self, value: u8) {
        if value & 0xE0 == 0x20 {
            self.eight_bit = value & 0x10 != 0;
            self.two_lines = value & 0x08 != 0;
            self.large_font = value & 0x04 != 0;
        } else if value & 0xF8 == 0x08 {
            self.display_on = value & 0x04 != 0;
            self.cursor_on = value & 0x02 != 0;
            self.blink_on = value & 0x01 != 0;
        } else if value == 0x01 {
            self.ddram_address = 0;
            self.increment = true;
            self.ddram.fill(b' ');
        } else if value & 0xFE == 0x02 {
            self.ddram_address = 0;
        } else if value & 0xFC == 0x04 {
            self.increment = value & 0x02 != 0;
            self.shift = value & 0x01 != 0;
        } else if value & 0xC0 == 0x40 {
            self.cgram_address = value & 0x3F;
            self.target = RamTarget::Cgram;
        } else if value & 0x80 != 0 {
            self.ddram_address = value & 0x7F;
            self.target = RamTarget::Ddram;
        } else {
            trace!(value, "ignored LCD instruction");
        }
    }

    pub fn write_data(&mut self, value: u8) {
        match self.target {
            RamTarget::Cgram => {
                self.cgram[usize::from(self.cgram_address)] = value & 0x1F;
                self.cgram_address = self.step(self.cgram_address) & 0x3F;
            }
            RamTarget::Ddram => {
                if let Some(index) = self.ddram_index(self.ddram_address) {
                    self.ddram[index] = value;
                }
                self.ddram_address = self.step(self.ddram_address) & 0x7F;
            }
        }
    }

    const fn step(&self, address: u8) -> u8 {
        if self.increment {
            address.wrapping_add(1)
        } else {
            address.wrapping_sub(1)
        }
    }

    /// Map a DDRAM address to a character cell. In two-line mode the
    /// second line starts at 0x40; addresses past column 39 have no cell.
    fn ddram_index(&self, address: u8) -> Option<usize> {
        let index = if self.two_lines {
            let column = usize::from(address & 0x3F);
            if column >= LINE_LENGTH {
                return None;
            }
            if address & 0x40 != 0 {
                column + LINE_LENGTH
            } else {
                column
            }
        } else {
            usize::from(address)
        };
        (index < DDRAM_SIZE).then_some(index)
    }

    #[must_use]
    pub const fn ddram_address(&self) -> u8 {
        self.ddram_address
    }

    #[must_use]
    pub const fn cgram_address(&self) -> u8 {
        self.cgram_address
    }

    #[must_use]
    pub const fn target(&self) -> RamTarget {
        self.target
    }

    #[must_use]
    pub const fn is_display_on(&self) -> bool {
        self.display_on
    }

    #[must_use]
    pub const fn is_eight_bit(&self) -> bool {
        self.eight_bit
    }

    #[must_use]
    pub const fn uses_large_font(&self) -> bool {
        self.large_font
    }

    #[must_use]
    pub const fn shifts_display(&self) -> bool {
        self.shift
    }

    #[must_use]
    pub fn ddram(&self) -> &[u8; DDRAM_SIZE] {
        &self.ddram
    }

    #[must_use]
    pub fn cgram(&self) -> &[u8; CGRAM_SIZE] {
        &self.cgram
    }

    /// Copy out what the renderer needs.
    #[must_use]
    pub fn state(&self) -> DisplayState {
        DisplayState {
            ddram: self.ddram,
            cgram: self.cgram,
            display_on: self.display_on,
            cursor_on: self.cursor_on,
            blink_on: self.blink_on,
            two_lines: self.two_lines,
            cursor: self.ddram_address,
        }
    }
}
