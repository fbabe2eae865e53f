//! 10-bit A/D converter. Offsets are relative to 0x60 in the window.
//!
//! Results are left-justified: ADDRxH holds bits 9-2, bits 7-6 of ADDRxL
//! hold bits 1-0. Channel n stores into ADDR(n & 3).

use hitachi_h8_500::{InterruptController, InterruptSource};

use super::AckFlags;

pub const ADCSR: u8 = 0x08;

pub const ADF: u8 = 0x80;
pub const ADIE: u8 = 0x40;
pub const ADST: u8 = 0x20;
const CONTROL_BITS: u8 = 0x7F;

/// States from ADST to the end of a conversion.
pub const CONVERSION_TIME: u64 = 200;

pub struct Adc {
    data: [u16; 4],
    flags: AckFlags,
    control: u8,
    done_at: Option<u64>,
}

impl Default for Adc {
    fn default() -> Self {
        Self::new()
    }
}

impl Adc {
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: [0; 4],
            flags: AckFlags::new(0),
            control: 0,
            done_at: None,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Input pin selected by ADCSR.
    #[must_use]
    pub const fn channel(&self) -> u8 {
        self.control & 0x07
    }

    #[must_use]
    pub const fn is_converting(&self) -> bool {
        self.done_at.is_some()
    }

    pub fn read(&mut self, offset: u8) -> u8 {
        match offset {
            0..=7 => {
                let value = self.data[usize::from(offset >> 1)];
                if offset & 1 == 0 {
                    (value >> 2) as u8
                } else {
                    ((value << 6) & 0xC0) as u8
                }
            }
            ADCSR => self.flags.read() | self.control,
            _ => 0xFF,
        }
    }

    pub fn write(&mut self, offset: u8, value: u8, now: u64) {
        if offset != ADCSR {
            return;
        }
        self.flags.write(value, ADF);
        self.control = value & CONTROL_BITS;
        if value & ADST != 0 && self.done_at.is_none() {
            self.done_at = Some(now + CONVERSION_TIME);
        } else if value & ADST == 0 {
            self.done_at = None;
        }
    }

    /// Finish a conversion due by `now`, sampling `level` (10 bits) from the
    /// selected pin.
    pub fn advance(&mut self, now: u64, level: u16) {
        match self.done_at {
            Some(done_at) if now >= done_at => {
                self.data[usize::from(self.channel() & 3)] = level & 0x3FF;
                self.flags.set(ADF);
                self.control &= !ADST;
                self.done_at = None;
            }
            _ => {}
        }
    }

    pub fn update_interrupts(&self, ic: &mut InterruptController) {
        ic.set_request(
            InterruptSource::Adi,
            self.flags.is_set(ADF) && self.control & ADIE != 0,
        );
    }
}
