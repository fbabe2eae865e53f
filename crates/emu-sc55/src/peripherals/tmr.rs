//! 8-bit timer (TMR). Register offsets are relative to 0x50 in the window.

use hitachi_h8_500::{InterruptController, InterruptSource};

use super::{AckFlags, Prescaler};

pub const TCR: u8 = 0x00;
pub const TCSR: u8 = 0x01;
pub const TCORA: u8 = 0x02;
pub const TCORB: u8 = 0x03;
pub const TCNT: u8 = 0x04;

// TCR
const CMIEB: u8 = 0x80;
const CMIEA: u8 = 0x40;
const OVIE: u8 = 0x20;
const CCLR_MASK: u8 = 0x18;
const CCLR_MATCH_A: u8 = 0x08;
const CCLR_MATCH_B: u8 = 0x10;

// TCSR
pub const CMFB: u8 = 0x80;
pub const CMFA: u8 = 0x40;
pub const OVF: u8 = 0x20;
const OUTPUT_BITS: u8 = 0x0F;

pub struct Timer8 {
    tcr: u8,
    flags: AckFlags,
    output: u8,
    tcora: u8,
    tcorb: u8,
    tcnt: u8,
    prescaler: Prescaler,
}

impl Default for Timer8 {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer8 {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tcr: 0,
            flags: AckFlags::new(0),
            output: 0,
            tcora: 0xFF,
            tcorb: 0xFF,
            tcnt: 0,
            prescaler: Prescaler::default(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    #[must_use]
    pub const fn counter(&self) -> u8 {
        self.tcnt
    }

    pub fn read(&mut self, offset: u8) -> u8 {
        match offset {
            TCR => self.tcr,
            TCSR => self.flags.read() | self.output,
            TCORA => self.tcora,
            TCORB => self.tcorb,
            TCNT => self.tcnt,
            _ => 0xFF,
        }
    }

    pub fn write(&mut self, offset: u8, value: u8) {
        match offset {
            TCR => self.tcr = value,
            TCSR => {
                self.flags.write(value, CMFB | CMFA | OVF);
                self.output = value & OUTPUT_BITS;
            }
            TCORA => self.tcora = value,
            TCORB => self.tcorb = value,
            TCNT => self.tcnt = value,
            _ => {}
        }
    }

    const fn divider(&self) -> Option<u64> {
        match self.tcr & 0x07 {
            1 => Some(8),
            2 => Some(64),
            3 => Some(1024),
            _ => None,
        }
    }

    pub fn advance(&mut self, states: u64) {
        let Some(divider) = self.divider() else {
            return;
        };
        for _ in 0..self.prescaler.clocks(states, divider) {
            self.count();
        }
    }

    fn count(&mut self) {
        self.tcnt = self.tcnt.wrapping_add(1);
        if self.tcnt == 0 {
            self.flags.set(OVF);
        }
        let clear = self.tcr & CCLR_MASK;
        if self.tcnt == self.tcora {
            self.flags.set(CMFA);
            if clear == CCLR_MATCH_A {
                self.tcnt = 0;
            }
        } else if self.tcnt == self.tcorb {
            self.flags.set(CMFB);
            if clear == CCLR_MATCH_B {
                self.tcnt = 0;
            }
        }
    }

    pub fn update_interrupts(&self, ic: &mut InterruptController) {
        let requested = |flag: u8, enable: u8| self.flags.is_set(flag) && self.tcr & enable != 0;
        ic.set_request(InterruptSource::TmrCmia, requested(CMFA, CMIEA));
        ic.set_request(InterruptSource::TmrCmib, requested(CMFB, CMIEB));
        ic.set_request(InterruptSource::TmrOvi, requested(OVF, OVIE));
    }
}
