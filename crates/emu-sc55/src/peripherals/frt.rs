//! 16-bit free-running timers (FRT1-FRT3).
//!
//! | Offset | Register |
//! |--------|----------|
//! | 0 | TCR |
//! | 1 | TCSR |
//! | 2-3 | FRC |
//! | 4-5 | OCRA |
//! | 6-7 | OCRB |
//! | 8-9 | ICR |
//!
//! Reading the high byte of FRC or ICR latches the low byte into a temp
//! register; writing the high byte of FRC or an OCR stores it in the temp
//! register until the low byte completes the word.

use hitachi_h8_500::{InterruptController, InterruptSource};

use super::{AckFlags, Prescaler};

pub const TCR: u8 = 0x00;
pub const TCSR: u8 = 0x01;
pub const FRCH: u8 = 0x02;
pub const FRCL: u8 = 0x03;
pub const OCRAH: u8 = 0x04;
pub const OCRAL: u8 = 0x05;
pub const OCRBH: u8 = 0x06;
pub const OCRBL: u8 = 0x07;
pub const ICRH: u8 = 0x08;
pub const ICRL: u8 = 0x09;

// TCR
const ICIE: u8 = 0x80;
const OCIEB: u8 = 0x40;
const OCIEA: u8 = 0x20;
const OVIE: u8 = 0x10;

// TCSR
pub const ICF: u8 = 0x80;
pub const OCFB: u8 = 0x40;
pub const OCFA: u8 = 0x20;
pub const OVF: u8 = 0x10;
const CCLRA: u8 = 0x01;
const CONTROL_BITS: u8 = 0x0F;

pub struct FreeRunningTimer {
    channel: u8,
    tcr: u8,
    flags: AckFlags,
    control: u8,
    frc: u16,
    ocra: u16,
    ocrb: u16,
    icr: u16,
    temp: u8,
    prescaler: Prescaler,
}

impl FreeRunningTimer {
    /// `channel` is 0 for FRT1 through 2 for FRT3.
    #[must_use]
    pub fn new(channel: u8) -> Self {
        Self {
            channel,
            tcr: 0,
            flags: AckFlags::new(0),
            control: 0,
            frc: 0,
            ocra: 0xFFFF,
            ocrb: 0xFFFF,
            icr: 0,
            temp: 0,
            prescaler: Prescaler::default(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.channel);
    }

    #[must_use]
    pub const fn counter(&self) -> u16 {
        self.frc
    }

    #[must_use]
    pub const fn flags(&self) -> u8 {
        self.flags.get()
    }

    pub fn read(&mut self, offset: u8) -> u8 {
        match offset {
            TCR => self.tcr,
            TCSR => self.flags.read() | self.control,
            FRCH => {
                let [hi, lo] = self.frc.to_be_bytes();
                self.temp = lo;
                hi
            }
            ICRH => {
                let [hi, lo] = self.icr.to_be_bytes();
                self.temp = lo;
                hi
            }
            FRCL | ICRL => self.temp,
            OCRAH => (self.ocra >> 8) as u8,
            OCRAL => self.ocra as u8,
            OCRBH => (self.ocrb >> 8) as u8,
            OCRBL => self.ocrb as u8,
            _ => 0xFF,
        }
    }

    pub fn write(&mut self, offset: u8, value: u8) {
        match offset {
            TCR => self.tcr = value,
            TCSR => {
                self.flags.write(value, ICF | OCFB | OCFA | OVF);
                self.control = value & CONTROL_BITS;
            }
            FRCH | OCRAH | OCRBH => self.temp = value,
            FRCL => self.frc = u16::from_be_bytes([self.temp, value]),
            OCRAL => self.ocra = u16::from_be_bytes([self.temp, value]),
            OCRBL => self.ocrb = u16::from_be_bytes([self.temp, value]),
            _ => {}
        }
    }

    /// Clock divider selected by TCR, `None` for the (unconnected) external
    /// clock input.
    const fn divider(&self) -> Option<u64> {
        match self.tcr & 0x03 {
            0 => Some(4),
            1 => Some(8),
            2 => Some(32),
            _ => None,
        }
    }

    /// Advance by `states` CPU clock states.
    pub fn advance(&mut self, states: u64) {
        let Some(divider) = self.divider() else {
            return;
        };
        for _ in 0..self.prescaler.clocks(states, divider) {
            self.count();
        }
    }

    fn count(&mut self) {
        self.frc = self.frc.wrapping_add(1);
        if self.frc == 0 {
            self.flags.set(OVF);
        }
        if self.frc == self.ocrb {
            self.flags.set(OCFB);
        }
        if self.frc == self.ocra {
            self.flags.set(OCFA);
            if self.control & CCLRA != 0 {
                self.frc = 0;
            }
        }
    }

    /// Drive this channel's request lines.
    pub fn update_interrupts(&self, ic: &mut InterruptController) {
        let n = self.channel;
        let requested = |flag: u8, enable: u8| self.flags.is_set(flag) && self.tcr & enable != 0;
        ic.set_request(InterruptSource::FrtIci(n), requested(ICF, ICIE));
        ic.set_request(InterruptSource::FrtOcia(n), requested(OCFA, OCIEA));
        ic.set_request(InterruptSource::FrtOcib(n), requested(OCFB, OCIEB));
        ic.set_request(InterruptSource::FrtFovi(n), requested(OVF, OVIE));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_word(frt: &mut FreeRunningTimer, high: u8, value: u16) {
        let [hi, lo] = value.to_be_bytes();
        frt.write(high, hi);
        frt.write(high + 1, lo);
    }

    #[test]
    fn counts_at_selected_rate() {
        let mut frt = FreeRunningTimer::new(0);
        frt.write(TCR, 0x01); // phi/8
        frt.advance(80);
        assert_eq!(frt.counter(), 10);
        frt.write(TCR, 0x03); // external clock: stopped
        frt.advance(800);
        assert_eq!(frt.counter(), 10);
    }

    #[test]
    fn compare_match_clears_counter_and_raises_ocia() {
        let mut frt = FreeRunningTimer::new(1);
        let mut ic = InterruptController::new();
        ic.write_ipr(1, 0x04); // FRT2 level 4
        write_word(&mut frt, OCRAH, 5);
        frt.write(TCSR, CCLRA);
        frt.write(TCR, OCIEA);
        frt.advance(4 * 5);

        assert_eq!(frt.counter(), 0);
        assert_eq!(frt.flags() & OCFA, OCFA);
        frt.update_interrupts(&mut ic);
        assert!(ic.is_pending(InterruptSource::FrtOcia(1)));
        assert_eq!(ic.next(0).map(|d| d.vector), Some(41));
    }

    #[test]
    fn flag_acknowledge_drops_request() {
        let mut frt = FreeRunningTimer::new(0);
        let mut ic = InterruptController::new();
        write_word(&mut frt, OCRAH, 1);
        frt.write(TCR, OCIEA);
        frt.advance(4);
        frt.update_interrupts(&mut ic);
        assert!(ic.is_pending(InterruptSource::FrtOcia(0)));

        let tcsr = frt.read(TCSR);
        frt.write(TCSR, tcsr & !OCFA);
        frt.update_interrupts(&mut ic);
        assert!(!ic.is_pending(InterruptSource::FrtOcia(0)));
    }

    #[test]
    fn overflow_sets_ovf() {
        let mut frt = FreeRunningTimer::new(2);
        write_word(&mut frt, FRCH, 0xFFFF);
        frt.advance(4);
        assert_eq!(frt.counter(), 0);
        assert_eq!(frt.flags() & OVF, OVF);
    }

    #[test]
    fn high_byte_read_latches_low_byte() {
        let mut frt = FreeRunningTimer::new(0);
        write_word(&mut frt, FRCH, 0x12FF);
        assert_eq!(frt.read(FRCH), 0x12);
        frt.advance(4);
        // Low byte comes from the latch, not the live counter.
        assert_eq!(frt.read(FRCL), 0xFF);
        assert_eq!(frt.counter(), 0x1300);
    }
}
