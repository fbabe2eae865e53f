//! Serial communication interface (the MCU's UART).
//!
//! MIDI IN is wired straight to the receiver. On boards with a sub-MCU the
//! computer port also reaches the receiver through it, so the receiver
//! takes bytes from two queues, each with its own byte delay.
//!
//! Offsets are relative to 0x58 in the register window.

use hitachi_h8_500::{InterruptController, InterruptSource};

use super::submcu::SubMcu;
use super::{AckFlags, ByteQueue};

pub const SMR: u8 = 0x00;
pub const BRR: u8 = 0x01;
pub const SCR: u8 = 0x02;
pub const TDR: u8 = 0x03;
pub const SSR: u8 = 0x04;
pub const RDR: u8 = 0x05;

// SCR
pub const TIE: u8 = 0x80;
pub const RIE: u8 = 0x40;
pub const TE: u8 = 0x20;
pub const RE: u8 = 0x10;

// SSR
pub const TDRE: u8 = 0x80;
pub const RDRF: u8 = 0x40;
pub const ORER: u8 = 0x20;
pub const FER: u8 = 0x10;
pub const PER: u8 = 0x08;

/// Capacity of each receive queue.
pub const UART_BUFFER_SIZE: usize = 8192;
/// States between acknowledging one received byte and presenting the next.
pub const RX_BYTE_DELAY: u64 = 100;
/// States a transmitted byte spends in the shift register.
pub const TX_BYTE_DELAY: u64 = 3000;

pub struct Sci {
    smr: u8,
    brr: u8,
    scr: u8,
    tdr: u8,
    rdr: u8,
    ssr: AckFlags,
    midi_in: ByteQueue,
    /// Earliest cycle the next MIDI byte may be presented.
    midi_ready_at: u64,
    /// Byte in the transmit shift register and the cycle it leaves.
    transmitting: Option<(u8, u64)>,
}

impl Default for Sci {
    fn default() -> Self {
        Self::new()
    }
}

impl Sci {
    #[must_use]
    pub fn new() -> Self {
        Self {
            smr: 0,
            brr: 0xFF,
            scr: 0,
            tdr: 0xFF,
            rdr: 0,
            ssr: AckFlags::new(TDRE),
            midi_in: ByteQueue::new(UART_BUFFER_SIZE),
            midi_ready_at: 0,
            transmitting: None,
        }
    }

    /// Register state returns to power-on values. Queued input is dropped.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Queue a byte arriving on MIDI IN.
    pub fn post_byte(&mut self, byte: u8) {
        self.midi_in.push(byte);
    }

    /// Bytes waiting on MIDI IN.
    #[must_use]
    pub fn pending_input(&self) -> usize {
        self.midi_in.len()
    }

    #[must_use]
    pub const fn status(&self) -> u8 {
        self.ssr.get()
    }

    #[must_use]
    pub const fn control(&self) -> u8 {
        self.scr
    }

    pub fn read(&mut self, offset: u8) -> u8 {
        match offset {
            SMR => self.smr,
            BRR => self.brr,
            SCR => self.scr,
            TDR => self.tdr,
            SSR => self.ssr.read(),
            RDR => self.rdr,
            _ => 0xFF,
        }
    }

    pub fn write(&mut self, offset: u8, value: u8, now: u64) {
        match offset {
            SMR => self.smr = value,
            BRR => self.brr = value,
            SCR => self.scr = value,
            TDR => self.tdr = value,
            SSR => {
                let cleared = self.ssr.write(value, TDRE | RDRF | ORER | FER | PER);
                if cleared & RDRF != 0 {
                    self.midi_ready_at = now + RX_BYTE_DELAY;
                }
                if cleared & TDRE != 0 && self.scr & TE != 0 {
                    self.transmitting = Some((self.tdr, now + TX_BYTE_DELAY));
                }
            }
            _ => {}
        }
    }

    /// Move the receiver and transmitter up to cycle `now`. Returns a byte
    /// that finished transmitting.
    pub fn advance(&mut self, now: u64, submcu: Option<&mut SubMcu>) -> Option<u8> {
        if self.scr & RE != 0 && !self.ssr.is_set(RDRF) {
            let byte = if now >= self.midi_ready_at {
                self.midi_in.pop()
            } else {
                None
            };
            if let Some(byte) = byte.or_else(|| submcu.and_then(|sm| sm.take_serial(now))) {
                self.rdr = byte;
                self.ssr.set(RDRF);
            }
        }

        match self.transmitting {
            Some((byte, done_at)) if now >= done_at => {
                self.transmitting = None;
                self.ssr.set(TDRE);
                Some(byte)
            }
            _ => None,
        }
    }

    pub fn update_interrupts(&self, ic: &mut InterruptController) {
        let rx = self.scr & RIE != 0;
        ic.set_request(
            InterruptSource::SciEri,
            rx && self.ssr.is_set(ORER | FER | PER),
        );
        ic.set_request(InterruptSource::SciRxi, rx && self.ssr.is_set(RDRF));
        ic.set_request(
            InterruptSource::SciTxi,
            self.scr & TIE != 0 && self.ssr.is_set(TDRE),
        );
    }
}
