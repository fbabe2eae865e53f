//! PCM sound generator.
//!
//! The firmware programs voices through a small register window: select a
//! voice, select a parameter, then write the parameter as a high/low byte
//! pair (the low byte commits). The chip runs a sample clock derived from
//! the MCU clock; every sample period it renders one stereo frame and, when
//! enabled, raises its interrupt line so the firmware can feed the next
//! envelope step.
//!
//! | Offset | Register |
//! |--------|----------|
//! | 0x00   | Voice select (0-31) |
//! | 0x01   | Parameter select |
//! | 0x02   | Parameter data, high byte |
//! | 0x03   | Parameter data, low byte (commits) |
//! | 0x3E   | Config (bit 0: sample IRQ enable) |
//! | 0x3F   | Status (bit 0: IRQ pending, cleared by reading) |
//!
//! Wave addresses are 24 bits. Bits 22-21 select the bank: wave ROM 1,
//! wave ROM 2, wave ROM 3 (or the JV-880 expansion), or the card.

#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]

use emu_core::saturating_add_i32;
use tracing::trace;

use crate::audio::AudioFrame;
use crate::rom::RomLocation;
use crate::romset::Romset;

pub const REGISTER_COUNT: usize = 0x40;
pub const VOICE_COUNT: usize = 32;

pub const VOICE_SELECT: u8 = 0x00;
pub const PARAM_SELECT: u8 = 0x01;
pub const DATA_HIGH: u8 = 0x02;
pub const DATA_LOW: u8 = 0x03;
pub const CONFIG: u8 = 0x3E;
pub const STATUS: u8 = 0x3F;

pub const CONFIG_IRQ_ENABLE: u8 = 0x01;
pub const STATUS_IRQ: u8 = 0x01;

/// Voice parameters.
pub mod param {
    /// Bits 7-0 of the word are wave address bits 23-16.
    pub const WAVE_HIGH: u8 = 0;
    pub const WAVE_LOW: u8 = 1;
    /// Step per sample, 8.8 fixed point.
    pub const PITCH: u8 = 2;
    pub const VOLUME_LEFT: u8 = 3;
    pub const VOLUME_RIGHT: u8 = 4;
    /// Loop length in samples; 0 plays once.
    pub const LOOP_LENGTH: u8 = 5;
    pub const CONTROL: u8 = 6;

    pub const COUNT: usize = 7;
}

/// Control bit 15 starts the voice.
pub const KEY_ON: u16 = 0x8000;

/// Output rate of first-generation boards.
pub const MK1_SAMPLE_RATE: u32 = 32_000;
/// Output rate of the JV-880.
pub const JV880_SAMPLE_RATE: u32 = 64_000;
/// Output rate of second-generation boards.
pub const MK2_SAMPLE_RATE: u32 = 66_207;

/// Native sample rate of the PCM chip on a given board.
#[must_use]
pub const fn sample_rate(romset: Romset) -> u32 {
    let caps = romset.capabilities();
    if caps.jv880 {
        JV880_SAMPLE_RATE
    } else if caps.mk1 {
        MK1_SAMPLE_RATE
    } else {
        MK2_SAMPLE_RATE
    }
}

const ONE_SHOT_LIMIT: u32 = 0xFFFF;

#[derive(Debug, Clone, Copy, Default)]
struct Voice {
    params: [u16; param::COUNT],
    /// Sample offset from the start address, 24.8 fixed point.
    position: u32,
    active: bool,
}

impl Voice {
    fn start_address(&self) -> u32 {
        (u32::from(self.params[param::WAVE_HIGH as usize] & 0xFF) << 16)
            | u32::from(self.params[param::WAVE_LOW as usize])
    }

    fn set(&mut self, index: u8, value: u16) {
        let Some(slot) = self.params.get_mut(usize::from(index)) else {
            trace!(index, "write to unknown PCM voice parameter");
            return;
        };
        *slot = value;
        if index == param::CONTROL {
            let key_on = value & KEY_ON != 0;
            if key_on && !self.active {
                self.position = 0;
            }
            self.active = key_on;
        }
    }

    fn get(&self, index: u8) -> u16 {
        self.params.get(usize::from(index)).copied().unwrap_or(0)
    }

    fn render(&mut self, banks: &WaveBanks) -> (i32, i32) {
        if !self.active {
            return (0, 0);
        }
        let offset = self.position >> 8;
        let sample = i32::from(banks.sample(self.start_address().wrapping_add(offset)) as i8);
        let left = sample * i32::from(self.params[param::VOLUME_LEFT as usize]);
        let right = sample * i32::from(self.params[param::VOLUME_RIGHT as usize]);

        self.position = self
            .position
            .wrapping_add(u32::from(self.params[param::PITCH as usize]));
        let loop_length = u32::from(self.params[param::LOOP_LENGTH as usize]);
        if loop_length != 0 {
            while self.position >> 8 >= loop_length {
                self.position -= loop_length << 8;
            }
        } else if self.position >> 8 > ONE_SHOT_LIMIT {
            self.active = false;
            self.params[param::CONTROL as usize] &= !KEY_ON;
        }
        (left, right)
    }
}

/// Unscrambled wave ROM contents.
#[derive(Debug, Clone, Default)]
pub struct WaveBanks {
    wave1: Vec<u8>,
    wave2: Vec<u8>,
    wave3: Vec<u8>,
    expansion: Vec<u8>,
    card: Vec<u8>,
}

impl WaveBanks {
    fn slot_mut(&mut self, location: RomLocation) -> Option<&mut Vec<u8>> {
        match location {
            RomLocation::Waverom1 => Some(&mut self.wave1),
            RomLocation::Waverom2 => Some(&mut self.wave2),
            RomLocation::Waverom3 => Some(&mut self.wave3),
            RomLocation::WaveromExp => Some(&mut self.expansion),
            RomLocation::WaveromCard => Some(&mut self.card),
            _ => None,
        }
    }

    #[must_use]
    pub fn get(&self, location: RomLocation) -> &[u8] {
        match location {
            RomLocation::Waverom1 => &self.wave1,
            RomLocation::Waverom2 => &self.wave2,
            RomLocation::Waverom3 => &self.wave3,
            RomLocation::WaveromExp => &self.expansion,
            RomLocation::WaveromCard => &self.card,
            _ => &[],
        }
    }

    /// Byte at a 24-bit wave address. Unpopulated space reads 0.
    #[must_use]
    pub fn sample(&self, address: u32) -> u8 {
        let offset = (address & 0x1F_FFFF) as usize;
        let bank = match (address >> 21) & 3 {
            0 => &self.wave1,
            1 => &self.wave2,
            2 if self.wave3.is_empty() => &self.expansion,
            2 => &self.wave3,
            _ => &self.card,
        };
        bank.get(offset).copied().unwrap_or(0)
    }
}

/// Converts MCU states into sample periods without drift.
#[derive(Debug, Clone, Copy)]
struct SampleClock {
    mcu_hz: u64,
    rate: u64,
    accumulator: u64,
}

impl SampleClock {
    fn samples(&mut self, states: u64) -> u64 {
        self.accumulator += states * self.rate;
        let samples = self.accumulator / self.mcu_hz;
        self.accumulator %= self.mcu_hz;
        samples
    }
}

pub struct Pcm {
    registers: [u8; REGISTER_COUNT],
    voices: [Voice; VOICE_COUNT],
    data_high: u8,
    status: u8,
    banks: WaveBanks,
    clock: SampleClock,
    oversampling: bool,
    /// Toggles every sample when oversampling is off.
    odd_sample: bool,
}

impl Pcm {
    #[must_use]
    pub fn new(sample_rate: u32, mcu_hz: u64) -> Self {
        Self {
            registers: [0; REGISTER_COUNT],
            voices: [Voice::default(); VOICE_COUNT],
            data_high: 0,
            status: 0,
            banks: WaveBanks::default(),
            clock: SampleClock {
                mcu_hz,
                rate: u64::from(sample_rate),
                accumulator: 0,
            },
            oversampling: true,
            odd_sample: false,
        }
    }

    /// Silence all voices and clear the registers. Wave ROMs survive.
    pub fn reset(&mut self) {
        self.registers = [0; REGISTER_COUNT];
        self.voices = [Voice::default(); VOICE_COUNT];
        self.data_high = 0;
        self.status = 0;
        self.clock.accumulator = 0;
        self.odd_sample = false;
    }

    /// Change the chip's clocking after a board is selected.
    pub fn set_clock(&mut self, sample_rate: u32, mcu_hz: u64) {
        self.clock = SampleClock {
            mcu_hz,
            rate: u64::from(sample_rate),
            accumulator: 0,
        };
    }

    pub fn set_oversampling(&mut self, enabled: bool) {
        self.oversampling = enabled;
    }

    #[must_use]
    pub const fn oversampling(&self) -> bool {
        self.oversampling
    }

    /// Rate of the frames passed to the sample sink.
    #[must_use]
    pub const fn output_frequency(&self) -> u32 {
        let rate = self.clock.rate as u32;
        if self.oversampling { rate } else { rate / 2 }
    }

    /// Store an unscrambled wave ROM. Non-wave locations are ignored.
    pub fn load_wave(&mut self, location: RomLocation, data: Vec<u8>) {
        if let Some(slot) = self.banks.slot_mut(location) {
            *slot = data;
        }
    }

    #[must_use]
    pub const fn banks(&self) -> &WaveBanks {
        &self.banks
    }

    /// Interrupt output.
    #[must_use]
    pub const fn irq(&self) -> bool {
        self.status & STATUS_IRQ != 0
    }

    #[must_use]
    pub fn is_voice_active(&self, voice: usize) -> bool {
        self.voices.get(voice).is_some_and(|v| v.active)
    }

    fn selected(&self) -> (usize, u8) {
        (
            usize::from(self.registers[VOICE_SELECT as usize]) % VOICE_COUNT,
            self.registers[PARAM_SELECT as usize],
        )
    }

    pub fn read(&mut self, offset: u8) -> u8 {
        let offset = offset & 0x3F;
        match offset {
            DATA_HIGH | DATA_LOW => {
                let (voice, index) = self.selected();
                let [hi, lo] = self.voices[voice].get(index).to_be_bytes();
                if offset == DATA_HIGH { hi } else { lo }
            }
            STATUS => std::mem::take(&mut self.status),
            _ => self.registers[usize::from(offset)],
        }
    }

    pub fn write(&mut self, offset: u8, value: u8) {
        let offset = offset & 0x3F;
        match offset {
            VOICE_SELECT => self.registers[usize::from(offset)] = value & 0x1F,
            DATA_HIGH => self.data_high = value,
            DATA_LOW => {
                let (voice, index) = self.selected();
                self.voices[voice].set(index, u16::from_be_bytes([self.data_high, value]));
            }
            STATUS => {}
            _ => self.registers[usize::from(offset)] = value,
        }
    }

    /// Run the sample clock for `states` MCU states, passing each output
    /// frame to `sink`.
    pub fn advance(&mut self, states: u64, sink: &mut dyn FnMut(AudioFrame<i32>)) {
        for _ in 0..self.clock.samples(states) {
            let frame = self.render();
            if self.registers[CONFIG as usize] & CONFIG_IRQ_ENABLE != 0 {
                self.status |= STATUS_IRQ;
            }
            self.odd_sample = !self.odd_sample;
            if self.oversampling || self.odd_sample {
                sink(frame);
            }
        }
    }

    fn render(&mut self) -> AudioFrame<i32> {
        let banks = &self.banks;
        self.voices
            .iter_mut()
            .map(|voice| voice.render(banks))
            .fold(AudioFrame::default(), |acc, (l, r)| AudioFrame {
                left: saturating_add_i32(acc.left, l),
                right: saturating_add_i32(acc.right, r),
            })
    }
}
