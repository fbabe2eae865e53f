//! SC-55 bus: memory map and device routing.
//!
//! Every address resolves to a [`Target`] first; reads and writes then act
//! on the target. The map depends on the board generation:
//!
//! # Page 0, second-generation boards (base 0xE000, 0xF000 on the JV-880)
//!
//! | Range | Device |
//! |-------|--------|
//! | 0x0000-0x7FFF | ROM1 |
//! | 0x8000-0xDFFF | SRAM |
//! | base+0x000-0x3FF | PCM registers (offset & 0x3F) |
//! | base+0x401 | Gate array interrupt enable |
//! | base+0x402 | Gate array interrupt trigger |
//! | base+0x404/0x405 | LCD instruction/data |
//! | 0xEC00-0xEFFF | Sub-MCU shared area |
//! | 0xFB80-0xFF7F | On-chip RAM (RAME) |
//! | 0xFF80-0xFFFF | Peripheral register window |
//!
//! # Page 0, first-generation boards
//!
//! | Range | Device |
//! |-------|--------|
//! | 0xE000-0xE03F | PCM registers |
//! | 0xF000-0xF0FF | I/O select (address low byte), button read |
//! | 0xF104/0xF105 | LCD instruction/data |
//! | 0xF106 | Gate array trigger (read) / enable (write) |
//! | 0xF107 | I/O select write |
//!
//! # Other pages
//!
//! Pages 1-4 and 8-9 hold ROM2 (not 8-9 on the JV-880). Page 5 mirrors
//! SRAM on first-generation boards. The JV-880 has NVRAM in page 10 and
//! the card in pages 14-15.

#![allow(clippy::cast_possible_truncation)]

use emu_core::Bus;
use hitachi_h8_500::{H8Bus, InterruptController, InterruptSource};
use hitachi_hd44780::Register;
use tracing::{debug, trace};

use crate::audio::AudioFrame;
use crate::lcd::Lcd;
use crate::memory::{Memory, NVRAM_CONTRAST};
use crate::midi::MessageCollector;
use crate::peripherals::adc::Adc;
use crate::peripherals::buttons::{Buttons, RemoteControl};
use crate::peripherals::frt::FreeRunningTimer;
use crate::peripherals::gate_array::{GateArray, line};
use crate::peripherals::pcm::{self, Pcm};
use crate::peripherals::sci::Sci;
use crate::peripherals::submcu::SubMcu;
use crate::peripherals::tmr::Timer8;
use crate::romset::{Capabilities, ComputerSwitch, Romset};

/// Start of the peripheral register window.
pub const WINDOW_BASE: u16 = 0xFF80;
/// Registers in the window.
pub const WINDOW_SIZE: usize = 0x80;
/// Start of on-chip RAM.
pub const RAM_BASE: u16 = 0xFB80;

/// Window offsets of registers the bus handles itself.
pub mod reg {
    pub const P1DDR: u8 = 0x00;
    pub const P5DDR: u8 = 0x08;
    pub const P6DDR: u8 = 0x09;
    pub const P7DDR: u8 = 0x0C;
    pub const P7DR: u8 = 0x0E;
    pub const FRT1: u8 = 0x10;
    pub const FRT2: u8 = 0x20;
    pub const FRT3: u8 = 0x30;
    pub const TMR: u8 = 0x50;
    pub const SCI: u8 = 0x58;
    pub const ADC: u8 = 0x60;
    pub const IPRA: u8 = 0x70;
    pub const IPRD: u8 = 0x73;
    pub const RAME: u8 = 0x79;
    pub const P1CR: u8 = 0x7C;
    pub const P9DDR: u8 = 0x7E;
    pub const P9DR: u8 = 0x7F;
}

/// RAME bit enabling on-chip RAM.
const RAM_ENABLE: u8 = 0x80;

/// Battery sense level on the A/D input.
pub const BATTERY_LEVEL: u16 = 0x2A0;
/// Level of an unused A/D input.
pub const ANALOG_IDLE: u16 = 0x3FF;

/// Where an address lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Rom1(usize),
    Rom2(usize),
    Ram(usize),
    Sram(usize),
    Nvram(usize),
    CardRam(usize),
    Window(u8),
    Pcm(u8),
    SubMcu(u16),
    Lcd(Register),
    GateArrayEnable,
    GateArrayTrigger,
    /// First-generation trigger read / enable write.
    GateArrayControl,
    /// First-generation I/O select by address.
    IoSelect(u8),
    IoSelectLatch,
    Unmapped,
}

pub type SampleSink = Box<dyn FnMut(&AudioFrame<i32>) + Send>;
pub type MidiSink = Box<dyn FnMut(&[u8]) + Send>;
pub type SerialSink = Box<dyn FnMut(u8) + Send>;

/// Host-side receivers of the machine's output.
pub struct Sinks {
    pub sample: SampleSink,
    pub midi_out: MidiSink,
    pub serial_out: SerialSink,
}

impl Default for Sinks {
    fn default() -> Self {
        Self {
            sample: Box::new(|_| {}),
            midi_out: Box::new(|message| debug!(?message, "MIDI out")),
            serial_out: Box::new(|byte| debug!(byte, "serial out")),
        }
    }
}

/// The SC-55 bus, implementing `emu_core::Bus` and `H8Bus`.
///
/// Owns every device the MCU reaches. The emulator steps the CPU against
/// it and then calls [`Sc55Bus::advance`] with the new cycle count.
pub struct Sc55Bus {
    pub memory: Memory,
    pub interrupts: InterruptController,
    pub frt: [FreeRunningTimer; 3],
    pub tmr: Timer8,
    pub sci: Sci,
    pub adc: Adc,
    /// Absent on boards without a sub-MCU.
    pub submcu: Option<SubMcu>,
    pub pcm: Pcm,
    pub lcd: Lcd,
    pub gate_array: GateArray,
    pub buttons: Buttons,
    pub remote: RemoteControl,
    pub sinks: Sinks,
    romset: Romset,
    caps: Capabilities,
    switch: ComputerSwitch,
    /// Window registers without a modelled peripheral.
    registers: [u8; WINDOW_SIZE],
    io_select: u8,
    midi_out: MessageCollector,
    /// Cycle count at the start of the current instruction.
    now: u64,
    /// Cycle count peripherals have been advanced to.
    advanced_to: u64,
}

impl Sc55Bus {
    #[must_use]
    pub fn new(romset: Romset, switch: ComputerSwitch) -> Self {
        let caps = romset.capabilities();
        let mut bus = Self {
            memory: Memory::new(),
            interrupts: InterruptController::new(),
            frt: [
                FreeRunningTimer::new(0),
                FreeRunningTimer::new(1),
                FreeRunningTimer::new(2),
            ],
            tmr: Timer8::new(),
            sci: Sci::new(),
            adc: Adc::new(),
            submcu: caps.submcu.then(SubMcu::new),
            pcm: Pcm::new(pcm::sample_rate(romset), romset.mcu_frequency()),
            lcd: Lcd::new(romset),
            gate_array: GateArray::new(),
            buttons: Buttons::new(),
            remote: RemoteControl::default(),
            sinks: Sinks::default(),
            romset,
            caps,
            switch,
            registers: [0; WINDOW_SIZE],
            io_select: 0,
            midi_out: MessageCollector::new(),
            now: 0,
            advanced_to: 0,
        };
        bus.reset_registers();
        bus
    }

    /// Rewire the board for another model. The sub-MCU is created or
    /// dropped and the PCM clock follows the new MCU clock.
    pub fn set_romset(&mut self, romset: Romset) {
        self.romset = romset;
        self.caps = romset.capabilities();
        if self.caps.submcu != self.submcu.is_some() {
            self.submcu = self.caps.submcu.then(SubMcu::new);
        }
        self.pcm.set_clock(pcm::sample_rate(romset), romset.mcu_frequency());
        self.lcd.set_romset(romset);
    }

    pub fn set_switch(&mut self, switch: ComputerSwitch) {
        self.switch = switch;
    }

    #[must_use]
    pub const fn romset(&self) -> Romset {
        self.romset
    }

    #[must_use]
    pub const fn capabilities(&self) -> Capabilities {
        self.caps
    }

    #[must_use]
    pub const fn switch(&self) -> ComputerSwitch {
        self.switch
    }

    #[must_use]
    pub const fn io_select(&self) -> u8 {
        self.io_select
    }

    /// Return every device to its power-on state. On-chip RAM is cleared;
    /// ROMs, SRAM, NVRAM and card RAM survive.
    pub fn reset(&mut self) {
        self.memory.ram.fill(0);
        self.interrupts.reset();
        for frt in &mut self.frt {
            frt.reset();
        }
        self.tmr.reset();
        self.sci.reset();
        self.adc.reset();
        if let Some(submcu) = &mut self.submcu {
            submcu.reset();
        }
        self.pcm.reset();
        self.lcd.reset();
        self.gate_array.reset();
        self.midi_out.reset();
        self.reset_registers();
    }

    fn reset_registers(&mut self) {
        self.registers = [0; WINDOW_SIZE];
        self.registers[usize::from(reg::RAME)] = RAM_ENABLE;
        self.io_select = 0;
    }

    /// Mark the start of an instruction at cycle `now`.
    pub fn begin(&mut self, now: u64) {
        self.now = now;
    }

    /// Resolve an address to the device it selects.
    #[must_use]
    pub fn resolve(&self, address: u32) -> Target {
        let page = (address >> 16) as u8;
        let offset = address as u16;
        match page {
            0 => self.resolve_page0(offset),
            1..=4 => Target::Rom2(self.rom2_offset(address)),
            8 | 9 if !self.caps.jv880 => Target::Rom2(self.rom2_offset(address)),
            5 if self.caps.mk1 => Target::Sram(usize::from(offset & 0x7FFF)),
            10 if self.caps.jv880 => Target::Nvram(usize::from(offset & 0x7FFF)),
            14 | 15 if self.caps.jv880 => Target::CardRam(usize::from(offset & 0x7FFF)),
            _ => Target::Unmapped,
        }
    }

    /// Read memory without side effects. Devices read as `None`.
    #[must_use]
    pub fn peek(&self, address: u32) -> Option<u8> {
        Some(match self.resolve(address) {
            Target::Rom1(i) => self.memory.rom1[i],
            Target::Rom2(i) => self.memory.rom2(i),
            Target::Ram(i) => self.memory.ram[i],
            Target::Sram(i) => self.memory.sram[i],
            Target::Nvram(i) => self.memory.nvram[i],
            Target::CardRam(i) => self.memory.cardram[i],
            _ => return None,
        })
    }

    fn rom2_offset(&self, address: u32) -> usize {
        let mut offset = (address & 0x3_FFFF) as usize;
        if !self.caps.jv880 && address & 0x8_0000 != 0 {
            offset |= 0x4_0000;
        }
        offset & self.memory.rom2_mask
    }

    fn resolve_page0(&self, offset: u16) -> Target {
        if offset < 0x8000 {
            return Target::Rom1(usize::from(offset));
        }
        if offset >= WINDOW_BASE {
            return Target::Window((offset - WINDOW_BASE) as u8);
        }
        if offset >= RAM_BASE && self.registers[usize::from(reg::RAME)] & RAM_ENABLE != 0 {
            return Target::Ram(usize::from(offset - RAM_BASE));
        }

        if self.caps.mk1 {
            match offset {
                0xE000..=0xE03F => return Target::Pcm((offset & 0x3F) as u8),
                0xF000..=0xF0FF => return Target::IoSelect(offset as u8),
                0xF104 => return Target::Lcd(Register::Instruction),
                0xF105 => return Target::Lcd(Register::Data),
                0xF106 => return Target::GateArrayControl,
                0xF107 => return Target::IoSelectLatch,
                _ => {}
            }
        } else {
            let base: u16 = if self.caps.jv880 { 0xF000 } else { 0xE000 };
            if (base..base + 0x400).contains(&offset) {
                return Target::Pcm((offset & 0x3F) as u8);
            }
            if (base + 0x400..base + 0x800).contains(&offset) {
                return match offset - base {
                    0x401 => Target::GateArrayEnable,
                    0x402 => Target::GateArrayTrigger,
                    0x404 => Target::Lcd(Register::Instruction),
                    0x405 => Target::Lcd(Register::Data),
                    _ => Target::Unmapped,
                };
            }
            if self.submcu.is_some() && (0xEC00..0xF000).contains(&offset) {
                return Target::SubMcu(offset - 0xEC00);
            }
        }

        if offset < 0xE000 {
            return Target::Sram(usize::from(offset & 0x7FFF));
        }
        Target::Unmapped
    }

    /// Run every device up to cycle `now` and refresh interrupt requests.
    pub fn advance(&mut self, now: u64) {
        let states = now.saturating_sub(self.advanced_to);
        self.advanced_to = now;
        self.now = now;

        for frt in &mut self.frt {
            frt.advance(states);
        }
        self.tmr.advance(states);

        if let Some(byte) = self.sci.advance(now, self.submcu.as_mut()) {
            self.transmit(byte);
        }

        let level = self.analog_level(self.adc.channel());
        self.adc.advance(now, level);

        let sample = &mut self.sinks.sample;
        self.pcm.advance(states, &mut |frame| sample(&frame));

        self.remote.advance(&self.buttons, now);
        self.lcd.flush_if_dirty();
        self.update_interrupts();
    }

    fn update_interrupts(&mut self) {
        let ic = &mut self.interrupts;
        for frt in &self.frt {
            frt.update_interrupts(ic);
        }
        self.tmr.update_interrupts(ic);
        self.sci.update_interrupts(ic);
        self.adc.update_interrupts(ic);

        if self.caps.mk1 {
            self.gate_array.set_line(line::PCM, self.pcm.irq());
        }
        let pcm_irq = !self.caps.mk1 && self.pcm.irq();
        let ga_irq = self.gate_array.irq();
        if self.caps.jv880 {
            ic.set_request(InterruptSource::Irq0, pcm_irq || ga_irq);
            ic.set_request(InterruptSource::Irq1, false);
        } else {
            ic.set_request(InterruptSource::Irq0, pcm_irq);
            ic.set_request(InterruptSource::Irq1, ga_irq);
        }
    }

    /// Route a byte that left the UART.
    fn transmit(&mut self, byte: u8) {
        if self.submcu.is_some() && self.switch != ComputerSwitch::Midi {
            (self.sinks.serial_out)(byte);
            return;
        }
        let sink = &mut self.sinks.midi_out;
        self.midi_out.push(byte, &mut |message| sink(message));
    }

    /// Level on an A/D input pin.
    #[must_use]
    pub fn analog_level(&self, pin: u8) -> u16 {
        if self.caps.cm300 {
            return 0;
        }
        if self.caps.jv880 {
            return if pin == 1 { BATTERY_LEVEL } else { ANALOG_IDLE };
        }
        if self.caps.mk1 {
            return if pin == 7 { BATTERY_LEVEL } else { ANALOG_IDLE };
        }
        if pin != 7 {
            return ANALOG_IDLE;
        }
        match (self.io_select >> 2) & 3 {
            // Remote control receiver, idle.
            0 | 1 => 0,
            2 => match self.switch.code() {
                0 => 0,
                1 => 0x155,
                2 => 0x2AA,
                _ => 0x3FF,
            },
            _ => BATTERY_LEVEL,
        }
    }

    /// Pulse an encoder line. `up` selects the direction.
    pub fn encoder_trigger(&mut self, up: bool) {
        let line = if up { line::ENCODER_UP } else { line::ENCODER_DOWN };
        self.gate_array.set_line(line, false);
        self.gate_array.set_line(line, true);
        self.update_interrupts();
    }

    fn set_io_select(&mut self, value: u8) {
        self.io_select = value;
        if self.caps.mk1 {
            self.lcd.set_enabled(value & 0x08 != 0);
        }
    }

    fn read_window(&mut self, offset: u8) -> u8 {
        match offset {
            reg::P7DR if !self.caps.mk1 => self.buttons.row(self.io_select),
            0x10..=0x3F => self.frt[usize::from((offset >> 4) - 1)].read(offset & 0x0F),
            0x50..=0x54 => self.tmr.read(offset - reg::TMR),
            0x58..=0x5D => self.sci.read(offset - reg::SCI),
            0x60..=0x68 => self.adc.read(offset - reg::ADC),
            reg::IPRA..=reg::IPRD => self.interrupts.ipr(usize::from(offset - reg::IPRA)),
            reg::P1CR => self.interrupts.p1cr(),
            reg::P9DR => {
                let ddr = self.registers[usize::from(reg::P9DDR)];
                let input = if self.caps.mk1 { 0x00 } else { 0x02 };
                (self.registers[usize::from(offset)] & ddr) | (input & !ddr)
            }
            _ => self.registers[usize::from(offset)],
        }
    }

    fn write_window(&mut self, offset: u8, value: u8) {
        match offset {
            0x10..=0x3F => self.frt[usize::from((offset >> 4) - 1)].write(offset & 0x0F, value),
            0x50..=0x54 => self.tmr.write(offset - reg::TMR, value),
            0x58..=0x5D => self.sci.write(offset - reg::SCI, value, self.now),
            0x60..=0x68 => self.adc.write(offset - reg::ADC, value, self.now),
            reg::IPRA..=reg::IPRD => {
                self.interrupts.write_ipr(usize::from(offset - reg::IPRA), value);
            }
            reg::P1CR => self.interrupts.write_p1cr(value),
            reg::P9DR => {
                self.registers[usize::from(offset)] = value;
                if !self.caps.mk1 {
                    self.set_io_select(value);
                }
            }
            _ => self.registers[usize::from(offset)] = value,
        }
    }

    fn unmapped(address: u32) -> u8 {
        trace!(address = format_args!("{address:#08X}"), "unmapped read");
        if address >> 16 == 0 { 0xFF } else { 0x00 }
    }
}

impl Bus for Sc55Bus {
    fn read(&mut self, address: u32) -> u8 {
        match self.resolve(address) {
            Target::Rom1(i) => self.memory.rom1[i],
            Target::Rom2(i) => self.memory.rom2(i),
            Target::Ram(i) => self.memory.ram[i],
            Target::Sram(i) => self.memory.sram[i],
            Target::Nvram(i) => self.memory.nvram[i],
            Target::CardRam(i) => self.memory.cardram[i],
            Target::Window(offset) => self.read_window(offset),
            Target::Pcm(offset) => self.pcm.read(offset),
            Target::SubMcu(offset) => self.submcu.as_ref().map_or(0xFF, |sm| sm.read(offset)),
            Target::GateArrayEnable => self.gate_array.enable(),
            Target::GateArrayTrigger | Target::GateArrayControl => {
                let trigger = self.gate_array.read_trigger();
                self.update_interrupts();
                trigger
            }
            Target::IoSelect(select) => {
                self.set_io_select(select);
                self.buttons.row(select)
            }
            Target::IoSelectLatch => self.io_select,
            Target::Lcd(_) | Target::Unmapped => Self::unmapped(address),
        }
    }

    fn write(&mut self, address: u32, value: u8) {
        match self.resolve(address) {
            Target::Ram(i) => self.memory.ram[i] = value,
            Target::Sram(i) => self.memory.sram[i] = value,
            Target::Nvram(i) => {
                self.memory.nvram[i] = value;
                if i == NVRAM_CONTRAST {
                    self.lcd.set_contrast(value);
                }
            }
            Target::CardRam(i) => self.memory.cardram[i] = value,
            Target::Window(offset) => self.write_window(offset, value),
            Target::Pcm(offset) => self.pcm.write(offset, value),
            Target::SubMcu(offset) => {
                if let Some(sm) = &mut self.submcu {
                    sm.write(offset, value);
                }
            }
            Target::Lcd(register) => self.lcd.write(register, value),
            Target::GateArrayEnable | Target::GateArrayControl => {
                self.gate_array.write_enable(value);
            }
            Target::IoSelect(select) => self.set_io_select(select),
            Target::IoSelectLatch => self.set_io_select(value),
            Target::Rom1(_) | Target::Rom2(_) | Target::GateArrayTrigger | Target::Unmapped => {
                trace!(
                    address = format_args!("{address:#08X}"),
                    value,
                    "write to read-only or unmapped address"
                );
            }
        }
    }
}

impl H8Bus for Sc55Bus {
    fn interrupts(&mut self) -> &mut InterruptController {
        &mut self.interrupts
    }
}
