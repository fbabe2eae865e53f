//! Top-level SC-55 system.
//!
//! One `Emulator` is one sound module: an H8/532 MCU, its bus and every
//! board device. The host drives it one instruction at a time with
//! [`Emulator::step`]; all output leaves through the callbacks.
//!
//! # Lifecycle
//!
//! `new` allocates. `load_roms` installs the ROM images for a romset, reads
//! the battery-backed memory and resets. A failed load leaves the emulator
//! unusable (`is_ready() == false`, `step` does nothing). Dropping the
//! emulator writes SRAM and NVRAM back to disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use emu_core::{Cpu, Observable, Ticks, Value, has_single_bit, parse_address};
use hitachi_h8_500::H8500;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::audio::AudioFrame;
use crate::bus::Sc55Bus;
use crate::lcd::{LcdBackend, LcdHandle, LcdPanel};
use crate::memory::{NVRAM_CONTRAST, NVRAM_SIZE, SRAM_SIZE};
use crate::midi::{GM_RESET, GS_RESET};
use crate::peripherals::buttons::Buttons;
use crate::rom::{RomError, RomImages, RomLocation, unscramble};
use crate::romset::{ComputerSwitch, Mk1Revision, ROM_SET_N_FILES, Romset};

/// Contrast the JV-880 NVRAM starts with.
const DEFAULT_JV880_CONTRAST: u8 = 0x04;

/// Errors from [`Emulator::load_roms`].
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("{romset} requires a {location} image")]
    MissingImage {
        romset: Romset,
        location: RomLocation,
    },

    #[error(transparent)]
    Rom(#[from] RomError),
}

/// Reset message sent after power-on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemReset {
    #[default]
    None,
    Gs,
    Gm,
}

impl SystemReset {
    /// Bytes of the reset message, empty for `None`.
    #[must_use]
    pub const fn message(self) -> &'static [u8] {
        match self {
            Self::None => &[],
            Self::Gs => &GS_RESET,
            Self::Gm => &GM_RESET,
        }
    }
}

impl FromStr for SystemReset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "gs" => Ok(Self::Gs),
            "gm" => Ok(Self::Gm),
            _ => Err(format!("unknown reset '{s}' (expected none, gs or gm)")),
        }
    }
}

/// Per-instance settings fixed at construction.
#[derive(Debug, Clone)]
pub struct EmulatorOptions {
    /// Appended to persistence file names so instances do not share them.
    pub instance_id: usize,
    /// Directory the SRAM dump lives in.
    pub rom_directory: PathBuf,
    /// JV-880 NVRAM file. `None` disables NVRAM persistence.
    pub nvram_filename: Option<PathBuf>,
    pub computer_switch: ComputerSwitch,
    pub oversampling: bool,
}

impl Default for EmulatorOptions {
    fn default() -> Self {
        Self {
            instance_id: 0,
            rom_directory: PathBuf::from("."),
            nvram_filename: None,
            computer_switch: ComputerSwitch::default(),
            oversampling: true,
        }
    }
}

/// One emulated sound module.
pub struct Emulator {
    cpu: H8500,
    bus: Sc55Bus,
    options: EmulatorOptions,
    revision: Option<Mk1Revision>,
    ready: bool,
    sram_loaded: bool,
    nvram_loaded: bool,
}

impl Emulator {
    #[must_use]
    pub fn new(options: EmulatorOptions) -> Self {
        let mut bus = Sc55Bus::new(Romset::default(), options.computer_switch);
        bus.pcm.set_oversampling(options.oversampling);
        Self {
            cpu: H8500::new(),
            bus,
            options,
            revision: None,
            ready: false,
            sram_loaded: false,
            nvram_loaded: false,
        }
    }

    /// Install the ROM images for `romset`, read persistent memory and
    /// reset.
    ///
    /// `revision` overrides SC-55 firmware detection and is ignored on
    /// other models.
    ///
    /// # Errors
    ///
    /// Fails if a required image is missing or any image is the wrong size.
    /// The emulator is left unusable until a later load succeeds.
    pub fn load_roms(
        &mut self,
        romset: Romset,
        images: &RomImages,
        revision: Option<Mk1Revision>,
    ) -> Result<(), LoadError> {
        self.ready = false;
        self.bus.set_romset(romset);

        for slot in 0..ROM_SET_N_FILES {
            let Some(location) = romset.slot_location(slot) else {
                continue;
            };
            if images.get(location).is_empty() && !romset.is_optional(location) {
                return Err(LoadError::MissingImage { romset, location });
            }
        }
        for (location, data) in images.present() {
            self.load_rom(location, data)?;
        }

        self.revision = romset
            .capabilities()
            .mk1
            .then(|| self.detect_revision(revision));

        self.read_sram();
        self.read_nvram();
        self.ready = true;
        self.reset();
        info!(romset = romset.product_name(), "ROMs loaded");
        Ok(())
    }

    fn detect_revision(&self, forced: Option<Mk1Revision>) -> Mk1Revision {
        if let Some(revision) = forced {
            info!(%revision, "using requested SC-55 revision");
            return revision;
        }
        let memory = &self.bus.memory;
        match Mk1Revision::detect(&[&memory.rom1[..], &memory.rom2[..]]) {
            Some(revision) => {
                info!(%revision, "detected SC-55 revision");
                revision
            }
            None => {
                let revision = Mk1Revision::V121;
                info!(%revision, "SC-55 revision not found in ROMs, assuming default");
                revision
            }
        }
    }

    /// Copy one image into place.
    ///
    /// # Errors
    ///
    /// Fails if the image is larger than its location, or if ROM2 is not a
    /// power-of-2 size.
    pub fn load_rom(&mut self, location: RomLocation, data: &[u8]) -> Result<(), RomError> {
        if data.len() > location.capacity() {
            return Err(RomError::TooLarge {
                location,
                size: data.len(),
                max: location.capacity(),
            });
        }
        let memory = &mut self.bus.memory;
        match location {
            RomLocation::Rom1 => {
                memory.rom1.fill(0);
                memory.rom1[..data.len()].copy_from_slice(data);
            }
            RomLocation::Rom2 => {
                if !has_single_bit(data.len()) {
                    return Err(RomError::NotPowerOfTwo {
                        location,
                        size: data.len(),
                    });
                }
                memory.rom2[..data.len()].copy_from_slice(data);
                memory.rom2_mask = data.len() - 1;
            }
            RomLocation::SubMcuRom => match &mut self.bus.submcu {
                Some(submcu) => submcu.rom_mut()[..data.len()].copy_from_slice(data),
                None => debug!("board has no sub-MCU, ROM ignored"),
            },
            _ => {
                let mut wave = vec![0; data.len()];
                unscramble(data, &mut wave);
                self.bus.pcm.load_wave(location, wave);
            }
        }
        debug!(location = location.name(), size = data.len(), "ROM installed");
        Ok(())
    }

    /// Power-cycle the MCU and every device. ROMs and persistent memory
    /// survive.
    pub fn reset(&mut self) {
        self.bus.reset();
        Cpu::reset(&mut self.cpu, &mut self.bus);
        if self.bus.capabilities().jv880 {
            self.bus
                .lcd
                .set_contrast(self.bus.memory.nvram[NVRAM_CONTRAST]);
        }
    }

    /// Execute one instruction (or take one interrupt) and bring the
    /// devices up to date. Does nothing until ROMs are loaded.
    pub fn step(&mut self) -> Ticks {
        if !self.ready {
            return Ticks::ZERO;
        }
        self.bus.begin(self.cpu.cycles().get());
        let ticks = self.cpu.step(&mut self.bus);
        self.bus.advance(self.cpu.cycles().get());
        ticks
    }

    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.ready
    }

    #[must_use]
    pub const fn romset(&self) -> Romset {
        self.bus.romset()
    }

    /// Firmware revision, first-generation boards only.
    #[must_use]
    pub const fn revision(&self) -> Option<Mk1Revision> {
        self.revision
    }

    #[must_use]
    pub const fn options(&self) -> &EmulatorOptions {
        &self.options
    }

    #[must_use]
    pub const fn cycles(&self) -> Ticks {
        self.cpu.cycles()
    }

    #[must_use]
    pub const fn cpu(&self) -> &H8500 {
        &self.cpu
    }

    #[must_use]
    pub const fn bus(&self) -> &Sc55Bus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut Sc55Bus {
        &mut self.bus
    }

    /// Frame rate of the sample callback.
    #[must_use]
    pub const fn output_frequency(&self) -> u32 {
        self.bus.pcm.output_frequency()
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    /// Queue a byte on MIDI IN.
    pub fn post_midi(&mut self, byte: u8) {
        self.bus.sci.post_byte(byte);
    }

    pub fn post_midi_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.post_midi(byte);
        }
    }

    /// Queue a byte on the computer port.
    pub fn post_serial(&mut self, byte: u8) {
        match &mut self.bus.submcu {
            Some(submcu) => submcu.post_serial(byte),
            None => debug!(romset = %self.bus.romset(), byte, "no serial port, byte dropped"),
        }
    }

    pub fn post_serial_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.post_serial(byte);
        }
    }

    /// Send a reset message over MIDI.
    pub fn post_system_reset(&mut self, reset: SystemReset) {
        self.warn_on_gm_reset(reset);
        self.post_midi_bytes(reset.message());
    }

    /// Send a reset message over the computer port.
    pub fn post_serial_system_reset(&mut self, reset: SystemReset) {
        self.warn_on_gm_reset(reset);
        self.post_serial_bytes(reset.message());
    }

    fn warn_on_gm_reset(&self, reset: SystemReset) {
        if reset == SystemReset::Gm
            && let Some(revision) = self.revision
            && revision.lacks_gm_reset()
        {
            warn!(%revision, "this firmware does not know GM reset; it will act as a GS reset");
        }
    }

    /// Infrared remote code.
    pub fn post_rc(&mut self, code: u8) {
        let now = self.cpu.cycles().get();
        let bus = &mut self.bus;
        if !bus.remote.trigger(&bus.buttons, code, now) {
            trace!(code, "remote code has no panel button");
        }
    }

    /// Turn the data entry knob one step.
    pub fn encoder_trigger(&mut self, up: bool) {
        self.bus.encoder_trigger(up);
    }

    /// Shared handle to the panel buttons.
    #[must_use]
    pub fn buttons(&self) -> Buttons {
        self.bus.buttons.clone()
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    pub fn set_sample_callback(&mut self, callback: impl FnMut(&AudioFrame<i32>) + Send + 'static) {
        self.bus.sinks.sample = Box::new(callback);
    }

    /// Receives complete MIDI messages sent by the firmware.
    pub fn set_midi_out_callback(&mut self, callback: impl FnMut(&[u8]) + Send + 'static) {
        self.bus.sinks.midi_out = Box::new(callback);
    }

    /// Receives bytes sent to the computer port.
    pub fn set_serial_out_callback(&mut self, callback: impl FnMut(u8) + Send + 'static) {
        self.bus.sinks.serial_out = Box::new(callback);
    }

    #[must_use]
    pub fn lcd_handle(&self) -> LcdHandle {
        self.bus.lcd.handle()
    }

    #[must_use]
    pub const fn lcd_panel(&self) -> LcdPanel {
        self.bus.lcd.panel()
    }

    /// Open a display backend for this board's panel.
    pub fn start_lcd(&self, backend: &mut dyn LcdBackend) -> bool {
        let started = backend.start(&self.lcd_panel());
        if !started {
            warn!("LCD backend failed to start");
        }
        started
    }

    pub fn stop_lcd(backend: &mut dyn LcdBackend) {
        backend.stop();
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn is_sram_loaded(&self) -> bool {
        self.sram_loaded
    }

    #[must_use]
    pub const fn is_nvram_loaded(&self) -> bool {
        self.nvram_loaded
    }

    fn instance_path(&self, base: &Path) -> PathBuf {
        let mut path = base.as_os_str().to_owned();
        path.push(self.options.instance_id.to_string());
        PathBuf::from(path)
    }

    /// SRAM dump path, `None` on models without one.
    #[must_use]
    pub fn sram_path(&self) -> Option<PathBuf> {
        let name = self.bus.romset().memory_file()?;
        Some(self.instance_path(&self.options.rom_directory.join(name)))
    }

    /// NVRAM path, JV-880 only and only when a file name was given.
    #[must_use]
    pub fn nvram_path(&self) -> Option<PathBuf> {
        if !self.bus.capabilities().jv880 {
            return None;
        }
        let base = self.options.nvram_filename.as_deref()?;
        if base.as_os_str().is_empty() {
            return None;
        }
        Some(self.instance_path(base))
    }

    fn read_sram(&mut self) {
        self.bus.memory.sram.fill(0);
        self.sram_loaded = false;
        let Some(path) = self.sram_path() else {
            return;
        };
        match read_exact(&path, SRAM_SIZE) {
            Ok(data) => {
                self.bus.memory.sram.copy_from_slice(&data);
                self.sram_loaded = true;
                debug!(path = %path.display(), "SRAM loaded");
            }
            Err(err) => warn!(path = %path.display(), %err, "failed reading SRAM"),
        }
    }

    fn read_nvram(&mut self) {
        self.nvram_loaded = false;
        if !self.bus.capabilities().jv880 {
            return;
        }
        self.bus.memory.nvram.fill(0);
        self.bus.memory.nvram[NVRAM_CONTRAST] = DEFAULT_JV880_CONTRAST;
        let Some(path) = self.nvram_path() else {
            return;
        };
        match read_exact(&path, NVRAM_SIZE) {
            Ok(data) => {
                self.bus.memory.nvram.copy_from_slice(&data);
                self.nvram_loaded = true;
                debug!(path = %path.display(), "NVRAM loaded");
            }
            Err(err) => warn!(path = %path.display(), %err, "failed reading NVRAM"),
        }
    }

    /// Write SRAM and NVRAM to disk. Failures are logged.
    pub fn save_persistent_memory(&self) {
        if !self.ready {
            return;
        }
        if let Some(path) = self.sram_path()
            && let Err(err) = fs::write(&path, &self.bus.memory.sram)
        {
            warn!(path = %path.display(), %err, "failed writing SRAM");
        }
        if let Some(path) = self.nvram_path()
            && let Err(err) = fs::write(&path, &self.bus.memory.nvram)
        {
            warn!(path = %path.display(), %err, "failed writing NVRAM");
        }
    }
}

fn read_exact(path: &Path, size: usize) -> std::io::Result<Vec<u8>> {
    let mut data = fs::read(path)?;
    if data.len() < size {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("expected {size} bytes, found {}", data.len()),
        ));
    }
    data.truncate(size);
    Ok(data)
}

impl Drop for Emulator {
    fn drop(&mut self) {
        self.save_persistent_memory();
    }
}

impl Observable for Emulator {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("cpu.") {
            self.cpu.query(rest)
        } else if let Some(rest) = path.strip_prefix("memory.") {
            parse_address(rest)
                .and_then(|a| self.bus.peek(a))
                .map(Value::U8)
        } else if let Some(rest) = path.strip_prefix("lcd.") {
            let lcd = &self.bus.lcd;
            match rest {
                "enabled" => Some(lcd.is_enabled().into()),
                "contrast" => Some(lcd.contrast().into()),
                "line0" | "line1" => {
                    let row = usize::from(rest.ends_with('1'));
                    let state = lcd.controller().state();
                    Some(String::from_utf8_lossy(state.line(row)).into_owned().into())
                }
                _ => None,
            }
        } else {
            match path {
                "romset" => Some(self.bus.romset().name().into()),
                "revision" => self.revision.map(|r| r.version().into()),
                "ready" => Some(self.ready.into()),
                "io_select" => Some(self.bus.io_select().into()),
                "buttons" => Some(self.bus.buttons.pressed().into()),
                "uart.pending" => Some((self.bus.sci.pending_input() as u64).into()),
                "pcm.rate" => Some(self.output_frequency().into()),
                _ => self.cpu.query(path),
            }
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "cpu.<h8_paths>",
            "memory.<address>",
            "lcd.enabled",
            "lcd.contrast",
            "lcd.line0",
            "lcd.line1",
            "romset",
            "revision",
            "ready",
            "io_select",
            "buttons",
            "uart.pending",
            "pcm.rate",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::ROM1_SIZE;

    /// ROM1 whose reset vector points at `SLEEP` at 0x0100.
    fn sleeping_rom1() -> Vec<u8> {
        let mut rom = vec![0u8; ROM1_SIZE];
        rom[..4].copy_from_slice(&0x0000_0100u32.to_be_bytes());
        rom[0x100] = 0x1A;
        rom
    }

    fn images(romset: Romset) -> RomImages {
        let mut images = RomImages::new();
        for slot in 0..ROM_SET_N_FILES {
            if let Some(location) = romset.slot_location(slot) {
                images.set(location, vec![0; 0x100]);
            }
        }
        images.set(RomLocation::Rom1, sleeping_rom1());
        images.set(RomLocation::Rom2, vec![0; 0x4_0000]);
        images
    }

    fn options_in(dir: &Path) -> EmulatorOptions {
        EmulatorOptions {
            rom_directory: dir.to_path_buf(),
            ..EmulatorOptions::default()
        }
    }

    #[test]
    fn step_is_a_no_op_until_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let mut emu = Emulator::new(options_in(dir.path()));
        assert!(!emu.is_ready());
        assert_eq!(emu.step(), Ticks::ZERO);
    }

    #[test]
    fn load_sets_rom2_mask_and_boots() {
        let dir = tempfile::tempdir().unwrap();
        let mut emu = Emulator::new(options_in(dir.path()));
        emu.load_roms(Romset::Mk2, &images(Romset::Mk2), None).unwrap();
        assert!(emu.is_ready());
        assert_eq!(emu.bus().memory.rom2_mask, 0x3_FFFF);
        assert_eq!(emu.query("cpu.pc"), Some(Value::U16(0x0100)));
        emu.step();
        assert!(emu.cpu().is_sleeping());
    }

    #[test]
    fn reset_and_reload_clear_on_chip_ram() {
        use emu_core::Bus;

        let dir = tempfile::tempdir().unwrap();
        let mut emu = Emulator::new(options_in(dir.path()));
        emu.load_roms(Romset::Mk2, &images(Romset::Mk2), None).unwrap();

        emu.bus_mut().write(0x00_FC00, 0x42);
        emu.reset();
        assert_eq!(emu.bus().peek(0x00_FC00), Some(0));

        emu.bus_mut().write(0x00_FC00, 0x42);
        emu.load_roms(Romset::Mk2, &images(Romset::Mk2), None).unwrap();
        assert_eq!(emu.bus().peek(0x00_FC00), Some(0));
    }

    #[test]
    fn bad_rom2_leaves_emulator_unusable() {
        let dir = tempfile::tempdir().unwrap();
        let mut emu = Emulator::new(options_in(dir.path()));
        let mut images = images(Romset::Mk2);
        images.set(RomLocation::Rom2, vec![0; 0x3_0000]);
        let err = emu.load_roms(Romset::Mk2, &images, None).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Rom(RomError::NotPowerOfTwo { size: 0x3_0000, .. })
        ));
        assert!(!emu.is_ready());
        assert_eq!(emu.step(), Ticks::ZERO);
    }

    #[test]
    fn oversized_rom1_is_rejected() {
        let mut emu = Emulator::new(EmulatorOptions::default());
        let err = emu.load_rom(RomLocation::Rom1, &vec![0; ROM1_SIZE + 1]).unwrap_err();
        assert!(matches!(err, RomError::TooLarge { max: ROM1_SIZE, .. }));
    }

    #[test]
    fn missing_required_image_is_reported() {
        let mut emu = Emulator::new(EmulatorOptions::default());
        let mut images = images(Romset::Mk2);
        images.set(RomLocation::Waverom2, Vec::new());
        let err = emu.load_roms(Romset::Mk2, &images, None).unwrap_err();
        assert!(matches!(
            err,
            LoadError::MissingImage {
                location: RomLocation::Waverom2,
                ..
            }
        ));
    }

    #[test]
    fn wave_roms_are_unscrambled() {
        let mut emu = Emulator::new(EmulatorOptions::default());
        let data: Vec<u8> = (0..64).collect();
        let mut expected = vec![0; data.len()];
        unscramble(&data, &mut expected);
        emu.load_rom(RomLocation::Waverom1, &data).unwrap();
        assert_ne!(expected, data);
        assert_eq!(emu.bus().pcm.banks().get(RomLocation::Waverom1), &expected[..]);
    }

    #[test]
    fn sram_round_trips_with_instance_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let options = EmulatorOptions {
            instance_id: 2,
            ..options_in(dir.path())
        };
        {
            let mut emu = Emulator::new(options.clone());
            emu.load_roms(Romset::Mk2, &images(Romset::Mk2), None).unwrap();
            assert!(!emu.is_sram_loaded());
            emu.bus_mut().memory.sram[0x123] = 0xA5;
        }
        assert!(dir.path().join("memory.bin2").exists());

        let mut emu = Emulator::new(options);
        emu.load_roms(Romset::Mk2, &images(Romset::Mk2), None).unwrap();
        assert!(emu.is_sram_loaded());
        assert_eq!(emu.bus().memory.sram[0x123], 0xA5);
    }

    #[test]
    fn short_sram_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("memory.bin0"), [1, 2, 3]).unwrap();
        let mut emu = Emulator::new(options_in(dir.path()));
        emu.load_roms(Romset::Mk2, &images(Romset::Mk2), None).unwrap();
        assert!(!emu.is_sram_loaded());
        assert_eq!(emu.bus().memory.sram[0], 0);
    }

    #[test]
    fn jv880_nvram_defaults_contrast() {
        let dir = tempfile::tempdir().unwrap();
        let options = EmulatorOptions {
            nvram_filename: Some(dir.path().join("nvram.bin")),
            ..options_in(dir.path())
        };
        let mut emu = Emulator::new(options);
        emu.load_roms(Romset::Jv880, &images(Romset::Jv880), None).unwrap();
        assert!(!emu.is_nvram_loaded());
        assert_eq!(emu.bus().memory.nvram[NVRAM_CONTRAST], 4);
        assert_eq!(emu.bus().lcd.contrast(), 4);
        drop(emu);
        assert!(dir.path().join("nvram.bin0").exists());
    }

    #[test]
    fn nvram_is_jv880_only() {
        let dir = tempfile::tempdir().unwrap();
        let options = EmulatorOptions {
            nvram_filename: Some(dir.path().join("nvram.bin")),
            ..options_in(dir.path())
        };
        let mut emu = Emulator::new(options);
        emu.load_roms(Romset::Mk2, &images(Romset::Mk2), None).unwrap();
        assert_eq!(emu.nvram_path(), None);
    }

    #[test]
    fn mk1_revision_is_detected_or_defaulted() {
        let dir = tempfile::tempdir().unwrap();
        let mut emu = Emulator::new(options_in(dir.path()));
        let mut images = images(Romset::Mk1);
        let mut rom2 = vec![0; 0x4_0000];
        rom2[0x200..0x207].copy_from_slice(b"Ver1.10");
        images.set(RomLocation::Rom2, rom2);
        emu.load_roms(Romset::Mk1, &images, None).unwrap();
        assert_eq!(emu.revision(), Some(Mk1Revision::V110));

        emu.load_roms(Romset::Mk1, &self::images(Romset::Mk1), None).unwrap();
        assert_eq!(emu.revision(), Some(Mk1Revision::V121));

        emu.load_roms(Romset::Mk2, &self::images(Romset::Mk2), None).unwrap();
        assert_eq!(emu.revision(), None);
    }

    #[test]
    fn system_reset_queues_message() {
        let mut emu = Emulator::new(EmulatorOptions::default());
        emu.post_system_reset(SystemReset::Gs);
        assert_eq!(emu.bus().sci.pending_input(), GS_RESET.len());
        emu.post_serial_system_reset(SystemReset::Gm);
        assert_eq!(
            emu.bus().submcu.as_ref().map(|sm| sm.pending_input()),
            Some(GM_RESET.len())
        );
    }

    #[test]
    fn serial_is_dropped_without_submcu() {
        let mut emu = Emulator::new(EmulatorOptions::default());
        emu.bus_mut().set_romset(Romset::Scb55);
        emu.post_serial(0xF0);
        assert!(emu.bus().submcu.is_none());
    }

    #[test]
    fn remote_presses_a_button() {
        let mut emu = Emulator::new(EmulatorOptions::default());
        let buttons = emu.buttons();
        emu.post_rc(0x01);
        assert_ne!(buttons.pressed(), 0);
    }

    #[test]
    fn queries_route_by_prefix() {
        let mut emu = Emulator::new(EmulatorOptions::default());
        emu.load_rom(RomLocation::Rom1, &sleeping_rom1()).unwrap();
        assert_eq!(emu.query("memory.0x100"), Some(Value::U8(0x1A)));
        assert_eq!(emu.query("romset"), Some(Value::String("mk2".into())));
        assert_eq!(emu.query("lcd.contrast"), Some(Value::U8(8)));
        assert_eq!(emu.query("bogus.path"), None);
    }
}
