//! Multi-instance host.
//!
//! Each instance runs on its own thread and owns its [`Emulator`]. Input
//! reaches it through a channel drained between steps; rendered frames
//! leave through a single-producer ring that the host mixes from. A full
//! ring stalls the stepping thread, which paces emulation to playback.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use emu_core::bit_ceil;
use flume::{Receiver, Sender};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::audio::{AudioFrame, Sample, Volume, mix_into, normalize};
use crate::config::Config;
use crate::lcd::LcdHandle;
use crate::midi::{MessageCollector, SYSEX_START};
use crate::peripherals::buttons::Buttons;
use crate::rom::RomImages;
use crate::romset::{ComputerSwitch, Romset};
use crate::sc55::{Emulator, EmulatorOptions, LoadError, SystemReset};

const FULL_RING_BACKOFF: Duration = Duration::from_millis(1);

#[derive(Error, Debug)]
pub enum FrontendError {
    #[error("instance {instance}: {source}")]
    Load {
        instance: usize,
        #[source]
        source: LoadError,
    },

    #[error("failed to start instance thread: {0}")]
    Spawn(#[from] io::Error),
}

/// Where a message or byte goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Drop,
    Broadcast,
    Instance(usize),
}

/// Route one complete MIDI message. SysEx goes everywhere; channel
/// messages go to `channel % instances`. With no instances everything drops.
#[must_use]
pub fn route_midi(message: &[u8], instances: usize) -> Route {
    match message.first() {
        _ if instances == 0 => Route::Drop,
        None => Route::Drop,
        Some(&status) if status < 0x80 => Route::Drop,
        Some(&SYSEX_START) => Route::Broadcast,
        Some(&status) => Route::Instance(usize::from(status & 0x0F) % instances),
    }
}

/// Serial bytes are routed by the last selector seen: 0xF0 broadcasts,
/// 0x80..=0xDF pick an instance. The selection sticks until the next one.
#[derive(Debug, Clone, Copy)]
pub struct SerialRouter {
    current: Route,
}

impl Default for SerialRouter {
    fn default() -> Self {
        Self {
            current: Route::Instance(0),
        }
    }
}

impl SerialRouter {
    pub fn route(&mut self, byte: u8, instances: usize) -> Route {
        if instances == 0 {
            return Route::Drop;
        }
        match byte {
            0xF0 => self.current = Route::Broadcast,
            0x80..=0xDF => self.current = Route::Instance(usize::from(byte & 0x0F) % instances),
            _ => {}
        }
        self.current
    }
}

/// Messages for an instance thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Midi(Vec<u8>),
    Serial(u8),
    Remote(u8),
    Encoder { up: bool },
}

/// Output from the firmware, tagged with the instance that sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Midi { instance: usize, message: Vec<u8> },
    Serial { instance: usize, byte: u8 },
}

struct Instance<T> {
    commands: Sender<Command>,
    frames: HeapCons<AudioFrame<T>>,
    lcd: LcdHandle,
    buttons: Buttons,
    thread: Option<JoinHandle<()>>,
}

/// A set of running emulator instances rendering `T` samples.
pub struct Frontend<T: Sample> {
    instances: Vec<Instance<T>>,
    running: Arc<AtomicBool>,
    collector: MessageCollector,
    serial: SerialRouter,
    output: Receiver<Output>,
    output_frequency: u32,
    scratch: Vec<AudioFrame<T>>,
}

impl<T: Sample> Frontend<T> {
    /// Build every instance, send the power-on reset and start the
    /// stepping threads.
    ///
    /// # Errors
    ///
    /// Fails if any instance cannot load its ROMs or its thread cannot be
    /// spawned. Instances already started are stopped.
    pub fn start(
        config: &Config,
        romset: Romset,
        images: &RomImages,
        volume: Volume,
    ) -> Result<Self, FrontendError> {
        let (output_tx, output) = flume::unbounded();
        let mut emulators = Vec::with_capacity(config.instances);
        for instance in 0..config.instances {
            let mut emu = Emulator::new(EmulatorOptions {
                instance_id: instance,
                rom_directory: config.rom_directory.clone(),
                nvram_filename: config.nvram.clone(),
                computer_switch: config.computer_switch,
                oversampling: config.oversampling,
            });
            emu.load_roms(romset, images, config.revision)
                .map_err(|source| FrontendError::Load { instance, source })?;
            post_power_on_reset(&mut emu, config);

            let tx = output_tx.clone();
            emu.set_midi_out_callback(move |message| {
                let output = Output::Midi {
                    instance,
                    message: message.to_vec(),
                };
                if tx.send(output).is_err() {
                    warn!(instance, "output channel closed, MIDI out dropped");
                }
            });
            let tx = output_tx.clone();
            emu.set_serial_out_callback(move |byte| {
                if tx.send(Output::Serial { instance, byte }).is_err() {
                    warn!(instance, "output channel closed, serial out dropped");
                }
            });
            emulators.push(emu);
        }

        let output_frequency = emulators.first().map_or(0, Emulator::output_frequency);
        let running = Arc::new(AtomicBool::new(true));
        let mut frontend = Self {
            instances: Vec::with_capacity(emulators.len()),
            running: Arc::clone(&running),
            collector: MessageCollector::new(),
            serial: SerialRouter::default(),
            output,
            output_frequency,
            scratch: Vec::new(),
        };

        let in_flight = config.ring_frames();
        for (index, emu) in emulators.into_iter().enumerate() {
            let ring = Arc::new(HeapRb::<AudioFrame<T>>::new(bit_ceil(1 + in_flight)));
            let (producer, frames) = Arc::clone(&ring).split();
            let (commands, inbox) = flume::unbounded();
            let lcd = emu.lcd_handle();
            let buttons = emu.buttons();
            let running = Arc::clone(&running);
            let thread = thread::Builder::new()
                .name(format!("sc55-{index}"))
                .spawn(move || {
                    run_instance(emu, producer, &ring, &inbox, &running, in_flight, volume);
                })?;
            frontend.instances.push(Instance {
                commands,
                frames,
                lcd,
                buttons,
                thread: Some(thread),
            });
        }
        info!(
            instances = frontend.instances.len(),
            romset = romset.product_name(),
            rate = output_frequency,
            "frontend started"
        );
        Ok(frontend)
    }

    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Sample rate of the mixed output.
    #[must_use]
    pub const fn output_frequency(&self) -> u32 {
        self.output_frequency
    }

    /// MIDI and serial output from every instance.
    #[must_use]
    pub const fn output(&self) -> &Receiver<Output> {
        &self.output
    }

    #[must_use]
    pub fn lcd(&self, instance: usize) -> Option<LcdHandle> {
        self.instances.get(instance).map(|i| i.lcd.clone())
    }

    #[must_use]
    pub fn buttons(&self, instance: usize) -> Option<Buttons> {
        self.instances.get(instance).map(|i| i.buttons.clone())
    }

    /// Feed host MIDI bytes. Complete messages are routed to instances.
    pub fn post_midi(&mut self, bytes: &[u8]) {
        let mut messages = Vec::new();
        for &byte in bytes {
            self.collector.push(byte, &mut |m| messages.push(m.to_vec()));
        }
        for message in messages {
            self.route_midi_message(message);
        }
    }

    fn route_midi_message(&self, message: Vec<u8>) {
        match route_midi(&message, self.instances.len()) {
            Route::Drop => debug!(?message, "dropping MIDI without a status byte"),
            Route::Broadcast => {
                for instance in &self.instances {
                    instance.send(Command::Midi(message.clone()));
                }
            }
            Route::Instance(n) => self.instances[n].send(Command::Midi(message)),
        }
    }

    /// Feed host serial bytes.
    pub fn post_serial(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            match self.serial.route(byte, self.instances.len()) {
                Route::Drop => {}
                Route::Broadcast => {
                    for instance in &self.instances {
                        instance.send(Command::Serial(byte));
                    }
                }
                Route::Instance(n) => self.instances[n].send(Command::Serial(byte)),
            }
        }
    }

    pub fn post_rc(&self, instance: usize, code: u8) {
        if let Some(i) = self.instances.get(instance) {
            i.send(Command::Remote(code));
        }
    }

    pub fn encoder(&self, instance: usize, up: bool) {
        if let Some(i) = self.instances.get(instance) {
            i.send(Command::Encoder { up });
        }
    }

    /// Frames every instance has ready.
    #[must_use]
    pub fn available(&self) -> usize {
        self.instances
            .iter()
            .map(|i| i.frames.occupied_len())
            .min()
            .unwrap_or(0)
    }

    /// Mix up to `out.len()` frames from all instances into `out`.
    /// Returns how many frames were written.
    pub fn read_frames(&mut self, out: &mut [AudioFrame<T>]) -> usize {
        let count = self.available().min(out.len());
        let out = &mut out[..count];
        out.fill(AudioFrame::default());
        self.scratch.resize(count, AudioFrame::default());
        for instance in &mut self.instances {
            let popped = instance.frames.pop_slice(&mut self.scratch);
            mix_into(out, &self.scratch[..popped]);
        }
        count
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Stop and join every instance. Persistent memory is written as each
    /// emulator drops.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        for instance in &mut self.instances {
            if let Some(thread) = instance.thread.take()
                && thread.join().is_err()
            {
                warn!("instance thread panicked");
            }
        }
    }
}

impl<T> Instance<T> {
    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("instance stopped, input dropped");
        }
    }
}

impl<T: Sample> Drop for Frontend<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Reset sent before the first step. Without an explicit choice, an
/// SC-55mkII with no saved SRAM gets a GS reset so it starts in a sane
/// state.
fn post_power_on_reset(emu: &mut Emulator, config: &Config) {
    match config.reset {
        Some(reset) if config.computer_switch != ComputerSwitch::Midi => {
            emu.post_serial_system_reset(reset);
        }
        Some(reset) => emu.post_system_reset(reset),
        None if emu.romset() == Romset::Mk2 && !emu.is_sram_loaded() => {
            warn!("no reset specified with mk2 romset, defaulting to GS reset");
            emu.post_system_reset(SystemReset::Gs);
        }
        None => {}
    }
}

fn apply(emu: &mut Emulator, command: Command) {
    match command {
        Command::Midi(bytes) => emu.post_midi_bytes(&bytes),
        Command::Serial(byte) => emu.post_serial(byte),
        Command::Remote(code) => emu.post_rc(code),
        Command::Encoder { up } => emu.encoder_trigger(up),
    }
}

/// Step `emu` until `running` clears. The sample callback owns the
/// producer; the loop watches the ring's fill level through `ring`.
fn run_instance<T: Sample>(
    mut emu: Emulator,
    mut producer: HeapProd<AudioFrame<T>>,
    ring: &HeapRb<AudioFrame<T>>,
    inbox: &Receiver<Command>,
    running: &AtomicBool,
    in_flight: usize,
    volume: Volume,
) {
    emu.set_sample_callback(move |frame| {
        // The stepping loop keeps room in the ring; a full ring drops.
        if producer.try_push(normalize(frame, volume)).is_err() {
            trace!("sample ring full, frame dropped");
        }
    });

    while running.load(Ordering::Relaxed) {
        for command in inbox.try_iter() {
            apply(&mut emu, command);
        }
        if ring.occupied_len() >= in_flight {
            thread::sleep(FULL_RING_BACKOFF);
            continue;
        }
        emu.step();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midi_routes_by_channel() {
        assert_eq!(route_midi(&[0x93, 0x3C, 0x7F], 2), Route::Instance(1));
        assert_eq!(route_midi(&[0x9A, 0x3C, 0x7F], 4), Route::Instance(2));
        assert_eq!(route_midi(&[0xC0, 0x05], 1), Route::Instance(0));
    }

    #[test]
    fn sysex_is_broadcast() {
        assert_eq!(route_midi(&[0xF0, 0x41, 0xF7], 3), Route::Broadcast);
    }

    #[test]
    fn data_first_and_empty_are_dropped() {
        assert_eq!(route_midi(&[0x3C, 0x7F], 2), Route::Drop);
        assert_eq!(route_midi(&[], 2), Route::Drop);
    }

    #[test]
    fn nothing_routes_without_instances() {
        assert_eq!(route_midi(&[0x93, 0x3C, 0x7F], 0), Route::Drop);
        assert_eq!(route_midi(&[0xF0, 0x41, 0xF7], 0), Route::Drop);
        let mut router = SerialRouter::default();
        assert_eq!(router.route(0x85, 0), Route::Drop);
        assert_eq!(router.route(0x10, 0), Route::Drop);
    }

    #[test]
    fn serial_selection_sticks() {
        let mut router = SerialRouter::default();
        assert_eq!(router.route(0x10, 4), Route::Instance(0));
        assert_eq!(router.route(0x92, 4), Route::Instance(2));
        assert_eq!(router.route(0x40, 4), Route::Instance(2));
        assert_eq!(router.route(0xF0, 4), Route::Broadcast);
        assert_eq!(router.route(0x41, 4), Route::Broadcast);
        assert_eq!(router.route(0xD5, 4), Route::Instance(1));
        assert_eq!(router.route(0xE0, 4), Route::Instance(1));
    }

    #[test]
    fn explicit_reset_follows_switch() {
        let config = Config {
            reset: Some(SystemReset::Gs),
            computer_switch: ComputerSwitch::Rs422,
            ..Config::default()
        };
        let mut emu = Emulator::new(EmulatorOptions::default());
        post_power_on_reset(&mut emu, &config);
        assert_eq!(emu.bus().sci.pending_input(), 0);
        assert_eq!(
            emu.bus().submcu.as_ref().map(|sm| sm.pending_input()),
            Some(11)
        );
    }

    #[test]
    fn mk2_without_sram_defaults_to_gs_reset() {
        let mut emu = Emulator::new(EmulatorOptions::default());
        post_power_on_reset(&mut emu, &Config::default());
        assert_eq!(emu.bus().sci.pending_input(), 11);

        let mut emu = Emulator::new(EmulatorOptions::default());
        let config = Config {
            reset: Some(SystemReset::None),
            ..Config::default()
        };
        post_power_on_reset(&mut emu, &config);
        assert_eq!(emu.bus().sci.pending_input(), 0);
    }

    #[test]
    fn commands_reach_the_emulator() {
        let mut emu = Emulator::new(EmulatorOptions::default());
        apply(&mut emu, Command::Midi(vec![0x90, 0x3C, 0x7F]));
        apply(&mut emu, Command::Serial(0xF0));
        assert_eq!(emu.bus().sci.pending_input(), 3);
        assert_eq!(
            emu.bus().submcu.as_ref().map(|sm| sm.pending_input()),
            Some(1)
        );
    }

    fn sleeping_images() -> RomImages {
        use crate::memory::ROM1_SIZE;
        use crate::rom::RomLocation;
        use crate::romset::ROM_SET_N_FILES;

        let mut images = RomImages::new();
        for slot in 0..ROM_SET_N_FILES {
            if let Some(location) = Romset::Mk2.slot_location(slot) {
                images.set(location, vec![0; 0x100]);
            }
        }
        let mut rom1 = vec![0u8; ROM1_SIZE];
        rom1[..4].copy_from_slice(&0x0000_0100u32.to_be_bytes());
        rom1[0x100] = 0x1A; // SLEEP
        images.set(RomLocation::Rom1, rom1);
        images.set(RomLocation::Rom2, vec![0; 0x4_0000]);
        images
    }

    #[test]
    fn stepping_pauses_once_the_ring_holds_enough() {
        let dir = tempfile::tempdir().unwrap();
        let mut emu = Emulator::new(EmulatorOptions {
            rom_directory: dir.path().to_path_buf(),
            ..EmulatorOptions::default()
        });
        emu.load_roms(Romset::Mk2, &sleeping_images(), None).unwrap();

        let in_flight = 16;
        let ring = Arc::new(HeapRb::<AudioFrame<i16>>::new(64));
        let (producer, frames) = Arc::clone(&ring).split();
        let (_commands, inbox) = flume::unbounded();
        let running = Arc::new(AtomicBool::new(true));
        let thread = {
            let ring = Arc::clone(&ring);
            let running = Arc::clone(&running);
            thread::spawn(move || {
                run_instance(emu, producer, &ring, &inbox, &running, in_flight, Volume::UNITY);
            })
        };

        let mut waited = 0;
        while frames.occupied_len() < in_flight && waited < 2000 {
            thread::sleep(Duration::from_millis(1));
            waited += 1;
        }
        thread::sleep(Duration::from_millis(20));
        let filled = frames.occupied_len();
        running.store(false, Ordering::Relaxed);
        thread.join().unwrap();

        assert!(filled >= in_flight, "ring only reached {filled}");
        assert!(filled <= in_flight + 1, "ring overfilled to {filled}");
    }
}
