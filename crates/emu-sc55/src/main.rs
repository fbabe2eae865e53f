//! SC-55 emulator binary.
//!
//! Runs one or more instances headless. Output goes to a WAV file, to the
//! default audio device (feature `playback`), or both. MIDI input comes
//! from a raw byte file posted at start.

use std::error::Error;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use clap::{ArgGroup, Parser};
use emu_sc55::config::parse_buffer_spec;
use emu_sc55::frontend::Output;
use emu_sc55::{
    AudioFrame, ComputerSwitch, Config, Frontend, LcdBackend, LcdPanel, LcdSnapshot, Mk1Revision,
    OutputFormat, RomImages, Romset, Sample, SystemReset, Volume, WavCapture, detect_romset,
};
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "emu-sc55", about = "Roland SC-55 family emulator")]
#[command(group(ArgGroup::new("model").args([
    "romset", "mk2", "st", "mk1", "cm300", "jv880", "scb55", "rlp3237", "sc155", "sc155mk2",
])))]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// JSON config file; flags override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Model by name.
    #[arg(long)]
    romset: Option<Romset>,
    #[arg(long)]
    mk2: bool,
    #[arg(long)]
    st: bool,
    #[arg(long)]
    mk1: bool,
    #[arg(long)]
    cm300: bool,
    #[arg(long)]
    jv880: bool,
    #[arg(long)]
    scb55: bool,
    #[arg(long)]
    rlp3237: bool,
    #[arg(long)]
    sc155: bool,
    #[arg(long)]
    sc155mk2: bool,

    /// SC-55 firmware revision (1.00, 1.10, 1.20, 1.21, 2.00).
    #[arg(short = 'm', long)]
    revision: Option<Mk1Revision>,

    #[arg(short = 'd', long)]
    rom_directory: Option<PathBuf>,

    /// JV-880 NVRAM file.
    #[arg(long)]
    nvram: Option<PathBuf>,

    #[arg(short = 'n', long)]
    instances: Option<usize>,

    /// Frames per buffer, optionally with a buffer count: SIZE[:COUNT].
    #[arg(short = 'b', long)]
    buffer_size: Option<String>,

    /// s16, s32 or f32.
    #[arg(short = 'f', long)]
    format: Option<OutputFormat>,

    /// none, gs or gm.
    #[arg(short = 'r', long)]
    reset: Option<SystemReset>,

    /// rs422, rs232c1, rs232c2 or midi.
    #[arg(long)]
    serial_type: Option<ComputerSwitch>,

    #[arg(long)]
    no_lcd: bool,

    #[arg(long)]
    disable_oversampling: bool,

    /// Output gain, 1.0 is unity.
    #[arg(long, default_value_t = 1.0)]
    volume: f32,

    /// Raw MIDI bytes to send after power-on.
    #[arg(long)]
    midi: Option<PathBuf>,

    /// Write the mixed output to a WAV file.
    #[arg(long)]
    wav: Option<PathBuf>,

    /// Stop after this many seconds of audio. Runs until killed otherwise.
    #[arg(long)]
    seconds: Option<f64>,

    /// Play through the default output device.
    #[cfg(feature = "playback")]
    #[arg(long)]
    play: bool,
}

impl Cli {
    fn model(&self) -> Option<Romset> {
        let flags = [
            (self.mk2, Romset::Mk2),
            (self.st, Romset::St),
            (self.mk1, Romset::Mk1),
            (self.cm300, Romset::Cm300),
            (self.jv880, Romset::Jv880),
            (self.scb55, Romset::Scb55),
            (self.rlp3237, Romset::Rlp3237),
            (self.sc155, Romset::Sc155),
            (self.sc155mk2, Romset::Sc155Mk2),
        ];
        self.romset.or_else(|| flags.into_iter().find(|(set, _)| *set).map(|(_, r)| r))
    }

    fn apply(&self, config: &mut Config) -> Result<(), Box<dyn Error>> {
        if let Some(romset) = self.model() {
            config.romset = Some(romset);
        }
        if self.revision.is_some() {
            config.revision = self.revision;
        }
        if let Some(dir) = &self.rom_directory {
            config.rom_directory.clone_from(dir);
        }
        if self.nvram.is_some() {
            config.nvram.clone_from(&self.nvram);
        }
        if let Some(instances) = self.instances {
            config.instances = instances;
        }
        if let Some(spec) = &self.buffer_size {
            let (size, count) = parse_buffer_spec(spec, config.buffer_count)?;
            config.buffer_size = size;
            config.buffer_count = count;
        }
        if let Some(format) = self.format {
            config.output_format = format;
        }
        if self.reset.is_some() {
            config.reset = self.reset;
        }
        if let Some(switch) = self.serial_type {
            config.computer_switch = switch;
        }
        if self.no_lcd {
            config.lcd = false;
        }
        if self.disable_oversampling {
            config.oversampling = false;
        }
        config.validate()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// LCD
// ---------------------------------------------------------------------------

/// Prints the display text whenever it changes.
#[derive(Default)]
struct LogLcd {
    last: Option<[String; 2]>,
}

impl LcdBackend for LogLcd {
    fn start(&mut self, panel: &LcdPanel) -> bool {
        debug!(width = panel.width, height = panel.height, "text LCD started");
        true
    }

    fn stop(&mut self) {
        self.last = None;
    }

    fn render(&mut self, snapshot: &LcdSnapshot) {
        if !snapshot.enabled {
            return;
        }
        let lines = [0, 1].map(|row| String::from_utf8_lossy(snapshot.display.line(row)).into_owned());
        if self.last.as_ref() != Some(&lines) {
            info!("LCD |{}| |{}|", lines[0], lines[1]);
            self.last = Some(lines);
        }
    }
}

// ---------------------------------------------------------------------------
// Running
// ---------------------------------------------------------------------------

#[cfg(not(feature = "playback"))]
trait OutputSample: Sample + hound::Sample {}
#[cfg(not(feature = "playback"))]
impl<T: Sample + hound::Sample> OutputSample for T {}

#[cfg(feature = "playback")]
trait OutputSample: Sample + hound::Sample + cpal::SizedSample {}
#[cfg(feature = "playback")]
impl<T: Sample + hound::Sample + cpal::SizedSample> OutputSample for T {}

fn run<T: OutputSample>(cli: &Cli, config: &Config, romset: Romset) -> Result<(), Box<dyn Error>> {
    let images = RomImages::read_dir(romset, &config.rom_directory)?;
    let mut frontend = Frontend::<T>::start(config, romset, &images, Volume::new(cli.volume))?;
    let rate = frontend.output_frequency();

    if let Some(path) = &cli.midi {
        let bytes = std::fs::read(path)?;
        info!(path = %path.display(), bytes = bytes.len(), "sending MIDI file");
        frontend.post_midi(&bytes);
    }

    let mut lcd = config.lcd.then(LogLcd::default);
    let lcd_handle = frontend.lcd(0);
    if let Some(backend) = &mut lcd {
        backend.start(&LcdPanel::for_romset(romset));
    }

    let mut capture = match &cli.wav {
        Some(path) => Some(WavCapture::<T>::create(path, config.output_format, rate)?),
        None => None,
    };

    #[cfg(feature = "playback")]
    let playback = if cli.play {
        Some(playback::Player::<T>::start(rate)?)
    } else {
        None
    };

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let target = cli.seconds.map(|s| (s * f64::from(rate)) as u64);
    let mut rendered = 0u64;
    let mut buffer = vec![AudioFrame::<T>::default(); config.buffer_size];
    let mut last_lcd = Instant::now();

    while target.is_none_or(|t| rendered < t) {
        let count = frontend.read_frames(&mut buffer);
        if count == 0 {
            thread::sleep(Duration::from_millis(1));
        } else {
            let frames = &buffer[..count];
            if let Some(capture) = &mut capture {
                capture.write(frames)?;
            }
            #[cfg(feature = "playback")]
            if let Some(player) = &playback {
                player.push(frames);
            }
            rendered += count as u64;
        }

        for output in frontend.output().try_iter() {
            match output {
                Output::Midi { instance, message } => debug!(instance, ?message, "MIDI out"),
                Output::Serial { instance, byte } => debug!(instance, byte, "serial out"),
            }
        }

        if last_lcd.elapsed() >= Duration::from_millis(50) {
            last_lcd = Instant::now();
            if let (Some(backend), Some(handle)) = (&mut lcd, &lcd_handle)
                && let Some(snapshot) = handle.try_snapshot()
            {
                backend.render(&snapshot);
            }
        }
    }

    frontend.stop();
    if let Some(backend) = &mut lcd {
        backend.stop();
    }
    if let Some(capture) = capture {
        let frames = capture.frames_written();
        capture.finalize()?;
        info!(frames, rate, "WAV written");
    }
    Ok(())
}

#[cfg(feature = "playback")]
mod playback {
    use std::error::Error;
    use std::sync::Arc;

    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::{SampleRate, Stream, StreamConfig};
    use parking_lot::Mutex;
    use ringbuf::traits::{Consumer, Producer, Split};
    use ringbuf::{HeapProd, HeapRb};
    use tracing::error;

    use super::OutputSample;
    use emu_sc55::AudioFrame;

    /// Feeds the default output device from a ring of mixed frames.
    pub struct Player<T> {
        _stream: Stream,
        producer: Arc<Mutex<HeapProd<T>>>,
    }

    impl<T: OutputSample> Player<T> {
        pub fn start(rate: u32) -> Result<Self, Box<dyn Error>> {
            let host = cpal::default_host();
            let device = host
                .default_output_device()
                .ok_or("no audio output device")?;
            let config = StreamConfig {
                channels: 2,
                sample_rate: SampleRate(rate),
                buffer_size: cpal::BufferSize::Default,
            };
            let ring = HeapRb::<T>::new(rate as usize);
            let (producer, mut consumer) = ring.split();
            let stream = device.build_output_stream(
                &config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    for sample in data.iter_mut() {
                        *sample = consumer.try_pop().unwrap_or_default();
                    }
                },
                |err| error!(%err, "audio stream error"),
                None,
            )?;
            stream.play()?;
            Ok(Self {
                _stream: stream,
                producer: Arc::new(Mutex::new(producer)),
            })
        }

        pub fn push(&self, frames: &[AudioFrame<T>]) {
            let mut producer = self.producer.lock();
            for frame in frames {
                let _ = producer.try_push(frame.left);
                let _ = producer.try_push(frame.right);
            }
        }
    }
}

fn setup_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    setup_tracing();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    cli.apply(&mut config)?;

    let romset = config.romset.unwrap_or_else(|| detect_romset(&config.rom_directory));
    if config.computer_switch != ComputerSwitch::Midi && !romset.supports_serial() {
        warn!(
            romset = romset.product_name(),
            "serial port is not available on this model"
        );
    }
    info!(
        romset = romset.product_name(),
        format = %config.output_format,
        buffer_size = config.buffer_size,
        buffer_count = config.buffer_count,
        "starting"
    );

    match config.output_format {
        OutputFormat::S16 => run::<i16>(&cli, &config, romset),
        OutputFormat::S32 => run::<i32>(&cli, &config, romset),
        OutputFormat::F32 => run::<f32>(&cli, &config, romset),
    }
}
