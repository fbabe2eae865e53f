//! Roland SC-55 family sound module emulator.
//!
//! Covers the SC-55, SC-55mkII, SC-55ST, CM-300/SCC-1, SCB-55, RLP-3237,
//! SC-155, SC-155mkII and JV-880. All of them are an H8/532 MCU running
//! the firmware from ROM, a custom PCM chip reading sample ROMs, an
//! HD44780 display and a button matrix. The MCU steps one instruction at a
//! time; peripherals catch up to its cycle count after each step.

pub mod audio;
pub mod bus;
pub mod capture;
pub mod config;
pub mod frontend;
pub mod lcd;
pub mod memory;
pub mod midi;
pub mod peripherals;
pub mod rom;
pub mod romset;
mod sc55;

pub use audio::{AudioFrame, OutputFormat, Sample, Volume};
pub use bus::{Sc55Bus, Sinks, Target};
pub use capture::{CaptureError, WavCapture};
pub use config::{Config, ConfigError};
pub use frontend::{Frontend, FrontendError};
pub use lcd::{LcdBackend, LcdHandle, LcdPanel, LcdSnapshot};
pub use memory::Memory;
pub use midi::{GM_RESET, GS_RESET, MessageCollector};
pub use peripherals::buttons::Buttons;
pub use rom::{RomError, RomImages, RomLocation, unscramble};
pub use romset::{ComputerSwitch, Mk1Revision, Romset, detect_romset};
pub use sc55::{Emulator, EmulatorOptions, LoadError, SystemReset};
