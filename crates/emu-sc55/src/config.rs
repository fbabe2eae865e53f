//! Frontend configuration.
//!
//! A `Config` can be read from a JSON file and is then overridden by
//! command-line flags. Every field has a default, so a partial file is fine.

use std::fs;
use std::path::{Path, PathBuf};

use emu_core::{closest_power_of_two, has_single_bit};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::audio::OutputFormat;
use crate::romset::{ComputerSwitch, Mk1Revision, Romset};
use crate::sc55::SystemReset;

pub const DEFAULT_BUFFER_SIZE: usize = 512;
pub const DEFAULT_BUFFER_COUNT: usize = 16;
pub const MAX_INSTANCES: usize = 16;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("instance count must be between 1 and {MAX_INSTANCES}, got {0}")]
    Instances(usize),

    #[error("buffer size and count must be non-zero")]
    EmptyBuffer,

    #[error("invalid buffer spec '{0}' (expected SIZE or SIZE:COUNT)")]
    BufferSpec(String),
}

/// Everything the frontend needs to start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `None` picks the first complete romset found in `rom_directory`.
    pub romset: Option<Romset>,
    /// Forced SC-55 firmware revision.
    pub revision: Option<Mk1Revision>,
    pub rom_directory: PathBuf,
    /// JV-880 NVRAM file.
    pub nvram: Option<PathBuf>,
    pub instances: usize,
    pub computer_switch: ComputerSwitch,
    /// `None` leaves the choice to the frontend.
    pub reset: Option<SystemReset>,
    /// Frames per audio buffer. Must be a power of two.
    pub buffer_size: usize,
    pub buffer_count: usize,
    pub output_format: OutputFormat,
    pub oversampling: bool,
    pub lcd: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            romset: None,
            revision: None,
            rom_directory: PathBuf::from("."),
            nvram: None,
            instances: 1,
            computer_switch: ComputerSwitch::default(),
            reset: None,
            buffer_size: DEFAULT_BUFFER_SIZE,
            buffer_count: DEFAULT_BUFFER_COUNT,
            output_format: OutputFormat::default(),
            oversampling: true,
            lcd: true,
        }
    }
}

impl Config {
    /// Read a JSON config file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not valid JSON for `Config`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check ranges and repair what can be repaired.
    ///
    /// A buffer size that is not a power of two is rounded to the closest
    /// one with a warning.
    ///
    /// # Errors
    ///
    /// Fails on an instance count outside 1..=16 or an empty buffer.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if !(1..=MAX_INSTANCES).contains(&self.instances) {
            return Err(ConfigError::Instances(self.instances));
        }
        if self.buffer_size == 0 || self.buffer_count == 0 {
            return Err(ConfigError::EmptyBuffer);
        }
        if !has_single_bit(self.buffer_size) {
            let fixed = closest_power_of_two(self.buffer_size);
            warn!(
                requested = self.buffer_size,
                using = fixed,
                "audio buffer size must be a power of two"
            );
            self.buffer_size = fixed;
        }
        Ok(())
    }

    /// Frames the sample ring must hold for every buffer to be in flight.
    #[must_use]
    pub const fn ring_frames(&self) -> usize {
        self.buffer_size * self.buffer_count
    }
}

/// Parse `SIZE` or `SIZE:COUNT`. A missing count keeps `default_count`.
///
/// # Errors
///
/// Fails if either part is not a number.
pub fn parse_buffer_spec(spec: &str, default_count: usize) -> Result<(usize, usize), ConfigError> {
    let bad = || ConfigError::BufferSpec(spec.to_string());
    match spec.split_once(':') {
        Some((size, count)) => Ok((
            size.parse().map_err(|_| bad())?,
            count.parse().map_err(|_| bad())?,
        )),
        None => Ok((spec.parse().map_err(|_| bad())?, default_count)),
    }
}
