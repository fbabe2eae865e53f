//! ROM regions, loader errors and the wave ROM unscramble transform.
//!
//! The wave ROMs are dumped in the order the mask ROM stores them, with
//! address lines and data lines wired out of order on the board. The
//! unscramble transform undoes that wiring so the PCM engine sees linear
//! sample data.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::romset::{ROM_SET_N_FILES, Romset};

/// Address bit that each bit of the linear index lands on in the dump.
const ADDRESS_MAP: [u32; 20] = [2, 0, 3, 4, 1, 9, 13, 10, 18, 17, 6, 15, 11, 16, 8, 5, 12, 7, 14, 19];
/// Dump bit that supplies each bit of the output byte.
const DATA_MAP: [u32; 8] = [2, 0, 4, 5, 7, 6, 3, 1];

/// Storage regions a ROM image can be loaded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RomLocation {
    Rom1,
    Rom2,
    Waverom1,
    Waverom2,
    Waverom3,
    WaveromCard,
    WaveromExp,
    SubMcuRom,
}

impl RomLocation {
    pub const COUNT: usize = 8;

    pub const ALL: [Self; Self::COUNT] = [
        Self::Rom1,
        Self::Rom2,
        Self::Waverom1,
        Self::Waverom2,
        Self::Waverom3,
        Self::WaveromCard,
        Self::WaveromExp,
        Self::SubMcuRom,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Size of the backing buffer in bytes.
    #[must_use]
    pub const fn capacity(self) -> usize {
        match self {
            Self::Rom1 => 0x8000,
            Self::Rom2 => 0x8_0000,
            Self::Waverom1 | Self::Waverom2 | Self::WaveromCard => 0x20_0000,
            Self::Waverom3 => 0x10_0000,
            Self::WaveromExp => 0x80_0000,
            Self::SubMcuRom => 0x1000,
        }
    }

    /// Wave ROMs are stored scrambled and go through [`unscramble`].
    #[must_use]
    pub const fn is_waverom(self) -> bool {
        matches!(
            self,
            Self::Waverom1 | Self::Waverom2 | Self::Waverom3 | Self::WaveromCard | Self::WaveromExp
        )
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rom1 => "ROM1",
            Self::Rom2 => "ROM2",
            Self::Waverom1 => "WAVEROM1",
            Self::Waverom2 => "WAVEROM2",
            Self::Waverom3 => "WAVEROM3",
            Self::WaveromCard => "WAVEROM_CARD",
            Self::WaveromExp => "WAVEROM_EXP",
            Self::SubMcuRom => "SMROM",
        }
    }
}

impl fmt::Display for RomLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// ROM catalog and loader errors.
#[derive(Error, Debug)]
pub enum RomError {
    #[error("missing ROM file {}", .0.display())]
    Missing(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("ROM for {location} is too large: {size} bytes, max is {max} bytes")]
    TooLarge {
        location: RomLocation,
        size: usize,
        max: usize,
    },

    #[error("{location} requires a power-of-2 size, got {size} bytes")]
    NotPowerOfTwo { location: RomLocation, size: usize },

    #[error("unknown romset '{0}'")]
    UnknownRomset(String),

    #[error("unknown SC-55 revision '{0}'")]
    UnknownRevision(String),
}

/// Undo the board's address and data line scrambling.
///
/// Output byte `i` comes from the dump byte whose address has the low 20
/// bits of `i` permuted through [`ADDRESS_MAP`]; bits above 19 pass
/// through. Its data bits are permuted through [`DATA_MAP`]. Dump bytes past
/// the end of `src` read as zero.
pub fn unscramble(src: &[u8], dst: &mut [u8]) {
    for (i, out) in dst.iter_mut().enumerate() {
        *out = unscramble_data(src.get(scrambled_address(i)).copied().unwrap_or(0));
    }
}

/// Dump address holding linear byte `index`.
#[must_use]
pub fn scrambled_address(index: usize) -> usize {
    let mut address = index & !0xF_FFFF;
    for (bit, &target) in ADDRESS_MAP.iter().enumerate() {
        if index & (1 << bit) != 0 {
            address |= 1 << target;
        }
    }
    address
}

/// Reorder the data lines of one dump byte.
#[must_use]
pub fn unscramble_data(value: u8) -> u8 {
    DATA_MAP
        .iter()
        .enumerate()
        .filter(|&(_, &source)| value & (1 << source) != 0)
        .fold(0, |acc, (bit, _)| acc | (1 << bit))
}

/// Raw ROM images for one romset, one buffer per [`RomLocation`]. Empty
/// buffers mean "not supplied".
///
/// This is the only input the emulator takes for ROM data; reading the
/// files from disk is a convenience for the frontend.
#[derive(Debug, Clone, Default)]
pub struct RomImages {
    images: [Vec<u8>; RomLocation::COUNT],
}

impl RomImages {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, location: RomLocation, data: Vec<u8>) {
        self.images[location.index()] = data;
    }

    #[must_use]
    pub fn get(&self, location: RomLocation) -> &[u8] {
        &self.images[location.index()]
    }

    /// Locations with data, in load order.
    pub fn present(&self) -> impl Iterator<Item = (RomLocation, &[u8])> {
        RomLocation::ALL
            .into_iter()
            .map(|location| (location, self.get(location)))
            .filter(|(_, data)| !data.is_empty())
    }

    /// Read every ROM file of `romset` from `dir`.
    ///
    /// Missing required files are an error; missing optional ones are
    /// skipped.
    pub fn read_dir(romset: Romset, dir: &Path) -> Result<Self, RomError> {
        let mut images = Self::new();
        for slot in 0..ROM_SET_N_FILES {
            let Some(location) = romset.slot_location(slot) else {
                continue;
            };
            let path = dir.join(romset.files()[slot]);
            if !path.exists() {
                if romset.is_optional(location) {
                    info!(path = %path.display(), "optional ROM not found, skipping");
                    continue;
                }
                return Err(RomError::Missing(path));
            }
            let data = fs::read(&path).map_err(|source| RomError::Read {
                path: path.clone(),
                source,
            })?;
            debug!(location = location.name(), size = data.len(), "read ROM image");
            images.set(location, data);
        }
        Ok(images)
    }
}
