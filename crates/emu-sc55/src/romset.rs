//! Romset catalog: model variants, ROM file names and romset detection.
//!
//! Every romset uses the same seven file slots:
//!
//! | Slot | Contents |
//! |------|----------|
//! | 0 | Main program ROM (ROM1) |
//! | 1 | Program/data ROM (ROM2) |
//! | 2 | Wave ROM 1 |
//! | 3 | Wave ROM 2 |
//! | 4 | Wave ROM 3, sub-MCU ROM or JV-880 expansion |
//! | 5 | JV-880 PCM card |
//! | 6 | Battery-backed memory dump (SRAM file name) |

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::rom::{RomError, RomLocation};

/// Number of file slots per romset.
pub const ROM_SET_N_FILES: usize = 7;

/// Slot holding the SRAM file name.
const MEMORY_SLOT: usize = 6;

/// File names per romset, indexed by [`Romset::index`]. Empty means the
/// slot is unused.
pub const ROM_FILES: [[&str; ROM_SET_N_FILES]; Romset::COUNT] = [
    [
        "rom1.bin",
        "rom2.bin",
        "waverom1.bin",
        "waverom2.bin",
        "rom_sm.bin",
        "",
        "memory.bin",
    ],
    [
        "rom1.bin",
        "rom2_st.bin",
        "waverom1.bin",
        "waverom2.bin",
        "rom_sm.bin",
        "",
        "",
    ],
    [
        "sc55_rom1.bin",
        "sc55_rom2.bin",
        "sc55_waverom1.bin",
        "sc55_waverom2.bin",
        "sc55_waverom3.bin",
        "",
        "sc55_memory.bin",
    ],
    [
        "cm300_rom1.bin",
        "cm300_rom2.bin",
        "cm300_waverom1.bin",
        "cm300_waverom2.bin",
        "cm300_waverom3.bin",
        "",
        "",
    ],
    [
        "jv880_rom1.bin",
        "jv880_rom2.bin",
        "jv880_waverom1.bin",
        "jv880_waverom2.bin",
        "jv880_waverom_expansion.bin",
        "jv880_waverom_pcmcard.bin",
        "jv880_memory.bin",
    ],
    [
        "scb55_rom1.bin",
        "scb55_rom2.bin",
        "scb55_waverom1.bin",
        "scb55_waverom2.bin",
        "",
        "",
        "",
    ],
    [
        "rlp3237_rom1.bin",
        "rlp3237_rom2.bin",
        "rlp3237_waverom1.bin",
        "",
        "",
        "",
        "",
    ],
    [
        "sc155_rom1.bin",
        "sc155_rom2.bin",
        "sc155_waverom1.bin",
        "sc155_waverom2.bin",
        "sc155_waverom3.bin",
        "",
        "sc155_memory.bin",
    ],
    [
        "rom1.bin",
        "rom2.bin",
        "waverom1.bin",
        "waverom2.bin",
        "rom_sm.bin",
        "",
        "memory.bin",
    ],
];

/// Supported models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Romset {
    /// SC-55mkII
    #[default]
    Mk2,
    /// SC-55ST
    St,
    /// SC-55
    Mk1,
    /// CM-300 / SCC-1
    Cm300,
    /// JV-880
    Jv880,
    /// SCB-55
    Scb55,
    /// RLP-3237
    Rlp3237,
    /// SC-155
    Sc155,
    /// SC-155mkII
    Sc155Mk2,
}

/// Model traits that gate bus and peripheral behaviour. Fixed once the
/// romset is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// First-generation board (SC-55, CM-300, SC-155).
    pub mk1: bool,
    pub cm300: bool,
    pub st: bool,
    pub jv880: bool,
    /// No sub-MCU on the board (SCB-55, RLP-3237).
    pub scb55: bool,
    pub sc155: bool,
    /// A sub-MCU bridges the serial port (SC-55mkII, SC-55ST, SC-155mkII).
    pub submcu: bool,
}

impl Romset {
    pub const COUNT: usize = 9;

    pub const ALL: [Self; Self::COUNT] = [
        Self::Mk2,
        Self::St,
        Self::Mk1,
        Self::Cm300,
        Self::Jv880,
        Self::Scb55,
        Self::Rlp3237,
        Self::Sc155,
        Self::Sc155Mk2,
    ];

    /// Position in [`ROM_FILES`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Short name used on the command line and in config files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mk2 => "mk2",
            Self::St => "st",
            Self::Mk1 => "mk1",
            Self::Cm300 => "cm300",
            Self::Jv880 => "jv880",
            Self::Scb55 => "scb55",
            Self::Rlp3237 => "rlp3237",
            Self::Sc155 => "sc155",
            Self::Sc155Mk2 => "sc155mk2",
        }
    }

    /// Product name for log output.
    #[must_use]
    pub const fn product_name(self) -> &'static str {
        match self {
            Self::Mk2 => "SC-55mk2",
            Self::St => "SC-55st",
            Self::Mk1 => "SC-55mk1",
            Self::Cm300 => "CM-300/SCC-1",
            Self::Jv880 => "JV-880",
            Self::Scb55 => "SCB-55",
            Self::Rlp3237 => "RLP-3237",
            Self::Sc155 => "SC-155",
            Self::Sc155Mk2 => "SC-155mk2",
        }
    }

    #[must_use]
    pub const fn capabilities(self) -> Capabilities {
        let mk1 = matches!(self, Self::Mk1 | Self::Cm300 | Self::Sc155);
        let jv880 = matches!(self, Self::Jv880);
        let scb55 = matches!(self, Self::Scb55 | Self::Rlp3237);
        Capabilities {
            mk1,
            cm300: matches!(self, Self::Cm300),
            st: matches!(self, Self::St),
            jv880,
            scb55,
            sc155: matches!(self, Self::Sc155 | Self::Sc155Mk2),
            submcu: !mk1 && !jv880 && !scb55,
        }
    }

    /// File names for all seven slots.
    #[must_use]
    pub const fn files(self) -> &'static [&'static str; ROM_SET_N_FILES] {
        &ROM_FILES[self.index()]
    }

    /// Which ROM region a file slot fills. `None` for unused slots and the
    /// memory slot.
    #[must_use]
    pub const fn slot_location(self, slot: usize) -> Option<RomLocation> {
        if slot >= MEMORY_SLOT || ROM_FILES[self.index()][slot].is_empty() {
            return None;
        }
        Some(match slot {
            0 => RomLocation::Rom1,
            1 => RomLocation::Rom2,
            2 => RomLocation::Waverom1,
            3 => RomLocation::Waverom2,
            4 => match self {
                Self::Mk2 | Self::St | Self::Sc155Mk2 => RomLocation::SubMcuRom,
                Self::Jv880 => RomLocation::WaveromExp,
                _ => RomLocation::Waverom3,
            },
            _ => RomLocation::WaveromCard,
        })
    }

    /// SRAM dump file name, if this model has one.
    #[must_use]
    pub const fn memory_file(self) -> Option<&'static str> {
        let name = ROM_FILES[self.index()][MEMORY_SLOT];
        if name.is_empty() { None } else { Some(name) }
    }

    /// ROMs that may be absent without making the romset incomplete.
    #[must_use]
    pub const fn is_optional(self, location: RomLocation) -> bool {
        matches!(self, Self::Jv880)
            && matches!(location, RomLocation::WaveromExp | RomLocation::WaveromCard)
    }

    /// Whether the serial (computer) port can be used on this model.
    #[must_use]
    pub const fn supports_serial(self) -> bool {
        matches!(self, Self::Mk2 | Self::St)
    }

    /// MCU crystal frequency in Hz.
    #[must_use]
    pub const fn mcu_frequency(self) -> u64 {
        if self.capabilities().mk1 { 20_000_000 } else { 24_000_000 }
    }
}

impl fmt::Display for Romset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Romset {
    type Err = RomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|romset| romset.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| RomError::UnknownRomset(s.to_string()))
    }
}

/// Pick the first romset whose first five named files all exist in `dir`.
/// Falls back to the SC-55mkII.
#[must_use]
pub fn detect_romset(dir: &Path) -> Romset {
    for romset in Romset::ALL {
        let complete = romset.files()[..5]
            .iter()
            .filter(|name| !name.is_empty())
            .all(|name| dir.join(name).exists());
        if complete {
            debug!(romset = romset.name(), dir = %dir.display(), "romset detected");
            return romset;
        }
    }
    info!("no complete romset found, assuming {}", Romset::Mk2.product_name());
    Romset::Mk2
}

/// SC-55 (first generation) firmware revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mk1Revision {
    #[serde(rename = "1.00")]
    V100,
    #[serde(rename = "1.10")]
    V110,
    #[serde(rename = "1.20")]
    V120,
    #[serde(rename = "1.21")]
    V121,
    #[serde(rename = "2.00")]
    V200,
}

impl Mk1Revision {
    pub const ALL: [Self; 5] = [Self::V100, Self::V110, Self::V120, Self::V121, Self::V200];

    #[must_use]
    pub const fn version(self) -> &'static str {
        match self {
            Self::V100 => "1.00",
            Self::V110 => "1.10",
            Self::V120 => "1.20",
            Self::V121 => "1.21",
            Self::V200 => "2.00",
        }
    }

    /// Revisions that read a GM reset as a GS reset.
    #[must_use]
    pub const fn lacks_gm_reset(self) -> bool {
        matches!(self, Self::V100 | Self::V110)
    }

    /// Find a revision string (`Ver1.21` and similar) in the program ROMs.
    #[must_use]
    pub fn detect(roms: &[&[u8]]) -> Option<Self> {
        Self::ALL.into_iter().find(|revision| {
            let needle = format!("Ver{}", revision.version());
            roms.iter()
                .any(|rom| rom.windows(needle.len()).any(|w| w == needle.as_bytes()))
        })
    }
}

impl fmt::Display for Mk1Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.version())
    }
}

impl FromStr for Mk1Revision {
    type Err = RomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|revision| revision.version() == s)
            .ok_or_else(|| RomError::UnknownRevision(s.to_string()))
    }
}

/// Position of the computer/MIDI selector switch on the rear panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComputerSwitch {
    Rs422,
    Rs232c1,
    Rs232c2,
    #[default]
    Midi,
}

impl ComputerSwitch {
    /// Two-bit switch code as the firmware reads it.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Rs422 => 0,
            Self::Rs232c1 => 1,
            Self::Rs232c2 => 2,
            Self::Midi => 3,
        }
    }
}

impl FromStr for ComputerSwitch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rs422" => Ok(Self::Rs422),
            "rs232c1" => Ok(Self::Rs232c1),
            "rs232c2" => Ok(Self::Rs232c2),
            "midi" => Ok(Self::Midi),
            _ => Err(format!("unknown serial type '{s}'")),
        }
    }
}
