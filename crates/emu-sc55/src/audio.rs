//! Stereo frames and output sample formats.
//!
//! The PCM chip produces 32-bit frames. Frontends convert them to the
//! output format with a volume applied, then mix instances together.

#![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One stereo frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AudioFrame<T> {
    pub left: T,
    pub right: T,
}

impl<T> AudioFrame<T> {
    #[must_use]
    pub const fn new(left: T, right: T) -> Self {
        Self { left, right }
    }
}

/// Scale from the PCM's 32-bit output to a float in -1.0..1.0.
pub const F32_SCALE: f32 = 67_108_864.0;

/// Output volume as a 12-bit fixed point multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Volume(i64);

impl Volume {
    pub const UNITY: Self = Self(1 << 12);

    #[must_use]
    pub fn new(volume: f32) -> Self {
        Self((volume.max(0.0) * 4096.0).round() as i64)
    }

    #[must_use]
    pub fn as_f32(self) -> f32 {
        self.0 as f32 / 4096.0
    }

    fn apply(self, sample: i32) -> i64 {
        (i64::from(sample) * self.0) >> 12
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::UNITY
    }
}

/// A sample type the frontend can render to.
pub trait Sample: Copy + Default + Send + 'static {
    /// Convert one channel of a PCM frame.
    fn from_pcm(sample: i32, volume: Volume) -> Self;

    /// Combine two instances' output.
    #[must_use]
    fn mix(self, other: Self) -> Self;
}

impl Sample for i16 {
    fn from_pcm(sample: i32, volume: Volume) -> Self {
        (volume.apply(sample) >> 12).clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i16
    }

    fn mix(self, other: Self) -> Self {
        self.saturating_add(other)
    }
}

impl Sample for i32 {
    fn from_pcm(sample: i32, volume: Volume) -> Self {
        (volume.apply(sample) << 4).clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
    }

    fn mix(self, other: Self) -> Self {
        self.saturating_add(other)
    }
}

impl Sample for f32 {
    fn from_pcm(sample: i32, volume: Volume) -> Self {
        sample as f32 / F32_SCALE * volume.as_f32()
    }

    fn mix(self, other: Self) -> Self {
        self + other
    }
}

/// Convert a PCM frame to an output format.
#[must_use]
pub fn normalize<T: Sample>(frame: &AudioFrame<i32>, volume: Volume) -> AudioFrame<T> {
    AudioFrame {
        left: T::from_pcm(frame.left, volume),
        right: T::from_pcm(frame.right, volume),
    }
}

/// Mix `src` into `dst`.
pub fn mix_into<T: Sample>(dst: &mut [AudioFrame<T>], src: &[AudioFrame<T>]) {
    for (d, s) in dst.iter_mut().zip(src) {
        d.left = d.left.mix(s.left);
        d.right = d.right.mix(s.right);
    }
}

/// Output sample format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    S16,
    S32,
    F32,
}

impl OutputFormat {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::S16 => "s16",
            Self::S32 => "s32",
            Self::F32 => "f32",
        }
    }

    #[must_use]
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            Self::S16 => 2,
            Self::S32 | Self::F32 => 4,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "s16" => Ok(Self::S16),
            "s32" => Ok(Self::S32),
            "f32" => Ok(Self::F32),
            _ => Err(format!("unknown output format '{s}' (expected s16, s32 or f32)")),
        }
    }
}
