//! WAV capture of rendered output.

use std::fs::File;
use std::io::BufWriter;
use std::marker::PhantomData;
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use thiserror::Error;

use crate::audio::{AudioFrame, OutputFormat, Sample};

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}

/// WAV header fields for a format.
#[must_use]
pub const fn wav_spec(format: OutputFormat, sample_rate: u32) -> WavSpec {
    let (bits_per_sample, sample_format) = match format {
        OutputFormat::S16 => (16, SampleFormat::Int),
        OutputFormat::S32 => (32, SampleFormat::Int),
        OutputFormat::F32 => (32, SampleFormat::Float),
    };
    WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample,
        sample_format,
    }
}

/// Stereo WAV file writer for one sample type.
pub struct WavCapture<T> {
    writer: WavWriter<BufWriter<File>>,
    frames: u64,
    _sample: PhantomData<T>,
}

impl<T: Sample + hound::Sample> WavCapture<T> {
    /// Create `path`. `format` must describe `T`.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be created.
    pub fn create(path: &Path, format: OutputFormat, sample_rate: u32) -> Result<Self, CaptureError> {
        let writer = WavWriter::create(path, wav_spec(format, sample_rate))?;
        Ok(Self {
            writer,
            frames: 0,
            _sample: PhantomData,
        })
    }

    /// # Errors
    ///
    /// Fails on an I/O error.
    pub fn write(&mut self, frames: &[AudioFrame<T>]) -> Result<(), CaptureError> {
        for frame in frames {
            self.writer.write_sample(frame.left)?;
            self.writer.write_sample(frame.right)?;
        }
        self.frames += frames.len() as u64;
        Ok(())
    }

    #[must_use]
    pub const fn frames_written(&self) -> u64 {
        self.frames
    }

    /// Patch the header and close the file.
    ///
    /// # Errors
    ///
    /// Fails on an I/O error.
    pub fn finalize(self) -> Result<(), CaptureError> {
        self.writer.finalize()?;
        Ok(())
    }
}
