//! WAV file access for the shell

use cosbit_core::resample::{first_channel, resample_audio};
use cosbit_core::SAMPLE_RATE;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::{debug, info};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WavError {
    #[error("WAV I/O error: {0}")]
    Hound(#[from] hound::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported WAV format: {format:?} {bits}-bit")]
    UnsupportedFormat { format: SampleFormat, bits: u16 },
}

/// Decoded capture, first channel only.
#[derive(Debug, Clone)]
pub struct Capture {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl Capture {
    /// Samples at the modem rate, resampled if the file differs.
    pub fn at_modem_rate(&self) -> Vec<f32> {
        if self.sample_rate as usize == SAMPLE_RATE {
            return self.samples.clone();
        }
        info!("Resampling {} Hz -> {} Hz", self.sample_rate, SAMPLE_RATE);
        resample_audio(&self.samples, self.sample_rate as usize, SAMPLE_RATE)
    }
}

/// Write mono 16-bit PCM at the modem sample rate.
pub fn write_wav(path: &Path, samples: &[f32]) -> Result<(), WavError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE as u32,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let file = File::create(path)?;
    let mut writer = WavWriter::new(std::io::BufWriter::new(file), spec)?;
    for &sample in samples {
        // Clamp to [-1.0, 1.0] range to avoid overflow, then scale to i16
        let clamped = sample.clamp(-1.0, 1.0);
        writer.write_sample((clamped * 32767.0) as i16)?;
    }
    writer.finalize()?;

    debug!("wrote {} samples to {}", samples.len(), path.display());
    Ok(())
}

/// Read a WAV file and keep its first channel as `f32` in [-1, 1].
pub fn read_wav(path: &Path) -> Result<Capture, WavError> {
    let mut reader = WavReader::new(BufReader::new(File::open(path)?))?;
    let spec = reader.spec();
    debug!(
        "{}: {} Hz, {} channels, {} bits {:?}",
        path.display(),
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample,
        spec.sample_format
    );

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / 32768.0))
            .collect::<Result<_, _>>()?,
        (SampleFormat::Int, bits @ (8 | 24 | 32)) => {
            let scale = (1i64 << (bits - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
        (SampleFormat::Float, 32) => reader.samples::<f32>().collect::<Result<_, _>>()?,
        (format, bits) => return Err(WavError::UnsupportedFormat { format, bits }),
    };

    Ok(Capture {
        samples: first_channel(&interleaved, spec.channels as usize),
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}
