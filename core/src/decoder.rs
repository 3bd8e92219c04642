use crate::afsk::{AfskDemodulator, Demodulated};
use crate::config::ModemConfig;
use crate::error::{ModemError, Result};
use crate::fec::FecDecoder;
use crate::framing::FrameDecoder;
use crate::interleave::BitInterleaver;
use crate::packet::Packet;
use log::{debug, trace};

/// A successfully decoded packet.
#[derive(Debug, Clone, PartialEq)]
pub struct Recovered {
    pub text: String,
    /// Filtered frequency track (Hz) from the sync marker onward, for display
    pub frequency_track: Vec<f32>,
    /// Bit index of the sync marker in the recovered bit stream
    pub sync_index: usize,
    /// Symbols repaired by Reed-Solomon
    pub corrected_symbols: usize,
}

/// Outcome of one demodulation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeResult {
    Recovered(Recovered),
    Failed { reason: ModemError },
}

impl DecodeResult {
    pub fn is_recovered(&self) -> bool {
        matches!(self, DecodeResult::Recovered(_))
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            DecodeResult::Recovered(r) => Some(&r.text),
            DecodeResult::Failed { .. } => None,
        }
    }

    pub fn failure(&self) -> Option<&ModemError> {
        match self {
            DecodeResult::Recovered(_) => None,
            DecodeResult::Failed { reason } => Some(reason),
        }
    }

    pub fn into_result(self) -> Result<Recovered> {
        match self {
            DecodeResult::Recovered(r) => Ok(r),
            DecodeResult::Failed { reason } => Err(reason),
        }
    }
}

impl From<Result<Recovered>> for DecodeResult {
    fn from(result: Result<Recovered>) -> Self {
        match result {
            Ok(recovered) => DecodeResult::Recovered(recovered),
            Err(reason) => DecodeResult::Failed { reason },
        }
    }
}

/// Audio to text. Holds only immutable configuration, so one instance can
/// serve any number of calls and threads.
#[derive(Debug, Clone)]
pub struct Decoder {
    config: ModemConfig,
    fec: FecDecoder,
    interleaver: BitInterleaver,
    framer: FrameDecoder,
    afsk: AfskDemodulator,
}

impl Decoder {
    pub fn new(config: ModemConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: ModemConfig) -> Self {
        Self {
            fec: FecDecoder::with_params(config.payload_bytes(), config.ecc_bytes),
            interleaver: BitInterleaver::new(config.interleave_columns),
            framer: FrameDecoder::new(&config),
            afsk: AfskDemodulator::new(&config),
            config,
        }
    }

    pub fn config(&self) -> &ModemConfig {
        &self.config
    }

    /// Frequency extraction, filtering, digitizing and bit sampling.
    pub fn recover_bits(&self, samples: &[f32], threshold: Option<f32>) -> Demodulated {
        let threshold = threshold.unwrap_or(self.config.threshold);
        self.afsk.demodulate(samples, threshold)
    }

    /// Full receive pipeline; failures come back as `Err`.
    pub fn decode(&self, samples: &[f32], threshold: Option<f32>) -> Result<Recovered> {
        let demodulated = self.recover_bits(samples, threshold);

        let hit = match self.framer.locate(&demodulated.bits) {
            Ok(hit) => hit,
            Err(e) => {
                debug!("no frame in {} bits: {}", demodulated.bits.len(), e);
                return Err(e.into());
            }
        };
        trace!("payload bits {}..{}", hit.payload_start, hit.payload_start + hit.payload.len());

        let codeword_bits = self.interleaver.deinterleave(&hit.payload);
        let (text, report) = match Packet::from_bits(&codeword_bits).into_text(&self.fec) {
            Ok(decoded) => decoded,
            Err(e) => {
                debug!("frame at bit {} failed FEC: {}", hit.sync_index, e);
                return Err(e);
            }
        };
        debug!(
            "recovered {} bytes of text, {} symbols corrected",
            text.len(),
            report.corrected
        );

        Ok(Recovered {
            text,
            frequency_track: self.track_window(&demodulated.frequency_track, hit.sync_index),
            sync_index: hit.sync_index,
            corrected_symbols: report.corrected,
        })
    }

    /// Like [`Decoder::decode`] but never fails: every outcome is a
    /// `DecodeResult`.
    pub fn demodulate(&self, samples: &[f32], threshold: Option<f32>) -> DecodeResult {
        self.decode(samples, threshold).into()
    }

    fn track_window(&self, track: &[f64], sync_index: usize) -> Vec<f32> {
        let spb = self.config.samples_per_bit();
        let start = (sync_index * spb).min(track.len());
        let end = ((sync_index + self.config.viz_window_bits) * spb).min(track.len());
        track[start..end].iter().map(|&f| f as f32).collect()
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::build(ModemConfig::default())
    }
}
