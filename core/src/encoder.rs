use crate::afsk::{clamp_amplitude, AfskModulator};
use crate::config::ModemConfig;
use crate::error::{InputError, Result};
use crate::fec::FecEncoder;
use crate::framing::FrameEncoder;
use crate::interleave::BitInterleaver;
use crate::packet::Packet;
use crate::sync::generate_start_marker;
use log::trace;

/// Text to audio: packet -> interleave -> frame -> AFSK, wrapped in the start
/// marker and silence gaps.
#[derive(Debug, Clone)]
pub struct Encoder {
    config: ModemConfig,
    fec: FecEncoder,
    interleaver: BitInterleaver,
    framer: FrameEncoder,
    afsk: AfskModulator,
}

impl Encoder {
    pub fn new(config: ModemConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: ModemConfig) -> Self {
        Self {
            fec: FecEncoder::with_params(config.payload_bytes(), config.ecc_bytes),
            interleaver: BitInterleaver::new(config.interleave_columns),
            framer: FrameEncoder::new(&config),
            afsk: AfskModulator::new(&config),
            config,
        }
    }

    pub fn config(&self) -> &ModemConfig {
        &self.config
    }

    /// Reject text whose UTF-8 encoding does not fit one packet payload.
    pub fn validate_text(&self, text: &str) -> Result<()> {
        let max = self.config.payload_bytes();
        if text.len() > max {
            return Err(InputError::PayloadTooLong {
                len: text.len(),
                max,
            }
            .into());
        }
        Ok(())
    }

    /// The protected packet for `text`; overlong text is truncated.
    pub fn packet(&self, text: &str) -> Packet {
        Packet::from_text(text, &self.fec)
    }

    /// Complete on-air bit sequence for `text`.
    pub fn frame_bits(&self, text: &str) -> Vec<bool> {
        let payload = self.interleaver.interleave(&self.packet(text).to_bits());
        self.framer.build(&payload)
    }

    /// Render `text` as a full transmission: chirp, gap, AFSK frame, gap.
    pub fn modulate(&self, text: &str, amplitude: f32) -> Vec<f32> {
        let amplitude = clamp_amplitude(amplitude);
        let bits = self.frame_bits(text);

        let mut samples = Vec::with_capacity(self.config.transmission_samples());
        samples.extend(generate_start_marker(&self.config, amplitude));
        samples.resize(samples.len() + self.config.lead_gap_samples, 0.0);
        samples.extend(self.afsk.modulate(&bits, amplitude));
        samples.resize(samples.len() + self.config.tail_gap_samples, 0.0);

        trace!("modulated {} frame bits into {} samples", bits.len(), samples.len());
        samples
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::build(ModemConfig::default())
    }
}
