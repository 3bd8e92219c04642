use crate::error::{ModemError, Result};
use crate::framing::bits_from_str;
use crate::{
    BAUD_RATE, CHIRP_END_FREQ, CHIRP_GAIN, CHIRP_SAMPLES, CHIRP_START_FREQ, ECC_BYTES,
    FILTER_CUTOFF_RATIO, FILTER_ORDER, FREQ_MARK, FREQ_SPACE, FREQ_THRESHOLD,
    INTERLEAVE_COLUMNS, LEAD_GAP_SAMPLES, PREAMBLE_PATTERN, PREAMBLE_REPEATS, SAMPLE_RATE,
    SYNC_PATTERN, TAIL_GAP_SAMPLES, TOTAL_BYTES, TRAILER_BITS, VIZ_WINDOW_BITS,
};

/// Largest Reed-Solomon block over GF(2^8).
const MAX_BLOCK_BYTES: usize = 255;

/// Immutable modem parameters shared by the encoder and decoder.
///
/// `Default` reproduces the on-air format: 48 kHz, 600 baud, 1200/2000 Hz
/// tones, 64-byte packets carrying 16 parity bytes. Independent configurations
/// can coexist, which is how the tests exercise non-default layouts.
#[derive(Debug, Clone, PartialEq)]
pub struct ModemConfig {
    pub sample_rate: usize,
    pub baud_rate: usize,
    /// Tone for bit 0 (Hz)
    pub freq_space: f32,
    /// Tone for bit 1 (Hz)
    pub freq_mark: f32,
    /// Default decision frequency for the demodulator (Hz)
    pub threshold: f32,
    pub total_bytes: usize,
    pub ecc_bytes: usize,
    pub interleave_columns: usize,
    pub preamble: Vec<bool>,
    pub sync_pattern: Vec<bool>,
    pub trailer_bits: usize,
    pub chirp_samples: usize,
    pub chirp_start_freq: f32,
    pub chirp_end_freq: f32,
    /// Chirp level relative to the data amplitude
    pub chirp_gain: f32,
    pub lead_gap_samples: usize,
    pub tail_gap_samples: usize,
    pub filter_order: usize,
    /// Low-pass cutoff as a multiple of the baud rate
    pub filter_cutoff_ratio: f32,
    /// Length of the diagnostic frequency track, in bit periods
    pub viz_window_bits: usize,
}

impl Default for ModemConfig {
    fn default() -> Self {
        let preamble = PREAMBLE_PATTERN.repeat(PREAMBLE_REPEATS);
        Self {
            sample_rate: SAMPLE_RATE,
            baud_rate: BAUD_RATE,
            freq_space: FREQ_SPACE,
            freq_mark: FREQ_MARK,
            threshold: FREQ_THRESHOLD,
            total_bytes: TOTAL_BYTES,
            ecc_bytes: ECC_BYTES,
            interleave_columns: INTERLEAVE_COLUMNS,
            preamble: literal_bits(&preamble),
            sync_pattern: literal_bits(SYNC_PATTERN),
            trailer_bits: TRAILER_BITS,
            chirp_samples: CHIRP_SAMPLES,
            chirp_start_freq: CHIRP_START_FREQ,
            chirp_end_freq: CHIRP_END_FREQ,
            chirp_gain: CHIRP_GAIN,
            lead_gap_samples: LEAD_GAP_SAMPLES,
            tail_gap_samples: TAIL_GAP_SAMPLES,
            filter_order: FILTER_ORDER,
            filter_cutoff_ratio: FILTER_CUTOFF_RATIO,
            viz_window_bits: VIZ_WINDOW_BITS,
        }
    }
}

// Constant patterns contain only '0' and '1'.
fn literal_bits(pattern: &str) -> Vec<bool> {
    pattern.bytes().map(|b| b == b'1').collect()
}

impl ModemConfig {
    /// Replace the sync marker with a `'0'`/`'1'` literal.
    pub fn with_sync_pattern(mut self, pattern: &str) -> Result<Self> {
        self.sync_pattern = bits_from_str(pattern).ok_or_else(|| {
            ModemError::InvalidConfig(format!("sync pattern {:?} is not a bit string", pattern))
        })?;
        Ok(self)
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Samples per bit, truncated
    pub fn samples_per_bit(&self) -> usize {
        self.sample_rate / self.baud_rate.max(1)
    }

    pub fn payload_bytes(&self) -> usize {
        self.total_bytes.saturating_sub(self.ecc_bytes)
    }

    /// Bits of one serialized codeword
    pub fn payload_bits(&self) -> usize {
        self.total_bytes * 8
    }

    /// Bits of a complete frame: preamble + sync + payload + trailer
    pub fn frame_bits(&self) -> usize {
        self.preamble.len() + self.sync_pattern.len() + self.payload_bits() + self.trailer_bits
    }

    pub fn filter_cutoff_hz(&self) -> f64 {
        self.baud_rate as f64 * self.filter_cutoff_ratio as f64
    }

    /// Number of samples `Encoder::modulate` produces
    pub fn transmission_samples(&self) -> usize {
        self.chirp_samples
            + self.lead_gap_samples
            + self.frame_bits() * self.samples_per_bit()
            + self.tail_gap_samples
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(ModemError::InvalidConfig(msg));

        if self.sample_rate == 0 || self.baud_rate == 0 {
            return invalid("sample rate and baud rate must be non-zero".to_string());
        }
        if self.samples_per_bit() < 2 {
            return invalid(format!(
                "baud rate {} leaves fewer than 2 samples per bit at {} Hz",
                self.baud_rate, self.sample_rate
            ));
        }

        let nyquist = self.sample_rate as f32 / 2.0;
        for (name, freq) in [("space", self.freq_space), ("mark", self.freq_mark)] {
            if !(freq > 0.0 && freq < nyquist) {
                return invalid(format!("{} tone {} Hz outside (0, {}) Hz", name, freq, nyquist));
            }
        }
        if self.freq_space == self.freq_mark {
            return invalid("mark and space tones must differ".to_string());
        }
        if !self.threshold.is_finite() {
            return invalid("threshold must be finite".to_string());
        }

        if self.ecc_bytes == 0 || self.ecc_bytes >= self.total_bytes {
            return invalid(format!(
                "ecc bytes {} must be in 1..{}",
                self.ecc_bytes, self.total_bytes
            ));
        }
        if self.total_bytes > MAX_BLOCK_BYTES {
            return invalid(format!(
                "packet of {} bytes exceeds the {}-byte Reed-Solomon block",
                self.total_bytes, MAX_BLOCK_BYTES
            ));
        }
        if self.interleave_columns == 0 || self.payload_bits() % self.interleave_columns != 0 {
            return invalid(format!(
                "{} codeword bits do not fill {} interleave columns",
                self.payload_bits(),
                self.interleave_columns
            ));
        }
        if self.sync_pattern.is_empty() {
            return invalid("sync pattern must not be empty".to_string());
        }

        if self.filter_order == 0 {
            return invalid("filter order must be at least 1".to_string());
        }
        let cutoff = self.filter_cutoff_hz();
        if !(cutoff > 0.0 && cutoff < self.sample_rate as f64 / 2.0) {
            return invalid(format!("filter cutoff {} Hz outside (0, {}) Hz", cutoff, nyquist));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let config = ModemConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.samples_per_bit(), 80);
        assert_eq!(config.payload_bytes(), 48);
        assert_eq!(config.payload_bits(), 512);
        assert_eq!(config.preamble.len(), 80);
        assert_eq!(config.sync_pattern.len(), 16);
        assert_eq!(config.frame_bits(), 80 + 16 + 512 + 20);
        assert!((config.filter_cutoff_hz() - 900.0).abs() < 1e-9);
    }

    #[test]
    fn test_transmission_length() {
        let config = ModemConfig::default();
        assert_eq!(config.transmission_samples(), 4800 + 1000 + 628 * 80 + 2000);
    }

    #[test]
    fn test_rejects_oversized_block() {
        let config = ModemConfig {
            total_bytes: 300,
            ..ModemConfig::default()
        };
        assert!(matches!(config.validate(), Err(ModemError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_parity_filling_packet() {
        let config = ModemConfig {
            ecc_bytes: 64,
            ..ModemConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_tone_above_nyquist() {
        let config = ModemConfig {
            sample_rate: 3000,
            baud_rate: 300,
            ..ModemConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_binary_sync_pattern() {
        assert!(ModemConfig::default().with_sync_pattern("10x1").is_err());
        let config = ModemConfig::default().with_sync_pattern("1110010").unwrap();
        assert_eq!(config.sync_pattern.len(), 7);
    }
}
