//! AFSK text modem for voice-bandwidth radio links
//!
//! Packs short text into a fixed 64-byte Reed-Solomon protected packet,
//! interleaves it, frames it behind a preamble and sync marker, and renders it
//! as continuous-phase two-tone audio. The decoder recovers the text from a
//! complete captured buffer.

pub mod afsk;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod fec;
pub mod fft_correlation;
pub mod filter;
pub mod framing;
pub mod hilbert;
pub mod interleave;
pub mod packet;
pub mod resample;
pub mod sync;

pub use config::ModemConfig;
pub use decoder::{DecodeResult, Decoder, Recovered};
pub use encoder::Encoder;
pub use error::{FecError, FramingError, InputError, ModemError, Result};
pub use fft_correlation::{fft_correlate_1d, Mode};

// Audio configuration
pub const SAMPLE_RATE: usize = 48000;
pub const BAUD_RATE: usize = 600;
pub const SAMPLES_PER_BIT: usize = SAMPLE_RATE / BAUD_RATE; // 80

// Tones (SSB/FM voice passband)
pub const FREQ_SPACE: f32 = 1200.0; // bit 0
pub const FREQ_MARK: f32 = 2000.0; // bit 1
pub const FREQ_THRESHOLD: f32 = 1600.0;

// Packet configuration
pub const TOTAL_BYTES: usize = 64;
pub const ECC_BYTES: usize = 16;
pub const PAYLOAD_BYTES: usize = TOTAL_BYTES - ECC_BYTES; // 48

// Frame configuration
pub const PREAMBLE_PATTERN: &str = "1010";
pub const PREAMBLE_REPEATS: usize = 20;
pub const SYNC_PATTERN: &str = "1010101000110011";
pub const TRAILER_BITS: usize = 20;
pub const INTERLEAVE_COLUMNS: usize = 8;

// Start marker and padding
pub const CHIRP_SAMPLES: usize = SAMPLE_RATE / 10; // 100 ms
pub const CHIRP_START_FREQ: f32 = 800.0;
pub const CHIRP_END_FREQ: f32 = 1500.0;
pub const CHIRP_GAIN: f32 = 0.8;
pub const LEAD_GAP_SAMPLES: usize = 1000;
pub const TAIL_GAP_SAMPLES: usize = 2000;

// Demodulator configuration
pub const FILTER_ORDER: usize = 4;
pub const FILTER_CUTOFF_RATIO: f32 = 1.5; // cutoff = ratio * baud rate
pub const VIZ_WINDOW_BITS: usize = 300;

/// Render `text` as a complete transmission with the default configuration.
pub fn modulate(text: &str, amplitude: f32) -> Vec<f32> {
    Encoder::default().modulate(text, amplitude)
}

/// Demodulate a complete capture with the default configuration.
///
/// `threshold` overrides the mark/space decision frequency in Hz.
pub fn demodulate(samples: &[f32], threshold: Option<f32>) -> DecodeResult {
    Decoder::default().demodulate(samples, threshold)
}
