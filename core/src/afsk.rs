//! Continuous-phase two-tone modulation and frequency-discriminator demodulation

use crate::config::ModemConfig;
use crate::filter::ButterworthLowpass;
use crate::hilbert::instantaneous_frequency;
use log::{trace, warn};
use std::f64::consts::PI;

/// Maps bits to tones, `samples_per_bit` samples each, with no phase jumps at
/// bit boundaries.
#[derive(Debug, Clone)]
pub struct AfskModulator {
    sample_rate: f64,
    samples_per_bit: usize,
    freq_space: f64,
    freq_mark: f64,
}

impl AfskModulator {
    pub fn new(config: &ModemConfig) -> Self {
        Self {
            sample_rate: config.sample_rate as f64,
            samples_per_bit: config.samples_per_bit(),
            freq_space: config.freq_space as f64,
            freq_mark: config.freq_mark as f64,
        }
    }

    /// Render `bits` as audio at `amplitude` (clamped to [0, 1]).
    ///
    /// Phase advances before each sample, so the first sample is
    /// `sin(2π·f/fs)` rather than zero.
    pub fn modulate(&self, bits: &[bool], amplitude: f32) -> Vec<f32> {
        let amplitude = clamp_amplitude(amplitude) as f64;
        let mut samples = Vec::with_capacity(bits.len() * self.samples_per_bit);
        let mut phase = 0.0f64;

        for &bit in bits {
            let freq = if bit { self.freq_mark } else { self.freq_space };
            let step = 2.0 * PI * freq / self.sample_rate;
            for _ in 0..self.samples_per_bit {
                phase = (phase + step).rem_euclid(2.0 * PI);
                samples.push((phase.sin() * amplitude) as f32);
            }
        }

        samples
    }
}

/// Clamp to [0, 1]; non-finite input becomes silence.
pub(crate) fn clamp_amplitude(amplitude: f32) -> f32 {
    if !amplitude.is_finite() {
        warn!("amplitude {} is not finite, using 0", amplitude);
        return 0.0;
    }
    if !(0.0..=1.0).contains(&amplitude) {
        let clamped = amplitude.clamp(0.0, 1.0);
        warn!("amplitude {} outside [0, 1], clamped to {}", amplitude, clamped);
        return clamped;
    }
    amplitude
}

/// Hard bit decisions plus the smoothed frequency track they were read from.
#[derive(Debug, Clone)]
pub struct Demodulated {
    pub bits: Vec<bool>,
    /// Low-pass filtered instantaneous frequency (Hz), one sample shorter than the input
    pub frequency_track: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct AfskDemodulator {
    sample_rate: f64,
    samples_per_bit: usize,
    lowpass: ButterworthLowpass,
}

impl AfskDemodulator {
    /// `config` must already be validated.
    pub fn new(config: &ModemConfig) -> Self {
        Self {
            sample_rate: config.sample_rate as f64,
            samples_per_bit: config.samples_per_bit(),
            lowpass: ButterworthLowpass::design(
                config.filter_order,
                config.filter_cutoff_hz(),
                config.sample_rate as f64,
            ),
        }
    }

    pub fn frequency_track(&self, samples: &[f32]) -> Vec<f64> {
        instantaneous_frequency(samples, self.sample_rate)
    }

    pub fn filter_track(&self, track: &[f64]) -> Vec<f64> {
        self.lowpass.filter(track)
    }

    /// `true` where the track is strictly above `threshold`.
    pub fn digitize(&self, track: &[f64], threshold: f32) -> Vec<bool> {
        let threshold = threshold as f64;
        track.iter().map(|&f| f > threshold).collect()
    }

    /// Read one decision per bit period, from the middle of each period.
    pub fn sample_bits(&self, digital: &[bool]) -> Vec<bool> {
        digital
            .iter()
            .skip(self.samples_per_bit / 2)
            .step_by(self.samples_per_bit.max(1))
            .copied()
            .collect()
    }

    pub fn demodulate(&self, samples: &[f32], threshold: f32) -> Demodulated {
        let raw = self.frequency_track(samples);
        trace!("frequency extracted: {} points from {} samples", raw.len(), samples.len());

        let frequency_track = self.filter_track(&raw);
        trace!("filtered: {} points", frequency_track.len());

        let digital = self.digitize(&frequency_track, threshold);
        trace!(
            "digitized at {} Hz: {} of {} points mark",
            threshold,
            digital.iter().filter(|&&d| d).count(),
            digital.len()
        );

        let bits = self.sample_bits(&digital);
        trace!("bit-sampled: {} bits", bits.len());

        Demodulated {
            bits,
            frequency_track,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alternating(len: usize) -> Vec<bool> {
        (0..len).map(|i| i % 2 == 0).collect()
    }

    #[test]
    fn test_modulated_length_and_peak() {
        let config = ModemConfig::default();
        let modulator = AfskModulator::new(&config);
        let audio = modulator.modulate(&alternating(10), 0.5);
        assert_eq!(audio.len(), 800);
        let peak = audio.iter().fold(0.0f32, |m, &x| m.max(x.abs()));
        assert!(peak <= 0.5 + 1e-6);
        assert!(peak > 0.45);
    }

    #[test]
    fn test_first_sample_is_advanced() {
        let config = ModemConfig::default();
        let audio = AfskModulator::new(&config).modulate(&[false], 1.0);
        let expected = (2.0 * PI * 1200.0 / 48000.0).sin() as f32;
        assert!((audio[0] - expected).abs() < 1e-6);
    }

    #[test]
    fn test_phase_is_continuous() {
        let config = ModemConfig::default();
        let audio = AfskModulator::new(&config).modulate(&alternating(40), 1.0);
        // largest step a 2000 Hz sine at 48 kHz can take is 2π·2000/48000
        let max_step = (2.0 * PI * 2000.0 / 48000.0) as f32 + 1e-4;
        for pair in audio.windows(2) {
            assert!((pair[1] - pair[0]).abs() <= max_step);
        }
    }

    #[test]
    fn test_amplitude_clamped() {
        let config = ModemConfig::default();
        let modulator = AfskModulator::new(&config);
        let loud = modulator.modulate(&[true; 4], 3.0);
        assert!(loud.iter().all(|x| x.abs() <= 1.0));
        assert_eq!(loud, modulator.modulate(&[true; 4], 1.0));

        let silent = modulator.modulate(&[true; 4], -1.0);
        assert!(silent.iter().all(|&x| x == 0.0));
        assert_eq!(clamp_amplitude(f32::NAN), 0.0);
    }

    #[test]
    fn test_sample_bits_positions() {
        let config = ModemConfig::default();
        let demod = AfskDemodulator::new(&config);
        let mut digital = vec![false; 400];
        digital[40] = true;
        digital[280] = true;
        assert_eq!(demod.sample_bits(&digital), vec![true, false, false, true, false]);
        assert!(demod.sample_bits(&digital[..40]).is_empty());
    }

    #[test]
    fn test_digitize_is_strict() {
        let config = ModemConfig::default();
        let demod = AfskDemodulator::new(&config);
        assert_eq!(
            demod.digitize(&[1599.0, 1600.0, 1600.5], 1600.0),
            vec![false, false, true]
        );
    }

    #[test]
    fn test_bits_survive_modulation() {
        let config = ModemConfig::default();
        let bits: Vec<bool> = (0..200).map(|i| (i * 7) % 5 < 2).collect();
        let mut audio = vec![0.0f32; 1000];
        audio.extend(AfskModulator::new(&config).modulate(&bits, 0.5));
        audio.extend(vec![0.0f32; 2000]);

        // 1000 leading samples is not a whole number of bits; trim to 960
        let demod = AfskDemodulator::new(&config);
        let out = demod.demodulate(&audio[40..], 1600.0);
        assert_eq!(out.frequency_track.len(), audio.len() - 41);
        let start = 12; // 960 samples of silence = 12 bit periods
        assert_eq!(&out.bits[start + 2..start + 198], &bits[2..198]);
    }

    static STAGE_MESSAGES: std::sync::Mutex<Vec<String>> = std::sync::Mutex::new(Vec::new());

    struct StageLogger;

    impl log::Log for StageLogger {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            metadata.target().starts_with("cosbit_core::afsk")
        }

        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                STAGE_MESSAGES.lock().unwrap().push(record.args().to_string());
            }
        }

        fn flush(&self) {}
    }

    static STAGE_LOGGER: StageLogger = StageLogger;

    #[test]
    fn test_each_stage_is_traced() {
        log::set_logger(&STAGE_LOGGER).unwrap();
        log::set_max_level(log::LevelFilter::Trace);

        let config = ModemConfig::default();
        let audio = AfskModulator::new(&config).modulate(&alternating(20), 0.5);
        let out = AfskDemodulator::new(&config).demodulate(&audio, 1600.0);
        assert_eq!(out.bits.len(), 20);

        let messages = STAGE_MESSAGES.lock().unwrap();
        for stage in ["frequency extracted", "filtered", "digitized", "bit-sampled: 20 bits"] {
            assert!(
                messages.iter().any(|m| m.starts_with(stage)),
                "no {:?} trace in {:?}",
                stage,
                messages
            );
        }
    }
}
