//! Acoustic start marker: a linear chirp ahead of the data burst
//!
//! The decoder does not need the marker (it locks on the bit-level sync
//! pattern), but locating it gives a sample-accurate transmission start for
//! diagnostics.

use crate::afsk::clamp_amplitude;
use crate::config::ModemConfig;
use crate::fft_correlation::{fft_correlate_1d, Mode};
use log::{debug, warn};
use std::f64::consts::PI;

/// Minimum normalized correlation accepted as a marker
pub const MARKER_DETECTION_THRESHOLD: f32 = 0.5;

/// Linear chirp sweeping `start_freq` -> `end_freq` over `duration_samples`.
///
/// Sample times are spaced evenly from 0 to the nominal duration inclusive,
/// and the waveform is a cosine, so the first sample equals `amplitude`.
pub fn generate_chirp(
    duration_samples: usize,
    start_freq: f32,
    end_freq: f32,
    amplitude: f32,
    sample_rate: usize,
) -> Vec<f32> {
    if duration_samples == 0 {
        return Vec::new();
    }

    let duration = duration_samples as f64 / sample_rate as f64;
    let f0 = start_freq as f64;
    let sweep = (end_freq as f64 - f0) / duration;
    let step = if duration_samples > 1 {
        duration / (duration_samples - 1) as f64
    } else {
        0.0
    };

    (0..duration_samples)
        .map(|n| {
            let t = n as f64 * step;
            let phase = 2.0 * PI * (f0 * t + 0.5 * sweep * t * t);
            (amplitude as f64 * phase.cos()) as f32
        })
        .collect()
}

/// Start marker for a transmission at `amplitude`.
pub fn generate_start_marker(config: &ModemConfig, amplitude: f32) -> Vec<f32> {
    generate_chirp(
        config.chirp_samples,
        config.chirp_start_freq,
        config.chirp_end_freq,
        clamp_amplitude(amplitude) * config.chirp_gain,
        config.sample_rate,
    )
}

/// Sample index where the start marker most likely begins.
///
/// Uses the normalized cross-correlation so the result does not depend on the
/// recording level. Returns `None` when nothing correlates above
/// [`MARKER_DETECTION_THRESHOLD`].
pub fn detect_start_marker(samples: &[f32], config: &ModemConfig) -> Option<usize> {
    let template = generate_start_marker(config, 1.0);
    if template.is_empty() || samples.len() < template.len() {
        return None;
    }

    let correlation = match fft_correlate_1d(samples, &template, Mode::Valid) {
        Ok(corr) => corr,
        Err(e) => {
            warn!("start marker correlation failed: {}", e);
            return None;
        }
    };

    let template_energy: f64 = template.iter().map(|&x| (x as f64) * (x as f64)).sum();

    // Prefix sums of squared samples give each window's energy in O(1)
    let mut sq_prefix = vec![0.0f64; samples.len() + 1];
    for (k, &x) in samples.iter().enumerate() {
        sq_prefix[k + 1] = sq_prefix[k] + (x as f64) * (x as f64);
    }

    let mut best_pos = 0;
    let mut best_score = 0.0f32;
    for (i, &raw) in correlation.iter().enumerate() {
        let window_energy = sq_prefix[i + template.len()] - sq_prefix[i];
        let denom = (window_energy * template_energy).sqrt();
        if denom <= 1e-10 {
            continue;
        }
        let score = (raw as f64 / denom).abs() as f32;
        if score > best_score {
            best_score = score;
            best_pos = i;
        }
    }

    debug!("start marker score {:.3} at sample {}", best_score, best_pos);

    if best_score > MARKER_DETECTION_THRESHOLD {
        Some(best_pos)
    } else {
        None
    }
}
