//! FFT cross-correlation of real signals
//!
//! Index conventions:
//!
//! - **Full**: length `N + M - 1`; a template window starting at `signal[i]`
//!   lands at output index `i + M - 1`.
//! - **Valid**: length `N - M + 1` (empty if `M > N`); output index `i` is the
//!   window starting at `signal[i]`.

use crate::error::{ModemError, Result};
use realfft::RealFftPlanner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Full,
    Valid,
}

/// Correlate `template` against `signal` in O((N + M) log(N + M)).
///
/// Empty inputs give an empty result.
pub fn fft_correlate_1d(signal: &[f32], template: &[f32], mode: Mode) -> Result<Vec<f32>> {
    if signal.is_empty() || template.is_empty() {
        return Ok(Vec::new());
    }
    if mode == Mode::Valid && signal.len() < template.len() {
        return Ok(Vec::new());
    }

    let output_len = signal.len() + template.len() - 1;
    let fft_size = output_len.next_power_of_two();

    let mut padded_signal = vec![0.0f32; fft_size];
    padded_signal[..signal.len()].copy_from_slice(signal);

    // Time-reversed template turns the product into a correlation
    let mut padded_template = vec![0.0f32; fft_size];
    for (slot, &value) in padded_template.iter_mut().zip(template.iter().rev()) {
        *slot = value;
    }

    let mut planner = RealFftPlanner::<f32>::new();
    let r2c = planner.plan_fft_forward(fft_size);
    let c2r = planner.plan_fft_inverse(fft_size);

    let mut signal_spectrum = r2c.make_output_vec();
    let mut template_spectrum = r2c.make_output_vec();
    r2c.process(&mut padded_signal, &mut signal_spectrum)
        .map_err(|e| ModemError::FftError(format!("forward transform of signal: {:?}", e)))?;
    r2c.process(&mut padded_template, &mut template_spectrum)
        .map_err(|e| ModemError::FftError(format!("forward transform of template: {:?}", e)))?;

    for (s, t) in signal_spectrum.iter_mut().zip(template_spectrum.iter()) {
        *s *= *t;
    }

    let mut result = c2r.make_output_vec();
    c2r.process(&mut signal_spectrum, &mut result)
        .map_err(|e| ModemError::FftError(format!("inverse transform: {:?}", e)))?;

    let scale = 1.0 / fft_size as f32;
    result.iter_mut().for_each(|x| *x *= scale);

    match mode {
        Mode::Full => {
            result.truncate(output_len);
            Ok(result)
        }
        Mode::Valid => {
            let start = template.len() - 1;
            let valid_len = signal.len() - template.len() + 1;
            Ok(result[start..start + valid_len].to_vec())
        }
    }
}
