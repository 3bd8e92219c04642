//! FFT-based analytic signal and instantaneous frequency
//!
//! Whole-buffer transform: the spectrum's negative frequencies are zeroed and
//! the positive ones doubled (DC and, for even lengths, Nyquist kept at
//! unit weight).

use rustfft::num_complex::Complex64;
use rustfft::FftPlanner;
use std::f64::consts::PI;

/// Complex analytic signal whose real part equals `samples`.
pub fn analytic_signal(samples: &[f32]) -> Vec<Complex64> {
    let n = samples.len();
    if n == 0 {
        return Vec::new();
    }

    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(n);
    let inverse = planner.plan_fft_inverse(n);

    let mut buffer: Vec<Complex64> = samples
        .iter()
        .map(|&x| Complex64::new(x as f64, 0.0))
        .collect();
    forward.process(&mut buffer);

    // DC (and Nyquist for even n) keep unit weight
    let half = n / 2;
    let doubled_end = if n % 2 == 0 { half } else { half + 1 };
    for bin in buffer.iter_mut().take(doubled_end).skip(1) {
        *bin *= 2.0;
    }
    for bin in buffer.iter_mut().skip(half + 1) {
        *bin = Complex64::new(0.0, 0.0);
    }

    inverse.process(&mut buffer);
    let scale = 1.0 / n as f64;
    for value in buffer.iter_mut() {
        *value *= scale;
    }
    buffer
}

/// Remove 2π jumps between consecutive phase samples.
///
/// A step of exactly ±π keeps its sign, smaller steps are left untouched.
pub fn unwrap_phase(phase: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(phase.len());
    let Some(&first) = phase.first() else {
        return out;
    };
    out.push(first);

    let mut correction = 0.0;
    for pair in phase.windows(2) {
        let step = pair[1] - pair[0];
        if step.abs() >= PI {
            let mut wrapped = (step + PI).rem_euclid(2.0 * PI) - PI;
            if wrapped == -PI && step > 0.0 {
                wrapped = PI;
            }
            correction += wrapped - step;
        }
        out.push(pair[1] + correction);
    }
    out
}

/// Instantaneous frequency in Hz, one value per adjacent sample pair.
///
/// The result is one element shorter than the input.
pub fn instantaneous_frequency(samples: &[f32], sample_rate: f64) -> Vec<f64> {
    let phase: Vec<f64> = analytic_signal(samples).iter().map(|z| z.arg()).collect();
    let unwrapped = unwrap_phase(&phase);
    let scale = sample_rate / (2.0 * PI);
    unwrapped.windows(2).map(|w| (w[1] - w[0]) * scale).collect()
}
