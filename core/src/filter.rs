//! Butterworth low-pass filter as cascaded second-order sections

use crate::error::{ModemError, Result};
use rustfft::num_complex::Complex64;
use std::f64::consts::PI;

/// Second-order section, transposed direct form II.
///
/// Denominator is `1 + a1 z^-1 + a2 z^-2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    b: [f64; 3],
    a: [f64; 2],
}

impl Biquad {
    pub fn new(b: [f64; 3], a: [f64; 2]) -> Self {
        Self { b, a }
    }

    /// Filter a whole buffer starting from zero state.
    fn run(&self, input: &mut [f64]) {
        let mut s1 = 0.0;
        let mut s2 = 0.0;
        for x in input.iter_mut() {
            let y = self.b[0] * *x + s1;
            s1 = self.b[1] * *x - self.a[0] * y + s2;
            s2 = self.b[2] * *x - self.a[1] * y;
            *x = y;
        }
    }

    fn response(&self, z_inv: Complex64) -> Complex64 {
        let z_inv2 = z_inv * z_inv;
        let num = self.b[0] + z_inv * self.b[1] + z_inv2 * self.b[2];
        let den = 1.0 + z_inv * self.a[0] + z_inv2 * self.a[1];
        num / den
    }

    pub fn is_stable(&self) -> bool {
        self.a[1].abs() < 1.0 && self.a[0].abs() < 1.0 + self.a[1]
    }
}

/// Digital Butterworth low-pass, unity gain at DC.
///
/// Designed from the analog prototype with a prewarped bilinear transform, so
/// the -3 dB point lands exactly on the requested cutoff.
#[derive(Debug, Clone)]
pub struct ButterworthLowpass {
    sections: Vec<Biquad>,
    sample_rate: f64,
}

impl ButterworthLowpass {
    pub fn new(order: usize, cutoff_hz: f64, sample_rate: f64) -> Result<Self> {
        if order == 0 {
            return Err(ModemError::InvalidConfig("filter order must be at least 1".to_string()));
        }
        if !(cutoff_hz > 0.0 && cutoff_hz < sample_rate / 2.0) {
            return Err(ModemError::InvalidConfig(format!(
                "cutoff {} Hz outside (0, {}) Hz",
                cutoff_hz,
                sample_rate / 2.0
            )));
        }
        Ok(Self::design(order, cutoff_hz, sample_rate))
    }

    /// Design without range checks; callers pass a validated configuration.
    pub(crate) fn design(order: usize, cutoff_hz: f64, sample_rate: f64) -> Self {
        let k = 2.0 * sample_rate;
        let wc = k * (PI * cutoff_hz / sample_rate).tan();

        let mut sections = Vec::with_capacity(order.div_ceil(2));
        for i in 0..order / 2 {
            // Upper-half-plane prototype pole; its conjugate shares the section
            let theta = PI * (2 * i + 1 + order) as f64 / (2 * order) as f64;
            let pole = Complex64::from_polar(wc, theta);
            let zp = (k + pole) / (k - pole);

            let a1 = -2.0 * zp.re;
            let a2 = zp.norm_sqr();
            let gain = (1.0 + a1 + a2) / 4.0;
            sections.push(Biquad::new([gain, 2.0 * gain, gain], [a1, a2]));
        }
        if order % 2 == 1 {
            let zp = (k - wc) / (k + wc);
            let gain = (1.0 - zp) / 2.0;
            sections.push(Biquad::new([gain, gain, 0.0], [-zp, 0.0]));
        }

        Self {
            sections,
            sample_rate,
        }
    }

    pub fn sections(&self) -> &[Biquad] {
        &self.sections
    }

    pub fn filter(&self, input: &[f64]) -> Vec<f64> {
        let mut out = input.to_vec();
        for section in &self.sections {
            section.run(&mut out);
        }
        out
    }

    /// |H(f)| of the cascade.
    pub fn magnitude_at(&self, freq_hz: f64) -> f64 {
        let z_inv = Complex64::from_polar(1.0, -2.0 * PI * freq_hz / self.sample_rate);
        self.sections
            .iter()
            .fold(Complex64::new(1.0, 0.0), |acc, s| acc * s.response(z_inv))
            .norm()
    }
}
