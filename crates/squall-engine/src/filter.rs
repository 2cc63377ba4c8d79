//! Biquad filters (Audio EQ Cookbook coefficients).
//!
//! The thunder body needs a lowpass whose cutoff sweeps during the voice, so
//! alongside the usual fixed-coefficient processing there is a swept variant
//! that recomputes coefficients per sample from a cutoff curve.

use std::f64::consts::PI;

/// Biquad filter coefficients, normalized by `a0`.
#[derive(Debug, Clone, Copy)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoeffs {
    fn from_raw(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Self {
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Lowpass coefficients. Q is clamped to 0.5 to keep alpha finite.
    pub fn lowpass(cutoff: f64, q: f64, sample_rate: f64) -> Self {
        let q = q.max(0.5);
        let omega = 2.0 * PI * cutoff / sample_rate;
        let (sin_omega, cos_omega) = omega.sin_cos();
        let alpha = sin_omega / (2.0 * q);

        Self::from_raw(
            (1.0 - cos_omega) / 2.0,
            1.0 - cos_omega,
            (1.0 - cos_omega) / 2.0,
            1.0 + alpha,
            -2.0 * cos_omega,
            1.0 - alpha,
        )
    }

    /// Highpass coefficients.
    pub fn highpass(cutoff: f64, q: f64, sample_rate: f64) -> Self {
        let q = q.max(0.5);
        let omega = 2.0 * PI * cutoff / sample_rate;
        let (sin_omega, cos_omega) = omega.sin_cos();
        let alpha = sin_omega / (2.0 * q);

        Self::from_raw(
            (1.0 + cos_omega) / 2.0,
            -(1.0 + cos_omega),
            (1.0 + cos_omega) / 2.0,
            1.0 + alpha,
            -2.0 * cos_omega,
            1.0 - alpha,
        )
    }

    /// Bandpass coefficients (constant skirt gain).
    pub fn bandpass(center: f64, q: f64, sample_rate: f64) -> Self {
        let q = q.max(0.5);
        let omega = 2.0 * PI * center / sample_rate;
        let (sin_omega, cos_omega) = omega.sin_cos();
        let alpha = sin_omega / (2.0 * q);

        Self::from_raw(
            alpha,
            0.0,
            -alpha,
            1.0 + alpha,
            -2.0 * cos_omega,
            1.0 - alpha,
        )
    }

    /// Peaking EQ coefficients.
    pub fn peaking_eq(frequency: f64, q: f64, db_gain: f64, sample_rate: f64) -> Self {
        let q = q.max(0.5);
        let a = 10.0_f64.powf(db_gain / 40.0);
        let omega = 2.0 * PI * frequency / sample_rate;
        let (sin_omega, cos_omega) = omega.sin_cos();
        let alpha = sin_omega / (2.0 * q);

        Self::from_raw(
            1.0 + alpha * a,
            -2.0 * cos_omega,
            1.0 - alpha * a,
            1.0 + alpha / a,
            -2.0 * cos_omega,
            1.0 - alpha / a,
        )
    }
}

/// Biquad filter with direct-form-I state.
#[derive(Debug, Clone)]
pub struct BiquadFilter {
    coeffs: BiquadCoeffs,
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl BiquadFilter {
    /// Creates a filter with the given coefficients.
    pub fn new(coeffs: BiquadCoeffs) -> Self {
        Self {
            coeffs,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Creates a lowpass filter.
    pub fn lowpass(cutoff: f64, q: f64, sample_rate: f64) -> Self {
        Self::new(BiquadCoeffs::lowpass(cutoff, q, sample_rate))
    }

    /// Creates a highpass filter.
    pub fn highpass(cutoff: f64, q: f64, sample_rate: f64) -> Self {
        Self::new(BiquadCoeffs::highpass(cutoff, q, sample_rate))
    }

    /// Creates a bandpass filter.
    pub fn bandpass(center: f64, q: f64, sample_rate: f64) -> Self {
        Self::new(BiquadCoeffs::bandpass(center, q, sample_rate))
    }

    /// Replaces the coefficients, keeping the delay-line state.
    pub fn set_coeffs(&mut self, coeffs: BiquadCoeffs) {
        self.coeffs = coeffs;
    }

    /// Processes one sample.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let output = self.coeffs.b0 * input + self.coeffs.b1 * self.x1 + self.coeffs.b2 * self.x2
            - self.coeffs.a1 * self.y1
            - self.coeffs.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }

    /// Processes a buffer in place.
    pub fn process_buffer(&mut self, buffer: &mut [f64]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }
}

/// Processes a buffer through a lowpass whose cutoff ramps linearly from
/// `start_cutoff` to `end_cutoff` over `sweep_samples`, then holds.
pub fn sweep_lowpass(
    buffer: &mut [f64],
    start_cutoff: f64,
    end_cutoff: f64,
    sweep_samples: usize,
    q: f64,
    sample_rate: f64,
) {
    let mut filter = BiquadFilter::lowpass(start_cutoff, q, sample_rate);
    let span = sweep_samples.max(1) as f64;

    for (i, sample) in buffer.iter_mut().enumerate() {
        if i <= sweep_samples {
            let t = i as f64 / span;
            let cutoff = start_cutoff + (end_cutoff - start_cutoff) * t;
            filter.set_coeffs(BiquadCoeffs::lowpass(cutoff, q, sample_rate));
        }
        *sample = filter.process(*sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowpass_passes_dc() {
        let mut filter = BiquadFilter::lowpass(1000.0, 0.707, 44100.0);
        let mut last = 0.0;
        for _ in 0..200 {
            last = filter.process(1.0);
        }
        assert!((last - 1.0).abs() < 0.1);
    }

    #[test]
    fn highpass_blocks_dc() {
        let mut filter = BiquadFilter::highpass(1000.0, 0.707, 44100.0);
        let mut last = 0.0;
        for _ in 0..1000 {
            last = filter.process(1.0);
        }
        assert!(last.abs() < 0.1);
    }

    #[test]
    fn bandpass_attenuates_dc_and_passes_center() {
        let sr = 44100.0;
        let mut filter = BiquadFilter::bandpass(1000.0, 8.0, sr);

        // DC rejection.
        let mut last = 0.0;
        for _ in 0..2000 {
            last = filter.process(1.0);
        }
        assert!(last.abs() < 0.01);

        // A tone at the center frequency keeps most of its energy.
        let mut filter = BiquadFilter::bandpass(1000.0, 8.0, sr);
        let mut energy_in = 0.0;
        let mut energy_out = 0.0;
        for i in 0..4410 {
            let x = (2.0 * PI * 1000.0 * i as f64 / sr).sin();
            let y = filter.process(x);
            energy_in += x * x;
            energy_out += y * y;
        }
        assert!(energy_out > energy_in * 0.5);
    }

    #[test]
    fn swept_lowpass_darkens_the_tail() {
        let sr = 44100.0;
        // Alternate-sign input is the highest representable frequency.
        let mut buffer: Vec<f64> = (0..8820)
            .map(|i| if i % 2 == 0 { 1.0 } else { -1.0 })
            .collect();
        sweep_lowpass(&mut buffer, 8000.0, 100.0, 4410, 0.707, sr);

        let head: f64 = buffer[..2205].iter().map(|s| s * s).sum();
        let tail: f64 = buffer[6615..].iter().map(|s| s * s).sum();
        assert!(tail < head * 0.05);
    }
}
