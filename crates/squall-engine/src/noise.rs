//! Noise and kernel synthesis.
//!
//! All functions are pure given a length and an RNG stream: the same seed
//! always produces the same buffer. Buffers are finite; no generator here
//! keeps state between calls.

use rand::Rng;
use rand_pcg::Pcg32;
use std::sync::Arc;

/// Generates white noise: i.i.d. uniform samples in [-1, 1].
pub fn white_noise(rng: &mut Pcg32, num_samples: usize) -> Vec<f64> {
    (0..num_samples).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

/// Generates pink noise using Paul Kellet's 6-pole filter bank.
///
/// Six running state variables plus a raw white tap are updated per sample
/// with fixed coefficients, giving the characteristic -3 dB/octave slope.
pub fn pink_noise(rng: &mut Pcg32, num_samples: usize) -> Vec<f64> {
    let mut b0 = 0.0;
    let mut b1 = 0.0;
    let mut b2 = 0.0;
    let mut b3 = 0.0;
    let mut b4 = 0.0;
    let mut b5 = 0.0;
    let mut b6 = 0.0;

    let mut samples = Vec::with_capacity(num_samples);
    for _ in 0..num_samples {
        let w: f64 = rng.gen_range(-1.0..1.0);
        b0 = 0.99886 * b0 + w * 0.0555179;
        b1 = 0.99332 * b1 + w * 0.0750759;
        b2 = 0.969 * b2 + w * 0.153852;
        b3 = 0.8665 * b3 + w * 0.3104856;
        b4 = 0.55 * b4 + w * 0.5329522;
        b5 = -0.7616 * b5 - w * 0.016898;

        let out = (b0 + b1 + b2 + b3 + b4 + b5 + b6 + w * 0.5362) * 0.11;
        b6 = w * 0.115926;
        samples.push(out);
    }
    samples
}

/// A short noise transient shaped by a power-law decay envelope, used for a
/// single raindrop: `U(-1,1) * (1 - i/len)^shape_exponent`.
pub fn grain_envelope(rng: &mut Pcg32, num_samples: usize, shape_exponent: f64) -> Vec<f64> {
    let len = num_samples.max(1) as f64;
    (0..num_samples)
        .map(|i| {
            let w: f64 = rng.gen_range(-1.0..1.0);
            w * (1.0 - i as f64 / len).powf(shape_exponent)
        })
        .collect()
}

/// A precomputed multi-channel convolution kernel imparting reverberant
/// decay.
///
/// Immutable once built and shared by every reverb-send path of a render.
/// Parameter changes build a fresh kernel; in-flight sends holding the old
/// [`Arc`] are unaffected.
#[derive(Debug)]
pub struct ImpulseResponse {
    channels: Vec<Vec<f64>>,
    sample_rate: f64,
}

impl ImpulseResponse {
    /// Builds a decay kernel: per channel, per sample `i`,
    /// `U(-1,1) * (1 - i/len)^decay_exponent`.
    pub fn new(
        rng: &mut Pcg32,
        num_channels: usize,
        duration_seconds: f64,
        decay_exponent: f64,
        sample_rate: f64,
    ) -> Arc<Self> {
        let length = ((duration_seconds * sample_rate) as usize).max(1);
        let channels = (0..num_channels)
            .map(|_| grain_envelope(rng, length, decay_exponent))
            .collect();
        Arc::new(Self {
            channels,
            sample_rate,
        })
    }

    /// Kernel length in samples.
    pub fn len(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Returns true if the kernel is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of channels.
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Samples for one channel.
    pub fn channel(&self, index: usize) -> &[f64] {
        &self.channels[index]
    }

    /// Sample rate the kernel was built for.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }
}
