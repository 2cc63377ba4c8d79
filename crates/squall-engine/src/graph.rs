//! Mixing buses for the static signal graph.
//!
//! The graph topology is fixed: voices land on a stereo dry bus and a mono
//! reverb-send bus; the send bus is convolved with the shared impulse
//! response and summed back, then the master EQ chain and gain are applied.

use std::f64::consts::FRAC_PI_4;

use crate::filter::{BiquadCoeffs, BiquadFilter};
use crate::params::EqParams;

/// A stereo accumulation bus. Writes past the end of the bus are truncated.
#[derive(Debug, Clone)]
pub struct StereoBus {
    /// Left channel samples.
    pub left: Vec<f64>,
    /// Right channel samples.
    pub right: Vec<f64>,
}

impl StereoBus {
    /// Creates a silent bus of `num_samples` frames.
    pub fn new(num_samples: usize) -> Self {
        Self {
            left: vec![0.0; num_samples],
            right: vec![0.0; num_samples],
        }
    }

    /// Frames per channel.
    pub fn len(&self) -> usize {
        self.left.len()
    }

    /// Returns true if the bus has no frames.
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Adds a mono signal at `start` with equal-power panning.
    pub fn add_panned(&mut self, samples: &[f64], start: usize, gain: f64, pan: f64) {
        let pan_angle = (pan.clamp(-1.0, 1.0) + 1.0) * FRAC_PI_4;
        let left_gain = pan_angle.cos() * gain;
        let right_gain = pan_angle.sin() * gain;

        for (i, &sample) in samples.iter().enumerate() {
            let idx = start + i;
            if idx >= self.left.len() {
                break;
            }
            self.left[idx] += sample * left_gain;
            self.right[idx] += sample * right_gain;
        }
    }

    /// Adds a stereo signal at `start`.
    pub fn add_stereo(&mut self, left: &[f64], right: &[f64], start: usize, gain: f64) {
        for (i, (&l, &r)) in left.iter().zip(right.iter()).enumerate() {
            let idx = start + i;
            if idx >= self.left.len() {
                break;
            }
            self.left[idx] += l * gain;
            self.right[idx] += r * gain;
        }
    }

    /// Sums another bus into this one at the given gain, truncating to this
    /// bus's length.
    pub fn add_bus(&mut self, other: &StereoBus, gain: f64) {
        self.add_stereo(&other.left, &other.right, 0, gain);
    }

    /// Applies the master EQ chain: low-cut highpass then peaking bands,
    /// each channel filtered independently.
    pub fn apply_eq(&mut self, eq: &EqParams, sample_rate: f64) {
        let mut coeffs = Vec::new();
        if eq.low_cut > 0.0 {
            coeffs.push(BiquadCoeffs::highpass(eq.low_cut, 0.707, sample_rate));
        }
        for band in &eq.bands {
            coeffs.push(BiquadCoeffs::peaking_eq(
                band.frequency,
                band.q,
                band.gain_db,
                sample_rate,
            ));
        }

        for channel in [&mut self.left, &mut self.right] {
            for &c in &coeffs {
                BiquadFilter::new(c).process_buffer(channel);
            }
        }
    }

    /// Scales both channels.
    pub fn apply_gain(&mut self, gain: f64) {
        for sample in self.left.iter_mut().chain(self.right.iter_mut()) {
            *sample *= gain;
        }
    }

    /// Peak absolute sample across both channels.
    pub fn peak(&self) -> f64 {
        self.left
            .iter()
            .chain(self.right.iter())
            .fold(0.0f64, |acc, s| acc.max(s.abs()))
    }
}

/// A mono accumulation bus, used for the reverb send.
#[derive(Debug, Clone)]
pub struct MonoBus {
    /// Accumulated samples.
    pub samples: Vec<f64>,
}

impl MonoBus {
    /// Creates a silent bus of `num_samples` frames.
    pub fn new(num_samples: usize) -> Self {
        Self {
            samples: vec![0.0; num_samples],
        }
    }

    /// Frames in the bus.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the bus has no frames.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Adds a mono signal at `start`, truncating past the bus end.
    pub fn add(&mut self, samples: &[f64], start: usize, gain: f64) {
        for (i, &sample) in samples.iter().enumerate() {
            let idx = start + i;
            if idx >= self.samples.len() {
                break;
            }
            self.samples[idx] += sample * gain;
        }
    }
}
