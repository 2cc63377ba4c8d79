//! Continuous rain texture: a granular scheduler spawning one drop voice
//! per tick.
//!
//! Each drop is a short noise grain shaped by a power-law envelope, colored
//! by a bandpass at a random center frequency within the (possibly
//! oscillating) pitch window, panned randomly, and sent to both the dry bus
//! and the shared reverb.

use rand::Rng;
use rand_pcg::Pcg32;

use crate::filter::BiquadFilter;
use crate::generator::Generator;
use crate::noise::grain_envelope;
use crate::params::RainParams;
use crate::voice::{SendTap, Voice, VoiceKind, VoicePlacement};

/// Longest grain a single drop may use, in seconds.
const MAX_GRAIN_SECONDS: f64 = 0.2;

/// Envelope shape exponent for drop transients.
const GRAIN_SHAPE: f64 = 2.5;

/// The rain generator.
#[derive(Debug)]
pub struct RainSynth {
    params: RainParams,
    running: bool,
    /// Engine time since `start()`, in seconds.
    t: f64,
    /// Accumulated time since the last drop.
    accum: f64,
    /// Interval currently being waited out; resampled after each drop so
    /// rate changes take effect on the next tick, never retroactively.
    interval: f64,
}

impl RainSynth {
    /// Creates a stopped rain generator.
    pub fn new(params: RainParams) -> Self {
        Self {
            params,
            running: false,
            t: 0.0,
            accum: 0.0,
            interval: 0.0,
        }
    }

    /// Current parameters.
    pub fn params(&self) -> &RainParams {
        &self.params
    }

    /// Replaces the parameter set. In-flight voices are unaffected; the new
    /// values are read from the next tick on.
    pub fn set_params(&mut self, params: RainParams) {
        self.params = params;
        // Force the next tick to resample its interval from the new rate.
        self.interval = 0.0;
    }

    fn sample_interval(&mut self, rng: &mut Pcg32) -> f64 {
        1.0 / self.params.drop_rate + self.params.interval_jitter.eval_positive(rng)
    }

    /// Builds one drop voice triggered at the current engine time.
    fn spawn_drop(&self, sample_rate: f64, rng: &mut Pcg32) -> Voice {
        let decay = self.params.decay_time.min(MAX_GRAIN_SECONDS);
        let num_samples = ((decay * sample_rate) as usize).max(1);

        let mut grain = grain_envelope(rng, num_samples, GRAIN_SHAPE);

        // Pitch window endpoints may themselves oscillate over engine time.
        let min_pitch = self.params.min_pitch.eval(self.t);
        let max_pitch = self.params.max_pitch.eval(self.t);
        let center = if max_pitch > min_pitch {
            rng.gen_range(min_pitch..max_pitch)
        } else {
            min_pitch
        };
        BiquadFilter::bandpass(center, self.params.q, sample_rate).process_buffer(&mut grain);

        let pan = if self.params.pan_range > 0.0 {
            rng.gen_range(-self.params.pan_range..self.params.pan_range)
        } else {
            0.0
        };

        let send = SendTap {
            samples: grain.clone(),
            level: self.params.wet_level,
        };

        Voice {
            kind: VoiceKind::Drop,
            start_sample: (self.t * sample_rate).round() as usize,
            placement: VoicePlacement::Panned {
                samples: grain,
                pan,
            },
            dry_level: self.params.dry_level,
            send: Some(send),
        }
    }
}

impl Generator for RainSynth {
    fn start(&mut self) {
        self.running = true;
        self.t = 0.0;
        self.accum = 0.0;
        self.interval = 0.0;
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn advance(&mut self, dt: f64, sample_rate: f64, rng: &mut Pcg32) -> Vec<Voice> {
        if !self.running {
            return Vec::new();
        }

        let mut voices = Vec::new();
        let mut remaining = dt;

        if self.interval <= 0.0 {
            self.interval = self.sample_interval(rng);
        }

        loop {
            let to_next = self.interval - self.accum;
            if to_next > remaining {
                self.accum += remaining;
                self.t += remaining;
                break;
            }
            self.t += to_next;
            remaining -= to_next;
            self.accum = 0.0;

            voices.push(self.spawn_drop(sample_rate, rng));
            self.interval = self.sample_interval(rng);
        }

        voices
    }
}
