//! Typed parameter model for the storm generators.
//!
//! Two modulated parameter kinds exist alongside plain scalars:
//!
//! - [`OscParam`]: a base value plus a continuous sinusoidal offset
//!   evaluated against monotonic engine time. Used for slowly drifting
//!   targets such as the rain pitch window.
//! - [`RandParam`]: a base value plus a fresh uniform jitter drawn every
//!   time the parameter is consumed. Used for per-strike thunder variation.
//!
//! Every generator is configured by an explicit struct with named fields;
//! unknown preset keys are rejected at deserialization time.

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use crate::error::{EngineError, EngineResult};

/// A parameter with an optional continuous sinusoidal modulation.
///
/// When `osc_enabled` is set, evaluation returns
/// `value + amplitude * sin(2π * frequency * t)` for the caller-supplied
/// engine time `t`. Evaluation is a pure function of `(self, t)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OscParam {
    /// Base value.
    pub value: f64,
    /// Whether the sinusoidal offset is applied.
    #[serde(default)]
    pub osc_enabled: bool,
    /// Peak offset from the base value.
    #[serde(default)]
    pub amplitude: f64,
    /// Oscillation frequency in Hz.
    #[serde(default)]
    pub frequency: f64,
}

impl OscParam {
    /// Creates a constant (unmodulated) parameter.
    pub fn constant(value: f64) -> Self {
        Self {
            value,
            osc_enabled: false,
            amplitude: 0.0,
            frequency: 0.0,
        }
    }

    /// Creates an oscillating parameter.
    pub fn oscillating(value: f64, amplitude: f64, frequency: f64) -> Self {
        Self {
            value,
            osc_enabled: true,
            amplitude,
            frequency,
        }
    }

    /// Evaluates the parameter at engine time `t` (seconds since start).
    ///
    /// Out-of-range values (e.g. negative frequency) are passed through
    /// uninterpreted.
    pub fn eval(&self, t: f64) -> f64 {
        if self.osc_enabled {
            self.value + self.amplitude * (TAU * self.frequency * t).sin()
        } else {
            self.value
        }
    }
}

/// A parameter with an optional per-use uniform jitter.
///
/// Each evaluation draws an independent sample; there is no memoization and
/// no shared state with [`OscParam`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RandParam {
    /// Base value.
    pub value: f64,
    /// Whether jitter is applied.
    #[serde(default)]
    pub rand_enabled: bool,
    /// Jitter half-width.
    #[serde(default)]
    pub dist: f64,
}

impl RandParam {
    /// Creates a constant (unjittered) parameter.
    pub fn constant(value: f64) -> Self {
        Self {
            value,
            rand_enabled: false,
            dist: 0.0,
        }
    }

    /// Creates a jittered parameter.
    pub fn jittered(value: f64, dist: f64) -> Self {
        Self {
            value,
            rand_enabled: true,
            dist,
        }
    }

    /// Evaluates with symmetric jitter: `value + U(-dist, +dist)`.
    ///
    /// This is the thunder-engine convention.
    pub fn eval(&self, rng: &mut Pcg32) -> f64 {
        if self.rand_enabled && self.dist > 0.0 {
            self.value + rng.gen_range(-self.dist..self.dist)
        } else {
            self.value
        }
    }

    /// Evaluates with one-sided jitter: `value + U(0, dist)`.
    ///
    /// This is the rain-engine convention.
    pub fn eval_positive(&self, rng: &mut Pcg32) -> f64 {
        if self.rand_enabled && self.dist > 0.0 {
            self.value + rng.gen_range(0.0..self.dist)
        } else {
            self.value
        }
    }
}

/// Rain texture parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RainParams {
    /// Drops per second.
    pub drop_rate: f64,
    /// One-sided jitter added to each inter-drop interval, in seconds.
    ///
    /// The rain dialect jitters in `[0, dist)` rather than symmetrically;
    /// see [`RandParam::eval_positive`].
    pub interval_jitter: RandParam,
    /// Grain decay time in seconds; capped at 0.2 s per drop.
    pub decay_time: f64,
    /// Lower bound of the bandpass center frequency window.
    pub min_pitch: OscParam,
    /// Upper bound of the bandpass center frequency window.
    pub max_pitch: OscParam,
    /// Bandpass Q for every drop.
    pub q: f64,
    /// Drops pan uniformly within `[-pan_range, +pan_range]`.
    pub pan_range: f64,
    /// Dry bus level per drop.
    pub dry_level: f64,
    /// Reverb send level per drop.
    pub wet_level: f64,
}

impl Default for RainParams {
    fn default() -> Self {
        Self {
            drop_rate: 40.0,
            interval_jitter: RandParam::jittered(0.0, 0.004),
            decay_time: 0.09,
            min_pitch: OscParam::oscillating(1400.0, 250.0, 0.05),
            max_pitch: OscParam::oscillating(3600.0, 400.0, 0.07),
            q: 12.0,
            pan_range: 0.8,
            dry_level: 0.5,
            wet_level: 0.3,
        }
    }
}

/// Thunder strike parameters. Every `RandParam` is re-evaluated
/// independently for each strike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ThunderParams {
    /// Minimum delay between strikes in seconds.
    pub delay_min: f64,
    /// Maximum delay between strikes in seconds.
    pub delay_max: f64,
    /// Overall strike volume.
    pub volume: RandParam,
    /// Burst body duration in seconds.
    pub duration: RandParam,
    /// Starting lowpass cutoff for the burst body sweep.
    pub filter_freq: RandParam,
    /// Bursts per strike; rounded, values below 1 yield zero bursts.
    pub burst_count: RandParam,
    /// Sub-bass layer level relative to strike volume.
    pub sub_level: RandParam,
    /// Bursts start at a random pan within this range and sweep to its
    /// mirror image.
    pub pan_range: RandParam,
    /// Fixed highpass cutoff on the burst body in Hz.
    pub high_pass_freq: RandParam,
    /// Reverb send level for the burst body.
    pub reverb_wet_level: RandParam,
    /// Crackle tail integrator amount.
    pub crackle_amount: RandParam,
    /// Rumble oscillator start frequency in Hz.
    pub rumble_freq_start: RandParam,
    /// Rumble oscillator end frequency in Hz.
    pub rumble_freq_end: RandParam,
    /// Rumble gain at onset.
    pub rumble_volume: RandParam,
    /// Rumble decay span in seconds.
    pub rumble_decay: RandParam,
}

impl Default for ThunderParams {
    fn default() -> Self {
        Self {
            delay_min: 5.0,
            delay_max: 16.0,
            volume: RandParam::jittered(0.8, 0.2),
            duration: RandParam::jittered(1.1, 0.4),
            filter_freq: RandParam::jittered(320.0, 120.0),
            burst_count: RandParam::jittered(3.0, 1.0),
            sub_level: RandParam::jittered(0.6, 0.2),
            pan_range: RandParam::jittered(0.6, 0.3),
            high_pass_freq: RandParam::jittered(45.0, 15.0),
            reverb_wet_level: RandParam::jittered(0.5, 0.2),
            crackle_amount: RandParam::jittered(0.6, 0.3),
            rumble_freq_start: RandParam::jittered(55.0, 15.0),
            rumble_freq_end: RandParam::jittered(28.0, 8.0),
            rumble_volume: RandParam::jittered(0.5, 0.15),
            rumble_decay: RandParam::jittered(2.6, 1.0),
        }
    }
}

/// Reverb kernel parameters.
///
/// Changing these rebuilds the impulse response as a fresh buffer; kernels
/// already referenced by in-flight sends are never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ReverbParams {
    /// Kernel length in seconds.
    pub duration_seconds: f64,
    /// Decay curve exponent; higher means faster decay.
    pub decay_exponent: f64,
    /// Wet return level on the master bus.
    pub return_level: f64,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self {
            duration_seconds: 2.2,
            decay_exponent: 2.0,
            return_level: 1.0,
        }
    }
}

/// One peaking-EQ band on the master bus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EqBand {
    /// Center frequency in Hz.
    pub frequency: f64,
    /// Band Q.
    pub q: f64,
    /// Boost/cut in dB.
    pub gain_db: f64,
}

/// Master bus EQ chain: a low-cut highpass followed by peaking bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct EqParams {
    /// Low-cut highpass frequency in Hz (0 disables it).
    pub low_cut: f64,
    /// Peaking bands applied in order.
    pub bands: Vec<EqBand>,
}

impl Default for EqParams {
    fn default() -> Self {
        Self {
            low_cut: 24.0,
            bands: vec![
                EqBand {
                    frequency: 90.0,
                    q: 0.8,
                    gain_db: 2.0,
                },
                EqBand {
                    frequency: 2800.0,
                    q: 0.9,
                    gain_db: 1.0,
                },
            ],
        }
    }
}

/// Complete parameter set for one storm render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct StormParams {
    /// Render length in seconds.
    pub duration_seconds: f64,
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Master gain applied after the EQ chain.
    pub master_gain: f64,
    /// Whether the rain generator runs.
    pub rain_enabled: bool,
    /// Rain texture parameters.
    pub rain: RainParams,
    /// Whether the thunder generator runs.
    pub thunder_enabled: bool,
    /// Thunder strike parameters.
    pub thunder: ThunderParams,
    /// Shared convolution reverb parameters.
    pub reverb: ReverbParams,
    /// Master EQ chain.
    pub eq: EqParams,
}

impl Default for StormParams {
    fn default() -> Self {
        Self {
            duration_seconds: 30.0,
            sample_rate: 44100,
            master_gain: 0.9,
            rain_enabled: true,
            rain: RainParams::default(),
            thunder_enabled: true,
            thunder: ThunderParams::default(),
            reverb: ReverbParams::default(),
            eq: EqParams::default(),
        }
    }
}

impl StormParams {
    /// Validates the parameter set at the render boundary.
    ///
    /// The generators themselves assume well-formed inputs; degenerate
    /// values (zero drop rate, negative durations) must be stopped here.
    pub fn validate(&self) -> EngineResult<()> {
        if self.sample_rate == 0 || self.sample_rate > 192_000 {
            return Err(EngineError::InvalidSampleRate {
                rate: self.sample_rate,
            });
        }
        if !self.duration_seconds.is_finite() || self.duration_seconds <= 0.0 {
            return Err(EngineError::InvalidDuration {
                duration: self.duration_seconds,
            });
        }
        if self.rain_enabled {
            if !self.rain.drop_rate.is_finite() || self.rain.drop_rate <= 0.0 {
                return Err(EngineError::invalid_param(
                    "rain.drop_rate",
                    format!("must be positive, got {}", self.rain.drop_rate),
                ));
            }
            if self.rain.decay_time <= 0.0 {
                return Err(EngineError::invalid_param(
                    "rain.decay_time",
                    format!("must be positive, got {}", self.rain.decay_time),
                ));
            }
        }
        if self.thunder_enabled {
            // delay_max must be strictly positive: a zero-width zero delay
            // would re-fire the scheduler without ever advancing time.
            if self.thunder.delay_min < 0.0
                || self.thunder.delay_max < self.thunder.delay_min
                || self.thunder.delay_max <= 0.0
            {
                return Err(EngineError::invalid_param(
                    "thunder.delay",
                    format!(
                        "require 0 <= delay_min <= delay_max and delay_max > 0, got [{}, {}]",
                        self.thunder.delay_min, self.thunder.delay_max
                    ),
                ));
            }
            if self.thunder.duration.value <= 0.0 {
                return Err(EngineError::invalid_param(
                    "thunder.duration",
                    "base duration must be positive",
                ));
            }
        }
        if self.reverb.duration_seconds <= 0.0 {
            return Err(EngineError::invalid_param(
                "reverb.duration_seconds",
                "must be positive",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::create_rng;

    #[test]
    fn disabled_osc_returns_value_for_any_t() {
        let p = OscParam::constant(440.0);
        for t in [0.0, 0.1, 1.0, 17.3, 1e6] {
            assert_eq!(p.eval(t), 440.0);
        }
    }

    #[test]
    fn enabled_osc_follows_sine() {
        let p = OscParam::oscillating(100.0, 10.0, 1.0);
        // Quarter period of a 1 Hz oscillation peaks the sine.
        assert!((p.eval(0.25) - 110.0).abs() < 1e-9);
        assert!((p.eval(0.75) - 90.0).abs() < 1e-9);
        assert!((p.eval(0.0) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn disabled_rand_is_deterministic() {
        let p = RandParam::constant(3.5);
        let mut rng = create_rng(1);
        for _ in 0..100 {
            assert_eq!(p.eval(&mut rng), 3.5);
            assert_eq!(p.eval_positive(&mut rng), 3.5);
        }
    }

    #[test]
    fn enabled_rand_stays_in_bounds_with_spread() {
        let p = RandParam::jittered(10.0, 2.0);
        let mut rng = create_rng(9);
        let samples: Vec<f64> = (0..10_000).map(|_| p.eval(&mut rng)).collect();

        let min = samples.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!(min >= 8.0 && max <= 12.0);
        // Non-degenerate spread.
        assert!(max - min > 1.0);
    }

    #[test]
    fn positive_rand_is_one_sided() {
        let p = RandParam::jittered(5.0, 1.0);
        let mut rng = create_rng(9);
        for _ in 0..10_000 {
            let v = p.eval_positive(&mut rng);
            assert!((5.0..6.0).contains(&v));
        }
    }

    #[test]
    fn default_params_validate() {
        StormParams::default().validate().unwrap();
    }

    #[test]
    fn zero_drop_rate_is_rejected() {
        let mut params = StormParams::default();
        params.rain.drop_rate = 0.0;
        assert!(params.validate().is_err());

        // Unless the rain generator is disabled entirely.
        params.rain_enabled = false;
        params.validate().unwrap();
    }

    #[test]
    fn inverted_thunder_delay_is_rejected() {
        let mut params = StormParams::default();
        params.thunder.delay_min = 10.0;
        params.thunder.delay_max = 2.0;
        assert!(params.validate().is_err());
    }

    #[test]
    fn zero_thunder_delay_window_is_rejected() {
        // A [0, 0] window would make the scheduler fire strikes forever
        // without consuming any time, so it must be stopped at the render
        // boundary.
        let mut params = StormParams::default();
        params.thunder.delay_min = 0.0;
        params.thunder.delay_max = 0.0;
        assert!(params.validate().is_err());

        // A window starting at zero with a positive upper bound is fine.
        params.thunder.delay_max = 2.0;
        params.validate().unwrap();

        // Disabling thunder makes the degenerate window irrelevant.
        params.thunder.delay_max = 0.0;
        params.thunder_enabled = false;
        params.validate().unwrap();
    }

    #[test]
    fn preset_roundtrips_through_json() {
        let params = StormParams::default();
        let json = serde_json::to_string(&params).unwrap();
        let back: StormParams = serde_json::from_str(&json).unwrap();
        assert_eq!(params, back);
    }

    #[test]
    fn unknown_preset_keys_are_rejected() {
        let err = serde_json::from_str::<StormParams>(r#"{"drop_frequency": 10}"#);
        assert!(err.is_err());
    }
}
