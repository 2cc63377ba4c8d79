//! Randomized thunder strikes.
//!
//! The scheduler is a state machine `Idle -> Scheduled(delay) -> Firing ->
//! Idle` that continuously re-arms while running. Firing evaluates every
//! jittered parameter independently for the strike, then emits one rumble
//! voice plus `round(burst_count)` burst voices at cumulatively jittered
//! offsets. Each burst pre-mixes its transient body, sub-bass layer and
//! crackle tail into one stereo voice with an 80 Hz highpassed reverb send.

use rand::Rng;
use rand_pcg::Pcg32;
use std::f64::consts::TAU;

use crate::filter::{sweep_lowpass, BiquadFilter};
use crate::generator::Generator;
use crate::params::ThunderParams;
use crate::voice::{SendTap, Voice, VoiceKind, VoicePlacement};

/// Exponential ramps cannot reach zero; this is the "silence" floor used by
/// every decay-to-nothing ramp.
const RAMP_FLOOR: f64 = 1e-4;

/// Highpass cutoff on the reverb send path.
const SEND_HIGHPASS_HZ: f64 = 80.0;

/// Scheduler state for the next strike.
#[derive(Debug, Clone, Copy, PartialEq)]
enum StrikeState {
    /// No strike armed.
    Idle,
    /// A strike will fire after this much more logical time.
    Scheduled {
        /// Remaining delay in seconds.
        remaining: f64,
    },
}

/// The thunder generator.
#[derive(Debug)]
pub struct ThunderSynth {
    params: ThunderParams,
    running: bool,
    /// Engine time since `start()`, in seconds.
    t: f64,
    state: StrikeState,
}

impl ThunderSynth {
    /// Creates a stopped thunder generator.
    pub fn new(params: ThunderParams) -> Self {
        Self {
            params,
            running: false,
            t: 0.0,
            state: StrikeState::Idle,
        }
    }

    /// Current parameters.
    pub fn params(&self) -> &ThunderParams {
        &self.params
    }

    /// Replaces the parameter set. An already-armed delay keeps running;
    /// the new values apply from the next evaluation on.
    pub fn set_params(&mut self, params: ThunderParams) {
        self.params = params;
    }

    fn sample_delay(&self, rng: &mut Pcg32) -> f64 {
        if self.params.delay_max > self.params.delay_min {
            rng.gen_range(self.params.delay_min..self.params.delay_max)
        } else {
            self.params.delay_min
        }
    }

    /// Evaluates all strike parameters and renders the strike's voices.
    ///
    /// Exactly one rumble is always emitted; `burst_count` below 1 yields
    /// zero bursts.
    fn fire_strike(&self, sample_rate: f64, rng: &mut Pcg32) -> Vec<Voice> {
        let p = &self.params;
        let volume = p.volume.eval(rng);
        let duration = p.duration.eval(rng);
        let filter_freq = p.filter_freq.eval(rng);
        let burst_count = p.burst_count.eval(rng).round();
        let sub_level = p.sub_level.eval(rng);
        let pan_range = p.pan_range.eval(rng);
        let high_pass_freq = p.high_pass_freq.eval(rng);
        let reverb_wet_level = p.reverb_wet_level.eval(rng);
        let crackle_amount = p.crackle_amount.eval(rng);
        let rumble_freq_start = p.rumble_freq_start.eval(rng);
        let rumble_freq_end = p.rumble_freq_end.eval(rng);
        let rumble_volume = p.rumble_volume.eval(rng);
        let rumble_decay = p.rumble_decay.eval(rng);

        let strike_start = (self.t * sample_rate).round() as usize;
        let mut voices = Vec::new();

        voices.push(render_rumble(
            strike_start,
            rumble_freq_start,
            rumble_freq_end,
            rumble_volume,
            rumble_decay,
            sample_rate,
        ));

        let num_bursts = if burst_count >= 1.0 {
            burst_count as usize
        } else {
            0
        };
        for index in 0..num_bursts {
            // Cumulative jitter: each burst draws its own inter-burst delay,
            // scaled by its index, so spacing drifts rather than repeats.
            let offset_seconds = index as f64 * rng.gen_range(0.2..0.6);
            let start = strike_start + (offset_seconds * sample_rate).round() as usize;

            let base_pan = if pan_range > 0.0 {
                rng.gen_range(-pan_range..pan_range)
            } else {
                0.0
            };

            voices.push(render_burst(
                start,
                BurstShape {
                    volume,
                    duration,
                    filter_freq,
                    high_pass_freq,
                    sub_level,
                    base_pan,
                    reverb_wet_level,
                    crackle_amount,
                },
                sample_rate,
                rng,
            ));
        }

        voices
    }
}

impl Generator for ThunderSynth {
    fn start(&mut self) {
        self.running = true;
        self.t = 0.0;
        self.state = StrikeState::Idle;
    }

    fn stop(&mut self) {
        // Cancels any armed-but-unfired strike; fired voices play out.
        self.running = false;
        self.state = StrikeState::Idle;
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

        loop {
            match self.state {
                StrikeState::Idle => {
                    self.state = StrikeState::Scheduled {
                        remaining: self.sample_delay(rng),
                    };
                }
                StrikeState::Scheduled { remaining: armed } => {
                    if armed > remaining {
                        self.state = StrikeState::Scheduled {
                            remaining: armed - remaining,
                        };
                        self.t += remaining;
                        break;
                    }
                    self.t += armed;
                    remaining -= armed;
                    voices.extend(self.fire_strike(sample_rate, rng));
                    // Steady state: immediately re-enter Scheduled with a
                    // fresh delay.
                    self.state = StrikeState::Idle;
                }
            }
        }

        voices
    }
}

/// Piecewise exponential envelope through `(time, value)` breakpoints,
/// matching exponential-ramp scheduling semantics.
#[derive(Debug)]
struct ExpSegments {
    points: Vec<(f64, f64)>,
}

impl ExpSegments {
    fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    fn value(&self, t: f64) -> f64 {
        let first = self.points[0];
        if t <= first.0 {
            return first.1;
        }
        for pair in self.points.windows(2) {
            let (t0, v0) = pair[0];
            let (t1, v1) = pair[1];
            if t < t1 {
                let frac = (t - t0) / (t1 - t0);
                let v0 = v0.max(RAMP_FLOOR);
                let v1 = v1.max(RAMP_FLOOR);
                return v0 * (v1 / v0).powf(frac);
            }
        }
        self.points.last().map_or(0.0, |&(_, v)| v)
    }
}

/// Renders the strike's rumble: a sine swept linearly from `freq_start` to
/// `freq_end` over `decay` seconds while its gain decays exponentially from
/// `volume` to the ramp floor.
fn render_rumble(
    start_sample: usize,
    freq_start: f64,
    freq_end: f64,
    volume: f64,
    decay: f64,
    sample_rate: f64,
) -> Voice {
    let num_samples = ((decay * sample_rate) as usize).max(1);
    let v0 = volume.max(RAMP_FLOOR);
    let mut samples = Vec::with_capacity(num_samples);
    let mut phase = 0.0f64;

    for i in 0..num_samples {
        let frac = i as f64 / num_samples as f64;
        let freq = freq_start + (freq_end - freq_start) * frac;
        phase += TAU * freq / sample_rate;
        let gain = v0 * (RAMP_FLOOR / v0).powf(frac);
        samples.push(phase.sin() * gain);
    }

    Voice {
        kind: VoiceKind::Rumble,
        start_sample,
        placement: VoicePlacement::Panned { samples, pan: 0.0 },
        dry_level: 1.0,
        send: None,
    }
}

/// Per-burst parameters, all already jitter-evaluated for the strike.
#[derive(Debug, Clone, Copy)]
struct BurstShape {
    volume: f64,
    duration: f64,
    filter_freq: f64,
    high_pass_freq: f64,
    sub_level: f64,
    base_pan: f64,
    reverb_wet_level: f64,
    crackle_amount: f64,
}

/// Renders one burst voice: transient body, sub-bass sweep and crackle tail
/// pre-mixed to stereo, with the enveloped body tapped through an 80 Hz
/// highpass as the reverb send.
fn render_burst(start_sample: usize, shape: BurstShape, sample_rate: f64, rng: &mut Pcg32) -> Voice {
    let duration = shape.duration.max(0.05);
    let body_len = ((3.0 * duration * sample_rate) as usize).max(1);
    let sweep_len = (duration * sample_rate) as usize;

    // Transient body: squared-uniform white noise sharpens the attack, with
    // a quarter-duration build-up into an exponential decay.
    let mut body = Vec::with_capacity(body_len);
    let attack_samples = (sample_rate * duration * 0.25).max(1.0);
    let decay_samples = (sample_rate * duration).max(1.0);
    for i in 0..body_len {
        let w: f64 = rng.gen_range(-1.0..1.0);
        let a: f64 = rng.gen_range(0.0..1.0);
        let build_up = (i as f64 / attack_samples).min(1.0);
        let decay = (-(i as f64) / decay_samples).exp();
        body.push(w * a * a * decay * build_up);
    }

    sweep_lowpass(&mut body, shape.filter_freq, 100.0, sweep_len, 0.707, sample_rate);
    BiquadFilter::highpass(shape.high_pass_freq, 0.707, sample_rate).process_buffer(&mut body);

    // Three chained exponential ramps: attack, sustain-decay, release.
    let env = ExpSegments::new(vec![
        (0.0, RAMP_FLOOR),
        (0.05, 0.8 * shape.volume),
        (0.9 * duration, 0.5 * shape.volume),
        (3.0 * duration, RAMP_FLOOR),
    ]);
    for (i, sample) in body.iter_mut().enumerate() {
        *sample *= env.value(i as f64 / sample_rate);
    }

    // Reverb send taps the enveloped body through a highpass.
    let mut send_samples = body.clone();
    BiquadFilter::highpass(SEND_HIGHPASS_HZ, 0.707, sample_rate).process_buffer(&mut send_samples);

    // Spatial roll: pan sweeps linearly from base_pan to its mirror across
    // the body duration, then holds.
    let pan_curve: Vec<f64> = (0..body_len)
        .map(|i| {
            let t = i as f64 / sample_rate;
            if t < duration {
                shape.base_pan * (1.0 - 2.0 * t / duration)
            } else {
                -shape.base_pan
            }
        })
        .collect();

    let sub = render_sub_layer(&shape, sample_rate);
    let crackle = render_crackle_tail(&shape, sample_rate, rng);

    // Pre-mix to stereo: body follows the pan curve, sub and crackle stay
    // centered at equal power.
    let total_len = body_len.max(sub.len()).max(crackle.len());
    let mut left = vec![0.0; total_len];
    let mut right = vec![0.0; total_len];
    let center = std::f64::consts::FRAC_PI_4.cos();

    for (i, &s) in body.iter().enumerate() {
        let pan_angle = (pan_curve[i].clamp(-1.0, 1.0) + 1.0) * std::f64::consts::FRAC_PI_4;
        left[i] += s * pan_angle.cos();
        right[i] += s * pan_angle.sin();
    }
    for (i, &s) in sub.iter().enumerate() {
        left[i] += s * center;
        right[i] += s * center;
    }
    for (i, &s) in crackle.iter().enumerate() {
        left[i] += s * center;
        right[i] += s * center;
    }

    Voice {
        kind: VoiceKind::Burst,
        start_sample,
        placement: VoicePlacement::Stereo { left, right },
        dry_level: 1.0,
        send: Some(SendTap {
            samples: send_samples,
            level: shape.reverb_wet_level,
        }),
    }
}

/// Independent sub-bass layer: a sine swept 25 Hz -> 15 Hz over 2.5x the
/// burst duration with an exponentially decaying gain.
fn render_sub_layer(shape: &BurstShape, sample_rate: f64) -> Vec<f64> {
    let len = ((2.5 * shape.duration * sample_rate) as usize).max(1);
    let g0 = (shape.sub_level * shape.volume * 0.6).max(RAMP_FLOOR);
    let mut samples = Vec::with_capacity(len);
    let mut phase = 0.0f64;

    for i in 0..len {
        let frac = i as f64 / len as f64;
        let freq = 25.0 + (15.0 - 25.0) * frac;
        phase += TAU * freq / sample_rate;
        let gain = g0 * (RAMP_FLOOR / g0).powf(frac);
        samples.push(phase.sin() * gain);
    }
    samples
}

/// Crackle tail: colored noise from a one-pole integrator, exponentially
/// decayed and band-limited to 30 Hz - 1.5 kHz. Always present per burst
/// (the continuous-tail variant of the crackle design).
fn render_crackle_tail(shape: &BurstShape, sample_rate: f64, rng: &mut Pcg32) -> Vec<f64> {
    let len = ((1.5 * shape.duration * sample_rate) as usize).max(1);
    let amount = shape.crackle_amount;
    let mut last_out = 0.0f64;
    let mut samples = Vec::with_capacity(len);

    for i in 0..len {
        let w: f64 = rng.gen_range(-1.0..1.0);
        last_out = (last_out + 0.02 * w * amount) / (1.02 + 0.05 * amount);
        let decay = (-3.0 * i as f64 / len as f64).exp();
        samples.push(last_out * shape.volume * 2.5 * decay);
    }

    BiquadFilter::highpass(30.0, 0.707, sample_rate).process_buffer(&mut samples);
    BiquadFilter::lowpass(1500.0, 0.707, sample_rate).process_buffer(&mut samples);
    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::RandParam;
    use crate::rng::create_rng;

    fn fixed_params() -> ThunderParams {
        ThunderParams {
            delay_min: 1.0,
            delay_max: 3.0,
            burst_count: RandParam::constant(3.0),
            ..ThunderParams::default()
        }
    }

    /// Drives the generator until at least one strike fires, returning the
    /// voices of the first advance call that produced any.
    fn first_strike(thunder: &mut ThunderSynth, rng: &mut Pcg32) -> Vec<Voice> {
        for _ in 0..100 {
            let voices = thunder.advance(0.25, 44100.0, rng);
            if !voices.is_empty() {
                return voices;
            }
        }
        panic!("no strike fired within 25 s");
    }

    #[test]
    fn strike_spawns_one_rumble_and_fixed_bursts() {
        let mut thunder = ThunderSynth::new(fixed_params());
        let mut rng = create_rng(42);
        thunder.start();

        for _ in 0..5 {
            let voices = first_strike(&mut thunder, &mut rng);
            let rumbles = voices.iter().filter(|v| v.kind == VoiceKind::Rumble).count();
            let bursts = voices.iter().filter(|v| v.kind == VoiceKind::Burst).count();
            assert_eq!(rumbles, 1);
            assert_eq!(bursts, 3);
        }
    }

    #[test]
    fn burst_count_below_one_keeps_the_rumble() {
        let mut params = fixed_params();
        params.burst_count = RandParam::constant(0.2);
        let mut thunder = ThunderSynth::new(params);
        let mut rng = create_rng(7);
        thunder.start();

        let voices = first_strike(&mut thunder, &mut rng);
        assert_eq!(voices.len(), 1);
        assert_eq!(voices[0].kind, VoiceKind::Rumble);
    }

    #[test]
    fn scheduler_rearms_continuously() {
        let mut thunder = ThunderSynth::new(fixed_params());
        let mut rng = create_rng(11);
        thunder.start();

        // 60 s at delays in [1, 3) must fire many strikes.
        let mut strikes = 0;
        for _ in 0..240 {
            let voices = thunder.advance(0.25, 44100.0, &mut rng);
            strikes += voices.iter().filter(|v| v.kind == VoiceKind::Rumble).count();
        }
        assert!((20..=60).contains(&strikes), "got {strikes} strikes");
    }

    #[test]
    fn stop_cancels_the_armed_strike() {
        let mut thunder = ThunderSynth::new(fixed_params());
        let mut rng = create_rng(3);
        thunder.start();
        thunder.advance(0.5, 44100.0, &mut rng);
        assert!(matches!(thunder.state, StrikeState::Scheduled { .. }));

        thunder.stop();
        assert_eq!(thunder.state, StrikeState::Idle);
        assert!(thunder.advance(100.0, 44100.0, &mut rng).is_empty());

        // Double stop leaves identical state.
        thunder.stop();
        assert_eq!(thunder.state, StrikeState::Idle);
        assert!(!thunder.is_running());
    }

    #[test]
    fn burst_offsets_accumulate_with_index() {
        let mut thunder = ThunderSynth::new(fixed_params());
        let mut rng = create_rng(21);
        thunder.start();

        let voices = first_strike(&mut thunder, &mut rng);
        let rumble_start = voices
            .iter()
            .find(|v| v.kind == VoiceKind::Rumble)
            .unwrap()
            .start_sample;
        let mut burst_starts: Vec<usize> = voices
            .iter()
            .filter(|v| v.kind == VoiceKind::Burst)
            .map(|v| v.start_sample)
            .collect();
        burst_starts.sort_unstable();

        // First burst is sample-aligned with the strike; later bursts land
        // at index-scaled jittered offsets within [200, 600) ms each.
        assert_eq!(burst_starts[0], rumble_start);
        for (index, &start) in burst_starts.iter().enumerate() {
            let offset = (start - rumble_start) as f64 / 44100.0;
            let lo = index as f64 * 0.2;
            let hi = index as f64 * 0.6;
            assert!(offset >= lo - 1e-9 && offset <= hi + 1e-9, "burst {index} at {offset}");
        }
    }

    #[test]
    fn rumble_sweeps_down_and_decays() {
        let voice = render_rumble(0, 60.0, 30.0, 0.5, 1.0, 44100.0);
        let samples = match &voice.placement {
            VoicePlacement::Panned { samples, .. } => samples,
            other => panic!("unexpected placement {other:?}"),
        };

        assert_eq!(samples.len(), 44100);
        let head_peak = samples[..4410].iter().fold(0.0f64, |a, s| a.max(s.abs()));
        let tail_peak = samples[39690..].iter().fold(0.0f64, |a, s| a.max(s.abs()));
        assert!(head_peak > 0.2);
        assert!(tail_peak < 0.01);
    }

    #[test]
    fn burst_has_send_and_stereo_roll() {
        let mut rng = create_rng(17);
        let voice = render_burst(
            0,
            BurstShape {
                volume: 0.8,
                duration: 0.5,
                filter_freq: 400.0,
                high_pass_freq: 40.0,
                sub_level: 0.5,
                base_pan: 0.7,
                reverb_wet_level: 0.4,
                crackle_amount: 0.6,
            },
            44100.0,
            &mut rng,
        );

        assert_eq!(voice.kind, VoiceKind::Burst);
        let send = voice.send.as_ref().unwrap();
        assert!((send.level - 0.4).abs() < 1e-12);
        assert!(!send.samples.is_empty());

        match &voice.placement {
            VoicePlacement::Stereo { left, right } => {
                assert_eq!(left.len(), right.len());
                assert_ne!(left, right);
            }
            other => panic!("unexpected placement {other:?}"),
        }
    }

    #[test]
    fn exp_segments_interpolate_monotonically() {
        let env = ExpSegments::new(vec![(0.0, RAMP_FLOOR), (0.05, 0.8), (1.0, 0.5), (3.0, RAMP_FLOOR)]);
        assert!(env.value(0.0) <= RAMP_FLOOR);
        assert!((env.value(0.05) - 0.8).abs() < 1e-9);
        assert!(env.value(0.5) < 0.8 && env.value(0.5) > 0.5);
        assert!((env.value(1.0) - 0.5).abs() < 1e-9);
        assert!(env.value(2.9) < 0.01);
    }
}
