//! Offline rendering: drives the generators against a virtual sample clock
//! and serializes the mixed result to PCM.
//!
//! The renderer advances both generators in block-sized steps of logical
//! time, so the event cadence is identical to what a real-time host driving
//! [`Generator::advance`] with wall-clock deltas would produce for the same
//! seed. Nothing here consults a wall clock.

use crate::error::EngineResult;
use crate::generator::Generator;
use crate::graph::{MonoBus, StereoBus};
use crate::noise::ImpulseResponse;
use crate::params::StormParams;
use crate::rain::RainSynth;
use crate::reverb::render_wet_return;
use crate::rng::create_component_rng;
use crate::thunder::ThunderSynth;
use crate::voice::{VoiceKind, VoicePool};
use crate::wav::WavResult;

/// Virtual clock step, in frames.
const BLOCK_FRAMES: usize = 4096;

/// Scheduling statistics from one render.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderStats {
    /// Raindrop voices spawned.
    pub drops: usize,
    /// Rumble voices spawned (one per strike).
    pub strikes: usize,
    /// Burst voices spawned.
    pub bursts: usize,
}

/// A completed offline render.
#[derive(Debug)]
pub struct RenderResult {
    /// Encoded WAV output.
    pub wav: WavResult,
    /// Scheduling statistics.
    pub stats: RenderStats,
}

/// Renders a storm to a stereo buffer.
///
/// Deterministic: the same `params` and `seed` always produce identical
/// samples. The output is exactly `duration_seconds * sample_rate` frames;
/// reverb tail beyond that is truncated.
pub fn render_stereo(params: &StormParams, seed: u32) -> EngineResult<(StereoBus, RenderStats)> {
    params.validate()?;

    let sample_rate = params.sample_rate as f64;
    let total_frames = (params.duration_seconds * sample_rate).round() as usize;

    let mut rain_rng = create_component_rng(seed, "rain");
    let mut thunder_rng = create_component_rng(seed, "thunder");
    let mut reverb_rng = create_component_rng(seed, "reverb");

    let ir = ImpulseResponse::new(
        &mut reverb_rng,
        2,
        params.reverb.duration_seconds,
        params.reverb.decay_exponent,
        sample_rate,
    );

    let mut dry = StereoBus::new(total_frames);
    let mut send = MonoBus::new(total_frames);
    let mut pool = VoicePool::new();

    let mut rain = RainSynth::new(params.rain.clone());
    let mut thunder = ThunderSynth::new(params.thunder.clone());
    if params.rain_enabled {
        rain.start();
    }
    if params.thunder_enabled {
        thunder.start();
    }

    let mut frame = 0usize;
    while frame < total_frames {
        let block = BLOCK_FRAMES.min(total_frames - frame);
        let dt = block as f64 / sample_rate;

        for voice in rain.advance(dt, sample_rate, &mut rain_rng) {
            pool.spawn(voice, &mut dry, &mut send);
        }
        for voice in thunder.advance(dt, sample_rate, &mut thunder_rng) {
            pool.spawn(voice, &mut dry, &mut send);
        }

        frame += block;
        pool.reap(frame);
    }

    rain.stop();
    thunder.stop();

    let stats = RenderStats {
        drops: pool.total_spawned(VoiceKind::Drop),
        strikes: pool.total_spawned(VoiceKind::Rumble),
        bursts: pool.total_spawned(VoiceKind::Burst),
    };

    let wet = render_wet_return(&send, &ir, total_frames);
    let mut master = dry;
    master.add_bus(&wet, params.reverb.return_level);
    master.apply_eq(&params.eq, sample_rate);
    master.apply_gain(params.master_gain);

    Ok((master, stats))
}

/// Renders a storm and encodes it to WAV.
pub fn render(params: &StormParams, seed: u32) -> EngineResult<RenderResult> {
    let (master, stats) = render_stereo(params, seed)?;
    let wav = WavResult::from_stereo(&master.left, &master.right, params.sample_rate);
    Ok(RenderResult { wav, stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    fn short_params() -> StormParams {
        StormParams {
            duration_seconds: 2.0,
            sample_rate: 22050,
            ..StormParams::default()
        }
    }

    #[test]
    fn render_is_deterministic_per_seed() {
        let params = short_params();

        let a = render(&params, 42).unwrap();
        let b = render(&params, 42).unwrap();
        assert_eq!(a.wav.pcm_hash, b.wav.pcm_hash);
        assert_eq!(a.wav.wav_data, b.wav.wav_data);

        let c = render(&params, 43).unwrap();
        assert_ne!(a.wav.pcm_hash, c.wav.pcm_hash);
    }

    #[test]
    fn output_length_is_exact() {
        let (master, _) = render_stereo(&short_params(), 1).unwrap();
        assert_eq!(master.len(), 2 * 22050);
    }

    #[test]
    fn rain_only_render_spawns_expected_drops() {
        let mut params = short_params();
        params.thunder_enabled = false;
        params.rain.interval_jitter = crate::params::RandParam::constant(0.0);
        params.rain.drop_rate = 30.0;

        let (master, stats) = render_stereo(&params, 7).unwrap();
        // floor(2 s * 30/s) = 60, within ±1.
        assert!((59..=61).contains(&stats.drops), "got {}", stats.drops);
        assert_eq!(stats.strikes, 0);
        assert_eq!(stats.bursts, 0);
        assert!(master.peak() > 0.0);
    }

    #[test]
    fn disabled_generators_yield_silence() {
        let mut params = short_params();
        params.rain_enabled = false;
        params.thunder_enabled = false;

        let (master, stats) = render_stereo(&params, 7).unwrap();
        assert_eq!(stats.drops + stats.strikes + stats.bursts, 0);
        assert_eq!(master.peak(), 0.0);
    }

    #[test]
    fn zero_delay_window_is_stopped_at_the_boundary() {
        let mut params = short_params();
        params.thunder.delay_min = 0.0;
        params.thunder.delay_max = 0.0;
        match render(&params, 1) {
            Err(EngineError::InvalidParameter { name, .. }) => {
                assert_eq!(name, "thunder.delay");
            }
            other => panic!("expected InvalidParameter, got {other:?}"),
        }
    }

    #[test]
    fn invalid_params_are_rejected() {
        let mut params = short_params();
        params.rain.drop_rate = -5.0;
        match render(&params, 1) {
            Err(EngineError::InvalidParameter { name, .. }) => {
                assert_eq!(name, "rain.drop_rate");
            }
            other => panic!("expected InvalidParameter, got {other:?}"),
        }
    }
}
