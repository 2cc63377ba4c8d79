//! Squall synthesis engine
//!
//! Procedurally synthesizes ambient weather audio: a continuous granular
//! rain texture and randomized thunder strikes, mixed through a fixed
//! dry/wet signal graph with a shared convolution reverb, rendered offline
//! to 16-bit PCM WAV.
//!
//! # Determinism
//!
//! All synthesis is deterministic. Given the same parameters and seed, the
//! output is byte-identical across runs (on the same platform). The crate
//! uses PCG32 for all random number generation, with independent component
//! streams derived via BLAKE3 hashing.
//!
//! # Example
//!
//! ```no_run
//! use squall_engine::{render, StormParams};
//!
//! let mut params = StormParams::default();
//! params.duration_seconds = 10.0;
//!
//! let result = render(&params, 42)?;
//! std::fs::write("storm.wav", &result.wav.wav_data)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Crate structure
//!
//! - [`render()`] - offline rendering entry point
//! - [`params`] - typed, serde-backed parameter model ([`OscParam`],
//!   [`RandParam`], per-generator structs)
//! - [`rain`] / [`thunder`] - the two generators behind the [`Generator`]
//!   trait
//! - [`noise`] - white/pink noise, grain and impulse-response kernels
//! - [`filter`] - biquad filters and cutoff sweeps
//! - [`graph`] / [`voice`] - mixing buses and the explicit voice pool
//! - [`reverb`] - FFT convolution of the send bus with the shared kernel
//! - [`wav`] - bit-exact WAV encoding

pub mod error;
pub mod filter;
pub mod generator;
pub mod graph;
pub mod noise;
pub mod params;
pub mod rain;
pub mod render;
pub mod reverb;
pub mod rng;
pub mod thunder;
pub mod voice;
pub mod wav;

pub use error::{EngineError, EngineResult};
pub use generator::Generator;
pub use params::{OscParam, RainParams, RandParam, StormParams, ThunderParams};
pub use rain::RainSynth;
pub use render::{render, render_stereo, RenderResult, RenderStats};
pub use thunder::ThunderSynth;
pub use wav::WavResult;
