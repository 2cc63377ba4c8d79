//! The unified generator interface.
//!
//! Both generators are driven by elapsed *logical* time, never by wall-clock
//! timer granularity: a real-time host calls [`Generator::advance`] with
//! measured frame deltas, the offline renderer calls it in lockstep with the
//! rendered sample count, and both produce the same event cadence for the
//! same RNG stream.

use rand_pcg::Pcg32;

use crate::voice::Voice;

/// A procedural sound generator scheduled against a logical clock.
pub trait Generator {
    /// Starts the generator, resetting its engine time to zero and arming
    /// its scheduler.
    fn start(&mut self);

    /// Stops the generator, cancelling any armed-but-unfired trigger.
    ///
    /// Already-fired voices are unaffected; they play out naturally.
    /// Calling stop twice, or before start, is a no-op.
    fn stop(&mut self);

    /// Whether the generator is currently running.
    fn is_running(&self) -> bool;

    /// Advances the logical clock by `dt` seconds and returns the voices
    /// triggered within that window, with absolute sample offsets.
    ///
    /// Returns an empty vec while stopped.
    fn advance(&mut self, dt: f64, sample_rate: f64, rng: &mut Pcg32) -> Vec<Voice>;
}
