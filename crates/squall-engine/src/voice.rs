//! Ephemeral voices and the voice pool.
//!
//! A voice is the fully rendered audio of one sounding event (a raindrop, a
//! thunder burst, a rumble) plus its placement on the buses. Generators
//! build voices and hand them to the pool; the pool mixes them in
//! immediately and tracks liveness so finished voices can be reaped against
//! the engine clock. Nothing here relies on implicit reclamation: a voice's
//! record is removed by an explicit reaper pass once its end sample has
//! passed.

use crate::graph::{MonoBus, StereoBus};

/// What kind of sounding event a voice represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoiceKind {
    /// One granular raindrop.
    Drop,
    /// One thunder rumble (one per strike).
    Rumble,
    /// One thunder burst (body + sub + crackle, pre-mixed to stereo).
    Burst,
}

/// How a voice's samples land on the dry bus.
#[derive(Debug, Clone)]
pub enum VoicePlacement {
    /// Mono samples at a fixed pan position.
    Panned {
        /// Rendered samples.
        samples: Vec<f64>,
        /// Pan position in [-1, 1].
        pan: f64,
    },
    /// Pre-mixed stereo samples.
    Stereo {
        /// Left channel.
        left: Vec<f64>,
        /// Right channel.
        right: Vec<f64>,
    },
}

impl VoicePlacement {
    /// Length in frames.
    pub fn len(&self) -> usize {
        match self {
            VoicePlacement::Panned { samples, .. } => samples.len(),
            VoicePlacement::Stereo { left, .. } => left.len(),
        }
    }

    /// Returns true if the voice has no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A pre-filtered reverb-send signal for one voice.
#[derive(Debug, Clone)]
pub struct SendTap {
    /// Mono send samples (already filtered for the send path).
    pub samples: Vec<f64>,
    /// Send level into the wet bus.
    pub level: f64,
}

/// One rendered sounding event.
#[derive(Debug, Clone)]
pub struct Voice {
    /// Event kind.
    pub kind: VoiceKind,
    /// Placement offset on the buses, in samples.
    pub start_sample: usize,
    /// Dry-bus placement.
    pub placement: VoicePlacement,
    /// Dry bus level.
    pub dry_level: f64,
    /// Optional reverb send.
    pub send: Option<SendTap>,
}

impl Voice {
    /// Length of the dry signal in frames.
    pub fn len(&self) -> usize {
        self.placement.len()
    }

    /// Returns true if the voice has no samples.
    pub fn is_empty(&self) -> bool {
        self.placement.is_empty()
    }

    /// First sample index after the voice (including the send tail).
    pub fn end_sample(&self) -> usize {
        let send_len = self.send.as_ref().map_or(0, |s| s.samples.len());
        self.start_sample + self.len().max(send_len)
    }
}

/// Liveness record for one spawned voice.
#[derive(Debug, Clone, Copy)]
struct LiveVoice {
    kind: VoiceKind,
    end_sample: usize,
}

/// Explicit arena for in-flight voices.
///
/// `spawn` mixes a voice onto the buses and registers it in the live set;
/// `reap` drops records whose audio has finished relative to the engine
/// clock. Spawn counters survive reaping so schedulers can be audited.
#[derive(Debug, Default)]
pub struct VoicePool {
    live: Vec<LiveVoice>,
    spawned_drops: usize,
    spawned_rumbles: usize,
    spawned_bursts: usize,
}

impl VoicePool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mixes a voice onto the buses and registers it as live.
    pub fn spawn(&mut self, voice: Voice, dry: &mut StereoBus, wet: &mut MonoBus) {
        match &voice.placement {
            VoicePlacement::Panned { samples, pan } => {
                dry.add_panned(samples, voice.start_sample, voice.dry_level, *pan);
            }
            VoicePlacement::Stereo { left, right } => {
                dry.add_stereo(left, right, voice.start_sample, voice.dry_level);
            }
        }
        if let Some(send) = &voice.send {
            wet.add(&send.samples, voice.start_sample, send.level);
        }

        match voice.kind {
            VoiceKind::Drop => self.spawned_drops += 1,
            VoiceKind::Rumble => self.spawned_rumbles += 1,
            VoiceKind::Burst => self.spawned_bursts += 1,
        }
        self.live.push(LiveVoice {
            kind: voice.kind,
            end_sample: voice.end_sample(),
        });
    }

    /// Removes voices that finished before `now_sample`. Returns how many
    /// were reaped.
    pub fn reap(&mut self, now_sample: usize) -> usize {
        let before = self.live.len();
        self.live.retain(|v| v.end_sample > now_sample);
        before - self.live.len()
    }

    /// Voices still sounding.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Live voices of one kind.
    pub fn live_count_of(&self, kind: VoiceKind) -> usize {
        self.live.iter().filter(|v| v.kind == kind).count()
    }

    /// Total voices of one kind ever spawned.
    pub fn total_spawned(&self, kind: VoiceKind) -> usize {
        match kind {
            VoiceKind::Drop => self.spawned_drops,
            VoiceKind::Rumble => self.spawned_rumbles,
            VoiceKind::Burst => self.spawned_bursts,
        }
    }
}
