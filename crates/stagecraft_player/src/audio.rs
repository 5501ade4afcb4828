// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sound cue hooks.
//!
//! Thread bodies never play audio themselves. They queue a [`SoundCue`] inside
//! a one-shot step and the host drains the queue into an [`EffectSink`] after
//! each frame. The default sink only logs; a real host would hand the cue to
//! its audio device.

use serde::{Deserialize, Serialize};

/// Sounds the choreography can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    /// Short percussive hit
    Kick,
    /// Soft swell
    Soft,
}

impl SoundCue {
    /// Asset the cue would load in a full host
    pub fn asset_path(&self) -> &'static str {
        match self {
            Self::Kick => "assets/sounds/kick.wav",
            Self::Soft => "assets/sounds/plant-bomb.wav",
        }
    }
}

/// Receiver for externally observable effects
pub trait EffectSink {
    /// Play a sound cue at virtual time `now`
    fn play(&mut self, cue: SoundCue, now: f64);
}

/// Sink that logs each cue
#[derive(Debug, Default)]
pub struct LogSink {
    /// Cues played so far
    pub played: usize,
}

impl EffectSink for LogSink {
    fn play(&mut self, cue: SoundCue, now: f64) {
        self.played += 1;
        tracing::info!(?cue, asset = cue.asset_path(), now, "Sound cue");
    }
}

/// Sink that records cues for inspection
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    /// Cues with the time they were played
    pub cues: Vec<(SoundCue, f64)>,
}

impl RecordingSink {
    /// Number of times a cue was played
    pub fn count(&self, cue: SoundCue) -> usize {
        self.cues.iter().filter(|(c, _)| *c == cue).count()
    }
}

impl EffectSink for RecordingSink {
    fn play(&mut self, cue: SoundCue, now: f64) {
        self.cues.push((cue, now));
    }
}
