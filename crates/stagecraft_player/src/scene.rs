// SPDX-License-Identifier: MIT OR Apache-2.0
//! Host-side scene state driven by the choreography.

use crate::audio::SoundCue;
use serde::{Deserialize, Serialize};
use stagecraft_sequencer::ThreadId;

/// RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Color(pub [u8; 4]);

impl Color {
    /// Build from `0xRRGGBBAA`
    pub const fn from_hex(hex: u32) -> Self {
        Self(hex.to_be_bytes())
    }
}

/// Palette
pub mod palette {
    use super::Color;

    /// Background
    pub const BACKGROUND: Color = Color::from_hex(0x181818FF);
    /// First actor
    pub const RED: Color = Color::from_hex(0xF43841FF);
    /// Second actor
    pub const GREEN: Color = Color::from_hex(0x73C936FF);
}

/// A rounded square actor
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Thing {
    /// Center position
    pub position: [f32; 2],
    /// Edge length
    pub size: f32,
    /// Corner roundness, 0 = square, 1 = circle
    pub roundness: f32,
    /// Fill color
    pub color: Color,
    /// Multiplier applied to this actor's transition times
    pub slowness: f32,
}

impl Thing {
    /// Create a zero-sized actor
    pub fn new(position: [f32; 2], roundness: f32, color: Color, slowness: f32) -> Self {
        Self {
            position,
            size: 0.0,
            roundness,
            color,
            slowness,
        }
    }

    /// Axis-aligned bounds as `[x, y, width, height]`
    pub fn bounds(&self) -> [f32; 4] {
        [
            self.position[0] - self.size / 2.0,
            self.position[1] - self.size / 2.0,
            self.size,
            self.size,
        ]
    }
}

/// 2D camera
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Screen-space offset of the world origin
    pub offset: [f32; 2],
    /// Rotation in degrees
    pub rotation: f32,
    /// Zoom factor
    pub zoom: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: [0.0, 0.0],
            rotation: 0.0,
            zoom: 1.0,
        }
    }
}

/// Thread IDs the bodies need to name each other at barriers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cast {
    /// First actor's thread
    pub thing1: ThreadId,
    /// Second actor's thread
    pub thing2: ThreadId,
    /// Sound thread
    pub sound: ThreadId,
}

impl Cast {
    /// Every thread
    pub fn all(&self) -> [ThreadId; 3] {
        [self.thing1, self.thing2, self.sound]
    }
}

/// Everything the thread bodies read and write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// First actor
    pub thing1: Thing,
    /// Second actor
    pub thing2: Thing,
    /// Camera, added in state schema 2
    #[serde(default)]
    pub camera: Camera,
    /// Set once the choreography has played through
    pub finished: bool,
    /// Thread IDs, rebuilt whenever bodies are installed
    #[serde(skip)]
    pub cast: Option<Cast>,
    /// Cues queued this frame
    #[serde(skip)]
    pending_cues: Vec<SoundCue>,
}

impl Scene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self {
            thing1: Thing::default(),
            thing2: Thing::default(),
            camera: Camera::default(),
            finished: false,
            cast: None,
            pending_cues: Vec::new(),
        }
    }

    /// Queue a sound cue for the host
    pub fn cue(&mut self, cue: SoundCue) {
        self.pending_cues.push(cue);
    }

    /// Take the cues queued since the last drain
    pub fn drain_cues(&mut self) -> Vec<SoundCue> {
        std::mem::take(&mut self.pending_cues)
    }

    /// Put actors and flags back to their initial state, keeping the cast
    pub fn reset(&mut self) {
        let cast = self.cast;
        *self = Self::new();
        self.cast = cast;
    }

    /// Center the camera on a screen of the given size
    pub fn fit_camera(&mut self, screen: [f32; 2]) {
        self.camera.offset = [screen[0] / 2.0, screen[1] / 2.0];
        self.camera.zoom = 1.0;
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
