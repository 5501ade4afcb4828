// SPDX-License-Identifier: MIT OR Apache-2.0
//! Headless reference host for the Stagecraft sequencer.
//!
//! Plays a small two-actor choreography against a fixed frame clock:
//! - Play mode with time scale and fixed steps
//! - Sound cues routed to an effect sink
//! - Hot reload of scene and thread state through a versioned blob
//! - RON configuration

pub mod app;
pub mod audio;
pub mod choreography;
pub mod config;
pub mod error;
pub mod hot_reload;
pub mod play_mode;
pub mod scene;

pub use app::{PlayerApp, RunSummary};
pub use audio::{EffectSink, LogSink, RecordingSink, SoundCue};
pub use config::PlayerConfig;
pub use error::{PlayerError, Result};
pub use scene::{Cast, Scene, Thing};
