// SPDX-License-Identifier: MIT OR Apache-2.0
//! Headless player application.
//!
//! Owns the stage, the scene and the play mode, routes queued sound cues to an
//! [`EffectSink`] and drives the whole thing from a fixed host frame rate.

use crate::audio::{EffectSink, LogSink};
use crate::choreography;
use crate::config::PlayerConfig;
use crate::error::Result;
use crate::hot_reload::{self, PersistedState};
use crate::play_mode::PlayModeManager;
use crate::scene::Scene;
use stagecraft_sequencer::{Sequencer, Stage};

/// Totals reported after a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    /// Host frames processed
    pub frames: u64,
    /// Fixed scheduler steps run
    pub steps: u64,
    /// Times the choreography finished
    pub completed_loops: u32,
    /// Simulated code reloads
    pub reloads: u32,
}

/// The player
pub struct PlayerApp<K: EffectSink = LogSink> {
    config: PlayerConfig,
    stage: Stage<Scene>,
    scene: Scene,
    play_mode: PlayModeManager,
    sink: K,
}

impl<K: EffectSink> PlayerApp<K> {
    /// Create a player with the choreography installed, ready to play
    pub fn new(config: PlayerConfig, sink: K) -> Self {
        let (stage, scene) = Self::fresh_state(&config);
        let mut play_mode = PlayModeManager::new();
        play_mode.set_time_scale(config.time_scale);

        Self {
            config,
            stage,
            scene,
            play_mode,
            sink,
        }
    }

    fn fresh_state(config: &PlayerConfig) -> (Stage<Scene>, Scene) {
        let mut stage = Stage::new();
        let mut scene = Scene::new();
        scene.fit_camera(config.screen_size);
        choreography::install(&mut stage, &mut scene);
        (stage, scene)
    }

    /// Consume one host frame; returns the fixed steps run
    pub fn update(&mut self, delta_time: f64) -> u32 {
        let dt = self.config.fixed_timestep();
        let steps = self.play_mode.update(delta_time, dt);
        for _ in 0..steps {
            self.step(dt);
        }
        steps
    }

    /// Advance one fixed step while paused
    pub fn step_frame(&mut self) -> bool {
        let dt = self.config.fixed_timestep();
        if self.play_mode.step_frame(dt) {
            self.step(dt);
            true
        } else {
            false
        }
    }

    fn step(&mut self, dt: f64) {
        self.stage.update(dt, &mut self.scene);
        let now = self.stage.now();
        for cue in self.scene.drain_cues() {
            self.sink.play(cue, now);
        }
    }

    /// Rewind the clock, the scene and every thread to the start
    pub fn restart(&mut self) {
        self.stage.restart();
        self.scene.reset();
        self.scene.fit_camera(self.config.screen_size);
        tracing::info!("Restarted choreography");
    }

    /// Whether the choreography has played through
    pub fn finished(&self) -> bool {
        self.scene.finished
    }

    /// Encode everything that must survive a code reload
    pub fn pre_reload(&self) -> Result<Vec<u8>> {
        hot_reload::encode(&self.scene, self.stage.sequencer())
    }

    /// Rebuild the stage from a reload blob and reattach the thread bodies.
    ///
    /// An unusable blob is not fatal: the player starts over from a fresh
    /// state.
    pub fn post_reload(&mut self, blob: &[u8]) {
        match hot_reload::decode(blob, self.config.screen_size).and_then(Self::rebuild) {
            Ok((stage, scene)) => {
                tracing::info!(now = stage.now(), "Restored player state");
                self.stage = stage;
                self.scene = scene;
            }
            Err(e) => {
                tracing::warn!("Discarding player state, starting fresh: {e}");
                let (stage, scene) = Self::fresh_state(&self.config);
                self.stage = stage;
                self.scene = scene;
            }
        }
    }

    fn rebuild(state: PersistedState) -> Result<(Stage<Scene>, Scene)> {
        let sequencer = Sequencer::restore(state.sequencer)?;
        let mut stage = Stage::with_sequencer(sequencer);
        let mut scene = state.scene;
        choreography::install(&mut stage, &mut scene);
        Ok((stage, scene))
    }

    /// Round-trip the state through [`Self::pre_reload`] and [`Self::post_reload`]
    pub fn reload(&mut self) -> Result<()> {
        let blob = self.pre_reload()?;
        tracing::info!(bytes = blob.len(), "Simulating code reload");
        self.post_reload(&blob);
        Ok(())
    }

    /// Play at the configured frame rate until done or out of frames
    pub fn run(&mut self) -> Result<RunSummary> {
        let delta = self.config.fixed_timestep();
        let mut summary = RunSummary::default();
        let mut loop_counted = false;

        self.play_mode.play();
        while summary.frames < self.config.max_frames {
            if self.config.reload_at_frame == Some(summary.frames) {
                self.reload()?;
                summary.reloads += 1;
            }

            summary.steps += u64::from(self.update(delta));
            summary.frames += 1;

            if self.finished() && !loop_counted {
                loop_counted = true;
                summary.completed_loops += 1;
                if summary.completed_loops < self.config.loop_count {
                    self.restart();
                    loop_counted = false;
                } else if self.config.stop_when_finished {
                    break;
                }
            }
        }
        self.play_mode.stop();

        tracing::info!(
            frames = summary.frames,
            steps = summary.steps,
            loops = summary.completed_loops,
            "Run complete"
        );
        Ok(summary)
    }

    /// Current scene
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Current stage
    pub fn stage(&self) -> &Stage<Scene> {
        &self.stage
    }

    /// Play mode
    pub fn play_mode_mut(&mut self) -> &mut PlayModeManager {
        &mut self.play_mode
    }

    /// Effect sink
    pub fn sink(&self) -> &K {
        &self.sink
    }
}
