// SPDX-License-Identifier: MIT OR Apache-2.0
//! Play mode for the player loop.
//!
//! Turns host frame deltas into fixed scheduler steps and tracks whether the
//! choreography is running, paused or stopped.

/// Play mode state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
    /// Not running; the next play starts from zero
    #[default]
    Stopped,
    /// Running
    Playing,
    /// Suspended; frames may still be stepped by hand
    Paused,
}

impl PlayState {
    /// Check if we're in any play mode (playing or paused)
    pub fn is_active(&self) -> bool {
        matches!(self, PlayState::Playing | PlayState::Paused)
    }

    /// Check if currently playing (not paused)
    pub fn is_playing(&self) -> bool {
        matches!(self, PlayState::Playing)
    }
}

/// Most fixed steps run for one host frame
const MAX_STEPS_PER_FRAME: u32 = 8;

/// Play mode manager
#[derive(Debug)]
pub struct PlayModeManager {
    /// Current play state
    pub state: PlayState,
    /// Time scale for simulation (1.0 = normal speed)
    pub time_scale: f32,
    /// Scaled time not yet consumed by a fixed step
    accumulated_time: f64,
    /// Fixed steps run since play started
    pub frame_count: u64,
    /// Scaled time since play started
    pub elapsed_time: f64,
}

impl PlayModeManager {
    /// Create a stopped manager at normal speed
    pub fn new() -> Self {
        Self {
            state: PlayState::Stopped,
            time_scale: 1.0,
            accumulated_time: 0.0,
            frame_count: 0,
            elapsed_time: 0.0,
        }
    }

    /// Start or resume playing.
    /// Returns true if the state changed
    pub fn play(&mut self) -> bool {
        match self.state {
            PlayState::Stopped => {
                self.state = PlayState::Playing;
                self.frame_count = 0;
                self.elapsed_time = 0.0;
                self.accumulated_time = 0.0;
                tracing::info!("Entered play mode");
                true
            }
            PlayState::Paused => {
                self.state = PlayState::Playing;
                tracing::info!("Resumed play mode");
                true
            }
            PlayState::Playing => false,
        }
    }

    /// Pause play mode
    pub fn pause(&mut self) -> bool {
        if self.state == PlayState::Playing {
            self.state = PlayState::Paused;
            tracing::info!("Paused play mode");
            true
        } else {
            false
        }
    }

    /// Stop play mode
    pub fn stop(&mut self) -> bool {
        if !self.state.is_active() {
            return false;
        }

        self.state = PlayState::Stopped;
        self.frame_count = 0;
        self.elapsed_time = 0.0;
        self.accumulated_time = 0.0;
        tracing::info!("Stopped play mode");
        true
    }

    /// Consume one host frame.
    /// Returns the number of fixed timesteps to run
    pub fn update(&mut self, delta_time: f64, fixed_timestep: f64) -> u32 {
        if self.state != PlayState::Playing || !(fixed_timestep > 0.0) {
            return 0;
        }

        let scaled_delta = delta_time.max(0.0) * f64::from(self.time_scale);
        self.accumulated_time += scaled_delta;

        let mut steps = 0;
        while self.accumulated_time >= fixed_timestep {
            self.accumulated_time -= fixed_timestep;
            steps += 1;

            if steps >= MAX_STEPS_PER_FRAME {
                tracing::debug!("Dropping {:.3}s of backlog", self.accumulated_time);
                self.accumulated_time = 0.0;
                break;
            }
        }

        self.frame_count += u64::from(steps);
        self.elapsed_time += f64::from(steps) * fixed_timestep;
        steps
    }

    /// Step forward one frame (while paused)
    pub fn step_frame(&mut self, fixed_timestep: f64) -> bool {
        if self.state == PlayState::Paused {
            self.elapsed_time += fixed_timestep;
            self.frame_count += 1;
            true
        } else {
            false
        }
    }

    /// Set time scale (clamped to reasonable range)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = if scale.is_finite() { scale.clamp(0.0, 10.0) } else { 1.0 };
    }
}

impl Default for PlayModeManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        let mut play = PlayModeManager::new();
        assert!(!play.pause());
        assert!(play.play());
        assert!(!play.play());
        assert!(play.pause());
        assert_eq!(play.state, PlayState::Paused);
        assert!(play.play());
        assert!(play.state.is_playing());
        assert!(play.stop());
        assert!(!play.stop());
        assert_eq!(play.state, PlayState::Stopped);
    }

    #[test]
    fn test_update_fixed_steps() {
        let mut play = PlayModeManager::new();
        assert_eq!(play.update(0.5, 0.25), 0);

        play.play();
        assert_eq!(play.update(0.25, 0.25), 1);
        assert_eq!(play.update(0.125, 0.25), 0);
        assert_eq!(play.update(0.125, 0.25), 1);
        assert_eq!(play.frame_count, 2);
        assert_eq!(play.elapsed_time, 0.5);
    }

    #[test]
    fn test_time_scale() {
        let mut play = PlayModeManager::new();
        play.play();
        play.set_time_scale(2.0);
        assert_eq!(play.update(0.25, 0.25), 2);

        play.set_time_scale(100.0);
        assert_eq!(play.time_scale, 10.0);
        play.set_time_scale(f32::NAN);
        assert_eq!(play.time_scale, 1.0);
    }

    #[test]
    fn test_backlog_is_capped() {
        let mut play = PlayModeManager::new();
        play.play();
        assert_eq!(play.update(10.0, 0.25), MAX_STEPS_PER_FRAME);
        assert_eq!(play.update(0.0, 0.25), 0);
    }

    #[test]
    fn test_step_frame_only_when_paused() {
        let mut play = PlayModeManager::new();
        play.play();
        assert!(!play.step_frame(0.25));
        play.pause();
        assert!(play.step_frame(0.25));
        assert_eq!(play.frame_count, 1);
    }
}
