// SPDX-License-Identifier: MIT OR Apache-2.0
//! Virtual clock sources.
//!
//! The sequencer never reads wall-clock time. Hosts either feed per-frame
//! deltas into a [`FrameClock`] or mirror a time value they already own with
//! an [`ExternalClock`].

use serde::{Deserialize, Serialize};

/// Anything that can report the current virtual time in seconds
pub trait ClockSource {
    /// Current virtual time in seconds
    fn now(&self) -> f64;
}

/// Clock advanced by per-frame deltas
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameClock {
    /// Accumulated time in seconds
    now: f64,
    /// Frames advanced since the last reset
    frame: u64,
}

impl FrameClock {
    /// Create a clock at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by `delta` seconds and return the new time.
    ///
    /// Negative or non-finite deltas are ignored.
    pub fn advance(&mut self, delta: f64) -> f64 {
        if !delta.is_finite() || delta < 0.0 {
            tracing::warn!(delta, "Ignoring invalid clock delta");
            return self.now;
        }

        self.now += delta;
        self.frame += 1;
        self.now
    }

    /// Frames advanced since the last reset
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Rewind to time zero
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl ClockSource for FrameClock {
    fn now(&self) -> f64 {
        self.now
    }
}

/// Clock mirroring a time value supplied by the host
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalClock {
    now: f64,
}

impl ExternalClock {
    /// Create a clock at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the current time and return the accepted value.
    ///
    /// Time never moves backwards; smaller values are ignored.
    pub fn set(&mut self, now: f64) -> f64 {
        if now.is_finite() && now >= self.now {
            self.now = now;
        } else {
            tracing::warn!(now, current = self.now, "Ignoring non-monotonic clock value");
        }
        self.now
    }

    /// Rewind to time zero
    pub fn reset(&mut self) {
        self.now = 0.0;
    }
}

impl ClockSource for ExternalClock {
    fn now(&self) -> f64 {
        self.now
    }
}
