// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sequencer thread records.

use crate::barrier::BarrierKey;
use crate::cursor::{StepCursor, StepIndex, StepPhase};
use crate::local::LocalStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a sequencer thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ThreadId(pub Uuid);

impl ThreadId {
    /// Create a new random thread ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ThreadId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A wait in progress
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Delay {
    /// Virtual time the wait counts from
    pub start_time: f64,
    /// Length of the wait in seconds
    pub duration: f64,
}

impl Delay {
    /// Create a delay
    pub fn new(start_time: f64, duration: f64) -> Self {
        Self {
            start_time,
            duration,
        }
    }

    /// Fraction of the duration elapsed at `now`, clamped to `[0, 1]`
    pub fn ratio(&self, now: f64) -> f64 {
        if self.is_degenerate() {
            return 1.0;
        }
        ((now - self.start_time) / self.duration).clamp(0.0, 1.0)
    }

    /// Whether the full duration has elapsed at `now`
    pub fn is_elapsed(&self, now: f64) -> bool {
        self.is_degenerate() || now - self.start_time >= self.duration
    }

    /// Zero, negative and NaN durations complete immediately
    fn is_degenerate(&self) -> bool {
        !(self.duration > 0.0)
    }
}

/// One cooperative execution line
#[derive(Debug)]
pub struct SeqThread {
    /// Unique thread ID
    id: ThreadId,
    /// Thread name, used in log records
    name: String,
    /// Step bookkeeping
    pub(crate) cursor: StepCursor,
    /// Wait currently in progress
    pub(crate) active_delay: Option<Delay>,
    /// Progress of the current or last wait
    pub(crate) progress: f64,
    /// Whether the last wait visited this frame is live
    pub(crate) previous_delay_active: bool,
    /// Time at which the pending step became pending
    pub(crate) step_started_at: f64,
    /// Time of the latest frame this thread was entered on
    pub(crate) entered_at: Option<f64>,
    /// Time of the frame entered before that one
    pub(crate) previous_entry: Option<f64>,
    /// Serial of the latest frame this thread was entered on
    entered_frame: Option<u64>,
    /// Barrier this thread is parked at
    pub(crate) arrival: Option<BarrierKey>,
    /// Persistent locals keyed by step
    pub(crate) locals: LocalStore,
}

impl SeqThread {
    /// Create a thread at the start of its body
    pub fn new(name: impl Into<String>, now: f64) -> Self {
        Self::with_id(ThreadId::new(), name, now)
    }

    /// Create a thread with a known ID
    pub fn with_id(id: ThreadId, name: impl Into<String>, now: f64) -> Self {
        Self {
            id,
            name: name.into(),
            cursor: StepCursor::new(),
            active_delay: None,
            progress: 0.0,
            previous_delay_active: false,
            step_started_at: now,
            entered_at: None,
            previous_entry: None,
            entered_frame: None,
            arrival: None,
            locals: LocalStore::default(),
        }
    }

    /// Thread ID
    pub fn id(&self) -> ThreadId {
        self.id
    }

    /// Thread name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Index of the pending step
    pub fn cursor(&self) -> StepIndex {
        self.cursor.position()
    }

    /// Wait currently in progress
    pub fn active_delay(&self) -> Option<Delay> {
        self.active_delay
    }

    /// Progress ratio of the current or most recent wait
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Whether the last wait visited this frame is waiting or just finished
    pub fn previous_delay_active(&self) -> bool {
        self.previous_delay_active
    }

    /// Time at which the pending step became pending
    pub fn step_started_at(&self) -> f64 {
        self.step_started_at
    }

    /// Barrier this thread is parked at, if any
    pub fn arrival(&self) -> Option<&BarrierKey> {
        self.arrival.as_ref()
    }

    /// Whether the thread stopped at a pending step during this frame
    pub fn is_suspended(&self) -> bool {
        self.cursor.is_suspended()
    }

    /// Number of persistent locals currently bound
    pub fn local_count(&self) -> usize {
        self.locals.len()
    }

    /// Restart the body from the top
    pub fn reset(&mut self, now: f64) {
        self.cursor.rewind();
        self.active_delay = None;
        self.progress = 0.0;
        self.previous_delay_active = false;
        self.step_started_at = now;
        self.arrival = None;
        self.locals.clear();
    }

    /// Record that the body is being run on frame `serial` at `now`
    pub(crate) fn enter(&mut self, serial: u64, now: f64) {
        if self.entered_frame != Some(serial) {
            self.entered_frame = Some(serial);
            self.previous_entry = self.entered_at.replace(now);
        }
    }

    /// Drop entry times, e.g. after the host rewinds its clock
    pub(crate) fn forget_entries(&mut self) {
        self.entered_at = None;
        self.previous_entry = None;
        self.entered_frame = None;
    }

    /// Start time for a wait opened on this frame.
    ///
    /// The wait counts from when its step became pending, but never from
    /// before the previous frame this thread ran on.
    pub(crate) fn wait_origin(&self) -> f64 {
        match self.previous_entry {
            Some(previous) => self.step_started_at.max(previous),
            None => self.step_started_at,
        }
    }

    pub(crate) fn begin_frame(&mut self) {
        self.cursor.begin_frame();
        self.previous_delay_active = false;
    }

    pub(crate) fn visit(&mut self) -> (StepIndex, StepPhase) {
        self.cursor.visit()
    }

    /// Complete a wait or barrier at `now`; the next step counts from there
    pub(crate) fn advance(&mut self, now: f64) {
        tracing::trace!(
            thread = %self.name,
            step = self.cursor.position(),
            now,
            "Step complete"
        );
        self.cursor.advance();
        self.step_started_at = now;
    }

    /// Complete an instantaneous step without touching step timing
    pub(crate) fn advance_untimed(&mut self) {
        tracing::trace!(thread = %self.name, step = self.cursor.position(), "Step complete");
        self.cursor.advance();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_ratio() {
        let delay = Delay::new(1.0, 2.0);
        assert_eq!(delay.ratio(0.5), 0.0);
        assert_eq!(delay.ratio(2.0), 0.5);
        assert_eq!(delay.ratio(5.0), 1.0);
        assert!(!delay.is_elapsed(2.9));
        assert!(delay.is_elapsed(3.0));
    }

    #[test]
    fn test_degenerate_delay_is_elapsed() {
        for duration in [0.0, -1.0, f64::NAN] {
            let delay = Delay::new(4.0, duration);
            assert!(delay.is_elapsed(4.0));
            assert_eq!(delay.ratio(4.0), 1.0);
        }
    }

    #[test]
    fn test_reset_clears_transient_state() {
        let mut thread = SeqThread::new("t", 0.0);
        thread.visit();
        thread.advance(1.5);
        thread.active_delay = Some(Delay::new(1.5, 1.0));
        thread.progress = 0.4;
        thread.arrival = Some(BarrierKey::new([thread.id()]));

        thread.reset(2.0);

        assert_eq!(thread.cursor(), 0);
        assert_eq!(thread.active_delay(), None);
        assert_eq!(thread.progress(), 0.0);
        assert_eq!(thread.step_started_at(), 2.0);
        assert!(thread.arrival().is_none());
    }

    #[test]
    fn test_wait_origin_limited_to_previous_entry() {
        let mut thread = SeqThread::new("t", 0.0);
        assert_eq!(thread.wait_origin(), 0.0);

        thread.enter(1, 2.5);
        thread.enter(1, 2.5);
        assert_eq!(thread.wait_origin(), 0.0);

        thread.enter(2, 3.0);
        assert_eq!(thread.wait_origin(), 2.5);

        thread.advance(2.75);
        assert_eq!(thread.wait_origin(), 2.75);

        thread.advance_untimed();
        assert_eq!(thread.step_started_at(), 2.75);

        thread.forget_entries();
        thread.reset(0.0);
        assert_eq!(thread.wait_origin(), 0.0);
    }
}
