// SPDX-License-Identifier: MIT OR Apache-2.0
//! The sequencer: owner of every thread record.

use crate::clock::ClockSource;
use crate::context::ThreadCtx;
use crate::error::{Result, SequencerError};
use crate::thread::{SeqThread, ThreadId};
use indexmap::IndexMap;

/// Owner of all sequencer threads, in registration order
#[derive(Debug, Default)]
pub struct Sequencer {
    /// Threads by ID
    pub(crate) threads: IndexMap<ThreadId, SeqThread>,
    /// Virtual time of the most recent frame
    pub(crate) now: f64,
    /// Count of frames begun
    frame_serial: u64,
}

impl Sequencer {
    /// Create an empty sequencer at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new thread at the start of its body
    pub fn spawn(&mut self, name: impl Into<String>) -> ThreadId {
        let thread = SeqThread::new(name, self.now);
        let id = thread.id();
        tracing::debug!(thread = %thread.name(), %id, "Spawned sequencer thread");
        self.threads.insert(id, thread);
        id
    }

    /// Get a thread
    pub fn thread(&self, id: ThreadId) -> Option<&SeqThread> {
        self.threads.get(&id)
    }

    /// Find a thread by name
    pub fn thread_named(&self, name: &str) -> Option<&SeqThread> {
        self.threads.values().find(|t| t.name() == name)
    }

    /// Get all threads, in registration order
    pub fn threads(&self) -> impl Iterator<Item = &SeqThread> {
        self.threads.values()
    }

    /// Get thread count
    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    /// Virtual time of the most recent frame
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Move the sequencer's notion of time, e.g. after the host rewinds its clock
    pub fn set_time(&mut self, now: f64) {
        if now < self.now {
            for thread in self.threads.values_mut() {
                thread.forget_entries();
            }
        }
        self.now = now;
    }

    /// Restart one thread's body from the top
    pub fn reset(&mut self, id: ThreadId) -> Result<()> {
        let now = self.now;
        let thread = self
            .threads
            .get_mut(&id)
            .ok_or(SequencerError::UnknownThread(id))?;
        thread.reset(now);
        tracing::info!(thread = %thread.name(), now, "Reset sequencer thread");
        Ok(())
    }

    /// Restart every thread, in registration order
    pub fn reset_all(&mut self) {
        let now = self.now;
        for thread in self.threads.values_mut() {
            thread.reset(now);
        }
        tracing::info!(threads = self.threads.len(), now, "Reset all sequencer threads");
    }

    /// Begin a frame at virtual time `now`.
    ///
    /// Time going backwards is ignored; use [`Sequencer::set_time`] to rewind.
    pub fn frame(&mut self, now: f64) -> Frame<'_> {
        if now >= self.now {
            self.now = now;
        } else {
            tracing::warn!(now, current = self.now, "Frame time went backwards, keeping current time");
        }

        self.frame_serial += 1;
        for thread in self.threads.values_mut() {
            thread.begin_frame();
        }

        Frame { sequencer: self }
    }

    /// Begin a frame at the time reported by a clock
    pub fn frame_from(&mut self, clock: &impl ClockSource) -> Frame<'_> {
        self.frame(clock.now())
    }
}

/// One frame's access to the sequencer's threads.
///
/// A thread may be opened any number of times during a frame; step numbering
/// continues where the previous context left off, so one host function can
/// interleave blocks of several threads.
pub struct Frame<'a> {
    sequencer: &'a mut Sequencer,
}

impl<'a> Frame<'a> {
    /// Virtual time of this frame
    pub fn now(&self) -> f64 {
        self.sequencer.now
    }

    /// Open a thread for stepping
    pub fn thread(&mut self, id: ThreadId) -> Result<ThreadCtx<'_>> {
        let index = self
            .sequencer
            .threads
            .get_index_of(&id)
            .ok_or(SequencerError::UnknownThread(id))?;
        let now = self.sequencer.now;
        self.sequencer.threads[index].enter(self.sequencer.frame_serial, now);
        Ok(ThreadCtx::new(&mut self.sequencer.threads, index, now))
    }

    /// Read a thread's record
    pub fn record(&self, id: ThreadId) -> Option<&SeqThread> {
        self.sequencer.thread(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FrameClock;
    use crate::context::Wait;

    #[test]
    fn test_spawn_and_lookup() {
        let mut seq = Sequencer::new();
        let a = seq.spawn("a");
        let b = seq.spawn("b");

        assert_eq!(seq.thread_count(), 2);
        assert_eq!(seq.thread(a).unwrap().name(), "a");
        assert_eq!(seq.thread_named("b").unwrap().id(), b);
        let names: Vec<_> = seq.threads().map(SeqThread::name).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn test_unknown_thread() {
        let mut seq = Sequencer::new();
        let ghost = ThreadId::new();
        assert!(matches!(seq.reset(ghost), Err(SequencerError::UnknownThread(id)) if id == ghost));
        let mut frame = seq.frame(0.0);
        assert!(frame.thread(ghost).is_err());
    }

    #[test]
    fn test_interleaved_blocks_continue_numbering() {
        let mut seq = Sequencer::new();
        let t = seq.spawn("t");
        let mut log = Vec::new();

        for i in 1..=3 {
            let now = i as f64;
            let mut frame = seq.frame(now);
            frame.thread(t).unwrap().once(|| log.push("first"));
            frame.thread(t).unwrap().sleep(1.5);
            frame.thread(t).unwrap().once(|| log.push("second"));
        }

        assert_eq!(log, ["first", "second"]);
        assert_eq!(seq.thread(t).unwrap().cursor(), 3);
    }

    #[test]
    fn test_reset_restarts_only_that_thread() {
        let mut seq = Sequencer::new();
        let a = seq.spawn("a");
        let b = seq.spawn("b");

        {
            let mut frame = seq.frame(1.0);
            frame.thread(a).unwrap().sleep(0.0);
            frame.thread(b).unwrap().sleep(0.0);
        }
        seq.reset(a).unwrap();

        assert_eq!(seq.thread(a).unwrap().cursor(), 0);
        assert_eq!(seq.thread(a).unwrap().step_started_at(), 1.0);
        assert_eq!(seq.thread(b).unwrap().cursor(), 1);
    }

    #[test]
    fn test_reset_mid_frame_resumes_next_frame() {
        let mut seq = Sequencer::new();
        let t = seq.spawn("t");
        let mut hits = 0;

        {
            let mut frame = seq.frame(0.0);
            frame.thread(t).unwrap().once(|| hits += 1);
        }
        seq.reset(t).unwrap();
        {
            let mut frame = seq.frame(0.1);
            frame.thread(t).unwrap().once(|| hits += 1);
        }

        assert_eq!(hits, 2);
    }

    #[test]
    fn test_backwards_frame_time_is_ignored() {
        let mut seq = Sequencer::new();
        let t = seq.spawn("t");
        {
            let mut frame = seq.frame(2.0);
            assert_eq!(frame.thread(t).unwrap().sleep(1.0), Wait::Waiting);
        }
        let frame = seq.frame(1.0);
        assert_eq!(frame.now(), 2.0);
    }

    #[test]
    fn test_frame_from_clock() {
        let mut seq = Sequencer::new();
        let t = seq.spawn("t");
        let mut clock = FrameClock::new();
        let mut done_at = None;

        for _ in 0..10 {
            clock.advance(0.25);
            let mut frame = seq.frame_from(&clock);
            if frame.thread(t).unwrap().sleep(1.0).is_elapsed() {
                done_at = Some(frame.now());
            }
        }

        assert_eq!(done_at, Some(1.0));
    }
}
