// SPDX-License-Identifier: MIT OR Apache-2.0
//! Stage: a clock, a sequencer and one registered body per thread.

use crate::clock::{ClockSource, FrameClock};
use crate::context::ThreadCtx;
use crate::sequencer::Sequencer;
use crate::thread::{SeqThread, ThreadId};

/// Procedure re-run once per frame for one thread.
///
/// Implemented for every `FnMut(&mut ThreadCtx, &mut S)`.
pub trait ThreadBody<S> {
    /// Run the body from the top
    fn run(&mut self, ctx: &mut ThreadCtx<'_>, state: &mut S);
}

impl<S, F> ThreadBody<S> for F
where
    F: FnMut(&mut ThreadCtx<'_>, &mut S),
{
    fn run(&mut self, ctx: &mut ThreadCtx<'_>, state: &mut S) {
        self(ctx, state);
    }
}

/// Drives registered thread bodies against shared host state `S`
pub struct Stage<S> {
    clock: FrameClock,
    sequencer: Sequencer,
    bodies: Vec<(ThreadId, Box<dyn ThreadBody<S>>)>,
}

impl<S> Stage<S> {
    /// Create an empty stage at time zero
    pub fn new() -> Self {
        Self {
            clock: FrameClock::new(),
            sequencer: Sequencer::new(),
            bodies: Vec::new(),
        }
    }

    /// Register a closure or function as a new thread's body
    pub fn add_thread<F>(&mut self, name: impl Into<String>, body: F) -> ThreadId
    where
        F: FnMut(&mut ThreadCtx<'_>, &mut S) + 'static,
    {
        self.add_body(name, body)
    }

    /// Create a stage around an existing sequencer, e.g. one restored from a snapshot
    pub fn with_sequencer(sequencer: Sequencer) -> Self {
        let mut stage = Self::new();
        stage.replace_sequencer(sequencer);
        stage
    }

    /// Register a body for the thread called `name`.
    ///
    /// A thread of that name that has no body yet is reused, keeping its
    /// cursor and waits; otherwise a new thread is spawned.
    pub fn bind_thread<F>(&mut self, name: &str, body: F) -> ThreadId
    where
        F: FnMut(&mut ThreadCtx<'_>, &mut S) + 'static,
    {
        let existing = self
            .sequencer
            .threads()
            .filter(|t| t.name() == name)
            .map(SeqThread::id)
            .find(|id| !self.bodies.iter().any(|(bound, _)| bound == id));

        let id = match existing {
            Some(id) => {
                tracing::debug!(thread = name, "Rebound body to existing thread");
                id
            }
            None => self.sequencer.spawn(name),
        };
        self.bodies.push((id, Box::new(body)));
        id
    }

    /// Register any [`ThreadBody`] as a new thread's body
    pub fn add_body<B>(&mut self, name: impl Into<String>, body: B) -> ThreadId
    where
        B: ThreadBody<S> + 'static,
    {
        let id = self.sequencer.spawn(name);
        self.bodies.push((id, Box::new(body)));
        id
    }

    /// Advance the clock by `delta` and run every body once
    pub fn update(&mut self, delta: f64, state: &mut S) {
        let now = self.clock.advance(delta);
        self.run_frame(now, state);
    }

    /// Run every body once at the time reported by an outside clock
    pub fn update_from(&mut self, clock: &impl ClockSource, state: &mut S) {
        self.run_frame(clock.now(), state);
    }

    fn run_frame(&mut self, now: f64, state: &mut S) {
        let mut frame = self.sequencer.frame(now);
        for (id, body) in &mut self.bodies {
            match frame.thread(*id) {
                Ok(mut ctx) => body.run(&mut ctx, state),
                Err(e) => tracing::warn!("Skipping thread body: {e}"),
            }
        }
    }

    /// Rewind the clock to zero and restart every thread
    pub fn restart(&mut self) {
        self.clock.reset();
        self.sequencer.set_time(0.0);
        self.sequencer.reset_all();
    }

    /// Current virtual time
    pub fn now(&self) -> f64 {
        self.sequencer.now()
    }

    /// The stage clock
    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// The sequencer
    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    /// The sequencer, mutably
    pub fn sequencer_mut(&mut self) -> &mut Sequencer {
        &mut self.sequencer
    }

    /// Swap in a restored sequencer, keeping the registered bodies.
    ///
    /// The clock resumes from the sequencer's time. Bodies whose thread is
    /// missing from `sequencer` are skipped with a warning.
    pub fn replace_sequencer(&mut self, sequencer: Sequencer) -> Sequencer {
        self.clock.reset();
        self.clock.advance(sequencer.now());
        std::mem::replace(&mut self.sequencer, sequencer)
    }

    /// Thread IDs in body order
    pub fn thread_ids(&self) -> impl Iterator<Item = ThreadId> + '_ {
        self.bodies.iter().map(|(id, _)| *id)
    }
}

impl<S> Default for Stage<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        value: u32,
    }

    fn sleep_then_count(ctx: &mut ThreadCtx<'_>, counter: &mut Counter) {
        ctx.sleep(1.0);
        ctx.once(|| counter.value += 1);
    }

    #[test]
    fn test_sleep_then_once_scenario() {
        let mut stage = Stage::new();
        stage.add_thread("counter", sleep_then_count);
        let mut counter = Counter::default();

        stage.update(0.4, &mut counter);
        assert_eq!(counter.value, 0);
        stage.update(0.4, &mut counter);
        assert_eq!(counter.value, 0);
        stage.update(0.4, &mut counter);
        assert_eq!(counter.value, 1);
        stage.update(0.4, &mut counter);
        assert_eq!(counter.value, 1);
    }

    #[test]
    fn test_barrier_release_sets_post_barrier_start() {
        struct Pair {
            a: Option<ThreadId>,
            b: Option<ThreadId>,
            a_done: Option<f64>,
            b_done: Option<f64>,
        }

        let mut stage: Stage<Pair> = Stage::new();
        let a = stage.add_thread("a", |ctx, pair: &mut Pair| {
            let Some(b) = pair.b else { return };
            ctx.sleep(0.25);
            ctx.sync_with(b);
            if ctx.sleep(0.5).is_elapsed() {
                pair.a_done = Some(ctx.now());
            }
        });
        let b = stage.add_thread("b", |ctx, pair: &mut Pair| {
            let Some(a) = pair.a else { return };
            ctx.sleep(0.5);
            ctx.sync_with(a);
            if ctx.sleep(0.5).is_elapsed() {
                pair.b_done = Some(ctx.now());
            }
        });

        let mut pair = Pair {
            a: Some(a),
            b: Some(b),
            a_done: None,
            b_done: None,
        };
        for _ in 0..16 {
            stage.update(0.125, &mut pair);
        }

        // Both post-barrier waits count from the release at 0.5.
        assert_eq!(pair.a_done, Some(1.0));
        assert_eq!(pair.b_done, Some(1.0));
    }

    #[test]
    fn test_restart_rewinds_clock_and_threads() {
        let mut stage = Stage::new();
        stage.add_thread("counter", sleep_then_count);
        let mut counter = Counter::default();

        for _ in 0..3 {
            stage.update(0.5, &mut counter);
        }
        assert_eq!(counter.value, 1);

        stage.restart();
        assert_eq!(stage.now(), 0.0);
        stage.update(0.5, &mut counter);
        assert_eq!(counter.value, 1);
        stage.update(0.5, &mut counter);
        assert_eq!(counter.value, 2);
    }

    #[test]
    fn test_bind_thread_reuses_restored_thread() {
        let mut stage: Stage<Counter> = Stage::new();
        let original = stage.bind_thread("counter", sleep_then_count);
        let mut counter = Counter::default();
        stage.update(0.5, &mut counter);

        let snapshot = stage.sequencer().snapshot().unwrap();
        let restored = Sequencer::restore(snapshot).unwrap();

        let mut reloaded: Stage<Counter> = Stage::with_sequencer(restored);
        let rebound = reloaded.bind_thread("counter", sleep_then_count);
        assert_eq!(rebound, original);
        assert_eq!(reloaded.now(), 0.5);

        // The wait opened before the reload completes on schedule.
        reloaded.update(0.5, &mut counter);
        assert_eq!(counter.value, 1);

        // A second body with the same name gets its own thread.
        let second = reloaded.bind_thread("counter", sleep_then_count);
        assert_ne!(second, original);
    }

    #[test]
    fn test_replace_sequencer_resumes_clock() {
        let mut stage: Stage<Counter> = Stage::new();
        stage.add_thread("counter", sleep_then_count);
        stage.update(0.75, &mut Counter::default());

        let mut other = Sequencer::new();
        other.set_time(3.0);
        let previous = stage.replace_sequencer(other);

        assert_eq!(previous.thread_count(), 1);
        assert_eq!(stage.clock().now(), 3.0);
        assert_eq!(stage.thread_ids().count(), 1);
    }
}
