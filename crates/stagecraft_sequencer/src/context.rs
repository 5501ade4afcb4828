// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-thread step API used inside thread bodies.
//!
//! A [`ThreadCtx`] is handed to a body once per frame. Every call on it claims
//! the next step of the body; calls before the thread's cursor replay without
//! side effects, the call at the cursor runs, and calls after a pending wait
//! report [`Wait::Blocked`] and do nothing. Bodies may return early once
//! [`ThreadCtx::is_suspended`] is true, but they do not have to.

use crate::barrier::{self, BarrierKey};
use crate::cursor::{StepIndex, StepPhase};
use crate::easing::Easing;
use crate::local::Persistent;
use crate::thread::{Delay, SeqThread, ThreadId};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Outcome of a wait-point or barrier visit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// Completed on an earlier frame
    Passed,
    /// Live and not yet complete; the thread is suspended
    Waiting,
    /// Completed on this visit
    Elapsed,
    /// Not reached yet; an earlier step is still pending
    Blocked,
}

impl Wait {
    /// Live on this frame, either waiting or just completed
    pub fn is_running(self) -> bool {
        matches!(self, Self::Waiting | Self::Elapsed)
    }

    /// Still waiting
    pub fn is_waiting(self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Completed on this visit
    pub fn is_elapsed(self) -> bool {
        matches!(self, Self::Elapsed)
    }

    /// Completed now or earlier
    pub fn is_done(self) -> bool {
        matches!(self, Self::Passed | Self::Elapsed)
    }

    /// Not reached yet
    pub fn is_blocked(self) -> bool {
        matches!(self, Self::Blocked)
    }
}

/// Handle to one sequencer thread for the duration of a frame
pub struct ThreadCtx<'a> {
    threads: &'a mut IndexMap<ThreadId, SeqThread>,
    index: usize,
    now: f64,
}

impl<'a> ThreadCtx<'a> {
    pub(crate) fn new(threads: &'a mut IndexMap<ThreadId, SeqThread>, index: usize, now: f64) -> Self {
        Self {
            threads,
            index,
            now,
        }
    }

    fn thread(&self) -> &SeqThread {
        &self.threads[self.index]
    }

    fn thread_mut(&mut self) -> &mut SeqThread {
        &mut self.threads[self.index]
    }

    /// ID of the thread this context drives
    pub fn id(&self) -> ThreadId {
        self.thread().id()
    }

    /// Name of the thread this context drives
    pub fn name(&self) -> &str {
        self.thread().name()
    }

    /// Virtual time of the current frame
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Index of the pending step
    pub fn cursor(&self) -> StepIndex {
        self.thread().cursor()
    }

    /// Progress ratio of the current or most recent wait
    pub fn progress(&self) -> f64 {
        self.thread().progress()
    }

    /// Whether the thread has stopped at a pending step this frame
    pub fn is_suspended(&self) -> bool {
        self.thread().is_suspended()
    }

    // ------------------------------------------------------------------
    // Wait-points
    // ------------------------------------------------------------------

    /// Wait for `duration` seconds of virtual time.
    ///
    /// The wait counts from the moment this step became pending, capped at the
    /// previous frame this thread ran on, so a wait reached after a barrier
    /// counts from the release and a wait reached late never counts more than
    /// one frame it did not see. Durations of zero or less complete on the
    /// first visit.
    pub fn sleep(&mut self, duration: f64) -> Wait {
        let now = self.now;
        let thread = self.thread_mut();
        let (_, phase) = thread.visit();

        let wait = match phase {
            StepPhase::Passed => Wait::Passed,
            StepPhase::Blocked => Wait::Blocked,
            StepPhase::Live => {
                let start = thread.wait_origin();
                let delay = *thread
                    .active_delay
                    .get_or_insert_with(|| Delay::new(start, duration));
                thread.progress = delay.ratio(now);

                if delay.is_elapsed(now) {
                    thread.progress = 1.0;
                    thread.active_delay = None;
                    thread.advance(now);
                    Wait::Elapsed
                } else {
                    Wait::Waiting
                }
            }
        };

        thread.previous_delay_active = wait.is_running();
        wait
    }

    /// Open a wait that following `*_multi` calls read from
    pub fn lerp_multi_start(&mut self, duration: f64) -> Wait {
        self.sleep(duration)
    }

    /// Wait for `duration` while easing `target` from `from` to `to`.
    ///
    /// The target is written on every live frame, including the frame the
    /// wait completes on, where it is set to `to`.
    pub fn ease(&mut self, duration: f64, target: &mut f32, from: f32, to: f32, easing: Easing) -> Wait {
        let wait = self.sleep(duration);
        if wait.is_running() {
            *target = easing.interpolate(from, to, self.progress() as f32);
        }
        wait
    }

    /// Linear interpolation over a wait
    pub fn lerp(&mut self, duration: f64, target: &mut f32, from: f32, to: f32) -> Wait {
        self.ease(duration, target, from, to, Easing::Linear)
    }

    /// Quadratic interpolation over a wait
    pub fn squerp(&mut self, duration: f64, target: &mut f32, from: f32, to: f32) -> Wait {
        self.ease(duration, target, from, to, Easing::Quadratic)
    }

    /// Drive `target` off the preceding wait without opening one.
    ///
    /// Returns whether the target was written.
    pub fn ease_multi(&mut self, target: &mut f32, from: f32, to: f32, easing: Easing) -> bool {
        let thread = self.thread();
        if !thread.previous_delay_active() {
            return false;
        }
        *target = easing.interpolate(from, to, thread.progress() as f32);
        true
    }

    /// Linear interpolation over the preceding wait
    pub fn lerp_multi(&mut self, target: &mut f32, from: f32, to: f32) -> bool {
        self.ease_multi(target, from, to, Easing::Linear)
    }

    /// Square-root interpolation over the preceding wait
    pub fn sqrt_multi(&mut self, target: &mut f32, from: f32, to: f32) -> bool {
        self.ease_multi(target, from, to, Easing::Sqrt)
    }

    /// Quadratic interpolation over the preceding wait
    pub fn squerp_multi(&mut self, target: &mut f32, from: f32, to: f32) -> bool {
        self.ease_multi(target, from, to, Easing::Quadratic)
    }

    // ------------------------------------------------------------------
    // One-shot statements and persistent locals
    // ------------------------------------------------------------------

    /// Run `f` once per forward pass through the body
    pub fn once<R>(&mut self, f: impl FnOnce() -> R) -> Option<R> {
        let thread = self.thread_mut();
        let (_, phase) = thread.visit();

        if phase != StepPhase::Live {
            return None;
        }

        let result = f();
        thread.advance_untimed();
        Some(result)
    }

    /// Bind a value on the first pass and hand back the same slot afterwards.
    ///
    /// `init` runs only when the step is live. When the step is still blocked
    /// the returned handle is detached and its value is not kept.
    pub fn local<T, F>(&mut self, init: F) -> Persistent<T>
    where
        T: Serialize + DeserializeOwned + 'static,
        F: FnOnce() -> T,
    {
        let thread = self.thread_mut();
        let (step, phase) = thread.visit();

        match phase {
            StepPhase::Live => {
                let handle = thread.locals.bind(step, init());
                thread.advance_untimed();
                handle
            }
            StepPhase::Passed => match thread.locals.fetch(step) {
                Some(Ok(handle)) => handle,
                Some(Err(reason)) => {
                    tracing::warn!(thread = %thread.name(), step, %reason, "Rebinding persistent local");
                    thread.locals.bind(step, init())
                }
                None => {
                    tracing::warn!(thread = %thread.name(), step, "Persistent local missing, rebinding");
                    thread.locals.bind(step, init())
                }
            },
            StepPhase::Blocked => Persistent::detached(init()),
        }
    }

    // ------------------------------------------------------------------
    // Barriers
    // ------------------------------------------------------------------

    /// Rendezvous with one other thread
    pub fn sync_with(&mut self, other: ThreadId) -> Wait {
        let me = self.id();
        self.sync_all(&[me, other])
    }

    /// Rendezvous of two threads, one of which should be this one
    pub fn sync_both(&mut self, a: ThreadId, b: ThreadId) -> Wait {
        self.sync_all(&[a, b])
    }

    /// Rendezvous of every listed thread.
    ///
    /// The calling thread is always a participant.
    pub fn sync_all(&mut self, participants: &[ThreadId]) -> Wait {
        let now = self.now;
        let me = self.id();
        let thread = self.thread_mut();
        let (_, phase) = thread.visit();
        thread.previous_delay_active = false;

        match phase {
            StepPhase::Passed => Wait::Passed,
            StepPhase::Blocked => Wait::Blocked,
            StepPhase::Live => {
                let key = BarrierKey::new(participants.iter().copied());
                let key = if key.contains(me) {
                    key
                } else {
                    tracing::warn!(thread = %thread.name(), "Barrier does not list its caller, adding it");
                    key.with(me)
                };
                barrier::arrive(self.threads, me, key, now)
            }
        }
    }
}
