// SPDX-License-Identifier: MIT OR Apache-2.0
//! Barriers - rendezvous points across sequencer threads.
//!
//! Each participant calls the barrier from its own body. A thread that
//! reaches the barrier parks there with its arrival recorded; the thread that
//! completes the set releases every participant on the same frame. Released
//! threads resume with their next step counting from the release time, even
//! if their body is only re-entered on a later frame.

use crate::context::Wait;
use crate::thread::{SeqThread, ThreadId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Participant set identifying a rendezvous
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BarrierKey(Vec<ThreadId>);

impl BarrierKey {
    /// Create a key from participants, in any order and with duplicates
    pub fn new(participants: impl IntoIterator<Item = ThreadId>) -> Self {
        let mut ids: Vec<ThreadId> = participants.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        Self(ids)
    }

    /// Participants, sorted
    pub fn participants(&self) -> &[ThreadId] {
        &self.0
    }

    /// Whether a thread takes part
    pub fn contains(&self, id: ThreadId) -> bool {
        self.0.binary_search(&id).is_ok()
    }

    /// Number of participants
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Add a participant
    pub fn with(mut self, id: ThreadId) -> Self {
        if let Err(pos) = self.0.binary_search(&id) {
            self.0.insert(pos, id);
        }
        self
    }
}

/// Register `me` at the barrier and release everyone if the set is complete
pub(crate) fn arrive(
    threads: &mut IndexMap<ThreadId, SeqThread>,
    me: ThreadId,
    key: BarrierKey,
    now: f64,
) -> Wait {
    let Some(thread) = threads.get_mut(&me) else {
        return Wait::Blocked;
    };

    if thread.arrival.as_ref() != Some(&key) {
        tracing::debug!(
            thread = %thread.name(),
            participants = key.len(),
            now,
            "Arrived at barrier"
        );
        thread.arrival = Some(key.clone());

        for id in key.participants() {
            if !threads.contains_key(id) {
                tracing::warn!(thread = %id, "Barrier names a thread that does not exist");
            }
        }
    }

    let complete = key.participants().iter().all(|id| {
        threads
            .get(id)
            .is_some_and(|t| t.arrival.as_ref() == Some(&key))
    });

    if !complete {
        return Wait::Waiting;
    }

    for id in key.participants() {
        if let Some(t) = threads.get_mut(id) {
            t.arrival = None;
            t.advance(now);
        }
    }

    tracing::debug!(participants = key.len(), now, "Barrier released");
    Wait::Elapsed
}
