// SPDX-License-Identifier: MIT OR Apache-2.0
//! Versioned snapshots of sequencer state.
//!
//! A snapshot carries every thread record, including in-flight waits, parked
//! barrier arrivals and encoded persistent locals, so that a host can swap the
//! code driving the threads without losing timing state. RON snapshots are
//! self-describing: fields added by later schemas are default-filled when an
//! older snapshot is read. Binary snapshots only decode at the schema that
//! wrote them.

use crate::barrier::BarrierKey;
use crate::cursor::{StepCursor, StepIndex};
use crate::error::{Result, SnapshotError};
use crate::local::LocalStore;
use crate::sequencer::Sequencer;
use crate::thread::{Delay, SeqThread, ThreadId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current snapshot schema.
///
/// - 1: first versioned layout
/// - 2: adds `ThreadRecord::entered_at`
pub const SNAPSHOT_SCHEMA: u32 = 2;

/// Persisted form of one thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadRecord {
    /// Thread ID
    pub id: ThreadId,
    /// Thread name
    pub name: String,
    /// Index of the pending step
    pub cursor: StepIndex,
    /// Wait in progress
    #[serde(default)]
    pub active_delay: Option<Delay>,
    /// Progress ratio
    #[serde(default)]
    pub progress: f64,
    /// Time at which the pending step became pending
    #[serde(default)]
    pub step_started_at: f64,
    /// Time of the latest frame the thread was run on
    #[serde(default)]
    pub entered_at: Option<f64>,
    /// Barrier the thread is parked at
    #[serde(default)]
    pub arrival: Option<BarrierKey>,
    /// Encoded persistent locals by step
    #[serde(default)]
    pub locals: BTreeMap<StepIndex, Vec<u8>>,
}

/// Persisted form of a whole sequencer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencerSnapshot {
    /// Schema marker; snapshots without one predate versioning and read as 0
    #[serde(default)]
    pub schema: u32,
    /// Virtual time of the last frame
    #[serde(default)]
    pub time: f64,
    /// Thread records, in registration order
    pub threads: Vec<ThreadRecord>,
}

impl SequencerSnapshot {
    /// Encode as pretty RON
    pub fn to_ron(&self) -> std::result::Result<String, SnapshotError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    /// Decode from RON, upgrading older schemas
    pub fn from_ron(text: &str) -> std::result::Result<Self, SnapshotError> {
        let snapshot: Self = ron::from_str(text)?;
        snapshot.upgrade()
    }

    /// Encode as bincode
    pub fn to_bytes(&self) -> std::result::Result<Vec<u8>, SnapshotError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode from bincode; only the current schema is accepted
    pub fn from_bytes(bytes: &[u8]) -> std::result::Result<Self, SnapshotError> {
        // The schema is the leading field, so it can be read on its own.
        let found: u32 = bincode::deserialize(bytes)?;
        if found != SNAPSHOT_SCHEMA {
            return Err(SnapshotError::SchemaMismatch {
                found,
                expected: SNAPSHOT_SCHEMA,
            });
        }
        Ok(bincode::deserialize(bytes)?)
    }

    /// Bring an older snapshot up to the current schema
    pub fn upgrade(mut self) -> std::result::Result<Self, SnapshotError> {
        if self.schema > SNAPSHOT_SCHEMA {
            return Err(SnapshotError::SchemaTooNew {
                found: self.schema,
                supported: SNAPSHOT_SCHEMA,
            });
        }

        if self.schema < SNAPSHOT_SCHEMA {
            tracing::info!(
                "Migrating sequencer snapshot schema {} -> {}",
                self.schema,
                SNAPSHOT_SCHEMA
            );
            self.schema = SNAPSHOT_SCHEMA;
        }

        Ok(self)
    }
}

impl Sequencer {
    /// Capture every thread record
    pub fn snapshot(&self) -> Result<SequencerSnapshot> {
        let threads = self
            .threads
            .values()
            .map(|thread| -> Result<ThreadRecord> {
                Ok(ThreadRecord {
                    id: thread.id(),
                    name: thread.name().to_string(),
                    cursor: thread.cursor(),
                    active_delay: thread.active_delay,
                    progress: thread.progress,
                    step_started_at: thread.step_started_at,
                    entered_at: thread.entered_at,
                    arrival: thread.arrival.clone(),
                    locals: thread.locals.encode_all().map_err(SnapshotError::from)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(SequencerSnapshot {
            schema: SNAPSHOT_SCHEMA,
            time: self.now,
            threads,
        })
    }

    /// Rebuild a sequencer from a snapshot.
    ///
    /// Thread IDs are kept, so barrier arrivals and host-held IDs stay valid.
    pub fn restore(snapshot: SequencerSnapshot) -> Result<Self> {
        let snapshot = snapshot.upgrade()?;
        let mut sequencer = Sequencer::new();
        sequencer.now = snapshot.time;

        for record in snapshot.threads {
            let mut thread = SeqThread::with_id(record.id, record.name, record.step_started_at);
            thread.cursor = StepCursor::at(record.cursor);
            thread.active_delay = record.active_delay;
            thread.progress = record.progress;
            thread.entered_at = record.entered_at;
            thread.arrival = record.arrival;
            thread.locals = LocalStore::from_encoded(record.locals);

            if let Some(previous) = sequencer.threads.insert(thread.id(), thread) {
                tracing::warn!(thread = %previous.name(), "Duplicate thread in snapshot, keeping the last one");
            }
        }

        tracing::info!(
            threads = sequencer.threads.len(),
            time = sequencer.now,
            "Restored sequencer from snapshot"
        );
        Ok(sequencer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Wait;

    fn mid_flight() -> (Sequencer, ThreadId, ThreadId) {
        let mut seq = Sequencer::new();
        let a = seq.spawn("a");
        let b = seq.spawn("b");

        let mut frame = seq.frame(0.5);
        {
            let mut ctx = frame.thread(a).unwrap();
            let origin = ctx.local(|| [3.0_f32, 4.0]);
            origin.borrow_mut()[0] = 9.0;
            ctx.sleep(2.0);
        }
        {
            let mut ctx = frame.thread(b).unwrap();
            ctx.sync_with(a);
        }
        drop(frame);

        (seq, a, b)
    }

    #[test]
    fn test_snapshot_captures_in_flight_state() {
        let (seq, a, b) = mid_flight();
        let snapshot = seq.snapshot().unwrap();

        assert_eq!(snapshot.schema, SNAPSHOT_SCHEMA);
        assert_eq!(snapshot.time, 0.5);
        assert_eq!(snapshot.threads.len(), 2);

        let ra = &snapshot.threads[0];
        assert_eq!(ra.id, a);
        assert_eq!(ra.cursor, 1);
        assert_eq!(ra.active_delay, Some(Delay::new(0.0, 2.0)));
        assert_eq!(ra.entered_at, Some(0.5));
        assert_eq!(ra.locals.len(), 1);

        let rb = &snapshot.threads[1];
        assert_eq!(rb.arrival, Some(BarrierKey::new([a, b])));
    }

    #[test]
    fn test_restore_resumes_waits_and_locals() {
        let (seq, a, _) = mid_flight();
        let text = seq.snapshot().unwrap().to_ron().unwrap();
        let mut restored = Sequencer::restore(SequencerSnapshot::from_ron(&text).unwrap()).unwrap();

        let mut frame = restored.frame(1.5);
        let mut ctx = frame.thread(a).unwrap();
        assert_eq!(ctx.local(|| [0.0_f32, 0.0]).get(), [9.0, 4.0]);
        assert_eq!(ctx.sleep(2.0), Wait::Waiting);
        assert!((ctx.progress() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_restore_keeps_entry_time() {
        let mut seq = Sequencer::new();
        let t = seq.spawn("late");
        for now in [0.5, 1.0, 1.5] {
            let mut frame = seq.frame(now);
            frame.thread(t).unwrap();
        }

        let bytes = seq.snapshot().unwrap().to_bytes().unwrap();
        let mut restored = Sequencer::restore(SequencerSnapshot::from_bytes(&bytes).unwrap()).unwrap();

        let mut frame = restored.frame(2.0);
        let mut ctx = frame.thread(t).unwrap();
        assert_eq!(ctx.sleep(1.0), Wait::Waiting);
        assert!((ctx.progress() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_restore_keeps_barrier_arrivals() {
        let (seq, a, b) = mid_flight();
        let bytes = seq.snapshot().unwrap().to_bytes().unwrap();
        let mut restored = Sequencer::restore(SequencerSnapshot::from_bytes(&bytes).unwrap()).unwrap();

        let mut frame = restored.frame(3.0);
        {
            let mut ctx = frame.thread(a).unwrap();
            ctx.local(|| [0.0_f32, 0.0]);
            assert!(ctx.sleep(2.0).is_elapsed());
            assert!(ctx.sync_with(b).is_elapsed());
        }
        drop(frame);

        assert_eq!(restored.thread(b).unwrap().cursor(), 1);
        assert_eq!(restored.thread(b).unwrap().step_started_at(), 3.0);
    }

    #[test]
    fn test_unversioned_ron_is_upgraded() {
        let (seq, _, _) = mid_flight();
        let mut snapshot = seq.snapshot().unwrap();
        snapshot.schema = 0;
        let text = snapshot.to_ron().unwrap();

        let upgraded = SequencerSnapshot::from_ron(&text).unwrap();
        assert_eq!(upgraded.schema, SNAPSHOT_SCHEMA);
        assert_eq!(upgraded.threads, snapshot.threads);
    }

    #[test]
    fn test_missing_fields_are_default_filled() {
        #[derive(Serialize)]
        #[serde(rename = "ThreadRecord")]
        struct Minimal {
            id: ThreadId,
            name: String,
            cursor: StepIndex,
        }
        #[derive(Serialize)]
        #[serde(rename = "SequencerSnapshot")]
        struct Legacy {
            threads: Vec<Minimal>,
        }

        let id = ThreadId::new();
        let legacy = Legacy {
            threads: vec![Minimal {
                id,
                name: "old".into(),
                cursor: 2,
            }],
        };
        let text = ron::ser::to_string(&legacy).unwrap();
        let snapshot = SequencerSnapshot::from_ron(&text).unwrap();

        let record = &snapshot.threads[0];
        assert_eq!(record.cursor, 2);
        assert!(record.active_delay.is_none());
        assert!(record.locals.is_empty());

        let restored = Sequencer::restore(snapshot).unwrap();
        assert_eq!(restored.thread(id).unwrap().cursor(), 2);
    }

    #[test]
    fn test_newer_schema_is_rejected() {
        let (seq, _, _) = mid_flight();
        let mut snapshot = seq.snapshot().unwrap();
        snapshot.schema = SNAPSHOT_SCHEMA + 1;

        let text = snapshot.to_ron().unwrap();
        assert!(matches!(
            SequencerSnapshot::from_ron(&text),
            Err(SnapshotError::SchemaTooNew { .. })
        ));

        let bytes = snapshot.to_bytes().unwrap();
        assert!(matches!(
            SequencerSnapshot::from_bytes(&bytes),
            Err(SnapshotError::SchemaMismatch { .. })
        ));
    }
}
