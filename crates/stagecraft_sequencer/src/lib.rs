// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame-driven cooperative sequencer.
//!
//! This crate lets timed, multi-actor behavior be written as straight-line
//! code that the host re-enters once per frame:
//! - Sequencer threads with a persistent step cursor
//! - Timed waits with eased interpolation (`sleep`, `lerp`, `squerp`, multi variants)
//! - One-shot statements and persistent locals
//! - Pairwise and N-way barriers
//! - Versioned snapshots for carrying thread state across code reloads
//!
//! ## Architecture
//!
//! Every thread body is re-run from its first statement each frame. Each
//! scheduler call inside the body claims the next step index; steps before the
//! thread's cursor are skipped, the step at the cursor runs live, and steps
//! after a pending wait are blocked until a later frame.
//!
//! ```ignore
//! let mut stage = Stage::new();
//! stage.add_thread("fade", |ctx, opacity: &mut f32| {
//!     ctx.sleep(0.5);
//!     ctx.lerp(1.0, opacity, 0.0, 1.0);
//! });
//! stage.update(1.0 / 60.0, &mut opacity);
//! ```

pub mod barrier;
pub mod clock;
pub mod context;
pub mod cursor;
pub mod easing;
pub mod error;
pub mod local;
pub mod sequencer;
pub mod snapshot;
pub mod stage;
pub mod thread;

pub use barrier::BarrierKey;
pub use clock::{ClockSource, ExternalClock, FrameClock};
pub use context::{ThreadCtx, Wait};
pub use cursor::{StepCursor, StepIndex, StepPhase};
pub use easing::Easing;
pub use error::{Result, SequencerError, SnapshotError};
pub use local::Persistent;
pub use sequencer::{Frame, Sequencer};
pub use snapshot::{SequencerSnapshot, ThreadRecord, SNAPSHOT_SCHEMA};
pub use stage::{Stage, ThreadBody};
pub use thread::{Delay, SeqThread, ThreadId};
