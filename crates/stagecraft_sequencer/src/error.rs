// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for the sequencer.

use crate::thread::ThreadId;
use thiserror::Error;

/// Errors raised while encoding or decoding snapshots
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Snapshot was written by a newer schema than this build understands
    #[error("Snapshot schema {found} is newer than supported schema {supported}")]
    SchemaTooNew {
        /// Schema stored in the snapshot
        found: u32,
        /// Schema of this build
        supported: u32,
    },

    /// Binary snapshots carry no field names and only decode at the same schema
    #[error("Binary snapshot schema {found} does not match schema {expected}")]
    SchemaMismatch {
        /// Schema stored in the snapshot
        found: u32,
        /// Schema of this build
        expected: u32,
    },

    /// RON encoding error
    #[error("RON encoding error: {0}")]
    Ron(#[from] ron::Error),

    /// RON decoding error
    #[error("RON decoding error: {0}")]
    RonSpanned(#[from] ron::error::SpannedError),

    /// Binary encoding error
    #[error("Binary encoding error: {0}")]
    Bincode(#[from] bincode::Error),
}

/// Errors raised by the sequencer
#[derive(Debug, Error)]
pub enum SequencerError {
    /// Thread not registered with this sequencer
    #[error("Thread not found: {0}")]
    UnknownThread(ThreadId),

    /// Snapshot error
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// Result type for sequencer operations
pub type Result<T> = std::result::Result<T, SequencerError>;
