// SPDX-License-Identifier: MIT OR Apache-2.0
//! Player error types.

use stagecraft_sequencer::{SequencerError, SnapshotError};
use thiserror::Error;

/// Errors raised by the player
#[derive(Debug, Error)]
pub enum PlayerError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config or state text could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Config or state text could not be written
    #[error("Encoding error: {0}")]
    Encode(#[from] ron::Error),

    /// Binary state blob error
    #[error("State blob error: {0}")]
    Blob(#[from] bincode::Error),

    /// Config written by a newer player
    #[error("Config version {found} is newer than supported version {supported}")]
    UnsupportedConfig {
        /// Version found in the file
        found: u32,
        /// Version this build writes
        supported: u32,
    },

    /// Reload blob written by a newer player
    #[error("Player state schema {found} is newer than supported schema {supported}")]
    StateTooNew {
        /// Schema found in the blob header
        found: u32,
        /// Schema this build writes
        supported: u32,
    },

    /// Reload blob payload is not text
    #[error("Player state payload is not UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Reload blob payload does not match its header
    #[error("Player state payload is {found} bytes, header says {expected}")]
    StateSize {
        /// Size recorded in the header
        expected: u64,
        /// Size actually present
        found: u64,
    },

    /// Invalid config value
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Sequencer error
    #[error("Sequencer error: {0}")]
    Sequencer(#[from] SequencerError),
}

impl From<SnapshotError> for PlayerError {
    fn from(e: SnapshotError) -> Self {
        Self::Sequencer(e.into())
    }
}

/// Result type for player operations
pub type Result<T> = std::result::Result<T, PlayerError>;
