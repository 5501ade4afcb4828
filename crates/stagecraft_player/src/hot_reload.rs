// SPDX-License-Identifier: MIT OR Apache-2.0
//! Carrying player state across a code reload.
//!
//! Before the host swaps in new code it calls [`encode`] and keeps the blob;
//! afterwards [`decode`] turns it back into a scene and a sequencer snapshot.
//! The blob is a bincode envelope holding a small header and a RON payload:
//!
//! - `header.schema`: [`STATE_SCHEMA`] of the build that wrote it
//! - `header.size`: payload length in bytes
//! - `payload`: [`PersistedState`] as RON text, so fields added in later
//!   schemas default-fill when older payloads are read
//!
//! Schema history:
//! - 1: scene without camera
//! - 2: adds `Scene::camera`

use crate::error::{PlayerError, Result};
use crate::scene::Scene;
use serde::{Deserialize, Serialize};
use stagecraft_sequencer::{Sequencer, SequencerSnapshot};

/// Current player state schema
pub const STATE_SCHEMA: u32 = 2;

/// Fixed-layout prefix of a reload blob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateHeader {
    /// Schema of the payload
    pub schema: u32,
    /// Payload length in bytes
    pub size: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct StateBlob {
    header: StateHeader,
    payload: Vec<u8>,
}

/// Everything that survives a reload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedState {
    /// Host scene
    pub scene: Scene,
    /// Thread cursors, waits, barrier arrivals and locals
    pub sequencer: SequencerSnapshot,
}

/// Pack the scene and the sequencer into a reload blob
pub fn encode(scene: &Scene, sequencer: &Sequencer) -> Result<Vec<u8>> {
    let state = PersistedState {
        scene: scene.clone(),
        sequencer: sequencer.snapshot()?,
    };
    let payload = ron::to_string(&state)?.into_bytes();
    let blob = StateBlob {
        header: StateHeader {
            schema: STATE_SCHEMA,
            size: payload.len() as u64,
        },
        payload,
    };

    let bytes = bincode::serialize(&blob)?;
    tracing::debug!(bytes = bytes.len(), threads = state.sequencer.threads.len(), "Encoded player state");
    Ok(bytes)
}

/// Read just the header of a reload blob
pub fn peek_header(bytes: &[u8]) -> Result<StateHeader> {
    Ok(bincode::deserialize(bytes)?)
}

/// Unpack a reload blob, upgrading older schemas.
///
/// `screen_size` is used to rebuild state that older schemas did not keep.
pub fn decode(bytes: &[u8], screen_size: [f32; 2]) -> Result<PersistedState> {
    let blob: StateBlob = bincode::deserialize(bytes)?;
    let StateHeader { schema, size } = blob.header;

    if schema > STATE_SCHEMA {
        return Err(PlayerError::StateTooNew {
            found: schema,
            supported: STATE_SCHEMA,
        });
    }
    if blob.payload.len() as u64 != size {
        return Err(PlayerError::StateSize {
            expected: size,
            found: blob.payload.len() as u64,
        });
    }

    let text = std::str::from_utf8(&blob.payload)?;
    let mut state: PersistedState = ron::from_str(text)?;
    state.sequencer = state.sequencer.upgrade()?;

    if schema < STATE_SCHEMA {
        tracing::info!("Migrating player state schema {} -> {}", schema, STATE_SCHEMA);
        migrate(&mut state, schema, screen_size);
    }
    Ok(state)
}

fn migrate(state: &mut PersistedState, from: u32, screen_size: [f32; 2]) {
    if from < 2 {
        // camera was not persisted
        state.scene.fit_camera(screen_size);
    }
}
