//! Checkpoint error types.

use crate::config::ConfigError;
use std::fmt;
use thiserror::Error;

/// Wire encoding of a checkpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckpointEncoding {
    Json,
    Bincode,
}

impl fmt::Display for CheckpointEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("JSON"),
            Self::Bincode => f.write_str("bincode"),
        }
    }
}

/// Errors raised while saving or restoring a checkpoint.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Failed to encode checkpoint {id} as {encoding}: {message}")]
    Serialization {
        id: String,
        encoding: CheckpointEncoding,
        message: String,
    },

    #[error("Failed to decode {encoding} checkpoint: {message}")]
    Deserialization {
        encoding: CheckpointEncoding,
        message: String,
    },

    #[error("Checkpoint {id} has version {found}, supported: {supported}")]
    UnsupportedVersion { id: String, found: u32, supported: u32 },

    /// The stored state table no longer forms a valid machine.
    #[error("Checkpoint {id} holds an invalid state table: {source}")]
    InvalidStates {
        id: String,
        #[source]
        source: ConfigError,
    },

    /// A state named by the checkpoint does not fit its state table.
    #[error("Checkpoint {id} is inconsistent at state '{state}': {reason}")]
    Validation {
        id: String,
        state: String,
        reason: String,
    },
}

impl CheckpointError {
    /// Offending state id, for [`Validation`](Self::Validation) errors.
    pub fn state(&self) -> Option<&str> {
        match self {
            Self::Validation { state, .. } => Some(state),
            _ => None,
        }
    }
}
