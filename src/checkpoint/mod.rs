//! Checkpoint and resume for machines.
//!
//! A checkpoint captures the machine's shape, its current state and any
//! recorded history, so a long-running session can survive a process
//! restart. Actions, hooks and the shared context are host capabilities and
//! are never captured; the host supplies them again on resume.

use crate::config::StateDefinition;
use crate::core::{SharedAction, State, StateHistory, StateRegistry};
use crate::engine::Fsm;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

pub mod error;

pub use error::{CheckpointEncoding, CheckpointError};

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable snapshot of a machine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: String,

    /// When checkpoint was created
    pub timestamp: DateTime<Utc>,

    /// Declared states in declaration order
    pub states: Vec<StateDefinition>,

    /// Initial state of the machine
    pub initial_state: String,

    /// Current state of the machine
    pub current_state: String,

    /// Recorded attempts, when history was enabled
    pub history: Option<StateHistory>,
}

impl Checkpoint {
    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| self.encode_failed(CheckpointEncoding::Json, e))
    }

    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        serde_json::from_str(json).map_err(|e| decode_failed(CheckpointEncoding::Json, e))
    }

    /// Compact binary encoding.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| self.encode_failed(CheckpointEncoding::Bincode, e))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CheckpointError> {
        bincode::deserialize(bytes).map_err(|e| decode_failed(CheckpointEncoding::Bincode, e))
    }

    fn encode_failed(&self, encoding: CheckpointEncoding, error: impl ToString) -> CheckpointError {
        CheckpointError::Serialization {
            id: self.id.clone(),
            encoding,
            message: error.to_string(),
        }
    }

    fn inconsistent(&self, state: &str, reason: &str) -> CheckpointError {
        CheckpointError::Validation {
            id: self.id.clone(),
            state: state.to_string(),
            reason: reason.to_string(),
        }
    }
}

fn decode_failed(encoding: CheckpointEncoding, error: impl ToString) -> CheckpointError {
    CheckpointError::Deserialization {
        encoding,
        message: error.to_string(),
    }
}

fn definition_of<C>(state: &State<C>) -> StateDefinition {
    StateDefinition {
        id: state.id().to_string(),
        messages: state
            .transitions()
            .map(|record| (record.message().to_string(), record.encoded()))
            .collect(),
    }
}

impl<C> Fsm<C> {
    /// Snapshot the machine's shape, current state and history.
    pub fn checkpoint(&self) -> Checkpoint {
        let states: Vec<StateDefinition> = self.all_states().iter().map(definition_of).collect();
        let initial_state = states
            .first()
            .map(|definition| definition.id.clone())
            .unwrap_or_default();

        let checkpoint = Checkpoint {
            version: CHECKPOINT_VERSION,
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            states,
            initial_state,
            current_state: self.current_state_id().to_string(),
            history: self.history().cloned(),
        };
        debug!(
            id = %checkpoint.id,
            current = %checkpoint.current_state,
            "Created checkpoint"
        );
        checkpoint
    }

    /// Rebuild a machine from a checkpoint with fresh capabilities.
    ///
    /// The stored states go through the same validation as a loaded
    /// configuration. Override actions and hooks must be bound again.
    pub fn resume(
        checkpoint: Checkpoint,
        default_action: Option<SharedAction<C>>,
        context: C,
    ) -> Result<Self, CheckpointError> {
        if checkpoint.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                id: checkpoint.id,
                found: checkpoint.version,
                supported: CHECKPOINT_VERSION,
            });
        }

        let mut registry = StateRegistry::from_definitions(&checkpoint.states).map_err(|source| {
            CheckpointError::InvalidStates {
                id: checkpoint.id.clone(),
                source,
            }
        })?;

        if registry.current_state().id() != checkpoint.initial_state {
            return Err(checkpoint.inconsistent(
                &checkpoint.initial_state,
                "initial state is not the first declared state",
            ));
        }
        if !registry.set_current_state(&checkpoint.current_state) {
            return Err(checkpoint.inconsistent(
                &checkpoint.current_state,
                "current state is not declared",
            ));
        }

        let mut fsm = Fsm::new(registry, default_action, context);
        fsm.set_history(checkpoint.history);
        debug!(
            id = %checkpoint.id,
            current = %checkpoint.current_state,
            "Resumed from checkpoint"
        );
        Ok(fsm)
    }
}
