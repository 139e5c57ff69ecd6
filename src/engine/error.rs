//! Errors raised while driving a machine.

use crate::core::ActionError;
use std::fmt;
use thiserror::Error;

/// Lifecycle step during which a host callback failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    BeforeHook,
    Entry,
    Run,
    AfterTransition,
    Exit,
    AfterHook,
}

impl Phase {
    /// True for steps that run before the commit decision. A failure there
    /// leaves the current state untouched.
    pub fn precedes_commit(self) -> bool {
        matches!(self, Self::BeforeHook | Self::Entry | Self::Run)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BeforeHook => "before hook",
            Self::Entry => "entry",
            Self::Run => "run",
            Self::AfterTransition => "after transition",
            Self::Exit => "exit",
            Self::AfterHook => "after hook",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while operating a machine.
#[derive(Debug, Error)]
pub enum FsmError {
    #[error("State '{id}' is not declared in this machine")]
    UnknownState { id: String },

    /// A host callback failed. The rest of the attempt was skipped.
    #[error("{phase} callback failed in state '{state}' on message '{message}': {source}")]
    Callback {
        phase: Phase,
        state: String,
        message: String,
        #[source]
        source: ActionError,
    },
}

impl FsmError {
    pub(crate) fn callback(phase: Phase, state: &str, message: &str, source: ActionError) -> Self {
        Self::Callback {
            phase,
            state: state.to_string(),
            message: message.to_string(),
            source,
        }
    }

    /// Lifecycle step that failed, for callback errors.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::Callback { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_error_names_phase_and_cause() {
        let err = FsmError::callback(Phase::Run, "START", "MOVE", ActionError::failed("boom"));
        assert_eq!(
            err.to_string(),
            "run callback failed in state 'START' on message 'MOVE': boom"
        );
        assert_eq!(err.phase(), Some(Phase::Run));
    }

    #[test]
    fn commit_boundary() {
        assert!(Phase::BeforeHook.precedes_commit());
        assert!(Phase::Run.precedes_commit());
        assert!(!Phase::AfterTransition.precedes_commit());
        assert!(!Phase::AfterHook.precedes_commit());
    }
}
