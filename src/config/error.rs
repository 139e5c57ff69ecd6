//! Configuration error types.

use super::ConfigFormat;
use thiserror::Error;

/// A single integrity problem found in a set of state definitions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigViolation {
    #[error("No states declared")]
    NoStates,

    #[error("State at position {index} has an empty id")]
    EmptyStateId { index: usize },

    #[error("State '{id}' is declared more than once")]
    DuplicateState { id: String },

    #[error("Message '{message}' is declared more than once in state '{state}'")]
    DuplicateMessage { state: String, message: String },

    #[error("Transition '{message}' in state '{state}' has malformed spec '{spec}' (expected 'action:nextState')")]
    MalformedTransition {
        state: String,
        message: String,
        spec: String,
    },

    #[error("Transition '{message}' in state '{state}' targets unknown state '{target}'")]
    UnknownTargetState {
        state: String,
        message: String,
        target: String,
    },
}

/// Errors raised while loading a configuration.
///
/// All of these are fatal: a machine is never built from a configuration that
/// produced one.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The source could not be read.
    #[error("Failed to read configuration '{source_name}': {source}")]
    Io {
        source_name: String,
        #[source]
        source: std::io::Error,
    },

    /// The source was read but is not a well-formed document.
    #[error("Failed to parse {format} configuration '{source_name}': {message}")]
    Parse {
        source_name: String,
        format: ConfigFormat,
        message: String,
    },

    /// The source bytes are not UTF-8 text, so no format could be applied.
    #[error("Configuration '{source_name}' is not valid UTF-8: {message}")]
    Encoding {
        source_name: String,
        message: String,
    },

    /// The document parsed but its states do not form a valid machine.
    #[error("Invalid configuration: {}", render_violations(.0))]
    Invalid(Vec<ConfigViolation>),

    /// No parser exists for the source's format.
    #[error("Unsupported configuration format for '{0}'")]
    UnsupportedFormat(String),
}

impl ConfigError {
    /// The source could not be read; retrying or choosing another source may help.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// The document itself is broken; retrying the same source will not help.
    pub fn is_parse(&self) -> bool {
        matches!(
            self,
            Self::Parse { .. }
                | Self::Encoding { .. }
                | Self::Invalid(_)
                | Self::UnsupportedFormat(_)
        )
    }

    /// Violations carried by an [`Invalid`](Self::Invalid) error.
    pub fn violations(&self) -> &[ConfigViolation] {
        match self {
            Self::Invalid(violations) => violations,
            _ => &[],
        }
    }
}

fn render_violations(violations: &[ConfigViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
