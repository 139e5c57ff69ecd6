//! Build errors for the machine builder.

use crate::config::ConfigError;
use thiserror::Error;

/// Errors that can occur when building a machine.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("No configuration specified. Call .source(), .definitions(), .reader() or .loader() before .build()")]
    MissingSource,

    #[error(transparent)]
    Config(#[from] ConfigError),
}
