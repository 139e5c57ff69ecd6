//! Builder API for ergonomic machine construction.
//!
//! Collects the configuration origin, capabilities and context in one
//! fluent chain and hands back a ready [`Fsm`](crate::engine::Fsm).

pub mod error;
pub mod machine;

pub use error::BuildError;
pub use machine::FsmBuilder;
