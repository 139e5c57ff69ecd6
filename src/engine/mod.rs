//! Message-driven execution of a configured state machine.

pub mod error;
pub mod machine;

pub use error::{FsmError, Phase};
pub use machine::Fsm;
