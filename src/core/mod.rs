//! Core data model of the state machine.
//!
//! - [`State`] and [`TransitionRecord`]: the shape loaded from configuration
//! - [`StateRegistry`]: ordered states plus the current-state pointer
//! - [`Action`] and [`StateHook`]: host-supplied behavior
//! - [`StateHistory`]: optional log of transition attempts

mod action;
mod history;
mod registry;
mod state;

pub use action::{
    action_fn, hook_fn, Action, ActionError, SharedAction, SharedHook, StateHook,
    TransitionEvent,
};
pub use history::{StateHistory, TransitionAttempt};
pub use registry::{Scope, StateRegistry};
pub use state::{split_transition_spec, State, TransitionRecord};
