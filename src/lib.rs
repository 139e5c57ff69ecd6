//! Dynamicfsm: a configuration-driven finite state machine engine
//!
//! The machine's shape (states, messages and their targets) is loaded from a
//! document at startup. Behavior is bound afterwards: a host attaches actions
//! to transitions and hooks to states, then feeds message ids to the machine.
//!
//! # Core Concepts
//!
//! - **State**: A named node declaring which messages it reacts to
//! - **Action**: Host behavior deciding whether a transition commits
//! - **Hook**: Host behavior bracketing every attempt that targets a state
//! - **Default action**: Fallback used by transitions without an override
//!
//! # Example
//!
//! ```rust
//! use dynamicfsm::{action_fn, hook_fn, ConfigSource, Fsm, Scope};
//!
//! const MOVES: &str = r#"{"states": [
//!     {"id": "START", "messages": [
//!         {"id": "MOVELEFT", "action": "moveLeft", "nextState": "INTERMEDIATE"},
//!         {"id": "MOVERIGHT", "action": "moveRight", "nextState": "STOP"}]},
//!     {"id": "INTERMEDIATE", "messages": [
//!         {"id": "MOVELEFT", "action": "moveLeft", "nextState": "STOP"}]},
//!     {"id": "STOP"}]}"#;
//!
//! let source = ConfigSource::embedded("moves.json", MOVES);
//! let mut fsm: Fsm<u32> = Fsm::from_source(&source, None, 3).unwrap();
//!
//! // Only allow moving right once the budget runs out.
//! fsm.bind_action("START", "MOVERIGHT", action_fn(|_, budget: &u32| Ok(*budget == 0)));
//! fsm.bind_after_hook(Scope::All, hook_fn(|state, _: &u32| {
//!     println!("visited {}", state);
//!     Ok(())
//! }));
//!
//! fsm.process_message("MOVERIGHT").unwrap();
//! assert_eq!(fsm.current_state_id(), "START");
//!
//! fsm.process_message("MOVELEFT").unwrap();
//! assert_eq!(fsm.current_state_id(), "INTERMEDIATE");
//!
//! // Unknown messages are ignored.
//! assert!(fsm.process_message("JUMP").unwrap().is_none());
//! ```

pub mod builder;
pub mod checkpoint;
pub mod config;
pub mod core;
pub mod engine;

// Re-export commonly used types
pub use builder::{BuildError, FsmBuilder};
pub use checkpoint::{Checkpoint, CheckpointEncoding, CheckpointError};
pub use config::{ConfigError, ConfigFormat, ConfigSource, StateDefinition, StateLoader};
pub use self::core::{
    action_fn, hook_fn, Action, ActionError, Scope, SharedAction, SharedHook, State, StateHook,
    TransitionEvent, TransitionRecord,
};
pub use engine::{Fsm, FsmError, Phase};
