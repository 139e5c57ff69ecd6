//! Host-supplied behavior invoked around transition attempts.
//!
//! Two capabilities exist:
//!
//! - [`Action`]: bound to a transition (or installed as the machine-wide default).
//!   Its `run` result decides whether the transition commits.
//! - [`StateHook`]: bound to a state's pre/post slot. Hooks observe every attempt
//!   that targets the state and can never veto it.
//!
//! Both traits are implemented for plain closures, so simple behavior does not
//! need a dedicated type.

use std::sync::Arc;
use thiserror::Error;

/// Failure raised from inside host-supplied action or hook code.
///
/// The machine never catches or translates these; they abort the current
/// attempt and surface to the caller of `process_message`.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ActionError {
    /// Create a failure from a message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

impl From<String> for ActionError {
    fn from(message: String) -> Self {
        Self::Failed(message)
    }
}

impl From<&str> for ActionError {
    fn from(message: &str) -> Self {
        Self::Failed(message.to_string())
    }
}

/// The three identifiers every action callback receives.
///
/// `current_state` is the machine's current state *at the time of the call*:
/// during `after_transition` it already equals `next_state`, and during `exit`
/// it reflects the outcome of the commit decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransitionEvent<'a> {
    pub current_state: &'a str,
    pub message: &'a str,
    pub next_state: &'a str,
}

impl<'a> TransitionEvent<'a> {
    pub fn new(current_state: &'a str, message: &'a str, next_state: &'a str) -> Self {
        Self {
            current_state,
            message,
            next_state,
        }
    }

    /// True when the attempt loops back to the state it started from.
    pub fn is_self_loop(&self) -> bool {
        self.current_state == self.next_state
    }
}

/// Behavior executed during a transition attempt.
///
/// Only [`run`](Action::run) is mandatory. The other callbacks default to
/// no-ops.
///
/// Call order for one attempt:
///
/// 1. `entry` - immediately before `run`
/// 2. `run` - returns whether the transition commits
/// 3. `after_transition` - only when `run` returned `true`, after the commit
/// 4. `exit` - always, after the commit decision
///
/// # Example
///
/// ```rust
/// use dynamicfsm::core::{Action, ActionError, TransitionEvent};
///
/// struct OnlyForward;
///
/// impl Action<()> for OnlyForward {
///     fn run(&self, event: &TransitionEvent<'_>, _ctx: &()) -> Result<bool, ActionError> {
///         Ok(!event.is_self_loop())
///     }
/// }
///
/// let event = TransitionEvent::new("START", "MOVE", "START");
/// assert!(!OnlyForward.run(&event, &()).unwrap());
/// ```
pub trait Action<C>: Send + Sync {
    /// Perform the side effect and report whether the transition should commit.
    fn run(&self, event: &TransitionEvent<'_>, context: &C) -> Result<bool, ActionError>;

    /// Called immediately before [`run`](Action::run).
    fn entry(&self, _event: &TransitionEvent<'_>, _context: &C) -> Result<(), ActionError> {
        Ok(())
    }

    /// Called only after a successful commit.
    fn after_transition(
        &self,
        _event: &TransitionEvent<'_>,
        _context: &C,
    ) -> Result<(), ActionError> {
        Ok(())
    }

    /// Called after the commit decision, whether or not it succeeded.
    fn exit(&self, _event: &TransitionEvent<'_>, _context: &C) -> Result<(), ActionError> {
        Ok(())
    }
}

impl<C, F> Action<C> for F
where
    F: Fn(&TransitionEvent<'_>, &C) -> Result<bool, ActionError> + Send + Sync,
{
    fn run(&self, event: &TransitionEvent<'_>, context: &C) -> Result<bool, ActionError> {
        self(event, context)
    }
}

/// Behavior bound to a state's pre- or post-transition slot.
///
/// Receives the id of the state it is bound to. Hooks have no say in whether
/// a transition commits.
pub trait StateHook<C>: Send + Sync {
    fn apply(&self, state_id: &str, context: &C) -> Result<(), ActionError>;
}

impl<C, F> StateHook<C> for F
where
    F: Fn(&str, &C) -> Result<(), ActionError> + Send + Sync,
{
    fn apply(&self, state_id: &str, context: &C) -> Result<(), ActionError> {
        self(state_id, context)
    }
}

/// Shared handle to an action. The host keeps ownership; the machine only
/// holds references.
pub type SharedAction<C> = Arc<dyn Action<C>>;

/// Shared handle to a state hook.
pub type SharedHook<C> = Arc<dyn StateHook<C>>;

/// Wrap a closure as a [`SharedAction`].
///
/// Passing the closure through this function pins down its argument types, so
/// no annotations are needed at the call site.
pub fn action_fn<C, F>(f: F) -> SharedAction<C>
where
    F: Fn(&TransitionEvent<'_>, &C) -> Result<bool, ActionError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a closure as a [`SharedHook`].
pub fn hook_fn<C, F>(f: F) -> SharedHook<C>
where
    F: Fn(&str, &C) -> Result<(), ActionError> + Send + Sync + 'static,
{
    Arc::new(f)
}
