//! States and the transition records they own.
//!
//! A [`State`] is built once from a loaded definition and keeps its shape for
//! the lifetime of the machine. Only the bound actions and hooks change.

use super::action::{SharedAction, SharedHook};
use std::collections::BTreeMap;
use std::fmt;

/// Split an encoded `"actionName:nextStateId"` spec on its first `:`.
///
/// Returns `None` when the spec has no separator.
///
/// ```rust
/// use dynamicfsm::core::split_transition_spec;
///
/// assert_eq!(split_transition_spec("moveLeft:INTERMEDIATE"), Some(("moveLeft", "INTERMEDIATE")));
/// assert_eq!(split_transition_spec("a:b:c"), Some(("a", "b:c")));
/// assert_eq!(split_transition_spec("STOP"), None);
/// ```
pub fn split_transition_spec(spec: &str) -> Option<(&str, &str)> {
    spec.split_once(':')
}

/// Resolved transition for one message declared on a state.
///
/// The target is resolved to a registry slot when the registry is built, so
/// processing a message never re-parses the encoded spec.
pub struct TransitionRecord<C> {
    message: String,
    action_name: String,
    next_state: String,
    pub(crate) target: usize,
    action: Option<SharedAction<C>>,
}

impl<C> TransitionRecord<C> {
    pub(crate) fn new(
        message: impl Into<String>,
        action_name: impl Into<String>,
        next_state: impl Into<String>,
        target: usize,
    ) -> Self {
        Self {
            message: message.into(),
            action_name: action_name.into(),
            next_state: next_state.into(),
            target,
            action: None,
        }
    }

    /// Message id that triggers this transition.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Action name declared in the configuration.
    ///
    /// Metadata only: behavior is bound by message id, never by this name.
    pub fn action_name(&self) -> &str {
        &self.action_name
    }

    /// Id of the state this transition moves to.
    pub fn next_state(&self) -> &str {
        &self.next_state
    }

    /// Per-transition override action, if one is bound.
    pub fn override_action(&self) -> Option<&SharedAction<C>> {
        self.action.as_ref()
    }

    pub(crate) fn set_override(&mut self, action: Option<SharedAction<C>>) {
        self.action = action;
    }

    /// Re-encode as `"actionName:nextStateId"`.
    pub fn encoded(&self) -> String {
        format!("{}:{}", self.action_name, self.next_state)
    }
}

impl<C> Clone for TransitionRecord<C> {
    fn clone(&self) -> Self {
        Self {
            message: self.message.clone(),
            action_name: self.action_name.clone(),
            next_state: self.next_state.clone(),
            target: self.target,
            action: self.action.clone(),
        }
    }
}

impl<C> fmt::Debug for TransitionRecord<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionRecord")
            .field("message", &self.message)
            .field("action_name", &self.action_name)
            .field("next_state", &self.next_state)
            .field("override_action", &self.action.is_some())
            .finish()
    }
}

/// A named node of the machine.
pub struct State<C> {
    id: String,
    transitions: BTreeMap<String, TransitionRecord<C>>,
    before_hook: Option<SharedHook<C>>,
    after_hook: Option<SharedHook<C>>,
}

impl<C> State<C> {
    pub(crate) fn new(id: impl Into<String>, transitions: BTreeMap<String, TransitionRecord<C>>) -> Self {
        Self {
            id: id.into(),
            transitions,
            before_hook: None,
            after_hook: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Transition declared for `message`, if any.
    pub fn transition(&self, message: &str) -> Option<&TransitionRecord<C>> {
        self.transitions.get(message)
    }

    /// All transitions, ordered by message id.
    pub fn transitions(&self) -> impl Iterator<Item = &TransitionRecord<C>> {
        self.transitions.values()
    }

    pub fn handles(&self, message: &str) -> bool {
        self.transitions.contains_key(message)
    }

    /// True when no message is declared for this state.
    pub fn is_terminal(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn before_hook(&self) -> Option<&SharedHook<C>> {
        self.before_hook.as_ref()
    }

    pub fn after_hook(&self) -> Option<&SharedHook<C>> {
        self.after_hook.as_ref()
    }

    /// Replace the override action of `message`'s transition.
    ///
    /// Returns `false` (and binds nothing) when the message is not declared
    /// here.
    pub(crate) fn set_action(&mut self, message: &str, action: Option<SharedAction<C>>) -> bool {
        match self.transitions.get_mut(message) {
            Some(record) => {
                record.set_override(action);
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_before_hook(&mut self, hook: Option<SharedHook<C>>) {
        self.before_hook = hook;
    }

    pub(crate) fn set_after_hook(&mut self, hook: Option<SharedHook<C>>) {
        self.after_hook = hook;
    }
}

impl<C> fmt::Debug for State<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("id", &self.id)
            .field("transitions", &self.transitions)
            .field("before_hook", &self.before_hook.is_some())
            .field("after_hook", &self.after_hook.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::action::{action_fn, hook_fn};

    fn start_state() -> State<()> {
        let mut transitions = BTreeMap::new();
        transitions.insert("MOVE".to_string(), TransitionRecord::new("MOVE", "move", "START", 0));
        transitions.insert(
            "MOVELEFT".to_string(),
            TransitionRecord::new("MOVELEFT", "moveLeft", "INTERMEDIATE", 1),
        );
        State::new("START", transitions)
    }

    #[test]
    fn split_uses_first_separator_only() {
        assert_eq!(split_transition_spec("move:START"), Some(("move", "START")));
        assert_eq!(split_transition_spec(":START"), Some(("", "START")));
        assert_eq!(split_transition_spec("x:ns:STATE"), Some(("x", "ns:STATE")));
        assert_eq!(split_transition_spec("START"), None);
    }

    #[test]
    fn lookup_by_message() {
        let state = start_state();

        let record = state.transition("MOVELEFT").unwrap();
        assert_eq!(record.message(), "MOVELEFT");
        assert_eq!(record.action_name(), "moveLeft");
        assert_eq!(record.next_state(), "INTERMEDIATE");
        assert_eq!(record.encoded(), "moveLeft:INTERMEDIATE");
        assert!(state.transition("FOO").is_none());
        assert!(state.handles("MOVE"));
        assert!(!state.is_terminal());
    }

    #[test]
    fn binding_an_action_requires_a_declared_message() {
        let mut state = start_state();
        let action = action_fn(|_, _: &()| Ok(true));

        assert!(state.set_action("MOVE", Some(action.clone())));
        assert!(!state.set_action("MOVERIGHT", Some(action)));
        assert!(state.transition("MOVE").unwrap().override_action().is_some());
        assert!(state.transition("MOVELEFT").unwrap().override_action().is_none());

        assert!(state.set_action("MOVE", None));
        assert!(state.transition("MOVE").unwrap().override_action().is_none());
    }

    #[test]
    fn hook_slots_hold_a_single_hook() {
        let mut state = start_state();
        state.set_before_hook(Some(hook_fn(|_, _: &()| Ok(()))));
        state.set_after_hook(Some(hook_fn(|_, _: &()| Ok(()))));
        assert!(state.before_hook().is_some());
        assert!(state.after_hook().is_some());

        state.set_before_hook(None);
        assert!(state.before_hook().is_none());
    }

    #[test]
    fn debug_output_hides_callbacks() {
        let mut state = start_state();
        state.set_action("MOVE", Some(action_fn(|_, _: &()| Ok(true))));
        let rendered = format!("{:?}", state);
        assert!(rendered.contains("START"));
        assert!(rendered.contains("override_action: true"));
    }
}
