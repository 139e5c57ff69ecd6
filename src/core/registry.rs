//! Ordered collection of states plus the current-state pointer.

use super::action::{SharedAction, SharedHook};
use super::state::{split_transition_spec, State, TransitionRecord};
use crate::config::validate::{into_result, validate_definitions};
use crate::config::{ConfigError, StateDefinition};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Which states a binding applies to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Scope {
    /// One state.
    Single(String),
    /// An explicit list of states.
    Many(Vec<String>),
    /// Every declared state.
    All,
}

impl Scope {
    pub fn single(id: impl Into<String>) -> Self {
        Self::Single(id.into())
    }

    pub fn many<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Many(ids.into_iter().map(Into::into).collect())
    }

    pub fn includes(&self, id: &str) -> bool {
        match self {
            Self::Single(single) => single == id,
            Self::Many(ids) => ids.iter().any(|candidate| candidate == id),
            Self::All => true,
        }
    }
}

impl From<&str> for Scope {
    fn from(id: &str) -> Self {
        Self::single(id)
    }
}

impl From<String> for Scope {
    fn from(id: String) -> Self {
        Self::Single(id)
    }
}

impl From<Vec<String>> for Scope {
    fn from(ids: Vec<String>) -> Self {
        Self::Many(ids)
    }
}

impl From<&[&str]> for Scope {
    fn from(ids: &[&str]) -> Self {
        Self::many(ids.iter().copied())
    }
}

/// All declared states, in declaration order, and which one is current.
///
/// The shape is fixed at construction. Only bindings and the current pointer
/// change afterwards.
pub struct StateRegistry<C> {
    states: Vec<State<C>>,
    index: HashMap<String, usize>,
    current: usize,
}

impl<C> StateRegistry<C> {
    /// Build the registry, splitting every `"action:nextState"` spec once.
    ///
    /// The first definition becomes the current state. Every integrity
    /// violation is reported together.
    pub fn from_definitions(definitions: &[StateDefinition]) -> Result<Self, ConfigError> {
        into_result(validate_definitions(definitions))?;

        let index: HashMap<String, usize> = definitions
            .iter()
            .enumerate()
            .map(|(slot, definition)| (definition.id.clone(), slot))
            .collect();

        let mut states = Vec::with_capacity(definitions.len());
        for definition in definitions {
            let mut transitions = BTreeMap::new();
            for (message, spec) in &definition.messages {
                // Validation guarantees a separator and a declared target.
                let Some((action_name, next_state)) = split_transition_spec(spec) else {
                    continue;
                };
                let Some(&target) = index.get(next_state) else {
                    continue;
                };
                transitions.insert(
                    message.clone(),
                    TransitionRecord::new(message.as_str(), action_name, next_state, target),
                );
            }
            states.push(State::new(definition.id.as_str(), transitions));
        }

        Ok(Self {
            states,
            index,
            current: 0,
        })
    }

    /// The current state. Never fails: a registry always holds at least one
    /// state.
    pub fn current_state(&self) -> &State<C> {
        &self.states[self.current]
    }

    /// Point the registry at another of its states.
    ///
    /// Returns `false`, leaving the current state untouched, when `id` is not
    /// a member.
    pub fn set_current_state(&mut self, id: &str) -> bool {
        match self.index.get(id) {
            Some(&slot) => {
                self.current = slot;
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_current_slot(&mut self, slot: usize) {
        self.current = slot;
    }

    /// All states in declaration order.
    pub fn all_states(&self) -> &[State<C>] {
        &self.states
    }

    pub fn state_ids(&self) -> impl Iterator<Item = &str> {
        self.states.iter().map(State::id)
    }

    pub fn find(&self, id: &str) -> Option<&State<C>> {
        self.index.get(id).map(|&slot| &self.states[slot])
    }

    pub(crate) fn state_at(&self, slot: usize) -> &State<C> {
        &self.states[slot]
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Bind `action` as the override for `message` in every selected state
    /// that declares it, replacing earlier overrides.
    ///
    /// Returns how many transitions were bound.
    pub fn bind_action(
        &mut self,
        scope: &Scope,
        message: &str,
        action: SharedAction<C>,
    ) -> usize {
        self.set_action(scope, message, Some(action))
    }

    /// Remove the override for `message` in the selected states.
    pub fn unbind_action(&mut self, scope: &Scope, message: &str) -> usize {
        self.set_action(scope, message, None)
    }

    fn set_action(
        &mut self,
        scope: &Scope,
        message: &str,
        action: Option<SharedAction<C>>,
    ) -> usize {
        let mut bound = 0;
        for state in self.selected_mut(scope) {
            if state.set_action(message, action.clone()) {
                bound += 1;
            }
        }
        bound
    }

    /// Bind the pre-transition hook of every selected state.
    pub fn bind_before_hook(&mut self, scope: &Scope, hook: SharedHook<C>) -> usize {
        let mut bound = 0;
        for state in self.selected_mut(scope) {
            state.set_before_hook(Some(hook.clone()));
            bound += 1;
        }
        bound
    }

    /// Bind the post-transition hook of every selected state.
    pub fn bind_after_hook(&mut self, scope: &Scope, hook: SharedHook<C>) -> usize {
        let mut bound = 0;
        for state in self.selected_mut(scope) {
            state.set_after_hook(Some(hook.clone()));
            bound += 1;
        }
        bound
    }

    /// Clear both hook slots of every selected state.
    pub fn clear_hooks(&mut self, scope: &Scope) -> usize {
        let mut cleared = 0;
        for state in self.selected_mut(scope) {
            state.set_before_hook(None);
            state.set_after_hook(None);
            cleared += 1;
        }
        cleared
    }

    fn selected_mut<'a>(
        &'a mut self,
        scope: &'a Scope,
    ) -> impl Iterator<Item = &'a mut State<C>> + 'a {
        self.states
            .iter_mut()
            .filter(move |state| scope.includes(state.id()))
    }
}

impl<C> fmt::Debug for StateRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateRegistry")
            .field("states", &self.states)
            .field("current", &self.current_state().id())
            .finish()
    }
}
