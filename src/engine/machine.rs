//! State machine driven by message identifiers.

use crate::config::{ConfigError, ConfigFormat, ConfigSource, StateDefinition, StateLoader};
use crate::core::{
    SharedAction, SharedHook, Scope, State, StateHistory, StateRegistry, TransitionAttempt,
    TransitionEvent, TransitionRecord,
};
use crate::engine::error::{FsmError, Phase};
use chrono::Utc;
use std::fmt;
use std::io::Read;
use tracing::{debug, trace, warn};

/// A configured state machine.
///
/// `C` is the shared context handed by reference to every action and hook.
/// The machine never inspects it.
///
/// # Concurrency
///
/// The machine is synchronous and holds no locks. [`process_message`]
/// takes `&mut self`, so at most one attempt is ever in flight per machine.
/// Hosts that share a machine across threads serialize access themselves,
/// e.g. with a `Mutex<Fsm<C>>` or one machine per session.
///
/// [`process_message`]: Fsm::process_message
pub struct Fsm<C = ()> {
    registry: StateRegistry<C>,
    default_action: Option<SharedAction<C>>,
    context: C,
    history: Option<StateHistory>,
}

impl<C> Fsm<C> {
    /// Create a machine over an already built registry.
    pub fn new(registry: StateRegistry<C>, default_action: Option<SharedAction<C>>, context: C) -> Self {
        Self {
            registry,
            default_action,
            context,
            history: None,
        }
    }

    /// Build from loaded definitions. The first definition is the initial state.
    pub fn from_definitions(
        definitions: &[StateDefinition],
        default_action: Option<SharedAction<C>>,
        context: C,
    ) -> Result<Self, ConfigError> {
        let registry = StateRegistry::from_definitions(definitions)?;
        Ok(Self::new(registry, default_action, context))
    }

    /// Build from any [`StateLoader`].
    pub fn from_loader<L>(
        loader: &L,
        default_action: Option<SharedAction<C>>,
        context: C,
    ) -> Result<Self, ConfigError>
    where
        L: StateLoader + ?Sized,
    {
        let definitions = loader.load_states()?;
        Self::from_definitions(&definitions, default_action, context)
    }

    /// Build from a named configuration source (file or embedded document).
    pub fn from_source(
        source: &ConfigSource,
        default_action: Option<SharedAction<C>>,
        context: C,
    ) -> Result<Self, ConfigError> {
        Self::from_loader(source, default_action, context)
    }

    /// Build from a raw byte stream. `format: None` sniffs the content.
    pub fn from_reader<R: Read>(
        reader: R,
        format: Option<ConfigFormat>,
        default_action: Option<SharedAction<C>>,
        context: C,
    ) -> Result<Self, ConfigError> {
        let source = ConfigSource::from_reader(reader, format)?;
        Self::from_source(&source, default_action, context)
    }

    /// Feed one message to the machine.
    ///
    /// Returns `Ok(None)` without side effects when the current state does
    /// not declare `message`. Otherwise runs the attempt and returns the
    /// transition record that was tried; compare its
    /// [`next_state`](TransitionRecord::next_state) with
    /// [`current_state_id`](Fsm::current_state_id) to tell whether it
    /// committed.
    ///
    /// Attempt sequence:
    ///
    /// 1. target state's before hook
    /// 2. action resolution: override, else default action, else none
    /// 3. `entry` then `run` (only with an action)
    /// 4. commit when `run` returned `true`, or when there is no action;
    ///    `after_transition` follows a commit
    /// 5. `exit` (only with an action, committed or not)
    /// 6. target state's after hook
    ///
    /// A failing callback aborts the remaining steps and surfaces as
    /// [`FsmError::Callback`]. Nothing commits before `run` returns.
    pub fn process_message(
        &mut self,
        message: &str,
    ) -> Result<Option<TransitionRecord<C>>, FsmError> {
        let Some(record) = self.registry.current_state().transition(message).cloned() else {
            debug!(
                state = %self.current_state_id(),
                message,
                "Message not declared for current state; ignoring"
            );
            return Ok(None);
        };

        let target_state = self.registry.state_at(record.target);
        let before_hook = target_state.before_hook().cloned();
        let after_hook = target_state.after_hook().cloned();
        let target = record.next_state();
        let origin = self.current_state_id().to_string();

        if let Some(hook) = before_hook {
            trace!(state = target, message, "Running before hook");
            hook.apply(target, &self.context)
                .map_err(|source| self.fault(Phase::BeforeHook, target, message, source))?;
        }

        let action = record
            .override_action()
            .or(self.default_action.as_ref())
            .cloned();

        let committed = match &action {
            Some(action) => {
                let event = TransitionEvent::new(&origin, message, target);
                action
                    .entry(&event, &self.context)
                    .map_err(|source| self.fault(Phase::Entry, &origin, message, source))?;
                action
                    .run(&event, &self.context)
                    .map_err(|source| self.fault(Phase::Run, &origin, message, source))?
            }
            None => {
                trace!(state = %origin, message, "No action bound; committing");
                true
            }
        };

        if committed {
            self.registry.set_current_slot(record.target);
            debug!(from = %origin, to = target, message, "Transition committed");
        } else {
            debug!(from = %origin, to = target, message, "Transition rejected by action");
        }
        self.record_attempt(&origin, message, target, committed);

        if let Some(action) = &action {
            if committed {
                let event = TransitionEvent::new(target, message, target);
                action
                    .after_transition(&event, &self.context)
                    .map_err(|source| self.fault(Phase::AfterTransition, target, message, source))?;
            }

            let current = self.current_state_id();
            let event = TransitionEvent::new(current, message, target);
            action
                .exit(&event, &self.context)
                .map_err(|source| self.fault(Phase::Exit, current, message, source))?;
        }

        if let Some(hook) = after_hook {
            trace!(state = target, message, "Running after hook");
            hook.apply(target, &self.context)
                .map_err(|source| self.fault(Phase::AfterHook, target, message, source))?;
        }

        Ok(Some(record))
    }

    fn fault(&self, phase: Phase, state: &str, message: &str, source: crate::core::ActionError) -> FsmError {
        warn!(%phase, state, message, error = %source, "Callback failed; aborting attempt");
        FsmError::callback(phase, state, message, source)
    }

    fn record_attempt(&mut self, from: &str, message: &str, to: &str, committed: bool) {
        if let Some(history) = self.history.as_mut() {
            history.record(TransitionAttempt {
                from: from.to_string(),
                message: message.to_string(),
                to: to.to_string(),
                committed,
                timestamp: Utc::now(),
            });
        }
    }

    /// Id of the current state.
    pub fn current_state_id(&self) -> &str {
        self.registry.current_state().id()
    }

    pub fn current_state(&self) -> &State<C> {
        self.registry.current_state()
    }

    /// Move the machine to another declared state without running any
    /// callbacks.
    pub fn set_current_state(&mut self, id: &str) -> Result<(), FsmError> {
        if self.registry.set_current_state(id) {
            Ok(())
        } else {
            Err(FsmError::UnknownState { id: id.to_string() })
        }
    }

    /// State ids in declaration order.
    pub fn state_ids(&self) -> Vec<&str> {
        self.registry.state_ids().collect()
    }

    pub fn all_states(&self) -> &[State<C>] {
        self.registry.all_states()
    }

    pub fn registry(&self) -> &StateRegistry<C> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut StateRegistry<C> {
        &mut self.registry
    }

    pub fn shared_context(&self) -> &C {
        &self.context
    }

    pub fn shared_context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    /// Replace the shared context for all later callbacks.
    pub fn set_shared_context(&mut self, context: C) {
        self.context = context;
    }

    pub fn default_action(&self) -> Option<&SharedAction<C>> {
        self.default_action.as_ref()
    }

    /// Replace the fallback action used by transitions without an override.
    pub fn set_default_action(&mut self, action: SharedAction<C>) {
        self.default_action = Some(action);
    }

    pub fn clear_default_action(&mut self) {
        self.default_action = None;
    }

    /// Bind an override action for `message` in the selected states.
    /// Returns how many transitions were bound.
    pub fn bind_action(
        &mut self,
        scope: impl Into<Scope>,
        message: &str,
        action: SharedAction<C>,
    ) -> usize {
        self.registry.bind_action(&scope.into(), message, action)
    }

    pub fn unbind_action(&mut self, scope: impl Into<Scope>, message: &str) -> usize {
        self.registry.unbind_action(&scope.into(), message)
    }

    /// Bind the hook run before any attempt that targets a selected state.
    pub fn bind_before_hook(&mut self, scope: impl Into<Scope>, hook: SharedHook<C>) -> usize {
        self.registry.bind_before_hook(&scope.into(), hook)
    }

    /// Bind the hook run after any attempt that targets a selected state.
    pub fn bind_after_hook(&mut self, scope: impl Into<Scope>, hook: SharedHook<C>) -> usize {
        self.registry.bind_after_hook(&scope.into(), hook)
    }

    pub fn clear_hooks(&mut self, scope: impl Into<Scope>) -> usize {
        self.registry.clear_hooks(&scope.into())
    }

    /// Start recording attempts, keeping at most `limit`. Replaces any
    /// existing history.
    pub fn enable_history(&mut self, limit: usize) {
        self.history = Some(StateHistory::with_limit(limit));
    }

    pub fn disable_history(&mut self) {
        self.history = None;
    }

    pub fn history(&self) -> Option<&StateHistory> {
        self.history.as_ref()
    }

    pub(crate) fn set_history(&mut self, history: Option<StateHistory>) {
        self.history = history;
    }
}

impl<C> fmt::Debug for Fsm<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fsm")
            .field("registry", &self.registry)
            .field("default_action", &self.default_action.is_some())
            .field("history", &self.history)
            .finish_non_exhaustive()
    }
}
