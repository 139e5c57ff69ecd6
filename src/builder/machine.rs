//! Builder for constructing machines.

use crate::builder::error::BuildError;
use crate::config::{ConfigFormat, ConfigSource, StateDefinition, StateLoader};
use crate::core::{Scope, SharedAction, SharedHook};
use crate::engine::Fsm;
use std::io::Read;

enum Binding<C> {
    Action {
        scope: Scope,
        message: String,
        action: SharedAction<C>,
    },
    BeforeHook(Scope, SharedHook<C>),
    AfterHook(Scope, SharedHook<C>),
}

/// Builder for constructing machines with a fluent API.
///
/// ```
/// use dynamicfsm::builder::FsmBuilder;
/// use dynamicfsm::config::StateDefinition;
/// use dynamicfsm::core::action_fn;
///
/// let mut fsm = FsmBuilder::new()
///     .definitions(vec![
///         StateDefinition::new("OFF").with_message("FLIP", "flip", "ON"),
///         StateDefinition::new("ON").with_message("FLIP", "flip", "OFF"),
///     ])
///     .default_action(action_fn(|_, _: &()| Ok(true)))
///     .history_limit(16)
///     .build()
///     .unwrap();
///
/// fsm.process_message("FLIP").unwrap();
/// assert_eq!(fsm.current_state_id(), "ON");
/// ```
pub struct FsmBuilder<C = ()> {
    loader: Option<Box<dyn StateLoader>>,
    default_action: Option<SharedAction<C>>,
    context: C,
    history_limit: Option<usize>,
    bindings: Vec<Binding<C>>,
}

impl<C: Default> FsmBuilder<C> {
    /// Create a new builder with a default context.
    pub fn new() -> Self {
        Self::with_context(C::default())
    }
}

impl<C: Default> Default for FsmBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> FsmBuilder<C> {
    /// Create a new builder around an explicit shared context.
    pub fn with_context(context: C) -> Self {
        Self {
            loader: None,
            default_action: None,
            context,
            history_limit: None,
            bindings: Vec::new(),
        }
    }

    /// Load states from a configuration source.
    pub fn source(self, source: ConfigSource) -> Self {
        self.loader(source)
    }

    /// Use already loaded definitions.
    pub fn definitions(self, definitions: Vec<StateDefinition>) -> Self {
        self.loader(definitions)
    }

    /// Drain a byte stream now and load states from it at build time.
    /// Returns an error if the stream cannot be read.
    pub fn reader<R: Read>(
        self,
        reader: R,
        format: Option<ConfigFormat>,
    ) -> Result<Self, BuildError> {
        let source = ConfigSource::from_reader(reader, format)?;
        Ok(self.source(source))
    }

    /// Load states through a custom loader.
    pub fn loader(mut self, loader: impl StateLoader + 'static) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    pub fn default_action(mut self, action: SharedAction<C>) -> Self {
        self.default_action = Some(action);
        self
    }

    /// Replace the shared context.
    pub fn context(mut self, context: C) -> Self {
        self.context = context;
        self
    }

    /// Record transition attempts, keeping at most `limit`.
    pub fn history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }

    /// Bind an override action once the states are loaded.
    pub fn bind_action(
        mut self,
        scope: impl Into<Scope>,
        message: impl Into<String>,
        action: SharedAction<C>,
    ) -> Self {
        self.bindings.push(Binding::Action {
            scope: scope.into(),
            message: message.into(),
            action,
        });
        self
    }

    pub fn before_hook(mut self, scope: impl Into<Scope>, hook: SharedHook<C>) -> Self {
        self.bindings.push(Binding::BeforeHook(scope.into(), hook));
        self
    }

    pub fn after_hook(mut self, scope: impl Into<Scope>, hook: SharedHook<C>) -> Self {
        self.bindings.push(Binding::AfterHook(scope.into(), hook));
        self
    }

    /// Build the machine.
    /// Returns an error if no configuration was given or it fails to load.
    pub fn build(self) -> Result<Fsm<C>, BuildError> {
        let loader = self.loader.ok_or(BuildError::MissingSource)?;

        let mut fsm = Fsm::from_loader(loader.as_ref(), self.default_action, self.context)?;
        if let Some(limit) = self.history_limit {
            fsm.enable_history(limit);
        }

        for binding in self.bindings {
            match binding {
                Binding::Action {
                    scope,
                    message,
                    action,
                } => {
                    fsm.bind_action(scope, &message, action);
                }
                Binding::BeforeHook(scope, hook) => {
                    fsm.bind_before_hook(scope, hook);
                }
                Binding::AfterHook(scope, hook) => {
                    fsm.bind_after_hook(scope, hook);
                }
            }
        }

        Ok(fsm)
    }
}
