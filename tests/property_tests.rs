//! Property-based tests for the machine engine.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated message sequences and configurations.

use dynamicfsm::{
    action_fn, hook_fn, Action, ActionError, Checkpoint, Fsm, Scope, SharedAction,
    StateDefinition, TransitionEvent,
};
use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const MESSAGES: [&str; 4] = ["MOVE", "MOVELEFT", "MOVERIGHT", "FOO"];

fn definitions() -> Vec<StateDefinition> {
    vec![
        StateDefinition::new("START")
            .with_message("MOVE", "move", "START")
            .with_message("MOVELEFT", "moveLeft", "INTERMEDIATE")
            .with_message("MOVERIGHT", "moveRight", "STOP"),
        StateDefinition::new("INTERMEDIATE")
            .with_message("MOVELEFT", "moveLeft", "STOP")
            .with_message("MOVERIGHT", "moveRight", "ANKIT"),
        StateDefinition::new("STOP").with_message("MOVE", "move", "START"),
        StateDefinition::new("ANKIT").with_message("MOVELEFT", "moveLeft", "INTERMEDIATE"),
    ]
}

/// Expected target of `message` from `state`, straight from the definitions.
fn expected_target(state: &str, message: &str) -> Option<String> {
    let table: HashMap<String, StateDefinition> = definitions()
        .into_iter()
        .map(|definition| (definition.id.clone(), definition))
        .collect();
    let spec = table.get(state)?.messages.get(message)?;
    spec.split_once(':').map(|(_, next)| next.to_string())
}

/// Commits according to the verdict carried in the shared context.
#[derive(Default)]
struct Counting {
    runs: AtomicUsize,
    afters: AtomicUsize,
    exits: AtomicUsize,
}

impl Action<bool> for Counting {
    fn run(&self, _: &TransitionEvent<'_>, verdict: &bool) -> Result<bool, ActionError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(*verdict)
    }

    fn after_transition(&self, _: &TransitionEvent<'_>, _: &bool) -> Result<(), ActionError> {
        self.afters.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn exit(&self, _: &TransitionEvent<'_>, _: &bool) -> Result<(), ActionError> {
        self.exits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

prop_compose! {
    fn arbitrary_step()(message in 0..MESSAGES.len(), verdict in any::<bool>()) -> (&'static str, bool) {
        (MESSAGES[message], verdict)
    }
}

/// Shared context carrying the next verdict and every callback made so far.
#[derive(Default)]
struct Session {
    verdict: bool,
    calls: Mutex<Vec<String>>,
}

impl Session {
    fn note(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

struct Recording;

impl Action<Session> for Recording {
    fn run(&self, event: &TransitionEvent<'_>, session: &Session) -> Result<bool, ActionError> {
        session.note(format!("run {} {}", event.current_state, event.message));
        Ok(session.verdict)
    }

    fn entry(&self, event: &TransitionEvent<'_>, session: &Session) -> Result<(), ActionError> {
        session.note(format!("entry {} {}", event.current_state, event.message));
        Ok(())
    }

    fn after_transition(
        &self,
        event: &TransitionEvent<'_>,
        session: &Session,
    ) -> Result<(), ActionError> {
        session.note(format!("after {} {}", event.current_state, event.message));
        Ok(())
    }

    fn exit(&self, event: &TransitionEvent<'_>, session: &Session) -> Result<(), ActionError> {
        session.note(format!("exit {} {}", event.current_state, event.message));
        Ok(())
    }
}

/// Run `steps` on a fresh machine, returning visited states and the call log.
fn drive(steps: &[(&str, bool)]) -> (Vec<String>, Vec<String>) {
    let action: SharedAction<Session> = Arc::new(Recording);
    let mut fsm = Fsm::from_definitions(&definitions(), Some(action), Session::default()).unwrap();
    fsm.bind_before_hook(
        Scope::All,
        hook_fn(|state, session: &Session| {
            session.note(format!("before {}", state));
            Ok(())
        }),
    );
    fsm.bind_after_hook(
        Scope::All,
        hook_fn(|state, session: &Session| {
            session.note(format!("afterHook {}", state));
            Ok(())
        }),
    );

    let visited = steps
        .iter()
        .map(|(message, verdict)| {
            fsm.shared_context_mut().verdict = *verdict;
            fsm.process_message(message).unwrap();
            fsm.current_state_id().to_string()
        })
        .collect();
    let calls = std::mem::take(&mut *fsm.shared_context().calls.lock().unwrap());
    (visited, calls)
}

proptest! {
    #[test]
    fn processing_is_deterministic(steps in prop::collection::vec(arbitrary_step(), 0..40)) {
        let (first_states, first_calls) = drive(&steps);
        let (second_states, second_calls) = drive(&steps);
        prop_assert_eq!(first_states, second_states);
        prop_assert_eq!(first_calls, second_calls);
    }

    #[test]
    fn commit_happens_iff_run_succeeds(steps in prop::collection::vec(arbitrary_step(), 0..40)) {
        let mut fsm = Fsm::from_definitions(
            &definitions(),
            Some(action_fn(|_, verdict: &bool| Ok(*verdict))),
            false,
        )
        .unwrap();

        for (message, verdict) in steps {
            let before = fsm.current_state_id().to_string();
            fsm.set_shared_context(verdict);
            let record = fsm.process_message(message).unwrap();

            match expected_target(&before, message) {
                None => {
                    prop_assert!(record.is_none());
                    prop_assert_eq!(fsm.current_state_id(), before.as_str());
                }
                Some(target) => {
                    let record = record.unwrap();
                    prop_assert_eq!(record.next_state(), target.as_str());
                    let expected = if verdict { target.as_str() } else { before.as_str() };
                    prop_assert_eq!(fsm.current_state_id(), expected);
                }
            }
        }
    }

    #[test]
    fn machine_without_actions_always_commits(
        messages in prop::collection::vec(0..MESSAGES.len(), 0..40)
    ) {
        let mut fsm: Fsm = Fsm::from_definitions(&definitions(), None, ()).unwrap();

        for index in messages {
            let message = MESSAGES[index];
            let before = fsm.current_state_id().to_string();
            fsm.process_message(message).unwrap();
            let expected = expected_target(&before, message).unwrap_or(before);
            prop_assert_eq!(fsm.current_state_id(), expected.as_str());
        }
    }

    #[test]
    fn exit_always_runs_and_after_transition_only_on_commit(
        steps in prop::collection::vec(arbitrary_step(), 0..40)
    ) {
        let counting = Arc::new(Counting::default());
        let action: SharedAction<bool> = counting.clone();
        let mut fsm = Fsm::from_definitions(&definitions(), Some(action), false).unwrap();
        fsm.enable_history(steps.len());

        for (message, verdict) in &steps {
            fsm.set_shared_context(*verdict);
            fsm.process_message(message).unwrap();
        }

        let history = fsm.history().unwrap();
        let handled = history.len();
        let committed = history.committed().count();
        prop_assert_eq!(counting.runs.load(Ordering::SeqCst), handled);
        prop_assert_eq!(counting.exits.load(Ordering::SeqCst), handled);
        prop_assert_eq!(counting.afters.load(Ordering::SeqCst), committed);
    }

    #[test]
    fn history_never_exceeds_its_limit(
        limit in 0usize..8,
        messages in prop::collection::vec(0..MESSAGES.len(), 0..40)
    ) {
        let mut fsm: Fsm = Fsm::from_definitions(&definitions(), None, ()).unwrap();
        fsm.enable_history(limit);

        for index in messages {
            fsm.process_message(MESSAGES[index]).unwrap();
        }

        prop_assert!(fsm.history().unwrap().len() <= limit);
    }

    #[test]
    fn resume_preserves_position(messages in prop::collection::vec(0..MESSAGES.len(), 0..20)) {
        let mut fsm: Fsm = Fsm::from_definitions(&definitions(), None, ()).unwrap();
        for index in &messages {
            fsm.process_message(MESSAGES[*index]).unwrap();
        }

        let bytes = fsm.checkpoint().to_bytes().unwrap();
        let resumed: Fsm = Fsm::resume(Checkpoint::from_bytes(&bytes).unwrap(), None, ()).unwrap();

        prop_assert_eq!(resumed.current_state_id(), fsm.current_state_id());
        prop_assert_eq!(resumed.state_ids(), fsm.state_ids());
    }

    #[test]
    fn declared_targets_always_load(
        count in 1usize..6,
        edges in prop::collection::vec((0usize..6, 0usize..6), 0..12)
    ) {
        let mut definitions: Vec<StateDefinition> =
            (0..count).map(|i| StateDefinition::new(format!("S{}", i))).collect();
        for (n, (from, to)) in edges.iter().enumerate() {
            let target = format!("S{}", to % count);
            definitions[from % count] = definitions[from % count]
                .clone()
                .with_message(format!("M{}", n), "act", &target);
        }

        let fsm: Fsm = Fsm::from_definitions(&definitions, None, ()).unwrap();
        prop_assert_eq!(fsm.current_state_id(), "S0");
        prop_assert_eq!(fsm.state_ids().len(), count);
    }

    #[test]
    fn undeclared_target_is_always_rejected(count in 1usize..6, from in 0usize..6) {
        let mut definitions: Vec<StateDefinition> =
            (0..count).map(|i| StateDefinition::new(format!("S{}", i))).collect();
        definitions[from % count] = definitions[from % count]
            .clone()
            .with_message("LOST", "act", "MISSING");

        let err = Fsm::<()>::from_definitions(&definitions, None, ()).unwrap_err();
        prop_assert_eq!(err.violations().len(), 1);
    }
}
