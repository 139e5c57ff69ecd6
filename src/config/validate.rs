//! Integrity checks over loaded state definitions.
//!
//! Every check runs and every violation is reported, so a broken document is
//! fixed in one pass instead of one error at a time.

use super::error::{ConfigError, ConfigViolation};
use super::StateDefinition;
use crate::core::split_transition_spec;
use std::collections::HashSet;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

type Check = Validation<(), NonEmptyVec<ConfigViolation>>;

fn check(ok: bool, violation: impl FnOnce() -> ConfigViolation) -> Check {
    if ok {
        Validation::success(())
    } else {
        Validation::fail(violation())
    }
}

/// Validate a set of definitions, accumulating ALL violations.
///
/// Guarantees on success:
/// - at least one state exists
/// - state ids are non-empty and unique
/// - every transition spec has an `action:nextState` shape
/// - every next state is declared
pub fn validate_definitions(definitions: &[StateDefinition]) -> Check {
    let mut checks: Vec<Check> = vec![check(!definitions.is_empty(), || {
        ConfigViolation::NoStates
    })];

    let declared: HashSet<&str> = definitions.iter().map(|d| d.id.as_str()).collect();
    let mut seen: HashSet<&str> = HashSet::new();

    for (index, definition) in definitions.iter().enumerate() {
        checks.push(check(!definition.id.is_empty(), || {
            ConfigViolation::EmptyStateId { index }
        }));

        // Repeated declarations are reported, and their messages skipped.
        let first = seen.insert(definition.id.as_str());
        checks.push(check(first, || ConfigViolation::DuplicateState {
            id: definition.id.clone(),
        }));
        if !first {
            continue;
        }

        for (message, spec) in &definition.messages {
            let outcome = match split_transition_spec(spec) {
                None => Validation::fail(ConfigViolation::MalformedTransition {
                    state: definition.id.clone(),
                    message: message.clone(),
                    spec: spec.clone(),
                }),
                Some((_, target)) if !declared.contains(target) => {
                    Validation::fail(ConfigViolation::UnknownTargetState {
                        state: definition.id.clone(),
                        message: message.clone(),
                        target: target.to_string(),
                    })
                }
                Some(_) => Validation::success(()),
            };
            checks.push(outcome);
        }
    }

    Validation::all_vec(checks).map(|_| ())
}

/// Collapse a validation outcome into the crate's error type.
pub fn into_result(validation: Check) -> Result<(), ConfigError> {
    match validation {
        Validation::Success(()) => Ok(()),
        Validation::Failure(violations) => Err(ConfigError::Invalid(
            violations.iter().cloned().collect(),
        )),
    }
}
