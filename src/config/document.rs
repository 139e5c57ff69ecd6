//! Serde model of a state machine document.
//!
//! The same shape is accepted in every supported format:
//!
//! ```json
//! {
//!   "states": [
//!     { "id": "START", "messages": [
//!         { "id": "MOVE", "action": "move", "nextState": "START" } ] },
//!     { "id": "STOP" }
//!   ]
//! }
//! ```

use super::error::{ConfigError, ConfigViolation};
use super::StateDefinition;
use crate::core::split_transition_spec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level document: states in declaration order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsmDocument {
    pub states: Vec<StateEntry>,
}

/// One declared state and the messages it accepts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateEntry {
    pub id: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<MessageEntry>,
}

/// A message declaration: the message id, a descriptive action name and the
/// state to move to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEntry {
    pub id: String,

    #[serde(default)]
    pub action: String,

    pub next_state: String,
}

impl FsmDocument {
    /// Convert into loader output, encoding each message as
    /// `"action:nextState"`.
    ///
    /// Fails when a state declares the same message twice, since a message
    /// map cannot hold both.
    pub fn into_definitions(self) -> Result<Vec<StateDefinition>, ConfigError> {
        let mut violations = Vec::new();
        let mut definitions = Vec::with_capacity(self.states.len());

        for state in self.states {
            let mut messages = BTreeMap::new();
            for message in state.messages {
                let spec = format!("{}:{}", message.action, message.next_state);
                if messages.insert(message.id.clone(), spec).is_some() {
                    violations.push(ConfigViolation::DuplicateMessage {
                        state: state.id.clone(),
                        message: message.id,
                    });
                }
            }
            definitions.push(StateDefinition {
                id: state.id,
                messages,
            });
        }

        if violations.is_empty() {
            Ok(definitions)
        } else {
            Err(ConfigError::Invalid(violations))
        }
    }
}

/// Document in the XML layout:
///
/// ```xml
/// <FSM>
///   <STATE id="START" type="ID">
///     <MESSAGE id="MOVE" action="move" nextState="START"/>
///   </STATE>
///   <STATE id="STOP"/>
/// </FSM>
/// ```
///
/// The root element name is not checked. Unknown attributes are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct XmlDocument {
    #[serde(rename = "STATE", default)]
    pub states: Vec<XmlState>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct XmlState {
    #[serde(rename = "@id")]
    pub id: String,

    #[serde(rename = "MESSAGE", default)]
    pub messages: Vec<XmlMessage>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct XmlMessage {
    #[serde(rename = "@id")]
    pub id: String,

    #[serde(rename = "@action", default)]
    pub action: String,

    #[serde(rename = "@nextState")]
    pub next_state: String,
}

impl From<XmlDocument> for FsmDocument {
    fn from(document: XmlDocument) -> Self {
        let states = document
            .states
            .into_iter()
            .map(|state| StateEntry {
                id: state.id,
                messages: state
                    .messages
                    .into_iter()
                    .map(|message| MessageEntry {
                        id: message.id,
                        action: message.action,
                        next_state: message.next_state,
                    })
                    .collect(),
            })
            .collect();
        Self { states }
    }
}

impl From<&[StateDefinition]> for FsmDocument {
    /// Rebuild a document from definitions. Specs without a separator are
    /// kept whole as the next state.
    fn from(definitions: &[StateDefinition]) -> Self {
        let states = definitions
            .iter()
            .map(|definition| StateEntry {
                id: definition.id.clone(),
                messages: definition
                    .messages
                    .iter()
                    .map(|(id, spec)| {
                        let (action, next_state) =
                            split_transition_spec(spec).unwrap_or(("", spec.as_str()));
                        MessageEntry {
                            id: id.clone(),
                            action: action.to_string(),
                            next_state: next_state.to_string(),
                        }
                    })
                    .collect(),
            })
            .collect();
        Self { states }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: &str = r#"{
        "states": [
            { "id": "START", "type": "ID", "messages": [
                { "id": "MOVE", "action": "move", "nextState": "START" },
                { "id": "MOVELEFT", "action": "moveLeft", "nextState": "INTERMEDIATE" }
            ]},
            { "id": "INTERMEDIATE", "messages": [
                { "id": "MOVELEFT", "action": "moveLeft", "nextState": "STOP" }
            ]},
            { "id": "STOP" }
        ]
    }"#;

    #[test]
    fn parses_and_encodes_messages() {
        let document: FsmDocument = serde_json::from_str(JSON).unwrap();
        let definitions = document.into_definitions().unwrap();

        let ids: Vec<&str> = definitions.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["START", "INTERMEDIATE", "STOP"]);
        assert_eq!(definitions[0].messages["MOVE"], "move:START");
        assert_eq!(definitions[0].messages["MOVELEFT"], "moveLeft:INTERMEDIATE");
        assert!(definitions[2].messages.is_empty());
    }

    #[test]
    fn missing_action_name_is_empty() {
        let document: FsmDocument = serde_json::from_str(
            r#"{ "states": [ { "id": "A", "messages": [ { "id": "GO", "nextState": "A" } ] } ] }"#,
        )
        .unwrap();
        let definitions = document.into_definitions().unwrap();
        assert_eq!(definitions[0].messages["GO"], ":A");
    }

    #[test]
    fn duplicate_messages_are_rejected() {
        let document: FsmDocument = serde_json::from_str(
            r#"{ "states": [ { "id": "A", "messages": [
                { "id": "GO", "action": "x", "nextState": "A" },
                { "id": "GO", "action": "y", "nextState": "A" } ] } ] }"#,
        )
        .unwrap();

        let err = document.into_definitions().unwrap_err();
        assert_eq!(
            err.violations(),
            &[ConfigViolation::DuplicateMessage {
                state: "A".to_string(),
                message: "GO".to_string(),
            }]
        );
    }

    #[test]
    fn xml_layout_maps_onto_the_document() {
        let xml = r#"<?xml version="1.0"?>
            <FSM>
                <STATE id="START" type="ID">
                    <MESSAGE id="MOVE" action="move" nextState="START"/>
                    <MESSAGE id="MOVELEFT" nextState="STOP"/>
                </STATE>
                <STATE id="STOP"></STATE>
            </FSM>"#;

        let document: XmlDocument = quick_xml::de::from_str(xml).unwrap();
        let definitions = FsmDocument::from(document).into_definitions().unwrap();

        assert_eq!(definitions.len(), 2);
        assert_eq!(definitions[0].messages["MOVE"], "move:START");
        assert_eq!(definitions[0].messages["MOVELEFT"], ":STOP");
        assert!(definitions[1].messages.is_empty());
    }

    #[test]
    fn rebuilds_document_from_definitions() {
        let document: FsmDocument = serde_json::from_str(JSON).unwrap();
        let definitions = document.clone().into_definitions().unwrap();
        let rebuilt = FsmDocument::from(definitions.as_slice());

        assert_eq!(rebuilt.states.len(), 3);
        assert_eq!(rebuilt.states[1].messages[0].next_state, "STOP");
        assert_eq!(rebuilt.states[1].messages[0].action, "moveLeft");
    }
}
