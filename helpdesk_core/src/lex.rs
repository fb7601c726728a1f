//! Wire types for the bot fulfillment contract.
//!
//! Inbound events and outbound close responses use the Lex V2 camelCase
//! JSON layout. Intent fields this crate does not interpret (slots,
//! confirmation state, ...) are carried through `IntentState::extra` so a
//! close response echoes the intent unchanged apart from its state.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Free-form attributes carried opaquely across turns.
pub type SessionAttributes = BTreeMap<String, String>;

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FulfillmentState {
    Failed,
    Fulfilled,
    FulfillmentInProgress,
    InProgress,
    ReadyForFulfillment,
    Waiting,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentState {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<FulfillmentState>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    #[serde(default, deserialize_with = "null_as_default")]
    pub intent: IntentState,
    #[serde(default, deserialize_with = "null_as_default")]
    pub session_attributes: SessionAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcription {
    pub transcription: String,
}

/// One conversational turn as delivered by the bot runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentEvent {
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_transcript: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub transcriptions: Vec<Transcription>,
    #[serde(default)]
    pub session_state: SessionState,
}

impl IntentEvent {
    /// Build an event the way the bot runtime would for a typed utterance.
    #[must_use]
    pub fn new(session_id: impl Into<String>, intent_name: Option<&str>, utterance: &str) -> Self {
        Self {
            session_id: session_id.into(),
            input_transcript: Some(utterance.to_string()),
            transcriptions: vec![Transcription {
                transcription: utterance.to_string(),
            }],
            session_state: SessionState {
                intent: IntentState {
                    name: intent_name.map(str::to_string),
                    ..IntentState::default()
                },
                session_attributes: SessionAttributes::new(),
            },
        }
    }

    #[must_use]
    pub fn with_session_attributes(mut self, attributes: SessionAttributes) -> Self {
        self.session_state.session_attributes = attributes;
        self
    }

    #[must_use]
    pub fn intent_name(&self) -> Option<&str> {
        self.session_state.intent.name.as_deref()
    }

    #[must_use]
    pub const fn session_attributes(&self) -> &SessionAttributes {
        &self.session_state.session_attributes
    }

    /// First transcription, falling back to the raw input transcript.
    #[must_use]
    pub fn utterance(&self) -> Option<&str> {
        self.transcriptions
            .first()
            .map(|t| t.transcription.as_str())
            .or(self.input_transcript.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
    PlainText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub content_type: ContentType,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn plain_text(content: impl Into<String>) -> Self {
        Self {
            content_type: ContentType::PlainText,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogActionType {
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogAction {
    #[serde(rename = "type")]
    pub kind: DialogActionType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseSessionState {
    pub session_attributes: SessionAttributes,
    pub dialog_action: DialogAction,
    pub intent: IntentState,
}

/// Response signalling that the turn concluded with a final message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseResponse {
    pub session_state: CloseSessionState,
    pub messages: Vec<Message>,
    pub session_id: String,
}

impl CloseResponse {
    #[must_use]
    pub fn close(
        event: &IntentEvent,
        session_attributes: SessionAttributes,
        state: FulfillmentState,
        message: Message,
    ) -> Self {
        let mut intent = event.session_state.intent.clone();
        intent.state = Some(state);

        Self {
            session_state: CloseSessionState {
                session_attributes,
                dialog_action: DialogAction {
                    kind: DialogActionType::Close,
                },
                intent,
            },
            messages: vec![message],
            session_id: event.session_id.clone(),
        }
    }

    /// Content of the first message, if any.
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.messages.first().map(|m| m.content.as_str())
    }

    #[must_use]
    pub const fn fulfillment_state(&self) -> Option<FulfillmentState> {
        self.session_state.intent.state
    }
}
