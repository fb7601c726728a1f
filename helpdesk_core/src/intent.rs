use crate::{Error, IntentEvent, Result};

pub const GREETING_INTENT: &str = "greeting_intent";
pub const FALLBACK_INTENT: &str = "FallbackIntent";

/// The closed set of intents this bot fulfills.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Greeting,
    /// Free-form question answered from the knowledge base.
    KnowledgeBase { utterance: String },
    /// A named intent with no handler.
    Unsupported(String),
    /// The event carried no intent name.
    Unrecognized,
}

impl Intent {
    pub fn from_event(event: &IntentEvent) -> Result<Self> {
        match event.intent_name() {
            None => Ok(Self::Unrecognized),
            Some(GREETING_INTENT) => Ok(Self::Greeting),
            Some(FALLBACK_INTENT) => event
                .utterance()
                .map(|utterance| Self::KnowledgeBase {
                    utterance: utterance.to_string(),
                })
                .ok_or_else(|| Error::MissingUtterance(event.session_id.clone())),
            Some(other) => Ok(Self::Unsupported(other.to_string())),
        }
    }
}
