//! Conversation turn orchestration.
//!
//! Each inbound event is classified into an [`Intent`] and answered with a
//! Close response. Knowledge-base turns thread the generation service's
//! continuation handle through the [`SessionStore`] so follow-up questions
//! keep their context.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    CloseResponse, Error, FulfillmentState, GenerateRequest, Intent, IntentEvent, KnowledgeBase,
    Message, Result, SessionAttributes, SessionStore,
};

pub const GREETING_TEXT: &str = "Hello! How can we help you today?";
pub const NOT_UNDERSTOOD_TEXT: &str = "Sorry, I didn't understand.";
pub const NO_ANSWER_TEXT: &str = "Sorry, I was not able to understand your question.";

#[must_use]
pub fn unsupported_text(intent_name: &str) -> String {
    format!("The intent {intent_name} is not yet supported.")
}

/// What a knowledge-base turn does when the session store fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreErrorPolicy {
    /// Log the failure. A failed read starts a fresh context, a failed
    /// write drops the new handle.
    #[default]
    TreatAsMissing,
    /// Fail the turn with the store error.
    Fail,
}

impl FromStr for StoreErrorPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "treat_as_missing" => Ok(Self::TreatAsMissing),
            "fail" => Ok(Self::Fail),
            other => Err(Error::Config(format!(
                "unknown store error policy '{other}', expected 'treat_as_missing' or 'fail'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotConfig {
    pub knowledge_base_id: String,
    pub model_arn: String,
    pub on_store_error: StoreErrorPolicy,
}

pub struct Orchestrator<K = Arc<dyn KnowledgeBase>, S = Arc<dyn SessionStore>>
where
    K: Send + Sync,
    S: Send + Sync,
{
    knowledge_base: K,
    sessions: S,
    config: BotConfig,
}

impl<K, S> Orchestrator<K, S>
where
    K: KnowledgeBase + Send + Sync,
    S: SessionStore + Send + Sync,
{
    pub const fn new(knowledge_base: K, sessions: S, config: BotConfig) -> Self {
        Self {
            knowledge_base,
            sessions,
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Classify and answer one event.
    ///
    /// Only knowledge-base failures (and store failures under
    /// [`StoreErrorPolicy::Fail`]) surface as errors. Every other path
    /// returns a Close response in the `Fulfilled` state.
    pub async fn handle(&self, event: &IntentEvent) -> Result<CloseResponse> {
        debug!("Intent event: {event:?}");

        let intent = Intent::from_event(event)?;
        let response = self.dispatch(intent, event).await?;

        if tracing::enabled!(tracing::Level::DEBUG) {
            debug!(
                "Close response: {}",
                serde_json::to_string_pretty(&response)?
            );
        }
        Ok(response)
    }

    pub async fn dispatch(&self, intent: Intent, event: &IntentEvent) -> Result<CloseResponse> {
        let session_attributes = event.session_attributes().clone();

        match intent {
            Intent::Greeting => Ok(Self::greet(event)),
            Intent::KnowledgeBase { utterance } => {
                self.answer(event, session_attributes, &utterance).await
            }
            Intent::Unsupported(name) => {
                info!("Unsupported intent: {name}");
                Ok(CloseResponse::close(
                    event,
                    session_attributes,
                    FulfillmentState::Fulfilled,
                    Message::plain_text(unsupported_text(&name)),
                ))
            }
            Intent::Unrecognized => Ok(CloseResponse::close(
                event,
                session_attributes,
                FulfillmentState::Fulfilled,
                Message::plain_text(NOT_UNDERSTOOD_TEXT),
            )),
        }
    }

    /// Greeting starts the conversation over with empty attributes.
    fn greet(event: &IntentEvent) -> CloseResponse {
        CloseResponse::close(
            event,
            SessionAttributes::new(),
            FulfillmentState::Fulfilled,
            Message::plain_text(GREETING_TEXT),
        )
    }

    async fn answer(
        &self,
        event: &IntentEvent,
        session_attributes: SessionAttributes,
        utterance: &str,
    ) -> Result<CloseResponse> {
        let session_id = event.session_id.as_str();
        debug!("Querying knowledge base for session {session_id}: {utterance}");

        let continuation_handle = self.load_handle(session_id).await?;

        let request = GenerateRequest {
            input_text: utterance.to_string(),
            knowledge_base_id: self.config.knowledge_base_id.clone(),
            model_arn: self.config.model_arn.clone(),
            continuation_handle,
        };
        let generation = self.knowledge_base.retrieve_and_generate(&request).await?;

        self.save_handle(session_id, &generation.continuation_handle)
            .await?;

        let content = generation.text.unwrap_or_else(|| {
            debug!("No generated text for session {session_id}");
            NO_ANSWER_TEXT.to_string()
        });
        debug!("Knowledge base answer: {content}");

        Ok(CloseResponse::close(
            event,
            session_attributes,
            FulfillmentState::Fulfilled,
            Message::plain_text(content),
        ))
    }

    async fn load_handle(&self, session_id: &str) -> Result<Option<String>> {
        match self.sessions.get(session_id).await {
            Ok(handle) => Ok(handle),
            Err(e) => match self.config.on_store_error {
                StoreErrorPolicy::TreatAsMissing => {
                    warn!("Failed to read session {session_id}, starting fresh context: {e}");
                    Ok(None)
                }
                StoreErrorPolicy::Fail => Err(e),
            },
        }
    }

    async fn save_handle(&self, session_id: &str, continuation_handle: &str) -> Result<()> {
        match self.sessions.put(session_id, continuation_handle).await {
            Ok(()) => Ok(()),
            Err(e) => match self.config.on_store_error {
                StoreErrorPolicy::TreatAsMissing => {
                    warn!("Failed to save session {session_id}: {e}");
                    Ok(())
                }
                StoreErrorPolicy::Fail => Err(e),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::{FALLBACK_INTENT, GREETING_INTENT};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    use crate::Generation;

    #[derive(Default)]
    struct FakeKnowledgeBase {
        requests: Mutex<Vec<GenerateRequest>>,
        text: Option<String>,
        fail: bool,
    }

    impl FakeKnowledgeBase {
        fn answering(text: &str) -> Self {
            Self {
                text: Some(text.to_string()),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl KnowledgeBase for FakeKnowledgeBase {
        async fn retrieve_and_generate(&self, request: &GenerateRequest) -> Result<Generation> {
            let mut requests = self.requests.lock().await;
            requests.push(request.clone());
            if self.fail {
                return Err(Error::KnowledgeBase("throttled".to_string()));
            }
            Ok(Generation {
                text: self.text.clone(),
                continuation_handle: format!("H{}", requests.len() + 1),
            })
        }
    }

    #[derive(Default)]
    struct FakeStore {
        handles: Mutex<HashMap<String, String>>,
        fail_reads: bool,
        fail_writes: bool,
    }

    #[async_trait]
    impl SessionStore for FakeStore {
        async fn get(&self, session_id: &str) -> Result<Option<String>> {
            if self.fail_reads {
                return Err(Error::Store("table unavailable".to_string()));
            }
            Ok(self.handles.lock().await.get(session_id).cloned())
        }

        async fn put(&self, session_id: &str, continuation_handle: &str) -> Result<()> {
            if self.fail_writes {
                return Err(Error::Store("table unavailable".to_string()));
            }
            self.handles
                .lock()
                .await
                .insert(session_id.to_string(), continuation_handle.to_string());
            Ok(())
        }
    }

    fn config(on_store_error: StoreErrorPolicy) -> BotConfig {
        BotConfig {
            knowledge_base_id: "KB1".to_string(),
            model_arn: "arn:aws:bedrock:us-east-1::foundation-model/test".to_string(),
            on_store_error,
        }
    }

    fn attributes() -> SessionAttributes {
        SessionAttributes::from([("topic".to_string(), "billing".to_string())])
    }

    #[tokio::test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    async fn test_unsupported_intent() {
        let bot = Orchestrator::new(
            FakeKnowledgeBase::default(),
            FakeStore::default(),
            config(StoreErrorPolicy::default()),
        );
        let event = IntentEvent::new("S1", Some("OrderPizza"), "large pepperoni")
            .with_session_attributes(attributes());

        let response = bot.handle(&event).await.expect("dispatch should succeed");

        assert_eq!(
            response.content(),
            Some("The intent OrderPizza is not yet supported.")
        );
        assert_eq!(
            response.fulfillment_state(),
            Some(FulfillmentState::Fulfilled)
        );
        assert_eq!(response.session_state.session_attributes, attributes());
    }

    #[tokio::test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    async fn test_missing_intent_name() {
        let bot = Orchestrator::new(
            FakeKnowledgeBase::default(),
            FakeStore::default(),
            config(StoreErrorPolicy::default()),
        );
        let event = IntentEvent::new("S1", None, "mumble");

        let response = bot.handle(&event).await.expect("dispatch should succeed");

        assert_eq!(response.content(), Some(NOT_UNDERSTOOD_TEXT));
        assert_eq!(
            response.fulfillment_state(),
            Some(FulfillmentState::Fulfilled)
        );
        assert_eq!(response.session_id, "S1");
    }

    #[tokio::test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    async fn test_greeting_clears_attributes() {
        let knowledge_base = Arc::new(FakeKnowledgeBase::default());
        let bot = Orchestrator::new(
            Arc::clone(&knowledge_base),
            FakeStore::default(),
            config(StoreErrorPolicy::default()),
        );
        let event = IntentEvent::new("S1", Some(GREETING_INTENT), "hi")
            .with_session_attributes(attributes());

        let response = bot.handle(&event).await.expect("greeting should succeed");

        assert_eq!(response.content(), Some(GREETING_TEXT));
        assert!(response.session_state.session_attributes.is_empty());
        assert!(knowledge_base.requests.lock().await.is_empty());
    }

    #[tokio::test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    async fn test_first_turn_omits_handle_and_stores_new_one() {
        let knowledge_base = Arc::new(FakeKnowledgeBase::answering("We open at 9am."));
        let store = Arc::new(FakeStore::default());
        let bot = Orchestrator::new(
            Arc::clone(&knowledge_base),
            Arc::clone(&store),
            config(StoreErrorPolicy::default()),
        );
        let event = IntentEvent::new("S1", Some(FALLBACK_INTENT), "when do you open")
            .with_session_attributes(attributes());

        let response = bot.handle(&event).await.expect("turn should succeed");

        assert_eq!(response.content(), Some("We open at 9am."));
        assert_eq!(response.session_state.session_attributes, attributes());

        let requests = knowledge_base.requests.lock().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].continuation_handle, None);
        assert_eq!(requests[0].input_text, "when do you open");
        assert_eq!(requests[0].knowledge_base_id, "KB1");

        assert_eq!(
            store.handles.lock().await.get("S1").map(String::as_str),
            Some("H2")
        );
    }

    #[tokio::test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    async fn test_follow_up_turn_passes_stored_handle() {
        let knowledge_base = Arc::new(FakeKnowledgeBase::answering("Yes."));
        let store = Arc::new(FakeStore::default());
        store
            .handles
            .lock()
            .await
            .insert("S1".to_string(), "H1".to_string());
        let bot = Orchestrator::new(
            Arc::clone(&knowledge_base),
            Arc::clone(&store),
            config(StoreErrorPolicy::default()),
        );
        let event = IntentEvent::new("S1", Some(FALLBACK_INTENT), "and on sundays?");

        bot.handle(&event).await.expect("turn should succeed");

        let requests = knowledge_base.requests.lock().await;
        assert_eq!(requests[0].continuation_handle.as_deref(), Some("H1"));
    }

    #[tokio::test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    async fn test_absent_text_uses_apology() {
        let store = Arc::new(FakeStore::default());
        store
            .handles
            .lock()
            .await
            .insert("S1".to_string(), "H1".to_string());
        let bot = Orchestrator::new(
            FakeKnowledgeBase::default(),
            Arc::clone(&store),
            config(StoreErrorPolicy::default()),
        );
        let event = IntentEvent::new("S1", Some(FALLBACK_INTENT), "asdfgh");

        let response = bot.handle(&event).await.expect("turn should succeed");

        assert_eq!(response.content(), Some(NO_ANSWER_TEXT));
        assert_eq!(
            response.fulfillment_state(),
            Some(FulfillmentState::Fulfilled)
        );
    }

    #[tokio::test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    async fn test_store_failures_treated_as_missing() {
        let knowledge_base = Arc::new(FakeKnowledgeBase::answering("Answer"));
        let store = FakeStore {
            fail_reads: true,
            fail_writes: true,
            ..FakeStore::default()
        };
        let bot = Orchestrator::new(
            Arc::clone(&knowledge_base),
            store,
            config(StoreErrorPolicy::TreatAsMissing),
        );
        let event = IntentEvent::new("S1", Some(FALLBACK_INTENT), "question");

        let response = bot.handle(&event).await.expect("turn should succeed");

        assert_eq!(response.content(), Some("Answer"));
        assert_eq!(
            knowledge_base.requests.lock().await[0].continuation_handle,
            None
        );
    }

    #[tokio::test]
    async fn test_store_failures_fail_turn_under_fail_policy() {
        let knowledge_base = Arc::new(FakeKnowledgeBase::answering("Answer"));
        let store = FakeStore {
            fail_reads: true,
            ..FakeStore::default()
        };
        let bot = Orchestrator::new(
            Arc::clone(&knowledge_base),
            store,
            config(StoreErrorPolicy::Fail),
        );
        let event = IntentEvent::new("S1", Some(FALLBACK_INTENT), "question");

        assert!(matches!(bot.handle(&event).await, Err(Error::Store(_))));
        assert!(knowledge_base.requests.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_fails_turn_under_fail_policy() {
        let knowledge_base = Arc::new(FakeKnowledgeBase::answering("Answer"));
        let store = FakeStore {
            fail_writes: true,
            ..FakeStore::default()
        };
        let bot = Orchestrator::new(
            Arc::clone(&knowledge_base),
            store,
            config(StoreErrorPolicy::Fail),
        );
        let event = IntentEvent::new("S1", Some(FALLBACK_INTENT), "question");

        assert!(matches!(bot.handle(&event).await, Err(Error::Store(_))));
        assert_eq!(knowledge_base.requests.lock().await.len(), 1);
    }

    #[tokio::test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    async fn test_write_failure_keeps_answer() {
        let knowledge_base = Arc::new(FakeKnowledgeBase::answering("We ship worldwide."));
        let store = Arc::new(FakeStore {
            fail_writes: true,
            ..FakeStore::default()
        });
        store
            .handles
            .lock()
            .await
            .insert("S1".to_string(), "H1".to_string());
        let bot = Orchestrator::new(
            Arc::clone(&knowledge_base),
            Arc::clone(&store),
            config(StoreErrorPolicy::TreatAsMissing),
        );
        let event = IntentEvent::new("S1", Some(FALLBACK_INTENT), "do you ship abroad");

        let response = bot.handle(&event).await.expect("turn should succeed");

        assert_eq!(response.content(), Some("We ship worldwide."));
        assert_eq!(
            response.fulfillment_state(),
            Some(FulfillmentState::Fulfilled)
        );
        assert_eq!(
            knowledge_base.requests.lock().await[0]
                .continuation_handle
                .as_deref(),
            Some("H1")
        );
        assert_eq!(
            store.handles.lock().await.get("S1").map(String::as_str),
            Some("H1")
        );
    }

    #[tokio::test]
    async fn test_knowledge_base_failure_propagates() {
        let store = Arc::new(FakeStore::default());
        let bot = Orchestrator::new(
            FakeKnowledgeBase {
                fail: true,
                ..FakeKnowledgeBase::default()
            },
            Arc::clone(&store),
            config(StoreErrorPolicy::default()),
        );
        let event = IntentEvent::new("S1", Some(FALLBACK_INTENT), "question");

        assert!(matches!(
            bot.handle(&event).await,
            Err(Error::KnowledgeBase(_))
        ));
        assert!(store.handles.lock().await.is_empty());
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn test_policy_from_str() {
        assert_eq!(
            "treat_as_missing"
                .parse::<StoreErrorPolicy>()
                .expect("should parse"),
            StoreErrorPolicy::TreatAsMissing
        );
        assert_eq!(
            " FAIL ".parse::<StoreErrorPolicy>().expect("should parse"),
            StoreErrorPolicy::Fail
        );
        assert!("retry".parse::<StoreErrorPolicy>().is_err());
    }
}
