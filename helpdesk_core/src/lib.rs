#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

use async_trait::async_trait;
use std::sync::Arc;

pub mod error;
pub mod ingestion;
pub mod intent;
pub mod lex;
pub mod orchestrator;

pub use error::{Error, Result};
pub use ingestion::{
    AdmissionOutcome, IngestionAdmission, IngestionJobAck, IngestionJobSummary, IngestionJobs,
    IngestionResponse, IngestionTarget, ObjectCreatedEvent,
};
pub use intent::Intent;
pub use lex::{
    CloseResponse, ContentType, DialogAction, FulfillmentState, IntentEvent, IntentState, Message,
    SessionAttributes,
};
pub use orchestrator::{BotConfig, Orchestrator, StoreErrorPolicy};

/// A single retrieve-and-generate call against a knowledge base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub input_text: String,
    pub knowledge_base_id: String,
    pub model_arn: String,
    /// Handle from the previous turn; `None` starts a fresh context.
    pub continuation_handle: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: Option<String>,
    pub continuation_handle: String,
}

#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    async fn retrieve_and_generate(&self, request: &GenerateRequest) -> Result<Generation>;
}

/// Continuation handles keyed by conversation session id.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, session_id: &str) -> Result<Option<String>>;
    async fn put(&self, session_id: &str, continuation_handle: &str) -> Result<()>;
}

#[async_trait]
impl<T: KnowledgeBase + ?Sized> KnowledgeBase for Arc<T> {
    async fn retrieve_and_generate(&self, request: &GenerateRequest) -> Result<Generation> {
        (**self).retrieve_and_generate(request).await
    }
}

#[async_trait]
impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    async fn get(&self, session_id: &str) -> Result<Option<String>> {
        (**self).get(session_id).await
    }

    async fn put(&self, session_id: &str, continuation_handle: &str) -> Result<()> {
        (**self).put(session_id, continuation_handle).await
    }
}
