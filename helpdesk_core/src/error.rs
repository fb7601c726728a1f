use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Knowledge base error: {0}")]
    KnowledgeBase(String),

    #[error("Session store error: {0}")]
    Store(String),

    #[error("Ingestion service error: {0}")]
    Ingestion(String),

    #[error("No utterance text in event for session: {0}")]
    MissingUtterance(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
