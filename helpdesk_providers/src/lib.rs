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

//! Bedrock adapters for the knowledge-base traits in `helpdesk_core`.

mod bedrock;
mod ingestion;

pub use bedrock::BedrockKnowledgeBase;
pub use ingestion::BedrockIngestionJobs;
