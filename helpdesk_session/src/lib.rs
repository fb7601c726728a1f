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

//! Continuation handle storage.
//!
//! Neither store locks or versions records: two turns racing on the same
//! session both write, and the later write wins.

mod dynamo;
mod memory;

pub use dynamo::{DynamoSessionStore, HANDLE_ATTRIBUTE, SESSION_KEY, UPDATED_AT_ATTRIBUTE};
pub use memory::MemorySessionStore;
