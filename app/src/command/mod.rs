//! Static strategy pattern for CLI commands.
//!
//! Each command is a separate strategy type with its own input, dispatched
//! statically from `main`.

use helpdesk_config::Config;
use helpdesk_core::{IngestionAdmission, Orchestrator, SessionStore};
use helpdesk_providers::{BedrockIngestionJobs, BedrockKnowledgeBase};
use helpdesk_session::{DynamoSessionStore, MemorySessionStore};
use std::sync::Arc;
use tracing::info;

mod bot;
mod chat;
mod info;
mod ingest;
mod init;
mod invoke;
mod version;

pub use bot::BotStrategy;
pub use chat::{ChatInput, ChatStrategy};
pub use info::InfoStrategy;
pub use ingest::IngestStrategy;
pub use init::InitStrategy;
pub use invoke::{HandlerKind, InvokeInput, InvokeStrategy};
pub use version::VersionStrategy;

/// Orchestrator wired to Bedrock and the selected session store.
pub type Bot = Orchestrator<BedrockKnowledgeBase, Arc<dyn SessionStore>>;

/// Where knowledge-base continuation handles are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionBackend {
    Dynamo,
    Memory,
}

impl SessionBackend {
    #[must_use]
    pub const fn from_flag(memory_store: bool) -> Self {
        if memory_store {
            Self::Memory
        } else {
            Self::Dynamo
        }
    }
}

async fn sdk_config() -> aws_config::SdkConfig {
    aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await
}

async fn build_bot(config: &Config, backend: SessionBackend) -> anyhow::Result<Bot> {
    let bot_config = config.bot_config()?;
    let sdk_config = sdk_config().await;

    let sessions: Arc<dyn SessionStore> = match backend {
        SessionBackend::Dynamo => {
            Arc::new(DynamoSessionStore::new(&sdk_config, config.session_table()?))
        }
        SessionBackend::Memory => {
            info!("Using in-memory session store");
            Arc::new(MemorySessionStore::new())
        }
    };

    info!(
        "Knowledge base: {}, model: {}",
        bot_config.knowledge_base_id, bot_config.model_arn
    );

    Ok(Orchestrator::new(
        BedrockKnowledgeBase::new(&sdk_config),
        sessions,
        bot_config,
    ))
}

async fn build_admission(
    config: &Config,
) -> anyhow::Result<IngestionAdmission<BedrockIngestionJobs>> {
    let target = config.ingestion_target()?;
    let sdk_config = sdk_config().await;

    info!(
        "Ingestion target: data source {} in knowledge base {}",
        target.data_source_id, target.knowledge_base_id
    );

    Ok(IngestionAdmission::new(
        BedrockIngestionJobs::new(&sdk_config),
        target,
    ))
}

/// Core trait defining the contract for all command strategies.
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    ///
    /// # Errors
    /// Returns an error if command execution fails.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}
