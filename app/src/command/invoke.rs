use clap::ValueEnum;
use helpdesk_config::Config;
use helpdesk_core::{IntentEvent, ObjectCreatedEvent};
use std::io::Read;
use std::path::PathBuf;

use super::SessionBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HandlerKind {
    /// Bot fulfillment handler
    Bot,
    /// Ingestion trigger handler
    Ingest,
}

/// Input for running one event through a handler locally.
#[derive(Debug, Clone)]
pub struct InvokeInput {
    pub config: Config,
    pub handler: HandlerKind,
    /// Event file; stdin when absent
    pub event: Option<PathBuf>,
    pub session_backend: SessionBackend,
}

/// Strategy for invoking a handler outside the Lambda runtime.
///
/// Prints the handler's JSON response to stdout.
#[derive(Debug, Clone, Copy)]
pub struct InvokeStrategy;

fn read_event(path: Option<&PathBuf>) -> anyhow::Result<serde_json::Value> {
    let raw = match path {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut raw = String::new();
            std::io::stdin().read_to_string(&mut raw)?;
            raw
        }
    };

    if raw.trim().is_empty() {
        return Ok(serde_json::Value::Null);
    }
    Ok(serde_json::from_str(&raw)?)
}

impl super::CommandStrategy for InvokeStrategy {
    type Input = InvokeInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let event = read_event(input.event.as_ref())?;

        let output = match input.handler {
            HandlerKind::Bot => {
                let event: IntentEvent = serde_json::from_value(event)
                    .map_err(|e| anyhow::anyhow!("Invalid bot event: {e}"))?;
                let bot = super::build_bot(&input.config, input.session_backend).await?;
                serde_json::to_value(bot.handle(&event).await?)?
            }
            HandlerKind::Ingest => {
                super::ingest::log_uploads(&ObjectCreatedEvent::from_value(event));
                let admission = super::build_admission(&input.config).await?;
                serde_json::to_value(admission.admit().await.into_response())?
            }
        };

        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}
