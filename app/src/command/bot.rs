use helpdesk_config::Config;
use helpdesk_core::IntentEvent;
use lambda_runtime::{LambdaEvent, service_fn};
use std::sync::Arc;
use tracing::info;

use super::SessionBackend;

/// Strategy for serving bot fulfillment requests as a Lambda function.
///
/// Knowledge-base failures are returned to the bot runtime as function
/// errors; every other turn produces a Close response.
#[derive(Debug, Clone, Copy)]
pub struct BotStrategy;

impl super::CommandStrategy for BotStrategy {
    type Input = Config;

    async fn execute(&self, config: Self::Input) -> anyhow::Result<()> {
        let bot = Arc::new(super::build_bot(&config, SessionBackend::Dynamo).await?);

        info!("Starting bot fulfillment handler");

        lambda_runtime::run(service_fn(move |event: LambdaEvent<IntentEvent>| {
            let bot = Arc::clone(&bot);
            async move {
                bot.handle(&event.payload)
                    .await
                    .map_err(lambda_runtime::Error::from)
            }
        }))
        .await
        .map_err(|e| anyhow::anyhow!("Lambda runtime error: {e}"))
    }
}
