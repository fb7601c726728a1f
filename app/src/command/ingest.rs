use helpdesk_config::Config;
use helpdesk_core::ObjectCreatedEvent;
use lambda_runtime::{LambdaEvent, service_fn};
use std::sync::Arc;
use tracing::info;

/// Strategy for serving upload-triggered ingestion as a Lambda function.
#[derive(Debug, Clone, Copy)]
pub struct IngestStrategy;

impl super::CommandStrategy for IngestStrategy {
    type Input = Config;

    async fn execute(&self, config: Self::Input) -> anyhow::Result<()> {
        let admission = Arc::new(super::build_admission(&config).await?);

        info!("Starting ingestion trigger handler");

        lambda_runtime::run(service_fn(
            move |event: LambdaEvent<serde_json::Value>| {
                let admission = Arc::clone(&admission);
                async move {
                    log_uploads(&ObjectCreatedEvent::from_value(event.payload));
                    Ok::<_, lambda_runtime::Error>(admission.admit().await.into_response())
                }
            },
        ))
        .await
        .map_err(|e| anyhow::anyhow!("Lambda runtime error: {e}"))
    }
}

pub(super) fn log_uploads(event: &ObjectCreatedEvent) {
    for path in event.object_paths() {
        info!("Object uploaded: {path}");
    }
}
