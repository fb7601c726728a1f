use async_trait::async_trait;
use aws_sdk_bedrockagent::Client;
use aws_sdk_bedrockagent::error::{BuildError, DisplayErrorContext};
use aws_sdk_bedrockagent::operation::list_ingestion_jobs::builders::ListIngestionJobsFluentBuilder;
use aws_sdk_bedrockagent::types::{
    IngestionJobFilter, IngestionJobFilterAttribute, IngestionJobFilterOperator,
};
use helpdesk_core::ingestion::IN_PROGRESS_STATUS;
use helpdesk_core::{
    Error, IngestionJobAck, IngestionJobSummary, IngestionJobs, IngestionTarget, Result,
};
use tracing::debug;

/// Bedrock ingestion job listing and start.
#[derive(Clone)]
pub struct BedrockIngestionJobs {
    client: Client,
}

fn in_progress_filter() -> std::result::Result<IngestionJobFilter, BuildError> {
    IngestionJobFilter::builder()
        .attribute(IngestionJobFilterAttribute::Status)
        .operator(IngestionJobFilterOperator::Eq)
        .values(IN_PROGRESS_STATUS)
        .build()
}

fn ingestion_error(e: impl std::error::Error) -> Error {
    Error::Ingestion(DisplayErrorContext(&e).to_string())
}

impl BedrockIngestionJobs {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }

    #[must_use]
    pub const fn from_client(client: Client) -> Self {
        Self { client }
    }

    fn list_in_progress_request(
        &self,
        target: &IngestionTarget,
    ) -> Result<ListIngestionJobsFluentBuilder> {
        Ok(self
            .client
            .list_ingestion_jobs()
            .knowledge_base_id(&target.knowledge_base_id)
            .data_source_id(&target.data_source_id)
            .filters(in_progress_filter().map_err(ingestion_error)?))
    }
}

#[async_trait]
impl IngestionJobs for BedrockIngestionJobs {
    async fn list_in_progress(
        &self,
        target: &IngestionTarget,
    ) -> Result<Vec<IngestionJobSummary>> {
        debug!(
            "Listing in-progress ingestion jobs for data source {} in knowledge base {}",
            target.data_source_id, target.knowledge_base_id
        );

        let output = self
            .list_in_progress_request(target)?
            .send()
            .await
            .map_err(ingestion_error)?;

        Ok(output
            .ingestion_job_summaries()
            .iter()
            .map(|job| IngestionJobSummary {
                job_id: job.ingestion_job_id().to_string(),
                status: job.status().as_str().to_string(),
            })
            .collect())
    }

    async fn start(&self, target: &IngestionTarget) -> Result<IngestionJobAck> {
        let output = self
            .client
            .start_ingestion_job()
            .knowledge_base_id(&target.knowledge_base_id)
            .data_source_id(&target.data_source_id)
            .send()
            .await
            .map_err(ingestion_error)?;

        Ok(output
            .ingestion_job()
            .map(|job| IngestionJobAck {
                job_id: Some(job.ingestion_job_id().to_string()),
                status: Some(job.status().as_str().to_string()),
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_bedrockagent::config::{BehaviorVersion, Region};

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn test_in_progress_filter() {
        let filter = in_progress_filter().expect("filter should build");
        assert_eq!(filter.values().to_vec(), vec![IN_PROGRESS_STATUS.to_string()]);
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn test_list_request_scoped_to_target() {
        let config = aws_sdk_bedrockagent::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .build();
        let jobs = BedrockIngestionJobs::from_client(Client::from_conf(config));
        let target = IngestionTarget {
            knowledge_base_id: "KB1".to_string(),
            data_source_id: "DS1".to_string(),
        };

        let builder = jobs
            .list_in_progress_request(&target)
            .expect("request should build");

        assert_eq!(builder.get_knowledge_base_id().as_deref(), Some("KB1"));
        assert_eq!(builder.get_data_source_id().as_deref(), Some("DS1"));

        let filters = builder.get_filters().as_deref().unwrap_or_default();
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].attribute(), &IngestionJobFilterAttribute::Status);
        assert_eq!(filters[0].operator(), &IngestionJobFilterOperator::Eq);
    }
}
