//! Admission control for knowledge-base ingestion jobs.
//!
//! Uploads trigger a re-index of the data source. Before starting one, the
//! controller asks the ingestion service whether a job is already running
//! for the same data source and skips the start if so. The check and the
//! start are separate calls, so two triggers racing through the window
//! between them can both start a job.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use crate::Result;

pub const IN_PROGRESS_STATUS: &str = "IN_PROGRESS";

pub const ALREADY_IN_PROGRESS_TEXT: &str = "Ingestion job already in progress.";
pub const STARTED_TEXT: &str = "Ingestion job started successfully.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionTarget {
    pub knowledge_base_id: String,
    pub data_source_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionJobSummary {
    pub job_id: String,
    pub status: String,
}

/// Acknowledgment returned by a job start request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestionJobAck {
    pub job_id: Option<String>,
    pub status: Option<String>,
}

#[async_trait]
pub trait IngestionJobs: Send + Sync {
    /// Jobs for `target` whose status is `IN_PROGRESS`.
    async fn list_in_progress(&self, target: &IngestionTarget)
    -> Result<Vec<IngestionJobSummary>>;

    async fn start(&self, target: &IngestionTarget) -> Result<IngestionJobAck>;
}

#[async_trait]
impl<T: IngestionJobs + ?Sized> IngestionJobs for Arc<T> {
    async fn list_in_progress(
        &self,
        target: &IngestionTarget,
    ) -> Result<Vec<IngestionJobSummary>> {
        (**self).list_in_progress(target).await
    }

    async fn start(&self, target: &IngestionTarget) -> Result<IngestionJobAck> {
        (**self).start(target).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionOutcome {
    AlreadyInProgress(Vec<IngestionJobSummary>),
    Started(IngestionJobAck),
    CheckFailed(String),
    StartFailed(String),
}

impl AdmissionOutcome {
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::CheckFailed(_) | Self::StartFailed(_))
    }

    #[must_use]
    pub const fn status_code(&self) -> u16 {
        if self.is_failure() { 500 } else { 200 }
    }

    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::AlreadyInProgress(_) => ALREADY_IN_PROGRESS_TEXT.to_string(),
            Self::Started(_) => STARTED_TEXT.to_string(),
            Self::CheckFailed(e) => format!("Error checking ingestion jobs: {e}"),
            Self::StartFailed(e) => format!("Error starting ingestion job: {e}"),
        }
    }

    #[must_use]
    pub fn into_response(self) -> IngestionResponse {
        IngestionResponse {
            status_code: self.status_code(),
            // The body is itself a JSON document, here a single string.
            body: serde_json::Value::String(self.message()).to_string(),
        }
    }
}

/// Payload returned to the invoking platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionResponse {
    pub status_code: u16,
    pub body: String,
}

pub struct IngestionAdmission<J = Arc<dyn IngestionJobs>>
where
    J: Send + Sync,
{
    jobs: J,
    target: IngestionTarget,
}

impl<J> IngestionAdmission<J>
where
    J: IngestionJobs + Send + Sync,
{
    pub const fn new(jobs: J, target: IngestionTarget) -> Self {
        Self { jobs, target }
    }

    #[must_use]
    pub const fn target(&self) -> &IngestionTarget {
        &self.target
    }

    /// Start an ingestion job unless one is already running.
    ///
    /// Never fails: service errors come back as
    /// [`AdmissionOutcome::CheckFailed`] or [`AdmissionOutcome::StartFailed`].
    pub async fn admit(&self) -> AdmissionOutcome {
        let running = match self.jobs.list_in_progress(&self.target).await {
            Ok(running) => running,
            Err(e) => {
                error!("Error checking ingestion jobs: {e}");
                return AdmissionOutcome::CheckFailed(e.to_string());
            }
        };

        if !running.is_empty() {
            info!(
                "There are ingestion jobs currently in progress: {}",
                running
                    .iter()
                    .map(|job| job.job_id.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            return AdmissionOutcome::AlreadyInProgress(running);
        }

        match self.jobs.start(&self.target).await {
            Ok(ack) => {
                info!(
                    "Ingestion job started: id={}, status={}",
                    ack.job_id.as_deref().unwrap_or("unknown"),
                    ack.status.as_deref().unwrap_or("unknown")
                );
                AdmissionOutcome::Started(ack)
            }
            Err(e) => {
                error!("Error starting ingestion job: {e}");
                AdmissionOutcome::StartFailed(e.to_string())
            }
        }
    }
}

/// Object-created notification that triggers ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ObjectCreatedEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<ObjectRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObjectRecord {
    pub s3: ObjectEntity,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObjectEntity {
    pub bucket: Bucket,
    pub object: ObjectKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Bucket {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObjectKey {
    pub key: String,
}

impl ObjectCreatedEvent {
    /// Parse a trigger payload. Anything unrecognised is an empty batch.
    #[must_use]
    pub fn from_value(value: serde_json::Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    /// `bucket/key` for every uploaded object.
    #[must_use]
    pub fn object_paths(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| format!("{}/{}", r.s3.bucket.name, r.s3.object.key))
            .collect()
    }
}
