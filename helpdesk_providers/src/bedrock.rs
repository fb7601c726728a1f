use async_trait::async_trait;
use aws_sdk_bedrockagentruntime::Client;
use aws_sdk_bedrockagentruntime::error::{BuildError, DisplayErrorContext};
use aws_sdk_bedrockagentruntime::operation::retrieve_and_generate::builders::RetrieveAndGenerateFluentBuilder;
use aws_sdk_bedrockagentruntime::types::{
    KnowledgeBaseRetrieveAndGenerateConfiguration, RetrieveAndGenerateConfiguration,
    RetrieveAndGenerateInput, RetrieveAndGenerateType,
};
use helpdesk_core::{Error, GenerateRequest, Generation, KnowledgeBase, Result};
use tracing::{debug, info};

/// Retrieve-and-generate against a Bedrock knowledge base.
///
/// The continuation handle is Bedrock's own `sessionId`; Bedrock keeps the
/// conversation context server side.
#[derive(Clone)]
pub struct BedrockKnowledgeBase {
    client: Client,
}

fn build_error(e: BuildError) -> Error {
    Error::KnowledgeBase(format!("invalid request: {e}"))
}

fn configuration(request: &GenerateRequest) -> Result<RetrieveAndGenerateConfiguration> {
    let knowledge_base = KnowledgeBaseRetrieveAndGenerateConfiguration::builder()
        .knowledge_base_id(&request.knowledge_base_id)
        .model_arn(&request.model_arn)
        .build()
        .map_err(build_error)?;

    RetrieveAndGenerateConfiguration::builder()
        .r#type(RetrieveAndGenerateType::KnowledgeBase)
        .knowledge_base_configuration(knowledge_base)
        .build()
        .map_err(build_error)
}

impl BedrockKnowledgeBase {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        info!("Creating BedrockKnowledgeBase");
        Self {
            client: Client::new(sdk_config),
        }
    }

    #[must_use]
    pub const fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// The session id is only set when resuming a context.
    fn retrieve_and_generate_request(
        &self,
        request: &GenerateRequest,
    ) -> Result<RetrieveAndGenerateFluentBuilder> {
        let input = RetrieveAndGenerateInput::builder()
            .text(&request.input_text)
            .build()
            .map_err(build_error)?;

        Ok(self
            .client
            .retrieve_and_generate()
            .set_session_id(request.continuation_handle.clone())
            .input(input)
            .retrieve_and_generate_configuration(configuration(request)?))
    }
}

#[async_trait]
impl KnowledgeBase for BedrockKnowledgeBase {
    async fn retrieve_and_generate(&self, request: &GenerateRequest) -> Result<Generation> {
        match &request.continuation_handle {
            Some(handle) => debug!("Resuming Bedrock session {handle}"),
            None => debug!("No Bedrock session, starting a new one"),
        }

        let response = self
            .retrieve_and_generate_request(request)?
            .send()
            .await
            .map_err(|e| Error::KnowledgeBase(DisplayErrorContext(&e).to_string()))?;

        let text = response.output().map(|output| output.text().to_string());
        let continuation_handle = response.session_id().to_string();

        info!(
            "Received Bedrock answer for session {continuation_handle}: {} chars",
            text.as_ref().map_or(0, String::len)
        );

        Ok(Generation {
            text,
            continuation_handle,
        })
    }
}
