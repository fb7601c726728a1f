use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::operation::get_item::builders::GetItemFluentBuilder;
use aws_sdk_dynamodb::operation::update_item::builders::UpdateItemFluentBuilder;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use helpdesk_core::{Error, Result, SessionStore};
use std::collections::HashMap;
use tracing::{debug, info};

/// Partition key of the session table.
pub const SESSION_KEY: &str = "SessionID_Lex";
/// Attribute holding the continuation handle.
pub const HANDLE_ATTRIBUTE: &str = "kbsession";
pub const UPDATED_AT_ATTRIBUTE: &str = "updatedAt";

fn store_error(e: impl std::error::Error) -> Error {
    Error::Store(DisplayErrorContext(&e).to_string())
}

fn handle_from_item(item: Option<&HashMap<String, AttributeValue>>) -> Option<String> {
    item?.get(HANDLE_ATTRIBUTE)?.as_s().ok().cloned()
}

pub struct DynamoSessionStore {
    client: Client,
    table_name: String,
}

impl DynamoSessionStore {
    pub fn new(sdk_config: &aws_config::SdkConfig, table_name: impl Into<String>) -> Self {
        let table_name = table_name.into();
        info!("Using session table: {table_name}");
        Self {
            client: Client::new(sdk_config),
            table_name,
        }
    }

    #[must_use]
    pub fn from_client(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    fn key(session_id: &str) -> AttributeValue {
        AttributeValue::S(session_id.to_string())
    }

    fn get_request(&self, session_id: &str) -> GetItemFluentBuilder {
        self.client
            .get_item()
            .table_name(&self.table_name)
            .key(SESSION_KEY, Self::key(session_id))
            .consistent_read(true)
    }

    /// Upsert of the handle and its timestamp; other attributes are kept.
    fn put_request(
        &self,
        session_id: &str,
        continuation_handle: &str,
        updated_at: &str,
    ) -> UpdateItemFluentBuilder {
        self.client
            .update_item()
            .table_name(&self.table_name)
            .key(SESSION_KEY, Self::key(session_id))
            .update_expression("SET #handle = :handle, #updated = :updated")
            .expression_attribute_names("#handle", HANDLE_ATTRIBUTE)
            .expression_attribute_names("#updated", UPDATED_AT_ATTRIBUTE)
            .expression_attribute_values(
                ":handle",
                AttributeValue::S(continuation_handle.to_string()),
            )
            .expression_attribute_values(":updated", AttributeValue::S(updated_at.to_string()))
            .return_values(ReturnValue::UpdatedNew)
    }
}

#[async_trait]
impl SessionStore for DynamoSessionStore {
    async fn get(&self, session_id: &str) -> Result<Option<String>> {
        let output = self
            .get_request(session_id)
            .send()
            .await
            .map_err(store_error)?;

        let handle = handle_from_item(output.item());
        debug!(
            "Session {session_id}: {}",
            if handle.is_some() {
                "found continuation handle"
            } else {
                "no continuation handle"
            }
        );
        Ok(handle)
    }

    async fn put(&self, session_id: &str, continuation_handle: &str) -> Result<()> {
        self.put_request(
            session_id,
            continuation_handle,
            &chrono::Utc::now().to_rfc3339(),
        )
        .send()
        .await
        .map_err(store_error)?;

        debug!("Saved continuation handle for session {session_id}");
        Ok(())
    }
}
