use async_trait::async_trait;
use helpdesk_core::{Result, SessionStore};
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Process-local store for the `chat` command and tests.
#[derive(Default)]
pub struct MemorySessionStore {
    handles: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.handles.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.handles.lock().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, session_id: &str) -> Result<Option<String>> {
        Ok(self.handles.lock().await.get(session_id).cloned())
    }

    async fn put(&self, session_id: &str, continuation_handle: &str) -> Result<()> {
        self.handles
            .lock()
            .await
            .insert(session_id.to_string(), continuation_handle.to_string());
        Ok(())
    }
}
