//! Mock master title lookup for testing.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::provider::{MasterTitle, MasterTitleResolver, ProviderError};

/// Mock master title lookup.
pub struct MockMasterResolver {
    answer: Option<MasterTitle>,
    fail: bool,
    calls: RwLock<usize>,
}

impl MockMasterResolver {
    /// Always answers with `answer`.
    pub fn new(answer: Option<MasterTitle>) -> Self {
        Self {
            answer,
            fail: false,
            calls: RwLock::new(0),
        }
    }

    /// Always fails.
    pub fn failing() -> Self {
        Self {
            answer: None,
            fail: true,
            calls: RwLock::new(0),
        }
    }

    pub async fn calls(&self) -> usize {
        *self.calls.read().await
    }
}

#[async_trait]
impl MasterTitleResolver for MockMasterResolver {
    async fn master_title(&self, _text: &str) -> Result<Option<MasterTitle>, ProviderError> {
        *self.calls.write().await += 1;
        if self.fail {
            return Err(ProviderError::Unavailable("mock failure".to_string()));
        }
        Ok(self.answer.clone())
    }
}
