// Provider configuration consumed by the client factory

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::openai::{OpenAIClient, OPENAI_API_BASE};
use crate::traits::ChatClient;

/// Configuration for the OpenAI chat-completions provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
    /// Defaults to https://api.openai.com/v1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl ProviderConfig {
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(OPENAI_API_BASE)
    }

    /// Create a chat client from this configuration
    pub fn create_client(&self) -> Result<Arc<dyn ChatClient>> {
        let client = OpenAIClient::new(&self.api_key)?.with_base_url(self.base_url());
        Ok(Arc::new(client))
    }
}
