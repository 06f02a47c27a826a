use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::llm::api::LlmApiClient;

#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// Thin facade over the API client; the seam the reasoning layer talks to.
#[derive(Clone)]
pub struct LlmProvider {
    client: LlmApiClient,
}

impl LlmProvider {
    pub fn new(config: &LlmConfig, api_key: &str) -> Result<Self> {
        Ok(Self {
            client: LlmApiClient::new(config, api_key)?,
        })
    }

    pub async fn complete_json(
        &self,
        prompt: &str,
        options: Option<&CompletionOptions>,
    ) -> Result<Value> {
        self.client.complete_json(prompt, options).await
    }

    pub async fn complete_structured<T: DeserializeOwned>(
        &self,
        prompt: &str,
        options: Option<&CompletionOptions>,
    ) -> Result<T> {
        let json_value = self.complete_json(prompt, options).await?;

        serde_json::from_value(json_value)
            .map_err(|e| Error::Llm(format!("Failed to deserialize response: {e}")))
    }
}
