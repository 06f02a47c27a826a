use crate::config::EmbeddingsConfig;
use crate::embeddings::api::EmbeddingApiClient;
use crate::error::{Error, Result};

/// Embedding entry point for the reasoning layer. Wraps the API client and
/// enforces the configured dimensionality, which the content store's vector
/// column is created at.
#[derive(Clone)]
pub struct EmbeddingProvider {
    client: EmbeddingApiClient,
    dimensions: usize,
}

impl EmbeddingProvider {
    pub fn new(config: &EmbeddingsConfig, api_key: &str) -> Result<Self> {
        Ok(Self {
            client: EmbeddingApiClient::new(config, api_key)?,
            dimensions: config.dimensions,
        })
    }

    pub async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        let embeddings = self.client.embed(&[query]).await?;
        let vector = embeddings
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("No embedding generated".to_string()))?;

        if vector.len() != self.dimensions {
            return Err(Error::Embedding(format!(
                "Embedding dimensionality mismatch: got {}, content store expects {}",
                vector.len(),
                self.dimensions
            )));
        }

        Ok(vector)
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}
