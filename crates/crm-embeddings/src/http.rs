//! HTTP embedding client for OpenAI-compatible endpoints.

use backoff::{backoff::Backoff, ExponentialBackoff};
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};

use async_trait::async_trait;
use crm_types::ProviderSettings;

use crate::error::EmbeddingError;
use crate::model::{Embedding, EmbeddingOutput, EmbeddingProvider};

/// Embedding client for an OpenAI-compatible `/embeddings` endpoint.
pub struct HttpEmbedder {
    client: Client,
    settings: ProviderSettings,
}

impl HttpEmbedder {
    /// Create a new client. Requires a configured provider.
    pub fn new(settings: ProviderSettings) -> Result<Self, EmbeddingError> {
        if !settings.is_configured() {
            return Err(EmbeddingError::Config(
                "embedding provider is not configured (missing api key)".to_string(),
            ));
        }
        settings.validate().map_err(EmbeddingError::Config)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::Config(e.to_string()))?;

        Ok(Self { client, settings })
    }

    /// Make a single embeddings request.
    async fn make_request(&self, text: &str) -> Result<EmbeddingOutput, EmbeddingError> {
        #[derive(Serialize)]
        struct EmbeddingsRequest<'a> {
            model: &'a str,
            input: &'a str,
        }

        #[derive(Deserialize)]
        struct EmbeddingsResponse {
            data: Vec<EmbeddingData>,
            model: String,
            #[serde(default)]
            usage: Option<Usage>,
        }

        #[derive(Deserialize)]
        struct EmbeddingData {
            embedding: Vec<f32>,
        }

        #[derive(Deserialize)]
        struct Usage {
            #[serde(default)]
            total_tokens: u32,
        }

        let api_key = self
            .settings
            .api_key
            .as_ref()
            .ok_or_else(|| EmbeddingError::Config("api key missing".to_string()))?;

        let url = format!("{}/embeddings", self.settings.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key.expose_secret())
            .json(&EmbeddingsRequest {
                model: &self.settings.model,
                input: text,
            })
            .send()
            .await
            .map_err(|e| EmbeddingError::ProviderUnavailable(e.to_string()))?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => return Err(EmbeddingError::RateLimited),
            status if status.is_client_error() => {
                let body = response.text().await.unwrap_or_default();
                return Err(EmbeddingError::ProviderUnavailable(format!(
                    "provider rejected request ({status}): {body}"
                )));
            }
            status if status.is_server_error() => {
                return Err(EmbeddingError::ProviderUnavailable(format!(
                    "provider error ({status})"
                )));
            }
            _ => {}
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::ProviderUnavailable(e.to_string()))?;

        let data = parsed.data.into_iter().next().ok_or_else(|| {
            EmbeddingError::ProviderUnavailable("provider returned no embedding".to_string())
        })?;

        if data.embedding.len() != self.settings.dimension {
            warn!(
                expected = self.settings.dimension,
                actual = data.embedding.len(),
                model = %parsed.model,
                "Provider returned unexpected embedding dimension"
            );
        }

        Ok(EmbeddingOutput {
            embedding: Embedding::new(data.embedding),
            model_id: parsed.model,
            tokens_used: parsed.usage.map(|u| u.total_tokens).unwrap_or(0),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbedder {
    fn model_id(&self) -> &str {
        &self.settings.model
    }

    fn dimension(&self) -> usize {
        self.settings.dimension
    }

    async fn embed(&self, text: &str) -> Result<EmbeddingOutput, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput("empty text".to_string()));
        }

        let mut backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(60)),
            ..Default::default()
        };

        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!(attempt = attempts, model = %self.settings.model, "Calling embedding API");

            match self.make_request(text).await {
                Ok(output) => return Ok(output),
                // Rate limiting and bad input are not retried here; the
                // batch engine paces itself instead.
                Err(e @ (EmbeddingError::RateLimited | EmbeddingError::InvalidInput(_))) => {
                    return Err(e)
                }
                Err(e) => {
                    if attempts >= self.settings.max_retries {
                        error!(error = %e, "Max retries exceeded");
                        return Err(e);
                    }

                    match backoff.next_backoff() {
                        Some(duration) => {
                            warn!(
                                error = %e,
                                retry_in_ms = duration.as_millis(),
                                "Embedding call failed, retrying"
                            );
                            tokio::time::sleep(duration).await;
                        }
                        None => {
                            error!(error = %e, "Backoff exhausted");
                            return Err(e);
                        }
                    }
                }
            }
        }
    }
}
