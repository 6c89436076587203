use std::time::Duration;
use async_trait::async_trait;
use reqwest::{Client, header};
use url::Url;
use log::{error, trace};

use crate::errors::ProviderError;
use super::{Provider, TranslationRequest, TranslationResponse};

/// HTTP client for the translation endpoint
#[derive(Debug, Clone)]
pub struct HttpProvider {
    /// HTTP client for API requests
    client: Client,
    /// Endpoint receiving one POST per cue
    endpoint: Url,
}

impl HttpProvider {
    /// Create a new client for `endpoint`.
    ///
    /// `timeout` of `None` leaves requests unbounded, so a hanging call stalls
    /// its batch until the service answers.
    pub fn new(endpoint: &str, timeout: Option<Duration>) -> Result<Self, ProviderError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid endpoint '{}': {}", endpoint, e)))?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Provider for HttpProvider {
    async fn complete(&self, request: TranslationRequest) -> Result<TranslationResponse, ProviderError> {
        trace!("POST {} ({} chars -> {})", self.endpoint, request.text.len(), request.target_language);

        let response = self.client.post(self.endpoint.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    ProviderError::ConnectionError(e.to_string())
                } else {
                    ProviderError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Translation service error ({}): {}", status, error_text);
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: error_text,
            });
        }

        response.json::<TranslationResponse>().await
            .map_err(|e| ProviderError::ParseError(e.to_string()))
    }
}
