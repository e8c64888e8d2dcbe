use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

use super::errors::ProviderError;

/// Delivers a complete request document and returns the raw response text.
///
/// Implementations do no interpretation of the response; a transport error
/// means the provider could not be reached or answered with a non-2xx status.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &str) -> Result<String, ProviderError>;
}

/// Posts requests to the site's XML service over HTTPS.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| ProviderError::Transport(format!("failed to build HTTP client: {}", e)))?;
        let endpoint = endpoint.into();

        info!("Initialized WebEx transport with endpoint: {}", endpoint);

        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &str) -> Result<String, ProviderError> {
        debug!("Sending {} byte request to {}", request.len(), self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/xml; charset=UTF-8")
            .body(request.to_string())
            .send()
            .await
            .map_err(|e| ProviderError::Transport(format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Transport(format!("failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(ProviderError::Transport(format!(
                "service answered with status {}",
                status
            )));
        }

        Ok(body)
    }
}
