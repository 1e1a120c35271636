// Azure Document Intelligence client (REST, submit then poll)
use crate::application::document_analyzer::{AnalysisError, DocumentAnalyzer};
use crate::domain::document::{AnalyzeOperation, AnalyzeResult, OperationStatus};
use crate::infrastructure::config::DocumentIntelligenceSettings;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Response, StatusCode};
use std::time::Duration;

const API_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const OPERATION_LOCATION_HEADER: &str = "Operation-Location";
const OCTET_STREAM: &str = "application/octet-stream";
const MAX_RETRY_AFTER: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct AzureDocumentIntelligenceClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model_id: String,
    api_version: String,
    locale: String,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl AzureDocumentIntelligenceClient {
    pub fn new(settings: &DocumentIntelligenceSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            model_id: settings.model_id.clone(),
            api_version: settings.api_version.clone(),
            locale: settings.locale.clone(),
            poll_interval: Duration::from_millis(settings.poll_interval_ms),
            max_poll_attempts: settings.max_poll_attempts,
        }
    }

    fn analyze_url(&self) -> String {
        format!(
            "{}/documentintelligence/documentModels/{}:analyze?api-version={}&locale={}",
            self.endpoint, self.model_id, self.api_version, self.locale
        )
    }

    async fn upstream_error(response: Response) -> AnalysisError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        AnalysisError::Upstream { status, body }
    }

    /// Start an analyze operation and return its Operation-Location URL
    async fn submit(&self, content: Bytes) -> Result<String, AnalysisError> {
        let response = self
            .client
            .post(self.analyze_url())
            .header(API_KEY_HEADER, &self.api_key)
            .header(CONTENT_TYPE, OCTET_STREAM)
            .body(content)
            .send()
            .await?;

        if response.status() != StatusCode::ACCEPTED {
            return Err(Self::upstream_error(response).await);
        }

        response
            .headers()
            .get(OPERATION_LOCATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or(AnalysisError::MissingOperationLocation)
    }

    async fn poll(&self, operation_url: &str) -> Result<AnalyzeResult, AnalysisError> {
        for attempt in 1..=self.max_poll_attempts {
            let response = self
                .client
                .get(operation_url)
                .header(API_KEY_HEADER, &self.api_key)
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(Self::upstream_error(response).await);
            }

            let delay = retry_delay(
                response.headers().get(RETRY_AFTER).and_then(|v| v.to_str().ok()),
                self.poll_interval,
            );

            let operation = response.json::<AnalyzeOperation>().await?;

            match operation.status {
                OperationStatus::Succeeded => {
                    tracing::debug!("Analyze operation finished after {} polls", attempt);
                    return Ok(operation.analyze_result.unwrap_or_default());
                }
                OperationStatus::Failed | OperationStatus::Canceled => {
                    let message = operation
                        .error
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| format!("operation {:?}", operation.status));
                    return Err(AnalysisError::Failed(message));
                }
                OperationStatus::NotStarted | OperationStatus::Running => {
                    tracing::debug!("Analyze operation still {:?} (poll {})", operation.status, attempt);
                    tokio::time::sleep(delay).await;
                }
            }
        }

        Err(AnalysisError::Timeout {
            attempts: self.max_poll_attempts,
        })
    }
}

/// Wait time before the next poll: the server's `Retry-After` seconds, capped,
/// or the configured interval when the header is absent or unparsable.
fn retry_delay(retry_after: Option<&str>, fallback: Duration) -> Duration {
    retry_after
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|secs| Duration::from_secs(secs).min(MAX_RETRY_AFTER))
        .unwrap_or(fallback)
}

#[async_trait]
impl DocumentAnalyzer for AzureDocumentIntelligenceClient {
    async fn analyze(&self, content: Bytes) -> Result<AnalyzeResult, AnalysisError> {
        tracing::debug!("Submitting {} bytes to model {}", content.len(), self.model_id);
        let operation_url = self.submit(content).await?;
        self.poll(&operation_url).await
    }
}
