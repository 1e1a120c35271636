// Analyzer trait for the document extraction backend
use crate::domain::document::AnalyzeResult;
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("request to Document Intelligence failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Document Intelligence returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Document Intelligence did not return an Operation-Location header")]
    MissingOperationLocation,

    #[error("document analysis failed: {0}")]
    Failed(String),

    #[error("document analysis did not finish after {attempts} polls")]
    Timeout { attempts: u32 },
}

#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    /// Run the receipt model over the given file and wait for the result.
    /// The backend detects the file format from the bytes.
    async fn analyze(&self, content: Bytes) -> Result<AnalyzeResult, AnalysisError>;
}
