// Receipt service - Use case for turning an uploaded file into a validated receipt summary
use crate::application::document_analyzer::{AnalysisError, DocumentAnalyzer};
use crate::domain::receipt::ReceiptSummary;
use crate::domain::validation::{validate, ValidationInput};
use crate::infrastructure::config::ValidationSettings;
use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReceiptError {
    #[error("Invalid file type. Please upload an image.")]
    InvalidFileType,

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Invalid PDF: {0}")]
    InvalidPdf(String),

    #[error("No image_file provided.")]
    MissingUpload,

    #[error("Validation errors: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("No receipt found in document.")]
    NoReceipt,

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// A file received from a client
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: Option<String>,
    pub content_type: String,
    pub content: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UploadKind {
    Image,
    Pdf,
}

impl UploadKind {
    fn detect(content_type: &str) -> Option<Self> {
        if content_type.starts_with("image/") {
            Some(Self::Image)
        } else if content_type.starts_with("application/pdf") {
            Some(Self::Pdf)
        } else {
            None
        }
    }
}

#[derive(Clone)]
pub struct ReceiptService {
    analyzer: Arc<dyn DocumentAnalyzer>,
    validation: ValidationSettings,
}

impl ReceiptService {
    pub fn new(analyzer: Arc<dyn DocumentAnalyzer>, validation: ValidationSettings) -> Self {
        Self {
            analyzer,
            validation,
        }
    }

    pub async fn process(&self, upload: Upload) -> Result<ReceiptSummary, ReceiptError> {
        let name = upload.filename.clone().unwrap_or_default();

        let Some(kind) = UploadKind::detect(&upload.content_type) else {
            tracing::error!("Invalid file type: {}", upload.content_type);
            return Err(ReceiptError::InvalidFileType);
        };

        match kind {
            UploadKind::Image => {
                check_image(upload.content.clone()).await.inspect_err(|e| {
                    tracing::error!("Image load failed: {}", e);
                })?;
                tracing::info!("Image {} loaded successfully", name);
            }
            UploadKind::Pdf => {
                if upload.content.is_empty() {
                    tracing::error!("PDF load failed: empty file {}", name);
                    return Err(ReceiptError::InvalidPdf("Empty PDF file.".to_string()));
                }
            }
        }

        let result = self
            .analyzer
            .analyze(upload.content)
            .await
            .inspect_err(|e| tracing::error!("Analysis of {} failed: {}", name, e))?;

        tracing::debug!(
            "Model {} returned {} document(s)",
            result.model_id.as_deref().unwrap_or("unknown"),
            result.documents.len()
        );

        let Some(document) = result.documents.iter().find(|d| !d.fields.is_empty()) else {
            tracing::error!("No receipt found in {}", name);
            return Err(ReceiptError::NoReceipt);
        };

        tracing::info!("--------Analysis of receipt #{}--------", name);
        tracing::debug!(
            "Document type {:?}, confidence {:?}",
            document.doc_type,
            document.confidence
        );

        let summary = ReceiptSummary::from_document(
            document,
            upload.filename,
            &self.validation.uid_field,
            self.validation.min_uid_confidence,
        );

        let errors = validate(
            &ValidationInput::from_document(document),
            self.validation.min_confidence,
        );
        if !errors.is_empty() {
            tracing::error!("Validation errors for receipt {}: {:?}", name, errors);
            return Err(ReceiptError::Validation(errors));
        }

        tracing::info!("Receipt processed: {:?}", summary);
        Ok(summary)
    }
}

/// Fully decodes the image, so truncated files are rejected as well as garbage
async fn check_image(content: Bytes) -> Result<(), ReceiptError> {
    tokio::task::spawn_blocking(move || image::load_from_memory(&content).map(|_| ()))
        .await
        .map_err(|e| ReceiptError::InvalidImage(e.to_string()))?
        .map_err(|e| ReceiptError::InvalidImage(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::AnalyzeResult;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeAnalyzer {
        result: serde_json::Value,
        calls: AtomicUsize,
    }

    impl FakeAnalyzer {
        fn new(result: serde_json::Value) -> Arc<Self> {
            Arc::new(Self {
                result,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl DocumentAnalyzer for FakeAnalyzer {
        async fn analyze(&self, _content: Bytes) -> Result<AnalyzeResult, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(serde_json::from_value(self.result.clone()).unwrap())
        }
    }

    fn settings() -> ValidationSettings {
        ValidationSettings {
            min_confidence: 0.5,
            min_uid_confidence: 0.7,
            uid_field: "MerchantTaxId".to_string(),
        }
    }

    fn png() -> Bytes {
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgb8(image::RgbImage::new(2, 2))
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        Bytes::from(buf)
    }

    fn upload(content_type: &str, content: Bytes) -> Upload {
        Upload {
            filename: Some("receipt.png".to_string()),
            content_type: content_type.to_string(),
            content,
        }
    }

    fn good_receipt() -> serde_json::Value {
        serde_json::json!({
            "modelId": "prebuilt-receipt",
            "documents": [
                {"docType": "receipt", "fields": {}},
                {"docType": "receipt.retailMeal", "fields": {
                    "TransactionDate": {"type": "date", "valueDate": "2024-03-14", "confidence": 0.9},
                    "Total": {"type": "currency", "valueCurrency": {"amount": 18.4, "currencyCode": "EUR"}, "confidence": 0.8}
                }}
            ]
        })
    }

    #[tokio::test]
    async fn test_process_image() {
        let analyzer = FakeAnalyzer::new(good_receipt());
        let service = ReceiptService::new(analyzer.clone(), settings());

        let summary = service.process(upload("image/png", png())).await.unwrap();
        assert_eq!(summary.filename.as_deref(), Some("receipt.png"));
        assert_eq!(summary.date.as_deref(), Some("14-03-2024"));
        assert_eq!(summary.brutto_total, Some(18.4));
        assert_eq!(summary.confidence, 0.85);
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rejects_unsupported_type() {
        let analyzer = FakeAnalyzer::new(good_receipt());
        let service = ReceiptService::new(analyzer.clone(), settings());

        let err = service
            .process(upload("text/plain", Bytes::from_static(b"hello")))
            .await
            .unwrap_err();
        assert!(matches!(err, ReceiptError::InvalidFileType));
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rejects_corrupt_image() {
        let analyzer = FakeAnalyzer::new(good_receipt());
        let service = ReceiptService::new(analyzer.clone(), settings());

        let err = service
            .process(upload("image/jpeg", Bytes::from_static(b"not a jpeg")))
            .await
            .unwrap_err();
        assert!(matches!(err, ReceiptError::InvalidImage(_)));
        assert!(err.to_string().starts_with("Invalid image: "));
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rejects_empty_pdf() {
        let service = ReceiptService::new(FakeAnalyzer::new(good_receipt()), settings());

        let err = service
            .process(upload("application/pdf", Bytes::new()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid PDF: Empty PDF file.");
    }

    #[tokio::test]
    async fn test_pdf_is_passed_through() {
        let service = ReceiptService::new(FakeAnalyzer::new(good_receipt()), settings());

        let summary = service
            .process(upload("application/pdf", Bytes::from_static(b"%PDF-1.7")))
            .await
            .unwrap();
        assert_eq!(summary.brutto_total, Some(18.4));
    }

    #[tokio::test]
    async fn test_no_receipt() {
        let service = ReceiptService::new(
            FakeAnalyzer::new(serde_json::json!({"documents": []})),
            settings(),
        );

        let err = service.process(upload("image/png", png())).await.unwrap_err();
        assert!(matches!(err, ReceiptError::NoReceipt));
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let service = ReceiptService::new(
            FakeAnalyzer::new(serde_json::json!({"documents": [{"fields": {
                "Total": {"type": "currency", "valueCurrency": {"amount": 3.0}, "confidence": 0.6}
            }}]})),
            settings(),
        );

        let err = service.process(upload("image/png", png())).await.unwrap_err();
        assert_eq!(err.to_string(), "Validation errors: Date is missing.");
    }
}
