// HTTP request handlers
use crate::application::receipt_service::{ReceiptError, Upload};
use crate::domain::receipt::ReceiptSummary;
use crate::presentation::app_state::AppState;
use crate::presentation::error::ApiError;
use axum::{
    extract::{Multipart, State},
    Json,
};
use std::sync::Arc;

/// Multipart field carrying the receipt file
pub const UPLOAD_FIELD: &str = "image_file";

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Analyze an uploaded receipt image or PDF
pub async fn process_image(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ReceiptSummary>, ApiError> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().unwrap_or_default().to_string();
        let content = field.bytes().await?;

        // first matching part wins; later ones are never read
        upload = Some(Upload {
            filename,
            content_type,
            content,
        });
        break;
    }

    let upload = upload.ok_or(ReceiptError::MissingUpload)?;
    let summary = state.receipt_service.process(upload).await?;

    Ok(Json(summary))
}
