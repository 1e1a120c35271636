// HTTP error responses, rendered as {"detail": "..."}
use crate::application::document_analyzer::AnalysisError;
use crate::application::receipt_service::ReceiptError;
use axum::extract::multipart::MultipartError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

impl From<ReceiptError> for ApiError {
    fn from(err: ReceiptError) -> Self {
        let status = match &err {
            ReceiptError::InvalidFileType
            | ReceiptError::InvalidImage(_)
            | ReceiptError::InvalidPdf(_)
            | ReceiptError::MissingUpload
            | ReceiptError::Validation(_) => StatusCode::BAD_REQUEST,
            ReceiptError::NoReceipt => StatusCode::UNPROCESSABLE_ENTITY,
            ReceiptError::Analysis(AnalysisError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            ReceiptError::Analysis(_) => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, err.to_string())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::new(err.status(), err.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::from(ReceiptError::InvalidFileType).status, StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::from(ReceiptError::NoReceipt).status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            ApiError::from(ReceiptError::Analysis(AnalysisError::Timeout { attempts: 5 })).status,
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            ApiError::from(ReceiptError::Analysis(AnalysisError::Failed("boom".to_string()))).status,
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_validation_detail() {
        let err = ApiError::from(ReceiptError::Validation(vec![
            "BruttoTotal is missing.".to_string(),
            "Date is missing.".to_string(),
        ]));
        assert_eq!(err.detail, "Validation errors: BruttoTotal is missing., Date is missing.");
    }
}
