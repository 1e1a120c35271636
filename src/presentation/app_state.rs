// Application state for HTTP handlers
use crate::application::receipt_service::ReceiptService;

#[derive(Clone)]
pub struct AppState {
    pub receipt_service: ReceiptService,
}
