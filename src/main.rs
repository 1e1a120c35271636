// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::sync::Arc;

use crate::application::receipt_service::ReceiptService;
use crate::infrastructure::azure_client::AzureDocumentIntelligenceClient;
use crate::infrastructure::config::load_settings;
use crate::infrastructure::logging::init_tracing;
use crate::presentation::app_state::AppState;
use crate::presentation::router::create_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Local development reads credentials from .env
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = load_settings()?;

    // Initialize tracing
    init_tracing(&settings.logging)?;

    // Create the Document Intelligence client (infrastructure layer)
    let analyzer = Arc::new(AzureDocumentIntelligenceClient::new(&settings.document_intelligence));

    // Create services (application layer)
    let receipt_service = ReceiptService::new(analyzer, settings.validation);

    // Build router (presentation layer)
    let state = Arc::new(AppState { receipt_service });
    let router = create_router(state, settings.server.max_upload_bytes);

    // Start server
    let addr = settings.server.socket_addr()?;
    tracing::info!("Starting receipt-ocr service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
