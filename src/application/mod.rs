// Application layer - Use cases and the ports they depend on
pub mod document_analyzer;
pub mod receipt_service;
