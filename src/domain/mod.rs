// Domain layer - Analyze-result model, receipt extraction and validation rules
pub mod document;
pub mod receipt;
pub mod validation;
