use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;

pub const ENDPOINT_VAR: &str = "DOCUMENTINTELLIGENCE_ENDPOINT";
pub const API_KEY_VAR: &str = "DOCUMENTINTELLIGENCE_API_KEY";
const ENV_PREFIX: &str = "RECEIPT_OCR";

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub document_intelligence: DocumentIntelligenceSettings,
    pub server: ServerSettings,
    pub validation: ValidationSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DocumentIntelligenceSettings {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    pub model_id: String,
    pub api_version: String,
    pub locale: String,
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

impl ServerSettings {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ValidationSettings {
    pub min_confidence: f64,
    pub min_uid_confidence: f64,
    /// Analyze-result field holding the merchant VAT id
    pub uid_field: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub directory: String,
    pub file_name: String,
    pub max_bytes: u64,
    pub backup_count: usize,
}

/// Load settings from `config/receipt_ocr.*` and the process environment.
pub fn load_settings() -> anyhow::Result<Settings> {
    settings_from(std::env::vars().collect())
}

/// Defaults, then the optional config file, then `RECEIPT_OCR__*` variables, then
/// the two Document Intelligence credentials.
pub fn settings_from(vars: HashMap<String, String>) -> anyhow::Result<Settings> {
    let endpoint = vars.get(ENDPOINT_VAR).cloned();
    let api_key = vars.get(API_KEY_VAR).cloned();

    let settings = config::Config::builder()
        .set_default("document_intelligence.model_id", "prebuilt-receipt")?
        .set_default("document_intelligence.api_version", "2024-11-30")?
        .set_default("document_intelligence.locale", "de")?
        .set_default("document_intelligence.poll_interval_ms", 1000)?
        .set_default("document_intelligence.max_poll_attempts", 60)?
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8000)?
        .set_default("server.max_upload_bytes", 20 * 1024 * 1024)?
        .set_default("validation.min_confidence", 0.5)?
        .set_default("validation.min_uid_confidence", 0.7)?
        .set_default("validation.uid_field", "MerchantTaxId")?
        .set_default("logging.directory", "logs")?
        .set_default("logging.file_name", "ocr_api.log")?
        .set_default("logging.max_bytes", 1024 * 1024)?
        .set_default("logging.backup_count", 3)?
        .add_source(config::File::with_name("config/receipt_ocr").required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .source(Some(vars)),
        )
        .set_override_option("document_intelligence.endpoint", endpoint)?
        .set_override_option("document_intelligence.api_key", api_key)?
        .build()?;

    let settings: Settings = settings.try_deserialize()?;

    let di = &settings.document_intelligence;
    if di.endpoint.trim().is_empty() || di.api_key.trim().is_empty() {
        anyhow::bail!("Azure Document Intelligence credentials not found in environment variables.");
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let settings = settings_from(vars(&[
            (ENDPOINT_VAR, "https://example.cognitiveservices.azure.com/"),
            (API_KEY_VAR, "secret"),
        ]))
        .unwrap();

        assert_eq!(settings.document_intelligence.endpoint, "https://example.cognitiveservices.azure.com/");
        assert_eq!(settings.document_intelligence.api_key, "secret");
        assert_eq!(settings.document_intelligence.model_id, "prebuilt-receipt");
        assert_eq!(settings.document_intelligence.locale, "de");
        assert_eq!(settings.server.socket_addr().unwrap(), "0.0.0.0:8000".parse().unwrap());
        assert_eq!(settings.validation.min_confidence, 0.5);
        assert_eq!(settings.validation.uid_field, "MerchantTaxId");
        assert_eq!(settings.logging.file_name, "ocr_api.log");
        assert_eq!(settings.logging.max_bytes, 1024 * 1024);
        assert_eq!(settings.logging.backup_count, 3);
    }

    #[test]
    fn test_prefixed_overrides() {
        let settings = settings_from(vars(&[
            (ENDPOINT_VAR, "https://example.test"),
            (API_KEY_VAR, "secret"),
            ("RECEIPT_OCR__SERVER__PORT", "9000"),
            ("RECEIPT_OCR__DOCUMENT_INTELLIGENCE__LOCALE", "en-US"),
            ("RECEIPT_OCR__VALIDATION__UID_FIELD", "VendorTaxId"),
        ]))
        .unwrap();

        assert_eq!(settings.validation.uid_field, "VendorTaxId");

        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.document_intelligence.locale, "en-US");
    }

    #[test]
    fn test_missing_credentials() {
        let err = settings_from(vars(&[(ENDPOINT_VAR, "https://example.test")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Azure Document Intelligence credentials not found in environment variables."
        );

        assert!(settings_from(vars(&[(ENDPOINT_VAR, ""), (API_KEY_VAR, "secret")])).is_err());
    }
}
