// Document Intelligence analyze-result models (REST API, camelCase JSON)
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationStatus {
    NotStarted,
    Running,
    Succeeded,
    Failed,
    Canceled,
}

/// Body returned when polling an analyze operation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeOperation {
    pub status: OperationStatus,
    #[serde(default)]
    pub error: Option<OperationError>,
    #[serde(default)]
    pub analyze_result: Option<AnalyzeResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OperationError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl std::fmt::Display for OperationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.code, &self.message) {
            (Some(code), Some(message)) => write!(f, "{}: {}", code, message),
            (None, Some(message)) => write!(f, "{}", message),
            (Some(code), None) => write!(f, "{}", code),
            (None, None) => write!(f, "unknown error"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResult {
    #[serde(default)]
    pub model_id: Option<String>,
    #[serde(default)]
    pub documents: Vec<AnalyzedDocument>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedDocument {
    #[serde(default)]
    pub doc_type: Option<String>,
    #[serde(default)]
    pub fields: HashMap<String, DocumentField>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl AnalyzedDocument {
    pub fn field(&self, name: &str) -> Option<&DocumentField> {
        self.fields.get(name)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyValue {
    pub amount: f64,
    #[serde(default)]
    pub currency_code: Option<String>,
    #[allow(dead_code)]
    #[serde(default)]
    pub currency_symbol: Option<String>,
}

/// A single extracted field. Only the `value*` member matching `field_type` is set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentField {
    #[allow(dead_code)]
    #[serde(rename = "type", default)]
    pub field_type: Option<String>,
    #[allow(dead_code)]
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub value_string: Option<String>,
    #[serde(default)]
    pub value_number: Option<f64>,
    #[serde(default)]
    pub value_date: Option<String>,
    #[serde(default)]
    pub value_time: Option<String>,
    #[serde(default)]
    pub value_country_region: Option<String>,
    #[serde(default)]
    pub value_currency: Option<CurrencyValue>,
    #[serde(default)]
    pub value_array: Vec<DocumentField>,
    #[serde(default)]
    pub value_object: HashMap<String, DocumentField>,
}

impl DocumentField {
    pub fn date(&self) -> Option<NaiveDate> {
        self.value_date
            .as_deref()
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
    }

    pub fn time(&self) -> Option<NaiveTime> {
        self.value_time.as_deref().and_then(|s| {
            NaiveTime::parse_from_str(s, "%H:%M:%S")
                .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
                .ok()
        })
    }

    pub fn currency_amount(&self) -> Option<f64> {
        self.value_currency.as_ref().map(|c| c.amount)
    }

    pub fn member(&self, name: &str) -> Option<&DocumentField> {
        self.value_object.get(name)
    }
}
