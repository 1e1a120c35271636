// Receipt summary domain model and field extraction rules
use super::document::{AnalyzedDocument, DocumentField};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

pub const NO_TAX_INFORMATION: &str = "No tax information found";
pub const UID_NOT_FOUND: &str = "UID not found";
pub const UID_FORMAT_INVALID: &str = "UID format invalid";

static VAT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2}[A-Z0-9]{8,12}").expect("valid VAT pattern"));

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaxLine {
    pub rate: Option<f64>,
    pub netto: Option<f64>,
    pub tax_amount: Option<f64>,
    pub brutto: Option<f64>,
    pub currency: Option<String>,
}

/// Either the extracted tax lines or a human-readable placeholder
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Taxes {
    Lines(Vec<TaxLine>),
    Missing(&'static str),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReceiptSummary {
    pub filename: Option<String>,
    pub confidence: f64,
    pub country: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    #[serde(rename = "Type")]
    pub receipt_type: Option<String>,
    pub brutto_total: Option<f64>,
    pub tip: Option<f64>,
    pub taxes: Taxes,
    #[serde(rename = "UID")]
    pub uid: String,
}

impl ReceiptSummary {
    pub fn from_document(
        document: &AnalyzedDocument,
        filename: Option<String>,
        uid_field: &str,
        min_uid_confidence: f64,
    ) -> Self {
        let date = document.field("TransactionDate").and_then(DocumentField::date);
        let time = document.field("TransactionTime").and_then(DocumentField::time);

        Self {
            filename,
            confidence: average_confidence(document),
            country: document
                .field("CountryRegion")
                .and_then(|f| f.value_country_region.clone()),
            date: date.map(|d| d.format("%d-%m-%Y").to_string()),
            time: time.map(|t| t.format("%H:%M:%S").to_string()),
            receipt_type: receipt_type(document.field("ReceiptType")),
            brutto_total: document.field("Total").and_then(DocumentField::currency_amount),
            tip: document.field("Tip").and_then(DocumentField::currency_amount),
            taxes: tax_details(document),
            uid: uid_number(document.field(uid_field), min_uid_confidence),
        }
    }
}

fn non_zero(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0)
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn tax_details(document: &AnalyzedDocument) -> Taxes {
    let Some(details) = document.field("TaxDetails") else {
        return Taxes::Missing(NO_TAX_INFORMATION);
    };

    let lines = details
        .value_array
        .iter()
        .map(|detail| {
            let rate = detail.member("Rate").and_then(|f| f.value_number);
            let net_amount = detail.member("NetAmount").and_then(DocumentField::currency_amount);
            let tax_currency = detail.member("Amount").and_then(|f| f.value_currency.as_ref());
            let tax_amount = tax_currency.map(|c| c.amount);

            tracing::info!(
                "Tax Rate: {:?}%, Net Amount: {:?}, Tax Amount: {:?}",
                rate,
                net_amount,
                tax_amount
            );

            let brutto = match (non_zero(net_amount), non_zero(tax_amount)) {
                (Some(net), Some(tax)) => Some(round_to(net + tax, 2)),
                _ => None,
            };

            TaxLine {
                rate: non_zero(rate).map(|r| r * 100.0),
                netto: net_amount,
                tax_amount,
                brutto,
                currency: tax_currency.and_then(|c| c.currency_code.clone()),
            }
        })
        .collect();

    Taxes::Lines(lines)
}

pub fn receipt_type(field: Option<&DocumentField>) -> Option<String> {
    field.and_then(|f| f.value_string.clone())
}

pub fn uid_number(field: Option<&DocumentField>, min_confidence: f64) -> String {
    let value = field
        .filter(|f| f.confidence.is_some_and(|c| c > min_confidence))
        .and_then(|f| f.value_string.as_deref());

    match value {
        Some(uid) if VAT_PATTERN.is_match(uid) => uid.to_string(),
        Some(_) => UID_FORMAT_INVALID.to_string(),
        None => UID_NOT_FOUND.to_string(),
    }
}

/// Mean confidence over all top-level fields that report one, rounded to 4 decimals
pub fn average_confidence(document: &AnalyzedDocument) -> f64 {
    let confidences: Vec<f64> = document
        .fields
        .values()
        .filter_map(|f| f.confidence)
        .collect();

    if confidences.is_empty() {
        return 0.0;
    }

    round_to(confidences.iter().sum::<f64>() / confidences.len() as f64, 4)
}
