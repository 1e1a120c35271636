// Confidence-based validation of an extracted receipt
use super::document::{AnalyzedDocument, DocumentField};
use super::receipt::average_confidence;

/// The values validation looks at, pulled out of an analyzed document
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationInput {
    pub average_confidence: f64,
    pub total: Option<f64>,
    pub total_confidence: f64,
    pub date_present: bool,
    pub date_confidence: f64,
}

impl ValidationInput {
    pub fn from_document(document: &AnalyzedDocument) -> Self {
        let total = document.field("Total");
        let date = document.field("TransactionDate");

        Self {
            average_confidence: average_confidence(document),
            total: total.and_then(DocumentField::currency_amount),
            total_confidence: total.and_then(|f| f.confidence).unwrap_or(0.0),
            date_present: date.and_then(DocumentField::date).is_some(),
            date_confidence: date.and_then(|f| f.confidence).unwrap_or(0.0),
        }
    }
}

/// Returns every rule violation; an empty list means the receipt is accepted.
///
/// A low average confidence short-circuits the total checks, the date is
/// always checked.
pub fn validate(input: &ValidationInput, min_confidence: f64) -> Vec<String> {
    let mut errors = Vec::new();

    if input.average_confidence < min_confidence {
        errors.push(format!(
            "Average confidence is too low ({:.2} < {}).",
            input.average_confidence, min_confidence
        ));
    } else if input.total.is_none() {
        errors.push("BruttoTotal is missing.".to_string());
    } else if input.total_confidence < min_confidence {
        errors.push(format!(
            "BruttoTotal confidence is too low ({:.2} < {}).",
            input.total_confidence, min_confidence
        ));
    }

    if !input.date_present {
        errors.push("Date is missing.".to_string());
    } else if input.date_confidence < min_confidence {
        errors.push(format!(
            "Date confidence is too low ({:.2} < {}).",
            input.date_confidence, min_confidence
        ));
    }

    errors
}
