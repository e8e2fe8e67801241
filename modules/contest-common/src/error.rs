use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::types::{Field, SourceTag};

/// Soft failures surfaced while reconciling one item. None of these abort
/// the item; they end up in the diagnostic trail.
#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("source {source_tag} unavailable: {message}")]
    SourceUnavailable { source_tag: SourceTag, message: String },

    #[error("malformed response from {source_tag}: {reason}")]
    MalformedResponse { source_tag: SourceTag, reason: String },
}

/// Why a single field failed its schema rule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldViolation {
    #[error("required")]
    Required,

    #[error("empty")]
    Empty,

    #[error("invalid date `{0}`, expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("negative amount {0}")]
    NegativeAmount(i64),

    #[error("value `{0}` not allowed")]
    NotAllowed(String),

    #[error("expected a single value, got {0}")]
    TooManyValues(usize),

    #[error("invalid url `{0}`")]
    InvalidUrl(String),

    #[error("unknown key `{0}`")]
    UnknownKey(String),

    #[error("non-string value for `{0}`")]
    NonStringValue(String),
}

/// A field removed from a degraded record, with the rule it broke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedField {
    pub field: Field,
    #[serde(serialize_with = "serialize_display")]
    pub reason: FieldViolation,
}

fn serialize_display<S: Serializer>(value: &FieldViolation, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soft_failures_name_their_source() {
        let err = ReconcileError::SourceUnavailable {
            source_tag: SourceTag::POSTER_OCR.into(),
            message: "503 Service Unavailable".into(),
        };
        assert_eq!(err.to_string(), "source poster-ocr unavailable: 503 Service Unavailable");
        let err = ReconcileError::MalformedResponse {
            source_tag: SourceTag::CAPTION_TEXT.into(),
            reason: "not an object".into(),
        };
        assert_eq!(err.to_string(), "malformed response from caption-text: not an object");
    }

    #[test]
    fn dropped_field_serializes_reason_as_text() {
        let dropped = DroppedField {
            field: Field::RegistrationUrl,
            reason: FieldViolation::Required,
        };
        let value = serde_json::to_value(&dropped).unwrap();
        assert_eq!(value["field"], "registrationUrl");
        assert_eq!(value["reason"], "required");
    }
}
