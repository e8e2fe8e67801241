//! Schema validation with graceful degradation.
//!
//! `validate` first checks the whole record. Only if that fails does it check
//! each present field on its own, keeping the ones that pass. It never
//! returns an error: the degraded record may be empty.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use contest_common::{
    CanonicalPartial, CanonicalSchema, DroppedField, Field, FieldViolation, UrlRule,
};

static ISO_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    FullyValid(CanonicalPartial),
    Degraded {
        record: CanonicalPartial,
        dropped: Vec<DroppedField>,
    },
}

impl Validation {
    pub fn is_fully_valid(&self) -> bool {
        matches!(self, Validation::FullyValid(_))
    }

    pub fn record(&self) -> &CanonicalPartial {
        match self {
            Validation::FullyValid(record) | Validation::Degraded { record, .. } => record,
        }
    }

    pub fn dropped(&self) -> &[DroppedField] {
        match self {
            Validation::FullyValid(_) => &[],
            Validation::Degraded { dropped, .. } => dropped,
        }
    }

    pub fn into_parts(self) -> (CanonicalPartial, Vec<DroppedField>) {
        match self {
            Validation::FullyValid(record) => (record, Vec::new()),
            Validation::Degraded { record, dropped } => (record, dropped),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationGate {
    schema: CanonicalSchema,
}

impl ValidationGate {
    pub fn new(schema: CanonicalSchema) -> Self {
        Self { schema }
    }

    pub fn validate(&self, record: &CanonicalPartial) -> Validation {
        if self.violations(record).is_empty() {
            return Validation::FullyValid(record.clone());
        }

        let mut kept = CanonicalPartial::default();
        let mut dropped = Vec::new();
        for field in Field::ALL {
            if !record.is_present(field) {
                if self.schema.requires(field) {
                    dropped.push(DroppedField {
                        field,
                        reason: FieldViolation::Required,
                    });
                }
                continue;
            }
            match self.check_field(record, field) {
                Ok(()) => kept.copy_field(record, field),
                Err(reason) => {
                    debug!(field = field.as_str(), %reason, "Dropping invalid field");
                    dropped.push(DroppedField { field, reason });
                }
            }
        }

        warn!(
            kept = kept.present_fields().len(),
            dropped = dropped.len(),
            "Record failed full validation, degraded to valid subset"
        );
        Validation::Degraded {
            record: kept,
            dropped,
        }
    }

    /// Every rule the record breaks as a whole: missing required fields and
    /// present fields that fail their own rule.
    pub fn violations(&self, record: &CanonicalPartial) -> Vec<DroppedField> {
        Field::ALL
            .into_iter()
            .filter_map(|field| {
                let result = if record.is_present(field) {
                    self.check_field(record, field)
                } else if self.schema.requires(field) {
                    Err(FieldViolation::Required)
                } else {
                    Ok(())
                };
                result.err().map(|reason| DroppedField { field, reason })
            })
            .collect()
    }

    /// Check one field in isolation. Absent fields pass; requiredness is a
    /// whole-record rule.
    pub fn check_field(&self, record: &CanonicalPartial, field: Field) -> Result<(), FieldViolation> {
        let schema = &self.schema;
        match field {
            Field::Title => check_text(record.title.as_deref()),
            Field::Location => check_text(record.location.as_deref()),
            Field::PrizePool => check_text(record.prize_pool.as_deref()),
            Field::Benefits => check_text(record.benefits.as_deref()),
            Field::Organizer => check_text_list(record.organizer.as_deref()),
            Field::Contact => check_text_list(record.contact.as_deref()),
            Field::Categories => check_allowed(record.categories.as_deref().unwrap_or_default(), &schema.categories),
            Field::Level => check_allowed(record.level.as_deref().unwrap_or_default(), &schema.levels),
            Field::Format => check_allowed(record.format.as_slice(), &schema.formats),
            Field::ParticipationType => {
                let values = record.participation_type.as_deref().unwrap_or_default();
                if !schema.multiple_participation_types && values.len() > 1 {
                    return Err(FieldViolation::TooManyValues(values.len()));
                }
                check_allowed(values, &schema.participation_types)
            }
            Field::StartDate => check_date(record.start_date.as_deref()),
            Field::EndDate => check_date(record.end_date.as_deref()),
            Field::Pricing => match record
                .pricing
                .iter()
                .flatten()
                .find(|amount| **amount < 0)
            {
                Some(negative) => Err(FieldViolation::NegativeAmount(*negative)),
                None => Ok(()),
            },
            Field::RegistrationUrl => check_url(record.registration_url.as_deref(), schema.urls),
            Field::GuideUrl => check_url(record.guide_url.as_deref(), schema.urls),
            Field::SocialMedia => {
                for (key, value) in record.social_media.iter().flatten() {
                    if !schema.allows_social_key(key) {
                        return Err(FieldViolation::UnknownKey(key.clone()));
                    }
                    if !matches!(value, Value::String(_) | Value::Null) {
                        return Err(FieldViolation::NonStringValue(key.clone()));
                    }
                }
                Ok(())
            }
        }
    }
}

fn check_text(value: Option<&str>) -> Result<(), FieldViolation> {
    match value {
        Some(s) if s.trim().is_empty() => Err(FieldViolation::Empty),
        _ => Ok(()),
    }
}

fn check_text_list(values: Option<&[String]>) -> Result<(), FieldViolation> {
    values
        .unwrap_or_default()
        .iter()
        .try_for_each(|s| check_text(Some(s)))
}

fn check_allowed<T: PartialEq + std::fmt::Display>(values: &[T], allowed: &[T]) -> Result<(), FieldViolation> {
    match values.iter().find(|v| !allowed.contains(v)) {
        Some(v) => Err(FieldViolation::NotAllowed(v.to_string())),
        None => Ok(()),
    }
}

fn check_date(value: Option<&str>) -> Result<(), FieldViolation> {
    let Some(s) = value else {
        return Ok(());
    };
    if ISO_DATE_RE.is_match(s) && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() {
        Ok(())
    } else {
        Err(FieldViolation::InvalidDate(s.to_string()))
    }
}

fn check_url(value: Option<&str>, rule: UrlRule) -> Result<(), FieldViolation> {
    let Some(raw) = value else {
        return Ok(());
    };
    let s = raw.trim();
    let ok = match rule {
        UrlRule::Text => !s.is_empty(),
        UrlRule::Strict => is_http_url(s),
        UrlRule::Lenient => {
            is_http_url(s)
                || (!s.contains("://")
                    && parse_http_url(&format!("https://{s}"))
                        .is_some_and(|u| u.host_str().is_some_and(|h| h.contains('.'))))
        }
    };
    if ok {
        Ok(())
    } else {
        Err(FieldViolation::InvalidUrl(raw.to_string()))
    }
}

fn parse_http_url(s: &str) -> Option<Url> {
    Url::parse(s)
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
}

fn is_http_url(s: &str) -> bool {
    parse_http_url(s).is_some()
}
