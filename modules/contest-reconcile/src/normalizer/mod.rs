//! Raw backend JSON → `CanonicalPartial`.
//!
//! `normalize` is total: every rule below reads one field independently and
//! falls back to `None`, so malformed input yields an all-null partial rather
//! than an error.

mod raw;
pub mod vocab;

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use contest_common::{CanonicalPartial, Format, SocialMedia};

pub use raw::RawExtractionResult;
use vocab::{classify_category, classify_format, classify_level, classify_participation, states_free};

static ISO_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());
static DMY_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})[/-](\d{1,2})[/-](\d{4})").unwrap());

const TITLE_KEYS: &[&str] = &["title", "competitionName", "name"];
const URL_KEYS: &[&str] = &["url", "registrationUrl"];
const PRIZE_KEYS: &[&str] = &["prizePool", "prize"];
const CONTACT_PARTS: &[&str] = &["name", "phone", "whatsapp", "email"];

/// Decode and normalize raw backend JSON in one step.
pub fn normalize_value(value: Value) -> CanonicalPartial {
    normalize(&RawExtractionResult::decode(value))
}

pub fn normalize(raw: &RawExtractionResult) -> CanonicalPartial {
    let Some(data) = raw.fields() else {
        if let Some(reason) = raw.malformed_reason() {
            debug!(reason, "Malformed extraction result, normalizing to empty record");
        }
        return CanonicalPartial::default();
    };

    CanonicalPartial {
        title: first_text(data, TITLE_KEYS),
        organizer: text_list(data.get("organizer"), "name"),
        categories: enum_list(data.get("categories"), classify_category),
        level: enum_list(data.get("level"), classify_level),
        start_date: date(data.get("startDate")),
        end_date: date(data.get("endDate")),
        format: format(data.get("format")),
        participation_type: enum_list(data.get("participationType"), classify_participation),
        pricing: pricing(data.get("pricing")),
        contact: contact(data.get("contact")),
        registration_url: first_text(data, URL_KEYS),
        guide_url: text(data.get("guideUrl")),
        location: text(data.get("location")),
        prize_pool: first_text(data, PRIZE_KEYS),
        benefits: text(data.get("benefits")),
        social_media: social_media(data.get("socialMedia")),
    }
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

fn text(value: Option<&Value>) -> Option<String> {
    let s = value?.as_str()?.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn first_text(data: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| text(data.get(*key)))
}

/// Unwrap `{key: inner}` to `inner`; any other value is returned as is.
fn unwrap_wrapper<'a>(value: &'a Value, key: &str) -> &'a Value {
    match value {
        Value::Object(map) => map.get(key).unwrap_or(value),
        _ => value,
    }
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    (!items.is_empty()).then_some(items)
}

/// Scalar-vs-array: a single value becomes a one-element list, an array keeps
/// its readable elements, and an empty result is `None`.
fn elements(value: Option<&Value>) -> Vec<&Value> {
    match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => vec![other],
    }
}

fn text_list(value: Option<&Value>, wrapper: &str) -> Option<Vec<String>> {
    non_empty(
        elements(value)
            .into_iter()
            .filter_map(|v| text(Some(unwrap_wrapper(v, wrapper))))
            .collect(),
    )
}

fn enum_list<T: PartialEq>(value: Option<&Value>, classify: fn(&str) -> Option<T>) -> Option<Vec<T>> {
    let mut out: Vec<T> = Vec::new();
    for v in elements(value) {
        let Some(s) = unwrap_wrapper(v, "type").as_str() else {
            continue;
        };
        if let Some(parsed) = classify(s) {
            if !out.contains(&parsed) {
                out.push(parsed);
            }
        }
    }
    non_empty(out)
}

fn format(value: Option<&Value>) -> Option<Format> {
    elements(value)
        .into_iter()
        .filter_map(|v| unwrap_wrapper(v, "type").as_str())
        .find_map(classify_format)
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

fn date(value: Option<&Value>) -> Option<String> {
    let first = elements(value).into_iter().next()?;
    normalize_date(first.as_str()?)
}

/// `YYYY-MM-DD` is kept, `DD/MM/YYYY` and `DD-MM-YYYY` are reordered
/// positionally, anything else is returned trimmed for the validation gate to
/// judge.
pub fn normalize_date(raw: &str) -> Option<String> {
    let cleaned = raw.trim();
    if cleaned.is_empty() {
        return None;
    }
    if ISO_DATE_RE.is_match(cleaned) {
        return Some(cleaned.to_string());
    }
    if let Some(caps) = DMY_DATE_RE.captures(cleaned) {
        return Some(format!("{}-{:0>2}-{:0>2}", &caps[3], &caps[2], &caps[1]));
    }
    Some(cleaned.to_string())
}

// ---------------------------------------------------------------------------
// Pricing
// ---------------------------------------------------------------------------

fn pricing(value: Option<&Value>) -> Option<Vec<i64>> {
    non_empty(
        elements(value)
            .into_iter()
            .filter_map(|v| amount(unwrap_wrapper(v, "amount")))
            .collect(),
    )
}

fn amount(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64).map(|f| f as i64)),
        Value::String(s) => parse_price(s),
        _ => None,
    }
}

/// Parse a price string by keeping only its digits: `"Rp50.000"` → `50000`.
/// Only a digit-free string that says the event is free parses to `0`, so
/// `"Rp50.000, free e-certificate"` stays `50000`. Any other digit-free
/// string is `None`.
pub fn parse_price(raw: &str) -> Option<i64> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return states_free(raw).then_some(0);
    }
    digits.parse().ok()
}

// ---------------------------------------------------------------------------
// Contact / social media
// ---------------------------------------------------------------------------

fn contact(value: Option<&Value>) -> Option<Vec<String>> {
    non_empty(
        elements(value)
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => {
                    let parts: Vec<&str> = CONTACT_PARTS
                        .iter()
                        .filter_map(|key| map.get(*key)?.as_str())
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .collect();
                    (!parts.is_empty()).then(|| parts.join(" - "))
                }
                other => text(Some(other)),
            })
            .collect(),
    )
}

/// Kept whole if it is a non-empty object. The closed key set is checked by
/// the validation gate, not here.
fn social_media(value: Option<&Value>) -> Option<SocialMedia> {
    match value? {
        Value::Object(map) if !map.is_empty() => {
            Some(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        }
        _ => None,
    }
}
