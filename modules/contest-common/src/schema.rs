//! Declarative description of the canonical record.
//!
//! The same `CanonicalSchema` drives both the whole-record check and the
//! per-field isolation checks in the validation gate. It is plain data so it
//! can be loaded from the `[schema]` table of the TOML config.

use std::collections::BTreeSet;

use schemars::schema::RootSchema;
use serde::{Deserialize, Serialize};

use crate::types::{AudienceLevel, CanonicalPartial, Category, Field, Format, ParticipationType};

/// How `registrationUrl` and `guideUrl` are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlRule {
    /// Must parse as an http(s) URL.
    Strict,
    /// http(s) URL, or a bare `host.tld/path` that parses once `https://` is prepended.
    #[default]
    Lenient,
    /// Any non-empty text.
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CanonicalSchema {
    /// Fields that must be present for the record to be fully valid.
    pub required: BTreeSet<Field>,
    pub categories: Vec<Category>,
    pub levels: Vec<AudienceLevel>,
    pub formats: Vec<Format>,
    pub participation_types: Vec<ParticipationType>,
    /// When false, `participationType` may hold at most one value.
    pub multiple_participation_types: bool,
    /// Closed key set for `socialMedia`.
    pub social_media_keys: Vec<String>,
    pub urls: UrlRule,
}

impl Default for CanonicalSchema {
    fn default() -> Self {
        Self {
            required: [Field::Title, Field::Organizer, Field::RegistrationUrl]
                .into_iter()
                .collect(),
            categories: Category::ALL.to_vec(),
            levels: AudienceLevel::ALL.to_vec(),
            formats: Format::ALL.to_vec(),
            participation_types: ParticipationType::ALL.to_vec(),
            multiple_participation_types: true,
            social_media_keys: ["instagram", "twitter", "website", "email", "whatsapp"]
                .into_iter()
                .map(String::from)
                .collect(),
            urls: UrlRule::default(),
        }
    }
}

impl CanonicalSchema {
    pub fn with_required(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.required = fields.into_iter().collect();
        self
    }

    pub fn requires(&self, field: Field) -> bool {
        self.required.contains(&field)
    }

    pub fn allows_social_key(&self, key: &str) -> bool {
        self.social_media_keys.iter().any(|k| k == key)
    }
}

/// JSON Schema of the canonical record, for backends that accept a
/// structured-output schema.
pub fn canonical_json_schema() -> RootSchema {
    schemars::schema_for!(CanonicalPartial)
}
