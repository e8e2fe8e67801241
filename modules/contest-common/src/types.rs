use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Vocabularies
// ---------------------------------------------------------------------------

/// Competition category. `Lainnya` is the catch-all bucket for values that are
/// known to be a category but match no rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum Category {
    #[serde(rename = "Akademik & Sains")]
    AkademikSains,
    #[serde(rename = "Teknologi & IT")]
    TeknologiIt,
    #[serde(rename = "Seni & Kreatif")]
    SeniKreatif,
    #[serde(rename = "Bisnis & Startup")]
    BisnisStartup,
    #[serde(rename = "Olahraga & E-sports")]
    OlahragaEsports,
    #[serde(rename = "Sastra & Bahasa")]
    SastraBahasa,
    #[serde(rename = "Sosial & Lingkungan")]
    SosialLingkungan,
    #[serde(rename = "Keagamaan")]
    Keagamaan,
    #[serde(rename = "Gaya Hidup & Hobi")]
    GayaHidupHobi,
    #[serde(rename = "Lainnya")]
    Lainnya,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::AkademikSains,
        Category::TeknologiIt,
        Category::SeniKreatif,
        Category::BisnisStartup,
        Category::OlahragaEsports,
        Category::SastraBahasa,
        Category::SosialLingkungan,
        Category::Keagamaan,
        Category::GayaHidupHobi,
        Category::Lainnya,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::AkademikSains => "Akademik & Sains",
            Category::TeknologiIt => "Teknologi & IT",
            Category::SeniKreatif => "Seni & Kreatif",
            Category::BisnisStartup => "Bisnis & Startup",
            Category::OlahragaEsports => "Olahraga & E-sports",
            Category::SastraBahasa => "Sastra & Bahasa",
            Category::SosialLingkungan => "Sosial & Lingkungan",
            Category::Keagamaan => "Keagamaan",
            Category::GayaHidupHobi => "Gaya Hidup & Hobi",
            Category::Lainnya => "Lainnya",
        }
    }
}

/// Audience level the competition is open to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum AudienceLevel {
    #[serde(rename = "SD")]
    Sd,
    #[serde(rename = "SMP")]
    Smp,
    #[serde(rename = "SMA")]
    Sma,
    Mahasiswa,
    Umum,
}

impl AudienceLevel {
    pub const ALL: [AudienceLevel; 5] = [
        AudienceLevel::Sd,
        AudienceLevel::Smp,
        AudienceLevel::Sma,
        AudienceLevel::Mahasiswa,
        AudienceLevel::Umum,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AudienceLevel::Sd => "SD",
            AudienceLevel::Smp => "SMP",
            AudienceLevel::Sma => "SMA",
            AudienceLevel::Mahasiswa => "Mahasiswa",
            AudienceLevel::Umum => "Umum",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum Format {
    Online,
    Offline,
    Hybrid,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Online, Format::Offline, Format::Hybrid];

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Online => "Online",
            Format::Offline => "Offline",
            Format::Hybrid => "Hybrid",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum ParticipationType {
    Individual,
    Team,
}

impl ParticipationType {
    pub const ALL: [ParticipationType; 2] = [ParticipationType::Individual, ParticipationType::Team];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipationType::Individual => "Individual",
            ParticipationType::Team => "Team",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(Category, AudienceLevel, Format, ParticipationType, Field);

// ---------------------------------------------------------------------------
// Field: closed list of canonical field names
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Title,
    Organizer,
    Categories,
    Level,
    StartDate,
    EndDate,
    Format,
    ParticipationType,
    Pricing,
    Contact,
    RegistrationUrl,
    GuideUrl,
    Location,
    PrizePool,
    Benefits,
    SocialMedia,
}

impl Field {
    pub const ALL: [Field; 16] = [
        Field::Title,
        Field::Organizer,
        Field::Categories,
        Field::Level,
        Field::StartDate,
        Field::EndDate,
        Field::Format,
        Field::ParticipationType,
        Field::Pricing,
        Field::Contact,
        Field::RegistrationUrl,
        Field::GuideUrl,
        Field::Location,
        Field::PrizePool,
        Field::Benefits,
        Field::SocialMedia,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Organizer => "organizer",
            Field::Categories => "categories",
            Field::Level => "level",
            Field::StartDate => "startDate",
            Field::EndDate => "endDate",
            Field::Format => "format",
            Field::ParticipationType => "participationType",
            Field::Pricing => "pricing",
            Field::Contact => "contact",
            Field::RegistrationUrl => "registrationUrl",
            Field::GuideUrl => "guideUrl",
            Field::Location => "location",
            Field::PrizePool => "prizePool",
            Field::Benefits => "benefits",
            Field::SocialMedia => "socialMedia",
        }
    }
}

// ---------------------------------------------------------------------------
// SourceTag / inputs
// ---------------------------------------------------------------------------

/// Identifies one backend in the fallback chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceTag(String);

impl SourceTag {
    pub const CAPTION_TEXT: &'static str = "caption-text";
    pub const POSTER_OCR: &'static str = "poster-ocr";
    pub const POSTER_VISION: &'static str = "poster-vision";

    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceTag {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

/// Which part of an item a backend reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendInput {
    Caption,
    Poster,
}

/// One announcement to reconcile: a caption, a poster, or both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
}

impl ContestItem {
    /// The caption, if it has any non-whitespace content.
    pub fn caption(&self) -> Option<&str> {
        self.caption.as_deref().filter(|c| !c.trim().is_empty())
    }

    /// The poster URL, if it has any non-whitespace content.
    pub fn poster_url(&self) -> Option<&str> {
        self.poster_url.as_deref().filter(|p| !p.trim().is_empty())
    }

    pub fn has_input(&self, input: BackendInput) -> bool {
        match input {
            BackendInput::Caption => self.caption().is_some(),
            BackendInput::Poster => self.poster_url().is_some(),
        }
    }

    /// Short label for log lines.
    pub fn label(&self) -> &str {
        self.id.as_deref().unwrap_or("<unnamed>")
    }
}

// ---------------------------------------------------------------------------
// Presence
// ---------------------------------------------------------------------------

/// "Present-valued": non-null, and non-empty for strings, sequences and objects.
pub trait Presence {
    fn is_present(&self) -> bool;
}

impl Presence for String {
    fn is_present(&self) -> bool {
        !self.trim().is_empty()
    }
}

impl<T> Presence for Vec<T> {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl<K, V> Presence for BTreeMap<K, V> {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl Presence for Format {
    fn is_present(&self) -> bool {
        true
    }
}

impl<T: Presence> Presence for Option<T> {
    fn is_present(&self) -> bool {
        self.as_ref().is_some_and(Presence::is_present)
    }
}

// ---------------------------------------------------------------------------
// CanonicalPartial
// ---------------------------------------------------------------------------

pub type SocialMedia = BTreeMap<String, serde_json::Value>;

/// The canonical competition record. Every field is always serialized, either
/// with a typed value or an explicit `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CanonicalPartial {
    /// Competition title
    pub title: Option<String>,
    /// Organizing bodies, in the order the backend listed them
    pub organizer: Option<Vec<String>>,
    pub categories: Option<Vec<Category>>,
    /// Audience levels the competition is open to
    pub level: Option<Vec<AudienceLevel>>,
    /// Registration opens, YYYY-MM-DD
    pub start_date: Option<String>,
    /// Registration closes, YYYY-MM-DD
    pub end_date: Option<String>,
    pub format: Option<Format>,
    pub participation_type: Option<Vec<ParticipationType>>,
    /// Registration fees in rupiah. `[0]` means free; null means unknown.
    pub pricing: Option<Vec<i64>>,
    /// Contact names and numbers
    pub contact: Option<Vec<String>>,
    pub registration_url: Option<String>,
    /// Guidebook link
    pub guide_url: Option<String>,
    pub location: Option<String>,
    /// Total prize, free text
    pub prize_pool: Option<String>,
    pub benefits: Option<String>,
    /// instagram / twitter / website / email / whatsapp
    pub social_media: Option<SocialMedia>,
}

impl CanonicalPartial {
    pub fn is_present(&self, field: Field) -> bool {
        match field {
            Field::Title => self.title.is_present(),
            Field::Organizer => self.organizer.is_present(),
            Field::Categories => self.categories.is_present(),
            Field::Level => self.level.is_present(),
            Field::StartDate => self.start_date.is_present(),
            Field::EndDate => self.end_date.is_present(),
            Field::Format => self.format.is_present(),
            Field::ParticipationType => self.participation_type.is_present(),
            Field::Pricing => self.pricing.is_present(),
            Field::Contact => self.contact.is_present(),
            Field::RegistrationUrl => self.registration_url.is_present(),
            Field::GuideUrl => self.guide_url.is_present(),
            Field::Location => self.location.is_present(),
            Field::PrizePool => self.prize_pool.is_present(),
            Field::Benefits => self.benefits.is_present(),
            Field::SocialMedia => self.social_media.is_present(),
        }
    }

    pub fn present_fields(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|f| self.is_present(*f))
            .collect()
    }

    pub fn has_any_value(&self) -> bool {
        Field::ALL.iter().any(|f| self.is_present(*f))
    }

    /// Copy one field's value (present or null) from `other`.
    pub fn copy_field(&mut self, other: &CanonicalPartial, field: Field) {
        match field {
            Field::Title => self.title = other.title.clone(),
            Field::Organizer => self.organizer = other.organizer.clone(),
            Field::Categories => self.categories = other.categories.clone(),
            Field::Level => self.level = other.level.clone(),
            Field::StartDate => self.start_date = other.start_date.clone(),
            Field::EndDate => self.end_date = other.end_date.clone(),
            Field::Format => self.format = other.format,
            Field::ParticipationType => {
                self.participation_type = other.participation_type.clone()
            }
            Field::Pricing => self.pricing = other.pricing.clone(),
            Field::Contact => self.contact = other.contact.clone(),
            Field::RegistrationUrl => self.registration_url = other.registration_url.clone(),
            Field::GuideUrl => self.guide_url = other.guide_url.clone(),
            Field::Location => self.location = other.location.clone(),
            Field::PrizePool => self.prize_pool = other.prize_pool.clone(),
            Field::Benefits => self.benefits = other.benefits.clone(),
            Field::SocialMedia => self.social_media = other.social_media.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// ProvenanceMap
// ---------------------------------------------------------------------------

/// Which source supplied each field's current value. Entries are write-once.
///
/// Serializes with every canonical field as a key, unset fields as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvenanceMap {
    entries: BTreeMap<Field, SourceTag>,
}

impl ProvenanceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: Field) -> Option<&SourceTag> {
        self.entries.get(&field)
    }

    /// Record `source` for `field` unless the field already has a source.
    /// Returns whether the entry was written.
    pub fn record(&mut self, field: Field, source: &SourceTag) -> bool {
        if self.entries.contains_key(&field) {
            return false;
        }
        self.entries.insert(field, source.clone());
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &SourceTag)> {
        self.entries.iter().map(|(f, s)| (*f, s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keep only the entries for fields that are present in `record`.
    pub fn project(&self, record: &CanonicalPartial) -> ProvenanceMap {
        ProvenanceMap {
            entries: self
                .entries
                .iter()
                .filter(|(f, _)| record.is_present(**f))
                .map(|(f, s)| (*f, s.clone()))
                .collect(),
        }
    }
}

impl Serialize for ProvenanceMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Field::ALL.len()))?;
        for field in Field::ALL {
            map.serialize_entry(field.as_str(), &self.entries.get(&field))?;
        }
        map.end()
    }
}
