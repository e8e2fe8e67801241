// Property-based tests for normalize and merge.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use proptest::prelude::*;
use serde_json::{Map, Value};

use contest_common::{
    AudienceLevel, CanonicalPartial, Category, Field, Format, ParticipationType, ProvenanceMap,
    SocialMedia, SourceTag,
};
use contest_reconcile::{merge, normalize_value};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators: raw backend output
// ---------------------------------------------------------------------------

/// Canonical names, backend aliases and wrapper keys.
const KEYS: &[&str] = &[
    "title", "competitionName", "name", "organizer", "categories", "level", "startDate",
    "endDate", "format", "participationType", "pricing", "contact", "url", "registrationUrl",
    "guideUrl", "location", "prizePool", "prize", "benefits", "socialMedia", "type", "amount",
    "phone", "email", "choices", "message", "content",
];

/// Strings that hit the vocabulary, date and price rules.
const WORDS: &[&str] = &[
    "Gratis", "Rp 50.000", "HTM Rp 25.000 (gratis merchandise)", "5/1/2026", "2026-02-30",
    "2026-01-10", "SMA", "Mahasiswa", "Tim", "Individu", "Online", "Hybrid", "UI/UX Design",
    "https://daftar.id", "instagram", "  ", "",
];

fn arb_key() -> impl Strategy<Value = String> + Clone {
    prop_oneof![
        3 => prop::sample::select(KEYS).prop_map(String::from),
        1 => "[a-zA-Z]{1,8}",
    ]
}

fn arb_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        any::<f64>().prop_map(Value::from),
        prop::sample::select(WORDS).prop_map(Value::from),
        ".{0,20}".prop_map(Value::String),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> + Clone {
    arb_leaf().prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec((arb_key(), inner), 0..8)
                .prop_map(|entries| Value::Object(entries.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

/// An object keyed mostly by field names, sometimes wrapped in a JSON string
/// the way chat backends return it.
fn arb_backend_output() -> impl Strategy<Value = Value> {
    let object = prop::collection::vec((arb_key(), arb_value()), 0..12)
        .prop_map(|entries| Value::Object(entries.into_iter().collect::<Map<_, _>>()));
    prop_oneof![
        3 => object.clone(),
        1 => object.prop_map(|v| Value::String(v.to_string())),
        1 => arb_value(),
    ]
}

// ---------------------------------------------------------------------------
// Generators: canonical partials
// ---------------------------------------------------------------------------

const SOURCES: &[&str] = &[
    SourceTag::CAPTION_TEXT,
    SourceTag::POSTER_OCR,
    SourceTag::POSTER_VISION,
];

/// Text that is sometimes blank, so presence and `Some` differ.
fn arb_text() -> impl Strategy<Value = Option<String>> {
    prop::option::of(prop_oneof![
        3 => "[a-zA-Z0-9 ]{1,12}",
        1 => Just("   ".to_string()),
    ])
}

fn arb_list<T: Clone + std::fmt::Debug + 'static>(
    item: impl Strategy<Value = T> + 'static,
) -> impl Strategy<Value = Option<Vec<T>>> {
    prop::option::of(prop::collection::vec(item, 0..3))
}

fn arb_social() -> impl Strategy<Value = Option<SocialMedia>> {
    prop::option::of(prop::collection::btree_map(
        "[a-z]{1,8}",
        "[a-z@.]{0,10}".prop_map(Value::String),
        0..3,
    ))
}

fn arb_partial() -> impl Strategy<Value = CanonicalPartial> {
    let head = (
        arb_text(),
        arb_list("[a-zA-Z ]{0,10}"),
        arb_list(prop::sample::select(Category::ALL.to_vec())),
        arb_list(prop::sample::select(AudienceLevel::ALL.to_vec())),
        arb_text(),
        arb_text(),
        prop::option::of(prop::sample::select(Format::ALL.to_vec())),
        arb_list(prop::sample::select(ParticipationType::ALL.to_vec())),
    );
    let tail = (
        arb_list(any::<i64>()),
        arb_list("[a-zA-Z0-9 ]{0,10}"),
        arb_text(),
        arb_text(),
        arb_text(),
        arb_text(),
        arb_text(),
        arb_social(),
    );
    (head, tail).prop_map(
        |(
            (title, organizer, categories, level, start_date, end_date, format, participation_type),
            (pricing, contact, registration_url, guide_url, location, prize_pool, benefits, social_media),
        )| CanonicalPartial {
            title,
            organizer,
            categories,
            level,
            start_date,
            end_date,
            format,
            participation_type,
            pricing,
            contact,
            registration_url,
            guide_url,
            location,
            prize_pool,
            benefits,
            social_media,
        },
    )
}

fn arb_source() -> impl Strategy<Value = SourceTag> {
    prop::sample::select(SOURCES).prop_map(SourceTag::from)
}

fn arb_provenance() -> impl Strategy<Value = ProvenanceMap> {
    prop::collection::vec((prop::sample::select(Field::ALL.to_vec()), arb_source()), 0..6).prop_map(
        |entries| {
            let mut provenance = ProvenanceMap::new();
            for (field, source) in &entries {
                provenance.record(*field, source);
            }
            provenance
        },
    )
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn has_type(field: Field, value: &Value) -> bool {
    let strings = |v: &Value| v.as_array().is_some_and(|a| !a.is_empty() && a.iter().all(Value::is_string));
    match field {
        Field::Title
        | Field::StartDate
        | Field::EndDate
        | Field::Format
        | Field::RegistrationUrl
        | Field::GuideUrl
        | Field::Location
        | Field::PrizePool
        | Field::Benefits => value.as_str().is_some_and(|s| !s.trim().is_empty()),
        Field::Organizer
        | Field::Categories
        | Field::Level
        | Field::ParticipationType
        | Field::Contact => strings(value),
        Field::Pricing => value
            .as_array()
            .is_some_and(|a| !a.is_empty() && a.iter().all(Value::is_i64)),
        Field::SocialMedia => value.as_object().is_some_and(|m| !m.is_empty()),
    }
}

/// Per field: `base` if present there, else `update` if present there, else null.
fn first_writer(base: &CanonicalPartial, update: &CanonicalPartial) -> CanonicalPartial {
    let mut expected = CanonicalPartial::default();
    for field in Field::ALL {
        if base.is_present(field) {
            expected.copy_field(base, field);
        } else if update.is_present(field) {
            expected.copy_field(update, field);
        }
    }
    expected
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config())]

    #[test]
    fn normalize_is_total_and_typed(raw in arb_backend_output()) {
        let record = normalize_value(raw);
        let value = serde_json::to_value(&record).unwrap();
        let obj = value.as_object().unwrap();

        prop_assert_eq!(obj.len(), Field::ALL.len());
        for field in Field::ALL {
            let v = &obj[field.as_str()];
            if record.is_present(field) {
                prop_assert!(has_type(field, v), "{} has wrong shape: {}", field, v);
            } else {
                prop_assert!(v.is_null(), "{} is not present but serialized as {}", field, v);
            }
        }
    }

    #[test]
    fn merge_keeps_first_present_value(
        base in arb_partial(),
        update in arb_partial(),
        source in arb_source(),
    ) {
        let (merged, _) = merge(&base, &update, &source, &ProvenanceMap::new());
        prop_assert_eq!(merged, first_writer(&base, &update));
    }

    #[test]
    fn existing_provenance_never_changes(
        base in arb_partial(),
        update in arb_partial(),
        later in arb_partial(),
        prior in arb_provenance(),
        source in arb_source(),
        later_source in arb_source(),
    ) {
        let (merged, provenance) = merge(&base, &update, &source, &prior);

        for (field, tag) in prior.iter() {
            prop_assert_eq!(provenance.get(field), Some(tag));
        }
        for field in Field::ALL {
            if prior.get(field).is_none() {
                let took_update = !base.is_present(field) && update.is_present(field);
                prop_assert_eq!(provenance.get(field), took_update.then_some(&source));
            }
        }

        let (remerged, reprovenance) = merge(&merged, &later, &later_source, &provenance);
        for (field, tag) in provenance.iter() {
            prop_assert_eq!(reprovenance.get(field), Some(tag));
        }
        for field in merged.present_fields() {
            let mut before = CanonicalPartial::default();
            let mut after = CanonicalPartial::default();
            before.copy_field(&merged, field);
            after.copy_field(&remerged, field);
            prop_assert_eq!(before, after);
        }
    }
}
