//! First-writer-wins merge of two canonical partials.

use contest_common::{CanonicalPartial, Field, Presence, ProvenanceMap, SourceTag};

/// Merge `update` into `base`.
///
/// For every field: a present-valued `base` value is kept and its provenance
/// left alone; otherwise `update`'s value is taken (or null), and `source` is
/// recorded as provenance when that value is present. `socialMedia` is merged
/// atomically, never key by key.
///
/// Neither input is modified.
pub fn merge(
    base: &CanonicalPartial,
    update: &CanonicalPartial,
    source: &SourceTag,
    provenance: &ProvenanceMap,
) -> (CanonicalPartial, ProvenanceMap) {
    let mut merged = CanonicalPartial::default();
    let mut provenance = provenance.clone();

    macro_rules! take {
        ($($field:ident => $name:expr),* $(,)?) => {
            $(
                let (value, from_update) = pick(&base.$field, &update.$field);
                merged.$field = value;
                if from_update {
                    provenance.record($name, source);
                }
            )*
        };
    }

    take! {
        title => Field::Title,
        organizer => Field::Organizer,
        categories => Field::Categories,
        level => Field::Level,
        start_date => Field::StartDate,
        end_date => Field::EndDate,
        format => Field::Format,
        participation_type => Field::ParticipationType,
        pricing => Field::Pricing,
        contact => Field::Contact,
        registration_url => Field::RegistrationUrl,
        guide_url => Field::GuideUrl,
        location => Field::Location,
        prize_pool => Field::PrizePool,
        benefits => Field::Benefits,
        social_media => Field::SocialMedia,
    }

    (merged, provenance)
}

/// Returns the winning value and whether it came from `update`.
fn pick<T: Presence + Clone>(base: &Option<T>, update: &Option<T>) -> (Option<T>, bool) {
    if base.is_present() {
        (base.clone(), false)
    } else if update.is_present() {
        (update.clone(), true)
    } else {
        (None, false)
    }
}

/// Fields present in `after` that were not present in `before`.
pub fn contributed_fields(before: &CanonicalPartial, after: &CanonicalPartial) -> Vec<Field> {
    Field::ALL
        .into_iter()
        .filter(|f| after.is_present(*f) && !before.is_present(*f))
        .collect()
}
