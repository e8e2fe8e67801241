//! Vocabulary matching for the enumerated fields.
//!
//! Matching runs in two stages: an exact, case-insensitive match against the
//! canonical spelling, then the keyword buckets below. Buckets are checked
//! top to bottom and the first one with a matching keyword wins, so the
//! order of each table is part of its meaning.

use contest_common::{AudienceLevel, Category, Format, ParticipationType};

/// Keywords (lowercase substrings) that map to one canonical value.
pub struct Bucket<T: 'static> {
    pub keywords: &'static [&'static str],
    pub value: T,
}

pub const CATEGORY_BUCKETS: &[Bucket<Category>] = &[
    Bucket {
        keywords: &["akademik", "sains", "olympiade", "kti", "esai", "riset"],
        value: Category::AkademikSains,
    },
    Bucket {
        keywords: &["teknologi", "it", "coding", "programming", "robotik", "ui", "ux"],
        value: Category::TeknologiIt,
    },
    Bucket {
        keywords: &["seni", "kreatif", "desain", "fotografi", "musik", "tari"],
        value: Category::SeniKreatif,
    },
    Bucket {
        keywords: &["bisnis", "startup", "business", "pitching"],
        value: Category::BisnisStartup,
    },
    Bucket {
        keywords: &["olahraga", "esport", "game", "mobile legend"],
        value: Category::OlahragaEsports,
    },
    Bucket {
        keywords: &["sastra", "bahasa", "cerpen", "puisi"],
        value: Category::SastraBahasa,
    },
    Bucket {
        keywords: &["sosial", "lingkungan"],
        value: Category::SosialLingkungan,
    },
    Bucket {
        keywords: &["agama", "islam", "mtq"],
        value: Category::Keagamaan,
    },
];

/// Returned when a category string matches no bucket.
pub const CATEGORY_CATCH_ALL: Category = Category::Lainnya;

pub const LEVEL_BUCKETS: &[Bucket<AudienceLevel>] = &[
    Bucket {
        keywords: &["sd", "sekolah dasar"],
        value: AudienceLevel::Sd,
    },
    Bucket {
        keywords: &["smp", "m ts"],
        value: AudienceLevel::Smp,
    },
    Bucket {
        keywords: &["sma", "smk", "ma"],
        value: AudienceLevel::Sma,
    },
    Bucket {
        keywords: &["mahasiswa", "kuliah", "universitas"],
        value: AudienceLevel::Mahasiswa,
    },
    Bucket {
        keywords: &["umum", "public"],
        value: AudienceLevel::Umum,
    },
];

pub const FORMAT_BUCKETS: &[Bucket<Format>] = &[
    Bucket {
        keywords: &["online", "daring", "zoom", "gmeet"],
        value: Format::Online,
    },
    Bucket {
        keywords: &["offline", "luring", "tatap muka"],
        value: Format::Offline,
    },
    Bucket {
        keywords: &["hybrid", "gabungan"],
        value: Format::Hybrid,
    },
];

pub const PARTICIPATION_BUCKETS: &[Bucket<ParticipationType>] = &[
    Bucket {
        keywords: &["individu", "individual", "personal"],
        value: ParticipationType::Individual,
    },
    Bucket {
        keywords: &["tim", "team", "kelompok", "group"],
        value: ParticipationType::Team,
    },
];

/// Price strings that state the competition is free of charge.
pub const FREE_KEYWORDS: &[&str] = &["gratis", "free", "tanpa biaya", "tidak dipungut biaya"];

fn classify<T: Copy>(
    raw: &str,
    canonical: &[T],
    spelling: fn(&T) -> &'static str,
    buckets: &[Bucket<T>],
) -> Option<T> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(exact) = canonical
        .iter()
        .find(|v| spelling(*v).eq_ignore_ascii_case(trimmed))
    {
        return Some(*exact);
    }

    let lower = trimmed.to_lowercase();
    buckets
        .iter()
        .find(|bucket| bucket.keywords.iter().any(|kw| lower.contains(kw)))
        .map(|bucket| bucket.value)
}

/// Never `None` for non-blank input: unmatched strings land in the catch-all.
pub fn classify_category(raw: &str) -> Option<Category> {
    if raw.trim().is_empty() {
        return None;
    }
    Some(
        classify(raw, &Category::ALL, Category::as_str, CATEGORY_BUCKETS)
            .unwrap_or(CATEGORY_CATCH_ALL),
    )
}

pub fn classify_level(raw: &str) -> Option<AudienceLevel> {
    classify(raw, &AudienceLevel::ALL, AudienceLevel::as_str, LEVEL_BUCKETS)
}

pub fn classify_format(raw: &str) -> Option<Format> {
    classify(raw, &Format::ALL, Format::as_str, FORMAT_BUCKETS)
}

pub fn classify_participation(raw: &str) -> Option<ParticipationType> {
    classify(
        raw,
        &ParticipationType::ALL,
        ParticipationType::as_str,
        PARTICIPATION_BUCKETS,
    )
}

pub fn states_free(raw: &str) -> bool {
    let lower = raw.to_lowercase();
    FREE_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_ignores_case_and_padding() {
        assert_eq!(classify_category("  teknologi & it "), Some(Category::TeknologiIt));
        assert_eq!(classify_category("Gaya Hidup & Hobi"), Some(Category::GayaHidupHobi));
        assert_eq!(classify_level("mahasiswa"), Some(AudienceLevel::Mahasiswa));
        assert_eq!(classify_format("HYBRID"), Some(Format::Hybrid));
    }

    #[test]
    fn keyword_buckets_classify_variants() {
        assert_eq!(classify_category("Lomba Karya Tulis Ilmiah (KTI)"), Some(Category::AkademikSains));
        assert_eq!(classify_category("Competitive Programming"), Some(Category::TeknologiIt));
        assert_eq!(classify_category("Lomba Fotografi"), Some(Category::SeniKreatif));
        assert_eq!(classify_category("MTQ Nasional"), Some(Category::Keagamaan));
        assert_eq!(classify_level("Siswa SMK"), Some(AudienceLevel::Sma));
        assert_eq!(classify_format("via Zoom Meeting"), Some(Format::Online));
        assert_eq!(classify_format("Luring di kampus"), Some(Format::Offline));
        assert_eq!(classify_participation("Kelompok 3 orang"), Some(ParticipationType::Team));
    }

    #[test]
    fn first_matching_bucket_wins() {
        // Matches both the academic ("esai") and literature ("bahasa") buckets.
        assert_eq!(classify_category("Esai Bahasa Inggris"), Some(Category::AkademikSains));
        // Matches both SD and SMP.
        assert_eq!(classify_level("SD dan SMP"), Some(AudienceLevel::Sd));
        // Matches online before hybrid.
        assert_eq!(classify_format("Hybrid (online & offline)"), Some(Format::Online));
    }

    #[test]
    fn unmatched_category_falls_into_catch_all() {
        assert_eq!(classify_category("Lomba Panjat Pinang"), Some(Category::Lainnya));
        assert_eq!(classify_category("   "), None);
    }

    #[test]
    fn unmatched_enums_are_none() {
        assert_eq!(classify_level("Guru"), None);
        assert_eq!(classify_format("TBA"), None);
        assert_eq!(classify_participation("?"), None);
    }

    #[test]
    fn free_keywords_detected() {
        assert!(states_free("GRATIS!"));
        assert!(states_free("Tidak dipungut biaya"));
        assert!(!states_free("Rp 25.000"));
    }
}
