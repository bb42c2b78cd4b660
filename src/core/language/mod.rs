//! Locale support: availability tiers, code normalization and sample text.

pub mod availability;
pub mod iso;
pub mod sample;

pub use availability::{LanguageAvailability, SUPPORTED_LOCALES, match_locale};
pub use iso::{to_iso3_country, to_iso3_language};
pub use sample::{DEFAULT_SAMPLE_TEXT, sample_text};

/// A language as the OS reports it: ISO 639-2 language, ISO 3166 alpha-3
/// country and a free-form variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Language {
    pub language: String,
    pub country: String,
    pub variant: String,
}

impl Language {
    pub fn new(
        language: impl Into<String>,
        country: impl Into<String>,
        variant: impl Into<String>,
    ) -> Self {
        Self {
            language: language.into(),
            country: country.into(),
            variant: variant.into(),
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::new("zho", "CHN", "")
    }
}
