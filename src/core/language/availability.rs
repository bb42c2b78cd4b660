//! Locale availability against the static supported-locale table.

use super::iso::{to_iso3_country, to_iso3_language};

/// Locales the service can speak, as `language-REGION` in ISO alpha-3 form.
pub const SUPPORTED_LOCALES: [&str; 70] = [
    "zho-CHN", "zho-HKG", "zho-TWN", "jpn-JPN", "kor-KOR", "ara-EGY", "ara-SAU", "bul-BGR",
    "cat-ESP", "ces-CZE", "cym-GBR", "dan-DNK", "deu-AUT", "deu-CHE", "deu-DEU", "ell-GRC",
    "eng-AUS", "eng-CAN", "eng-GBR", "eng-HKG", "eng-IRL", "eng-IND", "eng-NZL", "eng-PHL",
    "eng-SGP", "eng-USA", "eng-ZAF", "spa-ARG", "spa-COL", "spa-ESP", "spa-MEX", "spa-USA",
    "est-EST", "fin-FIN", "fra-BEL", "fra-CAN", "fra-CHE", "fra-FRA", "gle-IRL", "guj-IND",
    "heb-ISR", "hin-IND", "hrv-HRV", "hun-HUN", "ind-IDN", "ita-ITA", "lit-LTU", "lav-LVA",
    "mar-IND", "msa-MYS", "mlt-MLT", "nob-NOR", "nld-BEL", "nld-NLD", "pol-POL", "por-BRA",
    "por-PRT", "ron-ROU", "rus-RUS", "slk-SVK", "slv-SVN", "swe-SWE", "swa-KEN", "tam-IND",
    "tel-IND", "tha-THA", "tur-TUR", "ukr-UKR", "urd-PAK", "vie-VNM",
];

/// How closely a requested locale matches the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LanguageAvailability {
    NoMatch,
    LanguageOnly,
    LanguageAndRegion,
    Exact,
}

impl LanguageAvailability {
    pub fn is_available(&self) -> bool {
        *self != LanguageAvailability::NoMatch
    }

    /// Integer code used by the OS TTS contract.
    pub fn os_code(&self) -> i32 {
        match self {
            LanguageAvailability::NoMatch => -2,
            LanguageAvailability::LanguageOnly => 0,
            LanguageAvailability::LanguageAndRegion => 1,
            LanguageAvailability::Exact => 2,
        }
    }
}

/// Match a requested locale against [`SUPPORTED_LOCALES`].
///
/// Codes may be two- or three-letter and any case. Table entries carry no
/// variant, so a full match with an empty variant is exact.
///
/// Each tier is earned by a single entry: a region only counts together
/// with the language of the same entry. `deu-FRA` is therefore
/// `LanguageOnly` even though both `deu` and `FRA` appear in the table.
pub fn match_locale(language: &str, region: &str, variant: &str) -> LanguageAvailability {
    let language = to_iso3_language(language);
    let region = to_iso3_country(region);
    let variant = variant.trim();

    let mut best = LanguageAvailability::NoMatch;
    for entry in SUPPORTED_LOCALES {
        let (entry_language, entry_region) = entry.split_once('-').unwrap_or((entry, ""));
        if entry_language != language {
            continue;
        }
        best = best.max(LanguageAvailability::LanguageOnly);

        if entry_region != region {
            continue;
        }
        best = best.max(LanguageAvailability::LanguageAndRegion);

        if variant.is_empty() {
            return LanguageAvailability::Exact;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_shape() {
        for entry in SUPPORTED_LOCALES {
            let (language, region) = entry.split_once('-').unwrap();
            assert_eq!(language.len(), 3, "{entry}");
            assert_eq!(region.len(), 3, "{entry}");
        }
    }

    #[test]
    fn test_exact_match() {
        assert_eq!(match_locale("zho", "CHN", ""), LanguageAvailability::Exact);
        assert_eq!(match_locale("en", "us", ""), LanguageAvailability::Exact);
    }

    #[test]
    fn test_language_and_region_with_variant() {
        assert_eq!(
            match_locale("eng", "USA", "POSIX"),
            LanguageAvailability::LanguageAndRegion
        );
    }

    #[test]
    fn test_language_only() {
        assert_eq!(match_locale("fra", "USA", ""), LanguageAvailability::LanguageOnly);
        assert_eq!(match_locale("de", "", ""), LanguageAvailability::LanguageOnly);
    }

    #[test]
    fn test_region_needs_matching_language() {
        // CHN appears only with zho; an English request must not upgrade on it.
        assert_eq!(match_locale("eng", "CHN", ""), LanguageAvailability::LanguageOnly);
    }

    #[test]
    fn test_language_and_region_from_different_entries() {
        assert_eq!(match_locale("deu", "FRA", ""), LanguageAvailability::LanguageOnly);
        assert_eq!(match_locale("spa", "IND", ""), LanguageAvailability::LanguageOnly);
        assert_eq!(match_locale("de", "fr", ""), LanguageAvailability::LanguageOnly);
    }

    #[test]
    fn test_no_match() {
        assert_eq!(match_locale("xyz", "CHN", ""), LanguageAvailability::NoMatch);
        assert_eq!(match_locale("", "", ""), LanguageAvailability::NoMatch);
        assert!(!match_locale("klingon", "", "").is_available());
    }

    #[test]
    fn test_os_codes() {
        assert_eq!(LanguageAvailability::NoMatch.os_code(), -2);
        assert_eq!(LanguageAvailability::LanguageOnly.os_code(), 0);
        assert_eq!(LanguageAvailability::LanguageAndRegion.os_code(), 1);
        assert_eq!(LanguageAvailability::Exact.os_code(), 2);
    }
}
