//! Two-letter to three-letter code normalization for locale matching.
//!
//! The OS may hand over ISO 639-1 / ISO 3166-1 alpha-2 codes while the
//! supported-locale table is keyed by their alpha-3 forms.

use std::collections::HashMap;

use once_cell::sync::Lazy;

static LANGUAGES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("ar", "ara"),
        ("bg", "bul"),
        ("ca", "cat"),
        ("cs", "ces"),
        ("cy", "cym"),
        ("da", "dan"),
        ("de", "deu"),
        ("el", "ell"),
        ("en", "eng"),
        ("es", "spa"),
        ("et", "est"),
        ("fi", "fin"),
        ("fr", "fra"),
        ("ga", "gle"),
        ("gu", "guj"),
        ("he", "heb"),
        ("iw", "heb"),
        ("hi", "hin"),
        ("hr", "hrv"),
        ("hu", "hun"),
        ("id", "ind"),
        ("in", "ind"),
        ("it", "ita"),
        ("ja", "jpn"),
        ("ko", "kor"),
        ("lt", "lit"),
        ("lv", "lav"),
        ("mr", "mar"),
        ("ms", "msa"),
        ("mt", "mlt"),
        ("nb", "nob"),
        ("nl", "nld"),
        ("pl", "pol"),
        ("pt", "por"),
        ("ro", "ron"),
        ("ru", "rus"),
        ("sk", "slk"),
        ("sl", "slv"),
        ("sv", "swe"),
        ("sw", "swa"),
        ("ta", "tam"),
        ("te", "tel"),
        ("th", "tha"),
        ("tr", "tur"),
        ("uk", "ukr"),
        ("ur", "urd"),
        ("vi", "vie"),
        ("zh", "zho"),
    ])
});

static COUNTRIES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("AR", "ARG"),
        ("AT", "AUT"),
        ("AU", "AUS"),
        ("BE", "BEL"),
        ("BG", "BGR"),
        ("BR", "BRA"),
        ("CA", "CAN"),
        ("CH", "CHE"),
        ("CN", "CHN"),
        ("CO", "COL"),
        ("CZ", "CZE"),
        ("DE", "DEU"),
        ("DK", "DNK"),
        ("EE", "EST"),
        ("EG", "EGY"),
        ("ES", "ESP"),
        ("FI", "FIN"),
        ("FR", "FRA"),
        ("GB", "GBR"),
        ("GR", "GRC"),
        ("HK", "HKG"),
        ("HR", "HRV"),
        ("HU", "HUN"),
        ("ID", "IDN"),
        ("IE", "IRL"),
        ("IL", "ISR"),
        ("IN", "IND"),
        ("IT", "ITA"),
        ("JP", "JPN"),
        ("KE", "KEN"),
        ("KR", "KOR"),
        ("LT", "LTU"),
        ("LV", "LVA"),
        ("MT", "MLT"),
        ("MX", "MEX"),
        ("MY", "MYS"),
        ("NL", "NLD"),
        ("NO", "NOR"),
        ("NZ", "NZL"),
        ("PH", "PHL"),
        ("PK", "PAK"),
        ("PL", "POL"),
        ("PT", "PRT"),
        ("RO", "ROU"),
        ("RU", "RUS"),
        ("SA", "SAU"),
        ("SE", "SWE"),
        ("SG", "SGP"),
        ("SI", "SVN"),
        ("SK", "SVK"),
        ("TH", "THA"),
        ("TR", "TUR"),
        ("TW", "TWN"),
        ("UA", "UKR"),
        ("US", "USA"),
        ("VN", "VNM"),
        ("ZA", "ZAF"),
    ])
});

/// Normalize a language code to lower-case ISO 639-2.
pub fn to_iso3_language(code: &str) -> String {
    let lower = code.trim().to_ascii_lowercase();
    match LANGUAGES.get(lower.as_str()) {
        Some(iso3) => (*iso3).to_string(),
        None => lower,
    }
}

/// Normalize a country code to upper-case ISO 3166-1 alpha-3.
pub fn to_iso3_country(code: &str) -> String {
    let upper = code.trim().to_ascii_uppercase();
    match COUNTRIES.get(upper.as_str()) {
        Some(iso3) => (*iso3).to_string(),
        None => upper,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_letter_languages() {
        assert_eq!(to_iso3_language("zh"), "zho");
        assert_eq!(to_iso3_language("EN"), "eng");
        assert_eq!(to_iso3_language("iw"), "heb");
    }

    #[test]
    fn test_three_letter_languages_pass_through() {
        assert_eq!(to_iso3_language("zho"), "zho");
        assert_eq!(to_iso3_language("ENG"), "eng");
    }

    #[test]
    fn test_countries() {
        assert_eq!(to_iso3_country("cn"), "CHN");
        assert_eq!(to_iso3_country("US"), "USA");
        assert_eq!(to_iso3_country("twn"), "TWN");
        assert_eq!(to_iso3_country(""), "");
    }
}
