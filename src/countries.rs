//! The fixed catalog of storefront countries the dashboard can query.
//!
//! Each entry pairs a Play Store country code (`gl`) with a display name and
//! the review language (`hl`) used when fetching from that storefront.

use serde::Serialize;

/// Language used for codes that are not in the catalog.
pub const FALLBACK_LANG: &str = "en";

/// Countries preselected in the fetch form.
pub const DEFAULT_SELECTION: [&str; 3] = ["tr", "us", "de"];

/// A storefront country.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Country {
    /// Lower-case ISO 3166-1 alpha-2 code, as used by the Play Store.
    pub code: &'static str,

    /// Human-readable name shown in tables and charts.
    pub name: &'static str,

    /// Review language requested for this storefront.
    pub lang: &'static str,
}

const CATALOG: [Country; 16] = [
    Country { code: "tr", name: "Turkey", lang: "tr" },
    Country { code: "us", name: "United States", lang: "en" },
    Country { code: "de", name: "Germany", lang: "de" },
    Country { code: "gb", name: "United Kingdom", lang: "en" },
    Country { code: "fr", name: "France", lang: "fr" },
    Country { code: "jp", name: "Japan", lang: "ja" },
    Country { code: "kr", name: "South Korea", lang: "ko" },
    Country { code: "ru", name: "Russia", lang: "ru" },
    Country { code: "br", name: "Brazil", lang: "pt" },
    Country { code: "in", name: "India", lang: "en" },
    Country { code: "ca", name: "Canada", lang: "en" },
    Country { code: "au", name: "Australia", lang: "en" },
    Country { code: "es", name: "Spain", lang: "es" },
    Country { code: "it", name: "Italy", lang: "it" },
    Country { code: "mx", name: "Mexico", lang: "es" },
    Country { code: "id", name: "Indonesia", lang: "id" },
];

/// All catalog entries in display order.
pub fn catalog() -> &'static [Country] {
    &CATALOG
}

/// Find a catalog entry by code (case-insensitive).
pub fn lookup(code: &str) -> Option<&'static Country> {
    CATALOG.iter().find(|c| c.code.eq_ignore_ascii_case(code.trim()))
}

/// Review language for a code, falling back to English.
pub fn lang_for(code: &str) -> &'static str {
    lookup(code).map(|c| c.lang).unwrap_or(FALLBACK_LANG)
}

impl Country {
    /// Label used in selection widgets, e.g. `"TR - Turkey"`.
    pub fn label(&self) -> String {
        format!("{} - {}", self.code.to_uppercase(), self.name)
    }
}
