//! Configuration types and defaults for the highlighter
//!
//! The stock vocabulary lives here. Hosts may replace any list by passing a
//! JSON object; missing fields fall back to the defaults below.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::scanner::category::Category;

// =============================================================================
// Stock vocabulary
// =============================================================================

const ALWAYS_HIGHLIGHT: &[&str] = &[
    "angular",
    "typescript",
    "type script",
    "javascript",
    "java script",
    "css",
    "scss",
    "html",
];

const ALWAYS_FLAG: &[&str] = &[
    "initially remote",
    "not available to",
    "employment is contingent upon",
    "will not be considered",
    "may be required",
    "should be able to",
    "must be able to",
    "should be comfortable",
    "must be comfortable",
    "is a must",
    "must have",
    "must be",
    "Must possess",
    "required",
    "able to use",
    "is a requirement",
    "Experience with",
    // trailing space keeps "experience including" unflagged
    "Experience in ",
    "Experienced with",
    "Experienced in",
    "do not apply if",
    "encouraged to apply",
    "are encouraged to",
    "encourage you to",
];

const SECURITY_CLEARANCE_FLAGS: &[&str] = &[
    "ability to obtain",
    "able to obtain",
    "TS/SCI",
    "DoD Secret",
    "DoE Secret",
    "Top Secret/Sensitive Compartmented Information",
    "security clearance",
    "top secret clearance",
    "secret clearance",
    "public trust clearance",
    "public trust",
    "Q clearance",
    "L clearance",
    "government background investigation",
];

const CRIMINAL_RECORD_FLAGS: &[&str] = &[
    "background investigation",
    "background check",
    "fair chance",
    "conviction record",
    "arrest record",
    "criminal history",
    "criminal histories",
    "criminal record",
    "criminal",
    "felony",
    "felonies",
];

const WORK_TYPES: &[&str] = &[
    "no c2c",
    "not a C2C",
    "No third-party/C2C",
    "c2c",
    "corp-to-corp",
    "corp to corp",
    "freelance",
    "fulltime",
    "full time",
    "full-time",
    "parttime",
    "part time",
    "part-time",
    "contract to hire",
    "contract-to-hire",
    "c2h",
    "contract",
    "w2",
    "1099",
];

const LOCATION_PLACES: &[&str] = &["charlotte", ", nc", "north carolina"];

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// =============================================================================
// Location
// =============================================================================

/// Location acceptance configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Place names/abbreviations accepted as on-site locations (matched anywhere)
    pub places: Vec<String>,
    /// Accept "Remote" / "Remote, US" / "Remote or ..." / "Hybrid remote"
    pub accept_remote: bool,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            places: to_strings(LOCATION_PLACES),
            accept_remote: true,
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Vocabulary configuration consumed by the pattern compiler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Terms that are always highlighted
    pub always_highlight: Vec<String>,
    /// Terms highlighted in the "flagged" color
    pub flagged: Vec<String>,
    /// Work arrangement terms (contract, full time, ...)
    pub work_types: Vec<String>,
    /// Append the security clearance list to `flagged`. Default: true
    pub flag_security_clearances: bool,
    /// Append the criminal record list to `flagged`. Default: false
    pub flag_criminal_record: bool,
    /// Free-form regular expressions per category
    pub patterns: BTreeMap<Category, Vec<String>>,
    /// Highlight compensation amounts. Default: true
    pub currency: bool,
    pub location: LocationConfig,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            always_highlight: to_strings(ALWAYS_HIGHLIGHT),
            flagged: to_strings(ALWAYS_FLAG),
            work_types: to_strings(WORK_TYPES),
            flag_security_clearances: true,
            flag_criminal_record: false,
            patterns: BTreeMap::new(),
            currency: true,
            location: LocationConfig::default(),
        }
    }
}

impl HighlightConfig {
    /// Configuration with every list empty (useful as a base for tests and hosts)
    pub fn empty() -> Self {
        Self {
            always_highlight: Vec::new(),
            flagged: Vec::new(),
            work_types: Vec::new(),
            flag_security_clearances: false,
            flag_criminal_record: false,
            patterns: BTreeMap::new(),
            currency: false,
            location: LocationConfig {
                places: Vec::new(),
                accept_remote: false,
            },
        }
    }

    /// Parse from a JSON document; absent fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Literal phrases for a category after applying the toggles
    pub fn phrases(&self, category: Category) -> Vec<String> {
        match category {
            Category::AlwaysHighlight => self.always_highlight.clone(),
            Category::Flagged => {
                let mut flagged = self.flagged.clone();
                if self.flag_security_clearances {
                    flagged.extend(to_strings(SECURITY_CLEARANCE_FLAGS));
                }
                if self.flag_criminal_record {
                    flagged.extend(to_strings(CRIMINAL_RECORD_FLAGS));
                }
                flagged
            }
            Category::WorkType => self.work_types.clone(),
            // search terms come from the page URL, currency/location are patterns
            Category::SearchTerm | Category::Currency | Category::Location => Vec::new(),
        }
    }

    /// Regular expression sources for a category
    pub fn patterns_for(&self, category: Category) -> &[String] {
        self.patterns
            .get(&category)
            .map(|p| p.as_slice())
            .unwrap_or(&[])
    }
}
