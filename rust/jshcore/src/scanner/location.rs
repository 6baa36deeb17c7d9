//! LocationClassifier - whole-block acceptance test for location text
//!
//! A location block is either accepted as a whole or not at all; there is
//! no partial credit. Accepted text is highlighted in full by the caller.

use regex::{Regex, RegexBuilder};

use super::category::Category;
use super::compiler::CompileError;
use crate::config::LocationConfig;

/// Remote-work alternatives of the composite acceptance pattern
const REMOTE_ALTERNATIVES: &[&str] = &[
    // "Remote", optionally with a US qualifier
    r"^remote(?:, US.*)?$",
    r"^remote;? united states$",
    // "Remote or Charlotte, NC"
    r"^remote or.+",
    r"United States;? \(?Remote\)?",
    r"^hybrid remote$",
];

const LABEL: &str = "location:";

/// Strip a leading `Location:` label, collapse line breaks, trim.
pub fn normalize(text: &str) -> String {
    let text = text.trim_start();
    let text = match text.get(..LABEL.len()) {
        Some(head) if head.eq_ignore_ascii_case(LABEL) => &text[LABEL.len()..],
        _ => text,
    };

    let mut out = String::with_capacity(text.len());
    let mut in_break = false;
    for c in text.chars() {
        if c == '\n' || c == '\r' {
            if !in_break {
                out.push(' ');
                in_break = true;
            }
        } else {
            out.push(c);
            in_break = false;
        }
    }

    out.trim().to_string()
}

/// Composite acceptance pattern for location blocks
#[derive(Debug, Clone, Default)]
pub struct LocationClassifier {
    pattern: Option<Regex>,
    diagnostics: Vec<CompileError>,
}

impl LocationClassifier {
    /// Build from the configured allow-list plus any extra location regexes.
    /// Extra sources that fail to compile on their own are dropped.
    pub fn new(config: &LocationConfig, extra_patterns: &[String]) -> Self {
        let mut diagnostics = Vec::new();
        let mut alternatives: Vec<String> = Vec::new();

        if config.accept_remote {
            alternatives.extend(REMOTE_ALTERNATIVES.iter().map(|a| a.to_string()));
        }

        alternatives.extend(
            config
                .places
                .iter()
                .filter(|place| !place.trim().is_empty())
                .map(|place| regex::escape(place)),
        );

        for source in extra_patterns {
            match Regex::new(source) {
                Ok(_) => alternatives.push(source.clone()),
                Err(e) => {
                    let error = CompileError::InvalidPattern {
                        category: Category::Location,
                        source: source.clone(),
                        message: e.to_string(),
                    };
                    tracing::warn!(source = source.as_str(), "dropping location pattern: {}", error);
                    diagnostics.push(error);
                }
            }
        }

        if alternatives.is_empty() {
            return Self {
                pattern: None,
                diagnostics,
            };
        }

        let composite = alternatives
            .iter()
            .map(|a| format!("(?:{})", a))
            .collect::<Vec<_>>()
            .join("|");

        let pattern = match RegexBuilder::new(&composite).case_insensitive(true).build() {
            Ok(re) => Some(re),
            Err(e) => {
                let error = CompileError::InvalidPattern {
                    category: Category::Location,
                    source: composite.clone(),
                    message: e.to_string(),
                };
                tracing::warn!("location classifier disabled: {}", error);
                diagnostics.push(error);
                None
            }
        };

        Self {
            pattern,
            diagnostics,
        }
    }

    /// Test already-normalized text
    pub fn accepts(&self, normalized: &str) -> bool {
        if normalized.is_empty() {
            return false;
        }
        self.pattern
            .as_ref()
            .map(|re| re.is_match(normalized))
            .unwrap_or(false)
    }

    /// Normalize raw block text and return it when accepted
    pub fn classify(&self, raw: &str) -> Option<String> {
        let normalized = normalize(raw);
        if self.accepts(&normalized) {
            Some(normalized)
        } else {
            None
        }
    }

    pub fn diagnostics(&self) -> &[CompileError] {
        &self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock() -> LocationClassifier {
        LocationClassifier::new(&LocationConfig::default(), &[])
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Location: Remote, US"), "Remote, US");
        assert_eq!(normalize("LOCATION:Charlotte,\r\n\nNC  "), "Charlotte, NC");
        assert_eq!(normalize("  Remote\n"), "Remote");
        assert_eq!(normalize("Relocation: no"), "Relocation: no");
    }

    #[test]
    fn test_remote_variants_accepted() {
        let classifier = stock();
        assert_eq!(classifier.classify("Location: Remote, US"), Some("Remote, US".to_string()));
        assert!(classifier.classify("remote").is_some());
        assert!(classifier.classify("Remote; United States").is_some());
        assert!(classifier.classify("Remote or Austin, TX").is_some());
        assert!(classifier.classify("United States (Remote)").is_some());
        assert!(classifier.classify("Hybrid remote").is_some());
    }

    #[test]
    fn test_remote_with_foreign_qualifier_rejected() {
        let classifier = stock();
        assert!(classifier.classify("Remote from Las Vegas, NM").is_none());
        assert!(classifier.classify("Remote, Canada").is_none());
        assert!(classifier.classify("Hybrid remote in Denver").is_none());
    }

    #[test]
    fn test_allow_listed_places() {
        let classifier = stock();
        assert!(classifier.classify("Charlotte, NC 28202").is_some());
        assert!(classifier.classify("Raleigh, North Carolina").is_some());
        assert!(classifier.classify("Austin, TX").is_none());
    }

    #[test]
    fn test_place_terms_are_escaped() {
        let config = LocationConfig {
            places: vec!["St. Louis (MO)".to_string()],
            accept_remote: false,
        };
        let classifier = LocationClassifier::new(&config, &[]);
        assert!(classifier.classify("St. Louis (MO)").is_some());
        assert!(classifier.classify("Stx Louis MO").is_none());
        assert!(classifier.classify("Remote").is_none());
    }

    #[test]
    fn test_extra_patterns_and_bad_sources() {
        let config = LocationConfig {
            places: vec![],
            accept_remote: false,
        };
        let classifier = LocationClassifier::new(
            &config,
            &["^anywhere$".to_string(), "[broken".to_string()],
        );
        assert!(classifier.classify("Anywhere").is_some());
        assert_eq!(classifier.diagnostics().len(), 1);
    }

    #[test]
    fn test_nothing_configured_accepts_nothing() {
        let config = LocationConfig {
            places: vec![],
            accept_remote: false,
        };
        let classifier = LocationClassifier::new(&config, &[]);
        assert!(classifier.classify("Remote").is_none());
        assert!(stock().classify("   ").is_none());
    }
}
