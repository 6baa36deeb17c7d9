//! PatternCompiler - turns vocabulary configuration into an ordered matcher set
//!
//! Literal phrases share one Aho-Corasick automaton (overlapping search, so
//! every occurrence of every phrase is visible to conflict resolution). The
//! automaton only folds ASCII case, so a phrase with non-ASCII characters is
//! compiled as an escaped case-insensitive regex instead.
//! Regular expressions are compiled individually; a bad source is reported
//! and dropped without affecting the rest of the set.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;

use super::category::Category;
use crate::config::HighlightConfig;

/// Compensation amounts: `$120K`, `€1,500.50`, `£90k+`, `150K`.
///
/// The symbol may be dropped only when a magnitude suffix makes the number
/// unambiguous.
pub const CURRENCY_PATTERN: &str =
    r"[$£€]\d(?:[\d,]*\d)?(?:\.\d+)?[bmk]?\+?|\d(?:[\d,]*\d)?(?:\.\d+)?[bmk]\b\+?";

// =============================================================================
// Errors
// =============================================================================

/// Configuration errors raised while compiling a matcher set
#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    InvalidPattern {
        category: Category,
        source: String,
        message: String,
    },
    InvalidPhrase {
        category: Category,
        phrase: String,
        message: String,
    },
    Automaton(String),
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileError::InvalidPattern {
                category,
                source,
                message,
            } => write!(f, "Invalid {} pattern {:?}: {}", category, source, message),
            CompileError::InvalidPhrase {
                category,
                phrase,
                message,
            } => write!(f, "Invalid {} phrase {:?}: {}", category, phrase, message),
            CompileError::Automaton(msg) => write!(f, "Failed to build phrase automaton: {}", msg),
        }
    }
}

impl std::error::Error for CompileError {}

// =============================================================================
// Matchers
// =============================================================================

/// How a matcher finds its occurrences
#[derive(Debug, Clone)]
pub enum MatcherKind {
    /// Verbatim ASCII phrase; `pattern_id` indexes the shared automaton
    Literal { phrase: String, pattern_id: usize },
    /// Verbatim phrase with non-ASCII characters, matched by its escaped form
    Phrase { phrase: String, regex: Regex },
    Pattern(Regex),
}

/// A compiled rule bound to one category. Immutable once built.
#[derive(Debug, Clone)]
pub struct Matcher {
    pub category: Category,
    pub kind: MatcherKind,
}

impl Matcher {
    /// Source text of the rule, for diagnostics
    pub fn source(&self) -> &str {
        match &self.kind {
            MatcherKind::Literal { phrase, .. } | MatcherKind::Phrase { phrase, .. } => phrase,
            MatcherKind::Pattern(re) => re.as_str(),
        }
    }

    /// Backed by the shared automaton
    pub fn is_literal(&self) -> bool {
        matches!(self.kind, MatcherKind::Literal { .. })
    }

    /// Configured as a verbatim phrase, whichever engine runs it
    pub fn is_phrase(&self) -> bool {
        matches!(self.kind, MatcherKind::Literal { .. } | MatcherKind::Phrase { .. })
    }
}

/// Ordered matchers plus the automaton backing the literal ones
#[derive(Debug, Clone, Default)]
pub struct MatcherSet {
    matchers: Vec<Matcher>,
    literals: Option<AhoCorasick>,
    literal_count: usize,
    diagnostics: Vec<CompileError>,
}

impl MatcherSet {
    /// Matchers in precedence order
    pub fn matchers(&self) -> &[Matcher] {
        &self.matchers
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// Shared automaton over every literal phrase (None when there are none)
    pub fn literal_automaton(&self) -> Option<&AhoCorasick> {
        self.literals.as_ref()
    }

    pub fn literal_count(&self) -> usize {
        self.literal_count
    }

    /// Configuration errors collected during the compile that produced this set
    pub fn diagnostics(&self) -> &[CompileError] {
        &self.diagnostics
    }

    /// Categories that have at least one matcher
    pub fn categories(&self) -> Vec<Category> {
        let mut seen: Vec<Category> = self.matchers.iter().map(|m| m.category).collect();
        seen.dedup();
        seen
    }
}

/// Case-insensitive matcher for a verbatim phrase, with full Unicode case
/// folding
pub fn phrase_regex(phrase: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&regex::escape(phrase))
        .case_insensitive(true)
        .build()
}

// =============================================================================
// PatternCompiler
// =============================================================================

/// Builds a [`MatcherSet`] from configuration and the page's search terms.
///
/// Compiling never touches already-annotated content; callers swap the new
/// set in for future passes only.
#[derive(Debug, Default)]
pub struct PatternCompiler {
    matchers: Vec<Matcher>,
    phrases: Vec<String>,
    diagnostics: Vec<CompileError>,
}

impl PatternCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile everything in precedence order.
    ///
    /// Location rules are not part of the free-text set; the location
    /// classifier owns them.
    pub fn compile(config: &HighlightConfig, search_terms: &[String]) -> MatcherSet {
        let mut compiler = Self::new();

        for category in Category::ALL {
            if category == Category::Location {
                continue;
            }

            if category == Category::SearchTerm {
                compiler.add_phrases(category, search_terms);
            }
            compiler.add_phrases(category, &config.phrases(category));

            if category == Category::Currency && config.currency {
                compiler.add_pattern(category, CURRENCY_PATTERN);
            }
            for source in config.patterns_for(category) {
                compiler.add_pattern(category, source);
            }
        }

        compiler.finish()
    }

    /// Add literal phrases for a category. Blank and repeated phrases are skipped.
    pub fn add_phrases(&mut self, category: Category, phrases: &[String]) {
        let mut seen: HashSet<String> = self
            .matchers
            .iter()
            .filter(|m| m.category == category && m.is_phrase())
            .map(|m| m.source().to_lowercase())
            .collect();

        for phrase in phrases {
            if phrase.trim().is_empty() {
                continue;
            }
            if !seen.insert(phrase.to_lowercase()) {
                continue;
            }
            if !phrase.is_ascii() {
                self.add_unicode_phrase(category, phrase);
                continue;
            }
            let pattern_id = self.phrases.len();
            self.phrases.push(phrase.clone());
            self.matchers.push(Matcher {
                category,
                kind: MatcherKind::Literal {
                    phrase: phrase.clone(),
                    pattern_id,
                },
            });
        }
    }

    fn add_unicode_phrase(&mut self, category: Category, phrase: &str) {
        match phrase_regex(phrase) {
            Ok(regex) => self.matchers.push(Matcher {
                category,
                kind: MatcherKind::Phrase {
                    phrase: phrase.to_string(),
                    regex,
                },
            }),
            Err(e) => {
                let error = CompileError::InvalidPhrase {
                    category,
                    phrase: phrase.to_string(),
                    message: e.to_string(),
                };
                tracing::warn!(%category, phrase, "dropping matcher: {}", error);
                self.diagnostics.push(error);
            }
        }
    }

    /// Add a case-insensitive regular expression. Invalid sources are
    /// recorded and dropped.
    pub fn add_pattern(&mut self, category: Category, source: &str) {
        match RegexBuilder::new(source).case_insensitive(true).build() {
            Ok(re) => self.matchers.push(Matcher {
                category,
                kind: MatcherKind::Pattern(re),
            }),
            Err(e) => {
                let error = CompileError::InvalidPattern {
                    category,
                    source: source.to_string(),
                    message: e.to_string(),
                };
                tracing::warn!(%category, source, "dropping matcher: {}", error);
                self.diagnostics.push(error);
            }
        }
    }

    /// Build the literal automaton and seal the set
    pub fn finish(mut self) -> MatcherSet {
        let literal_count = self.phrases.len();
        let literals = if self.phrases.is_empty() {
            None
        } else {
            // Standard kind is required for overlapping search
            match AhoCorasickBuilder::new()
                .match_kind(MatchKind::Standard)
                .ascii_case_insensitive(true)
                .build(&self.phrases)
            {
                Ok(automaton) => Some(automaton),
                Err(e) => {
                    let error = CompileError::Automaton(e.to_string());
                    tracing::warn!("dropping all literal matchers: {}", error);
                    self.diagnostics.push(error);
                    self.matchers.retain(|m| !m.is_literal());
                    None
                }
            }
        };

        tracing::debug!(
            matchers = self.matchers.len(),
            literals = literal_count,
            errors = self.diagnostics.len(),
            "compiled matcher set"
        );

        MatcherSet {
            matchers: self.matchers,
            literals,
            literal_count,
            diagnostics: self.diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phrases(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_compile_orders_by_precedence() {
        let mut config = HighlightConfig::empty();
        config.work_types = phrases(&["contract"]);
        config.always_highlight = phrases(&["rust"]);
        config.flagged = phrases(&["must have"]);
        config.currency = true;

        let set = PatternCompiler::compile(&config, &phrases(&["tokio"]));
        let categories: Vec<Category> = set.matchers().iter().map(|m| m.category).collect();
        assert_eq!(
            categories,
            vec![
                Category::SearchTerm,
                Category::AlwaysHighlight,
                Category::Flagged,
                Category::WorkType,
                Category::Currency,
            ]
        );
        assert_eq!(set.literal_count(), 4);
        assert!(set.literal_automaton().is_some());
    }

    #[test]
    fn test_empty_lists_yield_no_matchers() {
        let set = PatternCompiler::compile(&HighlightConfig::empty(), &[]);
        assert!(set.is_empty());
        assert!(set.literal_automaton().is_none());
        assert!(set.categories().is_empty());
    }

    #[test]
    fn test_invalid_pattern_is_dropped_and_reported() {
        let mut config = HighlightConfig::empty();
        config
            .patterns
            .insert(Category::Flagged, phrases(&["(unclosed", r"\bon-?call\b"]));

        let set = PatternCompiler::compile(&config, &[]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.diagnostics().len(), 1);
        assert!(matches!(
            &set.diagnostics()[0],
            CompileError::InvalidPattern { category: Category::Flagged, .. }
        ));
    }

    #[test]
    fn test_blank_and_duplicate_phrases_skipped() {
        let mut compiler = PatternCompiler::new();
        compiler.add_phrases(Category::WorkType, &phrases(&["W2", "", "  ", "w2", "1099"]));
        let set = compiler.finish();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_non_ascii_phrase_uses_folding_regex() {
        let mut compiler = PatternCompiler::new();
        compiler.add_phrases(Category::SearchTerm, &phrases(&["Développeur", "rust", "DÉVELOPPEUR"]));
        let set = compiler.finish();

        // the upper-case duplicate folds into the first spelling
        assert_eq!(set.len(), 2);
        assert_eq!(set.literal_count(), 1);
        assert!(matches!(set.matchers()[0].kind, MatcherKind::Phrase { .. }));
        assert_eq!(set.matchers()[0].source(), "Développeur");
        assert!(set.matchers()[0].is_phrase());
        assert!(!set.matchers()[0].is_literal());
    }

    #[test]
    fn test_same_phrase_allowed_in_two_categories() {
        let mut compiler = PatternCompiler::new();
        compiler.add_phrases(Category::SearchTerm, &phrases(&["remote"]));
        compiler.add_phrases(Category::Flagged, &phrases(&["remote"]));
        let set = compiler.finish();
        assert_eq!(set.len(), 2);
        assert_eq!(set.categories(), vec![Category::SearchTerm, Category::Flagged]);
    }

    #[test]
    fn test_location_is_not_compiled_into_free_text_set() {
        let mut config = HighlightConfig::empty();
        config.patterns.insert(Category::Location, phrases(&["^remote$"]));
        let set = PatternCompiler::compile(&config, &[]);
        assert!(set.is_empty());
    }

    #[test]
    fn test_recompile_is_independent() {
        let config = HighlightConfig::default();
        let first = PatternCompiler::compile(&config, &[]);
        let second = PatternCompiler::compile(&config, &[]);
        assert_eq!(first.len(), second.len());
        assert_eq!(first.literal_count(), second.literal_count());
    }
}
