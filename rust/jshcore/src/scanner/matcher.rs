//! MatchEngine - conflict-resolved multi-pattern matching over a text blob
//!
//! Matchers are applied in precedence order. Every occurrence a matcher
//! finds is accepted unless it overlaps a region already claimed earlier in
//! the pass (first-claimed-wins). Overlapping occurrences are dropped whole,
//! never truncated.

use serde::{Deserialize, Serialize};

use super::category::Category;
use super::compiler::{MatcherKind, MatcherSet};

// ==================== TYPE DEFINITIONS ====================

/// A claimed byte range of the blob. `start < end <= blob.len()`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchSpan {
    pub start: usize,
    pub end: usize,
    pub category: Category,
}

impl MatchSpan {
    pub fn new(start: usize, end: usize, category: Category) -> Self {
        Self {
            start,
            end,
            category,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Half-open interval overlap
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        start < self.end && self.start < end
    }

    pub fn text<'a>(&self, blob: &'a str) -> &'a str {
        &blob[self.start..self.end]
    }
}

// ==================== MAIN IMPLEMENTATION ====================

/// Find every accepted span in `text`, ordered by start offset.
///
/// `only` restricts the pass to the listed categories; `None` runs every
/// matcher in the set.
pub fn find_spans(set: &MatcherSet, text: &str, only: Option<&[Category]>) -> Vec<MatchSpan> {
    if text.is_empty() || set.is_empty() {
        return Vec::new();
    }

    let literal_hits = literal_occurrences(set, text);
    let mut accepted: Vec<MatchSpan> = Vec::new();

    for matcher in set.matchers() {
        if let Some(only) = only {
            if !only.contains(&matcher.category) {
                continue;
            }
        }

        let occurrences: Vec<(usize, usize)> = match &matcher.kind {
            MatcherKind::Literal { pattern_id, .. } => {
                literal_hits.get(*pattern_id).cloned().unwrap_or_default()
            }
            MatcherKind::Phrase { regex: re, .. } | MatcherKind::Pattern(re) => {
                re.find_iter(text).map(|m| (m.start(), m.end())).collect()
            }
        };

        for (start, end) in occurrences {
            if start >= end {
                continue;
            }
            if accepted.iter().any(|span| span.overlaps(start, end)) {
                continue;
            }
            accepted.push(MatchSpan::new(start, end, matcher.category));
        }
    }

    accepted.sort_by_key(|span| span.start);
    accepted
}

/// All occurrences of every literal phrase, grouped by pattern id, each group
/// ordered by position.
fn literal_occurrences(set: &MatcherSet, text: &str) -> Vec<Vec<(usize, usize)>> {
    let mut hits = vec![Vec::new(); set.literal_count()];
    let automaton = match set.literal_automaton() {
        Some(a) => a,
        None => return hits,
    };

    for mat in automaton.find_overlapping_iter(text) {
        if let Some(group) = hits.get_mut(mat.pattern().as_usize()) {
            group.push((mat.start(), mat.end()));
        }
    }

    for group in &mut hits {
        group.sort_unstable();
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HighlightConfig;
    use crate::scanner::compiler::PatternCompiler;

    fn phrases(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn texts<'a>(spans: &[MatchSpan], blob: &'a str) -> Vec<&'a str> {
        spans.iter().map(|s| s.text(blob)).collect()
    }

    // -------------------------------------------------------------------------
    // Literal phrases
    // -------------------------------------------------------------------------
    #[test]
    fn test_single_occurrence_single_span() {
        let mut config = HighlightConfig::empty();
        config.always_highlight = phrases(&["TypeScript"]);
        let set = PatternCompiler::compile(&config, &[]);

        let blob = "Strong typescript skills preferred";
        let spans = find_spans(&set, blob, None);
        assert_eq!(spans, vec![MatchSpan::new(7, 17, Category::AlwaysHighlight)]);
    }

    #[test]
    fn test_case_insensitive_and_no_token_boundary() {
        let mut config = HighlightConfig::empty();
        config.always_highlight = phrases(&["css"]);
        let set = PatternCompiler::compile(&config, &[]);

        let blob = "CSS and SCSS";
        assert_eq!(texts(&find_spans(&set, blob, None), blob), vec!["CSS", "CSS"]);
    }

    #[test]
    fn test_non_ascii_phrase_is_case_insensitive() {
        let mut config = HighlightConfig::empty();
        config.always_highlight = phrases(&["c++ (équipe)"]);
        let set = PatternCompiler::compile(&config, &phrases(&["Développeur"]));

        let blob = "SENIOR DÉVELOPPEUR RUST, C++ (ÉQUIPE) and développeur junior";
        let spans = find_spans(&set, blob, None);
        assert_eq!(
            texts(&spans, blob),
            vec!["DÉVELOPPEUR", "C++ (ÉQUIPE)", "développeur"]
        );
        assert_eq!(spans[0].category, Category::SearchTerm);
        assert_eq!(spans[1].category, Category::AlwaysHighlight);
    }

    #[test]
    fn test_metacharacters_are_literal() {
        let mut config = HighlightConfig::empty();
        config.flagged = phrases(&["TS/SCI", "c++ (senior)"]);
        let set = PatternCompiler::compile(&config, &[]);

        let blob = "Requires TS/SCI. c++ (senior) role. c+ senior";
        assert_eq!(
            texts(&find_spans(&set, blob, None), blob),
            vec!["TS/SCI", "c++ (senior)"]
        );
    }

    #[test]
    fn test_zero_matches() {
        let set = PatternCompiler::compile(&HighlightConfig::default(), &[]);
        assert!(find_spans(&set, "Nothing interesting here.", None).is_empty());
        assert!(find_spans(&set, "", None).is_empty());
    }

    // -------------------------------------------------------------------------
    // Precedence
    // -------------------------------------------------------------------------
    #[test]
    fn test_higher_precedence_claims_overlap() {
        let mut config = HighlightConfig::empty();
        config.always_highlight = phrases(&["java script"]);
        config.work_types = phrases(&["script writer"]);
        let set = PatternCompiler::compile(&config, &[]);

        let blob = "java script writer";
        let spans = find_spans(&set, blob, None);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].category, Category::AlwaysHighlight);
        assert_eq!(spans[0].text(blob), "java script");
    }

    #[test]
    fn test_lower_precedence_dropped_not_truncated() {
        let mut config = HighlightConfig::empty();
        config.flagged = phrases(&["must be"]);
        config.work_types = phrases(&["be remote"]);
        let set = PatternCompiler::compile(&config, &[]);

        let blob = "You must be remote";
        let spans = find_spans(&set, blob, None);
        assert_eq!(texts(&spans, blob), vec!["must be"]);
    }

    #[test]
    fn test_ties_broken_by_matcher_order_not_position() {
        // the first-listed phrase claims its region even though the second
        // one starts earlier in the blob
        let mut config = HighlightConfig::empty();
        config.flagged = phrases(&["experience required", "must have experience"]);
        let set = PatternCompiler::compile(&config, &[]);

        let blob = "must have experience required";
        let spans = find_spans(&set, blob, None);
        assert_eq!(texts(&spans, blob), vec!["experience required"]);
    }

    #[test]
    fn test_nested_phrase_not_double_annotated() {
        let mut config = HighlightConfig::empty();
        config.flagged = phrases(&["top secret clearance", "secret clearance"]);
        let set = PatternCompiler::compile(&config, &[]);

        let blob = "Active top secret clearance";
        let spans = find_spans(&set, blob, None);
        assert_eq!(texts(&spans, blob), vec!["top secret clearance"]);
    }

    #[test]
    fn test_search_terms_beat_vocabulary() {
        let mut config = HighlightConfig::empty();
        config.always_highlight = phrases(&["angular"]);
        let set = PatternCompiler::compile(&config, &phrases(&["angular developer"]));

        let blob = "Senior Angular Developer";
        let spans = find_spans(&set, blob, None);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].category, Category::SearchTerm);
    }

    #[test]
    fn test_category_filter() {
        let mut config = HighlightConfig::empty();
        config.always_highlight = phrases(&["html"]);
        config.work_types = phrases(&["contract"]);
        let set = PatternCompiler::compile(&config, &[]);

        let blob = "HTML contract";
        let spans = find_spans(&set, blob, Some(&[Category::WorkType]));
        assert_eq!(texts(&spans, blob), vec!["contract"]);
    }

    #[test]
    fn test_spans_sorted_and_disjoint() {
        let set = PatternCompiler::compile(&HighlightConfig::default(), &[]);
        let blob = "Full-time contract to hire, must have JavaScript and CSS, $95K+ DOE, W2 only";
        let spans = find_spans(&set, blob, None);
        assert!(!spans.is_empty());
        for pair in spans.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
        for span in &spans {
            assert!(span.start < span.end && span.end <= blob.len());
        }
    }

    // -------------------------------------------------------------------------
    // Currency
    // -------------------------------------------------------------------------
    fn currency_set() -> MatcherSet {
        let mut config = HighlightConfig::empty();
        config.currency = true;
        PatternCompiler::compile(&config, &[])
    }

    #[test]
    fn test_currency_range() {
        let blob = "Pay: $120K-$150K";
        let spans = find_spans(&currency_set(), blob, None);
        assert_eq!(texts(&spans, blob), vec!["$120K", "$150K"]);
        assert!(spans.iter().all(|s| s.category == Category::Currency));
    }

    #[test]
    fn test_currency_separators_and_plus() {
        let blob = "Salary €1,500.50 per day or £90k+ annually.";
        let spans = find_spans(&currency_set(), blob, None);
        assert_eq!(texts(&spans, blob), vec!["€1,500.50", "£90k+"]);
    }

    #[test]
    fn test_currency_without_symbol_needs_suffix() {
        let blob = "Range 150K to 2M, 5 years experience";
        let spans = find_spans(&currency_set(), blob, None);
        assert_eq!(texts(&spans, blob), vec!["150K", "2M"]);
    }

    #[test]
    fn test_currency_trailing_period_excluded() {
        let blob = "Up to $50,000.";
        let spans = find_spans(&currency_set(), blob, None);
        assert_eq!(texts(&spans, blob), vec!["$50,000"]);
    }
}
