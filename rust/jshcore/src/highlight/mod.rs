//! Highlight module - realizes matches on a page
//!
//! `Highlighter` owns everything compiled from configuration: the free-text
//! matcher set and the location classifier. It is rebuilt, never patched,
//! when configuration or search terms change.

pub mod annotator;
pub mod split;
pub mod styles;

pub use annotator::{annotate, collect_markers, mark_phrase, AnnotateReport};
pub use split::{plan_split, split_span, SplitParts, SplitPlan};
pub use styles::stylesheet;

use crate::config::HighlightConfig;
use crate::dom::Page;
use crate::scanner::category::Category;
use crate::scanner::compiler::{CompileError, MatcherSet, PatternCompiler};
use crate::scanner::location::LocationClassifier;
use crate::scanner::matcher::{find_spans, MatchSpan};

/// Compiled configuration plus the two page-facing operations
#[derive(Debug, Clone)]
pub struct Highlighter {
    config: HighlightConfig,
    search_terms: Vec<String>,
    matchers: MatcherSet,
    location: LocationClassifier,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new(HighlightConfig::default(), Vec::new())
    }
}

impl Highlighter {
    pub fn new(config: HighlightConfig, search_terms: Vec<String>) -> Self {
        let matchers = PatternCompiler::compile(&config, &search_terms);
        let location = LocationClassifier::new(&config.location, config.patterns_for(Category::Location));
        tracing::debug!(
            matchers = matchers.len(),
            search_terms = search_terms.len(),
            "highlighter compiled"
        );
        Self {
            config,
            search_terms,
            matchers,
            location,
        }
    }

    /// Swap in a new configuration; yields a fresh matcher set
    pub fn recompile(&mut self, config: HighlightConfig) {
        let search_terms = std::mem::take(&mut self.search_terms);
        *self = Self::new(config, search_terms);
    }

    pub fn set_search_terms(&mut self, search_terms: Vec<String>) {
        if search_terms == self.search_terms {
            return;
        }
        let config = std::mem::take(&mut self.config);
        *self = Self::new(config, search_terms);
    }

    pub fn config(&self) -> &HighlightConfig {
        &self.config
    }

    pub fn search_terms(&self) -> &[String] {
        &self.search_terms
    }

    pub fn matchers(&self) -> &MatcherSet {
        &self.matchers
    }

    pub fn location(&self) -> &LocationClassifier {
        &self.location
    }

    /// Every configuration error from the last compile
    pub fn diagnostics(&self) -> Vec<CompileError> {
        self.matchers
            .diagnostics()
            .iter()
            .chain(self.location.diagnostics())
            .cloned()
            .collect()
    }

    /// Conflict-resolved spans for a text blob, without touching any page
    pub fn find_spans(&self, text: &str, only: Option<&[Category]>) -> Vec<MatchSpan> {
        find_spans(&self.matchers, text, only)
    }

    /// Annotate every text node under `element`, optionally limited to a
    /// subset of categories
    pub fn annotate<P: Page>(
        &self,
        page: &mut P,
        element: &P::Node,
        only: Option<&[Category]>,
    ) -> AnnotateReport {
        annotate(page, element, &self.matchers, only)
    }

    /// Test the element's text as a whole location block and mark it when
    /// accepted. Returns `None` when the block is rejected.
    ///
    /// With `text_nodes_only`, text of nested elements is ignored.
    pub fn classify_location<P: Page>(
        &self,
        page: &mut P,
        element: &P::Node,
        text_nodes_only: bool,
    ) -> Option<AnnotateReport> {
        if !page.is_connected(element) {
            return None;
        }
        let raw = if text_nodes_only {
            page.direct_text(element)
        } else {
            page.rendered_text(element)
        };
        let accepted = self.location.classify(&raw)?;
        tracing::trace!(location = accepted.as_str(), "location accepted");
        Some(mark_phrase(page, element, &accepted, Category::Location))
    }
}
