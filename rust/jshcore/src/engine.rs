//! Engine - the highlighter plus the watches that feed it
//!
//! # Usage
//! ```rust
//! use jshcore::{Document, Engine, HighlightConfig};
//!
//! let mut page = Document::new();
//! let mut engine: Engine<Document> = Engine::new(HighlightConfig::default());
//! engine.watch_description("#jobDescriptionText", Default::default());
//! engine.tick(&mut page);
//! ```

use std::time::Duration;

use url::Url;

use crate::adapters::{AdapterRegistry, SiteAdapter};
use crate::config::HighlightConfig;
use crate::dom::{Page, PageError};
use crate::highlight::{AnnotateReport, Highlighter};
use crate::scanner::category::Category;
use crate::scanner::query::search_terms_from_url;
use crate::watch::{Repeat, TickReport, WatchCallback, WatchId, WatchOptions, WatchScheduler};

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The page URL could not be parsed
    InvalidUrl(String),
    Page(PageError),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::InvalidUrl(msg) => write!(f, "Invalid page URL: {}", msg),
            EngineError::Page(e) => write!(f, "Page error: {}", e),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<PageError> for EngineError {
    fn from(e: PageError) -> Self {
        EngineError::Page(e)
    }
}

impl From<url::ParseError> for EngineError {
    fn from(e: url::ParseError) -> Self {
        EngineError::InvalidUrl(e.to_string())
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Compiled highlighter and the watch entries registered against it
pub struct Engine<P: Page> {
    highlighter: Highlighter,
    scheduler: WatchScheduler<P, Highlighter>,
    adapter: Option<String>,
}

impl<P: Page> Engine<P> {
    pub fn new(config: HighlightConfig) -> Self {
        Self::with_search_terms(config, Vec::new())
    }

    pub fn with_search_terms(config: HighlightConfig, search_terms: Vec<String>) -> Self {
        Self {
            highlighter: Highlighter::new(config, search_terms),
            scheduler: WatchScheduler::new(),
            adapter: None,
        }
    }

    /// Engine whose search terms come from `param` in the page URL's query
    pub fn for_url(config: HighlightConfig, page_url: &str, param: Option<&str>) -> Self {
        let terms = param
            .map(|p| search_terms_from_url(page_url, p))
            .unwrap_or_default();
        Self::with_search_terms(config, terms)
    }

    /// Pick the adapter for `page_url`, build the engine with that site's
    /// search terms, and install the adapter on `page`.
    ///
    /// Unknown sites get a bare engine with no watches. The default
    /// stylesheet is injected either way.
    pub fn bootstrap(
        config: HighlightConfig,
        page_url: &str,
        registry: &AdapterRegistry,
        page: &mut P,
    ) -> Result<Self, EngineError> {
        let url = Url::parse(page_url)?;
        let host = url.host_str().unwrap_or_default();
        let path = url.path();

        let adapter = registry.select(host, path);
        let param = adapter.and_then(|a| a.search_param());
        let mut engine = Self::for_url(config, page_url, param);

        page.inject_style(&crate::highlight::stylesheet())?;

        match adapter {
            Some(adapter) => {
                tracing::debug!(adapter = adapter.name(), host, path, "installing site adapter");
                adapter.install(&mut engine, page)?;
                engine.adapter = Some(adapter.name().to_string());
            }
            None => tracing::debug!(host, "no site adapter"),
        }

        Ok(engine)
    }

    pub fn highlighter(&self) -> &Highlighter {
        &self.highlighter
    }

    pub fn scheduler(&self) -> &WatchScheduler<P, Highlighter> {
        &self.scheduler
    }

    /// Name of the installed site adapter, if any
    pub fn adapter(&self) -> Option<&str> {
        self.adapter.as_deref()
    }

    // === Watches ===

    pub fn register_watch(
        &mut self,
        selector: &str,
        repeat: Repeat,
        callback: WatchCallback<P, Highlighter>,
    ) -> WatchId {
        self.scheduler.register(selector, repeat, callback)
    }

    pub fn register_watch_with(
        &mut self,
        selector: &str,
        options: WatchOptions<P::Node>,
        callback: WatchCallback<P, Highlighter>,
    ) -> WatchId {
        self.scheduler.register_with(selector, options, callback)
    }

    /// Annotate every element matching `selector` with the free-text pipeline
    pub fn watch_description(&mut self, selector: &str, options: WatchOptions<P::Node>) -> WatchId {
        let callback: WatchCallback<P, Highlighter> = Box::new(|highlighter, page, node| {
            let report = highlighter.annotate(page, node, None);
            tracing::trace!(markers = report.markers_added, "description annotated");
        });
        self.scheduler.register_with(selector, options, callback)
    }

    /// Classify every element matching `selector` as a location block
    pub fn watch_location(
        &mut self,
        selector: &str,
        options: WatchOptions<P::Node>,
        text_nodes_only: bool,
    ) -> WatchId {
        let callback: WatchCallback<P, Highlighter> = Box::new(move |highlighter, page, node| {
            highlighter.classify_location(page, node, text_nodes_only);
        });
        self.scheduler.register_with(selector, options, callback)
    }

    /// Add `class` to the first batch of elements matching `selector`
    pub fn watch_add_class(&mut self, selector: &str, class: &str) -> WatchId {
        let class = class.to_string();
        let callback: WatchCallback<P, Highlighter> = Box::new(move |_, page, node| {
            if let Err(e) = page.add_class(node, &class) {
                tracing::debug!(error = %e, "add_class skipped");
            }
        });
        self.scheduler
            .register_with(selector, WatchOptions::repeat(Repeat::Once), callback)
    }

    /// Click the first batch of elements matching `selector` once `delay`
    /// has passed
    pub fn watch_click(&mut self, selector: &str, delay: Duration) -> WatchId {
        let callback: WatchCallback<P, Highlighter> = Box::new(|_, page, node| {
            if let Err(e) = page.click(node) {
                tracing::debug!(error = %e, "click skipped");
            }
        });
        let options = WatchOptions::repeat(Repeat::Once).with_delay(delay);
        self.scheduler.register_with(selector, options, callback)
    }

    // === Direct operations ===

    pub fn annotate(&self, page: &mut P, element: &P::Node, only: Option<&[Category]>) -> AnnotateReport {
        self.highlighter.annotate(page, element, only)
    }

    pub fn classify_location(
        &self,
        page: &mut P,
        element: &P::Node,
        text_nodes_only: bool,
    ) -> Option<AnnotateReport> {
        self.highlighter.classify_location(page, element, text_nodes_only)
    }

    /// Run one scan over every pending watch
    pub fn tick(&mut self, page: &mut P) -> TickReport {
        self.scheduler.tick(&self.highlighter, page)
    }

    pub fn tick_at(&mut self, page: &mut P, now: instant::Instant) -> TickReport {
        self.scheduler.tick_at(&self.highlighter, page, now)
    }

    /// Replace the configuration. Watches stay registered; elements already
    /// dispatched are not revisited.
    pub fn recompile(&mut self, config: HighlightConfig) {
        self.highlighter.recompile(config);
    }

    pub fn set_search_terms(&mut self, search_terms: Vec<String>) {
        self.highlighter.set_search_terms(search_terms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, NodeId};
    use crate::highlight::collect_markers;

    fn config() -> HighlightConfig {
        let mut config = HighlightConfig::empty();
        config.flagged = vec!["required".to_string()];
        config.location.accept_remote = true;
        config
    }

    fn description(doc: &mut Document, text: &str) -> NodeId {
        let body = doc.body();
        let div = doc.append_element(body, "div", &[("id", "jobDescriptionText")]);
        doc.append_text(div, text);
        div
    }

    #[test]
    fn test_watch_description_annotates_on_tick() {
        let mut doc = Document::new();
        let div = description(&mut doc, "Clearance required");
        let mut engine: Engine<Document> = Engine::new(config());
        engine.watch_description("#jobDescriptionText", WatchOptions::repeat(Repeat::Once));

        let report = engine.tick(&mut doc);
        assert_eq!(report.dispatched, 1);
        assert_eq!(
            collect_markers(&doc, &div),
            vec![(Category::Flagged, "required".to_string())]
        );
    }

    #[test]
    fn test_watch_location() {
        let mut doc = Document::new();
        let body = doc.body();
        let li = doc.append_element(body, "li", &[("class", "location_sm")]);
        doc.append_text(li, "Remote");
        let mut engine: Engine<Document> = Engine::new(config());
        engine.watch_location(".location_sm", WatchOptions::default(), false);

        engine.tick(&mut doc);
        assert_eq!(
            collect_markers(&doc, &li),
            vec![(Category::Location, "Remote".to_string())]
        );
    }

    #[test]
    fn test_for_url_reads_search_param() {
        let engine: Engine<Document> = Engine::for_url(
            HighlightConfig::empty(),
            "https://www.indeed.com/jobs?q=rust+%22site+reliability%22",
            Some("q"),
        );
        assert_eq!(
            engine.highlighter().search_terms(),
            &["rust".to_string(), "site reliability".to_string()]
        );

        let none: Engine<Document> = Engine::for_url(HighlightConfig::empty(), "https://remote.co/job/1", None);
        assert!(none.highlighter().search_terms().is_empty());
    }

    #[test]
    fn test_recompile_keeps_watches() {
        let mut doc = Document::new();
        let mut engine: Engine<Document> = Engine::new(HighlightConfig::empty());
        engine.watch_description("#jobDescriptionText", WatchOptions::default());
        engine.recompile(config());

        let div = description(&mut doc, "required");
        engine.tick(&mut doc);
        assert_eq!(collect_markers(&doc, &div).len(), 1);
        assert_eq!(engine.scheduler().len(), 1);
    }

    #[test]
    fn test_watch_click_waits_for_delay() {
        let mut doc = Document::new();
        let body = doc.body();
        let toggle = doc.append_element(body, "button", &[("id", "descriptionToggle")]);
        let mut engine: Engine<Document> = Engine::new(HighlightConfig::empty());
        engine.watch_click("#descriptionToggle", Duration::from_millis(1000));

        engine.tick(&mut doc);
        assert!(doc.clicks().is_empty());

        let later = instant::Instant::now() + Duration::from_secs(2);
        engine.tick_at(&mut doc, later);
        assert_eq!(doc.clicks(), &[toggle]);
    }

    #[test]
    fn test_bootstrap_rejects_bad_url() {
        let mut doc = Document::new();
        let result: Result<Engine<Document>, _> = Engine::bootstrap(
            HighlightConfig::empty(),
            "not a url",
            &AdapterRegistry::builtin(),
            &mut doc,
        );
        assert!(matches!(result, Err(EngineError::InvalidUrl(_))));
    }

    #[test]
    fn test_bootstrap_unknown_site_injects_styles_only() {
        let mut doc = Document::new();
        let engine: Engine<Document> = Engine::bootstrap(
            HighlightConfig::empty(),
            "https://example.com/careers",
            &AdapterRegistry::builtin(),
            &mut doc,
        )
        .unwrap();
        assert_eq!(engine.adapter(), None);
        assert!(engine.scheduler().is_empty());
        assert_eq!(doc.styles().len(), 1);
    }
}
