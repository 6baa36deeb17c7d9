//! JshCore: Job Search Highlighter engine
//!
//! A Rust/WASM implementation of the job-board highlighter: it watches a
//! page for job descriptions and location blocks and wraps interesting
//! phrases in color-coded markers with a hover explanation.
//!
//! # Architecture
//!
//! ## Scanner Components
//! - `category.rs` - Category: the tag every highlight carries, in precedence order
//! - `compiler.rs` - PatternCompiler: vocabulary → ordered matcher set (Aho-Corasick + regex)
//! - `matcher.rs` - find_spans: conflict-resolved spans, first-claimed-wins
//! - `location.rs` - LocationClassifier: whole-block acceptance of location text
//! - `query.rs` - Search query extraction from the page URL
//!
//! ## Page Components
//! - `dom/page.rs` - Page: the trait every host implements
//! - `dom/document.rs` - Document: in-memory page with a CSS selector subset
//! - `highlight/` - Highlighter: annotator, text-node splitting, default styles
//! - `watch/` - WatchScheduler: once/continuous selector watches driven by `tick`
//! - `engine.rs` - Engine: highlighter + scheduler
//! - `adapters.rs` - Per-site watch tables
//! - `web.rs` - BrowserPage and the `JshEngine` export (wasm32 only)
//!
//! # Usage (WASM)
//! ```javascript,ignore
//! import init, { JshEngine } from 'jshcore';
//!
//! await init();
//!
//! // Install the adapter for the current site and start watching
//! const engine = new JshEngine();
//! engine.start(1000);
//!
//! // Or annotate something by hand
//! engine.annotate(document.querySelector('#jobDescriptionText'));
//! ```

pub mod adapters;
pub mod config;
pub mod dom;
pub mod engine;
pub mod highlight;
pub mod scanner;
pub mod watch;

#[cfg(target_arch = "wasm32")]
pub mod web;

// Public exports
pub use adapters::{AdapterRecord, AdapterRegistry, OneShotAction, SiteAdapter, WatchSpec, WatchTarget};
pub use config::{HighlightConfig, LocationConfig};
pub use dom::{Document, Marker, NodeId, NodeKind, Page, PageError, Selector, SelectorError};
pub use engine::{Engine, EngineError};
pub use highlight::{AnnotateReport, Highlighter};
pub use scanner::*;
pub use watch::{Repeat, TickReport, WatchId, WatchOptions, WatchScheduler, WatchState};

#[cfg(target_arch = "wasm32")]
pub use web::{BrowserPage, JshEngine};

use wasm_bindgen::prelude::*;

// When the `wee_alloc` feature is enabled, use `wee_alloc` as the global
// allocator for smaller WASM bundle size.
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Get version information
#[wasm_bindgen]
pub fn version() -> String {
    format!("jshcore v{}", env!("CARGO_PKG_VERSION"))
}

/// Default stylesheet, for hosts that inject styles themselves
#[wasm_bindgen(js_name = "defaultStylesheet")]
pub fn default_stylesheet() -> String {
    highlight::stylesheet()
}
