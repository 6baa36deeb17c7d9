//! Browser bindings (wasm32 only)
//!
//! `BrowserPage` drives the live DOM through `web-sys`. `JshEngine` is the
//! JavaScript-facing handle: it installs the adapter for the current URL and
//! ticks the watch scheduler from a `gloo-timers` interval.
//!
//! # Usage (WASM)
//! ```javascript,ignore
//! import init, { JshEngine } from 'jshcore';
//!
//! await init();
//! const engine = new JshEngine({ flag_criminal_record: true });
//! engine.start(1000);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::Interval;
use js_sys::{Object, WeakMap};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement, Node, NodeList, Text};

use crate::adapters::AdapterRegistry;
use crate::config::HighlightConfig;
use crate::dom::{Marker, NodeKind, Page, PageError};
use crate::engine::Engine;
use crate::scanner::category::Category;

fn host_error(e: JsValue) -> PageError {
    PageError::Host(format!("{:?}", e))
}

fn node_list(list: NodeList) -> Vec<Node> {
    (0..list.length()).filter_map(|i| list.item(i)).collect()
}

// =============================================================================
// BrowserPage
// =============================================================================

/// The live document of the current window.
///
/// Node identities live in a `WeakMap` owned by this page; host elements are
/// never tagged.
pub struct BrowserPage {
    document: web_sys::Document,
    keys: WeakMap,
    next_key: u64,
}

impl BrowserPage {
    pub fn new(document: web_sys::Document) -> Self {
        Self {
            document,
            keys: WeakMap::new(),
            next_key: 0,
        }
    }

    /// Page for `window.document`
    pub fn current() -> Result<Self, PageError> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| PageError::Host("no window.document".to_string()))?;
        Ok(Self::new(document))
    }

    pub fn document(&self) -> &web_sys::Document {
        &self.document
    }
}

impl Page for BrowserPage {
    type Node = Node;

    fn query_all(&self, scope: Option<&Node>, selector: &str) -> Result<Vec<Node>, PageError> {
        let list = match scope {
            Some(scope) => scope
                .dyn_ref::<Element>()
                .ok_or(PageError::NotElement)?
                .query_selector_all(selector),
            None => self.document.query_selector_all(selector),
        }
        .map_err(|e| PageError::Selector(format!("{}: {:?}", selector, e)))?;
        Ok(node_list(list))
    }

    fn is_connected(&self, node: &Node) -> bool {
        node.is_connected()
    }

    fn node_kind(&self, node: &Node) -> NodeKind {
        match node.node_type() {
            Node::ELEMENT_NODE => NodeKind::Element,
            Node::TEXT_NODE => NodeKind::Text,
            _ => NodeKind::Other,
        }
    }

    fn children(&self, node: &Node) -> Vec<Node> {
        node_list(node.child_nodes())
    }

    fn tag_name(&self, node: &Node) -> Option<String> {
        node.dyn_ref::<Element>().map(|el| el.local_name())
    }

    fn attribute(&self, node: &Node, name: &str) -> Option<String> {
        node.dyn_ref::<Element>().and_then(|el| el.get_attribute(name))
    }

    fn text_data(&self, node: &Node) -> Option<String> {
        if node.node_type() == Node::TEXT_NODE {
            node.node_value()
        } else {
            None
        }
    }

    fn rendered_text(&self, node: &Node) -> String {
        match node.dyn_ref::<HtmlElement>() {
            Some(el) => el.inner_text(),
            None => node.text_content().unwrap_or_default(),
        }
    }

    fn split_text(&mut self, node: &Node, offset: usize) -> Result<Node, PageError> {
        let text = node.dyn_ref::<Text>().ok_or(PageError::NotText)?;
        if !node.is_connected() {
            return Err(PageError::Detached);
        }
        let data = node.node_value().unwrap_or_default();
        if offset > data.len() || !data.is_char_boundary(offset) {
            return Err(PageError::BadOffset(offset));
        }
        // DOM offsets count UTF-16 code units
        let units = data[..offset].encode_utf16().count() as u32;
        let tail = text.split_text(units).map_err(host_error)?;
        Ok(tail.into())
    }

    fn wrap(&mut self, node: &Node, marker: &Marker) -> Result<Node, PageError> {
        let parent = node.parent_node().ok_or(PageError::Detached)?;
        let wrapper = self.document.create_element(marker.tag).map_err(host_error)?;
        for (name, value) in marker.attributes() {
            wrapper.set_attribute(name, &value).map_err(host_error)?;
        }
        parent.insert_before(&wrapper, Some(node)).map_err(host_error)?;
        wrapper.append_child(node).map_err(host_error)?;
        Ok(wrapper.into())
    }

    fn node_key(&mut self, node: &Node) -> Result<u64, PageError> {
        if node.dyn_ref::<Element>().is_none() {
            return Err(PageError::NotElement);
        }
        let object: &Object = node.as_ref();
        if let Some(key) = self.keys.get(object).as_f64() {
            return Ok(key as u64);
        }
        let key = self.next_key;
        self.next_key += 1;
        self.keys.set(object, &JsValue::from_f64(key as f64));
        Ok(key)
    }

    fn add_class(&mut self, node: &Node, class: &str) -> Result<(), PageError> {
        let el = node.dyn_ref::<Element>().ok_or(PageError::NotElement)?;
        el.class_list().add_1(class).map_err(host_error)
    }

    fn click(&mut self, node: &Node) -> Result<(), PageError> {
        if !node.is_connected() {
            return Err(PageError::Detached);
        }
        let el = node.dyn_ref::<HtmlElement>().ok_or(PageError::NotElement)?;
        el.click();
        Ok(())
    }

    fn inject_style(&mut self, css: &str) -> Result<(), PageError> {
        let head = self
            .document
            .head()
            .ok_or_else(|| PageError::Host("document has no <head>".to_string()))?;
        let style = self.document.create_element("style").map_err(host_error)?;
        style.set_text_content(Some(css));
        head.append_child(&style).map_err(host_error)?;
        Ok(())
    }
}

// =============================================================================
// JshEngine (JS binding)
// =============================================================================

struct Shared {
    engine: Engine<BrowserPage>,
    page: BrowserPage,
}

impl Shared {
    fn tick(&mut self) -> crate::watch::TickReport {
        let Shared { engine, page } = self;
        engine.tick(page)
    }
}

/// Highlighter for the current browser tab
#[wasm_bindgen]
pub struct JshEngine {
    shared: Rc<RefCell<Shared>>,
    interval: Option<Interval>,
}

fn js_error(context: &str, e: impl std::fmt::Display) -> JsValue {
    let msg = format!("[JshEngine] {}: {}", context, e);
    web_sys::console::error_1(&msg.clone().into());
    JsValue::from_str(&msg)
}

#[wasm_bindgen]
impl JshEngine {
    /// Build the engine for `window.location` and install the matching
    /// site adapter. `config` may be omitted for the stock vocabulary.
    #[wasm_bindgen(constructor)]
    pub fn js_new(config: JsValue) -> Result<JshEngine, JsValue> {
        let config: HighlightConfig = if config.is_undefined() || config.is_null() {
            HighlightConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(|e| js_error("invalid config", e))?
        };

        let href = web_sys::window()
            .ok_or_else(|| js_error("no window", "not running in a browser"))?
            .location()
            .href()
            .map_err(|e| js_error("no location", format!("{:?}", e)))?;

        let mut page = BrowserPage::current().map_err(|e| js_error("no document", e))?;
        let engine = Engine::bootstrap(config, &href, &AdapterRegistry::builtin(), &mut page)
            .map_err(|e| js_error("bootstrap failed", e))?;

        for diagnostic in engine.highlighter().diagnostics() {
            web_sys::console::warn_1(&format!("[JshEngine] {}", diagnostic).into());
        }

        Ok(JshEngine {
            shared: Rc::new(RefCell::new(Shared { engine, page })),
            interval: None,
        })
    }

    /// Tick once now, then every `interval_ms`. Restarting replaces the
    /// previous interval.
    #[wasm_bindgen(js_name = "start")]
    pub fn js_start(&mut self, interval_ms: u32) {
        if let Ok(mut shared) = self.shared.try_borrow_mut() {
            shared.tick();
        }
        let shared = Rc::clone(&self.shared);
        self.interval = Some(Interval::new(interval_ms, move || {
            // a tick still running from a callback re-entry is skipped
            if let Ok(mut shared) = shared.try_borrow_mut() {
                shared.tick();
            }
        }));
    }

    #[wasm_bindgen(js_name = "stop")]
    pub fn js_stop(&mut self) {
        self.interval = None;
    }

    /// Run one scan now. Returns `{ dispatched, retired }`.
    #[wasm_bindgen(js_name = "tick")]
    pub fn js_tick(&self) -> Result<JsValue, JsValue> {
        let mut shared = self
            .shared
            .try_borrow_mut()
            .map_err(|e| js_error("tick", e))?;
        let report = shared.tick();
        serde_wasm_bindgen::to_value(&report).map_err(|e| js_error("tick", e))
    }

    /// Annotate an element now. `categories` is an optional array of
    /// category slugs (`"flagged"`, `"work-type"`, ...).
    #[wasm_bindgen(js_name = "annotate")]
    pub fn js_annotate(&self, element: Element, categories: JsValue) -> Result<JsValue, JsValue> {
        let only: Option<Vec<Category>> = if categories.is_undefined() || categories.is_null() {
            None
        } else {
            Some(serde_wasm_bindgen::from_value(categories).map_err(|e| js_error("invalid categories", e))?)
        };
        let mut shared = self
            .shared
            .try_borrow_mut()
            .map_err(|e| js_error("annotate", e))?;
        let Shared { engine, page } = &mut *shared;
        let report = engine.annotate(page, element.as_ref(), only.as_deref());
        serde_wasm_bindgen::to_value(&report).map_err(|e| js_error("annotate", e))
    }

    /// Classify an element as a location block. Returns `null` when rejected.
    #[wasm_bindgen(js_name = "classifyLocation")]
    pub fn js_classify_location(&self, element: Element, text_nodes_only: bool) -> Result<JsValue, JsValue> {
        let mut shared = self
            .shared
            .try_borrow_mut()
            .map_err(|e| js_error("classifyLocation", e))?;
        let Shared { engine, page } = &mut *shared;
        match engine.classify_location(page, element.as_ref(), text_nodes_only) {
            Some(report) => serde_wasm_bindgen::to_value(&report).map_err(|e| js_error("classifyLocation", e)),
            None => Ok(JsValue::NULL),
        }
    }

    /// Name of the installed site adapter, or `undefined`
    #[wasm_bindgen(js_name = "adapter")]
    pub fn js_adapter(&self) -> Option<String> {
        self.shared
            .try_borrow()
            .ok()
            .and_then(|shared| shared.engine.adapter().map(str::to_string))
    }
}
