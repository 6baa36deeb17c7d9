//! Page abstraction shared by every host.
//!
//! The annotator and the watch scheduler only ever talk to the page through
//! [`Page`]. The browser implementation drives the live DOM via `web-sys`;
//! [`super::Document`] is an in-memory tree used by tests and by hosts that
//! annotate detached markup.

use crate::scanner::category::{Category, MARK_ATTR};

/// Error type for page operations.
#[derive(Debug, Clone, PartialEq)]
pub enum PageError {
    /// The node was removed from the page between discovery and mutation
    Detached,
    /// Operation needs a text node
    NotText,
    /// Operation needs an element
    NotElement,
    /// Offset past the end of the text or inside a multi-byte character
    BadOffset(usize),
    /// Selector could not be parsed
    Selector(String),
    /// Error reported by the host page
    Host(String),
}

impl std::fmt::Display for PageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageError::Detached => write!(f, "Node is no longer attached to the page"),
            PageError::NotText => write!(f, "Expected a text node"),
            PageError::NotElement => write!(f, "Expected an element"),
            PageError::BadOffset(offset) => write!(f, "Invalid text offset: {}", offset),
            PageError::Selector(msg) => write!(f, "Invalid selector: {}", msg),
            PageError::Host(msg) => write!(f, "Host error: {}", msg),
        }
    }
}

impl std::error::Error for PageError {}

impl From<String> for PageError {
    fn from(s: String) -> Self {
        PageError::Host(s)
    }
}

/// Coarse node classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    Other,
}

/// Attributes of the element wrapped around a matched substring. Hover text
/// comes from the stylesheet's `::before` rule for the category class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub tag: &'static str,
    pub class: String,
    pub category: Category,
}

impl Marker {
    pub fn for_category(category: Category) -> Self {
        Self {
            tag: "span",
            class: category.marker_classes(),
            category,
        }
    }

    /// Attribute list in the order it is applied
    pub fn attributes(&self) -> [(&'static str, String); 2] {
        [
            ("class", self.class.clone()),
            (MARK_ATTR, self.category.as_str().to_string()),
        ]
    }
}

/// Everything the engine needs from a page.
///
/// Mutation is limited to splitting text nodes and wrapping them; hosts
/// never have a subtree replaced underneath them.
pub trait Page {
    /// Node handle. Handles compare equal when they refer to the same node.
    type Node: Clone + PartialEq + std::fmt::Debug;

    /// Elements matching `selector`, in document order, optionally limited to
    /// descendants of `scope`.
    fn query_all(&self, scope: Option<&Self::Node>, selector: &str)
        -> Result<Vec<Self::Node>, PageError>;

    /// Whether the node is still part of the page
    fn is_connected(&self, node: &Self::Node) -> bool;

    fn node_kind(&self, node: &Self::Node) -> NodeKind;

    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

    /// Lowercase tag name for elements
    fn tag_name(&self, node: &Self::Node) -> Option<String>;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    /// Character data of a text node
    fn text_data(&self, node: &Self::Node) -> Option<String>;

    /// Rendered text of an element, including nested elements
    fn rendered_text(&self, node: &Self::Node) -> String;

    /// Split a text node at a byte offset. The node keeps `[..offset]`; the
    /// returned node holds `[offset..]` and is inserted right after it.
    fn split_text(&mut self, node: &Self::Node, offset: usize) -> Result<Self::Node, PageError>;

    /// Wrap a node in a new marker element placed where the node was.
    /// Returns the marker element.
    fn wrap(&mut self, node: &Self::Node, marker: &Marker) -> Result<Self::Node, PageError>;

    /// Stable identity of an element for the lifetime of the page
    fn node_key(&mut self, node: &Self::Node) -> Result<u64, PageError>;

    fn add_class(&mut self, node: &Self::Node, class: &str) -> Result<(), PageError>;

    /// Activate an element as if the visitor clicked it
    fn click(&mut self, node: &Self::Node) -> Result<(), PageError>;

    /// Append a style sheet to the page
    fn inject_style(&mut self, css: &str) -> Result<(), PageError>;

    // === Provided ===

    /// Text of the node's direct text children only, ignoring nested elements
    fn direct_text(&self, node: &Self::Node) -> String {
        self.children(node)
            .iter()
            .filter_map(|child| match self.node_kind(child) {
                NodeKind::Text => self.text_data(child),
                _ => None,
            })
            .collect()
    }

    /// Whether the node is a marker inserted by a previous pass
    fn is_marker(&self, node: &Self::Node) -> bool {
        self.node_kind(node) == NodeKind::Element && self.attribute(node, MARK_ATTR).is_some()
    }
}
