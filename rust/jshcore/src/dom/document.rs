//! In-memory page: an arena DOM with just enough structure for highlighting
//!
//! Nodes are never freed; a removed node keeps its id but is no longer
//! connected to the root, which is exactly the state a live page leaves a
//! node in when a single-page app tears it down mid-scan.

use super::page::{Marker, NodeKind, Page, PageError};
use super::selector::Selector;

/// Index of a node in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
enum NodeData {
    Root,
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeEntry {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// Elements whose contents never render as text
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "meta", "link"];

/// Arena-backed document with `<html><head/><body/></html>` pre-created
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeEntry>,
    head: NodeId,
    body: NodeId,
    styles: Vec<String>,
    clicks: Vec<NodeId>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: vec![NodeEntry {
                parent: None,
                children: Vec::new(),
                data: NodeData::Root,
            }],
            head: NodeId(0),
            body: NodeId(0),
            styles: Vec::new(),
            clicks: Vec::new(),
        };
        let html = doc.append_element(NodeId(0), "html", &[]);
        doc.head = doc.append_element(html, "head", &[]);
        doc.body = doc.append_element(html, "body", &[]);
        doc
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    // === Construction ===

    fn push(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeEntry {
            parent: Some(parent),
            children: Vec::new(),
            data,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Append a new element as the last child of `parent`
    pub fn append_element(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        self.push(
            parent,
            NodeData::Element {
                tag: tag.to_ascii_lowercase(),
                attrs: attrs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            },
        )
    }

    /// Append a new text node as the last child of `parent`
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.push(parent, NodeData::Text(text.to_string()))
    }

    /// Detach a node (and its subtree) from its parent
    pub fn remove(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes.get(node.0).and_then(|n| n.parent) {
            self.nodes[parent.0].children.retain(|c| *c != node);
            self.nodes[node.0].parent = None;
        }
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(NodeData::Element { attrs, .. }) = self.nodes.get_mut(node.0).map(|n| &mut n.data) {
            match attrs.iter_mut().find(|(k, _)| k == name) {
                Some((_, v)) => *v = value.to_string(),
                None => attrs.push((name.to_string(), value.to_string())),
            }
        }
    }

    /// Replace the data of a text node
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        if let Some(NodeData::Text(data)) = self.nodes.get_mut(node.0).map(|n| &mut n.data) {
            *data = text.to_string();
        }
    }

    // === Inspection ===

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(node.0)?.data {
            NodeData::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        match &self.nodes.get(node.0)?.data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(node.0)?.data {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0)?.parent
    }

    pub fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        self.parent(node).filter(|p| self.tag(*p).is_some())
    }

    pub fn child_nodes(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// 1-based position among element siblings
    pub fn element_index(&self, node: NodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        self.child_nodes(parent)
            .iter()
            .filter(|c| self.tag(**c).is_some())
            .position(|c| *c == node)
            .map(|i| i + 1)
    }

    /// Descendants in document order (excluding `node` itself)
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.child_nodes(node).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.child_nodes(current).iter().rev().copied());
        }
        out
    }

    /// Concatenated text of every descendant text node
    pub fn text_content(&self, node: NodeId) -> String {
        if let Some(text) = self.text(node) {
            return text.to_string();
        }
        let mut out = String::new();
        for id in self.descendants(node) {
            if let Some(text) = self.text(id) {
                out.push_str(text);
            } else if self.tag(id) == Some("br") {
                out.push('\n');
            }
        }
        out
    }

    /// Markup of the node's children
    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for child in self.child_nodes(node) {
            self.write_html(*child, &mut out);
        }
        out
    }

    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        match &self.nodes[node.0].data {
            NodeData::Root => out.push_str(&self.inner_html(node)),
            NodeData::Text(text) => out.push_str(&escape_text(text)),
            NodeData::Element { tag, attrs } => {
                out.push('<');
                out.push_str(tag);
                for (k, v) in attrs {
                    out.push_str(&format!(" {}=\"{}\"", k, escape_attr(v)));
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                for child in &self.nodes[node.0].children {
                    self.write_html(*child, out);
                }
                out.push_str(&format!("</{}>", tag));
            }
        }
    }

    /// Style sheets added through [`Page::inject_style`]
    pub fn styles(&self) -> &[String] {
        &self.styles
    }

    /// Elements activated through [`Page::click`], in order
    pub fn clicks(&self) -> &[NodeId] {
        &self.clicks
    }

    fn require_connected(&self, node: NodeId) -> Result<(), PageError> {
        if self.connected(node) {
            Ok(())
        } else {
            Err(PageError::Detached)
        }
    }

    fn connected(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == self.root() {
                return true;
            }
            current = self.parent(id);
        }
        false
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

impl Page for Document {
    type Node = NodeId;

    fn query_all(&self, scope: Option<&NodeId>, selector: &str) -> Result<Vec<NodeId>, PageError> {
        let sel = Selector::parse(selector).map_err(|e| PageError::Selector(e.to_string()))?;
        let start = scope.copied().unwrap_or_else(|| self.root());
        Ok(self
            .descendants(start)
            .into_iter()
            .filter(|id| self.tag(*id).is_some() && sel.matches(self, *id))
            .collect())
    }

    fn is_connected(&self, node: &NodeId) -> bool {
        self.connected(*node)
    }

    fn node_kind(&self, node: &NodeId) -> NodeKind {
        match self.nodes.get(node.0).map(|n| &n.data) {
            Some(NodeData::Element { .. }) => NodeKind::Element,
            Some(NodeData::Text(_)) => NodeKind::Text,
            _ => NodeKind::Other,
        }
    }

    fn children(&self, node: &NodeId) -> Vec<NodeId> {
        self.child_nodes(*node).to_vec()
    }

    fn tag_name(&self, node: &NodeId) -> Option<String> {
        self.tag(*node).map(|t| t.to_string())
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.attr(*node, name).map(|v| v.to_string())
    }

    fn text_data(&self, node: &NodeId) -> Option<String> {
        self.text(*node).map(|t| t.to_string())
    }

    fn rendered_text(&self, node: &NodeId) -> String {
        self.text_content(*node)
    }

    fn split_text(&mut self, node: &NodeId, offset: usize) -> Result<NodeId, PageError> {
        self.require_connected(*node)?;
        let text = self.text(*node).ok_or(PageError::NotText)?.to_string();
        if offset > text.len() || !text.is_char_boundary(offset) {
            return Err(PageError::BadOffset(offset));
        }
        let parent = self.parent(*node).ok_or(PageError::Detached)?;

        let tail = NodeId(self.nodes.len());
        self.nodes.push(NodeEntry {
            parent: Some(parent),
            children: Vec::new(),
            data: NodeData::Text(text[offset..].to_string()),
        });
        self.set_text(*node, &text[..offset]);

        let siblings = &mut self.nodes[parent.0].children;
        let position = siblings
            .iter()
            .position(|c| c == node)
            .ok_or(PageError::Detached)?;
        siblings.insert(position + 1, tail);
        Ok(tail)
    }

    fn wrap(&mut self, node: &NodeId, marker: &Marker) -> Result<NodeId, PageError> {
        self.require_connected(*node)?;
        let parent = self.parent(*node).ok_or(PageError::Detached)?;
        let position = self.nodes[parent.0]
            .children
            .iter()
            .position(|c| c == node)
            .ok_or(PageError::Detached)?;

        let wrapper = NodeId(self.nodes.len());
        self.nodes.push(NodeEntry {
            parent: Some(parent),
            children: vec![*node],
            data: NodeData::Element {
                tag: marker.tag.to_string(),
                attrs: marker
                    .attributes()
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
            },
        });
        self.nodes[parent.0].children[position] = wrapper;
        self.nodes[node.0].parent = Some(wrapper);
        Ok(wrapper)
    }

    fn node_key(&mut self, node: &NodeId) -> Result<u64, PageError> {
        Ok(node.0 as u64)
    }

    fn add_class(&mut self, node: &NodeId, class: &str) -> Result<(), PageError> {
        self.require_connected(*node)?;
        if self.tag(*node).is_none() {
            return Err(PageError::NotElement);
        }
        let current = self.attr(*node, "class").unwrap_or("").to_string();
        if current.split_whitespace().any(|c| c == class) {
            return Ok(());
        }
        let updated = if current.is_empty() {
            class.to_string()
        } else {
            format!("{} {}", current, class)
        };
        self.set_attr(*node, "class", &updated);
        Ok(())
    }

    fn click(&mut self, node: &NodeId) -> Result<(), PageError> {
        self.require_connected(*node)?;
        if self.tag(*node).is_none() {
            return Err(PageError::NotElement);
        }
        self.clicks.push(*node);
        Ok(())
    }

    fn inject_style(&mut self, css: &str) -> Result<(), PageError> {
        let head = self.head;
        let style = self.append_element(head, "style", &[]);
        self.append_text(style, css);
        self.styles.push(css.to_string());
        Ok(())
    }
}
