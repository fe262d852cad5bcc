//! Headless document model the controller drives.
//!
//! Elements live in an arena owned by [`Document`] and are addressed by
//! [`NodeId`], a copyable handle. Handles stay valid for the document's
//! lifetime: detaching an element never frees it, so the card registry can
//! hold handles without owning the elements behind them.
//!
//! The model covers exactly what the card controller touches in a browser:
//!
//! - attributes, the class list, inline style and text content
//! - two layout reads: [`Document::scroll_height`] (natural content height)
//!   and [`Document::offset_height`] (rendered height, a forced layout read)
//! - a single focused element
//! - compound selectors for `querySelectorAll` / `closest` lookups
//!
//! There is no layout engine. Every element carries an intrinsic content
//! height (`data-height` in markup) and a container without one measures as
//! the sum of its children.

mod markup;
mod selector;

pub use markup::parse_document;
pub use selector::Selector;

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomError {
    #[error("markup parse error: {0}")]
    Markup(#[from] roxmltree::Error),
    #[error("invalid selector `{0}`")]
    InvalidSelector(String),
}

/// Handle to an element in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Element {
    tag: String,
    attributes: IndexMap<String, String>,
    classes: Vec<String>,
    style: IndexMap<String, String>,
    text: String,
    intrinsic_height: f64,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attributes: IndexMap::new(),
            classes: Vec::new(),
            style: IndexMap::new(),
            text: String::new(),
            intrinsic_height: 0.0,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// Arena of elements plus the focus and layout-read bookkeeping.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Element>,
    active: Option<NodeId>,
    layout_reads: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document holding only the `#document` root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Element::new("#document")],
            active: None,
            layout_reads: 0,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    fn el(&self, node: NodeId) -> &Element {
        &self.nodes[node.0]
    }

    fn el_mut(&mut self, node: NodeId) -> &mut Element {
        &mut self.nodes[node.0]
    }

    // ------------------------------------------------------------------
    // Tree
    // ------------------------------------------------------------------

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.nodes.push(Element::new(tag));
        NodeId(self.nodes.len() - 1)
    }

    /// Append `child` as the last child of `parent`, detaching it first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.el_mut(child).parent = Some(parent);
        self.el_mut(parent).children.push(child);
    }

    /// Remove `node` from its parent. The element itself stays in the arena.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.el_mut(node).parent.take() {
            self.el_mut(parent).children.retain(|c| *c != node);
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.el(node).parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.el(node).children
    }

    /// Descendants of `node` in document (pre-)order, excluding `node`.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.el(node).children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.el(next).children.iter().rev().copied());
        }
        out
    }

    /// Inclusive containment, as in the DOM: a node contains itself.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.el(current).parent;
        }
        false
    }

    /// Whether `node` is attached to the document root.
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.contains(self.root(), node)
    }

    // ------------------------------------------------------------------
    // Attributes, classes, text
    // ------------------------------------------------------------------

    pub fn tag(&self, node: NodeId) -> &str {
        &self.el(node).tag
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.el(node).attributes.get(name).map(String::as_str)
    }

    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.el(node).attributes.contains_key(name)
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        self.el_mut(node)
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
        self.el_mut(node).attributes.shift_remove(name);
    }

    pub fn id(&self, node: NodeId) -> Option<&str> {
        self.attribute(node, "id").filter(|id| !id.is_empty())
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.el(node).classes.iter().any(|c| c == class)
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if !self.has_class(node, class) {
            self.el_mut(node).classes.push(class.to_string());
        }
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        self.el_mut(node).classes.retain(|c| c != class);
    }

    pub fn classes(&self, node: NodeId) -> &[String] {
        &self.el(node).classes
    }

    pub fn text(&self, node: NodeId) -> &str {
        &self.el(node).text
    }

    pub fn set_text(&mut self, node: NodeId, text: &str) {
        self.el_mut(node).text = text.to_string();
    }

    // ------------------------------------------------------------------
    // Inline style and layout
    // ------------------------------------------------------------------

    /// Inline style value, or `""` when unset (CSSOM semantics).
    pub fn style(&self, node: NodeId, property: &str) -> &str {
        self.el(node)
            .style
            .get(property)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Set an inline style property. An empty value removes it.
    pub fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        let style = &mut self.el_mut(node).style;
        if value.is_empty() {
            style.shift_remove(property);
        } else {
            style.insert(property.to_string(), value.to_string());
        }
    }

    pub fn set_intrinsic_height(&mut self, node: NodeId, height: f64) {
        self.el_mut(node).intrinsic_height = height.max(0.0);
    }

    /// Natural content height, ignoring any inline height clamp.
    pub fn scroll_height(&self, node: NodeId) -> f64 {
        let el = self.el(node);
        if el.intrinsic_height > 0.0 {
            el.intrinsic_height
        } else {
            el.children.iter().map(|c| self.scroll_height(*c)).sum()
        }
    }

    /// Rendered height. Counts as a forced layout read.
    pub fn offset_height(&mut self, node: NodeId) -> f64 {
        self.layout_reads += 1;
        match parse_px(self.style(node, "height")) {
            Some(px) => px,
            None => self.scroll_height(node),
        }
    }

    /// Number of forced layout reads performed so far.
    pub fn layout_reads(&self) -> u64 {
        self.layout_reads
    }

    // ------------------------------------------------------------------
    // Focus
    // ------------------------------------------------------------------

    pub fn active_element(&self) -> Option<NodeId> {
        self.active
    }

    pub fn focus(&mut self, node: NodeId) {
        self.active = Some(node);
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn matches(&self, node: NodeId, selector: &Selector) -> bool {
        let el = self.el(node);
        selector.matches(&el.tag, &el.classes, |name| {
            el.attributes.get(name).map(String::as_str)
        })
    }

    pub fn query_selector_all(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|n| self.matches(*n, selector))
            .collect()
    }

    pub fn query_selector(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|n| self.matches(*n, selector))
    }

    /// Nearest inclusive ancestor matching `selector`.
    pub fn closest(&self, node: NodeId, selector: &Selector) -> Option<NodeId> {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if self.matches(current, selector) {
                return Some(current);
            }
            cursor = self.el(current).parent;
        }
        None
    }

    /// First connected element whose `id` equals `id`.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        if id.is_empty() {
            return None;
        }
        self.descendants(self.root())
            .into_iter()
            .find(|n| self.attribute(*n, "id") == Some(id))
    }
}

/// Parse a `"120px"` / `"0"` length. `auto` and other units yield `None`.
pub fn parse_px(value: &str) -> Option<f64> {
    let value = value.trim();
    if value == "0" {
        return Some(0.0);
    }
    value.strip_suffix("px")?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let section = doc.create_element("section");
        let a = doc.create_element("div");
        let b = doc.create_element("p");
        doc.append_child(doc.root(), section);
        doc.append_child(section, a);
        doc.append_child(a, b);
        (doc, section, a, b)
    }

    #[test]
    fn descendants_are_preorder() {
        let mut doc = Document::new();
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        let c = doc.create_element("c");
        let d = doc.create_element("d");
        doc.append_child(doc.root(), a);
        doc.append_child(a, b);
        doc.append_child(doc.root(), c);
        doc.append_child(b, d);
        let tags: Vec<&str> = doc
            .descendants(doc.root())
            .into_iter()
            .map(|n| doc.tag(n))
            .collect();
        assert_eq!(tags, vec!["a", "b", "d", "c"]);
    }

    #[test]
    fn contains_is_inclusive() {
        let (doc, section, a, b) = tree();
        assert!(doc.contains(section, b));
        assert!(doc.contains(a, a));
        assert!(!doc.contains(b, a));
    }

    #[test]
    fn detached_nodes_are_not_found_by_id() {
        let (mut doc, _, a, _) = tree();
        doc.set_attribute(a, "id", "target");
        assert_eq!(doc.get_element_by_id("target"), Some(a));
        doc.detach(a);
        assert_eq!(doc.get_element_by_id("target"), None);
        assert!(!doc.is_connected(a));
    }

    #[test]
    fn empty_style_value_removes_property() {
        let (mut doc, _, a, _) = tree();
        doc.set_style(a, "height", "10px");
        assert_eq!(doc.style(a, "height"), "10px");
        doc.set_style(a, "height", "");
        assert_eq!(doc.style(a, "height"), "");
    }

    #[test]
    fn scroll_height_sums_children_without_intrinsic_height() {
        let (mut doc, section, a, b) = tree();
        doc.set_intrinsic_height(b, 40.0);
        let c = doc.create_element("p");
        doc.set_intrinsic_height(c, 25.0);
        doc.append_child(a, c);
        assert_eq!(doc.scroll_height(a), 65.0);
        assert_eq!(doc.scroll_height(section), 65.0);
    }

    #[test]
    fn offset_height_honours_inline_height_and_counts_reads() {
        let (mut doc, _, a, _) = tree();
        doc.set_intrinsic_height(a, 80.0);
        assert_eq!(doc.offset_height(a), 80.0);
        doc.set_style(a, "height", "0px");
        assert_eq!(doc.offset_height(a), 0.0);
        doc.set_style(a, "height", "auto");
        assert_eq!(doc.offset_height(a), 80.0);
        assert_eq!(doc.layout_reads(), 3);
    }

    #[test]
    fn closest_walks_up_from_self() {
        let (mut doc, section, _, b) = tree();
        doc.set_attribute(section, "data-accordion-group", "");
        let group: Selector = "[data-accordion-group]".parse().unwrap();
        assert_eq!(doc.closest(b, &group), Some(section));
        assert_eq!(doc.closest(section, &group), Some(section));
        assert_eq!(doc.closest(doc.root(), &group), None);
    }

    #[test]
    fn parse_px_accepts_only_pixel_lengths() {
        assert_eq!(parse_px("120px"), Some(120.0));
        assert_eq!(parse_px("0"), Some(0.0));
        assert_eq!(parse_px("auto"), None);
        assert_eq!(parse_px(""), None);
        assert_eq!(parse_px("2rem"), None);
    }
}
