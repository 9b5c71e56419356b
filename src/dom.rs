//! Minimal document model the widget renders into
//!
//! An arena of element and text nodes with id lookup and HTML
//! serialization. Text is only ever stored in text nodes and escaped on
//! output, so content can never become markup. Freed slots are reused;
//! each slot carries a generation so a stale `NodeId` never resolves to
//! the node that replaced it.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;

/// Handle to a node in a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

#[derive(Debug, Clone)]
enum NodeKind {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone, Default)]
struct ElementData {
    tag: String,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    style: BTreeMap<String, String>,
    hidden: bool,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Host document
#[derive(Debug, Default)]
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<usize>,
    ids: HashMap<String, NodeId>,
    body: Option<NodeId>,
}

impl Document {
    /// Empty document with a `<body>` root
    pub fn new() -> Self {
        let mut doc = Self::default();
        let body = doc.create_element("body");
        doc.body = Some(body);
        doc
    }

    pub fn body(&self) -> NodeId {
        self.body.unwrap_or(NodeId {
            index: 0,
            generation: 0,
        })
    }

    /// Append a `<div id=...>` to the body, as a host page would
    pub fn add_container(&mut self, id: &str) -> NodeId {
        let div = self.create_element("div");
        self.set_attribute(div, "id", id);
        let body = self.body();
        self.append_child(body, div);
        div
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.insert(NodeKind::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            ..Default::default()
        }))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.insert(NodeKind::Text(text.to_string()))
    }

    /// Attach `child` as the last child of `parent`, detaching it from any
    /// previous parent first
    ///
    /// Ignored when `child` is `parent` or one of its ancestors.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.exists(parent) || !self.exists(child) {
            return;
        }
        let mut cursor = Some(parent);
        while let Some(node) = cursor {
            if node == child {
                return;
            }
            cursor = self.parent(node);
        }
        self.detach(child);
        if let Some(el) = self.element_mut(parent) {
            el.children.push(child);
        } else {
            return;
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
    }

    /// Detach and drop `node` and its whole subtree
    pub fn remove(&mut self, node: NodeId) {
        if !self.exists(node) {
            return;
        }
        self.detach(node);

        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(removed) = self.take(id) {
                if let NodeKind::Element(el) = removed.kind {
                    if let Some(dom_id) = el.attributes.get("id") {
                        if self.ids.get(dom_id) == Some(&id) {
                            self.ids.remove(dom_id);
                        }
                    }
                    stack.extend(el.children);
                }
            }
        }
    }

    /// Remove every child of `node`
    pub fn clear_children(&mut self, node: NodeId) {
        let children = self.children(node);
        for child in children {
            self.remove(child);
        }
    }

    pub fn exists(&self, node: NodeId) -> bool {
        self.node(node).is_some()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).and_then(|n| n.parent)
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.element(node).map(|el| el.children.clone()).unwrap_or_default()
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|el| el.tag.as_str())
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if self.element(node).is_none() {
            return;
        }
        if name == "id" {
            if let Some(old) = self.attribute(node, "id").map(str::to_string) {
                if self.ids.get(&old) == Some(&node) {
                    self.ids.remove(&old);
                }
            }
            self.ids.insert(value.to_string(), node);
        }
        if let Some(el) = self.element_mut(node) {
            el.attributes.insert(name.to_string(), value.to_string());
        }
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)
            .and_then(|el| el.attributes.get(name))
            .map(String::as_str)
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(el) = self.element_mut(node) {
            if !el.classes.iter().any(|c| c == class) {
                el.classes.push(class.to_string());
            }
        }
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(el) = self.element_mut(node) {
            el.classes.retain(|c| c != class);
        }
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node)
            .is_some_and(|el| el.classes.iter().any(|c| c == class))
    }

    pub fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        if let Some(el) = self.element_mut(node) {
            el.style.insert(property.to_string(), value.to_string());
        }
    }

    pub fn style(&self, node: NodeId, property: &str) -> Option<&str> {
        self.element(node)
            .and_then(|el| el.style.get(property))
            .map(String::as_str)
    }

    pub fn set_hidden(&mut self, node: NodeId, hidden: bool) {
        if let Some(el) = self.element_mut(node) {
            el.hidden = hidden;
        }
    }

    pub fn is_hidden(&self, node: NodeId) -> bool {
        self.element(node).is_some_and(|el| el.hidden)
    }

    /// Replace the children of `node` with a single text node
    ///
    /// An existing lone text child is updated in place.
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        if let [only] = *self.children(node).as_slice() {
            if let Some(Node {
                kind: NodeKind::Text(current),
                ..
            }) = self.node_mut(only)
            {
                *current = text.to_string();
                return;
            }
        }
        self.clear_children(node);
        let t = self.create_text(text);
        self.append_child(node, t);
    }

    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.ids.get(id).copied().filter(|n| self.exists(*n))
    }

    /// Concatenated text of `node` and its descendants
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    /// Every element below (and including) `root` with the given tag
    pub fn elements_by_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        let tag = tag.to_ascii_lowercase();
        let mut found = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(el) = self.element(id) {
                if el.tag == tag {
                    found.push(id);
                }
                stack.extend(el.children.iter().rev());
            }
        }
        found
    }

    /// Serialize `node` and its subtree to HTML
    pub fn to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let Some(n) = self.node(node) else {
            return;
        };
        match &n.kind {
            NodeKind::Text(text) => out.push_str(&escape_html(text)),
            NodeKind::Element(el) => {
                let _ = write!(out, "<{}", el.tag);
                for (name, value) in &el.attributes {
                    let _ = write!(out, " {}=\"{}\"", name, escape_html(value));
                }
                if !el.classes.is_empty() {
                    let _ = write!(out, " class=\"{}\"", escape_html(&el.classes.join(" ")));
                }
                if !el.style.is_empty() {
                    let css: Vec<String> = el
                        .style
                        .iter()
                        .map(|(k, v)| format!("{}: {}", k, v))
                        .collect();
                    let _ = write!(out, " style=\"{}\"", escape_html(&css.join("; ")));
                }
                if el.hidden {
                    out.push_str(" hidden");
                }
                out.push('>');
                for child in &el.children {
                    self.write_html(*child, out);
                }
                let _ = write!(out, "</{}>", el.tag);
            }
        }
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        match self.node(node).map(|n| &n.kind) {
            Some(NodeKind::Text(text)) => out.push_str(text),
            Some(NodeKind::Element(el)) => {
                for child in &el.children {
                    self.collect_text(*child, out);
                }
            }
            None => {}
        }
    }

    fn insert(&mut self, kind: NodeKind) -> NodeId {
        let node = Some(Node { kind, parent: None });
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.node = node;
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            node,
        });
        NodeId {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    fn take(&mut self, node: NodeId) -> Option<Node> {
        let slot = self
            .slots
            .get_mut(node.index)
            .filter(|s| s.generation == node.generation)?;
        let taken = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(node.index);
        Some(taken)
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.parent(node) else {
            return;
        };
        if let Some(el) = self.element_mut(parent) {
            el.children.retain(|c| *c != node);
        }
        if let Some(n) = self.node_mut(node) {
            n.parent = None;
        }
    }

    fn node(&self, node: NodeId) -> Option<&Node> {
        self.slots
            .get(node.index)
            .filter(|s| s.generation == node.generation)
            .and_then(|s| s.node.as_ref())
    }

    fn node_mut(&mut self, node: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(node.index)
            .filter(|s| s.generation == node.generation)
            .and_then(|s| s.node.as_mut())
    }

    fn element(&self, node: NodeId) -> Option<&ElementData> {
        match self.node(node).map(|n| &n.kind) {
            Some(NodeKind::Element(el)) => Some(el),
            _ => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut ElementData> {
        match self.node_mut(node).map(|n| &mut n.kind) {
            Some(NodeKind::Element(el)) => Some(el),
            _ => None,
        }
    }
}

/// Escape text for inclusion in HTML content or attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
