//! Document capability used by every effect, plus the in-memory [`Page`]
//! that implements it.
//!
//! Effects never reach for a global document. They receive `&mut impl
//! Document` and look up what they need, so the terminal host and headless
//! tests drive exactly the same code.

use std::collections::BTreeMap;

use crate::types::{Rect, Vec2};

/// Slot index plus the generation the slot had when the element was made.
/// A reused slot bumps its generation, so old handles never alias new
/// elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId {
    index: usize,
    generation: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub scroll_y: f32,
}

impl Viewport {
    /// Visible region in document coordinates.
    pub fn rect(&self) -> Rect {
        Rect::new(0.0, self.scroll_y, self.width, self.height)
    }
}

pub trait Document {
    fn body(&self) -> ElementId;
    fn element_by_id(&self, id: &str) -> Option<ElementId>;
    /// Connected elements carrying `class`, in document order.
    fn elements_with_class(&self, class: &str) -> Vec<ElementId>;
    /// Connected elements carrying attribute `name`, in document order.
    fn elements_with_attr(&self, name: &str) -> Vec<ElementId>;
    fn parent(&self, el: ElementId) -> Option<ElementId>;
    fn children(&self, el: ElementId) -> Vec<ElementId>;
    fn tag(&self, el: ElementId) -> Option<String>;
    fn is_connected(&self, el: ElementId) -> bool;

    fn attr(&self, el: ElementId, name: &str) -> Option<String>;
    fn set_attr(&mut self, el: ElementId, name: &str, value: &str);

    fn has_class(&self, el: ElementId, class: &str) -> bool;
    fn add_class(&mut self, el: ElementId, class: &str);
    fn remove_class(&mut self, el: ElementId, class: &str);

    fn style(&self, el: ElementId, prop: &str) -> Option<String>;
    /// An empty value removes the property.
    fn set_style(&mut self, el: ElementId, prop: &str, value: &str);

    fn text(&self, el: ElementId) -> Option<String>;
    fn set_text(&mut self, el: ElementId, text: &str);

    fn rect(&self, el: ElementId) -> Option<Rect>;
    fn set_rect(&mut self, el: ElementId, rect: Rect);
    #[cfg(test)]
    fn scroll_top(&self, el: ElementId) -> f32;
    fn set_scroll_top(&mut self, el: ElementId, top: f32);

    fn create_element(&mut self, tag: &str, parent: ElementId) -> ElementId;
    fn remove_element(&mut self, el: ElementId);

    fn custom_property(&self, name: &str) -> Option<String>;
    fn viewport(&self) -> Viewport;
    fn max_scroll(&self) -> f32;
    fn scroll_to(&mut self, y: f32);

    /// Toggles `class`, or forces it on/off. Returns whether it is now set.
    fn toggle_class(&mut self, el: ElementId, class: &str, force: Option<bool>) -> bool {
        let on = force.unwrap_or(!self.has_class(el, class));
        if on {
            self.add_class(el, class);
        } else {
            self.remove_class(el, class);
        }
        on
    }

    /// True when `el` is `ancestor` or lies below it.
    fn contains(&self, ancestor: ElementId, el: ElementId) -> bool {
        let mut cursor = Some(el);
        while let Some(cur) = cursor {
            if cur == ancestor {
                return true;
            }
            cursor = self.parent(cur);
        }
        false
    }

    fn closest_with_class(&self, el: ElementId, class: &str) -> Option<ElementId> {
        let mut cursor = Some(el);
        while let Some(cur) = cursor {
            if self.has_class(cur, class) {
                return Some(cur);
            }
            cursor = self.parent(cur);
        }
        None
    }

    fn closest_with_attr(&self, el: ElementId, name: &str) -> Option<ElementId> {
        let mut cursor = Some(el);
        while let Some(cur) = cursor {
            if self.attr(cur, name).is_some() {
                return Some(cur);
            }
            cursor = self.parent(cur);
        }
        None
    }

    /// Depth-first descendants of `el` with the given tag.
    fn descendants_with_tag(&self, el: ElementId, tag: &str) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = self.children(el).into_iter().rev().collect();
        while let Some(cur) = stack.pop() {
            if self.tag(cur).as_deref() == Some(tag) {
                out.push(cur);
            }
            stack.extend(self.children(cur).into_iter().rev());
        }
        out
    }
}

#[derive(Clone, Debug, Default)]
struct Node {
    tag: String,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    attrs: BTreeMap<String, String>,
    classes: Vec<String>,
    style: BTreeMap<String, String>,
    text: String,
    rect: Option<Rect>,
    scroll_top: f32,
}

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// In-memory document. Removed elements free their slot for reuse; stale
/// handles stay inert because the slot's generation moves on.
#[derive(Clone, Debug)]
pub struct Page {
    nodes: Vec<Slot>,
    free: Vec<usize>,
    body: ElementId,
    viewport: Viewport,
    properties: BTreeMap<String, String>,
}

impl Page {
    pub fn new(width: f32, height: f32) -> Self {
        let body = Node {
            tag: "body".to_string(),
            ..Node::default()
        };
        Self {
            nodes: vec![Slot {
                generation: 0,
                node: Some(body),
            }],
            free: Vec::new(),
            body: ElementId {
                index: 0,
                generation: 0,
            },
            viewport: Viewport {
                width,
                height,
                scroll_y: 0.0,
            },
            properties: BTreeMap::new(),
        }
    }

    pub fn set_custom_property(&mut self, name: &str, value: &str) {
        self.properties.insert(name.to_string(), value.to_string());
    }

    pub fn set_viewport_size(&mut self, width: f32, height: f32) {
        self.viewport.width = width;
        self.viewport.height = height;
        let max = self.max_scroll();
        self.viewport.scroll_y = self.viewport.scroll_y.min(max);
    }

    /// Starts a new element under `parent`.
    pub fn append(&mut self, parent: ElementId, tag: &str) -> ElementBuilder<'_> {
        let el = self.create_element(tag, parent);
        ElementBuilder { page: self, el }
    }

    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|s| s.node.is_some()).count()
    }

    /// Allocated slots, live or free.
    #[cfg(test)]
    fn slots(&self) -> usize {
        self.nodes.len()
    }

    /// Topmost element under `point`, given in viewport coordinates.
    /// Elements inside a `position: fixed` subtree are laid out in viewport
    /// coordinates, everything else in document coordinates. An element that
    /// `accept` rejects hides its whole subtree.
    pub fn hit_test<F>(&self, point: Vec2, accept: F) -> Option<ElementId>
    where
        F: Fn(&Page, ElementId) -> bool,
    {
        let doc_point = Vec2::new(point.x, point.y + self.viewport.scroll_y);
        let mut best = None;
        let mut stack = vec![(self.body, false)];
        while let Some((cur, inherited_fixed)) = stack.pop() {
            if cur != self.body && !accept(self, cur) {
                continue;
            }
            let fixed =
                inherited_fixed || self.style(cur, "position").as_deref() == Some("fixed");
            if let Some(rect) = self.rect(cur) {
                let at = if fixed { point } else { doc_point };
                if rect.contains(at) {
                    best = Some(cur);
                }
            }
            // Later siblings paint over earlier ones.
            stack.extend(self.children(cur).into_iter().rev().map(|c| (c, fixed)));
        }
        best
    }

    fn node(&self, el: ElementId) -> Option<&Node> {
        self.nodes
            .get(el.index)
            .filter(|s| s.generation == el.generation)
            .and_then(|s| s.node.as_ref())
    }

    fn node_mut(&mut self, el: ElementId) -> Option<&mut Node> {
        self.nodes
            .get_mut(el.index)
            .filter(|s| s.generation == el.generation)
            .and_then(|s| s.node.as_mut())
    }

    fn collect<F>(&self, pred: F) -> Vec<ElementId>
    where
        F: Fn(&Node) -> bool,
    {
        let mut out = Vec::new();
        let mut stack = vec![self.body];
        while let Some(cur) = stack.pop() {
            if let Some(node) = self.node(cur) {
                if pred(node) {
                    out.push(cur);
                }
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }
}

pub struct ElementBuilder<'a> {
    page: &'a mut Page,
    el: ElementId,
}

impl ElementBuilder<'_> {
    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn class(self, class: &str) -> Self {
        self.page.add_class(self.el, class);
        self
    }

    pub fn attr(self, name: &str, value: &str) -> Self {
        self.page.set_attr(self.el, name, value);
        self
    }

    pub fn style(self, prop: &str, value: &str) -> Self {
        self.page.set_style(self.el, prop, value);
        self
    }

    pub fn text(self, text: &str) -> Self {
        self.page.set_text(self.el, text);
        self
    }

    #[cfg(test)]
    pub fn rect(self, rect: Rect) -> Self {
        self.page.set_rect(self.el, rect);
        self
    }

    pub fn build(self) -> ElementId {
        self.el
    }
}

impl Document for Page {
    fn body(&self) -> ElementId {
        self.body
    }

    fn element_by_id(&self, id: &str) -> Option<ElementId> {
        self.collect(|n| n.attrs.get("id").map(String::as_str) == Some(id))
            .into_iter()
            .next()
    }

    fn elements_with_class(&self, class: &str) -> Vec<ElementId> {
        self.collect(|n| n.classes.iter().any(|c| c == class))
    }

    fn elements_with_attr(&self, name: &str) -> Vec<ElementId> {
        self.collect(|n| n.attrs.contains_key(name))
    }

    fn parent(&self, el: ElementId) -> Option<ElementId> {
        self.node(el).and_then(|n| n.parent)
    }

    fn children(&self, el: ElementId) -> Vec<ElementId> {
        self.node(el).map(|n| n.children.clone()).unwrap_or_default()
    }

    fn tag(&self, el: ElementId) -> Option<String> {
        self.node(el).map(|n| n.tag.clone())
    }

    fn is_connected(&self, el: ElementId) -> bool {
        self.node(el).is_some()
    }

    fn attr(&self, el: ElementId, name: &str) -> Option<String> {
        self.node(el).and_then(|n| n.attrs.get(name).cloned())
    }

    fn set_attr(&mut self, el: ElementId, name: &str, value: &str) {
        if let Some(node) = self.node_mut(el) {
            node.attrs.insert(name.to_string(), value.to_string());
        }
    }

    fn has_class(&self, el: ElementId, class: &str) -> bool {
        self.node(el)
            .map(|n| n.classes.iter().any(|c| c == class))
            .unwrap_or(false)
    }

    fn add_class(&mut self, el: ElementId, class: &str) {
        if let Some(node) = self.node_mut(el) {
            if !node.classes.iter().any(|c| c == class) {
                node.classes.push(class.to_string());
            }
        }
    }

    fn remove_class(&mut self, el: ElementId, class: &str) {
        if let Some(node) = self.node_mut(el) {
            node.classes.retain(|c| c != class);
        }
    }

    fn style(&self, el: ElementId, prop: &str) -> Option<String> {
        self.node(el).and_then(|n| n.style.get(prop).cloned())
    }

    fn set_style(&mut self, el: ElementId, prop: &str, value: &str) {
        if let Some(node) = self.node_mut(el) {
            if value.is_empty() {
                node.style.remove(prop);
            } else {
                node.style.insert(prop.to_string(), value.to_string());
            }
        }
    }

    fn text(&self, el: ElementId) -> Option<String> {
        self.node(el).map(|n| n.text.clone())
    }

    fn set_text(&mut self, el: ElementId, text: &str) {
        if let Some(node) = self.node_mut(el) {
            node.text = text.to_string();
        }
    }

    fn rect(&self, el: ElementId) -> Option<Rect> {
        self.node(el).and_then(|n| n.rect)
    }

    fn set_rect(&mut self, el: ElementId, rect: Rect) {
        if let Some(node) = self.node_mut(el) {
            node.rect = Some(rect);
        }
    }

    #[cfg(test)]
    fn scroll_top(&self, el: ElementId) -> f32 {
        self.node(el).map(|n| n.scroll_top).unwrap_or(0.0)
    }

    fn set_scroll_top(&mut self, el: ElementId, top: f32) {
        if let Some(node) = self.node_mut(el) {
            node.scroll_top = top.max(0.0);
        }
    }

    fn create_element(&mut self, tag: &str, parent: ElementId) -> ElementId {
        let parent = if self.is_connected(parent) {
            parent
        } else {
            self.body
        };
        let node = Node {
            tag: tag.to_string(),
            parent: Some(parent),
            ..Node::default()
        };
        let el = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.nodes[index];
                slot.node = Some(node);
                ElementId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.nodes.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                ElementId {
                    index: self.nodes.len() - 1,
                    generation: 0,
                }
            }
        };
        if let Some(node) = self.node_mut(parent) {
            node.children.push(el);
        }
        el
    }

    fn remove_element(&mut self, el: ElementId) {
        if el == self.body || !self.is_connected(el) {
            return;
        }
        if let Some(parent) = self.parent(el) {
            if let Some(node) = self.node_mut(parent) {
                node.children.retain(|c| *c != el);
            }
        }
        let mut stack = vec![el];
        while let Some(cur) = stack.pop() {
            let Some(slot) = self.nodes.get_mut(cur.index) else {
                continue;
            };
            if slot.generation != cur.generation {
                continue;
            }
            if let Some(node) = slot.node.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(cur.index);
                stack.extend(node.children);
            }
        }
    }

    fn custom_property(&self, name: &str) -> Option<String> {
        self.properties.get(name).cloned()
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn max_scroll(&self) -> f32 {
        let bottom = self
            .nodes
            .iter()
            .filter_map(|s| s.node.as_ref())
            .filter(|n| n.style.get("position").map(String::as_str) != Some("fixed"))
            .filter_map(|n| n.rect)
            .map(|r| r.bottom())
            .fold(0.0_f32, f32::max);
        (bottom - self.viewport.height).max(0.0)
    }

    fn scroll_to(&mut self, y: f32) {
        let max = self.max_scroll();
        self.viewport.scroll_y = y.clamp(0.0, max);
    }
}
