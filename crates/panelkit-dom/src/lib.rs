//! # Panelkit DOM
//!
//! The panel-scoped DOM subtree consumed by the Panelkit lifecycle
//! engine. The host's template layer builds this subtree and wires the
//! `data-panel-*` attributes; the engine reads structure and geometry
//! from it and mutates it during ghost content swaps.
//!
//! ## Design Goals
//!
//! 1. **Addressable structure**: overlay, panel content, and content
//!    container resolved once by `data-panel-part`
//! 2. **Mutation support**: node insertion, removal, deep cloning,
//!    attribute and class modification
//! 3. **Geometry access**: each node carries the layout rectangle the
//!    host layout pass last wrote for it

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur in panel DOM operations.
#[derive(Error, Debug)]
pub enum DomError {
    #[error("Missing required panel node: {0}")]
    MissingNode(&'static str),

    #[error("Node {0:?} is not attached to a parent")]
    Detached(NodeId),
}

/// Unique identifier for a panel node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

impl NodeId {
    /// Generate a new unique ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// A 2D layout rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Center point of the rectangle.
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Well-known `data-panel-*` attribute names.
pub mod attrs {
    /// Marks a node's structural role within the panel subtree.
    pub const PART: &str = "data-panel-part";
    /// Marks the live main-content node; stripped from ghost clones so
    /// the host re-render never mistakes a clone for live content.
    pub const LIVE: &str = "data-panel-live";
    /// Written by the rendering layer on the content container:
    /// "true" while the remote process confirms the panel open.
    pub const ACTIVE: &str = "data-panel-active";
    /// Optional selector-like hint naming the element to focus after a
    /// non-optimistic open.
    pub const FOCUS_TARGET: &str = "data-focus-target";
}

/// Values of the [`attrs::PART`] attribute.
pub mod parts {
    pub const OVERLAY: &str = "overlay";
    pub const CONTENT: &str = "content";
    pub const CONTAINER: &str = "container";
    pub const LOADING: &str = "loading";
    pub const INNER: &str = "inner";
}

/// A node in the panel subtree.
///
/// Single-threaded by construction (`Rc`/`RefCell`), matching the
/// cooperative event-loop model of the engine.
#[derive(Debug)]
pub struct PanelNode {
    /// Unique ID for this node.
    id: NodeId,
    /// Tag name, diagnostics only.
    tag: String,
    /// Attributes.
    attributes: RefCell<HashMap<String, String>>,
    /// Class list, kept separate from attributes for cheap visual-class
    /// copying during ghost setup.
    classes: RefCell<Vec<String>>,
    /// Inline style properties, including custom properties.
    styles: RefCell<HashMap<String, String>>,
    /// Layout rectangle last written by the host layout pass.
    layout_rect: Cell<Rect>,
    /// Parent node (weak reference to avoid cycles).
    parent: RefCell<Option<Weak<PanelNode>>>,
    /// Child nodes.
    children: RefCell<Vec<Rc<PanelNode>>>,
}

impl PanelNode {
    /// Create a new detached node.
    pub fn new(tag: &str) -> Rc<Self> {
        Rc::new(Self {
            id: NodeId::new(),
            tag: tag.to_string(),
            attributes: RefCell::new(HashMap::new()),
            classes: RefCell::new(Vec::new()),
            styles: RefCell::new(HashMap::new()),
            layout_rect: Cell::new(Rect::zero()),
            parent: RefCell::new(None),
            children: RefCell::new(Vec::new()),
        })
    }

    /// Get the node ID.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Get the tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    // ==================== Attributes ====================

    /// Get an attribute value.
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.borrow().get(name).cloned()
    }

    /// Set an attribute value.
    pub fn set_attribute(&self, name: &str, value: &str) {
        self.attributes
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
    }

    /// Remove an attribute. Returns the removed value.
    pub fn remove_attribute(&self, name: &str) -> Option<String> {
        self.attributes.borrow_mut().remove(name)
    }

    /// Check attribute presence.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.borrow().contains_key(name)
    }

    // ==================== Classes ====================

    /// Get a snapshot of the class list.
    pub fn class_list(&self) -> Vec<String> {
        self.classes.borrow().clone()
    }

    /// Replace the class list wholesale.
    pub fn set_class_list(&self, classes: Vec<String>) {
        *self.classes.borrow_mut() = classes;
    }

    /// Add a class if not already present.
    pub fn add_class(&self, class: &str) {
        let mut classes = self.classes.borrow_mut();
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
    }

    /// Remove a class.
    pub fn remove_class(&self, class: &str) {
        self.classes.borrow_mut().retain(|c| c != class);
    }

    /// Check class presence.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.borrow().iter().any(|c| c == class)
    }

    // ==================== Inline styles ====================

    /// Get an inline style property.
    pub fn style(&self, property: &str) -> Option<String> {
        self.styles.borrow().get(property).cloned()
    }

    /// Set an inline style property (custom properties included).
    pub fn set_style(&self, property: &str, value: &str) {
        self.styles
            .borrow_mut()
            .insert(property.to_string(), value.to_string());
    }

    /// Remove an inline style property.
    pub fn remove_style(&self, property: &str) -> Option<String> {
        self.styles.borrow_mut().remove(property)
    }

    // ==================== Geometry ====================

    /// Layout rectangle last written by the host layout pass.
    pub fn layout_rect(&self) -> Rect {
        self.layout_rect.get()
    }

    /// Record the node's layout rectangle. Called by the host after
    /// each layout pass; the engine only ever reads it.
    pub fn set_layout_rect(&self, rect: Rect) {
        self.layout_rect.set(rect);
    }

    // ==================== Tree structure ====================

    /// Get the parent node.
    pub fn parent(&self) -> Option<Rc<PanelNode>> {
        self.parent.borrow().as_ref().and_then(|w| w.upgrade())
    }

    /// Get the child nodes.
    pub fn children(&self) -> Vec<Rc<PanelNode>> {
        self.children.borrow().clone()
    }

    /// Append a child node. A child already attached elsewhere is
    /// detached from its old parent first.
    pub fn append_child(self: &Rc<Self>, child: Rc<PanelNode>) {
        child.detach();
        *child.parent.borrow_mut() = Some(Rc::downgrade(self));
        self.children.borrow_mut().push(child);
    }

    /// Detach this node from its parent, if any.
    pub fn detach(self: &Rc<Self>) {
        if let Some(parent) = self.parent() {
            parent
                .children
                .borrow_mut()
                .retain(|c| !Rc::ptr_eq(c, self));
        }
        *self.parent.borrow_mut() = None;
    }

    /// Check whether two handles refer to the same node.
    pub fn is_same(a: &Rc<PanelNode>, b: &Rc<PanelNode>) -> bool {
        Rc::ptr_eq(a, b)
    }

    /// Deep-clone this node and its subtree. Clones receive fresh node
    /// IDs and no parent; attributes, classes, inline styles, and the
    /// layout rectangle are copied.
    pub fn deep_clone(self: &Rc<Self>) -> Rc<PanelNode> {
        let clone = Rc::new(PanelNode {
            id: NodeId::new(),
            tag: self.tag.clone(),
            attributes: RefCell::new(self.attributes.borrow().clone()),
            classes: RefCell::new(self.classes.borrow().clone()),
            styles: RefCell::new(self.styles.borrow().clone()),
            layout_rect: Cell::new(self.layout_rect.get()),
            parent: RefCell::new(None),
            children: RefCell::new(Vec::new()),
        });
        for child in self.children.borrow().iter() {
            clone.append_child(child.deep_clone());
        }
        clone
    }

    /// Depth-first search for the first descendant (self included)
    /// matching the predicate.
    pub fn find(self: &Rc<Self>, pred: &dyn Fn(&PanelNode) -> bool) -> Option<Rc<PanelNode>> {
        if pred(self) {
            return Some(self.clone());
        }
        for child in self.children.borrow().iter() {
            if let Some(found) = child.find(pred) {
                return Some(found);
            }
        }
        None
    }

    /// Find the first descendant carrying `data-panel-part="<part>"`.
    pub fn find_by_part(self: &Rc<Self>, part: &str) -> Option<Rc<PanelNode>> {
        self.find(&|n| n.attribute(attrs::PART).as_deref() == Some(part))
    }
}

/// The resolved structural nodes of one panel instance.
///
/// Overlay and panel content are required; their absence is fatal at
/// initialization. The content container and its loading/inner nodes
/// are optional: without them the ghost and FLIP features no-op.
#[derive(Debug, Clone)]
pub struct PanelNodes {
    /// The panel root (outer wrapper).
    pub root: Rc<PanelNode>,
    /// The click-to-close backdrop.
    pub overlay: Rc<PanelNode>,
    /// The panel content box that slides or fades in.
    pub content: Rc<PanelNode>,
    /// The main-content container the rendering layer fills.
    pub container: Option<Rc<PanelNode>>,
    /// The loading placeholder shown during an optimistic open.
    pub loading: Option<Rc<PanelNode>>,
    /// The inner node holding the server-confirmed content.
    pub inner: Option<Rc<PanelNode>>,
}

impl PanelNodes {
    /// Resolve the structural nodes under a panel root.
    pub fn resolve(root: &Rc<PanelNode>) -> Result<Self, DomError> {
        let overlay = root
            .find_by_part(parts::OVERLAY)
            .ok_or(DomError::MissingNode(parts::OVERLAY))?;
        let content = root
            .find_by_part(parts::CONTENT)
            .ok_or(DomError::MissingNode(parts::CONTENT))?;

        let container = root.find_by_part(parts::CONTAINER);
        if container.is_none() {
            warn!("panel has no content container; ghost and active-flag sampling degrade");
        }
        let loading = root.find_by_part(parts::LOADING);
        let inner = root.find_by_part(parts::INNER);

        debug!(
            overlay = ?overlay.id(),
            content = ?content.id(),
            has_container = container.is_some(),
            has_loading = loading.is_some(),
            has_inner = inner.is_some(),
            "Resolved panel structure"
        );

        Ok(Self {
            root: root.clone(),
            overlay,
            content,
            container,
            loading,
            inner,
        })
    }

    /// The current live main-content node: the child of the container
    /// carrying the live marker.
    pub fn live_content(&self) -> Option<Rc<PanelNode>> {
        let container = self.container.as_ref()?;
        container
            .children()
            .into_iter()
            .find(|c| c.has_attribute(attrs::LIVE))
    }

    /// Sample the remote confirmed-open flag the rendering layer wrote
    /// on the container. Absent container or attribute reads as false.
    pub fn active_flag(&self) -> bool {
        self.container
            .as_ref()
            .and_then(|c| c.attribute(attrs::ACTIVE))
            .map(|v| v == "true")
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel_fixture() -> Rc<PanelNode> {
        let root = PanelNode::new("div");
        let overlay = PanelNode::new("div");
        overlay.set_attribute(attrs::PART, parts::OVERLAY);
        let content = PanelNode::new("div");
        content.set_attribute(attrs::PART, parts::CONTENT);
        let container = PanelNode::new("div");
        container.set_attribute(attrs::PART, parts::CONTAINER);
        let loading = PanelNode::new("div");
        loading.set_attribute(attrs::PART, parts::LOADING);
        let inner = PanelNode::new("div");
        inner.set_attribute(attrs::PART, parts::INNER);

        container.append_child(loading);
        container.append_child(inner);
        content.append_child(container);
        root.append_child(overlay);
        root.append_child(content);
        root
    }

    #[test]
    fn test_node_id_uniqueness() {
        let a = PanelNode::new("div");
        let b = PanelNode::new("div");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_attributes_and_classes() {
        let node = PanelNode::new("div");
        node.set_attribute("data-x", "1");
        assert_eq!(node.attribute("data-x").as_deref(), Some("1"));
        assert_eq!(node.remove_attribute("data-x").as_deref(), Some("1"));
        assert!(!node.has_attribute("data-x"));

        node.add_class("visible");
        node.add_class("visible");
        assert_eq!(node.class_list(), vec!["visible".to_string()]);
        node.remove_class("visible");
        assert!(!node.has_class("visible"));
    }

    #[test]
    fn test_append_detach() {
        let parent = PanelNode::new("div");
        let child = PanelNode::new("span");
        parent.append_child(child.clone());
        assert_eq!(parent.children().len(), 1);
        assert!(PanelNode::is_same(&child.parent().unwrap(), &parent));

        child.detach();
        assert!(parent.children().is_empty());
        assert!(child.parent().is_none());
    }

    #[test]
    fn test_reparent_detaches_first() {
        let a = PanelNode::new("div");
        let b = PanelNode::new("div");
        let child = PanelNode::new("span");
        a.append_child(child.clone());
        b.append_child(child.clone());
        assert!(a.children().is_empty());
        assert_eq!(b.children().len(), 1);
    }

    #[test]
    fn test_deep_clone_is_independent() {
        let node = PanelNode::new("div");
        node.set_attribute("data-k", "v");
        node.add_class("fade");
        let child = PanelNode::new("span");
        node.append_child(child);

        let clone = node.deep_clone();
        assert_ne!(clone.id(), node.id());
        assert!(!PanelNode::is_same(&clone, &node));
        assert_eq!(clone.attribute("data-k").as_deref(), Some("v"));
        assert!(clone.has_class("fade"));
        assert_eq!(clone.children().len(), 1);
        assert_ne!(clone.children()[0].id(), node.children()[0].id());

        // Mutating the clone leaves the original untouched.
        clone.set_attribute("data-k", "other");
        assert_eq!(node.attribute("data-k").as_deref(), Some("v"));
    }

    #[test]
    fn test_resolve_panel_structure() {
        let root = panel_fixture();
        let nodes = PanelNodes::resolve(&root).unwrap();
        assert!(nodes.container.is_some());
        assert!(nodes.loading.is_some());
        assert!(nodes.inner.is_some());
    }

    #[test]
    fn test_resolve_missing_overlay_is_fatal() {
        let root = PanelNode::new("div");
        let content = PanelNode::new("div");
        content.set_attribute(attrs::PART, parts::CONTENT);
        root.append_child(content);

        assert!(matches!(
            PanelNodes::resolve(&root),
            Err(DomError::MissingNode(parts::OVERLAY))
        ));
    }

    #[test]
    fn test_resolve_missing_container_degrades() {
        let root = PanelNode::new("div");
        let overlay = PanelNode::new("div");
        overlay.set_attribute(attrs::PART, parts::OVERLAY);
        let content = PanelNode::new("div");
        content.set_attribute(attrs::PART, parts::CONTENT);
        root.append_child(overlay);
        root.append_child(content);

        let nodes = PanelNodes::resolve(&root).unwrap();
        assert!(nodes.container.is_none());
        assert!(!nodes.active_flag());
        assert!(nodes.live_content().is_none());
    }

    #[test]
    fn test_live_content_and_active_flag() {
        let root = panel_fixture();
        let nodes = PanelNodes::resolve(&root).unwrap();
        assert!(nodes.live_content().is_none());

        let container = nodes.container.clone().unwrap();
        let live = PanelNode::new("div");
        live.set_attribute(attrs::LIVE, "");
        container.append_child(live.clone());
        assert!(PanelNode::is_same(&nodes.live_content().unwrap(), &live));

        assert!(!nodes.active_flag());
        container.set_attribute(attrs::ACTIVE, "true");
        assert!(nodes.active_flag());
        container.set_attribute(attrs::ACTIVE, "false");
        assert!(!nodes.active_flag());
    }

    #[test]
    fn test_layout_rect_roundtrip() {
        let node = PanelNode::new("div");
        assert_eq!(node.layout_rect(), Rect::zero());
        node.set_layout_rect(Rect::new(10.0, 20.0, 300.0, 150.0));
        let r = node.layout_rect();
        assert_eq!(r.right(), 310.0);
        assert_eq!(r.bottom(), 170.0);
        assert_eq!(r.center(), (160.0, 95.0));
    }
}
