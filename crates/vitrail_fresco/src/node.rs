//! Surface node definitions.

use std::collections::BTreeMap;

use vitrail_carton::{CompactString, SmallVec};

use crate::surface::{AttrValue, Listener, ListenerId, NodeId};

/// A node held by [`MemorySurface`](crate::MemorySurface).
#[derive(Clone)]
pub struct SurfaceNode {
    /// Unique node ID
    pub id: NodeId,
    /// Node type and content
    pub kind: NodeKind,
    /// Parent node, when attached
    pub parent: Option<NodeId>,
    /// Child node IDs
    pub children: SmallVec<[NodeId; 4]>,
    /// Bound listeners, in binding order
    pub listeners: Vec<(CompactString, ListenerId, Listener)>,
}

impl SurfaceNode {
    /// Create a new detached node.
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            parent: None,
            children: SmallVec::new(),
            listeners: Vec::new(),
        }
    }

    /// Create a text node.
    pub fn text_node(id: NodeId, value: impl Into<CompactString>) -> Self {
        Self::new(id, NodeKind::Text(value.into()))
    }

    /// Create an element node.
    pub fn element_node(id: NodeId, tag: impl Into<CompactString>) -> Self {
        Self::new(id, NodeKind::Element(ElementData::new(tag)))
    }

    /// Check if this is a text node.
    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text(_))
    }

    /// Get the element data, if this is an element.
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.kind {
            NodeKind::Element(data) => Some(data),
            NodeKind::Text(_) => None,
        }
    }

    /// Get the element data mutably, if this is an element.
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.kind {
            NodeKind::Element(data) => Some(data),
            NodeKind::Text(_) => None,
        }
    }

    /// Number of listeners bound for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners
            .iter()
            .filter(|(name, _, _)| name == event)
            .count()
    }

    /// Remove a child.
    pub(crate) fn remove_child(&mut self, child_id: NodeId) {
        if let Some(pos) = self.children.iter().position(|&id| id == child_id) {
            self.children.remove(pos);
        }
    }
}

impl std::fmt::Debug for SurfaceNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceNode")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Node type variants.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Text content
    Text(CompactString),
    /// Element with tag, attributes, classes and inline styles
    Element(ElementData),
}

/// Element payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementData {
    pub tag: CompactString,
    pub attrs: BTreeMap<CompactString, AttrValue>,
    /// Class tokens, in insertion order, without duplicates
    pub classes: Vec<CompactString>,
    pub style: BTreeMap<CompactString, CompactString>,
}

impl ElementData {
    pub fn new(tag: impl Into<CompactString>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Add a class token unless already present.
    pub fn add_class(&mut self, token: &str) {
        if !self.classes.iter().any(|c| c == token) {
            self.classes.push(token.into());
        }
    }

    pub fn remove_class(&mut self, token: &str) {
        self.classes.retain(|c| c != token);
    }
}
