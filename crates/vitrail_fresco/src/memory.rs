//! In-memory surface.

use std::cell::RefCell;
use std::fmt::Write as _;

use serde_json::Value;
use vitrail_carton::{CompactString, FxHashMap};

use crate::event::Event;
use crate::mutation::Mutation;
use crate::node::{ElementData, NodeKind, SurfaceNode};
use crate::surface::{AttrValue, Listener, ListenerId, NodeId, Surface, SurfaceError};

/// A surface that keeps its tree in memory and records every mutation.
///
/// Removed nodes stay in the arena, detached, until they are released with
/// [`Surface::release_node`]; the destroy engine releases everything it tears
/// down.
#[derive(Default)]
pub struct MemorySurface {
    arena: RefCell<Arena>,
}

#[derive(Default)]
struct Arena {
    /// All nodes by ID
    nodes: FxHashMap<NodeId, SurfaceNode>,
    /// Next available node ID
    next_id: NodeId,
    /// Next available listener ID
    next_listener: ListenerId,
    /// Mutations since the log was last taken
    mutations: Vec<Mutation>,
}

impl Arena {
    fn alloc(&mut self, make: impl FnOnce(NodeId) -> SurfaceNode) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(id, make(id));
        id
    }

    fn node(&self, id: NodeId) -> Result<&SurfaceNode, SurfaceError> {
        self.nodes.get(&id).ok_or(SurfaceError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut SurfaceNode, SurfaceError> {
        self.nodes.get_mut(&id).ok_or(SurfaceError::UnknownNode(id))
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData, SurfaceError> {
        self.node_mut(id)?
            .as_element_mut()
            .ok_or(SurfaceError::NotAnElement(id))
    }

    /// Detach `id` from its parent, returning whether it was attached.
    fn detach(&mut self, id: NodeId) -> Result<bool, SurfaceError> {
        let Some(parent_id) = self.node(id)?.parent else {
            return Ok(false);
        };
        self.node_mut(parent_id)?.remove_child(id);
        self.node_mut(id)?.parent = None;
        Ok(true)
    }

    /// Take `id` and its descendants out of the arena.
    fn release(&mut self, id: NodeId) -> Vec<SurfaceNode> {
        let mut released = Vec::new();
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            if let Some(node) = self.nodes.remove(&id) {
                pending.extend(node.children.iter().copied());
                released.push(node);
            }
        }
        released
    }

    fn write_html(&self, id: NodeId, out: &mut String) -> Result<(), SurfaceError> {
        let node = self.node(id)?;
        match &node.kind {
            NodeKind::Text(value) => out.push_str(value),
            NodeKind::Element(data) => {
                out.push('<');
                out.push_str(&data.tag);
                if !data.classes.is_empty() {
                    let _ = write!(out, " class=\"{}\"", data.classes.join(" "));
                }
                for (name, value) in &data.attrs {
                    match value {
                        AttrValue::Bool(true) => {
                            let _ = write!(out, " {}", name);
                        }
                        AttrValue::Bool(false) => {}
                        _ => {
                            let _ = write!(out, " {}=\"{}\"", name, value);
                        }
                    }
                }
                if !data.style.is_empty() {
                    let style: Vec<String> = data
                        .style
                        .iter()
                        .map(|(name, value)| format!("{}: {}", name, value))
                        .collect();
                    let _ = write!(out, " style=\"{}\"", style.join("; "));
                }
                out.push('>');
                for &child in &node.children {
                    self.write_html(child, out)?;
                }
                let _ = write!(out, "</{}>", data.tag);
            }
        }
        Ok(())
    }

    fn write_text(&self, id: NodeId, out: &mut String) -> Result<(), SurfaceError> {
        let node = self.node(id)?;
        if let NodeKind::Text(value) = &node.kind {
            out.push_str(value);
        }
        for &child in &node.children {
            self.write_text(child, out)?;
        }
        Ok(())
    }
}

impl MemorySurface {
    /// Create an empty surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached element to host a tree.
    pub fn create_root(&self) -> NodeId {
        self.create_element("div")
    }

    /// Snapshot of a node.
    pub fn node(&self, id: NodeId) -> Option<SurfaceNode> {
        self.arena.borrow().nodes.get(&id).cloned()
    }

    /// Parent of a node, if attached.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.arena.borrow().nodes.get(&id).and_then(|n| n.parent)
    }

    /// Number of nodes held by the arena, attached or not.
    pub fn node_count(&self) -> usize {
        self.arena.borrow().nodes.len()
    }

    /// Number of listeners bound on `id` for `event`.
    pub fn listener_count(&self, id: NodeId, event: &str) -> usize {
        self.arena
            .borrow()
            .nodes
            .get(&id)
            .map_or(0, |n| n.listener_count(event))
    }

    /// Total number of listeners bound anywhere on the surface.
    pub fn total_listener_count(&self) -> usize {
        self.arena
            .borrow()
            .nodes
            .values()
            .map(|n| n.listeners.len())
            .sum()
    }

    /// Raise an event on `target`, invoking its listeners in binding order.
    ///
    /// Returns the number of listeners invoked. The listener list is
    /// snapshotted first, so listeners are free to mutate the surface.
    pub fn dispatch_event(
        &self,
        target: NodeId,
        name: &str,
        detail: Value,
    ) -> Result<usize, SurfaceError> {
        let listeners: Vec<Listener> = {
            let arena = self.arena.borrow();
            arena
                .node(target)?
                .listeners
                .iter()
                .filter(|(event, _, _)| event == name)
                .map(|(_, _, listener)| listener.clone())
                .collect()
        };

        tracing::trace!(node = target, event = name, count = listeners.len(), "dispatch_event");

        let event = Event::new(name, target).with_detail(detail);
        for listener in &listeners {
            listener(&event);
        }
        Ok(listeners.len())
    }

    /// Serialize a node and its subtree as HTML-like markup.
    pub fn to_html(&self, id: NodeId) -> Result<String, SurfaceError> {
        let mut out = String::new();
        self.arena.borrow().write_html(id, &mut out)?;
        Ok(out)
    }

    /// Serialize only the children of a node.
    pub fn inner_html(&self, id: NodeId) -> Result<String, SurfaceError> {
        let arena = self.arena.borrow();
        let mut out = String::new();
        for &child in &arena.node(id)?.children {
            arena.write_html(child, &mut out)?;
        }
        Ok(out)
    }

    /// Concatenated text of a subtree.
    pub fn text_content(&self, id: NodeId) -> Result<String, SurfaceError> {
        let mut out = String::new();
        self.arena.borrow().write_text(id, &mut out)?;
        Ok(out)
    }

    /// Mutations recorded so far.
    pub fn mutations(&self) -> Vec<Mutation> {
        self.arena.borrow().mutations.clone()
    }

    /// Take and clear the mutation log.
    pub fn take_mutations(&self) -> Vec<Mutation> {
        std::mem::take(&mut self.arena.borrow_mut().mutations)
    }
}

impl Surface for MemorySurface {
    fn create_text_node(&self, value: &str) -> NodeId {
        self.arena
            .borrow_mut()
            .alloc(|id| SurfaceNode::text_node(id, value))
    }

    fn create_element(&self, tag: &str) -> NodeId {
        self.arena
            .borrow_mut()
            .alloc(|id| SurfaceNode::element_node(id, tag))
    }

    fn set_text(&self, node: NodeId, value: &str) -> Result<(), SurfaceError> {
        let mut arena = self.arena.borrow_mut();
        match &mut arena.node_mut(node)?.kind {
            NodeKind::Text(text) => *text = value.into(),
            NodeKind::Element(_) => return Err(SurfaceError::NotAContainer(node)),
        }
        arena.mutations.push(Mutation::SetText(node, value.into()));
        Ok(())
    }

    fn remove_node(&self, node: NodeId) -> Result<(), SurfaceError> {
        let mut arena = self.arena.borrow_mut();
        if arena.detach(node)? {
            arena.mutations.push(Mutation::Remove(node));
        }
        Ok(())
    }

    fn release_node(&self, node: NodeId) -> Result<(), SurfaceError> {
        // Listeners are dropped after the arena borrow ends.
        let released = {
            let mut arena = self.arena.borrow_mut();
            if arena.node(node)?.parent.is_some() {
                return Ok(());
            }
            arena.release(node)
        };
        tracing::trace!(node, count = released.len(), "release_node");
        drop(released);
        Ok(())
    }

    fn insert_before(
        &self,
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), SurfaceError> {
        let mut arena = self.arena.borrow_mut();
        if arena.node(parent)?.is_text() {
            return Err(SurfaceError::NotAContainer(parent));
        }
        arena.node(node)?;
        if reference == Some(node) {
            return Ok(());
        }
        if let Some(reference) = reference {
            if arena.node(reference)?.parent != Some(parent) {
                return Err(SurfaceError::NotAChild {
                    parent,
                    node: reference,
                });
            }
        }

        arena.detach(node)?;

        let parent_node = arena.node_mut(parent)?;
        let index = reference
            .and_then(|r| parent_node.children.iter().position(|&c| c == r))
            .unwrap_or(parent_node.children.len());
        parent_node.children.insert(index, node);
        arena.node_mut(node)?.parent = Some(parent);
        arena.mutations.push(Mutation::Insert {
            parent,
            node,
            index,
        });
        Ok(())
    }

    fn set_attribute(
        &self,
        el: NodeId,
        name: &str,
        value: &AttrValue,
    ) -> Result<(), SurfaceError> {
        let mut arena = self.arena.borrow_mut();
        arena.element_mut(el)?.attrs.insert(name.into(), value.clone());
        arena
            .mutations
            .push(Mutation::SetAttribute(el, name.into(), value.clone()));
        Ok(())
    }

    fn remove_attribute(&self, el: NodeId, name: &str) -> Result<(), SurfaceError> {
        let mut arena = self.arena.borrow_mut();
        arena.element_mut(el)?.attrs.remove(name);
        arena.mutations.push(Mutation::RemoveAttribute(el, name.into()));
        Ok(())
    }

    fn set_class_list(&self, el: NodeId, tokens: &[CompactString]) -> Result<(), SurfaceError> {
        let mut arena = self.arena.borrow_mut();
        let data = arena.element_mut(el)?;
        data.classes.clear();
        for token in tokens {
            data.add_class(token);
        }
        arena
            .mutations
            .push(Mutation::SetClassList(el, tokens.to_vec()));
        Ok(())
    }

    fn add_class(&self, el: NodeId, token: &str) -> Result<(), SurfaceError> {
        let mut arena = self.arena.borrow_mut();
        arena.element_mut(el)?.add_class(token);
        arena.mutations.push(Mutation::AddClass(el, token.into()));
        Ok(())
    }

    fn remove_class(&self, el: NodeId, token: &str) -> Result<(), SurfaceError> {
        let mut arena = self.arena.borrow_mut();
        arena.element_mut(el)?.remove_class(token);
        arena.mutations.push(Mutation::RemoveClass(el, token.into()));
        Ok(())
    }

    fn set_style_property(&self, el: NodeId, name: &str, value: &str) -> Result<(), SurfaceError> {
        let mut arena = self.arena.borrow_mut();
        arena
            .element_mut(el)?
            .style
            .insert(name.into(), value.into());
        arena
            .mutations
            .push(Mutation::SetStyle(el, name.into(), value.into()));
        Ok(())
    }

    fn clear_style_property(&self, el: NodeId, name: &str) -> Result<(), SurfaceError> {
        let mut arena = self.arena.borrow_mut();
        arena.element_mut(el)?.style.remove(name);
        arena.mutations.push(Mutation::ClearStyle(el, name.into()));
        Ok(())
    }

    fn add_event_listener(
        &self,
        el: NodeId,
        event: &str,
        listener: Listener,
    ) -> Result<ListenerId, SurfaceError> {
        let mut arena = self.arena.borrow_mut();
        let id = arena.next_listener;
        arena
            .node_mut(el)?
            .listeners
            .push((event.into(), id, listener));
        arena.next_listener += 1;
        arena
            .mutations
            .push(Mutation::AddListener(el, event.into(), id));
        Ok(id)
    }

    fn remove_event_listener(
        &self,
        el: NodeId,
        event: &str,
        listener: ListenerId,
    ) -> Result<(), SurfaceError> {
        let mut arena = self.arena.borrow_mut();
        let node = arena.node_mut(el)?;
        let Some(pos) = node
            .listeners
            .iter()
            .position(|(name, id, _)| *id == listener && name == event)
        else {
            return Err(SurfaceError::UnknownListener {
                node: el,
                event: event.into(),
                listener,
            });
        };
        node.listeners.remove(pos);
        arena
            .mutations
            .push(Mutation::RemoveListener(el, event.into(), listener));
        Ok(())
    }

    fn child_nodes(&self, parent: NodeId) -> Result<Vec<NodeId>, SurfaceError> {
        Ok(self.arena.borrow().node(parent)?.children.to_vec())
    }
}
