//! The surface contract consumed by the reconciler.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vitrail_carton::CompactString;

use crate::event::Event;

/// Unique identifier for surface nodes.
pub type NodeId = u64;

/// Handle returned when a listener is bound, used to unbind it again.
pub type ListenerId = u64;

/// A raw listener as seen by the surface.
pub type Listener = Rc<dyn Fn(&Event)>;

/// Shared handle to a surface.
pub type SurfaceRef = Rc<dyn Surface>;

/// Errors raised by surface operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("Unknown surface node: {0}")]
    UnknownNode(NodeId),

    #[error("Surface node {0} is not an element")]
    NotAnElement(NodeId),

    #[error("Surface node {0} is a text node and cannot have children")]
    NotAContainer(NodeId),

    #[error("Surface node {node} is not a child of {parent}")]
    NotAChild { parent: NodeId, node: NodeId },

    #[error("No listener {listener} for '{event}' on node {node}")]
    UnknownListener {
        node: NodeId,
        event: CompactString,
        listener: ListenerId,
    },
}

/// Value of a plain (non-reserved) attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Number(f64),
    String(CompactString),
}

impl AttrValue {
    /// Get as string slice if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Get as bool if this is a boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(b) => write!(f, "{}", b),
            AttrValue::Number(n) => write!(f, "{}", n),
            AttrValue::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::String(value.into())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::String(value.into())
    }
}

impl From<CompactString> for AttrValue {
    fn from(value: CompactString) -> Self {
        AttrValue::String(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Number(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        AttrValue::Number(value as f64)
    }
}

/// Presentation-tree primitives.
///
/// Implementations use interior mutability: every method takes `&self`, so a
/// listener fired by the surface may call back into it (an event handler that
/// triggers a re-render is the common case). Implementations must not hold a
/// borrow of their own state while invoking a listener.
pub trait Surface {
    /// Create a detached text node.
    fn create_text_node(&self, value: &str) -> NodeId;

    /// Create a detached element.
    fn create_element(&self, tag: &str) -> NodeId;

    /// Overwrite the content of a text node.
    fn set_text(&self, node: NodeId, value: &str) -> Result<(), SurfaceError>;

    /// Detach a node from its parent. Detaching a detached node is a no-op.
    fn remove_node(&self, node: NodeId) -> Result<(), SurfaceError>;

    /// Drop a detached node and its subtree; their ids are dead afterwards.
    /// Releasing an attached node is a no-op.
    fn release_node(&self, node: NodeId) -> Result<(), SurfaceError> {
        let _ = node;
        Ok(())
    }

    /// Insert `node` into `parent` before `reference`, or append when
    /// `reference` is `None`. An attached node is moved.
    fn insert_before(
        &self,
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), SurfaceError>;

    /// Append `node` as the last child of `parent`. An attached node is moved.
    fn append_child(&self, parent: NodeId, node: NodeId) -> Result<(), SurfaceError> {
        self.insert_before(parent, node, None)
    }

    fn set_attribute(&self, el: NodeId, name: &str, value: &AttrValue)
        -> Result<(), SurfaceError>;

    fn remove_attribute(&self, el: NodeId, name: &str) -> Result<(), SurfaceError>;

    /// Replace the element's class list.
    fn set_class_list(&self, el: NodeId, tokens: &[CompactString]) -> Result<(), SurfaceError>;

    fn add_class(&self, el: NodeId, token: &str) -> Result<(), SurfaceError>;

    fn remove_class(&self, el: NodeId, token: &str) -> Result<(), SurfaceError>;

    fn set_style_property(&self, el: NodeId, name: &str, value: &str)
        -> Result<(), SurfaceError>;

    fn clear_style_property(&self, el: NodeId, name: &str) -> Result<(), SurfaceError>;

    /// Bind a listener, returning the handle needed to unbind it.
    fn add_event_listener(
        &self,
        el: NodeId,
        event: &str,
        listener: Listener,
    ) -> Result<ListenerId, SurfaceError>;

    fn remove_event_listener(
        &self,
        el: NodeId,
        event: &str,
        listener: ListenerId,
    ) -> Result<(), SurfaceError>;

    /// Children of `parent`, in order.
    fn child_nodes(&self, parent: NodeId) -> Result<Vec<NodeId>, SurfaceError>;

    /// Position of `node` among the children of `parent`.
    fn index_of_child(&self, parent: NodeId, node: NodeId) -> Result<Option<usize>, SurfaceError> {
        Ok(self
            .child_nodes(parent)?
            .iter()
            .position(|&child| child == node))
    }
}
