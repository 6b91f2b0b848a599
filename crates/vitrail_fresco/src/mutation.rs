//! Mutation log entries recorded by the memory surface.

use vitrail_carton::CompactString;

use crate::surface::{AttrValue, ListenerId, NodeId};

/// A single surface mutation.
///
/// Node creation is not a mutation of the visible tree and is not recorded;
/// everything that changes attached or attachable nodes is.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Node inserted into parent at index
    Insert {
        parent: NodeId,
        node: NodeId,
        index: usize,
    },
    /// Node detached from its parent
    Remove(NodeId),
    /// Text content overwritten
    SetText(NodeId, CompactString),
    SetAttribute(NodeId, CompactString, AttrValue),
    RemoveAttribute(NodeId, CompactString),
    SetClassList(NodeId, Vec<CompactString>),
    AddClass(NodeId, CompactString),
    RemoveClass(NodeId, CompactString),
    SetStyle(NodeId, CompactString, CompactString),
    ClearStyle(NodeId, CompactString),
    AddListener(NodeId, CompactString, ListenerId),
    RemoveListener(NodeId, CompactString, ListenerId),
}

impl Mutation {
    /// Node the mutation applies to.
    pub fn node(&self) -> NodeId {
        match self {
            Mutation::Insert { node, .. } => *node,
            Mutation::Remove(node)
            | Mutation::SetText(node, _)
            | Mutation::SetAttribute(node, _, _)
            | Mutation::RemoveAttribute(node, _)
            | Mutation::SetClassList(node, _)
            | Mutation::AddClass(node, _)
            | Mutation::RemoveClass(node, _)
            | Mutation::SetStyle(node, _, _)
            | Mutation::ClearStyle(node, _)
            | Mutation::AddListener(node, _, _)
            | Mutation::RemoveListener(node, _, _) => *node,
        }
    }

    /// Whether the mutation changes tree structure (insert/remove).
    pub fn is_structural(&self) -> bool {
        matches!(self, Mutation::Insert { .. } | Mutation::Remove(_))
    }
}
