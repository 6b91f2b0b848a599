//! Node identity for reconciliation.

use std::rc::Rc;

use crate::h::VNode;

/// Whether two descriptions are the same node, i.e. candidates for an in-place
/// patch rather than a replace.
///
/// Nodes of different variants are never equal. Elements also need the same
/// tag, components the same definition.
pub fn nodes_equal(a: &VNode, b: &VNode) -> bool {
    match (a, b) {
        (VNode::Text(_), VNode::Text(_)) => true,
        (VNode::Fragment(_), VNode::Fragment(_)) => true,
        (VNode::Element(a), VNode::Element(b)) => a.tag == b.tag,
        (VNode::Component(a), VNode::Component(b)) => Rc::ptr_eq(&a.definition, &b.definition),
        _ => false,
    }
}
