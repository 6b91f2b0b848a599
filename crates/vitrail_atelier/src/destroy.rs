//! Destroy engine: tear a materialized tree down.

use vitrail_fresco::SurfaceRef;

use crate::errors::{Result, RuntimeError};
use crate::events::remove_event_listeners;
use crate::h::VNode;

/// Remove `vnode`'s surface nodes, release its listeners and unmount its
/// components, clearing every back-reference.
///
/// Removed nodes are released from the surface once nothing refers to them.
pub fn destroy_dom(vnode: &mut VNode, surface: &SurfaceRef) -> Result<()> {
    tracing::trace!(kind = vnode.kind_name(), "destroy_dom");

    match vnode {
        VNode::Text(node) => {
            let el = node.el.take().ok_or(RuntimeError::NotMaterialized)?;
            surface.remove_node(el)?;
            surface.release_node(el)?;
        }
        VNode::Element(node) => {
            let el = node.el.take().ok_or(RuntimeError::NotMaterialized)?;
            surface.remove_node(el)?;
            for child in &mut node.children {
                destroy_dom(child, surface)?;
            }
            if let Some(listeners) = node.listeners.take() {
                remove_event_listeners(&**surface, el, &listeners)?;
            }
            surface.release_node(el)?;
        }
        VNode::Fragment(node) => {
            for child in &mut node.children {
                destroy_dom(child, surface)?;
            }
            node.el = None;
        }
        VNode::Component(node) => {
            let instance = node.instance.take().ok_or(RuntimeError::NotMaterialized)?;
            instance.unmount()?;
            node.el = None;
        }
    }
    Ok(())
}
