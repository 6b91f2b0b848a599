//! Mount engine: materialize descriptions onto a surface.

use vitrail_fresco::{NodeId, Surface, SurfaceRef};

use crate::attributes::set_attributes;
use crate::component::ComponentRef;
use crate::errors::Result;
use crate::events::add_event_listeners;
use crate::h::{ComponentVNode, ElementVNode, FragmentVNode, TextVNode, VNode};

/// Mount `vnode` into `parent`.
///
/// `index` of `None` appends; an index past the last child also appends;
/// otherwise the node is inserted before the child currently at `index`.
/// `host` is the component owning the subtree, passed on to its event
/// handlers.
///
/// Returns the number of surface nodes attached directly under `parent`.
pub fn mount_dom(
    vnode: &mut VNode,
    surface: &SurfaceRef,
    parent: NodeId,
    index: Option<usize>,
    host: Option<&ComponentRef>,
) -> Result<usize> {
    tracing::trace!(kind = vnode.kind_name(), parent, ?index, "mount_dom");

    match vnode {
        VNode::Text(node) => create_text_node(node, surface, parent, index),
        VNode::Element(node) => create_element_node(node, surface, parent, index, host),
        VNode::Fragment(node) => create_fragment_nodes(node, surface, parent, index, host),
        VNode::Component(node) => create_component_node(node, surface, parent, index),
    }
}

fn create_text_node(
    node: &mut TextVNode,
    surface: &SurfaceRef,
    parent: NodeId,
    index: Option<usize>,
) -> Result<usize> {
    let el = surface.create_text_node(&node.value);
    node.el = Some(el);
    insert(&**surface, el, parent, index)?;
    Ok(1)
}

fn create_element_node(
    node: &mut ElementVNode,
    surface: &SurfaceRef,
    parent: NodeId,
    index: Option<usize>,
    host: Option<&ComponentRef>,
) -> Result<usize> {
    let el = surface.create_element(&node.tag);
    node.listeners = Some(add_event_listeners(&**surface, el, &node.props.on, host)?);
    set_attributes(&**surface, el, &node.props)?;
    node.el = Some(el);

    for child in &mut node.children {
        mount_dom(child, surface, el, None, host)?;
    }
    insert(&**surface, el, parent, index)?;
    Ok(1)
}

fn create_fragment_nodes(
    node: &mut FragmentVNode,
    surface: &SurfaceRef,
    parent: NodeId,
    index: Option<usize>,
    host: Option<&ComponentRef>,
) -> Result<usize> {
    node.el = Some(parent);

    let mut mounted = 0;
    for child in &mut node.children {
        let child_index = index.map(|index| index + mounted);
        mounted += mount_dom(child, surface, parent, child_index, host)?;
    }
    Ok(mounted)
}

fn create_component_node(
    node: &mut ComponentVNode,
    surface: &SurfaceRef,
    parent: NodeId,
    index: Option<usize>,
) -> Result<usize> {
    let instance = ComponentRef::new(node.definition.clone(), node.props.clone(), surface.clone());
    instance.mount(parent, index)?;

    node.el = instance.first_element();
    let mounted = instance.elements().len();
    node.instance = Some(instance);
    Ok(mounted)
}

fn insert(surface: &dyn Surface, el: NodeId, parent: NodeId, index: Option<usize>) -> Result<()> {
    let Some(index) = index else {
        return Ok(surface.append_child(parent, el)?);
    };

    let children = surface.child_nodes(parent)?;
    match children.get(index) {
        Some(&reference) => surface.insert_before(parent, el, Some(reference))?,
        None => surface.append_child(parent, el)?,
    }
    Ok(())
}
