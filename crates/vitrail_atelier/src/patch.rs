//! Patch engine: reconcile a mounted tree against a new description.
//!
//! The old tree is consumed and the new one is filled in place with the
//! back-references it inherits, so after a patch only the new tree is live.

use std::collections::BTreeMap;

use serde_json::Value;
use vitrail_carton::{CompactString, FxHashMap};
use vitrail_fresco::{AttrValue, ListenerId, NodeId, Surface, SurfaceRef};

use crate::arrays::{arrays_diff, arrays_diff_sequence, ArrayDiffOp};
use crate::attributes::{remove_attribute, remove_style, set_attribute, set_style};
use crate::component::ComponentRef;
use crate::destroy::destroy_dom;
use crate::errors::{Result, RuntimeError};
use crate::events::{add_event_listener, EventHandler};
use crate::h::{
    extract_children_mut, into_flat_children, ComponentVNode, ElementVNode, FragmentVNode,
    TextVNode, VNode,
};
use crate::mount::mount_dom;
use crate::nodes_equal::nodes_equal;
use crate::objects::objects_diff;

/// Reconcile `old` (mounted under `parent`) against `new` and return the new
/// tree, now mounted.
///
/// Nodes that are not [`nodes_equal`] are replaced: the old subtree is
/// destroyed and the new one mounted at the position the old one occupied.
pub fn patch_dom(
    old: VNode,
    mut new: VNode,
    surface: &SurfaceRef,
    parent: NodeId,
    host: Option<&ComponentRef>,
) -> Result<VNode> {
    patch_vnode(old, &mut new, surface, parent, host)?;
    Ok(new)
}

fn patch_vnode(
    old: VNode,
    new: &mut VNode,
    surface: &SurfaceRef,
    parent: NodeId,
    host: Option<&ComponentRef>,
) -> Result<()> {
    if !nodes_equal(&old, new) {
        return replace_node(old, new, surface, parent, host);
    }

    match (old, new) {
        (VNode::Text(old), VNode::Text(new)) => patch_text(old, new, &**surface),
        (VNode::Element(old), VNode::Element(new)) => patch_element(old, new, surface, host),
        (VNode::Fragment(old), VNode::Fragment(new)) => patch_fragment(old, new, surface, host),
        (VNode::Component(old), VNode::Component(new)) => patch_component(old, new),
        (old, new) => replace_node(old, new, surface, parent, host),
    }
}

fn replace_node(
    mut old: VNode,
    new: &mut VNode,
    surface: &SurfaceRef,
    parent: NodeId,
    host: Option<&ComponentRef>,
) -> Result<()> {
    let index = match old.el() {
        Some(el) => surface.index_of_child(parent, el)?,
        None => None,
    };
    tracing::debug!(
        old = old.kind_name(),
        new = new.kind_name(),
        parent,
        ?index,
        "replace node"
    );

    destroy_dom(&mut old, surface)?;
    mount_dom(new, surface, parent, index, host)?;
    Ok(())
}

fn patch_text(old: TextVNode, new: &mut TextVNode, surface: &dyn Surface) -> Result<()> {
    let el = old.el.ok_or(RuntimeError::NotMaterialized)?;
    new.el = Some(el);

    if old.value != new.value {
        surface.set_text(el, &new.value)?;
    }
    Ok(())
}

fn patch_element(
    old: ElementVNode,
    new: &mut ElementVNode,
    surface: &SurfaceRef,
    host: Option<&ComponentRef>,
) -> Result<()> {
    let el = old.el.ok_or(RuntimeError::NotMaterialized)?;
    new.el = Some(el);

    patch_attrs(&**surface, el, &old.props.attrs, &new.props.attrs)?;
    patch_classes(
        &**surface,
        el,
        &old.props.class_tokens(),
        &new.props.class_tokens(),
    )?;
    patch_styles(&**surface, el, &old.props.style, &new.props.style)?;
    new.listeners = Some(patch_events(
        &**surface,
        el,
        old.listeners.unwrap_or_default(),
        &old.props.on,
        &new.props.on,
        host,
    )?);

    patch_children(old.children, &mut new.children, surface, el, host, 0)
}

fn patch_fragment(
    old: FragmentVNode,
    new: &mut FragmentVNode,
    surface: &SurfaceRef,
    host: Option<&ComponentRef>,
) -> Result<()> {
    let el = old.el.ok_or(RuntimeError::NotMaterialized)?;
    new.el = Some(el);

    // A fragment rendered by a component starts at the component's first
    // element, which may sit after unrelated siblings.
    let offset = match host {
        Some(host) => host.offset()?,
        None => 0,
    };
    patch_children(old.children, &mut new.children, surface, el, host, offset)
}

fn patch_component(old: ComponentVNode, new: &mut ComponentVNode) -> Result<()> {
    let instance = old.instance.ok_or(RuntimeError::NotMaterialized)?;
    instance.update_props(Value::Object(new.props.clone()))?;

    new.el = instance.first_element();
    new.instance = Some(instance);
    Ok(())
}

fn patch_attrs(
    surface: &dyn Surface,
    el: NodeId,
    old: &BTreeMap<CompactString, AttrValue>,
    new: &BTreeMap<CompactString, AttrValue>,
) -> Result<()> {
    let diff = objects_diff(old, new);
    for name in &diff.removed {
        remove_attribute(surface, el, name)?;
    }
    for name in diff.added.iter().chain(&diff.updated) {
        if let Some(value) = new.get(name) {
            set_attribute(surface, el, name, value)?;
        }
    }
    Ok(())
}

fn patch_classes(
    surface: &dyn Surface,
    el: NodeId,
    old: &[CompactString],
    new: &[CompactString],
) -> Result<()> {
    let diff = arrays_diff(old, new);
    for token in &diff.removed {
        surface.remove_class(el, token)?;
    }
    for token in &diff.added {
        surface.add_class(el, token)?;
    }
    Ok(())
}

fn patch_styles(
    surface: &dyn Surface,
    el: NodeId,
    old: &BTreeMap<CompactString, CompactString>,
    new: &BTreeMap<CompactString, CompactString>,
) -> Result<()> {
    let diff = objects_diff(old, new);
    for name in &diff.removed {
        remove_style(surface, el, name)?;
    }
    for name in diff.added.iter().chain(&diff.updated) {
        if let Some(value) = new.get(name) {
            set_style(surface, el, name, value)?;
        }
    }
    Ok(())
}

/// Rebind handlers that changed and return the full listener map of the
/// element, unchanged listeners included.
fn patch_events(
    surface: &dyn Surface,
    el: NodeId,
    mut listeners: FxHashMap<CompactString, ListenerId>,
    old: &BTreeMap<CompactString, EventHandler>,
    new: &BTreeMap<CompactString, EventHandler>,
    host: Option<&ComponentRef>,
) -> Result<FxHashMap<CompactString, ListenerId>> {
    let diff = objects_diff(old, new);
    for name in diff.removed.iter().chain(&diff.updated) {
        if let Some(id) = listeners.remove(name) {
            surface.remove_event_listener(el, name, id)?;
        }
    }
    for name in diff.added.iter().chain(&diff.updated) {
        if let Some(handler) = new.get(name) {
            let id = add_event_listener(surface, el, name, handler, host)?;
            listeners.insert(name.clone(), id);
        }
    }
    Ok(listeners)
}

/// Reconcile the flattened children of an element or fragment.
///
/// `offset` is the surface index of the first child under `parent`; it is
/// added to every index the differ produces.
fn patch_children(
    old_children: Vec<VNode>,
    new_children: &mut [VNode],
    surface: &SurfaceRef,
    parent: NodeId,
    host: Option<&ComponentRef>,
    offset: usize,
) -> Result<()> {
    anchor_fragments(new_children, parent);

    let old_children = into_flat_children(old_children);
    let mut new_children = extract_children_mut(new_children);

    let operations: Vec<ArrayDiffOp<()>> = {
        let old_refs: Vec<&VNode> = old_children.iter().collect();
        let new_refs: Vec<&VNode> = new_children.iter().map(|child| &**child).collect();
        arrays_diff_sequence(&old_refs, &new_refs, |a, b| nodes_equal(a, b))
            .into_iter()
            .map(|op| op.map(|_| ()))
            .collect()
    };
    let mut old_children: Vec<Option<VNode>> = old_children.into_iter().map(Some).collect();

    for operation in operations {
        match operation {
            ArrayDiffOp::Add { index, .. } => {
                let child = new_child(&mut new_children, index)?;
                mount_dom(child, surface, parent, Some(index + offset), host)?;
            }
            ArrayDiffOp::Remove { original_index, .. } => {
                let mut child = take_old_child(&mut old_children, original_index)?;
                destroy_dom(&mut child, surface)?;
            }
            ArrayDiffOp::Move {
                original_index,
                index,
                ..
            } => {
                let child = take_old_child(&mut old_children, original_index)?;
                if let Some(el) = child.el() {
                    let reference = surface.child_nodes(parent)?.get(index + offset).copied();
                    surface.insert_before(parent, el, reference)?;
                }
                patch_vnode(child, new_child(&mut new_children, index)?, surface, parent, host)?;
            }
            ArrayDiffOp::Noop {
                original_index,
                index,
                ..
            } => {
                let child = take_old_child(&mut old_children, original_index)?;
                patch_vnode(child, new_child(&mut new_children, index)?, surface, parent, host)?;
            }
        }
    }
    Ok(())
}

/// Nested fragments are spliced away before diffing, so they are never
/// mounted or patched themselves; point them at the parent they live in.
fn anchor_fragments(children: &mut [VNode], parent: NodeId) {
    for child in children {
        if let VNode::Fragment(fragment) = child {
            fragment.el = Some(parent);
            anchor_fragments(&mut fragment.children, parent);
        }
    }
}

fn take_old_child(children: &mut [Option<VNode>], index: Option<usize>) -> Result<VNode> {
    index
        .and_then(|index| children.get_mut(index))
        .and_then(Option::take)
        .ok_or(RuntimeError::MissingChild(index))
}

fn new_child<'a>(children: &'a mut [&mut VNode], index: usize) -> Result<&'a mut VNode> {
    children
        .get_mut(index)
        .map(|child| &mut **child)
        .ok_or(RuntimeError::MissingChild(Some(index)))
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use vitrail_fresco::{MemorySurface, Mutation};

    use super::*;
    use crate::h::{h, h_fragment, h_string};
    use crate::props::Props;

    fn setup() -> (Rc<MemorySurface>, SurfaceRef, NodeId) {
        let memory = Rc::new(MemorySurface::new());
        let root = memory.create_root();
        let surface: SurfaceRef = memory.clone();
        (memory, surface, root)
    }

    fn mounted(vnode: VNode, surface: &SurfaceRef, root: NodeId) -> VNode {
        let mut vnode = vnode;
        mount_dom(&mut vnode, surface, root, None, None).unwrap();
        vnode
    }

    fn list(items: &[&str]) -> VNode {
        h(
            "ul",
            Props::new(),
            items.iter().map(|item| h("li", Props::new().attr("id", *item), [*item])),
        )
    }

    #[test]
    fn test_patch_identical_is_silent() {
        let (memory, surface, root) = setup();
        let view = h(
            "div",
            Props::new().class("a b").style("color", "red").attr("id", "x"),
            [h_string("hello"), h("span", Props::new(), ["world"])],
        );
        let old = mounted(view.clone(), &surface, root);
        memory.take_mutations();

        let new = patch_dom(old, view, &surface, root, None).unwrap();
        assert!(memory.take_mutations().is_empty());
        assert!(new.is_mounted());
        assert!(new.children().iter().all(VNode::is_mounted));
    }

    #[test]
    fn test_patch_text() {
        let (memory, surface, root) = setup();
        let old = mounted(h_string("one"), &surface, root);
        let el = old.el();
        memory.take_mutations();

        let new = patch_dom(old, h_string("two"), &surface, root, None).unwrap();
        assert_eq!(new.el(), el);
        assert_eq!(memory.inner_html(root).unwrap(), "two");
        assert_eq!(memory.take_mutations().len(), 1);
    }

    #[test]
    fn test_patch_children_swap_tag() {
        let (memory, surface, root) = setup();
        let old = mounted(
            h_fragment([
                h("p", Props::new(), ["a"]),
                h("p", Props::new(), ["b"]),
                h("p", Props::new(), ["c"]),
            ]),
            &surface,
            root,
        );
        let new = h_fragment([
            h("p", Props::new(), ["a"]),
            h("span", Props::new(), ["B"]),
            h("p", Props::new(), ["c"]),
        ]);
        patch_dom(old, new, &surface, root, None).unwrap();
        insta::assert_snapshot!(
            memory.inner_html(root).unwrap(),
            @"<p>a</p><span>B</span><p>c</p>"
        );
    }

    #[test]
    fn test_patch_props() {
        let (memory, surface, root) = setup();
        let old = mounted(
            h(
                "div",
                Props::new()
                    .class(["a", "b"])
                    .style("color", "red")
                    .style("margin", "0")
                    .attr("id", "x")
                    .attr("title", "old"),
                Vec::<VNode>::new(),
            ),
            &surface,
            root,
        );
        let new = h(
            "div",
            Props::new()
                .class(["b", "c"])
                .style("color", "blue")
                .attr("id", "x")
                .attr("hidden", true),
            Vec::<VNode>::new(),
        );
        let el = old.el().unwrap();
        memory.take_mutations();

        patch_dom(old, new, &surface, root, None).unwrap();
        insta::assert_snapshot!(
            memory.inner_html(root).unwrap(),
            @r#"<div class="b c" hidden id="x" style="color: blue"></div>"#
        );
        let mutations = memory.take_mutations();
        assert!(mutations.contains(&Mutation::RemoveAttribute(el, "title".into())));
        assert!(mutations.contains(&Mutation::RemoveClass(el, "a".into())));
        assert!(mutations.contains(&Mutation::AddClass(el, "c".into())));
        assert!(mutations.contains(&Mutation::ClearStyle(el, "margin".into())));
        assert!(!mutations.iter().any(|m| m.is_structural()));
    }

    #[test]
    fn test_patch_events() {
        let (memory, surface, root) = setup();
        let clicks = Rc::new(Cell::new(0));
        let keeps = Rc::new(Cell::new(0));

        let counter = clicks.clone();
        let click = EventHandler::new(move |_| {
            counter.set(counter.get() + 1);
            Ok(())
        });
        let counter = keeps.clone();
        let focus = EventHandler::new(move |_| {
            counter.set(counter.get() + 1);
            Ok(())
        });

        let old = mounted(
            h(
                "button",
                Props::new().on("click", click).on("focus", focus.clone()),
                ["go"],
            ),
            &surface,
            root,
        );
        let el = old.el().unwrap();

        let counter = clicks.clone();
        let new_click = EventHandler::new(move |_| {
            counter.set(counter.get() + 10);
            Ok(())
        });
        let new = patch_dom(
            old,
            h(
                "button",
                Props::new().on("click", new_click).on("focus", focus),
                ["go"],
            ),
            &surface,
            root,
            None,
        )
        .unwrap();

        assert_eq!(memory.dispatch_event(el, "click", Value::Null).unwrap(), 1);
        assert_eq!(clicks.get(), 10);
        assert_eq!(memory.dispatch_event(el, "focus", Value::Null).unwrap(), 1);
        assert_eq!(keeps.get(), 1);

        // Unchanged listeners are still tracked, so destroy releases them all.
        let listeners = new.as_element().unwrap().listeners.as_ref().unwrap();
        assert_eq!(listeners.len(), 2);
        let mut new = new;
        destroy_dom(&mut new, &surface).unwrap();
        assert_eq!(memory.total_listener_count(), 0);
    }

    #[test]
    fn test_patch_children_reorder_moves_nodes() {
        let (memory, surface, root) = setup();
        fn row(tags: &[&str]) -> VNode {
            h(
                "div",
                Props::new(),
                tags.iter().map(|tag| h(*tag, Props::new(), [*tag])),
            )
        }
        let old = mounted(row(&["p", "span", "b"]), &surface, root);
        let div = old.el().unwrap();
        let before = memory.child_nodes(div).unwrap();
        memory.take_mutations();

        patch_dom(old, row(&["b", "p", "span"]), &surface, root, None).unwrap();
        let after = memory.child_nodes(div).unwrap();

        assert_eq!(after, vec![before[2], before[0], before[1]]);
        insta::assert_snapshot!(
            memory.inner_html(div).unwrap(),
            @"<b>b</b><p>p</p><span>span</span>"
        );
        let mutations = memory.take_mutations();
        assert_eq!(mutations.len(), 1);
        assert!(matches!(mutations[0], Mutation::Insert { index: 0, .. }));
    }

    #[test]
    fn test_patch_same_tag_children_in_place() {
        let (memory, surface, root) = setup();
        let old = mounted(list(&["a", "b"]), &surface, root);
        let ul = old.el().unwrap();
        let before = memory.child_nodes(ul).unwrap();

        patch_dom(old, list(&["b", "a"]), &surface, root, None).unwrap();
        assert_eq!(memory.child_nodes(ul).unwrap(), before);
        insta::assert_snapshot!(
            memory.inner_html(ul).unwrap(),
            @r#"<li id="b">b</li><li id="a">a</li>"#
        );
    }

    #[test]
    fn test_patch_children_add_and_remove() {
        let (memory, surface, root) = setup();
        let old = mounted(
            h("div", Props::new(), [h_string("a"), h("b", Props::new(), ["x"])]),
            &surface,
            root,
        );
        let new = patch_dom(
            old,
            h(
                "div",
                Props::new(),
                [h("i", Props::new(), ["y"]), h_string("a"), h_string("z")],
            ),
            &surface,
            root,
            None,
        )
        .unwrap();
        insta::assert_snapshot!(
            memory.inner_html(root).unwrap(),
            @"<div><i>y</i>az</div>"
        );
        assert!(new.children().iter().all(VNode::is_mounted));
    }

    #[test]
    fn test_patch_nested_fragments_flatten() {
        let (memory, surface, root) = setup();
        let old = mounted(
            h("div", Props::new(), [h_fragment(["a", "b"]), h_string("c")]),
            &surface,
            root,
        );
        let new = patch_dom(
            old,
            h("div", Props::new(), [h_string("a"), h_fragment(["b", "c", "d"])]),
            &surface,
            root,
            None,
        )
        .unwrap();
        assert_eq!(memory.inner_html(root).unwrap(), "<div>abcd</div>");
        let div = new.el();
        assert_eq!(new.children()[1].el(), div);
    }

    #[test]
    fn test_patch_root_fragment_replace_appends() {
        let (memory, surface, root) = setup();
        let old = mounted(h_fragment(["a"]), &surface, root);
        let new = patch_dom(old, h("p", Props::new(), ["b"]), &surface, root, None).unwrap();
        assert_eq!(memory.inner_html(root).unwrap(), "<p>b</p>");
        assert!(new.is_mounted());
    }

    #[test]
    fn test_patch_unmounted_old_fails() {
        let (_memory, surface, root) = setup();
        assert_eq!(
            patch_dom(h_string("a"), h_string("b"), &surface, root, None).unwrap_err(),
            RuntimeError::NotMaterialized
        );
    }
}
