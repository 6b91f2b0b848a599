//! Node descriptions (virtual nodes) and the helpers that build them.
//!
//! A description is single-use: once mounted it carries back-references to the
//! surface (`el`, listener handles, component instance). Cloning a description
//! yields a fresh, unmounted copy.

use std::rc::Rc;

use serde_json::Value;
use vitrail_carton::{CompactString, FxHashMap};
use vitrail_fresco::{ListenerId, NodeId};

use crate::component::{into_map, ComponentDef, ComponentProps, ComponentRef};
use crate::props::Props;

/// A node description.
#[derive(Debug, Clone)]
pub enum VNode {
    Text(TextVNode),
    Element(ElementVNode),
    /// Transparent grouping without a surface node of its own
    Fragment(FragmentVNode),
    Component(ComponentVNode),
}

#[derive(Debug)]
pub struct TextVNode {
    pub value: CompactString,
    /// Surface text node, once mounted
    pub el: Option<NodeId>,
}

#[derive(Debug)]
pub struct ElementVNode {
    pub tag: CompactString,
    pub props: Props,
    pub children: Vec<VNode>,
    /// Surface element, once mounted
    pub el: Option<NodeId>,
    /// Listener handles bound on `el`, by event name
    pub listeners: Option<FxHashMap<CompactString, ListenerId>>,
}

#[derive(Debug)]
pub struct FragmentVNode {
    pub children: Vec<VNode>,
    /// The parent surface node the children were spliced into
    pub el: Option<NodeId>,
}

#[derive(Debug)]
pub struct ComponentVNode {
    pub definition: Rc<ComponentDef>,
    pub props: ComponentProps,
    /// Live instance, once mounted
    pub instance: Option<ComponentRef>,
    /// First surface node rendered by the instance
    pub el: Option<NodeId>,
}

impl Clone for TextVNode {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            el: None,
        }
    }
}

impl Clone for ElementVNode {
    fn clone(&self) -> Self {
        Self {
            tag: self.tag.clone(),
            props: self.props.clone(),
            children: self.children.clone(),
            el: None,
            listeners: None,
        }
    }
}

impl Clone for FragmentVNode {
    fn clone(&self) -> Self {
        Self {
            children: self.children.clone(),
            el: None,
        }
    }
}

impl Clone for ComponentVNode {
    fn clone(&self) -> Self {
        Self {
            definition: self.definition.clone(),
            props: self.props.clone(),
            instance: None,
            el: None,
        }
    }
}

impl VNode {
    /// Surface node this description is materialized as.
    ///
    /// For fragments this is the parent the children live in.
    pub fn el(&self) -> Option<NodeId> {
        match self {
            VNode::Text(node) => node.el,
            VNode::Element(node) => node.el,
            VNode::Fragment(node) => node.el,
            VNode::Component(node) => node.el,
        }
    }

    /// Whether mount attached back-references that destroy has not cleared yet.
    pub fn is_mounted(&self) -> bool {
        match self {
            VNode::Component(node) => node.instance.is_some(),
            _ => self.el().is_some(),
        }
    }

    /// Short variant name, for logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            VNode::Text(_) => "text",
            VNode::Element(_) => "element",
            VNode::Fragment(_) => "fragment",
            VNode::Component(_) => "component",
        }
    }

    /// Direct children (empty for text and component nodes).
    pub fn children(&self) -> &[VNode] {
        match self {
            VNode::Element(node) => &node.children,
            VNode::Fragment(node) => &node.children,
            VNode::Text(_) | VNode::Component(_) => &[],
        }
    }

    pub fn as_text(&self) -> Option<&TextVNode> {
        match self {
            VNode::Text(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_element(&self) -> Option<&ElementVNode> {
        match self {
            VNode::Element(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_component(&self) -> Option<&ComponentVNode> {
        match self {
            VNode::Component(node) => Some(node),
            _ => None,
        }
    }
}

/// A child slot as accepted by the helpers: a node, a bare string (wrapped as
/// text) or nothing (dropped).
#[derive(Debug)]
pub struct Child(Option<VNode>);

impl From<VNode> for Child {
    fn from(node: VNode) -> Self {
        Child(Some(node))
    }
}

impl From<Option<VNode>> for Child {
    fn from(node: Option<VNode>) -> Self {
        Child(node)
    }
}

impl From<&str> for Child {
    fn from(value: &str) -> Self {
        Child(Some(h_string(value)))
    }
}

impl From<String> for Child {
    fn from(value: String) -> Self {
        Child(Some(h_string(value)))
    }
}

impl From<CompactString> for Child {
    fn from(value: CompactString) -> Self {
        Child(Some(h_string(value)))
    }
}

fn map_children<I, C>(children: I) -> Vec<VNode>
where
    I: IntoIterator<Item = C>,
    C: Into<Child>,
{
    children
        .into_iter()
        .filter_map(|child| child.into().0)
        .collect()
}

/// Create an element description.
pub fn h<I, C>(tag: impl Into<CompactString>, props: Props, children: I) -> VNode
where
    I: IntoIterator<Item = C>,
    C: Into<Child>,
{
    VNode::Element(ElementVNode {
        tag: tag.into(),
        props,
        children: map_children(children),
        el: None,
        listeners: None,
    })
}

/// Create a text description.
pub fn h_string(value: impl Into<CompactString>) -> VNode {
    VNode::Text(TextVNode {
        value: value.into(),
        el: None,
    })
}

/// Create a fragment description.
pub fn h_fragment<I, C>(children: I) -> VNode
where
    I: IntoIterator<Item = C>,
    C: Into<Child>,
{
    VNode::Fragment(FragmentVNode {
        children: map_children(children),
        el: None,
    })
}

/// Create a component description.
///
/// `props` is normally a JSON object. `null` means no props; any other value is
/// stored under the `value` key.
pub fn h_component(definition: &Rc<ComponentDef>, props: Value) -> VNode {
    VNode::Component(ComponentVNode {
        definition: definition.clone(),
        props: into_map(props),
        instance: None,
        el: None,
    })
}

/// Children of `node` with every fragment child spliced in, recursively.
pub fn extract_children(node: &VNode) -> Vec<&VNode> {
    fn collect<'a>(children: &'a [VNode], out: &mut Vec<&'a VNode>) {
        for child in children {
            match child {
                VNode::Fragment(fragment) => collect(&fragment.children, out),
                other => out.push(other),
            }
        }
    }

    let mut out = Vec::new();
    collect(node.children(), &mut out);
    out
}

/// Mutable variant of [`extract_children`] over a child list.
pub(crate) fn extract_children_mut(children: &mut [VNode]) -> Vec<&mut VNode> {
    fn collect<'a>(children: &'a mut [VNode], out: &mut Vec<&'a mut VNode>) {
        for child in children.iter_mut() {
            match child {
                VNode::Fragment(fragment) => collect(&mut fragment.children, out),
                other => out.push(other),
            }
        }
    }

    let mut out = Vec::new();
    collect(children, &mut out);
    out
}

/// Owned variant of [`extract_children`] over a child list.
pub(crate) fn into_flat_children(children: Vec<VNode>) -> Vec<VNode> {
    let mut out = Vec::with_capacity(children.len());
    for child in children {
        match child {
            VNode::Fragment(fragment) => out.extend(into_flat_children(fragment.children)),
            other => out.push(other),
        }
    }
    out
}

const LOREM: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod \
tempor incididunt ut labore et dolore magna aliqua. Ut enim ad minim veniam, quis nostrud \
exercitation ullamco laboris nisi ut aliquip ex ea commodo consequat.";

/// A fragment of `n` placeholder paragraphs.
pub fn lipsum(n: usize) -> VNode {
    h_fragment((0..n).map(|_| h("p", Props::new(), [LOREM])))
}
