//! Stateful components.
//!
//! A [`ComponentDef`] is created once with [`define_component`] and
//! instantiated by the mount engine whenever a component description is
//! mounted. Each [`ComponentRef`] owns its props, its state and the tree it
//! rendered last; changing either props or state re-renders and patches that
//! tree in place.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::{Map, Value};
use vitrail_carton::{CompactString, FxHashMap};
use vitrail_fresco::{NodeId, SurfaceRef};

use crate::destroy::destroy_dom;
use crate::errors::{Result, RuntimeError};
use crate::h::{extract_children, VNode};
use crate::mount::mount_dom;
use crate::patch::patch_dom;

pub type ComponentProps = Map<String, Value>;
pub type ComponentState = Map<String, Value>;

type RenderFn = dyn Fn(&ComponentRef) -> VNode;
type StateFn = dyn Fn(&ComponentProps) -> ComponentState;
type MethodFn = dyn Fn(&ComponentRef, &Value) -> Result<()>;

/// Names taken by the built-in component API.
pub const RESERVED_METHOD_NAMES: &[&str] = &[
    "mount",
    "unmount",
    "update_props",
    "update_state",
    "render",
    "props",
    "state",
    "elements",
    "first_element",
    "offset",
    "is_mounted",
    "call",
];

/// An object becomes the map itself, `null` an empty map; anything else is
/// stored under `value`.
pub(crate) fn into_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}

/// A component definition: render function, initial state and methods.
pub struct ComponentDef {
    name: CompactString,
    render: Rc<RenderFn>,
    state: Option<Rc<StateFn>>,
    methods: FxHashMap<CompactString, Rc<MethodFn>>,
}

impl ComponentDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    fn initial_state(&self, props: &ComponentProps) -> ComponentState {
        match &self.state {
            Some(state) => state(props),
            None => ComponentState::new(),
        }
    }
}

impl fmt::Debug for ComponentDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&str> = self.methods.keys().map(|name| name.as_str()).collect();
        methods.sort_unstable();
        f.debug_struct("ComponentDef")
            .field("name", &self.name)
            .field("has_state", &self.state.is_some())
            .field("methods", &methods)
            .finish()
    }
}

/// Builder returned by [`define_component`].
pub struct ComponentDefBuilder {
    name: CompactString,
    render: Rc<RenderFn>,
    state: Option<Rc<StateFn>>,
    methods: Vec<(CompactString, Rc<MethodFn>)>,
}

/// Start defining a component named `name` that renders with `render`.
///
/// ```
/// use vitrail_atelier::{define_component, h, Props};
///
/// let greeting = define_component("Greeting", |this| {
///     let name = this.prop("name").and_then(|v| v.as_str().map(String::from));
///     h("p", Props::new(), [format!("Hello, {}", name.unwrap_or_default())])
/// })
/// .build()
/// .unwrap();
/// assert_eq!(greeting.name(), "Greeting");
/// ```
pub fn define_component(
    name: impl Into<CompactString>,
    render: impl Fn(&ComponentRef) -> VNode + 'static,
) -> ComponentDefBuilder {
    ComponentDefBuilder {
        name: name.into(),
        render: Rc::new(render),
        state: None,
        methods: Vec::new(),
    }
}

impl ComponentDefBuilder {
    /// Initial state, computed from the props each instance is created with.
    pub fn state(mut self, state: impl Fn(&ComponentProps) -> ComponentState + 'static) -> Self {
        self.state = Some(Rc::new(state));
        self
    }

    /// Add a named method, invoked with the instance and a payload.
    pub fn method(
        mut self,
        name: impl Into<CompactString>,
        method: impl Fn(&ComponentRef, &Value) -> Result<()> + 'static,
    ) -> Self {
        self.methods.push((name.into(), Rc::new(method)));
        self
    }

    /// Finish the definition.
    ///
    /// Fails when a method shadows a built-in name or another method.
    pub fn build(self) -> Result<Rc<ComponentDef>> {
        let mut methods = FxHashMap::default();
        for (name, method) in self.methods {
            if RESERVED_METHOD_NAMES.contains(&name.as_str()) || methods.contains_key(&name) {
                return Err(RuntimeError::ReservedMethodName {
                    component: self.name,
                    method: name,
                });
            }
            methods.insert(name, method);
        }

        Ok(Rc::new(ComponentDef {
            name: self.name,
            render: self.render,
            state: self.state,
            methods,
        }))
    }
}

struct ComponentInner {
    def: Rc<ComponentDef>,
    surface: SurfaceRef,
    props: RefCell<ComponentProps>,
    state: RefCell<ComponentState>,
    vdom: RefCell<Option<VNode>>,
    host_el: Cell<Option<NodeId>>,
    mounted: Cell<bool>,
    /// Offset captured before a re-render, while the tree is taken out
    offset: Cell<usize>,
    /// Host child right before the rendered output, if any
    before: Cell<Option<NodeId>>,
}

/// A live component instance.
#[derive(Clone)]
pub struct ComponentRef(Rc<ComponentInner>);

/// Non-owning handle to a component instance.
#[derive(Clone)]
pub struct WeakComponentRef(Weak<ComponentInner>);

impl WeakComponentRef {
    pub fn upgrade(&self) -> Option<ComponentRef> {
        self.0.upgrade().map(ComponentRef)
    }
}

impl fmt::Debug for WeakComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WeakComponentRef")
    }
}

impl ComponentRef {
    /// Create an unmounted instance of `def`.
    pub fn new(def: Rc<ComponentDef>, props: ComponentProps, surface: SurfaceRef) -> Self {
        let state = def.initial_state(&props);
        ComponentRef(Rc::new(ComponentInner {
            def,
            surface,
            props: RefCell::new(props),
            state: RefCell::new(state),
            vdom: RefCell::new(None),
            host_el: Cell::new(None),
            mounted: Cell::new(false),
            offset: Cell::new(0),
            before: Cell::new(None),
        }))
    }

    pub fn downgrade(&self) -> WeakComponentRef {
        WeakComponentRef(Rc::downgrade(&self.0))
    }

    pub fn name(&self) -> &str {
        self.0.def.name()
    }

    pub fn definition(&self) -> &Rc<ComponentDef> {
        &self.0.def
    }

    pub fn is_mounted(&self) -> bool {
        self.0.mounted.get()
    }

    /// Snapshot of the current props.
    pub fn props(&self) -> ComponentProps {
        self.0.props.borrow().clone()
    }

    pub fn prop(&self, key: &str) -> Option<Value> {
        self.0.props.borrow().get(key).cloned()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ComponentState {
        self.0.state.borrow().clone()
    }

    pub fn state_value(&self, key: &str) -> Option<Value> {
        self.0.state.borrow().get(key).cloned()
    }

    /// Render the view for the current props and state.
    pub fn render(&self) -> VNode {
        (self.0.def.render)(self)
    }

    /// Surface nodes of the current tree, fragment children flattened.
    pub fn elements(&self) -> Vec<NodeId> {
        match self.0.vdom.borrow().as_ref() {
            None => Vec::new(),
            Some(vdom @ VNode::Fragment(_)) => extract_children(vdom)
                .into_iter()
                .filter_map(VNode::el)
                .collect(),
            Some(vdom) => vdom.el().into_iter().collect(),
        }
    }

    pub fn first_element(&self) -> Option<NodeId> {
        self.elements().first().copied()
    }

    /// Number of host children before the component's output.
    ///
    /// Always 0 unless the component renders a fragment. A fragment that
    /// rendered nothing still keeps its place right after the sibling that
    /// preceded it.
    pub fn offset(&self) -> Result<usize> {
        let is_fragment = match self.0.vdom.borrow().as_ref() {
            None => return Ok(self.0.offset.get()),
            Some(vdom) => matches!(vdom, VNode::Fragment(_)),
        };
        let Some(host_el) = self.0.host_el.get().filter(|_| is_fragment) else {
            return Ok(0);
        };

        let surface = &self.0.surface;
        if let Some(first) = self.first_element() {
            if let Some(index) = surface.index_of_child(host_el, first)? {
                return Ok(index);
            }
        }
        match self.0.before.get() {
            None => Ok(0),
            Some(before) => Ok(surface
                .index_of_child(host_el, before)?
                .map_or_else(|| self.0.offset.get(), |index| index + 1)),
        }
    }

    /// Remember the host child preceding the output, so an empty fragment
    /// can be refilled in place.
    fn remember_position(&self, host_el: NodeId) -> Result<()> {
        let Some(first) = self.first_element() else {
            return Ok(());
        };
        let siblings = self.0.surface.child_nodes(host_el)?;
        if let Some(index) = siblings.iter().position(|&child| child == first) {
            let before = index.checked_sub(1).and_then(|i| siblings.get(i).copied());
            self.0.before.set(before);
            self.0.offset.set(index);
        }
        Ok(())
    }

    /// Render and mount into `host_el`, at `index` or appended.
    pub fn mount(&self, host_el: NodeId, index: Option<usize>) -> Result<()> {
        if self.is_mounted() {
            return Err(RuntimeError::AlreadyMounted(self.0.def.name.clone()));
        }
        tracing::debug!(component = self.name(), host_el, ?index, "mount component");

        let siblings = self.0.surface.child_nodes(host_el)?;
        let at = index.map_or(siblings.len(), |index| index.min(siblings.len()));
        self.0.before.set(at.checked_sub(1).and_then(|i| siblings.get(i).copied()));
        self.0.offset.set(at);

        let mut vdom = self.render();
        mount_dom(&mut vdom, &self.0.surface, host_el, index, Some(self))?;

        *self.0.vdom.borrow_mut() = Some(vdom);
        self.0.host_el.set(Some(host_el));
        self.0.mounted.set(true);
        self.remember_position(host_el)
    }

    /// Destroy the rendered tree.
    pub fn unmount(&self) -> Result<()> {
        self.ensure_mounted()?;
        tracing::debug!(component = self.name(), "unmount component");

        let mut vdom = self
            .0
            .vdom
            .borrow_mut()
            .take()
            .ok_or(RuntimeError::NotMaterialized)?;
        destroy_dom(&mut vdom, &self.0.surface)?;

        self.0.host_el.set(None);
        self.0.before.set(None);
        self.0.mounted.set(false);
        Ok(())
    }

    /// Merge `props` into the current props and re-render.
    ///
    /// Nothing happens when the merged props equal the current ones.
    pub fn update_props(&self, props: Value) -> Result<()> {
        self.ensure_mounted()?;

        let merged = {
            let mut merged = self.0.props.borrow().clone();
            merged.extend(into_map(props));
            merged
        };
        if *self.0.props.borrow() == merged {
            tracing::trace!(component = self.name(), "props unchanged, skipping render");
            return Ok(());
        }

        *self.0.props.borrow_mut() = merged;
        self.patch()
    }

    /// Merge `state` into the current state and re-render.
    pub fn update_state(&self, state: Value) -> Result<()> {
        self.ensure_mounted()?;
        self.0.state.borrow_mut().extend(into_map(state));
        self.patch()
    }

    /// Invoke a method of the definition.
    pub fn call(&self, method: &str, payload: &Value) -> Result<()> {
        let Some(f) = self.0.def.methods.get(method).cloned() else {
            return Err(RuntimeError::UnknownMethod {
                component: self.0.def.name.clone(),
                method: method.into(),
            });
        };
        f(self, payload)
    }

    fn ensure_mounted(&self) -> Result<()> {
        if self.is_mounted() {
            Ok(())
        } else {
            Err(RuntimeError::NotMounted(self.0.def.name.clone()))
        }
    }

    fn patch(&self) -> Result<()> {
        let host_el = self
            .0
            .host_el
            .get()
            .ok_or_else(|| RuntimeError::NotMounted(self.0.def.name.clone()))?;
        self.0.offset.set(self.offset()?);

        let old = self
            .0
            .vdom
            .borrow_mut()
            .take()
            .ok_or(RuntimeError::NotMaterialized)?;
        let new = self.render();
        tracing::trace!(component = self.name(), "patch component");

        let vdom = patch_dom(old, new, &self.0.surface, host_el, Some(self))?;
        *self.0.vdom.borrow_mut() = Some(vdom);
        self.remember_position(host_el)
    }
}

impl fmt::Debug for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRef")
            .field("name", &self.name())
            .field("mounted", &self.is_mounted())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use serde_json::json;
    use vitrail_fresco::{MemorySurface, Surface};

    use super::*;
    use crate::events::EventHandler;
    use crate::h::{h, h_fragment};
    use crate::props::Props;

    fn setup() -> (Rc<MemorySurface>, SurfaceRef, NodeId) {
        let memory = Rc::new(MemorySurface::new());
        let root = memory.create_root();
        let surface: SurfaceRef = memory.clone();
        (memory, surface, root)
    }

    fn counter() -> Rc<ComponentDef> {
        define_component("Counter", |this| {
            let count = this.state_value("count").and_then(|v| v.as_i64()).unwrap_or(0);
            h(
                "button",
                Props::new().on("click", EventHandler::method("increment")),
                [count.to_string()],
            )
        })
        .state(|props| {
            let mut state = ComponentState::new();
            state.insert("count".into(), props.get("start").cloned().unwrap_or(json!(0)));
            state
        })
        .method("increment", |this, _| {
            let count = this.state_value("count").and_then(|v| v.as_i64()).unwrap_or(0);
            this.update_state(json!({ "count": count + 1 }))
        })
        .build()
        .unwrap()
    }

    #[test]
    fn test_reserved_method_names() {
        let err = define_component("Bad", |_| h_fragment(Vec::<VNode>::new()))
            .method("mount", |_, _| Ok(()))
            .build()
            .unwrap_err();
        assert!(matches!(err, RuntimeError::ReservedMethodName { .. }));

        let err = define_component("Twice", |_| h_fragment(Vec::<VNode>::new()))
            .method("go", |_, _| Ok(()))
            .method("go", |_, _| Ok(()))
            .build()
            .unwrap_err();
        insta::assert_snapshot!(err.to_string(), @r#"Method "go" already exists in component 'Twice'"#);
    }

    #[test]
    fn test_initial_state_from_props() {
        let (_memory, surface, _root) = setup();
        let mut props = ComponentProps::new();
        props.insert("start".into(), json!(5));
        let instance = ComponentRef::new(counter(), props, surface);
        assert_eq!(instance.state_value("count"), Some(json!(5)));
        assert!(!instance.is_mounted());
    }

    #[test]
    fn test_mount_and_click() {
        let (memory, surface, root) = setup();
        let instance = ComponentRef::new(counter(), ComponentProps::new(), surface);
        instance.mount(root, None).unwrap();
        assert_eq!(memory.inner_html(root).unwrap(), "<button>0</button>");

        let button = instance.first_element().unwrap();
        memory.dispatch_event(button, "click", Value::Null).unwrap();
        memory.dispatch_event(button, "click", Value::Null).unwrap();
        assert_eq!(memory.inner_html(root).unwrap(), "<button>2</button>");
        assert_eq!(instance.first_element(), Some(button));
    }

    #[test]
    fn test_double_mount_and_unmount() {
        let (memory, surface, root) = setup();
        let instance = ComponentRef::new(counter(), ComponentProps::new(), surface);
        assert_eq!(
            instance.unmount(),
            Err(RuntimeError::NotMounted("Counter".into()))
        );
        instance.mount(root, None).unwrap();
        assert_eq!(
            instance.mount(root, None),
            Err(RuntimeError::AlreadyMounted("Counter".into()))
        );
        instance.unmount().unwrap();
        assert_eq!(memory.inner_html(root).unwrap(), "");
        assert_eq!(memory.total_listener_count(), 0);
        assert!(instance.elements().is_empty());
        assert!(instance.update_state(json!({ "count": 1 })).is_err());
    }

    #[test]
    fn test_update_props_skips_equal() {
        let (_memory, surface, root) = setup();
        let renders = Rc::new(Cell::new(0));
        let counted = renders.clone();
        let def = define_component("Label", move |this| {
            counted.set(counted.get() + 1);
            let text = this.prop("text").and_then(|v| v.as_str().map(String::from));
            h("span", Props::new(), [text.unwrap_or_default()])
        })
        .build()
        .unwrap();

        let mut props = ComponentProps::new();
        props.insert("text".into(), json!("a"));
        let instance = ComponentRef::new(def, props, surface);
        instance.mount(root, None).unwrap();
        assert_eq!(renders.get(), 1);

        instance.update_props(json!({ "text": "a" })).unwrap();
        assert_eq!(renders.get(), 1);
        instance.update_props(json!({ "text": "b" })).unwrap();
        assert_eq!(renders.get(), 2);
        assert_eq!(instance.props().get("text"), Some(&json!("b")));
    }

    #[test]
    fn test_fragment_component_offset() {
        let (memory, surface, root) = setup();
        let before = memory.create_element("header");
        memory.append_child(root, before).unwrap();

        let def = define_component("Pair", |this| {
            let label = this.state_value("label").and_then(|v| v.as_str().map(String::from));
            h_fragment([
                h("i", Props::new(), [label.clone().unwrap_or_default()]),
                h("b", Props::new(), [label.unwrap_or_default()]),
            ])
        })
        .build()
        .unwrap();
        let instance = ComponentRef::new(def, ComponentProps::new(), surface);
        instance.mount(root, None).unwrap();

        assert_eq!(instance.elements().len(), 2);
        assert_eq!(instance.offset().unwrap(), 1);

        instance.update_state(json!({ "label": "x" })).unwrap();
        insta::assert_snapshot!(
            memory.inner_html(root).unwrap(),
            @"<header></header><i>x</i><b>x</b>"
        );
    }

    fn tag_list() -> Rc<ComponentDef> {
        define_component("TagList", |this| {
            let tags: Vec<String> = this
                .state_value("tags")
                .and_then(|v| serde_json::from_value(v).ok())
                .unwrap_or_default();
            h_fragment(tags.iter().map(|tag| h(tag.as_str(), Props::new(), [tag.as_str()])))
        })
        .state(|props| {
            let mut state = ComponentState::new();
            state.insert("tags".into(), props.get("tags").cloned().unwrap_or(json!([])));
            state
        })
        .build()
        .unwrap()
    }

    /// Mount a `TagList` between a `<header>` and a `<footer>`.
    fn mount_between(tags: Value) -> (Rc<MemorySurface>, NodeId, ComponentRef) {
        let (memory, surface, root) = setup();
        let header = memory.create_element("header");
        memory.append_child(root, header).unwrap();

        let mut props = ComponentProps::new();
        props.insert("tags".into(), tags);
        let instance = ComponentRef::new(tag_list(), props, surface);
        instance.mount(root, None).unwrap();

        let footer = memory.create_element("footer");
        memory.append_child(root, footer).unwrap();
        (memory, root, instance)
    }

    #[test]
    fn test_fragment_component_reorder_after_sibling() {
        let (memory, root, instance) = mount_between(json!(["i", "b", "u"]));
        let [i, b, u] = instance.elements()[..] else {
            panic!("expected three elements");
        };
        assert_eq!(instance.offset().unwrap(), 1);

        instance.update_state(json!({ "tags": ["u", "i", "b"] })).unwrap();
        insta::assert_snapshot!(
            memory.inner_html(root).unwrap(),
            @"<header></header><u>u</u><i>i</i><b>b</b><footer></footer>"
        );
        assert_eq!(instance.elements(), vec![u, i, b]);
    }

    #[test]
    fn test_fragment_component_add_after_sibling() {
        let (memory, root, instance) = mount_between(json!(["i"]));
        let i = instance.first_element().unwrap();

        instance.update_state(json!({ "tags": ["b", "i", "u"] })).unwrap();
        insta::assert_snapshot!(
            memory.inner_html(root).unwrap(),
            @"<header></header><b>b</b><i>i</i><u>u</u><footer></footer>"
        );
        assert_eq!(instance.elements()[1], i);
        assert_eq!(instance.offset().unwrap(), 1);
    }

    #[test]
    fn test_fragment_component_remove_after_sibling() {
        let (memory, root, instance) = mount_between(json!(["i", "b", "u"]));
        let [i, _, u] = instance.elements()[..] else {
            panic!("expected three elements");
        };

        instance.update_state(json!({ "tags": ["i", "u"] })).unwrap();
        insta::assert_snapshot!(
            memory.inner_html(root).unwrap(),
            @"<header></header><i>i</i><u>u</u><footer></footer>"
        );
        assert_eq!(instance.elements(), vec![i, u]);
    }

    #[test]
    fn test_empty_fragment_component_keeps_its_place() {
        let (memory, root, instance) = mount_between(json!([]));
        assert_eq!(instance.offset().unwrap(), 1);

        instance.update_state(json!({ "tags": ["i"] })).unwrap();
        insta::assert_snapshot!(
            memory.inner_html(root).unwrap(),
            @"<header></header><i>i</i><footer></footer>"
        );

        instance.update_state(json!({ "tags": [] })).unwrap();
        assert_eq!(instance.offset().unwrap(), 1);
        instance.update_state(json!({ "tags": ["b"] })).unwrap();
        insta::assert_snapshot!(
            memory.inner_html(root).unwrap(),
            @"<header></header><b>b</b><footer></footer>"
        );
    }

    #[test]
    fn test_call_unknown_method() {
        let (_memory, surface, _root) = setup();
        let instance = ComponentRef::new(counter(), ComponentProps::new(), surface);
        assert!(matches!(
            instance.call("missing", &Value::Null),
            Err(RuntimeError::UnknownMethod { .. })
        ));
    }
}
