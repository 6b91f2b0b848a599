//! Application shell tests.

use std::cell::Cell;
use std::rc::Rc;

use serde_json::{json, Value};
use vitrail_atelier::{h, h_fragment, EventHandler, Props, SurfaceRef, VNode};
use vitrail_fresco::{MemorySurface, NodeId, Surface};
use vitrail_maestro::{
    create_app, create_app_with_options, App, AppDefinition, AppOptions, Emitter,
};

#[derive(Debug, Clone, Default, PartialEq)]
struct Todos {
    draft: String,
    items: Vec<String>,
}

fn todo_view(state: &Todos, emit: &Emitter) -> VNode {
    let add = {
        let emit = emit.clone();
        EventHandler::new(move |_| emit.emit("add-todo", Value::Null))
    };
    let input = {
        let emit = emit.clone();
        EventHandler::new(move |event| emit.emit("update-draft", event.detail.clone()))
    };

    h_fragment([
        h(
            "div",
            Props::new(),
            [
                h(
                    "input",
                    Props::new().attr("value", state.draft.as_str()).on("input", input),
                    Vec::<VNode>::new(),
                ),
                h("button", Props::new().on("click", add), ["Add"]),
            ],
        ),
        h(
            "ul",
            Props::new(),
            state.items.iter().map(|item| h("li", Props::new(), [item.as_str()])),
        ),
    ])
}

fn todo_app(surface: SurfaceRef) -> App<Todos> {
    let definition = AppDefinition::new(Todos::default(), todo_view)
        .reducer("update-draft", |state: &Todos, payload: &Value| Todos {
            draft: payload.as_str().unwrap_or_default().to_string(),
            ..state.clone()
        })
        .reducer("add-todo", |state: &Todos, _: &Value| {
            let mut items = state.items.clone();
            items.push(state.draft.clone());
            Todos {
                draft: String::new(),
                items,
            }
        });
    create_app(definition, surface)
}

fn setup() -> (Rc<MemorySurface>, SurfaceRef, NodeId) {
    let memory = Rc::new(MemorySurface::new());
    let root = memory.create_root();
    let surface: SurfaceRef = memory.clone();
    (memory, surface, root)
}

/// First element with `tag` below `parent`, depth first.
fn find(memory: &MemorySurface, parent: NodeId, tag: &str) -> Option<NodeId> {
    for id in memory.child_nodes(parent).ok()? {
        let node = memory.node(id)?;
        if node.as_element().is_some_and(|el| el.tag == tag) {
            return Some(id);
        }
        if let Some(found) = find(memory, id, tag) {
            return Some(found);
        }
    }
    None
}

#[test]
fn renders_after_each_command() {
    let (memory, surface, root) = setup();
    let app = todo_app(surface);
    app.mount(root).unwrap();
    insta::assert_snapshot!(
        memory.inner_html(root).unwrap(),
        @r#"<div><input value=""></input><button>Add</button></div><ul></ul>"#
    );

    let input = find(&memory, root, "input").unwrap();
    let button = find(&memory, root, "button").unwrap();

    memory.dispatch_event(input, "input", json!("milk")).unwrap();
    memory.dispatch_event(button, "click", Value::Null).unwrap();
    memory.dispatch_event(input, "input", json!("eggs")).unwrap();
    memory.dispatch_event(button, "click", Value::Null).unwrap();

    insta::assert_snapshot!(
        memory.inner_html(root).unwrap(),
        @r#"<div><input value=""></input><button>Add</button></div><ul><li>milk</li><li>eggs</li></ul>"#
    );
    assert_eq!(app.state().items, vec!["milk", "eggs"]);
    // The same surface nodes were patched, never replaced.
    assert_eq!(find(&memory, root, "input"), Some(input));
}

#[test]
fn emit_before_mount_only_updates_state() {
    let (memory, surface, root) = setup();
    let app = todo_app(surface);
    app.emit("update-draft", json!("early")).unwrap();
    assert_eq!(app.state().draft, "early");
    assert!(memory.child_nodes(root).unwrap().is_empty());

    app.mount(root).unwrap();
    assert!(memory.inner_html(root).unwrap().contains(r#"value="early""#));
}

#[test]
fn unmount_destroys_tree_and_subscriptions() {
    let (memory, surface, root) = setup();
    let app = todo_app(surface);
    app.mount(root).unwrap();
    let dispatcher = app.dispatcher().clone();
    assert_eq!(dispatcher.handler_count("add-todo"), 1);
    assert_eq!(dispatcher.after_handler_count(), 1);

    app.unmount().unwrap();
    assert!(memory.child_nodes(root).unwrap().is_empty());
    assert_eq!(memory.total_listener_count(), 0);
    assert_eq!(dispatcher.handler_count("add-todo"), 0);
    assert_eq!(dispatcher.after_handler_count(), 0);
}

#[test]
fn double_mount_is_rejected() {
    let (_memory, surface, root) = setup();
    let app = todo_app(surface);
    app.mount(root).unwrap();
    assert!(app.mount(root).is_err());
}

#[test]
fn extra_after_handlers_see_new_state() {
    let (_memory, surface, root) = setup();
    let definition = AppDefinition::new(0_i64, |count: &i64, _: &Emitter| {
        h("span", Props::new(), [count.to_string()])
    })
    .reducer("inc", |count: &i64, _: &Value| count + 1);
    let app = create_app_with_options(definition, surface, AppOptions::default());
    app.mount(root).unwrap();

    let renders = Rc::new(Cell::new(0));
    let counter = renders.clone();
    let _subscription = app.dispatcher().after_every_command(Rc::new(move || -> vitrail_atelier::Result<()> {
        counter.set(counter.get() + 1);
        Ok(())
    }));

    app.emit("inc", Value::Null).unwrap();
    app.emit("unknown", Value::Null).unwrap();
    assert_eq!(app.state(), 1);
    assert_eq!(renders.get(), 2);
}
