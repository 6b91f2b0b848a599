//! Event handlers and their binding onto surface nodes.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use vitrail_carton::{CompactString, FxHashMap};
use vitrail_fresco::{Event, Listener, ListenerId, NodeId, Surface};

use crate::component::ComponentRef;
use crate::errors::{Result, RuntimeError};

type CallbackFn = dyn Fn(&Event) -> Result<()>;
type BoundFn = dyn Fn(&ComponentRef, &Event) -> Result<()>;

/// Handler stored in the reserved `on` prop.
///
/// Handlers are compared by identity when patching: the same `Rc` (or the same
/// method name) counts as unchanged and is not rebound.
#[derive(Clone)]
pub enum EventHandler {
    /// Plain closure, invoked with the event only.
    Callback(Rc<CallbackFn>),
    /// Closure that receives the host component explicitly.
    Bound(Rc<BoundFn>),
    /// A method of the host component, looked up by name at invocation time.
    Method(CompactString),
}

impl EventHandler {
    pub fn new(f: impl Fn(&Event) -> Result<()> + 'static) -> Self {
        EventHandler::Callback(Rc::new(f))
    }

    pub fn bound(f: impl Fn(&ComponentRef, &Event) -> Result<()> + 'static) -> Self {
        EventHandler::Bound(Rc::new(f))
    }

    pub fn method(name: impl Into<CompactString>) -> Self {
        EventHandler::Method(name.into())
    }

    /// Run the handler, passing `host` to bound handlers and methods.
    pub fn invoke(&self, host: Option<&ComponentRef>, event: &Event) -> Result<()> {
        match self {
            EventHandler::Callback(f) => f(event),
            EventHandler::Bound(f) => match host {
                Some(host) => f(host, event),
                None => Err(RuntimeError::MissingHost {
                    event: event.name.clone(),
                }),
            },
            EventHandler::Method(name) => match host {
                Some(host) => host.call(name, &event.detail),
                None => Err(RuntimeError::MissingHost {
                    event: event.name.clone(),
                }),
            },
        }
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (EventHandler::Callback(a), EventHandler::Callback(b)) => Rc::ptr_eq(a, b),
            (EventHandler::Bound(a), EventHandler::Bound(b)) => Rc::ptr_eq(a, b),
            (EventHandler::Method(a), EventHandler::Method(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventHandler::Callback(_) => f.write_str("Callback"),
            EventHandler::Bound(_) => f.write_str("Bound"),
            EventHandler::Method(name) => write!(f, "Method({})", name),
        }
    }
}

/// Bind one handler on `el`.
///
/// The host component is captured weakly, so a listener left behind on the
/// surface never keeps its component alive.
pub fn add_event_listener(
    surface: &dyn Surface,
    el: NodeId,
    event: &str,
    handler: &EventHandler,
    host: Option<&ComponentRef>,
) -> Result<ListenerId> {
    let handler = handler.clone();
    let host = host.map(ComponentRef::downgrade);
    let listener: Listener = Rc::new(move |event: &Event| {
        let host = host.as_ref().and_then(|weak| weak.upgrade());
        if let Err(err) = handler.invoke(host.as_ref(), event) {
            tracing::error!(event = %event.name, node = event.target, "event handler failed: {}", err);
        }
    });
    Ok(surface.add_event_listener(el, event, listener)?)
}

/// Bind every handler of an `on` map, returning the listener handles by name.
pub fn add_event_listeners(
    surface: &dyn Surface,
    el: NodeId,
    handlers: &BTreeMap<CompactString, EventHandler>,
    host: Option<&ComponentRef>,
) -> Result<FxHashMap<CompactString, ListenerId>> {
    let mut added = FxHashMap::default();
    for (event, handler) in handlers {
        let id = add_event_listener(surface, el, event, handler, host)?;
        added.insert(event.clone(), id);
    }
    Ok(added)
}

/// Unbind every listener in `listeners`.
pub fn remove_event_listeners(
    surface: &dyn Surface,
    el: NodeId,
    listeners: &FxHashMap<CompactString, ListenerId>,
) -> Result<()> {
    for (event, &id) in listeners {
        surface.remove_event_listener(el, event, id)?;
    }
    Ok(())
}
