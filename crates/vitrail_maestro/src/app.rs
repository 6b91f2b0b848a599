//! Application shell.
//!
//! An app owns a state value, a view function and a set of reducers. Each
//! reducer is subscribed to the app's own [`Dispatcher`] under its command
//! name; after every command the view is rendered again and patched against
//! the mounted tree.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use vitrail_atelier::{destroy_dom, mount_dom, patch_dom, Result, RuntimeError, VNode};
use vitrail_carton::CompactString;
use vitrail_fresco::{NodeId, SurfaceRef};

use crate::dispatcher::{Dispatcher, DispatcherOptions, Subscription};

type ViewFn<S> = dyn Fn(&S, &Emitter) -> VNode;
type ReducerFn<S> = dyn Fn(&S, &Value) -> S;

const APP_NAME: &str = "app";

/// Application options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppOptions {
    pub dispatcher: DispatcherOptions,
}

/// Initial state, view and reducers of an app.
pub struct AppDefinition<S> {
    state: S,
    view: Box<ViewFn<S>>,
    reducers: BTreeMap<CompactString, Rc<ReducerFn<S>>>,
}

impl<S> AppDefinition<S> {
    pub fn new(state: S, view: impl Fn(&S, &Emitter) -> VNode + 'static) -> Self {
        Self {
            state,
            view: Box::new(view),
            reducers: BTreeMap::new(),
        }
    }

    /// Handle `command` by replacing the state with `reducer(state, payload)`.
    ///
    /// A later reducer for the same command replaces the earlier one.
    pub fn reducer(
        mut self,
        command: impl Into<CompactString>,
        reducer: impl Fn(&S, &Value) -> S + 'static,
    ) -> Self {
        self.reducers.insert(command.into(), Rc::new(reducer));
        self
    }
}

/// Handle given to the view for triggering commands.
#[derive(Clone, Debug)]
pub struct Emitter {
    dispatcher: Dispatcher,
}

impl Emitter {
    /// Dispatch `command` with `payload`.
    pub fn emit(&self, command: &str, payload: Value) -> Result<()> {
        self.dispatcher.dispatch(command, &payload)
    }
}

struct AppInner<S> {
    state: RefCell<S>,
    view: Box<ViewFn<S>>,
    surface: SurfaceRef,
    dispatcher: Dispatcher,
    parent: Cell<Option<NodeId>>,
    vdom: RefCell<Option<VNode>>,
}

impl<S> AppInner<S> {
    fn emitter(&self) -> Emitter {
        Emitter {
            dispatcher: self.dispatcher.clone(),
        }
    }

    fn view(&self) -> VNode {
        let state = self.state.borrow();
        (self.view)(&state, &self.emitter())
    }

    fn reduce(&self, reducer: &ReducerFn<S>, payload: &Value) {
        let next = {
            let state = self.state.borrow();
            reducer(&state, payload)
        };
        *self.state.borrow_mut() = next;
    }

    /// Re-render and patch. Does nothing while the app is not mounted.
    fn render(&self) -> Result<()> {
        let Some(parent) = self.parent.get() else {
            tracing::trace!("app not mounted, skipping render");
            return Ok(());
        };
        let Some(old) = self.vdom.borrow_mut().take() else {
            return Ok(());
        };

        let new = self.view();
        let vdom = patch_dom(old, new, &self.surface, parent, None)?;
        *self.vdom.borrow_mut() = Some(vdom);
        Ok(())
    }
}

/// A running application.
pub struct App<S> {
    inner: Rc<AppInner<S>>,
    subscriptions: Vec<Subscription>,
}

/// Create an app rendering onto `surface` with default options.
pub fn create_app<S: 'static>(definition: AppDefinition<S>, surface: SurfaceRef) -> App<S> {
    create_app_with_options(definition, surface, AppOptions::default())
}

/// Create an app rendering onto `surface`.
pub fn create_app_with_options<S: 'static>(
    definition: AppDefinition<S>,
    surface: SurfaceRef,
    options: AppOptions,
) -> App<S> {
    let AppDefinition {
        state,
        view,
        reducers,
    } = definition;

    let dispatcher = Dispatcher::with_options(options.dispatcher);
    let inner = Rc::new(AppInner {
        state: RefCell::new(state),
        view,
        surface,
        dispatcher: dispatcher.clone(),
        parent: Cell::new(None),
        vdom: RefCell::new(None),
    });

    let mut subscriptions = Vec::with_capacity(reducers.len() + 1);

    let weak: Weak<AppInner<S>> = Rc::downgrade(&inner);
    subscriptions.push(dispatcher.after_every_command(Rc::new(move || -> Result<()> {
        match weak.upgrade() {
            Some(app) => app.render(),
            None => Ok(()),
        }
    })));

    for (command, reducer) in reducers {
        let weak: Weak<AppInner<S>> = Rc::downgrade(&inner);
        subscriptions.push(dispatcher.subscribe(
            command,
            Rc::new(move |payload: &Value| -> Result<()> {
                if let Some(app) = weak.upgrade() {
                    app.reduce(&*reducer, payload);
                }
                Ok(())
            }),
        ));
    }

    App {
        inner,
        subscriptions,
    }
}

impl<S> App<S> {
    /// Render the view and mount it into `parent`.
    pub fn mount(&self, parent: NodeId) -> Result<()> {
        if self.is_mounted() {
            return Err(RuntimeError::AlreadyMounted(APP_NAME.into()));
        }
        tracing::debug!(parent, "mount app");

        let mut vdom = self.inner.view();
        mount_dom(&mut vdom, &self.inner.surface, parent, None, None)?;

        *self.inner.vdom.borrow_mut() = Some(vdom);
        self.inner.parent.set(Some(parent));
        Ok(())
    }

    /// Destroy the tree and drop every subscription of the app.
    pub fn unmount(self) -> Result<()> {
        tracing::debug!("unmount app");

        let mut vdom = self
            .inner
            .vdom
            .borrow_mut()
            .take()
            .ok_or_else(|| RuntimeError::NotMounted(APP_NAME.into()))?;
        destroy_dom(&mut vdom, &self.inner.surface)?;
        self.inner.parent.set(None);

        for subscription in self.subscriptions {
            subscription.unsubscribe();
        }
        Ok(())
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.parent.get().is_some()
    }

    /// Dispatch `command` on the app's dispatcher.
    pub fn emit(&self, command: &str, payload: Value) -> Result<()> {
        self.inner.dispatcher.dispatch(command, &payload)
    }

    pub fn emitter(&self) -> Emitter {
        self.inner.emitter()
    }

    /// The app's own dispatcher, for additional subscriptions.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> S
    where
        S: Clone,
    {
        self.inner.state.borrow().clone()
    }
}

impl<S: fmt::Debug> fmt::Debug for App<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("state", &self.inner.state)
            .field("mounted", &self.is_mounted())
            .field("dispatcher", &self.inner.dispatcher)
            .finish()
    }
}
