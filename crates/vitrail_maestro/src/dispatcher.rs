//! Publish/subscribe command dispatcher.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use vitrail_atelier::Result;
use vitrail_carton::{CompactString, FxHashMap};

/// Handler for a named command, invoked with the command payload.
pub type CommandHandler = Rc<dyn Fn(&Value) -> Result<()>>;

/// Handler run once after every dispatched command.
pub type AfterCommandHandler = Rc<dyn Fn() -> Result<()>>;

/// Dispatcher options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DispatcherOptions {
    /// Log a warning when a command has no handlers
    pub warn_unhandled: bool,
}

impl Default for DispatcherOptions {
    fn default() -> Self {
        Self {
            warn_unhandled: true,
        }
    }
}

#[derive(Default)]
struct Registry {
    commands: FxHashMap<CompactString, Vec<CommandHandler>>,
    after: Vec<AfterCommandHandler>,
}

struct DispatcherInner {
    options: DispatcherOptions,
    registry: RefCell<Registry>,
}

/// Routes named commands to their handlers.
///
/// Handlers for a command run in registration order, then every
/// after-command handler runs, whether or not the command was handled. Both
/// lists are snapshotted when a dispatch starts: handlers added or removed
/// while it runs take effect from the next dispatch.
#[derive(Clone)]
pub struct Dispatcher(Rc<DispatcherInner>);

impl Dispatcher {
    pub fn new() -> Self {
        Self::with_options(DispatcherOptions::default())
    }

    pub fn with_options(options: DispatcherOptions) -> Self {
        Dispatcher(Rc::new(DispatcherInner {
            options,
            registry: RefCell::new(Registry::default()),
        }))
    }

    pub fn options(&self) -> &DispatcherOptions {
        &self.0.options
    }

    /// Register `handler` for `command`.
    ///
    /// Registering the same handler (by identity) twice for one command is a
    /// no-op; the second call returns an inert subscription.
    pub fn subscribe(
        &self,
        command: impl Into<CompactString>,
        handler: CommandHandler,
    ) -> Subscription {
        let command = command.into();
        let mut registry = self.0.registry.borrow_mut();
        let handlers = registry.commands.entry(command.clone()).or_default();
        if handlers.iter().any(|h| Rc::ptr_eq(h, &handler)) {
            return Subscription::inert();
        }
        handlers.push(handler.clone());

        Subscription {
            dispatcher: Rc::downgrade(&self.0),
            kind: SubscriptionKind::Command(command, handler),
        }
    }

    /// Register `handler` to run after every command.
    pub fn after_every_command(&self, handler: AfterCommandHandler) -> Subscription {
        self.0.registry.borrow_mut().after.push(handler.clone());
        Subscription {
            dispatcher: Rc::downgrade(&self.0),
            kind: SubscriptionKind::After(handler),
        }
    }

    /// Run the handlers of `command`, then every after-command handler.
    ///
    /// The first failing handler aborts the dispatch and its error is
    /// returned.
    pub fn dispatch(&self, command: &str, payload: &Value) -> Result<()> {
        let (handlers, after) = {
            let registry = self.0.registry.borrow();
            let handlers = registry.commands.get(command).cloned().unwrap_or_default();
            (handlers, registry.after.clone())
        };

        if handlers.is_empty() {
            if self.0.options.warn_unhandled {
                tracing::warn!(command, "no handlers for command");
            }
        } else {
            tracing::debug!(command, handlers = handlers.len(), "dispatch");
        }

        for handler in &handlers {
            handler(payload)?;
        }
        for handler in &after {
            handler()?;
        }
        Ok(())
    }

    /// Number of handlers registered for `command`.
    pub fn handler_count(&self, command: &str) -> usize {
        self.0
            .registry
            .borrow()
            .commands
            .get(command)
            .map_or(0, Vec::len)
    }

    pub fn after_handler_count(&self) -> usize {
        self.0.registry.borrow().after.len()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.0.registry.borrow();
        let mut commands: Vec<&str> = registry.commands.keys().map(|c| c.as_str()).collect();
        commands.sort_unstable();
        f.debug_struct("Dispatcher")
            .field("options", &self.0.options)
            .field("commands", &commands)
            .field("after", &registry.after.len())
            .finish()
    }
}

enum SubscriptionKind {
    Inert,
    Command(CompactString, CommandHandler),
    After(AfterCommandHandler),
}

/// Handle returned by registration; [`Subscription::unsubscribe`] removes
/// the handler again.
///
/// Dropping a subscription keeps the handler registered.
pub struct Subscription {
    dispatcher: Weak<DispatcherInner>,
    kind: SubscriptionKind,
}

impl Subscription {
    fn inert() -> Self {
        Subscription {
            dispatcher: Weak::new(),
            kind: SubscriptionKind::Inert,
        }
    }

    pub fn is_inert(&self) -> bool {
        matches!(self.kind, SubscriptionKind::Inert)
    }

    /// Remove the handler. A no-op for inert subscriptions and once the
    /// dispatcher is gone.
    pub fn unsubscribe(self) {
        let Some(dispatcher) = self.dispatcher.upgrade() else {
            return;
        };
        let mut registry = dispatcher.registry.borrow_mut();
        match self.kind {
            SubscriptionKind::Inert => {}
            SubscriptionKind::Command(command, handler) => {
                if let Some(handlers) = registry.commands.get_mut(&command) {
                    if let Some(index) = handlers.iter().position(|h| Rc::ptr_eq(h, &handler)) {
                        handlers.remove(index);
                    }
                }
            }
            SubscriptionKind::After(handler) => {
                if let Some(index) = registry.after.iter().position(|h| Rc::ptr_eq(h, &handler)) {
                    registry.after.remove(index);
                }
            }
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SubscriptionKind::Inert => f.write_str("Subscription(inert)"),
            SubscriptionKind::Command(command, _) => write!(f, "Subscription({})", command),
            SubscriptionKind::After(_) => f.write_str("Subscription(after)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use serde_json::json;
    use vitrail_atelier::RuntimeError;

    use super::*;

    fn recorder(log: &Rc<RefCell<Vec<String>>>, label: &'static str) -> CommandHandler {
        let log = log.clone();
        Rc::new(move |payload: &Value| -> Result<()> {
            log.borrow_mut().push(format!("{label}:{payload}"));
            Ok(())
        })
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let dispatcher = Dispatcher::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let _a = dispatcher.subscribe("add", recorder(&log, "a"));
        let _b = dispatcher.subscribe("add", recorder(&log, "b"));
        let after_log = log.clone();
        let _after = dispatcher.after_every_command(Rc::new(move || -> Result<()> {
            after_log.borrow_mut().push("after".into());
            Ok(())
        }));

        dispatcher.dispatch("add", &json!(1)).unwrap();
        assert_eq!(*log.borrow(), vec!["a:1", "b:1", "after"]);
    }

    #[test]
    fn test_after_handlers_run_without_subscribers() {
        let dispatcher = Dispatcher::new();
        let runs = Rc::new(Cell::new(0));
        let counter = runs.clone();
        let _after = dispatcher.after_every_command(Rc::new(move || -> Result<()> {
            counter.set(counter.get() + 1);
            Ok(())
        }));

        dispatcher.dispatch("nobody-listens", &Value::Null).unwrap();
        assert_eq!(runs.get(), 1);
        dispatcher.dispatch("nobody-listens", &Value::Null).unwrap();
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_subscribe_is_idempotent() {
        let dispatcher = Dispatcher::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let handler = recorder(&log, "x");

        let first = dispatcher.subscribe("go", handler.clone());
        let second = dispatcher.subscribe("go", handler);
        assert!(!first.is_inert());
        assert!(second.is_inert());
        assert_eq!(dispatcher.handler_count("go"), 1);

        second.unsubscribe();
        assert_eq!(dispatcher.handler_count("go"), 1);
        first.unsubscribe();
        assert_eq!(dispatcher.handler_count("go"), 0);

        dispatcher.dispatch("go", &Value::Null).unwrap();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_unsubscribe_during_dispatch_uses_snapshot() {
        let dispatcher = Dispatcher::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let remover = {
            let slot = slot.clone();
            let log = log.clone();
            Rc::new(move |_: &Value| -> Result<()> {
                log.borrow_mut().push("remover".to_string());
                if let Some(subscription) = slot.borrow_mut().take() {
                    subscription.unsubscribe();
                }
                Ok(())
            })
        };
        let _remover = dispatcher.subscribe("tick", remover);
        *slot.borrow_mut() = Some(dispatcher.subscribe("tick", recorder(&log, "second")));

        dispatcher.dispatch("tick", &Value::Null).unwrap();
        assert_eq!(*log.borrow(), vec!["remover", "second:null"]);

        dispatcher.dispatch("tick", &Value::Null).unwrap();
        assert_eq!(*log.borrow(), vec!["remover", "second:null", "remover"]);
    }

    #[test]
    fn test_handler_error_aborts_dispatch() {
        let dispatcher = Dispatcher::new();
        let runs = Rc::new(Cell::new(0));
        let counter = runs.clone();
        let _fail = dispatcher.subscribe(
            "save",
            Rc::new(|_: &Value| -> Result<()> { Err(RuntimeError::handler("disk full")) }),
        );
        let _after = dispatcher.after_every_command(Rc::new(move || -> Result<()> {
            counter.set(counter.get() + 1);
            Ok(())
        }));

        let err = dispatcher.dispatch("save", &Value::Null).unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"Handler failed: disk full");
        assert_eq!(runs.get(), 0);
    }

    #[test]
    fn test_options_deserialize() {
        let options: DispatcherOptions =
            serde_json::from_str(r#"{"warnUnhandled": false}"#).unwrap();
        assert!(!options.warn_unhandled);
        let options: DispatcherOptions = serde_json::from_str("{}").unwrap();
        assert!(options.warn_unhandled);
    }
}
