//! Maestro - Command dispatcher and application shell for Vitrail.
//!
//! ```
//! use std::rc::Rc;
//!
//! use serde_json::{json, Value};
//! use vitrail_atelier::{h, Props, SurfaceRef};
//! use vitrail_fresco::MemorySurface;
//! use vitrail_maestro::{create_app, AppDefinition};
//!
//! let memory = Rc::new(MemorySurface::new());
//! let root = memory.create_root();
//! let surface: SurfaceRef = memory.clone();
//!
//! let definition = AppDefinition::new(0_i64, |count: &i64, _emit| {
//!     h("p", Props::new(), [count.to_string()])
//! })
//! .reducer("add", |count: &i64, by: &Value| count + by.as_i64().unwrap_or(0));
//!
//! let app = create_app(definition, surface);
//! app.mount(root).unwrap();
//! app.emit("add", json!(3)).unwrap();
//! assert_eq!(memory.inner_html(root).unwrap(), "<p>3</p>");
//! ```

pub mod app;
pub mod dispatcher;

pub use app::{create_app, create_app_with_options, App, AppDefinition, AppOptions, Emitter};
pub use dispatcher::{
    AfterCommandHandler, CommandHandler, Dispatcher, DispatcherOptions, Subscription,
};
