//! # Vitrail
//!
//! A small virtual-tree UI runtime written in Rust.
//!
//! This crate re-exports all Vitrail sub-crates for unified documentation and
//! adds configuration loading and tracing setup.
//!
//! ## Crates
//!
//! - [`carton`] - Shared utilities and collection re-exports
//! - [`fresco`] - Surface trait and the in-memory surface
//! - [`atelier`] - Node descriptions, reconciler and components
//! - [`maestro`] - Command dispatcher and application shell

/// Shared utilities and collection re-exports.
pub use vitrail_carton as carton;

/// Surface trait and the in-memory surface.
pub use vitrail_fresco as fresco;

/// Node descriptions, reconciler and components.
pub use vitrail_atelier as atelier;

/// Command dispatcher and application shell.
pub use vitrail_maestro as maestro;

pub mod config;
pub mod logging;

pub use config::{load_config, ConfigError, LoggingConfig, VitrailConfig, CONFIG_FILE_NAME};
pub use logging::init_tracing;

pub use vitrail_atelier::{
    define_component, h, h_component, h_fragment, h_string, ComponentRef, EventHandler, Props,
    RuntimeError, VNode,
};
pub use vitrail_fresco::{MemorySurface, Surface, SurfaceRef};
pub use vitrail_maestro::{create_app, create_app_with_options, App, AppDefinition, Emitter};
