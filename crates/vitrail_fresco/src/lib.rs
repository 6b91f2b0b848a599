//! Fresco - the presentation surface for Vitrail.
//!
//! The reconciler never touches a rendering backend directly. Everything it does
//! to the live tree goes through the [`Surface`] trait defined here: create a
//! node, attach it, set an attribute, bind a listener.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │             vitrail_atelier (mount / patch)              │
//! └─────────────────────────────────────────────────────────┘
//!                           │  Surface trait
//!                           ▼
//! ┌───────────────────────┐   ┌───────────────────────────┐
//! │     MemorySurface     │   │   host surfaces (DOM,     │
//! │ (arena + mutation log)│   │    TUI, native widgets)   │
//! └───────────────────────┘   └───────────────────────────┘
//! ```
//!
//! [`MemorySurface`] is the in-memory implementation shipped with the crate. It
//! records every mutation it receives, which makes it the surface of choice for
//! tests and for inspecting what a patch pass actually did.

mod event;
mod memory;
mod mutation;
mod node;
mod surface;

pub use event::Event;
pub use memory::MemorySurface;
pub use mutation::Mutation;
pub use node::{ElementData, NodeKind, SurfaceNode};
pub use surface::{AttrValue, Listener, ListenerId, NodeId, Surface, SurfaceError, SurfaceRef};

/// Fresco version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
