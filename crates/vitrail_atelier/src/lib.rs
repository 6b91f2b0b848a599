//! Atelier - The reconciliation workshop for Vitrail.
//!
//! This crate turns node descriptions into surface nodes and keeps them in
//! sync:
//! - `h`, `h_string`, `h_fragment` and `h_component` build descriptions
//! - `mount_dom` and `destroy_dom` materialize and tear down trees
//! - `patch_dom` reconciles a mounted tree against a new description
//! - `define_component` creates stateful components that re-render themselves

pub mod arrays;
pub mod attributes;
pub mod component;
pub mod destroy;
pub mod errors;
pub mod events;
pub mod h;
pub mod mount;
pub mod nodes_equal;
pub mod objects;
pub mod patch;
pub mod props;

pub use arrays::{arrays_diff, arrays_diff_sequence, ArrayDiffOp, ArraysDiff};
pub use component::{
    define_component, ComponentDef, ComponentDefBuilder, ComponentProps, ComponentRef,
    ComponentState, WeakComponentRef, RESERVED_METHOD_NAMES,
};
pub use destroy::destroy_dom;
pub use errors::{Result, RuntimeError};
pub use events::{add_event_listener, add_event_listeners, remove_event_listeners, EventHandler};
pub use h::{
    extract_children, h, h_component, h_fragment, h_string, lipsum, Child, ComponentVNode,
    ElementVNode, FragmentVNode, TextVNode, VNode,
};
pub use mount::mount_dom;
pub use nodes_equal::nodes_equal;
pub use objects::{objects_diff, ObjectsDiff};
pub use patch::patch_dom;
pub use props::{ClassValue, Props};

// Re-export surface types used in signatures
pub use vitrail_fresco::{Event, NodeId, Surface, SurfaceRef};
