//! Runtime errors.

use thiserror::Error;
use vitrail_carton::CompactString;
use vitrail_fresco::SurfaceError;

/// Errors raised by the reconciler and the component model.
///
/// All variants except `Surface` and `Handler` are usage errors: they point at a
/// bug in the calling code and nothing is rolled back when they are returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("Component '{0}' is already mounted")]
    AlreadyMounted(CompactString),

    #[error("Component '{0}' is not mounted")]
    NotMounted(CompactString),

    #[error("Method \"{method}\" already exists in component '{component}'")]
    ReservedMethodName {
        component: CompactString,
        method: CompactString,
    },

    #[error("Component '{component}' has no method \"{method}\"")]
    UnknownMethod {
        component: CompactString,
        method: CompactString,
    },

    #[error("Handler for '{event}' needs a host component but was bound without one")]
    MissingHost { event: CompactString },

    #[error("Node description has no surface node (was it mounted?)")]
    NotMaterialized,

    #[error("No old child at original index {0:?}")]
    MissingChild(Option<usize>),

    #[error("Handler failed: {0}")]
    Handler(String),

    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

impl RuntimeError {
    /// Convenience constructor for application handler failures.
    pub fn handler(message: impl std::fmt::Display) -> Self {
        RuntimeError::Handler(message.to_string())
    }

    /// Whether this error reports misuse of the runtime API.
    pub fn is_usage_error(&self) -> bool {
        !matches!(self, RuntimeError::Surface(_) | RuntimeError::Handler(_))
    }
}

pub type Result<T, E = RuntimeError> = std::result::Result<T, E>;
