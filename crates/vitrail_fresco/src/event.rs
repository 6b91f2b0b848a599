//! Input events delivered to listeners.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use vitrail_carton::CompactString;

use crate::surface::NodeId;

/// An input event raised by the host environment on a surface node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event name (`click`, `input`, ...)
    pub name: CompactString,
    /// Node the event was raised on
    pub target: NodeId,
    /// Event payload, e.g. the current value of an input
    #[serde(default)]
    pub detail: Value,
}

impl Event {
    /// Create an event without payload.
    pub fn new(name: impl Into<CompactString>, target: NodeId) -> Self {
        Self {
            name: name.into(),
            target,
            detail: Value::Null,
        }
    }

    /// Attach a payload.
    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = detail;
        self
    }

    /// Payload as a string, when it is one.
    pub fn detail_str(&self) -> Option<&str> {
        self.detail.as_str()
    }
}
