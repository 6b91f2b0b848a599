//! Element props: plain attributes plus the reserved `class`, `style` and `on`.

use std::collections::BTreeMap;
use std::fmt;

use vitrail_carton::{class_tokens, non_blank_tokens, CompactString};
use vitrail_fresco::AttrValue;

use crate::events::EventHandler;

/// The reserved `class` prop: a whitespace separated string or a token list.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassValue {
    Str(CompactString),
    List(Vec<CompactString>),
}

impl ClassValue {
    /// Flat list of non-blank class tokens.
    pub fn tokens(&self) -> Vec<CompactString> {
        match self {
            ClassValue::Str(s) => class_tokens(s),
            ClassValue::List(list) => non_blank_tokens(list),
        }
    }
}

impl From<&str> for ClassValue {
    fn from(value: &str) -> Self {
        ClassValue::Str(value.into())
    }
}

impl From<String> for ClassValue {
    fn from(value: String) -> Self {
        ClassValue::Str(value.into())
    }
}

impl From<Vec<&str>> for ClassValue {
    fn from(value: Vec<&str>) -> Self {
        ClassValue::List(value.into_iter().map(CompactString::from).collect())
    }
}

impl From<Vec<CompactString>> for ClassValue {
    fn from(value: Vec<CompactString>) -> Self {
        ClassValue::List(value)
    }
}

impl<const N: usize> From<[&str; N]> for ClassValue {
    fn from(value: [&str; N]) -> Self {
        ClassValue::List(value.into_iter().map(CompactString::from).collect())
    }
}

/// Props of an element description.
///
/// Maps are ordered so that mount and patch touch the surface in a stable order.
#[derive(Clone, Default, PartialEq)]
pub struct Props {
    /// Non-reserved attributes
    pub attrs: BTreeMap<CompactString, AttrValue>,
    /// Reserved `class`
    pub class: Option<ClassValue>,
    /// Reserved `style`: property name to value
    pub style: BTreeMap<CompactString, CompactString>,
    /// Reserved `on`: event name to handler
    pub on: BTreeMap<CompactString, EventHandler>,
}

impl Props {
    /// Create empty props.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a plain attribute.
    pub fn attr(mut self, name: impl Into<CompactString>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Set the class.
    pub fn class(mut self, class: impl Into<ClassValue>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Set an inline style property.
    pub fn style(mut self, name: impl Into<CompactString>, value: impl Into<CompactString>) -> Self {
        self.style.insert(name.into(), value.into());
        self
    }

    /// Bind an event handler.
    pub fn on(mut self, event: impl Into<CompactString>, handler: EventHandler) -> Self {
        self.on.insert(event.into(), handler);
        self
    }

    /// Class tokens, empty when no class is set.
    pub fn class_tokens(&self) -> Vec<CompactString> {
        self.class.as_ref().map(ClassValue::tokens).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty() && self.class.is_none() && self.style.is_empty() && self.on.is_empty()
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Props")
            .field("attrs", &self.attrs)
            .field("class", &self.class)
            .field("style", &self.style)
            .field("on", &self.on.keys().collect::<Vec<_>>())
            .finish()
    }
}
