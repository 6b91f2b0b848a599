//! Applying props to surface elements.

use vitrail_fresco::{AttrValue, NodeId, Surface};

use crate::errors::Result;
use crate::props::{ClassValue, Props};

/// Apply class, style and plain attributes of `props` to a fresh element.
pub fn set_attributes(surface: &dyn Surface, el: NodeId, props: &Props) -> Result<()> {
    if let Some(class) = &props.class {
        set_class(surface, el, class)?;
    }
    for (name, value) in &props.style {
        set_style(surface, el, name, value)?;
    }
    for (name, value) in &props.attrs {
        set_attribute(surface, el, name, value)?;
    }
    Ok(())
}

/// Replace the element's class list.
pub fn set_class(surface: &dyn Surface, el: NodeId, class: &ClassValue) -> Result<()> {
    let tokens = class.tokens();
    if !tokens.is_empty() {
        surface.set_class_list(el, &tokens)?;
    }
    Ok(())
}

pub fn set_style(surface: &dyn Surface, el: NodeId, name: &str, value: &str) -> Result<()> {
    Ok(surface.set_style_property(el, name, value)?)
}

pub fn remove_style(surface: &dyn Surface, el: NodeId, name: &str) -> Result<()> {
    Ok(surface.clear_style_property(el, name)?)
}

pub fn set_attribute(surface: &dyn Surface, el: NodeId, name: &str, value: &AttrValue) -> Result<()> {
    Ok(surface.set_attribute(el, name, value)?)
}

pub fn remove_attribute(surface: &dyn Surface, el: NodeId, name: &str) -> Result<()> {
    Ok(surface.remove_attribute(el, name)?)
}
