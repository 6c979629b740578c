//! Flattening of GENA property sets into [`Notification`]s.
//!
//! AVTransport and RenderingControl nest their state inside an escaped
//! `LastChange` document:
//!
//! ```xml
//! <e:propertyset xmlns:e="urn:schemas-upnp-org:event-1-0">
//!   <e:property>
//!     <LastChange>&lt;Event xmlns="urn:schemas-upnp-org:metadata-1-0/AVT/"&gt;
//!       &lt;InstanceID val="0"&gt;&lt;TransportState val="PLAYING"/&gt;&lt;/InstanceID&gt;
//!     &lt;/Event&gt;</LastChange>
//!   </e:property>
//! </e:propertyset>
//! ```
//!
//! Every variable under every `InstanceID` becomes one entry keyed by
//! element name with the `val` attribute as value. Plain properties (as
//! ConnectionManager sends them) become entries with their text content.

use xmltree::{Element, XMLNode};

use super::Notification;
use crate::error::{RendererError, Result};

/// Decode a NOTIFY body into a flat change set
pub fn parse_property_set(body: &str) -> Result<Notification> {
    let root = Element::parse(body.as_bytes())
        .map_err(|e| RendererError::decoding(format!("invalid property set: {}", e)))?;

    if root.name != "propertyset" {
        return Err(RendererError::decoding(format!(
            "expected propertyset, found {}",
            root.name
        )));
    }

    let mut notification = Notification::new();
    for property in child_elements(&root).filter(|e| e.name == "property") {
        for variable in child_elements(property) {
            let text = variable.get_text().map(|t| t.into_owned()).unwrap_or_default();
            if variable.name == "LastChange" {
                flatten_last_change(&text, &mut notification)?;
            } else {
                notification.insert(variable.name.clone(), text);
            }
        }
    }

    Ok(notification)
}

fn flatten_last_change(last_change: &str, notification: &mut Notification) -> Result<()> {
    if last_change.trim().is_empty() {
        return Ok(());
    }

    let event = Element::parse(last_change.as_bytes())
        .map_err(|e| RendererError::decoding(format!("invalid LastChange document: {}", e)))?;

    for instance in child_elements(&event).filter(|e| e.name == "InstanceID") {
        for variable in child_elements(instance) {
            let value = variable.attributes.get("val").cloned().unwrap_or_default();
            notification.insert(variable.name.clone(), value);
        }
    }

    Ok(())
}

fn child_elements(element: &Element) -> impl Iterator<Item = &Element> {
    element.children.iter().filter_map(|node| match node {
        XMLNode::Element(child) => Some(child),
        _ => None,
    })
}
