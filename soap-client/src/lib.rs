//! Private SOAP client for UPnP media renderer communication
//!
//! This crate provides a minimal SOAP client for invoking actions on UPnP
//! devices. It also supports GENA event subscriptions using the
//! SUBSCRIBE/UNSUBSCRIBE methods.

mod error;

pub use error::SoapError;

use std::time::Duration;
use quick_xml::escape::escape;
use xmltree::{Element, XMLNode};

/// Response from a GENA subscription request
#[derive(Debug, Clone)]
pub struct SubscriptionResponse {
    /// Subscription ID returned by the device
    pub sid: String,
    /// Actual timeout granted by the device (in seconds)
    pub timeout_seconds: u32,
}

/// A minimal SOAP client for UPnP device communication
#[derive(Debug, Clone)]
pub struct SoapClient {
    agent: ureq::Agent,
}

impl SoapClient {
    /// Create a new SOAP client with default timeouts (5s connect, 10s read)
    pub fn new() -> Self {
        Self::with_timeouts(Duration::from_secs(5), Duration::from_secs(10))
    }

    /// Create a SOAP client with explicit connect and read timeouts
    pub fn with_timeouts(connect: Duration, read: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout_connect(connect)
                .timeout_read(read)
                .build(),
        }
    }

    /// Invoke `action` on the service at `control_url` and return the
    /// `<ActionResponse>` element.
    ///
    /// Argument values are XML-escaped; `None` produces an empty element.
    pub fn call(
        &self,
        control_url: &str,
        service_urn: &str,
        action: &str,
        arguments: &[(String, Option<String>)],
    ) -> Result<Element, SoapError> {
        let body = build_envelope(service_urn, action, arguments);
        let soap_action = format!("\"{}#{}\"", service_urn, action);

        tracing::trace!(url = control_url, action, "sending SOAP request");

        let xml_text = match self
            .agent
            .post(control_url)
            .set("Content-Type", "text/xml; charset=\"utf-8\"")
            .set("SOAPACTION", &soap_action)
            .send_string(&body)
        {
            Ok(response) => response
                .into_string()
                .map_err(|e| SoapError::Network(e.to_string()))?,
            // Devices report UPnP errors as HTTP 500 with a fault envelope
            Err(ureq::Error::Status(status, response)) => {
                let text = response.into_string().unwrap_or_default();
                return match Element::parse(text.as_bytes()) {
                    Ok(xml) => match extract_fault(&xml) {
                        Some(fault) => Err(fault),
                        None => Err(SoapError::Network(format!("HTTP {}", status))),
                    },
                    Err(_) => Err(SoapError::Network(format!("HTTP {}", status))),
                };
            }
            Err(e) => return Err(SoapError::Network(e.to_string())),
        };

        let xml = Element::parse(xml_text.as_bytes())
            .map_err(|e| SoapError::Parse(e.to_string()))?;

        extract_response(&xml, action)
    }

    /// Subscribe to GENA events for a service
    ///
    /// # Arguments
    /// * `event_url` - Full event subscription URL of the service
    /// * `callback_url` - URL where events should be sent
    /// * `timeout_seconds` - Requested subscription timeout in seconds
    ///
    /// # Returns
    /// A `SubscriptionResponse` containing the SID and actual timeout
    pub fn subscribe(
        &self,
        event_url: &str,
        callback_url: &str,
        timeout_seconds: u32,
    ) -> Result<SubscriptionResponse, SoapError> {
        let response = self
            .agent
            .request("SUBSCRIBE", event_url)
            .set("CALLBACK", &format!("<{}>", callback_url))
            .set("NT", "upnp:event")
            .set("TIMEOUT", &format!("Second-{}", timeout_seconds))
            .call()
            .map_err(|e| SoapError::Network(e.to_string()))?;

        if response.status() != 200 {
            return Err(SoapError::Network(format!(
                "SUBSCRIBE failed: HTTP {}",
                response.status()
            )));
        }

        let sid = response
            .header("SID")
            .ok_or_else(|| SoapError::Parse("Missing SID header in SUBSCRIBE response".to_string()))?
            .to_string();

        let timeout_seconds = response
            .header("TIMEOUT")
            .and_then(parse_timeout_header)
            .unwrap_or(timeout_seconds);

        Ok(SubscriptionResponse {
            sid,
            timeout_seconds,
        })
    }

    /// Renew an existing GENA subscription, returning the granted timeout
    pub fn renew_subscription(
        &self,
        event_url: &str,
        sid: &str,
        timeout_seconds: u32,
    ) -> Result<u32, SoapError> {
        let response = self
            .agent
            .request("SUBSCRIBE", event_url)
            .set("SID", sid)
            .set("TIMEOUT", &format!("Second-{}", timeout_seconds))
            .call()
            .map_err(|e| SoapError::Network(e.to_string()))?;

        if response.status() != 200 {
            return Err(SoapError::Network(format!(
                "SUBSCRIBE renewal failed: HTTP {}",
                response.status()
            )));
        }

        Ok(response
            .header("TIMEOUT")
            .and_then(parse_timeout_header)
            .unwrap_or(timeout_seconds))
    }

    /// Cancel a GENA subscription
    pub fn unsubscribe(&self, event_url: &str, sid: &str) -> Result<(), SoapError> {
        let response = self
            .agent
            .request("UNSUBSCRIBE", event_url)
            .set("SID", sid)
            .call()
            .map_err(|e| SoapError::Network(e.to_string()))?;

        if response.status() != 200 {
            return Err(SoapError::Network(format!(
                "UNSUBSCRIBE failed: HTTP {}",
                response.status()
            )));
        }

        Ok(())
    }
}

impl Default for SoapClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Flatten the children of an action response element into
/// `(name, text)` pairs. Elements without text yield an empty string.
pub fn output_arguments(response: &Element) -> Vec<(String, String)> {
    response
        .children
        .iter()
        .filter_map(|node| match node {
            XMLNode::Element(child) => Some((
                child.name.clone(),
                child.get_text().map(|t| t.into_owned()).unwrap_or_default(),
            )),
            _ => None,
        })
        .collect()
}

fn build_envelope(service_urn: &str, action: &str, arguments: &[(String, Option<String>)]) -> String {
    let mut payload = String::new();
    for (name, value) in arguments {
        let value = value.as_deref().unwrap_or("");
        payload.push_str(&format!("<{name}>{}</{name}>", escape(value), name = name));
    }

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8"?>"#,
            r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">"#,
            r#"<s:Body><u:{action} xmlns:u="{service_urn}">{payload}</u:{action}></s:Body>"#,
            r#"</s:Envelope>"#
        ),
        action = action,
        service_urn = service_urn,
        payload = payload
    )
}

fn parse_timeout_header(value: &str) -> Option<u32> {
    value.strip_prefix("Second-")?.trim().parse::<u32>().ok()
}

fn extract_fault(xml: &Element) -> Option<SoapError> {
    let fault = xml.get_child("Body")?.get_child("Fault")?;
    let upnp_error = fault
        .get_child("detail")
        .and_then(|d| d.get_child("UPnPError").or_else(|| d.get_child("UpnPError")));

    let code = upnp_error
        .and_then(|e| e.get_child("errorCode"))
        .and_then(|c| c.get_text())
        .and_then(|t| t.trim().parse::<u16>().ok())
        .unwrap_or(500);
    let description = upnp_error
        .and_then(|e| e.get_child("errorDescription"))
        .and_then(|d| d.get_text())
        .map(|t| t.trim().to_string())
        .unwrap_or_default();

    Some(SoapError::Fault { code, description })
}

fn extract_response(xml: &Element, action: &str) -> Result<Element, SoapError> {
    let body = xml
        .get_child("Body")
        .ok_or_else(|| SoapError::Parse("Missing SOAP Body".to_string()))?;

    if let Some(fault) = extract_fault(xml) {
        return Err(fault);
    }

    let response_name = format!("{}Response", action);
    body.get_child(response_name.as_str())
        .cloned()
        .ok_or_else(|| SoapError::Parse(format!("Missing {} element", response_name)))
}
