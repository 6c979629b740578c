//! The device control channel: the seam between renderer semantics and the wire.
//!
//! Everything above this module speaks in actions, argument records and
//! flattened state-variable change sets. A [`DeviceControlChannel`]
//! implementation carries those to a device. [`SoapControlChannel`] is the
//! HTTP implementation; tests and embedders can supply their own.

mod notify;
mod soap;

pub use notify::parse_property_set;
pub use soap::SoapControlChannel;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{RendererError, Result};
use crate::service::Service;

/// A flattened change set of state variables pushed by the device
///
/// The first notification after a subscription carries every evented
/// variable; later ones carry only what changed.
pub type Notification = BTreeMap<String, String>;

/// Callback invoked by the channel for every notification of a subscription
pub type NotificationHandler = Arc<dyn Fn(&Notification) + Send + Sync>;

/// Opaque handle identifying one subscription made through a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscription-{}", self.0)
    }
}

/// Ordered input arguments of a remote action
///
/// A `None` value is a null argument and is sent as an empty element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionArgs {
    entries: Vec<(String, Option<String>)>,
}

impl ActionArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an argument
    pub fn arg(mut self, name: &str, value: impl ToString) -> Self {
        self.entries.push((name.to_string(), Some(value.to_string())));
        self
    }

    /// Append a null argument
    pub fn null(mut self, name: &str) -> Self {
        self.entries.push((name.to_string(), None));
        self
    }

    /// Append the `InstanceID` argument every AVTransport and
    /// RenderingControl action starts with
    pub fn instance(self, instance_id: u32) -> Self {
        self.arg("InstanceID", instance_id)
    }

    /// Look up an argument. The outer `Option` is presence, the inner one nullness.
    pub fn get(&self, name: &str) -> Option<Option<&str>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_deref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_deref()))
    }

    pub fn into_entries(self) -> Vec<(String, Option<String>)> {
        self.entries
    }
}

/// Output arguments returned by a remote action, keyed by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionResponse {
    fields: BTreeMap<String, String>,
}

impl ActionResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly useful for tests and custom channels
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Get a field the caller cannot do without
    pub fn require(&self, name: &str) -> Result<&str> {
        self.get(name)
            .ok_or_else(|| RendererError::decoding(format!("response is missing the {} field", name)))
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn into_fields(self) -> BTreeMap<String, String> {
        self.fields
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ActionResponse {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Capabilities the renderer core needs from the outside world
///
/// Implementations own the transport: request/response framing for action
/// calls and the publish/subscribe mechanics for notifications. Timeouts are
/// theirs to impose as well.
#[async_trait]
pub trait DeviceControlChannel: Send + Sync {
    /// Invoke `action` on `service` and return its output arguments
    ///
    /// An action the device does not implement must be reported as
    /// [`RendererError::ActionNotSupported`].
    async fn invoke_action(&self, service: Service, action: &str, args: ActionArgs) -> Result<ActionResponse>;

    /// Start delivering `service` notifications to `handler`
    async fn subscribe(&self, service: Service, handler: NotificationHandler) -> Result<SubscriptionId>;

    /// Stop delivering notifications for a subscription made with [`subscribe`](Self::subscribe)
    async fn unsubscribe(&self, service: Service, subscription: SubscriptionId) -> Result<()>;
}

#[async_trait]
impl<T: DeviceControlChannel + ?Sized> DeviceControlChannel for Arc<T> {
    async fn invoke_action(&self, service: Service, action: &str, args: ActionArgs) -> Result<ActionResponse> {
        (**self).invoke_action(service, action, args).await
    }

    async fn subscribe(&self, service: Service, handler: NotificationHandler) -> Result<SubscriptionId> {
        (**self).subscribe(service, handler).await
    }

    async fn unsubscribe(&self, service: Service, subscription: SubscriptionId) -> Result<()> {
        (**self).unsubscribe(service, subscription).await
    }
}
