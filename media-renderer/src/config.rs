//! Configuration types for the media renderer client
//!
//! [`ChannelConfig`] controls how [`SoapControlChannel`](crate::channel::SoapControlChannel)
//! reaches a device. [`LoadOptions`] carries the per-call options of
//! [`MediaRendererClient::load`](crate::MediaRendererClient::load).

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::codec::Metadata;
use crate::error::{RendererError, Result};
use crate::service::Service;

/// Endpoint override for one service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    /// Control URL or path relative to the base URL
    pub control_path: String,
    /// Event subscription URL or path relative to the base URL
    pub event_path: String,
}

/// Configuration for the SOAP/GENA device channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Base URL of the device, e.g. `http://192.168.1.20:49152`
    /// Default: empty (must be set)
    pub base_url: String,

    /// URL of the embedding application's NOTIFY endpoint
    /// Default: none (subscriptions fail with a configuration error)
    pub callback_url: Option<String>,

    /// Requested GENA subscription timeout
    /// Default: 1800 seconds (30 minutes)
    #[serde(with = "duration_secs")]
    pub subscription_timeout: Duration,

    /// Connect timeout for each HTTP request
    /// Default: 5 seconds
    #[serde(with = "duration_secs")]
    pub connect_timeout: Duration,

    /// Read timeout for each HTTP request
    /// Default: 10 seconds
    #[serde(with = "duration_secs")]
    pub read_timeout: Duration,

    /// Endpoint overrides taken from the device description
    /// Default: empty (conventional paths from [`Service::info`])
    pub endpoints: HashMap<Service, ServiceEndpoint>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            callback_url: None,
            subscription_timeout: Duration::from_secs(1800),
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(10),
            endpoints: HashMap::new(),
        }
    }
}

impl ChannelConfig {
    /// Create a config for the device at `base_url` with default settings
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_callback_url(mut self, url: impl Into<String>) -> Self {
        self.callback_url = Some(url.into());
        self
    }

    pub fn with_subscription_timeout(mut self, timeout: Duration) -> Self {
        self.subscription_timeout = timeout;
        self
    }

    pub fn with_timeouts(mut self, connect: Duration, read: Duration) -> Self {
        self.connect_timeout = connect;
        self.read_timeout = read;
        self
    }

    /// Override the control and event paths of one service
    pub fn with_endpoint(mut self, service: Service, control_path: impl Into<String>, event_path: impl Into<String>) -> Self {
        self.endpoints.insert(
            service,
            ServiceEndpoint {
                control_path: control_path.into(),
                event_path: event_path.into(),
            },
        );
        self
    }

    /// Check the configuration for obviously unusable values
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(RendererError::Configuration("base_url must be set".to_string()));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(RendererError::Configuration(format!(
                "base_url '{}' is not an http(s) URL",
                self.base_url
            )));
        }
        if self.subscription_timeout.as_secs() == 0 {
            return Err(RendererError::Configuration(
                "subscription_timeout must be at least one second".to_string(),
            ));
        }
        Ok(())
    }

    /// Full control URL for `service`
    pub fn control_url(&self, service: Service) -> String {
        match self.endpoints.get(&service) {
            Some(endpoint) => self.resolve(&endpoint.control_path),
            None => self.resolve(service.info().control_path),
        }
    }

    /// Full event subscription URL for `service`
    pub fn event_url(&self, service: Service) -> String {
        match self.endpoints.get(&service) {
            Some(endpoint) => self.resolve(&endpoint.event_path),
            None => self.resolve(service.info().event_path),
        }
    }

    fn resolve(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub(crate) fn subscription_timeout_secs(&self) -> u32 {
        u32::try_from(self.subscription_timeout.as_secs()).unwrap_or(u32::MAX)
    }
}

/// Options recognised by [`MediaRendererClient::load`](crate::MediaRendererClient::load)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoadOptions {
    /// MIME type of the resource
    /// Default: `video/mpeg`
    pub content_type: String,

    /// DLNA capability flags appended to the protocol-info string
    /// Default: `*`
    pub dlna_features: String,

    /// Playback description sent with the resource
    /// Default: none (empty metadata)
    pub metadata: Option<Metadata>,

    /// Start playback once the resource is set
    /// Default: false
    pub autoplay: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            content_type: "video/mpeg".to_string(),
            dlna_features: "*".to_string(),
            metadata: None,
            autoplay: false,
        }
    }
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn with_dlna_features(mut self, features: impl Into<String>) -> Self {
        self.dlna_features = features.into();
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = autoplay;
        self
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
