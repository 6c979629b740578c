use soap_client::SoapError;
use thiserror::Error;

use crate::service::Service;

/// Errors surfaced by renderer control operations
///
/// `Network`, `Fault` and `InvalidResponse` together form the device
/// communication family: they are propagated verbatim and never retried.
/// `ActionNotSupported` is only special-cased while negotiating the
/// connection instance during a load; everywhere else it behaves like any
/// other device communication failure.
#[derive(Debug, Error)]
pub enum RendererError {
    /// Transport-level failure talking to the device
    #[error("Network error: {0}")]
    Network(String),

    /// The device answered with a UPnP fault
    #[error("UPnP fault {code} from {action}: {description}")]
    Fault {
        action: String,
        code: u16,
        description: String,
    },

    /// The device answered with something that is not a usable SOAP response
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The device does not implement the requested action
    #[error("Action {}#{} is not implemented by the device", .service.name(), .action)]
    ActionNotSupported { service: Service, action: String },

    /// A capability string, time string or state value could not be decoded
    #[error("Protocol decoding error: {0}")]
    ProtocolDecoding(String),

    /// The playback-description document could not be written
    #[error("Metadata encoding error: {0}")]
    MetadataEncoding(String),

    /// Subscribing to or unsubscribing from device notifications failed
    #[error("Subscription error: {0}")]
    Subscription(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl RendererError {
    pub fn is_action_not_supported(&self) -> bool {
        matches!(self, Self::ActionNotSupported { .. })
    }

    /// True for every failure that originates from talking to the device
    pub fn is_device_communication(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Fault { .. } | Self::InvalidResponse(_) | Self::ActionNotSupported { .. }
        )
    }

    pub(crate) fn decoding(message: impl Into<String>) -> Self {
        Self::ProtocolDecoding(message.into())
    }
}

/// Type alias for results that can return a RendererError
pub type Result<T> = std::result::Result<T, RendererError>;

/// Convert from SoapError to RendererError
///
/// Faults lose their action context here; the SOAP channel maps faults
/// itself so it can attach the action name and recognise unsupported actions.
impl From<SoapError> for RendererError {
    fn from(error: SoapError) -> Self {
        match error {
            SoapError::Network(msg) => RendererError::Network(msg),
            SoapError::Parse(msg) => RendererError::InvalidResponse(msg),
            SoapError::Fault { code, description } => RendererError::Fault {
                action: String::new(),
                code,
                description,
            },
        }
    }
}
