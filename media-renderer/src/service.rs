use serde::{Deserialize, Serialize};

/// The UPnP services of a media renderer that this client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Service {
    /// AVTransport service - playback control (load, play, pause, stop, seek)
    AVTransport,

    /// RenderingControl service - volume and other rendering settings
    RenderingControl,

    /// ConnectionManager service - connection negotiation and protocol capabilities
    ConnectionManager,
}

/// Conventional endpoint paths for a UPnP service, relative to the device base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    /// The HTTP control path used for SOAP requests
    pub control_path: &'static str,

    /// The HTTP event path used for GENA subscriptions
    pub event_path: &'static str,
}

impl Service {
    pub const ALL: [Service; 3] = [
        Service::AVTransport,
        Service::RenderingControl,
        Service::ConnectionManager,
    ];

    /// Get the name of this service as a string
    pub fn name(&self) -> &'static str {
        match self {
            Service::AVTransport => "AVTransport",
            Service::RenderingControl => "RenderingControl",
            Service::ConnectionManager => "ConnectionManager",
        }
    }

    /// The service type URN used in SOAP envelopes and SOAPACTION headers
    pub fn urn(&self) -> &'static str {
        match self {
            Service::AVTransport => "urn:schemas-upnp-org:service:AVTransport:1",
            Service::RenderingControl => "urn:schemas-upnp-org:service:RenderingControl:1",
            Service::ConnectionManager => "urn:schemas-upnp-org:service:ConnectionManager:1",
        }
    }

    /// Conventional control and event paths for this service
    ///
    /// Real devices advertise their own paths in the device description;
    /// these are only defaults and can be overridden per service in
    /// [`ChannelConfig`](crate::config::ChannelConfig).
    pub fn info(&self) -> ServiceInfo {
        match self {
            Service::AVTransport => ServiceInfo {
                control_path: "MediaRenderer/AVTransport/Control",
                event_path: "MediaRenderer/AVTransport/Event",
            },
            Service::RenderingControl => ServiceInfo {
                control_path: "MediaRenderer/RenderingControl/Control",
                event_path: "MediaRenderer/RenderingControl/Event",
            },
            Service::ConnectionManager => ServiceInfo {
                control_path: "MediaRenderer/ConnectionManager/Control",
                event_path: "MediaRenderer/ConnectionManager/Event",
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_urns_match_names() {
        for service in Service::ALL {
            assert!(service.urn().contains(service.name()));
            assert!(service.info().control_path.contains(service.name()));
            assert!(service.info().event_path.ends_with("/Event"));
        }
    }
}
