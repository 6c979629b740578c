//! ConnectionManager actions

use serde::Serialize;

use crate::channel::{ActionArgs, ActionResponse};
use crate::codec::{parse_protocol_list, ProtocolInfo};
use crate::define_action;
use crate::error::{RendererError, Result};

/// Direction of a connection whose sink is the renderer
pub const DIRECTION_INPUT: &str = "Input";

define_action! {
    /// Ask the device to set up a connection for the offered protocol
    action: PrepareForConnection,
    service: ConnectionManager,
    request: {
        remote_protocol_info: String,
        peer_connection_manager: Option<String>,
        peer_connection_id: i32,
        direction: String,
    },
    arguments: |req| {
        let args = ActionArgs::new().arg("RemoteProtocolInfo", &req.remote_protocol_info);
        let args = match &req.peer_connection_manager {
            Some(manager) => args.arg("PeerConnectionManager", manager),
            None => args.null("PeerConnectionManager"),
        };
        args.arg("PeerConnectionID", req.peer_connection_id)
            .arg("Direction", &req.direction)
    },
    response: PreparedConnection,
    parse: |resp| PreparedConnection::from_response(&resp),
}

define_action! {
    action: GetProtocolInfo,
    service: ConnectionManager,
    request: {},
    arguments: |_req| ActionArgs::new(),
    response: SupportedProtocols,
    parse: |resp| Ok(SupportedProtocols {
        source: resp.get("Source").unwrap_or_default().to_string(),
        sink: resp.get("Sink").unwrap_or_default().to_string(),
    }),
}

/// Output of `PrepareForConnection`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PreparedConnection {
    pub connection_id: Option<i64>,
    /// Transport instance the connection is bound to; negative means none
    pub av_transport_id: i64,
    pub rcs_id: Option<i64>,
}

impl PreparedConnection {
    fn from_response(response: &ActionResponse) -> Result<Self> {
        let av_transport_id = response.require("AVTransportID")?;
        let av_transport_id = av_transport_id
            .trim()
            .parse::<i64>()
            .map_err(|_| RendererError::decoding(format!("AVTransportID '{}' is not an integer", av_transport_id)))?;

        Ok(Self {
            connection_id: optional_id(response, "ConnectionID"),
            av_transport_id,
            rcs_id: optional_id(response, "RcsID"),
        })
    }
}

fn optional_id(response: &ActionResponse, name: &str) -> Option<i64> {
    response.get(name).and_then(|v| v.trim().parse().ok())
}

/// Raw capability strings returned by `GetProtocolInfo`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SupportedProtocols {
    /// Formats the device can originate
    pub source: String,
    /// Formats the device can receive
    pub sink: String,
}

impl SupportedProtocols {
    /// Decode the sink capability list
    pub fn sink_protocols(&self) -> Result<Vec<ProtocolInfo>> {
        parse_protocol_list(&self.sink)
    }
}
