//! Connection instance negotiation run at the start of every load.

use tracing::{debug, warn};

use crate::action::{execute, PrepareForConnectionAction, PrepareForConnectionRequest, DIRECTION_INPUT};
use crate::channel::DeviceControlChannel;
use crate::codec::ProtocolInfo;
use crate::error::{RendererError, Result};
use crate::session::RendererSession;

/// How a negotiation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Negotiated {
    /// The device bound the connection to this transport instance
    Adopted(u32),
    /// The device answered without a usable instance; the current one stays
    Kept(u32),
    /// The device does not implement PrepareForConnection; the current one stays
    Unsupported(u32),
}

impl Negotiated {
    pub fn instance_id(&self) -> u32 {
        match *self {
            Self::Adopted(id) | Self::Kept(id) | Self::Unsupported(id) => id,
        }
    }
}

/// Offer `http-get:*:<content_type>:<dlna_features>` to the device and
/// update `session` with the transport instance it hands back
///
/// Only an unimplemented PrepareForConnection is tolerated; every other
/// failure is returned and must abort the load.
pub async fn negotiate_instance<C>(
    channel: &C,
    session: &RendererSession,
    content_type: &str,
    dlna_features: &str,
) -> Result<Negotiated>
where
    C: DeviceControlChannel + ?Sized,
{
    let request = PrepareForConnectionRequest {
        remote_protocol_info: ProtocolInfo::http_get(content_type, dlna_features).to_string(),
        peer_connection_manager: None,
        peer_connection_id: -1,
        direction: DIRECTION_INPUT.to_string(),
    };

    let prepared = match execute::<PrepareForConnectionAction, _>(channel, &request).await {
        Ok(prepared) => prepared,
        Err(e) if e.is_action_not_supported() => {
            let current = session.instance_id();
            warn!(instance_id = current, "PrepareForConnection not implemented, keeping instance");
            return Ok(Negotiated::Unsupported(current));
        }
        Err(e) => return Err(e),
    };

    if prepared.av_transport_id < 0 {
        let current = session.instance_id();
        debug!(
            av_transport_id = prepared.av_transport_id,
            instance_id = current,
            "device returned no transport instance, keeping current"
        );
        return Ok(Negotiated::Kept(current));
    }

    let instance_id = u32::try_from(prepared.av_transport_id).map_err(|_| {
        RendererError::decoding(format!("AVTransportID {} is out of range", prepared.av_transport_id))
    })?;
    session.set_instance_id(instance_id);
    debug!(instance_id, connection_id = ?prepared.connection_id, "adopted transport instance");
    Ok(Negotiated::Adopted(instance_id))
}
