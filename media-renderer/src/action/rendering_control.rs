//! RenderingControl actions

use crate::channel::ActionArgs;
use crate::define_action;
use crate::error::RendererError;

/// The channel every volume action addresses
pub const MASTER_CHANNEL: &str = "Master";

define_action! {
    action: GetVolume,
    service: RenderingControl,
    request: {
        instance_id: u32,
        channel: String,
    },
    arguments: |req| ActionArgs::new().instance(req.instance_id).arg("Channel", &req.channel),
    response: u16,
    parse: |resp| {
        let volume = resp.require("CurrentVolume")?;
        volume
            .trim()
            .parse::<u16>()
            .map_err(|_| RendererError::decoding(format!("invalid CurrentVolume '{}'", volume)))
    },
}

define_action! {
    action: SetVolume,
    service: RenderingControl,
    request: {
        instance_id: u32,
        channel: String,
        desired_volume: u16,
    },
    arguments: |req| ActionArgs::new()
        .instance(req.instance_id)
        .arg("Channel", &req.channel)
        .arg("DesiredVolume", req.desired_volume),
    response: (),
    parse: |_resp| Ok(()),
}
