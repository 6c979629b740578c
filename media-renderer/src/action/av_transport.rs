//! AVTransport actions: source selection, transport control and position queries

use serde::Serialize;

use crate::channel::{ActionArgs, ActionResponse};
use crate::codec::parse_time;
use crate::define_action;
use crate::error::{RendererError, Result};

/// Seek unit whose target is a time offset from the start of the track
pub const SEEK_UNIT_REL_TIME: &str = "REL_TIME";

/// Value devices report for position fields they do not track
pub const NOT_IMPLEMENTED: &str = "NOT_IMPLEMENTED";

define_action! {
    /// Set the resource the transport plays next
    action: SetAVTransportURI,
    service: AVTransport,
    request: {
        instance_id: u32,
        current_uri: String,
        current_uri_metadata: String,
    },
    arguments: |req| ActionArgs::new()
        .instance(req.instance_id)
        .arg("CurrentURI", &req.current_uri)
        .arg("CurrentURIMetaData", &req.current_uri_metadata),
    response: (),
    parse: |_resp| Ok(()),
}

define_action! {
    action: Play,
    service: AVTransport,
    request: {
        instance_id: u32,
        speed: String,
    },
    arguments: |req| ActionArgs::new().instance(req.instance_id).arg("Speed", &req.speed),
    response: (),
    parse: |_resp| Ok(()),
}

define_action! {
    action: Pause,
    service: AVTransport,
    request: {
        instance_id: u32,
    },
    arguments: |req| ActionArgs::new().instance(req.instance_id),
    response: (),
    parse: |_resp| Ok(()),
}

define_action! {
    action: Stop,
    service: AVTransport,
    request: {
        instance_id: u32,
    },
    arguments: |req| ActionArgs::new().instance(req.instance_id),
    response: (),
    parse: |_resp| Ok(()),
}

define_action! {
    /// Move the playback position; with `REL_TIME` the target is an
    /// absolute offset into the track, not a delta
    action: Seek,
    service: AVTransport,
    request: {
        instance_id: u32,
        unit: String,
        target: String,
    },
    arguments: |req| ActionArgs::new()
        .instance(req.instance_id)
        .arg("Unit", &req.unit)
        .arg("Target", &req.target),
    response: (),
    parse: |_resp| Ok(()),
}

define_action! {
    action: GetPositionInfo,
    service: AVTransport,
    request: {
        instance_id: u32,
    },
    arguments: |req| ActionArgs::new().instance(req.instance_id),
    response: PositionInfo,
    parse: |resp| Ok(PositionInfo::from_response(&resp)),
}

define_action! {
    action: GetMediaInfo,
    service: AVTransport,
    request: {
        instance_id: u32,
    },
    arguments: |req| ActionArgs::new().instance(req.instance_id),
    response: MediaInfo,
    parse: |resp| Ok(MediaInfo::from_response(&resp)),
}

define_action! {
    /// Transport state, status and speed, passed through untouched
    action: GetTransportInfo,
    service: AVTransport,
    request: {
        instance_id: u32,
    },
    arguments: |req| ActionArgs::new().instance(req.instance_id),
    response: ActionResponse,
    parse: |resp| Ok(resp),
}

/// Output of `GetPositionInfo`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PositionInfo {
    pub track: Option<u32>,
    pub track_duration: Option<String>,
    pub track_uri: Option<String>,
    pub rel_time: Option<String>,
    pub abs_time: Option<String>,
}

impl PositionInfo {
    fn from_response(response: &ActionResponse) -> Self {
        let field = |name| response.get(name).map(str::to_string);
        Self {
            track: response.get("Track").and_then(|t| t.trim().parse().ok()),
            track_duration: field("TrackDuration"),
            track_uri: field("TrackURI"),
            rel_time: field("RelTime"),
            abs_time: field("AbsTime"),
        }
    }

    /// Playback position in seconds
    ///
    /// Prefers `AbsTime`; falls back to `RelTime` when the device reports
    /// `NOT_IMPLEMENTED` or omits it.
    pub fn position_seconds(&self) -> Result<u64> {
        let time = match self.abs_time.as_deref() {
            Some(abs) if abs != NOT_IMPLEMENTED => abs,
            _ => self
                .rel_time
                .as_deref()
                .ok_or_else(|| RendererError::decoding("position info carries neither AbsTime nor RelTime"))?,
        };
        parse_time(time)
    }
}

/// Output of `GetMediaInfo`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MediaInfo {
    pub nr_tracks: Option<u32>,
    pub media_duration: Option<String>,
    pub current_uri: Option<String>,
    pub current_uri_metadata: Option<String>,
}

impl MediaInfo {
    fn from_response(response: &ActionResponse) -> Self {
        let field = |name| response.get(name).map(str::to_string);
        Self {
            nr_tracks: response.get("NrTracks").and_then(|n| n.trim().parse().ok()),
            media_duration: field("MediaDuration"),
            current_uri: field("CurrentURI"),
            current_uri_metadata: field("CurrentURIMetaData"),
        }
    }

    /// Length of the current media in seconds
    pub fn duration_seconds(&self) -> Result<u64> {
        let duration = self
            .media_duration
            .as_deref()
            .ok_or_else(|| RendererError::decoding("media info is missing the MediaDuration field"))?;
        parse_time(duration)
    }
}
