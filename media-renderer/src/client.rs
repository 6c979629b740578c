use std::sync::Arc;

use tracing::info;

use crate::action::{
    execute, GetMediaInfoAction, GetMediaInfoRequest, GetPositionInfoAction, GetPositionInfoRequest,
    GetProtocolInfoAction, GetProtocolInfoRequest, GetTransportInfoAction, GetTransportInfoRequest, GetVolumeAction,
    GetVolumeRequest, PauseAction, PauseRequest, PlayAction, PlayRequest, SeekAction, SeekRequest,
    SetAVTransportURIAction, SetAVTransportURIRequest, SetVolumeAction, SetVolumeRequest, StopAction, StopRequest,
    MASTER_CHANNEL, SEEK_UNIT_REL_TIME,
};
use crate::channel::{ActionResponse, DeviceControlChannel};
use crate::codec::{encode_metadata, format_time, ProtocolInfo};
use crate::config::LoadOptions;
use crate::error::Result;
use crate::events::{EventKind, EventMultiplexer, ListenerId, PlaybackEvent};
use crate::negotiator::negotiate_instance;
use crate::session::RendererSession;

/// Control point for one media renderer
///
/// Every playback action is addressed to the session's current transport
/// instance. Device errors are returned unchanged and never retried.
///
/// # Example
///
/// ```rust,ignore
/// use media_renderer::{ChannelConfig, LoadOptions, MediaRendererClient, SoapControlChannel};
///
/// let channel = SoapControlChannel::new(ChannelConfig::new("http://192.168.1.20:49152"))?;
/// let client = MediaRendererClient::new(channel);
///
/// client
///     .load("http://192.168.1.5:8000/movie.mp4", &LoadOptions::new().with_content_type("video/mp4").with_autoplay(true))
///     .await?;
/// client.seek(90).await?;
/// println!("volume: {}", client.get_volume().await?);
/// ```
pub struct MediaRendererClient<C: ?Sized> {
    channel: Arc<C>,
    session: RendererSession,
    events: EventMultiplexer<C>,
}

impl<C: DeviceControlChannel> MediaRendererClient<C> {
    pub fn new(channel: C) -> Self {
        Self::from_arc(Arc::new(channel))
    }
}

impl<C> MediaRendererClient<C>
where
    C: DeviceControlChannel + ?Sized,
{
    /// Create a client over a channel shared with other code
    pub fn from_arc(channel: Arc<C>) -> Self {
        Self {
            events: EventMultiplexer::new(Arc::clone(&channel)),
            session: RendererSession::new(),
            channel,
        }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Transport instance the next action will address
    pub fn instance_id(&self) -> u32 {
        self.session.instance_id()
    }

    /// Set `url` as the current resource
    ///
    /// Negotiates the transport instance first. Only a device without
    /// PrepareForConnection is tolerated; any other negotiation failure aborts
    /// before the resource is set. With `autoplay` playback starts afterwards.
    pub async fn load(&self, url: &str, options: &LoadOptions) -> Result<()> {
        let metadata = match &options.metadata {
            Some(metadata) => encode_metadata(metadata)?,
            None => String::new(),
        };

        negotiate_instance(&*self.channel, &self.session, &options.content_type, &options.dlna_features).await?;

        let request = SetAVTransportURIRequest {
            instance_id: self.instance_id(),
            current_uri: url.to_string(),
            current_uri_metadata: metadata,
        };
        execute::<SetAVTransportURIAction, _>(&*self.channel, &request).await?;
        info!(url, instance_id = request.instance_id, "media loaded");

        if options.autoplay {
            self.play().await?;
        }
        Ok(())
    }

    pub async fn play(&self) -> Result<()> {
        let request = PlayRequest {
            instance_id: self.instance_id(),
            speed: "1".to_string(),
        };
        execute::<PlayAction, _>(&*self.channel, &request).await
    }

    pub async fn pause(&self) -> Result<()> {
        let request = PauseRequest {
            instance_id: self.instance_id(),
        };
        execute::<PauseAction, _>(&*self.channel, &request).await
    }

    pub async fn stop(&self) -> Result<()> {
        let request = StopRequest {
            instance_id: self.instance_id(),
        };
        execute::<StopAction, _>(&*self.channel, &request).await
    }

    /// Jump to `seconds` from the start of the current track
    pub async fn seek(&self, seconds: u64) -> Result<()> {
        let request = SeekRequest {
            instance_id: self.instance_id(),
            unit: SEEK_UNIT_REL_TIME.to_string(),
            target: format_time(seconds),
        };
        execute::<SeekAction, _>(&*self.channel, &request).await
    }

    /// Current playback position in seconds
    pub async fn get_position(&self) -> Result<u64> {
        let request = GetPositionInfoRequest {
            instance_id: self.instance_id(),
        };
        execute::<GetPositionInfoAction, _>(&*self.channel, &request)
            .await?
            .position_seconds()
    }

    /// Duration of the current media in seconds
    pub async fn get_duration(&self) -> Result<u64> {
        let request = GetMediaInfoRequest {
            instance_id: self.instance_id(),
        };
        execute::<GetMediaInfoAction, _>(&*self.channel, &request)
            .await?
            .duration_seconds()
    }

    pub async fn get_volume(&self) -> Result<u16> {
        let request = GetVolumeRequest {
            instance_id: self.instance_id(),
            channel: MASTER_CHANNEL.to_string(),
        };
        execute::<GetVolumeAction, _>(&*self.channel, &request).await
    }

    pub async fn set_volume(&self, volume: u16) -> Result<()> {
        let request = SetVolumeRequest {
            instance_id: self.instance_id(),
            channel: MASTER_CHANNEL.to_string(),
            desired_volume: volume,
        };
        execute::<SetVolumeAction, _>(&*self.channel, &request).await
    }

    /// Raw `GetTransportInfo` output
    pub async fn get_transport_info(&self) -> Result<ActionResponse> {
        let request = GetTransportInfoRequest {
            instance_id: self.instance_id(),
        };
        execute::<GetTransportInfoAction, _>(&*self.channel, &request).await
    }

    /// Formats the device accepts, decoded from the `Sink` list
    pub async fn get_supported_protocols(&self) -> Result<Vec<ProtocolInfo>> {
        execute::<GetProtocolInfoAction, _>(&*self.channel, &GetProtocolInfoRequest {})
            .await?
            .sink_protocols()
    }

    /// Register a listener; see [`EventMultiplexer::add_listener`]
    pub async fn on<F>(&self, kind: EventKind, listener: F) -> Result<ListenerId>
    where
        F: Fn(&PlaybackEvent) + Send + Sync + 'static,
    {
        self.events.add_listener(kind, listener).await
    }

    /// Remove a listener; see [`EventMultiplexer::remove_listener`]
    pub async fn off(&self, id: ListenerId) -> Result<usize> {
        self.events.remove_listener(id).await
    }

    pub fn events(&self) -> &EventMultiplexer<C> {
        &self.events
    }
}
