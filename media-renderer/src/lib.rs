//! Async control point for UPnP/DLNA media renderers
//!
//! [`MediaRendererClient`] turns playback intents (load, play, pause, stop,
//! seek, volume) into AVTransport, RenderingControl and ConnectionManager
//! actions, and turns AVTransport notifications into discrete
//! [`PlaybackEvent`]s.
//!
//! The client talks to the device only through a [`DeviceControlChannel`].
//! [`SoapControlChannel`] is the HTTP implementation built on the private
//! `soap-client` crate; tests and embedders can plug in their own.
//!
//! # Events
//!
//! ```rust,ignore
//! use media_renderer::{EventKind, PlaybackEvent};
//!
//! // The first listener of any kind subscribes to AVTransport
//! let id = client.on(EventKind::Playing, |_| println!("playing")).await?;
//!
//! // The last one removed unsubscribes
//! client.off(id).await?;
//! ```
//!
//! The first notification after every subscription is the device's state
//! snapshot. It is delivered as [`PlaybackEvent::Status`] only.

pub mod action;
pub mod channel;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod negotiator;
pub mod service;
pub mod session;

pub use channel::{
    ActionArgs, ActionResponse, DeviceControlChannel, Notification, NotificationHandler, SoapControlChannel,
    SubscriptionId,
};
pub use client::MediaRendererClient;
pub use codec::{encode_metadata, format_time, parse_protocol_list, parse_time, MediaType, Metadata, ProtocolInfo};
pub use config::{ChannelConfig, LoadOptions};
pub use error::{RendererError, Result};
pub use events::{EventKind, EventMultiplexer, ListenerId, PlaybackEvent};
pub use negotiator::Negotiated;
pub use service::Service;
pub use session::RendererSession;
