//! Semantic playback events decoded from AVTransport notifications.
//!
//! [`EventMultiplexer`] owns the single AVTransport subscription shared by
//! every listener. This module holds the event vocabulary and the pure
//! decoding rules applied to each non-snapshot notification.

mod multiplexer;
mod ref_count;

pub use multiplexer::{EventMultiplexer, ListenerId};
pub use ref_count::RefCount;

use std::fmt;
use std::str::FromStr;

use tracing::{trace, warn};

use crate::channel::Notification;
use crate::error::{RendererError, Result};

/// Notification field carrying the transport state
pub const TRANSPORT_STATE: &str = "TransportState";

/// Notification field carrying the play speed
pub const TRANSPORT_PLAY_SPEED: &str = "TransportPlaySpeed";

/// The six event names a listener can register for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Status,
    Loading,
    Playing,
    Paused,
    Stopped,
    SpeedChanged,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::Status,
        EventKind::Loading,
        EventKind::Playing,
        EventKind::Paused,
        EventKind::Stopped,
        EventKind::SpeedChanged,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Status => "status",
            EventKind::Loading => "loading",
            EventKind::Playing => "playing",
            EventKind::Paused => "paused",
            EventKind::Stopped => "stopped",
            EventKind::SpeedChanged => "speedChanged",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EventKind {
    type Err = RendererError;

    fn from_str(s: &str) -> Result<Self> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| RendererError::Configuration(format!("unknown event name '{}'", s)))
    }
}

/// An event delivered to listeners
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// Every notification, raw, including the initial snapshot
    Status(Notification),
    Loading,
    Playing,
    Paused,
    Stopped,
    /// New play speed factor, e.g. `1.0`, `2.0` or `-0.5`
    SpeedChanged(f64),
}

impl PlaybackEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            PlaybackEvent::Status(_) => EventKind::Status,
            PlaybackEvent::Loading => EventKind::Loading,
            PlaybackEvent::Playing => EventKind::Playing,
            PlaybackEvent::Paused => EventKind::Paused,
            PlaybackEvent::Stopped => EventKind::Stopped,
            PlaybackEvent::SpeedChanged(_) => EventKind::SpeedChanged,
        }
    }
}

/// Discrete events carried by a non-snapshot notification, in emission order
///
/// `status` is not included; the multiplexer emits it for every notification.
pub fn decode_transitions(notification: &Notification) -> Vec<PlaybackEvent> {
    let mut events = Vec::new();

    if let Some(state) = notification.get(TRANSPORT_STATE) {
        match transport_state_event(state) {
            Some(event) => events.push(event),
            None => trace!(state = %state, "transport state without a playback event"),
        }
    }

    if let Some(speed) = notification.get(TRANSPORT_PLAY_SPEED) {
        match parse_play_speed(speed) {
            Ok(factor) => events.push(PlaybackEvent::SpeedChanged(factor)),
            Err(e) => warn!(speed = %speed, error = %e, "ignoring undecodable play speed"),
        }
    }

    events
}

fn transport_state_event(state: &str) -> Option<PlaybackEvent> {
    match state {
        "TRANSITIONING" => Some(PlaybackEvent::Loading),
        "PLAYING" => Some(PlaybackEvent::Playing),
        "PAUSED_PLAYBACK" => Some(PlaybackEvent::Paused),
        "STOPPED" => Some(PlaybackEvent::Stopped),
        _ => None,
    }
}

/// Decode a UPnP play speed: an integer, a decimal, or a fraction like `1/2`
pub fn parse_play_speed(speed: &str) -> Result<f64> {
    let speed = speed.trim();
    let invalid = || RendererError::decoding(format!("invalid play speed '{}'", speed));

    let factor = match speed.split_once('/') {
        Some((numerator, denominator)) => {
            let numerator: f64 = numerator.trim().parse().map_err(|_| invalid())?;
            let denominator: f64 = denominator.trim().parse().map_err(|_| invalid())?;
            if denominator == 0.0 {
                return Err(invalid());
            }
            numerator / denominator
        }
        None => speed.parse().map_err(|_| invalid())?,
    };

    if factor.is_finite() {
        Ok(factor)
    } else {
        Err(invalid())
    }
}
