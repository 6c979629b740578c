//! Pure encoders and decoders used by the action gateway.
//!
//! - [`time`] - seconds <-> `HH:MM:SS`
//! - [`metadata`] - playback-description (DIDL-Lite) documents
//! - [`protocol_info`] - device capability strings

pub mod metadata;
pub mod protocol_info;
pub mod time;

pub use metadata::{encode_metadata, MediaType, Metadata};
pub use protocol_info::{parse_protocol_list, ProtocolInfo};
pub use time::{format_time, parse_time};
