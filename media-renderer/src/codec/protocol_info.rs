//! UPnP protocol-info strings: `<protocol>:<network>:<contentFormat>:<additionalInfo>`

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RendererError, Result};

/// One entry of a ConnectionManager protocol list
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolInfo {
    pub protocol: String,
    pub network: String,
    pub content_format: String,
    pub additional_info: String,
}

impl ProtocolInfo {
    /// The `http-get:*:<content_type>:<features>` form used when offering a resource
    pub fn http_get(content_type: impl Into<String>, features: impl Into<String>) -> Self {
        Self {
            protocol: "http-get".to_string(),
            network: "*".to_string(),
            content_format: content_type.into(),
            additional_info: features.into(),
        }
    }

    /// Whether this entry accepts `content_type`, honouring `*` wildcards
    pub fn accepts(&self, content_type: &str) -> bool {
        if self.content_format == "*" || self.content_format.eq_ignore_ascii_case(content_type) {
            return true;
        }
        match self.content_format.split_once('/') {
            Some((major, "*")) => content_type
                .split_once('/')
                .map_or(false, |(other, _)| major.eq_ignore_ascii_case(other)),
            _ => false,
        }
    }
}

impl fmt::Display for ProtocolInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.protocol, self.network, self.content_format, self.additional_info
        )
    }
}

impl FromStr for ProtocolInfo {
    type Err = RendererError;

    fn from_str(s: &str) -> Result<Self> {
        // additionalInfo may itself contain ':' so only the first three split
        let mut parts = s.trim().splitn(4, ':');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(protocol), Some(network), Some(content_format), Some(additional_info)) => Ok(Self {
                protocol: protocol.to_string(),
                network: network.to_string(),
                content_format: content_format.to_string(),
                additional_info: additional_info.to_string(),
            }),
            _ => Err(RendererError::decoding(format!("malformed protocol info '{}'", s))),
        }
    }
}

/// Parse a comma-separated protocol list; empty entries are skipped
pub fn parse_protocol_list(list: &str) -> Result<Vec<ProtocolInfo>> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::parse)
        .collect()
}
