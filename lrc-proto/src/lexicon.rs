//! JSON lexicon records shared with the identity layer.
//!
//! Every record carries a `$type` discriminator. The correlation
//! stream multiplexes record kinds over one socket; readers peek at
//! [`TypedRecord`] first and only then decode the full shape, so
//! unknown record kinds can be skipped without error.

use serde::{Deserialize, Serialize};

/// `$type` of the signet view records on the correlation stream.
pub const SIGNET_VIEW_TYPE: &str = "org.xcvr.lrc.defs#signetView";

/// Collection NSID for durable message records.
pub const MESSAGE_RECORD_TYPE: &str = "org.xcvr.lrc.message";

/// The discriminator-only view of a record, decoded first to route
/// the full decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedRecord {
    #[serde(rename = "$type")]
    pub record_type: String,
}

/// A signet: the identity layer's attestation binding a numeric
/// in-session message id (`lrc_id`) to a durable record URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignetView {
    #[serde(rename = "$type")]
    pub record_type: String,
    pub uri: String,
    #[serde(rename = "issuerHandle")]
    pub issuer_handle: String,
    #[serde(rename = "channelURI")]
    pub channel_uri: String,
    #[serde(rename = "lrcID")]
    pub lrc_id: u32,
    #[serde(rename = "authorHandle")]
    pub author_handle: String,
    #[serde(rename = "startedAt")]
    pub started_at: String,
}

/// Author profile attached to channel listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "$type")]
    pub record_type: String,
    pub did: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    #[serde(rename = "displayName", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub color: Option<u32>,
}

/// One listed channel from the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelView {
    #[serde(rename = "$type")]
    pub record_type: String,
    pub uri: String,
    pub host: String,
    pub creator: Profile,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

/// Channel resolution: maps a channel record to its live socket URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

/// The durable message record created at publish time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    #[serde(rename = "$type")]
    pub record_type: String,
    #[serde(rename = "signetURI")]
    pub signet_uri: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nick: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u64>,
    #[serde(rename = "postedAt")]
    pub posted_at: String,
}

impl MessageRecord {
    pub fn new(
        signet_uri: impl Into<String>,
        body: impl Into<String>,
        nick: Option<String>,
        color: Option<u64>,
        posted_at: impl Into<String>,
    ) -> Self {
        Self {
            record_type: MESSAGE_RECORD_TYPE.to_string(),
            signet_uri: signet_uri.into(),
            body: body.into(),
            nick,
            color,
            posted_at: posted_at.into(),
        }
    }
}
