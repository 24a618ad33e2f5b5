//! Channel discovery: listing and resolution over plain HTTP.
//!
//! A channel is named by an AT-URI (`at://did/collection/rkey`); its
//! host resolves the did/rkey pair to the live socket URL.

use lrc_proto::{ChannelView, Resolution};

use crate::error::EngineError;

/// Fetch the public channel listing from a directory host.
pub async fn list_channels(
    http: &reqwest::Client,
    base: &str,
) -> Result<Vec<ChannelView>, EngineError> {
    let url = format!("{base}/xrpc/org.xcvr.feed.getChannels");
    let response = http
        .get(&url)
        .send()
        .await
        .map_err(|e| EngineError::Directory(e.to_string()))?;
    if !response.status().is_success() {
        return Err(EngineError::Directory(format!(
            "listing channels: HTTP {}",
            response.status()
        )));
    }
    response
        .json()
        .await
        .map_err(|e| EngineError::Directory(e.to_string()))
}

/// Resolve a channel to its live socket URL on the channel's host.
pub async fn resolve_channel(
    http: &reqwest::Client,
    host: &str,
    did: &str,
    rkey: &str,
) -> Result<Resolution, EngineError> {
    let url = format!("http://{host}/xrpc/org.xcvr.actor.resolveChannel?did={did}&rkey={rkey}");
    let response = http
        .get(&url)
        .send()
        .await
        .map_err(|e| EngineError::Directory(e.to_string()))?;
    if !response.status().is_success() {
        return Err(EngineError::Directory(format!(
            "resolving channel: HTTP {}",
            response.status()
        )));
    }
    response
        .json()
        .await
        .map_err(|e| EngineError::Directory(e.to_string()))
}

/// Extract the did from an `at://did/collection/rkey` URI.
pub fn did_from_uri(uri: &str) -> Result<&str, EngineError> {
    Ok(split_at_uri(uri)?.0)
}

/// Extract the rkey from an `at://did/collection/rkey` URI.
pub fn rkey_from_uri(uri: &str) -> Result<&str, EngineError> {
    Ok(split_at_uri(uri)?.2)
}

fn split_at_uri(uri: &str) -> Result<(&str, &str, &str), EngineError> {
    let rest = uri
        .strip_prefix("at://")
        .ok_or_else(|| EngineError::Directory(format!("not an at:// uri: {uri}")))?;
    let mut parts = rest.split('/');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(did), Some(collection), Some(rkey), None) if !did.is_empty() && !rkey.is_empty() => {
            Ok((did, collection, rkey))
        }
        _ => Err(EngineError::Directory(format!(
            "malformed at:// uri: {uri}"
        ))),
    }
}
