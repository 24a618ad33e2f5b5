//! The durable-record publisher.
//!
//! An authenticated HTTP client against the author's identity host:
//! create a session for bearer tokens, then create one signed message
//! record per published draft. On an authorization failure the client
//! refreshes its session token exactly once and retries the same
//! request once before surfacing a terminal [`EngineError::Publish`].

use serde::Deserialize;
use serde_json::json;

use lrc_proto::MessageRecord;

use crate::error::EngineError;

/// Publisher configuration.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Base URL of the author's identity host.
    pub service: String,
    /// did of the repository records are created in.
    pub did: String,
    /// Collection NSID for message records.
    pub collection: String,
}

impl PublisherConfig {
    pub fn new(service: impl Into<String>, did: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            did: did.into(),
            collection: lrc_proto::MESSAGE_RECORD_TYPE.to_string(),
        }
    }
}

/// A created record's addresses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedRecord {
    pub cid: String,
    pub uri: String,
}

#[derive(Debug, Deserialize)]
struct SessionTokens {
    #[serde(rename = "accessJwt")]
    access_jwt: String,
    #[serde(rename = "refreshJwt")]
    refresh_jwt: String,
}

/// Session-token HTTP client for record creation.
pub struct RecordPublisher {
    http: reqwest::Client,
    config: PublisherConfig,
    access_jwt: Option<String>,
    refresh_jwt: Option<String>,
}

impl RecordPublisher {
    pub fn new(http: reqwest::Client, config: PublisherConfig) -> Self {
        Self {
            http,
            config,
            access_jwt: None,
            refresh_jwt: None,
        }
    }

    pub fn has_session(&self) -> bool {
        self.access_jwt.is_some()
    }

    /// Exchange credentials for session tokens.
    pub async fn create_session(
        &mut self,
        identifier: &str,
        secret: &str,
    ) -> Result<(), EngineError> {
        let url = format!("{}/xrpc/com.atproto.server.createSession", self.config.service);
        let response = self
            .http
            .post(&url)
            .json(&json!({ "identifier": identifier, "password": secret }))
            .send()
            .await
            .map_err(|e| EngineError::Publish(e.to_string()))?;
        if !response.status().is_success() {
            return Err(EngineError::Publish(format!(
                "creating session: HTTP {}",
                response.status()
            )));
        }
        let tokens: SessionTokens = response
            .json()
            .await
            .map_err(|e| EngineError::Publish(e.to_string()))?;
        self.access_jwt = Some(tokens.access_jwt);
        self.refresh_jwt = Some(tokens.refresh_jwt);
        Ok(())
    }

    /// Trade the refresh token for fresh session tokens.
    pub async fn refresh_session(&mut self) -> Result<(), EngineError> {
        let refresh = self
            .refresh_jwt
            .clone()
            .ok_or_else(|| EngineError::Publish("no session to refresh".into()))?;
        let url = format!("{}/xrpc/com.atproto.server.refreshSession", self.config.service);
        let response = self
            .http
            .post(&url)
            .bearer_auth(refresh)
            .send()
            .await
            .map_err(|e| EngineError::Publish(e.to_string()))?;
        if !response.status().is_success() {
            return Err(EngineError::Publish(format!(
                "refreshing session: HTTP {}",
                response.status()
            )));
        }
        let tokens: SessionTokens = response
            .json()
            .await
            .map_err(|e| EngineError::Publish(e.to_string()))?;
        self.access_jwt = Some(tokens.access_jwt);
        self.refresh_jwt = Some(tokens.refresh_jwt);
        Ok(())
    }

    /// Create the durable record for a published message.
    ///
    /// Retries exactly once, after a token refresh, and only when the
    /// first attempt failed with HTTP 401.
    pub async fn create_message_record(
        &mut self,
        record: &MessageRecord,
    ) -> Result<CreatedRecord, EngineError> {
        let response = self.post_record(record).await?;
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            log::info!("record creation unauthorized, refreshing session once");
            self.refresh_session().await?;
            let retried = self.post_record(record).await?;
            return Self::read_created(retried).await;
        }
        Self::read_created(response).await
    }

    async fn post_record(&self, record: &MessageRecord) -> Result<reqwest::Response, EngineError> {
        let access = self
            .access_jwt
            .clone()
            .ok_or_else(|| EngineError::Publish("must create a session first".into()))?;
        let url = format!("{}/xrpc/com.atproto.repo.createRecord", self.config.service);
        self.http
            .post(&url)
            .bearer_auth(access)
            .json(&json!({
                "repo": self.config.did,
                "collection": self.config.collection,
                "record": record,
            }))
            .send()
            .await
            .map_err(|e| EngineError::Publish(e.to_string()))
    }

    async fn read_created(response: reqwest::Response) -> Result<CreatedRecord, EngineError> {
        if !response.status().is_success() {
            return Err(EngineError::Publish(format!(
                "creating record: HTTP {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| EngineError::Publish(e.to_string()))
    }
}
