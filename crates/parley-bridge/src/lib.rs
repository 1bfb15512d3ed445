// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messaging adapter for the browser-automation sidecar.
//!
//! The sidecar drives the messaging web client and exposes a small HTTP
//! API. [`BridgeClient`] implements [`MessagingProvider`] over that API;
//! inbound events reach the gateway's webhook route instead.

pub mod wire;

use std::time::Duration;

use async_trait::async_trait;
use parley_config::model::BridgeConfig;
use parley_core::traits::{MessagingProvider, PluginAdapter};
use parley_core::types::{AdapterType, ChatSummary, ContactInfo, HealthStatus, MediaPayload};
use parley_core::{ParleyError, ProviderEvent};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::wire::{
    ContactResponse, DeleteRequest, MediaResponse, ProfilePicResponse, SendTextRequest,
    SendTextResponse,
};

/// HTTP client for the sidecar.
#[derive(Debug, Clone)]
pub struct BridgeClient {
    client: reqwest::Client,
    base_url: Url,
}

impl BridgeClient {
    pub fn new(config: &BridgeConfig) -> Result<Self, ParleyError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ParleyError::Config(format!("invalid bridge.base_url: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ParleyError::Config(format!(
                "bridge.base_url `{base_url}` cannot carry a path"
            )));
        }

        let mut headers = HeaderMap::new();
        if let Some(token) = config.token.as_deref().filter(|t| !t.is_empty()) {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {token}"))
                    .map_err(|e| ParleyError::Config(format!("invalid bridge.token: {e}")))?,
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ParleyError::Messaging {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        info!(base_url = %base_url, "bridge client initialized");
        Ok(Self { client, base_url })
    }

    /// `base_url` with `segments` appended, each percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url, ParleyError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ParleyError::Internal("bridge base url cannot be a base".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>, ParleyError> {
        let response = self.client.get(url.clone()).send().await.map_err(transport)?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(url = %url, "sidecar returned 404");
            return Ok(None);
        }
        let response = ensure_success(response).await?;
        response.json().await.map(Some).map_err(decode)
    }
}

async fn ensure_success(response: Response) -> Result<Response, ParleyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ParleyError::messaging(format!(
        "sidecar returned {status}: {body}"
    )))
}

fn transport(e: reqwest::Error) -> ParleyError {
    ParleyError::Messaging {
        message: format!("sidecar request failed: {e}"),
        source: Some(Box::new(e)),
    }
}

fn decode(e: reqwest::Error) -> ParleyError {
    ParleyError::Messaging {
        message: format!("malformed sidecar response: {e}"),
        source: Some(Box::new(e)),
    }
}

#[async_trait]
impl PluginAdapter for BridgeClient {
    fn name(&self) -> &str {
        "bridge"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Messaging
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        let url = self.url(&["health"])?;
        match self.client.get(url).send().await {
            Ok(r) if r.status().is_success() => Ok(HealthStatus::Healthy),
            Ok(r) => Ok(HealthStatus::Degraded(format!("sidecar returned {}", r.status()))),
            Err(e) => Ok(HealthStatus::Unhealthy(format!("sidecar unreachable: {e}"))),
        }
    }
}

#[async_trait]
impl MessagingProvider for BridgeClient {
    async fn send_text(&self, jid: &str, text: &str) -> Result<Option<String>, ParleyError> {
        let url = self.url(&["send-text"])?;
        let response = self
            .client
            .post(url)
            .json(&SendTextRequest { to: jid, text })
            .send()
            .await
            .map_err(transport)?;
        let response = ensure_success(response).await?;
        let body = response.text().await.map_err(decode)?;
        let sent: SendTextResponse = serde_json::from_str(&body).unwrap_or_default();
        Ok(sent.message_id())
    }

    async fn download_media(&self, message_id: &str) -> Result<MediaPayload, ParleyError> {
        let url = self.url(&["media", message_id])?;
        let response = self.client.get(url).send().await.map_err(transport)?;
        let response = ensure_success(response).await?;

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));
        if is_json {
            let media: MediaResponse = response.json().await.map_err(decode)?;
            return Ok(MediaPayload::Encoded(media.data));
        }

        let bytes = response.bytes().await.map_err(decode)?;
        if bytes.is_empty() {
            return Err(ParleyError::messaging(format!(
                "empty media payload for {message_id}"
            )));
        }
        Ok(MediaPayload::Bytes(bytes.to_vec()))
    }

    async fn get_message_by_id(&self, id: &str) -> Result<Option<ProviderEvent>, ParleyError> {
        let url = self.url(&["messages", id])?;
        self.get_json(url).await
    }

    async fn get_all_messages_in_chat(
        &self,
        jid: &str,
        include_me: bool,
        limit: usize,
    ) -> Result<Vec<ProviderEvent>, ParleyError> {
        let mut url = self.url(&["chats", jid, "messages"])?;
        url.query_pairs_mut()
            .append_pair("includeMe", if include_me { "true" } else { "false" })
            .append_pair("limit", &limit.to_string());
        Ok(self.get_json(url).await?.unwrap_or_default())
    }

    async fn get_all_chats(&self) -> Result<Vec<ChatSummary>, ParleyError> {
        let url = self.url(&["chats"])?;
        Ok(self.get_json(url).await?.unwrap_or_default())
    }

    async fn get_contact(&self, jid: &str) -> Result<Option<ContactInfo>, ParleyError> {
        let url = self.url(&["contacts", jid])?;
        let contact: Option<ContactResponse> = self.get_json(url).await?;
        Ok(contact.map(|c| ContactInfo {
            name: c.display_name(),
            profile_pic_url: None,
        }))
    }

    async fn get_profile_pic(&self, jid: &str) -> Result<Option<String>, ParleyError> {
        let url = self.url(&["contacts", jid, "profile-pic"])?;
        let pic: Option<ProfilePicResponse> = self.get_json(url).await?;
        Ok(pic.and_then(|p| p.url).filter(|u| !u.is_empty()))
    }

    async fn delete_message(
        &self,
        jid: &str,
        message_id: &str,
        for_everyone: bool,
    ) -> Result<(), ParleyError> {
        let url = self.url(&["messages", message_id, "delete"])?;
        let response = self
            .client
            .post(url)
            .json(&DeleteRequest {
                chat_id: jid,
                for_everyone,
            })
            .send()
            .await
            .map_err(transport)?;
        ensure_success(response).await?;
        Ok(())
    }
}
