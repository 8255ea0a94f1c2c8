use async_trait::async_trait;
use reqwest::{Method, Response, StatusCode};
use url::Url;

use super::{normalize_channels, Result, Transport, TransportError};
use crate::core::models::{BackendConfig, MessageSummary};

/// Transport speaking to a backend over its `/api/*` HTTP surface.
pub struct HttpTransport {
    base: Url,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(server_url: &str) -> Result<Self> {
        let base = Url::parse(server_url)
            .map_err(|e| TransportError::Unavailable(format!("bad server url: {e}")))?;
        Ok(HttpTransport {
            base,
            client: reqwest::Client::new(),
        })
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = self
            .base
            .join(path)
            .map_err(|e| TransportError::Unavailable(format!("bad endpoint {path}: {e}")))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Response> {
        let url = self.endpoint(path, params)?;
        let response = self
            .client
            .request(method, url)
            .send()
            .await
            .map_err(|e| TransportError::Unavailable(e.to_string()))?;

        match response.status() {
            s if s.is_success() => Ok(response),
            StatusCode::UNAUTHORIZED => Err(TransportError::Unauthorized),
            StatusCode::SERVICE_UNAVAILABLE => Err(TransportError::NotReady),
            status => {
                let text = response.text().await.unwrap_or_default();
                Err(TransportError::Backend(format!(
                    "{status}: {}",
                    text.trim()
                )))
            }
        }
    }

    async fn get_json(&self, path: &str, params: &[(&str, &str)]) -> Result<serde_json::Value> {
        self.request(Method::GET, path, params)
            .await?
            .json()
            .await
            .map_err(|e| TransportError::Backend(format!("bad response body: {e}")))
    }

    async fn get_text(&self, path: &str, params: &[(&str, &str)]) -> Result<String> {
        self.request(Method::GET, path, params)
            .await?
            .text()
            .await
            .map_err(|e| TransportError::Backend(format!("bad response body: {e}")))
    }

    async fn post(&self, path: &str, params: &[(&str, &str)]) -> Result<()> {
        self.request(Method::POST, path, params).await?;
        Ok(())
    }

    /// The backend serializes empty lists as JSON `null`; decode both.
    fn decode_messages(value: serde_json::Value) -> Result<Vec<MessageSummary>> {
        if value.is_null() {
            return Ok(Vec::new());
        }
        serde_json::from_value(value)
            .map_err(|e| TransportError::Backend(format!("bad message list: {e}")))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_config(&self) -> Result<BackendConfig> {
        let value = self.get_json("/api/config", &[]).await?;
        serde_json::from_value(value)
            .map_err(|e| TransportError::Backend(format!("bad config: {e}")))
    }

    async fn list_channels(&self) -> Result<Vec<String>> {
        let value = self.get_json("/api/channels", &[]).await?;
        Ok(normalize_channels(value))
    }

    async fn reload_channels(&self) -> Result<Vec<String>> {
        // Reload is best-effort: a failure here must not take the tab bar
        // down, so it degrades to an empty list.
        match self
            .request(Method::POST, "/api/reload-channels", &[])
            .await
        {
            Ok(response) => match response.json().await {
                Ok(value) => Ok(normalize_channels(value)),
                Err(e) => {
                    log::warn!("Channel reload returned a malformed body: {e}");
                    Ok(Vec::new())
                }
            },
            Err(e) => {
                log::warn!("Channel reload failed: {e}");
                Ok(Vec::new())
            }
        }
    }

    async fn messages_for_channel(&self, channel: &str) -> Result<Vec<MessageSummary>> {
        let value = self
            .get_json("/api/messages", &[("name", channel)])
            .await?;
        Self::decode_messages(value)
    }

    async fn message_body(&self, id: &str) -> Result<String> {
        self.get_text("/api/message-body", &[("id", id)]).await
    }

    async fn sync(&self) -> Result<()> {
        self.request(Method::GET, "/api/sync", &[]).await?;
        Ok(())
    }

    async fn sync_historical(&self, page_token: &str) -> Result<String> {
        self.get_text("/api/sync-historical", &[("token", page_token)])
            .await
    }

    async fn search(&self, query: &str) -> Result<Vec<MessageSummary>> {
        let value = self
            .get_json("/api/ai-search", &[("query", query)])
            .await?;
        Self::decode_messages(value)
    }

    async fn summarize(&self, id: &str) -> Result<String> {
        self.get_text("/api/summarize", &[("id", id)]).await
    }

    async fn trash(&self, id: &str) -> Result<()> {
        self.post("/api/trash", &[("id", id)]).await
    }

    async fn mark_read(&self, id: &str) -> Result<()> {
        self.post("/api/mark-read", &[("id", id)]).await
    }

    async fn set_importance(&self, id: &str, level: i64) -> Result<()> {
        self.post(
            "/api/set-importance",
            &[("id", id), ("level", &level.to_string())],
        )
        .await
    }

    async fn auth_url(&self) -> Result<Option<String>> {
        let url = self.get_text("/api/auth-url", &[]).await?;
        let url = url.trim().to_string();
        Ok(if url.is_empty() { None } else { Some(url) })
    }

    async fn complete_auth(&self, code: &str) -> Result<()> {
        self.post("/api/complete-auth", &[("code", code)]).await
    }
}
