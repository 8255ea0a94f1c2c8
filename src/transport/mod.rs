pub mod bridge;
pub mod http;

use std::time::Duration;

use async_trait::async_trait;

use crate::core::models::{BackendConfig, MessageSummary};

/// Errors at the client/backend boundary.
///
/// `NotReady` is the one retryable case: the backend is up but its data
/// source has not produced anything yet. Everything else propagates to the
/// caller, which owns user-visible reporting.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// Network down, bridge channel closed, or the backend is unreachable.
    #[error("backend unreachable: {0}")]
    Unavailable(String),
    /// The backend has no authenticated mail session yet.
    #[error("backend not authenticated")]
    Unauthorized,
    /// The backend is reachable but its upstream data is not available yet.
    #[error("backend data not ready")]
    NotReady,
    /// Any other error the backend reported.
    #[error("backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// Every operation the client forwards to the backend, regardless of whether
/// the backend is embedded in-process or behind HTTP.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch_config(&self) -> Result<BackendConfig>;

    /// The ordered channel (tab) list. Payloads are normalized with
    /// [`normalize_channels`]; transport failures are reported.
    async fn list_channels(&self) -> Result<Vec<String>>;

    /// Re-read the channel definitions from the backend's config file and
    /// return the fresh list.
    async fn reload_channels(&self) -> Result<Vec<String>>;

    async fn messages_for_channel(&self, channel: &str) -> Result<Vec<MessageSummary>>;

    /// Full rendered body (HTML or wrapped plain text).
    async fn message_body(&self, id: &str) -> Result<String>;

    /// Incremental sync of recent mail into the backend's cache.
    async fn sync(&self) -> Result<()>;

    /// Pull one page of older mail; returns the next page token ("" = done).
    async fn sync_historical(&self, page_token: &str) -> Result<String>;

    /// Semantic search over the mailbox; results come back as full summaries
    /// ordered by score.
    async fn search(&self, query: &str) -> Result<Vec<MessageSummary>>;

    async fn summarize(&self, id: &str) -> Result<String>;

    async fn trash(&self, id: &str) -> Result<()>;

    async fn mark_read(&self, id: &str) -> Result<()>;

    async fn set_importance(&self, id: &str, level: i64) -> Result<()>;

    /// `Some(url)` when the user still has to authorize; `None` once a token
    /// exists backend-side.
    async fn auth_url(&self) -> Result<Option<String>>;

    async fn complete_auth(&self, code: &str) -> Result<()>;
}

/// Coerce a channel-list payload into plain names.
///
/// The backend has served both shapes over time: a bare string array and an
/// object array (`[{"name": "..."}]`). Both are accepted; anything else
/// degrades to an empty list instead of an error.
pub fn normalize_channels(payload: serde_json::Value) -> Vec<String> {
    let Some(items) = payload.as_array() else {
        log::warn!("Channel payload is not an array: {payload}");
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            serde_json::Value::String(name) => Some(name.clone()),
            serde_json::Value::Object(obj) => obj
                .get("name")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            other => {
                log::warn!("Skipping malformed channel entry: {other}");
                None
            }
        })
        .collect()
}

/// How often a not-ready fetch is re-attempted before giving up.
pub const NOT_READY_ATTEMPTS: u32 = 5;
pub const NOT_READY_DELAY: Duration = Duration::from_millis(500);

/// Fetch the channel list, re-attempting a fixed number of times while the
/// backend reports `NotReady`. Exhausting the attempts is a soft failure
/// (empty list); any other error propagates immediately.
pub async fn channels_with_retry(transport: &dyn Transport) -> Result<Vec<String>> {
    channels_with_retry_after(transport, NOT_READY_DELAY).await
}

async fn channels_with_retry_after(
    transport: &dyn Transport,
    delay: Duration,
) -> Result<Vec<String>> {
    for attempt in 1..=NOT_READY_ATTEMPTS {
        match transport.list_channels().await {
            Err(TransportError::NotReady) => {
                log::info!(
                    "Channel list not ready, retrying ({attempt}/{NOT_READY_ATTEMPTS})"
                );
                tokio::time::sleep(delay).await;
            }
            other => return other,
        }
    }
    log::warn!("Channel list still not ready after {NOT_READY_ATTEMPTS} attempts");
    Ok(Vec::new())
}
