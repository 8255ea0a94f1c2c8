use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use super::{normalize_channels, Result, Transport, TransportError};
use crate::core::models::{BackendConfig, MessageSummary};

/// Commands sent from the client to an embedded backend.
///
/// Channel-list replies carry the raw JSON payload so the client applies the
/// same normalization regardless of which transport delivered it.
#[derive(Debug)]
pub enum BridgeCmd {
    FetchConfig {
        reply: oneshot::Sender<Result<BackendConfig>>,
    },
    ListChannels {
        reply: oneshot::Sender<Result<serde_json::Value>>,
    },
    ReloadChannels {
        reply: oneshot::Sender<Result<serde_json::Value>>,
    },
    MessagesForChannel {
        channel: String,
        reply: oneshot::Sender<Result<Vec<MessageSummary>>>,
    },
    MessageBody {
        id: String,
        reply: oneshot::Sender<Result<String>>,
    },
    Sync {
        reply: oneshot::Sender<Result<()>>,
    },
    SyncHistorical {
        page_token: String,
        reply: oneshot::Sender<Result<String>>,
    },
    Search {
        query: String,
        reply: oneshot::Sender<Result<Vec<MessageSummary>>>,
    },
    Summarize {
        id: String,
        reply: oneshot::Sender<Result<String>>,
    },
    Trash {
        id: String,
        reply: oneshot::Sender<Result<()>>,
    },
    MarkRead {
        id: String,
        reply: oneshot::Sender<Result<()>>,
    },
    SetImportance {
        id: String,
        level: i64,
        reply: oneshot::Sender<Result<()>>,
    },
    AuthUrl {
        reply: oneshot::Sender<Result<Option<String>>>,
    },
    CompleteAuth {
        code: String,
        reply: oneshot::Sender<Result<()>>,
    },
}

pub type BridgeReceiver = mpsc::UnboundedReceiver<BridgeCmd>;

/// Transport for a backend running in the same process.
///
/// The embedding host consumes the [`BridgeReceiver`] and answers each
/// command through its oneshot. A dropped receiver (backend gone) surfaces
/// as [`TransportError::Unavailable`] on every call.
#[derive(Clone)]
pub struct BridgeTransport {
    tx: mpsc::UnboundedSender<BridgeCmd>,
}

impl BridgeTransport {
    pub fn channel() -> (Self, BridgeReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (BridgeTransport { tx }, rx)
    }

    fn closed() -> TransportError {
        TransportError::Unavailable("backend bridge closed".into())
    }

    async fn call<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<T>>) -> BridgeCmd,
    ) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(make(reply)).map_err(|_| Self::closed())?;
        rx.await.map_err(|_| Self::closed())?
    }
}

#[async_trait]
impl Transport for BridgeTransport {
    async fn fetch_config(&self) -> Result<BackendConfig> {
        self.call(|reply| BridgeCmd::FetchConfig { reply }).await
    }

    async fn list_channels(&self) -> Result<Vec<String>> {
        let payload = self.call(|reply| BridgeCmd::ListChannels { reply }).await?;
        Ok(normalize_channels(payload))
    }

    async fn reload_channels(&self) -> Result<Vec<String>> {
        // Best-effort, same as the HTTP path: failures degrade to an empty
        // list rather than taking the tab bar down.
        match self.call(|reply| BridgeCmd::ReloadChannels { reply }).await {
            Ok(payload) => Ok(normalize_channels(payload)),
            Err(e) => {
                log::warn!("Channel reload failed: {e}");
                Ok(Vec::new())
            }
        }
    }

    async fn messages_for_channel(&self, channel: &str) -> Result<Vec<MessageSummary>> {
        let channel = channel.to_string();
        self.call(|reply| BridgeCmd::MessagesForChannel { channel, reply })
            .await
    }

    async fn message_body(&self, id: &str) -> Result<String> {
        let id = id.to_string();
        self.call(|reply| BridgeCmd::MessageBody { id, reply }).await
    }

    async fn sync(&self) -> Result<()> {
        self.call(|reply| BridgeCmd::Sync { reply }).await
    }

    async fn sync_historical(&self, page_token: &str) -> Result<String> {
        let page_token = page_token.to_string();
        self.call(|reply| BridgeCmd::SyncHistorical { page_token, reply })
            .await
    }

    async fn search(&self, query: &str) -> Result<Vec<MessageSummary>> {
        let query = query.to_string();
        self.call(|reply| BridgeCmd::Search { query, reply }).await
    }

    async fn summarize(&self, id: &str) -> Result<String> {
        let id = id.to_string();
        self.call(|reply| BridgeCmd::Summarize { id, reply }).await
    }

    async fn trash(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.call(|reply| BridgeCmd::Trash { id, reply }).await
    }

    async fn mark_read(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.call(|reply| BridgeCmd::MarkRead { id, reply }).await
    }

    async fn set_importance(&self, id: &str, level: i64) -> Result<()> {
        let id = id.to_string();
        self.call(|reply| BridgeCmd::SetImportance { id, level, reply })
            .await
    }

    async fn auth_url(&self) -> Result<Option<String>> {
        self.call(|reply| BridgeCmd::AuthUrl { reply }).await
    }

    async fn complete_auth(&self, code: &str) -> Result<()> {
        let code = code.to_string();
        self.call(|reply| BridgeCmd::CompleteAuth { code, reply })
            .await
    }
}
