use serde::{Deserialize, Serialize};

/// Summary of a message for the list view (no body). Field names follow the
/// backend's JSON wire format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageSummary {
    pub id: String,
    pub from: String,
    #[serde(default)]
    pub recipient: String,
    pub subject: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub is_read: i64,
    #[serde(default)]
    pub importance: i64,
    /// Unix milliseconds.
    pub timestamp: i64,
    #[serde(default)]
    pub deadline: String,
}

impl MessageSummary {
    /// Whether the message was addressed to `address` directly (To/Cc), as
    /// opposed to arriving via a list the user is subscribed to.
    pub fn is_direct(&self, address: &str) -> bool {
        !address.is_empty() && self.recipient.contains(address)
    }
}

/// The backend's settings blob, served verbatim over the transport.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendConfig {
    pub my_address: String,
    #[serde(default)]
    pub ollama_model: String,
    #[serde(default)]
    pub embed_model: String,
    #[serde(default)]
    pub sync_interval: u64,
}
