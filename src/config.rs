use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// Client-side settings: where the backend lives. Everything else (models,
/// sync cadence, channels) is backend-owned and fetched over the transport.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    pub server_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            server_url: DEFAULT_SERVER_URL.into(),
        }
    }
}

fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("maildeck")
        .join("config.json")
}

impl ClientConfig {
    pub fn load() -> Result<Option<Self>, String> {
        let path = config_path();
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&path).map_err(|e| format!("read config: {e}"))?;
        let cfg: ClientConfig =
            serde_json::from_str(&data).map_err(|e| format!("parse config: {e}"))?;
        Ok(Some(cfg))
    }

    pub fn save(&self) -> Result<(), String> {
        let path = config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("create config dir: {e}"))?;
        }
        let data =
            serde_json::to_string_pretty(self).map_err(|e| format!("serialize config: {e}"))?;
        fs::write(&path, data).map_err(|e| format!("write config: {e}"))
    }

    /// Resolution order: env var → config file → defaults (written to disk
    /// so the user has a file to edit).
    pub fn resolve() -> Self {
        if let Ok(server_url) = std::env::var("MAILDECK_SERVER") {
            if !server_url.trim().is_empty() {
                log::info!("Config loaded from environment");
                return ClientConfig {
                    server_url: server_url.trim().to_string(),
                };
            }
        }

        match Self::load() {
            Ok(Some(cfg)) => {
                log::info!("Config loaded from file");
                cfg
            }
            Ok(None) => {
                let cfg = Self::default();
                if let Err(e) = cfg.save() {
                    log::warn!("Could not write default config: {e}");
                }
                cfg
            }
            Err(e) => {
                log::warn!("Config file error, using defaults: {e}");
                Self::default()
            }
        }
    }
}
