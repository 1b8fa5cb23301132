use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub db_path: Option<String>,
    pub port: Option<u16>,
    pub logging_level: Option<String>,

    // Feature configs
    pub push: Option<PushConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct PushConfig {
    /// Base64url-encoded raw P-256 VAPID private key scalar.
    pub vapid_private_key: Option<String>,
    /// VAPID subject claim, e.g. "mailto:ops@example.com".
    pub vapid_subject: Option<String>,
    pub default_icon: Option<String>,
    pub ttl_secs: Option<u32>,
    pub evict_status_codes: Option<Vec<u16>>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
