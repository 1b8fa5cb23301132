//! Notification data models

use serde::{Deserialize, Serialize};

/// Toast severity category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToastCategory {
    Success,
    Error,
    #[default]
    Info,
    Warning,
}

impl ToastCategory {
    /// Parse the wire name. Returns None for anything outside the fixed set.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "error" => Some(Self::Error),
            "info" => Some(Self::Info),
            "warning" => Some(Self::Warning),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
            Self::Warning => "warning",
        }
    }
}

/// One pending toast notification.
///
/// Created by enqueue, consumed exactly once by the drain that removes it
/// from the store. Never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Toast {
    pub id: String,
    pub user_id: String,
    pub message: String,
    pub category: ToastCategory,
    /// Opaque payload, forwarded verbatim to the polling client.
    pub context: serde_json::Map<String, serde_json::Value>,
    /// Creation time in milliseconds since the epoch.
    pub created_at: i64,
}

/// One registered push endpoint for a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    /// Push service URL; the global identity key for the record.
    pub endpoint: String,
    pub user_id: String,
    /// Credential material (`p256dh`, `auth`, ...) stored and handed to the
    /// push protocol layer unmodified.
    pub keys: serde_json::Map<String, serde_json::Value>,
}
