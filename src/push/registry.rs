//! Per-user registry of push subscription endpoints.

use crate::store::{NotificationStore, Subscription};
use crate::NotificationError;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Raw subscription payload as produced by `PushManager.subscribe()` in the
/// browser: an endpoint URL plus opaque credential material.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionDescriptor {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub keys: serde_json::Map<String, serde_json::Value>,
}

/// Current push endpoints per user, backed by the store.
#[derive(Clone)]
pub struct SubscriptionRegistry {
    store: Arc<dyn NotificationStore>,
}

impl SubscriptionRegistry {
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store }
    }

    /// Validate and store a subscription. The endpoint is the identity key:
    /// re-registering overwrites the previous owner and credentials.
    pub fn register(
        &self,
        user_id: &str,
        descriptor: SubscriptionDescriptor,
    ) -> Result<(), NotificationError> {
        if !descriptor.endpoint.starts_with("https://")
            && !descriptor.endpoint.starts_with("http://")
        {
            return Err(NotificationError::Validation(
                "subscription endpoint must be an http(s) URL".to_string(),
            ));
        }
        for field in ["p256dh", "auth"] {
            match descriptor.keys.get(field).and_then(|v| v.as_str()) {
                Some(value) if !value.is_empty() => {}
                _ => {
                    return Err(NotificationError::Validation(format!(
                        "subscription keys must include a non-empty '{}'",
                        field
                    )))
                }
            }
        }

        let subscription = Subscription {
            endpoint: descriptor.endpoint,
            user_id: user_id.to_string(),
            keys: descriptor.keys,
        };
        debug!(
            "Registering push subscription {} for user {}",
            subscription.endpoint, user_id
        );
        self.store
            .upsert_subscription(&subscription)
            .map_err(NotificationError::Storage)
    }

    pub fn list(&self, user_id: &str) -> Result<Vec<Subscription>, NotificationError> {
        self.store
            .subscriptions_for(user_id)
            .map_err(NotificationError::Storage)
    }

    /// Remove a confirmed-dead endpoint. Idempotent.
    pub fn evict(&self, endpoint: &str) -> Result<(), NotificationError> {
        info!("Evicting push subscription {}", endpoint);
        self.store
            .delete_subscription(endpoint)
            .map_err(NotificationError::Storage)
    }
}
