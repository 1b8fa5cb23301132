//! Best-effort push fan-out with self-healing subscription eviction.

use super::registry::SubscriptionRegistry;
use super::transport::PushTransport;
use crate::store::Subscription;
use crate::NotificationError;
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Protocol and classification settings for the dispatcher.
#[derive(Debug, Clone)]
pub struct PushSettings {
    /// Message time-to-live handed to the push service, in seconds.
    pub ttl_secs: u32,
    /// Icon applied when a message does not carry one.
    pub default_icon: String,
    /// Remote statuses that mean the endpoint is permanently gone and the
    /// subscription should be evicted. Any other non-2xx status counts as a
    /// transient failure.
    pub evict_status_codes: Vec<u16>,
}

impl Default for PushSettings {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            default_icon: "/icons/notification.png".to_string(),
            evict_status_codes: vec![404, 410],
        }
    }
}

/// Payload fanned out to every subscription of a user.
#[derive(Debug, Clone, Serialize)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    pub url: String,
    pub icon: String,
}

/// Outcome counts of one fan-out.
///
/// A non-zero failed count is the expected steady state with heterogeneous,
/// independently failing endpoints - it is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    pub delivered: usize,
    pub failed: usize,
}

enum AttemptOutcome {
    Delivered,
    /// Endpoint reported permanently gone; carries the endpoint to evict.
    Permanent(String),
    Transient,
}

/// Fans one message out to every subscription of a user and prunes endpoints
/// the push service reports as permanently gone.
///
/// Dead endpoints are evicted lazily, only when delivery is actually
/// attempted, so the registry stays bounded without a background sweep.
pub struct PushDispatcher {
    registry: SubscriptionRegistry,
    transport: Arc<dyn PushTransport>,
    settings: PushSettings,
}

impl PushDispatcher {
    pub fn new(
        registry: SubscriptionRegistry,
        transport: Arc<dyn PushTransport>,
        settings: PushSettings,
    ) -> Self {
        Self {
            registry,
            transport,
            settings,
        }
    }

    /// Build a message, filling in the default target URL and icon.
    pub fn message(
        &self,
        title: String,
        body: String,
        url: Option<String>,
        icon: Option<String>,
    ) -> PushMessage {
        PushMessage {
            title,
            body,
            url: url.unwrap_or_else(|| "/".to_string()),
            icon: icon.unwrap_or_else(|| self.settings.default_icon.clone()),
        }
    }

    /// Attempt one delivery per subscription and classify each outcome.
    ///
    /// Attempts run as independent futures merged afterwards; one endpoint
    /// failing or timing out never aborts delivery to its siblings. An empty
    /// subscription set succeeds trivially with a delivered count of 0.
    pub async fn dispatch(
        &self,
        user_id: &str,
        message: &PushMessage,
    ) -> Result<DispatchSummary, NotificationError> {
        let subscriptions = self.registry.list(user_id)?;
        if subscriptions.is_empty() {
            debug!("No push subscriptions for user {}", user_id);
            return Ok(DispatchSummary {
                delivered: 0,
                failed: 0,
            });
        }

        let payload = serde_json::to_vec(message)
            .map_err(|e| NotificationError::Storage(e.into()))?;

        let outcomes = join_all(
            subscriptions
                .iter()
                .map(|subscription| self.attempt(subscription, &payload)),
        )
        .await;

        let mut summary = DispatchSummary {
            delivered: 0,
            failed: 0,
        };
        for outcome in outcomes {
            match outcome {
                AttemptOutcome::Delivered => summary.delivered += 1,
                AttemptOutcome::Transient => summary.failed += 1,
                AttemptOutcome::Permanent(endpoint) => {
                    summary.failed += 1;
                    if let Err(err) = self.registry.evict(&endpoint) {
                        warn!("Failed to evict push subscription {}: {}", endpoint, err);
                    }
                }
            }
        }
        debug!(
            "Push fan-out for user {}: {} delivered, {} failed",
            user_id, summary.delivered, summary.failed
        );
        Ok(summary)
    }

    async fn attempt(&self, subscription: &Subscription, payload: &[u8]) -> AttemptOutcome {
        match self
            .transport
            .deliver(subscription, payload, self.settings.ttl_secs)
            .await
        {
            Ok(status) if (200..300).contains(&status) => {
                debug!("Delivered push to {}", subscription.endpoint);
                AttemptOutcome::Delivered
            }
            Ok(status) if self.settings.evict_status_codes.contains(&status) => {
                warn!(
                    "Push endpoint {} is gone (HTTP {})",
                    subscription.endpoint, status
                );
                AttemptOutcome::Permanent(subscription.endpoint.clone())
            }
            Ok(status) => {
                warn!(
                    "Push delivery to {} failed with HTTP {}",
                    subscription.endpoint, status
                );
                AttemptOutcome::Transient
            }
            Err(err) => {
                warn!("Push delivery to {} failed: {:#}", subscription.endpoint, err);
                AttemptOutcome::Transient
            }
        }
    }
}
