//! Toast queue: produce/consume semantics over the store.

use crate::store::{NotificationStore, Toast, ToastCategory};
use crate::NotificationError;
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Per-user FIFO of pending toasts. Holds no state of its own; everything
/// lives in the store.
pub struct ToastQueue {
    store: Arc<dyn NotificationStore>,
}

impl ToastQueue {
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store }
    }

    /// Validate and persist a toast; returns the generated id.
    ///
    /// Rejects the whole operation on an empty message or a category outside
    /// the fixed set - no partial write happens.
    pub fn enqueue(
        &self,
        user_id: &str,
        message: &str,
        category: Option<&str>,
        context: serde_json::Map<String, serde_json::Value>,
    ) -> Result<String, NotificationError> {
        if message.is_empty() {
            return Err(NotificationError::Validation(
                "toast message must not be empty".to_string(),
            ));
        }
        let category = match category {
            None => ToastCategory::default(),
            Some(raw) => ToastCategory::parse(raw).ok_or_else(|| {
                NotificationError::Validation(format!("unknown toast category: {}", raw))
            })?,
        };

        let toast = Toast {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            message: message.to_string(),
            category,
            context,
            created_at: Utc::now().timestamp_millis(),
        };
        self.store
            .put_toast(&toast)
            .map_err(NotificationError::Storage)?;
        debug!(
            "Enqueued {} toast {} for user {}",
            category.as_str(),
            toast.id,
            user_id
        );
        Ok(toast.id)
    }

    /// Destructive drain: each toast is handed to at most one poll call.
    ///
    /// If the poller's transport fails after this returns, the batch is
    /// lost; that is the accepted trade-off of the stateless pull model.
    pub fn poll(&self, user_id: &str) -> Result<Vec<Toast>, NotificationError> {
        self.store
            .drain_toasts(user_id)
            .map_err(NotificationError::Storage)
    }
}
