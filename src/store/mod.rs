//! Durable storage for toasts and push subscriptions.

mod models;
mod schema;
mod sqlite_store;

pub use models::{Subscription, Toast, ToastCategory};
pub use sqlite_store::SqliteNotificationStore;

use anyhow::Result;

/// Trait for notification storage backends.
///
/// The store owns every persisted record; the toast queue and the
/// subscription registry are access patterns over it, not separate owners.
pub trait NotificationStore: Send + Sync {
    /// Persist a toast. The caller assigns the id and creation timestamp.
    fn put_toast(&self, toast: &Toast) -> Result<()>;

    /// Atomically read and remove all pending toasts for a user, oldest
    /// first. Re-draining immediately yields an empty list.
    fn drain_toasts(&self, user_id: &str) -> Result<Vec<Toast>>;

    /// Insert or overwrite a subscription. The endpoint is the identity key:
    /// re-registering the same endpoint replaces the previous owner and
    /// credentials.
    fn upsert_subscription(&self, subscription: &Subscription) -> Result<()>;

    /// Snapshot of a user's subscriptions. An unknown user yields an empty
    /// list, not an error.
    fn subscriptions_for(&self, user_id: &str) -> Result<Vec<Subscription>>;

    /// Delete a subscription by endpoint. Deleting an absent endpoint is a
    /// no-op.
    fn delete_subscription(&self, endpoint: &str) -> Result<()>;
}
