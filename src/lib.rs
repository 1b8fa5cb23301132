//! Notifications server library.
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod config;
pub mod push;
pub mod server;
pub mod sqlite_persistence;
pub mod store;
pub mod toasts;

mod error;

pub use error::NotificationError;
pub use server::{run_server, RequestsLoggingLevel};
pub use store::{NotificationStore, SqliteNotificationStore};
