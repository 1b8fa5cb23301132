//! SQLite schema for the notifications database.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};

// =============================================================================
// Version 1 - Toasts and push subscriptions
// =============================================================================

/// Pending toasts, drained per user in creation order.
const TOASTS_TABLE_V1: Table = Table {
    name: "toasts",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("user_id", &SqlType::Text, non_null = true),
        sqlite_column!("message", &SqlType::Text, non_null = true),
        sqlite_column!("category", &SqlType::Text, non_null = true),
        sqlite_column!("context", &SqlType::Text, non_null = true),
        sqlite_column!("created_at", &SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_toasts_user_created", "user_id, created_at")],
};

/// Push subscriptions, keyed globally by endpoint.
const SUBSCRIPTIONS_TABLE_V1: Table = Table {
    name: "subscriptions",
    columns: &[
        sqlite_column!("endpoint", &SqlType::Text, is_primary_key = true),
        sqlite_column!("user_id", &SqlType::Text, non_null = true),
        sqlite_column!("keys", &SqlType::Text, non_null = true),
    ],
    indices: &[("idx_subscriptions_user", "user_id")],
};

pub const NOTIFICATIONS_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[TOASTS_TABLE_V1, SUBSCRIPTIONS_TABLE_V1],
    migration: None,
}];
