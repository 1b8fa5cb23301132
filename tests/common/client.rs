//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all notification endpoints.
//!
//! When API routes or request formats change, update only this file.

use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 5;

/// HTTP test client for the notifications API
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// POST /api/notifications/toast with an arbitrary body
    pub async fn post_toast(&self, body: &Value) -> Response {
        self.client
            .post(format!("{}/api/notifications/toast", self.base_url))
            .json(body)
            .send()
            .await
            .expect("Create toast request failed")
    }

    /// POST /api/notifications/toast with the common fields filled in
    pub async fn create_toast(&self, user_id: &str, message: &str, category: &str) -> Response {
        self.post_toast(&json!({
            "user_id": user_id,
            "message": message,
            "type": category,
        }))
        .await
    }

    /// GET /api/notifications/toast?user_id=...
    pub async fn poll_toasts(&self, user_id: &str) -> Response {
        self.client
            .get(format!("{}/api/notifications/toast", self.base_url))
            .query(&[("user_id", user_id)])
            .send()
            .await
            .expect("Poll toasts request failed")
    }

    /// Polls and returns the toast items, asserting a 200 response.
    pub async fn poll_toast_items(&self, user_id: &str) -> Vec<Value> {
        let response = self.poll_toasts(user_id).await;
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body: Value = response.json().await.expect("Invalid poll response body");
        body["items"]
            .as_array()
            .expect("Poll response missing items array")
            .clone()
    }

    /// POST /api/notifications/register-subscription
    pub async fn register_subscription(&self, user_id: &str, subscription: Value) -> Response {
        self.client
            .post(format!(
                "{}/api/notifications/register-subscription",
                self.base_url
            ))
            .json(&json!({
                "user_id": user_id,
                "subscription": subscription,
            }))
            .send()
            .await
            .expect("Register subscription request failed")
    }

    /// POST /api/notifications/push with an arbitrary body
    pub async fn send_push(&self, body: &Value) -> Response {
        self.client
            .post(format!("{}/api/notifications/push", self.base_url))
            .json(body)
            .send()
            .await
            .expect("Send push request failed")
    }

    /// POST /api/notifications/push with title and body filled in
    pub async fn push(&self, user_id: &str, title: &str, body: &str) -> Response {
        self.send_push(&json!({
            "user_id": user_id,
            "title": title,
            "body": body,
        }))
        .await
    }

    /// GET /healthz
    pub async fn healthz(&self) -> Response {
        self.client
            .get(format!("{}/healthz", self.base_url))
            .send()
            .await
            .expect("Healthz request failed")
    }
}
