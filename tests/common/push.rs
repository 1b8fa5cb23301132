//! Scripted push transport for end-to-end tests
//!
//! Stands in for the real web-push client so tests can simulate delivered,
//! gone and flaky endpoints without a push service.

use anyhow::Result;
use async_trait::async_trait;
use notifications_server::push::PushTransport;
use notifications_server::store::Subscription;
use std::collections::HashMap;
use std::sync::Mutex;

/// Push transport with per-endpoint scripted responses.
///
/// Endpoints without a scripted status respond 201 Created. Records every
/// attempted endpoint so tests can assert on attempt counts and ordering.
pub struct ScriptedPushTransport {
    responses: Mutex<HashMap<String, u16>>,
    attempts: Mutex<Vec<String>>,
}

impl ScriptedPushTransport {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            attempts: Mutex::new(Vec::new()),
        }
    }

    /// Script the status the push service returns for an endpoint.
    pub fn respond_with(&self, endpoint: &str, status: u16) {
        self.responses
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), status);
    }

    /// Every endpoint attempted so far, in attempt order.
    pub fn attempted_endpoints(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }
}

#[async_trait]
impl PushTransport for ScriptedPushTransport {
    async fn deliver(
        &self,
        subscription: &Subscription,
        _payload: &[u8],
        _ttl_secs: u32,
    ) -> Result<u16> {
        self.attempts
            .lock()
            .unwrap()
            .push(subscription.endpoint.clone());
        let status = self
            .responses
            .lock()
            .unwrap()
            .get(&subscription.endpoint)
            .copied()
            .unwrap_or(201);
        Ok(status)
    }
}
