use axum::extract::FromRef;

use crate::push::{PushDispatcher, SubscriptionRegistry};
use crate::toasts::ToastQueue;
use std::sync::Arc;

use super::ServerConfig;

pub type GuardedToastQueue = Arc<ToastQueue>;
pub type GuardedSubscriptionRegistry = Arc<SubscriptionRegistry>;
pub type OptionalPushDispatcher = Option<Arc<PushDispatcher>>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub toast_queue: GuardedToastQueue,
    pub subscription_registry: GuardedSubscriptionRegistry,
    /// None when VAPID credentials are not configured; push requests then
    /// fail with a configuration error before any delivery attempt.
    pub push_dispatcher: OptionalPushDispatcher,
}

impl FromRef<ServerState> for GuardedToastQueue {
    fn from_ref(input: &ServerState) -> Self {
        input.toast_queue.clone()
    }
}

impl FromRef<ServerState> for GuardedSubscriptionRegistry {
    fn from_ref(input: &ServerState) -> Self {
        input.subscription_registry.clone()
    }
}

impl FromRef<ServerState> for OptionalPushDispatcher {
    fn from_ref(input: &ServerState) -> Self {
        input.push_dispatcher.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
