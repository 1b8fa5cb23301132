use anyhow::{Context, Result};
use std::sync::Arc;

use tracing::{error, info};

use crate::push::{PushDispatcher, SubscriptionDescriptor, SubscriptionRegistry};
use crate::store::NotificationStore;
use crate::toasts::ToastQueue;
use crate::NotificationError;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::state::*;
use super::{log_requests, ServerConfig};

/// User identifier as it appears on the wire: clients send either a string
/// or a bare integer; both normalize to the string identity.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum UserIdValue {
    Text(String),
    Number(i64),
}

impl UserIdValue {
    fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Number(n) => n.to_string(),
        }
    }
}

#[derive(Deserialize, Debug)]
struct CreateToastBody {
    user_id: UserIdValue,
    message: String,
    #[serde(rename = "type")]
    category: Option<String>,
    #[serde(default)]
    context: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize, Debug)]
struct PollToastsQuery {
    user_id: String,
}

#[derive(Deserialize, Debug)]
struct RegisterSubscriptionBody {
    user_id: UserIdValue,
    subscription: SubscriptionDescriptor,
}

#[derive(Deserialize, Debug)]
struct SendPushBody {
    user_id: UserIdValue,
    title: String,
    body: String,
    url: Option<String>,
    icon: Option<String>,
}

/// Toast as handed to the polling client; `user_id` stays server-side.
#[derive(Serialize)]
struct ToastItem {
    id: String,
    message: String,
    category: String,
    context: serde_json::Map<String, serde_json::Value>,
    created_at: i64,
}

impl From<crate::store::Toast> for ToastItem {
    fn from(toast: crate::store::Toast) -> Self {
        Self {
            id: toast.id,
            message: toast.message,
            category: toast.category.as_str().to_string(),
            context: toast.context,
            created_at: toast.created_at,
        }
    }
}

fn error_response(err: &NotificationError) -> Response {
    let status = match err {
        NotificationError::Validation(_) => StatusCode::BAD_REQUEST,
        NotificationError::Configuration(_) | NotificationError::Storage(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    // Storage details stay in the logs, not in the response body.
    let message = match err {
        NotificationError::Storage(inner) => {
            error!("Storage failure: {:#}", inner);
            "internal storage error".to_string()
        }
        other => other.to_string(),
    };
    (status, Json(json!({"ok": false, "error": message}))).into_response()
}

async fn create_toast(
    State(toast_queue): State<GuardedToastQueue>,
    Json(body): Json<CreateToastBody>,
) -> Response {
    let user_id = body.user_id.into_string();
    match toast_queue.enqueue(
        &user_id,
        &body.message,
        body.category.as_deref(),
        body.context,
    ) {
        Ok(id) => Json(json!({"ok": true, "id": id})).into_response(),
        Err(err) => error_response(&err),
    }
}

async fn poll_toasts(
    State(toast_queue): State<GuardedToastQueue>,
    Query(query): Query<PollToastsQuery>,
) -> Response {
    match toast_queue.poll(&query.user_id) {
        Ok(toasts) => {
            let items: Vec<ToastItem> = toasts.into_iter().map(ToastItem::from).collect();
            Json(json!({"ok": true, "items": items})).into_response()
        }
        Err(err) => error_response(&err),
    }
}

async fn register_subscription(
    State(registry): State<GuardedSubscriptionRegistry>,
    Json(body): Json<RegisterSubscriptionBody>,
) -> Response {
    let user_id = body.user_id.into_string();
    match registry.register(&user_id, body.subscription) {
        Ok(()) => Json(json!({"ok": true})).into_response(),
        Err(err) => error_response(&err),
    }
}

async fn send_push(
    State(dispatcher): State<OptionalPushDispatcher>,
    Json(body): Json<SendPushBody>,
) -> Response {
    let Some(dispatcher) = dispatcher else {
        return error_response(&NotificationError::Configuration(
            "VAPID keys are not configured".to_string(),
        ));
    };
    if body.title.is_empty() || body.body.is_empty() {
        return error_response(&NotificationError::Validation(
            "push title and body must not be empty".to_string(),
        ));
    }

    let user_id = body.user_id.into_string();
    let message = dispatcher.message(body.title, body.body, body.url, body.icon);
    match dispatcher.dispatch(&user_id, &message).await {
        Ok(summary) => {
            let mut response = json!({"ok": true, "sent": summary.delivered});
            if summary.failed > 0 {
                response["failed"] = summary.failed.into();
            }
            Json(response).into_response()
        }
        Err(err) => error_response(&err),
    }
}

async fn healthz() -> Response {
    Json(json!({"ok": true})).into_response()
}

pub fn make_app(
    config: ServerConfig,
    store: Arc<dyn NotificationStore>,
    push_dispatcher: Option<Arc<PushDispatcher>>,
) -> Router {
    let toast_queue = Arc::new(ToastQueue::new(store.clone()));
    let subscription_registry = Arc::new(SubscriptionRegistry::new(store));

    let state = ServerState {
        config,
        toast_queue,
        subscription_registry,
        push_dispatcher,
    };

    let notification_routes: Router = Router::new()
        .route("/toast", post(create_toast))
        .route("/toast", get(poll_toasts))
        .route("/register-subscription", post(register_subscription))
        .route("/push", post(send_push))
        .with_state(state.clone());

    Router::new()
        .route("/healthz", get(healthz))
        .nest("/api/notifications", notification_routes)
        .layer(middleware::from_fn_with_state(state, log_requests))
}

pub async fn run_server(
    config: ServerConfig,
    store: Arc<dyn NotificationStore>,
    push_dispatcher: Option<Arc<PushDispatcher>>,
) -> Result<()> {
    let app = make_app(config.clone(), store, push_dispatcher);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    info!("Listening on {}", listener.local_addr()?);

    Ok(axum::serve(listener, app).await?)
}
