//! Webhook gateway (axum).
//!
//! Authenticates inbound Telegram webhook calls, acknowledges them at once and
//! hands the update to the router as a detached task. Also exposes the two
//! maintenance endpoints that (un)register the webhook with Telegram.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, post},
    Router,
};
use tokio_util::task::TaskTracker;

use nfd_core::{
    config::Config,
    errors::Error,
    messaging::{port::WebhookPort, types::IncomingUpdate},
    router::MessageRouter,
};
use nfd_telegram::{parse_update, SECRET_HEADER};

pub const REGISTER_PATH: &str = "/registerWebhook";
pub const UNREGISTER_PATH: &str = "/unRegisterWebhook";

#[derive(Clone)]
pub struct GatewayState {
    pub cfg: Arc<Config>,
    pub router: Arc<MessageRouter>,
    pub webhook: Arc<dyn WebhookPort>,
    /// Background update tasks; closed and awaited on shutdown.
    pub tasks: TaskTracker,
}

impl GatewayState {
    pub fn new(
        cfg: Arc<Config>,
        router: Arc<MessageRouter>,
        webhook: Arc<dyn WebhookPort>,
    ) -> Self {
        Self {
            cfg,
            router,
            webhook,
            tasks: TaskTracker::new(),
        }
    }
}

pub fn app(state: GatewayState) -> Router {
    Router::new()
        .route(&state.cfg.webhook_path, post(handle_webhook))
        .route(REGISTER_PATH, any(register_webhook))
        .route(UNREGISTER_PATH, any(unregister_webhook))
        .fallback(no_handler)
        .with_state(state)
}

/// Router for an instance whose required configuration is missing: every
/// request gets the diagnostic with a 500.
pub fn unconfigured_app(diagnostic: impl Into<String>) -> Router {
    let diagnostic: Arc<str> = Arc::from(diagnostic.into());
    Router::new().fallback(unconfigured).with_state(diagnostic)
}

async fn unconfigured(State(diagnostic): State<Arc<str>>) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, diagnostic.to_string()).into_response()
}

async fn no_handler() -> Response {
    (StatusCode::OK, "No handler for this request").into_response()
}

fn secret_matches(headers: &HeaderMap, secret: &str) -> bool {
    headers
        .get(SECRET_HEADER)
        .is_some_and(|v| v.as_bytes() == secret.as_bytes())
}

async fn handle_webhook(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !secret_matches(&headers, &state.cfg.bot_secret) {
        tracing::warn!("webhook call with missing or wrong secret");
        return (StatusCode::FORBIDDEN, "Unauthorized").into_response();
    }

    let update = match parse_update(&body) {
        Ok(u) => u,
        Err(e) => {
            tracing::warn!(error = %e, "rejecting malformed webhook body");
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    // The ack below does not wait for this; Telegram gets "Ok" either way.
    let router = state.router.clone();
    state.tasks.spawn(process_update(router, update));

    (StatusCode::OK, "Ok").into_response()
}

/// Error sink for detached update processing.
async fn process_update(router: Arc<MessageRouter>, update: IncomingUpdate) {
    let update_id = update.update_id;
    match router.handle_update(update).await {
        Ok(outcome) => tracing::debug!(update_id, ?outcome, "update processed"),
        Err(e) => tracing::error!(update_id, error = %e, "update processing failed"),
    }
}

fn public_webhook_url(cfg: &Config, headers: &HeaderMap) -> Option<String> {
    let base = match &cfg.public_url {
        Some(u) => u.clone(),
        None => {
            let host = headers.get(header::HOST)?.to_str().ok()?;
            format!("https://{host}")
        }
    };
    Some(format!("{base}{}", cfg.webhook_path))
}

/// Platform failures carry the platform's text unwrapped; anything else
/// keeps its full description.
fn platform_text(e: &Error) -> String {
    match e {
        Error::External(raw) => raw.clone(),
        other => other.to_string(),
    }
}

async fn register_webhook(State(state): State<GatewayState>, headers: HeaderMap) -> Response {
    let Some(url) = public_webhook_url(&state.cfg, &headers) else {
        return (
            StatusCode::BAD_REQUEST,
            "cannot determine public url: set NFD_PUBLIC_URL or send a Host header",
        )
            .into_response();
    };

    match state
        .webhook
        .register_webhook(&url, &state.cfg.bot_secret)
        .await
    {
        Ok(()) => (StatusCode::OK, "Ok").into_response(),
        Err(e) => {
            tracing::warn!(error = %e, %url, "webhook registration failed");
            (StatusCode::BAD_GATEWAY, platform_text(&e)).into_response()
        }
    }
}

async fn unregister_webhook(State(state): State<GatewayState>) -> Response {
    match state.webhook.unregister_webhook().await {
        Ok(()) => (StatusCode::OK, "Ok").into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "webhook removal failed");
            (StatusCode::BAD_GATEWAY, platform_text(&e)).into_response()
        }
    }
}
