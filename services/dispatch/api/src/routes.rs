//! Router definition for the dispatcher endpoints

use crate::context::DispatchContext;
use crate::handlers;
use axum::{routing::*, Router};

/// Build the router for every dispatcher endpoint.
pub fn create_router(ctx: DispatchContext) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/status", get(handlers::status))
        .route("/send-message", post(handlers::send_message))
        .route("/reconnect", post(handlers::reconnect))
        .route("/logout", post(handlers::logout))
        .route("/queue", get(handlers::queue_stats))
        .with_state(ctx)
}
