//! HTTP handlers for status, send, reconnect and logout endpoints.

use crate::context::DispatchContext;
use crate::error::ApiError;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use dispatch_queue::DispatchStats;
use dispatch_session::SessionState;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

/// Recipient as sent by callers: a chat identifier string or a bare
/// numeric phone number
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RecipientField {
    /// `"5511999990000"`, `"+55 11..."` or `"1234@g.us"`
    Text(String),
    /// `5511999990000`
    Number(u64),
}

impl RecipientField {
    fn into_string(self) -> String {
        match self {
            RecipientField::Text(text) => text,
            RecipientField::Number(number) => number.to_string(),
        }
    }
}

/// Body of `POST /send-message`
#[derive(Debug, Default, Deserialize)]
pub struct SendMessageRequest {
    /// Destination phone number or chat identifier
    #[serde(default, alias = "phone_number")]
    pub recipient: Option<RecipientField>,
    /// Message text
    #[serde(default, alias = "message")]
    pub body: Option<String>,
}

/// Report the current session state.
pub async fn status(State(ctx): State<DispatchContext>) -> Json<SessionState> {
    Json(ctx.status().await)
}

/// Queue a message and acknowledge it without waiting for delivery.
pub async fn send_message(
    State(ctx): State<DispatchContext>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(request) = payload?;
    let recipient = request
        .recipient
        .map(RecipientField::into_string)
        .unwrap_or_default();
    let body = request.body.unwrap_or_default();

    let accepted = ctx.enqueue(&recipient, &body).await?;
    debug!("Accepted message {} (queue length {})", accepted.job_id, accepted.queue_len);

    Ok((StatusCode::ACCEPTED, Json(json!({ "status": "queued" }))))
}

/// Restart the messaging session.
pub async fn reconnect(State(ctx): State<DispatchContext>) -> (StatusCode, Json<Value>) {
    ctx.reconnect().await;
    (
        StatusCode::ACCEPTED,
        Json(json!({ "success": true, "message": "Session restart started" })),
    )
}

/// Log out of the messaging session.
pub async fn logout(State(ctx): State<DispatchContext>) -> Result<Json<Value>, ApiError> {
    ctx.logout().await?;
    Ok(Json(json!({ "success": true, "message": "Session logged out" })))
}

/// Report dispatch queue counters.
pub async fn queue_stats(State(ctx): State<DispatchContext>) -> Json<DispatchStats> {
    Json(ctx.queue_stats().await)
}
