//! Queued send requests and recipient normalization

use crate::error::DispatchError;
use tokio::time::Instant;
use uuid::Uuid;

/// Chat identifier suffix expected by the messaging session
pub const DEFAULT_CHAT_SUFFIX: &str = "@c.us";

/// A message waiting to be sent
#[derive(Debug, Clone)]
pub struct SendJob {
    /// Identifier used to correlate log lines
    pub id: Uuid,
    /// Recipient exactly as submitted
    pub recipient: String,
    /// Normalized chat identifier handed to the gateway
    pub chat_id: String,
    /// Message text
    pub body: String,
    /// When the job entered the queue
    pub queued_at: Instant,
}

impl SendJob {
    /// Validate input and build a job with its canonical chat identifier
    pub fn new(recipient: &str, body: &str, chat_suffix: &str) -> Result<Self, DispatchError> {
        let chat_id = normalize_recipient(recipient, chat_suffix)
            .ok_or_else(|| DispatchError::InvalidRequest("recipient is required".to_string()))?;

        if body.is_empty() {
            return Err(DispatchError::InvalidRequest("body is required".to_string()));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            recipient: recipient.to_string(),
            chat_id,
            body: body.to_string(),
            queued_at: Instant::now(),
        })
    }
}

/// Turn a phone-number style recipient into a chat identifier.
///
/// Trims whitespace, strips one leading `+` and appends `chat_suffix` unless
/// the identifier already names a domain. Returns `None` when nothing is left.
pub fn normalize_recipient(recipient: &str, chat_suffix: &str) -> Option<String> {
    let trimmed = recipient.trim();
    let id = trimmed.strip_prefix('+').unwrap_or(trimmed).trim();

    if id.is_empty() || id.starts_with('@') {
        return None;
    }

    if id.contains('@') {
        Some(id.to_string())
    } else {
        Some(format!("{}{}", id, chat_suffix))
    }
}
