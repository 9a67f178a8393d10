//! Contract between the dispatcher and the external messaging session.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors reported by a session gateway
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The session is not connected
    #[error("session not connected")]
    NotConnected,

    /// Session start-up failed
    #[error("initialize failed: {0}")]
    Initialize(String),

    /// Sending a message failed
    #[error("send failed: {0}")]
    Send(String),

    /// Logging out / tearing the session down failed
    #[error("teardown failed: {0}")]
    Teardown(String),
}

/// Lifecycle notifications emitted by a gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    /// A one-time handshake code must be scanned to authorize the session
    HandshakeChallenge(String),
    /// Credentials were accepted; the session is still synchronizing
    Authenticated,
    /// The session is operational and can send messages
    Ready,
    /// Authentication was rejected
    AuthFailed(String),
    /// The session was lost or logged out
    Disconnected(String),
    /// A restart was requested; published by the dispatcher, not the gateway
    Restarting,
    /// `initialize` itself returned an error; published by the dispatcher
    StartFailed(String),
}

impl GatewayEvent {
    /// Short event name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayEvent::HandshakeChallenge(_) => "handshake_challenge",
            GatewayEvent::Authenticated => "authenticated",
            GatewayEvent::Ready => "ready",
            GatewayEvent::AuthFailed(_) => "auth_failed",
            GatewayEvent::Disconnected(_) => "disconnected",
            GatewayEvent::Restarting => "restarting",
            GatewayEvent::StartFailed(_) => "start_failed",
        }
    }
}

/// Channel a gateway uses to publish lifecycle events
pub type GatewayEventSender = mpsc::UnboundedSender<GatewayEvent>;

/// Capability exposed by the external messaging session.
///
/// Implementations report lifecycle changes through the
/// [`GatewayEventSender`] they were constructed with; the methods here only
/// start work and return its immediate outcome.
#[async_trait]
pub trait SessionGateway: Send + Sync + std::fmt::Debug {
    /// Start (or restart) the session
    async fn initialize(&self) -> Result<(), GatewayError>;

    /// Send a text message to an already normalized chat identifier.
    ///
    /// May suspend for as long as the underlying session needs; no timeout
    /// is applied by callers.
    async fn send_text(&self, chat_id: &str, body: &str) -> Result<(), GatewayError>;

    /// Log out and tear the session down
    async fn teardown(&self) -> Result<(), GatewayError>;
}
