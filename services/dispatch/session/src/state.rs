//! Session lifecycle state mirrored from gateway events

use crate::gateway::GatewayEvent;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Connection lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Session is starting up
    Initializing,
    /// A handshake code is waiting to be scanned
    AwaitingScan,
    /// Session can send messages
    Ready,
    /// Session was lost, logged out or failed to authenticate
    Disconnected,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Initializing => "initializing",
            Phase::AwaitingScan => "awaiting_scan",
            Phase::Ready => "ready",
            Phase::Disconnected => "disconnected",
        };
        f.write_str(name)
    }
}

/// Snapshot of the session lifecycle.
///
/// `handshake_token` is only ever present while `phase` is
/// [`Phase::AwaitingScan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Current phase
    pub phase: Phase,
    /// Pending handshake code, if any
    pub handshake_token: Option<String>,
    /// Human readable status, informational only
    pub message: String,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    /// State at process start
    pub fn new() -> Self {
        Self {
            phase: Phase::Initializing,
            handshake_token: None,
            message: "Session is starting".to_string(),
        }
    }

    /// Whether messages may be sent right now
    pub fn is_ready(&self) -> bool {
        self.phase == Phase::Ready
    }

    /// Apply a gateway event. Events are never rejected; the gateway's
    /// latest report wins.
    pub fn apply(&mut self, event: &GatewayEvent) {
        match event {
            GatewayEvent::HandshakeChallenge(token) => {
                self.phase = Phase::AwaitingScan;
                self.handshake_token = Some(token.clone());
                self.message = "Handshake code received, waiting for scan".to_string();
            }
            GatewayEvent::Authenticated => {
                self.message = "Authenticated, synchronizing session".to_string();
            }
            GatewayEvent::Ready => {
                self.enter(Phase::Ready, "Session connected and ready".to_string());
            }
            GatewayEvent::AuthFailed(reason) => {
                self.enter(Phase::Disconnected, format!("Authentication failed: {}", reason));
            }
            GatewayEvent::Disconnected(reason) => {
                self.enter(Phase::Disconnected, format!("Session disconnected: {}", reason));
            }
            GatewayEvent::Restarting => {
                self.enter(Phase::Initializing, "Session is restarting".to_string());
            }
            GatewayEvent::StartFailed(reason) => {
                self.enter(Phase::Disconnected, format!("Session failed to start: {}", reason));
            }
        }
    }

    fn enter(&mut self, phase: Phase, message: String) {
        self.phase = phase;
        self.message = message;
        if phase != Phase::AwaitingScan {
            self.handshake_token = None;
        }
    }
}

/// Shared handle to the process-wide session state
#[derive(Debug, Clone, Default)]
pub struct SharedSessionState {
    inner: Arc<RwLock<SessionState>>,
}

impl SharedSessionState {
    /// Create a handle in the initial phase
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone of the current state
    pub async fn snapshot(&self) -> SessionState {
        self.inner.read().await.clone()
    }

    /// Current phase
    pub async fn phase(&self) -> Phase {
        self.inner.read().await.phase
    }

    /// Apply a gateway event and return the resulting phase
    pub async fn apply(&self, event: &GatewayEvent) -> Phase {
        let mut state = self.inner.write().await;
        let previous = state.phase;
        state.apply(event);
        debug!("Session phase {} -> {} ({})", previous, state.phase, event.kind());
        state.phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_invariant_holds(state: &SessionState) -> bool {
        state.handshake_token.is_some() == (state.phase == Phase::AwaitingScan)
    }

    #[test]
    fn test_initial_state() {
        let state = SessionState::new();
        assert_eq!(state.phase, Phase::Initializing);
        assert!(state.handshake_token.is_none());
        assert!(!state.is_ready());
    }

    #[test]
    fn test_handshake_then_ready_clears_token() {
        let mut state = SessionState::new();

        state.apply(&GatewayEvent::HandshakeChallenge("2@abc".to_string()));
        assert_eq!(state.phase, Phase::AwaitingScan);
        assert_eq!(state.handshake_token.as_deref(), Some("2@abc"));

        state.apply(&GatewayEvent::Authenticated);
        assert_eq!(state.phase, Phase::AwaitingScan);
        assert!(state.message.contains("Authenticated"));

        state.apply(&GatewayEvent::Ready);
        assert_eq!(state.phase, Phase::Ready);
        assert!(state.handshake_token.is_none());
        assert!(state.is_ready());
    }

    #[test]
    fn test_resumed_session_goes_straight_to_ready() {
        let mut state = SessionState::new();
        state.apply(&GatewayEvent::Ready);
        assert_eq!(state.phase, Phase::Ready);
    }

    #[test]
    fn test_failures_disconnect_from_any_phase() {
        let mut state = SessionState::new();
        state.apply(&GatewayEvent::HandshakeChallenge("code".to_string()));
        state.apply(&GatewayEvent::AuthFailed("bad credentials".to_string()));
        assert_eq!(state.phase, Phase::Disconnected);
        assert!(state.handshake_token.is_none());
        assert!(state.message.contains("bad credentials"));

        state.apply(&GatewayEvent::Ready);
        state.apply(&GatewayEvent::Disconnected("NAVIGATION".to_string()));
        assert_eq!(state.phase, Phase::Disconnected);
    }

    #[test]
    fn test_unexpected_events_are_last_write_wins() {
        let mut state = SessionState::new();
        state.apply(&GatewayEvent::Disconnected("lost".to_string()));
        // A challenge while disconnected is still mirrored
        state.apply(&GatewayEvent::HandshakeChallenge("late".to_string()));
        assert_eq!(state.phase, Phase::AwaitingScan);
        assert_eq!(state.handshake_token.as_deref(), Some("late"));
    }

    #[test]
    fn test_reconnect_and_initialize_failure() {
        let mut state = SessionState::new();
        state.apply(&GatewayEvent::HandshakeChallenge("code".to_string()));
        state.apply(&GatewayEvent::Restarting);
        assert_eq!(state.phase, Phase::Initializing);
        assert!(state.handshake_token.is_none());

        state.apply(&GatewayEvent::StartFailed("browser crashed".to_string()));
        assert_eq!(state.phase, Phase::Disconnected);
        assert!(state.message.contains("browser crashed"));
    }

    #[test]
    fn test_token_invariant_across_event_sequence() {
        let events = vec![
            GatewayEvent::HandshakeChallenge("a".to_string()),
            GatewayEvent::Authenticated,
            GatewayEvent::HandshakeChallenge("b".to_string()),
            GatewayEvent::Ready,
            GatewayEvent::Authenticated,
            GatewayEvent::AuthFailed("x".to_string()),
            GatewayEvent::HandshakeChallenge("c".to_string()),
            GatewayEvent::Disconnected("y".to_string()),
            GatewayEvent::Restarting,
            GatewayEvent::HandshakeChallenge("d".to_string()),
            GatewayEvent::StartFailed("z".to_string()),
        ];

        let mut state = SessionState::new();
        for event in &events {
            state.apply(event);
            assert!(token_invariant_holds(&state), "invariant broken after {:?}", event);
        }
    }

    #[test]
    fn test_phase_serializes_screaming_case() {
        let json = serde_json::to_string(&Phase::AwaitingScan).unwrap();
        assert_eq!(json, "\"AWAITING_SCAN\"");
    }

    #[tokio::test]
    async fn test_shared_state_apply() {
        let shared = SharedSessionState::new();
        let clone = shared.clone();

        let phase = clone.apply(&GatewayEvent::Ready).await;
        assert_eq!(phase, Phase::Ready);
        assert_eq!(shared.phase().await, Phase::Ready);

        shared.apply(&GatewayEvent::Restarting).await;
        assert_eq!(clone.snapshot().await.phase, Phase::Initializing);
    }
}
