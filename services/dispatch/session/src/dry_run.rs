//! Gateway that logs and records sends instead of talking to a real session.
//!
//! Used as the default gateway of the binary and throughout the tests.

use crate::gateway::{GatewayError, GatewayEvent, GatewayEventSender, SessionGateway};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// A message accepted by the [`DryRunGateway`]
#[derive(Debug, Clone)]
pub struct SentMessage {
    /// Normalized chat identifier
    pub chat_id: String,
    /// Message text
    pub body: String,
    /// When the send was issued
    pub sent_at: Instant,
}

/// Gateway that pretends to be a messaging session
#[derive(Debug)]
pub struct DryRunGateway {
    events: GatewayEventSender,
    require_scan: bool,
    connected: AtomicBool,
    sent: Mutex<Vec<SentMessage>>,
}

impl DryRunGateway {
    /// Create a gateway that becomes ready as soon as it is initialized
    pub fn new(events: GatewayEventSender) -> Self {
        Self {
            events,
            require_scan: false,
            connected: AtomicBool::new(false),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Require a handshake scan (see [`DryRunGateway::confirm_scan`]) before
    /// the session becomes ready
    pub fn with_required_scan(mut self, require_scan: bool) -> Self {
        self.require_scan = require_scan;
        self
    }

    /// Complete a pending handshake as if the code had been scanned
    pub fn confirm_scan(&self) {
        self.connected.store(true, Ordering::SeqCst);
        self.emit(GatewayEvent::Authenticated);
        self.emit(GatewayEvent::Ready);
    }

    /// Drop the session as if the far end had closed it
    pub fn simulate_disconnect(&self, reason: &str) {
        self.connected.store(false, Ordering::SeqCst);
        self.emit(GatewayEvent::Disconnected(reason.to_string()));
    }

    /// Every message sent so far, in send order
    pub async fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    fn emit(&self, event: GatewayEvent) {
        if let Err(e) = self.events.send(event) {
            warn!("Failed to publish session event {}: receiver closed", e.0.kind());
        }
    }
}

#[async_trait]
impl SessionGateway for DryRunGateway {
    async fn initialize(&self) -> Result<(), GatewayError> {
        info!("Initializing dry-run session");
        self.connected.store(false, Ordering::SeqCst);

        if self.require_scan {
            let token = Uuid::new_v4().simple().to_string();
            self.emit(GatewayEvent::HandshakeChallenge(token));
        } else {
            self.confirm_scan();
        }
        Ok(())
    }

    async fn send_text(&self, chat_id: &str, body: &str) -> Result<(), GatewayError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(GatewayError::NotConnected);
        }

        info!("[dry-run] message to {} ({} chars)", chat_id, body.chars().count());
        self.sent.lock().await.push(SentMessage {
            chat_id: chat_id.to_string(),
            body: body.to_string(),
            sent_at: Instant::now(),
        });
        Ok(())
    }

    async fn teardown(&self) -> Result<(), GatewayError> {
        info!("Logging out of dry-run session");
        self.simulate_disconnect("logged out");
        Ok(())
    }
}
