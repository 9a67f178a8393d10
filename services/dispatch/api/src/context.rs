//! Process-scoped dispatch context shared by every request handler

use dispatch_queue::{Accepted, DispatchError, DispatchQueue, DispatchQueueConfig, DispatchStats};
use dispatch_session::{
    GatewayError, GatewayEvent, GatewayEventSender, SessionGateway, SessionState, SharedSessionState,
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Session state, gateway and queue bundled for the request surface
#[derive(Debug, Clone)]
pub struct DispatchContext {
    session: SharedSessionState,
    gateway: Arc<dyn SessionGateway>,
    events: GatewayEventSender,
    queue: Arc<DispatchQueue>,
}

impl DispatchContext {
    /// Create a context and its dispatch queue.
    ///
    /// `events` must feed the same event processor as the gateway so that
    /// restarts are ordered with the gateway's own reports.
    pub fn new(
        session: SharedSessionState,
        gateway: Arc<dyn SessionGateway>,
        events: GatewayEventSender,
        queue_config: DispatchQueueConfig,
    ) -> Self {
        let queue = Arc::new(DispatchQueue::new(queue_config, session.clone(), gateway.clone()));
        Self {
            session,
            gateway,
            events,
            queue,
        }
    }

    /// Shared session state
    pub fn session(&self) -> &SharedSessionState {
        &self.session
    }

    /// Dispatch queue
    pub fn queue(&self) -> &Arc<DispatchQueue> {
        &self.queue
    }

    /// Start the gateway; a failure leaves the session disconnected
    pub async fn initialize(&self) -> Result<(), GatewayError> {
        info!("Initializing messaging session");
        let result = self.gateway.initialize().await;
        if let Err(e) = &result {
            error!("Messaging session failed to start: {}", e);
            self.publish(GatewayEvent::StartFailed(e.to_string()));
        }
        result
    }

    /// Accept a message for paced delivery
    pub async fn enqueue(&self, recipient: &str, body: &str) -> Result<Accepted, DispatchError> {
        self.queue.enqueue(recipient, body).await
    }

    /// Current session state
    pub async fn status(&self) -> SessionState {
        self.session.snapshot().await
    }

    /// Move the session back to `Initializing` and restart the gateway in
    /// the background. Safe to call from any phase.
    pub async fn reconnect(&self) {
        info!("Reconnect requested");
        self.publish(GatewayEvent::Restarting);

        let context = self.clone();
        tokio::spawn(async move {
            // Failures are published as StartFailed
            let _ = context.initialize().await;
        });
    }

    /// Log out of the messaging session. Queued jobs are kept and will be
    /// dropped by the readiness check once the gateway reports the loss.
    pub async fn logout(&self) -> Result<(), GatewayError> {
        info!("Logout requested");
        self.gateway.teardown().await.map_err(|e| {
            error!("Logout failed: {}", e);
            e
        })
    }

    /// Aggregate queue counters
    pub async fn queue_stats(&self) -> DispatchStats {
        self.queue.stats().await
    }

    fn publish(&self, event: GatewayEvent) {
        if let Err(e) = self.events.send(event) {
            warn!("Failed to publish session event {}: processor stopped", e.0.kind());
        }
    }
}
