//! Gateway lifecycle event processing

use crate::gateway::GatewayEvent;
use crate::state::SharedSessionState;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Drain gateway events into the shared session state.
///
/// This is the only place gateway events mutate [`SharedSessionState`].
/// Returns once every sender has been dropped.
pub async fn run_event_processor(
    mut event_rx: mpsc::UnboundedReceiver<GatewayEvent>,
    state: SharedSessionState,
) {
    info!("Starting session event processor");

    while let Some(event) = event_rx.recv().await {
        debug!("Processing session event {}", event.kind());

        let phase = state.apply(&event).await;
        match &event {
            GatewayEvent::HandshakeChallenge(_) => {
                info!("Handshake code received, waiting for it to be scanned");
            }
            GatewayEvent::Authenticated => {
                info!("Session authenticated, synchronizing");
            }
            GatewayEvent::Ready => {
                info!("Session is ready (phase: {})", phase);
            }
            GatewayEvent::AuthFailed(reason) => {
                error!("Session authentication failed: {}", reason);
            }
            GatewayEvent::Disconnected(reason) => {
                warn!("Session disconnected: {}", reason);
            }
            GatewayEvent::Restarting => {
                info!("Session restarting");
            }
            GatewayEvent::StartFailed(reason) => {
                error!("Session failed to start: {}", reason);
            }
        }
    }

    warn!("Session event processor ended");
}
