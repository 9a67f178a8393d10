//! Messaging session state, gateway contract and lifecycle event processing.
//!
//! The messaging session itself (connect, QR handshake, authentication, the
//! actual send primitive) lives behind the [`SessionGateway`] trait. This
//! crate mirrors the gateway's reported lifecycle into a [`SessionState`]
//! that the dispatch queue reads before every send.
//!
//! ## Example
//!
//! ```rust,no_run
//! use dispatch_session::{run_event_processor, DryRunGateway, SessionGateway, SharedSessionState};
//! use tokio::sync::mpsc;
//!
//! # async fn example() -> Result<(), dispatch_session::GatewayError> {
//! let (event_tx, event_rx) = mpsc::unbounded_channel();
//! let state = SharedSessionState::new();
//! tokio::spawn(run_event_processor(event_rx, state.clone()));
//!
//! let gateway = DryRunGateway::new(event_tx);
//! gateway.initialize().await?;
//! gateway.send_text("5511999999999@c.us", "hello").await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dry_run;
pub mod events;
pub mod gateway;
pub mod state;

pub use dry_run::{DryRunGateway, SentMessage};
pub use events::run_event_processor;
pub use gateway::{GatewayError, GatewayEvent, GatewayEventSender, SessionGateway};
pub use state::{Phase, SessionState, SharedSessionState};
