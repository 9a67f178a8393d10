//! Request surface and HTTP routes for the chat dispatcher.
//!
//! [`DispatchContext`] owns the process-scoped session state, gateway and
//! dispatch queue; the axum handlers are thin adapters over it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;

pub use context::DispatchContext;
pub use error::ApiError;
pub use routes::create_router;
pub use server::{serve, ApiServerConfig};
