//! Single-consumer paced dispatch queue gated on session readiness.
//!
//! Send requests are appended to a FIFO queue and drained by exactly one
//! worker task. Before each send the worker checks the session phase; jobs
//! popped while the session is not ready are dropped. Consecutive jobs are
//! separated by a random delay drawn from the configured [`PacingWindow`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod job;
pub mod pacing;
pub mod queue;
pub mod stats;

pub use error::DispatchError;
pub use job::{normalize_recipient, SendJob, DEFAULT_CHAT_SUFFIX};
pub use pacing::PacingWindow;
pub use queue::{Accepted, DispatchQueue, DispatchQueueConfig};
pub use stats::DispatchStats;
