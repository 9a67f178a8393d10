//! Aggregate dispatch counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time view of the dispatch queue
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    /// Jobs accepted since start
    pub queued: u64,
    /// Jobs handed to the gateway successfully
    pub sent: u64,
    /// Jobs discarded because the session was not ready
    pub dropped: u64,
    /// Jobs whose send failed at the gateway
    pub failed: u64,
    /// Jobs waiting in the queue right now
    pub pending: usize,
    /// Whether the drain worker is active
    pub draining: bool,
}

#[derive(Debug, Default)]
pub(crate) struct DispatchCounters {
    queued: AtomicU64,
    sent: AtomicU64,
    dropped: AtomicU64,
    failed: AtomicU64,
}

impl DispatchCounters {
    pub(crate) fn record_queued(&self) {
        self.queued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, pending: usize, draining: bool) -> DispatchStats {
        DispatchStats {
            queued: self.queued.load(Ordering::Relaxed),
            sent: self.sent.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            pending,
            draining,
        }
    }
}
