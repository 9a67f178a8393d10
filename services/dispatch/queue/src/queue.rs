//! Dispatch queue and its drain worker

use crate::error::DispatchError;
use crate::job::{SendJob, DEFAULT_CHAT_SUFFIX};
use crate::pacing::PacingWindow;
use crate::stats::{DispatchCounters, DispatchStats};
use dispatch_session::{Phase, SessionGateway, SharedSessionState};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Configuration for dispatch queue behavior
#[derive(Debug, Clone)]
pub struct DispatchQueueConfig {
    /// Delay window between consecutive jobs
    pub pacing: PacingWindow,
    /// Suffix appended to bare recipients
    pub chat_suffix: String,
}

impl Default for DispatchQueueConfig {
    fn default() -> Self {
        Self {
            pacing: PacingWindow::default(),
            chat_suffix: DEFAULT_CHAT_SUFFIX.to_string(),
        }
    }
}

/// Acknowledgment that a job entered the queue (not that it was delivered)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    /// Job identifier
    pub job_id: Uuid,
    /// Queue length right after the append
    pub queue_len: usize,
}

#[derive(Debug, Default)]
struct QueueInner {
    jobs: VecDeque<SendJob>,
    /// Held by the single drain worker; only flipped under this lock
    draining: bool,
}

/// FIFO send queue drained by a single paced worker
#[derive(Debug)]
pub struct DispatchQueue {
    config: DispatchQueueConfig,
    session: SharedSessionState,
    gateway: Arc<dyn SessionGateway>,
    inner: Mutex<QueueInner>,
    counters: DispatchCounters,
    draining_tx: watch::Sender<bool>,
}

impl DispatchQueue {
    /// Create a new dispatch queue
    pub fn new(
        config: DispatchQueueConfig,
        session: SharedSessionState,
        gateway: Arc<dyn SessionGateway>,
    ) -> Self {
        let (draining_tx, _) = watch::channel(false);
        Self {
            config,
            session,
            gateway,
            inner: Mutex::new(QueueInner::default()),
            counters: DispatchCounters::default(),
            draining_tx,
        }
    }

    /// Queue configuration
    pub fn config(&self) -> &DispatchQueueConfig {
        &self.config
    }

    /// Validate and append a job, starting the drain worker if it is idle.
    ///
    /// Returns as soon as the job is queued.
    pub async fn enqueue(self: &Arc<Self>, recipient: &str, body: &str) -> Result<Accepted, DispatchError> {
        let job = SendJob::new(recipient, body, &self.config.chat_suffix)?;
        let job_id = job.id;
        let chat_id = job.chat_id.clone();

        let (queue_len, start_worker) = {
            let mut inner = self.inner.lock().await;
            inner.jobs.push_back(job);
            let start_worker = !inner.draining;
            if start_worker {
                inner.draining = true;
                self.draining_tx.send_replace(true);
            }
            (inner.jobs.len(), start_worker)
        };
        self.counters.record_queued();

        info!("Message {} for {} queued (queue length: {})", job_id, chat_id, queue_len);

        if start_worker {
            debug!("Starting drain worker");
            let queue = Arc::clone(self);
            tokio::spawn(async move { queue.drain().await });
        }

        Ok(Accepted { job_id, queue_len })
    }

    /// Number of jobs waiting to be popped
    pub async fn len(&self) -> usize {
        self.inner.lock().await.jobs.len()
    }

    /// Whether no jobs are waiting
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Whether the drain worker is active
    pub async fn is_draining(&self) -> bool {
        self.inner.lock().await.draining
    }

    /// Current counters and queue depth
    pub async fn stats(&self) -> DispatchStats {
        let inner = self.inner.lock().await;
        self.counters.snapshot(inner.jobs.len(), inner.draining)
    }

    /// Wait until the drain worker has gone idle
    pub async fn wait_idle(&self) {
        let mut draining_rx = self.draining_tx.subscribe();
        // The sender lives in self, so the channel cannot close here
        let _ = draining_rx.wait_for(|draining| !*draining).await;
    }

    async fn drain(self: Arc<Self>) {
        loop {
            let job = {
                let mut inner = self.inner.lock().await;
                match inner.jobs.pop_front() {
                    Some(job) => job,
                    None => {
                        inner.draining = false;
                        self.draining_tx.send_replace(false);
                        debug!("Queue empty, drain worker going idle");
                        return;
                    }
                }
            };

            self.dispatch(job).await;

            let delay = self.config.pacing.next_delay();
            info!("Waiting {:.1}s before the next message", delay.as_secs_f64());
            tokio::time::sleep(delay).await;
        }
    }

    /// Send one popped job, gated on the session phase at pop time
    async fn dispatch(&self, job: SendJob) {
        let phase = self.session.phase().await;
        if phase != Phase::Ready {
            self.counters.record_dropped();
            warn!(
                "Message {} for {} not sent: {}",
                job.id,
                job.chat_id,
                DispatchError::NotReady(phase)
            );
            return;
        }

        debug!(
            "Sending message {} to {} (waited {:?})",
            job.id,
            job.chat_id,
            job.queued_at.elapsed()
        );

        match self.gateway.send_text(&job.chat_id, &job.body).await {
            Ok(()) => {
                self.counters.record_sent();
                info!("Message {} to {} sent", job.id, job.chat_id);
            }
            Err(e) => {
                self.counters.record_failed();
                error!("Failed to send message {} to {}: {}", job.id, job.chat_id, DispatchError::from(e));
            }
        }
    }
}
