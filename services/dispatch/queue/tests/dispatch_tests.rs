use async_trait::async_trait;
use dispatch_queue::{DispatchError, DispatchQueue, DispatchQueueConfig, PacingWindow};
use dispatch_session::{
    DryRunGateway, GatewayError, GatewayEvent, SessionGateway, SharedSessionState,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::time::Instant;

//===============
// Test Helpers
//===============

async fn ready_dry_run() -> (Arc<DryRunGateway>, SharedSessionState, mpsc::UnboundedReceiver<GatewayEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let gateway = Arc::new(DryRunGateway::new(tx));
    gateway.initialize().await.expect("dry-run initialize");
    let session = SharedSessionState::new();
    session.apply(&GatewayEvent::Ready).await;
    (gateway, session, rx)
}

fn queue(
    pacing: PacingWindow,
    session: SharedSessionState,
    gateway: Arc<dyn SessionGateway>,
) -> Arc<DispatchQueue> {
    let config = DispatchQueueConfig {
        pacing,
        ..Default::default()
    };
    Arc::new(DispatchQueue::new(config, session, gateway))
}

/// Gateway whose sends take a while and that records how many overlap
#[derive(Debug, Default)]
struct SlowGateway {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    sent: Mutex<Vec<String>>,
}

#[async_trait]
impl SessionGateway for SlowGateway {
    async fn initialize(&self) -> Result<(), GatewayError> {
        Ok(())
    }

    async fn send_text(&self, chat_id: &str, body: &str) -> Result<(), GatewayError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(750)).await;
        self.sent.lock().await.push(format!("{}:{}", chat_id, body));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }

    async fn teardown(&self) -> Result<(), GatewayError> {
        Ok(())
    }
}

/// Gateway that rejects any body containing "fail"
#[derive(Debug, Default)]
struct FlakyGateway {
    attempts: Mutex<Vec<(String, Instant)>>,
}

#[async_trait]
impl SessionGateway for FlakyGateway {
    async fn initialize(&self) -> Result<(), GatewayError> {
        Ok(())
    }

    async fn send_text(&self, _chat_id: &str, body: &str) -> Result<(), GatewayError> {
        self.attempts.lock().await.push((body.to_string(), Instant::now()));
        if body.contains("fail") {
            return Err(GatewayError::Send("rate limited".to_string()));
        }
        Ok(())
    }

    async fn teardown(&self) -> Result<(), GatewayError> {
        Ok(())
    }
}

//===============
// Scenarios
//===============

#[tokio::test(start_paused = true)]
async fn test_three_jobs_sent_in_order_with_paced_gaps() {
    let (gateway, session, _rx) = ready_dry_run().await;
    let window = PacingWindow::default();
    let queue = queue(window, session, gateway.clone());

    queue.enqueue("+5511000000001", "one").await.unwrap();
    queue.enqueue("+5511000000002", "two").await.unwrap();
    queue.enqueue("+5511000000003", "three").await.unwrap();

    queue.wait_idle().await;

    let sent = gateway.sent_messages().await;
    let bodies: Vec<_> = sent.iter().map(|m| m.body.as_str()).collect();
    assert_eq!(bodies, vec!["one", "two", "three"]);
    assert_eq!(sent[0].chat_id, "5511000000001@c.us");

    for pair in sent.windows(2) {
        let gap = pair[1].sent_at - pair[0].sent_at;
        assert!(window.contains(gap), "gap {:?} outside pacing window", gap);
    }

    let stats = queue.stats().await;
    assert_eq!(stats.sent, 3);
    assert_eq!(stats.pending, 0);
    assert!(!stats.draining);
}

#[tokio::test(start_paused = true)]
async fn test_job_dropped_while_disconnected() {
    let (gateway, session, _rx) = ready_dry_run().await;
    session
        .apply(&GatewayEvent::Disconnected("phone offline".to_string()))
        .await;
    let queue = queue(PacingWindow::default(), session, gateway.clone());

    queue.enqueue("123", "never delivered").await.unwrap();
    queue.wait_idle().await;

    assert!(gateway.sent_messages().await.is_empty());
    let stats = queue.stats().await;
    assert_eq!(stats.dropped, 1);
    assert_eq!(stats.sent, 0);
    assert!(queue.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn test_phase_is_read_when_job_is_popped() {
    let (gateway, session, _rx) = ready_dry_run().await;
    session
        .apply(&GatewayEvent::Disconnected("restarting".to_string()))
        .await;
    let queue = queue(
        PacingWindow::fixed(Duration::from_secs(5)),
        session.clone(),
        gateway.clone(),
    );

    // All three are accepted while disconnected
    queue.enqueue("1", "a").await.unwrap();
    queue.enqueue("2", "b").await.unwrap();
    queue.enqueue("3", "c").await.unwrap();

    // "a" is popped at t=0 and dropped; the session recovers before "b" is popped at t=5s
    tokio::time::sleep(Duration::from_secs(1)).await;
    session.apply(&GatewayEvent::Ready).await;

    queue.wait_idle().await;

    let bodies: Vec<_> = gateway
        .sent_messages()
        .await
        .into_iter()
        .map(|m| m.body)
        .collect();
    assert_eq!(bodies, vec!["b", "c"]);
    assert_eq!(queue.stats().await.dropped, 1);
}

#[tokio::test(start_paused = true)]
async fn test_job_dropped_if_session_lost_before_pop() {
    let (gateway, session, _rx) = ready_dry_run().await;
    let queue = queue(
        PacingWindow::fixed(Duration::from_secs(5)),
        session.clone(),
        gateway.clone(),
    );

    queue.enqueue("1", "a").await.unwrap();
    queue.enqueue("2", "b").await.unwrap();

    // "a" goes out at t=0; the session drops before "b" is popped at t=5s
    tokio::time::sleep(Duration::from_secs(1)).await;
    session
        .apply(&GatewayEvent::Disconnected("logged out".to_string()))
        .await;

    queue.wait_idle().await;

    let sent = gateway.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].body, "a");

    // Recovering afterwards does not resurrect the dropped job
    session.apply(&GatewayEvent::Ready).await;
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(gateway.sent_messages().await.len(), 1);
}

#[tokio::test]
async fn test_invalid_requests_leave_queue_untouched() {
    let (gateway, session, _rx) = ready_dry_run().await;
    let queue = queue(PacingWindow::default(), session, gateway.clone());

    let before = queue.len().await;
    assert!(matches!(
        queue.enqueue("", "hi").await,
        Err(DispatchError::InvalidRequest(_))
    ));
    assert!(matches!(
        queue.enqueue("123", "").await,
        Err(DispatchError::InvalidRequest(_))
    ));
    assert_eq!(queue.len().await, before);
    assert!(!queue.is_draining().await);
    assert_eq!(queue.stats().await.queued, 0);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_enqueues_keep_one_send_in_flight() {
    let gateway = Arc::new(SlowGateway::default());
    let session = SharedSessionState::new();
    session.apply(&GatewayEvent::Ready).await;
    let queue = queue(
        PacingWindow::new(Duration::from_millis(100), Duration::from_millis(300)).unwrap(),
        session,
        gateway.clone(),
    );

    let mut handles = Vec::new();
    for i in 0..25 {
        let queue = queue.clone();
        handles.push(tokio::spawn(async move {
            queue.enqueue(&format!("{}", i), "burst").await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    queue.wait_idle().await;

    assert_eq!(gateway.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(gateway.sent.lock().await.len(), 25);
    let stats = queue.stats().await;
    assert_eq!(stats.queued, 25);
    assert_eq!(stats.sent, 25);
}

#[tokio::test(start_paused = true)]
async fn test_gateway_failure_is_terminal_for_job_only() {
    let gateway = Arc::new(FlakyGateway::default());
    let session = SharedSessionState::new();
    session.apply(&GatewayEvent::Ready).await;
    let window = PacingWindow::default();
    let queue = queue(window, session, gateway.clone());

    queue.enqueue("1", "ok-1").await.unwrap();
    queue.enqueue("2", "fail").await.unwrap();
    queue.enqueue("3", "ok-2").await.unwrap();

    queue.wait_idle().await;

    let attempts = gateway.attempts.lock().await;
    let bodies: Vec<_> = attempts.iter().map(|(b, _)| b.as_str()).collect();
    // The failed job is attempted once and never retried
    assert_eq!(bodies, vec!["ok-1", "fail", "ok-2"]);
    for pair in attempts.windows(2) {
        assert!(window.contains(pair[1].1 - pair[0].1));
    }

    let stats = queue.stats().await;
    assert_eq!(stats.sent, 2);
    assert_eq!(stats.failed, 1);
}
