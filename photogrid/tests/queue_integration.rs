//! Integration tests for the keyed fetch queue.
//!
//! These tests verify the queue end to end against a fake transport:
//! - At most one fetch per key (deduplication)
//! - Exactly one outcome per delivered fetch, none after cancel_all
//! - Bounded concurrency and FIFO admission
//! - Timeout, cancellation and retry scenarios

use photogrid::config::FetchConfig;
use photogrid::fetch::{AsyncHttpClient, FetchOutcome, NetworkError};
use photogrid::queue::KeyedFetchQueue;
use photogrid::PositionKey;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

// =============================================================================
// Test Helpers
// =============================================================================

/// Transport that sleeps, then answers with a PNG or an error.
///
/// Tracks how many requests are active at once and the order they started in.
#[derive(Clone, Default)]
struct FakeTransport {
    state: Arc<FakeState>,
}

#[derive(Default)]
struct FakeState {
    delay: Duration,
    /// Number of leading requests that fail
    fail_first: usize,
    calls: AtomicUsize,
    completed: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
    started: Mutex<Vec<String>>,
}

/// Decrements the active count even when the request future is dropped.
struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FakeTransport {
    fn new(delay: Duration) -> Self {
        Self::failing_first(delay, 0)
    }

    fn failing_first(delay: Duration, fail_first: usize) -> Self {
        Self {
            state: Arc::new(FakeState {
                delay,
                fail_first,
                ..Default::default()
            }),
        }
    }

    fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    fn completed(&self) -> usize {
        self.state.completed.load(Ordering::SeqCst)
    }

    fn peak(&self) -> usize {
        self.state.peak.load(Ordering::SeqCst)
    }

    fn started(&self) -> Vec<String> {
        self.state.started.lock().unwrap().clone()
    }
}

impl AsyncHttpClient for FakeTransport {
    async fn get(&self, url: &str) -> Result<Vec<u8>, NetworkError> {
        let call = self.state.calls.fetch_add(1, Ordering::SeqCst);
        self.state.started.lock().unwrap().push(url.to_string());

        let active = self.state.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.peak.fetch_max(active, Ordering::SeqCst);
        let _guard = ActiveGuard(&self.state.active);

        if !self.state.delay.is_zero() {
            tokio::time::sleep(self.state.delay).await;
        }
        self.state.completed.fetch_add(1, Ordering::SeqCst);

        if call < self.state.fail_first {
            Err(NetworkError::Transport("connection reset".to_string()))
        } else {
            Ok(png_bytes())
        }
    }
}

fn png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([0, 128, 255, 255]));
    let mut buffer = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buffer, image::ImageFormat::Png).unwrap();
    buffer.into_inner()
}

type Delivery = (PositionKey, FetchOutcome);

fn config(capacity: usize) -> FetchConfig {
    FetchConfig::new().with_max_concurrent(capacity)
}

fn url(key: PositionKey) -> String {
    format!("http://fake/{}/{}", key.section, key.item)
}

fn submit(
    queue: &KeyedFetchQueue<FakeTransport>,
    key: PositionKey,
    tx: &mpsc::UnboundedSender<Delivery>,
) -> bool {
    let tx = tx.clone();
    queue.submit(key, url(key), move |outcome| {
        let _ = tx.send((key, outcome));
    })
}

/// Collects every delivery until all callbacks are either called or dropped.
async fn drain(mut rx: mpsc::UnboundedReceiver<Delivery>) -> Vec<Delivery> {
    let mut delivered = Vec::new();
    while let Some(delivery) = rx.recv().await {
        delivered.push(delivery);
    }
    delivered
}

// =============================================================================
// Integration Tests
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_repeated_key_runs_once() {
    let transport = FakeTransport::new(Duration::from_millis(500));
    let queue = Arc::new(KeyedFetchQueue::new(transport.clone(), &config(4)));
    let (tx, rx) = mpsc::unbounded_channel();
    let key = PositionKey::new(0, 0);

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let queue = Arc::clone(&queue);
            let tx = tx.clone();
            std::thread::spawn(move || submit(&queue, key, &tx))
        })
        .collect();
    let admitted = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|admitted| *admitted)
        .count();
    drop(tx);

    let delivered = drain(rx).await;

    assert_eq!(admitted, 1, "exactly one submission should be admitted");
    assert_eq!(delivered.len(), 1);
    assert!(delivered[0].1.is_success());
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_capacity_four_with_140_keys() {
    let transport = FakeTransport::new(Duration::from_millis(10));
    let queue = KeyedFetchQueue::new(transport.clone(), &config(4));
    let (tx, rx) = mpsc::unbounded_channel();

    for item in 0..140 {
        assert!(submit(&queue, PositionKey::item(item), &tx));
    }
    assert_eq!(queue.in_flight_count(), 140, "table is not bounded by capacity");
    drop(tx);

    let delivered = drain(rx).await;

    assert_eq!(delivered.len(), 140);
    assert!(delivered.iter().all(|(_, outcome)| outcome.is_success()));
    assert_eq!(transport.peak(), 4, "exactly capacity fetches at steady state");
    assert_eq!(queue.stats().peak_running, 4);
    assert_eq!(queue.in_flight_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_admission_is_fifo() {
    let transport = FakeTransport::new(Duration::from_millis(5));
    let queue = KeyedFetchQueue::new(transport.clone(), &config(1));
    let (tx, rx) = mpsc::unbounded_channel();

    let keys: Vec<PositionKey> = (0..12).map(PositionKey::item).collect();
    for key in &keys {
        submit(&queue, *key, &tx);
    }
    drop(tx);
    drain(rx).await;

    let expected: Vec<String> = keys.iter().map(|k| url(*k)).collect();
    assert_eq!(transport.started(), expected);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_fails_and_clears_entry() {
    let transport = FakeTransport::new(Duration::from_secs(60));
    let queue = KeyedFetchQueue::new(transport, &config(2).with_timeout_secs(15));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let key = PositionKey::new(0, 0);

    submit(&queue, key, &tx);
    let (delivered_key, outcome) = rx.recv().await.unwrap();

    assert_eq!(delivered_key, key);
    assert_eq!(
        outcome,
        FetchOutcome::Failed(NetworkError::Timeout(Duration::from_secs(15)).into())
    );
    assert!(!queue.is_in_flight(key));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancel_before_response_never_succeeds() {
    let transport = FakeTransport::new(Duration::from_millis(100));
    let queue = KeyedFetchQueue::new(transport.clone(), &config(4));
    let (tx, rx) = mpsc::unbounded_channel();
    let key = PositionKey::new(3, 0);

    submit(&queue, key, &tx);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(queue.cancel(key));
    drop(tx);

    // Give the aborted request time to have finished had it not been aborted.
    tokio::time::sleep(Duration::from_millis(200)).await;
    let delivered = drain(rx).await;

    assert_eq!(delivered, vec![(key, FetchOutcome::Cancelled)]);
    assert_eq!(transport.completed(), 0, "the transport request should be aborted");
    assert_eq!(queue.stats().discarded, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failed_key_can_be_resubmitted() {
    let transport = FakeTransport::failing_first(Duration::ZERO, 1);
    let queue = KeyedFetchQueue::new(transport.clone(), &config(2));
    let key = PositionKey::new(1, 0);

    let (tx, mut rx) = mpsc::unbounded_channel();
    submit(&queue, key, &tx);
    let (_, first) = rx.recv().await.unwrap();
    assert!(first.is_failed());
    assert!(!queue.is_in_flight(key));

    assert!(submit(&queue, key, &tx), "retry must not be deduplicated");
    let (_, second) = rx.recv().await.unwrap();
    assert!(second.is_success());
    assert_eq!(transport.calls(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_resubmit_from_callback_is_admitted() {
    let transport = FakeTransport::new(Duration::ZERO);
    let queue = Arc::new(KeyedFetchQueue::new(transport.clone(), &config(2)));
    let (tx, rx) = mpsc::unbounded_channel();
    let readmitted = Arc::new(AtomicBool::new(false));
    let key = PositionKey::new(0, 7);

    let inner_queue = Arc::clone(&queue);
    let inner_tx = tx.clone();
    let flag = Arc::clone(&readmitted);
    queue.submit(key, url(key), move |first| {
        flag.store(submit(&inner_queue, key, &inner_tx), Ordering::SeqCst);
        let _ = inner_tx.send((key, first));
    });
    drop(tx);

    let delivered = drain(rx).await;

    assert!(readmitted.load(Ordering::SeqCst), "entry is removed before delivery");
    assert_eq!(delivered.len(), 2);
    assert!(delivered.iter().all(|(k, outcome)| *k == key && outcome.is_success()));
    assert_eq!(transport.calls(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cancel_all_empties_table_immediately() {
    let transport = FakeTransport::new(Duration::from_millis(100));
    let queue = KeyedFetchQueue::new(transport.clone(), &config(2));
    let (tx, rx) = mpsc::unbounded_channel();

    for item in 0..10 {
        submit(&queue, PositionKey::item(item), &tx);
    }
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(queue.cancel_all(), 10);
    assert_eq!(queue.in_flight_count(), 0);

    // Previously in-flight key is admitted straight away.
    let (fresh_tx, fresh_rx) = mpsc::unbounded_channel();
    assert!(submit(&queue, PositionKey::item(0), &fresh_tx));
    drop(tx);
    drop(fresh_tx);

    assert!(drain(rx).await.is_empty(), "cancelled batch delivers nothing");
    let fresh = drain(fresh_rx).await;
    assert_eq!(fresh.len(), 1);
    assert!(fresh[0].1.is_success());
    assert!(transport.calls() <= 3, "queued fetches never reach the transport");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cancel_all_racing_submissions_delivers_at_most_once() {
    let transport = FakeTransport::new(Duration::from_millis(2));
    let queue = Arc::new(KeyedFetchQueue::new(transport, &config(4)));
    let (tx, rx) = mpsc::unbounded_channel();

    let submitters: Vec<_> = (0..4u32)
        .map(|section| {
            let queue = Arc::clone(&queue);
            let tx = tx.clone();
            std::thread::spawn(move || {
                for item in 0..50 {
                    submit(&queue, PositionKey::new(section, item), &tx);
                }
            })
        })
        .collect();
    let canceller = {
        let queue = Arc::clone(&queue);
        std::thread::spawn(move || {
            for _ in 0..20 {
                queue.cancel_all();
                std::thread::yield_now();
            }
        })
    };
    for handle in submitters {
        handle.join().unwrap();
    }
    canceller.join().unwrap();
    drop(tx);

    let mut deliveries: HashMap<PositionKey, usize> = HashMap::new();
    for (key, _) in drain(rx).await {
        *deliveries.entry(key).or_default() += 1;
    }

    assert!(deliveries.values().all(|count| *count == 1));
    assert_eq!(queue.in_flight_count(), 0);
    let stats = queue.stats();
    assert_eq!(stats.submitted, 200);
    assert_eq!(stats.delivered + stats.cancelled, 200 - stats.deduplicated);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_dropping_queue_cancels_without_delivery() {
    let transport = FakeTransport::new(Duration::from_millis(100));
    let queue = KeyedFetchQueue::new(transport, &config(2));
    let (tx, rx) = mpsc::unbounded_channel();

    for item in 0..5 {
        submit(&queue, PositionKey::item(item), &tx);
    }
    drop(queue);
    drop(tx);

    assert!(drain(rx).await.is_empty());
}
