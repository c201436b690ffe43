//! Ordered, single-consumer click event pipeline.
//!
//! Redirect handlers submit [`ClickEvent`]s without waiting for them to be
//! processed. Events are delivered to the injected [`ClickSink`] strictly in
//! submission order, one at a time, so the sink never sees concurrent writes.
//!
//! # State machine
//!
//! ```text
//!          submit (queue was idle)
//!   Idle ─────────────────────────────▶ Draining ──┐ submit: enqueue only
//!    ▲                                     │  ◀────┘
//!    └──────────── queue empty ────────────┘
//! ```
//!
//! The queue and the state flag live under one lock, so a submit racing with
//! the consumer's final "queue is empty" check either lands before it (and is
//! drained) or observes `Idle` and starts a new consumer. Exactly one consumer
//! task exists while the state is `Draining`.
//!
//! # Overflow
//!
//! The queue is bounded. When full, new events are dropped and counted
//! (`click_events_dropped_total`); the producer is never blocked.
//!
//! # Shutdown
//!
//! Events live in memory only. [`ClickPipeline::flush`] waits, up to a timeout,
//! for the queue to drain; the server calls it during graceful shutdown.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use metrics::counter;
use serde::Serialize;
use tokio::sync::Notify;
use tracing::{debug, error, warn};

use crate::domain::click_event::ClickEvent;
use crate::domain::click_sink::ClickSink;

/// Consumer state of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineState {
    /// No events queued and no consumer running.
    Idle,
    /// A consumer task is dequeuing and processing events.
    Draining,
}

/// Result of [`ClickPipeline::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The pipeline was idle; the event was queued and a consumer started.
    Started,
    /// A consumer is already running; the event was queued behind it.
    Enqueued,
    /// The queue was full and the event was discarded.
    Dropped,
}

/// Point-in-time counters for health reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub state: PipelineState,
    pub queued: usize,
    pub capacity: usize,
    pub processed: u64,
    pub failed: u64,
    pub dropped: u64,
}

struct Queue {
    events: VecDeque<ClickEvent>,
    state: PipelineState,
}

struct Inner {
    queue: Mutex<Queue>,
    sink: Arc<dyn ClickSink>,
    capacity: usize,
    idle: Notify,
    processed: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

impl Inner {
    fn lock_queue(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to the click pipeline. Cloning shares the same queue and consumer.
#[derive(Clone)]
pub struct ClickPipeline {
    inner: Arc<Inner>,
}

impl ClickPipeline {
    /// Creates an idle pipeline delivering to `sink`, holding at most
    /// `capacity` pending events.
    pub fn new(sink: Arc<dyn ClickSink>, capacity: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                queue: Mutex::new(Queue {
                    events: VecDeque::new(),
                    state: PipelineState::Idle,
                }),
                sink,
                capacity: capacity.max(1),
                idle: Notify::new(),
                processed: AtomicU64::new(0),
                failed: AtomicU64::new(0),
                dropped: AtomicU64::new(0),
            }),
        }
    }

    /// Queues an event without waiting for it to be processed.
    ///
    /// Safe to call from any number of tasks concurrently. Must be called from
    /// within a Tokio runtime, since submitting to an idle pipeline spawns the
    /// consumer task.
    pub fn submit(&self, event: ClickEvent) -> SubmitOutcome {
        let start_consumer = {
            let mut queue = self.inner.lock_queue();

            if queue.events.len() >= self.inner.capacity {
                drop(queue);
                self.inner.dropped.fetch_add(1, Ordering::Relaxed);
                counter!("click_events_dropped_total").increment(1);
                warn!(slug = %event.slug, "Click queue full, dropping event");
                return SubmitOutcome::Dropped;
            }

            queue.events.push_back(event);

            match queue.state {
                PipelineState::Idle => {
                    queue.state = PipelineState::Draining;
                    true
                }
                PipelineState::Draining => false,
            }
        };

        if start_consumer {
            tokio::spawn(drain(self.inner.clone()));
            SubmitOutcome::Started
        } else {
            SubmitOutcome::Enqueued
        }
    }

    /// Waits until the pipeline is idle.
    ///
    /// Returns `false` if events were still pending when `timeout` elapsed.
    pub async fn flush(&self, timeout: Duration) -> bool {
        let wait_idle = async {
            loop {
                let notified = self.inner.idle.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();

                if self.state() == PipelineState::Idle {
                    return;
                }

                notified.await;
            }
        };

        tokio::time::timeout(timeout, wait_idle).await.is_ok()
    }

    pub fn state(&self) -> PipelineState {
        self.inner.lock_queue().state
    }

    /// Number of events waiting to be processed.
    pub fn queued(&self) -> usize {
        self.inner.lock_queue().events.len()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Returns true when the next submit would be dropped.
    pub fn is_saturated(&self) -> bool {
        self.queued() >= self.inner.capacity
    }

    pub fn stats(&self) -> PipelineStats {
        let (state, queued) = {
            let queue = self.inner.lock_queue();
            (queue.state, queue.events.len())
        };

        PipelineStats {
            state,
            queued,
            capacity: self.inner.capacity,
            processed: self.inner.processed.load(Ordering::Relaxed),
            failed: self.inner.failed.load(Ordering::Relaxed),
            dropped: self.inner.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Consumer loop. Runs until the queue is observed empty, then marks the
/// pipeline idle under the same lock.
async fn drain(inner: Arc<Inner>) {
    debug!("Click pipeline draining");

    loop {
        let next = {
            let mut queue = inner.lock_queue();
            let next = queue.events.pop_front();
            if next.is_none() {
                queue.state = PipelineState::Idle;
            }
            next
        };

        let Some(event) = next else {
            break;
        };

        // Each event runs in its own task so a panicking sink loses one event,
        // not the consumer.
        let sink = inner.sink.clone();
        let slug = event.slug.clone();
        let outcome = tokio::spawn(async move { sink.record(&event).await }).await;

        match outcome {
            Ok(Ok(())) => {
                inner.processed.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Err(e)) => {
                inner.failed.fetch_add(1, Ordering::Relaxed);
                counter!("click_events_failed_total").increment(1);
                warn!(slug = %slug, error = %e, "Failed to process click event");
            }
            Err(e) => {
                inner.failed.fetch_add(1, Ordering::Relaxed);
                counter!("click_events_failed_total").increment(1);
                error!(slug = %slug, error = %e, "Click sink task aborted");
            }
        }
    }

    inner.idle.notify_waiters();
    debug!("Click pipeline idle");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::click_sink::ClickSinkError;
    use async_trait::async_trait;
    use tokio::sync::Semaphore;

    /// Sink that records slugs and can be held closed by a semaphore.
    struct GatedSink {
        gate: Arc<Semaphore>,
        seen: Mutex<Vec<String>>,
        fail_on: Option<String>,
    }

    impl GatedSink {
        fn open() -> Arc<Self> {
            Self::with_permits(Semaphore::MAX_PERMITS)
        }

        fn with_permits(permits: usize) -> Arc<Self> {
            Arc::new(Self {
                gate: Arc::new(Semaphore::new(permits)),
                seen: Mutex::new(Vec::new()),
                fail_on: None,
            })
        }

        fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ClickSink for GatedSink {
        async fn record(&self, event: &ClickEvent) -> Result<(), ClickSinkError> {
            let permit = self.gate.acquire().await.unwrap();
            permit.forget();

            self.seen.lock().unwrap().push(event.slug.clone());

            if self.fail_on.as_deref() == Some(event.slug.as_str()) {
                return Err(ClickSinkError::Storage("boom".to_string()));
            }
            if event.slug == "panic" {
                panic!("sink panicked");
            }
            Ok(())
        }
    }

    fn event(slug: &str) -> ClickEvent {
        ClickEvent::new(slug.to_string(), None, None)
    }

    #[tokio::test]
    async fn test_new_pipeline_is_idle() {
        let pipeline = ClickPipeline::new(GatedSink::open(), 10);

        assert_eq!(pipeline.state(), PipelineState::Idle);
        assert_eq!(pipeline.queued(), 0);
        assert!(pipeline.flush(Duration::from_millis(10)).await);
    }

    #[tokio::test]
    async fn test_first_submit_starts_consumer_then_enqueues() {
        let sink = GatedSink::with_permits(0);
        let pipeline = ClickPipeline::new(sink.clone(), 10);

        assert_eq!(pipeline.submit(event("a")), SubmitOutcome::Started);
        assert_eq!(pipeline.state(), PipelineState::Draining);
        assert_eq!(pipeline.submit(event("b")), SubmitOutcome::Enqueued);
        assert_eq!(pipeline.submit(event("c")), SubmitOutcome::Enqueued);

        sink.gate.add_permits(3);
        assert!(pipeline.flush(Duration::from_secs(2)).await);

        assert_eq!(pipeline.state(), PipelineState::Idle);
        assert_eq!(sink.seen(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_restarts_after_returning_to_idle() {
        let sink = GatedSink::open();
        let pipeline = ClickPipeline::new(sink.clone(), 10);

        pipeline.submit(event("first"));
        assert!(pipeline.flush(Duration::from_secs(2)).await);

        assert_eq!(pipeline.submit(event("second")), SubmitOutcome::Started);
        assert!(pipeline.flush(Duration::from_secs(2)).await);

        assert_eq!(sink.seen(), vec!["first", "second"]);
        assert_eq!(pipeline.stats().processed, 2);
    }

    #[tokio::test]
    async fn test_failed_event_does_not_halt_pipeline() {
        let sink = Arc::new(GatedSink {
            gate: Arc::new(Semaphore::new(Semaphore::MAX_PERMITS)),
            seen: Mutex::new(Vec::new()),
            fail_on: Some("bad".to_string()),
        });
        let pipeline = ClickPipeline::new(sink.clone(), 10);

        pipeline.submit(event("one"));
        pipeline.submit(event("bad"));
        pipeline.submit(event("two"));
        assert!(pipeline.flush(Duration::from_secs(2)).await);

        assert_eq!(sink.seen(), vec!["one", "bad", "two"]);
        let stats = pipeline.stats();
        assert_eq!(stats.processed, 2);
        assert_eq!(stats.failed, 1);
    }

    #[tokio::test]
    async fn test_panicking_sink_does_not_halt_pipeline() {
        let sink = GatedSink::open();
        let pipeline = ClickPipeline::new(sink.clone(), 10);

        pipeline.submit(event("panic"));
        pipeline.submit(event("after"));
        assert!(pipeline.flush(Duration::from_secs(2)).await);

        assert_eq!(sink.seen(), vec!["panic", "after"]);
        assert_eq!(pipeline.stats().failed, 1);
        assert_eq!(pipeline.stats().processed, 1);
    }

    #[tokio::test]
    async fn test_full_queue_drops_new_events() {
        let sink = GatedSink::with_permits(0);
        let pipeline = ClickPipeline::new(sink.clone(), 2);

        pipeline.submit(event("a"));
        // The consumer may or may not have dequeued "a" yet; fill until full.
        while !pipeline.is_saturated() {
            pipeline.submit(event("filler"));
        }
        assert_eq!(pipeline.submit(event("overflow")), SubmitOutcome::Dropped);
        assert_eq!(pipeline.stats().dropped, 1);

        sink.gate.add_permits(Semaphore::MAX_PERMITS / 2);
        assert!(pipeline.flush(Duration::from_secs(2)).await);
        assert!(!sink.seen().contains(&"overflow".to_string()));
    }

    #[tokio::test]
    async fn test_flush_times_out_while_blocked() {
        let sink = GatedSink::with_permits(0);
        let pipeline = ClickPipeline::new(sink.clone(), 10);

        pipeline.submit(event("stuck"));

        assert!(!pipeline.flush(Duration::from_millis(50)).await);
        assert_eq!(pipeline.state(), PipelineState::Draining);

        sink.gate.add_permits(1);
        assert!(pipeline.flush(Duration::from_secs(2)).await);
    }

    #[tokio::test]
    async fn test_capacity_is_at_least_one() {
        let pipeline = ClickPipeline::new(GatedSink::open(), 0);
        assert_eq!(pipeline.capacity(), 1);
    }
}
