//! Background delivery queue.
//!
//! Decouples scoring (fast, synchronous) from delivery (slow, I/O-bound):
//! the rotation loop enqueues a job and moves on to the next session; a
//! dedicated worker task drains the queue and reports outcomes back on an
//! event channel.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::{Delivery, DeliveryOutcome};
use crate::content::ContentState;

/// Queue depth. Enqueueing beyond this drops the job (the next tick will
/// produce a fresh payload anyway).
const QUEUE_CAPACITY: usize = 256;

/// One pending delivery.
#[derive(Debug, Clone)]
pub struct DeliveryJob {
    pub id: Uuid,
    /// Registry key of the session this payload belongs to.
    pub device_ref: String,
    /// Transport address (push target).
    pub target: String,
    pub activity_ref: String,
    pub state: ContentState,
}

impl DeliveryJob {
    pub fn new(device_ref: String, target: String, activity_ref: String, state: ContentState) -> Self {
        Self {
            id: Uuid::new_v4(),
            device_ref,
            target,
            activity_ref,
            state,
        }
    }
}

/// Outcome of a processed job, reported back to the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryEvent {
    pub job_id: Uuid,
    pub device_ref: String,
    pub outcome: DeliveryOutcome,
}

/// Producer half of the queue. Cheap to clone; dropping every handle shuts
/// the worker down once the queue drains.
#[derive(Debug, Clone)]
pub struct DeliveryQueue {
    tx: mpsc::Sender<DeliveryJob>,
}

impl DeliveryQueue {
    /// Spawn the worker task. Returns the producer handle, the outcome
    /// event stream, and the worker's join handle.
    pub fn spawn(
        deliverer: Arc<dyn Delivery>,
    ) -> (Self, mpsc::Receiver<DeliveryEvent>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel(QUEUE_CAPACITY);
        let handle = tokio::spawn(worker(rx, event_tx, deliverer));
        (Self { tx }, event_rx, handle)
    }

    /// Fire-and-forget enqueue. Returns false when the queue is full or the
    /// worker has shut down; the job is dropped either way.
    pub fn enqueue(&self, job: DeliveryJob) -> bool {
        match self.tx.try_send(job) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(job)) => {
                log::warn!("delivery queue full, dropping job {}", job.id);
                false
            }
            Err(mpsc::error::TrySendError::Closed(job)) => {
                log::warn!("delivery worker gone, dropping job {}", job.id);
                false
            }
        }
    }
}

async fn worker(
    mut rx: mpsc::Receiver<DeliveryJob>,
    events: mpsc::Sender<DeliveryEvent>,
    deliverer: Arc<dyn Delivery>,
) {
    while let Some(job) = rx.recv().await {
        let deliverer = Arc::clone(&deliverer);
        let job_id = job.id;
        let device_ref = job.device_ref.clone();

        // Transports are allowed to block, so keep them off the async
        // worker thread.
        let outcome = tokio::task::spawn_blocking(move || {
            deliverer.deliver(&job.target, &job.activity_ref, &job.state)
        })
        .await
        .unwrap_or_else(|e| {
            log::error!("delivery task panicked for job {job_id}: {e}");
            DeliveryOutcome::Failed
        });

        match outcome {
            DeliveryOutcome::Delivered => log::debug!("job {job_id} delivered"),
            DeliveryOutcome::Failed => log::warn!("job {job_id} failed, will retry next tick"),
            DeliveryOutcome::Gone => log::warn!("job {job_id}: target gone"),
        }

        let _ = events
            .send(DeliveryEvent {
                job_id,
                device_ref,
                outcome,
            })
            .await;
    }
    log::debug!("delivery worker shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::Presentation;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingDelivery {
        delivered: AtomicUsize,
        outcome: DeliveryOutcome,
    }

    impl CountingDelivery {
        fn new(outcome: DeliveryOutcome) -> Self {
            Self {
                delivered: AtomicUsize::new(0),
                outcome,
            }
        }
    }

    impl Delivery for CountingDelivery {
        fn deliver(&self, _: &str, _: &str, _: &ContentState) -> DeliveryOutcome {
            self.delivered.fetch_add(1, Ordering::SeqCst);
            self.outcome
        }
    }

    fn job(device: &str) -> DeliveryJob {
        DeliveryJob::new(
            device.to_string(),
            format!("push-{device}"),
            "activity".to_string(),
            ContentState::idle(Presentation::Dashboard, "Mon, Jan 05".into(), false),
        )
    }

    #[tokio::test]
    async fn worker_processes_jobs_and_reports_outcomes() {
        let deliverer = Arc::new(CountingDelivery::new(DeliveryOutcome::Delivered));
        let (queue, mut events, handle) = DeliveryQueue::spawn(deliverer.clone());

        assert!(queue.enqueue(job("device-a")));
        assert!(queue.enqueue(job("device-b")));

        let first = events.recv().await.unwrap();
        let second = events.recv().await.unwrap();
        assert!(first.outcome.is_delivered());
        assert!(second.outcome.is_delivered());
        assert_eq!(deliverer.delivered.load(Ordering::SeqCst), 2);

        drop(queue);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn gone_outcome_is_propagated_with_the_device_ref() {
        let deliverer = Arc::new(CountingDelivery::new(DeliveryOutcome::Gone));
        let (queue, mut events, handle) = DeliveryQueue::spawn(deliverer);

        queue.enqueue(job("stale-device"));
        let event = events.recv().await.unwrap();
        assert_eq!(event.outcome, DeliveryOutcome::Gone);
        assert_eq!(event.device_ref, "stale-device");

        drop(queue);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn enqueue_after_worker_shutdown_is_rejected() {
        let deliverer = Arc::new(CountingDelivery::new(DeliveryOutcome::Delivered));
        let (queue, events, handle) = DeliveryQueue::spawn(deliverer);

        handle.abort();
        let _ = handle.await;
        drop(events);

        assert!(!queue.enqueue(job("device-a")));
    }
}
