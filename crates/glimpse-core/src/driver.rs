//! Rotation service driver.
//!
//! Owns the registry, the fallback cache, the rotation engine and the
//! delivery queue, and runs the periodic loops: rotate every session each
//! tick, refresh the fallback cache, persist the registry, and react to
//! delivery outcomes. Sessions are rotated one at a time; a failure in one
//! session's cycle is logged and never aborts the cycle for the others.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::cache::{ContextSource, FallbackCache};
use crate::config::Config;
use crate::delivery::{Delivery, DeliveryEvent, DeliveryJob, DeliveryOutcome, DeliveryQueue};
use crate::error::RegistryError;
use crate::monitor::{ChangeTracker, DataChange};
use crate::rotation::{Rotator, Selection};
use crate::session::{SessionRegistry, StateSync};

/// The long-running rotation service.
pub struct RotationService {
    config: Config,
    registry: SessionRegistry,
    cache: FallbackCache,
    rotator: Rotator,
    tracker: ChangeTracker,
    queue: DeliveryQueue,
    events: mpsc::Receiver<DeliveryEvent>,
}

impl RotationService {
    /// Build the service and spawn its delivery worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: Config, registry: SessionRegistry, deliverer: Arc<dyn Delivery>) -> Self {
        let rotator = Rotator::new(&config.rotation);
        let (queue, events, _handle) = DeliveryQueue::spawn(deliverer);
        Self {
            config,
            registry,
            cache: FallbackCache::new(),
            rotator,
            tracker: ChangeTracker::new(),
            queue,
            events,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SessionRegistry {
        &mut self.registry
    }

    /// Rotate every registered session once.
    pub fn rotate_all(&mut self, now: DateTime<Utc>) {
        let device_refs = self.registry.device_refs();
        log::debug!("rotation cycle for {} sessions", device_refs.len());

        for device_ref in device_refs {
            if let Err(e) = self.rotate_session(&device_ref, now) {
                log::error!("rotation failed for session {device_ref}: {e}");
            }
        }
    }

    /// Rotate one session and enqueue the resulting payload.
    pub fn rotate_session(
        &mut self,
        device_ref: &str,
        now: DateTime<Utc>,
    ) -> Result<Selection, RegistryError> {
        let session = self
            .registry
            .get_mut(device_ref)
            .ok_or_else(|| RegistryError::UnknownSession(device_ref.to_string()))?;

        let selection = self.rotator.rotate(session, &self.cache, now);

        self.queue.enqueue(DeliveryJob::new(
            session.device_ref.clone(),
            session.delivery_target().to_string(),
            session.activity_ref.clone(),
            selection.content.clone(),
        ));

        Ok(selection)
    }

    /// Merge a device-originated state snapshot. When the synced data
    /// actually changed, the session is rotated immediately so the device
    /// reflects the change before the next scheduled tick.
    pub fn sync_state(
        &mut self,
        sync: StateSync,
        now: DateTime<Utc>,
    ) -> Result<DataChange, RegistryError> {
        let device_ref = sync.device_ref.clone();
        let session = self.registry.sync_state(sync, now)?;
        let change = self.tracker.observe(session);

        if change.any() {
            log::info!(
                "data changed for session {device_ref} (calendar={}, email={}), rotating now",
                change.calendar,
                change.email,
            );
            self.rotate_session(&device_ref, now)?;
        }
        Ok(change)
    }

    fn handle_delivery_event(&mut self, event: DeliveryEvent) {
        if event.outcome == DeliveryOutcome::Gone {
            // The transport says this target will never accept a payload
            // again; keeping the session would spam dead pushes forever.
            if self.registry.unregister(&event.device_ref).is_some() {
                self.tracker.forget(&event.device_ref);
                if let Err(e) = self.registry.save() {
                    log::error!("failed to persist registry after removal: {e}");
                }
            }
        }
    }

    /// Run the periodic loops until `cancel` fires. Consumes the service;
    /// the final registry snapshot is persisted on the way out.
    pub async fn run(mut self, source: Option<Arc<dyn ContextSource>>, cancel: CancellationToken) {
        let mut rotate_ticker = tokio::time::interval(std::time::Duration::from_secs(
            self.config.rotation.interval_secs.max(1),
        ));
        let mut refresh_ticker = tokio::time::interval(std::time::Duration::from_secs(
            self.config.cache.refresh_interval_secs.max(1),
        ));
        let mut persist_ticker = tokio::time::interval(std::time::Duration::from_secs(
            self.config.registry.persist_interval_secs.max(1),
        ));
        rotate_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        refresh_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        persist_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        log::info!(
            "rotation service started ({} sessions, interval {}s)",
            self.registry.len(),
            self.config.rotation.interval_secs,
        );

        loop {
            tokio::select! {
                _ = rotate_ticker.tick() => {
                    self.rotate_all(Utc::now());
                }
                _ = refresh_ticker.tick() => {
                    if let Some(source) = &source {
                        let limit = self.config.cache.recent_email_limit;
                        self.cache.refresh(source.as_ref(), Utc::now(), limit);
                    }
                }
                _ = persist_ticker.tick() => {
                    if let Err(e) = self.registry.save() {
                        log::error!("periodic registry persistence failed: {e}");
                    }
                }
                Some(event) = self.events.recv() => {
                    self.handle_delivery_event(event);
                }
                _ = cancel.cancelled() => {
                    log::info!("rotation service shutting down");
                    if let Err(e) = self.registry.save() {
                        log::error!("final registry persistence failed: {e}");
                    }
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentState;
    use crate::session::{CalendarEntry, EmailDigest, Registration};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingDelivery {
        delivered: AtomicUsize,
    }

    impl Delivery for CountingDelivery {
        fn deliver(&self, _: &str, _: &str, _: &ContentState) -> DeliveryOutcome {
            self.delivered.fetch_add(1, Ordering::SeqCst);
            DeliveryOutcome::Delivered
        }
    }

    fn device_ref(tag: char) -> String {
        std::iter::repeat(tag).take(32).collect()
    }

    fn deterministic_config() -> Config {
        let mut config = Config::default();
        config.rotation.jitter_seed = Some(11);
        config
    }

    fn service_with_sessions(tags: &[char]) -> (RotationService, Arc<CountingDelivery>) {
        let deliverer = Arc::new(CountingDelivery {
            delivered: AtomicUsize::new(0),
        });
        let mut registry = SessionRegistry::new();
        for &tag in tags {
            registry
                .register(
                    Registration {
                        device_ref: device_ref(tag),
                        activity_ref: format!("activity-{tag}"),
                        push_ref: None,
                    },
                    Utc::now(),
                )
                .unwrap();
        }
        let service = RotationService::new(deterministic_config(), registry, deliverer.clone());
        (service, deliverer)
    }

    #[tokio::test]
    async fn rotate_all_updates_every_session_and_delivers() {
        let (mut service, deliverer) = service_with_sessions(&['a', 'b']);
        service.rotate_all(Utc::now());

        for session in service.registry().iter() {
            assert!(session.last_shown.is_some());
            assert!(session.last_update.is_some());
        }

        // The queue worker drains asynchronously.
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert_eq!(deliverer.delivered.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn rotate_session_unknown_device_errors() {
        let (mut service, _) = service_with_sessions(&[]);
        let err = service.rotate_session("nope", Utc::now()).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownSession(_)));
    }

    #[tokio::test]
    async fn sync_state_with_changed_data_rotates_immediately() {
        let (mut service, _) = service_with_sessions(&['a']);
        let now = Utc::now();

        // First sync establishes the baseline, no immediate rotation.
        let change = service
            .sync_state(
                StateSync {
                    device_ref: device_ref('a'),
                    timezone: Some("UTC".into()),
                    ..Default::default()
                },
                now,
            )
            .unwrap();
        assert!(!change.any());
        assert!(service.registry().get(&device_ref('a')).unwrap().last_shown.is_none());

        // New calendar data is a change and triggers a rotation.
        let change = service
            .sync_state(
                StateSync {
                    device_ref: device_ref('a'),
                    calendar_events: Some(vec![CalendarEntry {
                        title: "Standup".into(),
                        time: "9:00 AM".into(),
                        start: None,
                    }]),
                    ..Default::default()
                },
                now,
            )
            .unwrap();
        assert!(change.calendar);
        assert!(service.registry().get(&device_ref('a')).unwrap().last_shown.is_some());
    }

    #[tokio::test]
    async fn sync_state_with_same_data_does_not_rotate() {
        let (mut service, _) = service_with_sessions(&['a']);
        let now = Utc::now();
        let email = EmailDigest {
            unread_count: 2,
            recent_emails: Vec::new(),
        };

        service
            .sync_state(
                StateSync {
                    device_ref: device_ref('a'),
                    email: Some(email.clone()),
                    ..Default::default()
                },
                now,
            )
            .unwrap();
        let change = service
            .sync_state(
                StateSync {
                    device_ref: device_ref('a'),
                    email: Some(email),
                    ..Default::default()
                },
                now,
            )
            .unwrap();
        assert!(!change.any());
        assert!(service.registry().get(&device_ref('a')).unwrap().last_shown.is_none());
    }

    #[tokio::test]
    async fn gone_delivery_removes_the_session() {
        let (mut service, _) = service_with_sessions(&['a', 'b']);
        service.handle_delivery_event(DeliveryEvent {
            job_id: uuid::Uuid::new_v4(),
            device_ref: device_ref('a'),
            outcome: DeliveryOutcome::Gone,
        });

        assert!(service.registry().get(&device_ref('a')).is_none());
        assert!(service.registry().get(&device_ref('b')).is_some());
    }

    #[tokio::test]
    async fn failed_delivery_keeps_the_session() {
        let (mut service, _) = service_with_sessions(&['a']);
        service.handle_delivery_event(DeliveryEvent {
            job_id: uuid::Uuid::new_v4(),
            device_ref: device_ref('a'),
            outcome: DeliveryOutcome::Failed,
        });
        assert!(service.registry().get(&device_ref('a')).is_some());
    }
}
