//! Session registry with JSON snapshot persistence.
//!
//! The registry is an explicit value passed by reference into the rotation
//! engine -- there is no global state. It persists as a single JSON
//! snapshot so registered devices survive a server restart.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CalendarEntry, EmailDigest, SessionRecord, WeatherSnapshot};
use crate::error::RegistryError;

/// Minimum length of an acceptable device reference.
const MIN_DEVICE_REF_LEN: usize = 32;

/// Registration request for a new session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub device_ref: String,
    pub activity_ref: String,
    #[serde(default)]
    pub push_ref: Option<String>,
}

/// Device-originated state snapshot merged into an existing session.
/// `None` fields leave the current value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateSync {
    pub device_ref: String,
    #[serde(default)]
    pub calendar_events: Option<Vec<CalendarEntry>>,
    #[serde(default)]
    pub email: Option<EmailDigest>,
    #[serde(default)]
    pub weather: Option<WeatherSnapshot>,
    #[serde(default)]
    pub timezone: Option<String>,
}

/// All registered sessions, keyed by device reference.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<String, SessionRecord>,
    path: Option<PathBuf>,
}

impl SessionRegistry {
    /// In-memory registry with no persistence target.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that persists to `path` on [`save`](Self::save).
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            sessions: HashMap::new(),
            path: Some(path.into()),
        }
    }

    /// Restore from the snapshot at `path`, or start fresh if none exists.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let path = path.into();
        let sessions = match std::fs::read_to_string(&path) {
            Ok(content) => {
                serde_json::from_str(&content).map_err(|e| RegistryError::LoadFailed {
                    path: path.clone(),
                    message: e.to_string(),
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("no registry snapshot at {}, starting fresh", path.display());
                HashMap::new()
            }
            Err(e) => {
                return Err(RegistryError::LoadFailed {
                    path,
                    message: e.to_string(),
                })
            }
        };

        Ok(Self {
            sessions,
            path: Some(path),
        })
    }

    /// Persist the current snapshot, if a path is configured.
    pub fn save(&self) -> Result<(), RegistryError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let content =
            serde_json::to_string_pretty(&self.sessions).map_err(|e| RegistryError::SaveFailed {
                path: path.clone(),
                message: e.to_string(),
            })?;
        std::fs::write(path, content).map_err(|e| RegistryError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        log::debug!("saved {} sessions to {}", self.sessions.len(), path.display());
        Ok(())
    }

    /// Register a device. Re-registering an existing device replaces its
    /// record (matching the reference behavior on app reinstall).
    pub fn register(
        &mut self,
        registration: Registration,
        now: DateTime<Utc>,
    ) -> Result<&SessionRecord, RegistryError> {
        let len = registration.device_ref.len();
        if len < MIN_DEVICE_REF_LEN {
            return Err(RegistryError::InvalidDeviceRef {
                min: MIN_DEVICE_REF_LEN,
                len,
            });
        }

        let mut record = SessionRecord::new(
            registration.device_ref.clone(),
            registration.activity_ref,
            now,
        );
        record.push_ref = registration.push_ref;

        let device_ref = registration.device_ref;
        self.sessions.insert(device_ref.clone(), record);
        log::info!("registered session {}", redact(&device_ref));
        Ok(&self.sessions[&device_ref])
    }

    /// Remove a session. Returns the removed record, if any.
    pub fn unregister(&mut self, device_ref: &str) -> Option<SessionRecord> {
        let removed = self.sessions.remove(device_ref);
        if removed.is_some() {
            log::info!("unregistered session {}", redact(device_ref));
        }
        removed
    }

    /// Merge a device-originated state snapshot into its session.
    pub fn sync_state(
        &mut self,
        sync: StateSync,
        now: DateTime<Utc>,
    ) -> Result<&SessionRecord, RegistryError> {
        let session = self
            .sessions
            .get_mut(&sync.device_ref)
            .ok_or_else(|| RegistryError::UnknownSession(redact(&sync.device_ref)))?;

        if let Some(events) = sync.calendar_events {
            session.calendar_events = events;
        }
        if let Some(email) = sync.email {
            session.email = Some(email);
        }
        if let Some(weather) = sync.weather {
            session.weather = Some(weather);
        }
        if let Some(timezone) = sync.timezone {
            session.timezone = Some(timezone);
        }
        session.last_synced_at = Some(now);

        log::debug!(
            "synced state for {} (tz={:?}, events={}, weather={})",
            redact(&session.device_ref),
            session.timezone,
            session.calendar_events.len(),
            session.weather.is_some(),
        );
        Ok(session)
    }

    pub fn get(&self, device_ref: &str) -> Option<&SessionRecord> {
        self.sessions.get(device_ref)
    }

    pub fn get_mut(&mut self, device_ref: &str) -> Option<&mut SessionRecord> {
        self.sessions.get_mut(device_ref)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Device references of all registered sessions.
    pub fn device_refs(&self) -> Vec<String> {
        self.sessions.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SessionRecord> {
        self.sessions.values()
    }

    /// Persistence target, if configured.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Device references are opaque but sensitive; logs only ever see a prefix.
fn redact(device_ref: &str) -> String {
    let prefix: String = device_ref.chars().take(8).collect();
    format!("{prefix}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device_ref(tag: char) -> String {
        std::iter::repeat(tag).take(MIN_DEVICE_REF_LEN).collect()
    }

    fn registration(tag: char) -> Registration {
        Registration {
            device_ref: device_ref(tag),
            activity_ref: format!("activity-{tag}"),
            push_ref: None,
        }
    }

    #[test]
    fn register_and_get() {
        let mut registry = SessionRegistry::new();
        registry.register(registration('a'), Utc::now()).unwrap();
        assert_eq!(registry.len(), 1);
        let session = registry.get(&device_ref('a')).unwrap();
        assert_eq!(session.activity_ref, "activity-a");
    }

    #[test]
    fn register_rejects_short_device_ref() {
        let mut registry = SessionRegistry::new();
        let err = registry
            .register(
                Registration {
                    device_ref: "short".into(),
                    activity_ref: "a".into(),
                    push_ref: None,
                },
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidDeviceRef { len: 5, .. }));
    }

    #[test]
    fn reregistering_replaces_record() {
        let mut registry = SessionRegistry::new();
        registry.register(registration('a'), Utc::now()).unwrap();
        registry
            .sync_state(
                StateSync {
                    device_ref: device_ref('a'),
                    timezone: Some("UTC".into()),
                    ..Default::default()
                },
                Utc::now(),
            )
            .unwrap();

        registry.register(registration('a'), Utc::now()).unwrap();
        assert!(registry.get(&device_ref('a')).unwrap().timezone.is_none());
    }

    #[test]
    fn sync_state_merges_only_provided_fields() {
        let mut registry = SessionRegistry::new();
        registry.register(registration('a'), Utc::now()).unwrap();

        registry
            .sync_state(
                StateSync {
                    device_ref: device_ref('a'),
                    timezone: Some("Asia/Kolkata".into()),
                    email: Some(EmailDigest {
                        unread_count: 7,
                        recent_emails: Vec::new(),
                    }),
                    ..Default::default()
                },
                Utc::now(),
            )
            .unwrap();

        // A later sync without email must not clear the digest.
        registry
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
                Utc::now(),
            )
            .unwrap();

        let session = registry.get(&device_ref('a')).unwrap();
        assert_eq!(session.unread_count(), 7);
        assert_eq!(session.calendar_events.len(), 1);
        assert_eq!(session.timezone.as_deref(), Some("Asia/Kolkata"));
        assert!(session.last_synced_at.is_some());
    }

    #[test]
    fn sync_state_unknown_session_errors() {
        let mut registry = SessionRegistry::new();
        let err = registry
            .sync_state(
                StateSync {
                    device_ref: device_ref('z'),
                    ..Default::default()
                },
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownSession(_)));
    }

    #[test]
    fn snapshot_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.json");

        let mut registry = SessionRegistry::with_path(&path);
        registry.register(registration('a'), Utc::now()).unwrap();
        registry.register(registration('b'), Utc::now()).unwrap();
        registry.save().unwrap();

        let restored = SessionRegistry::load(&path).unwrap();
        assert_eq!(restored.len(), 2);
        assert!(restored.get(&device_ref('a')).is_some());
        assert!(restored.get(&device_ref('b')).is_some());
    }

    #[test]
    fn load_missing_snapshot_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let registry = SessionRegistry::load(dir.path().join("nope.json")).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn load_rejects_corrupt_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            SessionRegistry::load(&path),
            Err(RegistryError::LoadFailed { .. })
        ));
    }
}
