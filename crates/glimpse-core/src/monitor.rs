//! Change detection over synced session data.
//!
//! Tracks a content hash per session for the calendar and mail data so the
//! driver can tell whether a state sync actually changed anything and is
//! worth an immediate rotation, instead of waiting for the next tick.

use std::collections::HashMap;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::session::SessionRecord;

/// Which parts of a session's synced data changed since last observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DataChange {
    pub calendar: bool,
    pub email: bool,
}

impl DataChange {
    pub fn any(self) -> bool {
        self.calendar || self.email
    }
}

#[derive(Debug, Clone)]
struct SessionHashes {
    calendar: String,
    email: String,
}

/// Per-session content hashes, keyed by device reference.
#[derive(Debug, Default)]
pub struct ChangeTracker {
    sessions: HashMap<String, SessionHashes>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe the session's current data. The first observation of a
    /// session establishes the baseline and reports no change.
    pub fn observe(&mut self, session: &SessionRecord) -> DataChange {
        let calendar = digest(&session.calendar_events);
        let email = digest(&session.email);

        match self.sessions.get_mut(&session.device_ref) {
            None => {
                self.sessions
                    .insert(session.device_ref.clone(), SessionHashes { calendar, email });
                DataChange::default()
            }
            Some(hashes) => {
                let change = DataChange {
                    calendar: hashes.calendar != calendar,
                    email: hashes.email != email,
                };
                hashes.calendar = calendar;
                hashes.email = email;
                change
            }
        }
    }

    /// Drop the baseline for an unregistered session.
    pub fn forget(&mut self, device_ref: &str) {
        self.sessions.remove(device_ref);
    }
}

/// Content hash of any serializable value. serde_json emits struct fields
/// in declaration order, so equal values hash equally.
fn digest<T: Serialize>(value: &T) -> String {
    let bytes = serde_json::to_vec(value).unwrap_or_default();
    hex::encode(Sha256::digest(bytes))
}
