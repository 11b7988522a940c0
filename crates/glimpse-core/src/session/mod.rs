//! Session records and the session registry.
//!
//! A session is a registered companion device together with the context it
//! has synced to the server (calendar, mail digest, weather, time zone) and
//! the rotation bookkeeping the engine maintains for it.

mod registry;

pub use registry::{Registration, SessionRegistry, StateSync};

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::presentation::Presentation;

/// Start instant of a calendar entry.
///
/// Device payloads carry either an RFC 3339 timestamp (a trailing `Z` is an
/// accepted UTC offset) or an opaque string. Anything that does not resolve
/// to an instant is kept verbatim and simply yields no start time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventStart {
    Instant(DateTime<FixedOffset>),
    Raw(String),
}

impl EventStart {
    /// Resolve to a UTC instant, if the underlying value parses as one.
    pub fn resolve(&self) -> Option<DateTime<Utc>> {
        match self {
            EventStart::Instant(dt) => Some(dt.with_timezone(&Utc)),
            EventStart::Raw(s) => DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok(),
        }
    }
}

/// One calendar entry as synced from a device or the fallback cache.
/// Entries are assumed sorted by start time ascending; the first is "next".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub title: String,
    /// Pre-formatted display time (e.g. "2:30 PM").
    pub time: String,
    #[serde(default, alias = "start_date", skip_serializing_if = "Option::is_none")]
    pub start: Option<EventStart>,
}

/// One unread message summary. `recent_emails[0]` is the most recent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub sender: String,
    pub subject: String,
    pub time: String,
}

/// Unread-mail digest for a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailDigest {
    #[serde(default)]
    pub unread_count: u32,
    #[serde(default)]
    pub recent_emails: Vec<EmailMessage>,
}

/// Weather snapshot synced from a device, passed through to payloads verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temp: f64,
    pub condition: String,
    pub icon: String,
    pub sunrise: String,
    pub sunset: String,
    pub location: String,
}

/// The presentation chosen by the previous rotation cycle and when.
///
/// Both halves live in one struct so they are present or absent together;
/// the rotation engine updates them atomically at the end of every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LastShown {
    pub presentation: Presentation,
    pub at: DateTime<Utc>,
}

/// One registered device and everything the rotation engine knows about it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Opaque device reference. Registry key.
    pub device_ref: String,
    /// Reference to the live rendering surface on the device.
    pub activity_ref: String,
    /// Dedicated push target, when it differs from the device reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_ref: Option<String>,
    /// Today's calendar entries, sorted by start time ascending.
    #[serde(default)]
    pub calendar_events: Vec<CalendarEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<EmailDigest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherSnapshot>,
    /// IANA zone name, e.g. "Asia/Kolkata".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    /// Rotation bookkeeping: what was shown last and when.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_shown: Option<LastShown>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Utc>>,
    pub registered_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl SessionRecord {
    /// Create a fresh record with no synced context yet.
    pub fn new(device_ref: String, activity_ref: String, registered_at: DateTime<Utc>) -> Self {
        Self {
            device_ref,
            activity_ref,
            push_ref: None,
            calendar_events: Vec::new(),
            email: None,
            weather: None,
            timezone: None,
            last_shown: None,
            last_update: None,
            registered_at,
            last_synced_at: None,
        }
    }

    /// Where deliveries for this session should be addressed.
    pub fn delivery_target(&self) -> &str {
        self.push_ref.as_deref().unwrap_or(&self.device_ref)
    }

    /// Unread count from the session's own digest (0 when none synced).
    pub fn unread_count(&self) -> u32 {
        self.email.as_ref().map(|e| e.unread_count).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn event_start_resolves_trailing_z() {
        let start = EventStart::Raw("2026-03-01T14:00:00Z".to_string());
        let resolved = start.resolve().unwrap();
        assert_eq!(resolved, Utc.with_ymd_and_hms(2026, 3, 1, 14, 0, 0).unwrap());
    }

    #[test]
    fn event_start_resolves_offset() {
        let start = EventStart::Raw("2026-03-01T14:00:00+05:30".to_string());
        let resolved = start.resolve().unwrap();
        assert_eq!(resolved, Utc.with_ymd_and_hms(2026, 3, 1, 8, 30, 0).unwrap());
    }

    #[test]
    fn event_start_garbage_yields_none() {
        assert!(EventStart::Raw("tomorrow-ish".to_string()).resolve().is_none());
        // Naive timestamps carry no offset and are treated as unparsable.
        assert!(EventStart::Raw("2026-03-01T14:00:00".to_string()).resolve().is_none());
    }

    #[test]
    fn event_start_deserializes_instants_from_json_strings() {
        let entry: CalendarEntry = serde_json::from_str(
            r#"{"title":"Standup","time":"9:00 AM","start":"2026-03-01T09:00:00Z"}"#,
        )
        .unwrap();
        match entry.start.unwrap() {
            EventStart::Instant(dt) => {
                assert_eq!(dt.with_timezone(&Utc), Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap())
            }
            EventStart::Raw(s) => panic!("expected instant, got raw {s:?}"),
        }
    }

    #[test]
    fn calendar_entry_accepts_start_date_alias() {
        let entry: CalendarEntry = serde_json::from_str(
            r#"{"title":"1:1","time":"3:00 PM","start_date":"2026-03-01T15:00:00Z"}"#,
        )
        .unwrap();
        assert!(entry.start.is_some());
    }

    #[test]
    fn delivery_target_prefers_push_ref() {
        let mut session = SessionRecord::new("device-a".into(), "act-1".into(), Utc::now());
        assert_eq!(session.delivery_target(), "device-a");
        session.push_ref = Some("push-a".into());
        assert_eq!(session.delivery_target(), "push-a");
    }

    #[test]
    fn record_roundtrips_through_json() {
        let mut session = SessionRecord::new(
            "0123456789abcdef0123456789abcdef".into(),
            "act-9".into(),
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        );
        session.timezone = Some("Europe/Berlin".into());
        session.last_shown = Some(LastShown {
            presentation: Presentation::Sunrise,
            at: Utc.with_ymd_and_hms(2026, 1, 1, 7, 30, 0).unwrap(),
        });

        let json = serde_json::to_string(&session).unwrap();
        let parsed: SessionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.device_ref, session.device_ref);
        assert_eq!(parsed.last_shown.unwrap().presentation, Presentation::Sunrise);
        assert_eq!(parsed.timezone.as_deref(), Some("Europe/Berlin"));
    }
}
