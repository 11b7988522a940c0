//! Per-cycle rotation context.
//!
//! Ephemeral snapshot of everything the scorer looks at. Owned by the
//! rotation engine for the duration of one cycle and derived fresh each
//! time; nothing here outlives the cycle.

use serde::{Deserialize, Serialize};

/// Hour of day (0-23) in the session's local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hour(pub u8);

impl Hour {
    /// Morning window: [7, 10).
    pub fn is_morning(self) -> bool {
        (7..10).contains(&self.0)
    }

    /// Work hours window: [10, 17).
    pub fn is_work_hours(self) -> bool {
        (10..17).contains(&self.0)
    }

    /// Evening window: [17, 21).
    pub fn is_evening(self) -> bool {
        (17..21).contains(&self.0)
    }

    /// Night window: 21:00 onwards and before 07:00.
    pub fn is_night(self) -> bool {
        self.0 >= 21 || self.0 < 7
    }
}

/// Everything the scorer considers for one session in one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotationContext {
    /// Hour in the session's time zone (server-local when unknown).
    pub hour: Hour,
    /// Number of calendar entries considered "today".
    pub meetings_today: u32,
    /// Signed minutes until the next meeting starts, when known.
    pub next_meeting_minutes: Option<i64>,
    /// Unread message count.
    pub unread_count: u32,
}

impl RotationContext {
    /// Heavy inbox threshold used by the dashboard boost.
    pub fn is_high_email(&self) -> bool {
        self.unread_count > 20
    }
}
