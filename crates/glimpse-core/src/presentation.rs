//! Presentation catalogue.
//!
//! A presentation is one of the mutually exclusive glanceable views a
//! companion device can render at a given moment. The set is closed --
//! there is no dynamic registration.

use serde::{Deserialize, Serialize};

/// One of the six content views a session can be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presentation {
    Dashboard,
    MeetingPrep,
    MeetingMarathon,
    Sunrise,
    FocusMode,
    BreakingNews,
}

impl Presentation {
    /// Candidate iteration order. Selection is a stable descending sort
    /// over scores, so this order doubles as the tie-break order.
    pub const ALL: [Presentation; 6] = [
        Presentation::Dashboard,
        Presentation::MeetingPrep,
        Presentation::MeetingMarathon,
        Presentation::Sunrise,
        Presentation::FocusMode,
        Presentation::BreakingNews,
    ];

    /// Fixed base priority. Most scoring branches override this outright;
    /// it only survives as-is for types with no matching time window.
    pub fn base_priority(self) -> f64 {
        match self {
            Presentation::BreakingNews => 95.0,
            Presentation::MeetingPrep => 90.0,
            Presentation::FocusMode => 85.0,
            Presentation::Sunrise => 75.0,
            Presentation::MeetingMarathon => 70.0,
            Presentation::Dashboard => 50.0,
        }
    }

    /// Wire/display name (matches the serde representation).
    pub fn as_str(self) -> &'static str {
        match self {
            Presentation::Dashboard => "dashboard",
            Presentation::MeetingPrep => "meeting_prep",
            Presentation::MeetingMarathon => "meeting_marathon",
            Presentation::Sunrise => "sunrise",
            Presentation::FocusMode => "focus_mode",
            Presentation::BreakingNews => "breaking_news",
        }
    }
}

impl std::fmt::Display for Presentation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Presentation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dashboard" => Ok(Presentation::Dashboard),
            "meeting_prep" => Ok(Presentation::MeetingPrep),
            "meeting_marathon" => Ok(Presentation::MeetingMarathon),
            "sunrise" => Ok(Presentation::Sunrise),
            "focus_mode" => Ok(Presentation::FocusMode),
            "breaking_news" => Ok(Presentation::BreakingNews),
            other => Err(format!("unknown presentation: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&Presentation::MeetingPrep).unwrap();
        assert_eq!(json, "\"meeting_prep\"");
        let parsed: Presentation = serde_json::from_str("\"breaking_news\"").unwrap();
        assert_eq!(parsed, Presentation::BreakingNews);
    }

    #[test]
    fn all_covers_every_variant_once() {
        let mut seen = std::collections::HashSet::new();
        for p in Presentation::ALL {
            assert!(seen.insert(p));
        }
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn base_priorities_match_reference_table() {
        assert_eq!(Presentation::BreakingNews.base_priority(), 95.0);
        assert_eq!(Presentation::MeetingPrep.base_priority(), 90.0);
        assert_eq!(Presentation::FocusMode.base_priority(), 85.0);
        assert_eq!(Presentation::Sunrise.base_priority(), 75.0);
        assert_eq!(Presentation::MeetingMarathon.base_priority(), 70.0);
        assert_eq!(Presentation::Dashboard.base_priority(), 50.0);
    }

    #[test]
    fn from_str_roundtrip() {
        for p in Presentation::ALL {
            assert_eq!(p.as_str().parse::<Presentation>().unwrap(), p);
        }
        assert!("reminder_due".parse::<Presentation>().is_err());
    }
}
