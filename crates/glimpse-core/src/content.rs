//! Content-state payload.
//!
//! The flat key/value mapping delivered to a device for rendering. Keys are
//! camelCase on the wire and optional fields are omitted entirely when
//! absent, so the serialized form matches what device clients expect.

use serde::{Deserialize, Serialize};

use crate::presentation::Presentation;

/// Payload describing what a device should render.
///
/// The base fields are always present; weather and presentation-specific
/// fields are populated by the rotation engine depending on the selected
/// presentation and the session's synced data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentState {
    pub call_status: String,
    pub duration: u32,
    pub transcript: String,
    pub is_speaking: bool,
    pub companion_mode: String,
    pub is_idle_mode: bool,
    pub is_dark_mode: bool,
    pub current_date: String,
    pub intelligent_island_type: Presentation,

    // Weather fields, passed through verbatim from the session snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_temp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunrise_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunset_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,

    // Presentation-specific fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_event_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_event_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion_icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unread_email_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_email_senders: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_email_subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_email_time: Option<String>,
}

impl ContentState {
    /// Idle-state base payload: no call in progress, presentation selected,
    /// everything else waiting to be filled in by the rotation engine.
    pub fn idle(presentation: Presentation, current_date: String, dark_mode: bool) -> Self {
        Self {
            call_status: "Ready".to_string(),
            duration: 0,
            transcript: String::new(),
            is_speaking: false,
            companion_mode: "idle".to_string(),
            is_idle_mode: true,
            is_dark_mode: dark_mode,
            current_date,
            intelligent_island_type: presentation,
            weather_temp: None,
            weather_condition: None,
            weather_icon: None,
            sunrise_time: None,
            sunset_time: None,
            location_name: None,
            next_event_title: None,
            next_event_time: None,
            suggestion: None,
            suggestion_icon: None,
            unread_email_count: None,
            top_email_senders: None,
            top_email_subject: None,
            top_email_time: None,
        }
    }
}
