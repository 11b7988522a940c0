//! Rotation engine implementation.
//!
//! One call to [`Rotator::rotate`] runs a full selection cycle for one
//! session: derive the context (falling back to the shared cache where the
//! session has no data of its own), score all candidates, select the best,
//! update the session's recency bookkeeping, and build the content-state
//! payload. Delivery is the caller's concern -- the engine itself performs
//! no I/O.

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::cache::FallbackCache;
use crate::config::RotationConfig;
use crate::content::ContentState;
use crate::presentation::Presentation;
use crate::rotation::context::{Hour, RotationContext};
use crate::rotation::scoring::{score_all, Jitter, Scored};
use crate::session::{CalendarEntry, EmailDigest, EventStart, LastShown, SessionRecord};

/// Outcome of one rotation cycle for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Selection {
    pub presentation: Presentation,
    pub score: f64,
    pub reason: String,
    /// Context the decision was made from.
    pub context: RotationContext,
    /// Payload to deliver to the device.
    pub content: ContentState,
    /// Full ranking, best first.
    pub ranking: Vec<Scored>,
}

/// Runs selection cycles. One instance serves all sessions; the jitter
/// generator is the only internal state.
#[derive(Debug)]
pub struct Rotator {
    recency_window_secs: i64,
    jitter: Jitter,
}

impl Rotator {
    pub fn new(config: &RotationConfig) -> Self {
        Self {
            recency_window_secs: config.recency_window_secs as i64,
            jitter: config.jitter(),
        }
    }

    /// Engine with an explicit jitter source, for reproducible tests.
    pub fn with_jitter(recency_window_secs: i64, jitter: Jitter) -> Self {
        Self {
            recency_window_secs,
            jitter,
        }
    }

    /// Run one selection cycle for `session` at instant `now`.
    ///
    /// Mutates the session's bookkeeping (`last_shown`, `last_update`)
    /// before returning; the returned payload still has to be delivered by
    /// the caller. Context resolution problems (unknown zone, unparsable
    /// event start) degrade to absent fields and never fail the cycle.
    pub fn rotate(
        &mut self,
        session: &mut SessionRecord,
        cache: &FallbackCache,
        now: DateTime<Utc>,
    ) -> Selection {
        let (hour, current_date) = local_parts(now, session.timezone.as_deref());

        let events = resolve_events(session, cache);
        let email = resolve_email(session, cache);

        let next_meeting_minutes = events
            .first()
            .and_then(|event| event.start.as_ref())
            .and_then(EventStart::resolve)
            .map(|start| ((start - now).num_milliseconds() as f64 / 60_000.0).round() as i64);

        let ctx = RotationContext {
            hour,
            meetings_today: events.len() as u32,
            next_meeting_minutes,
            unread_count: email.unread_count,
        };

        let ranking = score_all(
            &ctx,
            session.last_shown.as_ref(),
            now,
            self.recency_window_secs,
            &mut self.jitter,
        );
        let best = ranking[0].clone();

        session.last_shown = Some(LastShown {
            presentation: best.presentation,
            at: now,
        });
        session.last_update = Some(now);

        let content = build_content_state(
            best.presentation,
            &ctx,
            current_date,
            session,
            &events,
            &email,
        );

        log::debug!(
            "session {}: selected {} ({:.0}) - {}",
            session.activity_ref,
            best.presentation,
            best.score,
            best.reason,
        );

        Selection {
            presentation: best.presentation,
            score: best.score,
            reason: best.reason,
            context: ctx,
            content,
            ranking,
        }
    }
}

/// Hour of day and formatted date in the session's local time.
///
/// An unknown or unparsable zone name falls back to server local time.
fn local_parts(now: DateTime<Utc>, timezone: Option<&str>) -> (Hour, String) {
    match timezone.and_then(|name| name.parse::<Tz>().ok()) {
        Some(tz) => {
            let local = now.with_timezone(&tz);
            (Hour(local.hour() as u8), local.format("%a, %b %d").to_string())
        }
        None => {
            let local = now.with_timezone(&chrono::Local);
            (Hour(local.hour() as u8), local.format("%a, %b %d").to_string())
        }
    }
}

/// Session's own calendar, or the cache's next event wrapped as a
/// single-entry list when the session has none.
fn resolve_events(session: &SessionRecord, cache: &FallbackCache) -> Vec<CalendarEntry> {
    if !session.calendar_events.is_empty() {
        session.calendar_events.clone()
    } else {
        cache.next_event.iter().cloned().collect()
    }
}

/// Session's own mail digest when it reports unread mail, else the cache's.
fn resolve_email(session: &SessionRecord, cache: &FallbackCache) -> EmailDigest {
    if session.unread_count() > 0 {
        session.email.clone().unwrap_or_default()
    } else {
        EmailDigest {
            unread_count: cache.unread_count,
            recent_emails: cache.recent_emails.clone(),
        }
    }
}

fn build_content_state(
    presentation: Presentation,
    ctx: &RotationContext,
    current_date: String,
    session: &SessionRecord,
    events: &[CalendarEntry],
    email: &EmailDigest,
) -> ContentState {
    let dark_mode = ctx.hour.0 < 7 || ctx.hour.0 >= 19;
    let mut state = ContentState::idle(presentation, current_date, dark_mode);

    if let Some(weather) = &session.weather {
        state.weather_temp = Some(weather.temp);
        state.weather_condition = Some(weather.condition.clone());
        state.weather_icon = Some(weather.icon.clone());
        state.sunrise_time = Some(weather.sunrise.clone());
        state.sunset_time = Some(weather.sunset.clone());
        state.location_name = Some(weather.location.clone());
    }

    let next = events.first();

    match presentation {
        Presentation::MeetingPrep => {
            if let Some(event) = next {
                state.next_event_title = Some(event.title.clone());
                state.next_event_time = Some(event.time.clone());
                state.suggestion = ctx
                    .next_meeting_minutes
                    .map(|minutes| format!("Meeting in {minutes} min"));
                state.suggestion_icon = Some("calendar.badge.clock".into());
            }
        }
        Presentation::MeetingMarathon => {
            if let Some(event) = next {
                state.next_event_title = Some(event.title.clone());
                state.next_event_time = Some(event.time.clone());
                state.suggestion = Some(format!("{} meetings today", ctx.meetings_today));
                state.suggestion_icon = Some("calendar.badge.exclamationmark".into());
            }
        }
        Presentation::Sunrise => {
            state.suggestion = Some("Good morning ☀️".into());
            state.suggestion_icon = Some("sunrise.fill".into());
            if let Some(event) = next {
                state.next_event_title = Some(event.title.clone());
                state.next_event_time = Some(event.time.clone());
            }
        }
        Presentation::FocusMode => {
            state.suggestion = Some("Focus time 🌙".into());
            state.suggestion_icon = Some("moon.stars.fill".into());
        }
        Presentation::BreakingNews => {
            state.suggestion = Some("Check latest updates".into());
            state.suggestion_icon = Some("newspaper.fill".into());
        }
        Presentation::Dashboard => {
            state.suggestion = Some("Your day at a glance".into());
            state.suggestion_icon = Some("calendar".into());
            if let Some(event) = next {
                state.next_event_title = Some(event.title.clone());
                state.next_event_time = Some(event.time.clone());
            }
            if email.unread_count > 0 {
                state.unread_email_count = Some(email.unread_count);
                if let Some(top) = email.recent_emails.first() {
                    state.top_email_senders = Some(top.sender.clone());
                    state.top_email_subject = Some(top.subject.clone());
                    state.top_email_time = Some(top.time.clone());
                }
            }
        }
    }

    state
}
