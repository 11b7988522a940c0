//! Shared fallback cache.
//!
//! A single session-agnostic snapshot of calendar/mail data, used by the
//! rotation engine when a session has not synced its own. Refreshed on a
//! fixed interval from a [`ContextSource`]; the engine only ever reads it.

use chrono::{DateTime, Utc};

use crate::error::CoreError;
use crate::session::{CalendarEntry, EmailMessage};

/// External calendar/mail data source feeding the fallback cache.
///
/// Implementations wrap whatever upstream service is configured; the core
/// only sees this trait. Errors are surfaced per call so a failing mail
/// lookup does not discard a successful calendar one.
pub trait ContextSource: Send + Sync {
    /// Unique identifier (e.g. "google"), used in logs.
    fn name(&self) -> &str;

    /// The next upcoming calendar event, if any.
    fn next_event(&self) -> Result<Option<CalendarEntry>, CoreError>;

    /// Total unread message count.
    fn unread_count(&self) -> Result<u32, CoreError>;

    /// Most recent unread messages, newest first.
    fn recent_emails(&self, max: usize) -> Result<Vec<EmailMessage>, CoreError>;
}

/// Shared snapshot used when a session carries no data of its own.
#[derive(Debug, Clone, Default)]
pub struct FallbackCache {
    pub next_event: Option<CalendarEntry>,
    pub unread_count: u32,
    pub recent_emails: Vec<EmailMessage>,
    pub last_refresh: Option<DateTime<Utc>>,
}

impl FallbackCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refresh the snapshot from `source`. Each field keeps its previous
    /// value when its lookup fails; a partial refresh is still a refresh.
    pub fn refresh(&mut self, source: &dyn ContextSource, now: DateTime<Utc>, email_limit: usize) {
        match source.next_event() {
            Ok(event) => self.next_event = event,
            Err(e) => log::warn!("{}: next event lookup failed: {e}", source.name()),
        }
        match source.unread_count() {
            Ok(count) => self.unread_count = count,
            Err(e) => log::warn!("{}: unread count lookup failed: {e}", source.name()),
        }
        match source.recent_emails(email_limit) {
            Ok(emails) => self.recent_emails = emails,
            Err(e) => log::warn!("{}: recent emails lookup failed: {e}", source.name()),
        }
        self.last_refresh = Some(now);
        log::debug!(
            "{}: fallback cache refreshed (next_event={}, unread={})",
            source.name(),
            self.next_event.is_some(),
            self.unread_count,
        );
    }
}
