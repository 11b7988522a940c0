//! Presentation scoring.
//!
//! Pure scoring over one session's rotation context. Later rules override
//! earlier score/reason assignments for the same type; additive boosts
//! accumulate. The only non-determinism is the jitter term, which is
//! seedable (and fully disableable) for reproducibility.

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};

use crate::presentation::Presentation;
use crate::rotation::context::RotationContext;
use crate::session::LastShown;

/// Penalty applied when a presentation was shown within the recency window.
const RECENCY_PENALTY: f64 = 50.0;

/// Random variation added to every score so near-ties rotate.
#[derive(Debug, Clone)]
pub struct Jitter {
    amplitude: f64,
    rng: Option<Mcg128Xsl64>,
}

impl Jitter {
    /// Entropy-seeded jitter with the given amplitude.
    pub fn new(amplitude: f64) -> Self {
        Self {
            amplitude,
            rng: Some(Mcg128Xsl64::from_entropy()),
        }
    }

    /// Seeded jitter for reproducible runs.
    pub fn seeded(amplitude: f64, seed: u64) -> Self {
        Self {
            amplitude,
            rng: Some(Mcg128Xsl64::seed_from_u64(seed)),
        }
    }

    /// No jitter at all. Scoring becomes fully deterministic.
    pub fn disabled() -> Self {
        Self {
            amplitude: 0.0,
            rng: None,
        }
    }

    /// Uniform sample in `[-amplitude, amplitude]`.
    pub fn sample(&mut self) -> f64 {
        match &mut self.rng {
            Some(rng) if self.amplitude > 0.0 => {
                rng.gen_range(-self.amplitude..=self.amplitude)
            }
            _ => 0.0,
        }
    }
}

/// One scored candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scored {
    #[serde(rename = "type")]
    pub presentation: Presentation,
    pub score: f64,
    pub reason: String,
}

/// Score a single presentation for the given context.
///
/// Applies, in order: the base priority, the per-type time-window rules,
/// the recency penalty, the jitter term, and a clamp to `>= 0`.
pub fn score_presentation(
    presentation: Presentation,
    ctx: &RotationContext,
    last_shown: Option<&LastShown>,
    now: DateTime<Utc>,
    recency_window_secs: i64,
    jitter: &mut Jitter,
) -> Scored {
    let mut score = presentation.base_priority();
    let mut reason = String::from("Base priority");
    let hour = ctx.hour;

    match presentation {
        Presentation::Dashboard => {
            if ctx.meetings_today > 0 {
                score += 5.0;
                reason = "Has meetings today".into();
            }
            if ctx.is_high_email() {
                score += 3.0;
                reason = "High email volume".into();
            }
            // At night the dashboard drops to a fixed competitive score so
            // the other night presentations get a chance to rotate in.
            if hour.is_night() {
                if ctx.meetings_today > 0 || ctx.unread_count > 0 {
                    score = 48.0;
                    reason = "Night - has useful content".into();
                } else {
                    score = 45.0;
                    reason = "Night - minimal content".into();
                }
            }
            if hour.is_work_hours() {
                score += 5.0;
                reason = "Work hours - dashboard relevant".into();
            }
        }
        Presentation::Sunrise => {
            if hour.is_night() {
                score = 47.0;
                reason = "Night mode - sun arc".into();
            } else if hour.is_morning() {
                score += 40.0;
                reason = "Morning - sunrise".into();
            } else {
                score -= 100.0;
            }
        }
        Presentation::FocusMode => {
            if !hour.is_night() {
                score -= 100.0;
            } else {
                reason = "Night - focus mode".into();
            }
        }
        Presentation::MeetingPrep => match ctx.next_meeting_minutes {
            Some(minutes) if minutes > 0 && minutes <= 15 => {
                reason = format!("Meeting in {minutes} min");
            }
            _ => score -= 100.0,
        },
        Presentation::MeetingMarathon => {
            if ctx.meetings_today >= 3 && ctx.next_meeting_minutes.is_some() {
                if hour.is_work_hours() || hour.is_evening() {
                    score += 20.0;
                    reason = format!("Busy day - {} meetings", ctx.meetings_today);
                } else if hour.is_night() {
                    score = 50.0;
                    reason = "Night - meeting overview".into();
                } else {
                    score += 15.0;
                    reason = "Meeting marathon day".into();
                }
            } else {
                score -= 100.0;
            }
        }
        Presentation::BreakingNews => {
            if hour.is_work_hours() {
                score = 58.0;
                reason = "Work hours - breaking news".into();
            } else if hour.is_evening() {
                score = 55.0;
                reason = "Evening - news rotation".into();
            } else if hour.is_night() {
                score = 52.0;
                reason = "Night - news rotation".into();
            } else if hour.is_morning() {
                score = 60.0;
                reason = "Morning - news briefing".into();
            } else {
                score = 45.0;
                reason = "News available".into();
            }
        }
    }

    if let Some(last) = last_shown {
        if last.presentation == presentation
            && (now - last.at).num_seconds() < recency_window_secs
        {
            score -= RECENCY_PENALTY;
            reason = "Recently shown".into();
        }
    }

    score += jitter.sample();

    Scored {
        presentation,
        score: score.max(0.0),
        reason,
    }
}

/// Score every candidate and return them sorted by score descending.
///
/// The sort is stable, so equal scores keep the fixed candidate order and
/// selection stays deterministic for equal inputs.
pub fn score_all(
    ctx: &RotationContext,
    last_shown: Option<&LastShown>,
    now: DateTime<Utc>,
    recency_window_secs: i64,
    jitter: &mut Jitter,
) -> Vec<Scored> {
    let mut scores: Vec<Scored> = Presentation::ALL
        .iter()
        .map(|&p| score_presentation(p, ctx, last_shown, now, recency_window_secs, jitter))
        .collect();

    scores.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scores
}
