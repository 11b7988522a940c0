//! Presentation rotation engine.
//!
//! This module decides, once per tick per session, which presentation a
//! device should render next.
//!
//! # Philosophy
//!
//! **Score everything, every cycle, from the current context alone.**
//!
//! There is no long-lived plan: each cycle derives a fresh context (hour of
//! day, meeting load, unread mail), scores all six candidate presentations,
//! and picks the winner. Variety comes from a small random jitter; stability
//! comes from a recency penalty that discourages showing the same
//! presentation twice in quick succession.

mod context;
mod engine;
mod scoring;

pub use context::{Hour, RotationContext};
pub use engine::{Rotator, Selection};
pub use scoring::{score_all, score_presentation, Jitter, Scored};
