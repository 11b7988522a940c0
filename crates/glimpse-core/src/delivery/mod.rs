//! Delivery collaborators.
//!
//! The core never talks to a push transport directly. It hands finished
//! content-state payloads to a [`Delivery`] implementation, either inline
//! (one-shot tools) or through the background [`DeliveryQueue`].

mod queue;

pub use queue::{DeliveryEvent, DeliveryJob, DeliveryQueue};

use crate::content::ContentState;

/// Result of one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Payload accepted by the transport.
    Delivered,
    /// Transient failure; the next scheduled cycle retries naturally.
    Failed,
    /// The target is permanently invalid and its session should be dropped.
    Gone,
}

impl DeliveryOutcome {
    pub fn is_delivered(self) -> bool {
        matches!(self, DeliveryOutcome::Delivered)
    }
}

/// Push-transport seam.
///
/// Implementations own the wire protocol, retries and timeouts. They may
/// block; the queue worker isolates them from the rotation loop.
pub trait Delivery: Send + Sync {
    /// Deliver `state` to the rendering surface `activity_ref` on `target`.
    fn deliver(&self, target: &str, activity_ref: &str, state: &ContentState) -> DeliveryOutcome;
}

/// Deliverer that only logs the payload. Used by one-shot CLI runs and as
/// a stand-in while no real transport is wired up.
#[derive(Debug, Default)]
pub struct LogDelivery;

impl Delivery for LogDelivery {
    fn deliver(&self, target: &str, activity_ref: &str, state: &ContentState) -> DeliveryOutcome {
        let rendered = serde_json::to_string(state).unwrap_or_else(|_| "<unserializable>".into());
        log::info!(
            "deliver {} -> {} ({}): {}",
            state.intelligent_island_type,
            target,
            activity_ref,
            rendered,
        );
        DeliveryOutcome::Delivered
    }
}
