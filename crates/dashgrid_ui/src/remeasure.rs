//! Debounced remeasure for content-driven size changes.
//!
//! When content inside a grid grows for a reason other than a viewport
//! resize, observers call [`RemeasureScheduler::request`] on every change;
//! the scheduler collapses those into one remeasure after a short delay.

use std::time::{Duration, Instant};

use crate::layout::timing::REMEASURE_DELAY;
use crate::timer::DelayedAction;

/// Something whose geometry depends on the available width.
pub trait Remeasure {
    /// Recompute layout for a container width. Must be idempotent.
    fn remeasure(&self, container_width: u32);
}

/// Collapses remeasure requests into a single delayed dispatch.
#[derive(Debug, Clone)]
pub struct RemeasureScheduler {
    pending: DelayedAction,
}

impl Default for RemeasureScheduler {
    fn default() -> Self {
        Self::new(REMEASURE_DELAY)
    }
}

impl RemeasureScheduler {
    /// Create a scheduler with a custom delay.
    pub fn new(delay: Duration) -> Self {
        Self { pending: DelayedAction::new(delay) }
    }

    /// Ask for a remeasure. Requests made while one is pending are merged.
    pub fn request(&mut self, now: Instant) {
        if self.pending.schedule_once(now) {
            tracing::trace!(delay_ms = self.pending.delay().as_millis() as u64, "Scheduled remeasure");
        }
    }

    /// Whether a remeasure is pending.
    pub fn is_pending(&self) -> bool {
        self.pending.is_pending()
    }

    /// Drop a pending remeasure.
    pub fn cancel(&mut self) {
        self.pending.cancel();
    }

    /// Remeasure every target if the delay has elapsed. Returns whether it ran.
    pub fn poll(&mut self, now: Instant, container_width: u32, targets: &[&dyn Remeasure]) -> bool {
        if !self.pending.poll(now) {
            return false;
        }
        for target in targets {
            target.remeasure(container_width);
        }
        true
    }
}
