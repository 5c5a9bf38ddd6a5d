//! Deferred one-shot actions driven by the host's clock.
//!
//! Components never spawn threads or sleep. The host passes the current
//! `Instant` in and polls; that keeps the behaviour deterministic under test.

use std::time::{Duration, Instant};

/// A single pending deadline.
#[derive(Debug, Clone)]
pub struct DelayedAction {
    delay: Duration,
    deadline: Option<Instant>,
}

impl DelayedAction {
    /// Create an idle action with the given delay.
    pub fn new(delay: Duration) -> Self {
        Self { delay, deadline: None }
    }

    /// Schedule the action, replacing any pending deadline.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Schedule the action unless one is already pending.
    ///
    /// Returns `true` if a new deadline was set.
    pub fn schedule_once(&mut self, now: Instant) -> bool {
        if self.deadline.is_some() {
            return false;
        }
        self.schedule(now);
        true
    }

    /// Drop any pending deadline.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    /// Whether a deadline is pending.
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Fire if the deadline has passed. Fires at most once per schedule.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// The configured delay.
    pub fn delay(&self) -> Duration {
        self.delay
    }
}
