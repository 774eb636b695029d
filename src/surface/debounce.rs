use std::time::Duration;

use tokio::time::Instant;

/// Coalesces coverage misses of one track into a single deferred request.
///
/// The first miss schedules a fire `delay` later; misses while a fire is
/// pending change nothing. The request itself is built when the fire is
/// taken, from whatever window is visible at that moment.
#[derive(Debug, Clone)]
pub struct BoundsDebouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl BoundsDebouncer {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Records a miss at `now`. Returns `true` when this miss scheduled a new
    /// fire.
    pub fn note_miss(&mut self, now: Instant) -> bool {
        if self.deadline.is_some() {
            return false;
        }
        self.deadline = Some(now + self.delay);
        true
    }

    /// Clears the pending fire if it is due at `now`.
    pub fn take_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}
