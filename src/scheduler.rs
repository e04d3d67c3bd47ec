//! Tick pacing and resize coalescing for the run loop.
//!
//! Both types take `now` explicitly so the loop owns the clock and tests can
//! drive them with synthetic instants.

use std::time::{Duration, Instant};

/// Caps the tick rate: a tick is due once `interval` has elapsed since the
/// last executed tick, and reports the wall-clock time since that tick.
#[derive(Debug)]
pub struct Scheduler {
    interval: Duration,
    last_tick: Instant,
}

impl Scheduler {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Scheduler {
            interval,
            last_tick: now,
        }
    }

    /// Returns `Some(dt)` when a tick should run now, `None` to defer.
    pub fn poll(&mut self, now: Instant) -> Option<Duration> {
        let dt = now.saturating_duration_since(self.last_tick);
        if dt < self.interval {
            return None;
        }
        self.last_tick = now;
        Some(dt)
    }

    pub fn time_until_tick(&self, now: Instant) -> Duration {
        self.interval
            .saturating_sub(now.saturating_duration_since(self.last_tick))
    }
}

/// Coalesces bursts of resize events: a size is applied only after no new
/// resize has arrived for `debounce`.
#[derive(Debug)]
pub struct ResizeDebouncer {
    debounce: Duration,
    last_resize: Option<Instant>,
    pending_size: Option<(u16, u16)>,
    last_applied: (u16, u16),
}

impl ResizeDebouncer {
    pub fn new(debounce: Duration, initial_size: (u16, u16)) -> Self {
        ResizeDebouncer {
            debounce,
            last_resize: None,
            pending_size: None,
            last_applied: initial_size,
        }
    }

    /// Record a resize event. Returns whether a rebuild is now pending.
    pub fn handle_resize_at(&mut self, width: u16, height: u16, now: Instant) -> bool {
        if self.pending_size.is_none() && (width, height) == self.last_applied {
            return false;
        }
        self.pending_size = Some((width, height));
        self.last_resize = Some(now);
        true
    }

    /// The size to rebuild for, once the quiet window has passed.
    pub fn tick_at(&mut self, now: Instant) -> Option<(u16, u16)> {
        let pending = self.pending_size?;
        let last = self.last_resize?;
        if now.saturating_duration_since(last) < self.debounce {
            return None;
        }
        self.pending_size = None;
        self.last_resize = None;
        self.last_applied = pending;
        Some(pending)
    }

    pub fn time_until_apply(&self, now: Instant) -> Option<Duration> {
        self.pending_size?;
        let last = self.last_resize?;
        Some(self.debounce.saturating_sub(now.saturating_duration_since(last)))
    }
}
