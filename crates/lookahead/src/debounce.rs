//! Trailing-edge debouncing.
//!
//! A [`Debouncer`] coalesces a burst of values into a single emission once no
//! new value has arrived for the quiet interval. It never drops the latest
//! value: each push replaces the pending one and restarts the wait.
//!
//! The debouncer holds no timer of its own. The pending deadline *is* the
//! timer handle; whoever owns the debouncer waits until [`Debouncer::deadline`]
//! and then calls [`Debouncer::poll`]. Cancelling is dropping the deadline.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Pending<T> {
    value: T,
    deadline: Instant,
}

/// Coalesces rapid updates into one emission per quiet period.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    interval: Duration,
    pending: Option<Pending<T>>,
}

impl<T> Debouncer<T> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Change the quiet interval. A pending value keeps its deadline.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Feed a new value observed at `now`.
    ///
    /// Returns the value straight back when the interval is zero. Otherwise the
    /// value replaces any pending one and the wait restarts from `now`.
    pub fn push(&mut self, value: T, now: Instant) -> Option<T> {
        if self.interval.is_zero() {
            self.pending = None;
            return Some(value);
        }

        self.pending = Some(Pending {
            value,
            deadline: now + self.interval,
        });
        None
    }

    /// True while a value is waiting for the quiet period to elapse.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending value becomes due, if there is one.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// The value waiting to be emitted, left in place.
    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref().map(|p| &p.value)
    }

    /// True once the pending value's deadline has passed by `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline().is_some_and(|deadline| now >= deadline)
    }

    /// Restart the wait for the pending value from `now`, keeping the value.
    /// Returns false when nothing is pending.
    pub fn defer(&mut self, now: Instant) -> bool {
        match &mut self.pending {
            Some(pending) => {
                pending.deadline = now + self.interval;
                true
            }
            None => false,
        }
    }

    /// Emit the pending value if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        if self.is_due(now) {
            self.flush()
        } else {
            None
        }
    }

    /// Emit the pending value without waiting.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|p| p.value)
    }

    /// Drop the pending value, if any. Returns whether something was cancelled.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }
}
