//! Deadline-based debouncing for text inputs.
//!
//! Each [`Debounced`] value holds at most one pending edit with a deadline.
//! A new edit replaces the pending value and restarts the deadline, which is
//! the cancel-and-restart behavior of a single scheduled callback. The owner
//! drives it by sleeping until [`Debounced::deadline`] and then calling
//! [`Debounced::poll`].

use std::time::Duration;

use tokio::time::Instant;

/// Quiet period before a text edit becomes effective.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct Debounced<T> {
    quiet: Duration,
    committed: T,
    pending: Option<Pending<T>>,
}

#[derive(Debug, Clone)]
struct Pending<T> {
    value: T,
    deadline: Instant,
}

impl<T: Clone + PartialEq> Debounced<T> {
    pub fn new(initial: T, quiet: Duration) -> Self {
        Self {
            quiet,
            committed: initial,
            pending: None,
        }
    }

    /// Record an edit made at `now`, restarting the quiet period.
    pub fn edit(&mut self, value: T, now: Instant) {
        self.pending = Some(Pending {
            value,
            deadline: now + self.quiet,
        });
    }

    /// When the pending edit becomes due, if there is one.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// Commit the pending edit if its quiet period has elapsed.
    ///
    /// Returns the newly committed value, or `None` if nothing was due or the
    /// settled value equals the one already committed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let due = self.pending.as_ref().is_some_and(|p| p.deadline <= now);
        if !due {
            return None;
        }
        let pending = self.pending.take()?;
        if pending.value == self.committed {
            return None;
        }
        self.committed = pending.value;
        Some(self.committed.clone())
    }

    /// The value requests are built from.
    pub fn committed(&self) -> &T {
        &self.committed
    }

    /// What the user currently sees in the input (pending edit or committed value).
    pub fn draft(&self) -> &T {
        self.pending
            .as_ref()
            .map(|p| &p.value)
            .unwrap_or(&self.committed)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop any pending edit and commit `value` immediately.
    pub fn reset(&mut self, value: T) {
        self.pending = None;
        self.committed = value;
    }
}
