//! Filter criteria and the pipeline that turns raw edits into committed criteria.
//!
//! Enumerated fields (status, color, delay) commit immediately. Text fields
//! (search, origin, destination) go through their own [`Debounced`] and only
//! commit once they have been quiet for the debounce period.

pub mod debounce;

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::stats::StatsShortcut;
use crate::types::{DelayBucket, PriorityColor, TicketStatus};

pub use debounce::{DEFAULT_DEBOUNCE, Debounced};

/// The effective filter a list request is built from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterCriteria {
    pub status: Option<TicketStatus>,
    pub color: Option<PriorityColor>,
    pub origin: String,
    pub destination: String,
    pub delay: DelayBucket,
    pub search: String,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: TicketStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_color(mut self, color: PriorityColor) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Query parameters for the filter part of a request. Defaults ("all",
    /// empty text) are omitted; text values are trimmed.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status", status.to_string()));
        }
        if let Some(color) = self.color {
            pairs.push(("color", color.to_string()));
        }
        push_text(&mut pairs, "origin", &self.origin);
        push_text(&mut pairs, "destination", &self.destination);
        if let Some(delay) = self.delay.wire_value() {
            pairs.push(("delay", delay.to_string()));
        }
        push_text(&mut pairs, "search", &self.search);
        pairs
    }
}

fn push_text(pairs: &mut Vec<(&'static str, String)>, key: &'static str, value: &str) {
    let value = value.trim();
    if !value.is_empty() {
        pairs.push((key, value.to_string()));
    }
}

/// A raw edit to one filter field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterEdit {
    Status(Option<TicketStatus>),
    Color(Option<PriorityColor>),
    Delay(DelayBucket),
    Search(String),
    Origin(String),
    Destination(String),
}

#[derive(Debug, Clone)]
pub struct FilterPipeline {
    status: Option<TicketStatus>,
    color: Option<PriorityColor>,
    delay: DelayBucket,
    search: Debounced<String>,
    origin: Debounced<String>,
    destination: Debounced<String>,
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl FilterPipeline {
    pub fn new(quiet: Duration) -> Self {
        Self::with_criteria(FilterCriteria::default(), quiet)
    }

    /// Start from already-effective criteria (e.g. from command line flags).
    pub fn with_criteria(criteria: FilterCriteria, quiet: Duration) -> Self {
        Self {
            status: criteria.status,
            color: criteria.color,
            delay: criteria.delay,
            search: Debounced::new(criteria.search, quiet),
            origin: Debounced::new(criteria.origin, quiet),
            destination: Debounced::new(criteria.destination, quiet),
        }
    }

    /// Apply a raw edit made at `now`.
    ///
    /// Returns `true` when the effective criteria changed right away, which
    /// only enumerated fields can do. Text edits return `false` and surface
    /// later through [`FilterPipeline::poll`].
    pub fn apply(&mut self, edit: FilterEdit, now: Instant) -> bool {
        match edit {
            FilterEdit::Status(status) => replace(&mut self.status, status),
            FilterEdit::Color(color) => replace(&mut self.color, color),
            FilterEdit::Delay(delay) => replace(&mut self.delay, delay),
            FilterEdit::Search(text) => {
                self.search.edit(text, now);
                false
            }
            FilterEdit::Origin(text) => {
                self.origin.edit(text, now);
                false
            }
            FilterEdit::Destination(text) => {
                self.destination.edit(text, now);
                false
            }
        }
    }

    /// Commit every text field whose quiet period has elapsed.
    ///
    /// Returns `true` if at least one committed value changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        // Poll all three; a short-circuiting `||` would leave later fields pending.
        let search = self.search.poll(now).is_some();
        let origin = self.origin.poll(now).is_some();
        let destination = self.destination.poll(now).is_some();
        search || origin || destination
    }

    /// Earliest pending text deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.search.deadline(),
            self.origin.deadline(),
            self.destination.deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Set one facet from a stats card and reset every other field.
    ///
    /// Status and color are alternative facets, so choosing one clears the
    /// other along with text and delay filters. Returns `true` if the
    /// effective criteria changed.
    pub fn apply_shortcut(&mut self, shortcut: StatsShortcut) -> bool {
        let before = self.criteria();
        let mut next = FilterCriteria::default();
        match shortcut {
            StatsShortcut::Status(status) => next.status = status,
            StatsShortcut::Color(color) => next.color = Some(color),
        }
        self.reset_to(next);
        before != self.criteria()
    }

    /// Drop pending edits and make `criteria` effective.
    pub fn reset_to(&mut self, criteria: FilterCriteria) {
        self.status = criteria.status;
        self.color = criteria.color;
        self.delay = criteria.delay;
        self.search.reset(criteria.search);
        self.origin.reset(criteria.origin);
        self.destination.reset(criteria.destination);
    }

    /// The committed criteria
    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            status: self.status,
            color: self.color,
            origin: self.origin.committed().clone(),
            destination: self.destination.committed().clone(),
            delay: self.delay,
            search: self.search.committed().clone(),
        }
    }

    /// What the inputs currently show, including uncommitted text
    pub fn draft(&self) -> FilterCriteria {
        FilterCriteria {
            status: self.status,
            color: self.color,
            origin: self.origin.draft().clone(),
            destination: self.destination.draft().clone(),
            delay: self.delay,
            search: self.search.draft().clone(),
        }
    }

    pub fn has_pending_edits(&self) -> bool {
        self.search.is_pending() || self.origin.is_pending() || self.destination.is_pending()
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}
