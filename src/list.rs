//! Fetch state for the current page of tickets.
//!
//! Loads are split into [`ListController::begin`] and
//! [`ListController::complete`] so the owner decides where the request runs.
//! Every begun load gets a generation number; a response whose generation is
//! not the latest is discarded, so an older request finishing late can never
//! overwrite a newer one.

use tracing::{debug, warn};

use crate::api::{PageRequest, TicketSource};
use crate::error::Result;
use crate::types::{PageResult, Ticket, TicketStats};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    /// Foreground load; blocks the table only while it is empty
    Loading,
    /// Background refresh; the current page stays interactive
    Refreshing,
    Success,
    Error(String),
}

impl FetchState {
    fn is_settled(&self) -> bool {
        matches!(self, FetchState::Success | FetchState::Error(_))
    }
}

/// The last successfully loaded page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageSnapshot {
    pub items: Vec<Ticket>,
    pub total: u64,
    pub stats: TicketStats,
}

impl From<PageResult> for PageSnapshot {
    fn from(page: PageResult) -> Self {
        Self {
            items: page.tickets,
            total: page.total,
            stats: page.stats,
        }
    }
}

/// A load that has been started and must be handed back to
/// [`ListController::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub generation: u64,
    pub silent: bool,
    pub request: PageRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The page replaced the snapshot
    Applied,
    /// The load failed; see [`ListController::error`] or
    /// [`ListController::background_error`]
    Failed,
    /// A newer load was started after this one; the response was dropped
    Superseded,
}

#[derive(Debug, Clone, Default)]
pub struct ListController {
    state: FetchState,
    /// State to return to when a silent refresh fails
    settled: FetchState,
    snapshot: PageSnapshot,
    generation: u64,
    background_error: Option<String>,
    stopped: bool,
}

impl ListController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a load for `request`.
    ///
    /// Foreground loads always start and supersede anything in flight. Silent
    /// loads only start from a settled state, so a refresh tick never stacks
    /// on top of a running load. Returns `None` when nothing was started.
    pub fn begin(&mut self, request: PageRequest, silent: bool) -> Option<LoadTicket> {
        if self.stopped {
            return None;
        }
        if silent && !self.state.is_settled() {
            debug!(state = ?self.state, "skipping background refresh");
            return None;
        }

        if self.state.is_settled() {
            self.settled = self.state.clone();
        }
        self.generation += 1;
        self.state = if silent {
            FetchState::Refreshing
        } else {
            FetchState::Loading
        };
        debug!(
            generation = self.generation,
            silent,
            page = request.page,
            "loading tickets"
        );

        Some(LoadTicket {
            generation: self.generation,
            silent,
            request,
        })
    }

    /// Apply the response for a load started with [`ListController::begin`].
    pub fn complete(&mut self, ticket: &LoadTicket, result: Result<PageResult>) -> LoadOutcome {
        if self.stopped || ticket.generation != self.generation {
            debug!(
                generation = ticket.generation,
                latest = self.generation,
                "discarding superseded ticket page"
            );
            return LoadOutcome::Superseded;
        }

        match result {
            Ok(page) => {
                debug!(
                    generation = ticket.generation,
                    total = page.total,
                    rows = page.tickets.len(),
                    "ticket page loaded"
                );
                self.snapshot = page.into();
                self.background_error = None;
                self.state = FetchState::Success;
                LoadOutcome::Applied
            }
            Err(e) if ticket.silent => {
                warn!(error = %e, "background refresh failed");
                self.background_error = Some(e.to_string());
                self.state = self.settled.clone();
                LoadOutcome::Failed
            }
            Err(e) => {
                warn!(error = %e, "failed to load tickets");
                self.state = FetchState::Error(e.to_string());
                LoadOutcome::Failed
            }
        }
    }

    /// Begin, fetch and complete in one step.
    pub async fn load<S: TicketSource>(
        &mut self,
        source: &S,
        request: PageRequest,
        silent: bool,
    ) -> Option<LoadOutcome> {
        let ticket = self.begin(request, silent)?;
        let result = source.fetch_page(&ticket.request).await;
        Some(self.complete(&ticket, result))
    }

    /// Stop accepting loads and responses (view unmounted).
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn state(&self) -> &FetchState {
        &self.state
    }

    pub fn snapshot(&self) -> &PageSnapshot {
        &self.snapshot
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        self.state == FetchState::Loading
    }

    pub fn is_refreshing(&self) -> bool {
        self.state == FetchState::Refreshing
    }

    /// A foreground load with nothing to show yet
    pub fn show_blocking_loader(&self) -> bool {
        self.is_loading() && self.snapshot.items.is_empty()
    }

    /// Error to show with a retry action.
    ///
    /// A background refresh started from an error keeps reporting it until
    /// the refresh succeeds.
    pub fn error(&self) -> Option<&str> {
        match (&self.state, &self.settled) {
            (FetchState::Error(message), _) => Some(message.as_str()),
            (FetchState::Refreshing, FetchState::Error(message)) => Some(message.as_str()),
            _ => None,
        }
    }

    /// Last silent refresh failure, kept out of the visible state
    pub fn background_error(&self) -> Option<&str> {
        self.background_error.as_deref()
    }
}
