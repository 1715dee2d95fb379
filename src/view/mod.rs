//! The live ticket view: filters, pagination, the page list and row details
//! wired together.
//!
//! A [`TicketView`] is created by [`TicketView::mount`] and driven by two
//! calls: [`TicketView::dispatch`] for user actions and
//! [`TicketView::next_update`], which waits for whichever comes first of a
//! page response, a timeline completion, a debounce deadline or the
//! background refresh timer.

pub mod model;

#[cfg(test)]
mod tests;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at, sleep_until};
use tracing::debug;

use crate::api::{PageRequest, TicketSource};
use crate::config::Config;
use crate::detail::{
    DEFAULT_CONCURRENCY, DEFAULT_TTL, DetailCache, DetailEvent, DetailQueue, RequestOutcome,
};
use crate::error::Result;
use crate::filter::{DEFAULT_DEBOUNCE, FilterCriteria, FilterEdit, FilterPipeline};
use crate::list::{ListController, LoadOutcome, LoadTicket};
use crate::pagination::{DEFAULT_PAGE_SIZE, Pagination};
use crate::stats::StatsShortcut;
use crate::types::{PageResult, Ticket};

pub use model::{
    NO_ACTIVITY_MESSAGE, PaginationView, RowDetail, RowView, ViewSnapshot, compute_view_snapshot,
};

/// Background refresh period
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Tunables for one view instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewConfig {
    pub page_size: u32,
    pub refresh_interval: Duration,
    pub detail_ttl: Duration,
    pub detail_concurrency: usize,
    pub detail_cache_max_entries: Option<usize>,
    pub debounce: Duration,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            detail_ttl: DEFAULT_TTL,
            detail_concurrency: DEFAULT_CONCURRENCY,
            detail_cache_max_entries: None,
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

impl From<&Config> for ViewConfig {
    fn from(config: &Config) -> Self {
        Self {
            page_size: config.page_size,
            refresh_interval: config.refresh_interval(),
            detail_ttl: config.detail_ttl(),
            detail_concurrency: config.detail_concurrency,
            detail_cache_max_entries: config.detail_cache_max_entries,
            debounce: config.debounce(),
        }
    }
}

/// A user action against the view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewAction {
    Edit(FilterEdit),
    Shortcut(StatsShortcut),
    GoToPage(u32),
    NextPage,
    PrevPage,
    /// Expand or collapse the row with this key
    ToggleRow(String),
    /// Re-run the current foreground load after an error
    Retry,
    /// Trigger a background refresh now
    Refresh,
}

/// What changed after [`TicketView::next_update`] returned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewUpdate {
    List(LoadOutcome),
    Detail(DetailEvent),
    /// A debounced text filter settled and a new page was requested
    FiltersCommitted,
    RefreshStarted,
}

type PageResponse = (LoadTicket, Result<PageResult>);

pub struct TicketView<S> {
    source: Arc<S>,
    filters: FilterPipeline,
    pagination: Pagination,
    list: ListController,
    details: DetailQueue<S>,
    detail_events: broadcast::Receiver<DetailEvent>,
    expanded: HashSet<String>,
    responses_tx: mpsc::UnboundedSender<PageResponse>,
    responses_rx: mpsc::UnboundedReceiver<PageResponse>,
    refresh: Interval,
    mounted: bool,
}

impl<S: TicketSource + 'static> TicketView<S> {
    /// Create the view and request the first page. Must be called inside a
    /// tokio runtime.
    pub fn mount(source: Arc<S>, config: ViewConfig, initial: FilterCriteria) -> Self {
        let cache = DetailCache::new(config.detail_ttl)
            .with_max_entries(config.detail_cache_max_entries);
        let details = DetailQueue::new(Arc::clone(&source), cache, config.detail_concurrency);
        let detail_events = details.subscribe();
        let (responses_tx, responses_rx) = mpsc::unbounded_channel();

        let period = config.refresh_interval.max(Duration::from_millis(1));
        let mut refresh = interval_at(Instant::now() + period, period);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut view = Self {
            source,
            filters: FilterPipeline::with_criteria(initial, config.debounce),
            pagination: Pagination::new(config.page_size),
            list: ListController::new(),
            details,
            detail_events,
            expanded: HashSet::new(),
            responses_tx,
            responses_rx,
            refresh,
            mounted: true,
        };
        view.load(false);
        view
    }

    /// Apply a user action. Returns `true` if the view changed.
    pub fn dispatch(&mut self, action: ViewAction) -> bool {
        if !self.mounted {
            return false;
        }
        match action {
            ViewAction::Edit(edit) => {
                let text_edit = matches!(
                    edit,
                    FilterEdit::Search(_) | FilterEdit::Origin(_) | FilterEdit::Destination(_)
                );
                if self.filters.apply(edit, Instant::now()) {
                    self.commit_filters();
                    return true;
                }
                // The draft changed even though nothing was committed yet
                text_edit
            }
            ViewAction::Shortcut(shortcut) => {
                if self.filters.apply_shortcut(shortcut) {
                    self.commit_filters();
                    return true;
                }
                false
            }
            ViewAction::GoToPage(page) => {
                let moved = self.pagination.go_to(page);
                self.after_navigation(moved)
            }
            ViewAction::NextPage => {
                let moved = self.pagination.next();
                self.after_navigation(moved)
            }
            ViewAction::PrevPage => {
                let moved = self.pagination.prev();
                self.after_navigation(moved)
            }
            ViewAction::ToggleRow(key) => self.toggle_row(&key),
            ViewAction::Retry => self.load(false),
            ViewAction::Refresh => self.load(true),
        }
    }

    /// Wait for the next thing that changes the view.
    ///
    /// Returns `None` once the view is unmounted.
    pub async fn next_update(&mut self) -> Option<ViewUpdate> {
        loop {
            if !self.mounted {
                return None;
            }
            let deadline = self.filters.next_deadline();
            let detail_expiry = self.next_detail_expiry(Instant::now());

            tokio::select! {
                Some((ticket, result)) = self.responses_rx.recv() => {
                    return Some(ViewUpdate::List(self.apply_page(&ticket, result)));
                }
                event = self.detail_events.recv() => match event {
                    Ok(event) => return Some(ViewUpdate::Detail(event)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "detail events lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if self.filters.poll(Instant::now()) {
                        self.commit_filters();
                        return Some(ViewUpdate::FiltersCommitted);
                    }
                }
                _ = sleep_until(detail_expiry.unwrap_or_else(Instant::now)), if detail_expiry.is_some() => {
                    // The re-fetch announces itself through a detail event
                    self.refetch_expired_details();
                }
                _ = self.refresh.tick() => {
                    self.refetch_expired_details();
                    if self.load(true) {
                        return Some(ViewUpdate::RefreshStarted);
                    }
                }
            }
        }
    }

    /// Tear the view down: no further loads, refreshes or detail results.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        debug!("unmounting ticket view");
        self.mounted = false;
        self.list.stop();
        self.details.close();
        self.expanded.clear();
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        compute_view_snapshot(
            &self.filters,
            &self.pagination,
            &self.list,
            &self.expanded,
            |gr_no| self.details.status(gr_no),
        )
    }

    /// Find a row on the current page by row key or ticket number.
    pub fn find_row(&self, needle: &str) -> Option<&Ticket> {
        let needle = needle.trim();
        self.list
            .snapshot()
            .items
            .iter()
            .find(|t| t.row_key() == needle || t.ticket_number.eq_ignore_ascii_case(needle))
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn criteria(&self) -> FilterCriteria {
        self.filters.criteria()
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn list(&self) -> &ListController {
        &self.list
    }

    pub fn details(&self) -> &DetailQueue<S> {
        &self.details
    }

    pub fn expanded_rows(&self) -> &HashSet<String> {
        &self.expanded
    }

    fn commit_filters(&mut self) {
        debug!(criteria = ?self.filters.criteria(), "filters committed");
        self.pagination.reset();
        self.expanded.clear();
        self.load(false);
    }

    fn after_navigation(&mut self, moved: bool) -> bool {
        if moved {
            self.expanded.clear();
            self.load(false);
        }
        moved
    }

    fn toggle_row(&mut self, key: &str) -> bool {
        if self.expanded.remove(key) {
            // Collapsing leaves any fetch or cache entry alone
            return true;
        }
        let Some(ticket) = self.list.snapshot().items.iter().find(|t| t.row_key() == key) else {
            return false;
        };
        let gr_no = ticket.gr_no().map(str::to_string);
        self.expanded.insert(key.to_string());
        if let Some(gr_no) = gr_no {
            let outcome = self.details.request(&gr_no);
            debug!(row = %key, gr_no = %gr_no, ?outcome, "row expanded");
        }
        true
    }

    /// Tracking numbers of the expanded rows on the current page
    fn expanded_gr_nos(&self) -> Vec<String> {
        self.list
            .snapshot()
            .items
            .iter()
            .filter(|t| self.expanded.contains(t.row_key()))
            .filter_map(|t| t.gr_no().map(str::to_string))
            .collect()
    }

    /// Earliest future expiry among timelines shown in expanded rows.
    fn next_detail_expiry(&self, now: Instant) -> Option<Instant> {
        self.expanded_gr_nos()
            .iter()
            .filter_map(|gr_no| self.details.expires_at(gr_no))
            .filter(|at| *at > now)
            .min()
    }

    /// Ask again for every expanded row whose cached timeline went stale.
    /// Rows whose last fetch failed have no entry and are left alone.
    fn refetch_expired_details(&mut self) -> usize {
        let now = Instant::now();
        let mut requested = 0;
        for gr_no in self.expanded_gr_nos() {
            if self.details.expires_at(&gr_no).is_some_and(|at| at <= now)
                && self.details.request(&gr_no) == RequestOutcome::Enqueued
            {
                debug!(gr_no = %gr_no, "timeline expired, fetching again");
                requested += 1;
            }
        }
        requested
    }

    /// Start a page load for the committed criteria and current page.
    fn load(&mut self, silent: bool) -> bool {
        let request = PageRequest::new(
            self.filters.criteria(),
            self.pagination.current_page(),
            self.pagination.page_size(),
        );
        let Some(ticket) = self.list.begin(request, silent) else {
            return false;
        };

        let source = Arc::clone(&self.source);
        let responses = self.responses_tx.clone();
        tokio::spawn(async move {
            let result = source.fetch_page(&ticket.request).await;
            // The view may be gone; nothing to deliver to then
            let _ = responses.send((ticket, result));
        });
        true
    }

    fn apply_page(&mut self, ticket: &LoadTicket, result: Result<PageResult>) -> LoadOutcome {
        let outcome = self.list.complete(ticket, result);
        if outcome == LoadOutcome::Applied {
            let total = self.list.snapshot().total;
            if self.pagination.set_total(total) {
                debug!(
                    total,
                    page = self.pagination.current_page(),
                    "page clamped after total changed"
                );
                self.expanded.clear();
                self.load(false);
            } else {
                self.refetch_expired_details();
            }
        }
        outcome
    }
}
