//! Render-ready snapshot of the ticket view
//!
//! This module separates the live view state (filters, pagination, list and
//! detail queue) from what a renderer needs, so rendering decisions can be
//! unit tested without a runtime.

use std::collections::HashSet;
use std::sync::Arc;

use crate::detail::DetailStatus;
use crate::filter::{FilterCriteria, FilterPipeline};
use crate::list::{FetchState, ListController};
use crate::pagination::Pagination;
use crate::stats::{ShortcutCard, color_cards, status_cards};
use crate::types::{ActivityRecord, Ticket};

/// Shown in an expanded row that has no timeline to display
pub const NO_ACTIVITY_MESSAGE: &str = "No timeline activities available";

// ============================================================================
// View Model Types
// ============================================================================

#[derive(Debug, Clone)]
pub struct ViewSnapshot {
    /// Criteria the current page was requested with
    pub criteria: FilterCriteria,
    /// What the filter inputs show, including text still debouncing
    pub draft: FilterCriteria,
    pub state: FetchState,
    /// Foreground load with an empty table
    pub blocking_loader: bool,
    /// Background refresh in progress
    pub refreshing: bool,
    /// Error shown with a retry action
    pub error: Option<String>,
    pub rows: Vec<RowView>,
    pub pagination: PaginationView,
    pub status_cards: Vec<ShortcutCard>,
    pub color_cards: Vec<ShortcutCard>,
}

#[derive(Debug, Clone)]
pub struct RowView {
    pub key: String,
    pub ticket: Ticket,
    pub expanded: bool,
    /// Only computed for expanded rows
    pub detail: Option<RowDetail>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowDetail {
    /// The ticket has no tracking number to look up
    NoTracking,
    Queued,
    Loading,
    Timeline(Arc<[ActivityRecord]>),
    /// Fetch failed, expired, or returned no records
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationView {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_count: u64,
    pub visible_range: Option<(u64, u64)>,
    pub has_prev: bool,
    pub has_next: bool,
}

// ============================================================================
// Computation
// ============================================================================

/// Build the snapshot from the live parts of the view.
///
/// `detail` reports the timeline status for a tracking number.
pub fn compute_view_snapshot(
    filters: &FilterPipeline,
    pagination: &Pagination,
    list: &ListController,
    expanded: &HashSet<String>,
    detail: impl Fn(&str) -> DetailStatus,
) -> ViewSnapshot {
    let criteria = filters.criteria();
    let page = list.snapshot();

    let rows = page
        .items
        .iter()
        .map(|ticket| {
            let key = ticket.row_key().to_string();
            let is_expanded = expanded.contains(&key);
            let detail = is_expanded.then(|| row_detail(ticket, &detail));
            RowView {
                key,
                ticket: ticket.clone(),
                expanded: is_expanded,
                detail,
            }
        })
        .collect();

    let total_pages = pagination.total_pages();
    let current_page = pagination.current_page();

    ViewSnapshot {
        draft: filters.draft(),
        state: list.state().clone(),
        blocking_loader: list.show_blocking_loader(),
        refreshing: list.is_refreshing(),
        error: list.error().map(str::to_string),
        rows,
        pagination: PaginationView {
            current_page,
            total_pages,
            total_count: pagination.total_count(),
            visible_range: pagination.visible_range(),
            has_prev: current_page > 1,
            has_next: current_page < total_pages,
        },
        status_cards: status_cards(&page.stats.status, page.total, &criteria),
        color_cards: color_cards(&page.stats.color, &criteria),
        criteria,
    }
}

fn row_detail(ticket: &Ticket, detail: &impl Fn(&str) -> DetailStatus) -> RowDetail {
    let Some(gr_no) = ticket.gr_no() else {
        return RowDetail::NoTracking;
    };
    match detail(gr_no) {
        DetailStatus::Ready(records) if records.is_empty() => RowDetail::Empty,
        DetailStatus::Ready(records) => RowDetail::Timeline(records),
        DetailStatus::Queued => RowDetail::Queued,
        DetailStatus::Loading => RowDetail::Loading,
        DetailStatus::Unavailable => RowDetail::Empty,
    }
}
