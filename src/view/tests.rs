//! Tests for the live ticket view against a scripted backend: page loads,
//! filter commits, pagination, background refresh and row details.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use super::*;
use crate::detail::DetailStatus;
use crate::test_support::{ScriptedSource, sample_tickets};
use crate::types::{PriorityColor, TicketStatus};

// ============================================================================
// Helpers
// ============================================================================

fn mount(source: &Arc<ScriptedSource>) -> TicketView<ScriptedSource> {
    TicketView::mount(
        Arc::clone(source),
        ViewConfig::default(),
        FilterCriteria::default(),
    )
}

async fn next(view: &mut TicketView<ScriptedSource>) -> ViewUpdate {
    view.next_update().await.expect("view unmounted")
}

async fn until_list(view: &mut TicketView<ScriptedSource>) -> LoadOutcome {
    loop {
        if let ViewUpdate::List(outcome) = next(view).await {
            return outcome;
        }
    }
}

async fn until_detail(view: &mut TicketView<ScriptedSource>) -> DetailEvent {
    loop {
        if let ViewUpdate::Detail(event) = next(view).await {
            return event;
        }
    }
}

fn row_keys(view: &TicketView<ScriptedSource>) -> Vec<String> {
    view.snapshot().rows.into_iter().map(|r| r.key).collect()
}

// ============================================================================
// Loading
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_mount_loads_first_page() {
    let source = Arc::new(ScriptedSource::new(sample_tickets(45)));
    let mut view = mount(&source);
    assert!(view.snapshot().blocking_loader);

    assert_eq!(until_list(&mut view).await, LoadOutcome::Applied);
    let snapshot = view.snapshot();
    assert!(!snapshot.blocking_loader);
    assert_eq!(snapshot.rows.len(), 10);
    assert_eq!(snapshot.pagination.total_pages, 5);
    assert_eq!(snapshot.status_cards[0].count, 45);
    assert!(view.list().snapshot().stats.is_consistent(45));

    let requests = source.page_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!((requests[0].page, requests[0].limit), (1, 10));
}

#[tokio::test(start_paused = true)]
async fn test_failed_load_then_retry() {
    let source = Arc::new(ScriptedSource::new(sample_tickets(12)));
    source.set_fail_pages(true);
    let mut view = mount(&source);

    assert_eq!(until_list(&mut view).await, LoadOutcome::Failed);
    let snapshot = view.snapshot();
    assert!(snapshot.error.is_some());
    assert!(snapshot.rows.is_empty());

    source.set_fail_pages(false);
    assert!(view.dispatch(ViewAction::Retry));
    assert_eq!(until_list(&mut view).await, LoadOutcome::Applied);
    assert_eq!(view.snapshot().error, None);
    assert_eq!(view.snapshot().rows.len(), 10);
}

#[tokio::test(start_paused = true)]
async fn test_superseded_response_is_discarded() {
    let source = Arc::new(ScriptedSource::new(sample_tickets(45)));
    // The initial unfiltered load answers late
    source.push_page_delay(Duration::from_secs(2));
    let mut view = mount(&source);

    assert!(view.dispatch(ViewAction::Edit(FilterEdit::Status(Some(
        TicketStatus::Open
    )))));

    assert_eq!(until_list(&mut view).await, LoadOutcome::Applied);
    assert_eq!(view.snapshot().pagination.total_count, 12);

    assert_eq!(until_list(&mut view).await, LoadOutcome::Superseded);
    let snapshot = view.snapshot();
    assert_eq!(snapshot.pagination.total_count, 12);
    assert!(
        snapshot
            .rows
            .iter()
            .all(|r| r.ticket.status() == Some(TicketStatus::Open))
    );
}

// ============================================================================
// Filters
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_filter_commit_resets_page_and_expanded_rows() {
    let source = Arc::new(ScriptedSource::new(sample_tickets(45)));
    let mut view = mount(&source);
    until_list(&mut view).await;

    assert!(view.dispatch(ViewAction::GoToPage(3)));
    until_list(&mut view).await;
    assert!(view.dispatch(ViewAction::ToggleRow("id-21".to_string())));
    assert!(view.expanded_rows().contains("id-21"));

    assert!(view.dispatch(ViewAction::Edit(FilterEdit::Status(Some(
        TicketStatus::Closed
    )))));
    assert_eq!(view.pagination().current_page(), 1);
    assert!(view.expanded_rows().is_empty());

    assert_eq!(until_list(&mut view).await, LoadOutcome::Applied);
    let last = source.page_requests().pop().unwrap();
    assert_eq!(last.page, 1);
    assert_eq!(last.criteria.status, Some(TicketStatus::Closed));
}

#[tokio::test(start_paused = true)]
async fn test_rapid_search_edits_issue_one_request() {
    let source = Arc::new(ScriptedSource::new(sample_tickets(45)));
    let mut view = mount(&source);
    until_list(&mut view).await;

    for text in ["G", "GR", "GRL", "GRL-0000", "GRL-00007"] {
        assert!(view.dispatch(ViewAction::Edit(FilterEdit::Search(text.to_string()))));
        tokio::time::advance(Duration::from_millis(100)).await;
    }
    assert_eq!(view.snapshot().draft.search, "GRL-00007");
    assert_eq!(view.criteria().search, "");

    assert_eq!(next(&mut view).await, ViewUpdate::FiltersCommitted);
    assert_eq!(until_list(&mut view).await, LoadOutcome::Applied);

    let requests = source.page_requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].criteria.search, "GRL-00007");
    assert_eq!(row_keys(&view), vec!["id-7"]);
}

#[tokio::test(start_paused = true)]
async fn test_search_edit_back_to_committed_value_is_not_a_commit() {
    let source = Arc::new(ScriptedSource::new(sample_tickets(5)));
    let mut view = mount(&source);
    until_list(&mut view).await;

    view.dispatch(ViewAction::Edit(FilterEdit::Origin("Del".to_string())));
    tokio::time::advance(Duration::from_millis(200)).await;
    view.dispatch(ViewAction::Edit(FilterEdit::Origin(String::new())));

    // The debounce settles on the committed value; only the refresh timer is left
    assert_eq!(next(&mut view).await, ViewUpdate::RefreshStarted);
    until_list(&mut view).await;
    assert_eq!(source.page_calls(), 2);
    assert!(source.page_requests()[1].criteria.origin.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_shortcuts_set_one_dimension() {
    let source = Arc::new(ScriptedSource::new(sample_tickets(45)));
    let mut view = mount(&source);
    until_list(&mut view).await;

    assert!(view.dispatch(ViewAction::Shortcut(StatsShortcut::Status(Some(
        TicketStatus::Open
    )))));
    until_list(&mut view).await;

    assert!(view.dispatch(ViewAction::Shortcut(StatsShortcut::Color(
        PriorityColor::Red
    ))));
    until_list(&mut view).await;
    let criteria = view.criteria();
    assert_eq!(criteria.status, None);
    assert_eq!(criteria.color, Some(PriorityColor::Red));

    let snapshot = view.snapshot();
    assert!(
        snapshot
            .color_cards
            .iter()
            .any(|c| c.active && c.shortcut == StatsShortcut::Color(PriorityColor::Red))
    );

    // Same card again is a no-op
    assert!(!view.dispatch(ViewAction::Shortcut(StatsShortcut::Color(
        PriorityColor::Red
    ))));
    assert_eq!(source.page_calls(), 3);
}

// ============================================================================
// Pagination
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_go_to_page_beyond_last_is_rejected() {
    let source = Arc::new(ScriptedSource::new(sample_tickets(180)));
    let mut view = TicketView::mount(
        Arc::clone(&source),
        ViewConfig::default(),
        FilterCriteria::default().with_status(TicketStatus::Open),
    );
    until_list(&mut view).await;
    assert_eq!(view.snapshot().pagination.total_pages, 5);

    assert!(!view.dispatch(ViewAction::GoToPage(7)));
    assert_eq!(view.pagination().current_page(), 1);
    assert_eq!(source.page_calls(), 1);

    assert!(view.dispatch(ViewAction::GoToPage(5)));
    until_list(&mut view).await;
    assert_eq!(view.snapshot().rows.len(), 5);
    assert!(!view.dispatch(ViewAction::NextPage));
}

#[tokio::test(start_paused = true)]
async fn test_navigation_clears_expanded_rows() {
    let source = Arc::new(ScriptedSource::new(sample_tickets(45)));
    let mut view = mount(&source);
    until_list(&mut view).await;

    view.dispatch(ViewAction::ToggleRow("id-1".to_string()));
    assert!(view.dispatch(ViewAction::NextPage));
    assert!(view.expanded_rows().is_empty());
    until_list(&mut view).await;
    assert_eq!(row_keys(&view)[0], "id-11");

    assert!(view.dispatch(ViewAction::PrevPage));
    until_list(&mut view).await;
    assert_eq!(view.pagination().current_page(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_page_clamped_when_total_shrinks() {
    let source = Arc::new(ScriptedSource::new(sample_tickets(45)));
    let mut view = mount(&source);
    until_list(&mut view).await;
    view.dispatch(ViewAction::GoToPage(5));
    until_list(&mut view).await;
    view.dispatch(ViewAction::ToggleRow("id-41".to_string()));

    source.set_tickets(sample_tickets(23));
    assert!(view.dispatch(ViewAction::Refresh));

    // The refresh lands on an empty page 5, which clamps to 3 and reloads
    assert_eq!(until_list(&mut view).await, LoadOutcome::Applied);
    assert_eq!(view.pagination().current_page(), 3);
    assert!(view.expanded_rows().is_empty());

    assert_eq!(until_list(&mut view).await, LoadOutcome::Applied);
    assert_eq!(row_keys(&view), vec!["id-21", "id-22", "id-23"]);
    assert_eq!(source.page_requests().pop().unwrap().page, 3);
}

// ============================================================================
// Background refresh
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_background_refresh_keeps_expanded_rows() {
    let source = Arc::new(ScriptedSource::new(sample_tickets(45)).with_timeline("GRL-00001", 4));
    let mut view = mount(&source);
    until_list(&mut view).await;

    view.dispatch(ViewAction::ToggleRow("id-1".to_string()));
    assert_eq!(
        until_detail(&mut view).await,
        DetailEvent::Loaded {
            key: "GRL-00001".to_string(),
            count: 4
        }
    );

    assert_eq!(next(&mut view).await, ViewUpdate::RefreshStarted);
    let snapshot = view.snapshot();
    assert!(snapshot.refreshing);
    assert!(!snapshot.blocking_loader);
    assert_eq!(snapshot.rows.len(), 10);

    assert_eq!(until_list(&mut view).await, LoadOutcome::Applied);
    assert!(view.expanded_rows().contains("id-1"));
    assert_eq!(source.page_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_failed_background_refresh_keeps_page() {
    let source = Arc::new(ScriptedSource::new(sample_tickets(45)));
    let mut view = mount(&source);
    until_list(&mut view).await;

    source.set_fail_pages(true);
    assert!(view.dispatch(ViewAction::Refresh));
    assert_eq!(until_list(&mut view).await, LoadOutcome::Failed);

    let snapshot = view.snapshot();
    assert_eq!(snapshot.error, None);
    assert_eq!(snapshot.rows.len(), 10);
    assert!(view.list().background_error().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_refresh_skipped_while_loading() {
    let source = Arc::new(ScriptedSource::new(sample_tickets(5)));
    let mut view = mount(&source);
    assert!(!view.dispatch(ViewAction::Refresh));
    until_list(&mut view).await;
    assert_eq!(source.page_calls(), 1);
}

// ============================================================================
// Row details
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_reexpand_within_ttl_reuses_timeline() {
    let source = Arc::new(ScriptedSource::new(sample_tickets(10)).with_timeline("GRL-00001", 8));
    let mut view = mount(&source);
    until_list(&mut view).await;

    view.dispatch(ViewAction::ToggleRow("id-1".to_string()));
    assert_eq!(view.snapshot().rows[0].detail, Some(RowDetail::Loading));
    until_detail(&mut view).await;
    assert!(matches!(
        &view.snapshot().rows[0].detail,
        Some(RowDetail::Timeline(records)) if records.len() == 8
    ));

    assert!(view.dispatch(ViewAction::ToggleRow("id-1".to_string())));
    assert_eq!(view.snapshot().rows[0].detail, None);
    tokio::time::advance(Duration::from_secs(60)).await;

    assert!(view.dispatch(ViewAction::ToggleRow("id-1".to_string())));
    assert!(matches!(
        &view.snapshot().rows[0].detail,
        Some(RowDetail::Timeline(records)) if records.len() == 8
    ));
    assert_eq!(source.activity_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_open_row_refetches_timeline_once_after_ttl() {
    let source = Arc::new(ScriptedSource::new(sample_tickets(10)).with_timeline("GRL-00001", 8));
    let config = ViewConfig {
        refresh_interval: Duration::from_secs(3600),
        ..ViewConfig::default()
    };
    let mut view = TicketView::mount(Arc::clone(&source), config, FilterCriteria::default());
    until_list(&mut view).await;

    view.dispatch(ViewAction::ToggleRow("id-1".to_string()));
    until_detail(&mut view).await;
    assert_eq!(source.activity_calls(), 1);

    tokio::time::advance(DEFAULT_TTL - Duration::from_millis(1)).await;
    assert!(matches!(
        &view.snapshot().rows[0].detail,
        Some(RowDetail::Timeline(records)) if records.len() == 8
    ));

    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(
        until_detail(&mut view).await,
        DetailEvent::Loaded {
            key: "GRL-00001".to_string(),
            count: 8
        }
    );
    assert_eq!(source.activity_calls(), 2);
    assert!(view.expanded_rows().contains("id-1"));
    assert!(matches!(
        &view.snapshot().rows[0].detail,
        Some(RowDetail::Timeline(records)) if records.len() == 8
    ));
}

#[tokio::test(start_paused = true)]
async fn test_refresh_tick_refetches_expired_open_row() {
    let source = Arc::new(ScriptedSource::new(sample_tickets(10)).with_timeline("GRL-00001", 8));
    let mut view = mount(&source);
    until_list(&mut view).await;

    view.dispatch(ViewAction::ToggleRow("id-1".to_string()));
    until_detail(&mut view).await;

    tokio::time::advance(DEFAULT_TTL + Duration::from_secs(1)).await;
    assert_eq!(next(&mut view).await, ViewUpdate::RefreshStarted);
    let (mut page_done, mut detail_done) = (false, false);
    while !(page_done && detail_done) {
        match next(&mut view).await {
            ViewUpdate::List(outcome) => {
                assert_eq!(outcome, LoadOutcome::Applied);
                page_done = true;
            }
            ViewUpdate::Detail(event) => {
                assert_eq!(event.key(), "GRL-00001");
                detail_done = true;
            }
            other => panic!("unexpected update {other:?}"),
        }
    }

    assert_eq!(source.activity_calls(), 2);
    assert!(matches!(
        &view.snapshot().rows[0].detail,
        Some(RowDetail::Timeline(records)) if records.len() == 8
    ));
}

#[tokio::test(start_paused = true)]
async fn test_five_expanded_rows_respect_concurrency_limit() {
    let gate = Arc::new(Semaphore::new(0));
    let source = Arc::new(
        ScriptedSource::new(sample_tickets(10)).with_activity_gate(Arc::clone(&gate)),
    );
    let mut view = mount(&source);
    until_list(&mut view).await;

    for i in 1..=5 {
        view.dispatch(ViewAction::ToggleRow(format!("id-{i}")));
    }
    assert_eq!(view.details().in_flight_count(), 3);
    assert_eq!(view.details().queued_count(), 2);

    let details: Vec<_> = view.snapshot().rows.into_iter().filter_map(|r| r.detail).collect();
    assert_eq!(
        details,
        vec![
            RowDetail::Loading,
            RowDetail::Loading,
            RowDetail::Loading,
            RowDetail::Queued,
            RowDetail::Queued,
        ]
    );

    gate.add_permits(5);
    for _ in 0..5 {
        until_detail(&mut view).await;
    }
    assert_eq!(source.activity_calls(), 5);
    assert!(source.max_active_fetches() <= 3);
}

#[tokio::test(start_paused = true)]
async fn test_rows_sharing_a_shipment_share_one_fetch() {
    let mut tickets = sample_tickets(3);
    tickets[1].tracking_number = tickets[0].tracking_number.clone();
    let source = Arc::new(ScriptedSource::new(tickets).with_timeline("GRL-00001", 2));
    let mut view = mount(&source);
    until_list(&mut view).await;

    view.dispatch(ViewAction::ToggleRow("id-1".to_string()));
    view.dispatch(ViewAction::ToggleRow("id-2".to_string()));
    until_detail(&mut view).await;

    let snapshot = view.snapshot();
    assert_eq!(snapshot.rows[0].detail, snapshot.rows[1].detail);
    assert_eq!(source.activity_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_timeline_shows_fallback() {
    let source = Arc::new(ScriptedSource::new(sample_tickets(3)).with_timeline("GRL-00002", 5));
    source.fail_activity("GRL-00002");
    let mut view = mount(&source);
    until_list(&mut view).await;

    view.dispatch(ViewAction::ToggleRow("id-2".to_string()));
    assert!(matches!(
        until_detail(&mut view).await,
        DetailEvent::Failed { .. }
    ));
    assert_eq!(view.snapshot().rows[1].detail, Some(RowDetail::Empty));
    assert_eq!(view.details().status("GRL-00002"), DetailStatus::Unavailable);
}

#[tokio::test(start_paused = true)]
async fn test_row_without_tracking_number() {
    let mut tickets = sample_tickets(2);
    tickets[0].tracking_number = Some("  ".to_string());
    let source = Arc::new(ScriptedSource::new(tickets));
    let mut view = mount(&source);
    until_list(&mut view).await;

    assert!(view.dispatch(ViewAction::ToggleRow("id-1".to_string())));
    assert_eq!(view.snapshot().rows[0].detail, Some(RowDetail::NoTracking));
    assert_eq!(source.activity_calls(), 0);

    assert!(!view.dispatch(ViewAction::ToggleRow("id-404".to_string())));
}

#[tokio::test(start_paused = true)]
async fn test_find_row_by_ticket_number() {
    let source = Arc::new(ScriptedSource::new(sample_tickets(3)));
    let mut view = mount(&source);
    until_list(&mut view).await;

    assert_eq!(view.find_row("tkt-002").map(|t| t.id.as_str()), Some("id-2"));
    assert_eq!(view.find_row("id-3").map(|t| t.id.as_str()), Some("id-3"));
    assert!(view.find_row("TKT-999").is_none());
}

// ============================================================================
// Unmount
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_unmount_stops_everything() {
    let source = Arc::new(ScriptedSource::new(sample_tickets(3)).with_timeline("GRL-00001", 1));
    let mut view = mount(&source);
    until_list(&mut view).await;
    view.dispatch(ViewAction::ToggleRow("id-1".to_string()));
    until_detail(&mut view).await;

    view.unmount();
    assert!(!view.is_mounted());
    assert!(view.next_update().await.is_none());
    assert!(!view.dispatch(ViewAction::Refresh));
    assert_eq!(view.details().cached_len(), 0);
    assert_eq!(source.page_calls(), 1);
}
