use std::collections::HashSet;

use owo_colors::OwoColorize;
use serde_json::json;

use super::{CommandOutput, load_source};
use crate::api::{PageRequest, TicketSource};
use crate::detail::DetailStatus;
use crate::display::{format_cards, render_view};
use crate::error::{DeskError, Result};
use crate::filter::{FilterCriteria, FilterPipeline};
use crate::list::{ListController, LoadOutcome};
use crate::pagination::Pagination;
use crate::stats::{color_cards, status_cards};
use crate::view::compute_view_snapshot;

/// Print one page of tickets matching `criteria`.
///
/// A page past the end is clamped to the last page.
pub async fn cmd_list(
    criteria: FilterCriteria,
    page: u32,
    api_url: Option<&str>,
    as_json: bool,
) -> Result<()> {
    let (config, source) = load_source(api_url)?;
    let mut pagination = Pagination::new(config.page_size);
    let mut list = ListController::new();

    load_page(&source, &mut list, &criteria, page.max(1), &pagination).await?;
    pagination.set_total(list.snapshot().total);

    if page > 1 && !pagination.go_to(page) {
        let last = pagination.total_pages().max(1);
        eprintln!(
            "{}",
            format!("Page {page} is out of range, showing page {last}").yellow()
        );
        pagination.go_to(last);
        load_page(&source, &mut list, &criteria, last, &pagination).await?;
    }

    let snapshot = list.snapshot();
    let json_output = json!({
        "criteria": criteria,
        "page": pagination.current_page(),
        "total_pages": pagination.total_pages(),
        "total": snapshot.total,
        "stats": snapshot.stats,
        "tickets": snapshot.items,
    });

    let filters = FilterPipeline::with_criteria(criteria, config.debounce());
    let view = compute_view_snapshot(&filters, &pagination, &list, &HashSet::new(), |_| {
        DetailStatus::Unavailable
    });

    CommandOutput::new(json_output)
        .with_text(render_view(&view))
        .print(as_json)
}

async fn load_page<S: TicketSource>(
    source: &S,
    list: &mut ListController,
    criteria: &FilterCriteria,
    page: u32,
    pagination: &Pagination,
) -> Result<()> {
    let request = PageRequest::new(criteria.clone(), page, pagination.page_size());
    match list.load(source, request, false).await {
        Some(LoadOutcome::Applied) => Ok(()),
        _ => Err(DeskError::Other(
            list.error()
                .unwrap_or("failed to load tickets")
                .to_string(),
        )),
    }
}

/// Print status and priority-color counts for `criteria`.
pub async fn cmd_stats(
    criteria: FilterCriteria,
    api_url: Option<&str>,
    as_json: bool,
) -> Result<()> {
    let (_, source) = load_source(api_url)?;
    let page = source
        .fetch_page(&PageRequest::new(criteria.clone(), 1, 1))
        .await?;

    let consistent = page.stats.is_consistent(page.total);
    if !consistent {
        tracing::warn!(
            total = page.total,
            status_sum = page.stats.status.sum(),
            color_sum = page.stats.color.sum(),
            "backend stats do not add up to the total"
        );
    }

    let json_output = json!({
        "criteria": criteria,
        "total": page.total,
        "statusStats": page.stats.status,
        "colorStats": page.stats.color,
        "consistent": consistent,
    });

    let text = format!(
        "{}\n{}\n\n{}\n{}",
        "Status".cyan().bold(),
        format_cards(&status_cards(&page.stats.status, page.total, &criteria)),
        "Priority".cyan().bold(),
        format_cards(&color_cards(&page.stats.color, &criteria)),
    );

    CommandOutput::new(json_output).with_text(text).print(as_json)
}
