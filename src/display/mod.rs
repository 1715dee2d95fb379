//! Terminal rendering for tickets, stats cards and timelines.

pub mod table;

use owo_colors::OwoColorize;

use crate::stats::ShortcutCard;
use crate::types::{PLACEHOLDER, PriorityColor, Ticket, TicketStatus, parse_timestamp};
use crate::view::PaginationView;

pub use table::{render_ticket_table, render_timeline, render_view};

pub fn format_status_colored(status: TicketStatus) -> String {
    let badge = format!("[{}]", status.label());
    match status {
        TicketStatus::Open => badge.yellow().to_string(),
        TicketStatus::Working => badge.cyan().to_string(),
        TicketStatus::Closed => badge.dimmed().to_string(),
        TicketStatus::Satisfied => badge.green().to_string(),
    }
}

pub fn format_color_badge(color: PriorityColor) -> String {
    let badge = format!("●{}", color.label());
    match color {
        PriorityColor::Yellow => badge.yellow().to_string(),
        PriorityColor::Orange => badge.bright_red().to_string(),
        PriorityColor::Red => badge.red().bold().to_string(),
        PriorityColor::Green => badge.green().to_string(),
    }
}

/// Status label for plain (uncolored) output; unknown values are shown raw
pub fn status_text(ticket: &Ticket) -> String {
    match ticket.status() {
        Some(status) => status.label().to_string(),
        None => ticket
            .raw_status
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
    }
}

pub fn color_text(ticket: &Ticket) -> String {
    match ticket.color() {
        Some(color) => color.label().to_string(),
        None => ticket
            .raw_priority
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
    }
}

/// Delay as days and hours, e.g. `2d 3h`, `45m`
pub fn format_delay(minutes: Option<i64>) -> String {
    let Some(minutes) = minutes.filter(|m| *m >= 0) else {
        return PLACEHOLDER.to_string();
    };
    let days = minutes / (24 * 60);
    let hours = (minutes % (24 * 60)) / 60;
    let mins = minutes % 60;
    match (days, hours) {
        (0, 0) => format!("{mins}m"),
        (0, h) => format!("{h}h {mins}m"),
        (d, h) => format!("{d}d {h}h"),
    }
}

/// Render an RFC 3339 timestamp as `YYYY-MM-DD HH:MM` UTC; unparseable
/// values are shown as they came.
pub fn format_timestamp(value: Option<&str>) -> String {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return PLACEHOLDER.to_string();
    };
    match parse_timestamp(value) {
        Some(ts) => ts.strftime("%Y-%m-%d %H:%M").to_string(),
        None => value.to_string(),
    }
}

/// `origin → destination`, with placeholders for missing ends
pub fn format_route(ticket: &Ticket) -> String {
    let end = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(PLACEHOLDER)
            .to_string()
    };
    format!("{} → {}", end(&ticket.origin), end(&ticket.destination))
}

/// One line of cards, the active one highlighted
pub fn format_cards(cards: &[ShortcutCard]) -> String {
    cards
        .iter()
        .map(|card| {
            let text = format!("{}: {}", card.label, card.count);
            if card.active {
                text.bold().underline().to_string()
            } else {
                text
            }
        })
        .collect::<Vec<_>>()
        .join("  │  ")
}

pub fn format_pagination(pagination: &PaginationView) -> String {
    match pagination.visible_range {
        Some((start, end)) => format!(
            "Showing {}-{} of {}  ·  Page {} of {}",
            start,
            end,
            pagination.total_count,
            pagination.current_page,
            pagination.total_pages
        ),
        None => "No tickets found".to_string(),
    }
}
