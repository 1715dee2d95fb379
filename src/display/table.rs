use owo_colors::OwoColorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::types::{ActivityRecord, PLACEHOLDER, or_placeholder};
use crate::view::{NO_ACTIVITY_MESSAGE, RowDetail, RowView, ViewSnapshot};

use super::{
    color_text, format_cards, format_delay, format_pagination, format_route, format_timestamp,
    status_text,
};

/// A row in the ticket table
#[derive(Tabled)]
struct TicketRow {
    #[tabled(rename = "")]
    marker: &'static str,
    #[tabled(rename = "Ticket")]
    number: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "GR No")]
    gr_no: String,
    #[tabled(rename = "Route")]
    route: String,
    #[tabled(rename = "Delay")]
    delay: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

impl From<&RowView> for TicketRow {
    fn from(row: &RowView) -> Self {
        let ticket = &row.ticket;
        Self {
            marker: if row.expanded { "▾" } else { "▸" },
            number: or_placeholder(Some(&ticket.ticket_number)).to_string(),
            title: or_placeholder(Some(&ticket.title)).to_string(),
            status: status_text(ticket),
            priority: color_text(ticket),
            gr_no: ticket.gr_no().unwrap_or(PLACEHOLDER).to_string(),
            route: format_route(ticket),
            delay: format_delay(ticket.delay_duration_minutes),
            updated: format_timestamp(
                ticket
                    .updated_at
                    .as_deref()
                    .or(ticket.created_at.as_deref()),
            ),
        }
    }
}

pub fn render_ticket_table(rows: &[RowView]) -> String {
    let rows: Vec<TicketRow> = rows.iter().map(TicketRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_activity(record: &ActivityRecord) -> String {
    let mut line = format!(
        "  {}  {}  {}",
        record.date().dimmed(),
        record.label().bold(),
        record.details()
    );
    if let Some(doc) = record.document_no() {
        line.push_str(&format!("  {}", format!("doc {doc}").dimmed()));
    }
    line
}

/// Timeline lines for one expanded row
pub fn render_timeline(detail: &RowDetail) -> String {
    match detail {
        RowDetail::NoTracking => format!("  {}", "No tracking number on this ticket".dimmed()),
        RowDetail::Queued => format!("  {}", "Waiting for a free fetch slot…".dimmed()),
        RowDetail::Loading => format!("  {}", "Loading timeline…".dimmed()),
        RowDetail::Empty => format!("  {}", NO_ACTIVITY_MESSAGE.dimmed()),
        RowDetail::Timeline(records) => records
            .iter()
            .map(render_activity)
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Full text rendering of the view: cards, table, expanded timelines and
/// the pagination footer.
pub fn render_view(snapshot: &ViewSnapshot) -> String {
    let mut out = String::new();

    out.push_str(&format_cards(&snapshot.status_cards));
    out.push('\n');
    out.push_str(&format_cards(&snapshot.color_cards));
    out.push_str("\n\n");

    if let Some(error) = &snapshot.error {
        out.push_str(&format!(
            "{} {}  {}\n\n",
            "Error:".red().bold(),
            error,
            "(type 'retry' to try again)".dimmed()
        ));
    }

    if snapshot.blocking_loader {
        out.push_str(&format!("{}\n", "Loading tickets…".dimmed()));
        return out;
    }

    if snapshot.rows.is_empty() {
        out.push_str(&format!("{}\n", "No tickets found".dimmed()));
    } else {
        out.push_str(&render_ticket_table(&snapshot.rows));
        out.push('\n');
    }

    for row in snapshot.rows.iter().filter(|r| r.expanded) {
        out.push_str(&format!(
            "\n{} {}\n",
            "Timeline".cyan().bold(),
            or_placeholder(Some(&row.ticket.ticket_number)).cyan()
        ));
        if let Some(detail) = &row.detail {
            out.push_str(&render_timeline(detail));
            out.push('\n');
        }
    }

    out.push('\n');
    out.push_str(&format_pagination(&snapshot.pagination));
    if snapshot.refreshing {
        out.push_str(&format!("  {}", "↻ refreshing".dimmed()));
    }
    out.push('\n');
    out
}
