//! Stats cards that double as filter shortcuts.
//!
//! Cards are derived from the latest page result and the committed criteria
//! on every render; nothing here holds state.

use crate::filter::FilterCriteria;
use crate::types::{ColorStats, PriorityColor, TicketStatus};

/// What clicking a stats card does to the filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsShortcut {
    /// `None` is the "Total" card: show every status.
    Status(Option<TicketStatus>),
    Color(PriorityColor),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutCard {
    pub label: &'static str,
    pub count: u64,
    pub shortcut: StatsShortcut,
    /// The card matches the committed criteria
    pub active: bool,
}

/// Status cards: a "Total" card followed by one card per status.
pub fn status_cards(
    stats: &crate::types::StatusStats,
    total: u64,
    criteria: &FilterCriteria,
) -> Vec<ShortcutCard> {
    let mut cards = Vec::with_capacity(TicketStatus::ALL.len() + 1);
    cards.push(ShortcutCard {
        label: "Total Tickets",
        count: total,
        shortcut: StatsShortcut::Status(None),
        active: criteria.status.is_none() && criteria.color.is_none(),
    });
    cards.extend(TicketStatus::ALL.iter().map(|&status| ShortcutCard {
        label: status.label(),
        count: stats.count(status),
        shortcut: StatsShortcut::Status(Some(status)),
        active: criteria.status == Some(status),
    }));
    cards
}

pub fn color_cards(stats: &ColorStats, criteria: &FilterCriteria) -> Vec<ShortcutCard> {
    PriorityColor::ALL
        .iter()
        .map(|&color| ShortcutCard {
            label: color.label(),
            count: stats.count(color),
            shortcut: StatsShortcut::Color(color),
            active: criteria.color == Some(color),
        })
        .collect()
}

/// Resolve a card reference typed by the user, e.g. `open`, `all`, `red`.
pub fn parse_shortcut(s: &str) -> Option<StatsShortcut> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("all") || s.eq_ignore_ascii_case("total") {
        return Some(StatsShortcut::Status(None));
    }
    if let Ok(status) = s.parse::<TicketStatus>() {
        return Some(StatsShortcut::Status(Some(status)));
    }
    s.parse::<PriorityColor>().ok().map(StatsShortcut::Color)
}
