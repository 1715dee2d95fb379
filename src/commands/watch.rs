//! Live ticket view driven by line commands on stdin.
//!
//! The view refreshes itself in the background; each line typed is parsed
//! into a [`WatchCommand`] and applied. The screen is redrawn whenever the
//! view changes.

use std::sync::Arc;

use owo_colors::OwoColorize;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::load_source;
use crate::api::TicketSource;
use crate::display::render_view;
use crate::error::Result;
use crate::filter::{FilterCriteria, FilterEdit};
use crate::stats::parse_shortcut;
use crate::types::{DelayBucket, PriorityColor, TicketStatus};
use crate::view::{TicketView, ViewAction, ViewConfig, ViewUpdate};

const HELP: &str = "\
Commands:
  search <text>     free-text search (empty clears)
  origin <text>     origin contains
  dest <text>       destination contains
  status <s|all>    open, working, closed, satisfied
  color <c|all>     yellow, orange, red, green
  delay <bucket>    all, <24h, 24-72h, >72h
  card <name>       stats shortcut: total, a status or a color
  page <n>, next, prev
  x <row>           expand/collapse a row (row number or ticket number)
  retry, refresh, help, quit";

/// One parsed line of input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchCommand {
    Action(ViewAction),
    /// Toggle a row given by 1-based position or ticket number
    Toggle(String),
    Help,
    Quit,
}

/// Parse one input line. Blank lines are `Ok(None)`.
pub fn parse_watch_command(line: &str) -> std::result::Result<Option<WatchCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let edit = |edit: FilterEdit| Ok(Some(WatchCommand::Action(ViewAction::Edit(edit))));
    match verb.to_lowercase().as_str() {
        "search" | "s" | "/" => edit(FilterEdit::Search(rest.to_string())),
        "origin" | "from" => edit(FilterEdit::Origin(rest.to_string())),
        "dest" | "destination" | "to" => edit(FilterEdit::Destination(rest.to_string())),
        "status" => {
            let status = parse_optional::<TicketStatus>(rest)?;
            edit(FilterEdit::Status(status))
        }
        "color" | "colour" | "priority" => {
            let color = parse_optional::<PriorityColor>(rest)?;
            edit(FilterEdit::Color(color))
        }
        "delay" => {
            let delay = rest.parse::<DelayBucket>().map_err(|e| e.to_string())?;
            edit(FilterEdit::Delay(delay))
        }
        "card" => parse_shortcut(rest)
            .map(|s| Some(WatchCommand::Action(ViewAction::Shortcut(s))))
            .ok_or_else(|| format!("unknown card '{rest}'")),
        "page" | "goto" => rest
            .parse::<u32>()
            .map(|page| Some(WatchCommand::Action(ViewAction::GoToPage(page))))
            .map_err(|_| format!("invalid page number '{rest}'")),
        "next" | "n" => Ok(Some(WatchCommand::Action(ViewAction::NextPage))),
        "prev" | "p" => Ok(Some(WatchCommand::Action(ViewAction::PrevPage))),
        "x" | "toggle" | "open" => {
            if rest.is_empty() {
                Err("expected a row number or ticket number".to_string())
            } else {
                Ok(Some(WatchCommand::Toggle(rest.to_string())))
            }
        }
        "retry" => Ok(Some(WatchCommand::Action(ViewAction::Retry))),
        "refresh" | "r" => Ok(Some(WatchCommand::Action(ViewAction::Refresh))),
        "help" | "?" => Ok(Some(WatchCommand::Help)),
        "quit" | "q" | "exit" => Ok(Some(WatchCommand::Quit)),
        other => Err(format!("unknown command '{other}', type 'help'")),
    }
}

/// `all` or empty means no filter
fn parse_optional<T>(value: &str) -> std::result::Result<Option<T>, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    if value.is_empty() || value.eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    value.parse().map(Some).map_err(|e: T::Err| e.to_string())
}

/// Resolve a toggle target to a row key on the current page.
fn resolve_row<S: TicketSource + 'static>(view: &TicketView<S>, needle: &str) -> Option<String> {
    if let Ok(position) = needle.parse::<usize>() {
        return view
            .snapshot()
            .rows
            .get(position.checked_sub(1)?)
            .map(|row| row.key.clone());
    }
    view.find_row(needle).map(|t| t.row_key().to_string())
}

fn redraw<S: TicketSource + 'static>(view: &TicketView<S>) {
    println!("{}", "─".repeat(72).dimmed());
    let snapshot = view.snapshot();
    if snapshot.draft != snapshot.criteria {
        println!("{}", "(filter pending…)".dimmed());
    }
    print!("{}", render_view(&snapshot));
}

/// Run the live view until `quit` or end of input.
pub async fn cmd_watch(criteria: FilterCriteria, api_url: Option<&str>) -> Result<()> {
    let (config, source) = load_source(api_url)?;
    let mut view = TicketView::mount(Arc::new(source), ViewConfig::from(&config), criteria);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", "Type 'help' for commands.".dimmed());
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match parse_watch_command(&line) {
                    Ok(None) => {}
                    Ok(Some(WatchCommand::Quit)) => break,
                    Ok(Some(WatchCommand::Help)) => println!("{HELP}"),
                    Ok(Some(WatchCommand::Toggle(needle))) => match resolve_row(&view, &needle) {
                        Some(key) => {
                            if view.dispatch(ViewAction::ToggleRow(key)) {
                                redraw(&view);
                            }
                        }
                        None => eprintln!("{}", format!("no row '{needle}' on this page").yellow()),
                    },
                    Ok(Some(WatchCommand::Action(action))) => {
                        if view.dispatch(action) {
                            redraw(&view);
                        }
                    }
                    Err(message) => eprintln!("{}", message.yellow()),
                }
            }
            update = view.next_update() => {
                match update {
                    None => break,
                    Some(ViewUpdate::RefreshStarted) => tracing::debug!("background refresh"),
                    Some(_) => redraw(&view),
                }
            }
        }
    }

    view.unmount();
    Ok(())
}
