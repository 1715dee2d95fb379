use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::io;
use std::path::PathBuf;

use crate::filter::FilterCriteria;
use crate::types::{
    DelayBucket, PriorityColor, TicketStatus, VALID_COLORS, VALID_DELAYS, VALID_STATUSES,
};

#[derive(Parser)]
#[command(name = "freightdesk")]
#[command(about = "Browse and track shipment support tickets")]
#[command(version)]
pub struct Cli {
    /// Show debug logs
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only show errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Ticket API base URL (overrides config and FREIGHTDESK_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Filters shared by every list-like command
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Status: open, working, closed, satisfied (case-insensitive)
    #[arg(long, value_parser = parse_status)]
    pub status: Option<TicketStatus>,

    /// Priority color: yellow, orange, red, green
    #[arg(long, value_parser = parse_color)]
    pub color: Option<PriorityColor>,

    /// Origin contains
    #[arg(long)]
    pub origin: Option<String>,

    /// Destination contains
    #[arg(long)]
    pub destination: Option<String>,

    /// Delay bucket: all, <24h, 24-72h, >72h
    #[arg(long, default_value = "all", value_parser = parse_delay)]
    pub delay: DelayBucket,

    /// Free-text search over ticket number, title and tracking number
    #[arg(short, long)]
    pub search: Option<String>,
}

impl FilterArgs {
    pub fn criteria(self) -> FilterCriteria {
        FilterCriteria {
            status: self.status,
            color: self.color,
            origin: self.origin.unwrap_or_default().trim().to_string(),
            destination: self.destination.unwrap_or_default().trim().to_string(),
            delay: self.delay,
            search: self.search.unwrap_or_default().trim().to_string(),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List one page of tickets
    #[command(visible_alias = "ls")]
    List {
        #[command(flatten)]
        filters: FilterArgs,

        /// Page number (1-based, clamped to the last page)
        #[arg(short, long, default_value = "1", value_parser = parse_page)]
        page: u32,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show status and priority counts
    Stats {
        #[command(flatten)]
        filters: FilterArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the activity timeline for a tracking (GR) number
    #[command(visible_alias = "t")]
    Track {
        /// Tracking number
        gr_no: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export every matching ticket as JSON
    Export {
        #[command(flatten)]
        filters: FilterArgs,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Sort by most recent activity first
        #[arg(long)]
        recent: bool,
    },

    /// Live view with background refresh and expandable rows
    #[command(visible_alias = "w")]
    Watch {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print path to the config file
    Path,
    /// Get a configuration value
    Get {
        /// Configuration key (api_url, page_size, refresh_interval_secs, ...)
        key: String,
    },
    /// Set a configuration value
    Set {
        /// Configuration key (api_url, page_size, refresh_interval_secs, ...)
        key: String,
        /// Value to set
        value: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Execute the command, dispatching to the appropriate handler.
    pub async fn run(self) -> crate::error::Result<()> {
        use crate::commands::{
            cmd_config_get, cmd_config_path, cmd_config_set, cmd_config_show, cmd_export,
            cmd_list, cmd_stats, cmd_track, cmd_watch,
        };

        let api_url = self.api_url.as_deref();
        match self.command {
            Commands::List {
                filters,
                page,
                json,
            } => cmd_list(filters.criteria(), page, api_url, json).await,
            Commands::Stats { filters, json } => cmd_stats(filters.criteria(), api_url, json).await,
            Commands::Track { gr_no, json } => cmd_track(&gr_no, api_url, json).await,
            Commands::Export {
                filters,
                output,
                recent,
            } => cmd_export(filters.criteria(), output.as_deref(), recent, api_url).await,
            Commands::Watch { filters } => cmd_watch(filters.criteria(), api_url).await,
            Commands::Config { action } => match action {
                ConfigAction::Show { json } => cmd_config_show(json),
                ConfigAction::Path => cmd_config_path(),
                ConfigAction::Get { key } => cmd_config_get(&key),
                ConfigAction::Set { key, value, json } => cmd_config_set(&key, &value, json),
            },
            Commands::Completions { shell } => {
                generate_completions(shell);
                Ok(())
            }
        }
    }
}

/// Generic validation helper for parsing values with a standard error message format.
fn parse_with_validation<T, F>(
    s: &str,
    parser: F,
    field_name: &str,
    valid_values: &[&str],
) -> Result<T, String>
where
    F: FnOnce(&str) -> Result<T, String>,
{
    parser(s).map_err(|_| {
        format!(
            "Invalid {}. Must be one of: {}",
            field_name,
            valid_values.join(", ")
        )
    })
}

fn parse_status(s: &str) -> Result<TicketStatus, String> {
    parse_with_validation(
        s,
        |v| v.parse().map_err(|_| String::new()),
        "status",
        VALID_STATUSES,
    )
}

fn parse_color(s: &str) -> Result<PriorityColor, String> {
    parse_with_validation(
        s,
        |v| v.parse().map_err(|_| String::new()),
        "color",
        VALID_COLORS,
    )
}

fn parse_delay(s: &str) -> Result<DelayBucket, String> {
    parse_with_validation(
        s,
        |v| v.parse().map_err(|_| String::new()),
        "delay",
        VALID_DELAYS,
    )
}

fn parse_page(s: &str) -> Result<u32, String> {
    match s.parse::<u32>() {
        Ok(page) if page >= 1 => Ok(page),
        _ => Err(format!("Invalid page '{s}'. Must be a number >= 1")),
    }
}

pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "freightdesk", &mut io::stdout());
}
