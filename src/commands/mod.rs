//! Command implementations behind the CLI.

mod config;
mod export;
mod list;
mod track;
mod watch;

pub use config::{cmd_config_get, cmd_config_path, cmd_config_set, cmd_config_show};
pub use export::cmd_export;
pub use list::{cmd_list, cmd_stats};
pub use track::cmd_track;
pub use watch::{WatchCommand, cmd_watch, parse_watch_command};

use serde::Serialize;

use crate::api::HttpTicketSource;
use crate::config::Config;
use crate::error::Result;

/// Output of a command, in both JSON and human-readable form
pub struct CommandOutput {
    json: serde_json::Value,
    text: Option<String>,
}

impl CommandOutput {
    pub fn new(json: serde_json::Value) -> Self {
        Self { json, text: None }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Print JSON when requested, otherwise the text (falling back to JSON).
    pub fn print(self, as_json: bool) -> Result<()> {
        match self.text {
            Some(text) if !as_json => {
                println!("{text}");
                Ok(())
            }
            _ => print_json(&self.json),
        }
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Load the config and build the HTTP source, honoring a `--api-url` override.
pub(crate) fn load_source(api_url: Option<&str>) -> Result<(Config, HttpTicketSource)> {
    let config = Config::load()?;
    let source = match api_url {
        Some(url) => HttpTicketSource::new(url, config.request_timeout())?,
        None => HttpTicketSource::from_config(&config)?,
    };
    tracing::debug!(base_url = %source.base_url(), "using ticket backend");
    Ok((config, source))
}
