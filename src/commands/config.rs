//! Configuration commands.
//!
//! - `config show`: Display the effective configuration
//! - `config path`: Print the config file location
//! - `config get`: Print one value
//! - `config set`: Validate and store one value

use owo_colors::OwoColorize;
use serde_json::json;

use super::CommandOutput;
use crate::config::{API_URL_ENV, Config};
use crate::error::Result;

/// Show current configuration
pub fn cmd_config_show(as_json: bool) -> Result<()> {
    let config = Config::load()?;
    let path = Config::config_path();
    let effective_url = config.api_url();
    let url_from_env = effective_url != config.api_url;

    let json_output = json!({
        "config": config,
        "effective_api_url": effective_url,
        "config_file": path.to_string_lossy(),
    });

    let mut text = format!("{}\n\n{}\n", "Configuration:".cyan().bold(), config);
    if url_from_env {
        text.push_str(&format!(
            "\n{} {} (from {})\n",
            "effective api_url:".cyan(),
            effective_url,
            API_URL_ENV
        ));
    }
    text.push_str(&format!(
        "\n{}",
        format!("Config file: {}", path.display()).dimmed()
    ));

    CommandOutput::new(json_output).with_text(text).print(as_json)
}

pub fn cmd_config_path() -> Result<()> {
    println!("{}", Config::config_path().display());
    Ok(())
}

pub fn cmd_config_get(key: &str) -> Result<()> {
    let config = Config::load()?;
    println!("{}", config.get(key)?);
    Ok(())
}

/// Set a configuration value
pub fn cmd_config_set(key: &str, value: &str, as_json: bool) -> Result<()> {
    let mut config = Config::load()?;
    config.set(key, value)?;
    config.save()?;

    let stored = config.get(key).unwrap_or_else(|_| "unset".to_string());
    CommandOutput::new(json!({
        "action": "config_set",
        "key": key,
        "value": stored,
        "success": true,
    }))
    .with_text(format!("Set {} to {}", key.cyan(), stored))
    .print(as_json)
}
