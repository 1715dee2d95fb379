use std::path::Path;

use owo_colors::OwoColorize;

use super::{load_source, print_json};
use crate::api::export_all;
use crate::error::Result;
use crate::filter::FilterCriteria;
use crate::types::sort_by_recent;

/// Export every ticket matching `criteria` as JSON, to `output` or stdout.
pub async fn cmd_export(
    criteria: FilterCriteria,
    output: Option<&Path>,
    recent_first: bool,
    api_url: Option<&str>,
) -> Result<()> {
    let (_, source) = load_source(api_url)?;
    let mut tickets = export_all(&source, &criteria).await?;
    if recent_first {
        sort_by_recent(&mut tickets);
    }

    match output {
        Some(path) => {
            let content = serde_json::to_string_pretty(&tickets)?;
            tokio::fs::write(path, content).await?;
            println!(
                "Exported {} tickets to {}",
                tickets.len(),
                path.display().cyan()
            );
            Ok(())
        }
        None => print_json(&tickets),
    }
}
