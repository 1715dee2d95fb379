use std::sync::Arc;

use owo_colors::OwoColorize;
use serde_json::json;

use super::{CommandOutput, load_source};
use crate::api::TicketSource;
use crate::display::render_timeline;
use crate::error::{DeskError, Result};
use crate::view::RowDetail;

/// Print the activity timeline for one tracking number.
pub async fn cmd_track(gr_no: &str, api_url: Option<&str>, as_json: bool) -> Result<()> {
    let gr_no = gr_no.trim();
    if gr_no.is_empty() {
        return Err(DeskError::InvalidInput(
            "tracking number cannot be empty".to_string(),
        ));
    }

    let (_, source) = load_source(api_url)?;
    let records = source.fetch_activity(gr_no).await?;

    let json_output = json!({
        "gr_no": gr_no,
        "activities": records,
    });

    let detail = if records.is_empty() {
        RowDetail::Empty
    } else {
        RowDetail::Timeline(Arc::from(records))
    };
    let text = format!(
        "{} {}\n{}",
        "Timeline".cyan().bold(),
        gr_no.cyan(),
        render_timeline(&detail)
    );

    CommandOutput::new(json_output).with_text(text).print(as_json)
}
