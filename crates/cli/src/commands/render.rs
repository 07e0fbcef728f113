//! `render` command implementation.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use contracts::DisplayedNotification;
use serde_json::Value;
use tracing::info;

use crate::cli::RenderArgs;
use crate::error::CliError;

/// Execute the `render` command
pub fn run_render(args: &RenderArgs) -> Result<()> {
    let source_name = args.payload.display().to_string();
    info!(payload = %source_name, "Rendering push payload");

    let raw = read_payload(&args.payload)?;
    let shown = render_payload(&source_name, &raw)?;

    if args.json {
        let json = serde_json::to_string_pretty(&shown)
            .context("Failed to serialize rendered notification")?;
        println!("{}", json);
    } else {
        println!("{}", shown.title);
        if !shown.body.is_empty() {
            println!("{}", shown.body);
        }
    }

    Ok(())
}

fn read_payload(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("Failed to read payload from stdin")?;
        Ok(raw)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read payload from {}", path.display()))
    }
}

fn render_payload(source_name: &str, raw: &str) -> Result<DisplayedNotification, CliError> {
    let payload: Value =
        serde_json::from_str(raw).map_err(|e| CliError::payload(source_name, e.to_string()))?;
    if !payload.is_object() {
        return Err(CliError::payload(source_name, "payload must be a JSON object"));
    }
    Ok(DisplayedNotification::from_payload(&payload))
}
