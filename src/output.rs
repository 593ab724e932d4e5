//! Formatting of snapshots and presented status for the command line and logs.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::snapshot::Snapshot;
use crate::staleness::StatusView;

/// Logs a snapshot using Rust's debug pretty-print format.
pub fn print_pretty(snapshot: &Snapshot) {
    debug!("{:#?}", snapshot);
}

/// Serializes any published value as pretty-printed JSON.
pub fn to_json(value: &impl Serialize) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Plain-text rendering of a presented status, one line per entry.
pub fn status_lines(view: &StatusView) -> Vec<String> {
    let mut lines = vec![format!(
        "Status: {} ({})",
        view.severity.headline(),
        view.severity
    )];
    lines.push(format!("Last updated: {}", view.fetch_time));
    if let Some(message) = &view.message {
        lines.push(message.clone());
    }
    lines.extend(view.late_messages.iter().cloned());
    lines
}

/// Logs the presented status as a single structured event.
pub fn log_status(view: &StatusView) {
    info!(
        severity = %view.severity,
        stale = view.stale,
        fetch_time = %view.fetch_time,
        late = view.late_messages.len(),
        message = view.message.as_deref().unwrap_or(""),
        "Current status"
    );
    for line in &view.late_messages {
        info!("{line}");
    }
}
