//! Reader-side freshness rule.
//!
//! A snapshot older than the maximum age is shown as "don't know" instead of
//! its last real classification.

use serde::Serialize;

use crate::snapshot::{Severity, Snapshot};

/// Default maximum snapshot age, in seconds.
pub const MAX_AGE_SECS: i64 = 600;

pub fn age_secs(snapshot: &Snapshot, now_epoch_seconds: i64) -> i64 {
    now_epoch_seconds - snapshot.fetch_time_epoch_seconds
}

/// True once the snapshot is strictly older than `max_age_secs`.
///
/// The primed snapshot is always stale.
pub fn is_stale(snapshot: &Snapshot, now_epoch_seconds: i64, max_age_secs: i64) -> bool {
    snapshot.is_primed() || age_secs(snapshot, now_epoch_seconds) > max_age_secs
}

/// What a reader should actually present for a snapshot at a given time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub severity: Severity,
    pub late_messages: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub fetch_time: String,
    pub stale: bool,
}

pub fn present(snapshot: &Snapshot, now_epoch_seconds: i64, max_age_secs: i64) -> StatusView {
    let stale = is_stale(snapshot, now_epoch_seconds, max_age_secs);
    let (severity, late_messages) = if stale {
        (Severity::Unknown, Vec::new())
    } else {
        (
            snapshot.status.severity,
            snapshot.status.late_messages.clone(),
        )
    };

    StatusView {
        severity,
        late_messages,
        message: snapshot.status.message.clone(),
        fetch_time: snapshot.fetch_time_label(),
        stale,
    }
}
