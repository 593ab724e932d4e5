//! Data types published by each polling cycle.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Advisory shown before the first successful cycle has published anything.
pub const PRIMED_MESSAGE: &str = "no data retrieved yet";

/// Advisory shown when a cycle completed but observed no trains at all.
pub const NO_DATA_MESSAGE: &str = "unable to retrieve status in the last few minutes";

/// Sentinel fetch time carried by the primed snapshot.
pub const NEVER_FETCHED: i64 = -1;

/// One train as reported by the upstream feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRecord {
    pub id: String,
    pub origin: String,
    pub destination: String,
    pub late_minutes: i64,
}

/// Inclusive lateness range that defines a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LateBucket {
    pub name: &'static str,
    pub min: i64,
    pub max: i64,
}

impl LateBucket {
    pub const MINOR: LateBucket = LateBucket {
        name: "minor",
        min: 10,
        max: 29,
    };

    /// Anything later than 60 days is treated as bad data, not as a late train.
    pub const MAJOR: LateBucket = LateBucket {
        name: "major",
        min: 30,
        max: 86400,
    };

    pub fn contains(&self, late_minutes: i64) -> bool {
        late_minutes >= self.min && late_minutes <= self.max
    }
}

/// Trains sorted into the minor and major buckets, each in upstream order.
///
/// Serializes as a map keyed by bucket name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LateBuckets {
    pub minor: Vec<VehicleRecord>,
    pub major: Vec<VehicleRecord>,
}

impl LateBuckets {
    /// Buckets in the order their messages are reported: minor first.
    pub fn in_report_order(&self) -> [(&LateBucket, &[VehicleRecord]); 2] {
        [
            (&LateBucket::MINOR, self.minor.as_slice()),
            (&LateBucket::MAJOR, self.major.as_slice()),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.minor.is_empty() && self.major.is_empty()
    }
}

/// How bad things are right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Unknown,
    Ok,
    Minor,
    Major,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Unknown => "unknown",
            Severity::Ok => "ok",
            Severity::Minor => "minor",
            Severity::Major => "major",
        }
    }

    /// Short human-readable headline for the severity.
    pub fn headline(&self) -> &'static str {
        match self {
            Severity::Unknown => "(not sure)",
            Severity::Ok => "trains are running on time",
            Severity::Minor => "some trains are a little late",
            Severity::Major => "trains are seriously late",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub severity: Severity,
    pub late_messages: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// The result of one polling cycle. Replaced wholesale, never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub fetch_count: usize,
    pub fetch_time_epoch_seconds: i64,
    pub skipped_records: usize,
    pub late_buckets: LateBuckets,
    pub status: StatusSummary,
}

impl Snapshot {
    /// Placeholder served until the first cycle publishes.
    pub fn primed() -> Self {
        Snapshot {
            fetch_count: 0,
            fetch_time_epoch_seconds: NEVER_FETCHED,
            skipped_records: 0,
            late_buckets: LateBuckets::default(),
            status: StatusSummary {
                severity: Severity::Unknown,
                late_messages: Vec::new(),
                message: Some(PRIMED_MESSAGE.to_string()),
            },
        }
    }

    pub fn is_primed(&self) -> bool {
        self.fetch_time_epoch_seconds == NEVER_FETCHED
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        if self.is_primed() {
            return None;
        }
        DateTime::from_timestamp(self.fetch_time_epoch_seconds, 0)
    }

    /// Fetch time for display, or `"never"` for the primed snapshot.
    pub fn fetch_time_label(&self) -> String {
        match self.fetched_at() {
            Some(at) => at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            None => "never".to_string(),
        }
    }
}
