//! Turns a decoded feed into a published [`Snapshot`].
//!
//! Everything here is pure: the same feed and timestamp always produce the
//! same snapshot.

use crate::parser::TrainFeed;
use crate::snapshot::{
    LateBucket, LateBuckets, NO_DATA_MESSAGE, Severity, Snapshot, StatusSummary, VehicleRecord,
};

/// Returns the trains whose lateness falls inside `bucket`, in upstream order.
pub fn late_trains(trains: &[VehicleRecord], bucket: &LateBucket) -> Vec<VehicleRecord> {
    trains
        .iter()
        .filter(|t| bucket.contains(t.late_minutes))
        .cloned()
        .collect()
}

pub fn bucketize(trains: &[VehicleRecord]) -> LateBuckets {
    LateBuckets {
        minor: late_trains(trains, &LateBucket::MINOR),
        major: late_trains(trains, &LateBucket::MAJOR),
    }
}

/// Severity for a cycle that observed `fetch_count` trains.
pub fn severity(fetch_count: usize, buckets: &LateBuckets) -> Severity {
    if fetch_count == 0 {
        Severity::Unknown
    } else if !buckets.major.is_empty() {
        Severity::Major
    } else if !buckets.minor.is_empty() {
        Severity::Minor
    } else {
        Severity::Ok
    }
}

pub fn late_message(train: &VehicleRecord) -> String {
    format!(
        "Train #{} from {} to {} is {} minutes late",
        train.id, train.origin, train.destination, train.late_minutes
    )
}

/// One message per late train, minor bucket first, upstream order within a bucket.
pub fn late_messages(buckets: &LateBuckets) -> Vec<String> {
    buckets
        .in_report_order()
        .into_iter()
        .flat_map(|(_, trains)| trains.iter().map(late_message))
        .collect()
}

/// Builds the snapshot for a cycle that finished at `fetch_time_epoch_seconds`.
pub fn classify(feed: &TrainFeed, fetch_time_epoch_seconds: i64) -> Snapshot {
    let fetch_count = feed.trains.len();
    let late_buckets = bucketize(&feed.trains);
    let severity = severity(fetch_count, &late_buckets);

    let status = if fetch_count == 0 {
        StatusSummary {
            severity,
            late_messages: Vec::new(),
            message: Some(NO_DATA_MESSAGE.to_string()),
        }
    } else {
        StatusSummary {
            severity,
            late_messages: late_messages(&late_buckets),
            message: None,
        }
    };

    Snapshot {
        fetch_count,
        fetch_time_epoch_seconds,
        skipped_records: feed.skipped,
        late_buckets,
        status,
    }
}
