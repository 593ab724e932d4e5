//! The polling loop: fetch, classify, publish, sleep, forever.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{Instrument, error, info};

use crate::classify::classify;
use crate::source::{FeedSource, FetchError};
use crate::store::SnapshotStore;

/// Drives the single polling loop and is the only writer of its store.
pub struct Poller<S> {
    source: S,
    store: Arc<SnapshotStore>,
    interval: Duration,
}

impl<S: FeedSource + 'static> Poller<S> {
    pub fn new(source: S, store: Arc<SnapshotStore>, interval: Duration) -> Self {
        Self {
            source,
            store,
            interval,
        }
    }

    /// Runs one fetch, classify, publish sequence.
    ///
    /// On a failed fetch the store is left exactly as it was.
    pub async fn run_cycle(&self) -> Result<(), FetchError> {
        let feed = self.source.fetch().await?;
        let snapshot = classify(&feed, Utc::now().timestamp());

        info!(
            fetch_count = snapshot.fetch_count,
            skipped = snapshot.skipped_records,
            minor = snapshot.late_buckets.minor.len(),
            major = snapshot.late_buckets.major.len(),
            severity = %snapshot.status.severity,
            "Snapshot published"
        );

        self.store.publish(snapshot, feed.raw);
        Ok(())
    }

    /// Loops forever. The next cycle starts `interval` after the previous one
    /// finished, whether it succeeded or not.
    pub async fn run(self) {
        info!(
            source = %self.source.describe(),
            interval_secs = self.interval.as_secs(),
            "Starting poller"
        );

        let mut cycle: u64 = 0;
        loop {
            cycle += 1;
            let span = tracing::info_span!("poll_cycle", cycle);

            if let Err(e) = self.run_cycle().instrument(span).await {
                error!(
                    cycle,
                    kind = e.kind(),
                    error = %e,
                    "Feed fetch failed, keeping previous snapshot"
                );
            }

            info!(interval_secs = self.interval.as_secs(), "Will fetch data again");
            tokio::time::sleep(self.interval).await;
        }
    }

    /// Spawns [`run`](Self::run) on the tokio runtime.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{TrainFeed, parse_feed};
    use crate::snapshot::{Severity, Snapshot};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::Instant;

    #[tokio::test]
    async fn test_successful_cycle_publishes() {
        let store = Arc::new(SnapshotStore::new());
        let source = ScriptedSource::new(vec![Ok(two_train_feed())]);
        let poller = Poller::new(source, store.clone(), Duration::from_secs(300));

        let before = Utc::now().timestamp();
        poller.run_cycle().await.unwrap();

        let snapshot = store.read_current();
        assert_eq!(snapshot.fetch_count, 2);
        assert_eq!(snapshot.status.severity, Severity::Major);
        assert!(snapshot.fetch_time_epoch_seconds >= before);
        assert!(store.read_raw().unwrap().is_array());
    }

    #[tokio::test]
    async fn test_first_cycle_failure_keeps_primed() {
        let store = Arc::new(SnapshotStore::new());
        let poller = Poller::new(
            ScriptedSource::new(vec![Err(fetch_failure())]),
            store.clone(),
            Duration::from_secs(300),
        );

        assert!(poller.run_cycle().await.is_err());
        assert_eq!(*store.read_current(), Snapshot::primed());
        assert!(store.read_raw().is_none());
        assert_eq!(store.publish_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_cycle_keeps_previous_snapshot() {
        let store = Arc::new(SnapshotStore::new());
        let poller = Poller::new(
            ScriptedSource::new(vec![Ok(two_train_feed()), Err(fetch_failure())]),
            store.clone(),
            Duration::from_secs(300),
        );

        poller.run_cycle().await.unwrap();
        let published = store.read_both();

        assert!(poller.run_cycle().await.is_err());
        let after = store.read_both();
        assert!(Arc::ptr_eq(&published.snapshot, &after.snapshot));
        assert_eq!(after.raw, published.raw);
        assert_eq!(store.publish_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_feed_publishes_unknown() {
        let store = Arc::new(SnapshotStore::new());
        let poller = Poller::new(
            ScriptedSource::new(vec![Ok(two_train_feed()), Ok(TrainFeed::empty())]),
            store.clone(),
            Duration::from_secs(300),
        );

        poller.run_cycle().await.unwrap();
        poller.run_cycle().await.unwrap();

        let snapshot = store.read_current();
        assert_eq!(snapshot.fetch_count, 0);
        assert_eq!(snapshot.status.severity, Severity::Unknown);
        assert!(snapshot.status.late_messages.is_empty());
        assert!(!snapshot.is_primed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_time_is_measured_from_cycle_end() {
        let store = Arc::new(SnapshotStore::new());
        let feeds = vec![Ok(two_train_feed()), Ok(two_train_feed()), Ok(two_train_feed())];
        let source = Arc::new(ScriptedSource::new(feeds).with_delay(Duration::from_secs(50)));
        let handle = Poller::new(source.clone(), store.clone(), Duration::from_secs(300)).start();

        // Fetches start at 0s, 350s and 700s; the third is still in flight.
        tokio::time::sleep(Duration::from_secs(701)).await;

        let starts = source.starts();
        assert_eq!(starts.len(), 3);
        assert_eq!(starts[1] - starts[0], Duration::from_secs(350));
        assert_eq!(starts[2] - starts[1], Duration::from_secs(350));
        assert_eq!(store.publish_count(), 2);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_keep_the_schedule() {
        let store = Arc::new(SnapshotStore::new());
        let source = Arc::new(ScriptedSource::new(vec![]));
        let handle = Poller::new(source.clone(), store.clone(), Duration::from_secs(300)).start();

        tokio::time::sleep(Duration::from_secs(601)).await;

        assert_eq!(source.starts().len(), 3);
        assert!(store.read_current().is_primed());

        handle.abort();
    }

    // Helper functions for tests
    struct ScriptedSource {
        results: Mutex<VecDeque<Result<TrainFeed, FetchError>>>,
        starts: Mutex<Vec<Instant>>,
        delay: Duration,
    }

    impl ScriptedSource {
        fn new(results: Vec<Result<TrainFeed, FetchError>>) -> Self {
            Self {
                results: Mutex::new(results.into()),
                starts: Mutex::new(Vec::new()),
                delay: Duration::ZERO,
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn starts(&self) -> Vec<Instant> {
            self.starts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FeedSource for ScriptedSource {
        async fn fetch(&self) -> Result<TrainFeed, FetchError> {
            self.starts.lock().unwrap().push(Instant::now());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let next = self.results.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Err(fetch_failure()))
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }

    fn fetch_failure() -> FetchError {
        FetchError::Io(std::io::Error::other("upstream unavailable"))
    }

    fn two_train_feed() -> TrainFeed {
        parse_feed(
            br#"[
                {"trainno":"101","SOURCE":"A","dest":"B","late":15},
                {"trainno":"202","SOURCE":"C","dest":"D","late":45}
            ]"#,
        )
        .unwrap()
    }
}
