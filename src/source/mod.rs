//! Upstream feed sources.
//!
//! [`FeedSource`] is the seam the poller fetches through. [`SeptaClient`] reads
//! the live TrainView API; [`FileSource`] reads a saved response from disk.

mod file;
mod septa;

pub use file::FileSource;
pub use septa::SeptaClient;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::parser::TrainFeed;

/// Why a fetch produced no feed.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unreadable feed file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed feed: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    /// Short label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Http(e) if e.is_timeout() => "timeout",
            FetchError::Http(e) if e.is_status() => "status",
            FetchError::Http(_) => "http",
            FetchError::Io(_) => "io",
            FetchError::Decode(_) => "decode",
        }
    }
}

/// One attempt at retrieving the current train list. No retries.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self) -> Result<TrainFeed, FetchError>;

    /// Where the feed comes from, for logging.
    fn describe(&self) -> String;
}

#[async_trait]
impl<S: FeedSource + ?Sized> FeedSource for Arc<S> {
    async fn fetch(&self) -> Result<TrainFeed, FetchError> {
        (**self).fetch().await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
