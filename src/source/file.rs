use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

use super::{FeedSource, FetchError};
use crate::parser::{TrainFeed, parse_feed};

/// Reads a saved TrainView response from disk on every fetch.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FeedSource for FileSource {
    async fn fetch(&self) -> Result<TrainFeed, FetchError> {
        let bytes = tokio::fs::read(&self.path).await?;
        debug!(bytes = bytes.len(), path = %self.path.display(), "Feed file read, parsing");
        Ok(parse_feed(&bytes)?)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    #[tokio::test]
    async fn test_reads_and_parses_file() {
        let path = temp_path("septa_status_test_feed.json");
        fs::write(&path, r#"[{"trainno":"1","SOURCE":"A","dest":"B","late":3}]"#).unwrap();

        let feed = FileSource::new(&path).fetch().await.unwrap();
        assert_eq!(feed.trains.len(), 1);

        fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let err = FileSource::new(temp_path("septa_status_does_not_exist.json"))
            .fetch()
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "io");
    }

    #[tokio::test]
    async fn test_bad_json_is_decode_error() {
        let path = temp_path("septa_status_test_bad.json");
        fs::write(&path, "{not json").unwrap();

        let err = FileSource::new(&path).fetch().await.unwrap_err();
        assert_eq!(err.kind(), "decode");

        fs::remove_file(&path).unwrap();
    }
}
