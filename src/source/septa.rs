use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use super::{FeedSource, FetchError};
use crate::fetch::{HttpClient, fetch_bytes};
use crate::parser::{TrainFeed, parse_feed};

/// Fetches the TrainView feed over HTTP.
pub struct SeptaClient<C> {
    client: C,
    url: Url,
}

impl<C: HttpClient> SeptaClient<C> {
    pub fn new(client: C, url: Url) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl<C: HttpClient> FeedSource for SeptaClient<C> {
    async fn fetch(&self) -> Result<TrainFeed, FetchError> {
        let bytes = fetch_bytes(&self.client, &self.url).await?;
        debug!(bytes = bytes.len(), "Feed bytes received, parsing");
        Ok(parse_feed(&bytes)?)
    }

    fn describe(&self) -> String {
        self.url.to_string()
    }
}
