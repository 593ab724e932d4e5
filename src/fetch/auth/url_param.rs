use crate::fetch::client::HttpClient;
use async_trait::async_trait;
use reqwest::Request;

/// An [`HttpClient`] wrapper that appends an API key as a URL query parameter.
///
/// Existing query pairs on the feed URL are kept; the key is added after them.
pub struct UrlParam<C> {
    pub inner: C,
    pub param_name: String,
    pub key: String,
}

impl<C> UrlParam<C> {
    fn authorize(&self, req: &mut Request) {
        req.url_mut()
            .query_pairs_mut()
            .append_pair(&self.param_name, &self.key);
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for UrlParam<C> {
    async fn execute(&self, mut req: Request) -> reqwest::Result<reqwest::Response> {
        self.authorize(&mut req);
        self.inner.execute(req).await
    }
}
