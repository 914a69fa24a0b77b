//! Upstream status cat image client

use crate::error::UpstreamError;
use axum::body::Bytes;
use reqwest::{Client, StatusCode};
use status_image_store::StatusKey;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Outcome of a non-failing upstream request
#[derive(Debug)]
pub enum Upstream {
    Found(Bytes),
    NotFound,
}

/// HTTP client fetching `<base>/<code>.jpg` from the upstream image source
pub struct CatFetcher {
    client: Client,
    base_url: Url,
}

impl CatFetcher {
    pub const DEFAULT_BASE_URL: &'static str = "https://http.cat";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, UpstreamError> {
        let mut base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(UpstreamError::InvalidUrl(format!(
                "{} cannot be used as a base URL",
                base_url
            )));
        }
        // Url::join replaces the last segment unless the path ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn image_url(&self, key: &StatusKey) -> Result<Url, UpstreamError> {
        Ok(self.base_url.join(&key.file_name())?)
    }

    /// Fetch the image for `key`.
    ///
    /// Statuses below 500 never fail: 404 maps to [`Upstream::NotFound`] and
    /// anything else is served as the image body. 500 and above is an error.
    pub async fn fetch(&self, key: &StatusKey) -> Result<Upstream, UpstreamError> {
        let url = self.image_url(key)?;
        debug!(url = %url, "Fetching image from upstream");

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if status.as_u16() >= 500 {
            warn!(status = %status, url = %url, "Upstream server error");
            return Err(UpstreamError::Status(status.as_u16()));
        }

        if status == StatusCode::NOT_FOUND {
            debug!(url = %url, "Upstream has no image");
            return Ok(Upstream::NotFound);
        }

        let data = response.bytes().await?;
        debug!(url = %url, status = %status, size = data.len(), "Fetched image from upstream");
        Ok(Upstream::Found(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: &str) -> StatusKey {
        StatusKey::parse(code).unwrap()
    }

    #[test]
    fn test_image_url_default_base() {
        let fetcher = CatFetcher::new(CatFetcher::DEFAULT_BASE_URL, CatFetcher::DEFAULT_TIMEOUT)
            .unwrap();
        assert_eq!(
            fetcher.image_url(&key("404")).unwrap().as_str(),
            "https://http.cat/404.jpg"
        );
    }

    #[test]
    fn test_image_url_keeps_base_path() {
        let fetcher = CatFetcher::new("http://127.0.0.1:8080/cats", Duration::from_secs(1))
            .unwrap();
        assert_eq!(
            fetcher.image_url(&key("200")).unwrap().as_str(),
            "http://127.0.0.1:8080/cats/200.jpg"
        );

        let fetcher = CatFetcher::new("http://127.0.0.1:8080/cats/", Duration::from_secs(1))
            .unwrap();
        assert_eq!(
            fetcher.image_url(&key("200")).unwrap().as_str(),
            "http://127.0.0.1:8080/cats/200.jpg"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            CatFetcher::new("not a url", Duration::from_secs(1)),
            Err(UpstreamError::InvalidUrl(_))
        ));
        assert!(matches!(
            CatFetcher::new("mailto:cats@example.com", Duration::from_secs(1)),
            Err(UpstreamError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_unreachable_is_error() {
        // Bind then drop to get a port with nothing listening
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let fetcher = CatFetcher::new(&format!("http://{}", addr), Duration::from_secs(2)).unwrap();
        let result = fetcher.fetch(&key("200")).await;
        assert!(matches!(result, Err(UpstreamError::Http(_))));
    }
}
