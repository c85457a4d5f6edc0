//! Page and asset fetching.
//!
//! One [`PageFetcher`] is built per process and cloned wherever a component
//! needs network access, so every request goes through the same connection
//! pool.

use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use reqwest::{Client, Response, StatusCode};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{FetchError, Result, TralbumError};

/// Browser identity sent with every request. Unknown clients get degraded
/// markup without the embedded release data.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Settings for the shared HTTP client.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Whole-request timeout, body included.
    pub timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// GET-only HTTP client returning raw bodies.
///
/// # Example
///
/// ```rust,no_run
/// use tralbum::api::PageFetcher;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let fetcher = PageFetcher::new()?;
///     let page = fetcher.fetch("https://slowedandreverb.bandcamp.com").await?;
///     println!("{} bytes", page.len());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    /// Create a fetcher with the default timeout and user agent.
    pub fn new() -> Result<Self> {
        Self::with_config(&FetcherConfig::default())
    }

    /// Create a fetcher from explicit settings.
    pub fn with_config(config: &FetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()
            .map_err(|e| TralbumError::Client(e.to_string()))?;

        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> Result<Response> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
            .into());
        }
        Ok(response)
    }

    /// GET `url` and return the body.
    ///
    /// Anything other than `200 OK` is a [`FetchError::Status`].
    pub async fn fetch(&self, url: &str) -> Result<Bytes> {
        let body = self
            .get(url)
            .await?
            .bytes()
            .await
            .map_err(|e| classify(url, e))?;
        debug!("GET {} -> {} bytes", url, body.len());
        Ok(body)
    }

    /// GET `url` and stream the body into a new file at `path`.
    ///
    /// The file is only created once the status check passed. Returns the
    /// number of bytes written.
    pub async fn fetch_to_file(&self, url: &str, path: &Path) -> Result<u64> {
        let response = self.get(url).await?;
        let mut file = File::create(path)
            .await
            .map_err(|e| TralbumError::io(path, e))?;

        let mut body = response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| classify(url, e))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| TralbumError::io(path, e))?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| TralbumError::io(path, e))?;

        debug!("GET {} -> {} bytes to {}", url, written, path.display());
        Ok(written)
    }
}

fn classify(url: &str, source: reqwest::Error) -> TralbumError {
    let url = url.to_string();
    if source.is_timeout() {
        FetchError::Timeout { url }.into()
    } else {
        FetchError::Network { url, source }.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_returns_body_and_sends_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/album/demo"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let fetcher = PageFetcher::new().unwrap();
        let body = fetcher
            .fetch(&format!("{}/album/demo", server.uri()))
            .await
            .unwrap();
        assert_eq!(&body[..], b"<html></html>");

        let requests = server.received_requests().await.unwrap();
        let user_agent = requests[0].headers.get("user-agent").unwrap();
        assert_eq!(user_agent.to_str().unwrap(), DEFAULT_USER_AGENT);
    }

    #[tokio::test]
    async fn test_fetch_to_file_streams_body() {
        let server = MockServer::start().await;
        let body = vec![7u8; 256 * 1024];
        Mock::given(method("GET"))
            .and(path("/stream/1"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("track.mp3");
        let written = PageFetcher::new()
            .unwrap()
            .fetch_to_file(&format!("{}/stream/1", server.uri()), &target)
            .await
            .unwrap();
        assert_eq!(written, body.len() as u64);
        assert_eq!(std::fs::read(&target).unwrap(), body);
    }

    #[tokio::test]
    async fn test_fetch_to_file_creates_nothing_on_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("track.mp3");
        let err = PageFetcher::new()
            .unwrap()
            .fetch_to_file(&format!("{}/stream/1", server.uri()), &target)
            .await
            .unwrap_err();
        assert_eq!(err.as_fetch().and_then(FetchError::status), Some(403));
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn test_non_success_status_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = format!("{}/missing", server.uri());
        let err = PageFetcher::new().unwrap().fetch(&url).await.unwrap_err();
        let fetch = err.as_fetch().expect("fetch error");
        assert_eq!(fetch.url(), url);
        assert_eq!(fetch.status(), Some(404));
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let config = FetcherConfig {
            timeout: Duration::from_millis(50),
            ..Default::default()
        };
        let url = format!("{}/slow", server.uri());
        let err = PageFetcher::with_config(&config)
            .unwrap()
            .fetch(&url)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TralbumError::Fetch(FetchError::Timeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_connection_failure_is_network_error() {
        // Nothing listens on port 1.
        let err = PageFetcher::new()
            .unwrap()
            .fetch("http://127.0.0.1:1/")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TralbumError::Fetch(FetchError::Network { .. })
        ));
    }
}
