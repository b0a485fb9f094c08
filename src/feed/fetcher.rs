use crate::feed::parser::{parse_records, ParseResult};
use crate::feed::types::{FeedRecord, FetchedFeed, SourceKey};
use chrono::Utc;
use futures::StreamExt;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::redirect::Policy;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const MAX_EXPORT_SIZE: usize = 10 * 1024 * 1024; // 10MB
const MAX_REDIRECTS: usize = 5;

/// Errors that can occur while fetching a sheet export.
///
/// Every variant is a total failure: no records from a failed fetch are ever
/// used.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
    /// Response body was not valid UTF-8 text
    #[error("Response is not valid UTF-8")]
    InvalidEncoding,
    /// Export base URL cannot carry a path
    #[error("Invalid export base URL: {0}")]
    InvalidBaseUrl(String),
    /// The background fetch task panicked
    #[error("Fetch task panicked: {0}")]
    TaskPanicked(String),
}

/// Anything that can produce the records for a source key.
///
/// The refresh controller is generic over this so its scheduling can be
/// driven without a network.
pub trait FeedSource: Clone + Send + Sync + 'static {
    fn load(
        &self,
        source: &SourceKey,
    ) -> impl Future<Output = Result<FetchedFeed, FetchError>> + Send;
}

/// HTTP client for published spreadsheet CSV exports.
///
/// Cheap to clone: the underlying `reqwest::Client` is reference counted.
#[derive(Debug, Clone)]
pub struct SheetsClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl SheetsClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://docs.google.com";

    /// Build a client for exports served under `base_url`.
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidBaseUrl`] if `base_url` does not parse or
    ///   cannot have path segments (e.g. `mailto:`)
    /// - [`FetchError::Network`] if the TLS backend fails to initialize
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let base_url =
            Url::parse(base_url).map_err(|e| FetchError::InvalidBaseUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::InvalidBaseUrl(base_url.to_string()));
        }

        let http = reqwest::Client::builder()
            .redirect(create_redirect_policy())
            .pool_max_idle_per_host(2)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(60))
            .user_agent(concat!("sheetfeed/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            timeout,
        })
    }

    /// Export URL for a source: `{base}/spreadsheets/d/{id}/export?format=csv&gid={sheet}`.
    ///
    /// Identifiers are percent-encoded as path segment and query value.
    pub fn export_url(&self, source: &SourceKey) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "spreadsheets",
                "d",
                source.spreadsheet_id.as_str(),
                "export",
            ]);
        }
        url.query_pairs_mut()
            .clear()
            .append_pair("format", "csv")
            .append_pair("gid", &source.sheet_id);
        url
    }

    /// Fetch and parse the current contents of a sheet.
    ///
    /// Always requests live data (`Cache-Control: no-cache`). The whole
    /// request, body included, is bounded by the client's timeout.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Network`] - Connection or TLS errors
    /// - [`FetchError::Timeout`] - Request exceeded the timeout
    /// - [`FetchError::HttpStatus`] - Non-2xx HTTP response
    /// - [`FetchError::ResponseTooLarge`] - Response exceeded 10MB
    /// - [`FetchError::IncompleteResponse`] - Body shorter than Content-Length
    /// - [`FetchError::InvalidEncoding`] - Body is not UTF-8
    pub async fn fetch(&self, source: &SourceKey) -> Result<FetchedFeed, FetchError> {
        tokio::time::timeout(self.timeout, self.fetch_untimed(source))
            .await
            .map_err(|_| FetchError::Timeout)?
    }

    async fn fetch_untimed(&self, source: &SourceKey) -> Result<FetchedFeed, FetchError> {
        let url = self.export_url(source);
        tracing::debug!(source = %source, url = %url, "Fetching sheet export");

        let response = self
            .http
            .get(url)
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        let bytes = read_limited_bytes(response, MAX_EXPORT_SIZE).await?;
        let text = String::from_utf8(bytes).map_err(|_| FetchError::InvalidEncoding)?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

        let fetched_at = Utc::now();
        let ParseResult {
            records,
            short_rows,
            untitled_rows,
        } = parse_records(text, fetched_at);

        if short_rows > 0 || untitled_rows > 0 {
            tracing::debug!(
                source = %source,
                short_rows,
                untitled_rows,
                "Dropped malformed rows from sheet export"
            );
        }
        tracing::info!(source = %source, records = records.len(), "Fetched sheet export");

        Ok(FetchedFeed {
            records,
            fetched_at,
        })
    }
}

impl FeedSource for SheetsClient {
    fn load(
        &self,
        source: &SourceKey,
    ) -> impl Future<Output = Result<FetchedFeed, FetchError>> + Send {
        self.fetch(source)
    }
}

/// Fetch a sheet's records, degrading every failure to an empty list.
///
/// The error is logged and otherwise dropped; callers that need to tell
/// "empty sheet" from "fetch failed" should use [`SheetsClient::fetch`].
pub async fn fetch_feed(client: &SheetsClient, source: &SourceKey) -> Vec<FeedRecord> {
    match client.fetch(source).await {
        Ok(feed) => feed.records,
        Err(e) => {
            tracing::error!(source = %source, error = %e, "Error fetching spreadsheet data");
            Vec::new()
        }
    }
}

/// Redirect policy with a hop limit and loop detection.
///
/// Published exports redirect to a content host, so a few hops are normal.
fn create_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error("Too many redirects");
        }

        let url = attempt.url();
        if attempt.previous().iter().any(|prev| prev.as_str() == url.as_str()) {
            return attempt.error("Redirect loop detected");
        }

        tracing::debug!(
            to = %url,
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );

        attempt.follow()
    })
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
