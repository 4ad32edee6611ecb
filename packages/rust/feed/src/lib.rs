//! Remote feed acquisition and manual-entries loading.
//!
//! The feed is a JSON array of protocol records served over HTTP. Its top-level
//! shape is checked strictly (a non-array body fails the run), while individual
//! elements that do not fit [`RawRecord`] are skipped.

mod manual;

use std::path::{Path, PathBuf};
use std::time::Duration;

use protomerge_shared::{ProtomergeError, RawRecord, Result};
use reqwest::Client;
use tracing::{debug, info, instrument};
use url::Url;

pub use manual::{load_manual_entries, read_manual_entries};

/// Maximum number of redirects to follow when fetching the feed.
const MAX_REDIRECTS: usize = 3;

/// Default timeout in seconds for the feed request.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User-Agent string for feed requests.
const USER_AGENT: &str = concat!("protomerge/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Options and sources
// ---------------------------------------------------------------------------

/// Configuration for the feed request.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Timeout for the whole HTTP exchange in seconds.
    pub timeout_secs: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Where the feed payload comes from.
#[derive(Debug, Clone)]
pub enum FeedSource {
    /// Fetch over HTTP.
    Remote(Url),
    /// Read a previously saved payload from disk.
    File(PathBuf),
}

impl std::fmt::Display for FeedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote(url) => write!(f, "{url}"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Load feed records from either source.
pub async fn load_feed(source: &FeedSource, opts: &FetchOptions) -> Result<Vec<RawRecord>> {
    match source {
        FeedSource::Remote(url) => fetch_feed(url, opts).await,
        FeedSource::File(path) => read_feed_file(path),
    }
}

// ---------------------------------------------------------------------------
// Remote fetch
// ---------------------------------------------------------------------------

/// Fetch and parse the remote feed.
///
/// Transport errors, timeouts and non-2xx statuses are [`ProtomergeError::Fetch`];
/// a body that is not a JSON array is [`ProtomergeError::FeedParse`].
#[instrument(skip_all, fields(url = %url))]
pub async fn fetch_feed(url: &Url, opts: &FetchOptions) -> Result<Vec<RawRecord>> {
    info!("fetching protocol feed");

    let client = build_client(opts)?;
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| ProtomergeError::Fetch(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ProtomergeError::Fetch(format!("{url}: HTTP {status}")));
    }

    let body = response
        .text()
        .await
        .map_err(|e| ProtomergeError::Fetch(format!("{url}: failed to read body: {e}")))?;

    debug!(bytes = body.len(), "feed body received");
    parse_feed(&body)
}

/// Build a reqwest client with appropriate settings.
fn build_client(opts: &FetchOptions) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(Duration::from_secs(opts.timeout_secs))
        .build()
        .map_err(|e| ProtomergeError::Fetch(format!("failed to build HTTP client: {e}")))
}

/// Read a saved feed payload from disk.
fn read_feed_file(path: &Path) -> Result<Vec<RawRecord>> {
    info!(path = %path.display(), "reading protocol feed from file");
    let body = std::fs::read_to_string(path).map_err(|e| ProtomergeError::io(path, e))?;
    parse_feed(&body)
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a feed body into records.
///
/// The top level must be a JSON array. Elements that fail to deserialize
/// (missing `url`, wrong field types, non-objects) are skipped.
pub fn parse_feed(body: &str) -> Result<Vec<RawRecord>> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| ProtomergeError::feed_parse(format!("body is not valid JSON: {e}")))?;

    let serde_json::Value::Array(elements) = value else {
        return Err(ProtomergeError::feed_parse(format!(
            "expected a top-level array, got {}",
            json_kind(&value)
        )));
    };

    let total = elements.len();
    let records = records_from_elements(elements);

    info!(
        elements = total,
        records = records.len(),
        skipped = total - records.len(),
        "feed parsed"
    );
    Ok(records)
}

/// Deserialize each element independently, skipping the ones that don't fit.
pub(crate) fn records_from_elements(elements: Vec<serde_json::Value>) -> Vec<RawRecord> {
    elements
        .into_iter()
        .enumerate()
        .filter_map(|(index, element)| match serde_json::from_value(element) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(index, error = %e, "skipping malformed record");
                None
            }
        })
        .collect()
}

pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED_FIXTURE: &str = "../../../fixtures/json/feed.fixture.json";

    #[test]
    fn test_parse_feed_fixture() {
        let body = std::fs::read_to_string(FEED_FIXTURE).expect("read feed fixture");
        let records = parse_feed(&body).unwrap();

        // One element has no url and one has a numeric name; both are skipped.
        assert_eq!(records.len(), 7);
        assert_eq!(records[0].name.as_deref(), Some("Aave"));
        assert!(records[0].category.contains("Lending"));
    }

    #[test]
    fn test_parse_feed_rejects_non_array() {
        let err = parse_feed(r#"{"protocols": []}"#).unwrap_err();
        assert!(matches!(err, ProtomergeError::FeedParse { .. }));
        assert!(err.to_string().contains("an object"));
    }

    #[test]
    fn test_parse_feed_rejects_invalid_json() {
        let err = parse_feed("<html>busy</html>").unwrap_err();
        assert!(matches!(err, ProtomergeError::FeedParse { .. }));
    }

    #[test]
    fn test_parse_feed_skips_malformed_elements() {
        let body = r#"[
            {"url": "https://aave.com", "tvl": 1},
            null,
            42,
            {"url": "https://curve.fi", "tvl": "lots"},
            {"url": "https://lido.fi", "chains": ["Ethereum"]}
        ]"#;
        let records = parse_feed(body).unwrap();
        let urls: Vec<&str> = records.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, ["https://aave.com", "https://lido.fi"]);
    }

    #[test]
    fn test_parse_feed_empty_array() {
        assert!(parse_feed("[]").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_feed_with_mock_server() {
        let server = wiremock::MockServer::start().await;
        let body = std::fs::read_to_string(FEED_FIXTURE).expect("read feed fixture");

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/protocols"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(&body))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/protocols", server.uri())).unwrap();
        let records = fetch_feed(&url, &FetchOptions::default()).await.unwrap();
        assert_eq!(records.len(), 7);
    }

    #[tokio::test]
    async fn test_fetch_feed_server_error() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/protocols"))
            .respond_with(wiremock::ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/protocols", server.uri())).unwrap();
        let err = fetch_feed(&url, &FetchOptions::default()).await.unwrap_err();
        assert!(matches!(err, ProtomergeError::Fetch(_)));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_fetch_feed_non_array_payload() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/protocols"))
            .respond_with(
                wiremock::ResponseTemplate::new(200).set_body_string(r#"{"error": "rate limited"}"#),
            )
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/protocols", server.uri())).unwrap();
        let err = fetch_feed(&url, &FetchOptions::default()).await.unwrap_err();
        assert!(matches!(err, ProtomergeError::FeedParse { .. }));
    }

    #[tokio::test]
    async fn test_fetch_feed_times_out() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/protocols"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_string("[]")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/protocols", server.uri())).unwrap();
        let opts = FetchOptions { timeout_secs: 1 };
        let err = fetch_feed(&url, &opts).await.unwrap_err();
        assert!(matches!(err, ProtomergeError::Fetch(_)));
    }

    #[tokio::test]
    async fn test_load_feed_from_file() {
        let source = FeedSource::File(PathBuf::from(FEED_FIXTURE));
        let records = load_feed(&source, &FetchOptions::default()).await.unwrap();
        assert_eq!(records.len(), 7);

        let missing = FeedSource::File(PathBuf::from("../../../fixtures/json/nope.json"));
        let err = load_feed(&missing, &FetchOptions::default()).await.unwrap_err();
        assert!(matches!(err, ProtomergeError::Io { .. }));
    }
}
