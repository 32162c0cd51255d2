//! HTTP fetcher
//!
//! Builds a client per request, performs a GET, classifies the status and
//! returns the raw body. The body is read as a stream so an oversized
//! response is rejected as soon as it crosses the size ceiling.

use crate::error::{FetchError, BODY_EXCERPT_LIMIT};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Connect timeout
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Read timeout (between body chunks)
pub const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Default ceiling for response bodies (5 MiB)
pub const MAX_RESPONSE_SIZE: u64 = 5 * 1024 * 1024;

/// Environment variable naming a PEM trust-anchor bundle
pub const CA_BUNDLE_ENV: &str = "SSL_CERT_FILE";

/// Platform default trust-anchor bundle
pub const DEFAULT_CA_BUNDLE: &str = "/etc/ssl/certs/ca-certificates.crt";

/// Expected response format, selects the Accept header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Json,
    Html,
}

impl ResponseKind {
    fn accept(self) -> &'static str {
        match self {
            ResponseKind::Json => "application/json",
            ResponseKind::Html => "text/html, application/xhtml+xml;q=0.9, */*;q=0.8",
        }
    }
}

/// Issues GET requests with fixed timeouts and a size guard
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    user_agent: String,
    max_response_size: u64,
}

impl HttpFetcher {
    /// Create a fetcher with the given User-Agent and body ceiling
    pub fn new(user_agent: impl Into<String>, max_response_size: u64) -> Self {
        Self {
            user_agent: user_agent.into(),
            max_response_size,
        }
    }

    /// Configured body ceiling
    pub fn max_response_size(&self) -> u64 {
        self.max_response_size
    }

    /// Fetch `url` and return the body of a 2xx response
    pub async fn get(&self, url: &str, kind: ResponseKind) -> Result<Bytes, FetchError> {
        let client = self.build_client(kind)?;

        debug!(url = %url, ?kind, "Fetching");
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, url))?;

        let status = response.status();

        if !status.is_success() {
            debug!(url = %url, status = status.as_u16(), "Upstream error status");
            let excerpt = read_excerpt(response.bytes_stream(), BODY_EXCERPT_LIMIT).await;
            return Err(FetchError::from_status(status.as_u16(), url, &excerpt));
        }

        if let Some(length) = response.content_length() {
            if length > self.max_response_size {
                warn!(url = %url, size = length, "Declared response size over limit");
                return Err(FetchError::ResponseSizeExceeded {
                    size: length,
                    max_size: self.max_response_size,
                });
            }
        }

        read_body_limited(response.bytes_stream(), self.max_response_size, url).await
    }

    fn build_client(&self, kind: ResponseKind) -> Result<reqwest::Client, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&self.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static(crate::DEFAULT_USER_AGENT)),
        );
        headers.insert(ACCEPT, HeaderValue::from_static(kind.accept()));

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(READ_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none());

        if let Some(bundle) = resolve_ca_bundle() {
            match load_certificates(&bundle) {
                Ok(certs) => {
                    for cert in certs {
                        builder = builder.add_root_certificate(cert);
                    }
                }
                Err(e) => {
                    warn!(path = %bundle.display(), error = %e, "Ignoring unreadable CA bundle");
                }
            }
        }

        builder.build().map_err(FetchError::ClientBuildError)
    }
}

/// Locate the trust-anchor bundle: env override, then platform default
pub fn resolve_ca_bundle() -> Option<PathBuf> {
    let override_path = env::var_os(CA_BUNDLE_ENV).map(PathBuf::from);
    resolve_ca_bundle_from(override_path.as_deref(), Path::new(DEFAULT_CA_BUNDLE))
}

fn resolve_ca_bundle_from(override_path: Option<&Path>, default_path: &Path) -> Option<PathBuf> {
    if let Some(path) = override_path {
        if is_readable_file(path) {
            return Some(path.to_path_buf());
        }
        warn!(path = %path.display(), "{} is set but not readable", CA_BUNDLE_ENV);
    }
    if default_path.is_file() {
        return Some(default_path.to_path_buf());
    }
    None
}

fn is_readable_file(path: &Path) -> bool {
    path.is_file() && fs::File::open(path).is_ok()
}

fn load_certificates(path: &Path) -> Result<Vec<reqwest::Certificate>, String> {
    let pem = fs::read(path).map_err(|e| e.to_string())?;
    reqwest::Certificate::from_pem_bundle(&pem).map_err(|e| e.to_string())
}

/// Read the whole body, failing once it grows past `max_size`
async fn read_body_limited<S>(mut stream: S, max_size: u64, url: &str) -> Result<Bytes, FetchError>
where
    S: Stream<Item = reqwest::Result<Bytes>> + Unpin,
{
    let mut body = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| FetchError::from_reqwest(e, url))?;
        body.extend_from_slice(&chunk);
        if body.len() as u64 > max_size {
            warn!(url = %url, read = body.len(), "Response body over limit");
            return Err(FetchError::ResponseSizeExceeded {
                size: body.len() as u64,
                max_size,
            });
        }
    }

    Ok(Bytes::from(body))
}

/// Read at most `limit` bytes of an error body; a failing read ends early
async fn read_excerpt<S>(mut stream: S, limit: usize) -> Bytes
where
    S: Stream<Item = reqwest::Result<Bytes>> + Unpin,
{
    let mut body = Vec::new();
    while body.len() < limit {
        match stream.next().await {
            Some(Ok(chunk)) => body.extend_from_slice(&chunk),
            _ => break,
        }
    }
    body.truncate(limit);
    Bytes::from(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use std::io::Write;

    fn chunks(sizes: &[usize]) -> impl Stream<Item = reqwest::Result<Bytes>> + Unpin {
        let chunks: Vec<reqwest::Result<Bytes>> = sizes
            .iter()
            .map(|&size| Ok(Bytes::from(vec![b'x'; size])))
            .collect();
        stream::iter(chunks)
    }

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = env::temp_dir().join(format!("rubykit-{}-{}", std::process::id(), name));
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_accept_headers() {
        assert_eq!(ResponseKind::Json.accept(), "application/json");
        assert!(ResponseKind::Html.accept().starts_with("text/html"));
    }

    #[test]
    fn test_ca_bundle_prefers_readable_override() {
        let override_path = temp_file("override.pem", "");
        let default_path = temp_file("default.pem", "");
        assert_eq!(
            resolve_ca_bundle_from(Some(&override_path), &default_path),
            Some(override_path.clone())
        );
        fs::remove_file(override_path).ok();
        fs::remove_file(default_path).ok();
    }

    #[test]
    fn test_ca_bundle_falls_back_to_default() {
        let default_path = temp_file("fallback.pem", "");
        let missing = Path::new("/nonexistent/rubykit/ca.pem");
        assert_eq!(
            resolve_ca_bundle_from(Some(missing), &default_path),
            Some(default_path.clone())
        );
        fs::remove_file(default_path).ok();
    }

    #[test]
    fn test_ca_bundle_none_when_nothing_resolves() {
        let missing = Path::new("/nonexistent/rubykit/ca.pem");
        assert_eq!(resolve_ca_bundle_from(None, missing), None);
    }

    #[tokio::test]
    async fn test_streamed_body_over_ceiling() {
        // No declared length: the limit applies while chunks arrive
        let err = read_body_limited(chunks(&[600, 600, 600]), 1024, "https://example.com")
            .await
            .unwrap_err();
        match err {
            FetchError::ResponseSizeExceeded { size, max_size } => {
                assert_eq!(size, 1200);
                assert_eq!(max_size, 1024);
            }
            other => panic!("expected ResponseSizeExceeded, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_streamed_body_at_ceiling() {
        let body = read_body_limited(chunks(&[512, 512]), 1024, "https://example.com")
            .await
            .unwrap();
        assert_eq!(body.len(), 1024);
    }

    #[tokio::test]
    async fn test_excerpt_stops_at_limit() {
        let excerpt = read_excerpt(chunks(&[400, 400, 400]), 500).await;
        assert_eq!(excerpt.len(), 500);

        let short = read_excerpt(chunks(&[10]), 500).await;
        assert_eq!(short.len(), 10);
    }

    #[test]
    fn test_fetcher_keeps_ceiling() {
        let fetcher = HttpFetcher::new("test-agent", 1024);
        assert_eq!(fetcher.max_response_size(), 1024);
    }
}
