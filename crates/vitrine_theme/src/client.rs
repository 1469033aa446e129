//! Theme service client
//!
//! [`ThemeClient`] performs exactly one request per call, bounded by a
//! timeout covering connect, headers and body. Responses are mapped onto
//! [`FetchError`] and decoded into a validated [`ThemeDescriptor`]; there are
//! no retries and no fallback here.

use crate::descriptor::ThemeDescriptor;
use crate::error::FetchError;
use crate::presets::ThemePreset;
use async_trait::async_trait;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::time::Duration;

/// Default request budget
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/v1";

/// Raw response from a transport
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Something that can answer `GET /themes/{slug}`
#[async_trait]
pub trait ThemeTransport: Send + Sync {
    async fn get_theme(&self, slug: &str) -> Result<TransportResponse, FetchError>;
}

// ============================================================================
// HTTP transport
// ============================================================================

/// HTTP transport over reqwest
pub struct ReqwestTransport {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|err| {
                tracing::warn!("ReqwestTransport: falling back to default client: {}", err);
                reqwest::Client::new()
            });
        Self {
            http,
            base_url,
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn theme_url(&self, slug: &str) -> String {
        format!("{}/themes/{}", self.base_url, slug)
    }

    fn map_error(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl ThemeTransport for ReqwestTransport {
    async fn get_theme(&self, slug: &str) -> Result<TransportResponse, FetchError> {
        let url = self.theme_url(slug);
        tracing::debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.map_error(e))?;
        Ok(TransportResponse { status, body })
    }
}

// ============================================================================
// Offline transport
// ============================================================================

/// Serves the built-in presets, plus any registered descriptors, as if they
/// came from the theme service
#[derive(Default)]
pub struct PresetTransport {
    extra: RwLock<FxHashMap<String, String>>,
}

impl PresetTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `descriptor` under its own slug, shadowing any preset
    pub fn register(&self, descriptor: &ThemeDescriptor) {
        self.extra
            .write()
            .insert(descriptor.slug().to_string(), descriptor.to_json_pretty());
    }
}

#[async_trait]
impl ThemeTransport for PresetTransport {
    async fn get_theme(&self, slug: &str) -> Result<TransportResponse, FetchError> {
        if let Some(body) = self.extra.read().get(slug) {
            return Ok(TransportResponse::new(200, body.clone()));
        }
        Ok(match ThemePreset::from_id(slug) {
            Some(preset) => TransportResponse::new(200, preset.descriptor().to_json_pretty()),
            None => TransportResponse::new(404, format!("{{\"error\":\"theme {slug} not found\"}}")),
        })
    }
}

// ============================================================================
// Client
// ============================================================================

/// Fetches and validates theme descriptors
#[derive(Clone)]
pub struct ThemeClient {
    transport: Arc<dyn ThemeTransport>,
    timeout: Duration,
}

impl ThemeClient {
    pub fn new(transport: Arc<dyn ThemeTransport>) -> Self {
        Self {
            transport,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Client for the hosted theme service at `base_url`
    pub fn http(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self::new(Arc::new(ReqwestTransport::with_timeout(base_url, timeout))).with_timeout(timeout)
    }

    /// Client answering from the built-in presets
    pub fn offline() -> Self {
        Self::new(Arc::new(PresetTransport::new()))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch one theme
    ///
    /// 404 maps to [`FetchError::NotFound`]; any other non-2xx status, and any
    /// body that is not a valid descriptor for `slug`, to [`FetchError::Server`].
    pub async fn fetch_theme(&self, slug: &str) -> Result<ThemeDescriptor, FetchError> {
        let response = tokio::time::timeout(self.timeout, self.transport.get_theme(slug))
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))??;

        match response.status {
            200..=299 => {}
            404 => return Err(FetchError::NotFound(slug.to_string())),
            status => {
                return Err(FetchError::Server {
                    status: Some(status),
                    message: summarize_body(&response.body),
                })
            }
        }

        let descriptor = ThemeDescriptor::from_json(&response.body)
            .map_err(|err| FetchError::malformed(err.to_string()))?;

        if descriptor.slug() != slug {
            return Err(FetchError::malformed(format!(
                "requested `{}` but service returned `{}`",
                slug,
                descriptor.slug()
            )));
        }

        Ok(descriptor)
    }
}

fn summarize_body(body: &str) -> String {
    const MAX: usize = 200;
    let body = body.trim();
    if body.is_empty() {
        return "empty response body".to_string();
    }
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchErrorKind;

    struct Canned(TransportResponse);

    #[async_trait]
    impl ThemeTransport for Canned {
        async fn get_theme(&self, _slug: &str) -> Result<TransportResponse, FetchError> {
            Ok(self.0.clone())
        }
    }

    struct Slow(Duration);

    #[async_trait]
    impl ThemeTransport for Slow {
        async fn get_theme(&self, slug: &str) -> Result<TransportResponse, FetchError> {
            tokio::time::sleep(self.0).await;
            PresetTransport::new().get_theme(slug).await
        }
    }

    fn canned(status: u16, body: impl Into<String>) -> ThemeClient {
        ThemeClient::new(Arc::new(Canned(TransportResponse::new(status, body))))
    }

    #[tokio::test]
    async fn offline_client_serves_presets() {
        let client = ThemeClient::offline();
        let theme = client.fetch_theme("warm-comfort").await.unwrap();
        assert_eq!(theme, ThemePreset::WarmComfort.descriptor());

        let err = client.fetch_theme("nope").await.unwrap_err();
        assert_eq!(err, FetchError::NotFound("nope".into()));
    }

    #[tokio::test]
    async fn status_mapping() {
        let err = canned(503, "down").fetch_theme("x").await.unwrap_err();
        assert_eq!(
            err,
            FetchError::Server {
                status: Some(503),
                message: "down".into()
            }
        );

        let err = canned(401, "").fetch_theme("x").await.unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::Server);
    }

    #[tokio::test]
    async fn malformed_body_is_server_error() {
        let err = canned(200, "{\"meta\":{}}").fetch_theme("x").await.unwrap_err();
        assert!(matches!(err, FetchError::Server { status: None, .. }), "{err:?}");
    }

    #[tokio::test]
    async fn slug_mismatch_is_server_error() {
        let body = ThemePreset::PremiumDark.descriptor().to_json_pretty();
        let err = canned(200, body).fetch_theme("warm-comfort").await.unwrap_err();
        assert!(err.to_string().contains("premium-dark"));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_bounds_the_whole_request() {
        let client = ThemeClient::new(Arc::new(Slow(Duration::from_secs(6))));
        let err = client.fetch_theme("default").await.unwrap_err();
        assert_eq!(err, FetchError::Timeout(DEFAULT_TIMEOUT));

        let client = ThemeClient::new(Arc::new(Slow(Duration::from_secs(4))));
        assert!(client.fetch_theme("default").await.is_ok());
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(500);
        assert_eq!(summarize_body(&body).len(), 203);
        assert_eq!(summarize_body("  "), "empty response body");
    }
}
