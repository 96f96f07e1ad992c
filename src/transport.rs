use reqwest::blocking::{Client as HttpClient, Response};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;

use crate::error::{GridError, Result};
use crate::request::GridRequest;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Verify TLS certificates. Turning this off tolerates self-signed
    /// deployments and is logged as a warning.
    pub verify_tls: bool,
    /// Deadline for each outbound call, including reading the body.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            verify_tls: true,
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("gridapi-rs/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// The single HTTP client shared by every call made through a [`crate::Client`].
#[derive(Debug, Clone)]
pub struct Transport {
    http: HttpClient,
}

impl Transport {
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or(HeaderValue::from_static("gridapi-rs")),
        );

        let mut builder = HttpClient::builder()
            .default_headers(default_headers)
            .timeout(config.timeout);

        if !config.verify_tls {
            tracing::warn!(
                "TLS certificate verification is DISABLED; responses from the GRiD server cannot be trusted"
            );
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder
            .build()
            .map_err(|e| GridError::config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http })
    }

    /// Sends a decorated request. Only network-level failures are reported here;
    /// status handling belongs to the classifier.
    pub fn send(&self, request: GridRequest) -> Result<Response> {
        let url = request.url().to_string();
        let builder = self
            .http
            .request(request.method().clone(), request.url().clone())
            .headers(request.headers().clone());
        let builder = match request.into_body() {
            Some(body) => builder.body(body),
            None => builder,
        };

        builder
            .send()
            .map_err(|source| GridError::Transport { url, source })
    }
}
