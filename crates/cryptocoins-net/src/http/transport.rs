//! The seam between the fetch pipeline and the wire.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use super::request::HttpMethod;
use crate::error::{BuildError, TransportError};
use crate::tls::TlsConfig;

/// A fully validated outbound request.
#[derive(Clone, Debug)]
pub struct TransportRequest {
    /// Parsed absolute URL.
    pub url: Url,
    /// HTTP method.
    pub method: HttpMethod,
    /// Headers after duplicate resolution.
    pub headers: http::HeaderMap,
    /// Body, attached as-is.
    pub body: Option<Bytes>,
}

/// Raw result of one exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Bytes,
}

impl TransportResponse {
    /// Create a response.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Check if the status is in 200..=299.
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}

/// Performs one network exchange.
///
/// Any HTTP status is a successful exchange at this level; the pipeline
/// decides what a non-2xx status means.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` and read the full body.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// Configuration for [`ReqwestTransport`].
#[derive(Clone, Debug)]
pub struct TransportConfig {
    /// Request timeout.
    pub timeout: Option<Duration>,
    /// Connect timeout.
    pub connect_timeout: Option<Duration>,
    /// User agent.
    pub user_agent: Option<String>,
    /// TLS and pinning configuration.
    pub tls: TlsConfig,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            connect_timeout: Some(Duration::from_secs(10)),
            user_agent: Some(default_user_agent()),
            tls: TlsConfig::default(),
        }
    }
}

/// The default user agent string.
pub fn default_user_agent() -> String {
    format!("CryptoCoins/{} (Rust)", env!("CARGO_PKG_VERSION"))
}

/// Transport backed by `reqwest` over rustls.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport with default configuration.
    pub fn new() -> Result<Self, BuildError> {
        Self::with_config(&TransportConfig::default())
    }

    /// Build a transport from configuration.
    ///
    /// When pinning is configured, every connection is checked by
    /// [`PinningVerifier`](crate::tls::PinningVerifier).
    pub fn with_config(config: &TransportConfig) -> Result<Self, BuildError> {
        let mut builder = reqwest::Client::builder();

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(connect_timeout) = config.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        if let Some(ref ua) = config.user_agent {
            builder = builder.user_agent(ua);
        }

        let tls = config.tls.build_rustls_config()?;
        builder = builder.use_preconfigured_tls(tls);

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Wrap an existing `reqwest` client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.to_http(), request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok(TransportResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_success_range() {
        assert!(TransportResponse::new(200, "").is_success());
        assert!(TransportResponse::new(299, "").is_success());
        assert!(!TransportResponse::new(199, "").is_success());
        assert!(!TransportResponse::new(300, "").is_success());
        assert!(!TransportResponse::new(503, "").is_success());
    }

    #[test]
    fn test_default_config() {
        let config = TransportConfig::default();
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert!(config.user_agent.unwrap().starts_with("CryptoCoins/"));
        assert!(!config.tls.is_pinned());
    }

    #[test]
    fn test_build_transport() {
        assert!(ReqwestTransport::new().is_ok());
    }
}
