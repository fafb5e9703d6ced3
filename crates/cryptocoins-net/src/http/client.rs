//! The fetch pipeline.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use cryptocoins_core::logging::targets;
use serde::de::DeserializeOwned;
use url::Url;

use super::request::Request;
use super::transport::{ReqwestTransport, Transport, TransportConfig, TransportRequest};
use crate::cache::{CacheConfig, ResponseCache, TieredCache};
use crate::config::FetchConfig;
use crate::connectivity::{AlwaysConnected, ConnectivityGuard};
use crate::decode::{Decoder, JsonDecoder};
use crate::error::{BuildError, NetworkError, Result, TransportError};
use crate::tls::{PinSource, TlsConfig};

/// Builder for a [`FetchClient`].
///
/// Every collaborator is optional. Missing ones default to
/// [`AlwaysConnected`], a [`TieredCache`] built from the cache configuration,
/// and a [`ReqwestTransport`] built from the transport configuration.
pub struct FetchClientBuilder<D = JsonDecoder> {
    guard: Option<Arc<dyn ConnectivityGuard>>,
    cache: Option<Arc<dyn ResponseCache>>,
    transport: Option<Arc<dyn Transport>>,
    transport_config: TransportConfig,
    cache_config: CacheConfig,
    decoder: D,
}

impl Default for FetchClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchClientBuilder {
    /// Create a builder with default configuration.
    pub fn new() -> Self {
        Self {
            guard: None,
            cache: None,
            transport: None,
            transport_config: TransportConfig::default(),
            cache_config: CacheConfig::default(),
            decoder: JsonDecoder,
        }
    }

    /// Create a builder from a loaded configuration.
    pub fn from_config(config: &FetchConfig) -> Self {
        let mut builder = Self::new();
        builder.transport_config.timeout = config.timeout();
        builder.transport_config.connect_timeout = config.connect_timeout();
        if let Some(ua) = &config.user_agent {
            builder.transport_config.user_agent = Some(ua.clone());
        }
        if let Some(path) = &config.pinned_certificate {
            builder.transport_config.tls.pinned_certificate = Some(PinSource::file(path));
        }
        builder.cache_config = config.cache.clone();
        builder
    }
}

impl<D: Decoder> FetchClientBuilder<D> {
    /// Set the connectivity guard.
    pub fn connectivity(mut self, guard: Arc<dyn ConnectivityGuard>) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Set the response cache.
    pub fn cache(mut self, cache: Arc<dyn ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set the transport. Transport configuration is ignored when set.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replace the decoder.
    pub fn decoder<D2: Decoder>(self, decoder: D2) -> FetchClientBuilder<D2> {
        FetchClientBuilder {
            guard: self.guard,
            cache: self.cache,
            transport: self.transport,
            transport_config: self.transport_config,
            cache_config: self.cache_config,
            decoder,
        }
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.transport_config.timeout = Some(timeout);
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.transport_config.connect_timeout = Some(timeout);
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.transport_config.user_agent = Some(user_agent.into());
        self
    }

    /// Set the complete TLS configuration.
    pub fn tls_config(mut self, config: TlsConfig) -> Self {
        self.transport_config.tls = config;
        self
    }

    /// Pin the server leaf certificate.
    pub fn pinned_certificate(mut self, source: PinSource) -> Self {
        self.transport_config.tls.pinned_certificate = Some(source);
        self
    }

    /// Set the configuration for the default cache.
    pub fn cache_config(mut self, config: CacheConfig) -> Self {
        self.cache_config = config;
        self
    }

    /// Build the client.
    pub fn build(self) -> std::result::Result<FetchClient<D>, BuildError> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::with_config(&self.transport_config)?),
        };
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(TieredCache::from_config(&self.cache_config)));
        let guard = self.guard.unwrap_or_else(|| Arc::new(AlwaysConnected));

        Ok(FetchClient {
            inner: Arc::new(FetchClientInner {
                guard,
                cache,
                transport,
                decoder: self.decoder,
            }),
        })
    }
}

struct FetchClientInner<D> {
    guard: Arc<dyn ConnectivityGuard>,
    cache: Arc<dyn ResponseCache>,
    transport: Arc<dyn Transport>,
    decoder: D,
}

/// A typed fetch client with cache fallback.
///
/// Cloning is cheap; clones share the same collaborators.
///
/// # Example
///
/// ```ignore
/// use cryptocoins_net::http::{FetchClient, Request};
///
/// let client = FetchClient::builder().build()?;
/// let coins: Vec<Coin> = client.fetch(&Request::get("https://api.example.com/coins")).await?;
/// ```
pub struct FetchClient<D = JsonDecoder> {
    inner: Arc<FetchClientInner<D>>,
}

impl<D> Clone for FetchClient<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D> std::fmt::Debug for FetchClient<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchClient").finish_non_exhaustive()
    }
}

impl FetchClient {
    /// Create a builder.
    pub fn builder() -> FetchClientBuilder {
        FetchClientBuilder::new()
    }
}

impl<D: Decoder> FetchClient<D> {
    /// Fetch `request` and decode the body into `T`.
    ///
    /// The pipeline runs strictly in order:
    ///
    /// 1. If the guard reports no connectivity, fail with
    ///    [`TransportError::NotConnected`].
    /// 2. If the endpoint is not an absolute URL, fail with
    ///    [`TransportError::BadUrl`].
    /// 3. Build the outbound request.
    /// 4. Issue exactly one transport call. A non-2xx status is treated as a
    ///    transport failure with cause [`TransportError::BadStatus`].
    /// 5. On success, store the body in the cache under the endpoint.
    /// 6. On transport failure, fall back to the cached body. Without one,
    ///    return the original failure. The fallback never writes the cache.
    /// 7. Decode the bytes. A decode failure is reported as
    ///    [`NetworkError::Decode`] whether the bytes were live or cached.
    ///
    /// Caller cancellation ([`TransportError::Cancelled`]) is terminal and
    /// skips the fallback.
    pub async fn fetch<T: DeserializeOwned>(&self, request: &Request) -> Result<T> {
        let bytes = self.fetch_bytes(request).await?;
        self.inner
            .decoder
            .decode(&bytes)
            .map_err(|err| {
                tracing::debug!(
                    target: targets::FETCH,
                    endpoint = request.endpoint(),
                    "Decode failed: {}",
                    err
                );
                NetworkError::Decode(err)
            })
    }

    /// Run steps 1 to 6 of the pipeline and return the raw body.
    pub async fn fetch_bytes(&self, request: &Request) -> Result<Bytes> {
        let endpoint = request.endpoint();

        if !self.inner.guard.is_connected() {
            tracing::debug!(target: targets::FETCH, endpoint, "Skipping fetch: not connected");
            return Err(TransportError::NotConnected.into());
        }

        let url = parse_endpoint(endpoint)?;
        let outbound = TransportRequest {
            url,
            method: request.method(),
            headers: request.header_map()?,
            body: request.body_bytes().cloned(),
        };

        tracing::debug!(target: targets::FETCH, method = %request.method(), endpoint, "Sending request");

        let live = match self.inner.transport.send(outbound).await {
            Ok(response) if response.is_success() => Ok(response.body),
            Ok(response) => Err(TransportError::BadStatus(response.status)),
            Err(err) => Err(err),
        };

        match live {
            Ok(body) => {
                tracing::trace!(target: targets::FETCH, endpoint, bytes = body.len(), "Live response");
                self.inner.cache.put(request.cache_key(), body.clone());
                Ok(body)
            }
            Err(TransportError::Cancelled) => Err(TransportError::Cancelled.into()),
            Err(cause) => match self.inner.cache.get(request.cache_key()) {
                Some(cached) => {
                    tracing::info!(
                        target: targets::FETCH,
                        endpoint,
                        "Serving cached response after transport failure: {}",
                        cause
                    );
                    Ok(cached)
                }
                None => {
                    tracing::warn!(target: targets::FETCH, endpoint, "Fetch failed: {}", cause);
                    Err(cause.into())
                }
            },
        }
    }
}

fn parse_endpoint(endpoint: &str) -> std::result::Result<Url, TransportError> {
    if endpoint.trim().is_empty() {
        return Err(TransportError::BadUrl("empty endpoint".to_string()));
    }
    Url::parse(endpoint).map_err(|err| TransportError::BadUrl(format!("{endpoint}: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_endpoint() {
        assert!(parse_endpoint("https://example.com/crypto").is_ok());
        assert!(matches!(parse_endpoint(""), Err(TransportError::BadUrl(_))));
        assert!(matches!(parse_endpoint("   "), Err(TransportError::BadUrl(_))));
        assert!(matches!(parse_endpoint("/crypto"), Err(TransportError::BadUrl(_))));
        assert!(matches!(parse_endpoint("ht tp://bad"), Err(TransportError::BadUrl(_))));
    }

    #[test]
    fn test_client_is_clone() {
        let client = FetchClient::builder()
            .cache(Arc::new(TieredCache::in_memory(1024)))
            .build()
            .unwrap();
        let other = client.clone();
        assert!(Arc::ptr_eq(&client.inner, &other.inner));
    }
}
