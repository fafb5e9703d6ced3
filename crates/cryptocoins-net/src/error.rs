//! Error types for the fetch layer.
//!
//! Every failure reaching a caller of [`FetchClient::fetch`] is classified into
//! one of the three members of [`NetworkError`]:
//!
//! - [`NetworkError::Transport`]: the network exchange could not produce
//!   usable bytes (offline, malformed endpoint, connection failure, rejected
//!   certificate, non-2xx status) and no cached response was available.
//! - [`NetworkError::Decode`]: bytes were obtained, live or cached, but did not
//!   match the target type.
//! - [`NetworkError::None`]: the "no error yet" value for observable error
//!   fields. It is never returned from a fetch.
//!
//! [`FetchClient::fetch`]: crate::http::FetchClient::fetch

use crate::decode::DecodeError;

/// Cause of a transport-level failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The connectivity guard reported the network as unreachable.
    #[error("Not connected to the internet")]
    NotConnected,
    /// The endpoint is not a well-formed absolute URL.
    #[error("Invalid URL: {0}")]
    BadUrl(String),
    /// The request timed out.
    #[error("Request timed out")]
    Timeout,
    /// Connection refused or failed.
    #[error("Connection error: {0}")]
    Connection(String),
    /// TLS handshake failed, including pinning rejections.
    #[error("TLS error: {0}")]
    Tls(String),
    /// The server answered with a status outside 200..=299.
    #[error("Bad server response: HTTP {0}")]
    BadStatus(u16),
    /// The caller cancelled the request.
    #[error("Request was cancelled")]
    Cancelled,
    /// Any other HTTP client failure.
    #[error("HTTP request error: {0}")]
    Request(String),
}

impl TransportError {
    /// The HTTP status carried by a [`TransportError::BadStatus`].
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::BadStatus(status) => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if let Some(tls) = find_tls_error(&err) {
            Self::Tls(tls.to_string())
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else if let Some(status) = err.status() {
            Self::BadStatus(status.as_u16())
        } else {
            Self::Request(err.to_string())
        }
    }
}

impl From<url::ParseError> for TransportError {
    fn from(err: url::ParseError) -> Self {
        Self::BadUrl(err.to_string())
    }
}

/// Walk an error's source chain looking for a rustls failure.
///
/// I/O errors hide their payload from `source()`, so they are unwrapped
/// explicitly.
fn find_tls_error<'a>(err: &'a (dyn std::error::Error + 'static)) -> Option<&'a rustls::Error> {
    let mut current: Option<&'a (dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(tls) = e.downcast_ref::<rustls::Error>() {
            return Some(tls);
        }
        if let Some(tls) = e
            .downcast_ref::<std::io::Error>()
            .and_then(|io| io.get_ref())
            .and_then(|inner| inner.downcast_ref::<rustls::Error>())
        {
            return Some(tls);
        }
        current = e.source();
    }
    None
}

/// The closed error taxonomy of the fetch layer.
#[derive(Debug, Clone, PartialEq, Default, thiserror::Error)]
pub enum NetworkError {
    /// The network exchange failed and no cached response could stand in.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
    /// The payload did not match the target type.
    #[error("Decoding error: {0}")]
    Decode(#[from] DecodeError),
    /// No error has occurred.
    #[default]
    #[error("No error")]
    None,
}

impl NetworkError {
    /// Check if this is a transport failure.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Check if this is a decode failure.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }

    /// Check if this is the "no error" sentinel.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// The transport cause, if this is a transport failure.
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            Self::Transport(cause) => Some(cause),
            _ => None,
        }
    }

    /// The HTTP status that caused a transport failure, if any.
    pub fn status(&self) -> Option<u16> {
        self.transport().and_then(TransportError::status)
    }
}

/// Failure to assemble a client or transport.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The TLS configuration could not be built.
    #[error("TLS configuration error: {0}")]
    Tls(#[from] crate::tls::TlsError),
    /// The underlying HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// A specialized Result type for fetch operations.
pub type Result<T> = std::result::Result<T, NetworkError>;
