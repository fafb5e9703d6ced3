//! Request description.

use bytes::Bytes;
use serde::Serialize;

use crate::error::TransportError;

/// HTTP request methods.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// HTTP GET method.
    #[default]
    Get,
    /// HTTP POST method.
    Post,
    /// HTTP PUT method.
    Put,
    /// HTTP DELETE method.
    Delete,
    /// HTTP PATCH method.
    Patch,
    /// HTTP HEAD method.
    Head,
    /// HTTP OPTIONS method.
    Options,
}

impl HttpMethod {
    /// Convert to an `http` method.
    pub fn to_http(self) -> http::Method {
        match self {
            Self::Get => http::Method::GET,
            Self::Post => http::Method::POST,
            Self::Put => http::Method::PUT,
            Self::Delete => http::Method::DELETE,
            Self::Patch => http::Method::PATCH,
            Self::Head => http::Method::HEAD,
            Self::Options => http::Method::OPTIONS,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_http().as_str())
    }
}

/// An immutable description of one fetch.
///
/// The endpoint string is the cache key; method, headers and body are not
/// part of it.
///
/// # Example
///
/// ```
/// use cryptocoins_net::http::{HttpMethod, Request};
///
/// let request = Request::get("https://api.example.com/coins")
///     .header("Accept", "application/json");
/// assert_eq!(request.method(), HttpMethod::Get);
/// assert_eq!(request.headers().len(), 1);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    endpoint: String,
    method: HttpMethod,
    headers: Vec<(String, String)>,
    body: Option<Bytes>,
}

impl Request {
    /// Create a request with the given method and no headers or body.
    pub fn new(endpoint: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Create a GET request.
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(endpoint, HttpMethod::Get)
    }

    /// Create a POST request.
    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(endpoint, HttpMethod::Post)
    }

    /// Append a header. Later duplicates overwrite earlier ones when sent.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Append several headers in order.
    pub fn headers_from<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Attach a raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Attach a JSON body and set the content type.
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_vec(value)?;
        Ok(self.header("Content-Type", "application/json").body(body))
    }

    /// The endpoint URL string.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The HTTP method.
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Headers in insertion order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// The body, if any.
    pub fn body_bytes(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// The cache key for this request.
    pub fn cache_key(&self) -> &str {
        &self.endpoint
    }

    /// Build the outbound header map.
    ///
    /// Header names are case-insensitive; a later duplicate replaces every
    /// earlier value for the same name.
    pub(crate) fn header_map(&self) -> Result<http::HeaderMap, TransportError> {
        let mut map = http::HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let name = http::HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| TransportError::Request(format!("Invalid header name: {name}")))?;
            let value = http::HeaderValue::from_str(value).map_err(|_| {
                TransportError::Request(format!("Invalid value for header {name}"))
            })?;
            map.insert(name, value);
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_display() {
        assert_eq!(HttpMethod::Get.to_string(), "GET");
        assert_eq!(HttpMethod::Options.to_string(), "OPTIONS");
        assert_eq!(HttpMethod::Patch.to_http(), http::Method::PATCH);
    }

    #[test]
    fn test_later_header_overwrites_earlier() {
        let request = Request::get("https://example.com")
            .header("X-Token", "first")
            .header("Accept", "application/json")
            .header("x-token", "second");

        let map = request.header_map().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("X-Token").unwrap(), "second");
        assert_eq!(map.get_all("x-token").iter().count(), 1);
    }

    #[test]
    fn test_invalid_header_name() {
        let request = Request::get("https://example.com").header("bad header", "v");
        assert!(matches!(request.header_map(), Err(TransportError::Request(_))));
    }

    #[test]
    fn test_json_body_sets_content_type() {
        let request = Request::post("https://example.com")
            .json(&serde_json::json!({"symbol": "BTC"}))
            .unwrap();
        assert_eq!(request.body_bytes().unwrap().as_ref(), br#"{"symbol":"BTC"}"#);
        assert_eq!(request.headers()[0].0, "Content-Type");
    }

    #[test]
    fn test_cache_key_ignores_method_and_headers() {
        let a = Request::get("https://example.com/coins");
        let b = Request::post("https://example.com/coins").header("A", "b");
        assert_eq!(a.cache_key(), b.cache_key());
    }
}
