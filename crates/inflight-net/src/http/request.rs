//! Request methods, bodies and per-call options.

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;

use crate::logging::targets;

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
    /// The method name as sent on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }

    /// Convert to reqwest method.
    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
            Self::Patch => reqwest::Method::PATCH,
            Self::Head => reqwest::Method::HEAD,
            Self::Options => reqwest::Method::OPTIONS,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The body of an HTTP request.
#[derive(Clone, Debug, Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    None,
    /// Plain text body.
    Text(String),
    /// JSON body (serialized from a value).
    Json(serde_json::Value),
    /// URL-encoded form data.
    Form(HashMap<String, String>),
    /// Raw binary body.
    Bytes(Bytes),
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for RequestBody {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<serde_json::Value> for RequestBody {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl From<Bytes> for RequestBody {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(bytes))
    }
}

/// Per-call options handed to a transport together with the URL.
///
/// The chaining helpers consume and return `self`:
///
/// ```
/// use std::time::Duration;
/// use inflight_net::http::{FetchOptions, HttpMethod};
///
/// let options = FetchOptions::new()
///     .method(HttpMethod::Get)
///     .header("Accept", "application/json")
///     .query("page", "2")
///     .timeout(Duration::from_secs(5));
///
/// assert_eq!(options.query.len(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct FetchOptions {
    /// The HTTP method.
    pub method: HttpMethod,
    /// Request headers.
    pub headers: http::HeaderMap,
    /// Query parameters.
    pub query: Vec<(String, String)>,
    /// Request body.
    pub body: RequestBody,
    /// Request timeout override.
    pub timeout: Option<Duration>,
}

impl FetchOptions {
    /// Options for a plain GET with no headers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the method.
    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// Add a header. Invalid names or values are dropped with a warning.
    pub fn header(
        mut self,
        name: impl TryInto<http::HeaderName>,
        value: impl TryInto<http::HeaderValue>,
    ) -> Self {
        match (name.try_into(), value.try_into()) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => {
                tracing::warn!(target: targets::HTTP, "Ignoring invalid request header");
            }
        }
        self
    }

    /// Add multiple headers.
    pub fn headers(mut self, headers: http::HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Add a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set the body.
    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a JSON body from a serializable value.
    pub fn json<T: Serialize>(mut self, body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => self.body = RequestBody::Json(value),
            Err(e) => {
                tracing::error!(target: targets::HTTP, "Failed to serialize JSON body: {}", e);
            }
        }
        self
    }

    /// Set a timeout for this specific request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_names() {
        assert_eq!(HttpMethod::Get.to_string(), "GET");
        assert_eq!(HttpMethod::Delete.as_str(), "DELETE");
        assert_eq!(HttpMethod::default(), HttpMethod::Get);
        assert_eq!(HttpMethod::Patch.to_reqwest(), reqwest::Method::PATCH);
    }

    #[test]
    fn test_fetch_options_chain() {
        let options = FetchOptions::new()
            .method(HttpMethod::Post)
            .header("X-Trace", "abc")
            .query("a", "1")
            .query("b", "2")
            .body("payload")
            .timeout(Duration::from_millis(250));

        assert_eq!(options.method, HttpMethod::Post);
        assert_eq!(options.headers.get("x-trace").unwrap(), "abc");
        assert_eq!(options.query.len(), 2);
        assert!(matches!(options.body, RequestBody::Text(ref t) if t == "payload"));
        assert_eq!(options.timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_invalid_header_is_dropped() {
        let options = FetchOptions::new().header("bad header", "value");
        assert!(options.headers.is_empty());
    }

    #[test]
    fn test_json_body() {
        let options = FetchOptions::new().json(&serde_json::json!({"name": "test"}));
        match options.body {
            RequestBody::Json(value) => assert_eq!(value["name"], "test"),
            other => panic!("expected JSON body, got {other:?}"),
        }
    }

    #[test]
    fn test_body_conversions() {
        assert!(matches!(RequestBody::from(vec![1u8, 2]), RequestBody::Bytes(_)));
        assert!(matches!(RequestBody::from(String::from("x")), RequestBody::Text(_)));
        assert!(matches!(
            RequestBody::from(serde_json::json!(1)),
            RequestBody::Json(_)
        ));
    }
}
