//! Content negotiation for response bodies.
//!
//! Two strategies are provided, both usable without a client:
//!
//! - [`from_header`] picks a decoder from the response's `Content-Type`.
//! - [`from_expectation`] decodes as the caller-declared [`ContentType`].
//!
//! ```ignore
//! use inflight_net::{decode, ContentData, FetchOptions, HttpClient, Transport};
//!
//! let response = HttpClient::new()
//!     .fetch("https://api.example.com/me", FetchOptions::new())
//!     .await?;
//! if let Some(ContentData::Json(me)) = decode::from_header(response).await? {
//!     println!("{}", me["name"]);
//! }
//! ```

use crate::content::{ContentData, ContentType};
use crate::error::{NetworkError, Result};
use crate::logging::targets;
use crate::transport::FetchResponse;

/// Decode a body according to the response's `Content-Type` header.
///
/// The header is lower-cased and matched by substring, first match wins:
/// `json`, then `blob`, then `text`. Returns `Ok(None)` when the header is
/// missing, unreadable or matches none of them. A missing or unreadable
/// header is logged at info level and is not an error.
///
/// Errors from reading the body are returned unchanged.
pub async fn from_header<R: FetchResponse>(response: R) -> Result<Option<ContentData>> {
    let Some(content_type) = response.header("content-type").map(str::to_ascii_lowercase) else {
        tracing::info!(
            target: targets::DECODE,
            status = response.status(),
            "Couldn't parse response data from Content-Type header"
        );
        return Ok(None);
    };

    let data = if content_type.contains("json") {
        Some(ContentData::Json(response.json().await?))
    } else if content_type.contains("blob") {
        Some(ContentData::Blob(response.blob().await?))
    } else if content_type.contains("text") {
        Some(ContentData::Text(response.text().await?))
    } else {
        tracing::debug!(target: targets::DECODE, %content_type, "no decoder for content type");
        None
    };
    Ok(data)
}

/// Decode a body as `expected`.
///
/// | expected             | decoded as              |
/// |----------------------|-------------------------|
/// | `Text`               | [`ContentData::Text`]   |
/// | `Blob`, `Image`      | [`ContentData::Blob`]   |
/// | `Json`, `Number`     | [`ContentData::Json`]   |
/// | `Other(tag)`         | error naming `tag`      |
///
/// # Errors
///
/// [`NetworkError::UnsupportedContentType`] for [`ContentType::Other`]; the
/// body is not read in that case. Errors from reading the body are returned
/// unchanged.
pub async fn from_expectation<R: FetchResponse>(
    expected: &ContentType,
    response: R,
) -> Result<ContentData> {
    tracing::trace!(target: targets::DECODE, %expected, "decoding by expectation");
    match expected {
        ContentType::Text => Ok(ContentData::Text(response.text().await?)),
        ContentType::Blob | ContentType::Image => Ok(ContentData::Blob(response.blob().await?)),
        ContentType::Json | ContentType::Number => Ok(ContentData::Json(response.json().await?)),
        ContentType::Other(tag) => Err(NetworkError::UnsupportedContentType(tag.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Blob;

    /// An in-memory response with an optional content type.
    struct StubResponse {
        content_type: Option<&'static str>,
        body: &'static str,
    }

    impl FetchResponse for StubResponse {
        fn status(&self) -> u16 {
            200
        }

        fn header(&self, name: &str) -> Option<&str> {
            if name.eq_ignore_ascii_case("content-type") {
                self.content_type
            } else {
                None
            }
        }

        async fn text(self) -> Result<String> {
            Ok(self.body.to_string())
        }

        async fn blob(self) -> Result<Blob> {
            Ok(Blob::new(self.body.as_bytes().to_vec(), self.content_type.map(String::from)))
        }

        async fn json(self) -> Result<serde_json::Value> {
            Ok(serde_json::from_str(self.body)?)
        }
    }

    fn stub(content_type: Option<&'static str>, body: &'static str) -> StubResponse {
        StubResponse { content_type, body }
    }

    #[tokio::test]
    async fn test_header_json_with_charset() {
        let data = from_header(stub(Some("Application/JSON; charset=utf-8"), r#"{"a":1}"#))
            .await
            .unwrap();
        assert_eq!(data, Some(ContentData::Json(serde_json::json!({"a": 1}))));
    }

    #[tokio::test]
    async fn test_header_priority_json_over_text() {
        let data = from_header(stub(Some("text/json"), "[1]")).await.unwrap();
        assert!(matches!(data, Some(ContentData::Json(_))));
    }

    #[tokio::test]
    async fn test_header_blob_and_text() {
        let blob = from_header(stub(Some("application/x-blob"), "raw")).await.unwrap();
        assert!(matches!(blob, Some(ContentData::Blob(ref b)) if b.len() == 3));

        let text = from_header(stub(Some("text/plain"), "hello")).await.unwrap();
        assert_eq!(text, Some(ContentData::Text("hello".to_string())));
    }

    #[tokio::test]
    async fn test_header_missing_is_none() {
        assert_eq!(from_header(stub(None, "ignored")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_header_unknown_is_none() {
        let data = from_header(stub(Some("image/png"), "png")).await.unwrap();
        assert_eq!(data, None);
    }

    #[tokio::test]
    async fn test_header_body_errors_propagate() {
        let err = from_header(stub(Some("application/json"), "{not json"))
            .await
            .unwrap_err();
        assert!(matches!(err, NetworkError::Json(_)));
    }

    #[tokio::test]
    async fn test_expectation_dispatch() {
        let text = from_expectation(&ContentType::Text, stub(None, "hello")).await.unwrap();
        assert_eq!(text.as_text(), Some("hello"));

        let image = from_expectation(&ContentType::Image, stub(None, "img")).await.unwrap();
        assert_eq!(image.as_blob().map(Blob::len), Some(3));

        let number = from_expectation(&ContentType::Number, stub(None, "42")).await.unwrap();
        assert_eq!(number.as_json(), Some(&serde_json::json!(42)));
    }

    #[tokio::test]
    async fn test_expectation_unknown_tag() {
        let err = from_expectation(&ContentType::from_tag("xml"), stub(None, "<a/>"))
            .await
            .unwrap_err();
        match err {
            NetworkError::UnsupportedContentType(tag) => assert_eq!(tag, "xml"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
