//! Content types a caller can expect, and decoded response data.

use std::fmt;

use bytes::Bytes;

/// The content type a caller expects a response body to decode as.
///
/// Used with [`FetchClient::expect`](crate::FetchClient::expect) and
/// [`decode::from_expectation`](crate::decode::from_expectation).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// Decode the body as UTF-8 text.
    Text,
    /// Keep the body as raw bytes.
    Blob,
    /// An image; kept as raw bytes like [`ContentType::Blob`].
    Image,
    /// Parse the body as JSON.
    Json,
    /// A number; parsed as JSON, so `42` yields a JSON number.
    Number,
    /// A tag no decoder handles. Decoding it fails with
    /// [`NetworkError::UnsupportedContentType`](crate::NetworkError::UnsupportedContentType).
    Other(String),
}

impl ContentType {
    /// Map a tag to a content type, case-insensitively.
    ///
    /// `"string"` is accepted as an alias of `"text"`. Unknown tags are kept
    /// verbatim as [`ContentType::Other`].
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "text" | "string" => Self::Text,
            "blob" => Self::Blob,
            "image" => Self::Image,
            "json" => Self::Json,
            "number" => Self::Number,
            _ => Self::Other(tag.to_string()),
        }
    }

    /// The tag naming this content type.
    pub fn tag(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Blob => "blob",
            Self::Image => "image",
            Self::Json => "json",
            Self::Number => "number",
            Self::Other(tag) => tag,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl From<&str> for ContentType {
    fn from(tag: &str) -> Self {
        Self::from_tag(tag)
    }
}

impl From<String> for ContentType {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

/// A binary response body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    bytes: Bytes,
    content_type: Option<String>,
}

impl Blob {
    /// Create a blob from bytes and the response's content type, if any.
    pub fn new(bytes: impl Into<Bytes>, content_type: Option<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type,
        }
    }

    /// The raw bytes.
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// The content type reported by the response.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the blob is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Take the bytes.
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

/// A decoded response body.
#[derive(Clone, Debug, PartialEq)]
pub enum ContentData {
    /// Text body.
    Text(String),
    /// Binary body.
    Blob(Blob),
    /// Parsed JSON body.
    Json(serde_json::Value),
}

impl ContentData {
    /// The text, if this is a text body.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The JSON value, if this is a JSON body.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// The blob, if this is a binary body.
    pub fn as_blob(&self) -> Option<&Blob> {
        match self {
            Self::Blob(blob) => Some(blob),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tag_is_case_insensitive() {
        assert_eq!(ContentType::from_tag("JSON"), ContentType::Json);
        assert_eq!(ContentType::from_tag("String"), ContentType::Text);
        assert_eq!(ContentType::from_tag("text"), ContentType::Text);
        assert_eq!(ContentType::from("Image"), ContentType::Image);
        assert_eq!(ContentType::from("number".to_string()), ContentType::Number);
    }

    #[test]
    fn test_unknown_tag_is_kept_verbatim() {
        let ct = ContentType::from_tag("Xml");
        assert_eq!(ct, ContentType::Other("Xml".to_string()));
        assert_eq!(ct.to_string(), "Xml");
    }

    #[test]
    fn test_accessors() {
        let text = ContentData::Text("hi".to_string());
        assert_eq!(text.as_text(), Some("hi"));
        assert!(text.as_json().is_none());

        let blob = ContentData::Blob(Blob::new(vec![1u8, 2, 3], Some("image/png".into())));
        let inner = blob.as_blob().unwrap();
        assert_eq!(inner.len(), 3);
        assert_eq!(inner.content_type(), Some("image/png"));
        assert!(blob.as_text().is_none());
    }
}
