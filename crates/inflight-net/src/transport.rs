//! The transport seam between [`FetchClient`](crate::FetchClient) and the
//! network.
//!
//! A [`Transport`] turns a URL and [`FetchOptions`] into a response; a
//! [`FetchResponse`] exposes the headers and the body readers the decoders
//! need. [`HttpClient`] and [`HttpResponse`] are the reqwest-backed
//! implementations. Tests and embedders can supply their own.

use std::future::Future;

use crate::content::Blob;
use crate::error::Result;
use crate::http::{FetchOptions, HttpClient, HttpResponse};

/// Issues network requests.
pub trait Transport: Send + Sync + 'static {
    /// The response type produced when a request settles successfully.
    type Response: FetchResponse;

    /// Start a request. The returned future settles with the response or
    /// the transport failure.
    fn fetch(
        &self,
        url: &str,
        options: FetchOptions,
    ) -> impl Future<Output = Result<Self::Response>> + Send;
}

/// A settled response whose body has not been read yet.
///
/// The body readers consume the response, so each body is read once.
pub trait FetchResponse: Send + 'static {
    /// The HTTP status code.
    fn status(&self) -> u16;

    /// A header value, or `None` if it is absent or not readable as text.
    fn header(&self, name: &str) -> Option<&str>;

    /// Read the body as text.
    fn text(self) -> impl Future<Output = Result<String>> + Send;

    /// Read the body as raw bytes.
    fn blob(self) -> impl Future<Output = Result<Blob>> + Send;

    /// Parse the body as JSON.
    fn json(self) -> impl Future<Output = Result<serde_json::Value>> + Send;
}

impl Transport for HttpClient {
    type Response = HttpResponse;

    async fn fetch(&self, url: &str, options: FetchOptions) -> Result<HttpResponse> {
        self.execute(url, options).await
    }
}

impl FetchResponse for HttpResponse {
    fn status(&self) -> u16 {
        HttpResponse::status(self)
    }

    fn header(&self, name: &str) -> Option<&str> {
        HttpResponse::header(self, name)
    }

    async fn text(self) -> Result<String> {
        HttpResponse::text(self).await
    }

    async fn blob(self) -> Result<Blob> {
        let content_type = self.content_type().map(str::to_owned);
        let bytes = HttpResponse::bytes(self).await?;
        Ok(Blob::new(bytes, content_type))
    }

    async fn json(self) -> Result<serde_json::Value> {
        HttpResponse::json::<serde_json::Value>(self).await
    }
}
