//! Request-tracking fetch client.
//!
//! [`FetchClient`] issues requests through a [`Transport`], records each one
//! in a [`Registry`] while it is in flight, and optionally decodes the body
//! as a caller-declared [`ContentType`].
//!
//! # Fluent configuration
//!
//! [`blocking`](FetchClient::blocking), [`background`](FetchClient::background)
//! and [`expect`](FetchClient::expect) configure only the *next* request:
//!
//! ```ignore
//! use inflight_net::{ContentType, FetchClient, Fetched};
//!
//! let client = FetchClient::new();
//!
//! // Blocking, decoded as JSON.
//! let user = client
//!     .blocking()
//!     .expect(ContentType::Json)
//!     .get("https://api.example.com/user")
//!     .await?;
//!
//! // Back to defaults: normal priority, raw response.
//! if let Fetched::Raw(response) = client.get("https://api.example.com/health").await? {
//!     println!("{}", response.status());
//! }
//! ```

use std::time::Instant;

use crate::content::{ContentData, ContentType};
use crate::decode;
use crate::error::{NetworkError, Result};
use crate::http::{FetchOptions, HttpClient, HttpMethod, RequestBody};
use crate::logging::targets;
use crate::pending::PendingConfig;
use crate::registry::{Registry, RequestHandle};
use crate::transport::Transport;

/// The outcome of a request.
#[derive(Debug)]
pub enum Fetched<R> {
    /// No content type was expected; the response is returned unread.
    Raw(R),
    /// The body decoded as the expected content type.
    Decoded(ContentData),
}

impl<R> Fetched<R> {
    /// The raw response, if the body was not decoded.
    pub fn into_raw(self) -> Option<R> {
        match self {
            Self::Raw(response) => Some(response),
            Self::Decoded(_) => None,
        }
    }

    /// The decoded body, if one was expected.
    pub fn into_decoded(self) -> Option<ContentData> {
        match self {
            Self::Raw(_) => None,
            Self::Decoded(data) => Some(data),
        }
    }

    pub fn is_decoded(&self) -> bool {
        matches!(self, Self::Decoded(_))
    }
}

/// Deregisters a request when dropped.
///
/// Dropped after the transport future settles, or with the request future
/// if the caller abandons it, so a record never outlives its operation.
struct Deregister {
    registry: Registry,
    handle: RequestHandle,
    started: Instant,
}

impl Deregister {
    fn settled(self, ok: bool) {
        tracing::debug!(
            target: targets::CLIENT,
            id = %self.handle.id(),
            elapsed = ?self.started.elapsed(),
            ok,
            "request settled"
        );
    }
}

impl Drop for Deregister {
    fn drop(&mut self) {
        if self.handle.mark_settled() {
            self.registry.remove_handle(&self.handle);
        }
    }
}

/// Builder for a [`FetchClient`] with an explicit transport or registry.
///
/// Request ids come from the registry, so clients sharing a registry share
/// one id sequence.
///
/// # Example
///
/// ```
/// use inflight_net::{FetchClient, HttpClient, Registry, RequestIdGenerator};
///
/// let registry = Registry::with_id_generator(RequestIdGenerator::starting_at(1));
/// let client = FetchClient::builder(HttpClient::new())
///     .registry(registry.clone())
///     .build();
/// assert!(client.registry().is_empty());
/// ```
pub struct FetchClientBuilder<T> {
    transport: T,
    registry: Registry,
}

impl<T: Transport> FetchClientBuilder<T> {
    /// Start from `transport` and the global registry.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            registry: Registry::global().clone(),
        }
    }

    /// Replace the transport.
    pub fn transport<U: Transport>(self, transport: U) -> FetchClientBuilder<U> {
        FetchClientBuilder {
            transport,
            registry: self.registry,
        }
    }

    /// Record requests in `registry` instead of the global one.
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    pub fn build(self) -> FetchClient<T> {
        FetchClient {
            transport: self.transport,
            registry: self.registry,
            pending: PendingConfig::new(),
        }
    }
}

/// An HTTP client that tracks its in-flight requests.
///
/// Every request is inserted into the client's [`Registry`] before the
/// transport is polled and removed exactly once when it settles, whether
/// it succeeded, failed, or was dropped by the caller.
///
/// The fluent modifiers write to a per-client pending slot that the next
/// request consumes. Issuing requests from several tasks through one client
/// while also using the modifiers races on that slot; see [`PendingConfig`].
pub struct FetchClient<T: Transport = HttpClient> {
    transport: T,
    registry: Registry,
    pending: PendingConfig,
}

impl FetchClient<HttpClient> {
    /// A client with a default [`HttpClient`] and the global registry.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created; see [`HttpClient::new`].
    /// [`FetchClient::try_new`] returns the error instead.
    pub fn new() -> Self {
        FetchClientBuilder::new(HttpClient::new()).build()
    }

    /// Like [`FetchClient::new`], returning an error if the HTTP client
    /// cannot be created.
    pub fn try_new() -> Result<Self> {
        Ok(FetchClientBuilder::new(HttpClient::builder().build()?).build())
    }
}

impl Default for FetchClient<HttpClient> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> FetchClient<T> {
    /// A builder around `transport`.
    pub fn builder(transport: T) -> FetchClientBuilder<T> {
        FetchClientBuilder::new(transport)
    }

    /// Issue a request and wait for it to settle.
    ///
    /// Consumes the pending fluent configuration. With an expected content
    /// type the body is decoded through
    /// [`decode::from_expectation`](crate::decode::from_expectation);
    /// otherwise the raw response is returned.
    ///
    /// # Errors
    ///
    /// Transport and decoding errors are returned unchanged. The request is
    /// deregistered either way.
    pub async fn request(&self, url: &str, options: FetchOptions) -> Result<Fetched<T::Response>> {
        let meta = self.pending.take_and_clear();
        let method = options.method;
        let expected = meta.expected.clone();
        let priority = meta.priority();

        let fetch = self.transport.fetch(url, options);
        let record = self.registry.register(method, url, meta);
        let guard = Deregister {
            registry: self.registry.clone(),
            handle: record.handle().clone(),
            started: record.started_at(),
        };
        tracing::debug!(
            target: targets::CLIENT,
            id = %record.id(),
            %method,
            url,
            %priority,
            "issuing request"
        );

        let outcome = fetch.await;
        guard.settled(outcome.is_ok());
        let response = outcome?;

        match expected {
            Some(expected) => decode::from_expectation(&expected, response)
                .await
                .map(Fetched::Decoded),
            None => Ok(Fetched::Raw(response)),
        }
    }

    /// GET `url` with default options.
    pub async fn get(&self, url: &str) -> Result<Fetched<T::Response>> {
        self.get_with(url, FetchOptions::default()).await
    }

    /// GET `url`. Any method set in `options` is replaced by GET.
    pub async fn get_with(&self, url: &str, options: FetchOptions) -> Result<Fetched<T::Response>> {
        self.request(url, options.method(HttpMethod::Get)).await
    }

    /// Not implemented yet; always fails with
    /// [`NetworkError::NotImplemented`] without touching the network.
    ///
    /// The pending fluent configuration is discarded.
    pub fn post(
        &self,
        url: &str,
        _body: impl Into<RequestBody>,
        _options: FetchOptions,
    ) -> Result<Fetched<T::Response>> {
        self.not_implemented(HttpMethod::Post, url)
    }

    /// Not implemented yet; always fails with
    /// [`NetworkError::NotImplemented`] without touching the network.
    ///
    /// The pending fluent configuration is discarded.
    pub fn put(
        &self,
        url: &str,
        _body: impl Into<RequestBody>,
        _options: FetchOptions,
    ) -> Result<Fetched<T::Response>> {
        self.not_implemented(HttpMethod::Put, url)
    }

    /// Not implemented yet; always fails with
    /// [`NetworkError::NotImplemented`] without touching the network.
    ///
    /// The pending fluent configuration is discarded.
    pub fn destroy(&self, url: &str, _options: FetchOptions) -> Result<Fetched<T::Response>> {
        self.not_implemented(HttpMethod::Delete, url)
    }

    fn not_implemented(&self, method: HttpMethod, url: &str) -> Result<Fetched<T::Response>> {
        let discarded = self.pending.take_and_clear();
        tracing::debug!(
            target: targets::CLIENT,
            %method,
            url,
            priority = %discarded.priority(),
            "method not implemented"
        );
        Err(NetworkError::NotImplemented { method })
    }

    /// Mark the next request as blocking.
    pub fn blocking(&self) -> &Self {
        self.pending.merge(|meta| meta.is_blocking = true);
        self
    }

    /// Mark the next request as a background request.
    pub fn background(&self) -> &Self {
        self.pending.merge(|meta| meta.is_background = true);
        self
    }

    /// Decode the next response as `content_type`.
    pub fn expect(&self, content_type: impl Into<ContentType>) -> &Self {
        let content_type = content_type.into();
        self.pending.merge(|meta| meta.expected = Some(content_type));
        self
    }

    /// The registry this client records requests in.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The configuration waiting for the next request.
    pub fn pending(&self) -> &PendingConfig {
        &self.pending
    }
}

impl<T: Transport + std::fmt::Debug> std::fmt::Debug for FetchClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchClient")
            .field("transport", &self.transport)
            .field("registry", &self.registry)
            .field("pending", &self.pending.peek())
            .finish()
    }
}
