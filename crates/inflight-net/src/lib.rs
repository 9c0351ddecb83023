//! Request-tracking HTTP client for Inflight.
//!
//! This crate wraps an HTTP transport with a live registry of in-flight
//! requests:
//!
//! - **FetchClient**: issues requests, registers them while in flight and
//!   optionally decodes the body as an expected content type
//! - **Registry**: the in-flight records and their reactive projections
//!   (`all`, `has_any`, `has_blocking`, `has_background`)
//! - **Decoding**: header-driven and expectation-driven body decoding,
//!   usable without a client
//! - **HTTP Client**: the reqwest-backed default transport
//!
//! # Tracking requests
//!
//! ```ignore
//! use inflight_net::{has_blocking, ContentType, FetchClient};
//!
//! // Show a spinner while anything blocking is in flight.
//! let _spinner = has_blocking().subscribe(|busy| set_spinner_visible(*busy));
//!
//! let client = FetchClient::new();
//! let profile = client
//!     .blocking()
//!     .expect(ContentType::Json)
//!     .get("https://api.example.com/profile")
//!     .await?;
//! ```
//!
//! ## Priorities
//!
//! - `blocking()` - the user waits on this request; counted by `has_blocking`
//! - `background()` - low priority; counted by `has_background`
//! - neither - normal priority; counted by `has_any`
//!
//! Modifiers apply to the next request only.
//!
//! # Decoding
//!
//! ```ignore
//! use inflight_net::{decode, FetchClient, Fetched};
//!
//! let client = FetchClient::new();
//! if let Fetched::Raw(response) = client.get("https://api.example.com/data").await? {
//!     match decode::from_header(response).await? {
//!         Some(data) => println!("{data:?}"),
//!         None => println!("no usable content type"),
//!     }
//! }
//! ```
//!
//! # Custom transports
//!
//! Anything implementing [`Transport`] can stand in for [`HttpClient`]:
//!
//! ```ignore
//! let client = FetchClient::builder(MyTransport::new())
//!     .registry(Registry::new())
//!     .build();
//! ```
//!
//! ## Configuration
//!
//! ```ignore
//! let http = HttpClient::builder()
//!     .timeout(Duration::from_secs(60))
//!     .user_agent("MyApp/1.0")
//!     .no_cookies()
//!     .build()?;
//! let client = FetchClient::builder(http).build();
//! ```

use inflight_core::logging;

mod client;
pub mod content;
pub mod decode;
mod error;
pub mod http;
pub mod pending;
pub mod registry;
pub mod transport;

pub use client::{FetchClient, FetchClientBuilder, Fetched};
pub use content::{Blob, ContentData, ContentType};
pub use error::{NetworkError, Result};
pub use pending::PendingConfig;
pub use registry::{
    OngoingCounts, Priority, Registry, RequestHandle, RequestId, RequestIdGenerator, RequestMeta,
    RequestRecord, has_any, has_background, has_blocking, ongoing_requests,
};
pub use transport::{FetchResponse, Transport};

// Re-export commonly used types at the crate root
pub use http::{
    FetchOptions, HttpClient, HttpClientBuilder, HttpClientConfig, HttpMethod, HttpResponse,
    RequestBody,
};
