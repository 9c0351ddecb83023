//! reqwest-backed HTTP transport.
//!
//! [`HttpClient`] is the transport [`FetchClient`](crate::FetchClient) uses by
//! default. Requests go through the client so they are tracked; configure
//! the transport and hand it over:
//!
//! ```ignore
//! use std::time::Duration;
//! use inflight_net::{FetchClient, Fetched, HttpClient};
//!
//! let http = HttpClient::builder().timeout(Duration::from_secs(5)).build()?;
//! let client = FetchClient::builder(http).build();
//!
//! if let Fetched::Raw(response) = client.get("https://api.example.com/users").await? {
//!     println!("Status: {}", response.status());
//!     println!("Body: {}", response.text().await?);
//! }
//! ```

mod client;
mod request;
mod response;

pub use client::{HttpClient, HttpClientBuilder, HttpClientConfig};
pub use request::{FetchOptions, HttpMethod, RequestBody};
pub use response::HttpResponse;
