//! Logging facilities for Inflight.
//!
//! Inflight uses the `tracing` crate for instrumentation and never installs a
//! subscriber itself. To see logs, install one in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("inflight_net=debug")
//!         .init();
//! }
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Signal emission.
    pub const SIGNAL: &str = "inflight_core::signal";
    /// Store subscriptions and feed start/stop.
    pub const STORE: &str = "inflight_core::store";
    /// reqwest-backed transport.
    pub const HTTP: &str = "inflight_net::http";
    /// Ongoing-request registry mutations.
    pub const REGISTRY: &str = "inflight_net::registry";
    /// Request lifecycle in the fetch client.
    pub const CLIENT: &str = "inflight_net::client";
    /// Response content decoding.
    pub const DECODE: &str = "inflight_net::decode";
}
