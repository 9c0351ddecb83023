//! Reactive primitives for Inflight.
//!
//! This crate provides the building blocks the request registry in
//! `inflight-net` is made of:
//!
//! - **Signals**: multi-subscriber broadcast with explicit disconnection
//! - **Writable stores**: shared values that broadcast every write
//! - **Readable stores**: read-only values with a lazily started feed,
//!   typically derived from a writable
//! - **Subscriptions**: RAII guards that unsubscribe on drop
//!
//! # Signal Example
//!
//! ```
//! use inflight_core::Signal;
//!
//! let settled = Signal::<u64>::new();
//!
//! let conn_id = settled.connect(|id| {
//!     println!("request {} settled", id);
//! });
//!
//! settled.emit(1);
//! settled.disconnect(conn_id);
//! ```
//!
//! # Store Example
//!
//! ```
//! use inflight_core::{Readable, Writable};
//!
//! let pending = Writable::new(0u32);
//! let busy = Readable::derived(&pending, |&n| n > 0);
//!
//! let _sub = busy.subscribe(|busy| println!("busy: {}", busy));
//! pending.update(|n| *n += 1);
//! pending.update(|n| *n -= 1);
//! ```

pub mod logging;
pub mod signal;
pub mod store;

pub use signal::{ConnectionGuard, ConnectionId, Signal};
pub use store::{Readable, Setter, StopHandle, Subscription, Writable};
