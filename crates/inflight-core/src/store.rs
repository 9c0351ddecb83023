//! Reactive stores built on [`Signal`].
//!
//! Two store types are provided:
//!
//! - [`Writable<T>`]: holds a value that can be read, replaced and updated.
//!   Every write is broadcast to subscribers.
//! - [`Readable<T>`]: a read-only value fed by a *start* function. The feed is
//!   started lazily when the first subscriber arrives and stopped when the
//!   last one leaves, so an unobserved store holds no upstream subscriptions.
//!
//! Both stores deliver the current value to a new subscriber immediately,
//! then every later update until its [`Subscription`] is dropped.
//!
//! # Example
//!
//! ```
//! use inflight_core::{Readable, Writable};
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//!
//! let items = Writable::new(Vec::<u32>::new());
//! let non_empty = Readable::derived(&items, |items| !items.is_empty());
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let seen_clone = seen.clone();
//! let sub = non_empty.subscribe(move |&v| seen_clone.lock().push(v));
//!
//! items.update(|items| items.push(1));
//! items.update(|items| items.push(2));
//! items.set(Vec::new());
//!
//! assert_eq!(*seen.lock(), vec![false, true, false]);
//! sub.unsubscribe();
//! assert!(!non_empty.is_started());
//! ```
//!
//! # Ordering
//!
//! Writes and notifications are serialized per store. A subscriber never
//! sees updates out of order, and a new subscriber cannot miss an update
//! that lands between its initial delivery and its registration.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, ReentrantMutex, RwLock};

use crate::logging::targets;
use crate::signal::Signal;

/// A live subscription to a store.
///
/// Dropping the subscription (or calling [`unsubscribe`](Self::unsubscribe))
/// stops delivery to its callback. Other subscribers are unaffected.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    fn new<F>(release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Stop receiving updates.
    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

struct WritableInner<T> {
    value: RwLock<T>,
    changed: Signal<T>,
    notify: ReentrantMutex<()>,
}

/// A writable reactive value.
///
/// `Writable<T>` is a cheap handle; clones share the same value and
/// subscribers.
pub struct Writable<T> {
    inner: Arc<WritableInner<T>>,
}

impl<T> Clone for Writable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Writable<T> {
    /// Create a store holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(WritableInner {
                value: RwLock::new(value),
                changed: Signal::new(),
                notify: ReentrantMutex::new(()),
            }),
        }
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> T {
        self.inner.value.read().clone()
    }

    /// Access the current value without cloning it.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.inner.value.read())
    }

    /// Replace the value and notify every subscriber.
    pub fn set(&self, value: T) {
        let _notify = self.inner.notify.lock();
        *self.inner.value.write() = value.clone();
        self.inner.changed.emit(value);
    }

    /// Mutate the value in place and notify every subscriber.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut T),
    {
        let _notify = self.inner.notify.lock();
        let value = {
            let mut current = self.inner.value.write();
            f(&mut current);
            current.clone()
        };
        self.inner.changed.emit(value);
    }

    /// Subscribe to the value.
    ///
    /// `f` is called immediately with the current value and then after
    /// every write.
    pub fn subscribe<F>(&self, f: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let _notify = self.inner.notify.lock();
        let current = self.inner.value.read().clone();
        f(&current);
        let id = self.inner.changed.connect(f);
        tracing::trace!(
            target: targets::STORE,
            subscribers = self.inner.changed.connection_count(),
            "writable subscribed"
        );

        let weak = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.changed.disconnect(id);
            }
        })
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.changed.connection_count()
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> Writable<T> {
    /// Replace the value only if it differs, returning whether it changed.
    ///
    /// Subscribers are notified only on change.
    pub fn set_if_changed(&self, value: T) -> bool {
        let _notify = self.inner.notify.lock();
        {
            let mut current = self.inner.value.write();
            if *current == value {
                return false;
            }
            *current = value.clone();
        }
        self.inner.changed.emit(value);
        true
    }
}

impl<T: Clone + Default + Send + Sync + 'static> Default for Writable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Writable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Writable")
            .field("value", &*self.inner.value.read())
            .field("subscribers", &self.inner.changed.connection_count())
            .finish()
    }
}

/// Returned by a [`Readable`] start function; run when the feed stops.
#[must_use = "dropping a StopHandle does not stop the feed; return it from the start function"]
pub struct StopHandle {
    stop: Option<Box<dyn FnOnce() + Send>>,
}

impl StopHandle {
    /// Create a stop handle from a closure.
    pub fn new<F>(stop: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            stop: Some(Box::new(stop)),
        }
    }

    /// A stop handle that does nothing.
    pub fn noop() -> Self {
        Self { stop: None }
    }

    fn run(mut self) {
        if let Some(stop) = self.stop.take() {
            stop();
        }
    }
}

impl From<Subscription> for StopHandle {
    fn from(subscription: Subscription) -> Self {
        Self::new(move || subscription.unsubscribe())
    }
}

/// Write access handed to a [`Readable`] start function.
pub struct Setter<T> {
    store: Weak<ReadableInner<T>>,
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> Setter<T> {
    /// Publish a new value. Subscribers are notified only if it changed.
    ///
    /// Does nothing once the store has been dropped.
    pub fn set(&self, value: T) {
        if let Some(store) = self.store.upgrade() {
            store.publish(value);
        }
    }
}

type StartFn<T> = Box<dyn Fn(Setter<T>) -> StopHandle + Send + Sync>;

#[derive(Default)]
struct Lifecycle {
    subscribers: usize,
    stop: Option<StopHandle>,
}

struct ReadableInner<T> {
    value: RwLock<T>,
    changed: Signal<T>,
    notify: ReentrantMutex<()>,
    start: StartFn<T>,
    lifecycle: Mutex<Lifecycle>,
}

impl<T: Clone + PartialEq + Send + Sync + 'static> ReadableInner<T> {
    fn publish(&self, value: T) {
        let _notify = self.notify.lock();
        {
            let mut current = self.value.write();
            if *current == value {
                return;
            }
            *current = value.clone();
        }
        self.changed.emit(value);
    }
}

/// A read-only reactive value with a lazily started feed.
///
/// Cheap to clone; clones share the same value, subscribers and feed.
pub struct Readable<T> {
    inner: Arc<ReadableInner<T>>,
}

impl<T> Clone for Readable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> Readable<T> {
    /// Create a readable store.
    ///
    /// `start` runs when the first subscriber arrives and receives a
    /// [`Setter`] for publishing values. The [`StopHandle`] it returns runs
    /// when the last subscriber leaves. A later subscriber starts the feed
    /// again.
    pub fn new<F>(initial: T, start: F) -> Self
    where
        F: Fn(Setter<T>) -> StopHandle + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(ReadableInner {
                value: RwLock::new(initial),
                changed: Signal::new(),
                notify: ReentrantMutex::new(()),
                start: Box::new(start),
                lifecycle: Mutex::new(Lifecycle::default()),
            }),
        }
    }

    /// Derive a readable from a writable through `map`.
    ///
    /// While observed, the derived store holds one subscription to `source`
    /// and recomputes on every write to it.
    pub fn derived<S, M>(source: &Writable<S>, map: M) -> Self
    where
        S: Clone + Send + Sync + 'static,
        M: Fn(&S) -> T + Send + Sync + 'static,
    {
        let initial = source.with(&map);
        let source = source.clone();
        let map = Arc::new(map);
        Self::new(initial, move |set| {
            let map = map.clone();
            source.subscribe(move |value| set.set(map(value))).into()
        })
    }

    /// Subscribe to the value.
    ///
    /// Starts the feed if this is the first subscriber, then calls `f` with
    /// the current value and after every change.
    pub fn subscribe<F>(&self, f: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let first = {
            let mut lifecycle = self.inner.lifecycle.lock();
            lifecycle.subscribers += 1;
            lifecycle.subscribers == 1
        };
        // `start` may take the source's notify lock, so it runs with the
        // lifecycle lock released. This subscriber's count is held until the
        // stop handle is stored, so no unsubscribe can observe zero first.
        if first {
            tracing::trace!(target: targets::STORE, "starting readable feed");
            let setter = Setter {
                store: Arc::downgrade(&self.inner),
            };
            let stop = (self.inner.start)(setter);
            self.inner.lifecycle.lock().stop = Some(stop);
        }

        let id = {
            let _notify = self.inner.notify.lock();
            let current = self.inner.value.read().clone();
            f(&current);
            self.inner.changed.connect(f)
        };

        let weak = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.changed.disconnect(id);
            let stop = {
                let mut lifecycle = inner.lifecycle.lock();
                lifecycle.subscribers = lifecycle.subscribers.saturating_sub(1);
                if lifecycle.subscribers == 0 {
                    lifecycle.stop.take()
                } else {
                    None
                }
            };
            if let Some(stop) = stop {
                tracing::trace!(target: targets::STORE, "stopping readable feed");
                stop.run();
            }
        })
    }

    /// Read the current value.
    ///
    /// With no subscribers the feed is started for the duration of the read,
    /// so the value is never stale.
    pub fn get(&self) -> T {
        let _reading = self.subscribe(|_| {});
        self.inner.value.read().clone()
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.lifecycle.lock().subscribers
    }

    /// Whether the feed is currently running.
    pub fn is_started(&self) -> bool {
        self.inner.lifecycle.lock().stop.is_some()
    }
}

impl<T: fmt::Debug> fmt::Debug for Readable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Readable")
            .field("value", &*self.inner.value.read())
            .field("subscribers", &self.inner.lifecycle.lock().subscribers)
            .finish()
    }
}

static_assertions::assert_impl_all!(Writable<Vec<u32>>: Send, Sync, Clone);
static_assertions::assert_impl_all!(Readable<bool>: Send, Sync, Clone);
static_assertions::assert_impl_all!(Subscription: Send);
