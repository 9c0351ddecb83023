//! The registry of in-flight requests.
//!
//! Every request issued by a [`FetchClient`](crate::FetchClient) is recorded
//! here from the moment it is issued until it settles. Consumers observe the
//! registry only through read-only projections:
//!
//! - [`Registry::all`]: the ordered list of in-flight records.
//! - [`Registry::has_any`]: whether a *normal priority* request is in flight.
//!   Blocking and background requests do not count.
//! - [`Registry::has_blocking`]: whether a blocking request is in flight.
//! - [`Registry::has_background`]: whether a background request is in flight.
//!
//! Each projection is a [`Readable`]: it delivers its current value on
//! subscribe and is only wired to the registry while it has subscribers.
//!
//! # Example
//!
//! ```
//! use inflight_net::registry::{Registry, RequestMeta};
//! use inflight_net::HttpMethod;
//!
//! let registry = Registry::new();
//! let _busy = registry.has_blocking().subscribe(|busy| println!("busy: {busy}"));
//!
//! let meta = RequestMeta { is_blocking: true, ..Default::default() };
//! let record = registry.register(HttpMethod::Get, "https://example.com", meta);
//! assert!(registry.has_blocking().get());
//!
//! registry.remove(record.id());
//! assert!(registry.is_empty());
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use inflight_core::{Readable, Writable};

use crate::content::ContentType;
use crate::http::HttpMethod;
use crate::logging::targets;

/// Identifies one issued request for the lifetime of the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    /// The raw id.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out monotonically increasing [`RequestId`]s.
///
/// Clones share one counter. Each [`Registry`] draws its ids from one
/// generator; the global registry uses [`RequestIdGenerator::global`].
#[derive(Clone, Debug, Default)]
pub struct RequestIdGenerator {
    next: Arc<AtomicU64>,
}

impl RequestIdGenerator {
    /// A generator starting at 0.
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// A generator whose first id is `first`.
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: Arc::new(AtomicU64::new(first)),
        }
    }

    /// The process-wide generator.
    pub fn global() -> &'static RequestIdGenerator {
        static GLOBAL: OnceLock<RequestIdGenerator> = OnceLock::new();
        GLOBAL.get_or_init(RequestIdGenerator::new)
    }

    /// Allocate the next id.
    pub fn next_id(&self) -> RequestId {
        RequestId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// Priority class of a request, derived from its [`RequestMeta`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Priority {
    /// Neither blocking nor background. Counted by [`Registry::has_any`].
    Normal,
    /// Needs the user's attention.
    Blocking,
    /// Low priority, never blocks the user.
    Background,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Normal => "normal",
            Self::Blocking => "blocking",
            Self::Background => "background",
        })
    }
}

/// Classification attached to a request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestMeta {
    /// The request blocks the user.
    pub is_blocking: bool,
    /// The request runs in the background.
    pub is_background: bool,
    /// Decode the body as this type instead of returning the raw response.
    pub expected: Option<ContentType>,
}

impl RequestMeta {
    /// The priority class. Blocking wins if both flags are set.
    pub fn priority(&self) -> Priority {
        if self.is_blocking {
            Priority::Blocking
        } else if self.is_background {
            Priority::Background
        } else {
            Priority::Normal
        }
    }

    fn is_normal(&self) -> bool {
        !self.is_blocking && !self.is_background
    }
}

/// The registry's view of an in-flight operation.
///
/// The client awaits the operation itself; the handle only reports whether
/// it has settled. Clones share the settled flag.
#[derive(Clone, Debug)]
pub struct RequestHandle {
    id: RequestId,
    settled: Arc<AtomicBool>,
}

impl RequestHandle {
    /// A handle for a request that has not settled yet.
    pub fn new(id: RequestId) -> Self {
        Self {
            id,
            settled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The request this handle tracks.
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Whether the operation is still running.
    pub fn is_pending(&self) -> bool {
        !self.settled.load(Ordering::Acquire)
    }

    /// Mark the operation settled. Returns `false` if it already was.
    pub(crate) fn mark_settled(&self) -> bool {
        !self.settled.swap(true, Ordering::AcqRel)
    }

    /// Whether both handles track the same operation, not just the same id.
    pub(crate) fn same_as(&self, other: &RequestHandle) -> bool {
        Arc::ptr_eq(&self.settled, &other.settled)
    }
}

/// One in-flight request.
#[derive(Clone, Debug)]
pub struct RequestRecord {
    id: RequestId,
    method: HttpMethod,
    url: String,
    meta: RequestMeta,
    handle: RequestHandle,
    started_at: Instant,
}

impl RequestRecord {
    /// Create a record with a fresh handle.
    pub fn new(
        id: RequestId,
        method: HttpMethod,
        url: impl Into<String>,
        meta: RequestMeta,
    ) -> Self {
        Self::with_handle(RequestHandle::new(id), method, url, meta)
    }

    /// Create a record tracking an existing handle.
    pub fn with_handle(
        handle: RequestHandle,
        method: HttpMethod,
        url: impl Into<String>,
        meta: RequestMeta,
    ) -> Self {
        Self {
            id: handle.id(),
            method,
            url: url.into(),
            meta,
            handle,
            started_at: Instant::now(),
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn meta(&self) -> &RequestMeta {
        &self.meta
    }

    pub fn handle(&self) -> &RequestHandle {
        &self.handle
    }

    /// When the request was issued.
    pub fn started_at(&self) -> Instant {
        self.started_at
    }
}

/// Ids are unique while a record is registered, so they identify it.
impl PartialEq for RequestRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for RequestRecord {}

/// In-flight request counts per priority class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OngoingCounts {
    /// Requests neither blocking nor background.
    pub normal: usize,
    /// Requests with `is_blocking` set.
    pub blocking: usize,
    /// Requests with `is_background` set.
    pub background: usize,
}

impl OngoingCounts {
    fn of(records: &[RequestRecord]) -> Self {
        records.iter().fold(Self::default(), |mut counts, record| {
            let meta = record.meta();
            if meta.is_normal() {
                counts.normal += 1;
            }
            if meta.is_blocking {
                counts.blocking += 1;
            }
            if meta.is_background {
                counts.background += 1;
            }
            counts
        })
    }
}

struct RegistryInner {
    ids: RequestIdGenerator,
    records: Writable<Vec<RequestRecord>>,
    all: Readable<Vec<RequestRecord>>,
    has_any: Readable<bool>,
    has_blocking: Readable<bool>,
    has_background: Readable<bool>,
}

/// The set of in-flight requests and its reactive projections.
///
/// Cheap to clone; clones share the same records and id sequence. Records
/// are appended in issue order and may be removed from any position.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// An empty registry with its own id sequence starting at 0.
    pub fn new() -> Self {
        Self::with_id_generator(RequestIdGenerator::new())
    }

    /// An empty registry drawing ids from `ids`.
    pub fn with_id_generator(ids: RequestIdGenerator) -> Self {
        let records = Writable::new(Vec::<RequestRecord>::new());
        let all = Readable::derived(&records, |records: &Vec<RequestRecord>| records.clone());
        let has_any = Readable::derived(&records, |records: &Vec<RequestRecord>| {
            records.iter().any(|r| r.meta().is_normal())
        });
        let has_blocking = Readable::derived(&records, |records: &Vec<RequestRecord>| {
            records.iter().any(|r| r.meta().is_blocking)
        });
        let has_background = Readable::derived(&records, |records: &Vec<RequestRecord>| {
            records.iter().any(|r| r.meta().is_background)
        });

        Self {
            inner: Arc::new(RegistryInner {
                ids,
                records,
                all,
                has_any,
                has_blocking,
                has_background,
            }),
        }
    }

    /// The process-wide registry used by [`FetchClient::new`](crate::FetchClient::new).
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(|| Registry::with_id_generator(RequestIdGenerator::global().clone()))
    }

    /// Allocate an id from this registry's sequence and register a record
    /// for it. Returns the registered record.
    ///
    /// Ids taken by records added through [`insert`](Self::insert) are
    /// skipped.
    pub fn register(
        &self,
        method: HttpMethod,
        url: impl Into<String>,
        meta: RequestMeta,
    ) -> RequestRecord {
        let url = url.into();
        loop {
            let id = self.inner.ids.next_id();
            let record = RequestRecord::new(id, method, url.clone(), meta.clone());
            if self.insert(record.clone()) {
                return record;
            }
        }
    }

    /// Append a record.
    ///
    /// Returns `false` and leaves the registry unchanged if a record with
    /// the same id is already registered.
    pub fn insert(&self, record: RequestRecord) -> bool {
        let id = record.id();
        let mut inserted = false;
        let mut len = 0;
        self.inner.records.update(|records| {
            if !records.iter().any(|r| r.id() == id) {
                records.push(record);
                inserted = true;
            }
            len = records.len();
        });

        if inserted {
            tracing::trace!(target: targets::REGISTRY, %id, len, "request registered");
        } else {
            tracing::warn!(target: targets::REGISTRY, %id, "request already registered");
        }
        inserted
    }

    /// Remove the record with `id`, wherever it sits.
    ///
    /// Removing an id that is not registered changes nothing, returns
    /// `false` and logs a warning: it means a request was deregistered
    /// twice or never registered.
    pub fn remove(&self, id: RequestId) -> bool {
        self.remove_where(id, |_| true)
    }

    /// Remove the record tracking `handle`.
    ///
    /// A record that only shares the handle's id is left in place.
    pub(crate) fn remove_handle(&self, handle: &RequestHandle) -> bool {
        self.remove_where(handle.id(), |record| record.handle().same_as(handle))
    }

    fn remove_where<F>(&self, id: RequestId, matches: F) -> bool
    where
        F: Fn(&RequestRecord) -> bool,
    {
        let find = |records: &[RequestRecord]| {
            records.iter().position(|r| r.id() == id && matches(r))
        };
        // Checked first so a miss does not notify subscribers.
        if self.inner.records.with(|records| find(records.as_slice())).is_none() {
            tracing::warn!(target: targets::REGISTRY, %id, "removing unknown request");
            return false;
        }

        let mut removed = false;
        let mut len = 0;
        self.inner.records.update(|records| {
            if let Some(pos) = find(records.as_slice()) {
                records.remove(pos);
                removed = true;
            }
            len = records.len();
        });

        if removed {
            tracing::trace!(target: targets::REGISTRY, %id, len, "request deregistered");
        } else {
            tracing::warn!(target: targets::REGISTRY, %id, "removing unknown request");
        }
        removed
    }

    /// Whether a record with `id` is registered.
    pub fn contains(&self, id: RequestId) -> bool {
        self.inner
            .records
            .with(|records| records.iter().any(|r| r.id() == id))
    }

    /// Number of in-flight requests.
    pub fn len(&self) -> usize {
        self.inner.records.with(Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A copy of the current records in issue order.
    pub fn snapshot(&self) -> Vec<RequestRecord> {
        self.inner.records.get()
    }

    /// Per-class counts, each computed independently.
    pub fn counts(&self) -> OngoingCounts {
        self.inner.records.with(|records| OngoingCounts::of(records))
    }

    /// All in-flight records, in issue order.
    pub fn all(&self) -> Readable<Vec<RequestRecord>> {
        self.inner.all.clone()
    }

    /// Whether a normal priority request is in flight.
    pub fn has_any(&self) -> Readable<bool> {
        self.inner.has_any.clone()
    }

    /// Whether a blocking request is in flight.
    pub fn has_blocking(&self) -> Readable<bool> {
        self.inner.has_blocking.clone()
    }

    /// Whether a background request is in flight.
    pub fn has_background(&self) -> Readable<bool> {
        self.inner.has_background.clone()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("len", &self.len())
            .field("counts", &self.counts())
            .finish()
    }
}

/// All in-flight records of the global registry.
pub fn ongoing_requests() -> Readable<Vec<RequestRecord>> {
    Registry::global().all()
}

/// Whether a normal priority request is in flight in the global registry.
pub fn has_any() -> Readable<bool> {
    Registry::global().has_any()
}

/// Whether a blocking request is in flight in the global registry.
pub fn has_blocking() -> Readable<bool> {
    Registry::global().has_blocking()
}

/// Whether a background request is in flight in the global registry.
pub fn has_background() -> Readable<bool> {
    Registry::global().has_background()
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;

    fn meta(is_blocking: bool, is_background: bool) -> RequestMeta {
        RequestMeta {
            is_blocking,
            is_background,
            expected: None,
        }
    }

    fn record(ids: &RequestIdGenerator, meta: RequestMeta) -> RequestRecord {
        RequestRecord::new(ids.next_id(), HttpMethod::Get, "https://example.com", meta)
    }

    #[test]
    fn test_request_id_display() {
        let ids = RequestIdGenerator::starting_at(41);
        assert_eq!(ids.next_id().to_string(), "#41");
        assert_eq!(ids.next_id().as_u64(), 42);
    }

    #[test]
    fn test_generator_clones_share_counter() {
        let a = RequestIdGenerator::new();
        let b = a.clone();
        assert_eq!(a.next_id().as_u64(), 0);
        assert_eq!(b.next_id().as_u64(), 1);
        assert_eq!(RequestIdGenerator::new().next_id().as_u64(), 0);
    }

    #[test]
    fn test_priority() {
        assert_eq!(meta(false, false).priority(), Priority::Normal);
        assert_eq!(meta(true, false).priority(), Priority::Blocking);
        assert_eq!(meta(false, true).priority(), Priority::Background);
        assert_eq!(meta(true, true).priority(), Priority::Blocking);
    }

    #[test]
    fn test_handle_settles_once() {
        let handle = RequestHandle::new(RequestId(7));
        let clone = handle.clone();
        assert!(handle.is_pending());
        assert!(clone.mark_settled());
        assert!(!handle.mark_settled());
        assert!(!handle.is_pending());
    }

    #[test]
    fn test_projections_follow_mixed_priorities() {
        let registry = Registry::new();
        let ids = RequestIdGenerator::new();
        let records = [
            record(&ids, meta(false, false)),
            record(&ids, meta(false, false)),
            record(&ids, meta(true, false)),
            record(&ids, meta(false, true)),
        ];
        for r in &records {
            assert!(registry.insert(r.clone()));
        }

        assert!(registry.has_any().get());
        assert!(registry.has_blocking().get());
        assert!(registry.has_background().get());
        assert_eq!(
            registry.counts(),
            OngoingCounts {
                normal: 2,
                blocking: 1,
                background: 1
            }
        );
        assert_eq!(registry.all().get().len(), 4);

        for r in records.iter().rev() {
            assert!(registry.remove(r.id()));
        }
        assert!(!registry.has_any().get());
        assert!(!registry.has_blocking().get());
        assert!(!registry.has_background().get());
        assert!(registry.all().get().is_empty());
    }

    #[test]
    fn test_has_any_ignores_prioritized_requests() {
        let registry = Registry::new();
        let ids = RequestIdGenerator::new();
        registry.insert(record(&ids, meta(true, false)));
        registry.insert(record(&ids, meta(false, true)));

        assert_eq!(registry.len(), 2);
        assert!(!registry.has_any().get());
    }

    #[test]
    fn test_counts_are_independent() {
        let registry = Registry::new();
        let ids = RequestIdGenerator::new();
        registry.insert(record(&ids, meta(true, true)));

        let counts = registry.counts();
        assert_eq!(counts.normal, 0);
        assert_eq!(counts.blocking, 1);
        assert_eq!(counts.background, 1);
        assert_ne!(counts.normal + counts.blocking + counts.background, registry.len());
    }

    #[test]
    fn test_remove_from_middle_keeps_order() {
        let registry = Registry::new();
        let ids = RequestIdGenerator::new();
        let records: Vec<_> = (0..5).map(|_| record(&ids, meta(false, false))).collect();
        for r in &records {
            registry.insert(r.clone());
        }

        assert!(registry.remove(records[2].id()));
        assert!(registry.remove(records[0].id()));

        let left: Vec<_> = registry.snapshot().iter().map(|r| r.id().as_u64()).collect();
        assert_eq!(left, vec![1, 3, 4]);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let registry = Registry::new();
        let ids = RequestIdGenerator::new();
        let r = record(&ids, meta(false, false));
        registry.insert(r.clone());

        let notified = Arc::new(Mutex::new(0));
        let notified_clone = notified.clone();
        let _sub = registry.all().subscribe(move |_| *notified_clone.lock() += 1);
        assert_eq!(*notified.lock(), 1);

        assert!(registry.remove(r.id()));
        assert!(!registry.remove(r.id()));
        assert!(!registry.remove(RequestId(999)));
        assert_eq!(*notified.lock(), 2);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let registry = Registry::new();
        let r = RequestRecord::new(RequestId(3), HttpMethod::Get, "https://a", meta(false, false));
        assert!(registry.insert(r.clone()));
        assert!(!registry.insert(r));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_projection_notifies_only_on_change() {
        let registry = Registry::new();
        let ids = RequestIdGenerator::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let sub = registry
            .has_blocking()
            .subscribe(move |&v| seen_clone.lock().push(v));

        let a = record(&ids, meta(true, false));
        let b = record(&ids, meta(true, false));
        let c = record(&ids, meta(false, false));
        registry.insert(a.clone());
        registry.insert(b.clone());
        registry.insert(c.clone());
        registry.remove(a.id());
        registry.remove(b.id());
        registry.remove(c.id());

        assert_eq!(*seen.lock(), vec![false, true, false]);
        sub.unsubscribe();
        assert!(!registry.has_blocking().is_started());
    }

    #[test]
    fn test_register_draws_from_registry_sequence() {
        let registry = Registry::with_id_generator(RequestIdGenerator::starting_at(10));
        let shared = registry.clone();

        let a = registry.register(HttpMethod::Get, "https://a", meta(false, false));
        let b = shared.register(HttpMethod::Get, "https://b", meta(true, false));
        assert_eq!(a.id().as_u64(), 10);
        assert_eq!(b.id().as_u64(), 11);
        assert_eq!(registry.len(), 2);

        let other = Registry::new();
        let c = other.register(HttpMethod::Get, "https://c", meta(false, false));
        assert_eq!(c.id().as_u64(), 0);
    }

    #[test]
    fn test_register_skips_taken_id() {
        let registry = Registry::new();
        let taken = record(&RequestIdGenerator::new(), meta(false, false));
        assert!(registry.insert(taken));

        let registered = registry.register(HttpMethod::Get, "https://b", meta(false, false));
        assert_eq!(registered.id().as_u64(), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_remove_handle_leaves_record_with_same_id() {
        let registry = Registry::new();
        let live = record(&RequestIdGenerator::starting_at(5), meta(true, false));
        assert!(registry.insert(live.clone()));

        let stranger = RequestHandle::new(RequestId(5));
        assert!(!registry.remove_handle(&stranger));
        assert!(registry.contains(RequestId(5)));
        assert!(registry.has_blocking().get());

        assert!(registry.remove_handle(live.handle()));
        assert!(registry.is_empty());
    }
}
