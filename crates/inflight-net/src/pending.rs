//! The single-slot configuration consumed by the next request.

use parking_lot::Mutex;

use crate::registry::RequestMeta;

/// Fluent configuration waiting for the next request of a client.
///
/// Modifiers [`merge`](Self::merge) into the slot; the next request
/// [`take_and_clear`](Self::take_and_clear)s it in one step, so the slot
/// never carries over to a second request. An empty slot yields default
/// (normal priority, undecoded) metadata.
///
/// The slot belongs to one client. Concurrent callers that configure and
/// issue requests on the same client race on it and may see each other's
/// configuration; give each logical caller its own client.
#[derive(Debug, Default)]
pub struct PendingConfig {
    slot: Mutex<Option<RequestMeta>>,
}

impl PendingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `f` to the pending metadata, creating it from defaults if the
    /// slot is empty. Fields not touched by `f` keep their pending values.
    pub fn merge<F>(&self, f: F)
    where
        F: FnOnce(&mut RequestMeta),
    {
        let mut slot = self.slot.lock();
        f(slot.get_or_insert_with(RequestMeta::default));
    }

    /// A copy of the pending metadata, if any.
    pub fn peek(&self) -> Option<RequestMeta> {
        self.slot.lock().clone()
    }

    /// Take the pending metadata and leave the slot empty.
    pub fn take_and_clear(&self) -> RequestMeta {
        self.slot.lock().take().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.lock().is_none()
    }
}
