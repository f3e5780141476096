// SPDX-FileCopyrightText: 2026 Multicast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delegate registry for the multicast proxy.
//!
//! The `DelegateRegistry` holds an optional default delegate (owned) and an
//! insertion-ordered set of interceptors (non-owning, unique by identity).
//! Mutations and snapshots are serialized under one mutex; a snapshot copies
//! the live delegates out so the lock is never held while a delegate runs.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use multicast_core::AppDelegate;
use tracing::debug;

/// Identity of a delegate: the address of its allocation.
///
/// Stable for as long as the registry holds a handle (strong or weak) to the
/// allocation, so two keys are equal iff they name the same instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DelegateKey(usize);

impl DelegateKey {
    pub fn of<D: ?Sized>(delegate: &Arc<D>) -> Self {
        Self(Arc::as_ptr(delegate).cast::<()>() as usize)
    }

    pub(crate) fn of_ref<D: ?Sized>(delegate: &D) -> Self {
        Self((delegate as *const D).cast::<()>() as usize)
    }
}

struct Interceptor {
    key: DelegateKey,
    handle: Weak<dyn AppDelegate>,
}

#[derive(Default)]
struct RegistryState {
    default: Option<Arc<dyn AppDelegate>>,
    interceptors: Vec<Interceptor>,
}

impl RegistryState {
    /// Drop interceptors whose delegate has been deallocated.
    fn prune(&mut self) {
        let before = self.interceptors.len();
        self.interceptors.retain(|i| i.handle.strong_count() > 0);
        let pruned = before - self.interceptors.len();
        if pruned > 0 {
            debug!(pruned, "pruned dropped interceptors");
        }
    }
}

/// An immutable, ordered view of the registry: `[default?, interceptors...]`.
///
/// Holding a snapshot keeps its delegates alive until the snapshot is dropped;
/// registry mutations after capture never change it.
#[derive(Clone)]
pub struct Snapshot {
    delegates: Arc<[Arc<dyn AppDelegate>]>,
}

impl Snapshot {
    pub fn new(delegates: Vec<Arc<dyn AppDelegate>>) -> Self {
        Self {
            delegates: delegates.into(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn AppDelegate>> {
        self.delegates.iter()
    }

    pub fn len(&self) -> usize {
        self.delegates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delegates.is_empty()
    }

    /// Delegate names in dispatch order.
    pub fn names(&self) -> Vec<String> {
        self.delegates.iter().map(|d| d.name().to_string()).collect()
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Registry of the default delegate and interceptors.
#[derive(Default)]
pub struct DelegateRegistry {
    state: Mutex<RegistryState>,
}

impl DelegateRegistry {
    /// Create an empty registry (no default, no interceptors).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry wrapping `default`.
    pub fn with_default(default: Arc<dyn AppDelegate>) -> Self {
        let registry = Self::new();
        registry.set_default(Some(default));
        registry
    }

    // A delegate that panicked mid-dispatch never holds this lock, but a
    // poisoned mutex must still not wedge every later callback.
    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the default delegate, returning the previous one.
    pub fn set_default(
        &self,
        delegate: Option<Arc<dyn AppDelegate>>,
    ) -> Option<Arc<dyn AppDelegate>> {
        let mut state = self.lock();
        debug!(
            default = delegate.as_ref().map(|d| d.name()).unwrap_or("<none>"),
            "default delegate set"
        );
        std::mem::replace(&mut state.default, delegate)
    }

    /// The current default delegate, if any.
    pub fn default_delegate(&self) -> Option<Arc<dyn AppDelegate>> {
        self.lock().default.clone()
    }

    /// Append an interceptor unless it is already registered or is the
    /// current default.
    ///
    /// Only a weak handle is kept. Returns `true` if the interceptor was added.
    pub fn add_interceptor(&self, delegate: &Arc<dyn AppDelegate>) -> bool {
        let key = DelegateKey::of(delegate);
        let mut state = self.lock();
        state.prune();

        if state.default.as_ref().is_some_and(|d| DelegateKey::of(d) == key) {
            debug!(interceptor = delegate.name(), "delegate is already the default");
            return false;
        }

        if state.interceptors.iter().any(|i| i.key == key) {
            debug!(interceptor = delegate.name(), "interceptor already registered");
            return false;
        }

        state.interceptors.push(Interceptor {
            key,
            handle: Arc::downgrade(delegate),
        });
        debug!(
            interceptor = delegate.name(),
            count = state.interceptors.len(),
            "interceptor added"
        );
        true
    }

    /// Remove an interceptor by identity. Returns `true` if it was present.
    pub fn remove_interceptor<D: ?Sized>(&self, delegate: &Arc<D>) -> bool {
        self.remove_key(DelegateKey::of(delegate))
    }

    pub(crate) fn remove_key(&self, key: DelegateKey) -> bool {
        let mut state = self.lock();
        state.prune();

        let before = state.interceptors.len();
        state.interceptors.retain(|i| i.key != key);
        let removed = state.interceptors.len() != before;
        if removed {
            debug!(count = state.interceptors.len(), "interceptor removed");
        }
        removed
    }

    /// Whether `delegate` is a registered, still-alive interceptor.
    pub fn contains<D: ?Sized>(&self, delegate: &Arc<D>) -> bool {
        let key = DelegateKey::of(delegate);
        self.lock()
            .interceptors
            .iter()
            .any(|i| i.key == key && i.handle.strong_count() > 0)
    }

    /// Number of live interceptors.
    pub fn interceptor_count(&self) -> usize {
        self.lock()
            .interceptors
            .iter()
            .filter(|i| i.handle.strong_count() > 0)
            .count()
    }

    /// Capture `[default?, interceptors...]`, skipping dropped interceptors.
    ///
    /// An interceptor later promoted to default appears once, as the default.
    pub fn snapshot(&self) -> Snapshot {
        let state = self.lock();
        let default_key = state.default.as_ref().map(DelegateKey::of);
        let delegates = state
            .default
            .iter()
            .cloned()
            .chain(
                state
                    .interceptors
                    .iter()
                    .filter(|i| Some(i.key) != default_key)
                    .filter_map(|i| i.handle.upgrade()),
            )
            .collect();
        Snapshot::new(delegates)
    }
}

impl fmt::Debug for DelegateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegateRegistry")
            .field("snapshot", &self.snapshot())
            .finish()
    }
}
