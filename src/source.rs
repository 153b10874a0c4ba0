//! Event sources and callbacks.
//!
//! This is a light-weight implementation of the observer pattern. Subjects are
//! modelled as the `Source` type and observers as boxed closures. Every
//! registration gets an id, so that observers owned by a `Scope` can be
//! detached explicitly instead of waiting for their target to disappear.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

/// Trait to wrap cloning of boxed values in a object-safe manner
pub trait BoxClone: Sync + Send {
    /// Clone the object as a boxed trait object
    fn box_clone(&self) -> Box<dyn BoxClone>;
}

impl<T: Sync + Send + Clone + 'static> BoxClone for T {
    fn box_clone(&self) -> Box<dyn BoxClone> {
        Box::new(self.clone())
    }
}

/// Read-lock reactive state. A poisoned lock only means some callback
/// panicked mid-update; the data itself is still usable.
pub fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Write-lock reactive state, see `read`.
pub fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// An error that can occur with a weakly referenced callback.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum CallbackError {
    Disappeared,
    Poisoned,
}

/// Shorthand for common callback results.
pub type CallbackResult<T = ()> = Result<T, CallbackError>;

/// A boxed callback.
type Callback<A> = Box<dyn FnMut(A) -> CallbackResult + Send + Sync + 'static>;

/// Identifies a callback registered with a `Source`.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash)]
pub struct CallbackId(u64);

/// Perform some callback on a weak reference to a lock and handle errors
/// gracefully.
pub fn with_weak<T, U, F: FnOnce(&mut T) -> U>(weak: &Weak<RwLock<T>>, f: F) -> CallbackResult<U> {
    weak.upgrade()
        .ok_or(CallbackError::Disappeared)
        .and_then(|lock| lock.write()
            .map(|mut t| f(&mut t))
            .map_err(|_| CallbackError::Poisoned)
        )
}

/// Forward everything `source` fires into `target` for as long as the
/// current `terminate` token lives. Each call replaces the token, which cuts
/// off the previous forwarding on its next firing.
pub fn rewire<A>(source: &Arc<RwLock<Source<A>>>, target: Weak<RwLock<Source<A>>>,
                 terminate: &mut Arc<()>)
    where A: Send + Sync + Clone + 'static,
{
    *terminate = Arc::new(());
    let token = Arc::downgrade(terminate);
    write(source).register(move |a|
        token.upgrade()
            .ok_or(CallbackError::Disappeared)
            .and_then(|_| with_weak(&target, |src| src.send(a)))
    );
}

/// An event source.
pub struct Source<A> {
    next_id: u64,
    callbacks: Vec<(CallbackId, Callback<A>)>,
}

impl<A> Default for Source<A> {
    fn default() -> Source<A> {
        Source::new()
    }
}

impl<A> Source<A> {
    /// Create a new source.
    pub fn new() -> Source<A> {
        Source { next_id: 0, callbacks: vec![] }
    }

    /// Register a callback. The callback will be a mutable closure that takes
    /// an event and must return a result. To unsubscribe from further events,
    /// the callback has to return an error or be `unregister`ed by id.
    pub fn register<F>(&mut self, callback: F) -> CallbackId
        where F: FnMut(A) -> CallbackResult + Send + Sync + 'static
    {
        let id = CallbackId(self.next_id);
        self.next_id += 1;
        self.callbacks.push((id, Box::new(callback)));
        id
    }

    /// Remove a callback. Unknown ids are ignored.
    pub fn unregister(&mut self, id: CallbackId) {
        self.callbacks.retain(|(cid, _)| *cid != id);
    }

    /// Number of live callbacks.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }
}

/// Keeps a callback registered, and whatever it observes alive, until
/// dropped.
///
/// Must not be dropped while the source it detaches from is firing.
#[must_use = "dropping a subscription unregisters its callback"]
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
    #[allow(dead_code)]
    keep_alive: Box<dyn BoxClone>,
}

impl Subscription {
    /// Tie the registration `id` on `source` to the new subscription.
    pub(crate) fn new<A, K>(source: &Arc<RwLock<Source<A>>>, id: CallbackId, keep_alive: K) -> Subscription
        where A: Send + Sync + 'static,
              K: BoxClone + 'static,
    {
        let weak = Arc::downgrade(source);
        Subscription {
            detach: Some(Box::new(move || {
                if let Some(src) = weak.upgrade() {
                    write(&src).unregister(id);
                }
            })),
            keep_alive: Box::new(keep_alive),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl<A: Send + Sync + Clone + 'static> Source<A> {
    /// Make the source send an event to all its observers.
    pub fn send(&mut self, a: A) {
        let callbacks = std::mem::take(&mut self.callbacks);
        let n = callbacks.len();
        let mut iter = callbacks.into_iter();
        for _ in 1..n {
            if let Some((id, mut callback)) = iter.next() {
                if callback(a.clone()).is_ok() {
                    self.callbacks.push((id, callback));
                }
            }
        }
        // process the last element without cloning
        if let Some((id, mut callback)) = iter.next() {
            if callback(a).is_ok() {
                self.callbacks.push((id, callback));
            }
        }
    }
}
