//! Pending wrapper

use std::ops::Deref;


/// A value with at most one queued replacement.
///
/// Behaviors keep their state in a `Pending`, so that everything sampled
/// during a transaction still sees the value from before it. The queued
/// update is applied by a finalizer once the transaction is done.
pub struct Pending<T> {
    current: T,
    update: Option<T>,
}

impl<T> Pending<T> {
    /// Create a new pending value.
    pub fn new(t: T) -> Pending<T> {
        Pending { current: t, update: None }
    }

    /// Put an item in the queue. Ignores any previously queued items.
    pub fn queue(&mut self, new: T) {
        self.update = Some(new);
    }

    /// Apply the queued update, if any.
    pub fn update(&mut self) {
        if let Some(t) = self.update.take() {
            self.current = t;
        }
    }

    /// Overwrite the current value right away, discarding any queued update.
    pub fn reset(&mut self, t: T) {
        self.current = t;
        self.update = None;
    }

    /// The value as it will be once the update has been applied.
    pub fn future(&self) -> &T {
        self.update.as_ref().unwrap_or(&self.current)
    }
}

impl<T> Deref for Pending<T> {
    type Target = T;
    fn deref(&self) -> &T { &self.current }
}
