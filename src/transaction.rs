//! A trivial global lock transaction system.
//!
//! At the moment, this is really just a global static mutex, that needs to be
//! locked, to ensure the atomicity of a transaction. A transaction runs in
//! three stages: the body, finalizers (`end`) and, once the lock is
//! released, observers (`after`).

use std::cell::RefCell;
use std::mem;
use std::sync::{Mutex, MutexGuard};
use lazy_static::lazy_static;
use tracing::trace;

lazy_static! {
    static ref TRANSACTION_MUTEX: Mutex<()> = Mutex::new(());
}

// Registry for callbacks to be executed at the end of a transaction.
thread_local!(
    static CURRENT_TRANSACTION: RefCell<Option<Transaction>> =
        RefCell::new(None)
);

/// A callback.
type Callback = Box<dyn FnOnce() + 'static>;

/// A transaction.
#[derive(Default)]
pub struct Transaction {
    finalizers: Vec<Callback>,
    observers: Vec<Callback>,
}

impl Transaction {
    /// Add a finalizing callback. This should not have far reaching
    /// side-effects, and in particular not commit by itself. Typical operations
    /// for a finalizer are executing queued state updates.
    pub fn end<F: FnOnce() + 'static>(&mut self, callback: F) {
        self.finalizers.push(Box::new(callback));
    }

    /// Add an observer. Observers run after the outermost transaction has
    /// released the global lock, so they see the committed state and may
    /// commit again.
    pub fn after<F: FnOnce() + 'static>(&mut self, callback: F) {
        self.observers.push(Box::new(callback));
    }

    /// Run the finalizers and hand back the observers.
    fn finalize(self) -> Vec<Callback> {
        for finalizer in self.finalizers {
            finalizer();
        }
        self.observers
    }
}

/// Puts the enclosing transaction back in place, even when unwinding.
struct Restore {
    prev: Option<Option<Transaction>>,
}

impl Restore {
    fn finish(mut self) -> Option<Transaction> {
        let prev = self.prev.take().unwrap_or(None);
        CURRENT_TRANSACTION.with(|current| mem::replace(&mut *current.borrow_mut(), prev))
    }
}

impl Drop for Restore {
    fn drop(&mut self) {
        if let Some(prev) = self.prev.take() {
            CURRENT_TRANSACTION.with(|current| *current.borrow_mut() = prev);
        }
    }
}

fn acquire() -> MutexGuard<'static, ()> {
    // A panicking callback must not wedge every later transaction.
    TRANSACTION_MUTEX
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Commit a transaction.
///
/// If the thread is not running any transactions currently, the global lock is
/// acquired. Otherwise a new transaction begins, since given the interface of
/// this module it is safely assumed that the lock is already held.
pub fn commit<A, F: FnOnce() -> A>(body: F) -> A {
    // Begin a new transaction
    let prev = CURRENT_TRANSACTION.with(|current| {
        mem::replace(&mut *current.borrow_mut(), Some(Transaction::default()))
    });
    let outermost = prev.is_none();
    let restore = Restore { prev: Some(prev) };
    // Acquire global lock if necessary
    let lock = if outermost {
        trace!("transaction: begin");
        Some(acquire())
    } else {
        None
    };
    // Perform the main body of the transaction
    let result = body();
    // Call all finalizers and drop the transaction
    let observers = match restore.finish() {
        Some(transaction) => transaction.finalize(),
        None => vec![],
    };
    if outermost {
        drop(lock);
        trace!(observers = observers.len(), "transaction: committed");
        for observer in observers {
            observer();
        }
    } else {
        // Observers belong to the outermost transaction.
        for observer in observers {
            after(observer);
        }
    }
    result
}

/// Run an action against the current transaction.
///
/// # Panics
///
/// When called outside of `commit`.
pub fn with_current<A, F: FnOnce(&mut Transaction) -> A>(action: F) -> A {
    CURRENT_TRANSACTION.with(|current| match &mut *current.borrow_mut() {
        Some(trans) => action(trans),
        None => panic!("there is no active transaction to register a callback"),
    })
}

/// Register a finalizer with the current transaction.
pub fn end<F: FnOnce() + 'static>(action: F) {
    with_current(|c| c.end(action))
}

/// Register an observer with the current transaction.
pub fn after<F: FnOnce() + 'static>(action: F) {
    with_current(|c| c.after(action))
}
