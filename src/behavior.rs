//! Continuous time behaviors

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, Weak};
use tracing::{trace, warn};

use crate::error::{Error, Result};
use crate::pending::Pending;
use crate::source::{read, rewire, with_weak, write, BoxClone, CallbackError, CallbackResult, Source, Subscription};
use crate::stream::Stream;
use crate::transaction::{after, commit, end};


type Func<A> = Arc<dyn Fn() -> Result<A> + Send + Sync + 'static>;

enum SignalFn<A> {
    Const(A),
    Func(Func<A>),
    Unresolved,
}

impl<A> SignalFn<A> {
    fn from_fn<F: Fn() -> Result<A> + Send + Sync + 'static>(f: F) -> SignalFn<A> {
        SignalFn::Func(Arc::new(f))
    }
}

impl<A: Clone> SignalFn<A> {
    /// Detach what is needed for evaluation from the lock guarding `self`.
    fn thunk(&self) -> Thunk<A> {
        match self {
            SignalFn::Const(a) => Thunk::Ready(Ok(a.clone())),
            SignalFn::Func(f) => Thunk::Deferred(f.clone()),
            SignalFn::Unresolved => Thunk::Ready(Err(Error::Unresolved)),
        }
    }

    fn constant(&self) -> Option<A> {
        match self {
            SignalFn::Const(a) => Some(a.clone()),
            _ => None,
        }
    }
}

enum Thunk<A> {
    Ready(Result<A>),
    Deferred(Func<A>),
}

impl<A> Thunk<A> {
    fn force(self) -> Result<A> {
        match self {
            Thunk::Ready(r) => r,
            Thunk::Deferred(f) => f(),
        }
    }
}

type Cell<A> = Arc<RwLock<Pending<SignalFn<A>>>>;
type Notifier = Arc<RwLock<Source<()>>>;

fn new_cell<A>(f: SignalFn<A>) -> Cell<A> {
    Arc::new(RwLock::new(Pending::new(f)))
}

fn new_notifier() -> Notifier {
    Arc::new(RwLock::new(Source::new()))
}

/// Evaluate the committed value of a cell.
fn call<A: Clone>(cell: &Cell<A>) -> Result<A> {
    let thunk = read(cell).thunk();
    thunk.force()
}

/// Evaluate the value a cell will have once the transaction is done.
fn call_future<A: Clone>(cell: &Cell<A>) -> Result<A> {
    let thunk = read(cell).future().thunk();
    thunk.force()
}

fn future_const<A: Clone>(cell: &Cell<A>) -> Option<A> {
    read(cell).future().constant()
}

fn upgrade<T>(weak: &Weak<T>) -> CallbackResult<Arc<T>> {
    weak.upgrade().ok_or(CallbackError::Disappeared)
}

/// Queue a new value and apply it when the transaction finalizes.
fn queue<A>(weak: &Weak<RwLock<Pending<SignalFn<A>>>>, next: SignalFn<A>) -> CallbackResult
    where A: Send + Sync + 'static,
{
    with_weak(weak, |cur| cur.queue(next))?;
    let weak = weak.clone();
    end(move || { let _ = with_weak(&weak, |cur| cur.update()); });
    Ok(())
}


/// A continuous, time-varying value.
///
/// A behavior always has a current value, which can be read with `sample`.
/// Changes are pushed through the transaction system: within a transaction
/// every behavior still reads as it was before, and all of them change at
/// once when it commits.
///
/// ```
/// # use funnel::Sink;
/// let sink = Sink::new();
/// let doubled = sink.stream().hold(1).map(|n| 2 * n);
/// assert_eq!(doubled.sample(), 2);
/// sink.send(5);
/// assert_eq!(doubled.sample(), 10);
/// ```
pub struct Behavior<A> {
    current: Cell<A>,
    source: Notifier,
    #[allow(dead_code)]
    keep_alive: Box<dyn BoxClone>,
}

impl<A> Clone for Behavior<A> {
    fn clone(&self) -> Behavior<A> {
        Behavior {
            current: self.current.clone(),
            source: self.source.clone(),
            keep_alive: self.keep_alive.box_clone(),
        }
    }
}

/// Build a behavior that recomputes its value with `make` whenever one of
/// `parents` signals a change.
fn derived<A, M, K>(parents: &[&Notifier], keep_alive: K, make: M) -> Behavior<A>
    where A: Clone + Send + Sync + 'static,
          M: Fn() -> CallbackResult<SignalFn<A>> + Send + Sync + 'static,
          K: BoxClone + 'static,
{
    commit(|| {
        let current = new_cell(make().unwrap_or(SignalFn::Unresolved));
        let source = new_notifier();
        let make = Arc::new(make);
        for parent in parents {
            let make = make.clone();
            let weak_current = Arc::downgrade(&current);
            let weak_source = Arc::downgrade(&source);
            write(parent).register(move |()| {
                queue(&weak_current, make()?)?;
                with_weak(&weak_source, |src| src.send(()))
            });
        }
        Behavior { current, source, keep_alive: Box::new(keep_alive) }
    })
}

impl<A: Clone + Send + Sync + 'static> Behavior<A> {
    /// Create a constant behavior.
    pub fn constant(a: A) -> Behavior<A> {
        Behavior {
            current: new_cell(SignalFn::Const(a)),
            source: new_notifier(),
            keep_alive: Box::new(()),
        }
    }

    /// Read the current value without starting a transaction.
    pub(crate) fn sample_raw(&self) -> Result<A> {
        call(&self.current)
    }

    /// Sample the current value, failing if it cannot be determined yet.
    pub fn try_sample(&self) -> Result<A> {
        commit(|| self.sample_raw())
    }

    /// Sample the current value of a behavior.
    ///
    /// # Panics
    ///
    /// When the behavior depends on a placeholder that has not been replaced
    /// yet. Use `try_sample` to handle that case.
    pub fn sample(&self) -> A {
        match self.try_sample() {
            Ok(a) => a,
            Err(err) => panic!("{}", err),
        }
    }

    /// Map a behavior with a function.
    pub fn map<B, F>(&self, f: F) -> Behavior<B>
        where B: Clone + Send + Sync + 'static,
              F: Fn(A) -> B + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let parent = Arc::downgrade(&self.current);
        derived(&[&self.source], self.clone(), move || {
            let parent = upgrade(&parent)?;
            Ok(match future_const(&parent) {
                Some(a) => SignalFn::Const(f(a)),
                None => {
                    let f = f.clone();
                    SignalFn::from_fn(move || call(&parent).map(|a| f(a)))
                }
            })
        })
    }

    /// Sample this behavior whenever `stream` fires.
    pub fn snapshot<B, C, F>(&self, stream: &Stream<B>, f: F) -> Stream<C>
        where B: Clone + Send + Sync + 'static,
              C: Clone + Send + Sync + 'static,
              F: Fn(A, B) -> C + Send + Sync + 'static,
    {
        stream.snapshot(self, f)
    }

    /// Call `f` with the new value after every transaction that changed this
    /// behavior.
    ///
    /// The callback runs once the transaction has committed, outside of the
    /// global lock, so it may send into sinks. It is not called for the
    /// value the behavior has right now.
    pub fn observe<F>(&self, f: F) -> Subscription
        where F: Fn(A) + Send + Sync + 'static,
    {
        commit(|| {
            let f = Arc::new(f);
            let scheduled = Arc::new(AtomicBool::new(false));
            let weak = Arc::downgrade(&self.current);
            let id = write(&self.source).register(move |()| {
                if !scheduled.swap(true, Ordering::SeqCst) {
                    let scheduled = scheduled.clone();
                    let weak = weak.clone();
                    let f = f.clone();
                    after(move || {
                        scheduled.store(false, Ordering::SeqCst);
                        if let Some(cell) = weak.upgrade() {
                            match commit(|| call(&cell)) {
                                Ok(a) => f(a),
                                Err(err) => warn!(%err, "behavior observer skipped"),
                            }
                        }
                    });
                }
                Ok(())
            });
            Subscription::new(&self.source, id, self.clone())
        })
    }
}

/// Lift a two-argument function to a function on behaviors.
///
/// ```
/// # use funnel::{Sink, behavior::lift2};
/// let sink_a = Sink::<i32>::new();
/// let sink_b = Sink::<i32>::new();
/// let product = lift2(
///     |a, b| a * b,
///     &sink_a.stream().hold(0),
///     &sink_b.stream().hold(0)
/// );
/// assert_eq!(product.sample(), 0);
/// sink_a.send(3);
/// sink_b.send(5);
/// assert_eq!(product.sample(), 15);
/// ```
pub fn lift2<A, B, C, F>(f: F, ba: &Behavior<A>, bb: &Behavior<B>) -> Behavior<C>
    where A: Clone + Send + Sync + 'static,
          B: Clone + Send + Sync + 'static,
          C: Clone + Send + Sync + 'static,
          F: Fn(A, B) -> C + Send + Sync + 'static,
{
    let f = Arc::new(f);
    let (wa, wb) = (Arc::downgrade(&ba.current), Arc::downgrade(&bb.current));
    derived(&[&ba.source, &bb.source], (ba.clone(), bb.clone()), move || {
        let (ca, cb) = (upgrade(&wa)?, upgrade(&wb)?);
        Ok(match (future_const(&ca), future_const(&cb)) {
            (Some(a), Some(b)) => SignalFn::Const(f(a, b)),
            _ => {
                let f = f.clone();
                SignalFn::from_fn(move || Ok(f(call(&ca)?, call(&cb)?)))
            }
        })
    })
}

/// Lift a three-argument function to a function on behaviors.
pub fn lift3<A, B, C, D, F>(f: F, ba: &Behavior<A>, bb: &Behavior<B>, bc: &Behavior<C>) -> Behavior<D>
    where A: Clone + Send + Sync + 'static,
          B: Clone + Send + Sync + 'static,
          C: Clone + Send + Sync + 'static,
          D: Clone + Send + Sync + 'static,
          F: Fn(A, B, C) -> D + Send + Sync + 'static,
{
    let f = Arc::new(f);
    let ab = lift2(|a, b| (a, b), ba, bb);
    lift2(move |(a, b), c| f(a, b, c), &ab, bc)
}

/// Turn a list of behaviors into a behavior of lists.
///
/// ```
/// # use funnel::{Sink, Behavior, behavior::sequence};
/// let sink = Sink::new();
/// let all = sequence(&[Behavior::constant(1), sink.stream().hold(2)]);
/// assert_eq!(all.sample(), vec![1, 2]);
/// sink.send(5);
/// assert_eq!(all.sample(), vec![1, 5]);
/// ```
pub fn sequence<A>(behaviors: &[Behavior<A>]) -> Behavior<Vec<A>>
    where A: Clone + Send + Sync + 'static,
{
    let sources: Vec<&Notifier> = behaviors.iter().map(|b| &b.source).collect();
    let cells: Vec<Weak<RwLock<Pending<SignalFn<A>>>>> = behaviors.iter()
        .map(|b| Arc::downgrade(&b.current))
        .collect();
    derived(&sources, behaviors.to_vec(), move || {
        let cells = cells.iter().map(upgrade).collect::<CallbackResult<Vec<_>>>()?;
        Ok(match cells.iter().map(future_const).collect::<Option<Vec<A>>>() {
            Some(values) => SignalFn::Const(values),
            None => SignalFn::from_fn(move || cells.iter().map(call).collect()),
        })
    })
}

/// Hold a stream as a behavior.
pub(crate) fn hold<A>(initial: A, stream: &Stream<A>) -> Behavior<A>
    where A: Clone + Send + Sync + 'static,
{
    commit(|| {
        let current = new_cell(SignalFn::Const(initial));
        let source = new_notifier();
        let weak_current = Arc::downgrade(&current);
        let weak_source = Arc::downgrade(&source);
        write(&stream.source).register(move |a| {
            queue(&weak_current, SignalFn::Const(a))?;
            with_weak(&weak_source, |src| src.send(()))
        });
        Behavior {
            current,
            source,
            keep_alive: Box::new(stream.clone()),
        }
    })
}

impl<A: Clone + Send + Sync + 'static> Behavior<Behavior<A>> {
    /// Flatten a behavior of behaviors.
    ///
    /// The result follows whichever inner behavior the outer one currently
    /// holds, and signals a change when either of them changes.
    pub fn switch(&self) -> Behavior<A> {
        commit(|| {
            let outer = self.current.clone();
            let current = new_cell(SignalFn::from_fn(move || call(&outer)?.sample_raw()));
            let source = new_notifier();
            let weak_source = Arc::downgrade(&source);
            let mut terminate = Arc::new(());
            if let Ok(inner) = call(&self.current) {
                rewire(&inner.source, weak_source.clone(), &mut terminate);
            }
            let weak_outer = Arc::downgrade(&self.current);
            write(&self.source).register(move |()| {
                if let Ok(inner) = call_future(&upgrade(&weak_outer)?) {
                    rewire(&inner.source, weak_source.clone(), &mut terminate);
                }
                with_weak(&weak_source, |src| src.send(()))
            });
            Behavior { current, source, keep_alive: Box::new(self.clone()) }
        })
    }
}

impl<A: Clone + Send + Sync + 'static> Behavior<Stream<A>> {
    /// Fire the events of whichever stream the behavior currently holds.
    pub fn switch_stream(&self) -> Stream<A> {
        commit(|| {
            let src = Arc::new(RwLock::new(Source::new()));
            let weak_src = Arc::downgrade(&src);
            let mut terminate = Arc::new(());
            if let Ok(stream) = call(&self.current) {
                rewire(&stream.source, weak_src.clone(), &mut terminate);
            }
            let weak_cell = Arc::downgrade(&self.current);
            write(&self.source).register(move |()| {
                if weak_src.strong_count() == 0 {
                    return Err(CallbackError::Disappeared);
                }
                if let Ok(stream) = call_future(&upgrade(&weak_cell)?) {
                    rewire(&stream.source, weak_src.clone(), &mut terminate);
                }
                Ok(())
            });
            Stream::from_source(src, self.clone())
        })
    }
}


/// A forward-declared behavior.
///
/// The behavior handed out by `behavior()` can be used to build other
/// behaviors and streams before its definition exists. Once
/// `replace_with` is called, it becomes an alias of the definition, and
/// everything built on it observes the definition from then on. Sampling
/// it before that fails with `Error::Unresolved`.
///
/// ```
/// # use funnel::{Sink, Placeholder, Error};
/// let sink = Sink::new();
/// let total = Placeholder::new();
/// let shown = total.behavior().map(|n: i32| format!("{} items", n));
/// assert_eq!(shown.try_sample(), Err(Error::Unresolved));
///
/// total.replace_with(&sink.stream().hold(0)).unwrap();
/// sink.send(3);
/// assert_eq!(shown.sample(), "3 items");
/// ```
pub struct Placeholder<A> {
    alias: Behavior<A>,
    definition: Arc<Mutex<Option<Behavior<A>>>>,
}

impl<A> Clone for Placeholder<A> {
    fn clone(&self) -> Placeholder<A> {
        Placeholder {
            alias: self.alias.clone(),
            definition: self.definition.clone(),
        }
    }
}

impl<A: Clone + Send + Sync + 'static> Default for Placeholder<A> {
    fn default() -> Placeholder<A> {
        Placeholder::new()
    }
}

impl<A: Clone + Send + Sync + 'static> Placeholder<A> {
    /// Declare a new placeholder.
    pub fn new() -> Placeholder<A> {
        let definition = Arc::new(Mutex::new(None));
        Placeholder {
            alias: Behavior {
                current: new_cell(SignalFn::Unresolved),
                source: new_notifier(),
                keep_alive: Box::new(definition.clone()),
            },
            definition,
        }
    }

    /// The behavior standing in for the eventual definition.
    pub fn behavior(&self) -> Behavior<A> {
        self.alias.clone()
    }

    fn slot(&self) -> MutexGuard<'_, Option<Behavior<A>>> {
        self.definition.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether `replace_with` has succeeded already.
    pub fn is_replaced(&self) -> bool {
        self.slot().is_some()
    }

    /// Make the placeholder an alias of `definition`.
    ///
    /// This can happen only once, a second call fails with
    /// `Error::AlreadyReplaced`.
    pub fn replace_with(&self, definition: &Behavior<A>) -> Result<()> {
        {
            let mut slot = self.slot();
            if slot.is_some() {
                return Err(Error::AlreadyReplaced);
            }
            *slot = Some(definition.clone());
        }
        self.alias(definition);
        Ok(())
    }

    /// Alias the definition without checking for an earlier one.
    pub(crate) fn redirect(&self, definition: &Behavior<A>) {
        *self.slot() = Some(definition.clone());
        self.alias(definition);
    }

    fn alias(&self, definition: &Behavior<A>) {
        commit(|| {
            let weak_def = Arc::downgrade(&definition.current);
            let alias_of = move || -> CallbackResult<SignalFn<A>> {
                let def = upgrade(&weak_def)?;
                Ok(match future_const(&def) {
                    Some(a) => SignalFn::Const(a),
                    None => SignalFn::from_fn(move || call(&def)),
                })
            };
            let initial = alias_of().unwrap_or(SignalFn::Unresolved);
            write(&self.alias.current).reset(initial);

            let weak_current = Arc::downgrade(&self.alias.current);
            let weak_source = Arc::downgrade(&self.alias.source);
            write(&definition.source).register(move |()| {
                queue(&weak_current, alias_of()?)?;
                with_weak(&weak_source, |src| src.send(()))
            });
            // Everything built on the placeholder re-reads it now.
            write(&self.alias.source).send(());
            trace!("placeholder redirected");
        })
    }
}
