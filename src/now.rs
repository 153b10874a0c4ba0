//! One-shot deferred computations.
//!
//! A `Now` describes work that happens at a specific moment, typically when
//! a component is constructed: sampling behaviors, starting accumulators,
//! building the reactive graph. Nothing happens until it is `run`, and it
//! can only run once.

use tracing::{debug, debug_span};

use crate::behavior::Behavior;
use crate::error::{Error, Result};
use crate::feedback::Feedback;
use crate::stream::Stream;
use crate::transaction::commit;


/// A deferred computation yielding an `A` exactly once.
///
/// ```
/// # use funnel::Now;
/// let now = Now::of(3).map(|n| n * 2).chain(|n| Now::of(n + 1));
/// assert_eq!(now.run(), Ok(7));
/// ```
#[must_use = "a `Now` does nothing until it is run"]
pub struct Now<A> {
    run: Box<dyn FnOnce() -> Result<A>>,
}

impl<A: 'static> Now<A> {
    /// A computation that yields `a` without doing anything.
    pub fn of(a: A) -> Now<A> {
        Now::from_fn(move || Ok(a))
    }

    /// Wrap a fallible closure.
    pub fn from_fn<F: FnOnce() -> Result<A> + 'static>(f: F) -> Now<A> {
        Now { run: Box::new(f) }
    }

    /// A computation that fails with `err` when run.
    pub fn fail(err: Error) -> Now<A> {
        Now::from_fn(move || Err(err))
    }

    /// Sequence another computation after this one.
    ///
    /// `f` is only called once this computation has produced its value. If
    /// it fails, `f` is never called and the failure is passed on.
    pub fn chain<B: 'static, F: FnOnce(A) -> Now<B> + 'static>(self, f: F) -> Now<B> {
        Now::from_fn(move || f(self.run()?).run())
    }

    /// Transform the result.
    pub fn map<B: 'static, F: FnOnce(A) -> B + 'static>(self, f: F) -> Now<B> {
        Now::from_fn(move || self.run().map(f))
    }

    /// Run the computation.
    pub fn run(self) -> Result<A> {
        (self.run)()
    }
}

impl<A: Clone + Send + Sync + 'static> Now<A> {
    /// Read a behavior at the moment the computation runs.
    pub fn sample(behavior: &Behavior<A>) -> Now<A> {
        let behavior = behavior.clone();
        Now::from_fn(move || behavior.try_sample())
    }
}

impl<B: Clone + Send + Sync + 'static> Now<Behavior<B>> {
    /// Accumulate a stream, starting from the moment the computation runs.
    ///
    /// ```
    /// # use funnel::{Now, Sink};
    /// let sink = Sink::new();
    /// sink.send(100); // before the scan starts, not counted
    /// let total = Now::scan(&sink.stream(), 0, |acc, n| acc + n).run().unwrap();
    /// sink.send(1);
    /// sink.send(2);
    /// assert_eq!(total.sample(), 3);
    /// ```
    pub fn scan<A, F>(stream: &Stream<A>, initial: B, f: F) -> Now<Behavior<B>>
        where A: Clone + Send + Sync + 'static,
              F: Fn(B, A) -> B + Send + Sync + 'static,
    {
        let stream = stream.clone();
        Now::from_fn(move || Ok(stream.scan(initial, f)))
    }
}

impl<B: Clone + Send + Sync + 'static> Now<Stream<B>> {
    /// Like `scan`, but yields the stream of accumulated values.
    pub fn scan_stream<A, F>(stream: &Stream<A>, initial: B, f: F) -> Now<Stream<B>>
        where A: Clone + Send + Sync + 'static,
              F: Fn(B, A) -> B + Send + Sync + 'static,
    {
        let stream = stream.clone();
        Now::from_fn(move || Ok(stream.scan_stream(initial, f)))
    }
}

impl<M: Feedback, O: 'static> Now<(M, O)> {
    /// Run a computation that consumes its own feedback behaviors.
    ///
    /// `f` is handed `arity` placeholders shaped as `M`. The behaviors it
    /// returns replace them, so everything `f` built on the placeholders
    /// follows the real behaviors from then on. The number of behaviors
    /// returned must match `arity`, otherwise the whole computation fails
    /// with `Error::ArityMismatch` and no placeholder is replaced.
    ///
    /// ```
    /// # use funnel::{Now, Behavior, Sink};
    /// let sink = Sink::new();
    /// let numbers = sink.stream();
    /// let (_, total) = Now::fix(1, move |acc: Behavior<i32>| {
    ///     let total = acc.snapshot(&numbers, |a, n| a + n).hold(0);
    ///     Now::of((total.clone(), total))
    /// }).run().unwrap();
    /// sink.send(2);
    /// sink.send(3);
    /// assert_eq!(total.sample(), 5);
    /// ```
    pub fn fix<F>(arity: usize, f: F) -> Now<(M, O)>
        where F: FnOnce(M) -> Now<(M, O)> + 'static,
    {
        Now::from_fn(move || {
            let span = debug_span!("fix", arity);
            let _enter = span.enter();
            let (slots, placeholders) = M::declare(arity)?;
            let (real, out) = f(placeholders).run()?;
            commit(|| M::tie(&slots, &real))?;
            debug!(channels = real.len(), "knot tied");
            Ok((real, out))
        })
    }
}
