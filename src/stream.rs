//! Streams of discrete events

use std::sync::mpsc::{channel, Receiver};
use std::sync::{Arc, Mutex, RwLock, Weak};

use crate::behavior::{self, Behavior, Placeholder};
use crate::source::{rewire, with_weak, write, BoxClone, CallbackError, CallbackResult, Source};
use crate::transaction::commit;


/// An event sink.
///
/// This primitive is a way of generating streams of events. One can send
/// input values into a sink and generate a stream that fires all these inputs
/// as events:
///
/// ```
/// # use funnel::Sink;
/// // A new sink
/// let sink = Sink::new();
///
/// // Make an iterator over a stream.
/// let mut events = sink.stream().events();
///
/// // Send a value into the sink
/// sink.send(5);
///
/// // The stream
/// assert_eq!(events.next(), Some(5));
/// ```
///
/// You can also feed a sink with an iterator:
///
/// ```
/// # use funnel::Sink;
/// # let sink = Sink::new();
/// # let mut events = sink.stream().events();
/// sink.feed(20..40);
/// assert_eq!(events.take(4).collect::<Vec<_>>(), vec![20, 21, 22, 23]);
/// ```
pub struct Sink<A> {
    source: Arc<RwLock<Source<A>>>,
}

impl<A> Clone for Sink<A> {
    fn clone(&self) -> Sink<A> {
        Sink { source: self.source.clone() }
    }
}

impl<A: Send + Sync> Default for Sink<A> {
    fn default() -> Sink<A> {
        Sink::new()
    }
}

impl<A: Send + Sync> Sink<A> {
    /// Create a new sink.
    pub fn new() -> Sink<A> {
        Sink { source: Arc::new(RwLock::new(Source::new())) }
    }

    /// Generate a stream that fires all events sent into the sink.
    pub fn stream(&self) -> Stream<A> {
        Stream { source: self.source.clone(), keep_alive: Box::new(()) }
    }
}

impl<A: Send + Sync + Clone + 'static> Sink<A> {
    /// Feed values from an iterator into the sink.
    pub fn feed<I: IntoIterator<Item = A>>(&self, iterator: I) {
        for event in iterator {
            self.send(event);
        }
    }

    /// Send a value into the sink.
    ///
    /// When a value is sent into the sink, an event is fired in all dependent
    /// streams.
    pub fn send(&self, a: A) {
        commit(|| write(&self.source).send(a))
    }
}


/// A stream of discrete events.
///
/// Streams are ordered by the transaction system: the consequences of one
/// event are atomically reflected in all dependent streams and behaviors.
///
/// # Algebraic laws
///
/// Streams of the same type form a monoid under merging with
/// `Stream::never()` as the neutral element, and a functor under `map`:
///
/// - `Stream::never().merge(&a) == a` and `a.merge(&Stream::never()) == a`,
/// - `a.merge(&b).merge(&c) == a.merge(&b.merge(&c))`,
/// - `a.map(|x| x) == a` and `a.map(f).map(g) == a.map(|x| g(f(x)))`.
///
/// *Equality here means the expressions fire identical events.*
pub struct Stream<A> {
    pub(crate) source: Arc<RwLock<Source<A>>>,
    #[allow(dead_code)]
    keep_alive: Box<dyn BoxClone>,
}

impl<A> Clone for Stream<A> {
    fn clone(&self) -> Stream<A> {
        Stream {
            source: self.source.clone(),
            keep_alive: self.keep_alive.box_clone(),
        }
    }
}

impl<A: Clone + Send + Sync + 'static> Stream<A> {
    /// Create a stream that never fires. This can be useful in certain
    /// situations, where a stream is logically required, but no events are
    /// expected.
    pub fn never() -> Stream<A> {
        Stream {
            source: Arc::new(RwLock::new(Source::new())),
            keep_alive: Box::new(()),
        }
    }

    /// Wrap a source fed from elsewhere in this crate.
    pub(crate) fn from_source<K: BoxClone + 'static>(source: Arc<RwLock<Source<A>>>, keep_alive: K) -> Stream<A> {
        Stream { source, keep_alive: Box::new(keep_alive) }
    }

    /// Register a callback on this stream's source, forwarding into a fresh
    /// stream that keeps `keep_alive` around.
    fn derive<B, F, K>(&self, keep_alive: K, mut forward: F) -> Stream<B>
        where B: Send + Sync + Clone + 'static,
              F: FnMut(&Weak<RwLock<Source<B>>>, A) -> CallbackResult + Send + Sync + 'static,
              K: BoxClone + 'static,
    {
        commit(|| {
            let src = Arc::new(RwLock::new(Source::new()));
            let weak = Arc::downgrade(&src);
            write(&self.source).register(move |a| forward(&weak, a));
            Stream { source: src, keep_alive: Box::new(keep_alive) }
        })
    }

    /// Map the stream to another stream using a function.
    ///
    /// ```
    /// # use funnel::Sink;
    /// let sink: Sink<i32> = Sink::new();
    /// let mut events = sink.stream().map(|x| x + 4).events();
    /// sink.send(3);
    /// assert_eq!(events.next(), Some(7));
    /// ```
    pub fn map<B, F>(&self, f: F) -> Stream<B>
        where B: Send + Sync + Clone + 'static,
              F: Fn(A) -> B + Send + Sync + 'static,
    {
        self.derive(self.clone(), move |weak, a| with_weak(weak, |src| src.send(f(a))))
    }

    /// Replace every event by a constant.
    pub fn map_to<B: Send + Sync + Clone + 'static>(&self, b: B) -> Stream<B> {
        self.map(move |_| b.clone())
    }

    /// Filter a stream according to a predicate.
    ///
    /// ```
    /// # use funnel::Sink;
    /// let sink: Sink<i32> = Sink::new();
    /// let mut events = sink.stream()
    ///     .filter(|&x| (x >= 4) && (x <= 10))
    ///     .events();
    /// sink.send(2); // won't arrive
    /// sink.send(5); // will arrive
    /// assert_eq!(events.next(), Some(5));
    /// ```
    pub fn filter<F>(&self, f: F) -> Stream<A>
        where F: Fn(&A) -> bool + Send + Sync + 'static,
    {
        self.filter_map(move |a| if f(&a) { Some(a) } else { None })
    }

    /// Both filter and map a stream.
    ///
    /// This is equivalent to `.map(f).filter_some()`.
    pub fn filter_map<B, F>(&self, f: F) -> Stream<B>
        where B: Send + Sync + Clone + 'static,
              F: Fn(A) -> Option<B> + Send + Sync + 'static,
    {
        self.map(f).filter_some()
    }

    /// Merge with another stream.
    ///
    /// ```
    /// # use funnel::Sink;
    /// let sink_1 = Sink::<i32>::new();
    /// let sink_2 = Sink::<i32>::new();
    /// let mut events = sink_1.stream().merge(&sink_2.stream()).events();
    /// sink_1.send(2);
    /// assert_eq!(events.next(), Some(2));
    /// sink_2.send(4);
    /// assert_eq!(events.next(), Some(4));
    /// ```
    pub fn merge(&self, other: &Stream<A>) -> Stream<A> {
        Stream::merge_all(vec![self.clone(), other.clone()])
    }

    /// Merge any number of streams into one.
    ///
    /// An empty collection yields a stream that never fires.
    pub fn merge_all<I: IntoIterator<Item = Stream<A>>>(streams: I) -> Stream<A> {
        let parents: Vec<Stream<A>> = streams.into_iter().collect();
        commit(|| {
            let src = Arc::new(RwLock::new(Source::new()));
            for parent in &parents {
                let weak = Arc::downgrade(&src);
                write(&parent.source)
                    .register(move |a| with_weak(&weak, |src| src.send(a)));
            }
            Stream { source: src, keep_alive: Box::new(parents) }
        })
    }

    /// Hold an event in a behavior.
    ///
    /// The resulting behavior `hold`s the value of the last event fired by the
    /// stream.
    ///
    /// ```
    /// # use funnel::Sink;
    /// let sink = Sink::new();
    /// let behavior = sink.stream().hold(0);
    /// assert_eq!(behavior.sample(), 0);
    /// sink.send(2);
    /// assert_eq!(behavior.sample(), 2);
    /// ```
    pub fn hold(&self, initial: A) -> Behavior<A> {
        behavior::hold(initial, self)
    }

    /// Sample a behavior whenever this stream fires.
    ///
    /// The behavior is read as it was before the current transaction.
    pub fn snapshot<B, C, F>(&self, behavior: &Behavior<B>, f: F) -> Stream<C>
        where B: Clone + Send + Sync + 'static,
              C: Clone + Send + Sync + 'static,
              F: Fn(B, A) -> C + Send + Sync + 'static,
    {
        let sampled = behavior.clone();
        self.derive((self.clone(), behavior.clone()), move |weak, a| {
            if weak.strong_count() == 0 {
                return Err(CallbackError::Disappeared);
            }
            match sampled.sample_raw() {
                Ok(b) => with_weak(weak, |src| src.send(f(b, a))),
                Err(err) => panic!("snapshot: {}", err),
            }
        })
    }

    /// Accumulate the events of a stream in a behavior.
    ///
    /// Starting at some initial value, each new event changes the value of the
    /// resulting behavior as prescribed by the supplied function.
    ///
    /// ```
    /// # use funnel::Sink;
    /// let sink = Sink::new();
    /// let sum = sink.stream().scan(0, |a, b| a + b);
    /// assert_eq!(sum.sample(), 0);
    /// sink.send(2);
    /// assert_eq!(sum.sample(), 2);
    /// sink.send(4);
    /// assert_eq!(sum.sample(), 6);
    /// ```
    pub fn scan<B, F>(&self, initial: B, f: F) -> Behavior<B>
        where B: Send + Sync + Clone + 'static,
              F: Fn(B, A) -> B + Send + Sync + 'static,
    {
        commit(|| {
            let acc = Placeholder::new();
            let def = self.snapshot(&acc.behavior(), f).hold(initial);
            acc.redirect(&def);
            def
        })
    }

    /// Accumulate the events of a stream, firing every new accumulator.
    ///
    /// ```
    /// # use funnel::Sink;
    /// let sink = Sink::new();
    /// let mut totals = sink.stream().scan_stream(10, |a, b| a + b).events();
    /// sink.send(1);
    /// sink.send(2);
    /// assert_eq!(totals.next(), Some(11));
    /// assert_eq!(totals.next(), Some(13));
    /// ```
    pub fn scan_stream<B, F>(&self, initial: B, f: F) -> Stream<B>
        where B: Send + Sync + Clone + 'static,
              F: Fn(B, A) -> B + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let acc = {
            let f = f.clone();
            self.scan(initial, move |b, a| f(b, a))
        };
        self.snapshot(&acc, move |b, a| f(b, a))
    }

    /// A blocking iterator over the stream.
    pub fn events(&self) -> Events<A> { Events::new(self) }
}

impl<A: Clone + Send + Sync + 'static> Stream<Option<A>> {
    /// Filter a stream of options.
    ///
    /// `filter_some` creates a new stream that only fires the unwrapped
    /// `Some(…)` events from the original stream omitting any `None` events.
    ///
    /// ```
    /// # use funnel::Sink;
    /// let sink = Sink::new();
    /// let mut events = sink.stream().filter_some().events();
    /// sink.send(None); // won't arrive
    /// sink.send(Some(5)); // will arrive
    /// assert_eq!(events.next(), Some(5));
    /// ```
    pub fn filter_some(&self) -> Stream<A> {
        self.derive(self.clone(), |weak, a| a.map_or(
            Ok(()),
            |a| with_weak(weak, |src| src.send(a))
        ))
    }
}

impl<A: Send + Sync + Clone + 'static> Stream<Stream<A>> {
    /// Switch between streams.
    ///
    /// This takes a stream of streams and maps it to a new stream, which fires
    /// all events from the most recent stream fired into it.
    ///
    /// ```
    /// # use funnel::{ Sink, Stream };
    /// let stream_sink: Sink<Stream<i32>> = Sink::new();
    /// let sink1: Sink<i32> = Sink::new();
    /// let sink2: Sink<i32> = Sink::new();
    /// let mut events = stream_sink.stream().switch().events();
    ///
    /// // Should not receive events from either sink
    /// sink1.send(1); sink2.send(2);
    ///
    /// stream_sink.send(sink2.stream());
    /// sink1.send(3); sink2.send(4);
    /// assert_eq!(events.next(), Some(4));
    /// ```
    pub fn switch(&self) -> Stream<A> {
        let mut terminate = Arc::new(());
        self.derive(self.clone(), move |weak, stream| {
            rewire(&stream.source, weak.clone(), &mut terminate);
            Ok(())
        })
    }
}


/// A blocking iterator over events in a stream.
pub struct Events<A> {
    receiver: Receiver<A>,
    #[allow(dead_code)]
    keep_alive: Box<dyn BoxClone>,
}

impl<A: Send + Sync + Clone + 'static> Events<A> {
    /// Create a new events iterator.
    fn new(stream: &Stream<A>) -> Events<A> {
        commit(|| {
            let (tx, rx) = channel();
            let tx = Mutex::new(tx);
            write(&stream.source).register(move |a| tx
                .lock()
                .map_err(|_| CallbackError::Poisoned)?
                .send(a)
                .map_err(|_| CallbackError::Disappeared)
            );
            Events {
                receiver: rx,
                keep_alive: Box::new(stream.clone()),
            }
        })
    }

    /// Drain the events that have fired so far without blocking.
    pub fn pending(&mut self) -> Vec<A> {
        self.receiver.try_iter().collect()
    }
}

impl<A: Send + Sync + 'static> Iterator for Events<A> {
    type Item = A;
    fn next(&mut self) -> Option<A> { self.receiver.recv().ok() }
}
