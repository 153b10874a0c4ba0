//! Utilities for the test suite.

use std::fmt::Debug;

use crate::behavior::{lift2, Behavior};
use crate::stream::Stream;


/// The identity function.
pub fn id<T>(t: T) -> T { t }

/// Record everything a stream fires from now on.
pub fn record<T>(stream: &Stream<T>) -> Behavior<Vec<T>>
    where T: Clone + Send + Sync + 'static
{
    stream.scan(vec![], |mut seen, t| { seen.push(t); seen })
}

/// Trace equality of the events fired by two streams.
///
/// The resulting behavior explains the first difference, if any.
pub fn stream_eq<T>(a: &Stream<T>, b: &Stream<T>) -> Behavior<Result<(), String>>
    where T: PartialEq + Debug + Clone + Send + Sync + 'static
{
    lift2(
        |a, b| if a == b { Ok(()) } else { Err(format!("{:?} != {:?}", a, b)) },
        &record(a),
        &record(b),
    )
}


/// Self-tests.
#[cfg(test)]
mod test {
    use crate::stream::{Sink, Stream};
    use super::{record, stream_eq};

    #[test]
    fn record_in_order() {
        let sink = Sink::new();
        let seen = record(&sink.stream());
        sink.feed(vec![3, 1, 2]);
        assert_eq!(seen.sample(), vec![3, 1, 2]);
    }

    #[test]
    fn stream_eq_same_stream() {
        let sink = Sink::new();
        let eq = stream_eq(&sink.stream(), &sink.stream());
        sink.feed(0..5);
        assert_eq!(eq.sample(), Ok(()));
    }

    #[test]
    fn stream_eq_detects_difference() {
        let sink = Sink::new();
        let eq = stream_eq(&sink.stream(), &Stream::never());
        sink.send(1);
        assert_eq!(eq.sample(), Err("[1] != []".to_string()));
    }
}
