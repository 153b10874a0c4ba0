//! Functional reactive components
//!
//! *Funnel* builds user interfaces out of components: small pieces of UI
//! that render into a document tree and yield streams and behaviors
//! describing what happens in them. It sits on top of a push-pull
//! functional reactive core in the spirit of the
//! [Sodium](https://github.com/SodiumFRP/sodium/) libraries.
//!
//!
//! # Functional reactive primitives
//!
//! There are two basic types: `Stream` and `Behavior`. A stream is a
//! discrete sequence of events, a behavior is a value that changes over
//! time. The `Sink` type creates a stream from scratch by dumping values
//! into it. All of them are `Send + Sync + Clone`.
//!
//! Every change happens inside a transaction. Within a transaction all
//! behaviors read as they did before it started, and all of them change at
//! once when it commits.
//!
//! A `Placeholder` is a behavior that is used before it is defined. It is
//! the building block for circular wiring, where a value depends on itself
//! through a stream.
//!
//!
//! # Components
//!
//! A `Component<A>` renders into a `Mount`, a node together with the
//! `Scope` that owns its subscriptions, and yields an `A`. Components are
//! plain values, they can be combined with `chain`, `map` and the `lift!`
//! macro and run as often as needed.
//!
//! Most interesting components are built with `component(model, view)`.
//! The view renders the model's behaviors and yields what the user did,
//! the model turns that into new behaviors. The two depend on each other,
//! which is resolved by handing placeholders to the view and replacing them
//! once the model has run.
//!
//!
//! # Example
//!
//! A counter with a button:
//!
//! ```
//! # // NOTE: If you change this example, please update the README.md
//! # // accordingly, so that they remain in sync!
//! use funnel::{component, run_main, Behavior, Node, Now, Stream};
//! use funnel::dom::DomEvent;
//! use funnel::elements::{button, div, dynamic_text, Props};
//!
//! let counter = component(
//!     // The model counts clicks, starting now.
//!     |clicks: Stream<()>| Now::scan(&clicks, 0, |n, ()| n + 1).map(|count| {
//!         (count.map(|n: u32| format!("clicked {} times", n)), count)
//!     }),
//!     // The view shows what the model computed.
//!     |label: Behavior<String>| div(
//!         Props::new(),
//!         dynamic_text(label).then(&button(Props::new().class("inc"), "+")),
//!     ),
//! );
//!
//! let body = Node::element("body");
//! body.set_id("app");
//! let (_mount, count) = run_main(&body, "app", &counter).unwrap();
//!
//! let inc = body.find_by_class("inc").unwrap();
//! inc.dispatch("click", DomEvent::click());
//! inc.dispatch("click", DomEvent::click());
//!
//! assert_eq!(count.sample(), 2);
//! assert_eq!(body.text_content(), "clicked 2 times+");
//! ```
//!
//! Note that the returned mount has to be kept around: disposing of its
//! scope detaches the rendered nodes from their behaviors.
//!
//! The functions handed to the reactive primitives should be free of side
//! effects. Effects belong into `Behavior::observe` callbacks, which run
//! after a transaction has committed.

#![warn(missing_docs)]

pub use crate::behavior::{Behavior, Placeholder};
pub use crate::component::{component, component_with_arity, run_main, Component};
pub use crate::dom::{Mount, Node, Scope};
pub use crate::error::{Error, Result};
pub use crate::feedback::{Feedback, StaticFeedback};
pub use crate::now::Now;
pub use crate::source::Subscription;
pub use crate::stream::{Events, Sink, Stream};

mod transaction;
mod source;
mod pending;
pub mod behavior;
pub mod stream;
pub mod error;
pub mod now;
pub mod feedback;
pub mod component;
pub mod dom;
pub mod elements;
pub mod list;

#[cfg(test)]
mod testing;
