//! Components: reusable pieces of UI with an output.
//!
//! A `Component<A>` renders into whatever `Mount` it is run at and yields an
//! `A`, usually some streams and behaviors describing what the user did.
//! Components can be run any number of times, each run producing fresh
//! nodes and a fresh output.
//!
//! The `component` function builds a component out of a *model* and a
//! *view* that feed each other: the view's output drives the model, and the
//! model's behaviors are displayed by the view.

use std::sync::Arc;
use tracing::debug;

use crate::dom::{Mount, Node, Scope};
use crate::error::{Error, Result};
use crate::feedback::{Feedback, StaticFeedback};
use crate::now::Now;


/// A description of UI that yields an `A` when run.
pub struct Component<A> {
    content: Arc<dyn Fn(&Mount) -> Now<A> + Send + Sync>,
}

impl<A> Clone for Component<A> {
    fn clone(&self) -> Component<A> {
        Component { content: self.content.clone() }
    }
}

impl<A: 'static> Component<A> {
    /// A component rendering through `f`.
    pub fn new<F>(f: F) -> Component<A>
        where F: Fn(&Mount) -> Now<A> + Send + Sync + 'static,
    {
        Component { content: Arc::new(f) }
    }

    /// A component rendering nothing, yielding `a`.
    pub fn of(a: A) -> Component<A>
        where A: Clone + Send + Sync,
    {
        Component::new(move |_| Now::of(a.clone()))
    }

    /// The computation rendering this component at `mount`.
    pub fn content(&self, mount: &Mount) -> Now<A> {
        (self.content)(mount)
    }

    /// Render and return the output.
    pub fn run(&self, mount: &Mount) -> Result<A> {
        self.content(mount).run()
    }

    /// Render this component, then the one built from its output, at the
    /// same mount.
    pub fn chain<B, F>(&self, f: F) -> Component<B>
        where B: 'static,
              F: Fn(A) -> Component<B> + Send + Sync + 'static,
    {
        let first = self.clone();
        let f = Arc::new(f);
        Component::new(move |mount| {
            let (f, mount2) = (f.clone(), mount.clone());
            first.content(mount).chain(move |a| f(a).content(&mount2))
        })
    }

    /// Transform the output.
    pub fn map<B, F>(&self, f: F) -> Component<B>
        where B: 'static,
              F: Fn(A) -> B + Send + Sync + 'static,
    {
        let inner = self.clone();
        let f = Arc::new(f);
        Component::new(move |mount| {
            let f = f.clone();
            inner.content(mount).map(move |a| f(a))
        })
    }

    /// Replace the output with a constant.
    pub fn map_to<B: Clone + Send + Sync + 'static>(&self, b: B) -> Component<B> {
        self.map(move |_| b.clone())
    }

    /// Render this component, then `next`, keeping only `next`'s output.
    pub fn then<B: 'static>(&self, next: &Component<B>) -> Component<B> {
        let next = next.clone();
        self.chain(move |_| next.clone())
    }

    /// Lift a function on outputs to a function on components.
    pub fn lift1<R, F>(f: F, a: &Component<A>) -> Component<R>
        where R: 'static,
              F: Fn(A) -> R + Send + Sync + 'static,
    {
        a.map(f)
    }

    /// Render both components in order and combine their outputs.
    pub fn lift2<B, R, F>(f: F, a: &Component<A>, b: &Component<B>) -> Component<R>
        where B: 'static,
              R: 'static,
              F: Fn(A, B) -> R + Send + Sync + 'static,
    {
        let (a, b) = (a.clone(), b.clone());
        let f = Arc::new(f);
        Component::new(move |mount| {
            let (f, b, mount2) = (f.clone(), b.clone(), mount.clone());
            a.content(mount).chain(move |ra| b.content(&mount2).map(move |rb| f(ra, rb)))
        })
    }

    /// Render three components in order and combine their outputs.
    pub fn lift3<B, C, R, F>(f: F, a: &Component<A>, b: &Component<B>, c: &Component<C>) -> Component<R>
        where B: 'static,
              C: 'static,
              R: 'static,
              F: Fn(A, B, C) -> R + Send + Sync + 'static,
    {
        let ab = Component::lift2(|ra, rb| (ra, rb), a, b);
        Component::lift2(move |(ra, rb), rc| f(ra, rb, rc), &ab, c)
    }
}

impl<A: 'static> Component<Component<A>> {
    /// Render the outer component, then the component it yields.
    pub fn flatten(&self) -> Component<A> {
        self.chain(|inner| inner)
    }
}

/// Lift a function of one to three outputs to components.
///
/// The components are rendered in argument order.
///
/// ```
/// # use funnel::{lift, Component, Mount, Node};
/// let sum = lift!(|a, b, c| a + b + c,
///     &Component::of(1), &Component::of(2), &Component::of(3));
/// assert_eq!(sum.run(&Mount::at(Node::element("div"))), Ok(6));
/// ```
///
/// Larger arities are rejected when compiling:
///
/// ```compile_fail
/// # use funnel::{lift, Component};
/// let c = Component::of(1);
/// let sum = lift!(|a, b, c, d| a + b + c + d, &c, &c, &c, &c);
/// ```
#[macro_export]
macro_rules! lift {
    ($f:expr, $a:expr $(,)?) => {
        $crate::Component::lift1($f, $a)
    };
    ($f:expr, $a:expr, $b:expr $(,)?) => {
        $crate::Component::lift2($f, $a, $b)
    };
    ($f:expr, $a:expr, $b:expr, $c:expr $(,)?) => {
        $crate::Component::lift3($f, $a, $b, $c)
    };
    ($f:expr, $($rest:expr),+ $(,)?) => {
        compile_error!("lift! takes one to three components")
    };
}


/// Build a component from a model and a view that depend on each other.
///
/// The view receives the model's behaviors, as placeholders at first, and
/// renders. Its output is handed to the model, which returns the behaviors
/// for the view together with the component's output. The number of
/// behaviors is fixed by the feedback type `F`.
///
/// ```
/// # use funnel::{component, Behavior, Mount, Node, Now, Stream};
/// # use funnel::dom::DomEvent;
/// # use funnel::elements::{button, dynamic_text, Props};
/// let counter = component(
///     |clicks: Stream<()>| Now::scan(&clicks, 0, |n, ()| n + 1).map(|count| {
///         let label = count.map(|n: u32| format!("{} clicks", n));
///         (label, count)
///     }),
///     |label: Behavior<String>| dynamic_text(label).then(&button(Props::new().class("inc"), "+")),
/// );
///
/// let root = Node::element("div");
/// let count = counter.run(&Mount::at(root.clone())).unwrap();
/// if let Some(inc) = root.find_by_class("inc") {
///     inc.dispatch("click", DomEvent::click());
/// }
/// assert_eq!(count.sample(), 1);
/// assert_eq!(root.text_content(), "1 clicks+");
/// ```
pub fn component<F, V, O, M, W>(model: M, view: W) -> Component<O>
    where F: StaticFeedback,
          V: 'static,
          O: 'static,
          M: Fn(V) -> Now<(F, O)> + Send + Sync + 'static,
          W: Fn(F) -> Component<V> + Send + Sync + 'static,
{
    component_with_arity(F::ARITY, model, view)
}

/// Like `component`, for feedback types of variable size such as
/// `Vec<Behavior<_>>`.
///
/// `arity` placeholders are declared for the view. If the model returns a
/// different number of behaviors, running the component fails with
/// `Error::ArityMismatch`.
///
/// A failed run leaves nothing behind: the view's nodes are detached again
/// and its subscriptions are dropped.
pub fn component_with_arity<F, V, O, M, W>(arity: usize, model: M, view: W) -> Component<O>
    where F: Feedback,
          V: 'static,
          O: 'static,
          M: Fn(V) -> Now<(F, O)> + Send + Sync + 'static,
          W: Fn(F) -> Component<V> + Send + Sync + 'static,
{
    let model = Arc::new(model);
    let view = Arc::new(view);
    Component::new(move |mount| {
        let (model, view, mount) = (model.clone(), view.clone(), mount.clone());
        Now::from_fn(move || {
            let before = mount.node.children();
            let scope = mount.scope.child();
            let inner = Mount::new(mount.node.clone(), scope.clone());
            let wired = Now::fix(arity, move |feedback: F| {
                view(feedback).content(&inner).chain(move |from_view| model(from_view))
            }).run();
            match wired {
                Ok((_, output)) => Ok(output),
                Err(err) => {
                    scope.dispose();
                    discard_since(&mount.node, &before);
                    debug!(%err, "component discarded");
                    Err(err)
                }
            }
        })
    })
}

/// Detach every child of `node` that is not among `before`.
fn discard_since(node: &Node, before: &[Node]) {
    for child in node.children() {
        if !before.iter().any(|old| old.ptr_eq(&child)) {
            node.remove_child(&child);
        }
    }
}

/// Run `main` at the node with `id` below `root`.
///
/// Returns the mount, whose scope keeps the rendered UI alive, and the
/// component's output.
pub fn run_main<A: 'static>(root: &Node, id: &str, main: &Component<A>) -> Result<(Mount, A)> {
    let node = root.find_by_id(id).ok_or_else(|| Error::MountNotFound(id.to_string()))?;
    let mount = Mount::new(node, Scope::new());
    let output = main.run(&mount)?;
    debug!(id, "mounted");
    Ok((mount, output))
}
