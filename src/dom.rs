//! A minimal, headless document tree.
//!
//! Components render into `Node`s. The tree supports what components need:
//! elements with ids, classes and attributes, text, children, and named
//! event streams fed by `dispatch`. A `Scope` owns the subscriptions that
//! keep rendered nodes in sync with behaviors, and a `Mount` tells a
//! component where to render and who owns its subscriptions.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, Weak};
use tracing::trace;

use crate::source::{read, write, Subscription};
use crate::stream::{Sink, Stream};


/// An event dispatched to a node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DomEvent {
    /// Current value of the target, for inputs.
    pub value: Option<String>,
    /// Key name, for keyboard events.
    pub key: Option<String>,
    /// Checked state, for checkboxes.
    pub checked: Option<bool>,
}

impl DomEvent {
    /// A plain click.
    pub fn click() -> DomEvent {
        DomEvent::default()
    }

    /// An edit leaving `value` in the target.
    pub fn input<S: Into<String>>(value: S) -> DomEvent {
        DomEvent { value: Some(value.into()), ..DomEvent::default() }
    }

    /// A key press.
    pub fn key<S: Into<String>>(key: S) -> DomEvent {
        DomEvent { key: Some(key.into()), ..DomEvent::default() }
    }

    /// A checkbox toggled to `checked`.
    pub fn change(checked: bool) -> DomEvent {
        DomEvent { checked: Some(checked), ..DomEvent::default() }
    }

    /// Attach the target's value.
    pub fn with_value<S: Into<String>>(self, value: S) -> DomEvent {
        DomEvent { value: Some(value.into()), ..self }
    }
}


enum Kind {
    Element(String),
    Text,
}

struct NodeData {
    kind: Kind,
    id: Option<String>,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    text: String,
    children: Vec<Node>,
    parent: Weak<RwLock<NodeData>>,
    listeners: HashMap<String, Sink<DomEvent>>,
}

/// A node of the document tree.
///
/// Nodes are shared handles: clones refer to the same node.
#[derive(Clone)]
pub struct Node {
    data: Arc<RwLock<NodeData>>,
}

impl Node {
    fn new(kind: Kind, text: String) -> Node {
        Node {
            data: Arc::new(RwLock::new(NodeData {
                kind,
                id: None,
                classes: vec![],
                attributes: BTreeMap::new(),
                text,
                children: vec![],
                parent: Weak::new(),
                listeners: HashMap::new(),
            })),
        }
    }

    /// Create a detached element.
    pub fn element<S: Into<String>>(tag: S) -> Node {
        Node::new(Kind::Element(tag.into()), String::new())
    }

    /// Create a detached text node.
    pub fn text<S: Into<String>>(content: S) -> Node {
        Node::new(Kind::Text, content.into())
    }

    /// Whether both handles refer to the same node.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// The tag name, `None` for text nodes.
    pub fn tag(&self) -> Option<String> {
        match read(&self.data).kind {
            Kind::Element(ref tag) => Some(tag.clone()),
            Kind::Text => None,
        }
    }

    /// The `id` attribute, if set.
    pub fn id(&self) -> Option<String> {
        read(&self.data).id.clone()
    }

    /// Set the `id` attribute.
    pub fn set_id<S: Into<String>>(&self, id: S) {
        write(&self.data).id = Some(id.into());
    }

    /// Classes in the order they were added.
    pub fn classes(&self) -> Vec<String> {
        read(&self.data).classes.clone()
    }

    /// Whether this node carries `class`.
    pub fn has_class(&self, class: &str) -> bool {
        read(&self.data).classes.iter().any(|c| c == class)
    }

    /// Add or remove a class.
    pub fn set_class(&self, class: &str, on: bool) {
        let mut data = write(&self.data);
        let present = data.classes.iter().position(|c| c == class);
        match (on, present) {
            (true, None) => data.classes.push(class.to_string()),
            (false, Some(index)) => { data.classes.remove(index); }
            _ => (),
        }
    }

    /// Look up an attribute other than `id` and `class`.
    pub fn attribute(&self, name: &str) -> Option<String> {
        read(&self.data).attributes.get(name).cloned()
    }

    /// Set an attribute, replacing any previous value.
    pub fn set_attribute<S: Into<String>>(&self, name: &str, value: S) {
        write(&self.data).attributes.insert(name.to_string(), value.into());
    }

    /// Remove an attribute if present.
    pub fn remove_attribute(&self, name: &str) {
        write(&self.data).attributes.remove(name);
    }

    /// Replace the text of a text node.
    pub fn set_text<S: Into<String>>(&self, content: S) {
        write(&self.data).text = content.into();
    }

    /// All text below this node, concatenated in document order.
    pub fn text_content(&self) -> String {
        let (own, children) = {
            let data = read(&self.data);
            (data.text.clone(), data.children.clone())
        };
        children.iter().fold(own, |mut acc, child| {
            acc.push_str(&child.text_content());
            acc
        })
    }

    /// Direct children, in order.
    pub fn children(&self) -> Vec<Node> {
        read(&self.data).children.clone()
    }

    /// The node this one is attached to, if any.
    pub fn parent(&self) -> Option<Node> {
        read(&self.data).parent.upgrade().map(|data| Node { data })
    }

    /// Append a child, detaching it from its previous parent.
    pub fn append(&self, child: &Node) {
        if let Some(old) = child.parent() {
            old.remove_child(child);
        }
        write(&child.data).parent = Arc::downgrade(&self.data);
        write(&self.data).children.push(child.clone());
    }

    /// Remove a direct child. Returns whether it was found.
    pub fn remove_child(&self, child: &Node) -> bool {
        let removed = {
            let mut data = write(&self.data);
            let before = data.children.len();
            data.children.retain(|c| !c.ptr_eq(child));
            data.children.len() != before
        };
        if removed {
            write(&child.data).parent = Weak::new();
        }
        removed
    }

    /// Depth-first search, starting at this node.
    fn find<P: Fn(&Node) -> bool>(&self, pred: &P, found: &mut Vec<Node>, first_only: bool) {
        if pred(self) {
            found.push(self.clone());
            if first_only {
                return;
            }
        }
        for child in self.children() {
            if first_only && !found.is_empty() {
                return;
            }
            child.find(pred, found, first_only);
        }
    }

    /// Find this node or a descendant by id.
    pub fn find_by_id(&self, id: &str) -> Option<Node> {
        let mut found = vec![];
        self.find(&|n: &Node| n.id().as_deref() == Some(id), &mut found, true);
        found.into_iter().next()
    }

    /// Find the first node carrying `class`, in document order.
    pub fn find_by_class(&self, class: &str) -> Option<Node> {
        let mut found = vec![];
        self.find(&|n: &Node| n.has_class(class), &mut found, true);
        found.into_iter().next()
    }

    /// Find all nodes carrying `class`, in document order.
    pub fn find_all_by_class(&self, class: &str) -> Vec<Node> {
        let mut found = vec![];
        self.find(&|n: &Node| n.has_class(class), &mut found, false);
        found
    }

    /// The stream of `event`s dispatched to this node.
    pub fn on(&self, event: &str) -> Stream<DomEvent> {
        write(&self.data).listeners
            .entry(event.to_string())
            .or_insert_with(Sink::new)
            .stream()
    }

    /// Fire `event` on this node. Nothing happens if nobody listens.
    pub fn dispatch(&self, event: &str, payload: DomEvent) {
        let sink = read(&self.data).listeners.get(event).cloned();
        trace!(event, listened = sink.is_some(), "dispatch");
        if let Some(sink) = sink {
            sink.send(payload);
        }
    }
}

/// Renders the subtree as markup.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = read(&self.data);
        let tag = match data.kind {
            Kind::Text => return f.write_str(&data.text),
            Kind::Element(ref tag) => tag,
        };
        write!(f, "<{}", tag)?;
        if let Some(ref id) = data.id {
            write!(f, " id=\"{}\"", id)?;
        }
        if !data.classes.is_empty() {
            write!(f, " class=\"{}\"", data.classes.join(" "))?;
        }
        for (name, value) in &data.attributes {
            write!(f, " {}=\"{}\"", name, value)?;
        }
        f.write_str(">")?;
        for child in &data.children {
            write!(f, "{}", child)?;
        }
        write!(f, "</{}>", tag)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}


#[derive(Default)]
struct ScopeData {
    subscriptions: Vec<Subscription>,
    children: Vec<Scope>,
    disposed: bool,
}

/// Owner of everything that keeps a rendered component alive.
///
/// Disposing a scope drops its subscriptions, so the nodes it rendered stop
/// following their behaviors. A parent keeps its child scopes alive and
/// disposes them along with itself.
#[derive(Clone, Default)]
pub struct Scope {
    data: Arc<Mutex<ScopeData>>,
}

impl Scope {
    /// An empty root scope.
    pub fn new() -> Scope {
        Scope::default()
    }

    fn lock(&self) -> MutexGuard<'_, ScopeData> {
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Create a scope that is disposed together with this one.
    ///
    /// Children disposed on their own are forgotten here.
    pub fn child(&self) -> Scope {
        let child = Scope::new();
        let mut data = self.lock();
        data.children.retain(|c| !c.is_disposed());
        if data.disposed {
            child.lock().disposed = true;
        } else {
            data.children.push(child.clone());
        }
        child
    }

    /// Keep a subscription until the scope is disposed.
    pub fn own(&self, subscription: Subscription) {
        let rejected = {
            let mut data = self.lock();
            if data.disposed {
                Some(subscription)
            } else {
                data.subscriptions.push(subscription);
                None
            }
        };
        drop(rejected);
    }

    /// Number of subscriptions owned directly by this scope.
    pub fn len(&self) -> usize {
        self.lock().subscriptions.len()
    }

    /// Whether this scope owns no subscriptions directly.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `dispose` has run, on this scope or on an ancestor.
    pub fn is_disposed(&self) -> bool {
        self.lock().disposed
    }

    /// Drop everything owned by this scope and its children.
    ///
    /// Must not be called from inside a transaction that is still
    /// propagating through the subscriptions being dropped. Behavior
    /// observers run after commit and are safe.
    pub fn dispose(&self) {
        let (subscriptions, children) = {
            let mut data = self.lock();
            data.disposed = true;
            (std::mem::take(&mut data.subscriptions), std::mem::take(&mut data.children))
        };
        trace!(subscriptions = subscriptions.len(), children = children.len(), "dispose scope");
        for child in children {
            child.dispose();
        }
        drop(subscriptions);
    }
}


/// Where a component renders, and the scope owning what it sets up.
#[derive(Clone)]
pub struct Mount {
    /// The node children are appended to.
    pub node: Node,
    /// Owner of the subscriptions made while rendering.
    pub scope: Scope,
}

impl Mount {
    /// Mount at `node`, owned by `scope`.
    pub fn new(node: Node, scope: Scope) -> Mount {
        Mount { node, scope }
    }

    /// Mount at `node` with a fresh scope.
    pub fn at(node: Node) -> Mount {
        Mount::new(node, Scope::new())
    }

    /// The same scope, rendering into another node.
    pub fn with_node(&self, node: Node) -> Mount {
        Mount::new(node, self.scope.clone())
    }
}
