//! Keyed list rendering.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::behavior::Behavior;
use crate::component::Component;
use crate::dom::{Mount, Node, Scope};
use crate::error::{Error, Result};
use crate::now::Now;
use crate::stream::Sink;


struct Entry<O> {
    nodes: Vec<Node>,
    scope: Scope,
    output: O,
}

struct Reconciler<P, K, O> {
    item: Arc<dyn Fn(P) -> Component<O> + Send + Sync>,
    key: Arc<dyn Fn(&P) -> K + Send + Sync>,
    parent: Node,
    scope: Scope,
    entries: Mutex<Vec<(K, Entry<O>)>>,
    outputs: Sink<Vec<O>>,
}

impl<P, K, O> Reconciler<P, K, O>
    where P: Clone + Send + Sync + 'static,
          K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
          O: Clone + Send + Sync + 'static,
{
    fn entries(&self) -> MutexGuard<'_, Vec<(K, Entry<O>)>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run the item component in a detached fragment with its own scope.
    fn create(&self, params: P) -> Result<Entry<O>> {
        let fragment = Node::element("fragment");
        let scope = self.scope.child();
        match (self.item)(params).run(&Mount::new(fragment.clone(), scope.clone())) {
            Ok(output) => {
                let nodes = fragment.children();
                for node in &nodes {
                    fragment.remove_child(node);
                }
                Ok(Entry { nodes, scope, output })
            }
            Err(err) => {
                scope.dispose();
                Err(err)
            }
        }
    }

    fn discard(&self, entry: &Entry<O>) {
        for node in &entry.nodes {
            self.parent.remove_child(node);
        }
        entry.scope.dispose();
    }

    /// Bring the rendered items in line with `params`.
    ///
    /// Items whose key is still present keep their nodes, scope and output.
    /// New keys are rendered once, vanished keys are detached and their
    /// scope disposed.
    fn reconcile(&self, params: Vec<P>) -> Result<()> {
        let outputs = {
            let mut entries = self.entries();
            let mut old: HashMap<K, Entry<O>> = entries.drain(..).collect();
            let mut next: Vec<(K, Entry<O>)> = Vec::with_capacity(params.len());
            let mut added = 0;
            for p in params {
                let key = (self.key)(&p);
                if next.iter().any(|(k, _)| *k == key) {
                    warn!(?key, "duplicate list key, item skipped");
                    continue;
                }
                let entry = match old.remove(&key) {
                    Some(entry) => entry,
                    None => match self.create(p) {
                        Ok(entry) => {
                            added += 1;
                            entry
                        }
                        Err(err) => {
                            entries.extend(next);
                            entries.extend(old);
                            return Err(err);
                        }
                    },
                };
                next.push((key, entry));
            }
            for entry in old.values() {
                self.discard(entry);
            }
            for (_, entry) in &next {
                for node in &entry.nodes {
                    self.parent.remove_child(node);
                }
            }
            for (_, entry) in &next {
                for node in &entry.nodes {
                    self.parent.append(node);
                }
            }
            debug!(added, removed = old.len(), len = next.len(), "list reconciled");
            let outputs = next.iter().map(|(_, entry)| entry.output.clone()).collect();
            *entries = next;
            outputs
        };
        self.outputs.send(outputs);
        Ok(())
    }
}

/// Render one `item` per element of `items`, keyed by `key`.
///
/// The nodes of all items are kept at the end of the mount node, in the
/// order of `items`. An item is rendered once when its key first appears
/// and disposed when the key disappears. The result holds the outputs of
/// the current items, in order.
///
/// ```
/// # use funnel::{Mount, Node, Sink};
/// # use funnel::elements::{li, text, Props};
/// # use funnel::list::list;
/// let names = Sink::new();
/// let items = list(
///     |name: String| li(Props::new(), text(&name)).map_to(name.len()),
///     |name| name.clone(),
///     names.stream().hold(vec!["ab".to_string()]),
/// );
/// let root = Node::element("ul");
/// let lengths = items.run(&Mount::at(root.clone())).unwrap();
/// assert_eq!(lengths.sample(), vec![2]);
///
/// names.send(vec!["xyz".to_string(), "ab".to_string()]);
/// assert_eq!(lengths.sample(), vec![3, 2]);
/// assert_eq!(root.to_string(), "<ul><li>xyz</li><li>ab</li></ul>");
/// ```
pub fn list<P, K, O, I, KF>(item: I, key: KF, items: Behavior<Vec<P>>) -> Component<Behavior<Vec<O>>>
    where P: Clone + Send + Sync + 'static,
          K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
          O: Clone + Send + Sync + 'static,
          I: Fn(P) -> Component<O> + Send + Sync + 'static,
          KF: Fn(&P) -> K + Send + Sync + 'static,
{
    let item: Arc<dyn Fn(P) -> Component<O> + Send + Sync> = Arc::new(item);
    let key: Arc<dyn Fn(&P) -> K + Send + Sync> = Arc::new(key);
    Component::new(move |mount| {
        let (item, key, items, mount) = (item.clone(), key.clone(), items.clone(), mount.clone());
        Now::from_fn(move || {
            let outputs = Sink::new();
            let output = outputs.stream().hold(Vec::new());
            let reconciler = Arc::new(Reconciler {
                item,
                key,
                parent: mount.node.clone(),
                scope: mount.scope.child(),
                entries: Mutex::new(Vec::new()),
                outputs,
            });
            match items.try_sample() {
                Ok(params) => reconciler.reconcile(params)?,
                Err(Error::Unresolved) => (),
                Err(err) => return Err(err),
            }
            mount.scope.own(items.observe(move |params| {
                if let Err(err) = reconciler.reconcile(params) {
                    warn!(%err, "list item failed to render");
                }
            }));
            Ok(output)
        })
    })
}
