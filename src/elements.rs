//! Components for common elements.

use std::sync::Arc;

use crate::behavior::Behavior;
use crate::component::Component;
use crate::dom::{DomEvent, Mount, Node, Scope};
use crate::error::{Error, Result};
use crate::now::Now;
use crate::stream::Stream;


/// Call `apply` with the value of `behavior` now, if it is known yet, and
/// after every change for as long as `scope` is not disposed.
///
/// A behavior still waiting for its placeholder is first applied when the
/// placeholder is replaced.
pub fn bind<A, F>(scope: &Scope, behavior: &Behavior<A>, apply: F) -> Result<()>
    where A: Clone + Send + Sync + 'static,
          F: Fn(A) + Send + Sync + 'static,
{
    match behavior.try_sample() {
        Ok(a) => apply(a),
        Err(Error::Unresolved) => (),
        Err(err) => return Err(err),
    }
    scope.own(behavior.observe(apply));
    Ok(())
}


/// Static and dynamic properties of an element.
///
/// ```
/// # use funnel::{Behavior, Mount, Node};
/// # use funnel::elements::{div, text, Props};
/// let props = Props::new()
///     .id("main")
///     .class("panel")
///     .toggle_class("hidden", Behavior::constant(true));
/// let root = Node::element("body");
/// div(props, text("hi")).run(&Mount::at(root.clone())).unwrap();
/// assert_eq!(root.to_string(), "<body><div id=\"main\" class=\"panel hidden\">hi</div></body>");
/// ```
#[derive(Clone, Default)]
pub struct Props {
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, String)>,
    class_toggles: Vec<(String, Behavior<bool>)>,
    attribute_toggles: Vec<(String, Behavior<bool>)>,
}

impl Props {
    /// No id, classes or attributes.
    pub fn new() -> Props {
        Props::default()
    }

    /// Set the element's id.
    pub fn id<S: Into<String>>(mut self, id: S) -> Props {
        self.id = Some(id.into());
        self
    }

    /// Add a static class. Several classes may be given separated by
    /// whitespace.
    pub fn class(mut self, classes: &str) -> Props {
        self.classes.extend(classes.split_whitespace().map(String::from));
        self
    }

    /// Add a static attribute.
    pub fn attribute<S: Into<String>>(mut self, name: &str, value: S) -> Props {
        self.attributes.push((name.to_string(), value.into()));
        self
    }

    /// Carry `class` whenever `on` is true.
    pub fn toggle_class(mut self, class: &str, on: Behavior<bool>) -> Props {
        self.class_toggles.push((class.to_string(), on));
        self
    }

    /// Set the empty attribute `name` whenever `on` is true, like `checked`
    /// or `disabled`.
    pub fn toggle_attribute(mut self, name: &str, on: Behavior<bool>) -> Props {
        self.attribute_toggles.push((name.to_string(), on));
        self
    }

    fn apply(&self, node: &Node, scope: &Scope) -> Result<()> {
        if let Some(ref id) = self.id {
            node.set_id(id.clone());
        }
        for class in &self.classes {
            node.set_class(class, true);
        }
        for (name, value) in &self.attributes {
            node.set_attribute(name, value.clone());
        }
        for (class, on) in &self.class_toggles {
            let (node, class) = (node.clone(), class.clone());
            bind(scope, on, move |on| node.set_class(&class, on))?;
        }
        for (name, on) in &self.attribute_toggles {
            let (node, name) = (node.clone(), name.clone());
            bind(scope, on, move |on| if on {
                node.set_attribute(&name, "");
            } else {
                node.remove_attribute(&name);
            })?;
        }
        Ok(())
    }
}


/// Create the node for an element, append it at the mount and run `inside`
/// with a mount at the new node.
fn create<A, F>(tag: &str, props: Props, inside: F) -> Component<A>
    where A: 'static,
          F: Fn(&Mount) -> Result<A> + Send + Sync + 'static,
{
    let tag = tag.to_string();
    let inside = Arc::new(inside);
    Component::new(move |mount| {
        let (tag, props, inside, mount) = (tag.clone(), props.clone(), inside.clone(), mount.clone());
        Now::from_fn(move || {
            let node = Node::element(tag);
            props.apply(&node, &mount.scope)?;
            mount.node.append(&node);
            inside(&mount.with_node(node))
        })
    })
}

/// An element with `child` rendered inside.
pub fn element<A: 'static>(tag: &str, props: Props, child: Component<A>) -> Component<A> {
    create(tag, props, move |inner| child.run(inner))
}

macro_rules! tags {
    ($($tag:ident),+) => {
        $(
            #[doc = concat!("A `<", stringify!($tag), ">` element.")]
            pub fn $tag<A: 'static>(props: Props, child: Component<A>) -> Component<A> {
                element(stringify!($tag), props, child)
            }
        )+
    }
}

tags!(div, section, header, footer, h1, p, ul, li, span, label);

/// Static text.
pub fn text(content: &str) -> Component<()> {
    let content = content.to_string();
    Component::new(move |mount| {
        let (content, mount) = (content.clone(), mount.clone());
        Now::from_fn(move || {
            mount.node.append(&Node::text(content));
            Ok(())
        })
    })
}

/// Text following a behavior.
pub fn dynamic_text(content: Behavior<String>) -> Component<()> {
    Component::new(move |mount| {
        let (content, mount) = (content.clone(), mount.clone());
        Now::from_fn(move || {
            let node = Node::text("");
            mount.node.append(&node);
            bind(&mount.scope, &content, move |s| node.set_text(s))
        })
    })
}


/// What a text input yields.
#[derive(Clone)]
pub struct InputOutput {
    /// The text currently in the input.
    pub value: Behavior<String>,
    /// Fires the trimmed text when Enter is pressed on a non-blank input.
    /// The input is cleared afterwards.
    pub enter: Stream<String>,
}

/// A text input.
pub fn input(props: Props) -> Component<InputOutput> {
    create("input", props.attribute("type", "text"), |Mount { node, scope }| {
        let edits = node.on("input").filter_map(|ev: DomEvent| ev.value);
        let keyups = node.on("keyup");
        let (_, output) = Now::fix(1, move |value: Behavior<String>| {
            let enter = keyups
                .filter(|ev| ev.key.as_deref() == Some("Enter"))
                .snapshot(&value, |current, ev: DomEvent| ev.value.unwrap_or(current))
                .filter_map(|text| {
                    let trimmed = text.trim();
                    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
                });
            let real = edits.merge(&enter.map_to(String::new())).hold(String::new());
            Now::of((real.clone(), InputOutput { value: real, enter }))
        }).run()?;
        let node = node.clone();
        bind(scope, &output.value, move |v| node.set_attribute("value", v))?;
        Ok(output)
    })
}

/// What a checkbox yields.
#[derive(Clone)]
pub struct CheckboxOutput {
    /// Whether the box is checked. Starts unchecked.
    pub checked: Behavior<bool>,
    /// Fires the new state whenever the user toggles the box.
    pub changes: Stream<bool>,
}

/// A checkbox.
pub fn checkbox(props: Props) -> Component<CheckboxOutput> {
    create("input", props.attribute("type", "checkbox"), |Mount { node, scope }| {
        let changes = node.on("change").filter_map(|ev: DomEvent| ev.checked);
        let checked = changes.hold(false);
        let node = node.clone();
        bind(scope, &checked, move |on| if on {
            node.set_attribute("checked", "");
        } else {
            node.remove_attribute("checked");
        })?;
        Ok(CheckboxOutput { checked, changes })
    })
}

/// A button labelled `label`, yielding its clicks.
pub fn button(props: Props, label: &str) -> Component<Stream<()>> {
    let label = label.to_string();
    create("button", props, move |Mount { node, .. }| {
        node.append(&Node::text(label.clone()));
        Ok(node.on("click").map_to(()))
    })
}
