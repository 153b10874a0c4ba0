//! A single todo item.

use funnel::elements::{button, checkbox, div, label, li, text, CheckboxOutput, Props};
use funnel::{component, lift, Behavior, Component, Now, Stream};


/// What an item is created from.
#[derive(Clone, Debug, PartialEq)]
pub struct Params {
    pub id: u32,
    pub name: String,
}

/// What an item yields.
#[derive(Clone)]
pub struct Out {
    pub id: u32,
    pub completed: Behavior<bool>,
    /// Fires the item's id when its destroy button is clicked.
    pub destroy: Stream<u32>,
}

struct FromView {
    toggled: Stream<bool>,
    destroy: Stream<()>,
}

/// Render an item. `toggle_all` overrides the completion state of every
/// item at once.
pub fn item(params: Params, toggle_all: Stream<bool>) -> Component<Out> {
    let Params { id, name } = params;
    component(
        move |from: FromView| {
            let completed = from.toggled.merge(&toggle_all).hold(false);
            let out = Out { id, completed: completed.clone(), destroy: from.destroy.map_to(id) };
            Now::of((completed, out))
        },
        move |completed: Behavior<bool>| li(
            Props::new()
                .id(format!("todo-{}", id))
                .toggle_class("completed", completed.clone()),
            div(Props::new().class("view"), lift!(
                |toggle: CheckboxOutput, (), destroy| FromView { toggled: toggle.changes, destroy },
                &checkbox(Props::new().class("toggle").toggle_attribute("checked", completed.clone())),
                &label(Props::new(), text(&name)),
                &button(Props::new().class("destroy"), ""),
            )),
        ),
    )
}
