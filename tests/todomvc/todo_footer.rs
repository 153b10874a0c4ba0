//! The footer below the list.

use funnel::behavior::sequence;
use funnel::elements::{button, dynamic_text, footer, span, Props};
use funnel::{Behavior, Component, Stream};

use crate::item::Out;


fn items_left(items: &Behavior<Vec<Out>>) -> Behavior<usize> {
    items
        .map(|outs| sequence(&outs.iter().map(|o| o.completed.clone()).collect::<Vec<_>>()))
        .switch()
        .map(|done| done.into_iter().filter(|&d| !d).count())
}

fn count_label(n: usize) -> String {
    format!("{} item{} left", n, if n == 1 { "" } else { "s" })
}

/// Show the number of open items and a button clearing completed ones.
/// Yields the button's clicks.
pub fn todo_footer(
    items: &Behavior<Vec<Out>>,
    any_completed: &Behavior<bool>,
    empty: Behavior<bool>,
) -> Component<Stream<()>> {
    footer(
        Props::new().class("footer").toggle_class("hidden", empty),
        span(Props::new().class("todo-count"), dynamic_text(items_left(items).map(count_label)))
            .then(&button(
                Props::new()
                    .class("clear-completed")
                    .toggle_class("hidden", any_completed.map(|any| !any)),
                "Clear completed",
            )),
    )
}
