//! Circular wiring between views and models.

use funnel::dom::DomEvent;
use funnel::elements::{button, div, dynamic_text, input, text, Props};
use funnel::{
    component, component_with_arity, lift, Behavior, Component, Error, Mount, Node, Now,
    Placeholder, Sink, Stream,
};
use quickcheck::quickcheck;
use std::sync::{Arc, Mutex};


fn mount() -> (Node, Mount) {
    let root = Node::element("div");
    (root.clone(), Mount::at(root))
}

#[test]
fn running_total() {
    // The view shows the total computed by the model from the view's own
    // input.
    let adder = component(
        |entered: Stream<String>| {
            let numbers = entered.filter_map(|s| s.parse::<i64>().ok());
            Now::scan(&numbers, 0i64, |total, n| total + n).map(|total| {
                (total.map(|t| format!("total: {}", t)), total)
            })
        },
        |shown: Behavior<String>| div(
            Props::new(),
            input(Props::new().class("number"))
                .chain(move |out| dynamic_text(shown.clone()).map_to(out.enter.clone())),
        ),
    );
    let (root, mount) = mount();
    let total = adder.run(&mount).unwrap();
    assert_eq!(root.text_content(), "total: 0");

    let field = root.find_by_class("number").unwrap();
    for n in &["3", "x", "4", "-10"] {
        field.dispatch("keyup", DomEvent::key("Enter").with_value(*n));
    }
    assert_eq!(total.sample(), -3);
    assert_eq!(root.text_content(), "total: -3");
}

#[test]
fn model_returns_fewer_behaviors_than_declared() {
    let broken = component_with_arity(
        4,
        |()| Now::of(((0..3).map(Behavior::constant).collect::<Vec<Behavior<u8>>>(), ())),
        |_: Vec<Behavior<u8>>| Component::of(()),
    );
    let result = broken.run(&mount().1);
    assert_eq!(result, Err(Error::ArityMismatch { expected: 4, found: 3 }));
    assert_eq!(
        result.unwrap_err().to_string(),
        "feedback arity mismatch: 4 placeholders declared, model produced 3"
    );
}

#[test]
fn failed_run_leaves_nothing_behind() {
    let rendered = Arc::new(Mutex::new(Vec::new()));
    let broken = {
        let rendered = rendered.clone();
        component_with_arity(
            2,
            |_: Stream<()>| Now::of((vec![Behavior::constant(1)], ())),
            move |shown: Vec<Behavior<i32>>| {
                let (first, rendered) = (shown[0].clone(), rendered.clone());
                button(Props::new().class("go"), "go").chain(move |clicks| {
                    let last = clicks.snapshot(&first, |n, ()| n).hold(0);
                    let rendered = rendered.clone();
                    dynamic_text(last.map(|n| n.to_string()))
                        .then(&Component::new(move |mount: &Mount| {
                            rendered.lock().unwrap().extend(mount.node.children());
                            Now::of(())
                        }))
                        .map_to(clicks.clone())
                })
            },
        )
    };
    let (root, mount) = mount();
    root.append(&Node::text("kept"));
    assert_eq!(broken.run(&mount), Err(Error::ArityMismatch { expected: 2, found: 1 }));
    assert_eq!(root.to_string(), "<div>kept</div>");

    let leftover = rendered.lock().unwrap().clone();
    let go = leftover.iter().find(|n| n.has_class("go")).cloned().unwrap();
    assert!(go.parent().is_none());
    go.dispatch("click", DomEvent::click());
    assert_eq!(root.text_content(), "kept");
}

#[test]
fn dynamic_arity_matches() {
    let labels = component_with_arity(
        3,
        |()| Now::of(((1..=3).map(|n| Behavior::constant(n.to_string())).collect::<Vec<_>>(), ())),
        |labels: Vec<Behavior<String>>| {
            labels.into_iter()
                .map(dynamic_text)
                .fold(Component::of(()), |acc, c| acc.then(&c))
        },
    );
    let (root, mount) = mount();
    labels.run(&mount).unwrap();
    assert_eq!(root.text_content(), "123");
}

#[test]
fn placeholder_replaced_twice() {
    let p = Placeholder::new();
    p.replace_with(&Behavior::constant(1)).unwrap();
    assert_eq!(p.replace_with(&Behavior::constant(2)), Err(Error::AlreadyReplaced));
    assert_eq!(p.behavior().sample(), 1);
}

#[test]
fn sampling_feedback_in_view_fails() {
    let eager = component(
        |()| Now::of((Behavior::constant(1), ())),
        |b: Behavior<i32>| Component::new(move |_| Now::sample(&b).map(|_| ())),
    );
    assert_eq!(eager.run(&mount().1), Err(Error::Unresolved));
}

#[test]
fn components_run_independently() {
    let counter = component(
        |clicks: Stream<()>| Now::scan(&clicks, 0u32, |n, ()| n + 1).map(|n| (n.clone(), n)),
        |count: Behavior<u32>| dynamic_text(count.map(|n| n.to_string()))
            .then(&button(Props::new().class("inc"), "")),
    );
    let (a, mount_a) = mount();
    let (b, mount_b) = mount();
    let count_a = counter.run(&mount_a).unwrap();
    let count_b = counter.run(&mount_b).unwrap();
    a.find_by_class("inc").unwrap().dispatch("click", DomEvent::click());
    assert_eq!((count_a.sample(), count_b.sample()), (1, 0));
    assert_eq!((a.text_content(), b.text_content()), ("1".to_string(), "0".to_string()));
}

#[test]
fn drag_drop() {
    #[derive(Copy, Debug, Clone)]
    enum Event { Add(i32), Drag(usize, i32), Drop }
    let sink = Sink::new();
    let events = sink.stream();
    let (rects, ()) = Now::fix(1, move |rects: Behavior<Vec<i32>>| {
        let spawned = rects.snapshot(&events, |mut rects, ev| match ev {
                Event::Add(r) => { rects.push(r); rects },
                _ => rects,
            })
            .hold(vec![300]);

        let dragged = events
            .filter_map({
                let spawned = spawned.clone();
                move |ev| match ev {
                    Event::Drag(idx, pos) => Some(spawned.map(move |mut rects: Vec<i32>| {
                        rects[idx] += pos;
                        rects
                    })),
                    Event::Drop => Some(spawned.clone()),
                    _ => None,
                }
            })
            .hold(spawned.clone())
            .switch();
        Now::of((dragged, ()))
    }).run().unwrap();

    assert_eq!(rects.sample(), vec![300]);
    sink.send(Event::Add(61));
    assert_eq!(rects.sample(), vec![300, 61]);
    sink.send(Event::Add(66));
    assert_eq!(rects.sample(), vec![300, 61, 66]);
    sink.send(Event::Drop);
    assert_eq!(rects.sample(), vec![300, 61, 66]);
    sink.send(Event::Drag(1, 10));
    assert_eq!(rects.sample(), vec![300, 71, 66]);
}

#[test]
fn nested_switch_in_feedback() {
    let sink = Sink::new();
    let stream = sink.stream();
    let (_, switched) = Now::fix(1, move |_: Behavior<i32>| {
        let switched = stream
            .map(|k| Stream::never().hold(k))
            .hold(Stream::never().hold(0))
            .switch();
        Now::of((switched.clone(), switched))
    }).run().unwrap();
    assert_eq!(switched.sample(), 0);
    sink.send(3);
    assert_eq!(switched.sample(), 3);
}


// Laws of `Now` and `Component`. Two computations are considered equal if
// they produce the same result and, for components, render the same text.

fn now_eq(a: Now<i64>, b: Now<i64>) -> bool {
    a.run() == b.run()
}

fn render(c: &Component<i64>) -> (String, i64) {
    let (root, mount) = mount();
    let out = c.run(&mount).unwrap();
    (root.text_content(), out)
}

fn shown(n: i64) -> Component<i64> {
    text(&n.to_string()).map_to(n)
}

#[test]
fn now_left_identity() {
    fn check(a: i64) -> bool {
        let f = |x: i64| Now::of(x.wrapping_mul(3));
        now_eq(Now::of(a).chain(f), f(a))
    }
    quickcheck(check as fn(i64) -> bool);
}

#[test]
fn now_right_identity() {
    fn check(a: i64) -> bool {
        now_eq(Now::of(a).map(|x| x ^ 7).chain(Now::of), Now::of(a).map(|x| x ^ 7))
    }
    quickcheck(check as fn(i64) -> bool);
}

#[test]
fn now_associativity() {
    fn check(a: i64) -> bool {
        let f = |x: i64| Now::of(x.wrapping_add(1));
        let g = |x: i64| if x % 2 == 0 { Now::of(x / 2) } else { Now::fail(Error::Unresolved) };
        now_eq(
            Now::of(a).chain(f).chain(g),
            Now::of(a).chain(move |x| f(x).chain(g)),
        )
    }
    quickcheck(check as fn(i64) -> bool);
}

#[test]
fn component_left_identity() {
    fn check(a: i64) -> bool {
        render(&Component::of(a).chain(shown)) == render(&shown(a))
    }
    quickcheck(check as fn(i64) -> bool);
}

#[test]
fn component_right_identity() {
    fn check(a: i64) -> bool {
        render(&shown(a).chain(Component::of)) == render(&shown(a))
    }
    quickcheck(check as fn(i64) -> bool);
}

#[test]
fn component_associativity() {
    fn check(a: i64) -> bool {
        let f = |x: i64| shown(x.wrapping_add(1));
        let g = |x: i64| shown(x.wrapping_mul(2));
        render(&shown(a).chain(f).chain(g)) == render(&shown(a).chain(move |x| f(x).chain(g)))
    }
    quickcheck(check as fn(i64) -> bool);
}

#[test]
fn lift_matches_chain() {
    fn check(a: i64, b: i64) -> bool {
        let lifted = lift!(|x: i64, y: i64| x.wrapping_sub(y), &shown(a), &shown(b));
        let chained = shown(a).chain(move |x| shown(b).map(move |y| x.wrapping_sub(y)));
        render(&lifted) == render(&chained)
    }
    quickcheck(check as fn(i64, i64) -> bool);
}
