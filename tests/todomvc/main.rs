//! TodoMVC, rendered into the headless document tree.

mod item;
mod todo_footer;

use std::iter;
use std::sync::Arc;

use funnel::behavior::sequence;
use funnel::dom::DomEvent;
use funnel::elements::{checkbox, footer, h1, header, input, p, section, text, ul, Props};
use funnel::list::list;
use funnel::{component, lift, run_main, Behavior, Component, Error, Mount, Node, Now, Stream};

use item::{item, Out, Params};
use todo_footer::todo_footer;


type Modification = Arc<dyn Fn(Vec<Params>) -> Vec<Params> + Send + Sync>;

struct FromView {
    enter: Stream<String>,
    item_outputs: Behavior<Vec<Out>>,
    clear_completed: Stream<()>,
}

type ToView = (Behavior<Vec<Params>>, Behavior<Vec<Out>>, Behavior<bool>);

fn completed_ids(outputs: &Behavior<Vec<Out>>) -> Behavior<Vec<u32>> {
    outputs
        .map(|outs| {
            let flagged: Vec<_> = outs.iter()
                .map(|o| { let id = o.id; o.completed.map(move |c| (id, c)) })
                .collect();
            sequence(&flagged)
        })
        .switch()
        .map(|flags| flags.into_iter().filter(|&(_, c)| c).map(|(id, _)| id).collect())
}

fn model(from: FromView) -> Now<(ToView, Behavior<Vec<Params>>)> {
    let FromView { enter, item_outputs, clear_completed } = from;
    let first = Params { id: 0, name: String::new() };
    Now::scan_stream(&enter, first, |prev, name| Params { id: prev.id + 1, name })
        .chain(move |new_todo| {
            let delete = item_outputs
                .map(|outs| Stream::merge_all(outs.iter().map(|o| o.destroy.clone())))
                .switch_stream();
            let completed = completed_ids(&item_outputs);
            let any_completed = completed.map(|ids| !ids.is_empty());

            let prepend = new_todo.map(|todo| -> Modification {
                Arc::new(move |todos: Vec<Params>| iter::once(todo.clone()).chain(todos).collect())
            });
            let remove = delete.map(|id| -> Modification {
                Arc::new(move |todos: Vec<Params>| todos.into_iter().filter(|t| t.id != id).collect())
            });
            let clear = completed.snapshot(&clear_completed, |ids, ()| -> Modification {
                Arc::new(move |todos: Vec<Params>| todos.into_iter().filter(|t| !ids.contains(&t.id)).collect())
            });
            let modifications = Stream::merge_all(vec![prepend, remove, clear]);

            Now::scan(&modifications, vec![], |todos, modify: Modification| modify(todos))
                .map(move |todos| ((todos.clone(), item_outputs, any_completed), todos))
        })
}

fn view((todos, item_outputs, any_completed): ToView) -> Component<FromView> {
    let top = header(
        Props::new().class("header"),
        h1(Props::new(), text("todos")).then(&input(Props::new().class("new-todo"))),
    );
    let main = {
        let todos = todos.clone();
        section(
            Props::new().class("main").toggle_class("hidden", todos.map(|t| t.is_empty())),
            checkbox(Props::new().class("toggle-all")).chain(move |toggle_all| {
                let toggle_all = toggle_all.changes;
                ul(
                    Props::new().class("todo-list"),
                    list(move |params| item(params, toggle_all.clone()), |params: &Params| params.id, todos.clone()),
                )
            }),
        )
    };
    let bottom = todo_footer(&item_outputs, &any_completed, todos.map(|t| t.is_empty()));
    let app = section(
        Props::new().class("todoapp"),
        lift!(
            |input, item_outputs, clear_completed| FromView { enter: input.enter, item_outputs, clear_completed },
            &top,
            &main,
            &bottom,
        ),
    );
    let info = footer(
        Props::new().class("info"),
        p(Props::new(), text("Double-click to edit a todo"))
            .then(&p(Props::new(), text("Written with Funnel")))
            .then(&p(Props::new(), text("Part of TodoMVC"))),
    );
    lift!(|from, ()| from, &app, &info)
}

fn app() -> Component<Behavior<Vec<Params>>> {
    component(model, view)
}


struct Todo {
    body: Node,
    todos: Behavior<Vec<Params>>,
    _mount: Mount,
}

impl Todo {
    fn start() -> Todo {
        let body = Node::element("body");
        body.set_id("app");
        let (mount, todos) = run_main(&body, "app", &app()).unwrap();
        Todo { body, todos, _mount: mount }
    }

    fn find(&self, class: &str) -> Node {
        self.body.find_by_class(class).unwrap()
    }

    fn item(&self, id: u32) -> Node {
        self.body.find_by_id(&format!("todo-{}", id)).unwrap()
    }

    fn add(&self, name: &str) {
        let field = self.find("new-todo");
        field.dispatch("input", DomEvent::input(name));
        field.dispatch("keyup", DomEvent::key("Enter"));
    }

    fn names(&self) -> Vec<String> {
        self.todos.sample().into_iter().map(|t| t.name).collect()
    }

    fn rendered(&self) -> Vec<String> {
        self.find("todo-list").children().iter().map(Node::text_content).collect()
    }

    fn count(&self) -> String {
        self.find("todo-count").text_content()
    }
}

#[test]
fn starts_empty() {
    let todo = Todo::start();
    assert!(todo.names().is_empty());
    assert!(todo.find("main").has_class("hidden"));
    assert!(todo.find("footer").has_class("hidden"));
    assert_eq!(todo.count(), "0 items left");
    assert_eq!(
        todo.body.find_by_class("info").unwrap().text_content(),
        "Double-click to edit a todoWritten with FunnelPart of TodoMVC"
    );
}

#[test]
fn new_items_are_prepended() {
    let todo = Todo::start();
    todo.add("buy milk");
    todo.add("wash car");
    assert_eq!(todo.names(), vec!["wash car", "buy milk"]);
    assert_eq!(
        todo.todos.sample().iter().map(|t| t.id).collect::<Vec<_>>(),
        vec![2, 1]
    );
    assert_eq!(todo.rendered(), vec!["wash car", "buy milk"]);
    assert!(!todo.find("main").has_class("hidden"));
    assert_eq!(todo.count(), "2 items left");
    assert_eq!(todo.find("new-todo").attribute("value"), Some(String::new()));
}

#[test]
fn blank_input_is_ignored() {
    let todo = Todo::start();
    todo.add("   ");
    assert!(todo.names().is_empty());
}

#[test]
fn destroy_removes_item() {
    let todo = Todo::start();
    todo.add("buy milk");
    todo.add("wash car");
    let gone = todo.item(1);
    gone.find_by_class("destroy").unwrap().dispatch("click", DomEvent::click());
    assert_eq!(todo.names(), vec!["wash car"]);
    assert_eq!(todo.rendered(), vec!["wash car"]);
    assert!(gone.parent().is_none());
    assert_eq!(todo.count(), "1 item left");
}

#[test]
fn complete_and_clear() {
    let todo = Todo::start();
    todo.add("buy milk");
    todo.add("wash car");
    assert!(todo.find("clear-completed").has_class("hidden"));

    let milk = todo.item(1);
    milk.find_by_class("toggle").unwrap().dispatch("change", DomEvent::change(true));
    assert!(milk.has_class("completed"));
    assert!(!todo.item(2).has_class("completed"));
    assert_eq!(todo.count(), "1 item left");
    assert!(!todo.find("clear-completed").has_class("hidden"));

    todo.find("clear-completed").dispatch("click", DomEvent::click());
    assert_eq!(todo.names(), vec!["wash car"]);
    assert!(todo.find("clear-completed").has_class("hidden"));
}

#[test]
fn toggle_all_completes_everything() {
    let todo = Todo::start();
    todo.add("buy milk");
    todo.add("wash car");
    todo.find("toggle-all").dispatch("change", DomEvent::change(true));
    assert!(todo.item(1).has_class("completed"));
    assert!(todo.item(2).has_class("completed"));
    assert_eq!(todo.count(), "0 items left");

    todo.find("clear-completed").dispatch("click", DomEvent::click());
    assert!(todo.names().is_empty());
    assert!(todo.find("main").has_class("hidden"));
}

#[test]
fn items_keep_their_state_when_others_change() {
    let todo = Todo::start();
    todo.add("buy milk");
    let milk = todo.item(1);
    milk.find_by_class("toggle").unwrap().dispatch("change", DomEvent::change(true));
    todo.add("wash car");
    assert!(todo.item(1).ptr_eq(&milk));
    assert!(milk.has_class("completed"));
    assert_eq!(todo.count(), "1 item left");
}

#[test]
fn missing_mount_node() {
    let body = Node::element("body");
    let result = run_main(&body, "app", &app());
    assert_eq!(result.err(), Some(Error::MountNotFound("app".to_string())));
}
