//! Demonstration of sections, intents and transformers for a todo app

use selectree::{EventContext, Intent, Section, Store, Transformer, Value};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, Serialize, Deserialize)]
struct TodoItem {
    id: usize,
    title: String,
    completed: bool,
}

fn todos_of(value: &Value) -> Vec<TodoItem> {
    serde_json::from_value(value.to_json()).unwrap_or_default()
}

fn to_value(todos: &[TodoItem]) -> Option<Value> {
    serde_json::to_value(todos).ok().map(Value::from)
}

fn todo_section() -> Section {
    let add = Intent::new("ADD_TODO", |todos, title, _| {
        let mut todos = todos_of(todos);
        todos.push(TodoItem {
            id: todos.len(),
            title: title.as_str()?.to_owned(),
            completed: false,
        });
        to_value(&todos)
    });

    let toggle = Intent::new("TOGGLE_TODO", |todos, id, _| {
        let id = usize::try_from(id.as_i64()?).ok()?;
        let mut todos = todos_of(todos);
        let todo = todos.iter_mut().find(|t| t.id == id)?;
        todo.completed = !todo.completed;
        to_value(&todos)
    });

    Section::new(json!([])).with_intent(add).with_intent(toggle)
}

fn filter_section() -> Section {
    Section::new("all").with_intent(Intent::new("SET_FILTER", |_, filter, _| {
        Some(filter.clone())
    }))
}

/// The visible todos, each with an alias that toggles it.
fn visible_todos() -> Transformer {
    Transformer::new([["todos"], ["filter"]], |inputs, ctx| {
        let filter = inputs[1].as_str().unwrap_or("all");
        let rows = todos_of(&inputs[0])
            .into_iter()
            .filter(|t| match filter {
                "active" => !t.completed,
                "completed" => t.completed,
                _ => true,
            })
            .map(|t| {
                let status = if t.completed { "✓" } else { " " };
                Value::map([
                    ("label", Value::from(format!("[{status}] {}", t.title))),
                    ("toggle", Value::from(ctx.create_intent("TOGGLE_TODO", t.id))),
                ])
            });
        Value::list(rows)
    })
}

fn print_rows(rows: &Value) {
    for row in rows.as_list().unwrap_or_default() {
        if let Some(label) = row.get("label").and_then(Value::as_str) {
            println!("   {label}");
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Selectree Example: Todo App ===\n");

    // Create store with its sections
    let store = Store::builder()
        .section("todos", todo_section())
        .section("filter", filter_section())
        .build();

    // Count todos as a computed value
    println!("1. Setting up subscribers");
    let stats = store
        .add_computed("stats", [["todos"]], |inputs| {
            let todos = todos_of(&inputs[0]);
            let completed = todos.iter().filter(|t| t.completed).count();
            Value::map([
                ("total", todos.len()),
                ("active", todos.len() - completed),
                ("completed", completed),
            ])
        })
        .expect("label is unique");
    let _stats = store.subscribe_to_state([stats.clone()], |values| {
        let count = |key| values[0].get(key).and_then(Value::as_i64).unwrap_or_default();
        println!(
            "   [Store Update] Total: {}, Active: {}, Completed: {}",
            count("total"),
            count("active"),
            count("completed")
        );
    });

    store.on(
        "ADD_TODO",
        Rc::new(|title: &Value, _: &EventContext| {
            println!("   added {title:?}");
            Ok(())
        }),
    );

    let view = visible_todos();
    let rows = store.subscribe_transformer(&view, Rc::new(|_: &Value| {}));
    println!("   {} visible todos", rows.as_list().map_or(0, <[Value]>::len));

    // Add todos
    println!("\n2. Adding todos");
    store.dispatch("ADD_TODO", "Learn Rust");
    store.dispatch("ADD_TODO", "Build a state store");
    store.dispatch("ADD_TODO", "Write documentation");
    store.run_until_idle();

    // Display current todos
    println!("\n3. Current todos:");
    let rows = store.subscribe_transformer(&view, Rc::new(|_: &Value| {}));
    print_rows(&rows);

    // Complete a todo through the alias the view created for it
    println!("\n4. Completing first todo");
    if let Some(toggle) = rows
        .as_list()
        .and_then(|rows| rows.first())
        .and_then(|row| row.get("toggle"))
        .and_then(Value::as_str)
    {
        store.dispatch(toggle, Value::Null);
    }
    store.run_until_idle();

    println!("\n5. Current todos:");
    print_rows(&store.subscribe_transformer(&view, Rc::new(|_: &Value| {})));

    // Change filter
    println!("\n6. Filtering to show only active todos");
    store.dispatch("SET_FILTER", "active");
    store.run_until_idle();
    print_rows(&store.subscribe_transformer(&view, Rc::new(|_: &Value| {})));

    println!("\n7. Filtering to show completed todos");
    store.dispatch("SET_FILTER", "completed");
    store.run_until_idle();
    print_rows(&store.subscribe_transformer(&view, Rc::new(|_: &Value| {})));

    // Final stats
    println!("\n8. Final statistics:");
    let final_stats = store.get_partial_state(stats).unwrap_or_default();
    println!("   {}", final_stats.to_json());

    println!("\n✓ Example complete!");
}
