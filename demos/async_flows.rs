//! Async example for context-local.
//!
//! Demonstrates:
//! - Tasks keeping their own bindings across `.await` on a multi-threaded runtime
//! - Nesting task bindings with `bind_future`
//! - Binding a value for the lifetime of a future with `scope_future`
//! - Handing the spawner's bindings to a task with `in_current_flow`
//!
//! Run with: `cargo run --example async_flows`

use context_local::{context_kind, ContextKind, FlowFutureExt};
use std::time::Duration;

#[derive(Debug, Clone)]
struct TraceId(String);

context_kind!(TraceId);

async fn step(name: &str) {
    tokio::time::sleep(Duration::from_millis(5)).await;
    let trace = TraceId::try_current()
        .map(|t| t.0.clone())
        .unwrap_or_else(|| "-".to_string());
    println!("   [{trace}] {name} on {:?}", std::thread::current().id());
}

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() {
    println!("=== context-local: Async Flows ===\n");

    println!("1. Three tasks, each with its own trace id...");
    let tasks: Vec<_> = ["alpha", "beta", "gamma"]
        .into_iter()
        .map(|name| {
            tokio::spawn(TraceId::bind_future(TraceId(name.to_string()), async move {
                step("fetch").await;
                TraceId::bind_future(TraceId(format!("{name}/parse")), step("parse")).await;
                step("store").await;
            }))
        })
        .collect();

    for task in tasks {
        let _ = task.await;
    }

    println!("\n2. Binding for a whole future with scope_future...");
    let Ok(future) = TraceId::scope_future(TraceId("delta".to_string()), async {
        step("one").await;
        step("two").await;
    }) else {
        unreachable!("TraceId construction cannot fail");
    };
    let _ = tokio::spawn(future).await;

    println!("\n3. Inheriting the spawner's binding...");
    let epsilon = {
        let _guard = TraceId::bind(TraceId("epsilon".to_string()));
        step("spawner").in_current_flow()
    };
    let _ = tokio::spawn(epsilon).await;

    println!("\n4. Outside any task...");
    step("main").await;

    println!("\n=== Example Complete ===");
}
