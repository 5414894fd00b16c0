//! Request context example for context-local.
//!
//! Demonstrates:
//! - A kind with named arguments and a validating constructor
//! - Wrapping a handler so every call runs in its own scope
//! - Restoration after a handler fails
//! - Handing the current request to a worker thread
//!
//! Run with: `cargo run --example request_context`

use context_local::{flow, ContextKind};
use std::fmt;

/// Per-request data visible to every layer of a handler.
#[derive(Debug)]
struct Request {
    id: u64,
    path: String,
}

#[derive(Clone)]
struct RequestArgs {
    id: u64,
    path: &'static str,
}

#[derive(Debug)]
struct InvalidPath(&'static str);

impl fmt::Display for InvalidPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "path must start with '/': {:?}", self.0)
    }
}

impl ContextKind for Request {
    type Args = RequestArgs;
    type Error = InvalidPath;

    fn construct(args: RequestArgs) -> Result<Self, InvalidPath> {
        if !args.path.starts_with('/') {
            return Err(InvalidPath(args.path));
        }
        Ok(Request {
            id: args.id,
            path: args.path.to_string(),
        })
    }
}

/// Deep in the call chain: no request parameter needed.
fn log(message: &str) {
    match Request::try_current() {
        Some(request) => println!("   [req {} {}] {}", request.id, request.path, message),
        None => println!("   [no request] {}", message),
    }
}

fn load_user(user: &str) -> Result<String, String> {
    log(&format!("loading {user}"));
    if user == "ghost" {
        return Err(format!("unknown user {user}"));
    }
    Ok(format!("profile of {user}"))
}

fn main() {
    println!("=== context-local: Request Context ===\n");

    // -------------------------------------------------------------------------
    // 1. Wrapped handler
    // -------------------------------------------------------------------------
    println!("1. Calling a wrapped handler twice...");

    let mut handler = Request::wrap(
        RequestArgs {
            id: 1,
            path: "/users",
        },
        |user: &'static str| load_user(user),
    );

    for user in ["ada", "ghost"] {
        match handler(user) {
            Ok(Ok(profile)) => log(&format!("handler returned {profile}")),
            Ok(Err(e)) => log(&format!("handler failed: {e}")),
            Err(e) => log(&format!("request rejected: {e}")),
        }
    }

    // -------------------------------------------------------------------------
    // 2. Rejected arguments
    // -------------------------------------------------------------------------
    println!("\n2. Entering with an invalid path...");

    if let Err(e) = Request::enter(RequestArgs {
        id: 2,
        path: "users",
    }) {
        log(&format!("rejected: {e}"));
    }

    // -------------------------------------------------------------------------
    // 3. Worker thread
    // -------------------------------------------------------------------------
    println!("\n3. Handing the request to a worker thread...");

    match Request::enter(RequestArgs {
        id: 3,
        path: "/reports",
    }) {
        Ok(_guard) => {
            let inherited = flow::spawn(|| log("worker with propagated bindings"));
            let plain = std::thread::spawn(|| log("worker from std::thread::spawn"));
            let _ = inherited.join();
            let _ = plain.join();
        }
        Err(e) => log(&format!("rejected: {e}")),
    }

    println!("\n=== Example Complete ===");
}
