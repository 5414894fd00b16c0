//! Basic usage example for context-local.
//!
//! Demonstrates:
//! - Declaring a context kind with `context_kind!`
//! - Binding values with `bind()` and reading them with `current()`
//! - Nested scopes shadowing and restoring outer values
//! - Handling reads with no active scope
//!
//! Run with: `cargo run --example basic_usage`

use context_local::{context_kind, ContextKind};

/// The user on whose behalf the current code runs.
#[derive(Debug, Clone, PartialEq)]
struct Session {
    user_id: u64,
    admin: bool,
}

context_kind!(Session);

fn describe() -> String {
    match Session::current() {
        Ok(session) => format!("user {} (admin: {})", session.user_id, session.admin),
        Err(e) => format!("<{}>", e),
    }
}

fn main() {
    println!("=== context-local: Basic Usage ===\n");

    // -------------------------------------------------------------------------
    // 1. Read before any scope
    // -------------------------------------------------------------------------
    println!("1. Reading with no active scope...");
    println!("   current: {}", describe());

    // -------------------------------------------------------------------------
    // 2. Enter a scope
    // -------------------------------------------------------------------------
    println!("\n2. Binding user 1...");

    let outer = Session::bind(Session {
        user_id: 1,
        admin: false,
    });
    println!("   current: {}", describe());

    // -------------------------------------------------------------------------
    // 3. Nest a scope
    // -------------------------------------------------------------------------
    println!("\n3. Impersonating user 2 in a nested scope...");
    {
        let _inner = Session::bind(Session {
            user_id: 2,
            admin: true,
        });
        println!("   current: {}", describe());
    }
    println!("   after nested scope: {}", describe());

    // -------------------------------------------------------------------------
    // 4. Leave the outer scope
    // -------------------------------------------------------------------------
    println!("\n4. Releasing the outer scope...");
    outer.release();
    println!("   current: {}", describe());

    // -------------------------------------------------------------------------
    // 5. Scope a closure
    // -------------------------------------------------------------------------
    println!("\n5. Running a closure inside a scope...");
    let Ok(line) = Session::scope(
        Session {
            user_id: 3,
            admin: false,
        },
        |_| describe(),
    ) else {
        unreachable!("Session construction cannot fail");
    };
    println!("   inside: {}", line);
    println!("   outside: {}", describe());

    println!("\n=== Example Complete ===");
}
