//! # Context Local
//!
//! Scoped, dynamically rebindable "current instance" values.
//!
//! Code deep in a call chain reads a value bound by one of its callers without
//! the value being threaded through every signature. Entering a scope pushes a
//! new value for a context kind; leaving it restores the previous one, on
//! every exit path. Bindings are private to each execution flow: a thread, or
//! a future wrapped in [`Scoped`].
//!
//! ## Quick Start
//!
//! ```rust
//! use context_local::{context_kind, ContextKind};
//!
//! #[derive(Debug)]
//! struct Session {
//!     user_id: u64,
//! }
//! context_kind!(Session);
//!
//! fn audit() -> String {
//!     match Session::current() {
//!         Ok(session) => format!("user {}", session.user_id),
//!         Err(e) => e.to_string(),
//!     }
//! }
//!
//! assert!(audit().starts_with("No active binding"));
//!
//! let outer = Session::bind(Session { user_id: 1 });
//! assert_eq!(audit(), "user 1");
//! {
//!     let _inner = Session::bind(Session { user_id: 2 });
//!     assert_eq!(audit(), "user 2");
//! }
//! assert_eq!(audit(), "user 1");
//! outer.release();
//! assert!(audit().starts_with("No active binding"));
//! ```
//!
//! ## Features
//!
//! - **Restoring**: scopes unwind last-in-first-out, also on `?` and panics
//! - **Isolated**: each thread and each [`Scoped`] future has its own bindings
//! - **Type-keyed**: one storage cell per kind, created once and shared process-wide
//! - **Traceable**: events go to `tracing` and to an optional callback
//!
//! ## Main Items
//!
//! - [`ContextKind`] - declare a kind and get `enter`/`current`/`scope`/`wrap` on it
//! - [`context_kind!`] - declaration sugar for common constructor shapes
//! - [`cell_for`] / [`context_of`] - resolve a kind's storage cell
//! - [`enter`] / [`current`] - free-function forms
//! - [`ContextKind::scope_future`] / [`ContextKind::bind_future`] - bind a value inside a task
//! - [`Snapshot`], [`spawn`], [`FlowFutureExt`] - hand bindings to threads and futures
//! - [`set_trace_callback`] - observe registry and scope operations

mod context_cell;
mod context_error;
mod context_event;
mod context_guard;
mod context_kind;
pub mod flow;
mod macros;
mod registry;

pub use context_cell::{BoundFuture, Constructor, ContextCell};
pub use context_error::ContextError;
pub use context_event::ContextEvent;
pub use context_guard::ContextGuard;
pub use context_kind::ContextKind;
pub use flow::{spawn, FlowFutureExt, Scoped, Snapshot};
pub use registry::{
    cell_for, clear_trace_callback, context_of, current, enter, enter_with, is_registered,
    set_trace_callback, TraceCallback,
};
