//! Process-wide registry mapping each context kind to its storage cell.
//!
//! Cells are created lazily on first use and kept for the lifetime of the
//! process. The registry lock is only written on that first use; every later
//! lookup takes the read side.
//!
//! # Examples
//!
//! ```
//! use context_local::{cell_for, context_kind, context_of};
//!
//! #[derive(Debug)]
//! struct Locale(&'static str);
//! context_kind!(Locale);
//!
//! let first = context_of::<Locale>();
//! let again = cell_for::<Locale>(|_| Ok(Locale("ignored")));
//! assert!(std::ptr::eq(first, again));
//! ```

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::{Arc, LazyLock},
};

use parking_lot::{Mutex, RwLock};

use crate::{
    context_cell::Constructor, ContextCell, ContextError, ContextEvent, ContextGuard, ContextKind,
};

type Entry = &'static (dyn Any + Send + Sync);

/// Global registry of storage cells, keyed by the kind's `TypeId`.
///
/// Each entry is a leaked `ContextCell<K>`; entries are never evicted.
static GLOBAL_REGISTRY: LazyLock<RwLock<HashMap<TypeId, Entry>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

// -------------------------------------------------------------------------------------------------
// Tracing callback support
// -------------------------------------------------------------------------------------------------

/// Type alias for the user-supplied tracing callback.
///
/// The callback receives every `ContextEvent`. It is shared by all threads and
/// must therefore be `Send + Sync`.
pub type TraceCallback = dyn Fn(&ContextEvent) + Send + Sync + 'static;

/// Holds an optional user-defined tracing callback.
static TRACE_CALLBACK: LazyLock<Mutex<Option<Arc<TraceCallback>>>> =
    LazyLock::new(|| Mutex::new(None));

/// Sets a tracing callback invoked on every registration, scope entry, scope exit and read.
///
/// The callback runs without any registry lock held, so it may itself read
/// context values.
///
/// # Example
/// ```rust
/// use context_local::{clear_trace_callback, set_trace_callback};
///
/// set_trace_callback(|event| println!("[context-trace] {}", event));
/// clear_trace_callback();
/// ```
pub fn set_trace_callback(callback: impl Fn(&ContextEvent) + Send + Sync + 'static) {
    *TRACE_CALLBACK.lock() = Some(Arc::new(callback));
}

/// Clears the tracing callback.
pub fn clear_trace_callback() {
    *TRACE_CALLBACK.lock() = None;
}

/// Logs `event` through `tracing` and hands it to the current callback, if any.
pub(crate) fn emit_event(event: &ContextEvent) {
    tracing::trace!(target: "context_local", kind = event.type_name(), "{}", event);

    let callback = TRACE_CALLBACK.lock().clone();
    if let Some(callback) = callback {
        callback(event);
    }
}

// -------------------------------------------------------------------------------------------------
// Registry
// -------------------------------------------------------------------------------------------------

/// Returns the storage cell for `K`, creating it with `constructor` on first use.
///
/// Lookup is idempotent: once a kind is registered, later calls get the same
/// cell and their `constructor` is ignored. Concurrent first calls converge on
/// a single cell.
pub fn cell_for<K: ContextKind>(constructor: Constructor<K>) -> &'static ContextCell<K> {
    let key = TypeId::of::<K>();

    let existing = GLOBAL_REGISTRY.read().get(&key).copied();
    let entry = match existing {
        Some(entry) => entry,
        None => {
            let mut created = false;
            let entry = *GLOBAL_REGISTRY.write().entry(key).or_insert_with(|| {
                created = true;
                let cell: Entry = Box::leak(Box::new(ContextCell::<K>::new(constructor)));
                cell
            });

            if created {
                tracing::debug!(
                    target: "context_local",
                    kind = std::any::type_name::<K>(),
                    "registered context kind"
                );
                emit_event(&ContextEvent::Register {
                    type_name: std::any::type_name::<K>(),
                });
            }
            entry
        }
    };

    match entry.downcast_ref::<ContextCell<K>>() {
        Some(cell) => cell,
        None => unreachable!(
            "registry entry for {} is not its cell",
            std::any::type_name::<K>()
        ),
    }
}

/// Returns the storage cell for `K`, registering [`ContextKind::construct`] on first use.
pub fn context_of<K: ContextKind>() -> &'static ContextCell<K> {
    cell_for::<K>(K::construct)
}

/// Checks whether a storage cell exists for `K` yet.
///
/// ```
/// use context_local::{context_kind, is_registered, ContextKind};
///
/// struct Marker;
/// context_kind!(Marker);
///
/// assert!(!is_registered::<Marker>());
/// let _ = Marker::is_bound();
/// assert!(is_registered::<Marker>());
/// ```
pub fn is_registered<K: ContextKind>() -> bool {
    GLOBAL_REGISTRY.read().contains_key(&TypeId::of::<K>())
}

/// Enters a scope for `K`, building the value with the kind's registered constructor.
pub fn enter<K: ContextKind>(args: K::Args) -> Result<ContextGuard<K>, K::Error> {
    context_of::<K>().enter(args)
}

/// Enters a scope for `K`, registering `constructor` if `K` is not registered yet.
///
/// When `K` already has a cell, the registered constructor builds the value
/// and `constructor` is ignored.
pub fn enter_with<K: ContextKind>(
    constructor: Constructor<K>,
    args: K::Args,
) -> Result<ContextGuard<K>, K::Error> {
    cell_for::<K>(constructor).enter(args)
}

/// Returns the value of the innermost active scope for `K` in the calling flow.
///
/// # Errors
///
/// [`ContextError::Unbound`] when no scope for `K` is active.
pub fn current<K: ContextKind>() -> Result<Arc<K>, ContextError> {
    context_of::<K>().current()
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
