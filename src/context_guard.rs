use std::{fmt, marker::PhantomData, ops::Deref, sync::Arc};

use crate::{flow::Slot, ContextCell, ContextKind};

/// A pushed value together with what it displaced.
///
/// Dropping it puts the displaced value back into whatever bindings are
/// installed on the current thread. Only [`ContextGuard`] (pinned to its
/// thread) and [`BoundFuture`](crate::BoundFuture) (always polled and dropped
/// inside its own [`Scoped`](crate::Scoped) bindings) hold one.
pub(crate) struct Binding<K: ContextKind> {
    cell: &'static ContextCell<K>,
    prior: Option<Slot>,
    value: Arc<K>,
}

impl<K: ContextKind> Binding<K> {
    pub(crate) fn new(cell: &'static ContextCell<K>, prior: Option<Slot>, value: Arc<K>) -> Self {
        Self { cell, prior, value }
    }
}

impl<K: ContextKind> Drop for Binding<K> {
    fn drop(&mut self) {
        self.cell.release(self.prior.take());
    }
}

/// An active binding of the context kind `K`.
///
/// Dropping the guard (or calling [`release`](Self::release)) puts back the
/// value that was current when the scope was entered, or empties the cell if
/// there was none. This happens on every exit path, including `?` and panics.
///
/// Guards for the same kind must be released in reverse order of creation,
/// which ordinary lexical scoping guarantees.
///
/// A guard is tied to the thread that created it: it is neither `Send` nor
/// `Sync`. A spawned task therefore cannot hold one across an `.await`;
/// bind values for async code with
/// [`ContextKind::scope_future`] or [`ContextKind::bind_future`] instead.
///
/// ```compile_fail
/// use context_local::{context_kind, ContextKind};
///
/// struct RequestId(u64);
/// context_kind!(RequestId);
///
/// fn spawn_like<F: std::future::Future + Send + 'static>(_: F) {}
///
/// spawn_like(async {
///     let _guard = RequestId::bind(RequestId(7));
///     std::future::ready(()).await;
/// });
/// ```
///
/// ```compile_fail
/// use context_local::{context_kind, ContextKind};
///
/// struct RequestId(u64);
/// context_kind!(RequestId);
///
/// let guard = RequestId::bind(RequestId(7));
/// std::thread::spawn(move || drop(guard));
/// ```
#[must_use = "the binding is released as soon as the guard is dropped"]
pub struct ContextGuard<K: ContextKind> {
    binding: Binding<K>,
    _thread_bound: PhantomData<*const ()>,
}

impl<K: ContextKind> ContextGuard<K> {
    pub(crate) fn new(binding: Binding<K>) -> Self {
        Self {
            binding,
            _thread_bound: PhantomData,
        }
    }

    /// The value bound by this scope.
    pub fn value(&self) -> &Arc<K> {
        &self.binding.value
    }

    /// Whether this scope shadows an outer binding of the same kind.
    pub fn shadows(&self) -> bool {
        self.binding.prior.is_some()
    }

    /// Ends the scope now. Equivalent to dropping the guard.
    pub fn release(self) {}
}

impl<K: ContextKind> Deref for ContextGuard<K> {
    type Target = K;

    fn deref(&self) -> &K {
        &self.binding.value
    }
}

impl<K: ContextKind + fmt::Debug> fmt::Debug for ContextGuard<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextGuard")
            .field("kind", &self.binding.cell.type_name())
            .field("value", &self.binding.value)
            .field("shadows", &self.shadows())
            .finish()
    }
}
