//! The storage cell of one context kind.
//!
//! A cell is created once per kind by the registry and lives for the whole
//! process. The cell itself holds no value: its content lives in the calling
//! flow's bindings (see [`crate::flow`]), so every thread and every
//! [`Scoped`] future sees its own.

use std::{
    any::TypeId,
    fmt,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{ready, Context, Poll},
};

use pin_project::pin_project;

use crate::{
    context_guard::Binding,
    flow::{self, Scoped, Slot, Snapshot},
    registry::emit_event,
    ContextError, ContextEvent, ContextGuard, ContextKind,
};

/// Constructor building a bound value from the kind's arguments.
pub type Constructor<K> = fn(<K as ContextKind>::Args) -> Result<K, <K as ContextKind>::Error>;

/// Storage cell and registered constructor for the context kind `K`.
///
/// Obtain one through [`crate::cell_for`], [`crate::context_of`] or
/// [`ContextKind::context`].
pub struct ContextCell<K: ContextKind> {
    key: TypeId,
    type_name: &'static str,
    constructor: Constructor<K>,
}

impl<K: ContextKind> ContextCell<K> {
    pub(crate) fn new(constructor: Constructor<K>) -> Self {
        Self {
            key: TypeId::of::<K>(),
            type_name: std::any::type_name::<K>(),
            constructor,
        }
    }

    /// Name of the kind, as reported in errors and events.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The constructor fixed when the kind was first registered.
    pub fn constructor(&self) -> Constructor<K> {
        self.constructor
    }

    /// Whether a scope for this kind is active in the calling flow.
    pub fn is_bound(&self) -> bool {
        flow::get(self.key).is_some()
    }

    /// Returns the value bound by the innermost active scope, if any.
    pub fn try_current(&self) -> Option<Arc<K>> {
        self.current().ok()
    }

    /// Returns the value bound by the innermost active scope.
    ///
    /// # Errors
    ///
    /// [`ContextError::Unbound`] if no scope for this kind is active in the calling flow.
    pub fn current(&self) -> Result<Arc<K>, ContextError> {
        let result = match flow::get(self.key) {
            Some(slot) => match slot.downcast::<K>() {
                Ok(value) => Ok(value),
                // Slots are keyed by `TypeId::of::<K>()` and only ever hold a `K`.
                Err(_) => unreachable!("flow slot for {} holds another type", self.type_name),
            },
            None => Err(ContextError::Unbound {
                type_name: self.type_name,
            }),
        };

        emit_event(&ContextEvent::Current {
            type_name: self.type_name,
            found: result.is_ok(),
        });

        result
    }

    /// Builds a value from `args` and binds it until the returned guard is dropped.
    ///
    /// The value is constructed before anything is touched: if the constructor
    /// fails, its error is returned as is and the calling flow's bindings are
    /// left exactly as they were.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use context_local::{context_kind, context_of};
    ///
    /// struct Depth(u32);
    /// context_kind!(Depth);
    ///
    /// let cell = context_of::<Depth>();
    /// let outer = cell.enter(Depth(1)).unwrap();
    /// {
    ///     let _inner = cell.enter(Depth(2)).unwrap();
    ///     assert_eq!(cell.current().unwrap().0, 2);
    /// }
    /// assert_eq!(cell.current().unwrap().0, 1);
    /// outer.release();
    /// assert!(cell.current().is_err());
    /// ```
    pub fn enter(&'static self, args: K::Args) -> Result<ContextGuard<K>, K::Error> {
        let value = (self.constructor)(args)?;
        Ok(ContextGuard::new(self.acquire(Arc::new(value))))
    }

    /// Runs `f` inside a fresh scope and hands it the bound value.
    ///
    /// The scope is released when `f` returns, returns early through `?`, or unwinds.
    pub fn scope<R>(&'static self, args: K::Args, f: impl FnOnce(&K) -> R) -> Result<R, K::Error> {
        let guard = self.enter(args)?;
        Ok(f(&guard))
    }

    /// Wraps a callable so that every invocation runs inside its own scope.
    ///
    /// Each call builds a new value from a clone of `args`.
    pub fn wrap<A, R, F>(&'static self, args: K::Args, mut f: F) -> impl FnMut(A) -> Result<R, K::Error>
    where
        K::Args: Clone,
        F: FnMut(A) -> R,
    {
        move |input| self.scope(args.clone(), |_| f(input))
    }

    /// Binds a fresh value for the whole lifetime of `future`.
    ///
    /// The value is constructed right away, so a constructor error is returned
    /// before any future exists. The binding itself is entered on the first
    /// poll and released when the future completes or is dropped. The future
    /// starts from the caller's bindings plus the new value; the caller's own
    /// bindings are never modified.
    ///
    /// This is the way to bind a value inside spawned tasks, where a
    /// [`ContextGuard`] cannot be held across an `.await`.
    pub fn scope_future<F: Future>(
        &'static self,
        args: K::Args,
        future: F,
    ) -> Result<Scoped<BoundFuture<K, F>>, K::Error> {
        let value = (self.constructor)(args)?;
        Ok(self.bind_future(Arc::new(value), future))
    }

    pub(crate) fn bind_future<F: Future>(
        &'static self,
        value: Arc<K>,
        future: F,
    ) -> Scoped<BoundFuture<K, F>> {
        let bound = BoundFuture {
            inner: future,
            cell: self,
            pending: Some(value),
            binding: None,
        };
        Scoped::new(bound, Snapshot::capture())
    }

    /// Pushes an already built value; the returned binding owns the restoration.
    fn acquire(&'static self, value: Arc<K>) -> Binding<K> {
        let slot: Slot = value.clone();
        let prior = flow::replace(self.key, Some(slot));

        emit_event(&ContextEvent::Enter {
            type_name: self.type_name,
            shadowed: prior.is_some(),
        });

        Binding::new(self, prior, value)
    }

    /// Puts `prior` back. Called exactly once per binding.
    pub(crate) fn release(&self, prior: Option<Slot>) {
        let restored = prior.is_some();
        // The value being unbound is dropped here, after the flow storage is released.
        let _unbound = flow::restore(self.key, prior);

        emit_event(&ContextEvent::Exit {
            type_name: self.type_name,
            restored,
        });
    }
}

impl<K: ContextKind> fmt::Debug for ContextCell<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextCell")
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// A future that binds one value of the kind `K` while it runs.
///
/// Built by [`ContextCell::scope_future`], [`ContextKind::scope_future`] and
/// [`ContextKind::bind_future`], always inside a [`Scoped`] so the binding
/// lives in the future's own flow. The value is pushed on the first poll and
/// popped once the inner future completes, or when it is dropped unfinished.
#[pin_project]
#[must_use = "futures do nothing unless polled"]
pub struct BoundFuture<K: ContextKind, F> {
    // Declared first so it is dropped before `binding` is released.
    #[pin]
    inner: F,
    cell: &'static ContextCell<K>,
    pending: Option<Arc<K>>,
    binding: Option<Binding<K>>,
}

impl<K: ContextKind, F: Future> Future for BoundFuture<K, F> {
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        if let Some(value) = this.pending.take() {
            *this.binding = Some(this.cell.acquire(value));
        }

        let output = ready!(this.inner.poll(cx));
        drop(this.binding.take());
        Poll::Ready(output)
    }
}

impl<K: ContextKind, F> fmt::Debug for BoundFuture<K, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundFuture")
            .field("kind", &self.cell.type_name)
            .field("entered", &self.binding.is_some())
            .finish()
    }
}
