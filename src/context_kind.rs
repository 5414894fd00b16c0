//! Core trait declaring a context kind.
//!
//! A context kind is a type whose values can be bound for the duration of a
//! scope and read back from anywhere below it in the same execution flow.
//! Implementors only provide the constructor; everything else comes from
//! default methods backed by the process-wide registry.

use std::{convert::Infallible, future::Future, sync::Arc};

use crate::{registry, BoundFuture, ContextCell, ContextError, ContextGuard, Scoped};

/// A family of dynamically scoped values, identified by its type.
///
/// # Examples
///
/// ```rust
/// use context_local::{ContextError, ContextKind};
///
/// #[derive(Debug)]
/// struct Session {
///     user_id: u64,
/// }
///
/// struct SessionArgs {
///     user_id: i64,
/// }
///
/// impl ContextKind for Session {
///     type Args = SessionArgs;
///     type Error = String;
///
///     fn construct(args: SessionArgs) -> Result<Self, String> {
///         let user_id = u64::try_from(args.user_id).map_err(|_| "negative user id".to_string())?;
///         Ok(Session { user_id })
///     }
/// }
///
/// fn handler() -> u64 {
///     Session::current().map(|s| s.user_id).unwrap_or_default()
/// }
///
/// let _session = Session::enter(SessionArgs { user_id: 7 }).unwrap();
/// assert_eq!(handler(), 7);
/// assert!(Session::enter(SessionArgs { user_id: -1 }).is_err());
/// ```
pub trait ContextKind: Send + Sync + Sized + 'static {
    /// Named arguments the constructor takes, usually a plain struct.
    type Args: 'static;

    /// Error returned when the arguments are rejected.
    type Error: 'static;

    /// Builds a value of this kind from its arguments.
    fn construct(args: Self::Args) -> Result<Self, Self::Error>;

    // -------------------------------------------------------------------------------------------------
    // Provided accessors
    // -------------------------------------------------------------------------------------------------

    /// The kind's storage cell, registered with [`construct`](Self::construct) on first use.
    fn context() -> &'static ContextCell<Self> {
        registry::context_of::<Self>()
    }

    /// Enters a new scope. See [`ContextCell::enter`].
    fn enter(args: Self::Args) -> Result<ContextGuard<Self>, Self::Error> {
        Self::context().enter(args)
    }

    /// Binds `value` directly, for kinds whose arguments are the value itself.
    fn bind(value: Self) -> ContextGuard<Self>
    where
        Self: ContextKind<Args = Self, Error = Infallible>,
    {
        match Self::enter(value) {
            Ok(guard) => guard,
            Err(never) => match never {},
        }
    }

    /// The value of the innermost active scope in the calling flow.
    fn current() -> Result<Arc<Self>, ContextError> {
        Self::context().current()
    }

    /// Like [`current`](Self::current), but `None` when nothing is bound.
    fn try_current() -> Option<Arc<Self>> {
        Self::context().try_current()
    }

    /// Whether a scope for this kind is active in the calling flow.
    fn is_bound() -> bool {
        Self::context().is_bound()
    }

    /// Runs `f` inside a fresh scope. See [`ContextCell::scope`].
    fn scope<R>(args: Self::Args, f: impl FnOnce(&Self) -> R) -> Result<R, Self::Error> {
        Self::context().scope(args, f)
    }

    /// Wraps a callable so each call runs in its own scope. See [`ContextCell::wrap`].
    fn wrap<A, R, F>(args: Self::Args, f: F) -> impl FnMut(A) -> Result<R, Self::Error>
    where
        Self::Args: Clone,
        F: FnMut(A) -> R,
    {
        Self::context().wrap(args, f)
    }

    /// Binds a fresh value for the lifetime of a future. See [`ContextCell::scope_future`].
    fn scope_future<F: Future>(
        args: Self::Args,
        future: F,
    ) -> Result<Scoped<BoundFuture<Self, F>>, Self::Error> {
        Self::context().scope_future(args, future)
    }

    /// The async counterpart of [`bind`](Self::bind).
    fn bind_future<F: Future>(value: Self, future: F) -> Scoped<BoundFuture<Self, F>>
    where
        Self: ContextKind<Args = Self, Error = Infallible>,
    {
        Self::context().bind_future(Arc::new(value), future)
    }
}
