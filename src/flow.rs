//! Per-execution-flow binding storage.
//!
//! Every thread owns one binding set mapping a kind's `TypeId` to its current
//! value. The set is shared copy-on-write, so taking a [`Snapshot`] is a
//! reference-count bump and a later write in one flow never shows up in another.
//!
//! Threads do not inherit bindings. Use [`spawn`] or [`Snapshot::wrap`] to hand
//! the caller's bindings to a child thread, and [`Scoped`] (built with
//! [`FlowFutureExt`]) to give a future its own bindings that follow it across
//! suspension points and worker threads.

use std::{
    any::{Any, TypeId},
    cell::RefCell,
    collections::HashMap,
    fmt,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{ready, Context, Poll},
    thread::JoinHandle,
};

use pin_project::{pin_project, pinned_drop};

/// Type-erased bound value as stored in a flow.
pub(crate) type Slot = Arc<dyn Any + Send + Sync>;

#[derive(Clone, Default)]
struct Bindings(Arc<HashMap<TypeId, Slot>>);

impl Bindings {
    fn get(&self, key: &TypeId) -> Option<Slot> {
        self.0.get(key).cloned()
    }

    fn replace(&mut self, key: TypeId, value: Option<Slot>) -> Option<Slot> {
        let map = Arc::make_mut(&mut self.0);
        match value {
            Some(value) => map.insert(key, value),
            None => map.remove(&key),
        }
    }
}

thread_local! {
    static BINDINGS: RefCell<Bindings> = RefCell::new(Bindings::default());
}

/// Returns the calling flow's value for `key`.
pub(crate) fn get(key: TypeId) -> Option<Slot> {
    BINDINGS.with(|bindings| bindings.borrow().get(&key))
}

/// Stores `value` (or clears the slot on `None`) and returns what was there.
///
/// The previous value is handed back to the caller so it is dropped outside
/// the borrow; a value's own `Drop` may read bindings again.
pub(crate) fn replace(key: TypeId, value: Option<Slot>) -> Option<Slot> {
    BINDINGS.with(|bindings| bindings.borrow_mut().replace(key, value))
}

/// Like [`replace`], but silently does nothing once the thread's storage has
/// been torn down. Used on the release path, which may run from thread-local
/// destructors.
pub(crate) fn restore(key: TypeId, value: Option<Slot>) -> Option<Slot> {
    BINDINGS
        .try_with(|bindings| bindings.borrow_mut().replace(key, value))
        .unwrap_or(None)
}

/// Exchanges the thread's binding set with `slot`.
fn swap(slot: &mut Bindings) {
    let _ = BINDINGS.try_with(|bindings| std::mem::swap(&mut *bindings.borrow_mut(), slot));
}

/// Installs a binding set on the current thread for as long as it lives.
///
/// On drop the thread gets its own set back and `slot` receives the installed
/// set, including any writes made while it was active.
struct Installed<'a> {
    slot: &'a mut Bindings,
}

impl<'a> Installed<'a> {
    fn new(slot: &'a mut Bindings) -> Self {
        swap(slot);
        Self { slot }
    }
}

impl Drop for Installed<'_> {
    fn drop(&mut self) {
        swap(self.slot);
    }
}

// -------------------------------------------------------------------------------------------------
// Snapshots
// -------------------------------------------------------------------------------------------------

/// A frozen copy of a flow's bindings.
///
/// # Examples
///
/// ```rust
/// use context_local::{context_kind, ContextKind, Snapshot};
///
/// #[derive(Debug)]
/// struct Tenant(&'static str);
/// context_kind!(Tenant);
///
/// let snapshot = {
///     let _guard = Tenant::bind(Tenant("acme"));
///     Snapshot::capture()
/// };
///
/// assert!(Tenant::current().is_err());
/// snapshot.run(|| assert_eq!(Tenant::current().unwrap().0, "acme"));
/// ```
#[derive(Clone, Default)]
pub struct Snapshot {
    bindings: Bindings,
}

impl Snapshot {
    /// Captures the calling flow's bindings.
    pub fn capture() -> Self {
        let bindings = BINDINGS
            .try_with(|bindings| bindings.borrow().clone())
            .unwrap_or_default();
        Self { bindings }
    }

    /// A snapshot with no bindings at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of kinds bound in this snapshot.
    pub fn len(&self) -> usize {
        self.bindings.0.len()
    }

    /// Whether this snapshot binds no kind at all.
    pub fn is_empty(&self) -> bool {
        self.bindings.0.is_empty()
    }

    /// Whether this snapshot holds a value for kind `K`.
    pub fn contains<K: 'static>(&self) -> bool {
        self.bindings.0.contains_key(&TypeId::of::<K>())
    }

    #[cfg(test)]
    pub(crate) fn with_slot(mut self, key: TypeId, value: Slot) -> Self {
        self.bindings.replace(key, Some(value));
        self
    }

    /// Runs `f` with this snapshot installed as the calling thread's bindings.
    ///
    /// The thread's own bindings come back when `f` returns or unwinds. Scopes
    /// entered inside `f` do not leak into the snapshot.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        let mut bindings = self.bindings.clone();
        let _installed = Installed::new(&mut bindings);
        f()
    }

    /// Turns `f` into a closure that runs under this snapshot wherever it is called.
    pub fn wrap<F, R>(self, f: F) -> impl FnOnce() -> R
    where
        F: FnOnce() -> R,
    {
        move || self.run(f)
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("bindings", &self.len())
            .finish()
    }
}

/// Spawns a thread that starts with the caller's bindings.
///
/// `std::thread::spawn` gives the new thread an empty binding set; this is the
/// explicit propagation point.
pub fn spawn<F, T>(f: F) -> JoinHandle<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    std::thread::spawn(Snapshot::capture().wrap(f))
}

// -------------------------------------------------------------------------------------------------
// Futures
// -------------------------------------------------------------------------------------------------

/// A future that carries its own binding set.
///
/// The set is installed around every poll of the inner future and saved back
/// afterwards, so a scope entered before an `.await` is still visible after it,
/// on whichever thread the executor resumes the task.
///
/// The inner future is dropped under the same bindings: as soon as it
/// completes, or when the `Scoped` itself is dropped before that.
#[pin_project(PinnedDrop)]
#[must_use = "futures do nothing unless polled"]
pub struct Scoped<F> {
    #[pin]
    inner: Option<F>,
    bindings: Bindings,
}

impl<F> Scoped<F> {
    pub fn new(inner: F, snapshot: Snapshot) -> Self {
        Self {
            inner: Some(inner),
            bindings: snapshot.bindings,
        }
    }

    /// The bindings the future will see on its next poll.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            bindings: self.bindings.clone(),
        }
    }
}

impl<F: Future> Future for Scoped<F> {
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let _installed = Installed::new(this.bindings);
        let mut inner = this.inner;

        let output = match inner.as_mut().as_pin_mut() {
            Some(future) => ready!(future.poll(cx)),
            None => panic!("`Scoped` polled after completion"),
        };

        inner.set(None);
        Poll::Ready(output)
    }
}

#[pinned_drop]
impl<F> PinnedDrop for Scoped<F> {
    fn drop(self: Pin<&mut Self>) {
        let mut this = self.project();
        // Guards held by the inner future restore into the task's bindings.
        let _installed = Installed::new(this.bindings);
        this.inner.set(None);
    }
}

/// Attaches binding sets to futures.
pub trait FlowFutureExt: Future + Sized {
    /// Runs the future under the bindings of the flow that creates it.
    fn in_current_flow(self) -> Scoped<Self> {
        Scoped::new(self, Snapshot::capture())
    }

    /// Runs the future under the given snapshot.
    fn with_snapshot(self, snapshot: Snapshot) -> Scoped<Self> {
        Scoped::new(self, snapshot)
    }
}

impl<F: Future> FlowFutureExt for F {}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
