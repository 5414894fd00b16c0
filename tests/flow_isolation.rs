//! Integration tests for isolation between execution flows.
//!
//! Threads never see each other's bindings unless they are handed over
//! explicitly with `spawn`, `Snapshot::run` or `Snapshot::wrap`.

use context_local::{context_kind, flow, ContextKind, Snapshot};
use std::sync::{mpsc, Arc, Barrier};
use std::thread;

#[derive(Debug, Clone, PartialEq)]
struct Worker {
    name: String,
}

context_kind!(Worker);

fn worker_name() -> Option<String> {
    Worker::try_current().map(|w| w.name.clone())
}

#[test]
fn test_concurrent_threads_see_only_their_own_value() {
    let barrier = Arc::new(Barrier::new(4));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let barrier = barrier.clone();
            thread::spawn(move || {
                let _guard = Worker::bind(Worker {
                    name: format!("worker-{i}"),
                });

                // Everyone has bound before anyone reads.
                barrier.wait();
                let seen = worker_name();
                barrier.wait();
                seen
            })
        })
        .collect();

    let seen: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(
        seen,
        (0..4).map(|i| Some(format!("worker-{i}"))).collect::<Vec<_>>()
    );
    assert_eq!(worker_name(), None);
}

#[test]
fn test_writes_in_one_thread_do_not_leak() {
    let (bound_tx, bound_rx) = mpsc::channel();
    let (done_tx, done_rx) = mpsc::channel::<()>();

    let handle = thread::spawn(move || {
        let _guard = Worker::bind(Worker {
            name: "background".to_string(),
        });
        bound_tx.send(()).unwrap();
        done_rx.recv().unwrap();
        worker_name()
    });

    bound_rx.recv().unwrap();
    assert_eq!(worker_name(), None);

    let _guard = Worker::bind(Worker {
        name: "main".to_string(),
    });
    done_tx.send(()).unwrap();

    assert_eq!(handle.join().unwrap(), Some("background".to_string()));
    assert_eq!(worker_name(), Some("main".to_string()));
}

#[test]
fn test_plain_thread_starts_unbound() {
    let _guard = Worker::bind(Worker {
        name: "parent".to_string(),
    });

    let seen = thread::spawn(worker_name).join().unwrap();
    assert_eq!(seen, None);
}

#[test]
fn test_spawn_propagates_parent_bindings() {
    let _guard = Worker::bind(Worker {
        name: "parent".to_string(),
    });

    let seen = flow::spawn(|| {
        let inherited = worker_name();
        {
            let _child = Worker::bind(Worker {
                name: "child".to_string(),
            });
            assert_eq!(worker_name(), Some("child".to_string()));
        }
        (inherited, worker_name())
    })
    .join()
    .unwrap();

    assert_eq!(seen.0, Some("parent".to_string()));
    assert_eq!(seen.1, Some("parent".to_string()));

    // The child's scope never touched the parent.
    assert_eq!(worker_name(), Some("parent".to_string()));
}

#[test]
fn test_snapshot_wrap_runs_under_captured_bindings() {
    let task = {
        let _guard = Worker::bind(Worker {
            name: "captured".to_string(),
        });
        Snapshot::capture().wrap(worker_name)
    };

    assert_eq!(worker_name(), None);
    assert_eq!(thread::spawn(task).join().unwrap(), Some("captured".to_string()));
}

#[test]
fn test_snapshot_run_restores_thread_bindings() {
    let _guard = Worker::bind(Worker {
        name: "own".to_string(),
    });

    Snapshot::empty().run(|| {
        assert_eq!(worker_name(), None);
        let _inner = Worker::bind(Worker {
            name: "temporary".to_string(),
        });
        assert_eq!(worker_name(), Some("temporary".to_string()));
    });

    assert_eq!(worker_name(), Some("own".to_string()));
}
