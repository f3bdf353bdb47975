//! Fork/join task scopes for the transform.
//!
//! Every fan-out runs one share of the work in the spawning task, spawns the
//! rest onto the rayon pool and returns only after all of them have finished.
//! A failing or panicking task aborts its scope: siblings that have not
//! started yet are skipped, nested scopes observe the abort through the
//! signal they were handed, and the first failure is reported after the join.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::error::NttError;

/// Source of an external cancellation request.
pub trait CancelSignal: Sync {
    fn is_cancelled(&self) -> bool;
}

/// A signal that never fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl CancelSignal for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Shared state of one fan-out.
struct TaskScope<'s> {
    parent: &'s dyn CancelSignal,
    aborted: AtomicBool,
    failure: Mutex<Option<NttError>>,
}

impl<'s> TaskScope<'s> {
    fn new(parent: &'s dyn CancelSignal) -> Self {
        Self {
            parent,
            aborted: AtomicBool::new(false),
            failure: Mutex::new(None),
        }
    }

    fn run(&self, task: impl FnOnce() -> Result<(), NttError>) {
        if self.aborted.load(Ordering::Acquire) {
            return;
        }
        if self.parent.is_cancelled() {
            self.fail(NttError::Cancelled);
            return;
        }
        match panic::catch_unwind(AssertUnwindSafe(task)) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => self.fail(err),
            Err(payload) => self.fail(NttError::TaskFailed(panic_message(payload.as_ref()))),
        }
    }

    fn fail(&self, err: NttError) {
        let mut slot = self.failure.lock();
        if slot.is_none() {
            tracing::debug!(error = %err, "aborting task scope");
            *slot = Some(err);
        }
        self.aborted.store(true, Ordering::Release);
    }

    fn finish(self) -> Result<(), NttError> {
        self.failure.into_inner().map_or(Ok(()), Err)
    }
}

impl CancelSignal for TaskScope<'_> {
    fn is_cancelled(&self) -> bool {
        self.aborted.load(Ordering::Acquire) || self.parent.is_cancelled()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "task panicked".to_string()
    }
}

/// Run `body` once per item and join them all.
///
/// Item 0 runs in the spawning task after the others have been spawned.
/// A single item runs inline without creating a scope. `body` receives the
/// item's position and the signal any nested fan-out must use.
pub fn fan_out<T, F>(items: Vec<T>, signal: &dyn CancelSignal, body: F) -> Result<(), NttError>
where
    T: Send,
    F: Fn(usize, T, &dyn CancelSignal) -> Result<(), NttError> + Sync,
{
    if items.len() <= 1 {
        return items
            .into_iter()
            .next()
            .map_or(Ok(()), |item| body(0, item, signal));
    }

    let scope = TaskScope::new(signal);
    let mut items = items.into_iter().enumerate();
    let inline = items.next();
    rayon::scope(|s| {
        let scope = &scope;
        let body = &body;
        for (index, item) in items {
            s.spawn(move |_| scope.run(|| body(index, item, scope)));
        }
        if let Some((index, item)) = inline {
            scope.run(|| body(index, item, scope));
        }
    });
    scope.finish()
}

/// Run two tasks concurrently: `left` inline, `right` spawned.
pub fn fan_out_pair<L, R>(signal: &dyn CancelSignal, left: L, right: R) -> Result<(), NttError>
where
    L: FnOnce(&dyn CancelSignal) -> Result<(), NttError> + Send,
    R: FnOnce(&dyn CancelSignal) -> Result<(), NttError> + Send,
{
    let scope = TaskScope::new(signal);
    rayon::scope(|s| {
        let scope = &scope;
        s.spawn(move |_| scope.run(|| right(scope)));
        scope.run(|| left(scope));
    });
    scope.finish()
}
