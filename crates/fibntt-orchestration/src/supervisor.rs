//! Deadline supervision for one computation.
//!
//! The work runs on a scoped worker thread with its own cancellation token.
//! The calling thread polls for completion, forwards the caller's
//! cancellation, and cancels the worker once the deadline passes. The worker
//! is always joined before returning.

use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::RecvTimeoutError;

use fibntt_core::calculator::FibError;
use fibntt_core::progress::CancellationToken;

const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Run `work` on a worker thread, cancelling it at `deadline`.
///
/// A computation stopped by the deadline reports `FibError::Timeout`; one
/// stopped by `parent` reports whatever the work returned (normally
/// `FibError::Cancelled`).
pub(crate) fn run_supervised<T, F>(
    parent: &CancellationToken,
    deadline: Option<Instant>,
    work: F,
) -> Result<T, FibError>
where
    T: Send,
    F: FnOnce(&CancellationToken) -> Result<T, FibError> + Send,
{
    let child = CancellationToken::new();
    if parent.is_cancelled() {
        child.cancel();
    }
    let (done_tx, done_rx) = crossbeam_channel::bounded::<()>(1);
    let mut timed_out = false;

    let result = thread::scope(|s| {
        let token = &child;
        let worker = thread::Builder::new()
            .name("fibntt-worker".into())
            .spawn_scoped(s, move || {
                let out = work(token);
                let _ = done_tx.send(());
                out
            })
            .map_err(|e| FibError::Calculation(format!("cannot spawn worker: {e}")))?;

        loop {
            match done_rx.recv_timeout(POLL_INTERVAL) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {}
            }
            if parent.is_cancelled() {
                child.cancel();
            }
            if !child.is_cancelled() && deadline.is_some_and(|d| Instant::now() >= d) {
                tracing::debug!("deadline passed, cancelling worker");
                timed_out = true;
                child.cancel();
            }
        }

        worker
            .join()
            .map_err(|_| FibError::Calculation("worker panicked".into()))?
    });

    match result {
        Err(FibError::Cancelled) if timed_out => {
            Err(FibError::Timeout(describe_deadline(deadline)))
        }
        other => other,
    }
}

fn describe_deadline(deadline: Option<Instant>) -> String {
    match deadline {
        Some(d) => format!("{:?} past the deadline", Instant::now().saturating_duration_since(d)),
        None => "no deadline".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spin_until_cancelled(token: &CancellationToken) -> Result<u32, FibError> {
        while !token.is_cancelled() {
            thread::sleep(Duration::from_millis(1));
        }
        Err(FibError::Cancelled)
    }

    #[test]
    fn finished_work_is_returned() {
        let parent = CancellationToken::new();
        let result = run_supervised(&parent, None, |_| Ok(42));
        assert_eq!(result, Ok(42));
    }

    #[test]
    fn deadline_becomes_timeout() {
        let parent = CancellationToken::new();
        let deadline = Instant::now() + Duration::from_millis(20);
        let result = run_supervised(&parent, Some(deadline), spin_until_cancelled);
        assert!(matches!(result, Err(FibError::Timeout(_))));
        assert!(!parent.is_cancelled());
    }

    #[test]
    fn parent_cancellation_is_forwarded() {
        let parent = CancellationToken::new();
        parent.cancel();
        let result = run_supervised(&parent, None, spin_until_cancelled);
        assert_eq!(result, Err(FibError::Cancelled));
    }

    #[test]
    fn errors_pass_through() {
        let parent = CancellationToken::new();
        let result: Result<(), _> =
            run_supervised(&parent, None, |_| Err(FibError::Config("bad".into())));
        assert_eq!(result, Err(FibError::Config("bad".into())));
    }
}
