//! `Spec::run`: the async run loop (spec.md Section 4.6).
//!
//! Mirrors the teacher's `Scheduler::run_once`/`runner` split: subspecs are
//! spawned as independent tokio tasks up front (standing in for the
//! source's per-child goroutines), failures are funneled back over a
//! bounded `mpsc` channel, and the parent's own queue drains on the calling
//! task. A Spec's passthrough drain after its queue empties polls its input
//! channel rather than blocking on `recv`, since a `TASKS_QUEUE`-capable
//! task may be draining the same channel concurrently through its
//! `InputHandle` — see `spec.rs`'s `drain_input_now`.
//!
//! A dedicated "watcher" task owns the error channel's receiving end and
//! calls `signal_cancel()` the instant a subspec failure arrives, running
//! concurrently with (not interleaved into) whatever this Spec's own queue
//! is synchronously executing at that moment. This is what makes
//! `TaskContext::cancel` an actual cross-thread signal a long-running
//! `TaskBehavior::run` can poll mid-execution, rather than a flag this
//! Spec could only ever flip in the gap between two tasks it already
//! controls the scheduling of.

use crate::error::{EngineError, Result};
use crate::spec::Spec;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// What the watcher task hands back to `drive_queue`/`drain_remaining_input`
/// once cancellation has been observed: the name of the subspec that failed
/// and the error it reported.
type PendingError = Arc<Mutex<Option<(String, EngineError)>>>;

/// How often the post-queue passthrough drain re-checks the input channel
/// and the subspec error channel while waiting for every child to finish.
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(5);

impl Spec {
    /// Runs this Spec to completion: spawns its subspecs, primes and drains
    /// its own task queue, then passes through whatever its children still
    /// forward until they have all finished, before calling `Done()` on
    /// every parent this Spec reports to (spec.md Section 4.6).
    pub async fn run(self: Arc<Self>) -> Result<()> {
        if self.mark_run_started() {
            return Err(EngineError::AlreadyRunning(self.name.clone()));
        }
        tracing::info!(spec = %self.name, "spec run starting");

        let children = self.subspecs_snapshot();
        let channel_capacity = children.len().max(1);
        let (err_tx, mut err_rx) = mpsc::channel::<(String, EngineError)>(channel_capacity);

        for child in children {
            let err_tx = err_tx.clone();
            let child_name = child.name.clone();
            tokio::spawn(async move {
                if let Err(e) = Spec::run(child).await {
                    tracing::warn!(spec = %child_name, error = %e, "subspec run failed");
                    let _ = err_tx.send((child_name, e)).await;
                }
            });
        }
        drop(err_tx);

        // The watcher owns the receiving end from here on: it blocks on
        // `recv` (not `try_recv`), so it observes a failure the instant it
        // arrives rather than only when this Spec's own loop next polls —
        // including while that loop is synchronously blocked inside a
        // task's `run`.
        let pending_error: PendingError = Arc::new(Mutex::new(None));
        let watcher_error = Arc::clone(&pending_error);
        let watcher_spec = Arc::clone(&self);
        let watcher = tokio::spawn(async move {
            if let Some((name, e)) = err_rx.recv().await {
                *watcher_error.lock().expect("pending error mutex poisoned") = Some((name, e));
                watcher_spec.signal_cancel();
            }
        });

        if self.queue_has_cycle() {
            watcher.abort();
            return self.finish(Some(EngineError::CyclicQueue(self.name.clone())));
        }
        self.queue_prime();

        let mut run_error = self.drive_queue(&pending_error).await;

        if run_error.is_none() {
            run_error = self.drain_remaining_input(&pending_error).await;
        }

        watcher.abort();
        self.finish(run_error)
    }

    /// Runs tasks in queue order until the queue drains, a task errors, a
    /// cycle is detected, or a subspec reports failure (spec.md Section 4.6
    /// steps 3-4). Cancellation is checked before every task; since the
    /// watcher task can set it at any point (not just between tasks), a
    /// task that was already running when a subspec failed still has its
    /// own `TaskContext::cancel` flip underneath it.
    async fn drive_queue(self: &Arc<Self>, pending_error: &PendingError) -> Option<EngineError> {
        loop {
            if self.is_cancelled() {
                let (name, e) = pending_error
                    .lock()
                    .expect("pending error mutex poisoned")
                    .take()
                    .expect("cancellation is always paired with a recorded subspec error");
                tracing::debug!(spec = %self.name, subspec = %name, "cancellation observed, breaking queue");
                return Some(EngineError::Subspec(name, Box::new(e)));
            }
            let Some(idx) = self.queue_current() else {
                return None;
            };
            match self.run_task_at(idx) {
                Ok((mask, assets)) => {
                    for asset in assets {
                        if let Err(e) = self.emit_asset(mask, Some(idx), asset).await {
                            return Some(e);
                        }
                    }
                }
                Err(e) => {
                    let name = self.task_name(idx);
                    tracing::warn!(spec = %self.name, task = %name, error = %e, "task run failed");
                    return Some(EngineError::from(e));
                }
            }
            if self.queue_has_cycle() {
                return Some(EngineError::CyclicQueue(self.name.clone()));
            }
            self.queue_advance();
        }
    }

    /// Once this Spec's own queue has drained, it still forwards whatever
    /// its children send until every one of them has called `Done()`
    /// (spec.md Section 4.5: "implicit post-task-queue drain ... forwards
    /// remaining assets to the Spec's own outputs").
    async fn drain_remaining_input(self: &Arc<Self>, pending_error: &PendingError) -> Option<EngineError> {
        loop {
            for asset in self.drain_input_now() {
                if let Err(e) = self.emit_to_outputs_passthrough(asset).await {
                    tracing::warn!(spec = %self.name, error = %e, "failed forwarding passthrough asset");
                }
            }
            if self.input_waitgroup().count() == 0 && self.drain_input_now().is_empty() {
                return None;
            }
            if self.is_cancelled() {
                let (name, e) = pending_error
                    .lock()
                    .expect("pending error mutex poisoned")
                    .take()
                    .expect("cancellation is always paired with a recorded subspec error");
                return Some(EngineError::Subspec(name, Box::new(e)));
            }
            tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
        }
    }

    /// Marks this Spec finished: closes its own AssetFrame and signals
    /// `Done()` on every parent it reports to, regardless of outcome
    /// (spec.md Section 4.6 step 6: "`Done` is called on each parental
    /// waitgroup exactly once").
    fn finish(&self, error: Option<EngineError>) -> Result<()> {
        self.close_own_frame();
        for out in self.outputs_snapshot() {
            out.done();
        }
        match error {
            Some(e) => {
                tracing::warn!(spec = %self.name, error = %e, "spec run finished with error");
                Err(e)
            }
            None => {
                tracing::info!(spec = %self.name, "spec run finished");
                Ok(())
            }
        }
    }
}
