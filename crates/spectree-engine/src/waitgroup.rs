//! A counted completion signal standing in for the source's
//! `sync.WaitGroup` (spec.md Section 3: Spec's "output fan-out (list of
//! (channel, waitgroup) pairs to parent Specs)", Section 4.5, Section 4.6
//! step 6: "`Done` is called on each parental waitgroup exactly once").
//!
//! `tokio::sync::Notify` plays the same role here it plays in
//! [`crate::frame::AssetFrame`]: every waiter re-checks the count after
//! being woken, so a wakeup that races a fresh increment never causes a
//! missed decrement to go unnoticed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

struct Inner {
    count: AtomicUsize,
    notify: Notify,
}

/// A cheaply-cloneable handle to a shared completion counter.
#[derive(Clone)]
pub struct WaitGroup(Arc<Inner>);

impl Default for WaitGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl WaitGroup {
    pub fn new() -> Self {
        Self(Arc::new(Inner {
            count: AtomicUsize::new(0),
            notify: Notify::new(),
        }))
    }

    /// Registers one more outstanding producer (spec.md Section 4.5:
    /// "incrementing ... waitgroup count").
    pub fn increment(&self) {
        self.0.count.fetch_add(1, Ordering::SeqCst);
    }

    /// Signals that one producer has finished — called exactly once per
    /// output a Spec holds (spec.md Section 3: "Done called once per
    /// output to decrement parent waitgroup").
    pub fn done(&self) {
        let prev = self.0.count.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(prev > 0, "WaitGroup::done called more times than increment");
        if prev == 1 {
            self.0.notify.notify_waiters();
        }
    }

    pub fn count(&self) -> usize {
        self.0.count.load(Ordering::SeqCst)
    }

    /// Blocks until the count reaches zero (spec.md Section 4.5: "waits on
    /// the input waitgroup ... when the count reaches zero").
    pub async fn wait_zero(&self) {
        loop {
            if self.count() == 0 {
                return;
            }
            let notified = self.0.notify.notified();
            if self.count() == 0 {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wait_zero_returns_immediately_when_never_incremented() {
        let wg = WaitGroup::new();
        wg.wait_zero().await;
    }

    #[tokio::test]
    async fn wait_zero_blocks_until_every_increment_is_matched_by_done() {
        let wg = WaitGroup::new();
        wg.increment();
        wg.increment();
        let waiter = wg.clone();
        let handle = tokio::spawn(async move {
            waiter.wait_zero().await;
        });
        tokio::task::yield_now().await;
        assert!(!handle.is_finished());
        wg.done();
        tokio::task::yield_now().await;
        assert!(!handle.is_finished());
        wg.done();
        handle.await.unwrap();
    }
}
