//! `AssetFrame`: a synchronization barrier tracking which URL paths a
//! producing Spec has emitted, so consumer tasks can observe "all assets
//! from this producer are accounted for" without draining a channel
//! themselves (spec.md Section 4.7).
//!
//! Built on a `Mutex` + `tokio::sync::Notify`, matching the "straightforward
//! mutex+condvar" option spec.md Section 9 calls out (a channel-per-key
//! scheme was the alternative it names; Notify avoids the fan-out of one
//! channel per path without reintroducing spurious-wakeup bugs, since every
//! waiter re-checks its condition after each wake).

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use spectree_core::Asset;

#[derive(Default)]
struct FrameState {
    /// `None` until the canonical asset for that path is known.
    entries: HashMap<String, Option<Arc<Asset>>>,
    /// Set once the producing Spec has finished running and will register
    /// no further paths.
    closed: bool,
}

/// Per-producer registry of emitted asset paths.
pub struct AssetFrame {
    state: std::sync::Mutex<FrameState>,
    notify: Notify,
    /// Count of paths this frame has registered as newly generated (spec.md
    /// Section 4.4 step 1: "the new path is then registered and the
    /// AssetFrame's generated-counter advanced").
    generated: AtomicUsize,
}

impl Default for AssetFrame {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetFrame {
    pub fn new() -> Self {
        Self {
            state: std::sync::Mutex::new(FrameState::default()),
            notify: Notify::new(),
            generated: AtomicUsize::new(0),
        }
    }

    /// Registers a path as produced, without yet knowing its canonical
    /// asset. Idempotent (spec.md Section 4.7: "`AddKey` is idempotent").
    /// Returns `true` the first time a given path is registered, so a
    /// caller can tell whether it just introduced a new path (spec.md
    /// Section 4.4 step 1).
    pub fn add_key(&self, path: impl Into<String>) -> bool {
        let mut state = self.state.lock().expect("asset frame mutex poisoned");
        let newly_added = match state.entries.entry(path.into()) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(None);
                true
            }
        };
        drop(state);
        if newly_added {
            self.generated.fetch_add(1, Ordering::Relaxed);
        }
        self.notify.notify_waiters();
        newly_added
    }

    /// True if `path` has already been registered on this frame (spec.md
    /// Section 4.4 step 1: "If the asset's URL path is not yet present in
    /// the owning Spec's AssetFrame").
    pub fn contains(&self, path: &str) -> bool {
        self.state
            .lock()
            .expect("asset frame mutex poisoned")
            .entries
            .contains_key(path)
    }

    pub fn generated_count(&self) -> usize {
        self.generated.load(Ordering::Relaxed)
    }

    /// Supplies the canonical asset for a previously (or newly) registered
    /// path.
    pub fn materialize(&self, path: impl Into<String>, asset: Arc<Asset>) {
        let mut state = self.state.lock().expect("asset frame mutex poisoned");
        state.entries.insert(path.into(), Some(asset));
        drop(state);
        self.notify.notify_waiters();
    }

    /// Marks this frame closed: the producing Spec has finished and no
    /// further paths will be registered.
    pub fn close(&self) {
        let mut state = self.state.lock().expect("asset frame mutex poisoned");
        state.closed = true;
        drop(state);
        self.notify.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().expect("asset frame mutex poisoned").closed
    }

    /// True once every path registered so far also has its canonical asset
    /// materialized and the frame is closed — the strict reading of
    /// "accounted for". Paths registered via `add_key` alone (no matching
    /// `materialize` call) never satisfy this; most callers want
    /// [`AssetFrame::is_ready`] instead, which only requires closure.
    pub fn all_materialized(&self) -> bool {
        let state = self.state.lock().expect("asset frame mutex poisoned");
        state.closed && state.entries.values().all(Option::is_some)
    }

    /// True once this frame is closed — the producing Spec has finished
    /// and every path it will ever emit has been registered via `add_key`
    /// (spec.md Section 4.7: a consumer task uses this "to observe 'all
    /// children are done producing' without draining the input channel
    /// itself"). Unlike `all_materialized`, this does not require every
    /// path's canonical asset to have been cached — most of the engine's
    /// own emit path only calls `add_key`, never `materialize`.
    pub fn is_ready(&self) -> bool {
        self.state.lock().expect("asset frame mutex poisoned").closed
    }

    /// Blocks until this frame is closed (spec.md Section 4.7
    /// `AwaitAssetFrameName`, applied to a single frame).
    pub async fn await_complete(&self) {
        loop {
            if self.is_ready() {
                return;
            }
            let notified = self.notify.notified();
            if self.is_ready() {
                return;
            }
            notified.await;
        }
    }

    pub fn entry_count(&self) -> usize {
        self.state.lock().expect("asset frame mutex poisoned").entries.len()
    }
}

/// A Spec's registry of its subspecs' frames, keyed by subspec name
/// (spec.md Section 3: Spec owns "an AssetFrame registry").
#[derive(Default)]
pub struct AssetFrameRegistry {
    frames: std::sync::Mutex<HashMap<String, Arc<AssetFrame>>>,
}

impl AssetFrameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `frame` as the frame for `subspec_name`, replacing any
    /// placeholder a prior `frame_for` lookup may have created. Used when a
    /// Spec attaches a subspec: the subspec's own `AssetFrame` (the one it
    /// populates as it emits) becomes the entry the parent awaits on,
    /// rather than a fresh, never-populated one.
    pub fn register(&self, subspec_name: impl Into<String>, frame: Arc<AssetFrame>) {
        self.frames
            .lock()
            .expect("registry mutex poisoned")
            .insert(subspec_name.into(), frame);
    }

    /// Registers (or fetches) the frame for a named subspec.
    pub fn frame_for(&self, subspec_name: &str) -> Arc<AssetFrame> {
        let mut frames = self.frames.lock().expect("registry mutex poisoned");
        frames
            .entry(subspec_name.to_string())
            .or_insert_with(|| Arc::new(AssetFrame::new()))
            .clone()
    }

    /// Waits for a specific subspec's frame to complete (spec.md Section
    /// 4.7 `AwaitAssetFrameName`).
    pub async fn await_name(&self, subspec_name: &str) {
        self.frame_for(subspec_name).await_complete().await;
    }

    /// Waits for every currently-registered subspec frame to complete
    /// (spec.md Section 4.7 `AwaitAssetFrames`).
    pub async fn await_all(&self) {
        let frames: Vec<Arc<AssetFrame>> = self
            .frames
            .lock()
            .expect("registry mutex poisoned")
            .values()
            .cloned()
            .collect();
        for frame in frames {
            frame.await_complete().await;
        }
    }
}
