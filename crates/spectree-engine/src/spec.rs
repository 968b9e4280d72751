//! `Spec`: a node in the build tree. Owns a task queue, a TaskResolver tree,
//! an AssetFrame registry for its subspecs, and the channel/waitgroup pairs
//! that carry assets up to whichever parent(s) it reports to (spec.md
//! Section 3).
//!
//! Mirrors the teacher's `Storage`/`Scheduler` split (a plain data owner
//! guarded by a handful of narrowly-scoped `Mutex`es, with the actual run
//! loop living in a sibling module) rather than one large lock around
//! everything — each field is locked only for the operation that touches
//! it, never across an `.await`.

use crate::error::{EngineError, Result};
use crate::frame::{AssetFrame, AssetFrameRegistry};
use crate::queue::{TaskIndex, TaskQueue};
use crate::waitgroup::WaitGroup;
use spectree_core::{Asset, PropertyMap};
use spectree_path::{apply_chain, PathTransformation};
use spectree_task::{
    CapabilityMask, InputHandle, QueueHandle, ResolverContext, ResolverId, ResolverTree, Task,
    TaskContext, TaskPrototype, ASSETS_CONSUME_FROM_SPECS, ASSETS_CONSUME_FROM_TASKS, ASSETS_EMIT,
    ASSETS_FILTER_SPEC, ASSETS_FILTER_TASK, ASSETS_GENERATE, ASSETS_MUTATE, TASKS_QUEUE,
};
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::mpsc;

/// A parent Spec's registration on one of its children: the channel the
/// child forwards emitted assets through, plus the parent's waitgroup the
/// child's `run()` must decrement exactly once when it finishes (spec.md
/// Section 3: Spec's "output fan-out (list of (channel, waitgroup) pairs to
/// parent Specs)").
#[derive(Clone)]
struct OutputSubscriber {
    tx: mpsc::UnboundedSender<Asset>,
    wg: WaitGroup,
}

/// One node of the Spec tree.
pub struct Spec {
    pub name: String,
    pub props: PropertyMap,
    parent: Mutex<Option<Weak<Spec>>>,
    subspecs: Mutex<BTreeMap<String, Arc<Spec>>>,
    /// This Spec's registry of its *children's* AssetFrames, keyed by child
    /// name (spec.md Section 3: Spec owns "an AssetFrame registry").
    child_frames: AssetFrameRegistry,
    /// This Spec's own outgoing frame — the one a parent registers under
    /// this Spec's name when attaching it (spec.md Section 4.7).
    own_frame: Arc<AssetFrame>,
    queue: Mutex<TaskQueue>,
    resolvers: Mutex<ResolverTree>,
    resolver_roots: Mutex<Vec<ResolverId>>,
    /// Cloned to every subspec attached to this Spec, so each can send
    /// assets up this Spec's own input channel.
    input_tx_template: mpsc::UnboundedSender<Asset>,
    input_rx: Mutex<mpsc::UnboundedReceiver<Asset>>,
    /// Counts this Spec's live children (incremented on attach, decremented
    /// once per child's `Done()` call) — this Spec's own input waitgroup,
    /// not to be confused with the waitgroups it holds in `outputs` (which
    /// belong to *its* parent(s)).
    input_waitgroup: WaitGroup,
    /// Where this Spec forwards assets that fall through its own task queue
    /// (spec.md Section 4.4 step 6/7): normally one entry, its attaching
    /// parent, but kept as a `Vec` since nothing in the data model
    /// prevents a Spec being attached more than once.
    outputs: Mutex<Vec<OutputSubscriber>>,
    path_transforms: Mutex<Vec<PathTransformation>>,
    run_started: AtomicBool,
    /// Cooperative-cancellation broadcast (spec.md Section 4.6/5/9): flipped
    /// by a dedicated watcher task (see `run.rs`) the instant any subspec
    /// reports failure, observed by every `TaskContext` this Spec hands out
    /// via `CancelHandle`. Because the watcher runs concurrently with
    /// whatever task this Spec's own queue is currently executing, a task
    /// already mid-`run` can see its `TaskContext::cancel` flip underneath
    /// it, not just the next task the queue reaches. A `watch` is used
    /// rather than a bounded `mpsc` "cancel channel sized to subspec count"
    /// — the source's reason for that sizing is to keep the sender from
    /// blocking when no one is left to receive, a property
    /// `watch::Sender::send` already has unconditionally.
    cancel_tx: tokio::sync::watch::Sender<bool>,
}

impl Spec {
    pub fn new(name: impl Into<String>, props: PropertyMap) -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let (cancel_tx, _cancel_rx) = tokio::sync::watch::channel(false);
        Arc::new(Self {
            name: name.into(),
            props,
            parent: Mutex::new(None),
            subspecs: Mutex::new(BTreeMap::new()),
            child_frames: AssetFrameRegistry::new(),
            own_frame: Arc::new(AssetFrame::new()),
            queue: Mutex::new(TaskQueue::new()),
            resolvers: Mutex::new(ResolverTree::new()),
            resolver_roots: Mutex::new(Vec::new()),
            input_tx_template: tx,
            input_rx: Mutex::new(rx),
            input_waitgroup: WaitGroup::new(),
            outputs: Mutex::new(Vec::new()),
            path_transforms: Mutex::new(Vec::new()),
            run_started: AtomicBool::new(false),
            cancel_tx,
        })
    }

    fn guard_not_running(&self) -> Result<()> {
        if self.run_started.load(Ordering::SeqCst) {
            return Err(EngineError::AlreadyRunning(self.name.clone()));
        }
        Ok(())
    }

    // --- Tree attachment ---------------------------------------------

    /// Attaches `child` as a subspec: registers its AssetFrame, wires its
    /// output fan-out to this Spec's own input channel and waitgroup, and
    /// records the parent link (spec.md Section 3, Section 4.5). Must be
    /// called before either Spec's `run()`.
    pub fn attach_subspec(self: &Arc<Self>, child: Arc<Spec>) -> Result<()> {
        self.guard_not_running()?;
        *child.parent.lock().expect("parent mutex poisoned") = Some(Arc::downgrade(self));
        self.child_frames
            .register(child.name.clone(), Arc::clone(&child.own_frame));
        self.input_waitgroup.increment();
        child.outputs.lock().expect("outputs mutex poisoned").push(OutputSubscriber {
            tx: self.input_tx_template.clone(),
            wg: self.input_waitgroup.clone(),
        });
        self.subspecs
            .lock()
            .expect("subspecs mutex poisoned")
            .insert(child.name.clone(), child);
        Ok(())
    }

    pub fn subspec(&self, name: &str) -> Option<Arc<Spec>> {
        self.subspecs.lock().expect("subspecs mutex poisoned").get(name).cloned()
    }

    /// Registers an external, non-Spec output subscriber and returns the
    /// receiving end plus the `WaitGroup` this Spec will call `Done()` on
    /// exactly once when `run()` finishes (spec.md Section 4.5's output
    /// fan-out, generalized to a caller that is not itself a `Spec` — this
    /// is how `spectree-cli` observes the root of a tree it runs, since a
    /// root has no parent to register under the normal `attach_subspec`
    /// path).
    pub fn collect_output(self: &Arc<Self>) -> (mpsc::UnboundedReceiver<Asset>, WaitGroup) {
        let (tx, rx) = mpsc::unbounded_channel();
        let wg = WaitGroup::new();
        wg.increment();
        self.outputs.lock().expect("outputs mutex poisoned").push(OutputSubscriber {
            tx,
            wg: wg.clone(),
        });
        (rx, wg)
    }

    pub fn subspec_names(&self) -> Vec<String> {
        self.subspecs
            .lock()
            .expect("subspecs mutex poisoned")
            .keys()
            .cloned()
            .collect()
    }

    pub fn parent_name(&self) -> Option<String> {
        self.parent
            .lock()
            .expect("parent mutex poisoned")
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|p| p.name.clone())
    }

    /// This Spec's own AssetFrame — what a parent awaits on via its
    /// `child_frames` registry under this Spec's name.
    pub fn own_frame(&self) -> Arc<AssetFrame> {
        Arc::clone(&self.own_frame)
    }

    /// Waits for a named child's frame to close (spec.md Section 4.7
    /// `AwaitAssetFrameName`).
    pub async fn await_child_frame(&self, child_name: &str) {
        self.child_frames.await_name(child_name).await;
    }

    /// Waits for every currently-attached child's frame to close (spec.md
    /// Section 4.7 `AwaitAssetFrames`).
    pub async fn await_all_child_frames(&self) {
        self.child_frames.await_all().await;
    }

    // --- Output routing configuration ---------------------------------

    /// Sets the ordered chain of path rewrites applied to assets this Spec
    /// forwards to its outputs (spec.md Section 3, Section 6 `transform`).
    pub fn set_path_transforms(&self, chain: Vec<PathTransformation>) {
        *self.path_transforms.lock().expect("path transforms mutex poisoned") = chain;
    }

    // --- Queue construction (pre-run) ----------------------------------

    pub fn enqueue(&self, task: Task) -> Result<TaskIndex> {
        self.guard_not_running()?;
        self.enqueue_raw(task).map_err(EngineError::from)
    }

    pub fn defer(&self, task: Task) -> Result<TaskIndex> {
        self.guard_not_running()?;
        self.defer_raw(task).map_err(EngineError::from)
    }

    pub fn push(&self, task: Task) -> Result<TaskIndex> {
        self.guard_not_running()?;
        self.push_raw(task).map_err(EngineError::from)
    }

    /// Unguarded insertion used both by the pre-run builder methods above
    /// and by the `QueueHandle` impl below, which is only ever reachable
    /// from a currently-executing task already holding `TASKS_QUEUE`.
    fn enqueue_raw(&self, mut task: Task) -> spectree_task::Result<TaskIndex> {
        task.assign_to(&self.name)?;
        Ok(self.queue.lock().expect("queue mutex poisoned").enqueue(task))
    }

    fn defer_raw(&self, mut task: Task) -> spectree_task::Result<TaskIndex> {
        task.assign_to(&self.name)?;
        Ok(self.queue.lock().expect("queue mutex poisoned").defer(task))
    }

    fn push_raw(&self, mut task: Task) -> spectree_task::Result<TaskIndex> {
        task.assign_to(&self.name)?;
        Ok(self.queue.lock().expect("queue mutex poisoned").push(task))
    }

    // --- TaskResolver tree ----------------------------------------------

    pub fn insert_root_resolver(
        &self,
        name: impl Into<String>,
        accept_mask: CapabilityMask,
        match_blocks: bool,
        prototype: TaskPrototype,
    ) -> ResolverId {
        let id = self
            .resolvers
            .lock()
            .expect("resolver mutex poisoned")
            .insert_root(name, accept_mask, match_blocks, prototype);
        self.resolver_roots.lock().expect("resolver roots mutex poisoned").push(id);
        id
    }

    pub fn insert_child_resolver(
        &self,
        parent: ResolverId,
        name: impl Into<String>,
        accept_mask: CapabilityMask,
        match_blocks: bool,
        prototype: TaskPrototype,
    ) -> Result<ResolverId> {
        self.resolvers
            .lock()
            .expect("resolver mutex poisoned")
            .insert_child(parent, name, accept_mask, match_blocks, prototype)
            .map_err(EngineError::from)
    }

    pub fn set_resolver_match_fn(
        &self,
        id: ResolverId,
        match_fn: impl Fn(&str, &dyn ResolverContext) -> bool + Send + Sync + 'static,
    ) {
        self.resolvers
            .lock()
            .expect("resolver mutex poisoned")
            .set_match_fn(id, match_fn);
    }

    /// Resolves a Task by name through this Spec's own resolver roots
    /// (spec.md Section 4.3 `Match`).
    pub fn resolve_task(&self, name: &str) -> Result<Option<Task>> {
        let roots = self.resolver_roots.lock().expect("resolver roots mutex poisoned").clone();
        let tree = self.resolvers.lock().expect("resolver mutex poisoned");
        match tree.resolve_any(&roots, name, self) {
            Some(id) => Ok(Some(tree.prototype(id).instantiate()?)),
            None => Ok(None),
        }
    }

    /// Resolves a Task by asset match through this Spec's own resolver
    /// roots (spec.md Section 4.3 `MatchWithAsset`).
    pub fn resolve_task_for_asset(&self, asset: &Asset) -> Result<Option<Task>> {
        let roots = self.resolver_roots.lock().expect("resolver roots mutex poisoned").clone();
        let tree = self.resolvers.lock().expect("resolver mutex poisoned");
        match tree.resolve_with_asset(&roots, asset) {
            Some(id) => Ok(Some(tree.prototype(id).instantiate()?)),
            None => Ok(None),
        }
    }

    // --- EmitAsset (spec.md Section 4.4) --------------------------------

    /// A task's asset-matching mask permits it to receive routed assets:
    /// any consume/filter/mutate/queue capability, or an undefined
    /// (all-zero) mask, which spec.md Section 4.2 treats as unrestricted.
    /// Tasks marked `ignore_assets` never participate in routing at all.
    fn can_receive(task: &Task) -> bool {
        if task.policy.ignore_assets {
            return false;
        }
        let m = task.mask;
        m.is_zero()
            || m.has(ASSETS_CONSUME_FROM_TASKS)
            || m.has(ASSETS_CONSUME_FROM_SPECS)
            || m.has(ASSETS_FILTER_TASK)
            || m.has(ASSETS_FILTER_SPEC)
            || m.has(ASSETS_MUTATE)
            || m.has(TASKS_QUEUE)
    }

    fn make_context(self: &Arc<Self>, mask: CapabilityMask) -> TaskContext {
        TaskContext {
            spec_name: self.name.clone(),
            mask,
            queue: mask
                .has(TASKS_QUEUE)
                .then(|| Arc::clone(self) as Arc<dyn QueueHandle>),
            input: mask
                .has(ASSETS_CONSUME_FROM_SPECS)
                .then(|| Arc::clone(self) as Arc<dyn InputHandle>),
            cancel: spectree_task::CancelHandle::new(self.cancel_tx.subscribe()),
        }
    }

    /// Non-blocking check of this Spec's own cancellation flag (spec.md
    /// Section 4.6 step 4: "before each task, check cancel channel
    /// non-blockingly").
    pub(crate) fn is_cancelled(&self) -> bool {
        *self.cancel_tx.borrow()
    }

    /// Flips this Spec's cancellation flag. Called exactly once, by the
    /// dedicated watcher task `run.rs` spawns alongside this Spec's own
    /// queue, the instant a subspec's error arrives (spec.md Section 4.6
    /// step 1: "a cancellation signal is also pushed onto a cancel
    /// channel").
    pub(crate) fn signal_cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }

    /// Routes `asset`, emitted by the task at `from` (or by a direct
    /// injection if `from` is `None`) under `emitter_mask`, through this
    /// Spec's queue and onward to its outputs if nothing downstream claims
    /// it (spec.md Section 4.4). Boxed because the multi-asset flatten
    /// branch recurses into this same method once per flattened child.
    pub fn emit_asset<'a>(
        self: &'a Arc<Self>,
        emitter_mask: CapabilityMask,
        from: Option<TaskIndex>,
        asset: Asset,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            if !emitter_mask.has(ASSETS_EMIT) {
                return Err(EngineError::CapabilityDenied {
                    spec: self.name.clone(),
                    task: from.map_or_else(|| "<direct>".to_string(), |_| "<emitter>".to_string()),
                    capability: "ASSETS_EMIT",
                });
            }
            let path = asset.url.path().to_string();
            if !self.own_frame.contains(&path) {
                if !emitter_mask.has(ASSETS_GENERATE) {
                    return Err(EngineError::CapabilityDenied {
                        spec: self.name.clone(),
                        task: "<emitter>".to_string(),
                        capability: "ASSETS_GENERATE",
                    });
                }
                self.own_frame.add_key(path);
            }
            self.route_from(emitter_mask, from, asset).await
        })
    }

    fn route_from<'a>(
        self: &'a Arc<Self>,
        emitter_mask: CapabilityMask,
        mut from: Option<TaskIndex>,
        mut asset: Asset,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            loop {
                let next = {
                    self.queue
                        .lock()
                        .expect("queue mutex poisoned")
                        .find_after(from, Self::can_receive)
                };
                let Some(next_idx) = next else {
                    return self.emit_to_outputs(asset).await;
                };
                let (accept_multi, reject_flatten, next_mask, has_func_next, has_map_next, matches) = {
                    let q = self.queue.lock().expect("queue mutex poisoned");
                    let t = q.task(next_idx);
                    (
                        t.policy.accept_multi_assets,
                        t.policy.reject_flatten_multi_assets,
                        t.mask,
                        t.has_func(),
                        t.has_map_func(),
                        t.matcher.accepts(&asset),
                    )
                };

                if !matches {
                    from = Some(next_idx);
                    continue;
                }

                if asset.is_multi() && !accept_multi {
                    if reject_flatten {
                        return Err(EngineError::RejectedMultiAsset(asset.url.to_string()));
                    }
                    asset.materialize_multi();
                    for item in asset.expand_multi()? {
                        self.route_from(emitter_mask, from, item).await?;
                    }
                    return Ok(());
                }

                if has_map_next {
                    let ctx = self.make_context(next_mask);
                    let mapped = {
                        let mut q = self.queue.lock().expect("queue mutex poisoned");
                        q.task_mut(next_idx).map_asset(&ctx, asset)?
                    };
                    match mapped {
                        None => {
                            // `from` is `Some` exactly when this asset is still being
                            // routed through a chain that started at a task in this
                            // Spec's own queue (spec.md Section 4.4 step 6: "ASSETS_FILTER_TASK
                            // (if same Spec)"); `from` is `None` only for a direct
                            // `emit_asset` injection from outside this Spec's queue — a
                            // parent Spec's forwarded asset, or an external caller —
                            // which is the "ASSETS_FILTER_SPEC" case.
                            let required = if from.is_some() {
                                ASSETS_FILTER_TASK
                            } else {
                                ASSETS_FILTER_SPEC
                            };
                            if !emitter_mask.has(required) {
                                return Err(EngineError::CapabilityDenied {
                                    spec: self.name.clone(),
                                    task: "<emitter>".to_string(),
                                    capability: if from.is_some() {
                                        "ASSETS_FILTER_TASK"
                                    } else {
                                        "ASSETS_FILTER_SPEC"
                                    },
                                });
                            }
                            return Ok(());
                        }
                        Some(returned) => {
                            if has_func_next {
                                self.queue
                                    .lock()
                                    .expect("queue mutex poisoned")
                                    .task_mut(next_idx)
                                    .deposit(returned);
                                return Ok(());
                            }
                            asset = returned;
                            from = Some(next_idx);
                            continue;
                        }
                    }
                } else {
                    self.queue
                        .lock()
                        .expect("queue mutex poisoned")
                        .task_mut(next_idx)
                        .deposit(asset);
                    return Ok(());
                }
            }
        })
    }

    /// Forwards `asset` to every parent this Spec reports to, rewriting its
    /// path through this Spec's transform chain and namespacing it under
    /// this Spec's name (spec.md Section 4.4 step 7, Section 6).
    async fn emit_to_outputs(self: &Arc<Self>, mut asset: Asset) -> Result<()> {
        let outputs = self.outputs.lock().expect("outputs mutex poisoned").clone();
        if outputs.is_empty() {
            return Ok(());
        }
        if asset.is_multi() {
            asset.materialize_multi();
        }
        let chain = self.path_transforms.lock().expect("path transforms mutex poisoned").clone();
        let transformed_path = apply_chain(&chain, asset.url.path());
        let new_url = asset.url.with_path(transformed_path).namespace_under(&self.name);
        for out in &outputs {
            let copy = asset.rewritten(new_url.clone())?;
            if out.tx.send(copy).is_err() {
                tracing::debug!(spec = %self.name, "output receiver closed, dropping forwarded asset");
            }
        }
        Ok(())
    }

    /// Forwards a passthrough asset (one this Spec never routed through its
    /// own queue, having arrived directly on its input channel after the
    /// queue had already drained) straight to this Spec's outputs. Exposed
    /// to `run.rs`'s post-queue drain, which has no task index to attribute
    /// the forward to.
    pub(crate) async fn emit_to_outputs_passthrough(self: &Arc<Self>, asset: Asset) -> Result<()> {
        self.emit_to_outputs(asset).await
    }

    // --- Input channel (spec.md Section 4.5, Section 4.7) ---------------

    /// Non-blocking drain of whatever has arrived on this Spec's input
    /// channel so far. Shared by the post-queue passthrough drain in
    /// `run()` and by the `InputHandle` a `TASKS_QUEUE`-less but
    /// `ASSETS_CONSUME_FROM_SPECS`-capable task is handed.
    pub(crate) fn drain_input_now(&self) -> Vec<Asset> {
        let mut out = Vec::new();
        let mut rx = self.input_rx.lock().expect("input receiver mutex poisoned");
        while let Ok(asset) = rx.try_recv() {
            out.push(asset);
        }
        out
    }

    pub(crate) fn input_waitgroup(&self) -> &WaitGroup {
        &self.input_waitgroup
    }

    pub(crate) fn outputs_snapshot(&self) -> Vec<OutputSubscriberHandle> {
        self.outputs
            .lock()
            .expect("outputs mutex poisoned")
            .iter()
            .map(|o| OutputSubscriberHandle { wg: o.wg.clone() })
            .collect()
    }

    pub(crate) fn close_own_frame(&self) {
        self.own_frame.close();
    }

    pub(crate) fn subspecs_snapshot(&self) -> Vec<Arc<Spec>> {
        self.subspecs.lock().expect("subspecs mutex poisoned").values().cloned().collect()
    }

    /// Atomically marks this Spec as started, returning whether it had
    /// already been started (spec.md Section 4.6: a Spec runs at most
    /// once).
    pub(crate) fn mark_run_started(&self) -> bool {
        self.run_started.swap(true, Ordering::SeqCst)
    }

    pub(crate) fn queue_has_cycle(&self) -> bool {
        self.queue.lock().expect("queue mutex poisoned").has_cycle()
    }

    pub(crate) fn queue_prime(&self) {
        self.queue.lock().expect("queue mutex poisoned").prime();
    }

    pub(crate) fn queue_advance(&self) {
        self.queue.lock().expect("queue mutex poisoned").advance();
    }

    pub(crate) fn queue_current(&self) -> Option<TaskIndex> {
        self.queue.lock().expect("queue mutex poisoned").current_index()
    }

    /// Runs the task at `idx`'s sequential step, returning its mask (so the
    /// caller can route any assets it leaves in its buffer) alongside those
    /// assets (spec.md Section 4.6 step 4).
    pub(crate) fn run_task_at(
        self: &Arc<Self>,
        idx: TaskIndex,
    ) -> spectree_task::Result<(CapabilityMask, Vec<Asset>)> {
        let mask = self.queue.lock().expect("queue mutex poisoned").task(idx).mask;
        let ctx = self.make_context(mask);
        self.queue
            .lock()
            .expect("queue mutex poisoned")
            .task_mut(idx)
            .run(&ctx)
            .map(|assets| (mask, assets))
    }

    pub(crate) fn task_name(&self, idx: TaskIndex) -> String {
        self.queue.lock().expect("queue mutex poisoned").task(idx).name.clone()
    }
}

/// A read-only view of one output subscription, exposed to `run.rs` so it
/// can call `Done()` without reaching into `Spec`'s private channel handle.
pub(crate) struct OutputSubscriberHandle {
    wg: WaitGroup,
}

impl OutputSubscriberHandle {
    pub(crate) fn done(&self) {
        self.wg.done();
    }
}

impl ResolverContext for Spec {
    fn spec_name(&self) -> &str {
        &self.name
    }

    fn property_str(&self, key: &str) -> Option<&str> {
        self.props.get_str(key).ok().flatten()
    }
}

impl QueueHandle for Spec {
    fn enqueue(&self, task: Task) -> spectree_task::Result<()> {
        self.enqueue_raw(task).map(|_| ())
    }

    fn defer(&self, task: Task) -> spectree_task::Result<()> {
        self.defer_raw(task).map(|_| ())
    }

    fn push(&self, task: Task) -> spectree_task::Result<()> {
        self.push_raw(task).map(|_| ())
    }
}

impl InputHandle for Spec {
    fn drain_available(&self) -> Vec<Asset> {
        self.drain_input_now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spectree_core::{AssetUrl, TypeMask};
    use spectree_task::{TaskBehavior, TaskPolicy};

    struct Noop;
    impl TaskBehavior for Noop {
        fn has_func(&self) -> bool {
            true
        }
        fn has_map_func(&self) -> bool {
            false
        }
    }

    fn leaf(name: &str) -> Arc<Spec> {
        Spec::new(name, PropertyMap::new())
    }

    #[test]
    fn attach_subspec_registers_frame_and_increments_waitgroup() {
        let parent = leaf("root");
        let child = leaf("child");
        parent.attach_subspec(Arc::clone(&child)).unwrap();
        assert_eq!(parent.input_waitgroup().count(), 1);
        assert_eq!(parent.subspec_names(), vec!["child".to_string()]);
        assert_eq!(child.parent_name(), Some("root".to_string()));
    }

    #[test]
    fn enqueue_after_run_started_is_rejected() {
        let spec = leaf("leaf");
        spec.run_started.store(true, Ordering::SeqCst);
        let task = Task::new("t", CapabilityMask::from_bits(ASSETS_EMIT), Box::new(Noop)).unwrap();
        assert!(spec.enqueue(task).is_err());
    }

    #[tokio::test]
    async fn emit_without_emit_capability_is_denied() {
        let spec = leaf("leaf");
        let asset = Asset::new_single(AssetUrl::new("leaf", "a"), "leaf", TypeMask::single_read_write());
        let err = spec.emit_asset(CapabilityMask::NONE, None, asset).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn emit_new_path_without_generate_is_denied() {
        let spec = leaf("leaf");
        let asset = Asset::new_single(AssetUrl::new("leaf", "a"), "leaf", TypeMask::single_read_write());
        let mask = CapabilityMask::from_bits(ASSETS_EMIT);
        assert!(spec.emit_asset(mask, None, asset).await.is_err());
    }

    #[tokio::test]
    async fn emit_with_no_downstream_task_falls_through_to_outputs_silently() {
        let spec = leaf("leaf");
        let asset = Asset::new_single(AssetUrl::new("leaf", "a"), "leaf", TypeMask::single_read_write());
        let mask = CapabilityMask::from_bits(ASSETS_EMIT | ASSETS_GENERATE);
        assert!(spec.emit_asset(mask, None, asset).await.is_ok());
    }

    #[tokio::test]
    async fn emit_deposits_into_first_matching_downstream_task() {
        let spec = leaf("leaf");
        let consume_mask = CapabilityMask::from_bits(ASSETS_CONSUME_FROM_TASKS);
        let task = Task::new("sink", consume_mask, Box::new(Noop)).unwrap();
        spec.enqueue(task).unwrap();
        spec.queue.lock().unwrap().prime();
        let asset = Asset::new_single(AssetUrl::new("leaf", "a"), "leaf", TypeMask::single_read_write());
        let mask = CapabilityMask::from_bits(ASSETS_EMIT | ASSETS_GENERATE);
        spec.emit_asset(mask, None, asset).await.unwrap();
        let idx = spec.queue.lock().unwrap().current_index().unwrap();
        assert_eq!(spec.queue.lock().unwrap().task_mut(idx).take_buffer().len(), 1);
    }

    #[tokio::test]
    async fn multi_asset_sent_to_non_accepting_task_without_flatten_permission_errors() {
        let spec = leaf("leaf");
        let consume_mask = CapabilityMask::from_bits(ASSETS_CONSUME_FROM_TASKS);
        let task = Task::new("sink", consume_mask, Box::new(Noop))
            .unwrap()
            .with_policy(TaskPolicy {
                accept_multi_assets: false,
                reject_flatten_multi_assets: true,
                ignore_assets: false,
            });
        spec.enqueue(task).unwrap();
        spec.queue.lock().unwrap().prime();
        let child = Asset::new_single(AssetUrl::new("leaf", "a"), "leaf", TypeMask::single_read_write());
        let multi = Asset::new_multi(
            AssetUrl::new("leaf", "m"),
            "leaf",
            TypeMask::multi_array(),
            vec![child],
        );
        let mask = CapabilityMask::from_bits(ASSETS_EMIT | ASSETS_GENERATE);
        assert!(spec.emit_asset(mask, None, multi).await.is_err());
    }
}
