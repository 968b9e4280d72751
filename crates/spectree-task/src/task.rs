//! `Task`: one step in a Spec's queue (spec.md Section 3, Section 9
//! REDESIGN FLAGS "Task as dynamic callback").
//!
//! The source's `Func`/`MapFunc` closures are re-expressed here as a small
//! trait with two methods and default no-op bodies, matching the provider-
//! trait shape the teacher uses for pluggable behavior (see
//! `WorktreeProviderTrait`): built-in behaviors (in `spectree-behaviors`)
//! are structs implementing `TaskBehavior`.

use crate::capability::CapabilityMask;
use crate::error::{Result, TaskError};
use spectree_core::Asset;
use std::sync::Arc;

/// A handle letting a running Task mutate its owning Spec's task queue —
/// the concrete implementation lives in `spectree-engine`, which depends on
/// this crate (not the reverse), so it is reached only through this trait
/// object, the same seam `ResolverContext` uses to keep `spectree-task`
/// decoupled from the Spec tree.
pub trait QueueHandle: Send + Sync {
    fn enqueue(&self, task: Task) -> Result<()>;
    fn defer(&self, task: Task) -> Result<()>;
    fn push(&self, task: Task) -> Result<()>;
}

/// A handle letting a running Task drain whatever has arrived so far on its
/// owning Spec's input channel — i.e. assets forwarded up from subspecs
/// (spec.md Section 4.7: a task with `ASSETS_CONSUME_FROM_SPECS` "pools the
/// Spec's input channel directly"). Non-blocking: a Task's `run` is a plain
/// synchronous call, so this can only report what is already buffered, not
/// await more arriving.
pub trait InputHandle: Send + Sync {
    fn drain_available(&self) -> Vec<Asset>;
}

/// Cooperative cancellation signal forwarded from the owning Spec's run loop
/// (spec.md Section 4.6: "Tasks cannot be preempted mid-execution; they may
/// poll `tk.CancelChan` ... at select sites to cooperatively abort"). Backed
/// by a `tokio::sync::watch` so any number of tasks can hold a cheap clone
/// without the sender ever blocking on a full channel.
#[derive(Clone)]
pub struct CancelHandle(tokio::sync::watch::Receiver<bool>);

impl CancelHandle {
    pub fn new(rx: tokio::sync::watch::Receiver<bool>) -> Self {
        Self(rx)
    }

    /// Non-blocking check, for a synchronous `TaskBehavior::run` loop.
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Awaitable at a `tokio::select!` site inside an async sub-call a
    /// behavior makes from `run`.
    pub async fn cancelled(&mut self) {
        if self.is_cancelled() {
            return;
        }
        let _ = self.0.changed().await;
    }
}

impl std::fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelHandle")
            .field("is_cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Per-invocation context a `TaskBehavior` is given: the capabilities it
/// was granted and the name of the Spec it runs under.
#[derive(Clone)]
pub struct TaskContext {
    pub spec_name: String,
    pub mask: CapabilityMask,
    /// `Some` only when `mask` includes `TASKS_QUEUE` — the engine builds
    /// this context and withholds the handle entirely for tasks that
    /// lack the capability, rather than handing one out and checking the
    /// mask on every call (spec.md Section 4.1: "only if its mask includes
    /// the TASKS_QUEUE capability").
    pub queue: Option<Arc<dyn QueueHandle>>,
    /// `Some` only when `mask` includes `ASSETS_CONSUME_FROM_SPECS`, for the
    /// same reason `queue` is gated on `TASKS_QUEUE`.
    pub input: Option<Arc<dyn InputHandle>>,
    /// The owning Spec's cancellation signal (spec.md Section 4.6, Section
    /// 5, Section 9 "Subspec cancellation"): set when one of this Spec's
    /// subspecs has errored and the run loop is about to break between
    /// tasks. Always present, unlike `queue`/`input`, since observing
    /// cancellation requires no capability.
    pub cancel: CancelHandle,
}

impl std::fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskContext")
            .field("spec_name", &self.spec_name)
            .field("mask", &self.mask)
            .field("has_queue_handle", &self.queue.is_some())
            .field("has_input_handle", &self.input.is_some())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

/// The two ways a Task can act: `run` is invoked once, in queue order, when
/// the run loop reaches this task (the source's `Func`); `map_asset` is
/// invoked synchronously for every asset routed through this task (the
/// source's `MapFunc`). Both default to no-ops so a `TaskBehavior` need
/// only implement the one it uses.
pub trait TaskBehavior: Send + Sync {
    /// Sequential step. Default: no-op success.
    fn run(&mut self, _ctx: &TaskContext, _buffered: &mut Vec<Asset>) -> Result<()> {
        Ok(())
    }

    /// Per-asset transform. Default: pass the asset through unchanged.
    /// Returning `Ok(None)` filters the asset (requires a FILTER
    /// capability — checked by the engine, not here).
    fn map_asset(&mut self, _ctx: &TaskContext, asset: Asset) -> Result<Option<Asset>> {
        Ok(Some(asset))
    }

    /// True if this behavior defines a sequential `run` step (as opposed
    /// to being MapFunc-only). Used by the queue-construction check that a
    /// Task must have at least one of Func/MapFunc.
    fn has_func(&self) -> bool;

    /// True if this behavior defines a `map_asset` step.
    fn has_map_func(&self) -> bool;
}

/// An asset-matching operand: a Task (or a resolver's TaskPrototype) can
/// restrict which assets reach its MapFunc by MIME prefix and/or an
/// arbitrary predicate (spec.md Section 3, Section 4.3).
#[derive(Clone)]
pub struct AssetMatcher {
    pub mime_prefix: Option<String>,
    pub predicate: Option<Arc<dyn Fn(&Asset) -> bool + Send + Sync>>,
}

impl std::fmt::Debug for AssetMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetMatcher")
            .field("mime_prefix", &self.mime_prefix)
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}

impl Default for AssetMatcher {
    fn default() -> Self {
        Self {
            mime_prefix: None,
            predicate: None,
        }
    }
}

impl AssetMatcher {
    pub fn mime_prefix(prefix: impl Into<String>) -> Self {
        Self {
            mime_prefix: Some(prefix.into()),
            predicate: None,
        }
    }

    /// True if this matcher accepts `asset` — an unset prefix or predicate
    /// counts as "no restriction" for that operand (spec.md Section 4.3:
    /// "asked whether it accepts the asset").
    pub fn accepts(&self, asset: &Asset) -> bool {
        let mime_ok = match &self.mime_prefix {
            None => true,
            Some(prefix) => asset
                .mime
                .as_deref()
                .is_some_and(|m| m.starts_with(prefix.as_str())),
        };
        let predicate_ok = match &self.predicate {
            None => true,
            Some(p) => p(asset),
        };
        mime_ok && predicate_ok
    }
}

/// Per-task behavior flags governing how it interacts with multi-assets
/// and asset routing (spec.md Section 3).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskPolicy {
    pub accept_multi_assets: bool,
    pub reject_flatten_multi_assets: bool,
    pub ignore_assets: bool,
}

/// A Task: one queue entry. Carries the behavior (Func/MapFunc), its
/// capability mask, asset-matching operands, policy flags, and — once the
/// run loop reaches it — a buffer of assets deposited by upstream routing.
pub struct Task {
    pub name: String,
    pub resolver_id: Option<crate::resolver::ResolverId>,
    pub mask: CapabilityMask,
    pub matcher: AssetMatcher,
    pub policy: TaskPolicy,
    pub behavior: Box<dyn TaskBehavior>,
    /// Set once this task is inserted into a Spec's queue; re-insertion
    /// elsewhere is rejected (spec.md Section 3 invariant: "A Task belongs
    /// to at most one Spec").
    pub owning_spec: Option<String>,
    pub started: bool,
    pub errored: bool,
    buffer: Vec<Asset>,
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("mask", &self.mask)
            .field("owning_spec", &self.owning_spec)
            .field("started", &self.started)
            .field("errored", &self.errored)
            .field("buffer_len", &self.buffer.len())
            .finish()
    }
}

impl Task {
    pub fn new(name: impl Into<String>, mask: CapabilityMask, behavior: Box<dyn TaskBehavior>) -> Result<Self> {
        if !behavior.has_func() && !behavior.has_map_func() {
            return Err(TaskError::NoCallback);
        }
        Ok(Self {
            name: name.into(),
            resolver_id: None,
            mask,
            matcher: AssetMatcher::default(),
            policy: TaskPolicy::default(),
            behavior,
            owning_spec: None,
            started: false,
            errored: false,
            buffer: Vec::new(),
        })
    }

    pub fn with_matcher(mut self, matcher: AssetMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_policy(mut self, policy: TaskPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn has_func(&self) -> bool {
        self.behavior.has_func()
    }

    pub fn has_map_func(&self) -> bool {
        self.behavior.has_map_func()
    }

    /// Assigns this task to `spec_name`; fails if already owned by a
    /// different Spec (spec.md Section 3 invariant).
    pub fn assign_to(&mut self, spec_name: &str) -> Result<()> {
        match &self.owning_spec {
            Some(existing) if existing != spec_name => {
                Err(TaskError::AlreadyOwned(existing.clone()))
            }
            _ => {
                self.owning_spec = Some(spec_name.to_string());
                Ok(())
            }
        }
    }

    /// Deposits an asset into this task's buffer, to be seen when the run
    /// loop reaches it (spec.md Section 4.4 step 5).
    pub fn deposit(&mut self, asset: Asset) {
        self.buffer.push(asset);
    }

    /// Drains this task's buffer. Called by the run loop right before
    /// `run`, and again right after, so a large producer does not retain
    /// assets past its own execution (spec.md Section 4.6 step 4).
    pub fn take_buffer(&mut self) -> Vec<Asset> {
        std::mem::take(&mut self.buffer)
    }

    pub fn clear_buffer(&mut self) {
        self.buffer.clear();
    }

    /// Executes this task's sequential step, tracking started/errored.
    pub fn run(&mut self, ctx: &TaskContext) -> Result<Vec<Asset>> {
        self.started = true;
        let mut buffered = self.take_buffer();
        let result = self.behavior.run(ctx, &mut buffered);
        if result.is_err() {
            self.errored = true;
        }
        result.map(|()| buffered)
    }

    pub fn map_asset(&mut self, ctx: &TaskContext, asset: Asset) -> Result<Option<Asset>> {
        self.behavior.map_asset(ctx, asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::ASSETS_EMIT;
    use spectree_core::{AssetUrl, TypeMask};

    struct NoopFunc;
    impl TaskBehavior for NoopFunc {
        fn has_func(&self) -> bool {
            true
        }
        fn has_map_func(&self) -> bool {
            false
        }
    }

    struct NoopMap;
    impl TaskBehavior for NoopMap {
        fn has_func(&self) -> bool {
            false
        }
        fn has_map_func(&self) -> bool {
            true
        }
    }

    #[test]
    fn task_without_either_callback_is_rejected() {
        struct Neither;
        impl TaskBehavior for Neither {
            fn has_func(&self) -> bool {
                false
            }
            fn has_map_func(&self) -> bool {
                false
            }
        }
        let result = Task::new("t", CapabilityMask::NONE, Box::new(Neither));
        assert!(result.is_err());
    }

    #[test]
    fn reassigning_to_a_different_spec_is_rejected() {
        let mut task = Task::new("t", CapabilityMask::NONE, Box::new(NoopFunc)).unwrap();
        task.assign_to("spec-a").unwrap();
        assert!(task.assign_to("spec-b").is_err());
    }

    #[test]
    fn reassigning_to_the_same_spec_is_idempotent() {
        let mut task = Task::new("t", CapabilityMask::NONE, Box::new(NoopFunc)).unwrap();
        task.assign_to("spec-a").unwrap();
        assert!(task.assign_to("spec-a").is_ok());
    }

    #[test]
    fn matcher_with_no_operands_accepts_everything() {
        let matcher = AssetMatcher::default();
        let asset = Asset::new_single(
            AssetUrl::new("leaf", "a"),
            "leaf",
            TypeMask::single_read_write(),
        );
        assert!(matcher.accepts(&asset));
    }

    #[test]
    fn matcher_mime_prefix_filters() {
        let matcher = AssetMatcher::mime_prefix("text/");
        let asset = Asset::new_single(
            AssetUrl::new("leaf", "a"),
            "leaf",
            TypeMask::single_read_write(),
        )
        .with_mime("image/png");
        assert!(!matcher.accepts(&asset));
    }

    #[test]
    fn deposit_then_take_buffer_drains_it() {
        let mut task = Task::new("t", CapabilityMask::NONE, Box::new(NoopMap)).unwrap();
        let asset = Asset::new_single(
            AssetUrl::new("leaf", "a"),
            "leaf",
            TypeMask::single_read_write(),
        );
        task.deposit(asset);
        assert_eq!(task.take_buffer().len(), 1);
        assert!(task.take_buffer().is_empty());
    }

    #[test]
    fn run_marks_started_and_errored_on_failure() {
        struct Failing;
        impl TaskBehavior for Failing {
            fn run(&mut self, _ctx: &TaskContext, _buffered: &mut Vec<Asset>) -> Result<()> {
                Err(TaskError::CapabilityDenied("ASSETS_EMIT"))
            }
            fn has_func(&self) -> bool {
                true
            }
            fn has_map_func(&self) -> bool {
                false
            }
        }
        let mut task = Task::new(
            "t",
            CapabilityMask::from_bits(ASSETS_EMIT),
            Box::new(Failing),
        )
        .unwrap();
        let (_cancel_tx, cancel_rx) = tokio::sync::watch::channel(false);
        let ctx = TaskContext {
            spec_name: "leaf".to_string(),
            mask: task.mask,
            queue: None,
            input: None,
            cancel: CancelHandle::new(cancel_rx),
        };
        assert!(task.run(&ctx).is_err());
        assert!(task.started);
        assert!(task.errored);
    }
}
