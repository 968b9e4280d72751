//! End-to-end scenario tests (spec.md Section 8, S1-S6).
//!
//! Mirrors `loopd/tests/server_integration.rs`'s shape: one file per crate,
//! small hand-written `TaskBehavior` stand-ins instead of a test HTTP app,
//! driven through `Spec::run`/`Spec::emit_asset` the same way a real caller
//! would. `Spec`'s queue internals are `pub(crate)`, so every scenario here
//! goes through the same public surface an external crate (`spectree-cli`)
//! would use.

use spectree_behaviors::html_rewrite::HtmlRewriteBehavior;
use spectree_core::{Asset, AssetUrl, PropertyMap, TypeMask, Value};
use spectree_engine::{EngineError, Spec};
use spectree_path::{Flags, PathTransformation};
use spectree_task::{
    CapabilityMask, Result as TaskResult, Task, TaskBehavior, TaskContext, TaskError,
    ASSETS_CONSUME_FROM_SPECS, ASSETS_EMIT, ASSETS_GENERATE, TASKS_QUEUE,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Emits `n` freshly-named single assets the first (and only) time it runs.
struct EmitN {
    n: usize,
    done: bool,
}

impl EmitN {
    fn new(n: usize) -> Self {
        Self { n, done: false }
    }
}

impl TaskBehavior for EmitN {
    fn run(&mut self, ctx: &TaskContext, buffered: &mut Vec<Asset>) -> TaskResult<()> {
        if self.done {
            return Ok(());
        }
        self.done = true;
        for i in 0..self.n {
            let url = AssetUrl::new(ctx.spec_name.clone(), format!("a{i}"));
            let mut asset = Asset::new_single(url, ctx.spec_name.clone(), TypeMask::single_read_write());
            asset.set_bytes(format!("payload-{i}").into_bytes())?;
            buffered.push(asset.with_mime("text/plain"));
        }
        Ok(())
    }

    fn has_func(&self) -> bool {
        true
    }

    fn has_map_func(&self) -> bool {
        false
    }
}

/// Increments an `Int`-valued asset by one, leaving everything else alone.
struct Increment;

impl TaskBehavior for Increment {
    fn map_asset(&mut self, _ctx: &TaskContext, mut asset: Asset) -> TaskResult<Option<Asset>> {
        let current = match asset.get_data()?.as_ref() {
            Value::Int(n) => *n,
            _ => 0,
        };
        asset.set_data(Value::Int(current + 1))?;
        Ok(Some(asset))
    }

    fn has_func(&self) -> bool {
        false
    }

    fn has_map_func(&self) -> bool {
        true
    }
}

/// Fails every time it runs, for exercising subspec-failure propagation.
struct AlwaysFails;

impl TaskBehavior for AlwaysFails {
    fn run(&mut self, _ctx: &TaskContext, _buffered: &mut Vec<Asset>) -> TaskResult<()> {
        Err(TaskError::External("boom".to_string()))
    }

    fn has_func(&self) -> bool {
        true
    }

    fn has_map_func(&self) -> bool {
        false
    }
}

/// Polls `ctx.cancel` for up to half a second, recording whether it ever
/// observed cancellation before returning.
struct WatchForCancel {
    observed: Arc<AtomicBool>,
}

impl TaskBehavior for WatchForCancel {
    fn run(&mut self, ctx: &TaskContext, _buffered: &mut Vec<Asset>) -> TaskResult<()> {
        let deadline = std::time::Instant::now() + std::time::Duration::from_millis(500);
        while std::time::Instant::now() < deadline {
            if ctx.cancel.is_cancelled() {
                self.observed.store(true, Ordering::SeqCst);
                return Ok(());
            }
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
        Ok(())
    }

    fn has_func(&self) -> bool {
        true
    }

    fn has_map_func(&self) -> bool {
        false
    }
}

/// Dynamically enqueues a `PoolAndForward` consumer task the first time it
/// runs, exercising `TASKS_QUEUE`/`QueueHandle::enqueue` from inside a task.
struct Enqueuer;

impl TaskBehavior for Enqueuer {
    fn run(&mut self, ctx: &TaskContext, _buffered: &mut Vec<Asset>) -> TaskResult<()> {
        let queue = ctx.queue.as_ref().expect("enqueuer task requires TASKS_QUEUE");
        let consumer = Task::new(
            "consumer",
            CapabilityMask::from_bits(ASSETS_CONSUME_FROM_SPECS | ASSETS_EMIT | ASSETS_GENERATE),
            Box::new(PoolAndForward),
        )
        .expect("consumer task has a Func callback");
        queue.enqueue(consumer)
    }

    fn has_func(&self) -> bool {
        true
    }

    fn has_map_func(&self) -> bool {
        false
    }
}

/// Pools whatever has arrived on the owning Spec's input channel and
/// forwards it as its own emitted output, polling briefly since the
/// producing subspec runs concurrently and may not have emitted yet.
struct PoolAndForward;

impl TaskBehavior for PoolAndForward {
    fn run(&mut self, ctx: &TaskContext, buffered: &mut Vec<Asset>) -> TaskResult<()> {
        let input = ctx
            .input
            .as_ref()
            .expect("consumer task requires ASSETS_CONSUME_FROM_SPECS");
        let deadline = std::time::Instant::now() + std::time::Duration::from_millis(500);
        loop {
            let drained = input.drain_available();
            if !drained.is_empty() {
                buffered.extend(drained);
                return Ok(());
            }
            if std::time::Instant::now() >= deadline {
                return Ok(());
            }
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
    }

    fn has_func(&self) -> bool {
        true
    }

    fn has_map_func(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
struct RecordedAsset {
    url: String,
    mime: Option<String>,
    bytes: Option<Vec<u8>>,
}

fn record(asset: &mut Asset) -> RecordedAsset {
    RecordedAsset {
        url: asset.url.path().to_string(),
        mime: asset.mime.clone(),
        bytes: asset.get_bytes().ok().map(|b| b.to_vec()),
    }
}

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<RecordedAsset>>>);

impl Recorder {
    fn push(&self, a: RecordedAsset) {
        self.0.lock().unwrap().push(a);
    }

    fn snapshot(&self) -> Vec<RecordedAsset> {
        self.0.lock().unwrap().clone()
    }
}

/// Consumes whatever a queue deposit handed it and records it, without
/// re-emitting (a `Func`-only task with a zero mask can still receive a
/// deposit; it just can never itself call `emit_asset`).
struct RecordingSink {
    recorder: Recorder,
}

impl TaskBehavior for RecordingSink {
    fn run(&mut self, _ctx: &TaskContext, buffered: &mut Vec<Asset>) -> TaskResult<()> {
        for mut asset in std::mem::take(buffered) {
            self.recorder.push(record(&mut asset));
        }
        Ok(())
    }

    fn has_func(&self) -> bool {
        true
    }

    fn has_map_func(&self) -> bool {
        false
    }
}

/// S1: a subspec's emitted assets reach the root's collected output once
/// the tree has fully run (spec.md Section 4.5's implicit passthrough
/// drain).
#[tokio::test]
async fn s1_subspec_assets_reach_roots_collected_output() {
    let root = Spec::new("root", PropertyMap::new());
    let child = Spec::new("child", PropertyMap::new());
    root.attach_subspec(Arc::clone(&child)).unwrap();
    child
        .enqueue(Task::new("emit3", CapabilityMask::from_bits(ASSETS_EMIT | ASSETS_GENERATE), Box::new(EmitN::new(3))).unwrap())
        .unwrap();

    let (mut rx, _wg) = root.collect_output();
    Arc::clone(&root).run().await.unwrap();

    let mut received = Vec::new();
    while let Ok(asset) = rx.try_recv() {
        received.push(asset);
    }
    assert_eq!(received.len(), 3);
    assert!(received.iter().all(|a| a.url.host() == "child"));
    let mut paths: Vec<_> = received.iter().map(|a| a.url.path().to_string()).collect();
    paths.sort();
    assert_eq!(paths, vec!["@emit/child/a0", "@emit/child/a1", "@emit/child/a2"]);
}

/// S2: a three-deep Spec chain flattens the `@emit/` namespace into a
/// single marker listing every hop in leaf-to-root order, while keeping
/// the asset's host fixed at the originally-producing Spec (see
/// `AssetUrl::namespace_under`'s own doc comment/tests).
#[tokio::test]
async fn s2_three_deep_chain_flattens_emit_namespaces_leaf_to_root() {
    let leaf = Spec::new("level_3", PropertyMap::new());
    let mid = Spec::new("level_2", PropertyMap::new());
    let root = Spec::new("level_1", PropertyMap::new());
    mid.attach_subspec(Arc::clone(&leaf)).unwrap();
    root.attach_subspec(Arc::clone(&mid)).unwrap();

    leaf.enqueue(Task::new("emit3", CapabilityMask::from_bits(ASSETS_EMIT | ASSETS_GENERATE), Box::new(EmitN::new(3))).unwrap())
        .unwrap();

    let (mut rx, _wg) = root.collect_output();
    Arc::clone(&root).run().await.unwrap();

    let mut received = Vec::new();
    while let Ok(asset) = rx.try_recv() {
        received.push(asset);
    }
    assert_eq!(received.len(), 3);
    assert!(received.iter().all(|a| a.url.host() == "level_3"));

    let mut paths: Vec<_> = received.iter().map(|a| a.url.path().to_string()).collect();
    paths.sort();
    assert_eq!(
        paths,
        vec![
            "@emit/level_3/level_2/level_1/a0",
            "@emit/level_3/level_2/level_1/a1",
            "@emit/level_3/level_2/level_1/a2",
        ]
    );
}

/// S3: a subspec that fails mid-run causes the parent's run to return the
/// wrapped error, and a concurrently-running task in the parent's own queue
/// observes cancellation before `run` returns it (the watcher task in
/// `run.rs` is what makes this observable rather than a no-op).
#[tokio::test(flavor = "multi_thread", worker_threads = 3)]
async fn s3_subspec_failure_triggers_observable_cancellation_and_wrapped_error() {
    let root = Spec::new("root", PropertyMap::new());
    let child = Spec::new("child", PropertyMap::new());
    root.attach_subspec(Arc::clone(&child)).unwrap();
    child
        .enqueue(Task::new("fails", CapabilityMask::NONE, Box::new(AlwaysFails)).unwrap())
        .unwrap();

    let observed = Arc::new(AtomicBool::new(false));
    root.enqueue(
        Task::new(
            "watch",
            CapabilityMask::NONE,
            Box::new(WatchForCancel {
                observed: Arc::clone(&observed),
            }),
        )
        .unwrap(),
    )
    .unwrap();

    let err = Arc::clone(&root).run().await.unwrap_err();
    assert!(matches!(&err, EngineError::Subspec(name, _) if name == "child"));
    assert!(observed.load(Ordering::SeqCst), "watch task never observed cancellation");
}

/// S4: an `HtmlRewriteBehavior` rewrites `href`/`src` in HTML assets and
/// passes everything else through untouched (spec.md Section 8 scenario
/// S4; Section 4.x's built-in behaviors).
#[tokio::test]
async fn s4_html_rewrite_behavior_rewrites_html_and_passes_through_other_mimes() {
    let spec = Spec::new("site", PropertyMap::new());
    let chain = vec![PathTransformation::substitute("^/", "/transformed/", Flags::default()).unwrap()];
    spec.enqueue(Task::new("rewrite", CapabilityMask::NONE, Box::new(HtmlRewriteBehavior::new(chain))).unwrap())
        .unwrap();

    let recorder = Recorder::default();
    spec.enqueue(
        Task::new(
            "sink",
            CapabilityMask::NONE,
            Box::new(RecordingSink {
                recorder: recorder.clone(),
            }),
        )
        .unwrap(),
    )
    .unwrap();

    let mask = CapabilityMask::from_bits(ASSETS_EMIT | ASSETS_GENERATE);

    let mut html_asset = Asset::new_single(
        AssetUrl::new("site", "index.html"),
        "site",
        TypeMask::single_read_write(),
    );
    html_asset.set_bytes(br#"<a href="/page/">x</a>"#.to_vec()).unwrap();
    spec.emit_asset(mask, None, html_asset.with_mime("text/html")).await.unwrap();

    let mut text_asset = Asset::new_single(
        AssetUrl::new("site", "notes.txt"),
        "site",
        TypeMask::single_read_write(),
    );
    text_asset.set_bytes(b"plain text, not touched".to_vec()).unwrap();
    spec.emit_asset(mask, None, text_asset.with_mime("text/plain")).await.unwrap();

    Arc::clone(&spec).run().await.unwrap();

    let recorded = recorder.snapshot();
    assert_eq!(recorded.len(), 2);

    let html = recorded.iter().find(|a| a.url == "index.html").expect("html asset recorded");
    assert_eq!(html.mime.as_deref(), Some("text/html"));
    assert_eq!(
        html.bytes.as_deref(),
        Some(&br#"<a href="/transformed/page/">x</a>"#[..])
    );

    let text = recorded.iter().find(|a| a.url == "notes.txt").expect("text asset recorded");
    assert_eq!(text.mime.as_deref(), Some("text/plain"));
    assert_eq!(text.bytes.as_deref(), Some(&b"plain text, not touched"[..]));
}

/// S5: a queue of `MapFunc`-only tasks composes left to right entirely
/// inside `emit_asset`'s forward scan, with no `Func`-capable task ever
/// claiming the asset (spec.md Section 4.4's MapFunc chaining).
#[tokio::test]
async fn s5_four_chained_increment_tasks_compose_left_to_right() {
    let spec = Spec::new("calc", PropertyMap::new());
    for _ in 0..4 {
        spec.enqueue(Task::new("inc", CapabilityMask::NONE, Box::new(Increment)).unwrap())
            .unwrap();
    }

    let (mut rx, _wg) = spec.collect_output();

    let mut asset = Asset::new_single(AssetUrl::new("calc", "n"), "calc", TypeMask::single_read_write());
    asset.set_data(Value::Int(0)).unwrap();
    let mask = CapabilityMask::from_bits(ASSETS_EMIT | ASSETS_GENERATE);
    spec.emit_asset(mask, None, asset).await.unwrap();

    let mut out = rx.try_recv().expect("incremented asset forwarded to output");
    assert_eq!(*out.get_data().unwrap(), Value::Int(4));
}

/// S6: a task dynamically enqueues a consumer task (`TASKS_QUEUE`) that
/// pools assets arriving on the Spec's own input channel and forwards them
/// onward (spec.md Section 4.1's dynamic enqueue plus Section 4.5's
/// inter-Spec flow, composed together).
#[tokio::test(flavor = "multi_thread", worker_threads = 3)]
async fn s6_dynamically_enqueued_consumer_pools_and_forwards_subspec_assets() {
    let mid = Spec::new("level_2", PropertyMap::new());
    let leaf = Spec::new("level_3", PropertyMap::new());
    mid.attach_subspec(Arc::clone(&leaf)).unwrap();
    leaf.enqueue(Task::new("emit", CapabilityMask::from_bits(ASSETS_EMIT | ASSETS_GENERATE), Box::new(EmitN::new(1))).unwrap())
        .unwrap();
    mid.enqueue(Task::new("enqueuer", CapabilityMask::from_bits(TASKS_QUEUE), Box::new(Enqueuer)).unwrap())
        .unwrap();

    let (mut rx, _wg) = mid.collect_output();
    Arc::clone(&mid).run().await.unwrap();

    let mut forwarded = rx.try_recv().expect("consumer forwarded the subspec's asset");
    assert_eq!(forwarded.url.host(), "level_3");
    assert_eq!(forwarded.url.path(), "@emit/level_2/a0");
    assert_eq!(&*forwarded.get_bytes().unwrap(), b"payload-0");
}
