//! `TaskResolver`: a tree of name/predicate-matched factory nodes that
//! produce Tasks (spec.md Section 3, Section 4.3).
//!
//! The source describes an intrusively-linked forest (sibling + child
//! pointers). Per spec.md Section 9 REDESIGN FLAGS ("prefer an arena with
//! index-based children and siblings to avoid lifetime foot-guns") this is
//! an arena: nodes live in one `Vec` and reference each other by index.

use crate::capability::CapabilityMask;
use crate::error::{Result, TaskError};
use crate::task::{AssetMatcher, Task, TaskBehavior, TaskPolicy};
use spectree_core::Asset;
use std::sync::Arc;

/// A context a resolver's match predicate is evaluated against: the name
/// being looked up and the Spec performing the lookup. Kept as a trait
/// (rather than a concrete `Spec` reference) so `spectree-task` does not
/// depend on `spectree-engine`.
pub trait ResolverContext {
    fn spec_name(&self) -> &str;
    fn property_str(&self, key: &str) -> Option<&str>;
}

/// Index of a node in a [`ResolverTree`]'s arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResolverId(usize);

type MatchFn = dyn Fn(&str, &dyn ResolverContext) -> bool + Send + Sync;

/// Produces a Task by shallow-copying this prototype's configuration and
/// invoking its behavior factory. Stands in for the source's
/// shallow-copyable `TaskPrototype` struct.
#[derive(Clone)]
pub struct TaskPrototype {
    pub name: String,
    pub mask: CapabilityMask,
    pub matcher: AssetMatcher,
    pub policy: TaskPolicy,
    factory: Arc<dyn Fn() -> Box<dyn TaskBehavior> + Send + Sync>,
}

impl std::fmt::Debug for TaskPrototype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskPrototype")
            .field("name", &self.name)
            .field("mask", &self.mask)
            .finish()
    }
}

impl TaskPrototype {
    pub fn new(
        name: impl Into<String>,
        mask: CapabilityMask,
        factory: impl Fn() -> Box<dyn TaskBehavior> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            mask,
            matcher: AssetMatcher::default(),
            policy: TaskPolicy::default(),
            factory: Arc::new(factory),
        }
    }

    pub fn with_matcher(mut self, matcher: AssetMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_policy(mut self, policy: TaskPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// True if this prototype's Task would accept `asset` (spec.md Section
    /// 4.3: "the resolver's TaskPrototype is asked whether it accepts the
    /// asset").
    pub fn accepts(&self, asset: &Asset) -> bool {
        self.matcher.accepts(asset)
    }

    pub fn instantiate(&self) -> Result<Task> {
        let behavior = (self.factory)();
        Task::new(self.name.clone(), self.mask, behavior).map(|task| {
            task.with_matcher(self.matcher.clone())
                .with_policy(self.policy)
        })
    }
}

struct ResolverNode {
    name: String,
    match_fn: Option<Arc<MatchFn>>,
    accept_mask: CapabilityMask,
    match_blocks: bool,
    children: Vec<ResolverId>,
    prototype: TaskPrototype,
}

/// An arena of resolver nodes. `ResolverId(0)` is always the root.
#[derive(Default)]
pub struct ResolverTree {
    nodes: Vec<ResolverNode>,
}

impl ResolverTree {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Inserts a root-level resolver node (no parent). Returns its id.
    pub fn insert_root(
        &mut self,
        name: impl Into<String>,
        accept_mask: CapabilityMask,
        match_blocks: bool,
        prototype: TaskPrototype,
    ) -> ResolverId {
        self.nodes.push(ResolverNode {
            name: name.into(),
            match_fn: None,
            accept_mask,
            match_blocks,
            children: Vec::new(),
            prototype,
        });
        ResolverId(self.nodes.len() - 1)
    }

    /// Inserts `child` under `parent`. Per spec.md Section 4.2: "the
    /// child's `AcceptMask | prototype.Mask` must Valid-fit the parent's
    /// accept set."
    pub fn insert_child(
        &mut self,
        parent: ResolverId,
        name: impl Into<String>,
        accept_mask: CapabilityMask,
        match_blocks: bool,
        prototype: TaskPrototype,
    ) -> Result<ResolverId> {
        let parent_accept = self.nodes[parent.0].accept_mask;
        let combined = accept_mask | prototype.mask;
        if !CapabilityMask::valid(parent_accept, combined) {
            return Err(TaskError::ResolverMaskMismatch);
        }
        self.nodes.push(ResolverNode {
            name: name.into(),
            match_fn: None,
            accept_mask,
            match_blocks,
            children: Vec::new(),
            prototype,
        });
        let id = ResolverId(self.nodes.len() - 1);
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Attaches a predicate match function to an existing node, replacing
    /// its name-equality default.
    pub fn set_match_fn(
        &mut self,
        id: ResolverId,
        match_fn: impl Fn(&str, &dyn ResolverContext) -> bool + Send + Sync + 'static,
    ) {
        self.nodes[id.0].match_fn = Some(Arc::new(match_fn));
    }

    fn node_matches(&self, id: ResolverId, name: &str, ctx: &dyn ResolverContext) -> bool {
        let node = &self.nodes[id.0];
        match &node.match_fn {
            Some(f) => f(name, ctx),
            None => node.name == name,
        }
    }

    /// Match algorithm for (name, ctx) (spec.md Section 4.3):
    /// 1. Name-equality or MatchFunc.
    /// 2. No match → not found.
    /// 3. If `match_blocks` is false, recurse into children first — the
    ///    first matching descendant wins.
    /// 4. Otherwise return this node.
    pub fn resolve(&self, start: ResolverId, name: &str, ctx: &dyn ResolverContext) -> Option<ResolverId> {
        if !self.node_matches(start, name, ctx) {
            return None;
        }
        if !self.nodes[start.0].match_blocks {
            for &child in &self.nodes[start.0].children {
                if let Some(found) = self.resolve(child, name, ctx) {
                    return Some(found);
                }
            }
        }
        Some(start)
    }

    /// Scans every root-level node (and its descendants) for a match,
    /// most-recently-added first (spec.md Section 4.3: "scanning its own
    /// resolver list, most recently added first").
    pub fn resolve_any(&self, roots: &[ResolverId], name: &str, ctx: &dyn ResolverContext) -> Option<ResolverId> {
        roots
            .iter()
            .rev()
            .find_map(|&root| self.resolve(root, name, ctx))
    }

    /// Deepest-match resolution for asset-based matching (spec.md Section
    /// 4.3 `MatchWithAsset`): walks every node reachable from `roots`,
    /// keeping the deepest that accepts the asset; ties resolve to sibling
    /// order (the later root, or later child, wins).
    pub fn resolve_with_asset(&self, roots: &[ResolverId], asset: &Asset) -> Option<ResolverId> {
        let mut best: Option<(usize, ResolverId)> = None;
        for &root in roots {
            self.collect_asset_matches(root, asset, 0, &mut best);
        }
        best.map(|(_, id)| id)
    }

    fn collect_asset_matches(
        &self,
        id: ResolverId,
        asset: &Asset,
        depth: usize,
        best: &mut Option<(usize, ResolverId)>,
    ) {
        let node = &self.nodes[id.0];
        let is_deeper_or_first = match best {
            Some((d, _)) => depth >= *d,
            None => true,
        };
        if node.prototype.accepts(asset) && is_deeper_or_first {
            *best = Some((depth, id));
        }
        for &child in &node.children {
            self.collect_asset_matches(child, asset, depth + 1, best);
        }
    }

    pub fn prototype(&self, id: ResolverId) -> &TaskPrototype {
        &self.nodes[id.0].prototype
    }

    pub fn name(&self, id: ResolverId) -> &str {
        &self.nodes[id.0].name
    }
}
