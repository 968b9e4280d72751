//! Task capability masks, the Task type, and the arena-indexed
//! TaskResolver tree that produces Tasks by name or asset match.

pub mod capability;
pub mod error;
pub mod resolver;
pub mod task;

pub use capability::{
    CapabilityMask, ASSETS_CONSUME, ASSETS_CONSUME_FROM_SPECS, ASSETS_CONSUME_FROM_TASKS,
    ASSETS_EMIT, ASSETS_FILTER_SPEC, ASSETS_FILTER_TASK, ASSETS_GENERATE, ASSETS_MUTATE, DEFINED,
    TASKS_QUEUE,
};
pub use error::{Result, TaskError};
pub use resolver::{ResolverContext, ResolverId, ResolverTree, TaskPrototype};
pub use task::{
    AssetMatcher, CancelHandle, InputHandle, QueueHandle, Task, TaskBehavior, TaskContext,
    TaskPolicy,
};
