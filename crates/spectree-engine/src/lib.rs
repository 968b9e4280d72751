//! The Spec tree runtime: task queues, the EmitAsset routing algorithm,
//! AssetFrame synchronization, and the async run loop that ties them
//! together (spec.md Section 3, Section 4).

pub mod error;
pub mod frame;
pub mod queue;
pub mod run;
pub mod spec;
pub mod waitgroup;

pub use error::{EngineError, Result};
pub use frame::{AssetFrame, AssetFrameRegistry};
pub use queue::{TaskIndex, TaskQueue};
pub use spec::Spec;
pub use waitgroup::WaitGroup;
