//! Error type for the built-in behaviors demo crate (spec.md Section 7:
//! "External: I/O errors from filesystem or subprocess commands
//! (propagated verbatim)"). Converts into `spectree_task::TaskError` at the
//! `TaskBehavior` boundary via `TaskError::External`, the same "own enum,
//! convert at the seam" shape every other crate in this workspace uses.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BehaviorError>;

#[derive(Debug, Error)]
pub enum BehaviorError {
    #[error("i/o error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Core(#[from] spectree_core::CoreError),
}

impl From<BehaviorError> for spectree_task::TaskError {
    fn from(e: BehaviorError) -> Self {
        spectree_task::TaskError::External(e.to_string())
    }
}
