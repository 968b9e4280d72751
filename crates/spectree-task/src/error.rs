use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task is already owned by spec {0:?}")]
    AlreadyOwned(String),

    #[error("task mask is not a subset of the accepting mask")]
    MaskNotSubset,

    #[error("capability {0} not permitted by mask")]
    CapabilityDenied(&'static str),

    #[error("task has neither a Func nor a MapFunc")]
    NoCallback,

    #[error("cyclic task list detected")]
    CyclicQueue,

    #[error("resolver child mask does not fit parent accept mask")]
    ResolverMaskMismatch,

    #[error("asset error: {0}")]
    Asset(#[from] spectree_core::CoreError),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, TaskError>;
