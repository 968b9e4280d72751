use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Task(#[from] spectree_task::TaskError),

    #[error(transparent)]
    Core(#[from] spectree_core::CoreError),

    #[error(transparent)]
    Path(#[from] spectree_path::PathError),

    #[error("cyclic task list detected in spec {0:?}")]
    CyclicQueue(String),

    #[error("task {task:?} denied capability {capability} in spec {spec:?}")]
    CapabilityDenied {
        spec: String,
        task: String,
        capability: &'static str,
    },

    #[error("subspec {0:?} failed: {1}")]
    Subspec(String, Box<EngineError>),

    #[error("asset {0:?} sent to a task that neither accepts multi-assets nor may flatten them")]
    RejectedMultiAsset(String),

    #[error("spec {0:?} is already running or has already run")]
    AlreadyRunning(String),

    #[error("spec {0:?} has no task at the given queue position")]
    NoSuchTask(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
