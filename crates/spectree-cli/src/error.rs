//! Error type for the CLI front end (spec.md Section 1: "Deliberately OUT
//! of scope ... the command-line front-end"; Section 7: user-visible
//! failure is "printed error message plus a non-zero exit code").
//!
//! `thiserror` here, same as every other crate in the workspace; `main`
//! converts the final result into `eyre::Report` at the process boundary,
//! the one place this workspace uses `eyre` rather than propagating a
//! crate-local enum.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read config file {path}: {source}")]
    ReadConfig {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path} as JSON: {source}")]
    ParseJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse config file {path} as YAML: {source}")]
    ParseYaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("config file {0} has an unrecognized extension (expected .json, .yaml, or .yml)")]
    UnknownConfigExtension(String),

    #[error("subspec {0:?} config value must be a map")]
    SubspecNotAMap(String),

    #[error("transform value for spec {0:?} has an unsupported shape")]
    UnsupportedTransformShape(String),

    #[error(transparent)]
    Core(#[from] spectree_core::CoreError),

    #[error(transparent)]
    Path(#[from] spectree_path::PathError),

    #[error(transparent)]
    Task(#[from] spectree_task::TaskError),

    #[error(transparent)]
    Engine(#[from] spectree_engine::EngineError),

    #[error(transparent)]
    Expr(#[from] spectree_expr::ExprError),

    #[error(transparent)]
    Wire(#[from] spectree_wire::WireError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
