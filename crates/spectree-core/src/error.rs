//! Error types for the Asset data model.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("malformed asset url: {0}")]
    MalformedUrl(String),

    #[error("asset has no defined reader for requested content kind")]
    NoReader,

    #[error("asset has no defined writer for requested content kind")]
    NoWriter,

    #[error("divergent modification: both byte and typed content were mutated since last sync")]
    DivergentModification,

    #[error("operation requires a single asset but found a multi asset")]
    ExpectedSingle,

    #[error("operation requires a multi asset but found a single asset")]
    ExpectedMulti,

    #[error("multi asset generator already materialized or exhausted")]
    GeneratorExhausted,

    #[error("property {key} expected type {expected}, found {found}")]
    WrongType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("missing required property: {0}")]
    MissingProperty(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
