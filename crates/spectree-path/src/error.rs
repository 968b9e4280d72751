use thiserror::Error;

#[derive(Debug, Error)]
pub enum PathError {
    #[error("invalid regex in path transformation: {0}")]
    InvalidRegex(#[from] regex::Error),

    #[error("path transformation expression too short: {0:?}")]
    ExpressionTooShort(String),

    #[error("unrecognized path transformation expression kind: {0:?} (expected 'm' or 's')")]
    UnknownExpressionKind(char),

    #[error("path transformation expression {0:?} has the wrong number of delimited fields")]
    WrongFieldCount(String),

    #[error("unrecognized path transformation flag: {0:?}")]
    UnknownFlag(char),
}

pub type Result<T> = std::result::Result<T, PathError>;
