//! `spectree-expr` error type (spec.md Section 7: "Configuration:
//! ... unparseable transformation/filter expressions").

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExprError>;

#[derive(Debug, Error)]
pub enum ExprError {
    #[error("unexpected character {0:?} at offset {1}")]
    UnexpectedChar(char, usize),

    #[error("unterminated quoted string starting at offset {0}")]
    UnterminatedString(usize),

    #[error("unterminated regex literal starting at offset {0}")]
    UnterminatedRegex(usize),

    #[error("expected {0}, found {1}")]
    UnexpectedToken(&'static str, String),

    #[error("empty expression")]
    Empty,

    #[error("unknown filter field {0:?}")]
    UnknownFilterField(String),

    #[error("unknown format field {0:?}")]
    UnknownFormatField(String),

    #[error("invalid regex literal: {0}")]
    Regex(#[from] regex::Error),
}
