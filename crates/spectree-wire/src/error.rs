//! Error type for wire encoding/decoding (spec.md Section 6: "Asset wire
//! format (line-delimited JSON)").

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WireError>;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed wire line: {0}")]
    MalformedLine(#[from] serde_json::Error),

    #[error("invalid base64 content: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("content field is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("record has no content field")]
    MissingContent,

    #[error("i/o error writing wire line: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] spectree_core::CoreError),
}
