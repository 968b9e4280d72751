//! Asset wire format: line-delimited JSON (spec.md Section 6). External to
//! the core engine — the CLI's stdin/stdout producer/consumer boundary
//! spec.md Section 1 names as out of scope — but implemented for real so
//! `spectree-cli` has something to drive.

pub mod error;
pub mod line_json;

pub use error::{Result, WireError};
pub use line_json::{decode_line, encode_line, write_line, DecodedLine};
