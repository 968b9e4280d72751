//! Tokenizer and parser for the CLI filter/format mini-language (spec.md
//! Section 2: "Expression parser", Section 6: "CLI expression grammar").
//!
//! The `PathTransformation` string grammar (`m<delim>.../s<delim>...`) is a
//! separate, simpler grammar and lives in `spectree_path::parse_expression`
//! instead — this crate covers only the `section: field, field=value, …`
//! grammar the CLI front end uses for `--filter`/`--format` arguments.

pub mod error;
pub mod filter;
pub mod format;
pub mod lexer;
pub mod parser;

pub use error::{ExprError, Result};
pub use filter::{parse_filter, FilterClause, FilterKind, FilterSpec};
pub use format::{parse_format, FormatSpec, WireFormat};
pub use parser::{parse, Arg, Expression, Value};
