//! The `filter` section: "Recognized filter fields: mimetype/mime, prefix,
//! suffix, extension/ext. A leading `-` on the field name inverts the
//! filter" (spec.md Section 6).

use crate::error::{ExprError, Result};
use crate::parser::{parse, Value};
use spectree_core::Asset;

#[derive(Debug, Clone)]
pub enum FilterKind {
    Mimetype(String),
    Prefix(String),
    Suffix(String),
    Extension(String),
}

#[derive(Debug, Clone)]
pub struct FilterClause {
    pub kind: FilterKind,
    pub invert: bool,
}

impl FilterClause {
    /// True if `asset` is kept by this clause (after any `invert`).
    pub fn keeps(&self, asset: &Asset) -> bool {
        let matched = match &self.kind {
            FilterKind::Mimetype(want) => asset.mime.as_deref() == Some(want.as_str()),
            FilterKind::Prefix(want) => asset.url.path().starts_with(want.as_str()),
            FilterKind::Suffix(want) => asset.url.path().ends_with(want.as_str()),
            FilterKind::Extension(want) => {
                let want = want.strip_prefix('.').unwrap_or(want.as_str());
                asset
                    .url
                    .path()
                    .rsplit('.')
                    .next()
                    .is_some_and(|ext| ext == want)
            }
        };
        matched != self.invert
    }
}

/// A parsed `filter: …` expression: an AND of its clauses.
#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    pub clauses: Vec<FilterClause>,
}

impl FilterSpec {
    pub fn keeps(&self, asset: &Asset) -> bool {
        self.clauses.iter().all(|c| c.keeps(asset))
    }
}

pub fn parse_filter(src: &str) -> Result<FilterSpec> {
    let expr = parse(src)?;
    let mut clauses = Vec::new();
    for arg in expr.args {
        let (invert, name) = match arg.field.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, arg.field.as_str()),
        };
        let value = match arg.value {
            Some(Value::Path(s) | Value::Ident(s) | Value::String(s)) => s,
            Some(Value::Regex(_)) => {
                return Err(ExprError::UnknownFilterField(format!(
                    "{name} (regex values are not supported for filter fields)"
                )))
            }
            None => {
                return Err(ExprError::UnknownFilterField(format!(
                    "{name} (missing value)"
                )))
            }
        };
        let kind = match name {
            "mimetype" | "mime" => FilterKind::Mimetype(value),
            "prefix" => FilterKind::Prefix(value),
            "suffix" => FilterKind::Suffix(value),
            "extension" | "ext" => FilterKind::Extension(value),
            other => return Err(ExprError::UnknownFilterField(other.to_string())),
        };
        clauses.push(FilterClause { kind, invert });
    }
    Ok(FilterSpec { clauses })
}
