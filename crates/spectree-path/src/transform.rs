//! `PathTransformation`: an ordered (match, replace, prefix) rewrite applied
//! to an asset URL path (spec.md Section 3 and Section 6).

use crate::error::{PathError, Result};
use regex::{Regex, RegexBuilder};

/// Flags accepted by the string expression grammar (spec.md Section 6:
/// "Flags: `i` (ignoreCase), `g` (global)").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags {
    pub ignore_case: bool,
    pub global: bool,
}

impl Flags {
    fn parse(raw: &str) -> Result<Self> {
        let mut flags = Flags::default();
        for c in raw.chars() {
            match c {
                'i' => flags.ignore_case = true,
                'g' => flags.global = true,
                other => return Err(PathError::UnknownFlag(other)),
            }
        }
        Ok(flags)
    }
}

/// A single ordered path rewrite: match a regex, optionally substitute, and
/// optionally prepend a fixed prefix. A path that does not match `matcher`
/// passes through unchanged, same as the Go `regexp.ReplaceAll` idiom the
/// original substitution semantics are modeled on.
#[derive(Debug, Clone)]
pub struct PathTransformation {
    matcher: Regex,
    replacement: Option<String>,
    prefix: Option<String>,
    global: bool,
}

impl PathTransformation {
    /// A transformation that only tests whether a path matches, without
    /// rewriting it. Useful as a TaskResolver predicate building block as
    /// well as a PathTransformation in its own right.
    pub fn match_only(pattern: &str, flags: Flags) -> Result<Self> {
        Ok(Self {
            matcher: build_regex(pattern, flags.ignore_case)?,
            replacement: None,
            prefix: None,
            global: flags.global,
        })
    }

    /// A transformation that substitutes matches of `pattern` with
    /// `replacement` (using regex capture-group syntax, e.g. `$1`).
    pub fn substitute(pattern: &str, replacement: &str, flags: Flags) -> Result<Self> {
        Ok(Self {
            matcher: build_regex(pattern, flags.ignore_case)?,
            replacement: Some(replacement.to_string()),
            prefix: None,
            global: flags.global,
        })
    }

    /// Attaches a fixed prefix prepended after matching/substitution.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// True if `path` (ignoring a preserved leading/trailing slash) matches
    /// this transformation's pattern.
    pub fn is_match(&self, path: &str) -> bool {
        self.matcher.is_match(trim_slashes(path).1)
    }

    /// Applies this transformation to `path`. A non-matching path is
    /// returned unchanged except for having `prefix` prepended, if set —
    /// prefixing is unconditional so `PathTransformation`s can be used
    /// purely to namespace a tree of paths (e.g. the `@emit` rewrite).
    /// Leading and trailing slashes on the original path are preserved
    /// around the rewritten core (spec.md Section 3).
    pub fn apply(&self, path: &str) -> String {
        let (leading, core, trailing) = trim_slashes_both(path);
        let rewritten = match &self.replacement {
            None => core.to_string(),
            Some(replacement) => {
                if self.global {
                    self.matcher.replace_all(core, replacement.as_str()).into_owned()
                } else {
                    self.matcher.replace(core, replacement.as_str()).into_owned()
                }
            }
        };
        let prefixed = match &self.prefix {
            Some(prefix) => format!("{prefix}{rewritten}"),
            None => rewritten,
        };
        format!("{leading}{prefixed}{trailing}")
    }
}

fn build_regex(pattern: &str, ignore_case: bool) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(ignore_case)
        .build()
        .map_err(PathError::from)
}

fn trim_slashes(path: &str) -> (&str, &str) {
    let leading = if path.starts_with('/') { "/" } else { "" };
    (leading, path.trim_start_matches('/'))
}

fn trim_slashes_both(path: &str) -> (&str, &str, &str) {
    let (leading, rest) = trim_slashes(path);
    let trailing = if rest.ends_with('/') && !rest.is_empty() {
        "/"
    } else {
        ""
    };
    let core = rest.trim_end_matches('/');
    (leading, core, trailing)
}

/// Applies an ordered chain of transformations, each fed the previous
/// result (spec.md Section 8 invariant 5: chains compose left to right).
pub fn apply_chain(chain: &[PathTransformation], path: &str) -> String {
    chain.iter().fold(path.to_string(), |acc, t| t.apply(&acc))
}

/// Parses the PathTransformation string expression grammar (spec.md
/// Section 6):
/// - `m<delim>pattern<delim>flags` — match-only.
/// - `s<delim>pattern<delim>replacement<delim>flags` — substitution.
///
/// `<delim>` is whatever single character follows the `m`/`s` kind letter,
/// conventionally `/`.
pub fn parse_expression(expr: &str) -> Result<PathTransformation> {
    let mut chars = expr.chars();
    let kind = chars
        .next()
        .ok_or_else(|| PathError::ExpressionTooShort(expr.to_string()))?;
    let delim = chars
        .next()
        .ok_or_else(|| PathError::ExpressionTooShort(expr.to_string()))?;
    let rest = chars.as_str();
    let fields: Vec<&str> = rest.split(delim).collect();

    match kind {
        'm' => {
            if fields.len() != 2 {
                return Err(PathError::WrongFieldCount(expr.to_string()));
            }
            let flags = Flags::parse(fields[1])?;
            PathTransformation::match_only(fields[0], flags)
        }
        's' => {
            if fields.len() != 3 {
                return Err(PathError::WrongFieldCount(expr.to_string()));
            }
            let flags = Flags::parse(fields[2])?;
            PathTransformation::substitute(fields[0], fields[1], flags)
        }
        other => Err(PathError::UnknownExpressionKind(other)),
    }
}
