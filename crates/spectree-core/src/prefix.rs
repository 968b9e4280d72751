//! Small helpers for the "Misc" concerns spec.md Section 2 groups in with
//! the core data model: prefixing log/output lines with a Spec's position
//! in the tree, and rendering a [`crate::value::PropertyMap`] for
//! diagnostics.

use crate::value::Value;
use std::fmt::Write as _;

/// Builds a `level_1/level_2/level_3`-style dotted path from root to a
/// Spec, used to prefix streamed task output so concurrent Specs'
/// interleaved logs stay attributable (loopd's runner prefixes task output
/// with the skill name the same way).
pub fn tree_path(ancestry: &[&str]) -> String {
    ancestry.join("/")
}

/// Prefixes every line of `text` with `prefix: `, used when forwarding a
/// Task's stdout/stderr into the engine's tracing output.
pub fn prefix_lines(prefix: &str, text: &str) -> String {
    text.lines()
        .map(|line| format!("{prefix}: {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders a [`Value`] as a single-line debug string, for trace logging.
pub fn render_value(value: &Value) -> String {
    let mut out = String::new();
    render_value_into(value, &mut out);
    out
}

fn render_value_into(value: &Value, out: &mut String) {
    match value {
        Value::Bool(b) => {
            let _ = write!(out, "{b}");
        }
        Value::Int(i) => {
            let _ = write!(out, "{i}");
        }
        Value::Float(f) => {
            let _ = write!(out, "{f}");
        }
        Value::String(s) => {
            let _ = write!(out, "{s:?}");
        }
        Value::Bytes(b) => {
            let _ = write!(out, "<{} bytes>", b.len());
        }
        Value::List(items) => {
            let _ = write!(out, "[");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    let _ = write!(out, ", ");
                }
                render_value_into(item, out);
            }
            let _ = write!(out, "]");
        }
        Value::Map(map) => {
            let _ = write!(out, "{{");
            for (i, (k, v)) in map.iter().enumerate() {
                if i > 0 {
                    let _ = write!(out, ", ");
                }
                let _ = write!(out, "{k}: ");
                render_value_into(v, out);
            }
            let _ = write!(out, "}}");
        }
    }
}
