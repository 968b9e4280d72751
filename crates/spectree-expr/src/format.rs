//! The `format` section: toggles which fields the wire encoder
//! (`spectree-wire`) prints, plus the output format itself (spec.md
//! Section 6: "Identifiers prefixed with `no-` negate; `default` resets to
//! default format" and the asset wire format's encoding mask bits).

use crate::error::{ExprError, Result};
use crate::parser::{parse, Value};

/// Output format for the wire encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    Json,
    Text,
}

/// Which fields/content representations are emitted, plus the chosen
/// `WireFormat` — this is the CLI-configurable half of `spectree-wire`'s
/// encoding mask (spec.md Section 6: "Default is json+url+mimetype+
/// string+base64").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatSpec {
    pub format: WireFormat,
    pub url: bool,
    pub mimetype: bool,
    pub content_string: bool,
    pub content_base64: bool,
    pub content_length: bool,
}

impl Default for FormatSpec {
    fn default() -> Self {
        Self {
            format: WireFormat::Json,
            url: true,
            mimetype: true,
            content_string: true,
            content_base64: true,
            content_length: false,
        }
    }
}

pub fn parse_format(src: &str) -> Result<FormatSpec> {
    let expr = parse(src)?;
    let mut spec = FormatSpec::default();
    for arg in expr.args {
        if arg.field == "default" {
            spec = FormatSpec::default();
            continue;
        }
        let (negate, name) = match arg.field.strip_prefix("no-") {
            Some(rest) => (true, rest),
            None => (false, arg.field.as_str()),
        };
        if name == "json" || name == "text" {
            if negate {
                return Err(ExprError::UnknownFormatField(format!("no-{name}")));
            }
            spec.format = if name == "json" {
                WireFormat::Json
            } else {
                WireFormat::Text
            };
            continue;
        }
        let flag = match name {
            "url" => &mut spec.url,
            "mimetype" | "mime" => &mut spec.mimetype,
            "string" => &mut spec.content_string,
            "base64" => &mut spec.content_base64,
            "length" => &mut spec.content_length,
            other => return Err(ExprError::UnknownFormatField(other.to_string())),
        };
        *flag = !negate;
        if let Some(Value::Ident(_) | Value::String(_) | Value::Path(_) | Value::Regex(_)) =
            arg.value
        {
            return Err(ExprError::UnknownFormatField(format!(
                "{name} (format fields take no value)"
            )));
        }
    }
    Ok(spec)
}
