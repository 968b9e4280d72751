//! Line-delimited JSON asset wire format (spec.md Section 6): "one JSON
//! object per line with fields `url`, `mimetype`, `content.string`,
//! `content.base64`, `content.length`."
//!
//! `WireFormat::Text` (from `spectree-expr::format`) is a CLI display mode
//! only — it writes the decoded content bytes directly, one asset per
//! line, and is not a format this module can decode back from (there is no
//! JSON normative text encoding for it in spec.md Section 6; only the JSON
//! line format round-trips).

use crate::error::{Result, WireError};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use spectree_core::Asset;
use spectree_expr::{FormatSpec, WireFormat};
use std::io::Write;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WireContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    length: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WireRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mimetype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<WireContent>,
}

/// True if `mime` denotes a textual representation — governs whether the
/// default encoding picks `string` or `base64` for content (spec.md
/// Section 6: "base64 used when asset is non-text").
fn is_text_mime(mime: Option<&str>) -> bool {
    match mime {
        None => true,
        Some(m) => m.starts_with("text/") || m == "application/json" || m.ends_with("+json"),
    }
}

/// Serializes one line of the wire format for `asset`, honoring `spec`'s
/// field/content toggles. Returns the line without a trailing newline.
/// Reads (but does not mutate) the asset's byte content — requires a
/// reader be defined, same as any other content read (spec.md Section 7:
/// "request to read content from an asset with no defined reader").
pub fn encode_line(asset: &mut Asset, spec: &FormatSpec) -> Result<String> {
    if spec.format == WireFormat::Text {
        let bytes = asset.get_bytes()?;
        return Ok(String::from_utf8_lossy(&bytes).into_owned());
    }

    let bytes = asset.get_bytes()?;
    let text = is_text_mime(asset.mime.as_deref());

    let mut content = WireContent::default();
    if spec.content_string && text {
        content.string = Some(String::from_utf8_lossy(&bytes).into_owned());
    }
    if spec.content_base64 && (!text || !spec.content_string) {
        content.base64 = Some(BASE64.encode(&bytes));
    }
    if spec.content_length {
        content.length = Some(bytes.len() as u64);
    }
    let content = if content.string.is_none() && content.base64.is_none() && content.length.is_none() {
        None
    } else {
        Some(content)
    };

    let record = WireRecord {
        url: spec.url.then(|| asset.url.to_string()),
        mimetype: spec.mimetype.then(|| asset.mime.clone()).flatten(),
        content,
    };
    serde_json::to_string(&record).map_err(WireError::from)
}

/// Writes `asset` as one line (plus trailing `\n`) to `out`.
pub fn write_line(out: &mut impl Write, asset: &mut Asset, spec: &FormatSpec) -> Result<()> {
    let line = encode_line(asset, spec)?;
    out.write_all(line.as_bytes())?;
    out.write_all(b"\n")?;
    Ok(())
}

/// Decoded content from a JSON wire line: bytes plus the URL/mimetype
/// metadata present on the line (absent fields decode to `None`, matching
/// spec.md Section 6's "fields ... optional").
#[derive(Debug, Clone)]
pub struct DecodedLine {
    pub url: Option<String>,
    pub mimetype: Option<String>,
    pub bytes: Vec<u8>,
}

/// Parses one JSON wire line back into its constituent parts. Does not
/// construct an `Asset` directly — the caller (typically the CLI's ingest
/// path) knows which Spec/mask the decoded bytes should be wrapped in.
pub fn decode_line(line: &str) -> Result<DecodedLine> {
    let record: WireRecord = serde_json::from_str(line)?;
    let bytes = match record.content {
        Some(WireContent {
            string: Some(s), ..
        }) => s.into_bytes(),
        Some(WireContent {
            base64: Some(b), ..
        }) => BASE64.decode(b.as_bytes())?,
        _ => return Err(WireError::MissingContent),
    };
    Ok(DecodedLine {
        url: record.url,
        mimetype: record.mimetype,
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use spectree_core::{AssetUrl, TypeMask};

    fn text_asset(path: &str, content: &str, mime: &str) -> Asset {
        let mut a = Asset::new_single(AssetUrl::new("leaf", path), "leaf", TypeMask::single_read_write());
        a.set_bytes(content.as_bytes().to_vec()).unwrap();
        a.with_mime(mime)
    }

    #[test]
    fn encodes_text_asset_as_string_content() {
        let mut asset = text_asset("a.txt", "hello", "text/plain");
        let spec = FormatSpec::default();
        let line = encode_line(&mut asset, &spec).unwrap();
        assert!(line.contains("\"string\":\"hello\""));
        assert!(!line.contains("base64"));
    }

    #[test]
    fn encodes_binary_asset_as_base64_content() {
        let mut asset = text_asset("a.png", "\u{0}\u{1}\u{2}", "image/png");
        let spec = FormatSpec::default();
        let line = encode_line(&mut asset, &spec).unwrap();
        assert!(line.contains("base64"));
        assert!(!line.contains("\"string\""));
    }

    #[test]
    fn round_trips_through_decode() {
        let mut asset = text_asset("a.txt", "hello world", "text/plain");
        let spec = FormatSpec::default();
        let line = encode_line(&mut asset, &spec).unwrap();
        let decoded = decode_line(&line).unwrap();
        assert_eq!(decoded.bytes, b"hello world");
        assert_eq!(decoded.mimetype.as_deref(), Some("text/plain"));
    }

    #[test]
    fn omitted_fields_are_not_emitted() {
        let mut asset = text_asset("a.txt", "hello", "text/plain");
        let spec = FormatSpec {
            mimetype: false,
            ..FormatSpec::default()
        };
        let line = encode_line(&mut asset, &spec).unwrap();
        assert!(!line.contains("mimetype"));
    }

    #[test]
    fn text_format_writes_raw_content_with_no_json() {
        let mut asset = text_asset("a.txt", "hello", "text/plain");
        let spec = FormatSpec {
            format: WireFormat::Text,
            ..FormatSpec::default()
        };
        let line = encode_line(&mut asset, &spec).unwrap();
        assert_eq!(line, "hello");
    }
}
