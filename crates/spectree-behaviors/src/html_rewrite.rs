//! `HtmlRewriteBehavior`: a `MapFunc`-only task that rewrites `href`/`src`
//! attribute values in `text/html` assets using a `PathTransformation`
//! chain (spec.md Section 1: "path rewriting in HTML/CSS is a
//! representative use"; Section 4.x; Section 8 scenario S4).
//!
//! Non-HTML assets pass through untouched — the matcher the engine already
//! applies (`AssetMatcher::mime_prefix("text/html")`) is what a resolver
//! would use to keep this task off the routing path for anything else, but
//! the behavior itself also checks, so it is safe to wire up without a
//! matcher too.

use spectree_core::Asset;
use spectree_path::{apply_chain, PathTransformation};
use spectree_task::{Result, TaskBehavior, TaskContext};

/// Matches `href="..."` / `src="..."` / `href='...'` / `src='...'`
/// attribute values (single- or double-quoted).
fn attr_regex() -> &'static regex::Regex {
    static RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| {
        regex::Regex::new(r#"(?i)(href|src)=("([^"]*)"|'([^']*)')"#)
            .expect("static attribute pattern is valid")
    })
}

pub struct HtmlRewriteBehavior {
    chain: Vec<PathTransformation>,
}

impl HtmlRewriteBehavior {
    pub fn new(chain: Vec<PathTransformation>) -> Self {
        Self { chain }
    }

    fn rewrite_html(&self, html: &str) -> String {
        attr_regex()
            .replace_all(html, |caps: &regex::Captures<'_>| {
                let attr = &caps[1];
                let quote = if caps.get(3).is_some() { '"' } else { '\'' };
                let value = caps.get(3).or_else(|| caps.get(4)).map_or("", |m| m.as_str());
                let rewritten = apply_chain(&self.chain, value);
                format!("{attr}={quote}{rewritten}{quote}")
            })
            .into_owned()
    }
}

impl TaskBehavior for HtmlRewriteBehavior {
    fn map_asset(&mut self, _ctx: &TaskContext, mut asset: Asset) -> Result<Option<Asset>> {
        if asset.mime.as_deref() != Some("text/html") {
            return Ok(Some(asset));
        }
        let bytes = asset.get_bytes()?;
        let html = String::from_utf8_lossy(&bytes).into_owned();
        let rewritten = self.rewrite_html(&html);
        asset.set_bytes(rewritten.into_bytes())?;
        Ok(Some(asset))
    }

    fn has_func(&self) -> bool {
        false
    }

    fn has_map_func(&self) -> bool {
        true
    }
}
