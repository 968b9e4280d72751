//! The `ib://` asset URL scheme (spec.md Section 6).
//!
//! An asset URL identifies the Spec that produced it and the path of the
//! artifact within that Spec's namespace: `ib://<spec-name>/<path>`.

use crate::error::{CoreError, Result};
use std::fmt;

/// The external namespace a Spec exposes its outputs under, once an asset
/// has been emitted to a parent and had its path rewritten.
pub const EMIT_PREFIX: &str = "@emit";

/// A parsed `ib://` asset URL.
///
/// `emit_hops` counts how many `namespace_under` calls built the current
/// `@emit/` marker, so a later call knows exactly where the accumulated
/// hop names end and the asset's own path begins — the path itself may
/// contain `/`, so that boundary can't be recovered by re-parsing the
/// string alone. It isn't part of the URL's identity: two URLs that print
/// the same are the same URL regardless of how their marker was built.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AssetUrl {
    host: String,
    path: String,
    #[serde(skip)]
    emit_hops: u32,
}

impl PartialEq for AssetUrl {
    fn eq(&self, other: &Self) -> bool {
        self.host == other.host && self.path == other.path
    }
}

impl Eq for AssetUrl {}

impl std::hash::Hash for AssetUrl {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.host.hash(state);
        self.path.hash(state);
    }
}

impl AssetUrl {
    /// Build a URL directly from a producing Spec name and a path.
    pub fn new(spec_name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            host: spec_name.into(),
            path: path.into(),
            emit_hops: 0,
        }
    }

    /// Parse an `ib://host/path` string.
    pub fn parse(s: &str) -> Result<Self> {
        let rest = s
            .strip_prefix("ib://")
            .ok_or_else(|| CoreError::MalformedUrl(s.to_string()))?;
        let (host, path) = match rest.split_once('/') {
            Some((h, p)) => (h, p),
            None => (rest, ""),
        };
        if host.is_empty() {
            return Err(CoreError::MalformedUrl(s.to_string()));
        }
        Ok(Self {
            host: host.to_string(),
            path: path.to_string(),
            emit_hops: 0,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns a copy of this URL with a different path, same host. Keeps
    /// this URL's hop count: callers use this to run a path-transform
    /// chain over the existing path (spec.md Section 9: "the `@emit`
    /// prefix rewrite on spec output and the user-supplied transformations
    /// are two separate phases") before a further `namespace_under` call,
    /// and that later call still needs to find the right hop/path boundary.
    pub fn with_path(&self, path: impl Into<String>) -> Self {
        Self {
            host: self.host.clone(),
            path: path.into(),
            emit_hops: self.emit_hops,
        }
    }

    /// Returns a copy of this URL with its path namespaced under this hop's
    /// name inside a single `@emit/` marker (spec.md Section 6: "Parents
    /// treat the `@emit` prefix as the external namespace of the child").
    /// The host is left untouched: spec.md Section 3 fixes it as "the
    /// producing Spec's name" for the asset's whole lifetime.
    ///
    /// A path not yet under `@emit/` gets a fresh marker. A path already
    /// under one gets this hop's name appended to the end of the existing
    /// hop list, just before the asset's own path, so repeated hops
    /// accumulate into one marker listing every hop in leaf-to-root order
    /// rather than nesting a marker per hop: two hops named `b` then `a`
    /// yield `@emit/b/a/path`, matching spec.md Section 8 scenario S2's
    /// three-hop illustration. The asset's own path is never reinterpreted
    /// as hop segments even when it contains `/` of its own.
    pub fn namespace_under(&self, child_name: &str) -> Self {
        let leading_slash = self.path.starts_with('/');
        let trimmed = self.path.trim_start_matches('/');
        let emit_root = format!("{EMIT_PREFIX}/");
        let (namespaced, emit_hops) = if self.emit_hops > 0 {
            let rest = trimmed
                .strip_prefix(emit_root.as_str())
                .expect("emit_hops > 0 implies the path already carries an @emit/ marker");
            let mut parts = rest.splitn(self.emit_hops as usize + 1, '/');
            let hops: Vec<&str> = (0..self.emit_hops).map(|_| parts.next().unwrap_or("")).collect();
            let tail = parts.next().unwrap_or("");
            (
                format!("{EMIT_PREFIX}/{}/{child_name}/{tail}", hops.join("/")),
                self.emit_hops + 1,
            )
        } else {
            (format!("{EMIT_PREFIX}/{child_name}/{trimmed}"), 1)
        };
        Self {
            host: self.host.clone(),
            path: if leading_slash {
                format!("/{namespaced}")
            } else {
                namespaced
            },
            emit_hops,
        }
    }

    /// True if this path already lives under the `@emit/` namespace.
    pub fn is_under_emit(&self) -> bool {
        self.path.starts_with(EMIT_PREFIX)
    }
}

impl fmt::Display for AssetUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ib://{}/{}", self.host, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_host_and_path() {
        let url = AssetUrl::parse("ib://level_1/a/b.txt").unwrap();
        assert_eq!(url.host(), "level_1");
        assert_eq!(url.path(), "a/b.txt");
    }

    #[test]
    fn rejects_missing_scheme() {
        assert!(AssetUrl::parse("http://level_1/a").is_err());
    }

    #[test]
    fn rejects_empty_host() {
        assert!(AssetUrl::parse("ib:///a").is_err());
    }

    #[test]
    fn displays_round_trip() {
        let url = AssetUrl::new("leaf", "a0");
        assert_eq!(url.to_string(), "ib://leaf/a0");
        assert_eq!(AssetUrl::parse(&url.to_string()).unwrap(), url);
    }

    #[test]
    fn namespace_under_wraps_a_bare_path() {
        let leaf = AssetUrl::new("level_3", "a0");
        let hop1 = leaf.namespace_under("level_3");
        assert_eq!(hop1.to_string(), "ib://level_3/@emit/level_3/a0");
    }

    #[test]
    fn namespace_under_keeps_host_fixed_and_flattens_per_hop() {
        let leaf = AssetUrl::new("level_3", "a0");
        let hop1 = leaf.namespace_under("level_3");
        let hop2 = hop1.namespace_under("level_2");
        assert_eq!(hop2.to_string(), "ib://level_3/@emit/level_3/level_2/a0");
        let hop3 = hop2.namespace_under("level_1");
        assert_eq!(hop3.to_string(), "ib://level_3/@emit/level_3/level_2/level_1/a0");
        // host never changes: it stays the asset's original producing Spec.
        assert_eq!(hop3.host(), "level_3");
    }

    #[test]
    fn namespace_under_preserves_leading_slash() {
        let url = AssetUrl::new("level_3", "/a0");
        let hop = url.namespace_under("level_3");
        assert_eq!(hop.path(), "/@emit/level_3/a0");
    }

    #[test]
    fn namespace_under_keeps_multi_segment_asset_path_intact_across_hops() {
        let leaf = AssetUrl::new("level_3", "a/b.txt");
        let hop1 = leaf.namespace_under("level_3");
        assert_eq!(hop1.path(), "@emit/level_3/a/b.txt");
        let hop2 = hop1.namespace_under("level_2");
        assert_eq!(hop2.path(), "@emit/level_3/level_2/a/b.txt");
        let hop3 = hop2.namespace_under("level_1");
        assert_eq!(hop3.path(), "@emit/level_3/level_2/level_1/a/b.txt");
    }
}
