//! `CopyBehavior`: a `Func`-only task that reads a file from disk and
//! emits it under a new `ib://` path (spec.md Section 4.x "Built-in
//! behaviors"). The simplest possible `ASSETS_GENERATE` example — every
//! real source behavior (git clone, Node build) follows the same shape of
//! "do some I/O, then push a freshly-named `Asset` into the buffer".

use crate::error::BehaviorError;
use spectree_core::{Asset, AssetUrl, TypeMask};
use spectree_task::{Result, TaskBehavior, TaskContext};
use std::path::PathBuf;

/// Reads `source_path` once and emits its bytes as an asset named
/// `dest_path` under the owning Spec's namespace.
pub struct CopyBehavior {
    source_path: PathBuf,
    dest_path: String,
    mime: Option<String>,
    done: bool,
}

impl CopyBehavior {
    pub fn new(source_path: impl Into<PathBuf>, dest_path: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            dest_path: dest_path.into(),
            mime: None,
            done: false,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }
}

impl TaskBehavior for CopyBehavior {
    fn run(&mut self, ctx: &TaskContext, buffered: &mut Vec<Asset>) -> Result<()> {
        if self.done {
            return Ok(());
        }
        let bytes = std::fs::read(&self.source_path).map_err(|source| BehaviorError::Io {
            path: self.source_path.display().to_string(),
            source,
        })?;
        tracing::debug!(
            spec = %ctx.spec_name,
            path = %self.source_path.display(),
            bytes = bytes.len(),
            "copy behavior read source file",
        );
        let url = AssetUrl::new(ctx.spec_name.clone(), self.dest_path.clone());
        let mut asset = Asset::new_single(url, ctx.spec_name.clone(), TypeMask::single_read_write());
        asset.set_bytes(bytes).map_err(BehaviorError::from)?;
        if let Some(mime) = &self.mime {
            asset = asset.with_mime(mime.clone());
        }
        buffered.push(asset);
        self.done = true;
        Ok(())
    }

    fn has_func(&self) -> bool {
        true
    }

    fn has_map_func(&self) -> bool {
        false
    }
}
