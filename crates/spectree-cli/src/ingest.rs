//! Reads line-delimited JSON assets from a byte source (stdin, in
//! practice) and deposits them into the root Spec's queue as a single
//! `run` step (spec.md Section 1 names stdin/stdout wiring as out of
//! scope for the core engine, so this lives in the CLI crate rather than
//! `spectree-behaviors`).

use spectree_core::{Asset, AssetUrl, TypeMask};
use spectree_task::{Result, TaskBehavior, TaskContext, TaskError};
use spectree_wire::decode_line;
use std::io::BufRead;
use std::sync::Mutex;

/// Drains every remaining line from `reader` on its first `run` and
/// deposits one asset per line. A `Mutex` rather than `&mut` access to the
/// reader because `TaskBehavior::run` takes `&mut self`, not `&mut
/// Box<dyn Read>` by name — this keeps the behavior `Send`.
pub struct StdinIngestBehavior {
    reader: Mutex<Box<dyn BufRead + Send>>,
    spec_name: String,
    done: bool,
}

impl StdinIngestBehavior {
    pub fn new(reader: Box<dyn BufRead + Send>, spec_name: impl Into<String>) -> Self {
        Self {
            reader: Mutex::new(reader),
            spec_name: spec_name.into(),
            done: false,
        }
    }
}

impl TaskBehavior for StdinIngestBehavior {
    fn run(&mut self, ctx: &TaskContext, buffered: &mut Vec<Asset>) -> Result<()> {
        if self.done {
            return Ok(());
        }
        self.done = true;

        let mut reader = self.reader.lock().expect("ingest reader mutex poisoned");
        let mut line = String::new();
        let mut index = 0usize;
        loop {
            line.clear();
            let bytes_read = reader
                .read_line(&mut line)
                .map_err(|e| TaskError::External(e.to_string()))?;
            if bytes_read == 0 {
                break;
            }
            let trimmed = line.trim_end_matches(['\n', '\r']);
            if trimmed.is_empty() {
                continue;
            }
            let decoded = decode_line(trimmed).map_err(|e| TaskError::External(e.to_string()))?;
            let url = match &decoded.url {
                Some(raw) => AssetUrl::parse(raw)?,
                None => AssetUrl::new(&ctx.spec_name, format!("stdin/{index}")),
            };
            let mut asset = Asset::new_single(url, &self.spec_name, TypeMask::single_read_write());
            asset.set_bytes(decoded.bytes)?;
            if let Some(mimetype) = decoded.mimetype {
                asset = asset.with_mime(mimetype);
            }
            buffered.push(asset);
            index += 1;
        }
        Ok(())
    }

    fn has_func(&self) -> bool {
        true
    }

    fn has_map_func(&self) -> bool {
        false
    }
}
