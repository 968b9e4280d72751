//! The Asset type (spec.md Section 3).
//!
//! An Asset carries one artifact (a "single" asset: byte buffer and/or
//! typed value, kept in parity) or a lazy collection of them (a "multi"
//! asset, expanded through one of three access modes). Every Asset is
//! exclusively owned by whichever Task currently holds it; emitting it
//! transfers ownership, or — if the receiving Spec rewrites the URL —
//! produces a shallow copy that shares the underlying content via `Arc`.

use crate::error::{CoreError, Result};
use crate::history::HistoryEntry;
use crate::mask::TypeMask;
use crate::url::AssetUrl;
use crate::value::Value;
use chrono::Utc;
use std::sync::Arc;

/// Which side of a single asset's content was mutated without the other
/// side being synced yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Dirty {
    #[default]
    None,
    Bytes,
    Data,
}

/// The (byte-buffer, typed-value) pair a singular asset carries, kept in
/// parity via write-through-on-read (spec.md Section 3 and the Open
/// Question in Section 9: only *simultaneous* modification of both sides
/// is an error; one side mutated and read back through the other is the
/// conservative write-through path and is not).
#[derive(Debug, Clone, Default)]
pub struct SingleContent {
    bytes: Option<Arc<[u8]>>,
    data: Option<Arc<Value>>,
    dirty: Dirty,
}

impl SingleContent {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Some(Arc::from(bytes)),
            data: None,
            dirty: Dirty::None,
        }
    }

    pub fn from_data(data: Value) -> Self {
        Self {
            bytes: None,
            data: Some(Arc::new(data)),
            dirty: Dirty::None,
        }
    }

    pub fn set_bytes(&mut self, bytes: Vec<u8>) -> Result<()> {
        if self.dirty == Dirty::Data {
            return Err(CoreError::DivergentModification);
        }
        self.bytes = Some(Arc::from(bytes));
        self.dirty = Dirty::Bytes;
        Ok(())
    }

    pub fn set_data(&mut self, data: Value) -> Result<()> {
        if self.dirty == Dirty::Bytes {
            return Err(CoreError::DivergentModification);
        }
        self.data = Some(Arc::new(data));
        self.dirty = Dirty::Data;
        Ok(())
    }

    /// Returns the byte content, synthesizing it from the typed value (via
    /// `Value::Bytes` exact round trip, or a UTF-8 encoding of other
    /// variants) if bytes are stale relative to a prior `set_data`.
    pub fn get_bytes(&mut self) -> Result<Arc<[u8]>> {
        if self.dirty == Dirty::Data {
            let data = self.data.as_ref().expect("dirty=Data implies data is set");
            let synced = value_to_bytes(data);
            self.bytes = Some(Arc::from(synced));
            self.dirty = Dirty::None;
        }
        self.bytes.clone().ok_or(CoreError::NoReader)
    }

    /// Returns the typed value, synthesizing it from bytes (as
    /// `Value::Bytes`) if data is stale relative to a prior `set_bytes`.
    pub fn get_data(&mut self) -> Result<Arc<Value>> {
        if self.dirty == Dirty::Bytes {
            let bytes = self
                .bytes
                .as_ref()
                .expect("dirty=Bytes implies bytes is set");
            self.data = Some(Arc::new(Value::Bytes(bytes.to_vec())));
            self.dirty = Dirty::None;
        }
        self.data.clone().ok_or(CoreError::NoReader)
    }

    pub fn has_bytes(&self) -> bool {
        self.bytes.is_some()
    }

    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }
}

fn value_to_bytes(value: &Value) -> Vec<u8> {
    match value {
        Value::Bytes(b) => b.clone(),
        Value::String(s) => s.clone().into_bytes(),
        other => serde_json::to_vec(other).unwrap_or_default(),
    }
}

/// How a multi-asset's children are produced (spec.md Section 3: "Multi-
/// assets expand lazily into a (finite) sequence of child assets via one
/// of three access modes.")
pub enum MultiContent {
    /// Already fully materialized.
    Array(Vec<Asset>),
    /// Same representation as `Array`; distinguished only by the mask bit
    /// a Task declared it with (a builder the Task may still push into).
    ArrayBuilder(Vec<Asset>),
    /// A finite, lazily-evaluated sequence.
    Generator(Box<dyn FnMut() -> Option<Asset> + Send>),
}

impl std::fmt::Debug for MultiContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MultiContent::Array(items) => f.debug_tuple("Array").field(&items.len()).finish(),
            MultiContent::ArrayBuilder(items) => {
                f.debug_tuple("ArrayBuilder").field(&items.len()).finish()
            }
            MultiContent::Generator(_) => f.debug_tuple("Generator").finish(),
        }
    }
}

impl MultiContent {
    /// Drains this multi-asset into a flat `Vec<Asset>`, recursively
    /// flattening any nested multi-assets (spec.md Section 4.4 step 4:
    /// "expand it (flatten recursively)").
    pub fn flatten(self) -> Vec<Asset> {
        let items = match self {
            MultiContent::Array(items) | MultiContent::ArrayBuilder(items) => items,
            MultiContent::Generator(mut next) => {
                let mut items = Vec::new();
                while let Some(item) = next() {
                    items.push(item);
                }
                items
            }
        };
        items
            .into_iter()
            .flat_map(|asset| match asset.content {
                AssetContent::Single(_) => vec![asset],
                AssetContent::Multi(inner) => inner.flatten(),
            })
            .collect()
    }

    /// Converts a `Generator` into a materialized `Array` so the asset can
    /// be cheaply shallow-copied when fanned out to more than one parent
    /// Spec. Already-materialized variants are left as-is. This is a
    /// design decision (not specified in the source material) to resolve
    /// what "fan out by reference" means for a lazily-generated multi
    /// asset with more than one subscriber — see DESIGN.md.
    pub fn materialize(self) -> Self {
        match self {
            MultiContent::Generator(mut next) => {
                let mut items = Vec::new();
                while let Some(item) = next() {
                    items.push(item);
                }
                MultiContent::Array(items)
            }
            other => other,
        }
    }
}

#[derive(Debug)]
enum AssetContent {
    Single(SingleContent),
    Multi(MultiContent),
}

/// One artifact (or lazy collection of artifacts) flowing through the
/// pipeline.
#[derive(Debug)]
pub struct Asset {
    pub url: AssetUrl,
    pub mime: Option<String>,
    pub history: Arc<HistoryEntry>,
    /// Name of the Spec that produced this asset (stays fixed even as the
    /// asset travels through ancestor Specs — spec.md Section 3: "host =
    /// producing Spec's name").
    pub produced_by: String,
    pub mask: TypeMask,
    content: AssetContent,
}

impl Asset {
    pub fn new_single(url: AssetUrl, produced_by: impl Into<String>, mask: TypeMask) -> Self {
        assert!(mask.is_single(), "new_single requires a single-quantity mask");
        let now = Utc::now();
        let history = HistoryEntry::origin(url.to_string(), now);
        Self {
            url,
            mime: None,
            history,
            produced_by: produced_by.into(),
            mask,
            content: AssetContent::Single(SingleContent::empty()),
        }
    }

    pub fn new_multi(
        url: AssetUrl,
        produced_by: impl Into<String>,
        mask: TypeMask,
        items: Vec<Asset>,
    ) -> Self {
        assert!(mask.is_multi(), "new_multi requires a multi-quantity mask");
        let now = Utc::now();
        let history = HistoryEntry::origin(url.to_string(), now);
        Self {
            url,
            mime: None,
            history,
            produced_by: produced_by.into(),
            mask,
            content: AssetContent::Multi(MultiContent::Array(items)),
        }
    }

    pub fn new_generator(
        url: AssetUrl,
        produced_by: impl Into<String>,
        generator: impl FnMut() -> Option<Asset> + Send + 'static,
    ) -> Self {
        let now = Utc::now();
        let history = HistoryEntry::origin(url.to_string(), now);
        Self {
            url,
            mime: None,
            history,
            produced_by: produced_by.into(),
            mask: TypeMask::multi_generator(),
            content: AssetContent::Multi(MultiContent::Generator(Box::new(generator))),
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    pub fn is_multi(&self) -> bool {
        matches!(self.content, AssetContent::Multi(_))
    }

    pub fn is_single(&self) -> bool {
        !self.is_multi()
    }

    pub fn set_bytes(&mut self, bytes: Vec<u8>) -> Result<()> {
        match &mut self.content {
            AssetContent::Single(c) => c.set_bytes(bytes),
            AssetContent::Multi(_) => Err(CoreError::ExpectedSingle),
        }
    }

    pub fn set_data(&mut self, data: Value) -> Result<()> {
        match &mut self.content {
            AssetContent::Single(c) => c.set_data(data),
            AssetContent::Multi(_) => Err(CoreError::ExpectedSingle),
        }
    }

    pub fn get_bytes(&mut self) -> Result<Arc<[u8]>> {
        match &mut self.content {
            AssetContent::Single(c) => c.get_bytes(),
            AssetContent::Multi(_) => Err(CoreError::ExpectedSingle),
        }
    }

    pub fn get_data(&mut self) -> Result<Arc<Value>> {
        match &mut self.content {
            AssetContent::Single(c) => c.get_data(),
            AssetContent::Multi(_) => Err(CoreError::ExpectedSingle),
        }
    }

    /// Consumes this asset and flattens its multi content into a flat
    /// `Vec<Asset>`. Errors if called on a single asset.
    pub fn expand_multi(self) -> Result<Vec<Asset>> {
        match self.content {
            AssetContent::Multi(m) => Ok(m.flatten()),
            AssetContent::Single(_) => Err(CoreError::ExpectedMulti),
        }
    }

    /// Materializes a `Generator` multi-asset into an `Array` in place, so
    /// it can later be shallow-copied for fan-out to multiple parents.
    /// No-op for single assets and already-materialized multis.
    pub fn materialize_multi(&mut self) {
        if let AssetContent::Multi(m) = &mut self.content {
            let taken = std::mem::replace(m, MultiContent::Array(Vec::new()));
            *m = taken.materialize();
        }
    }

    /// Produces a shallow copy of this asset under a new URL, appending a
    /// new history entry whose parent is the current one (spec.md Section
    /// 3 invariant: emitted assets preserve history). Content is shared via
    /// `Arc` for single assets; multi assets must be materialized first
    /// (see [`Asset::materialize_multi`]) since `Generator` cannot be
    /// cheaply duplicated.
    pub fn rewritten(&self, new_url: AssetUrl) -> Result<Asset> {
        let content = match &self.content {
            AssetContent::Single(c) => AssetContent::Single(c.clone()),
            AssetContent::Multi(MultiContent::Array(items)) => {
                AssetContent::Multi(MultiContent::Array(clone_assets(items)?))
            }
            AssetContent::Multi(MultiContent::ArrayBuilder(items)) => {
                AssetContent::Multi(MultiContent::ArrayBuilder(clone_assets(items)?))
            }
            AssetContent::Multi(MultiContent::Generator(_)) => {
                return Err(CoreError::GeneratorExhausted)
            }
        };
        let history = self.history.child(new_url.to_string(), Utc::now());
        Ok(Asset {
            url: new_url,
            mime: self.mime.clone(),
            history,
            produced_by: self.produced_by.clone(),
            mask: self.mask,
            content,
        })
    }
}

fn clone_assets(items: &[Asset]) -> Result<Vec<Asset>> {
    items.iter().map(|a| a.rewritten(a.url.clone())).collect()
}
