//! Typed property values (spec.md Section 9 REDESIGN FLAGS: "Dynamic
//! property map"). Rather than exposing raw untyped lookups, [`PropertyMap`]
//! wraps a tagged-value sum type and gives named, typed accessors for the
//! keys spec.md Section 6 recognizes.

use crate::error::{CoreError, Result};
use std::collections::BTreeMap;

/// A property value: either a primitive, a list, or a nested map. Mirrors
/// what a JSON or YAML config file can express (spec.md Section 6).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// Never produced by config-file deserialization (JSON/YAML have no
    /// byte-string literal); listed after `List` so an untagged
    /// deserialize never mistakes a numeric array for bytes.
    Bytes(Vec<u8>),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l.as_slice()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

/// A Spec's property map. Inheritable from a parent (spec.md Section 3):
/// building one with a parent snapshot means the child's own keys shadow
/// the parent's, but any key the child doesn't define is read through.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct PropertyMap {
    own: BTreeMap<String, Value>,
    #[serde(skip)]
    inherited: Option<Box<PropertyMap>>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a child property map that inherits from `parent`: lookups miss
    /// on `own` fall through to `parent`.
    pub fn child_of(parent: &PropertyMap) -> Self {
        Self {
            own: BTreeMap::new(),
            inherited: Some(Box::new(parent.clone())),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.own.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.own
            .get(key)
            .or_else(|| self.inherited.as_ref().and_then(|p| p.get(key)))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn typed<'a, T>(
        &'a self,
        key: &str,
        expected: &'static str,
        convert: impl FnOnce(&'a Value) -> Option<T>,
    ) -> Result<Option<T>> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => convert(v).map(Some).ok_or_else(|| CoreError::WrongType {
                key: key.to_string(),
                expected,
                found: v.type_name(),
            }),
        }
    }

    pub fn get_str(&self, key: &str) -> Result<Option<&str>> {
        self.typed(key, "string", Value::as_str)
    }

    pub fn require_str(&self, key: &str) -> Result<&str> {
        self.get_str(key)?
            .ok_or_else(|| CoreError::MissingProperty(key.to_string()))
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        self.typed(key, "bool", Value::as_bool)
    }

    pub fn get_list(&self, key: &str) -> Result<Option<&[Value]>> {
        self.typed(key, "list", Value::as_list)
    }

    pub fn get_map(&self, key: &str) -> Result<Option<&BTreeMap<String, Value>>> {
        self.typed(key, "map", Value::as_map)
    }

    // --- Named accessors for the recognized keys (spec.md Section 6) ---

    pub fn source(&self) -> Result<Option<&str>> {
        self.get_str("source")
    }

    pub fn source_dir(&self) -> Result<Option<&str>> {
        self.get_str("source_dir")
    }

    pub fn source_nest(&self) -> Result<Option<&str>> {
        self.get_str("source_nest")
    }

    pub fn subspecs(&self) -> Result<Option<&BTreeMap<String, Value>>> {
        self.get_map("subspecs")
    }

    pub fn quiet(&self) -> Result<bool> {
        Ok(self.get_bool("quiet")?.unwrap_or(false))
    }

    pub fn install_cmd(&self) -> Result<Option<&str>> {
        self.get_str("install_cmd")
    }

    /// The `transform` key may be a string, an object, or a list in configs
    /// (spec.md Section 6); callers that need `PathTransformation`s parse
    /// this raw value via `spectree-expr`.
    pub fn transform_raw(&self) -> Option<&Value> {
        self.get("transform")
    }
}
