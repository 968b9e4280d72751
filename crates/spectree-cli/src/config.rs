//! Loads a Spec configuration file (JSON or YAML) and builds the Spec tree
//! it describes (spec.md Section 6: the config file's keys "map directly
//! onto the property map of the Spec they configure", with `subspecs`
//! nesting children).
//!
//! Mirrors `loop-core::config`'s "file on disk becomes typed state" shape,
//! except the destination here is [`PropertyMap`] rather than a fixed
//! struct: spec.md's config surface is a handful of recognized keys plus
//! whatever else a user wants to stash for their own tasks to read, which
//! a fixed struct can't model.

use crate::error::{CliError, Result};
use spectree_behaviors::CopyBehavior;
use spectree_core::{PropertyMap, Value};
use spectree_engine::Spec;
use spectree_path::{parse_expression, Flags, PathTransformation};
use spectree_task::{CapabilityMask, Task, ASSETS_EMIT, ASSETS_GENERATE};
use std::path::Path;
use std::sync::Arc;

/// Reads `path` and deserializes it into a [`PropertyMap`], picking JSON or
/// YAML by file extension.
pub fn load_config(path: &Path) -> Result<PropertyMap> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::ReadConfig {
        path: path.display().to_string(),
        source,
    })?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&text).map_err(|source| CliError::ParseJson {
            path: path.display().to_string(),
            source,
        }),
        Some("yaml" | "yml") => {
            serde_yaml::from_str(&text).map_err(|source| CliError::ParseYaml {
                path: path.display().to_string(),
                source,
            })
        }
        _ => Err(CliError::UnknownConfigExtension(path.display().to_string())),
    }
}

/// Builds a Spec tree rooted at `name`, recursing into `props`'s `subspecs`
/// map and wiring up the demo behaviors spec.md Section 6 describes for a
/// leaf: `source` copies a file in, `transform` rewrites emitted paths.
pub fn build_tree(name: &str, props: PropertyMap) -> Result<Arc<Spec>> {
    let subspecs: Vec<(String, Value)> = props
        .subspecs()?
        .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default();

    let spec = Spec::new(name, props);
    attach_behaviors(&spec)?;

    for (child_name, child_value) in subspecs {
        let child_map = child_value
            .as_map()
            .ok_or_else(|| CliError::SubspecNotAMap(child_name.clone()))?;
        let mut child_props = PropertyMap::child_of(&spec.props);
        for (key, value) in child_map {
            child_props.set(key.clone(), value.clone());
        }
        let child = build_tree(&child_name, child_props)?;
        spec.attach_subspec(child)?;
    }

    Ok(spec)
}

fn attach_behaviors(spec: &Arc<Spec>) -> Result<()> {
    if let Some(chain) = parse_transform(spec)? {
        spec.set_path_transforms(chain);
    }

    if let Some(source) = spec.props.source()? {
        let dest = Path::new(source)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or(source);
        let mask = CapabilityMask::from_bits(ASSETS_EMIT | ASSETS_GENERATE);
        let task = Task::new(
            "copy-source",
            mask,
            Box::new(CopyBehavior::new(source, dest)),
        )?;
        spec.enqueue(task)?;
    }

    Ok(())
}

fn parse_transform(spec: &Spec) -> Result<Option<Vec<PathTransformation>>> {
    let Some(raw) = spec.props.transform_raw() else {
        return Ok(None);
    };
    Ok(Some(transform_chain(&spec.name, raw)?))
}

fn transform_chain(spec_name: &str, value: &Value) -> Result<Vec<PathTransformation>> {
    match value {
        Value::List(items) => items
            .iter()
            .map(|item| transform_single(spec_name, item))
            .collect(),
        Value::String(_) | Value::Map(_) => Ok(vec![transform_single(spec_name, value)?]),
        _ => Err(CliError::UnsupportedTransformShape(spec_name.to_string())),
    }
}

fn transform_single(spec_name: &str, value: &Value) -> Result<PathTransformation> {
    match value {
        Value::String(expr) => Ok(parse_expression(expr)?),
        Value::Map(fields) => transform_from_object(spec_name, fields),
        _ => Err(CliError::UnsupportedTransformShape(spec_name.to_string())),
    }
}

fn transform_from_object(
    spec_name: &str,
    fields: &std::collections::BTreeMap<String, Value>,
) -> Result<PathTransformation> {
    let pattern = fields
        .get("match")
        .and_then(Value::as_str)
        .ok_or_else(|| CliError::UnsupportedTransformShape(spec_name.to_string()))?;
    let flags = fields
        .get("flags")
        .and_then(Value::as_str)
        .map(parse_flags)
        .transpose()?
        .unwrap_or_default();

    let transformation = match fields.get("replace").and_then(Value::as_str) {
        Some(replacement) => PathTransformation::substitute(pattern, replacement, flags)?,
        None => PathTransformation::match_only(pattern, flags)?,
    };

    Ok(match fields.get("prefix").and_then(Value::as_str) {
        Some(prefix) => transformation.with_prefix(prefix),
        None => transformation,
    })
}

fn parse_flags(raw: &str) -> Result<Flags> {
    let mut flags = Flags::default();
    for c in raw.chars() {
        match c {
            'i' => flags.ignore_case = true,
            'g' => flags.global = true,
            other => return Err(spectree_path::PathError::UnknownFlag(other).into()),
        }
    }
    Ok(flags)
}
