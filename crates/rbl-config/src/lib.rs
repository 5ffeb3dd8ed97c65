//! rbl-config
//!
//! Layered YAML configuration for rebalance runs.
//! - Layers merge in order; later layers override earlier ones key by key
//! - The merged document is hashed over its canonical JSON form
//! - Leaves nobody reads are reported against a registry of consumed pointers

use std::collections::BTreeSet;
use std::fs;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Lowercase hex SHA-256 of `canonical_json`.
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let docs = paths
        .iter()
        .map(|p| fs::read_to_string(p).with_context(|| format!("failed to read config layer: {p}")))
        .collect::<Result<Vec<String>>>()?;
    let refs: Vec<&str> = docs.iter().map(String::as_str).collect();
    load_layered_yaml_from_strings(&refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = Value::Object(serde_json::Map::new());
    for (layer, raw) in yaml_docs.iter().enumerate() {
        let yaml: serde_yaml::Value =
            serde_yaml::from_str(raw).with_context(|| format!("invalid yaml in layer {layer}"))?;
        let json = serde_json::to_value(yaml)
            .with_context(|| format!("layer {layer} is not representable as json"))?;
        merged = deep_merge(merged, json);
    }

    // serde_json::Map is key-sorted, so plain serialization is canonical.
    let canonical_json = serde_json::to_string(&merged).context("canonical json serialize failed")?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

/// Objects merge recursively; anything else in `over` replaces `base`.
fn deep_merge(base: Value, over: Value) -> Value {
    match (base, over) {
        (Value::Object(mut base_map), Value::Object(over_map)) => {
            for (key, over_val) in over_map {
                let merged = match base_map.remove(&key) {
                    Some(base_val) => deep_merge(base_val, over_val),
                    None => over_val,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, over) => over,
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    /// Normalized, sorted, unique.
    pub consumed_prefixes: Vec<String>,
    /// Sorted.
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// Report every leaf of `config_json` not covered by a `consumed` JSON
/// pointer prefix.  `/a/b` covers `/a/b` and `/a/b/c` but not `/a/bc`.
///
/// With [`UnusedKeyPolicy::Fail`] a non-empty report is an error.
pub fn report_unused_keys(
    config_json: &Value,
    consumed: &[&str],
    policy: UnusedKeyPolicy,
) -> Result<UnusedKeyReport> {
    let consumed_prefixes: Vec<String> = consumed
        .iter()
        .map(|p| normalize_pointer(p))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut leaves = Vec::new();
    collect_leaf_pointers(config_json, "", &mut leaves);

    let mut unused: Vec<String> = leaves
        .into_iter()
        .filter(|leaf| !consumed_prefixes.iter().any(|p| covers(p, leaf)))
        .collect();
    unused.sort();
    unused.dedup();

    let report = UnusedKeyReport {
        consumed_prefixes,
        unused_leaf_pointers: unused,
    };

    if policy == UnusedKeyPolicy::Fail && !report.is_clean() {
        let preview: Vec<&String> = report.unused_leaf_pointers.iter().take(12).collect();
        bail!(
            "CONFIG_UNUSED_KEYS: {} unused config leaf key(s). First few: {:?}",
            report.unused_leaf_pointers.len(),
            preview
        );
    }
    Ok(report)
}

fn normalize_pointer(p: &str) -> String {
    let trimmed = p.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn covers(prefix: &str, leaf: &str) -> bool {
    if prefix == "/" || leaf == prefix {
        return true;
    }
    leaf.strip_prefix(prefix)
        .is_some_and(|rest| rest.starts_with('/'))
}

fn collect_leaf_pointers(v: &Value, at: &str, out: &mut Vec<String>) {
    match v {
        Value::Object(map) => {
            for (k, child) in map {
                let token = k.replace('~', "~0").replace('/', "~1");
                collect_leaf_pointers(child, &format!("{at}/{token}"), out);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                collect_leaf_pointers(child, &format!("{at}/{i}"), out);
            }
        }
        _ if at.is_empty() => out.push("/".to_string()),
        _ => out.push(at.to_string()),
    }
}
