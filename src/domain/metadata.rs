use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// Jurisdiction-specific key/value metadata attached to nodes and graphs
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Read a numeric metadata entry. Numeric strings are accepted.
pub fn metadata_f64(metadata: &Metadata, key: &str) -> Option<f64> {
    match metadata.get(key)? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Deserialize a metadata map, reading an explicit `null` as empty
pub fn deserialize_nullable<'de, D>(deserializer: D) -> Result<Metadata, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Metadata>::deserialize(deserializer)?.unwrap_or_default())
}

/// Merge graph-level metadata into a node's own metadata.
///
/// Graph keys only extend the node map; a key the node already defines wins.
pub fn merge_metadata(node: &Metadata, graph: &Metadata) -> Metadata {
    let mut merged = node.clone();
    for (key, value) in graph {
        merged.entry(key.clone()).or_insert_with(|| value.clone());
    }
    merged
}
