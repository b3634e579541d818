//! Reading transform and condition trees from YAML values

use super::error::{TransformError, TransformResult};
use super::node::{Arg, Node, NodeKind, Scalar};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

static TAGGED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(\s*)- !<([^>\s]+)>").unwrap());

const SERIES_GENERATOR: &str = "!<generators.TransformSeriesGenerator>";

/// Node list plus every column it references
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parsed {
    pub nodes: Vec<Node>,
    pub columns: BTreeSet<String>,
}

/// Rewrite `- !<kind>` list items into plain `- kind:` keys so the text
/// loads as ordinary YAML. Series generator markers are dropped.
pub fn normalize_tags(text: &str) -> Cow<'_, str> {
    if !text.contains("!<") {
        return Cow::Borrowed(text);
    }
    let stripped = text.replace(SERIES_GENERATOR, "");
    Cow::Owned(TAGGED_ITEM.replace_all(&stripped, "${1}- ${2}:").into_owned())
}

/// Parse a YAML node list written in the flight document syntax
pub fn parse_str(text: &str) -> TransformResult<Parsed> {
    let normalized = normalize_tags(text);
    let value: Value =
        serde_yaml::from_str(&normalized).map_err(|e| TransformError::Yaml(e.to_string()))?;
    parse(&value)
}

/// Parse a list of raw node mappings. `null` reads as an empty list.
pub fn parse(value: &Value) -> TransformResult<Parsed> {
    match value {
        Value::Null => Ok(Parsed::default()),
        Value::Sequence(items) => {
            let mut parsed = Parsed::default();
            for item in items {
                let Value::Mapping(map) = item else {
                    return Err(TransformError::NotAMapping(describe(item)));
                };
                let (node, columns) = parse_node(map)?;
                parsed.nodes.push(node);
                parsed.columns.extend(columns);
            }
            Ok(parsed)
        }
        other => Err(TransformError::NotAList(describe(other))),
    }
}

/// Parse one node mapping, returning the node and the columns it references.
pub fn parse_node(map: &Mapping) -> TransformResult<(Node, BTreeSet<String>)> {
    let mut kinds: Vec<(NodeKind, &Value)> = Vec::new();
    let mut plain: Vec<(&str, &Value)> = Vec::new();
    for (key, value) in map {
        let Some(key) = key.as_str() else {
            return Err(TransformError::InvalidKey(describe(key)));
        };
        match NodeKind::from_tag(key) {
            Some(kind) => kinds.push((kind, value)),
            None => plain.push((key, value)),
        }
    }

    let (kind, payload) = match kinds.len() {
        0 => return Err(TransformError::MissingKind(describe(&Value::Mapping(map.clone())))),
        1 => kinds.remove(0),
        _ => {
            let tags: Vec<String> = kinds.iter().map(|(kind, _)| kind.tag()).collect();
            return Err(TransformError::AmbiguousKind(tags.join(", ")));
        }
    };

    // Arguments written under the kind key itself (`- kind: {key: value}`)
    match payload {
        Value::Null => {}
        Value::Mapping(inner) => {
            for (key, value) in inner {
                let Some(key) = key.as_str() else {
                    return Err(TransformError::InvalidKey(describe(key)));
                };
                plain.push((key, value));
            }
        }
        _ => return Err(TransformError::MalformedPayload(kind.tag())),
    }

    let mut columns = BTreeSet::new();
    let mut args = BTreeMap::new();
    for (key, value) in plain {
        let arg = parse_arg(&kind, key, value, &mut columns)?;
        args.entry(key.to_string()).or_insert(arg);
    }
    Ok((Node { kind, args }, columns))
}

fn parse_arg(
    kind: &NodeKind,
    key: &str,
    value: &Value,
    columns: &mut BTreeSet<String>,
) -> TransformResult<Arg> {
    if key.starts_with("column") {
        return match value {
            Value::String(column) => {
                columns.insert(column.clone());
                Ok(Arg::Column(column.clone()))
            }
            Value::Sequence(items) => {
                let names: Option<Vec<String>> =
                    items.iter().map(|v| v.as_str().map(str::to_string)).collect();
                match names {
                    Some(names) => {
                        columns.extend(names.iter().cloned());
                        Ok(Arg::Columns(names))
                    }
                    None => Err(malformed_column(kind, key)),
                }
            }
            _ => Err(malformed_column(kind, key)),
        };
    }

    if key == "transforms" || key == "conditions" {
        let parsed = parse(value)?;
        columns.extend(parsed.columns);
        return Ok(Arg::Nodes(parsed.nodes));
    }

    match value {
        Value::Sequence(items) if !items.is_empty() && items.iter().all(is_node_mapping) => {
            let parsed = parse(value)?;
            columns.extend(parsed.columns);
            Ok(Arg::Nodes(parsed.nodes))
        }
        Value::Sequence(items) => {
            let scalars: Option<Vec<Scalar>> = items.iter().map(to_scalar).collect();
            Ok(scalars.map_or_else(|| Arg::Raw(value.clone()), Arg::List))
        }
        other => Ok(to_scalar(other).map_or_else(|| Arg::Raw(other.clone()), Arg::Scalar)),
    }
}

fn malformed_column(kind: &NodeKind, key: &str) -> TransformError {
    TransformError::MalformedColumn {
        key: key.to_string(),
        kind: kind.tag(),
    }
}

fn is_node_mapping(value: &Value) -> bool {
    match value {
        Value::Mapping(map) => map
            .keys()
            .any(|k| k.as_str().and_then(NodeKind::from_tag).is_some()),
        _ => false,
    }
}

/// Convert a YAML scalar. Sequences and mappings return `None`.
pub fn to_scalar(value: &Value) -> Option<Scalar> {
    match value {
        Value::Null => Some(Scalar::Null),
        Value::Bool(b) => Some(Scalar::Bool(*b)),
        Value::Number(n) => n
            .as_i64()
            .map(Scalar::Integer)
            .or_else(|| n.as_f64().map(Scalar::Float)),
        Value::String(s) => Some(Scalar::String(s.clone())),
        _ => None,
    }
}

fn describe(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("{:?}", value))
}
