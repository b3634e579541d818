//! Schema snapshots of a flight
//!
//! A flat summary of what each definition writes and which columns it reads,
//! for export and for comparing flights.

use crate::transforms::{self, Node};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Kinds and columns used by a transform or condition list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeSchema {
    pub kinds: BTreeSet<String>,
    pub columns: BTreeSet<String>,
}

impl TreeSchema {
    pub fn of(nodes: &[Node]) -> Self {
        Self {
            kinds: transforms::kinds_used(nodes)
                .into_iter()
                .map(|kind| kind.tag())
                .collect(),
            columns: transforms::columns(nodes),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySchema {
    pub fqn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub transforms: TreeSchema,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionSchema {
    pub fqn: String,
    pub entity_set_name: String,
    pub name: String,
    pub properties: Vec<PropertySchema>,
    pub conditions: TreeSchema,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dst: Option<String>,
    /// Name of the owning flight
    #[serde(default)]
    pub flight: String,
}

/// Snapshot of every definition in a flight, keyed by alias
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightSchema {
    pub entity_definitions: BTreeMap<String, DefinitionSchema>,
    pub association_definitions: BTreeMap<String, DefinitionSchema>,
}

impl FlightSchema {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_schema_collects_tags_and_columns() {
        let nodes = vec![Node::hash(vec!["a".into(), "b".into()])];
        let schema = TreeSchema::of(&nodes);
        assert!(schema.kinds.contains("transforms.HashTransform"));
        assert_eq!(schema.columns.len(), 2);
    }

    #[test]
    fn test_flight_schema_json_uses_document_keys() {
        let json = FlightSchema::default().to_json().unwrap();
        assert!(json.contains("entityDefinitions"));
        assert!(json.contains("associationDefinitions"));
    }
}
